use color_eyre::eyre::{eyre, Result};

use synacor::assembler::assemble;
use synacor::command::Command;
use synacor::console::BufferConsole;
use synacor::debugger::{Debugger, DumpPaths, Response, Stop};
use synacor::disassembler::{disassemble, Line};
use synacor::memory::image;
use synacor::processor::{Halt, Opcode, Processor};
use synacor::session::Session;
use synacor::word::Word;

const GREETER: &str = r#"
; prints "hi!" three times through a subroutine
    set r0 3
loop:
    call print
    add r0 r0 32767     ; r0 - 1
    jt r0 loop
    halt

print:
    out 'h'
    out 'i'
    out '!'
    out '\n'
    ret
"#;

const ECHO: &str = r#"
next:
    in r1
    eq r2 r1 '\n'
    out r1
    jf r2 next
    halt
"#;

fn words(source: &str) -> Result<Vec<Word>> {
    assemble(source).map_err(|errors| eyre!("{:?}", errors))
}

/// Branch instructions and their targets
fn branches(program: &[Word]) -> Vec<(usize, Opcode, Word)> {
    disassemble(program)
        .lines()
        .iter()
        .filter_map(|line| match line {
            Line::Instruction {
                address,
                instruction,
            } if instruction.opcode.is_branch() => {
                let target = *instruction.operands().last()?;
                Some((*address, instruction.opcode, target))
            }
            _ => None,
        })
        .collect()
}

#[test]
fn test_round_trip() -> Result<()> {
    let program = words(GREETER)?;
    let disassembly = disassemble(&program);

    assert_eq!(disassembly.label(3), Some("label0"));
    assert_eq!(disassembly.label(13), Some("sub0"));

    let text = disassembly.to_string();
    assert!(text.contains("    call sub0\n"));
    assert!(text.contains("    out '\\n'\n"));

    let reassembled = words(&text)?;
    assert_eq!(reassembled, program);
    assert_eq!(
        branches(&reassembled),
        vec![(3, Opcode::CALL, 13), (9, Opcode::JT, 3)]
    );

    Ok(())
}

#[test]
fn test_run_greeter() -> Result<()> {
    let mut processor = Processor::new(&words(GREETER)?)?;
    let mut console = BufferConsole::new("");

    assert_eq!(processor.execute_until_halt(&mut console)?, Halt::Instruction);
    assert_eq!(console.output_string(), "hi!\nhi!\nhi!\n");
    assert!(processor.stack.is_empty());

    Ok(())
}

#[test]
fn test_echo() -> Result<()> {
    let program = words(ECHO)?;

    let mut processor = Processor::new(&program)?;
    let mut console = BufferConsole::new("abc\nignored");
    assert_eq!(processor.execute_until_halt(&mut console)?, Halt::Instruction);
    assert_eq!(console.output_string(), "abc\n");

    let mut processor = Processor::new(&program)?;
    let mut console = BufferConsole::new("ab");
    assert_eq!(
        processor.execute_until_halt(&mut console)?,
        Halt::InputExhausted
    );
    assert_eq!(console.output_string(), "ab");
    assert_eq!(processor.pc, 0);

    Ok(())
}

#[test]
fn test_debugger_dump_and_restore() -> Result<()> {
    let program = words(GREETER)?;
    let dir = std::env::temp_dir();
    let paths = DumpPaths {
        snapshot: dir.join(format!("synacor-toolchain-{}.json", std::process::id())),
        core: dir.join(format!("synacor-toolchain-{}.bin", std::process::id())),
    };

    let mut debugger =
        Debugger::new(program.clone(), BufferConsole::new(""))?.with_dump_paths(paths.clone());

    debugger.execute("breakop OUT".parse::<Command>()?)?;
    let response = debugger.execute("run".parse::<Command>()?)?;
    assert_eq!(
        response,
        Response::Stop {
            stop: Stop::BreakOp(Opcode::OUT),
            pc: 13,
            cycles: 2
        }
    );

    debugger.execute(Command::Dump)?;
    assert_eq!(image::read_file(&paths.core)?, program);

    debugger.execute(Command::Step(1))?;
    assert_eq!(debugger.processor().pc, 15);
    assert_eq!(debugger.console().output_string(), "h");

    debugger.execute(Command::Restore(paths.snapshot.clone()))?;
    assert_eq!(debugger.processor().pc, 13);
    assert_eq!(debugger.processor().stack.values(), &[5]);
    assert_eq!(debugger.processor().registers.get(0)?, 3);
    assert_eq!(debugger.cycles(), 3);

    std::fs::remove_file(&paths.snapshot)?;
    std::fs::remove_file(&paths.core)?;
    Ok(())
}

#[test]
fn test_session() -> Result<()> {
    let debugger = Debugger::new(words(GREETER)?, BufferConsole::new(""))?;
    let mut session = Session::new(debugger);

    let mut script = ["breakpoint 12", "run", "show registers", "run", "show cycles"].into_iter();
    let mut output = Vec::new();
    session.run(
        |line| {
            Ok(match script.next() {
                Some(command) => {
                    line.push_str(command);
                    line.push('\n');
                    command.len() + 1
                }
                None => 0,
            })
        },
        &mut output,
    )?;

    let output = String::from_utf8(output)?;
    assert!(output.contains("breakpoint at 12 (pc 12, cycle 25)"));
    assert!(output.contains("r0: 0\n"));
    assert!(output.contains("halted (pc 13, cycle 26)"));
    assert!(output.contains("cycles: 26"));
    assert_eq!(
        session.debugger().console().output_string(),
        "hi!\nhi!\nhi!\n"
    );

    Ok(())
}
