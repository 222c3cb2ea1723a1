use std::fmt;

use crate::processor::Opcode;
use crate::word::{Word, REGISTER_COUNT};

/// Read-only view of part of the debugger state, as returned by `show`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    /// Program counter, registers and stack
    State {
        pc: Word,
        registers: [Word; REGISTER_COUNT],
        stack: Vec<Word>,
    },
    Pc(Word),
    Registers([Word; REGISTER_COUNT]),
    Stack(Vec<Word>),
    /// Cells in address order; `None` for unwritten cells
    Memory(Vec<(usize, Option<Word>)>),
    Breakpoints(Vec<Word>),
    Watchpoints(Vec<Word>),
    BreakOps(Vec<Opcode>),
    Cycles(u64),
}

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    if items.is_empty() {
        return f.write_str("none");
    }
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(" ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            View::State {
                pc,
                registers,
                stack,
            } => {
                writeln!(f, "pc: {}", pc)?;
                f.write_str("registers: ")?;
                write_list(f, registers)?;
                f.write_str("\nstack: ")?;
                write_list(f, stack)
            }
            View::Pc(pc) => write!(f, "pc: {}", pc),
            View::Registers(registers) => {
                for (index, value) in registers.iter().enumerate() {
                    if index > 0 {
                        f.write_str("\n")?;
                    }
                    write!(f, "r{}: {}", index, value)?;
                }
                Ok(())
            }
            View::Stack(stack) => {
                f.write_str("stack: ")?;
                write_list(f, stack)
            }
            View::Memory(cells) => {
                for (i, (address, cell)) in cells.iter().enumerate() {
                    if i > 0 {
                        f.write_str("\n")?;
                    }
                    match cell {
                        Some(word) => write!(f, "{:>5}: {}", address, word)?,
                        None => write!(f, "{:>5}: -", address)?,
                    }
                }
                Ok(())
            }
            View::Breakpoints(addresses) => {
                f.write_str("breakpoints: ")?;
                write_list(f, addresses)
            }
            View::Watchpoints(addresses) => {
                f.write_str("watchpoints: ")?;
                write_list(f, addresses)
            }
            View::BreakOps(opcodes) => {
                f.write_str("breakops: ")?;
                write_list(f, opcodes)
            }
            View::Cycles(cycles) => write!(f, "cycles: {}", cycles),
        }
    }
}
