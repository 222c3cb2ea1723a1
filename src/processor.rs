use std::convert::TryFrom;
use std::fmt;

use crate::console::Console;
use crate::fault::Fault;
use crate::memory::Memory;
use crate::registers::Registers;
use crate::stack::Stack;
use crate::word::{is_literal, is_printable, Operand, Word, MAX_LITERAL, MODULUS};
use log::*;
use num_enum::IntoPrimitive;
use num_enum::TryFromPrimitive;

/// Why the machine stopped for good
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Halt {
    /// A `halt` instruction was executed
    Instruction,
    /// `ret` found an empty stack
    EmptyReturn,
    /// `in` found no more input
    InputExhausted,
}

impl fmt::Display for Halt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Halt::Instruction => f.write_str("halted"),
            Halt::EmptyReturn => f.write_str("halted: return with empty stack"),
            Halt::InputExhausted => f.write_str("halted: input exhausted"),
        }
    }
}

/// Result of a single fetch-decode-execute cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Continued,
    Halted(Halt),
    Faulted(Fault),
}

/// Emulates a CPU
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Processor {
    /// Program counter
    pub pc: Word,
    pub registers: Registers,
    pub stack: Stack,
    pub memory: Memory,
    /// Set once the program is finished
    halted: Option<Halt>,
}

impl Processor {
    /// Initializes a new CPU with `program` loaded at address zero
    pub fn new(program: &[Word]) -> Result<Self, Fault> {
        Ok(Self {
            memory: Memory::from_program(program)?,
            ..Self::default()
        })
    }

    pub fn halted(&self) -> Option<Halt> {
        self.halted
    }

    /// Leaves the halted state without touching anything else
    pub fn resume(&mut self) {
        self.halted = None;
    }

    /// Reads the word at the program counter and advances it
    pub fn fetch(&mut self) -> Result<Word, Fault> {
        let word = self.memory.read(self.pc as usize)?;
        self.pc += 1;
        Ok(word)
    }

    /// Decodes the instruction at `address` without executing it
    pub fn decode_at(&self, address: Word) -> Result<Instruction, Fault> {
        let mut cursor = address as usize;
        Instruction::decode(address, || {
            let word = self.memory.read(cursor);
            cursor += 1;
            word
        })
    }

    /// Returns the opcode stored at `address`, if there is one
    pub fn opcode_at(&self, address: Word) -> Option<Opcode> {
        let word = self.memory.read(address as usize).ok()?;
        Opcode::try_from(word).ok()
    }

    /// Executes a single, already fetched instruction
    pub fn execute_instruction<C: Console + ?Sized>(
        &mut self,
        instruction: Instruction,
        console: &mut C,
    ) -> Result<Option<Halt>, Fault> {
        let [a, b, _] = instruction.operands;

        match instruction.opcode {
            Opcode::HALT => {
                debug!("halt");
                return Ok(Some(Halt::Instruction));
            }
            Opcode::SET => {
                let index = Operand::destination(a)?;
                let value = self.registers.value(b)?;
                self.registers.set(index, value)?;

                debug!("set r{} {}", index, value);
            }
            Opcode::PUSH => {
                let value = self.registers.value(a)?;
                self.stack.push(value);

                debug!("push {}", value);
            }
            Opcode::POP => {
                let index = Operand::destination(a)?;
                let value = self.stack.pop()?;
                self.registers.set(index, value)?;

                debug!("pop r{}: {}", index, value);
            }
            Opcode::EQ => self.binary(&instruction, |x, y| Ok((x == y) as Word))?,
            Opcode::GT => self.binary(&instruction, |x, y| Ok((x > y) as Word))?,
            Opcode::JMP => {
                let target = self.registers.value(a)?;
                self.pc = target;

                debug!("jmp {}", target);
            }
            Opcode::JT => {
                let condition = self.registers.value(a)?;
                let target = self.registers.value(b)?;
                if condition != 0 {
                    self.pc = target;
                }

                debug!("jt {} {}", condition, target);
            }
            Opcode::JF => {
                let condition = self.registers.value(a)?;
                let target = self.registers.value(b)?;
                if condition == 0 {
                    self.pc = target;
                }

                debug!("jf {} {}", condition, target);
            }
            Opcode::ADD => self.binary(&instruction, |x, y| Ok((x + y) % MODULUS))?,
            Opcode::MULT => self.binary(&instruction, |x, y| {
                Ok((x as u32 * y as u32 % MODULUS as u32) as Word)
            })?,
            Opcode::MOD => self.binary(&instruction, |x, y| {
                x.checked_rem(y).ok_or(Fault::DivisionByZero)
            })?,
            Opcode::AND => self.binary(&instruction, |x, y| Ok(x & y))?,
            Opcode::OR => self.binary(&instruction, |x, y| Ok(x | y))?,
            Opcode::NOT => {
                let index = Operand::destination(a)?;
                let value = self.registers.value(b)?;
                let result = !value & MAX_LITERAL;
                self.registers.set(index, result)?;

                debug!("not r{} {}: {}", index, value, result);
            }
            Opcode::RMEM => {
                let index = Operand::destination(a)?;
                let address = self.registers.value(b)?;
                let value = self.memory.read(address as usize)?;
                self.registers.set(index, value)?;

                debug!("rmem r{} {}: {}", index, address, value);
            }
            Opcode::WMEM => {
                let address = self.registers.value(a)?;
                let value = self.registers.value(b)?;
                self.memory.write(address as usize, value)?;

                debug!("wmem {} {}", address, value);
            }
            Opcode::CALL => {
                let target = self.registers.value(a)?;
                // the return address must be a literal to live on the stack
                if !is_literal(self.pc) {
                    return Err(Fault::OutOfBounds {
                        address: self.pc as usize,
                    });
                }
                self.stack.push(self.pc);
                self.pc = target;

                debug!("call {}", target);
            }
            Opcode::RET => match self.stack.pop() {
                Ok(target) => {
                    self.pc = target;

                    debug!("ret {}", target);
                }
                Err(_) => {
                    debug!("ret on empty stack");
                    return Ok(Some(Halt::EmptyReturn));
                }
            },
            Opcode::OUT => {
                let value = self.registers.value(a)?;
                if !is_printable(value) {
                    return Err(Fault::Unprintable { value });
                }
                console.write_byte(value as u8);

                debug!("out {}", value);
            }
            Opcode::IN => {
                let index = Operand::destination(a)?;
                match console.read_byte() {
                    Some(byte) => {
                        self.registers.set(index, byte as Word)?;

                        debug!("in r{}: {}", index, byte);
                    }
                    None => {
                        debug!("in r{}: input exhausted", index);
                        return Ok(Some(Halt::InputExhausted));
                    }
                }
            }
            Opcode::NOOP => {
                debug!("noop");
            }
        }

        Ok(None)
    }

    /// Executes `r <- op(value(a), value(b))` for a three operand instruction
    fn binary<F>(&mut self, instruction: &Instruction, op: F) -> Result<(), Fault>
    where
        F: FnOnce(Word, Word) -> Result<Word, Fault>,
    {
        let [r, a, b] = instruction.operands;
        let index = Operand::destination(r)?;
        let x = self.registers.value(a)?;
        let y = self.registers.value(b)?;
        let result = op(x, y)?;
        self.registers.set(index, result)?;

        debug!("{} r{} {} {}: {}", instruction.opcode, index, x, y, result);
        Ok(())
    }

    /// Runs one execution step.
    ///
    /// A faulted step rewinds the program counter to the start of the
    /// instruction, leaving the machine as it was before the step.
    pub fn step<C: Console + ?Sized>(&mut self, console: &mut C) -> Outcome {
        if let Some(halt) = self.halted {
            return Outcome::Halted(halt);
        }

        let start = self.pc;
        match self.try_step(console) {
            Ok(None) => Outcome::Continued,
            Ok(Some(halt)) => {
                if halt == Halt::InputExhausted {
                    self.pc = start;
                }
                self.halted = Some(halt);
                Outcome::Halted(halt)
            }
            Err(fault) => {
                self.pc = start;
                Outcome::Faulted(fault)
            }
        }
    }

    fn try_step<C: Console + ?Sized>(
        &mut self,
        console: &mut C,
    ) -> Result<Option<Halt>, Fault> {
        let address = self.pc;
        let instruction = Instruction::decode(address, || self.fetch())?;
        self.execute_instruction(instruction, console)
    }

    /// Run program until a termination condition is met
    pub fn execute_until_halt<C: Console + ?Sized>(
        &mut self,
        console: &mut C,
    ) -> Result<Halt, Fault> {
        loop {
            match self.step(console) {
                Outcome::Continued => {}
                Outcome::Halted(halt) => {
                    info!("Program terminated at {}: {}", self.pc, halt);
                    return Ok(halt);
                }
                Outcome::Faulted(fault) => return Err(fault),
            }
        }
    }
}

/// What an operand of an instruction is used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Register that receives the result
    Destination,
    /// Value read from a literal or register
    Value,
    /// Value used as a jump or call target
    Target,
}

macro_rules! instructions {
    ( $( $( #[doc = $doc:expr] )+ $name:ident = $repr:literal => $mnemonic:literal [ $( $role:ident ),* ] , )+ ) => {
        /// Defines the instructions
        #[repr(u16)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[derive(TryFromPrimitive, IntoPrimitive)]
        pub enum Opcode {
            $(
                $( #[doc = $doc] )+
                $name = $repr,
            )+
        }

        impl Opcode {
            pub const ALL: &'static [Self] = &[
                $( Self::$name , )+
            ];

            /// The assembler mnemonic
            pub fn name(&self) -> &'static str {
                match self {
                    $( Self::$name => $mnemonic , )+
                }
            }

            /// The operands this opcode reads after the opcode word, in order
            pub fn roles(&self) -> &'static [Role] {
                match self {
                    $( Self::$name => &[ $( Role::$role ),* ] , )+
                }
            }
        }

        impl ::std::fmt::Display for Opcode {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.name())
            }
        }
    }
}

instructions! {
    /// Stop execution
    HALT = 0 => "halt" [],
    /// Set register `a` to the value of `b`
    SET = 1 => "set" [Destination, Value],
    /// Push `a` onto the stack
    PUSH = 2 => "push" [Value],
    /// Pop the top of the stack into register `a`
    POP = 3 => "pop" [Destination],
    /// Set `a` to 1 if `b` equals `c`, 0 otherwise
    EQ = 4 => "eq" [Destination, Value, Value],
    /// Set `a` to 1 if `b` is greater than `c`, 0 otherwise
    GT = 5 => "gt" [Destination, Value, Value],
    /// Jump to `a`
    JMP = 6 => "jmp" [Target],
    /// Jump to `b` if `a` is nonzero
    JT = 7 => "jt" [Value, Target],
    /// Jump to `b` if `a` is zero
    JF = 8 => "jf" [Value, Target],
    /// Sum of `b` and `c` modulo 32768
    ADD = 9 => "add" [Destination, Value, Value],
    /// Product of `b` and `c` modulo 32768
    MULT = 10 => "mult" [Destination, Value, Value],
    /// Remainder of `b` divided by `c`
    MOD = 11 => "mod" [Destination, Value, Value],
    /// Bitwise and of `b` and `c`
    AND = 12 => "and" [Destination, Value, Value],
    /// Bitwise or of `b` and `c`
    OR = 13 => "or" [Destination, Value, Value],
    /// 15-bit bitwise inverse of `b`
    NOT = 14 => "not" [Destination, Value],
    /// Read memory at address `b` into `a`
    RMEM = 15 => "rmem" [Destination, Value],
    /// Write `b` into memory at address `a`
    WMEM = 16 => "wmem" [Value, Value],
    /// Push the address of the next instruction and jump to `a`
    CALL = 17 => "call" [Target],
    /// Pop an address from the stack and jump to it, halting on an empty stack
    RET = 18 => "ret" [],
    /// Write the character `a` to the console
    OUT = 19 => "out" [Value],
    /// Read a character from the console into `a`
    IN = 20 => "in" [Destination],
    /// No operation
    NOOP = 21 => "noop" [],
}

impl Opcode {
    /// Number of operand words following the opcode
    pub fn arity(&self) -> usize {
        self.roles().len()
    }

    /// Looks up an opcode by mnemonic, ignoring case
    pub fn from_mnemonic(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|opcode| opcode.name().eq_ignore_ascii_case(name))
    }

    /// Jumps and calls assign the program counter from an operand
    pub fn is_branch(&self) -> bool {
        matches!(self, Opcode::JMP | Opcode::JT | Opcode::JF | Opcode::CALL)
    }
}

/// An opcode together with its raw operand words
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Instruction {
    pub opcode: Opcode,
    operands: [Word; 3],
}

impl Instruction {
    /// Decodes an instruction starting at `address`, pulling words from
    /// `next`. Exactly `1 + arity` words are requested.
    pub fn decode<F>(address: Word, mut next: F) -> Result<Self, Fault>
    where
        F: FnMut() -> Result<Word, Fault>,
    {
        let word = next()?;
        let opcode =
            Opcode::try_from(word).map_err(|_| Fault::InvalidOpcode { word, address })?;

        let mut operands = [0; 3];
        for operand in operands.iter_mut().take(opcode.arity()) {
            *operand = next()?;
        }

        Ok(Self { opcode, operands })
    }

    pub fn operands(&self) -> &[Word] {
        &self.operands[..self.opcode.arity()]
    }

    /// Number of words the instruction occupies
    pub fn width(&self) -> usize {
        1 + self.opcode.arity()
    }

    /// The operand holding the memory address of `rmem` and `wmem`
    pub fn memory_operand(&self) -> Option<Word> {
        match self.opcode {
            Opcode::RMEM => Some(self.operands[1]),
            Opcode::WMEM => Some(self.operands[0]),
            _ => None,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.opcode.name())?;
        for &word in self.operands() {
            match Operand::decode(word) {
                Ok(operand) => write!(f, " {}", operand)?,
                Err(_) => write!(f, " {}", word)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::console::BufferConsole;
    use crate::word::{reg, REGISTER_COUNT};
    use crate::write_instructions;

    use super::*;
    use color_eyre::eyre::Result;

    use super::Opcode::*;

    /// Runs `program` to completion with `input` on the console
    fn run(program: &[Word], input: &str) -> (Processor, BufferConsole, Result<Halt, Fault>) {
        let mut cpu = Processor::new(program).expect("valid program");
        let mut console = BufferConsole::new(input);
        let result = cpu.execute_until_halt(&mut console);
        (cpu, console, result)
    }

    fn words(program: &[Opcode]) -> Vec<Word> {
        program.iter().map(|&opcode| opcode as Word).collect()
    }

    #[test]
    fn test_no_operation() -> Result<()> {
        let mut cpu = Processor::new(&words(&[NOOP]))?;
        let before = cpu.clone();
        assert_eq!(cpu.step(&mut BufferConsole::default()), Outcome::Continued);

        assert_eq!(cpu.memory, before.memory);
        assert_eq!(cpu.registers, before.registers);
        assert_eq!(cpu.pc, 1);

        Ok(())
    }

    #[test]
    fn test_halt() -> Result<()> {
        let mut cpu = Processor::new(&words(&[HALT, NOOP]))?;
        let mut console = BufferConsole::default();
        assert_eq!(cpu.step(&mut console), Outcome::Halted(Halt::Instruction));
        assert_eq!(cpu.halted(), Some(Halt::Instruction));
        assert_eq!(cpu.pc, 1);

        // halted is terminal
        assert_eq!(cpu.step(&mut console), Outcome::Halted(Halt::Instruction));
        assert_eq!(cpu.pc, 1);

        Ok(())
    }

    #[test]
    fn test_out_hash() -> Result<()> {
        let (_, console, result) = run(&[19, 35, 0], "");
        assert_eq!(result?, Halt::Instruction);
        assert_eq!(console.output_string(), "#");

        Ok(())
    }

    #[test]
    fn test_out_rejects_unprintable() -> Result<()> {
        let program = [
            1, 32768, 7, 1, 32769, 8, 9, 32770, 32768, 32769, 19, 32770, 0,
        ];
        let (cpu, console, result) = run(&program, "");
        assert_eq!(result, Err(Fault::Unprintable { value: 15 }));
        assert!(result
            .unwrap_err()
            .to_string()
            .starts_with("operand error"));
        assert!(console.output.is_empty());
        assert_eq!(cpu.registers.get(2)?, 15);
        // rewound to the faulting instruction
        assert_eq!(cpu.pc, 10);

        let (_, _, result) = run(&[19, 200, 0], "");
        assert_eq!(result, Err(Fault::Unprintable { value: 200 }));

        Ok(())
    }

    #[test]
    #[rustfmt::skip]
    fn test_set_and_push_pop() -> Result<()> {
        let (cpu, _, result) = run(
            &[
                SET as Word, reg(0), 42,
                PUSH as Word, reg(0),
                PUSH as Word, 7,
                POP as Word, reg(1),
                POP as Word, reg(2),
                HALT as Word,
            ],
            "",
        );
        result?;
        assert_eq!(cpu.registers.get(0)?, 42);
        assert_eq!(cpu.registers.get(1)?, 7);
        assert_eq!(cpu.registers.get(2)?, 42);
        assert!(cpu.stack.is_empty());

        Ok(())
    }

    #[test]
    fn test_pop_underflow_rewinds() -> Result<()> {
        let mut cpu = Processor::new(&[NOOP as Word, POP as Word, reg(0), HALT as Word])?;
        let mut console = BufferConsole::default();
        assert_eq!(cpu.step(&mut console), Outcome::Continued);
        assert_eq!(
            cpu.step(&mut console),
            Outcome::Faulted(Fault::StackUnderflow)
        );
        assert_eq!(cpu.pc, 1);
        assert_eq!(cpu.halted(), None);

        // fix the state and retry
        cpu.stack.push(9);
        assert_eq!(cpu.step(&mut console), Outcome::Continued);
        assert_eq!(cpu.registers.get(0)?, 9);

        Ok(())
    }

    #[test]
    fn test_add_wraps() -> Result<()> {
        let mut cpu = Processor::new(&[ADD as Word, reg(0), reg(0), reg(1)])?;
        cpu.registers = Registers::from_values([32767, 1, 0, 0, 0, 0, 0, 0])?;
        assert_eq!(cpu.step(&mut BufferConsole::default()), Outcome::Continued);
        assert_eq!(cpu.registers.get(0)?, 0);

        Ok(())
    }

    #[test]
    #[rustfmt::skip]
    fn test_mod_and_or_not() -> Result<()> {
        let (cpu, _, result) = run(
            &[
                MOD as Word, reg(0), 17, 5,
                AND as Word, reg(1), 0b1100, 0b1010,
                OR as Word, reg(2), 0b1100, 0b1010,
                NOT as Word, reg(3), reg(7),
                NOT as Word, reg(4), 0b101,
                HALT as Word,
            ],
            "",
        );
        result?;
        assert_eq!(cpu.registers.get(0)?, 2);
        assert_eq!(cpu.registers.get(1)?, 0b1000);
        assert_eq!(cpu.registers.get(2)?, 0b1110);
        assert_eq!(cpu.registers.get(3)?, 32767);
        assert_eq!(cpu.registers.get(4)?, 0b111_1111_1111_1010);

        Ok(())
    }

    #[test]
    fn test_mod_by_zero() -> Result<()> {
        let (_, _, result) = run(&[MOD as Word, reg(0), 17, 0, HALT as Word], "");
        assert_eq!(result, Err(Fault::DivisionByZero));

        Ok(())
    }

    #[test]
    #[rustfmt::skip]
    fn test_eq_gt_are_boolean() -> Result<()> {
        let (cpu, _, result) = run(
            &[
                EQ as Word, reg(0), 5, 5,
                EQ as Word, reg(1), 5, 6,
                GT as Word, reg(2), 9000, 6,
                GT as Word, reg(3), 6, 6,
                HALT as Word,
            ],
            "",
        );
        result?;
        assert_eq!(cpu.registers.values()[..4], [1, 0, 1, 0]);

        Ok(())
    }

    #[test]
    #[rustfmt::skip]
    fn test_jumps() -> Result<()> {
        // jt taken, jf not taken, jmp over an unprintable out
        let (cpu, console, result) = run(
            &[
                JT as Word, 1, 5,      // 0
                OUT as Word, 200,      // 3
                JF as Word, 1, 200,    // 5
                JMP as Word, 12,       // 8
                OUT as Word, 200,      // 10
                JF as Word, 0, 17,     // 12
                OUT as Word, 200,      // 15
                OUT as Word, '!' as Word, // 17
                JT as Word, 0, 0,      // 19
                HALT as Word,          // 22
            ],
            "",
        );
        assert_eq!(result?, Halt::Instruction);
        assert_eq!(console.output_string(), "!");
        assert_eq!(cpu.pc, 23);

        Ok(())
    }

    #[test]
    #[rustfmt::skip]
    fn test_call_ret() -> Result<()> {
        let (cpu, console, result) = run(
            &[
                CALL as Word, 6,           // 0
                OUT as Word, 'b' as Word,  // 2
                HALT as Word,              // 4
                NOOP as Word,              // 5
                OUT as Word, 'a' as Word,  // 6
                RET as Word,               // 8
            ],
            "",
        );
        assert_eq!(result?, Halt::Instruction);
        assert_eq!(console.output_string(), "ab");
        assert!(cpu.stack.is_empty());

        let mut cpu = Processor::new(&[CALL as Word, 3, HALT as Word, NOOP as Word])?;
        cpu.step(&mut BufferConsole::default());
        assert_eq!(cpu.stack.values(), &[2]);
        assert_eq!(cpu.pc, 3);

        Ok(())
    }

    #[test]
    fn test_call_needs_literal_return_address() -> Result<()> {
        let mut memory = Memory::default();
        write_instructions!(memory : 32766 => CALL, 0)?;
        let mut cpu = Processor {
            pc: 32766,
            memory,
            ..Processor::default()
        };

        assert_eq!(
            cpu.step(&mut BufferConsole::default()),
            Outcome::Faulted(Fault::OutOfBounds { address: 32768 })
        );
        assert_eq!(cpu.pc, 32766);
        assert!(cpu.stack.is_empty());

        Ok(())
    }

    #[test]
    fn test_ret_on_empty_stack_halts() -> Result<()> {
        let (_, _, result) = run(&[RET as Word, OUT as Word, 200], "");
        assert_eq!(result?, Halt::EmptyReturn);

        Ok(())
    }

    #[test]
    #[rustfmt::skip]
    fn test_rmem_wmem() -> Result<()> {
        let (cpu, _, result) = run(
            &[
                WMEM as Word, 100, 1234,
                RMEM as Word, reg(0), 100,
                SET as Word, reg(1), 101,
                WMEM as Word, reg(1), reg(0),
                HALT as Word,
            ],
            "",
        );
        result?;
        assert_eq!(cpu.registers.get(0)?, 1234);
        assert_eq!(cpu.memory.read(101)?, 1234);

        let (_, _, result) = run(&[RMEM as Word, reg(0), 500, HALT as Word], "");
        assert_eq!(result, Err(Fault::Unwritten { address: 500 }));

        Ok(())
    }

    #[test]
    fn test_in() -> Result<()> {
        let (cpu, _, result) = run(&[IN as Word, reg(0), IN as Word, reg(1), HALT as Word], "A\n");
        assert_eq!(result?, Halt::Instruction);
        assert_eq!(cpu.registers.get(0)?, 'A' as Word);
        assert_eq!(cpu.registers.get(1)?, '\n' as Word);

        let (cpu, _, result) = run(&[IN as Word, reg(0), IN as Word, reg(1), HALT as Word], "x");
        assert_eq!(result?, Halt::InputExhausted);
        assert_eq!(cpu.pc, 2);

        Ok(())
    }

    #[test]
    fn test_literal_destination() -> Result<()> {
        let (_, _, result) = run(&[SET as Word, 3, 4, HALT as Word], "");
        assert_eq!(result, Err(Fault::NotARegister { word: 3 }));

        Ok(())
    }

    #[test]
    fn test_invalid_opcode() -> Result<()> {
        let (_, _, result) = run(&[NOOP as Word, 22], "");
        assert_eq!(result, Err(Fault::InvalidOpcode { word: 22, address: 1 }));

        Ok(())
    }

    #[test]
    fn test_truncated_instruction() -> Result<()> {
        let (cpu, _, result) = run(&[NOOP as Word, ADD as Word, reg(0), 1], "");
        assert_eq!(result, Err(Fault::Unwritten { address: 4 }));
        assert_eq!(cpu.pc, 1);

        let mut cpu = Processor::default();
        cpu.memory.write(32767, JMP as Word)?;
        cpu.pc = 32767;
        assert_eq!(
            cpu.step(&mut BufferConsole::default()),
            Outcome::Faulted(Fault::OutOfBounds { address: 32768 })
        );

        Ok(())
    }

    #[test]
    #[rustfmt::skip]
    fn test_registers_stay_literal() -> Result<()> {
        let mut cpu = Processor::new(&[
            SET as Word, reg(0), 32767,
            ADD as Word, reg(1), reg(0), reg(0),
            MULT as Word, reg(2), reg(0), reg(0),
            NOT as Word, reg(3), 0,
            OR as Word, reg(4), reg(3), 32767,
            IN as Word, reg(5),
            HALT as Word,
        ])?;
        let mut console = BufferConsole::new(vec![255]);

        while cpu.step(&mut console) == Outcome::Continued {
            assert!(cpu.registers.values().iter().all(|&value| value < 32768));
        }
        assert_eq!(cpu.registers.values().len(), REGISTER_COUNT);

        Ok(())
    }

    #[test]
    fn test_decode_at() -> Result<()> {
        let mut memory = Memory::default();
        write_instructions!(memory : 0 => WMEM, reg(1), 7, HALT)?;
        let cpu = Processor {
            memory,
            ..Processor::default()
        };

        let instruction = cpu.decode_at(0)?;
        assert_eq!(instruction.opcode, WMEM);
        assert_eq!(instruction.operands(), &[reg(1), 7]);
        assert_eq!(instruction.memory_operand(), Some(reg(1)));
        assert_eq!(instruction.width(), 3);
        assert_eq!(instruction.to_string(), "wmem r1 7");
        assert_eq!(cpu.opcode_at(3), Some(HALT));
        assert_eq!(cpu.opcode_at(4), None);
        // decoding does not move the program counter
        assert_eq!(cpu.pc, 0);

        Ok(())
    }

    #[test]
    fn test_opcode_table() -> Result<()> {
        assert_eq!(Opcode::ALL.len(), 22);
        for (id, opcode) in Opcode::ALL.iter().enumerate() {
            assert_eq!(Word::from(*opcode) as usize, id);
            assert_eq!(Opcode::from_mnemonic(opcode.name()), Some(*opcode));
        }
        assert_eq!(Opcode::from_mnemonic("MULT"), Some(MULT));
        assert_eq!(Opcode::from_mnemonic("mul"), None);
        assert_eq!(OUT.arity(), 1);
        assert_eq!(EQ.arity(), 3);

        Ok(())
    }
}
