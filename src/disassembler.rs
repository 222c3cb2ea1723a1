//! Turns a program image back into assembler text.
//!
//! Words that do not decode into a well formed instruction are kept as raw
//! data, so the output of a loadable image assembles back into the same
//! image.

use std::collections::BTreeMap;
use std::fmt;

use crate::fault::Fault;
use crate::processor::{Instruction, Opcode, Role};
use crate::word::{is_literal, is_printable, is_register, is_valid, Operand, Word};

/// One line of disassembled output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line {
    Instruction {
        address: usize,
        instruction: Instruction,
    },
    /// A word that is not the start of a valid instruction
    Data { address: usize, word: Word },
}

impl Line {
    pub fn address(&self) -> usize {
        match self {
            Line::Instruction { address, .. } | Line::Data { address, .. } => *address,
        }
    }

    /// Number of words the line covers
    pub fn width(&self) -> usize {
        match self {
            Line::Instruction { instruction, .. } => instruction.width(),
            Line::Data { .. } => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Disassembly {
    lines: Vec<Line>,
    labels: BTreeMap<Word, String>,
    len: usize,
}

impl Disassembly {
    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    /// Name given to `address`, if something jumps or calls there
    pub fn label(&self, address: Word) -> Option<&str> {
        self.labels.get(&address).map(String::as_str)
    }

    fn write_operand(
        &self,
        f: &mut fmt::Formatter<'_>,
        opcode: Opcode,
        role: Role,
        word: Word,
    ) -> fmt::Result {
        if role == Role::Target {
            if let Some(label) = self.label(word) {
                return write!(f, " {}", label);
            }
        }
        if opcode == Opcode::OUT && is_printable(word) {
            return write!(f, " {}", char_literal(word as u8));
        }
        match Operand::decode(word) {
            Ok(operand) => write!(f, " {}", operand),
            Err(_) => write!(f, " {}", word),
        }
    }

    fn write_label(&self, f: &mut fmt::Formatter<'_>, address: usize) -> fmt::Result {
        match Word::try_from(address).ok().and_then(|address| self.label(address)) {
            Some(label) => writeln!(f, "{}:", label),
            None => Ok(()),
        }
    }
}

impl fmt::Display for Disassembly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            self.write_label(f, line.address())?;
            match line {
                Line::Instruction { instruction, .. } => {
                    let opcode = instruction.opcode;
                    write!(f, "    {}", opcode)?;
                    for (&role, &word) in opcode.roles().iter().zip(instruction.operands()) {
                        self.write_operand(f, opcode, role, word)?;
                    }
                    writeln!(f)?;
                }
                Line::Data { word, .. } => writeln!(f, "    {}", word)?,
            }
        }
        self.write_label(f, self.len)
    }
}

/// Renders `byte` the way the assembler reads character literals
fn char_literal(byte: u8) -> String {
    match byte {
        b'\t' => r"'\t'".to_string(),
        b'\n' => r"'\n'".to_string(),
        0x0b => r"'\v'".to_string(),
        0x0c => r"'\f'".to_string(),
        b'\r' => r"'\r'".to_string(),
        b' ' => r"'\s'".to_string(),
        b'\\' => r"'\\'".to_string(),
        b'\'' => r"'\''".to_string(),
        other => format!("'{}'", other as char),
    }
}

/// Checks the operands against what the opcode expects of them
fn is_well_formed(instruction: &Instruction) -> bool {
    let opcode = instruction.opcode;
    opcode
        .roles()
        .iter()
        .zip(instruction.operands())
        .all(|(role, &word)| match role {
            Role::Destination => is_register(word),
            Role::Target => is_literal(word),
            Role::Value if opcode == Opcode::OUT => is_register(word) || is_printable(word),
            Role::Value => is_valid(word),
        })
}

fn decode_line(program: &[Word], address: usize) -> Option<Instruction> {
    let mut cursor = address;
    let instruction = Instruction::decode(address as Word, || {
        let word = program
            .get(cursor)
            .copied()
            .ok_or(Fault::OutOfBounds { address: cursor });
        cursor += 1;
        word
    })
    .ok()?;

    if is_well_formed(&instruction) {
        Some(instruction)
    } else {
        None
    }
}

/// Disassembles `program`.
///
/// Targets of `jmp`, `jt` and `jf` are named `labelN`, targets of `call`
/// `subN`, numbered in order of first reference. Targets that fall inside
/// another line keep their numeric form.
pub fn disassemble(program: &[Word]) -> Disassembly {
    let mut lines = Vec::new();
    let mut address = 0;
    while address < program.len() {
        let line = match decode_line(program, address) {
            Some(instruction) => Line::Instruction {
                address,
                instruction,
            },
            None => Line::Data {
                address,
                word: program[address],
            },
        };
        address += line.width();
        lines.push(line);
    }

    let is_line_start = |target: Word| {
        target as usize == program.len()
            || lines
                .binary_search_by_key(&(target as usize), Line::address)
                .is_ok()
    };

    let mut labels = BTreeMap::new();
    let (mut jumps, mut calls) = (0, 0);
    for line in &lines {
        let instruction = match line {
            Line::Instruction { instruction, .. } if instruction.opcode.is_branch() => instruction,
            _ => continue,
        };
        let roles = instruction.opcode.roles();
        for (&role, &target) in roles.iter().zip(instruction.operands()) {
            if role != Role::Target || labels.contains_key(&target) || !is_line_start(target) {
                continue;
            }
            let name = if instruction.opcode == Opcode::CALL {
                calls += 1;
                format!("sub{}", calls - 1)
            } else {
                jumps += 1;
                format!("label{}", jumps - 1)
            };
            log::debug!("{} at {}", name, target);
            labels.insert(target, name);
        }
    }

    Disassembly {
        lines,
        labels,
        len: program.len(),
    }
}
