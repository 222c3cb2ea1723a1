use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::DebugError;
use crate::fault::Fault;
use crate::processor::Processor;
use crate::registers::Registers;
use crate::stack::Stack;
use crate::word::{is_pc, Word, REGISTER_COUNT};

/// Program counter, registers and stack. Memory is not part of a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub pc: Word,
    pub registers: [Word; REGISTER_COUNT],
    pub stack: Vec<Word>,
}

impl Snapshot {
    pub fn capture(processor: &Processor) -> Self {
        Self {
            pc: processor.pc,
            registers: processor.registers.values(),
            stack: processor.stack.values().to_vec(),
        }
    }

    /// Overwrites pc, registers and stack of `processor`. Nothing is changed
    /// unless registers and stack hold literals and pc is at most one past
    /// the last address.
    pub fn apply(&self, processor: &mut Processor) -> Result<(), Fault> {
        if !is_pc(self.pc) {
            return Err(Fault::OutOfBounds {
                address: self.pc as usize,
            });
        }
        let registers = Registers::from_values(self.registers)?;
        let stack = Stack::from_values(self.stack.clone())?;

        processor.pc = self.pc;
        processor.registers = registers;
        processor.stack = stack;

        Ok(())
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), DebugError> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.write_all(b"\n")?;
        writer.flush()?;

        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DebugError> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }
}
