use crate::fault::Fault;
use crate::word::{is_literal, Operand, Word, REGISTER_COUNT};

/// The general purpose registers. They only ever hold literals.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Registers {
    values: [Word; REGISTER_COUNT],
}

impl Registers {
    /// Creates a register file from literal `values`
    pub fn from_values(values: [Word; REGISTER_COUNT]) -> Result<Self, Fault> {
        if let Some(&value) = values.iter().find(|&&value| !is_literal(value)) {
            return Err(Fault::NotALiteral { value });
        }
        Ok(Self { values })
    }

    pub fn get(&self, index: usize) -> Result<Word, Fault> {
        self.values
            .get(index)
            .copied()
            .ok_or(Fault::InvalidRegister { index })
    }

    pub fn set(&mut self, index: usize, value: Word) -> Result<(), Fault> {
        if !is_literal(value) {
            return Err(Fault::NotALiteral { value });
        }
        let register = self
            .values
            .get_mut(index)
            .ok_or(Fault::InvalidRegister { index })?;
        *register = value;

        Ok(())
    }

    /// Resolves an operand word to the literal it stands for
    pub fn value(&self, word: Word) -> Result<Word, Fault> {
        match Operand::decode(word)? {
            Operand::Literal(value) => Ok(value),
            Operand::Register(index) => self.get(index),
        }
    }

    pub fn values(&self) -> [Word; REGISTER_COUNT] {
        self.values
    }
}
