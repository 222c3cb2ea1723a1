use crate::fault::Fault;
use crate::word::{is_literal, Word};

/// Unbounded call and data stack
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash)]
pub struct Stack {
    values: Vec<Word>,
}

impl Stack {
    /// Creates a stack from `values`, bottom first. Every value must be a
    /// literal.
    pub fn from_values(values: Vec<Word>) -> Result<Self, Fault> {
        if let Some(&value) = values.iter().find(|&&value| !is_literal(value)) {
            return Err(Fault::NotALiteral { value });
        }
        Ok(Self { values })
    }

    pub fn push(&mut self, value: Word) {
        self.values.push(value);
    }

    pub fn pop(&mut self) -> Result<Word, Fault> {
        self.values.pop().ok_or(Fault::StackUnderflow)
    }

    pub fn peek(&self) -> Option<Word> {
        self.values.last().copied()
    }

    /// Bottom first
    pub fn values(&self) -> &[Word] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
