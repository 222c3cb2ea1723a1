use std::fmt;

use crate::fault::Fault;

/// A machine word. Only `0..=MAX_WORD` is a valid encoding.
pub type Word = u16;

/// Number of addressable memory cells
pub const MEMORY_SIZE: usize = 32768;
/// Arithmetic is performed modulo this value
pub const MODULUS: Word = 32768;
/// Largest literal value
pub const MAX_LITERAL: Word = MODULUS - 1;
/// First register-encoded word, `r0`
pub const REGISTER_BASE: Word = 32768;
/// Number of general purpose registers
pub const REGISTER_COUNT: usize = 8;
/// Largest valid word, `r7`
pub const MAX_WORD: Word = REGISTER_BASE + REGISTER_COUNT as Word - 1;

/// Returns true if `word` is a valid encoding at all.
pub fn is_valid(word: Word) -> bool {
    word <= MAX_WORD
}

pub fn is_literal(word: Word) -> bool {
    word <= MAX_LITERAL
}

pub fn is_register(word: Word) -> bool {
    (REGISTER_BASE..=MAX_WORD).contains(&word)
}

/// Returns true if `value` can be held by the program counter: any address,
/// or one past the last one after the final cell has executed.
pub fn is_pc(value: Word) -> bool {
    value as usize <= MEMORY_SIZE
}

/// Returns true if `word` is an ASCII character the console may print:
/// graphic characters and whitespace.
pub fn is_printable(word: Word) -> bool {
    match u8::try_from(word) {
        Ok(byte) if byte < 0x80 => {
            byte.is_ascii_graphic() || byte.is_ascii_whitespace() || byte == 0x0b
        }
        _ => false,
    }
}

/// Encodes register `index` as an operand word.
///
/// # Panics
///
/// Panics if `index` is not a register.
pub const fn reg(index: usize) -> Word {
    assert!(index < REGISTER_COUNT);
    REGISTER_BASE + index as Word
}

/// A decoded operand word
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operand {
    Literal(Word),
    Register(usize),
}

impl Operand {
    /// Splits `word` into a literal or a register reference.
    ///
    /// # Errors
    ///
    /// Words above [`MAX_WORD`] are not operands.
    pub fn decode(word: Word) -> Result<Self, Fault> {
        if is_literal(word) {
            Ok(Operand::Literal(word))
        } else if is_register(word) {
            Ok(Operand::Register((word - REGISTER_BASE) as usize))
        } else {
            Err(Fault::InvalidOperand { word })
        }
    }

    /// Decodes `word` as a destination. Only registers can be written to.
    pub fn destination(word: Word) -> Result<usize, Fault> {
        match Operand::decode(word)? {
            Operand::Register(index) => Ok(index),
            Operand::Literal(_) => Err(Fault::NotARegister { word }),
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Literal(value) => write!(f, "{}", value),
            Operand::Register(index) => write!(f, "r{}", index),
        }
    }
}
