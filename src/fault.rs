use thiserror::Error;

use crate::word::Word;

/// Everything that can go wrong while loading or executing a program.
///
/// Halting is not a fault, see [`crate::processor::Halt`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Fault {
    #[error("encoding error: program of {len} words does not fit into memory")]
    ProgramTooLarge { len: usize },
    #[error("encoding error: {value} is not a valid word")]
    InvalidWord { value: Word },
    #[error("encoding error: image of {len} bytes ends in half a word")]
    TruncatedImage { len: usize },

    #[error("operand error: register {index} does not exist")]
    InvalidRegister { index: usize },
    #[error("operand error: {word} is not a valid operand")]
    InvalidOperand { word: Word },
    #[error("operand error: {word} is not a register")]
    NotARegister { word: Word },
    #[error("operand error: {value} is not a literal")]
    NotALiteral { value: Word },
    #[error("operand error: {value} is not a printable character")]
    Unprintable { value: Word },
    #[error("operand error: division by zero")]
    DivisionByZero,

    #[error("decode error: {word} at address {address} is not an opcode")]
    InvalidOpcode { word: Word, address: Word },

    #[error("stack underflow")]
    StackUnderflow,

    #[error("memory fault: address {address} is out of range")]
    OutOfBounds { address: usize },
    #[error("memory fault: address {address} was never written")]
    Unwritten { address: usize },
}
