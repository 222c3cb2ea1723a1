//! Finds text a program prints with literal `out` instructions.

use crate::processor::Opcode;
use crate::word::{is_printable, Word};

/// Returns the text of every maximal run of `out <printable literal>`
/// pairs, in program order
pub fn find_strings(program: &[Word]) -> Vec<String> {
    let out = Word::from(Opcode::OUT);
    let mut strings = Vec::new();
    let mut current = String::new();

    let mut index = 0;
    while index < program.len() {
        match program.get(index + 1) {
            Some(&value) if program[index] == out && is_printable(value) => {
                current.push(value as u8 as char);
                index += 2;
            }
            _ => {
                if !current.is_empty() {
                    strings.push(std::mem::take(&mut current));
                }
                index += 1;
            }
        }
    }
    if !current.is_empty() {
        strings.push(current);
    }

    strings
}
