//! Toolchain for a 15-bit word virtual machine: assembler, disassembler,
//! string scanner and an emulator with an interactive debugger.

pub mod assembler;
pub mod command;
pub mod console;
pub mod debugger;
pub mod disassembler;
pub mod fault;
pub mod memory;
pub mod processor;
pub mod registers;
pub mod session;
pub mod stack;
pub mod strings;
pub mod word;
