//! Byte I/O for the `in` and `out` instructions.

use std::collections::VecDeque;
use std::io::{self, Read, Write};

/// Where the machine reads input from and writes output to
pub trait Console {
    /// Returns the next input byte, or `None` once input is exhausted
    fn read_byte(&mut self) -> Option<u8>;

    fn write_byte(&mut self, byte: u8);
}

/// Console backed by stdin and stdout, with optional queued input that is
/// consumed before stdin
#[derive(Debug, Default)]
pub struct StdConsole {
    queued: VecDeque<u8>,
}

impl StdConsole {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_input(input: Vec<u8>) -> Self {
        Self {
            queued: input.into(),
        }
    }

    /// Flushes pending output
    pub fn flush(&mut self) {
        if let Err(err) = io::stdout().flush() {
            log::warn!("failed to flush stdout: {}", err);
        }
    }
}

impl Console for StdConsole {
    fn read_byte(&mut self) -> Option<u8> {
        if let Some(byte) = self.queued.pop_front() {
            return Some(byte);
        }

        self.flush();
        let mut buf = [0; 1];
        match io::stdin().read(&mut buf) {
            Ok(1) => Some(buf[0]),
            Ok(_) => None,
            Err(err) => {
                log::warn!("failed to read stdin: {}", err);
                None
            }
        }
    }

    fn write_byte(&mut self, byte: u8) {
        let mut stdout = io::stdout();
        if let Err(err) = stdout.write_all(&[byte]) {
            log::warn!("failed to write stdout: {}", err);
        }
        if byte == b'\n' {
            self.flush();
        }
    }
}

/// In-memory console
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BufferConsole {
    pub input: VecDeque<u8>,
    pub output: Vec<u8>,
}

impl BufferConsole {
    pub fn new<I: Into<Vec<u8>>>(input: I) -> Self {
        let input: Vec<u8> = input.into();
        Self {
            input: input.into(),
            output: Vec::new(),
        }
    }

    pub fn output_string(&self) -> String {
        String::from_utf8_lossy(&self.output).into_owned()
    }
}

impl Console for BufferConsole {
    fn read_byte(&mut self) -> Option<u8> {
        self.input.pop_front()
    }

    fn write_byte(&mut self, byte: u8) {
        self.output.push(byte);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_console() {
        let mut console = BufferConsole::new("ab");
        assert_eq!(console.read_byte(), Some(b'a'));
        assert_eq!(console.read_byte(), Some(b'b'));
        assert_eq!(console.read_byte(), None);

        console.write_byte(b'#');
        assert_eq!(console.output_string(), "#");
    }
}
