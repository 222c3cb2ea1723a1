//! Line based front end for the [`Debugger`].

use std::io::{self, Write};

use log::*;

use crate::command::Command;
use crate::console::Console;
use crate::debugger::Debugger;

const PROMPT: &str = "> ";

/// Reads commands line by line and prints what they produce
#[derive(Debug)]
pub struct Session<C: Console> {
    debugger: Debugger<C>,
}

impl<C: Console> Session<C> {
    pub fn new(debugger: Debugger<C>) -> Self {
        Self { debugger }
    }

    pub fn debugger(&self) -> &Debugger<C> {
        &self.debugger
    }

    pub fn into_debugger(self) -> Debugger<C> {
        self.debugger
    }

    /// Parses and executes one line. Errors are rendered as messages and
    /// leave the session usable.
    pub fn dispatch(&mut self, line: &str) -> String {
        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(err) => return format!("error: {}", err),
        };

        match self.debugger.execute(command) {
            Ok(response) => response.to_string(),
            Err(err) => {
                debug!("command failed: {:?}", err);
                format!("error: {}", err)
            }
        }
    }

    /// Runs until `read_line` reports end of input or the user types `quit`
    /// or `exit`.
    ///
    /// `read_line` appends the next line to its buffer and returns the number
    /// of bytes read, like [`std::io::Stdin::read_line`]. No lock is held
    /// between lines, so `in` may read the same stdin.
    pub fn run<R, W>(&mut self, mut read_line: R, mut output: W) -> io::Result<()>
    where
        R: FnMut(&mut String) -> io::Result<usize>,
        W: Write,
    {
        info!("debug session started");

        let mut line = String::new();
        loop {
            output.write_all(PROMPT.as_bytes())?;
            output.flush()?;

            line.clear();
            if read_line(&mut line)? == 0 {
                writeln!(output)?;
                break;
            }

            let command = line.trim();
            if command.is_empty() {
                continue;
            }
            if command == "quit" || command == "exit" {
                break;
            }

            writeln!(output, "{}", self.dispatch(command))?;
        }

        info!("debug session ended after {} cycles", self.debugger.cycles());
        Ok(())
    }
}
