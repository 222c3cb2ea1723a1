//! Debugger commands and their textual form
//!
//! ```text
//! run
//! reset
//! step [n]
//! show [target] [from] [to]
//! set target values...
//! dump
//! restore path
//! breakpoint addr
//! watch addr
//! breakop name
//! ```

use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

use crate::debugger::Target;
use crate::word::Word;

/// Every command the debugger understands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Run,
    Reset,
    Step(u64),
    Show {
        target: Option<Target>,
        from: Option<Word>,
        to: Option<Word>,
    },
    Set {
        target: Target,
        values: Vec<Word>,
    },
    Dump,
    Restore(PathBuf),
    Breakpoint(Word),
    Watch(Word),
    BreakOp(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("empty command")]
    Empty,
    #[error("unknown command `{0}`")]
    Unknown(String),
    #[error("`{command}` needs {what}")]
    Missing {
        command: &'static str,
        what: &'static str,
    },
    #[error("`{command}` takes at most {max} arguments")]
    TooManyArguments { command: &'static str, max: usize },
    #[error("unknown target `{0}`")]
    UnknownTarget(String),
    #[error("failed to parse number `{text}`")]
    InvalidNumber { text: String },
}

/// Parses a number, accepting `0b`, `0o` and `0x` prefixes
macro_rules! parse_number {
    ( $ty:ty: $s:expr ) => {{
        let text: &str = $s;

        let (radix, offset) = match text.as_bytes() {
            [b'0', b'b', ..] => (2, 2),
            [b'0', b'o', ..] => (8, 2),
            [b'0', b'x', ..] => (16, 2),
            _ => (10, 0),
        };

        <$ty>::from_str_radix(&text[offset..], radix).map_err(|_| CommandError::InvalidNumber {
            text: text.to_string(),
        })
    }};
}

fn parse_target(text: &str) -> Result<Target, CommandError> {
    text.parse()
        .map_err(|_| CommandError::UnknownTarget(text.to_string()))
}

fn no_more(command: &'static str, args: &[&str], max: usize) -> Result<(), CommandError> {
    if args.len() > max {
        Err(CommandError::TooManyArguments { command, max })
    } else {
        Ok(())
    }
}

fn single<'a>(
    command: &'static str,
    what: &'static str,
    args: &[&'a str],
) -> Result<&'a str, CommandError> {
    no_more(command, args, 1)?;
    args.first()
        .copied()
        .ok_or(CommandError::Missing { command, what })
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let name = words.next().ok_or(CommandError::Empty)?;
        let args: Vec<&str> = words.collect();

        let command = match name {
            "run" => {
                no_more("run", &args, 0)?;
                Command::Run
            }
            "reset" => {
                no_more("reset", &args, 0)?;
                Command::Reset
            }
            "dump" => {
                no_more("dump", &args, 0)?;
                Command::Dump
            }
            "step" => {
                no_more("step", &args, 1)?;
                match args.first() {
                    Some(count) => Command::Step(parse_number!(u64: count)?),
                    None => Command::Step(1),
                }
            }
            "show" => {
                no_more("show", &args, 3)?;
                let target = args.first().map(|text| parse_target(text)).transpose()?;
                let from = args.get(1).map(|text| parse_number!(Word: text)).transpose()?;
                let to = args.get(2).map(|text| parse_number!(Word: text)).transpose()?;
                Command::Show { target, from, to }
            }
            "set" => {
                let (target, values) = args.split_first().ok_or(CommandError::Missing {
                    command: "set",
                    what: "a target",
                })?;
                Command::Set {
                    target: parse_target(target)?,
                    values: values
                        .iter()
                        .map(|text| parse_number!(Word: text))
                        .collect::<Result<_, _>>()?,
                }
            }
            "restore" => Command::Restore(PathBuf::from(single("restore", "a path", &args)?)),
            "breakpoint" => {
                let address = single("breakpoint", "an address", &args)?;
                Command::Breakpoint(parse_number!(Word: address)?)
            }
            "watch" => {
                let address = single("watch", "an address", &args)?;
                Command::Watch(parse_number!(Word: address)?)
            }
            "breakop" => Command::BreakOp(single("breakop", "an opcode", &args)?.to_string()),
            _ => return Err(CommandError::Unknown(name.to_string())),
        };

        Ok(command)
    }
}
