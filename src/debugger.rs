//! Breakpoints, watchpoints and run control on top of the [`Processor`].

use std::collections::BTreeSet;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use log::*;
use thiserror::Error;

use crate::command::Command;
use crate::console::Console;
use crate::fault::Fault;
use crate::memory::image;
use crate::processor::{Halt, Opcode, Outcome, Processor};
use crate::registers::Registers;
use crate::stack::Stack;
use crate::word::{is_pc, Word, MEMORY_SIZE, REGISTER_COUNT};

mod snapshot;
mod view;

pub use snapshot::Snapshot;
pub use view::View;

/// Number of cells `show memory` prints when no end is given
const DEFAULT_MEMORY_WINDOW: Word = 8;

/// Errors raised by debugger commands. None of them end the session.
#[derive(Debug, Error)]
pub enum DebugError {
    #[error(transparent)]
    Fault(#[from] Fault),
    #[error("{target} needs a value")]
    MissingValue { target: Target },
    #[error("{target} takes {expected} values, got {got}")]
    WrongValueCount {
        target: Target,
        expected: usize,
        got: usize,
    },
    #[error("{target} cannot be set")]
    ReadOnly { target: Target },
    #[error("{target} does not take a range")]
    UnexpectedRange { target: Target },
    #[error("range {from}..={to} is empty")]
    EmptyRange { from: Word, to: Word },
    #[error("address {address} must lie in 1..32768")]
    InvalidAddress { address: Word },
    #[error("address {address} has not been written")]
    UnwrittenAddress { address: Word },
    #[error("unknown opcode `{0}`")]
    UnknownOpcode(String),
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    #[error("snapshot error: {0}")]
    Snapshot(#[from] serde_json::Error),
}

/// Parts of the machine that can be shown or set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    Pc,
    Registers,
    Stack,
    Memory,
    Breakpoints,
    Watchpoints,
    BreakOps,
    Cycles,
}

impl Target {
    pub const ALL: &'static [Self] = &[
        Target::Pc,
        Target::Registers,
        Target::Stack,
        Target::Memory,
        Target::Breakpoints,
        Target::Watchpoints,
        Target::BreakOps,
        Target::Cycles,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Target::Pc => "pc",
            Target::Registers => "registers",
            Target::Stack => "stack",
            Target::Memory => "memory",
            Target::Breakpoints => "breakpoints",
            Target::Watchpoints => "watchpoints",
            Target::BreakOps => "breakops",
            Target::Cycles => "cycles",
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Target {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|target| target.name() == s)
            .ok_or(())
    }
}

/// Why `run` or `step` returned
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stop {
    /// All requested steps were executed
    Stepped,
    Breakpoint(Word),
    BreakOp(Opcode),
    Watch(Word),
    Halted(Halt),
    Faulted(Fault),
}

impl fmt::Display for Stop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stop::Stepped => f.write_str("stepped"),
            Stop::Breakpoint(address) => write!(f, "breakpoint at {}", address),
            Stop::BreakOp(opcode) => write!(f, "breakop {}", opcode),
            Stop::Watch(address) => write!(f, "watch {}", address),
            Stop::Halted(halt) => write!(f, "{}", halt),
            Stop::Faulted(fault) => write!(f, "{}", fault),
        }
    }
}

/// What a command produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Execution stopped
    Stop { stop: Stop, pc: Word, cycles: u64 },
    View(View),
    Done(String),
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Response::Stop { stop, pc, cycles } => {
                write!(f, "{} (pc {}, cycle {})", stop, pc, cycles)
            }
            Response::View(view) => write!(f, "{}", view),
            Response::Done(message) => f.write_str(message),
        }
    }
}

/// Where `dump` writes its files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpPaths {
    /// Snapshot of pc, registers and stack
    pub snapshot: PathBuf,
    /// Written memory cells
    pub core: PathBuf,
}

impl Default for DumpPaths {
    fn default() -> Self {
        Self {
            snapshot: PathBuf::from("snapshot.json"),
            core: PathBuf::from("core.bin"),
        }
    }
}

/// Drives a [`Processor`] and decides when to stop it.
///
/// Breakpoints, watchpoints, break opcodes and the cycle counter belong to
/// the debugger and survive [`Debugger::reset`].
#[derive(Debug)]
pub struct Debugger<C: Console> {
    processor: Processor,
    program: Vec<Word>,
    console: C,
    breakpoints: BTreeSet<Word>,
    breakops: BTreeSet<Opcode>,
    watchpoints: BTreeSet<Word>,
    cycles: u64,
    paths: DumpPaths,
}

impl<C: Console> Debugger<C> {
    /// Loads `program`. Fails if the program is not a valid image.
    pub fn new(program: Vec<Word>, console: C) -> Result<Self, Fault> {
        Ok(Self {
            processor: Processor::new(&program)?,
            program,
            console,
            breakpoints: BTreeSet::new(),
            breakops: BTreeSet::new(),
            watchpoints: BTreeSet::new(),
            cycles: 0,
            paths: DumpPaths::default(),
        })
    }

    pub fn with_dump_paths(mut self, paths: DumpPaths) -> Self {
        self.paths = paths;
        self
    }

    pub fn processor(&self) -> &Processor {
        &self.processor
    }

    pub fn console(&self) -> &C {
        &self.console
    }

    pub fn console_mut(&mut self) -> &mut C {
        &mut self.console
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(&self.processor)
    }

    /// Executes `command`
    pub fn execute(&mut self, command: Command) -> Result<Response, DebugError> {
        debug!("executing {:?}", command);

        let response = match command {
            Command::Run => {
                let stop = self.run();
                self.stopped(stop)
            }
            Command::Step(count) => {
                let stop = self.step(count);
                self.stopped(stop)
            }
            Command::Reset => {
                self.reset()?;
                Response::Done("machine reset".to_string())
            }
            Command::Show { target, from, to } => Response::View(self.show(target, from, to)?),
            Command::Set { target, values } => {
                self.set(target, &values)?;
                Response::Done(format!("{} set", target))
            }
            Command::Dump => {
                self.dump()?;
                Response::Done(format!(
                    "state written to {}, core written to {}",
                    self.paths.snapshot.display(),
                    self.paths.core.display()
                ))
            }
            Command::Restore(path) => {
                self.restore(&path)?;
                Response::Done(format!("state restored from {}", path.display()))
            }
            Command::Breakpoint(address) => {
                self.breakpoint(address)?;
                Response::Done(format!("breakpoint at {}", address))
            }
            Command::Watch(address) => {
                self.watch(address)?;
                Response::Done(format!("watching {}", address))
            }
            Command::BreakOp(name) => {
                let opcode = self.breakop(&name)?;
                Response::Done(format!("breaking on {}", opcode))
            }
        };

        Ok(response)
    }

    fn stopped(&self, stop: Stop) -> Response {
        Response::Stop {
            stop,
            pc: self.processor.pc,
            cycles: self.cycles,
        }
    }

    /// Reloads the program and clears registers, stack and program counter
    pub fn reset(&mut self) -> Result<(), Fault> {
        self.processor = Processor::new(&self.program)?;
        info!("machine reset");
        Ok(())
    }

    /// Executes up to `count` instructions
    pub fn step(&mut self, count: u64) -> Stop {
        for _ in 0..count {
            if let Some(stop) = self.advance() {
                debug!("stopped at {}: {}", self.processor.pc, stop);
                return stop;
            }
        }
        Stop::Stepped
    }

    /// Executes instructions until something stops the machine.
    ///
    /// A program that loops forever without hitting a breakpoint, watchpoint
    /// or break opcode never returns.
    pub fn run(&mut self) -> Stop {
        loop {
            if let Some(stop) = self.advance() {
                debug!("stopped at {}: {}", self.processor.pc, stop);
                return stop;
            }
        }
    }

    /// Executes a single instruction and checks the stop conditions
    fn advance(&mut self) -> Option<Stop> {
        if let Some(halt) = self.processor.halted() {
            return Some(Stop::Halted(halt));
        }

        match self.processor.step(&mut self.console) {
            Outcome::Continued => {
                self.cycles += 1;
                self.check_stop()
            }
            Outcome::Halted(halt) => {
                self.cycles += 1;
                Some(Stop::Halted(halt))
            }
            Outcome::Faulted(fault) => Some(Stop::Faulted(fault)),
        }
    }

    /// Inspects the instruction at the program counter, which is the one
    /// about to execute
    fn check_stop(&self) -> Option<Stop> {
        let pc = self.processor.pc;

        if self.breakpoints.contains(&pc) {
            return Some(Stop::Breakpoint(pc));
        }

        if let Some(opcode) = self.processor.opcode_at(pc) {
            if self.breakops.contains(&opcode) {
                return Some(Stop::BreakOp(opcode));
            }
        }

        if self.watchpoints.is_empty() {
            return None;
        }
        self.processor
            .decode_at(pc)
            .ok()
            .and_then(|instruction| instruction.memory_operand())
            .and_then(|word| self.processor.registers.value(word).ok())
            .filter(|address| self.watchpoints.contains(address))
            .map(Stop::Watch)
    }

    /// Returns a view of `target`, or of pc, registers and stack if no
    /// target is given. Only memory takes a range.
    pub fn show(
        &self,
        target: Option<Target>,
        from: Option<Word>,
        to: Option<Word>,
    ) -> Result<View, DebugError> {
        let target = match target {
            Some(target) => target,
            None => {
                return Ok(View::State {
                    pc: self.processor.pc,
                    registers: self.processor.registers.values(),
                    stack: self.processor.stack.values().to_vec(),
                })
            }
        };

        if target != Target::Memory && (from.is_some() || to.is_some()) {
            return Err(DebugError::UnexpectedRange { target });
        }

        let view = match target {
            Target::Pc => View::Pc(self.processor.pc),
            Target::Registers => View::Registers(self.processor.registers.values()),
            Target::Stack => View::Stack(self.processor.stack.values().to_vec()),
            Target::Memory => {
                let from = from.unwrap_or(self.processor.pc);
                if from as usize >= MEMORY_SIZE {
                    return Err(DebugError::InvalidAddress { address: from });
                }
                let to = to.unwrap_or_else(|| from.saturating_add(DEFAULT_MEMORY_WINDOW - 1));
                if from > to {
                    return Err(DebugError::EmptyRange { from, to });
                }
                View::Memory(self.processor.memory.range(from as usize, to as usize))
            }
            Target::Breakpoints => View::Breakpoints(self.breakpoints.iter().copied().collect()),
            Target::Watchpoints => View::Watchpoints(self.watchpoints.iter().copied().collect()),
            Target::BreakOps => View::BreakOps(self.breakops.iter().copied().collect()),
            Target::Cycles => View::Cycles(self.cycles),
        };

        Ok(view)
    }

    /// Overwrites `target` with `values`.
    ///
    /// - pc: exactly one value, at most one past the last address
    /// - registers: exactly eight values
    /// - stack: the new stack, bottom first
    /// - memory: an address and the word to store there
    pub fn set(&mut self, target: Target, values: &[Word]) -> Result<(), DebugError> {
        let expect_count = |expected: usize| {
            if values.len() == expected {
                Ok(())
            } else {
                Err(DebugError::WrongValueCount {
                    target,
                    expected,
                    got: values.len(),
                })
            }
        };

        if !matches!(
            target,
            Target::Pc | Target::Registers | Target::Stack | Target::Memory
        ) {
            return Err(DebugError::ReadOnly { target });
        }
        if values.is_empty() {
            return Err(DebugError::MissingValue { target });
        }

        match target {
            Target::Pc => {
                expect_count(1)?;
                let pc = values[0];
                if !is_pc(pc) {
                    return Err(Fault::OutOfBounds {
                        address: pc as usize,
                    }
                    .into());
                }
                self.processor.pc = pc;
            }
            Target::Registers => {
                expect_count(REGISTER_COUNT)?;
                let mut registers = [0; REGISTER_COUNT];
                registers.copy_from_slice(values);
                self.processor.registers = Registers::from_values(registers)?;
            }
            Target::Stack => {
                self.processor.stack = Stack::from_values(values.to_vec())?;
            }
            Target::Memory => {
                expect_count(2)?;
                self.processor.memory.write(values[0] as usize, values[1])?;
            }
            _ => return Err(DebugError::ReadOnly { target }),
        }

        info!("{} set to {:?}", target, values);
        Ok(())
    }

    /// Breakpoints and watchpoints need a written, nonzero address
    fn check_address(&self, address: Word) -> Result<(), DebugError> {
        if address == 0 || address as usize >= MEMORY_SIZE {
            return Err(DebugError::InvalidAddress { address });
        }
        if !self.processor.memory.is_written(address as usize) {
            return Err(DebugError::UnwrittenAddress { address });
        }
        Ok(())
    }

    /// Stops execution when the program counter reaches `address`
    pub fn breakpoint(&mut self, address: Word) -> Result<(), DebugError> {
        self.check_address(address)?;
        self.breakpoints.insert(address);

        info!("breakpoint at {}", address);
        Ok(())
    }

    /// Stops execution when the next instruction is a `rmem` or `wmem`
    /// on `address`
    pub fn watch(&mut self, address: Word) -> Result<(), DebugError> {
        self.check_address(address)?;
        self.watchpoints.insert(address);

        info!("watching {}", address);
        Ok(())
    }

    /// Stops execution when the next instruction is `name`
    pub fn breakop(&mut self, name: &str) -> Result<Opcode, DebugError> {
        let opcode = Opcode::from_mnemonic(name)
            .ok_or_else(|| DebugError::UnknownOpcode(name.to_string()))?;
        self.breakops.insert(opcode);

        info!("breaking on {}", opcode);
        Ok(opcode)
    }

    /// Writes the snapshot and the compacted core to the configured paths.
    ///
    /// The core only holds written cells, without their addresses.
    pub fn dump(&self) -> Result<(), DebugError> {
        self.snapshot().save(&self.paths.snapshot)?;
        image::write_file(&self.paths.core, &self.processor.memory.compact())?;

        info!(
            "dumped state to {} and core to {}",
            self.paths.snapshot.display(),
            self.paths.core.display()
        );
        Ok(())
    }

    /// Loads pc, registers and stack from a snapshot file. Memory is left
    /// alone; a halted machine becomes runnable again.
    pub fn restore(&mut self, path: &Path) -> Result<(), DebugError> {
        let snapshot = Snapshot::load(path)?;
        snapshot.apply(&mut self.processor)?;
        self.processor.resume();

        info!("restored state from {}", path.display());
        Ok(())
    }
}
