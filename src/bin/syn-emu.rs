use std::fs;
use std::io;
use std::path::PathBuf;

use argh::FromArgs;
use color_eyre::eyre::{Result, WrapErr};
use log::LevelFilter;
use simple_logger::SimpleLogger;

use synacor::console::StdConsole;
use synacor::debugger::{Debugger, DumpPaths};
use synacor::memory::image;
use synacor::processor::Processor;
use synacor::session::Session;

/// Runs a binary image, optionally under the debugger.
#[derive(FromArgs)]
struct Arguments {
    /// the image to run
    #[argh(positional)]
    program: PathBuf,

    /// start an interactive debug session instead of running to completion
    #[argh(switch, short = 'd')]
    debug: bool,

    /// file whose bytes are fed to the program before stdin
    #[argh(option, short = 'i')]
    input: Option<PathBuf>,

    /// where `dump` writes the snapshot, defaults to `snapshot.json`
    #[argh(option)]
    snapshot: Option<PathBuf>,

    /// where `dump` writes the core, defaults to `core.bin`
    #[argh(option)]
    core: Option<PathBuf>,

    /// log level: off, error, warn, info, debug or trace
    #[argh(option, default = "LevelFilter::Warn")]
    log_level: LevelFilter,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let args: Arguments = argh::from_env();
    SimpleLogger::new().with_level(args.log_level).init()?;

    let program = image::read_file(&args.program)
        .wrap_err_with(|| format!("failed to load {}", args.program.display()))?;

    let mut console = match &args.input {
        Some(path) => StdConsole::with_input(
            fs::read(path).wrap_err_with(|| format!("failed to read {}", path.display()))?,
        ),
        None => StdConsole::new(),
    };

    if args.debug {
        let defaults = DumpPaths::default();
        let paths = DumpPaths {
            snapshot: args.snapshot.unwrap_or(defaults.snapshot),
            core: args.core.unwrap_or(defaults.core),
        };

        let debugger = Debugger::new(program, console)
            .wrap_err_with(|| format!("failed to load {}", args.program.display()))?
            .with_dump_paths(paths);

        let mut session = Session::new(debugger);
        session.run(|line| io::stdin().read_line(line), io::stdout())?;
        return Ok(());
    }

    let mut processor = Processor::new(&program)
        .wrap_err_with(|| format!("failed to load {}", args.program.display()))?;
    let res = processor.execute_until_halt(&mut console);
    console.flush();

    let halt = res.wrap_err_with(|| format!("program faulted at {}", processor.pc))?;
    eprintln!("{} at {}", halt, processor.pc);

    Ok(())
}
