use std::fs;
use std::path::PathBuf;

use argh::FromArgs;
use color_eyre::eyre::{Result, WrapErr};
use log::LevelFilter;
use simple_logger::SimpleLogger;

use synacor::disassembler;
use synacor::memory::image;

/// Disassembles a binary image into program text.
#[derive(FromArgs)]
struct Arguments {
    /// the image to disassemble
    #[argh(positional)]
    input: PathBuf,

    /// the text file to write,
    /// if not specified, stdout is used
    #[argh(positional)]
    output: Option<PathBuf>,

    /// log level: off, error, warn, info, debug or trace
    #[argh(option, default = "LevelFilter::Warn")]
    log_level: LevelFilter,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let args: Arguments = argh::from_env();
    SimpleLogger::new().with_level(args.log_level).init()?;

    let program = image::read_file(&args.input)
        .wrap_err_with(|| format!("failed to load {}", args.input.display()))?;
    let text = disassembler::disassemble(&program).to_string();

    match args.output {
        Some(output) => fs::write(&output, text)
            .wrap_err_with(|| format!("failed to write {}", output.display()))?,
        None => print!("{}", text),
    }

    Ok(())
}
