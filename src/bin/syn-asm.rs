use std::fs;
use std::path::PathBuf;

use argh::FromArgs;
use color_eyre::eyre::{eyre, Result, WrapErr};
use log::LevelFilter;
use simple_logger::SimpleLogger;

use synacor::assembler;
use synacor::memory::image;

/// Assembles program text into a binary image.
#[derive(FromArgs)]
struct Arguments {
    /// the program text to assemble
    #[argh(positional)]
    input: PathBuf,

    /// the image to write,
    /// defaults to the input with extension `bin`
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

    let source = fs::read_to_string(&args.input)
        .wrap_err_with(|| format!("failed to read {}", args.input.display()))?;

    let words = assembler::assemble(&source).map_err(|errors| {
        eyre!(
            "{} error(s) while assembling {}",
            errors.len(),
            args.input.display()
        )
    })?;

    let output = args
        .output
        .unwrap_or_else(|| args.input.with_extension("bin"));
    image::write_file(&output, &words)
        .wrap_err_with(|| format!("failed to write {}", output.display()))?;

    log::info!("wrote {} words to {}", words.len(), output.display());
    Ok(())
}
