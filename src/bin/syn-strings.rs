use std::path::PathBuf;

use argh::FromArgs;
use color_eyre::eyre::{Result, WrapErr};
use log::LevelFilter;
use simple_logger::SimpleLogger;

use synacor::memory::image;
use synacor::strings;

/// Prints the text a binary image writes with literal `out` instructions.
#[derive(FromArgs)]
struct Arguments {
    /// the image to scan
    #[argh(positional)]
    input: PathBuf,

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

    for text in strings::find_strings(&program) {
        println!("{}", text);
    }

    Ok(())
}
