//! CLI front end: read a `.tex` file, parse it, and print the resulting
//! document tree as JSON.

use clap::Parser;
use latex_reader::{read_latex, ReaderOptions};
use log::LevelFilter;
use simplelog::{Config, SimpleLogger};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "latex_reader", about = "Parse LaTeX source into a structured document tree")]
struct Cli {
    /// Path to the `.tex` file to parse.
    input: PathBuf,

    /// Comma-separated extension flags (raw_tex, latex_macros, smart, literate_haskell).
    #[arg(long, value_name = "LIST")]
    ext: Option<String>,

    /// Emit compact JSON instead of pretty-printed.
    #[arg(long)]
    compact: bool,

    /// Default extension appended to extensionless `\includegraphics` targets.
    #[arg(long, default_value = "")]
    default_image_extension: String,

    /// Increase log verbosity (-v for info, -vv for debug).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    let _ = SimpleLogger::init(level, Config::default());

    let source = match std::fs::read_to_string(&cli.input) {
        Ok(s) => s,
        Err(err) => {
            eprintln!("error: could not read {}: {}", cli.input.display(), err);
            return ExitCode::FAILURE;
        }
    };

    let mut options = ReaderOptions::default();
    if let Some(ext) = &cli.ext {
        options.extensions = latex_reader::options::Extensions::parse_list(ext);
    }
    options.default_image_extension = cli.default_image_extension;
    if let Some(dir) = cli.input.parent() {
        options.resource_path = vec![dir.to_path_buf()];
    }
    options.input_sources = vec![cli.input.clone()];

    match read_latex(&source, &options) {
        Ok((doc, _logs)) => {
            let rendered = if cli.compact {
                serde_json::to_string(&doc)
            } else {
                serde_json::to_string_pretty(&doc)
            };
            match rendered {
                Ok(json) => {
                    println!("{}", json);
                    ExitCode::SUCCESS
                }
                Err(err) => {
                    eprintln!("error: could not serialize document: {}", err);
                    ExitCode::FAILURE
                }
            }
        }
        Err(err) => {
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}

