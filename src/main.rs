use std::io::{self, Read};
use std::path::PathBuf;

use clap::{Parser as ClapParser, Subcommand};
use plumb_lang::cli::{self, CheckOptions, CheckResult, CliError, FmtOptions, FmtResult};

#[derive(ClapParser)]
#[command(name = "plumb")]
#[command(about = "Plumb - a pipeline scripting language for chained invocation programs")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print (or rewrite) the canonical form of a script
    Fmt {
        /// Script file (reads from stdin if not provided)
        file: Option<PathBuf>,

        /// Rewrite the file in place
        #[arg(short, long)]
        write: bool,
    },

    /// Validate a script, optionally evaluating it
    Check {
        /// Script file (reads from stdin if not provided)
        file: Option<PathBuf>,

        /// Evaluate against an empty scope and print the bindings
        #[arg(short, long)]
        eval: bool,

        /// Machine-readable JSON output
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Fmt { file, write } => run_fmt(file, write),
        Commands::Check { file, eval, json } => run_check(file, eval, json),
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

/// Read the script source from a file, or from stdin when piped.
fn read_source(file: &Option<PathBuf>) -> Result<Option<String>, CliError> {
    match file {
        Some(path) => Ok(Some(std::fs::read_to_string(path)?)),
        None if !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer).map_err(CliError::Io)?;
            Ok(Some(buffer))
        }
        None => Ok(None),
    }
}

fn run_fmt(file: Option<PathBuf>, write: bool) -> Result<(), CliError> {
    let options = if file.is_some() {
        FmtOptions {
            path: file,
            script: None,
            write,
        }
    } else {
        FmtOptions {
            path: None,
            script: read_source(&None)?,
            write: false,
        }
    };

    match cli::execute_fmt(&options)? {
        FmtResult::Formatted(text) => print!("{}", text),
        FmtResult::Rewritten => println!("rewrote {}", options.path.unwrap().display()),
        FmtResult::Unchanged => {}
    }
    Ok(())
}

fn run_check(file: Option<PathBuf>, eval: bool, json: bool) -> Result<(), CliError> {
    let script = read_source(&file)?.ok_or(CliError::NoInput)?;

    let options = CheckOptions { script, eval, json };

    let result = match cli::execute_check(&options) {
        Ok(result) => result,
        Err(e) if json => {
            let report = serde_json::json!({ "valid": false, "error": e.to_string() });
            println!("{}", report);
            std::process::exit(1);
        }
        Err(e) => return Err(e),
    };

    match result {
        CheckResult::SyntaxValid => {
            if json {
                println!("{}", serde_json::json!({ "valid": true }));
            } else {
                println!("Syntax is valid");
            }
        }
        CheckResult::Evaluated(bindings) => {
            if json {
                println!(
                    "{}",
                    serde_json::json!({ "valid": true, "bindings": bindings })
                );
            } else {
                println!("{}", serde_json::to_string_pretty(&bindings).unwrap());
            }
        }
    }
    Ok(())
}
