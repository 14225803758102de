use std::env;
use std::fs;
use std::process::ExitCode;

use anyhow::{bail, Context};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let mut args = env::args().skip(1).collect::<Vec<_>>();
    let verbose = take_flag(&mut args, "-v") | take_flag(&mut args, "--verbose");
    init_logging(verbose);

    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

/// Returns whether the command succeeded; a shader that fails checking is not an
/// error of the tool itself.
fn run(args: &[String]) -> anyhow::Result<bool> {
    match args.first().map(String::as_str) {
        None | Some("repl") => {
            glint::repl::run()?;
            Ok(true)
        }
        Some("check") => {
            let Some(file) = args.get(1) else {
                bail!("check usage: glint check <file>");
            };
            run_check_command(file)
        }
        Some("help") | Some("--help") | Some("-h") => {
            println!("usage: glint [-v] [repl]");
            println!("       glint [-v] check <file>");
            Ok(true)
        }
        Some(other) => bail!("unknown command '{}'; use `glint help`", other),
    }
}

fn run_check_command(file: &str) -> anyhow::Result<bool> {
    let source =
        fs::read_to_string(file).with_context(|| format!("failed to read '{}'", file))?;

    let (_, verdict) = match glint::check_source(&source) {
        Ok(checked) => checked,
        Err(err) => {
            eprintln!(
                "{}",
                glint::errors::pretty::format_frontend_error(file, &source, &err)
            );
            return Ok(false);
        }
    };

    for rendered in glint::errors::pretty::format_diagnostics(file, &source, &verdict.diagnostics) {
        eprintln!("{}\n", rendered);
    }

    if verdict.passed() {
        println!("check passed: {}", file);
    } else {
        println!(
            "check failed with {} diagnostic(s): {}",
            verdict.diagnostics.len(),
            file
        );
    }
    Ok(verdict.passed())
}

fn take_flag(args: &mut Vec<String>, flag: &str) -> bool {
    let before = args.len();
    args.retain(|arg| arg != flag);
    args.len() != before
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("GLINT_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
