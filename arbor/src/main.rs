use std::env;
use std::fs;
use std::process::ExitCode;

use anyhow::{bail, Context};
use arbor::{CompileError, Compiler};
use glint::errors::pretty;
use tracing_subscriber::EnvFilter;

struct Options {
    input: String,
    output: Option<String>,
    check_only: bool,
    annotate: bool,
    verbose: bool,
}

fn main() -> ExitCode {
    let options = match parse_args(env::args().skip(1).collect()) {
        Ok(options) => options,
        Err(err) => {
            eprintln!("{}\n{}", err, usage());
            return ExitCode::FAILURE;
        }
    };
    init_logging(options.verbose);

    match run(&options) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn usage() -> &'static str {
    "usage: arbor [-v] [--check] [--annotate] <input> [-o <output>]"
}

fn parse_args(args: Vec<String>) -> anyhow::Result<Options> {
    let mut options = Options {
        input: String::new(),
        output: None,
        check_only: false,
        annotate: false,
        verbose: false,
    };

    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-o" | "--output" => {
                let Some(path) = args.next() else {
                    bail!("{} requires a path", arg);
                };
                options.output = Some(path);
            }
            "--check" => options.check_only = true,
            "--annotate" => options.annotate = true,
            "-v" | "--verbose" => options.verbose = true,
            flag if flag.starts_with('-') => bail!("unknown flag '{}'", flag),
            _ if options.input.is_empty() => options.input = arg,
            _ => bail!("unexpected argument '{}'", arg),
        }
    }

    if options.input.is_empty() {
        bail!("no input file");
    }
    Ok(options)
}

/// Returns whether the shader compiled; a rejected shader is reported, not
/// raised as an error of the tool itself.
fn run(options: &Options) -> anyhow::Result<bool> {
    let source = fs::read_to_string(&options.input)
        .with_context(|| format!("failed to read '{}'", options.input))?;

    let mut program = match glint::parser::parse(&source) {
        Ok(program) => program,
        Err(err) => {
            eprintln!("{}", pretty::format_frontend_error(&options.input, &source, &err));
            return Ok(false);
        }
    };

    if options.check_only {
        let verdict = glint::TypeChecker::new().check_program(&mut program);
        report(&options.input, &source, &verdict);
        if verdict.passed() {
            println!("check passed: {}", options.input);
        }
        return Ok(verdict.passed());
    }

    let compiler = Compiler::new().with_annotations(options.annotate);
    let output = match compiler.compile_program(&mut program) {
        Ok(output) => output,
        Err(CompileError::Rejected(verdict)) => {
            report(&options.input, &source, &verdict);
            return Ok(false);
        }
        Err(err) => return Err(err.into()),
    };

    match &options.output {
        Some(path) => {
            fs::write(path, output.to_string())
                .with_context(|| format!("failed to write '{}'", path))?;
            tracing::info!(path = path.as_str(), "wrote fragment program");
        }
        None => print!("{}", output),
    }
    Ok(true)
}

fn report(label: &str, source: &str, verdict: &glint::Verdict) {
    for rendered in pretty::format_diagnostics(label, source, &verdict.diagnostics) {
        eprintln!("{}\n", rendered);
    }
    if !verdict.passed() {
        eprintln!(
            "check failed with {} diagnostic(s): {}",
            verdict.diagnostics.len(),
            label
        );
    }
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
