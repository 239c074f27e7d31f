use colored::*;
use std::fs::read_to_string;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Once;
use std::{env, io};
use tiel::errors::TielError;
use tiel::printer::AstPrinter;

const USAGE: &str = "Usage: tiel [OPTIONS] INPUT

Options:
  --tokens     Scans the source and prints the tokens.
  --ast        Scans and parses the source and prints the AST.
  --help       Shows this dialog.";

/// Command line settings.
#[derive(Debug, Default, PartialEq, Eq)]
struct Options {
    input: String,
    show_tokens: bool,
    show_ast: bool,
}

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Run(Options),
    Help,
}

fn parse_args(args: &[String]) -> Result<Command, String> {
    let mut options = Options::default();
    let mut input = None;
    for arg in args {
        match arg.as_str() {
            "--tokens" => options.show_tokens = true,
            "--ast" => options.show_ast = true,
            "--help" => return Ok(Command::Help),
            _ if arg.starts_with("--") => return Err(format!("Unknown option '{arg}'!")),
            _ => {
                if input.is_some() {
                    return Err("Too many positional arguments!".to_string());
                }
                input = Some(arg.clone());
            }
        }
    }
    options.input = input.ok_or_else(|| "No input file!".to_string())?;
    Ok(Command::Run(options))
}

static TRACING_INIT: Once = Once::new();

/// Installs a log subscriber when `RUST_LOG` is set, e.g.
/// `RUST_LOG=tiel=debug`.
fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if env::var("RUST_LOG").is_ok() {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(io::stderr).with_target(true).with_level(true))
                .with(EnvFilter::from_default_env())
                .init();
        }
    });
}

fn report(error: &TielError, filename: &str) {
    eprintln!(
        "{} {} {}",
        format!("[{}]", error.kind()).red(),
        error.to_string().red(),
        format!("in file {filename}").red()
    );
}

fn print_tokens(source: &str) -> Result<(), TielError> {
    let tokens = tiel::scan(source)?;
    println!("Tokens:");
    for token in &tokens {
        println!("{token}");
    }
    println!();
    Ok(())
}

fn print_ast(source: &str) -> Result<(), TielError> {
    let statements = tiel::parse(source)?;
    println!("AST:");
    println!("{}", AstPrinter::new().print_program(&statements));
    Ok(())
}

fn process(options: &Options, source: &str) -> Result<(), TielError> {
    if options.show_tokens {
        print_tokens(source)?;
    }
    if options.show_ast {
        print_ast(source)?;
    }
    tiel::run(source, &mut io::stdout().lock())
}

fn main() -> ExitCode {
    init_tracing();
    let args: Vec<String> = env::args().skip(1).collect();
    let options = match parse_args(&args) {
        Ok(Command::Run(options)) => options,
        Ok(Command::Help) => {
            println!("{USAGE}");
            return ExitCode::SUCCESS;
        }
        Err(msg) => {
            eprintln!("{}", format!("Usage error: {msg}").red());
            eprintln!("{USAGE}");
            return ExitCode::FAILURE;
        }
    };

    let path = Path::new(&options.input);
    let file_name = path.file_name().map_or(options.input.clone(), |n| n.to_string_lossy().into_owned());
    if !options.input.ends_with(".tiel") {
        eprintln!("{} {}", "[Warning]".yellow(), "file should have a .tiel extension!".yellow());
    }
    let source = match read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("{} {}", "[Error]".red(), format!("could not read {file_name}: {e}").red());
            return ExitCode::FAILURE;
        }
    };

    match process(&options, &source) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            report(&error, &file_name);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn input_and_flags() {
        assert_eq!(
            parse_args(&args(&["--ast", "prog.tiel", "--tokens"])),
            Ok(Command::Run(Options {
                input: "prog.tiel".to_string(),
                show_tokens: true,
                show_ast: true,
            }))
        );
    }

    #[test]
    fn help_wins() {
        assert_eq!(parse_args(&args(&["prog.tiel", "--help"])), Ok(Command::Help));
    }

    #[test]
    fn usage_errors() {
        assert_eq!(parse_args(&args(&[])), Err("No input file!".to_string()));
        assert_eq!(parse_args(&args(&["a", "b"])), Err("Too many positional arguments!".to_string()));
        assert_eq!(parse_args(&args(&["--fast", "a"])), Err("Unknown option '--fast'!".to_string()));
    }
}
