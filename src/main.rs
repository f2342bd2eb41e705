use clap::{Arg, ArgAction, Command};
use cypescript::{run, RunOptions};
use std::fs;
use std::io;
use std::path::Path;
use std::process::ExitCode;

fn main() -> ExitCode {
    let matches = Command::new("cype")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Runs Cypescript programs and prints their output")
        .arg(
            Arg::new("file")
                .help("The script file to execute; reads standard input when omitted or '-'")
                .value_name("FILE")
                .index(1),
        )
        .arg(
            Arg::new("strict")
                .long("strict")
                .help("Treat unknown characters and unterminated strings or comments as errors")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("max-steps")
                .long("max-steps")
                .value_name("N")
                .help("Abort after N statements and loop iterations")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("tokens")
                .long("tokens")
                .help("Print the token stream to stderr before running")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("ast")
                .long("ast")
                .help("Print the syntax tree to stderr before running")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let options = RunOptions {
        strict_lexing: matches.get_flag("strict"),
        step_limit: matches.get_one::<u64>("max-steps").copied(),
        show_tokens: matches.get_flag("tokens"),
        show_ast: matches.get_flag("ast"),
    };

    let file = matches.get_one::<String>("file").filter(|path| path.as_str() != "-");
    let (source, filename) = match file {
        Some(path) => match read_file(path) {
            Ok(source) => (source, path.as_str()),
            Err(message) => {
                eprintln!("{}", message);
                return ExitCode::FAILURE;
            }
        },
        None => match io::read_to_string(io::stdin()) {
            Ok(source) => (source, "<stdin>"),
            Err(e) => {
                eprintln!("Error reading standard input: {}", e);
                return ExitCode::FAILURE;
            }
        },
    };

    if run(&source, Some(filename), &options) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn read_file(path: &str) -> Result<String, String> {
    let path = Path::new(path);

    if !path.exists() {
        return Err(format!("Error: File '{}' not found", path.display()));
    }

    fs::read_to_string(path).map_err(|e| format!("Error reading file '{}': {}", path.display(), e))
}
