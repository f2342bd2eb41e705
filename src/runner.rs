use crate::ast::Program;
use crate::error::{CypeError, ExecuteError};
use crate::evaluator::Evaluator;
use crate::lexer::Lexer;
use crate::parser::Parser;

/// Knobs for one run. `Default` gives the compatible behaviour: lenient
/// lexing and no step limit.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Raise lexical anomalies instead of skipping them.
    pub strict_lexing: bool,
    /// Abort after this many statements and loop iterations.
    pub step_limit: Option<u64>,
    /// Print every token to stderr before running.
    pub show_tokens: bool,
    /// Pretty-print the parsed program to stderr before running.
    pub show_ast: bool,
}

/// Run `source` and return its output lines joined by newlines.
pub fn execute(source: &str) -> Result<String, ExecuteError> {
    execute_with(source, &RunOptions::default())
}

pub fn execute_with(source: &str, options: &RunOptions) -> Result<String, ExecuteError> {
    let program = compile(source, options, &mut Vec::new())?;
    let lines = evaluator_for(options).evaluate(&program)?;
    Ok(lines.join("\n"))
}

/// Command-line driver: prints output to stdout and diagnostics to stderr.
/// Returns whether the program ran successfully.
pub fn run(source: &str, filename: Option<&str>, options: &RunOptions) -> bool {
    let mut warnings = Vec::new();
    let compiled = compile(source, options, &mut warnings);

    for warning in &warnings {
        warning.warn(source, filename);
    }

    let program = match compiled {
        Ok(program) => program,
        Err(error) => return fail(error, source, filename),
    };

    match evaluator_for(options).evaluate(&program) {
        Ok(lines) => {
            if !lines.is_empty() {
                println!("{}", lines.join("\n"));
            }
            true
        }
        Err(error) => fail(error, source, filename),
    }
}

fn fail(error: CypeError, source: &str, filename: Option<&str>) -> bool {
    error.report(source, filename);
    eprintln!("{}", ExecuteError::from(error));
    false
}

fn compile(source: &str, options: &RunOptions, warnings: &mut Vec<CypeError>) -> Result<Program, CypeError> {
    // Lexical analysis
    let mut lexer = Lexer::new(source).strict(options.strict_lexing);
    let scanned = lexer.scan_tokens();
    if !options.strict_lexing {
        warnings.extend(lexer.anomalies().iter().cloned());
    }
    let tokens = scanned?;

    if options.show_tokens {
        for token in &tokens {
            eprintln!("{}", token);
        }
    }

    // Parsing
    let program = Parser::new(tokens).parse()?;

    if options.show_ast {
        eprintln!("{:#?}", program);
    }

    Ok(program)
}

fn evaluator_for(options: &RunOptions) -> Evaluator {
    match options.step_limit {
        Some(limit) => Evaluator::with_step_limit(limit),
        None => Evaluator::new(),
    }
}
