// Cypescript Interpreter Library
//
// Lexer, parser and tree-walking evaluator for Cypescript, a small C-like
// scripting language whose programs produce lines of text output.

// Public modules
pub mod ast;
pub mod error;
pub mod evaluator;
pub mod lexer;
pub mod output;
pub mod parser;
pub mod runner;
pub mod value;

// Re-export commonly used items
pub use ast::{Expr, Program, Stmt};
pub use error::{CypeError, ErrorKind, ExecuteError, Span};
pub use evaluator::{Environment, Evaluator};
pub use lexer::{tokenize, Lexer, Literal, Token, TokenKind};
pub use output::Output;
pub use parser::Parser;
pub use value::Value;

// Re-export main functions
pub use runner::{execute, execute_with, run, RunOptions};
