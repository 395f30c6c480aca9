//! bash-ast - a typed AST parser for a POSIX/Bash subset
//!
//! This library parses shell script text into a typed abstract syntax tree
//! for programmatic analysis: classifying commands, tracking variable
//! mutations, and enforcing guardrails on command invocations. Nothing is
//! executed, expanded, or evaluated; the parser assigns structure to text.
//!
//! ```
//! use bash_ast::{parse, Command, ParseOptions};
//!
//! let program = parse("make build && make test", &ParseOptions::default()).unwrap();
//! assert!(matches!(program.statements[0].command, Command::Logical(_)));
//! ```

pub mod ast;
pub mod parser;

pub use ast::types::*;
pub use parser::{parse, Dialect, ParseError, ParseOptions, Parser};
