//! Parser Types and Constants
//!
//! The error catalog, parse options, and keyword tables shared across the
//! lexer and parser modules.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Every way a parse can fail. Any error is fatal: the first one in source
/// order aborts the parse and is returned to the caller. There is no
/// partial AST and no recovery.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unexpected EOF while looking for matching `''")]
    UnclosedSingleQuote,

    #[error("unexpected EOF while looking for matching `\"'")]
    UnclosedDoubleQuote,

    #[error("unclosed array expression")]
    UnclosedArrayExpression,

    /// A subshell, block, or bracketed construct reached EOF before its
    /// closing symbol.
    #[error("unexpected end of input, expected `{0}'")]
    UnclosedGroup(String),

    /// A compound command reached EOF before one of its end keywords.
    #[error("unexpected end of input, expected one of: {0}")]
    UnclosedStructure(String),

    #[error("unexpected token `{0}'")]
    UnexpectedToken(String),

    #[error("expected `{0}'")]
    ExpectedSymbol(String),

    #[error("expected keyword `{0}'")]
    ExpectedKeyword(String),

    /// A command position yielded no words, assignments, or redirects.
    #[error("expected a command word")]
    ExpectedCommandWord,

    #[error("redirect operator without a target")]
    RedirectWithoutTarget,

    #[error("let: expression expected")]
    LetRequiresExpression,

    /// Defensive: the word accumulator produced no parts.
    #[error("unexpected character `{0}'")]
    UnexpectedCharacter(char),
}

/// Shell dialect. Accepted and stored for forward compatibility; reserved —
/// the parser currently implements a Bash-leaning superset regardless of
/// the selected dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Dialect {
    Posix,
    #[default]
    Bash,
    Mksh,
    Zsh,
}

/// Parser configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParseOptions {
    /// Reserved; does not currently alter parsing.
    pub dialect: Dialect,
    /// Collect `#` comment bodies into `Program::comments` instead of
    /// discarding them.
    pub keep_comments: bool,
}

/// Reserved words recognized by the parser when they appear as a bare
/// literal word in command position.
pub const RESERVED_WORDS: &[&str] = &[
    "if", "then", "elif", "else", "fi", "while", "until", "do", "done", "for", "in", "select",
    "case", "esac", "time", "coproc", "function", "let", "[[", "]]",
];

/// Keywords that head a declaration clause. They act as keywords only in
/// leading command position; in argument position they are ordinary words.
pub const DECL_KEYWORDS: &[(&str, crate::ast::types::DeclVariant)] = &[
    ("declare", crate::ast::types::DeclVariant::Declare),
    ("local", crate::ast::types::DeclVariant::Local),
    ("export", crate::ast::types::DeclVariant::Export),
    ("readonly", crate::ast::types::DeclVariant::Readonly),
    ("typeset", crate::ast::types::DeclVariant::Typeset),
    ("nameref", crate::ast::types::DeclVariant::Nameref),
];

/// End keywords that can never begin a command.
pub const MISPLACED_KEYWORDS: &[&str] =
    &["then", "elif", "else", "fi", "do", "done", "esac", "in", "]]"];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_display_short_messages() {
        assert_eq!(
            ParseError::UnclosedArrayExpression.to_string(),
            "unclosed array expression"
        );
        assert_eq!(
            ParseError::UnclosedStructure("then".into()).to_string(),
            "unexpected end of input, expected one of: then"
        );
        assert_eq!(
            ParseError::UnexpectedToken(")".into()).to_string(),
            "unexpected token `)'"
        );
    }

    #[test]
    fn dialect_defaults_to_bash() {
        assert_eq!(ParseOptions::default().dialect, Dialect::Bash);
        assert!(!ParseOptions::default().keep_comments);
    }

    #[test]
    fn keyword_tables_cover_the_reserved_set() {
        for kw in ["if", "coproc", "[[", "]]", "let", "select"] {
            assert!(RESERVED_WORDS.contains(&kw));
        }
        assert!(MISPLACED_KEYWORDS.iter().all(|kw| RESERVED_WORDS.contains(kw)));
        assert_eq!(DECL_KEYWORDS.len(), 6);
    }
}
