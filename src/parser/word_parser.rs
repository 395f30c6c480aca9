//! Word Parser
//!
//! Converts the structured word pieces carried by word tokens into AST
//! words. Command substitutions, backticks, and process substitutions were
//! captured as raw slices by the lexer; this module re-enters the full
//! lexer/parser pipeline on those slices and stores the resulting statement
//! lists. Errors inside embedded programs propagate: the first error in
//! source order fails the whole parse.

use crate::ast::types::{
    ArithExp, CmdSubst, ParamExp, ProcSubst, Statement, Word, WordPart,
};
use crate::parser::lexer::WordPiece;
use crate::parser::parser::Parser;
use crate::parser::types::{ParseError, ParseOptions};

pub(crate) fn word_from_pieces(
    pieces: &[WordPiece],
    options: &ParseOptions,
) -> Result<Word, ParseError> {
    let mut parts = Vec::with_capacity(pieces.len());
    for piece in pieces {
        parts.push(part_from_piece(piece, options)?);
    }
    Ok(Word { parts })
}

fn part_from_piece(piece: &WordPiece, options: &ParseOptions) -> Result<WordPart, ParseError> {
    Ok(match piece {
        WordPiece::Literal(text) => WordPart::Literal(text.clone()),
        WordPiece::SglQuoted(text) => WordPart::SglQuoted(text.clone()),
        WordPiece::DblQuoted(inner) => {
            let mut parts = Vec::with_capacity(inner.len());
            for piece in inner {
                parts.push(part_from_piece(piece, options)?);
            }
            WordPart::DblQuoted(parts)
        }
        WordPiece::ParamExp(param) => {
            let value = match &param.value {
                Some(pieces) => Some(word_from_pieces(pieces, options)?),
                None => None,
            };
            WordPart::ParamExp(ParamExp {
                short: param.short,
                name: param.name.clone(),
                op: param.op.map(str::to_string),
                value,
            })
        }
        WordPiece::CmdSubst(raw) => WordPart::CmdSubst(CmdSubst {
            statements: parse_embedded(raw, options)?,
        }),
        // Backticks are command substitutions in the AST; `\`` protected
        // the closing quote in the raw slice and is unescaped before the
        // inner program is parsed.
        WordPiece::Backtick(raw) => WordPart::CmdSubst(CmdSubst {
            statements: parse_embedded(&raw.replace("\\`", "`"), options)?,
        }),
        WordPiece::ArithExp(expr) => WordPart::ArithExp(ArithExp { expr: expr.clone() }),
        WordPiece::ProcSubst { direction, body } => WordPart::ProcSubst(ProcSubst {
            direction: *direction,
            statements: parse_embedded(body, options)?,
        }),
    })
}

/// Tokenize and parse an embedded sublanguage slice as a complete program.
pub(crate) fn parse_embedded(
    source: &str,
    options: &ParseOptions,
) -> Result<Vec<Statement>, ParseError> {
    let mut parser = Parser::new(options.clone());
    Ok(parser.parse(source)?.statements)
}
