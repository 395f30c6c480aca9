//! Expansion Parser
//!
//! Intra-word scanning: quote runs, backtick slices, and the ordered
//! recognizers tried at `$`: `$((...))`, `$(...)`, `${...}`, `$name`,
//! `$digit`, `$special`. When no recognizer matches, the caller treats `$`
//! as a literal character.
//!
//! Substitution bodies are captured as raw slices by bracket counting only;
//! they are re-parsed later by the parser. `${...}` bodies are structurally
//! parsed against the fixed operator alphabet, falling back to storing the
//! entire bracketed content as the parameter name.

use crate::parser::lexer::{flush_literal, ParamPiece, WordPiece};
use crate::parser::types::ParseError;

/// The `${name<op>value}` operator alphabet, longest match first. Forms
/// outside this alphabet (substring, case modification, ...) are preserved
/// verbatim in the name field.
pub const PARAM_OPS: &[&str] = &[
    ":-", ":=", ":+", ":?", "##", "%%", "//", "-", "+", "=", "?", "#", "%", "/",
];

/// Special single-character parameters (`$@`, `$*`, ...).
const SPECIAL_PARAMS: &str = "@*#?-$!";

/// Scan a `'...'` run starting at the opening quote. Returns the contents
/// and the position just past the closing quote.
pub(crate) fn scan_sgl_quoted(
    chars: &[char],
    start: usize,
) -> Result<(String, usize), ParseError> {
    let mut i = start + 1;
    let mut text = String::new();
    loop {
        match chars.get(i) {
            None => return Err(ParseError::UnclosedSingleQuote),
            Some('\'') => return Ok((text, i + 1)),
            Some(&c) => {
                text.push(c);
                i += 1;
            }
        }
    }
}

/// Scan a `"..."` run starting at the opening quote. Only `\`, `$`, `` ` ``
/// and `"` are special inside; `\<newline>` is consumed, any other escape
/// is preserved verbatim as two characters in the literal stream.
pub(crate) fn scan_dbl_quoted(
    chars: &[char],
    start: usize,
) -> Result<(Vec<WordPiece>, usize), ParseError> {
    let mut i = start + 1;
    let mut pieces: Vec<WordPiece> = Vec::new();
    let mut lit = String::new();
    loop {
        match chars.get(i) {
            None => return Err(ParseError::UnclosedDoubleQuote),
            Some('"') => {
                flush_literal(&mut pieces, &mut lit);
                return Ok((pieces, i + 1));
            }
            Some('\\') => match chars.get(i + 1) {
                Some('\n') => i += 2,
                Some('\r') if chars.get(i + 2) == Some(&'\n') => i += 3,
                Some(&escaped) => {
                    lit.push('\\');
                    lit.push(escaped);
                    i += 2;
                }
                None => return Err(ParseError::UnclosedDoubleQuote),
            },
            Some('$') => match scan_dollar(chars, i)? {
                Some((piece, end)) => {
                    flush_literal(&mut pieces, &mut lit);
                    pieces.push(piece);
                    i = end;
                }
                None => {
                    lit.push('$');
                    i += 1;
                }
            },
            Some('`') => {
                let (raw, end) = scan_backtick(chars, i);
                flush_literal(&mut pieces, &mut lit);
                pieces.push(WordPiece::Backtick(raw));
                i = end;
            }
            Some(&c) => {
                lit.push(c);
                i += 1;
            }
        }
    }
}

/// Scan a backtick substitution starting at the opening backtick. The raw
/// slice runs to the next unescaped backtick (or end of input) and keeps
/// escape sequences verbatim.
pub(crate) fn scan_backtick(chars: &[char], start: usize) -> (String, usize) {
    let mut i = start + 1;
    let mut raw = String::new();
    loop {
        match chars.get(i) {
            None => return (raw, i),
            Some('`') => return (raw, i + 1),
            Some('\\') => {
                if let Some(&escaped) = chars.get(i + 1) {
                    raw.push('\\');
                    raw.push(escaped);
                    i += 2;
                } else {
                    raw.push('\\');
                    i += 1;
                }
            }
            Some(&c) => {
                raw.push(c);
                i += 1;
            }
        }
    }
}

/// Try the expansion recognizers at a `$`. Returns the scanned piece and
/// the position past it, or `None` when the `$` is literal.
pub(crate) fn scan_dollar(
    chars: &[char],
    start: usize,
) -> Result<Option<(WordPiece, usize)>, ParseError> {
    match chars.get(start + 1) {
        Some('(') if chars.get(start + 2) == Some(&'(') => {
            if let Some((expr, end)) = scan_arith_exp(chars, start) {
                return Ok(Some((WordPiece::ArithExp(expr), end)));
            }
            // `$( (cmd) )` and friends: not arithmetic after all.
            Ok(scan_cmd_subst(chars, start)
                .map(|(raw, end)| (WordPiece::CmdSubst(raw), end)))
        }
        Some('(') => Ok(scan_cmd_subst(chars, start)
            .map(|(raw, end)| (WordPiece::CmdSubst(raw), end))),
        Some('{') => match find_closing_brace(chars, start + 2) {
            Some(close) => {
                let inner: String = chars[start + 2..close].iter().collect();
                let param = parse_braced_param(&inner)?;
                Ok(Some((WordPiece::ParamExp(param), close + 1)))
            }
            None => Ok(None),
        },
        Some(&c) if c == '_' || c.is_ascii_alphabetic() => {
            let mut i = start + 1;
            let mut name = String::new();
            while let Some(&c) = chars.get(i) {
                if c == '_' || c.is_ascii_alphanumeric() {
                    name.push(c);
                    i += 1;
                } else {
                    break;
                }
            }
            Ok(Some((
                WordPiece::ParamExp(ParamPiece {
                    short: true,
                    name,
                    op: None,
                    value: None,
                }),
                i,
            )))
        }
        Some(&c) if c.is_ascii_digit() => Ok(Some((
            WordPiece::ParamExp(ParamPiece {
                short: true,
                name: c.to_string(),
                op: None,
                value: None,
            }),
            start + 2,
        ))),
        Some(&c) if SPECIAL_PARAMS.contains(c) => Ok(Some((
            WordPiece::ParamExp(ParamPiece {
                short: true,
                name: c.to_string(),
                op: None,
                value: None,
            }),
            start + 2,
        ))),
        _ => Ok(None),
    }
}

/// `$((...))` with depth-tracked close. Declines (returns `None`) when a
/// lone `)` closes the construct at depth zero, which makes the slice a
/// command substitution containing a subshell instead.
fn scan_arith_exp(chars: &[char], start: usize) -> Option<(String, usize)> {
    let mut i = start + 3;
    let mut depth = 0usize;
    loop {
        match chars.get(i) {
            None => return None,
            Some('(') => {
                depth += 1;
                i += 1;
            }
            Some(')') => {
                if depth > 0 {
                    depth -= 1;
                    i += 1;
                } else if chars.get(i + 1) == Some(&')') {
                    let expr: String = chars[start + 3..i].iter().collect();
                    return Some((expr, i + 2));
                } else {
                    return None;
                }
            }
            Some(_) => i += 1,
        }
    }
}

/// `$(...)` raw slice with paren-depth close. Quote runs and escapes are
/// skipped so a bracket inside quotes does not unbalance the count.
fn scan_cmd_subst(chars: &[char], start: usize) -> Option<(String, usize)> {
    let mut i = start + 2;
    let mut depth = 1usize;
    let mut in_sq = false;
    let mut in_dq = false;
    loop {
        match chars.get(i) {
            None => return None,
            Some('\\') if !in_sq && chars.get(i + 1).is_some() => i += 2,
            Some('\'') if !in_dq => {
                in_sq = !in_sq;
                i += 1;
            }
            Some('"') if !in_sq => {
                in_dq = !in_dq;
                i += 1;
            }
            Some('(') if !in_sq && !in_dq => {
                depth += 1;
                i += 1;
            }
            Some(')') if !in_sq && !in_dq => {
                depth -= 1;
                if depth == 0 {
                    let raw: String = chars[start + 2..i].iter().collect();
                    return Some((raw, i + 1));
                }
                i += 1;
            }
            Some(_) => i += 1,
        }
    }
}

/// Position of the `}` matching a `${` whose body starts at `from`.
fn find_closing_brace(chars: &[char], from: usize) -> Option<usize> {
    let mut i = from;
    let mut depth = 1usize;
    loop {
        match chars.get(i) {
            None => return None,
            Some('{') => {
                depth += 1;
                i += 1;
            }
            Some('}') => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
                i += 1;
            }
            Some(_) => i += 1,
        }
    }
}

/// Structural parse of a `${...}` body: optional `!`/`#` prefix, a name,
/// then optionally an operator from [`PARAM_OPS`] and a value. Anything
/// that does not fit keeps the entire body as the name, verbatim.
fn parse_braced_param(inner: &str) -> Result<ParamPiece, ParseError> {
    let chars: Vec<char> = inner.chars().collect();
    let mut i = 0;
    let mut name = String::new();

    if matches!(chars.first(), Some('!') | Some('#')) && chars.len() > 1 {
        name.push(chars[0]);
        i = 1;
    }

    let run_start = i;
    while let Some(&c) = chars.get(i) {
        if c == '_' || c.is_ascii_alphanumeric() {
            name.push(c);
            i += 1;
        } else {
            break;
        }
    }
    if i == run_start {
        if let Some(&c) = chars.get(i) {
            if SPECIAL_PARAMS.contains(c) {
                name.push(c);
                i += 1;
            }
        }
    }

    let rest: String = chars[i..].iter().collect();
    if rest.is_empty() {
        return Ok(ParamPiece {
            short: false,
            name,
            op: None,
            value: None,
        });
    }

    if !name.is_empty() {
        for op in PARAM_OPS {
            if let Some(value_text) = rest.strip_prefix(op) {
                let value = if value_text.is_empty() {
                    None
                } else {
                    Some(scan_pieces(value_text)?)
                };
                return Ok(ParamPiece {
                    short: false,
                    name,
                    op: Some(op),
                    value,
                });
            }
        }
    }

    // Leftover does not match a known operator: the whole bracketed
    // content becomes the name.
    Ok(ParamPiece {
        short: false,
        name: inner.to_string(),
        op: None,
        value: None,
    })
}

/// Scan free-standing text (a `${...}` operator value) into word pieces.
/// Unlike a word, nothing here terminates the scan except end of text.
pub(crate) fn scan_pieces(text: &str) -> Result<Vec<WordPiece>, ParseError> {
    let chars: Vec<char> = text.chars().collect();
    let mut pieces: Vec<WordPiece> = Vec::new();
    let mut lit = String::new();
    let mut i = 0;
    loop {
        match chars.get(i) {
            None => break,
            Some('\'') => {
                let (text, end) = scan_sgl_quoted(&chars, i)?;
                flush_literal(&mut pieces, &mut lit);
                pieces.push(WordPiece::SglQuoted(text));
                i = end;
            }
            Some('"') => {
                let (inner, end) = scan_dbl_quoted(&chars, i)?;
                flush_literal(&mut pieces, &mut lit);
                pieces.push(WordPiece::DblQuoted(inner));
                i = end;
            }
            Some('`') => {
                let (raw, end) = scan_backtick(&chars, i);
                flush_literal(&mut pieces, &mut lit);
                pieces.push(WordPiece::Backtick(raw));
                i = end;
            }
            Some('$') => match scan_dollar(&chars, i)? {
                Some((piece, end)) => {
                    flush_literal(&mut pieces, &mut lit);
                    pieces.push(piece);
                    i = end;
                }
                None => {
                    lit.push('$');
                    i += 1;
                }
            },
            Some('\\') => {
                lit.push('\\');
                if let Some(&escaped) = chars.get(i + 1) {
                    lit.push(escaped);
                    i += 2;
                } else {
                    i += 1;
                }
            }
            Some(&c) => {
                lit.push(c);
                i += 1;
            }
        }
    }
    flush_literal(&mut pieces, &mut lit);
    Ok(pieces)
}
