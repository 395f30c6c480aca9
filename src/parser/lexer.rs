//! Lexer for Bash Scripts
//!
//! The lexer tokenizes input into a stream of tokens that the parser
//! consumes. The lexical class of a character depends on scanner state: a
//! position is "at a boundary" when preceded by whitespace, a newline, an
//! operator, a grouping symbol, or the start of input. Boundary status gates
//! the interpretation of `#` (comment), `!` (negation operator), `((`
//! (arithmetic command), and `<(` / `>(` (process substitution); anywhere
//! else these characters continue a word.
//!
//! Words are emitted with structured internal pieces. Command, backtick, and
//! process substitutions are carried as raw slices and re-parsed later by
//! the parser; the lexer only counts brackets.

use std::collections::VecDeque;

use crate::ast::types::{ProcessDirection, RedirOp};
use crate::parser::expansion_parser::{
    scan_backtick, scan_dbl_quoted, scan_dollar, scan_sgl_quoted,
};
use crate::parser::types::{ParseError, ParseOptions};

/// List-level operator tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    AndAnd, // &&
    OrOr,   // ||
    Pipe,   // |
    Semi,   // ; (also emitted for each bare newline)
    Amp,    // &
    Bang,   // !
}

impl Op {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AndAnd => "&&",
            Self::OrOr => "||",
            Self::Pipe => "|",
            Self::Semi => ";",
            Self::Amp => "&",
            Self::Bang => "!",
        }
    }
}

/// Grouping symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbol {
    LParen, // (
    RParen, // )
    LBrace, // {
    RBrace, // }
}

impl Symbol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LParen => "(",
            Self::RParen => ")",
            Self::LBrace => "{",
            Self::RBrace => "}",
        }
    }
}

/// A structured fragment of a word token. Mirrors the AST word parts except
/// that substitutions carry raw slices, to be re-parsed by the parser.
#[derive(Debug, Clone, PartialEq)]
pub enum WordPiece {
    Literal(String),
    SglQuoted(String),
    DblQuoted(Vec<WordPiece>),
    ParamExp(ParamPiece),
    /// `$(...)` — raw inner slice.
    CmdSubst(String),
    /// `` `...` `` — raw inner slice.
    Backtick(String),
    /// `$((...))` — verbatim expression.
    ArithExp(String),
    /// `<(...)` / `>(...)` — raw inner slice.
    ProcSubst {
        direction: ProcessDirection,
        body: String,
    },
}

/// Parameter expansion as scanned. When a `${...}` body does not match the
/// operator alphabet, the whole bracketed content lands in `name`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamPiece {
    pub short: bool,
    pub name: String,
    pub op: Option<&'static str>,
    pub value: Option<Vec<WordPiece>>,
}

/// A token produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Word(Vec<WordPiece>),
    Op(Op),
    Redir { op: RedirOp, fd: Option<String> },
    Symbol(Symbol),
    /// `(( expr ))` in command position; the expression is trimmed.
    ArithCommand(String),
    /// A collected here-document body, emitted after the newline that
    /// triggered collection, in redirect order.
    HeredocBody(String),
    /// Emitted only when the keep-comments option is set; text excludes
    /// the `#`.
    Comment(String),
}

impl Token {
    /// Short display form for error messages.
    pub fn display(&self) -> String {
        match self {
            Token::Word(pieces) => word_token_text(pieces),
            Token::Op(op) => op.as_str().to_string(),
            Token::Symbol(sym) => sym.as_str().to_string(),
            Token::Redir { op, fd } => match fd {
                Some(fd) => format!("{}{}", fd, op),
                None => op.to_string(),
            },
            Token::ArithCommand(expr) => format!("(({}))", expr),
            Token::HeredocBody(_) => "here-document".to_string(),
            Token::Comment(text) => format!("#{}", text),
        }
    }
}

/// Textual rendering of a word piece, used for keyword recognition targets,
/// loop variables, and heredoc delimiters.
pub(crate) fn piece_text(piece: &WordPiece) -> String {
    match piece {
        WordPiece::Literal(s) | WordPiece::SglQuoted(s) => s.clone(),
        WordPiece::DblQuoted(inner) => inner.iter().map(piece_text).collect(),
        WordPiece::ParamExp(p) => {
            if p.short {
                format!("${}", p.name)
            } else {
                format!("${{{}}}", p.name)
            }
        }
        WordPiece::CmdSubst(raw) => format!("$({})", raw),
        WordPiece::Backtick(raw) => format!("`{}`", raw),
        WordPiece::ArithExp(expr) => format!("$(({}))", expr),
        WordPiece::ProcSubst { direction, body } => format!("{}({})", direction, body),
    }
}

pub(crate) fn word_token_text(pieces: &[WordPiece]) -> String {
    pieces.iter().map(piece_text).collect()
}

/// Redirect operators by longest match.
const THREE_CHAR_REDIRS: &[(&str, RedirOp)] = &[
    ("<<<", RedirOp::TLess),
    ("&>>", RedirOp::AndDGreat),
    ("<<-", RedirOp::DLessDash),
];

const TWO_CHAR_REDIRS: &[(&str, RedirOp)] = &[
    (">>", RedirOp::DGreat),
    (">&", RedirOp::GreatAnd),
    (">|", RedirOp::Clobber),
    ("<>", RedirOp::LessGreat),
    ("<&", RedirOp::LessAnd),
    ("&>", RedirOp::AndGreat),
    ("<<", RedirOp::DLess),
];

/// Characters that end an unquoted word.
pub(crate) fn is_word_end(c: char) -> bool {
    matches!(
        c,
        ' ' | '\t' | '\r' | '\n' | ';' | '&' | '|' | '(' | ')' | '<' | '>'
    )
}

/// A `<<`/`<<-` redirect whose body has not been collected yet. The lexer
/// owns this bookkeeping; tokens themselves stay immutable.
#[derive(Debug, Clone)]
struct PendingHeredoc {
    /// Index of the redirect token; the delimiter is the word that follows
    /// it.
    redir_index: usize,
    strip_tabs: bool,
}

/// Single-pass, left-to-right tokenizer.
pub struct Lexer {
    input: Vec<char>,
    pos: usize,
    at_boundary: bool,
    keep_comments: bool,
    tokens: Vec<Token>,
    pending_heredocs: VecDeque<PendingHeredoc>,
}

impl Lexer {
    pub fn new(input: &str, options: &ParseOptions) -> Self {
        Self {
            input: input.chars().collect(),
            pos: 0,
            at_boundary: true,
            keep_comments: options.keep_comments,
            tokens: Vec::new(),
            pending_heredocs: VecDeque::new(),
        }
    }

    /// Tokenize the entire input.
    pub fn tokenize(mut self) -> Result<Vec<Token>, ParseError> {
        while let Some(&c) = self.input.get(self.pos) {
            match c {
                ' ' | '\t' | '\r' => {
                    self.pos += 1;
                    self.at_boundary = true;
                }
                '\\' if self.at_line_continuation() => {
                    self.skip_line_continuation();
                    self.at_boundary = true;
                }
                '\n' => {
                    self.pos += 1;
                    self.tokens.push(Token::Op(Op::Semi));
                    self.collect_heredocs();
                    self.at_boundary = true;
                }
                '#' if self.at_boundary => self.read_comment(),
                '(' if self.at_boundary && self.input.get(self.pos + 1) == Some(&'(') => {
                    self.scan_arith_command()?;
                    self.at_boundary = true;
                }
                '<' | '>'
                    if self.at_boundary && self.input.get(self.pos + 1) == Some(&'(') =>
                {
                    self.scan_proc_subst(c)?;
                    self.at_boundary = false;
                }
                _ => {
                    if self.scan_operator() {
                        self.at_boundary = true;
                    } else {
                        let token = self.read_word()?;
                        self.tokens.push(token);
                        self.at_boundary = false;
                    }
                }
            }
        }
        Ok(self.tokens)
    }

    fn at_line_continuation(&self) -> bool {
        match self.input.get(self.pos + 1) {
            Some('\n') => true,
            Some('\r') => self.input.get(self.pos + 2) == Some(&'\n'),
            _ => false,
        }
    }

    fn skip_line_continuation(&mut self) {
        // `\` + `\n` or `\` + `\r\n`
        if self.input.get(self.pos + 1) == Some(&'\r') {
            self.pos += 3;
        } else {
            self.pos += 2;
        }
    }

    fn read_comment(&mut self) {
        self.pos += 1; // '#'
        let start = self.pos;
        while let Some(&c) = self.input.get(self.pos) {
            if c == '\n' {
                break;
            }
            self.pos += 1;
        }
        if self.keep_comments {
            let text: String = self.input[start..self.pos].iter().collect();
            self.tokens.push(Token::Comment(text));
        }
    }

    /// Try to match an operator, redirect, or grouping symbol at the cursor.
    /// Returns true when a token was consumed and pushed.
    fn scan_operator(&mut self) -> bool {
        let Some(&c) = self.input.get(self.pos) else {
            return false;
        };
        let next = self.input.get(self.pos + 1).copied();

        // A digit run immediately followed by a redirect operator attaches
        // as the fd field; otherwise the digits begin a word.
        if c.is_ascii_digit() {
            let mut j = self.pos;
            while matches!(self.input.get(j), Some(d) if d.is_ascii_digit()) {
                j += 1;
            }
            if let Some((op, len)) = self.match_redir(j) {
                if !matches!(op, RedirOp::AndGreat | RedirOp::AndDGreat) {
                    let fd: String = self.input[self.pos..j].iter().collect();
                    self.pos = j + len;
                    self.push_redir(op, Some(fd));
                    return true;
                }
            }
            return false;
        }

        // Logical operators before their single-character counterparts.
        if c == '&' && next == Some('&') {
            self.pos += 2;
            self.tokens.push(Token::Op(Op::AndAnd));
            return true;
        }
        if c == '|' && next == Some('|') {
            self.pos += 2;
            self.tokens.push(Token::Op(Op::OrOr));
            return true;
        }

        if let Some((op, len)) = self.match_redir(self.pos) {
            self.pos += len;
            self.push_redir(op, None);
            return true;
        }

        match c {
            '|' => {
                self.pos += 1;
                self.tokens.push(Token::Op(Op::Pipe));
                true
            }
            '&' => {
                self.pos += 1;
                self.tokens.push(Token::Op(Op::Amp));
                true
            }
            ';' => {
                self.pos += 1;
                self.tokens.push(Token::Op(Op::Semi));
                true
            }
            '(' => {
                self.pos += 1;
                self.tokens.push(Token::Symbol(Symbol::LParen));
                true
            }
            ')' => {
                self.pos += 1;
                self.tokens.push(Token::Symbol(Symbol::RParen));
                true
            }
            // `!=` stays a word so `[[ a != b ]]` keeps three words.
            '!' if self.at_boundary && next != Some('=') => {
                self.pos += 1;
                self.tokens.push(Token::Op(Op::Bang));
                true
            }
            // `{` opens a group only when delimited; `{foo` is a word.
            '{' if matches!(next, Some(' ' | '\t' | '\r' | '\n') | None) => {
                self.pos += 1;
                self.tokens.push(Token::Symbol(Symbol::LBrace));
                true
            }
            '}' if next.map_or(true, is_word_end) => {
                self.pos += 1;
                self.tokens.push(Token::Symbol(Symbol::RBrace));
                true
            }
            _ => false,
        }
    }

    fn match_redir(&self, at: usize) -> Option<(RedirOp, usize)> {
        for (pat, op) in THREE_CHAR_REDIRS {
            if self.chars_match(at, pat) {
                return Some((*op, 3));
            }
        }
        for (pat, op) in TWO_CHAR_REDIRS {
            if self.chars_match(at, pat) {
                return Some((*op, 2));
            }
        }
        match self.input.get(at) {
            Some('<') => Some((RedirOp::Less, 1)),
            Some('>') => Some((RedirOp::Great, 1)),
            _ => None,
        }
    }

    fn chars_match(&self, at: usize, pat: &str) -> bool {
        pat.chars()
            .enumerate()
            .all(|(i, p)| self.input.get(at + i) == Some(&p))
    }

    fn push_redir(&mut self, op: RedirOp, fd: Option<String>) {
        self.tokens.push(Token::Redir { op, fd });
        if op.is_heredoc() {
            self.pending_heredocs.push_back(PendingHeredoc {
                redir_index: self.tokens.len() - 1,
                strip_tabs: op == RedirOp::DLessDash,
            });
        }
    }

    /// `(( ... ))` at a boundary: consume with parenthesis depth tracking
    /// until the matching `))` at depth zero.
    fn scan_arith_command(&mut self) -> Result<(), ParseError> {
        self.pos += 2; // ((
        let start = self.pos;
        let mut depth = 0usize;
        loop {
            match self.input.get(self.pos) {
                None => return Err(ParseError::UnclosedGroup("))".to_string())),
                Some('(') => {
                    depth += 1;
                    self.pos += 1;
                }
                Some(')') => {
                    if depth > 0 {
                        depth -= 1;
                        self.pos += 1;
                    } else if self.input.get(self.pos + 1) == Some(&')') {
                        let expr: String = self.input[start..self.pos].iter().collect();
                        self.pos += 2;
                        self.tokens
                            .push(Token::ArithCommand(expr.trim().to_string()));
                        return Ok(());
                    } else {
                        self.pos += 1;
                    }
                }
                Some(_) => self.pos += 1,
            }
        }
    }

    /// `<( ... )` / `>( ... )` at a boundary: the raw slice becomes a word
    /// whose sole piece is a process substitution.
    fn scan_proc_subst(&mut self, open: char) -> Result<(), ParseError> {
        let direction = if open == '<' {
            ProcessDirection::Input
        } else {
            ProcessDirection::Output
        };
        self.pos += 2; // <( or >(
        let start = self.pos;
        let mut depth = 1usize;
        loop {
            match self.input.get(self.pos) {
                None => return Err(ParseError::UnclosedGroup(")".to_string())),
                Some('(') => {
                    depth += 1;
                    self.pos += 1;
                }
                Some(')') => {
                    depth -= 1;
                    if depth == 0 {
                        let body: String = self.input[start..self.pos].iter().collect();
                        self.pos += 1;
                        self.tokens
                            .push(Token::Word(vec![WordPiece::ProcSubst { direction, body }]));
                        return Ok(());
                    }
                    self.pos += 1;
                }
                Some(_) => self.pos += 1,
            }
        }
    }

    fn read_word(&mut self) -> Result<Token, ParseError> {
        let word_start = self.pos;
        let mut pieces: Vec<WordPiece> = Vec::new();
        let mut lit = String::new();

        loop {
            let Some(&c) = self.input.get(self.pos) else {
                break;
            };
            if is_word_end(c) {
                break;
            }
            match c {
                '\'' => {
                    let (text, end) = scan_sgl_quoted(&self.input, self.pos)?;
                    flush_literal(&mut pieces, &mut lit);
                    pieces.push(WordPiece::SglQuoted(text));
                    self.pos = end;
                }
                '"' => {
                    let (inner, end) = scan_dbl_quoted(&self.input, self.pos)?;
                    flush_literal(&mut pieces, &mut lit);
                    pieces.push(WordPiece::DblQuoted(inner));
                    self.pos = end;
                }
                '`' => {
                    let (raw, end) = scan_backtick(&self.input, self.pos);
                    flush_literal(&mut pieces, &mut lit);
                    pieces.push(WordPiece::Backtick(raw));
                    self.pos = end;
                }
                '$' => match scan_dollar(&self.input, self.pos)? {
                    Some((piece, end)) => {
                        flush_literal(&mut pieces, &mut lit);
                        pieces.push(piece);
                        self.pos = end;
                    }
                    None => {
                        lit.push('$');
                        self.pos += 1;
                    }
                },
                '\\' => match self.input.get(self.pos + 1) {
                    Some('\n') => self.pos += 2,
                    Some('\r') if self.input.get(self.pos + 2) == Some(&'\n') => self.pos += 3,
                    Some(&escaped) => {
                        lit.push('\\');
                        lit.push(escaped);
                        self.pos += 2;
                    }
                    None => {
                        lit.push('\\');
                        self.pos += 1;
                    }
                },
                _ => {
                    lit.push(c);
                    self.pos += 1;
                }
            }
        }

        flush_literal(&mut pieces, &mut lit);
        if pieces.is_empty() {
            let c = self.input.get(word_start).copied().unwrap_or('\0');
            return Err(ParseError::UnexpectedCharacter(c));
        }
        Ok(Token::Word(pieces))
    }

    /// Triggered by a newline. For each pending heredoc in encounter order,
    /// read the delimiter from the word that followed its redirect, then
    /// consume input lines into the body until the delimiter line. The
    /// delimiter line is consumed but not appended.
    fn collect_heredocs(&mut self) {
        while let Some(pending) = self.pending_heredocs.pop_front() {
            let delimiter = match self.tokens.get(pending.redir_index + 1) {
                Some(Token::Word(pieces)) => word_token_text(pieces),
                _ => continue,
            };
            let mut body = String::new();
            while self.pos < self.input.len() {
                let line_start = self.pos;
                while self.pos < self.input.len() && self.input[self.pos] != '\n' {
                    self.pos += 1;
                }
                let mut line: String = self.input[line_start..self.pos].iter().collect();
                if self.pos < self.input.len() {
                    self.pos += 1; // newline
                }
                if let Some(stripped) = line.strip_suffix('\r') {
                    line = stripped.to_string();
                }
                if pending.strip_tabs {
                    line = line.trim_start_matches('\t').to_string();
                }
                if line == delimiter {
                    break;
                }
                body.push_str(&line);
                body.push('\n');
            }
            self.tokens.push(Token::HeredocBody(body));
        }
    }
}

pub(crate) fn flush_literal(pieces: &mut Vec<WordPiece>, lit: &mut String) {
    if !lit.is_empty() {
        pieces.push(WordPiece::Literal(std::mem::take(lit)));
    }
}
