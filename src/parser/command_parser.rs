//! Command Parser
//!
//! Simple commands and their ingredients: assignment recognition, array
//! literals, redirects with heredoc attachment, declaration clauses, and
//! `let` clauses.

use lazy_static::lazy_static;
use regex_lite::Regex;

use crate::ast::types::{
    ArrayElem, ArrayExpr, Assignment, Command, DeclClause, DeclVariant, LetClause, Redirect,
    SimpleCommand, AST,
};
use crate::parser::lexer::{Op, Symbol, Token, WordPiece};
use crate::parser::parser::Parser;
use crate::parser::types::{ParseError, ParseOptions};
use crate::parser::word_parser::word_from_pieces;

lazy_static! {
    /// `NAME=` / `NAME+=` with a shell identifier on the left.
    static ref ASSIGNMENT_RE: Regex =
        Regex::new(r"^([A-Za-z_][A-Za-z0-9_]*)(\+?=)").expect("assignment pattern");
}

/// Recognize an assignment-shaped word: its first piece is an unquoted
/// literal starting with `NAME=` or `NAME+=`. Returns the name, the append
/// flag, and the byte offset of the value text within the first piece.
pub(crate) fn assignment_prefix(pieces: &[WordPiece]) -> Option<(String, bool, usize)> {
    let first = pieces.first()?;
    let WordPiece::Literal(text) = first else {
        return None;
    };
    let caps = ASSIGNMENT_RE.captures(text)?;
    let name = caps.get(1)?.as_str().to_string();
    let append = caps.get(2)?.as_str() == "+=";
    let end = caps.get(0)?.end();
    Some((name, append, end))
}

/// Split an array element of the form `[index]=value`. Anything else is a
/// plain value element.
fn array_elem_from_pieces(
    pieces: &[WordPiece],
    options: &ParseOptions,
) -> Result<ArrayElem, ParseError> {
    if let Some(WordPiece::Literal(text)) = pieces.first() {
        if let Some(close) = matching_bracket(text) {
            if text[close + 1..].starts_with('=') {
                let index_text = &text[1..close];
                let rest = &text[close + 2..];
                let mut value_pieces: Vec<WordPiece> = Vec::new();
                if !rest.is_empty() {
                    value_pieces.push(WordPiece::Literal(rest.to_string()));
                }
                value_pieces.extend(pieces.iter().skip(1).cloned());
                let value = if value_pieces.is_empty() {
                    None
                } else {
                    Some(word_from_pieces(&value_pieces, options)?)
                };
                return Ok(ArrayElem {
                    index: Some(AST::plain_word(index_text)),
                    value,
                });
            }
        }
    }
    Ok(ArrayElem {
        index: None,
        value: Some(word_from_pieces(pieces, options)?),
    })
}

/// Byte offset of the `]` matching a leading `[`, tracking nesting.
fn matching_bracket(text: &str) -> Option<usize> {
    if !text.starts_with('[') {
        return None;
    }
    let mut depth = 0usize;
    for (offset, c) in text.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(offset);
                }
            }
            _ => {}
        }
    }
    None
}

impl Parser {
    /// Is the current token an assignment-shaped word?
    pub(crate) fn at_assignment_word(&self) -> bool {
        match self.current() {
            Some(Token::Word(pieces)) => assignment_prefix(pieces).is_some(),
            _ => false,
        }
    }

    /// Accumulate words, assignments, and redirects. Assignments only count
    /// while no non-assignment word has been seen; after the first real
    /// word, equals-bearing tokens are plain words.
    pub(crate) fn parse_simple_command(&mut self) -> Result<Command, ParseError> {
        let mut words = Vec::new();
        let mut assignments = Vec::new();
        let mut redirects = Vec::new();

        loop {
            if matches!(self.current(), Some(Token::Redir { .. })) {
                redirects.push(self.parse_redirect()?);
                continue;
            }
            if matches!(self.current(), Some(Token::Comment(_))) {
                self.consume_comment();
                continue;
            }
            if !self.is_word() {
                break;
            }
            if words.is_empty() && self.at_assignment_word() {
                assignments.push(self.parse_assignment()?);
            } else {
                words.push(self.parse_word()?);
            }
        }

        if words.is_empty() && assignments.is_empty() && redirects.is_empty() {
            return Err(ParseError::ExpectedCommandWord);
        }

        Ok(Command::Simple(SimpleCommand {
            words: AST::opt(words),
            assignments: AST::opt(assignments),
            redirects: AST::opt(redirects),
        }))
    }

    /// A redirect token plus its target word. For `<<`/`<<-` the next
    /// collected heredoc body attaches, paired in order of introduction.
    pub(crate) fn parse_redirect(&mut self) -> Result<Redirect, ParseError> {
        let (op, fd) = match self.advance() {
            Some(Token::Redir { op, fd }) => (op, fd),
            _ => return Err(ParseError::RedirectWithoutTarget),
        };
        if !self.is_word() {
            return Err(ParseError::RedirectWithoutTarget);
        }
        let target = self.parse_word()?;
        let mut redirect = AST::redirect(op, fd, target);
        if op.is_heredoc() {
            redirect.heredoc = self
                .take_heredoc_body()
                .map(|content| AST::word(vec![AST::literal(content)]));
        }
        Ok(redirect)
    }

    /// The current word is assignment-shaped (`NAME=`...); split it into an
    /// assignment, entering array mode when a `(` symbol follows an empty
    /// value.
    pub(crate) fn parse_assignment(&mut self) -> Result<Assignment, ParseError> {
        let pieces = match self.advance() {
            Some(Token::Word(pieces)) => pieces,
            _ => return Err(ParseError::ExpectedCommandWord),
        };
        let Some((name, append, value_at)) = assignment_prefix(&pieces) else {
            return Err(ParseError::ExpectedCommandWord);
        };

        let mut value_pieces: Vec<WordPiece> = Vec::new();
        if let Some(WordPiece::Literal(text)) = pieces.first() {
            let rest = &text[value_at..];
            if !rest.is_empty() {
                value_pieces.push(WordPiece::Literal(rest.to_string()));
            }
        }
        value_pieces.extend(pieces.iter().skip(1).cloned());

        if value_pieces.is_empty()
            && matches!(self.current(), Some(Token::Symbol(Symbol::LParen)))
        {
            self.pos += 1;
            let array = self.parse_array_elements()?;
            return Ok(AST::assignment(name, append, None, Some(array)));
        }

        let value = if value_pieces.is_empty() {
            None
        } else {
            Some(word_from_pieces(&value_pieces, &self.options)?)
        };
        Ok(AST::assignment(name, append, value, None))
    }

    /// Inside `NAME=( ... )`: word tokens become elements; `;` separators
    /// (including newlines) and comments are discarded.
    pub(crate) fn parse_array_elements(&mut self) -> Result<ArrayExpr, ParseError> {
        let mut elements = Vec::new();
        loop {
            if matches!(self.current(), Some(Token::Op(Op::Semi))) {
                self.pos += 1;
                continue;
            }
            if matches!(self.current(), Some(Token::Comment(_))) {
                self.consume_comment();
                continue;
            }
            match self.current() {
                None => return Err(ParseError::UnclosedArrayExpression),
                Some(Token::Symbol(Symbol::RParen)) => {
                    self.pos += 1;
                    break;
                }
                Some(Token::Word(_)) => {}
                Some(token) => return Err(ParseError::UnexpectedToken(token.display())),
            }
            let pieces = match self.advance() {
                Some(Token::Word(pieces)) => pieces,
                _ => return Err(ParseError::UnclosedArrayExpression),
            };
            elements.push(array_elem_from_pieces(&pieces, &self.options)?);
        }
        Ok(ArrayExpr { elements })
    }

    /// `declare`/`local`/`export`/`readonly`/`typeset`/`nameref` followed
    /// by any mix of assignments, argument words, and redirects.
    pub(crate) fn parse_decl_clause(&mut self, variant: DeclVariant) -> Result<Command, ParseError> {
        self.pos += 1; // the declaration keyword
        let mut args = Vec::new();
        let mut assignments = Vec::new();
        let mut redirects = Vec::new();
        loop {
            if matches!(self.current(), Some(Token::Redir { .. })) {
                redirects.push(self.parse_redirect()?);
                continue;
            }
            if matches!(self.current(), Some(Token::Comment(_))) {
                self.consume_comment();
                continue;
            }
            if !self.is_word() {
                break;
            }
            if self.at_assignment_word() {
                assignments.push(self.parse_assignment()?);
            } else {
                args.push(self.parse_word()?);
            }
        }
        Ok(Command::Decl(DeclClause {
            variant,
            args: AST::opt(args),
            assignments: AST::opt(assignments),
            redirects: AST::opt(redirects),
        }))
    }

    /// `let` with one or more expression words; redirects may interleave.
    pub(crate) fn parse_let_clause(&mut self) -> Result<Command, ParseError> {
        self.pos += 1; // let
        let mut exprs = Vec::new();
        let mut redirects = Vec::new();
        loop {
            if matches!(self.current(), Some(Token::Redir { .. })) {
                redirects.push(self.parse_redirect()?);
                continue;
            }
            if matches!(self.current(), Some(Token::Comment(_))) {
                self.consume_comment();
                continue;
            }
            if self.is_word() {
                exprs.push(self.parse_word()?);
            } else {
                break;
            }
        }
        if exprs.is_empty() {
            return Err(ParseError::LetRequiresExpression);
        }
        Ok(Command::Let(LetClause {
            exprs,
            redirects: AST::opt(redirects),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::types::{RedirOp, Word, WordPart};
    use crate::parser::parser::parse;
    use crate::parser::types::ParseOptions;

    fn parse_ok(input: &str) -> crate::ast::types::Program {
        parse(input, &ParseOptions::default()).unwrap()
    }

    fn parse_err(input: &str) -> ParseError {
        parse(input, &ParseOptions::default()).unwrap_err()
    }

    fn simple(input: &str) -> SimpleCommand {
        let program = parse_ok(input);
        match &program.statements[0].command {
            Command::Simple(cmd) => cmd.clone(),
            other => panic!("expected simple command, got {:?}", other),
        }
    }

    fn literal_text(word: &Word) -> String {
        word.parts
            .iter()
            .map(|p| match p {
                WordPart::Literal(text) | WordPart::SglQuoted(text) => text.clone(),
                other => panic!("expected literal-ish part, got {:?}", other),
            })
            .collect()
    }

    #[test]
    fn leading_assignments_then_words() {
        let cmd = simple("FOO=1 BAR=2 make all");
        let assignments = cmd.assignments.unwrap();
        assert_eq!(assignments.len(), 2);
        assert_eq!(assignments[0].name, "FOO");
        assert_eq!(assignments[1].name, "BAR");
        assert_eq!(
            cmd.words.unwrap().iter().map(literal_text).collect::<Vec<_>>(),
            vec!["make", "all"]
        );
    }

    #[test]
    fn equals_words_after_the_first_word_are_plain_words() {
        let cmd = simple("env FOO=1");
        assert_eq!(cmd.assignments, None);
        let words = cmd.words.unwrap();
        assert_eq!(literal_text(&words[1]), "FOO=1");
    }

    #[test]
    fn invalid_identifier_is_not_an_assignment() {
        let cmd = simple("1x=2 cmd");
        assert_eq!(cmd.assignments, None);
        let words = cmd.words.unwrap();
        assert_eq!(literal_text(&words[0]), "1x=2");
    }

    #[test]
    fn append_assignment() {
        let cmd = simple("PATH+=/opt/bin");
        let assignments = cmd.assignments.unwrap();
        assert!(assignments[0].append);
        assert_eq!(assignments[0].name, "PATH");
        assert_eq!(
            literal_text(assignments[0].value.as_ref().unwrap()),
            "/opt/bin"
        );
    }

    #[test]
    fn assignment_without_value() {
        let cmd = simple("EMPTY= cmd");
        let assignments = cmd.assignments.unwrap();
        assert_eq!(assignments[0].value, None);
        assert_eq!(assignments[0].array, None);
    }

    #[test]
    fn assignment_value_keeps_expansions() {
        let cmd = simple("OUT=$(pwd) true");
        let assignments = cmd.assignments.unwrap();
        let value = assignments[0].value.as_ref().unwrap();
        assert!(matches!(value.parts[0], WordPart::CmdSubst(_)));
    }

    #[test]
    fn plain_array_assignment() {
        let cmd = simple("arr=(a b c)");
        let assignments = cmd.assignments.unwrap();
        let array = assignments[0].array.as_ref().unwrap();
        assert_eq!(array.elements.len(), 3);
        assert!(array.elements.iter().all(|e| e.index.is_none()));
        assert_eq!(
            literal_text(array.elements[0].value.as_ref().unwrap()),
            "a"
        );
        assert_eq!(assignments[0].value, None);
    }

    #[test]
    fn keyed_array_assignment() {
        let cmd = simple("arr=([k]=v [0]=x)");
        let assignments = cmd.assignments.unwrap();
        let array = assignments[0].array.as_ref().unwrap();
        assert_eq!(array.elements.len(), 2);
        assert_eq!(
            literal_text(array.elements[0].index.as_ref().unwrap()),
            "k"
        );
        assert_eq!(
            literal_text(array.elements[0].value.as_ref().unwrap()),
            "v"
        );
        assert_eq!(
            literal_text(array.elements[1].index.as_ref().unwrap()),
            "0"
        );
        assert_eq!(
            literal_text(array.elements[1].value.as_ref().unwrap()),
            "x"
        );
    }

    #[test]
    fn array_spanning_newlines() {
        let cmd = simple("arr=(a\nb\n)");
        let assignments = cmd.assignments.unwrap();
        assert_eq!(assignments[0].array.as_ref().unwrap().elements.len(), 2);
    }

    #[test]
    fn unclosed_array_fails() {
        assert_eq!(parse_err("arr=(a b"), ParseError::UnclosedArrayExpression);
    }

    #[test]
    fn redirects_in_source_order() {
        let cmd = simple("cmd >out 2>&1 <in");
        let redirects = cmd.redirects.unwrap();
        assert_eq!(redirects.len(), 3);
        assert_eq!(redirects[0].op, RedirOp::Great);
        assert_eq!(redirects[1].op, RedirOp::GreatAnd);
        assert_eq!(redirects[1].fd, Some("2".to_string()));
        assert_eq!(redirects[2].op, RedirOp::Less);
    }

    #[test]
    fn redirect_only_command_is_valid() {
        let cmd = simple("> file");
        assert_eq!(cmd.words, None);
        assert_eq!(cmd.redirects.unwrap().len(), 1);
    }

    #[test]
    fn redirect_without_target_fails() {
        assert_eq!(parse_err("foo >"), ParseError::RedirectWithoutTarget);
    }

    #[test]
    fn heredoc_attaches_to_its_redirect() {
        let cmd = simple("cat <<EOF\nhello\nEOF");
        let redirects = cmd.redirects.unwrap();
        assert_eq!(redirects[0].op, RedirOp::DLess);
        assert_eq!(literal_text(&redirects[0].target), "EOF");
        assert_eq!(
            literal_text(redirects[0].heredoc.as_ref().unwrap()),
            "hello\n"
        );
    }

    #[test]
    fn heredocs_attach_in_order_of_introduction() {
        let cmd = simple("cat <<A <<B\none\nA\ntwo\nB\n");
        let redirects = cmd.redirects.unwrap();
        assert_eq!(
            literal_text(redirects[0].heredoc.as_ref().unwrap()),
            "one\n"
        );
        assert_eq!(
            literal_text(redirects[1].heredoc.as_ref().unwrap()),
            "two\n"
        );
    }

    #[test]
    fn herestring_target_is_not_a_command_word() {
        let cmd = simple("grep -rn '\\bnpm\\b' <<< 'npm install'");
        let words = cmd.words.unwrap();
        assert_eq!(literal_text(&words[0]), "grep");
        let redirects = cmd.redirects.unwrap();
        assert_eq!(redirects[0].op, RedirOp::TLess);
        assert_eq!(literal_text(&redirects[0].target), "npm install");
    }

    #[test]
    fn decl_clause_splits_flags_assignments_and_redirects() {
        let program = parse_ok("declare -r x=1 y >log");
        let Command::Decl(decl) = &program.statements[0].command else {
            panic!("expected decl clause");
        };
        assert_eq!(decl.variant, DeclVariant::Declare);
        let args = decl.args.as_ref().unwrap();
        assert_eq!(literal_text(&args[0]), "-r");
        assert_eq!(literal_text(&args[1]), "y");
        let assignments = decl.assignments.as_ref().unwrap();
        assert_eq!(assignments[0].name, "x");
        assert_eq!(decl.redirects.as_ref().unwrap().len(), 1);
    }

    #[test]
    fn decl_keyword_in_argument_position_is_a_word() {
        let cmd = simple("echo export");
        let words = cmd.words.unwrap();
        assert_eq!(literal_text(&words[1]), "export");
    }

    #[test]
    fn local_and_export_are_decl_clauses() {
        for (input, variant) in [
            ("local x=1", DeclVariant::Local),
            ("export PATH=/bin", DeclVariant::Export),
            ("readonly z", DeclVariant::Readonly),
            ("typeset -i n=0", DeclVariant::Typeset),
            ("nameref ref=target", DeclVariant::Nameref),
        ] {
            let program = parse_ok(input);
            let Command::Decl(decl) = &program.statements[0].command else {
                panic!("expected decl clause for {input}");
            };
            assert_eq!(decl.variant, variant, "{input}");
        }
    }

    #[test]
    fn let_collects_expression_words() {
        let program = parse_ok("let x=1 'y += 2'");
        let Command::Let(clause) = &program.statements[0].command else {
            panic!("expected let clause");
        };
        assert_eq!(clause.exprs.len(), 2);
    }

    #[test]
    fn bare_let_fails() {
        assert_eq!(parse_err("let"), ParseError::LetRequiresExpression);
        assert_eq!(parse_err("let\n"), ParseError::LetRequiresExpression);
    }

    #[test]
    fn assignment_names_match_the_identifier_pattern() {
        assert!(assignment_prefix(&[WordPiece::Literal("_x=1".into())]).is_some());
        assert!(assignment_prefix(&[WordPiece::Literal("A9=".into())]).is_some());
        assert!(assignment_prefix(&[WordPiece::Literal("9A=1".into())]).is_none());
        assert!(assignment_prefix(&[WordPiece::Literal("a-b=1".into())]).is_none());
        assert!(assignment_prefix(&[WordPiece::SglQuoted("x=1".into())]).is_none());
    }
}
