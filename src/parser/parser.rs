//! Recursive Descent Parser for Bash Scripts
//!
//! Consumes the token stream and produces a [`Program`]. Grammar, from
//! loosest to tightest binding:
//!
//! ```text
//!   program     ::= { statement (';' | '&')? }
//!   statement   ::= ['!'] and_or ['&']
//!   and_or      ::= pipeline (('&&' | '||') pipeline)*    // left-assoc
//!   pipeline    ::= command ('|' command)*
//!   command     ::= compound | declaration | simple
//! ```
//!
//! `!` applies to the entire statement, including the full logical chain.
//! All errors are fatal; the first error in source order aborts the parse.

use crate::ast::types::{
    Command, Logical, LogicalOp, Pipeline, Program, Statement, Word, AST,
};
use crate::parser::lexer::{Lexer, Op, Symbol, Token};
use crate::parser::types::{ParseError, ParseOptions, DECL_KEYWORDS, MISPLACED_KEYWORDS};
use crate::parser::word_parser;

/// Parse a complete script with the given options.
pub fn parse(source: &str, options: &ParseOptions) -> Result<Program, ParseError> {
    Parser::new(options.clone()).parse(source)
}

/// Main parser struct. One instance may be reused for multiple inputs.
pub struct Parser {
    pub(crate) tokens: Vec<Token>,
    pub(crate) pos: usize,
    /// Parallel to `tokens`: marks heredoc-body tokens already claimed by a
    /// redirect, so the cursor skips them like separators.
    pub(crate) consumed_bodies: Vec<bool>,
    pub(crate) comments: Vec<String>,
    pub(crate) options: ParseOptions,
}

impl Parser {
    pub fn new(options: ParseOptions) -> Self {
        Parser {
            tokens: Vec::new(),
            pos: 0,
            consumed_bodies: Vec::new(),
            comments: Vec::new(),
            options,
        }
    }

    /// Parse a bash script string into a program.
    pub fn parse(&mut self, source: &str) -> Result<Program, ParseError> {
        self.tokens = Lexer::new(source, &self.options).tokenize()?;
        self.pos = 0;
        self.consumed_bodies = vec![false; self.tokens.len()];
        self.comments.clear();

        let mut statements = Vec::new();
        loop {
            self.skip_separators(false);
            if self.current().is_none() {
                break;
            }
            statements.push(self.parse_statement()?);
        }

        let comments = if self.options.keep_comments {
            AST::opt(std::mem::take(&mut self.comments))
        } else {
            None
        };
        Ok(Program {
            statements,
            comments,
        })
    }

    // ===========================================================================
    // CURSOR HELPERS
    // ===========================================================================

    pub(crate) fn current(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    pub(crate) fn peek(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset)
    }

    pub(crate) fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    pub(crate) fn is_word(&self) -> bool {
        matches!(self.current(), Some(Token::Word(_)))
    }

    /// The current token's text when it is eligible to be a keyword: a word
    /// whose single piece is an unquoted literal. Quoted `"if"` is never a
    /// keyword.
    pub(crate) fn keyword_text(&self) -> Option<String> {
        match self.current() {
            Some(Token::Word(pieces)) if pieces.len() == 1 => match &pieces[0] {
                crate::parser::lexer::WordPiece::Literal(text) => Some(text.clone()),
                _ => None,
            },
            _ => None,
        }
    }

    pub(crate) fn at_keyword(&self, keyword: &str) -> bool {
        self.keyword_text().as_deref() == Some(keyword)
    }

    /// Skip list separators: `;` tokens (bare newlines lex as `;`),
    /// comments, and heredoc bodies already claimed by their redirects.
    /// With `guard_dsemi`, stops in front of a `;;` pair so case-item
    /// terminators survive.
    pub(crate) fn skip_separators(&mut self, guard_dsemi: bool) {
        loop {
            match self.current() {
                Some(Token::Op(Op::Semi)) => {
                    if guard_dsemi && matches!(self.peek(1), Some(Token::Op(Op::Semi))) {
                        break;
                    }
                    self.pos += 1;
                }
                Some(Token::Comment(_)) => self.consume_comment(),
                Some(Token::HeredocBody(_)) if self.body_consumed(self.pos) => self.pos += 1,
                _ => break,
            }
        }
    }

    pub(crate) fn consume_comment(&mut self) {
        if let Some(Token::Comment(text)) = self.advance() {
            self.comments.push(text);
        }
    }

    fn body_consumed(&self, index: usize) -> bool {
        self.consumed_bodies.get(index).copied().unwrap_or(false)
    }

    /// Claim the next unclaimed heredoc body. Bodies are paired to their
    /// redirects strictly by order of introduction.
    pub(crate) fn take_heredoc_body(&mut self) -> Option<String> {
        let mut i = self.pos;
        while i < self.tokens.len() {
            if let Token::HeredocBody(content) = &self.tokens[i] {
                if !self.body_consumed(i) {
                    let content = content.clone();
                    self.consumed_bodies[i] = true;
                    return Some(content);
                }
            }
            i += 1;
        }
        None
    }

    pub(crate) fn expect_keyword(&mut self, keyword: &str) -> Result<(), ParseError> {
        if self.at_keyword(keyword) {
            self.pos += 1;
            Ok(())
        } else if self.current().is_none() {
            Err(ParseError::UnclosedStructure(keyword.to_string()))
        } else {
            Err(ParseError::ExpectedKeyword(keyword.to_string()))
        }
    }

    pub(crate) fn expect_symbol(&mut self, symbol: Symbol) -> Result<(), ParseError> {
        if matches!(self.current(), Some(Token::Symbol(s)) if *s == symbol) {
            self.pos += 1;
            Ok(())
        } else if self.current().is_none() {
            Err(ParseError::UnclosedGroup(symbol.as_str().to_string()))
        } else {
            Err(ParseError::ExpectedSymbol(symbol.as_str().to_string()))
        }
    }

    // ===========================================================================
    // STATEMENTS
    // ===========================================================================

    pub(crate) fn parse_statement(&mut self) -> Result<Statement, ParseError> {
        let negated = if matches!(self.current(), Some(Token::Op(Op::Bang))) {
            self.pos += 1;
            true
        } else {
            false
        };

        let command = self.parse_and_or()?;

        let background = if matches!(self.current(), Some(Token::Op(Op::Amp))) {
            self.pos += 1;
            true
        } else {
            false
        };

        Ok(Statement {
            command,
            background,
            negated,
        })
    }

    /// `a && b || c` — left-associative, looser than `|`.
    pub(crate) fn parse_and_or(&mut self) -> Result<Command, ParseError> {
        let mut command = self.parse_pipeline()?;
        loop {
            let op = match self.current() {
                Some(Token::Op(Op::AndAnd)) => LogicalOp::And,
                Some(Token::Op(Op::OrOr)) => LogicalOp::Or,
                _ => break,
            };
            self.pos += 1;
            self.skip_separators(false);
            let right = self.parse_pipeline()?;
            command = Command::Logical(Logical {
                op,
                left: Box::new(AST::statement(command)),
                right: Box::new(AST::statement(right)),
            });
        }
        Ok(command)
    }

    /// A single command, or a pipeline node when two or more are joined by
    /// `|`.
    pub(crate) fn parse_pipeline(&mut self) -> Result<Command, ParseError> {
        let first = self.parse_command()?;
        if !matches!(self.current(), Some(Token::Op(Op::Pipe))) {
            return Ok(first);
        }
        let mut statements = vec![AST::statement(first)];
        while matches!(self.current(), Some(Token::Op(Op::Pipe))) {
            self.pos += 1;
            self.skip_separators(false);
            statements.push(AST::statement(self.parse_command()?));
        }
        Ok(Command::Pipeline(Pipeline { statements }))
    }

    // ===========================================================================
    // COMMAND DISPATCH
    // ===========================================================================

    pub(crate) fn parse_command(&mut self) -> Result<Command, ParseError> {
        if let Some(keyword) = self.keyword_text() {
            if MISPLACED_KEYWORDS.contains(&keyword.as_str()) {
                return Err(ParseError::UnexpectedToken(keyword));
            }
            match keyword.as_str() {
                "if" => return self.parse_if(),
                "while" => return self.parse_while(false),
                "until" => return self.parse_while(true),
                "for" => return self.parse_for(),
                "select" => return self.parse_select(),
                "case" => return self.parse_case(),
                "time" => return self.parse_time(),
                "coproc" => return self.parse_coproc(),
                "function" => return self.parse_function(),
                "let" => return self.parse_let_clause(),
                "[[" => return self.parse_test(),
                _ => {
                    for (name, variant) in DECL_KEYWORDS {
                        if keyword == *name {
                            return self.parse_decl_clause(*variant);
                        }
                    }
                }
            }
        }

        match self.current() {
            Some(Token::Word(_)) => {
                if self.is_function_shorthand() {
                    self.parse_function_shorthand()
                } else {
                    self.parse_simple_command()
                }
            }
            Some(Token::Symbol(Symbol::LParen)) => self.parse_subshell(),
            Some(Token::Symbol(Symbol::LBrace)) => self.parse_block(),
            Some(Token::ArithCommand(_)) => {
                let expr = match self.advance() {
                    Some(Token::ArithCommand(expr)) => expr,
                    _ => String::new(),
                };
                Ok(Command::Arith(crate::ast::types::ArithCmd { expr }))
            }
            Some(Token::Redir { .. }) => self.parse_simple_command(),
            Some(token) => Err(ParseError::UnexpectedToken(token.display())),
            None => Err(ParseError::ExpectedCommandWord),
        }
    }

    /// `name () { ... }` — detected by three-token lookahead at `(`, `)`,
    /// `{`.
    fn is_function_shorthand(&self) -> bool {
        matches!(self.peek(1), Some(Token::Symbol(Symbol::LParen)))
            && matches!(self.peek(2), Some(Token::Symbol(Symbol::RParen)))
            && matches!(self.peek(3), Some(Token::Symbol(Symbol::LBrace)))
    }

    // ===========================================================================
    // STATEMENT LISTS & WORDS
    // ===========================================================================

    /// Parse statements until one of the stop keywords appears in command
    /// position. The stop keyword is left for the caller.
    pub(crate) fn parse_list_until_keywords(
        &mut self,
        stops: &[&str],
    ) -> Result<Vec<Statement>, ParseError> {
        let mut statements = Vec::new();
        loop {
            self.skip_separators(false);
            if matches!(self.keyword_text(), Some(kw) if stops.contains(&kw.as_str())) {
                break;
            }
            if self.current().is_none() {
                return Err(ParseError::UnclosedStructure(stops.join(", ")));
            }
            statements.push(self.parse_statement()?);
        }
        Ok(statements)
    }

    /// Parse statements until the closing symbol. The symbol is left for
    /// the caller.
    pub(crate) fn parse_list_until_symbol(
        &mut self,
        close: Symbol,
    ) -> Result<Vec<Statement>, ParseError> {
        let mut statements = Vec::new();
        loop {
            self.skip_separators(false);
            if matches!(self.current(), Some(Token::Symbol(s)) if *s == close) {
                break;
            }
            if self.current().is_none() {
                return Err(ParseError::UnclosedGroup(close.as_str().to_string()));
            }
            statements.push(self.parse_statement()?);
        }
        Ok(statements)
    }

    pub(crate) fn parse_word(&mut self) -> Result<Word, ParseError> {
        match self.advance() {
            Some(Token::Word(pieces)) => word_parser::word_from_pieces(&pieces, &self.options),
            Some(token) => Err(ParseError::UnexpectedToken(token.display())),
            None => Err(ParseError::ExpectedCommandWord),
        }
    }
}
