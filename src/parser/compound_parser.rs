//! Compound Command Parser
//!
//! Parses the compound commands: `if`, `while`/`until`, `for` (including
//! the C-style form), `select`, `case`, `[[ ]]` tests, `time`, `coproc`,
//! function declarations, subshells, and blocks.

use crate::ast::types::{
    Block, CStyleLoop, CaseClause, CaseItem, Command, CoprocClause, ForClause, FunctionDecl,
    IfClause, SelectClause, Statement, Subshell, TestClause, TimeClause, WhileClause, Word, AST,
};
use crate::parser::lexer::{word_token_text, Op, Symbol, Token};
use crate::parser::parser::Parser;
use crate::parser::types::ParseError;

impl Parser {
    /// `if <cond> then <body> (elif <cond> then <body>)* [else <body>] fi`.
    /// Each `elif` becomes an else branch holding a nested if clause.
    pub(crate) fn parse_if(&mut self) -> Result<Command, ParseError> {
        self.pos += 1; // if
        let clause = self.parse_if_clause()?;
        self.expect_keyword("fi")?;
        Ok(Command::If(clause))
    }

    fn parse_if_clause(&mut self) -> Result<IfClause, ParseError> {
        let condition = self.parse_list_until_keywords(&["then"])?;
        self.expect_keyword("then")?;
        let then_branch = self.parse_list_until_keywords(&["elif", "else", "fi"])?;
        if then_branch.is_empty() {
            return Err(self.unexpected_here("fi"));
        }
        let else_branch = match self.keyword_text().as_deref() {
            Some("elif") => {
                self.pos += 1;
                let nested = self.parse_if_clause()?;
                Some(vec![AST::statement(Command::If(nested))])
            }
            Some("else") => {
                self.pos += 1;
                let branch = self.parse_list_until_keywords(&["fi"])?;
                if branch.is_empty() {
                    return Err(self.unexpected_here("fi"));
                }
                Some(branch)
            }
            _ => None,
        };
        Ok(IfClause {
            condition,
            then_branch,
            else_branch,
        })
    }

    /// `while <cond> do <body> done`; `until` is the same with the flag.
    pub(crate) fn parse_while(&mut self, until: bool) -> Result<Command, ParseError> {
        self.pos += 1; // while / until
        let condition = self.parse_list_until_keywords(&["do"])?;
        self.expect_keyword("do")?;
        let body = self.parse_list_until_keywords(&["done"])?;
        if body.is_empty() {
            return Err(self.unexpected_here("done"));
        }
        self.expect_keyword("done")?;
        Ok(Command::While(WhileClause {
            condition,
            body,
            until,
        }))
    }

    /// `for NAME [in WORDS]; do ... done`, or the C-style
    /// `for (( init; cond; post ))` when an arithmetic command follows.
    pub(crate) fn parse_for(&mut self) -> Result<Command, ParseError> {
        self.pos += 1; // for

        if matches!(self.current(), Some(Token::ArithCommand(_))) {
            let expr = match self.advance() {
                Some(Token::ArithCommand(expr)) => expr,
                _ => String::new(),
            };
            let mut parts = expr
                .splitn(3, ';')
                .map(|part| part.trim().to_string())
                .collect::<Vec<_>>()
                .into_iter();
            let init = parts.next().filter(|p| !p.is_empty());
            let condition = parts.next().filter(|p| !p.is_empty());
            let post = parts.next().filter(|p| !p.is_empty());
            self.skip_separators(false);
            let body = self.parse_loop_body()?;
            return Ok(Command::CStyleLoop(CStyleLoop {
                init,
                condition,
                post,
                body,
            }));
        }

        let (variable, items) = self.parse_loop_header()?;
        let body = self.parse_do_done()?;
        Ok(Command::For(ForClause {
            variable,
            items,
            body,
        }))
    }

    /// `select NAME [in WORDS]; do ... done` — same shape as `for`.
    pub(crate) fn parse_select(&mut self) -> Result<Command, ParseError> {
        self.pos += 1; // select
        let (variable, items) = self.parse_loop_header()?;
        let body = self.parse_do_done()?;
        Ok(Command::Select(SelectClause {
            variable,
            items,
            body,
        }))
    }

    /// Loop variable plus the optional `in <word...>` item list. An absent
    /// list means the loop iterates the positional parameters.
    fn parse_loop_header(&mut self) -> Result<(String, Option<Vec<Word>>), ParseError> {
        let variable = match self.current() {
            Some(Token::Word(pieces)) => word_token_text(pieces),
            Some(token) => return Err(ParseError::UnexpectedToken(token.display())),
            None => return Err(ParseError::UnclosedStructure("do".to_string())),
        };
        self.pos += 1;
        self.skip_separators(false);

        let mut items = None;
        if self.at_keyword("in") {
            self.pos += 1;
            let mut list = Vec::new();
            loop {
                if self.at_keyword("do") || !self.is_word() {
                    break;
                }
                list.push(self.parse_word()?);
            }
            items = AST::opt(list);
        }
        Ok((variable, items))
    }

    /// `do <body> done`, consuming an optional `;` run first.
    fn parse_do_done(&mut self) -> Result<Vec<Statement>, ParseError> {
        self.skip_separators(false);
        self.expect_keyword("do")?;
        let body = self.parse_list_until_keywords(&["done"])?;
        self.expect_keyword("done")?;
        Ok(body)
    }

    /// C-style loop bodies also accept a brace group.
    fn parse_loop_body(&mut self) -> Result<Vec<Statement>, ParseError> {
        if matches!(self.current(), Some(Token::Symbol(Symbol::LBrace))) {
            self.parse_brace_group()
        } else {
            self.parse_do_done()
        }
    }

    /// `case WORD in { patterns ')' body ';;' }* esac`. A trailing `;;`
    /// before `esac` is optional.
    pub(crate) fn parse_case(&mut self) -> Result<Command, ParseError> {
        self.pos += 1; // case
        if !self.is_word() {
            return Err(self.unexpected_here("esac"));
        }
        let word = self.parse_word()?;
        self.skip_separators(false);
        self.expect_keyword("in")?;

        let mut items = Vec::new();
        loop {
            self.skip_separators(false);
            if self.current().is_none() {
                return Err(ParseError::UnclosedStructure("esac".to_string()));
            }
            if self.at_keyword("esac") {
                break;
            }
            items.push(self.parse_case_item()?);
        }
        self.pos += 1; // esac
        Ok(Command::Case(CaseClause { word, items }))
    }

    fn parse_case_item(&mut self) -> Result<CaseItem, ParseError> {
        if matches!(self.current(), Some(Token::Symbol(Symbol::LParen))) {
            self.pos += 1;
        }

        let mut patterns = Vec::new();
        loop {
            if !self.is_word() {
                return Err(self.unexpected_here("esac"));
            }
            patterns.push(self.parse_word()?);
            if matches!(self.current(), Some(Token::Op(Op::Pipe))) {
                self.pos += 1;
            } else {
                break;
            }
        }
        self.expect_symbol(Symbol::RParen)?;

        let mut body = Vec::new();
        loop {
            self.skip_separators(true);
            if self.at_dsemi() || self.at_keyword("esac") {
                break;
            }
            if self.current().is_none() {
                return Err(ParseError::UnclosedStructure("esac".to_string()));
            }
            body.push(self.parse_statement()?);
        }
        if self.at_dsemi() {
            self.pos += 2;
        }
        Ok(CaseItem { patterns, body })
    }

    /// `;;` is two adjacent `;` tokens; distinguished from a list
    /// separator by two-token lookahead.
    fn at_dsemi(&self) -> bool {
        matches!(self.current(), Some(Token::Op(Op::Semi)))
            && matches!(self.peek(1), Some(Token::Op(Op::Semi)))
    }

    /// `[[ ... ]]` collects words up to the `]]` keyword. Operators,
    /// symbols, and redirect tokens between the brackets fold into literal
    /// words; the clause carries no internal structure.
    pub(crate) fn parse_test(&mut self) -> Result<Command, ParseError> {
        self.pos += 1; // [[
        let mut words = Vec::new();
        loop {
            if self.at_keyword("]]") {
                if words.is_empty() {
                    return Err(ParseError::UnexpectedToken("]]".to_string()));
                }
                self.pos += 1;
                break;
            }
            if self.current().is_none() {
                return Err(ParseError::UnclosedStructure("]]".to_string()));
            }
            if self.is_word() {
                words.push(self.parse_word()?);
                continue;
            }
            let folded: Option<Vec<String>> = match self.current() {
                Some(Token::Op(Op::Semi)) => None,
                Some(Token::Op(op)) => Some(vec![op.as_str().to_string()]),
                Some(Token::Symbol(sym)) => Some(vec![sym.as_str().to_string()]),
                Some(Token::Redir { op, fd }) => {
                    let mut texts = Vec::new();
                    if let Some(fd) = fd {
                        texts.push(fd.clone());
                    }
                    texts.push(op.as_str().to_string());
                    Some(texts)
                }
                _ => None,
            };
            match folded {
                Some(texts) => {
                    self.pos += 1;
                    for text in texts {
                        words.push(AST::plain_word(text));
                    }
                }
                None => {
                    let display = self
                        .current()
                        .map(Token::display)
                        .unwrap_or_default();
                    return Err(ParseError::UnexpectedToken(display));
                }
            }
        }
        Ok(Command::Test(TestClause { words }))
    }

    /// `time <statement>`.
    pub(crate) fn parse_time(&mut self) -> Result<Command, ParseError> {
        self.pos += 1; // time
        let inner = self.parse_and_or()?;
        Ok(Command::Time(TimeClause {
            command: Box::new(AST::statement(inner)),
        }))
    }

    /// `coproc NAME { ... }` when a word directly precedes a `{`,
    /// otherwise `coproc <statement>`.
    pub(crate) fn parse_coproc(&mut self) -> Result<Command, ParseError> {
        self.pos += 1; // coproc
        if self.is_word() && matches!(self.peek(1), Some(Token::Symbol(Symbol::LBrace))) {
            let name = match self.advance() {
                Some(Token::Word(pieces)) => word_token_text(&pieces),
                _ => String::new(),
            };
            let body = self.parse_block()?;
            return Ok(Command::Coproc(CoprocClause {
                name: Some(name),
                body: Box::new(AST::statement(body)),
            }));
        }
        let inner = self.parse_and_or()?;
        Ok(Command::Coproc(CoprocClause {
            name: None,
            body: Box::new(AST::statement(inner)),
        }))
    }

    /// `function name [()] { body }`.
    pub(crate) fn parse_function(&mut self) -> Result<Command, ParseError> {
        self.pos += 1; // function
        let name = match self.current() {
            Some(Token::Word(pieces)) => word_token_text(pieces),
            _ => return Err(ParseError::ExpectedCommandWord),
        };
        self.pos += 1;
        if matches!(self.current(), Some(Token::Symbol(Symbol::LParen))) {
            self.pos += 1;
            self.expect_symbol(Symbol::RParen)?;
        }
        self.skip_separators(false);
        let body = self.parse_brace_group()?;
        Ok(Command::Function(FunctionDecl { name, body }))
    }

    /// `name () { body }` — the caller has already verified the
    /// `(`, `)`, `{` lookahead.
    pub(crate) fn parse_function_shorthand(&mut self) -> Result<Command, ParseError> {
        let name = match self.advance() {
            Some(Token::Word(pieces)) => word_token_text(&pieces),
            _ => return Err(ParseError::ExpectedCommandWord),
        };
        self.expect_symbol(Symbol::LParen)?;
        self.expect_symbol(Symbol::RParen)?;
        let body = self.parse_brace_group()?;
        Ok(Command::Function(FunctionDecl { name, body }))
    }

    pub(crate) fn parse_subshell(&mut self) -> Result<Command, ParseError> {
        self.pos += 1; // (
        let body = self.parse_list_until_symbol(Symbol::RParen)?;
        if body.is_empty() {
            return Err(ParseError::ExpectedCommandWord);
        }
        self.expect_symbol(Symbol::RParen)?;
        Ok(Command::Subshell(Subshell { body }))
    }

    pub(crate) fn parse_block(&mut self) -> Result<Command, ParseError> {
        Ok(Command::Block(Block {
            body: self.parse_brace_group()?,
        }))
    }

    pub(crate) fn parse_brace_group(&mut self) -> Result<Vec<Statement>, ParseError> {
        self.expect_symbol(Symbol::LBrace)?;
        let body = self.parse_list_until_symbol(Symbol::RBrace)?;
        if body.is_empty() {
            return Err(ParseError::ExpectedCommandWord);
        }
        self.expect_symbol(Symbol::RBrace)?;
        Ok(body)
    }

    fn unexpected_here(&self, missing: &str) -> ParseError {
        match self.current() {
            Some(token) => ParseError::UnexpectedToken(token.display()),
            None => ParseError::UnclosedStructure(missing.to_string()),
        }
    }
}
