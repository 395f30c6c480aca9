//! Abstract Syntax Tree (AST) Types for Bash
//!
//! This module defines the AST schema produced by the parser. The schema is
//! the contract consumers read: every node is a tagged variant, children are
//! owned, and optional collections are omitted (`None`) rather than empty.
//! Serialization mirrors that convention by skipping absent fields.

use std::fmt;

use serde::{Deserialize, Serialize};

// =============================================================================
// PROGRAM & STATEMENTS
// =============================================================================

/// Root node: a complete script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub statements: Vec<Statement>,
    /// Preserved `#` comments, in encounter order, when the keep-comments
    /// option is set. Comments carry no structural role and never attach to
    /// individual nodes.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub comments: Option<Vec<String>>,
}

/// The unit of list-level composition. Wraps exactly one command together
/// with the `&` and `!` markers that apply to it as a whole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    pub command: Command,
    /// Terminated by `&`.
    pub background: bool,
    /// Prefixed by `!`.
    pub negated: bool,
}

/// Union of all command forms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    Simple(SimpleCommand),
    Subshell(Subshell),
    Block(Block),
    If(IfClause),
    While(WhileClause),
    For(ForClause),
    Select(SelectClause),
    Function(FunctionDecl),
    Case(CaseClause),
    Time(TimeClause),
    Test(TestClause),
    Arith(ArithCmd),
    Coproc(CoprocClause),
    Pipeline(Pipeline),
    Logical(Logical),
    Decl(DeclClause),
    Let(LetClause),
    CStyleLoop(CStyleLoop),
}

// =============================================================================
// PIPELINES & LOGICAL LISTS
// =============================================================================

/// `cmd1 | cmd2 | ...` — always holds at least two statements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pipeline {
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogicalOp {
    And, // &&
    Or,  // ||
}

/// `left && right` / `left || right`. Left-associative; binds looser than
/// `|`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Logical {
    pub op: LogicalOp,
    pub left: Box<Statement>,
    pub right: Box<Statement>,
}

// =============================================================================
// SIMPLE COMMANDS
// =============================================================================

/// Words, leading assignments, and redirects, each in source order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimpleCommand {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub words: Option<Vec<Word>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub assignments: Option<Vec<Assignment>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub redirects: Option<Vec<Redirect>>,
}

// =============================================================================
// COMPOUND COMMANDS
// =============================================================================

/// `( ... )` — body runs in an isolated execution environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subshell {
    pub body: Vec<Statement>,
}

/// `{ ...; }` — body runs in the current environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub body: Vec<Statement>,
}

/// `if ... then ... [else ...] fi`. An `elif` chain is represented as an
/// else branch whose single statement is another `IfClause`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IfClause {
    pub condition: Vec<Statement>,
    pub then_branch: Vec<Statement>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub else_branch: Option<Vec<Statement>>,
}

/// `while`/`until` loop; `until` is the same shape with the flag set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhileClause {
    pub condition: Vec<Statement>,
    pub body: Vec<Statement>,
    pub until: bool,
}

/// `for NAME [in WORDS]; do ...; done`. An absent item list means the loop
/// iterates the positional parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForClause {
    pub variable: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub items: Option<Vec<Word>>,
    pub body: Vec<Statement>,
}

/// `select NAME [in WORDS]; do ...; done` — identical shape to `for`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectClause {
    pub variable: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub items: Option<Vec<Word>>,
    pub body: Vec<Statement>,
}

/// `for (( init; cond; post )); do ...; done`. The three expressions are
/// verbatim slices from inside `(( ))`; empty slots are absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CStyleLoop {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub init: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub condition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub post: Option<String>,
    pub body: Vec<Statement>,
}

/// `case WORD in ... esac`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseClause {
    pub word: Word,
    pub items: Vec<CaseItem>,
}

/// One `pattern[|pattern...]) body ;;` arm. The patterns list is never
/// empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseItem {
    pub patterns: Vec<Word>,
    pub body: Vec<Statement>,
}

/// `function name { ... }` or `name() { ... }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDecl {
    pub name: String,
    pub body: Vec<Statement>,
}

/// `[[ ... ]]` — an ordered, unstructured word list. No operator tree is
/// built; consumers interpret the words.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestClause {
    pub words: Vec<Word>,
}

/// `(( expr ))` as a standalone command. The expression is verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArithCmd {
    pub expr: String,
}

/// `coproc [NAME] command`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoprocClause {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub name: Option<String>,
    pub body: Box<Statement>,
}

/// `time command`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeClause {
    pub command: Box<Statement>,
}

/// Which declaration builtin heads the clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeclVariant {
    Declare,
    Local,
    Export,
    Readonly,
    Typeset,
    Nameref,
}

impl DeclVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Declare => "declare",
            Self::Local => "local",
            Self::Export => "export",
            Self::Readonly => "readonly",
            Self::Typeset => "typeset",
            Self::Nameref => "nameref",
        }
    }
}

/// A declaration builtin with its flag/name arguments, assignments, and
/// redirects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeclClause {
    pub variant: DeclVariant,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub args: Option<Vec<Word>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub assignments: Option<Vec<Assignment>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub redirects: Option<Vec<Redirect>>,
}

/// `let expr...` with at least one expression word.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LetClause {
    pub exprs: Vec<Word>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub redirects: Option<Vec<Redirect>>,
}

// =============================================================================
// WORDS
// =============================================================================

/// A word is an ordered sequence of parts. A "plain literal" word has
/// exactly one `Literal` part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    pub parts: Vec<WordPart>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WordPart {
    /// Unquoted text fragment.
    Literal(String),
    /// `'...'` — no interpretation.
    SglQuoted(String),
    /// `"..."` — inner parts keep backslash escapes verbatim; semantic
    /// un-escaping is a consumer concern.
    DblQuoted(Vec<WordPart>),
    /// `$x` / `${x...}`.
    ParamExp(ParamExp),
    /// `$(...)` or `` `...` `` — the inner program, parsed.
    CmdSubst(CmdSubst),
    /// `$((...))` — verbatim expression, never re-parsed.
    ArithExp(ArithExp),
    /// `<(...)` / `>(...)` — the inner program, parsed.
    ProcSubst(ProcSubst),
}

/// Parameter expansion. Elaborate `${...}` forms that do not match the
/// fixed operator alphabet keep the entire bracketed content in `name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamExp {
    /// `$x` as opposed to `${x}`.
    pub short: bool,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub op: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub value: Option<Word>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CmdSubst {
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArithExp {
    pub expr: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProcessDirection {
    Input,  // <(...)
    Output, // >(...)
}

impl fmt::Display for ProcessDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input => write!(f, "<"),
            Self::Output => write!(f, ">"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcSubst {
    pub direction: ProcessDirection,
    pub statements: Vec<Statement>,
}

// =============================================================================
// ASSIGNMENTS
// =============================================================================

/// `NAME=value` / `NAME+=value` / `NAME=( ... )`. The name always matches
/// `[A-Za-z_][A-Za-z0-9_]*`; lexemes failing that parse as ordinary words.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub name: String,
    /// Append mode (`+=`).
    pub append: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub value: Option<Word>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub array: Option<ArrayExpr>,
}

/// `( elem... )` on the right-hand side of an assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrayExpr {
    pub elements: Vec<ArrayElem>,
}

/// `value` or `[index]=value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrayElem {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub index: Option<Word>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub value: Option<Word>,
}

// =============================================================================
// REDIRECTS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RedirOp {
    Less,      // <
    Great,     // >
    DGreat,    // >>
    Clobber,   // >|
    GreatAnd,  // >&
    LessAnd,   // <&
    LessGreat, // <>
    AndGreat,  // &>
    AndDGreat, // &>>
    TLess,     // <<<
    DLess,     // <<
    DLessDash, // <<-
}

impl RedirOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Less => "<",
            Self::Great => ">",
            Self::DGreat => ">>",
            Self::Clobber => ">|",
            Self::GreatAnd => ">&",
            Self::LessAnd => "<&",
            Self::LessGreat => "<>",
            Self::AndGreat => "&>",
            Self::AndDGreat => "&>>",
            Self::TLess => "<<<",
            Self::DLess => "<<",
            Self::DLessDash => "<<-",
        }
    }

    /// True for the two here-document forms.
    pub fn is_heredoc(&self) -> bool {
        matches!(self, Self::DLess | Self::DLessDash)
    }
}

impl fmt::Display for RedirOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An I/O redirect. `fd` is the optional leading descriptor digits
/// (`2>&1`), kept as written. For `<<`/`<<-` the `target` is the delimiter
/// word and `heredoc` carries the collected body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Redirect {
    pub op: RedirOp,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub fd: Option<String>,
    pub target: Word,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub heredoc: Option<Word>,
}

// =============================================================================
// FACTORY FUNCTIONS (AST builders)
// =============================================================================

/// AST factory for building nodes.
pub struct AST;

impl AST {
    pub fn program(statements: Vec<Statement>) -> Program {
        Program {
            statements,
            comments: None,
        }
    }

    /// Wrap a command in a plain statement (no `&`, no `!`).
    pub fn statement(command: Command) -> Statement {
        Statement {
            command,
            background: false,
            negated: false,
        }
    }

    pub fn word(parts: Vec<WordPart>) -> Word {
        Word { parts }
    }

    /// A word holding a single literal part.
    pub fn plain_word(value: impl Into<String>) -> Word {
        Word {
            parts: vec![WordPart::Literal(value.into())],
        }
    }

    pub fn literal(value: impl Into<String>) -> WordPart {
        WordPart::Literal(value.into())
    }

    pub fn sgl_quoted(value: impl Into<String>) -> WordPart {
        WordPart::SglQuoted(value.into())
    }

    pub fn dbl_quoted(parts: Vec<WordPart>) -> WordPart {
        WordPart::DblQuoted(parts)
    }

    pub fn assignment(
        name: impl Into<String>,
        append: bool,
        value: Option<Word>,
        array: Option<ArrayExpr>,
    ) -> Assignment {
        Assignment {
            name: name.into(),
            append,
            value,
            array,
        }
    }

    pub fn redirect(op: RedirOp, fd: Option<String>, target: Word) -> Redirect {
        Redirect {
            op,
            fd,
            target,
            heredoc: None,
        }
    }

    /// `None` for an empty collection; absence is represented by omission,
    /// never by an empty list.
    pub fn opt<T>(items: Vec<T>) -> Option<Vec<T>> {
        if items.is_empty() {
            None
        } else {
            Some(items)
        }
    }
}
