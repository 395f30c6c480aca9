//! End-to-end parsing scenarios: one test per representative script shape,
//! asserting the exact tree the parser contracts to produce.

use bash_ast::{
    parse, Command, LogicalOp, ParseError, ParseOptions, Program, RedirOp, Statement, Word,
    WordPart, AST,
};

fn parse_ok(input: &str) -> Program {
    parse(input, &ParseOptions::default()).unwrap()
}

fn parse_err(input: &str) -> ParseError {
    parse(input, &ParseOptions::default()).unwrap_err()
}

fn single_command(program: &Program) -> &Command {
    assert_eq!(program.statements.len(), 1);
    &program.statements[0].command
}

fn simple_stmt(name: &str) -> Statement {
    AST::statement(Command::Simple(bash_ast::SimpleCommand {
        words: Some(vec![AST::plain_word(name)]),
        assignments: None,
        redirects: None,
    }))
}

fn word_text(word: &Word) -> String {
    word.parts
        .iter()
        .map(|part| match part {
            WordPart::Literal(text) | WordPart::SglQuoted(text) => text.clone(),
            other => panic!("expected literal, got {:?}", other),
        })
        .collect()
}

#[test]
fn pipeline_feeds_logical_or() {
    let program = parse_ok("foo | bar || baz");
    let expected = AST::statement(Command::Logical(bash_ast::Logical {
        op: LogicalOp::Or,
        left: Box::new(AST::statement(Command::Pipeline(bash_ast::Pipeline {
            statements: vec![simple_stmt("foo"), simple_stmt("bar")],
        }))),
        right: Box::new(simple_stmt("baz")),
    }));
    assert_eq!(program.statements, vec![expected]);
}

#[test]
fn elif_chain_desugars_recursively() {
    let program = parse_ok("if a; then b; elif c; then d; else e; fi");
    let Command::If(outer) = single_command(&program) else {
        panic!("expected if clause");
    };
    assert_eq!(outer.condition, vec![simple_stmt("a")]);
    assert_eq!(outer.then_branch, vec![simple_stmt("b")]);
    let else_branch = outer.else_branch.as_ref().unwrap();
    let Command::If(nested) = &else_branch[0].command else {
        panic!("expected nested if for elif");
    };
    assert_eq!(nested.condition, vec![simple_stmt("c")]);
    assert_eq!(nested.then_branch, vec![simple_stmt("d")]);
    assert_eq!(nested.else_branch, Some(vec![simple_stmt("e")]));
}

#[test]
fn c_style_loop_scenario() {
    let program = parse_ok("for ((i=0; i<10; i++)); do echo $i; done");
    let Command::CStyleLoop(clause) = single_command(&program) else {
        panic!("expected c-style loop");
    };
    assert_eq!(clause.init.as_deref(), Some("i=0"));
    assert_eq!(clause.condition.as_deref(), Some("i<10"));
    assert_eq!(clause.post.as_deref(), Some("i++"));
    assert_eq!(clause.body.len(), 1);
    let Command::Simple(echo) = &clause.body[0].command else {
        panic!("expected simple command in body");
    };
    let words = echo.words.as_ref().unwrap();
    assert!(matches!(&words[1].parts[0], WordPart::ParamExp(p) if p.name == "i" && p.short));
}

#[test]
fn case_scenario() {
    let program = parse_ok("case x in a|b) z ;; esac");
    let Command::Case(clause) = single_command(&program) else {
        panic!("expected case clause");
    };
    assert_eq!(word_text(&clause.word), "x");
    assert_eq!(clause.items.len(), 1);
    assert_eq!(
        clause.items[0]
            .patterns
            .iter()
            .map(word_text)
            .collect::<Vec<_>>(),
        vec!["a", "b"]
    );
    assert_eq!(clause.items[0].body, vec![simple_stmt("z")]);
}

#[test]
fn keyed_array_scenario() {
    let program = parse_ok("arr=([k]=v [0]=x)");
    let Command::Simple(cmd) = single_command(&program) else {
        panic!("expected simple command");
    };
    assert_eq!(cmd.words, None);
    let assignments = cmd.assignments.as_ref().unwrap();
    assert_eq!(assignments[0].name, "arr");
    let array = assignments[0].array.as_ref().unwrap();
    let pairs: Vec<(String, String)> = array
        .elements
        .iter()
        .map(|e| {
            (
                word_text(e.index.as_ref().unwrap()),
                word_text(e.value.as_ref().unwrap()),
            )
        })
        .collect();
    assert_eq!(
        pairs,
        vec![
            ("k".to_string(), "v".to_string()),
            ("0".to_string(), "x".to_string())
        ]
    );
}

#[test]
fn heredoc_scenario() {
    let program = parse_ok("cat <<EOF\nhello\nEOF");
    let Command::Simple(cmd) = single_command(&program) else {
        panic!("expected simple command");
    };
    assert_eq!(word_text(&cmd.words.as_ref().unwrap()[0]), "cat");
    let redirects = cmd.redirects.as_ref().unwrap();
    assert_eq!(redirects[0].op, RedirOp::DLess);
    assert_eq!(word_text(&redirects[0].target), "EOF");
    assert_eq!(
        word_text(redirects[0].heredoc.as_ref().unwrap()),
        "hello\n"
    );
}

#[test]
fn herestring_scenario() {
    let program = parse_ok("grep -rn '\\bnpm\\b' <<< 'npm install'");
    let Command::Simple(cmd) = single_command(&program) else {
        panic!("expected simple command");
    };
    let words = cmd.words.as_ref().unwrap();
    assert_eq!(word_text(&words[0]), "grep");
    let redirects = cmd.redirects.as_ref().unwrap();
    assert_eq!(redirects[0].op, RedirOp::TLess);
    assert_eq!(word_text(&redirects[0].target), "npm install");
}

#[test]
fn negation_with_background_scenario() {
    let program = parse_ok("! foo && bar &");
    let statement = &program.statements[0];
    assert!(statement.negated);
    assert!(statement.background);
    let Command::Logical(logical) = &statement.command else {
        panic!("expected logical");
    };
    assert_eq!(logical.op, LogicalOp::And);
    assert_eq!(word_text_of_simple(&logical.left.command), "foo");
    assert_eq!(word_text_of_simple(&logical.right.command), "bar");
}

fn word_text_of_simple(command: &Command) -> String {
    let Command::Simple(cmd) = command else {
        panic!("expected simple command");
    };
    word_text(&cmd.words.as_ref().unwrap()[0])
}

#[test]
fn nested_command_substitution_reparses() {
    let program = parse_ok("echo $(ls $(pwd))");
    let Command::Simple(cmd) = single_command(&program) else {
        panic!("expected simple command");
    };
    let words = cmd.words.as_ref().unwrap();
    let WordPart::CmdSubst(outer) = &words[1].parts[0] else {
        panic!("expected command substitution");
    };
    let Command::Simple(inner_cmd) = &outer.statements[0].command else {
        panic!("expected inner simple command");
    };
    let inner_words = inner_cmd.words.as_ref().unwrap();
    assert!(matches!(&inner_words[1].parts[0], WordPart::CmdSubst(_)));
}

#[test]
fn process_substitution_scenario() {
    let program = parse_ok("diff <(sort a) <(sort b)");
    let Command::Simple(cmd) = single_command(&program) else {
        panic!("expected simple command");
    };
    let words = cmd.words.as_ref().unwrap();
    assert_eq!(words.len(), 3);
    let WordPart::ProcSubst(subst) = &words[1].parts[0] else {
        panic!("expected process substitution");
    };
    assert_eq!(subst.direction, bash_ast::ProcessDirection::Input);
    assert_eq!(subst.statements.len(), 1);
}

#[test]
fn backtick_becomes_command_substitution() {
    let program = parse_ok("echo `date`");
    let Command::Simple(cmd) = single_command(&program) else {
        panic!("expected simple command");
    };
    let words = cmd.words.as_ref().unwrap();
    let WordPart::CmdSubst(subst) = &words[1].parts[0] else {
        panic!("expected command substitution for backticks");
    };
    assert_eq!(word_text_of_simple(&subst.statements[0].command), "date");
}

#[test]
fn double_quoted_word_with_expansions() {
    let program = parse_ok("echo \"run $cmd in $(pwd) at $((1 + 2))\"");
    let Command::Simple(cmd) = single_command(&program) else {
        panic!("expected simple command");
    };
    let words = cmd.words.as_ref().unwrap();
    let WordPart::DblQuoted(parts) = &words[1].parts[0] else {
        panic!("expected double-quoted word");
    };
    assert!(matches!(&parts[0], WordPart::Literal(t) if t == "run "));
    assert!(matches!(&parts[1], WordPart::ParamExp(p) if p.name == "cmd"));
    assert!(matches!(&parts[3], WordPart::CmdSubst(_)));
    assert!(matches!(&parts[5], WordPart::ArithExp(a) if a.expr == "1 + 2"));
}

#[test]
fn negative_scenarios_from_the_error_catalog() {
    assert_eq!(parse_err("\"foo"), ParseError::UnclosedDoubleQuote);
    assert_eq!(parse_err("'foo"), ParseError::UnclosedSingleQuote);
    assert_eq!(
        parse_err("if a; then b"),
        ParseError::UnclosedStructure("elif, else, fi".to_string())
    );
    assert_eq!(parse_err("arr=(a b"), ParseError::UnclosedArrayExpression);
    assert_eq!(parse_err("foo >"), ParseError::RedirectWithoutTarget);
    assert_eq!(parse_err("let"), ParseError::LetRequiresExpression);
}

#[test]
fn multi_statement_script() {
    let source = "\
set -e\n\
FOO=1 ./run.sh --flag >out.log 2>&1\n\
if [[ -n $FOO ]]; then\n\
  for f in a b; do cat \"$f\"; done\n\
fi\n";
    let program = parse_ok(source);
    assert_eq!(program.statements.len(), 3);
    assert!(matches!(program.statements[2].command, Command::If(_)));
}

#[test]
fn parse_is_deterministic_across_calls() {
    let source = "case $1 in start) s=1 ;; stop) s=0 ;; esac; echo $s | tee log";
    assert_eq!(parse_ok(source), parse_ok(source));
}
