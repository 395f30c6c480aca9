//! Universal properties: the parser never panics or loops on arbitrary
//! input, parsing is deterministic, and accepted trees uphold the schema
//! invariants (pipeline arity, non-empty optional collections, omitted
//! absent fields).

use bash_ast::{parse, ParseOptions, Program};
use proptest::prelude::*;
use serde_json::Value;

/// Optional collections must be omitted rather than empty.
fn check_optional_fields(node: &Value, keys: &[&str]) {
    let Value::Object(map) = node else { return };
    for key in keys {
        if let Some(Value::Array(entries)) = map.get(*key) {
            assert!(
                !entries.is_empty(),
                "optional field `{key}` present but empty"
            );
        }
    }
}

/// Walk a serialized program and check schema invariants everywhere:
/// every `Pipeline` holds at least two statements, every `CaseItem` has
/// patterns, and optional collections are never present-but-empty.
fn check_invariants(value: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(Value::Object(pipeline)) = map.get("Pipeline") {
                let Some(Value::Array(statements)) = pipeline.get("statements") else {
                    panic!("pipeline without statements: {pipeline:?}");
                };
                assert!(
                    statements.len() >= 2,
                    "pipeline with fewer than 2 statements"
                );
            }
            if let Some(Value::Array(patterns)) = map.get("patterns") {
                assert!(!patterns.is_empty(), "case item with no patterns");
            }
            if let Some(Value::Array(comments)) = map.get("comments") {
                assert!(!comments.is_empty(), "comments present but empty");
            }
            for (variant, optional) in [
                ("Simple", &["words", "assignments", "redirects"][..]),
                ("Decl", &["args", "assignments", "redirects"][..]),
                ("Let", &["redirects"][..]),
                ("For", &["items"][..]),
                ("Select", &["items"][..]),
                ("If", &["else_branch"][..]),
            ] {
                if let Some(node) = map.get(variant) {
                    check_optional_fields(node, optional);
                }
            }
            for child in map.values() {
                check_invariants(child);
            }
        }
        Value::Array(entries) => {
            for child in entries {
                check_invariants(child);
            }
        }
        _ => {}
    }
}

fn roundtrip_invariants(program: &Program) {
    let value = serde_json::to_value(program).unwrap();
    check_invariants(&value);
    // The serialized form deserializes back to an equal tree.
    let back: Program = serde_json::from_value(value).unwrap();
    assert_eq!(&back, program);
}

proptest! {
    #[test]
    fn parse_terminates_on_arbitrary_input(input in "[ -~\\n]{0,60}") {
        // Either outcome is fine; panics and hangs are not.
        let _ = parse(&input, &ParseOptions::default());
    }

    #[test]
    fn parse_is_deterministic(input in "[ -~\\n]{0,60}") {
        let first = parse(&input, &ParseOptions::default());
        let second = parse(&input, &ParseOptions::default());
        prop_assert_eq!(first, second);
    }

    #[test]
    fn accepted_trees_uphold_schema_invariants(input in "[ -~\\n]{0,60}") {
        if let Ok(program) = parse(&input, &ParseOptions::default()) {
            roundtrip_invariants(&program);
        }
    }
}

#[test]
fn invariants_hold_on_representative_scripts() {
    let sources = [
        "a | b | c && d",
        "if x; then y; elif z; then w; fi",
        "case $1 in a|b) x ;; *) y ;; esac",
        "arr=([k]=v [0]=x) cmd >f 2>&1",
        "cat <<EOF\nbody line\nEOF",
        "for ((;;)); do break; done",
        "declare -r x=1 y",
        "f() { g | h; }",
        "coproc w { sleep 1; }",
        "diff <(sort a) >(tee b)",
        "! x && y &",
    ];
    for source in sources {
        let program = parse(source, &ParseOptions::default())
            .unwrap_or_else(|e| panic!("{source}: {e}"));
        roundtrip_invariants(&program);
    }
}

#[test]
fn discarded_comments_equal_stripped_source() {
    let commented = "a # one\nb # two\nc\n";
    let stripped = "a \nb \nc\n";
    let options = ParseOptions::default();
    assert_eq!(
        parse(commented, &options).unwrap(),
        parse(stripped, &options).unwrap()
    );
}

#[test]
fn kept_comments_only_differ_in_the_comment_list() {
    let source = "a # one\nb\n";
    let keep = ParseOptions {
        keep_comments: true,
        ..ParseOptions::default()
    };
    let kept = parse(source, &keep).unwrap();
    let discarded = parse(source, &ParseOptions::default()).unwrap();
    assert_eq!(kept.statements, discarded.statements);
    assert_eq!(kept.comments, Some(vec![" one".to_string()]));
    assert_eq!(discarded.comments, None);
}
