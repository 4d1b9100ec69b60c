//! Source written by the generator, checked in and used without the compiler

#[path = "fixtures/key_value.rs"]
mod key_value;

use key_value::KeyValueGrammar;
use rustbnf::{BnfCompiler, CodegenOptions};

const KEY_VALUE: &str = "\
<pair>  ::= <key> '=' <value>
<key>   ::= <Letter>{<LetterOrDigit>}
<value> ::= <key> | <Start>'-'
";

const CHECKED_IN: &str = include_str!("fixtures/key_value.rs");

#[test]
fn test_checked_in_source_is_what_the_generator_writes() {
    let options = CodegenOptions::default()
        .with_class_name("KeyValueGrammar")
        .with_timestamp(0);
    let source = BnfCompiler::new()
        .generate_with(KEY_VALUE, "pair", options)
        .expect("generates");
    assert_eq!(source, CHECKED_IN);
}

#[test]
fn test_checked_in_grammar_matches_like_the_compiler() {
    let generated = KeyValueGrammar::build();
    let compiled = BnfCompiler::new()
        .compile(KEY_VALUE, "pair")
        .expect("compiles");

    assert_eq!(generated.rule_names(), compiled.rule_names());
    let samples = [
        "name = value",
        "x1 = y2",
        "x =  y",
        "x=y",
        "1x = y",
        "x = -",
        "x =",
        "ab\nc = x",
        "ab c = x",
        "a = b\n",
    ];
    for sample in samples {
        assert_eq!(
            generated.accepts(sample),
            compiled.accepts(sample),
            "sample {:?}",
            sample
        );
    }
    assert!(generated.accepts("name = value"));
    assert!(generated.accepts("ab c = x"));
    assert!(!generated.accepts("x=y"));
    assert!(!generated.accepts("ab\nc = x"));
}

#[test]
fn test_checked_in_grammar_builds_a_match_tree() {
    let grammar = KeyValueGrammar::build();
    let tree = grammar.parse("answer = yes").expect("matches");
    assert_eq!(tree.name, "pair");
    let names: Vec<_> = tree.children.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, ["key", "value"]);
}
