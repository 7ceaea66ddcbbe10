#![allow(dead_code)]

use std::collections::HashMap;

use nginx_crossplane::ast::{ParsedPayload, Status};
use nginx_crossplane::builder::{self, BuildOptions};
use nginx_crossplane::catalog;
use nginx_crossplane::extensions::ExtensionRegistry;
use nginx_crossplane::parser::{ParseOptions, Parser};
use nginx_crossplane::DirectiveNode;
use proptest::prelude::*;

pub fn default_catalog() -> HashMap<String, Vec<u64>> {
    catalog::seed_catalog()
}

/// Parses `input` in isolation (no real include context), the way the
/// formatter does.
pub fn parse_text(input: &str, options: ParseOptions) -> ParsedPayload {
    let cat = default_catalog();
    let ext = ExtensionRegistry::with_builtins();
    let parser = Parser::new(&cat, &ext, options);
    parser.parse_text(input, "<test>").expect("parse_text failed")
}

/// Parses a config file from disk plus everything it `include`s.
pub fn parse_file(path: &str, options: ParseOptions) -> ParsedPayload {
    let cat = default_catalog();
    let ext = ExtensionRegistry::with_builtins();
    let parser = Parser::new(&cat, &ext, options);
    parser.parse(path).expect("parse failed")
}

/// Renders a payload's first file report back to text with default
/// options, then asserts re-parsing it yields a tree equal to the
/// original modulo `line` fields (§8 invariant 2/3).
pub fn assert_builds_back_to_equivalent_tree(payload: &ParsedPayload) {
    let ext = ExtensionRegistry::with_builtins();
    let report = payload.config.first().expect("no file report");
    let text = builder::build(&report.parsed, &ext, &BuildOptions::default());

    let reparsed = parse_text(
        &text,
        ParseOptions {
            comments: true,
            single_file: true,
            ..ParseOptions::default()
        },
    );
    assert_eq!(reparsed.status, Status::Ok, "re-parse of built output failed: {text}");

    let rebuilt = reparsed.config.first().expect("no file report after reparse");
    assert_eq!(
        strip_lines(&report.parsed),
        strip_lines(&rebuilt.parsed),
        "tree changed across a build/parse round trip\n--- rebuilt text ---\n{text}"
    );
}

/// Zeroes out `line` everywhere so two trees can be compared modulo
/// source position (§8 invariant 2).
pub fn strip_lines(nodes: &[DirectiveNode]) -> Vec<DirectiveNode> {
    nodes
        .iter()
        .map(|n| {
            let mut n = n.clone();
            n.line = 0;
            if let Some(block) = &n.block {
                n.block = Some(strip_lines(block));
            }
            n
        })
        .collect()
}

/// Parses `input` with catalog checks disabled, so arbitrarily generated
/// directive/argument combinations never trip the analyzer. Used by the
/// property tests, which exist to probe the builder/quoting pipeline
/// rather than catalog semantics (already covered in `analyzer.rs`).
pub fn parse_text_unchecked(input: &str) -> ParsedPayload {
    parse_text(
        input,
        ParseOptions {
            comments: true,
            single_file: true,
            check_ctx: false,
            check_args: false,
            ..ParseOptions::default()
        },
    )
}

/// A directive name: lowercase alpha then alphanumeric/underscore,
/// matching the identifiers the lexer treats as ordinary words.
/// Excludes `if`, whose builder rendering wraps the whole argument list
/// in literal parens rather than quoting each argument independently —
/// not a generic round-trip property these tests are after.
pub fn directive_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,12}".prop_filter("not the special-cased `if` directive", |s| s != "if")
}

/// An argument string exercising the quoting utility's decision
/// boundaries: plain words, embedded whitespace, quotes, braces,
/// `${...}` expansions, and dangling escapes.
pub fn argument() -> impl Strategy<Value = String> {
    prop_oneof![
        3 => "[a-zA-Z0-9/_.-]{1,10}",
        1 => Just("hello world".to_string()),
        1 => Just(r#"say "hi""#.to_string()),
        1 => Just("it's ok".to_string()),
        1 => Just("${foo}".to_string()),
        1 => Just("x${foo}y".to_string()),
        1 => Just(r"trailing\".to_string()),
        1 => Just("trailing$".to_string()),
    ]
}

fn leaf() -> impl Strategy<Value = DirectiveNode> {
    (directive_name(), proptest::collection::vec(argument(), 0..3)).prop_map(|(name, args)| {
        let mut node = DirectiveNode::new(name, 1);
        node.args = args;
        node
    })
}

/// A tree of directive nodes up to 3 levels deep, each block holding
/// 0..4 children (leaves or nested blocks).
pub fn directive_tree() -> impl Strategy<Value = Vec<DirectiveNode>> {
    let node = leaf().prop_recursive(3, 16, 4, |inner| {
        (directive_name(), proptest::collection::vec(inner, 0..4))
            .prop_map(|(name, children)| DirectiveNode::new(name, 1).block(children))
    });
    proptest::collection::vec(node, 0..4)
}
