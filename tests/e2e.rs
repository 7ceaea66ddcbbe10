//! End-to-end scenarios S1-S7 (§8), each driving the public entry
//! points the way an external caller would.

mod common;

use std::fs;

use nginx_crossplane::ast::Status;
use nginx_crossplane::formatter::minify;
use nginx_crossplane::parser::ParseOptions;

#[test]
fn s1_simple_round_trip() {
    let payload = common::parse_text("events { worker_connections 1024; }\n", ParseOptions::default());
    assert_eq!(payload.status, Status::Ok);
    let tree = &payload.config[0].parsed;
    assert_eq!(tree.len(), 1);
    assert_eq!(tree[0].directive, "events");
    assert_eq!(tree[0].line, 1);
    assert!(tree[0].args.is_empty());
    let block = tree[0].block.as_ref().unwrap();
    assert_eq!(block.len(), 1);
    assert_eq!(block[0].directive, "worker_connections");
    assert_eq!(block[0].line, 1);
    assert_eq!(block[0].args, vec!["1024".to_string()]);
}

#[test]
fn s2_quote_escape_inside_double_quotes() {
    use nginx_crossplane::{lex, ExtensionRegistry, TokenKind};

    let ext = ExtensionRegistry::with_builtins();
    let tokens = lex(r#"log_format main "hello \"world\"";"#, "t.conf", &ext).unwrap();
    let rendered: Vec<_> = tokens
        .iter()
        .map(|t| (t.text.as_str(), t.line, t.quoted, t.kind))
        .collect();
    assert_eq!(
        rendered,
        vec![
            ("log_format", 1, false, TokenKind::Word),
            ("main", 1, false, TokenKind::Word),
            (r#"hello "world""#, 1, true, TokenKind::Word),
            ("", 1, false, TokenKind::Semicolon),
        ]
    );
}

fn write(dir: &std::path::Path, name: &str, contents: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

#[test]
fn s3_globbed_includes() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "nginx.conf", "events{}\ninclude http.conf;\n");
    write(dir.path(), "http.conf", "http{ include servers/*.conf; }\n");
    write(dir.path(), "servers/a.conf", "server { listen 80; }\n");
    write(dir.path(), "servers/b.conf", "server { listen 81; }\n");

    let expanded = common::parse_file(
        &dir.path().join("nginx.conf").to_string_lossy(),
        ParseOptions::default(),
    );
    assert_eq!(expanded.config.len(), 4);
    assert_eq!(expanded.config[0].parsed[1].includes, Some(vec![1]));
    assert_eq!(expanded.config[1].parsed[0].includes, Some(vec![2, 3]));

    let combined = common::parse_file(
        &dir.path().join("nginx.conf").to_string_lossy(),
        ParseOptions {
            combine: true,
            ..ParseOptions::default()
        },
    );
    assert_eq!(combined.config.len(), 1);
    let tree = &combined.config[0].parsed;
    let http = tree.iter().find(|n| n.directive == "http").unwrap();
    let servers = http.block.as_ref().unwrap();
    assert_eq!(servers.len(), 2);
    assert_eq!(servers[0].file.as_deref(), Some(dir.path().join("servers/a.conf").to_str().unwrap()));
}

#[test]
fn s4_missing_include_under_catch_errors() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "nginx.conf",
        "http {\n    include conf.d/server.conf;\n    include bar.conf;\n}\n",
    );
    write(
        dir.path(),
        "conf.d/server.conf",
        "server { listen 80; include bar.conf; }\n",
    );

    let payload = common::parse_file(
        &dir.path().join("nginx.conf").to_string_lossy(),
        ParseOptions::default(),
    );

    assert_eq!(payload.status, Status::Failed);
    assert_eq!(
        payload.errors.iter().filter(|e| e.error.contains("No such file or directory")).count(),
        1
    );
    let server_report = &payload.config[1];
    let server_block = server_report.parsed[0].block.as_ref().unwrap();
    let bar_include = server_block.iter().find(|n| n.directive == "include").unwrap();
    assert_eq!(bar_include.includes, Some(Vec::new()));
}

#[test]
fn s5_unknown_directive_in_strict_mode() {
    let payload = common::parse_text(
        "http{ server{ location /{ proxy_passs http://up; } } }",
        ParseOptions {
            strict: true,
            comments: true,
            ..ParseOptions::default()
        },
    );
    assert_eq!(payload.status, Status::Failed);
    assert_eq!(payload.errors.len(), 1);
    assert!(payload.errors[0].error.starts_with(r#"unknown directive "proxy_passs""#));

    let http = &payload.config[0].parsed[0];
    let server = &http.block.as_ref().unwrap()[0];
    let location = &server.block.as_ref().unwrap()[0];
    assert_eq!(location.directive, "location");
}

#[test]
fn s6_embedded_scripting_block_round_trips() {
    use nginx_crossplane::{lex, ExtensionRegistry};

    let ext = ExtensionRegistry::with_builtins();
    let source = "set_by_lua_block $res { return { 1,2,3 } };\n";
    let tokens = lex(source, "t.conf", &ext).unwrap();
    let words: Vec<_> = tokens
        .iter()
        .filter(|t| t.kind == nginx_crossplane::TokenKind::Word)
        .map(|t| t.text.as_str())
        .collect();
    assert_eq!(words, vec!["set_by_lua_block", "$res", " return { 1,2,3 } "]);

    let wrapped = format!("http {{ server {{ {source} }} }}\n");
    let payload = common::parse_text(&wrapped, ParseOptions::default());
    assert_eq!(payload.status, Status::Ok, "{:?}", payload.errors);
    common::assert_builds_back_to_equivalent_tree(&payload);
}

#[test]
fn s7_minify() {
    let input = "events { worker_connections 1024; } http { server { listen 80; } }";
    let out = minify(input).unwrap();
    assert_eq!(out, "events {worker_connections 1024;}http {server {listen 80;}}\n");
}
