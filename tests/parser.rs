//! Include-expansion scenarios that need real files on disk: globbed
//! includes, missing includes under `catchErrors`, and combine mode
//! (§8 scenarios S3-S5).

mod common;

use std::fs;

use nginx_crossplane::parser::ParseOptions;

fn write(dir: &std::path::Path, name: &str, contents: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

#[test]
fn globbed_includes_are_discovered_in_order_s3() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "nginx.conf", "events {}\ninclude http.conf;\n");
    write(dir.path(), "http.conf", "http { include servers/*.conf; }\n");
    write(dir.path(), "servers/a.conf", "server { listen 80; }\n");
    write(dir.path(), "servers/b.conf", "server { listen 81; }\n");

    let payload = common::parse_file(
        &dir.path().join("nginx.conf").to_string_lossy(),
        ParseOptions::default(),
    );

    assert_eq!(payload.config.len(), 4);
    let nginx = &payload.config[0];
    let http = &payload.config[1];
    assert_eq!(nginx.parsed[1].includes, Some(vec![1]));
    assert_eq!(http.parsed[0].includes, Some(vec![2, 3]));
}

#[test]
fn combine_mode_inlines_every_include_in_order_s3() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "nginx.conf", "events {}\ninclude http.conf;\n");
    write(dir.path(), "http.conf", "http { include servers/*.conf; }\n");
    write(dir.path(), "servers/a.conf", "server { listen 80; }\n");
    write(dir.path(), "servers/b.conf", "server { listen 81; }\n");

    let payload = common::parse_file(
        &dir.path().join("nginx.conf").to_string_lossy(),
        ParseOptions {
            combine: true,
            ..ParseOptions::default()
        },
    );

    assert_eq!(payload.config.len(), 1);
    let tree = &payload.config[0].parsed;
    // No "include" directive survives combine mode (§8 invariant 5).
    assert!(!tree.iter().any(|n| n.directive == "include"));
    let http_node = tree.iter().find(|n| n.directive == "http").unwrap();
    let http_block = http_node.block.as_ref().unwrap();
    assert_eq!(http_block.len(), 2);
    assert_eq!(http_block[0].directive, "server");
    assert_eq!(http_block[1].directive, "server");
}

#[test]
fn missing_include_is_recorded_not_thrown_under_catch_errors_s4() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "nginx.conf",
        "http {\n    include conf.d/server.conf;\n    include bar.conf;\n}\n",
    );
    fs::create_dir_all(dir.path().join("conf.d")).unwrap();
    write(
        dir.path(),
        "conf.d/server.conf",
        "server { listen 80; include bar.conf; }\n",
    );

    let payload = common::parse_file(
        &dir.path().join("nginx.conf").to_string_lossy(),
        ParseOptions::default(),
    );

    assert_eq!(payload.status, nginx_crossplane::ast::Status::Failed);
    assert!(payload
        .errors
        .iter()
        .any(|e| e.error.contains("No such file or directory")));

    let server_report = &payload.config[1];
    let include_node = server_report.parsed[0]
        .block
        .as_ref()
        .unwrap()
        .iter()
        .find(|n| n.directive == "include")
        .unwrap();
    assert_eq!(include_node.includes, Some(Vec::new()));
}

#[test]
fn strict_mode_reports_unknown_directive_but_keeps_surrounding_structure_s5() {
    let payload = common::parse_text(
        "http{ server{ location /{ proxy_passs http://up; } } }",
        ParseOptions {
            strict: true,
            comments: true,
            ..ParseOptions::default()
        },
    );

    assert_eq!(payload.status, nginx_crossplane::ast::Status::Failed);
    assert_eq!(payload.errors.len(), 1);
    assert!(payload.errors[0].error.contains("unknown directive \"proxy_passs\""));

    let http = &payload.config[0].parsed[0];
    let server = &http.block.as_ref().unwrap()[0];
    let location = &server.block.as_ref().unwrap()[0];
    assert_eq!(location.directive, "location");
    assert_eq!(location.args, vec!["/".to_string()]);
}

#[test]
fn repeated_include_of_the_same_file_is_queued_once() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "nginx.conf",
        "http {\n    include common.conf;\n    include common.conf;\n}\n",
    );
    write(dir.path(), "common.conf", "gzip on;\n");

    let payload = common::parse_file(
        &dir.path().join("nginx.conf").to_string_lossy(),
        ParseOptions::default(),
    );

    // common.conf is queued exactly once regardless of how many times it
    // is included (canonical_key idempotency).
    assert_eq!(payload.config.len(), 2);
    let includes = &payload.config[0].parsed[0].block.as_ref().unwrap();
    assert_eq!(includes[0].includes, Some(vec![1]));
    assert_eq!(includes[1].includes, Some(vec![1]));
}

#[test]
fn known_directive_misused_inside_a_realistic_location_block_is_rejected() {
    let payload = common::parse_text(
        "http { server { location / { listen 80; } } }",
        ParseOptions::default(),
    );

    assert_eq!(payload.status, nginx_crossplane::ast::Status::Failed);
    assert!(payload
        .errors
        .iter()
        .any(|e| e.error.contains("\"listen\" directive is not allowed here")));
}

#[test]
fn single_file_mode_does_not_expand_includes() {
    let payload = common::parse_text(
        "http { include anything.conf; }",
        ParseOptions {
            single_file: true,
            ..ParseOptions::default()
        },
    );
    assert_eq!(payload.config.len(), 1);
    let include_node = &payload.config[0].parsed[0].block.as_ref().unwrap()[0];
    assert_eq!(include_node.directive, "include");
    assert!(include_node.includes.is_none());
}
