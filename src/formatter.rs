//! Formatter (§4.8): Parser + Builder composed with one opinionated set
//! of knobs, mirroring the teacher's own `format()`.

use crate::builder::{self, BuildOptions};
use crate::catalog;
use crate::error::Error;
use crate::extensions::ExtensionRegistry;
use crate::parser::{ParseOptions, Parser};

const VIRTUAL_NAME: &str = "<input>";

/// Normalizes `input` to canonical, 4-space-indented form, retaining
/// comments. `include` directives are not followed — formatting operates
/// on the text handed to it, not a file on disk (use [`crate::parser::Parser::parse`]
/// directly for multi-file output).
///
/// # Errors
/// Propagates a lexer error; parser/analyzer errors are recorded on the
/// result's status rather than thrown.
pub fn format(input: &str) -> Result<String, Error> {
    render(input, &BuildOptions::default())
}

/// Like [`format`], but collapses all indentation and inter-directive
/// whitespace (§8 scenario S7).
///
/// # Errors
/// See [`format`].
pub fn minify(input: &str) -> Result<String, Error> {
    let options = BuildOptions {
        compact: true,
        ..BuildOptions::default()
    };
    render(input, &options)
}

fn render(input: &str, build_options: &BuildOptions) -> Result<String, Error> {
    let catalog = catalog::seed_catalog();
    let extensions = ExtensionRegistry::with_builtins();
    let parse_options = ParseOptions {
        comments: true,
        single_file: true,
        ..ParseOptions::default()
    };
    let parser = Parser::new(&catalog, &extensions, parse_options);
    let payload = parser.parse_text(input, VIRTUAL_NAME)?;
    let nodes = payload
        .config
        .first()
        .map(|report| report.parsed.as_slice())
        .unwrap_or_default();
    Ok(builder::build(nodes, &extensions, build_options))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_normalizes_indentation() {
        let input = "events{worker_connections 1024;}\n";
        let out = format(input).unwrap();
        assert_eq!(out, "events {\n    worker_connections 1024;\n}\n");
    }

    #[test]
    fn format_is_idempotent() {
        let input = "http {\n    server {\n        listen 80;\n    }\n}\n";
        let once = format(input).unwrap();
        let twice = format(&once).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn minify_scenario_s7() {
        let input = "events { worker_connections 1024; } http { server { listen 80; } }";
        let out = minify(input).unwrap();
        assert_eq!(
            out,
            "events {worker_connections 1024;}http {server {listen 80;}}\n"
        );
    }

    #[test]
    fn format_preserves_comments() {
        let input = "# top-level note\ngzip on;\n";
        let out = format(input).unwrap();
        assert!(out.contains("#top-level note") || out.contains("# top-level note"));
    }
}
