//! Lexer, parser, directive analyzer, and builder for NGINX configuration
//! files.
//!
//! Converts configuration text into a structured directive tree, follows
//! `include` directives across multiple files, validates directives
//! against a bitmask-encoded catalog of contexts and argument arities,
//! and losslessly serializes the tree back to text.
//!
//! # Quick start
//!
//! ## Parse and re-format a single file's text
//!
//! ```
//! use nginx_crossplane::formatter;
//!
//! let input = "events{worker_connections 1024;}\n";
//! let output = formatter::format(input).unwrap();
//! assert_eq!(output, "events {\n    worker_connections 1024;\n}\n");
//! ```
//!
//! ## Parse a file plus everything it `include`s
//!
//! ```no_run
//! use nginx_crossplane::{catalog, ExtensionRegistry, ParseOptions, Parser};
//!
//! let catalog = catalog::seed_catalog();
//! let extensions = ExtensionRegistry::with_builtins();
//! let parser = Parser::new(&catalog, &extensions, ParseOptions::default());
//! let payload = parser.parse("/etc/nginx/nginx.conf").unwrap();
//! assert!(payload.is_ok());
//! ```

#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions
)]

pub mod analyzer;
pub mod ast;
pub mod builder;
pub mod catalog;
pub mod char_stream;
pub mod error;
pub mod extensions;
pub mod formatter;
pub mod lexer;
pub mod parser;
pub mod quote;
pub mod token;

pub use ast::{DirectiveNode, FileError, FileReport, ParsedPayload, PayloadError, Status};
pub use builder::{build, build_files, resolve_target, BuildOptions};
pub use error::{Error, LexError, LexErrorKind, ParseError, ParseErrorKind};
pub use extensions::ExtensionRegistry;
pub use formatter::{format, minify};
pub use lexer::lex;
pub use parser::{ParseOptions, Parser};
pub use token::{Token, TokenKind};

/// Parses `filename` plus every file it transitively `include`s, using the
/// seed catalog and the built-in extension hooks, with default options.
pub fn parse(filename: &str) -> Result<ParsedPayload, Error> {
    let catalog = catalog::seed_catalog();
    let extensions = ExtensionRegistry::with_builtins();
    let parser = Parser::new(&catalog, &extensions, ParseOptions::default());
    parser.parse(filename)
}
