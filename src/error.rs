//! Error types for the lexer, parser, and analyzer.
//!
//! Lexer errors are unconditionally fatal for the file being lexed
//! (§7: "lexer errors ... propagate unconditionally"). Parser/analyzer
//! errors are either recorded on the payload (`catchErrors: true`, the
//! default) or propagated, depending on [`crate::parser::ParseOptions`].

use std::fmt;

/// Classifies a lexer error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LexErrorKind {
    /// A `}` appeared with no matching open `{` at the current depth.
    #[error("unexpected \"}}\"")]
    UnexpectedRightBrace,
    /// A `"` or `'` was opened but never closed before EOF.
    #[error("unterminated quoted string")]
    UnterminatedQuote,
    /// A `${` expansion was opened but never closed before EOF or newline.
    #[error("unterminated variable expansion")]
    UnterminatedVariableExpansion,
    /// An extension lex hook could not find its terminating block.
    #[error("unterminated \"{directive}\" directive")]
    UnterminatedExtensionBlock { directive: String },
}

/// Error produced while tokenizing a file. Always fatal for that file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    pub kind: LexErrorKind,
    pub file: String,
    pub line: usize,
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} in {}:{}", self.kind, self.file, self.line)
    }
}

impl std::error::Error for LexError {}

/// Classifies a parser/analyzer-stage error.
///
/// Unlike [`LexErrorKind`], these are recorded rather than thrown when
/// `catchErrors` is enabled (the default) — see
/// [`crate::parser::ParseOptions`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseErrorKind {
    /// `strict` mode only: the directive is absent from the catalog.
    #[error("unknown directive \"{directive}\"")]
    UnknownDirective { directive: String },
    /// No catalog entry's context bits matched the current block context.
    #[error("\"{directive}\" directive is not allowed here")]
    DirectiveNotAllowedHere { directive: String },
    /// The matched mask requires a block but the directive ended with `;`.
    #[error("directive \"{directive}\" has no opening \"{{\"")]
    NoOpeningBrace { directive: String },
    /// The matched mask forbids a block but the directive opened one.
    #[error("directive \"{directive}\" is not terminated by \";\"")]
    NotTerminatedBySemicolon { directive: String },
    /// No candidate mask's arity accepted the directive's argument count.
    #[error("invalid number of arguments in \"{directive}\" directive")]
    InvalidNumberOfArguments { directive: String },
    /// A `FLAG` directive's single argument was not `on`/`off`.
    #[error("invalid value \"{value}\" in \"{directive}\" directive, it must be \"on\" or \"off\"")]
    InvalidFlagValue { directive: String, value: String },
    /// `include` referenced a path that does not exist.
    #[error("No such file or directory: \"{path}\"")]
    NoSuchFileOrDirectory { path: String },
    /// Glob expansion of an `include` pattern failed.
    #[error("failed to expand include pattern \"{pattern}\": {message}")]
    GlobExpansion { pattern: String, message: String },
    /// An extension hook raised a syntax error rebuilding or lexing its body.
    #[error("error in \"{directive}\" directive: {message}")]
    ExtensionSyntax { directive: String, message: String },
    /// The file could not be opened or read (missing, not a file, unreadable).
    #[error("{message}")]
    Io { message: String },
}

/// A single parser/analyzer error tied to a source location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub file: String,
    pub line: Option<usize>,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{} in {}:{line}", self.kind, self.file),
            None => write!(f, "{} in {}", self.kind, self.file),
        }
    }
}

impl std::error::Error for ParseError {}

/// Unified error type covering both lexing and parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A lexer error.
    #[error("{0}")]
    Lex(#[from] LexError),
    /// A parser or analyzer error (only surfaces when `catchErrors: false`).
    #[error("{0}")]
    Parse(#[from] ParseError),
}
