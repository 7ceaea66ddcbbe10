//! Recursive-descent parser with include expansion (§4.5).

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use crate::analyzer::{self, AnalyzeOptions};
use crate::ast::{DirectiveNode, FileError, FileReport, ParsedPayload, PayloadError, Status};
use crate::catalog;
use crate::error::{Error, LexError, ParseError, ParseErrorKind};
use crate::extensions::ExtensionRegistry;
use crate::lexer;
use crate::token::{Token, TokenKind};

/// Options recognized by [`Parser::parse`] (§4.5).
pub struct ParseOptions {
    /// Invoked per recorded error to produce an extra opaque payload
    /// attached as `callback`.
    pub on_error: Option<fn(&ParseErrorKind) -> serde_json::Value>,
    pub catch_errors: bool,
    pub ignore: HashSet<String>,
    pub single_file: bool,
    pub comments: bool,
    pub strict: bool,
    pub combine: bool,
    pub check_ctx: bool,
    pub check_args: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            on_error: None,
            catch_errors: true,
            ignore: HashSet::new(),
            single_file: false,
            comments: false,
            strict: false,
            combine: false,
            check_ctx: true,
            check_args: true,
        }
    }
}

struct TokenCursor {
    tokens: Vec<Token>,
    pos: usize,
}

impl TokenCursor {
    fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    fn next(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }
}

/// Parses `filename` and any files it transitively `include`s.
pub struct Parser<'a> {
    catalog: &'a HashMap<String, Vec<u64>>,
    extensions: &'a ExtensionRegistry,
    options: ParseOptions,
}

impl<'a> Parser<'a> {
    #[must_use]
    pub fn new(
        catalog: &'a HashMap<String, Vec<u64>>,
        extensions: &'a ExtensionRegistry,
        options: ParseOptions,
    ) -> Self {
        Self {
            catalog,
            extensions,
            options,
        }
    }

    /// Parses `filename` plus, unless `single_file` is set, every file it
    /// transitively `include`s (§4.5 steps 1-3).
    ///
    /// # Errors
    /// Returns `Err` only when `catch_errors` is `false` and a
    /// catchable parser/analyzer error is encountered, or when lexing
    /// a file raises a (always-fatal) lexer error.
    pub fn parse(&self, filename: &str) -> Result<ParsedPayload, Error> {
        let main_dir = Path::new(filename)
            .parent()
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);

        let mut queue: Vec<(String, Vec<String>)> = vec![(filename.to_string(), Vec::new())];
        let mut included: HashMap<String, usize> = HashMap::new();
        included.insert(canonical_key(filename), 0);

        let mut config: Vec<FileReport> = Vec::new();
        let mut payload_errors: Vec<PayloadError> = Vec::new();
        let mut overall_ok = true;

        let mut i = 0;
        while i < queue.len() {
            let (file, ctx) = queue[i].clone();
            i += 1;

            let mut file_errors: Vec<FileError> = Vec::new();
            let parsed = match self.lex_file(&file) {
                Ok(tokens) => {
                    let mut cursor = TokenCursor::new(tokens);
                    self.parse_context(
                        &file,
                        &mut cursor,
                        &ctx,
                        false,
                        &mut file_errors,
                        &mut payload_errors,
                        &mut queue,
                        &mut included,
                        &main_dir,
                    )?
                }
                Err(FileOpenOutcome::Io(kind)) => {
                    self.record_or_throw(kind, &file, None, &mut file_errors, &mut payload_errors)?;
                    Vec::new()
                }
                Err(FileOpenOutcome::Lex(err)) => return Err(Error::Lex(err)),
            };

            let status = if file_errors.is_empty() {
                Status::Ok
            } else {
                overall_ok = false;
                Status::Failed
            };
            config.push(FileReport {
                file,
                status,
                errors: file_errors,
                parsed,
            });
        }

        let payload = ParsedPayload {
            status: if overall_ok { Status::Ok } else { Status::Failed },
            errors: payload_errors,
            config,
        };

        Ok(if self.options.combine {
            combine(payload)
        } else {
            payload
        })
    }

    /// Parses `input` as in-memory config text under the virtual name
    /// `name`, without reading it from disk. Meant for callers that
    /// already have the text in hand (e.g. [`crate::formatter`]) rather
    /// than a path to open. `include` directives are still resolved
    /// against the current directory like any other relative path, but
    /// since `name` names no real file on disk, construct this parser
    /// with `single_file: true` unless that resolution is actually wanted.
    ///
    /// # Errors
    /// See [`Parser::parse`].
    pub fn parse_text(&self, input: &str, name: &str) -> Result<ParsedPayload, Error> {
        let tokens = lexer::lex(input, name, self.extensions)?;
        let mut cursor = TokenCursor::new(tokens);
        let mut file_errors = Vec::new();
        let mut payload_errors = Vec::new();
        let mut queue: Vec<(String, Vec<String>)> = vec![(name.to_string(), Vec::new())];
        let mut included = HashMap::new();
        included.insert(canonical_key(name), 0);
        let main_dir = PathBuf::from(".");

        let parsed = self.parse_context(
            name,
            &mut cursor,
            &[],
            false,
            &mut file_errors,
            &mut payload_errors,
            &mut queue,
            &mut included,
            &main_dir,
        )?;

        let status = if file_errors.is_empty() {
            Status::Ok
        } else {
            Status::Failed
        };
        let config = vec![FileReport {
            file: name.to_string(),
            status,
            errors: file_errors,
            parsed,
        }];
        let payload = ParsedPayload {
            status,
            errors: payload_errors,
            config,
        };

        Ok(if self.options.combine {
            combine(payload)
        } else {
            payload
        })
    }

    fn lex_file(&self, file: &str) -> Result<Vec<Token>, FileOpenOutcome> {
        let contents = std::fs::read_to_string(file).map_err(|e| {
            FileOpenOutcome::Io(io_error_kind(file, &e))
        })?;
        lexer::lex(&contents, file, self.extensions).map_err(FileOpenOutcome::Lex)
    }

    #[allow(clippy::too_many_arguments)]
    fn parse_context(
        &self,
        file: &str,
        cursor: &mut TokenCursor,
        ctx: &[String],
        consume: bool,
        file_errors: &mut Vec<FileError>,
        payload_errors: &mut Vec<PayloadError>,
        queue: &mut Vec<(String, Vec<String>)>,
        included: &mut HashMap<String, usize>,
        main_dir: &Path,
    ) -> Result<Vec<DirectiveNode>, Error> {
        let mut out = Vec::new();

        while let Some(tok) = cursor.next() {
            if tok.kind == TokenKind::CloseBrace && !tok.quoted {
                return Ok(out);
            }

            if consume {
                if tok.kind == TokenKind::OpenBrace && !tok.quoted {
                    self.parse_context(
                        file,
                        cursor,
                        ctx,
                        true,
                        file_errors,
                        payload_errors,
                        queue,
                        included,
                        main_dir,
                    )?;
                }
                continue;
            }

            if tok.kind == TokenKind::Comment {
                if self.options.comments {
                    out.push(DirectiveNode::comment_node(strip_comment(&tok.text), tok.line));
                }
                continue;
            }

            if tok.kind != TokenKind::Word {
                continue;
            }

            let name = tok.text;
            let line = tok.line;
            let mut args = Vec::new();
            let mut held_comments = Vec::new();
            let term = loop {
                let Some(t) = cursor.next() else {
                    break ';';
                };
                match t.kind {
                    TokenKind::OpenBrace if !t.quoted => break '{',
                    TokenKind::CloseBrace if !t.quoted => break '}',
                    TokenKind::Semicolon if !t.quoted => break ';',
                    TokenKind::Comment => {
                        held_comments.push(DirectiveNode::comment_node(strip_comment(&t.text), line));
                    }
                    TokenKind::Word => args.push(t.text),
                    _ => {}
                }
            };

            if name == "if" {
                strip_if_parens(&mut args);
            }

            if self.options.ignore.contains(&name) {
                if term == '{' {
                    self.parse_context(
                        file,
                        cursor,
                        ctx,
                        true,
                        file_errors,
                        payload_errors,
                        queue,
                        included,
                        main_dir,
                    )?;
                }
                continue;
            }

            let analyze_opts = AnalyzeOptions {
                strict: self.options.strict,
                check_ctx: self.options.check_ctx,
                check_args: self.options.check_args,
            };
            if let Err(kind) = analyzer::analyze(self.catalog, &name, &args, term, ctx, analyze_opts) {
                let not_terminated = matches!(kind, ParseErrorKind::NotTerminatedBySemicolon { .. });
                self.record_or_throw(kind, file, Some(line), file_errors, payload_errors)?;
                if not_terminated && term == '{' {
                    self.parse_context(
                        file,
                        cursor,
                        ctx,
                        true,
                        file_errors,
                        payload_errors,
                        queue,
                        included,
                        main_dir,
                    )?;
                }
                continue;
            }

            let mut stmt = DirectiveNode::new(name.clone(), line);
            stmt.args.clone_from(&args);

            if name == "include" && !self.options.single_file {
                let indices = self.resolve_include(
                    &args,
                    file,
                    line,
                    ctx,
                    main_dir,
                    queue,
                    included,
                    file_errors,
                    payload_errors,
                )?;
                stmt.includes = Some(indices);
            }

            if term == '{' {
                let child_ctx = catalog::enter_block_ctx(&name, ctx);
                let block = self.parse_context(
                    file,
                    cursor,
                    &child_ctx,
                    false,
                    file_errors,
                    payload_errors,
                    queue,
                    included,
                    main_dir,
                )?;
                stmt.block = Some(block);
            }

            out.push(stmt);
            if self.options.comments {
                out.extend(held_comments);
            }
        }

        Ok(out)
    }

    #[allow(clippy::too_many_arguments)]
    fn resolve_include(
        &self,
        args: &[String],
        file: &str,
        line: usize,
        ctx: &[String],
        main_dir: &Path,
        queue: &mut Vec<(String, Vec<String>)>,
        included: &mut HashMap<String, usize>,
        file_errors: &mut Vec<FileError>,
        payload_errors: &mut Vec<PayloadError>,
    ) -> Result<Vec<usize>, Error> {
        let Some(pattern) = args.first() else {
            return Ok(Vec::new());
        };

        let abs_pattern = if Path::new(pattern).is_absolute() {
            PathBuf::from(pattern)
        } else {
            main_dir.join(pattern)
        };
        let pattern_str = abs_pattern.to_string_lossy().to_string();
        let has_glob_magic = pattern.contains(['*', '?', '[']);

        let mut resolved: Vec<PathBuf> = Vec::new();
        if has_glob_magic {
            match glob::glob(&pattern_str) {
                Ok(paths) => {
                    for entry in paths.flatten() {
                        resolved.push(entry);
                    }
                }
                Err(e) => {
                    self.record_or_throw(
                        ParseErrorKind::GlobExpansion {
                            pattern: pattern_str.clone(),
                            message: e.to_string(),
                        },
                        file,
                        Some(line),
                        file_errors,
                        payload_errors,
                    )?;
                    return Ok(Vec::new());
                }
            }
        } else if abs_pattern.is_file() {
            resolved.push(abs_pattern);
        } else {
            self.record_or_throw(
                ParseErrorKind::NoSuchFileOrDirectory { path: pattern_str },
                file,
                Some(line),
                file_errors,
                payload_errors,
            )?;
            return Ok(Vec::new());
        }

        let mut indices = Vec::new();
        for path in resolved {
            let key = canonical_key(&path.to_string_lossy());
            let idx = if let Some(&idx) = included.get(&key) {
                idx
            } else {
                let idx = queue.len();
                queue.push((path.to_string_lossy().to_string(), ctx.to_vec()));
                included.insert(key, idx);
                idx
            };
            indices.push(idx);
        }
        Ok(indices)
    }

    fn record_or_throw(
        &self,
        kind: ParseErrorKind,
        file: &str,
        line: Option<usize>,
        file_errors: &mut Vec<FileError>,
        payload_errors: &mut Vec<PayloadError>,
    ) -> Result<(), Error> {
        if self.options.catch_errors {
            let message = kind.to_string();
            let callback = self.options.on_error.map(|f| f(&kind));
            file_errors.push(FileError {
                line,
                error: message.clone(),
                callback: None,
            });
            payload_errors.push(PayloadError {
                file: file.to_string(),
                line,
                error: message,
                callback,
            });
            Ok(())
        } else {
            Err(Error::Parse(ParseError {
                kind,
                file: file.to_string(),
                line,
            }))
        }
    }
}

enum FileOpenOutcome {
    Io(ParseErrorKind),
    Lex(LexError),
}

fn io_error_kind(file: &str, e: &std::io::Error) -> ParseErrorKind {
    if e.kind() == std::io::ErrorKind::NotFound {
        ParseErrorKind::NoSuchFileOrDirectory {
            path: file.to_string(),
        }
    } else {
        ParseErrorKind::Io {
            message: e.to_string(),
        }
    }
}

fn canonical_key(path: &str) -> String {
    std::fs::canonicalize(path).map_or_else(|_| path.to_string(), |p| p.to_string_lossy().to_string())
}

fn strip_comment(text: &str) -> String {
    let no_hash = text.strip_prefix('#').unwrap_or(text);
    no_hash.strip_suffix('\n').unwrap_or(no_hash).to_string()
}

/// Strips one leading `(` from the first argument and one trailing `)`
/// from the last, per `if`'s special argument rewrite (§4.5.1). Only the
/// first/last positions are ever dropped, and only if stripping emptied
/// them — a legitimate empty-string argument elsewhere in the list (e.g.
/// a quoted `""` literal) is left alone.
fn strip_if_parens(args: &mut Vec<String>) {
    if args.is_empty() {
        return;
    }
    if let Some(stripped) = args[0].strip_prefix('(') {
        args[0] = stripped.to_string();
    }
    let last_idx = args.len() - 1;
    if let Some(stripped) = args[last_idx].strip_suffix(')') {
        args[last_idx] = stripped.to_string();
    }

    if args.len() == 1 {
        if args[0].is_empty() {
            args.clear();
        }
        return;
    }
    if args[args.len() - 1].is_empty() {
        args.pop();
    }
    if args[0].is_empty() {
        args.remove(0);
    }
}

/// Flattens every `include` into one logical [`FileReport`] (§4.5.2).
fn combine(payload: ParsedPayload) -> ParsedPayload {
    let Some(first) = payload.config.first() else {
        return payload;
    };

    fn inline(nodes: &[DirectiveNode], origin: &str, config: &[FileReport]) -> Vec<DirectiveNode> {
        let mut out = Vec::new();
        for node in nodes {
            if node.directive == "include" {
                if let Some(indices) = &node.includes {
                    for &idx in indices {
                        if let Some(fr) = config.get(idx) {
                            out.extend(inline(&fr.parsed, &fr.file, config));
                        }
                    }
                }
                continue;
            }
            let mut n = node.clone();
            n.file = Some(origin.to_string());
            if let Some(block) = &node.block {
                n.block = Some(inline(block, origin, config));
            }
            out.push(n);
        }
        out
    }

    let combined_nodes = inline(&first.parsed, &first.file, &payload.config);
    let combined_errors = payload
        .config
        .iter()
        .flat_map(|f| f.errors.iter().cloned())
        .collect();

    let report = FileReport {
        file: first.file.clone(),
        status: payload.status,
        errors: combined_errors,
        parsed: combined_nodes,
    };

    ParsedPayload {
        status: payload.status,
        errors: payload.errors,
        config: vec![report],
    }
}

#[cfg(test)]
mod tests {
    use super::strip_if_parens;

    #[test]
    fn strips_one_leading_and_trailing_paren() {
        let mut args = vec!["(a".to_string(), "b".to_string(), "c)".to_string()];
        strip_if_parens(&mut args);
        assert_eq!(args, vec!["a".to_string(), "b".to_string(), "c".to_string()]);
    }

    #[test]
    fn drops_first_and_last_only_when_stripping_emptied_them() {
        let mut args = vec!["(".to_string(), "a".to_string(), ")".to_string()];
        strip_if_parens(&mut args);
        assert_eq!(args, vec!["a".to_string()]);
    }

    #[test]
    fn leaves_a_legitimate_empty_argument_in_the_middle_alone() {
        let mut args = vec!["(a".to_string(), String::new(), "b)".to_string()];
        strip_if_parens(&mut args);
        assert_eq!(args, vec!["a".to_string(), String::new(), "b".to_string()]);
    }

    #[test]
    fn single_argument_strips_both_sides() {
        let mut args = vec!["(x)".to_string()];
        strip_if_parens(&mut args);
        assert_eq!(args, vec!["x".to_string()]);
    }

    #[test]
    fn single_argument_of_just_parens_becomes_empty_list() {
        let mut args = vec!["()".to_string()];
        strip_if_parens(&mut args);
        assert!(args.is_empty());
    }
}
