//! Extension registry (§4.3): lex and build hooks for directives whose
//! bodies are not plain nginx syntax.
//!
//! Hooks are registered by directive name before parsing/building begins
//! (§5: "extensions must register before the first `parse` call") and are
//! not mutated afterwards — a [`ExtensionRegistry`] is built once and
//! shared by reference for the duration of an operation.

use std::collections::HashMap;

use crate::ast::DirectiveNode;
use crate::char_stream::CharStream;
use crate::error::LexErrorKind;
use crate::token::Token;

/// Lex hook contract (§4.3): given the live char stream positioned right
/// after the directive name, consume the directive's entire body and
/// return the triples it produces, ending with a terminator triple.
pub type LexHook = fn(&mut CharStream<'_>, &str) -> Result<Vec<Token>, LexErrorKind>;

/// Build hook contract (§4.3): render a directive node back to its
/// surface syntax, without the leading margin.
pub type BuildHook = fn(&DirectiveNode, padding: &str, indent: usize, tabs: bool) -> String;

/// Named hooks for directive-specific token emission and rebuilding.
pub struct ExtensionRegistry {
    lex_hooks: HashMap<String, LexHook>,
    build_hooks: HashMap<String, BuildHook>,
}

/// Directives carried by `ngx_http_lua_module` whose body is a balanced
/// `{ ... }` block of Lua source rather than nginx directives.
/// `set_by_lua_block` is the only one with a leading argument before the
/// block (the `$variable` the Lua code assigns into).
const LUA_BLOCK_DIRECTIVES: &[&str] = &[
    "set_by_lua_block",
    "content_by_lua_block",
    "access_by_lua_block",
    "rewrite_by_lua_block",
    "log_by_lua_block",
    "balancer_by_lua_block",
    "init_by_lua_block",
    "init_worker_by_lua_block",
    "ssl_certificate_by_lua_block",
    "ssl_session_fetch_by_lua_block",
];

impl ExtensionRegistry {
    /// An empty registry with none of the built-in hooks pre-registered.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            lex_hooks: HashMap::new(),
            build_hooks: HashMap::new(),
        }
    }

    /// The registry this toolkit ships by default: the Lua embedded-block
    /// family pre-registered against [`lua_block_lex_hook`] /
    /// [`lua_block_build_hook`].
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register_lex_hook(LUA_BLOCK_DIRECTIVES, lua_block_lex_hook);
        registry.register_build_hook(LUA_BLOCK_DIRECTIVES, lua_block_build_hook);
        registry
    }

    pub fn register_lex_hook(&mut self, directive_names: &[&str], hook: LexHook) {
        for name in directive_names {
            self.lex_hooks.insert((*name).to_string(), hook);
        }
    }

    pub fn register_build_hook(&mut self, directive_names: &[&str], hook: BuildHook) {
        for name in directive_names {
            self.build_hooks.insert((*name).to_string(), hook);
        }
    }

    #[must_use]
    pub fn lex_hook(&self, directive: &str) -> Option<LexHook> {
        self.lex_hooks.get(directive).copied()
    }

    #[must_use]
    pub fn build_hook(&self, directive: &str) -> Option<BuildHook> {
        self.build_hooks.get(directive).copied()
    }
}

impl Default for ExtensionRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

fn skip_ws(stream: &mut CharStream<'_>, line: &mut usize) -> Option<(String, usize)> {
    loop {
        let (chunk, l) = stream.next_chunk()?;
        *line = l;
        if !is_ws_chunk(&chunk) {
            return Some((chunk, l));
        }
    }
}

fn is_ws_chunk(chunk: &str) -> bool {
    chunk.len() == 1 && chunk.chars().next().is_some_and(char::is_whitespace)
}

fn read_word(
    first: (String, usize),
    stream: &mut CharStream<'_>,
    line: &mut usize,
) -> (String, usize) {
    let (mut chunk, word_line) = first;
    let mut word = String::new();
    loop {
        if is_ws_chunk(&chunk) {
            stream.push_back(chunk, *line);
            break;
        }
        word.push_str(&chunk);
        match stream.next_chunk() {
            Some(next) => {
                *line = next.1;
                chunk = next.0;
            }
            None => break,
        }
    }
    (word, word_line)
}

/// Lex hook for the `ngx_http_lua_module` `*_by_lua_block` family (§4.3).
///
/// Reads past any leading argument (only `set_by_lua_block` has one),
/// then consumes a balanced `{ ... }` block — tracking nested braces and
/// skipping over string literals and `--` line comments so braces inside
/// Lua source don't desynchronize the depth count — and yields the body
/// as one quoted-style token followed by a synthetic `;`.
pub fn lua_block_lex_hook(
    stream: &mut CharStream<'_>,
    directive: &str,
) -> Result<Vec<Token>, LexErrorKind> {
    let unterminated = || LexErrorKind::UnterminatedExtensionBlock {
        directive: directive.to_string(),
    };

    let mut tokens = Vec::new();
    let mut line = stream.line();

    let mut next = skip_ws(stream, &mut line).ok_or_else(unterminated)?;

    if directive == "set_by_lua_block" {
        let (word, word_line) = read_word(next, stream, &mut line);
        tokens.push(Token::word(word, word_line, false));
        next = skip_ws(stream, &mut line).ok_or_else(unterminated)?;
    }

    if next.0 != "{" {
        return Err(unterminated());
    }
    let body_start_line = next.1;

    let mut depth = 1usize;
    let mut body = String::new();
    let mut in_string: Option<char> = None;
    let mut in_line_comment = false;
    let mut prev_dash = false;

    loop {
        let (chunk, l) = stream.next_chunk().ok_or_else(unterminated)?;
        line = l;

        if in_line_comment {
            if chunk.ends_with('\n') {
                in_line_comment = false;
            }
            body.push_str(&chunk);
            continue;
        }

        if let Some(quote) = in_string {
            if chunk.chars().count() == 1 && chunk == quote.to_string() {
                in_string = None;
            }
            body.push_str(&chunk);
            continue;
        }

        if chunk == "-" {
            if prev_dash {
                in_line_comment = true;
                prev_dash = false;
            } else {
                prev_dash = true;
            }
            body.push_str(&chunk);
            continue;
        }
        prev_dash = false;

        match chunk.as_str() {
            "\"" => {
                in_string = Some('"');
                body.push_str(&chunk);
            }
            "'" => {
                in_string = Some('\'');
                body.push_str(&chunk);
            }
            "{" => {
                depth += 1;
                body.push_str(&chunk);
            }
            "}" => {
                depth -= 1;
                if depth == 0 {
                    break;
                }
                body.push_str(&chunk);
            }
            _ => body.push_str(&chunk),
        }
    }

    tokens.push(Token::word(body, body_start_line, true));
    tokens.push(Token::semicolon(line));

    Ok(tokens)
}

/// Build hook for the Lua embedded-block family (§4.3), symmetric with
/// [`lua_block_lex_hook`]: renders the stored body back between literal
/// braces instead of passing it through the quoting utility.
#[must_use]
pub fn lua_block_build_hook(
    node: &DirectiveNode,
    _padding: &str,
    _indent: usize,
    _tabs: bool,
) -> String {
    let mut out = node.directive.clone();
    if let [leading, body] = node.args.as_slice() {
        out.push(' ');
        out.push_str(leading);
        out.push_str(" {");
        out.push_str(body);
        out.push('}');
    } else if let [body] = node.args.as_slice() {
        out.push_str(" {");
        out.push_str(body);
        out.push('}');
    } else {
        out.push_str(" {}");
    }
    out
}
