//! Lexer (§4.2): turns a char/escape/line stream into `(token, line,
//! quoted)` triples, dispatching to extension hooks for directives whose
//! body isn't plain nginx syntax, and checking brace balance.

use crate::char_stream::CharStream;
use crate::error::{LexError, LexErrorKind};
use crate::extensions::ExtensionRegistry;
use crate::token::{Token, TokenKind};

fn is_ws_chunk(chunk: &str) -> bool {
    chunk.len() == 1 && chunk.chars().next().is_some_and(char::is_whitespace)
}

/// Decodes a `\x` escape pair read inside a quoted token body. Inverts
/// [`crate::quote::enquote`]'s escape table so quoting round-trips; a pair
/// outside that table is passed through unchanged.
fn unescape_pair(pair: &str, quote: &str) -> String {
    let escaped = &pair[1..];
    if escaped == quote {
        return quote.to_string();
    }
    match escaped {
        "\\" => "\\".to_string(),
        "n" => "\n".to_string(),
        "r" => "\r".to_string(),
        "t" => "\t".to_string(),
        "v" => "\x0B".to_string(),
        "e" => "\x1B".to_string(),
        "f" => "\x0C".to_string(),
        _ => pair.to_string(),
    }
}

/// Tokenizes one source file's contents.
pub struct Lexer<'a> {
    stream: CharStream<'a>,
    extensions: &'a ExtensionRegistry,
    file: String,
}

impl<'a> Lexer<'a> {
    #[must_use]
    pub fn new(input: &'a str, file: impl Into<String>, extensions: &'a ExtensionRegistry) -> Self {
        Self {
            stream: CharStream::new(input),
            extensions,
            file: file.into(),
        }
    }

    /// Runs the lexer to completion, returning every triple in source
    /// order. Lexer errors are always fatal (§7).
    ///
    /// # Errors
    /// Returns a [`LexError`] on an unterminated quote, an unterminated
    /// variable expansion, an unterminated extension block, or a `}`
    /// with no matching `{`.
    pub fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        let tokens = self.lex_raw()?;
        Self::check_brace_balance(&tokens, &self.file)?;
        Ok(tokens)
    }

    fn err(&self, kind: LexErrorKind, line: usize) -> LexError {
        LexError {
            kind,
            file: self.file.clone(),
            line,
        }
    }

    fn lex_raw(&mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        let mut token = String::new();
        let mut token_line = 1usize;
        let mut next_is_directive = true;
        // The last chunk appended to `token`, tracked by identity rather
        // than `token`'s trailing character: an escaped `\$` chunk ends
        // in the character `$` too, but must not trigger expansion.
        let mut last_chunk: Option<String> = None;

        while let Some((chunk, line)) = self.stream.next_chunk() {
            // 1. Whitespace.
            if is_ws_chunk(&chunk) {
                self.flush_word(&mut tokens, &mut token, token_line, false, &mut next_is_directive)?;
                last_chunk = None;
                continue;
            }

            // 2. Comment start.
            if token.is_empty() && chunk == "#" {
                let mut comment = chunk;
                loop {
                    match self.stream.next_chunk() {
                        Some((c, _)) => {
                            let ends_nl = c.ends_with('\n');
                            comment.push_str(&c);
                            if ends_nl {
                                break;
                            }
                        }
                        None => break,
                    }
                }
                tokens.push(Token::comment(comment, line));
                continue;
            }

            // 3. Variable expansion.
            if last_chunk.as_deref() == Some("$") && chunk == "{" {
                token.push_str(&chunk);
                last_chunk = Some(chunk);
                loop {
                    match self.stream.next_chunk() {
                        Some((c, l)) => {
                            if is_ws_chunk(&c) {
                                self.stream.push_back(c, l);
                                break;
                            }
                            let is_close = c == "}";
                            token.push_str(&c);
                            last_chunk = Some(c);
                            if is_close {
                                break;
                            }
                        }
                        None => return Err(self.err(LexErrorKind::UnterminatedVariableExpansion, line)),
                    }
                }
                continue;
            }

            // 4. Quoted token.
            if chunk == "\"" || chunk == "'" {
                if !token.is_empty() {
                    token.push_str(&chunk);
                    last_chunk = Some(chunk);
                    continue;
                }
                let quote = chunk;
                let mut body = String::new();
                loop {
                    match self.stream.next_chunk() {
                        Some((c, _)) => {
                            if c == quote {
                                break;
                            }
                            if c.starts_with('\\') && c.len() > 1 {
                                body.push_str(&unescape_pair(&c, &quote));
                                continue;
                            }
                            body.push_str(&c);
                        }
                        None => return Err(self.err(LexErrorKind::UnterminatedQuote, line)),
                    }
                }
                tokens.push(Token::word(body.clone(), line, true));
                self.dispatch(&mut tokens, &body, &mut next_is_directive)?;
                continue;
            }

            // 5. Structural chars.
            if chunk == "{" || chunk == "}" || chunk == ";" {
                if !token.is_empty() {
                    self.stream.push_back(chunk, line);
                    self.flush_word(&mut tokens, &mut token, token_line, false, &mut next_is_directive)?;
                    last_chunk = None;
                    continue;
                }
                tokens.push(match chunk.as_str() {
                    "{" => Token::open_brace(line),
                    "}" => Token::close_brace(line),
                    _ => Token::semicolon(line),
                });
                next_is_directive = true;
                continue;
            }

            // 6. Otherwise.
            if token.is_empty() {
                token_line = line;
            }
            token.push_str(&chunk);
            last_chunk = Some(chunk);
        }

        self.flush_word(&mut tokens, &mut token, token_line, false, &mut next_is_directive)?;

        Ok(tokens)
    }

    fn flush_word(
        &mut self,
        tokens: &mut Vec<Token>,
        buf: &mut String,
        line: usize,
        quoted: bool,
        next_is_directive: &mut bool,
    ) -> Result<(), LexError> {
        if buf.is_empty() {
            return Ok(());
        }
        let text = std::mem::take(buf);
        tokens.push(Token::word(text.clone(), line, quoted));
        self.dispatch(tokens, &text, next_is_directive)
    }

    fn dispatch(
        &mut self,
        tokens: &mut Vec<Token>,
        text: &str,
        next_is_directive: &mut bool,
    ) -> Result<(), LexError> {
        if *next_is_directive {
            if let Some(hook) = self.extensions.lex_hook(text) {
                let line = self.stream.line();
                let produced = hook(&mut self.stream, text).map_err(|kind| self.err(kind, line))?;
                tokens.extend(produced);
                *next_is_directive = true;
                return Ok(());
            }
        }
        *next_is_directive = false;
        Ok(())
    }

    fn check_brace_balance(tokens: &[Token], file: &str) -> Result<(), LexError> {
        let mut depth: i64 = 0;
        for t in tokens {
            match t.kind {
                TokenKind::OpenBrace if !t.quoted => depth += 1,
                TokenKind::CloseBrace if !t.quoted => {
                    depth -= 1;
                    if depth < 0 {
                        return Err(LexError {
                            kind: LexErrorKind::UnexpectedRightBrace,
                            file: file.to_string(),
                            line: t.line,
                        });
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }
}

/// Convenience entry point: tokenize `input` with the given extension
/// registry.
///
/// # Errors
/// See [`Lexer::tokenize`].
pub fn lex(
    input: &str,
    file: impl Into<String>,
    extensions: &ExtensionRegistry,
) -> Result<Vec<Token>, LexError> {
    Lexer::new(input, file, extensions).tokenize()
}
