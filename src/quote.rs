//! Quoting utility (§4.7): decide whether an argument needs `'...'`
//! quoting to survive a round trip through the lexer, and escape it if so.

/// Splits `s` into the same atomic units the char/escape/line stream
/// would produce: a lone character, or a `\x` escape pair.
fn chunks(s: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        let mut chunk = String::new();
        chunk.push(c);
        if c == '\\' {
            if let Some(next) = chars.next() {
                chunk.push(next);
            }
        }
        out.push(chunk);
    }
    out
}

fn chunk_char(chunk: &str) -> Option<char> {
    if chunk.chars().count() == 1 {
        chunk.chars().next()
    } else {
        None
    }
}

/// A `${` ... `}` expansion (recognized at the chunk level, so an escaped
/// `\$` never starts one) is malformed if it is unclosed before the end
/// of the string, or if another `${` opens before the first one closes.
fn has_malformed_expansion(chunks: &[String]) -> bool {
    let mut i = 0;
    while i < chunks.len() {
        if chunks[i] == "$" && chunks.get(i + 1).map(String::as_str) == Some("{") {
            let mut j = i + 2;
            let mut closed = false;
            while j < chunks.len() {
                match chunks[j].as_str() {
                    "{" => return true,
                    "}" => {
                        closed = true;
                        break;
                    }
                    _ => j += 1,
                }
            }
            if !closed {
                return true;
            }
            i = j + 1;
        } else {
            i += 1;
        }
    }
    false
}

/// Whether `s` would break NGINX tokenization if written bare (§4.7).
#[must_use]
pub fn needs_quoting(s: &str) -> bool {
    if s.is_empty() {
        return true;
    }

    let chunks = chunks(s);

    if let Some(c) = chunk_char(&chunks[0]) {
        if c.is_whitespace() || matches!(c, '{' | '}' | ';' | '"' | '\'') {
            return true;
        }
    }
    if s.starts_with("${") {
        return true;
    }

    if has_malformed_expansion(&chunks) {
        return true;
    }

    // A well-formed, non-leading `${...}` expansion is exempt from the
    // generic brace-containment rule below: its braces are consumed by
    // the lexer's expansion handling, not by block-delimiter scanning.
    let mut i = 0;
    while i < chunks.len() {
        if chunks[i] == "$" && chunks.get(i + 1).map(String::as_str) == Some("{") {
            let mut j = i + 2;
            while j < chunks.len() && chunks[j] != "}" {
                j += 1;
            }
            i = j + 1;
            continue;
        }
        if let Some(c) = chunk_char(&chunks[i]) {
            if c.is_whitespace() || matches!(c, '{' | ';' | '"' | '\'') {
                return true;
            }
        }
        i += 1;
    }

    if chunks.last().is_some_and(|c| c == "\\") {
        return true;
    }
    if s.ends_with('$') {
        return true;
    }

    false
}

/// Returns `s` unchanged if it needs no quoting, else a `'...'`-wrapped,
/// escaped form safe to re-lex (§4.7).
#[must_use]
pub fn enquote(s: &str) -> String {
    if !needs_quoting(s) {
        return s.to_string();
    }

    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\x0B' => out.push_str("\\v"),
            '\x1B' => out.push_str("\\e"),
            '\x0C' => out.push_str("\\f"),
            other => out.push(other),
        }
    }
    out.push('\'');
    out
}
