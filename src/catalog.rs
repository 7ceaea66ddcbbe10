//! Bitmask-encoded directive catalog (§4.4).
//!
//! Each catalog entry is a `u64` that simultaneously encodes an arity
//! class in its low bits and a set of allowed contexts in its high bits.
//! Kept as plain `u64` masks rather than the `bitflags` crate: the low
//! byte is a one-hot *class* selector read with equality/arity checks,
//! not an independently togglable flag set, so `bitflags` buys nothing
//! here.

use std::collections::HashMap;

// Arity class, one-hot within the low 8 bits.
pub const NOARGS: u64 = 1 << 0;
pub const TAKE1: u64 = 1 << 1;
pub const TAKE2: u64 = 1 << 2;
pub const TAKE3: u64 = 1 << 3;
pub const TAKE4: u64 = 1 << 4;
pub const TAKE5: u64 = 1 << 5;
pub const TAKE6: u64 = 1 << 6;
pub const TAKE7: u64 = 1 << 7;

// Arity modifiers, bits 8-12.
pub const BLOCK: u64 = 1 << 8;
pub const FLAG: u64 = 1 << 9;
pub const ANY: u64 = 1 << 10;
pub const ONE_MORE: u64 = 1 << 11;
pub const TWO_MORE: u64 = 1 << 12;

// Convenience unions; these are just OR'd arity bits, not new bit
// positions.
pub const TAKE12: u64 = TAKE1 | TAKE2;
pub const TAKE13: u64 = TAKE1 | TAKE3;
pub const TAKE23: u64 = TAKE2 | TAKE3;
pub const TAKE123: u64 = TAKE1 | TAKE2 | TAKE3;
pub const TAKE1234: u64 = TAKE1 | TAKE2 | TAKE3 | TAKE4;

// Context, bits 16-29, plus the DIRECT_CONF modifier at bit 30.
pub const MAIN: u64 = 1 << 16;
pub const EVENTS: u64 = 1 << 17;
pub const MAIL_MAIN: u64 = 1 << 18;
pub const MAIL_SRV: u64 = 1 << 19;
pub const STREAM_MAIN: u64 = 1 << 20;
pub const STREAM_SRV: u64 = 1 << 21;
pub const STREAM_UPS: u64 = 1 << 22;
pub const HTTP_MAIN: u64 = 1 << 23;
pub const HTTP_SRV: u64 = 1 << 24;
pub const HTTP_LOC: u64 = 1 << 25;
pub const HTTP_UPS: u64 = 1 << 26;
pub const HTTP_SIF: u64 = 1 << 27;
pub const HTTP_LIF: u64 = 1 << 28;
pub const HTTP_LMT: u64 = 1 << 29;
pub const DIRECT_CONF: u64 = 1 << 30;

/// Bits not in 16..=30 (the context range): used to mask a catalog entry
/// down to its context bits for the reverse-lookup against [`CONTEXTS`].
const CONTEXT_BITS: u64 = MAIN
    | EVENTS
    | MAIL_MAIN
    | MAIL_SRV
    | STREAM_MAIN
    | STREAM_SRV
    | STREAM_UPS
    | HTTP_MAIN
    | HTTP_SRV
    | HTTP_LOC
    | HTTP_UPS
    | HTTP_SIF
    | HTTP_LIF
    | HTTP_LMT;

/// Fixed table mapping a single context bit to its canonical nested-block
/// path (§4.4). `MAIN` maps to the empty path (top of the file).
pub const CONTEXTS: &[(u64, &[&str])] = &[
    (MAIN, &[]),
    (EVENTS, &["events"]),
    (HTTP_MAIN, &["http"]),
    (HTTP_SRV, &["http", "server"]),
    (HTTP_LOC, &["http", "location"]),
    (HTTP_UPS, &["http", "upstream"]),
    (HTTP_SIF, &["http", "server", "if"]),
    (HTTP_LIF, &["http", "location", "if"]),
    (HTTP_LMT, &["http", "location", "limit_except"]),
    (STREAM_MAIN, &["stream"]),
    (STREAM_SRV, &["stream", "server"]),
    (STREAM_UPS, &["stream", "upstream"]),
    (MAIL_MAIN, &["mail"]),
    (MAIL_SRV, &["mail", "server"]),
];

/// Reverse-lookup: find the context bit whose canonical path equals
/// `ctx`. Returns `None` for a context with no catalog representation
/// (e.g. inside an unrecognized block), matching the "cannot validate"
/// case in step 2 of `analyze`.
#[must_use]
pub fn ctx_to_mask(ctx: &[String]) -> Option<u64> {
    CONTEXTS
        .iter()
        .find(|(_, path)| path.len() == ctx.len() && path.iter().zip(ctx).all(|(p, c)| p == c))
        .map(|(bit, _)| *bit)
}

/// Computes the child context for a directive that opens a block (§4.4).
/// `location` never nests beyond one segment: entering a `location`
/// block collapses the context to `[root, "location"]` regardless of how
/// deep inside `http` it was written (`http{server{location{...}}}`,
/// `http{location{location{...}}}`, …) — the catalog's `CONTEXTS` table
/// only has one `HTTP_LOC` entry, `["http", "location"]`, so any deeper
/// path would fail to resolve to a mask at all.
#[must_use]
pub fn enter_block_ctx(directive: &str, ctx: &[String]) -> Vec<String> {
    if directive == "location" {
        if let Some(root) = ctx.first() {
            return vec![root.clone(), "location".to_string()];
        }
    }
    let mut child = ctx.to_vec();
    child.push(directive.to_string());
    child
}

/// A directive's context bits, masked out of a full catalog mask.
#[must_use]
pub const fn context_bits(mask: u64) -> u64 {
    mask & CONTEXT_BITS
}

/// The directive catalog: name to the set of masks describing each of
/// its valid usages. Consumers register additional entries through
/// [`crate::extensions::ExtensionRegistry`]; this seed table only covers
/// the directives exercised by this toolkit's worked examples plus
/// common top-level structure (§4.4.1).
#[must_use]
pub fn seed_catalog() -> HashMap<String, Vec<u64>> {
    let entries: &[(&str, &[u64])] = &[
        ("events", &[MAIN | DIRECT_CONF | NOARGS | BLOCK]),
        ("worker_connections", &[EVENTS | TAKE1]),
        ("http", &[MAIN | DIRECT_CONF | NOARGS | BLOCK]),
        (
            "server",
            &[
                HTTP_MAIN | NOARGS | BLOCK,
                MAIL_MAIN | NOARGS | BLOCK,
                STREAM_MAIN | NOARGS | BLOCK,
            ],
        ),
        ("listen", &[HTTP_SRV | STREAM_SRV | MAIL_SRV | ONE_MORE]),
        ("server_name", &[HTTP_SRV | MAIL_SRV | ONE_MORE]),
        ("location", &[HTTP_SRV | HTTP_LOC | TAKE12 | BLOCK]),
        (
            "root",
            &[HTTP_MAIN | HTTP_SRV | HTTP_LOC | HTTP_LIF | HTTP_SIF | TAKE1],
        ),
        ("index", &[HTTP_MAIN | HTTP_SRV | HTTP_LOC | ONE_MORE]),
        (
            "proxy_pass",
            &[HTTP_LOC | HTTP_LIF | HTTP_LMT | STREAM_SRV | TAKE1],
        ),
        ("return", &[HTTP_SRV | HTTP_LOC | HTTP_LIF | TAKE12]),
        ("rewrite", &[HTTP_SRV | HTTP_LOC | HTTP_LIF | TAKE23]),
        (
            "include",
            &[MAIN
                | EVENTS
                | HTTP_MAIN
                | HTTP_SRV
                | HTTP_LOC
                | HTTP_UPS
                | HTTP_SIF
                | HTTP_LIF
                | HTTP_LMT
                | STREAM_MAIN
                | STREAM_SRV
                | MAIL_MAIN
                | MAIL_SRV
                | TAKE1],
        ),
        ("if", &[HTTP_SRV | HTTP_LOC | ANY | BLOCK]),
        ("log_format", &[HTTP_MAIN | TWO_MORE]),
        (
            "access_log",
            &[HTTP_MAIN | HTTP_SRV | HTTP_LOC | HTTP_LIF | HTTP_LMT | ONE_MORE],
        ),
        (
            "error_log",
            &[MAIN
                | HTTP_MAIN
                | HTTP_SRV
                | HTTP_LOC
                | STREAM_MAIN
                | STREAM_SRV
                | MAIL_MAIN
                | MAIL_SRV
                | ONE_MORE],
        ),
        ("gzip", &[HTTP_MAIN | HTTP_SRV | HTTP_LOC | FLAG]),
        (
            "client_max_body_size",
            &[HTTP_MAIN | HTTP_SRV | HTTP_LOC | TAKE1],
        ),
        ("upstream", &[HTTP_MAIN | STREAM_MAIN | TAKE1 | BLOCK]),
        ("stream", &[MAIN | DIRECT_CONF | NOARGS | BLOCK]),
        ("mail", &[MAIN | DIRECT_CONF | NOARGS | BLOCK]),
        ("set", &[HTTP_SRV | HTTP_LOC | HTTP_SIF | HTTP_LIF | TAKE2]),
        (
            "set_by_lua_block",
            &[HTTP_SRV | HTTP_LOC | HTTP_SIF | HTTP_LIF | TAKE2],
        ),
        ("content_by_lua_block", &[HTTP_MAIN | HTTP_SRV | HTTP_LOC | HTTP_LIF | TAKE1]),
        ("access_by_lua_block", &[HTTP_SRV | HTTP_LOC | TAKE1]),
        ("rewrite_by_lua_block", &[HTTP_SRV | HTTP_LOC | TAKE1]),
        ("log_by_lua_block", &[HTTP_SRV | HTTP_LOC | TAKE1]),
        ("balancer_by_lua_block", &[HTTP_UPS | TAKE1]),
        ("init_by_lua_block", &[HTTP_MAIN | TAKE1]),
        ("init_worker_by_lua_block", &[HTTP_MAIN | TAKE1]),
        ("ssl_certificate_by_lua_block", &[HTTP_SRV | TAKE1]),
        ("ssl_session_fetch_by_lua_block", &[HTTP_SRV | TAKE1]),
    ];

    entries
        .iter()
        .map(|(name, masks)| ((*name).to_string(), masks.to_vec()))
        .collect()
}
