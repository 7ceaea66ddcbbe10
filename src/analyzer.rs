//! Directive validation against the bitmask catalog (§4.4).

use std::collections::HashMap;

use crate::catalog::{self, ANY, BLOCK, FLAG, ONE_MORE, TWO_MORE};
use crate::error::ParseErrorKind;

/// Options the analyzer consults; a subset of [`crate::parser::ParseOptions`]
/// threaded straight through by the parser.
#[derive(Debug, Clone, Copy)]
pub struct AnalyzeOptions {
    pub strict: bool,
    pub check_ctx: bool,
    pub check_args: bool,
}

impl Default for AnalyzeOptions {
    fn default() -> Self {
        Self {
            strict: false,
            check_ctx: true,
            check_args: true,
        }
    }
}

/// Validates one directive statement against the catalog (§4.4,
/// `analyze`). `term` is the terminator that followed the statement's
/// arguments: `;`, `{`, or `}`. Returns `Ok(())` when the directive
/// cannot be validated at all (absent from the catalog, or the current
/// context has no catalog representation) as well as when it validates
/// cleanly — both are "no error" outcomes, distinguished only by
/// `strict` at step 1.
///
/// # Errors
/// Returns the most specific [`ParseErrorKind`] describing why no
/// candidate mask accepted the statement.
pub fn analyze(
    catalog: &HashMap<String, Vec<u64>>,
    directive: &str,
    args: &[String],
    term: char,
    ctx: &[String],
    options: AnalyzeOptions,
) -> Result<(), ParseErrorKind> {
    let masks = catalog.get(directive);

    if options.strict && masks.is_none() {
        return Err(ParseErrorKind::UnknownDirective {
            directive: directive.to_string(),
        });
    }

    let Some(masks) = masks else {
        return Ok(());
    };

    let Some(ctx_bit) = catalog::ctx_to_mask(ctx) else {
        return Ok(());
    };

    let candidates: Vec<u64> = if options.check_ctx {
        masks
            .iter()
            .copied()
            .filter(|m| catalog::context_bits(*m) & ctx_bit == ctx_bit)
            .collect()
    } else {
        masks.clone()
    };

    if options.check_ctx && candidates.is_empty() {
        return Err(ParseErrorKind::DirectiveNotAllowedHere {
            directive: directive.to_string(),
        });
    }

    if !options.check_args {
        return Ok(());
    }

    let n = args.len();
    let mut last_error = ParseErrorKind::InvalidNumberOfArguments {
        directive: directive.to_string(),
    };

    for mask in candidates.iter().rev() {
        let wants_block = mask & BLOCK != 0;
        if wants_block && term != '{' {
            last_error = ParseErrorKind::NoOpeningBrace {
                directive: directive.to_string(),
            };
            continue;
        }
        if !wants_block && term != ';' {
            last_error = ParseErrorKind::NotTerminatedBySemicolon {
                directive: directive.to_string(),
            };
            continue;
        }

        if arity_matches(*mask, n, args) {
            return Ok(());
        }

        if mask & FLAG != 0 && n == 1 {
            last_error = ParseErrorKind::InvalidFlagValue {
                directive: directive.to_string(),
                value: args[0].clone(),
            };
        } else {
            last_error = ParseErrorKind::InvalidNumberOfArguments {
                directive: directive.to_string(),
            };
        }
    }

    Err(last_error)
}

fn arity_matches(mask: u64, n: usize, args: &[String]) -> bool {
    if n <= 7 && mask & (1 << n) != 0 {
        return true;
    }
    if mask & FLAG != 0 && n == 1 {
        let v = args[0].to_ascii_lowercase();
        return v == "on" || v == "off";
    }
    if mask & ANY != 0 {
        return true;
    }
    if mask & ONE_MORE != 0 && n >= 1 {
        return true;
    }
    if mask & TWO_MORE != 0 && n >= 2 {
        return true;
    }
    false
}
