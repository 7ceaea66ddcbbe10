//! Builder (§4.6): renders a directive tree back to canonical config text,
//! with hooks symmetric to the lexer's extension dispatch.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::ast::{DirectiveNode, FileReport, ParsedPayload};
use crate::extensions::ExtensionRegistry;
use crate::quote;

/// Rendering knobs (§4.6). `compact` drops all indentation and
/// inter-directive whitespace, the mode [`crate::formatter::minify`] uses.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub indent: usize,
    pub tabs: bool,
    pub compact: bool,
    /// Leading `# <header>` comment line, emitted before the tree.
    pub header: Option<String>,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            indent: 4,
            tabs: false,
            compact: false,
            header: None,
        }
    }
}

impl BuildOptions {
    fn padding(&self) -> String {
        if self.tabs {
            "\t".to_string()
        } else {
            " ".repeat(self.indent)
        }
    }
}

/// Renders `nodes` back to config text (§4.6). The result always ends in
/// exactly one newline, matching `buildFiles`'s per-file guarantee.
#[must_use]
pub fn build(nodes: &[DirectiveNode], extensions: &ExtensionRegistry, options: &BuildOptions) -> String {
    let mut out = String::new();
    if let Some(header) = &options.header {
        let _ = writeln!(out, "# {header}");
    }
    let padding = options.padding();
    let mut last_line = None;
    build_block(&mut out, nodes, extensions, options, &padding, 0, &mut last_line);
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    out
}

#[allow(clippy::too_many_arguments)]
fn build_block(
    out: &mut String,
    nodes: &[DirectiveNode],
    extensions: &ExtensionRegistry,
    options: &BuildOptions,
    padding: &str,
    depth: usize,
    last_line: &mut Option<usize>,
) {
    let margin = padding.repeat(depth);
    for (i, node) in nodes.iter().enumerate() {
        let same_line = i > 0 && !options.compact && node.is_comment() && *last_line == Some(node.line);
        if i == 0 {
            if !options.compact {
                out.push_str(&margin);
            }
        } else if same_line {
            out.push(' ');
        } else if !options.compact {
            out.push('\n');
            out.push_str(&margin);
        }
        build_node(out, node, extensions, options, padding, depth);
        *last_line = Some(node.line);
    }
}

fn build_node(
    out: &mut String,
    node: &DirectiveNode,
    extensions: &ExtensionRegistry,
    options: &BuildOptions,
    padding: &str,
    depth: usize,
) {
    if node.is_comment() {
        let _ = write!(out, "#{}", node.comment.as_deref().unwrap_or(""));
        return;
    }

    if let Some(hook) = extensions.build_hook(&node.directive) {
        out.push_str(&hook(node, padding, options.indent, options.tabs));
    } else if node.directive == "if" {
        out.push_str("if (");
        for (i, arg) in node.args.iter().enumerate() {
            if i > 0 {
                out.push(' ');
            }
            out.push_str(&quote::enquote(arg));
        }
        out.push(')');
    } else {
        out.push_str(&node.directive);
        for arg in &node.args {
            out.push(' ');
            out.push_str(&quote::enquote(arg));
        }
    }

    match &node.block {
        Some(block) => {
            out.push_str(" {");
            if !block.is_empty() {
                if !options.compact {
                    out.push('\n');
                }
                let mut last_line = None;
                build_block(out, block, extensions, options, padding, depth + 1, &mut last_line);
                if !options.compact {
                    out.push('\n');
                    out.push_str(&padding.repeat(depth));
                }
            }
            out.push('}');
        }
        None => out.push(';'),
    }
}

/// Writes every file report in `payload` relative to `root_dir` (§4.6
/// `buildFiles`): resolves `file` unless absolute, creates its parent
/// directory, and writes the rendered tree.
///
/// # Errors
/// Returns any I/O error from creating directories or writing a file.
pub fn build_files(
    payload: &ParsedPayload,
    root_dir: &Path,
    extensions: &ExtensionRegistry,
    options: &BuildOptions,
) -> std::io::Result<()> {
    for report in &payload.config {
        write_report(report, root_dir, extensions, options)?;
    }
    Ok(())
}

/// Resolves a file report's `file` path against `root_dir`, as
/// `buildFiles` does: absolute paths pass through unchanged.
#[must_use]
pub fn resolve_target(file: &str, root_dir: &Path) -> PathBuf {
    let target = Path::new(file);
    if target.is_absolute() {
        target.to_path_buf()
    } else {
        root_dir.join(target)
    }
}

fn write_report(
    report: &FileReport,
    root_dir: &Path,
    extensions: &ExtensionRegistry,
    options: &BuildOptions,
) -> std::io::Result<()> {
    let resolved = resolve_target(&report.file, root_dir);
    if let Some(parent) = resolved.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let text = build(&report.parsed, extensions, options);
    std::fs::write(resolved, text)
}
