//! The directive tree and parse-result payload (§3).

use serde::{Deserialize, Serialize};

/// A single directive: a name, its line, its arguments, and (if it opened
/// a block) its children.
///
/// `directive == "#"` denotes a retained comment (§3); its body lives in
/// `comment` rather than `args`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectiveNode {
    pub directive: String,
    pub line: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block: Option<Vec<DirectiveNode>>,
    /// Indices into the payload's `config` list, present iff
    /// `directive == "include"` and include expansion was enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub includes: Option<Vec<usize>>,
    /// Comment body without the leading `#`, present iff `directive == "#"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Originating file path; only set in combine mode (§4.5.2).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl DirectiveNode {
    /// Create a bare directive with no arguments or block.
    #[must_use]
    pub fn new(directive: impl Into<String>, line: usize) -> Self {
        Self {
            directive: directive.into(),
            line,
            args: Vec::new(),
            block: None,
            includes: None,
            comment: None,
            file: None,
        }
    }

    /// Build a `"#"` comment node.
    #[must_use]
    pub fn comment_node(body: impl Into<String>, line: usize) -> Self {
        Self {
            directive: "#".to_string(),
            line,
            args: Vec::new(),
            block: None,
            includes: None,
            comment: Some(body.into()),
            file: None,
        }
    }

    /// Append an argument (builder style, mirrors the teacher's `Directive::arg`).
    #[must_use]
    pub fn arg(mut self, value: impl Into<String>) -> Self {
        self.args.push(value.into());
        self
    }

    /// Attach a block of children.
    #[must_use]
    pub fn block(mut self, children: Vec<Self>) -> Self {
        self.block = Some(children);
        self
    }

    #[must_use]
    pub fn is_comment(&self) -> bool {
        self.directive == "#"
    }
}

/// Overall status of a parse operation or a single file within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Ok,
    Failed,
}

/// An error recorded against a single file, nested inside a [`FileReport`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileError {
    pub line: Option<usize>,
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback: Option<serde_json::Value>,
}

/// An error recorded at the payload level, carrying the originating file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayloadError {
    pub file: String,
    pub line: Option<usize>,
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback: Option<serde_json::Value>,
}

/// The parse result for a single source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileReport {
    pub file: String,
    pub status: Status,
    pub errors: Vec<FileError>,
    pub parsed: Vec<DirectiveNode>,
}

/// The complete result of a `parse` operation, across every file visited
/// via `include` expansion (§3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedPayload {
    pub status: Status,
    pub errors: Vec<PayloadError>,
    pub config: Vec<FileReport>,
}

impl ParsedPayload {
    #[must_use]
    pub fn is_ok(&self) -> bool {
        matches!(self.status, Status::Ok)
    }
}
