//! Note types produced by slice definition checks

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kinds of findings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NoteKind {
    /// The `slices` map has no `copyright` slice
    MissingCopyright,
    /// A `**` glob in the text or in a content path
    DoubleGlob,
    /// Three or more consecutive blank lines
    ExcessBlankLines,
    /// A comment naming an architecture
    ArchitectureComments,
    /// A slice's `contents` keys or `essential` list out of order
    UnsortedContent,
    /// The definition text could not be decoded
    InvalidDefinition,
}

impl NoteKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoteKind::MissingCopyright => "missing-copyright",
            NoteKind::DoubleGlob => "double-glob",
            NoteKind::ExcessBlankLines => "excess-blank-lines",
            NoteKind::ArchitectureComments => "architecture-comments",
            NoteKind::UnsortedContent => "unsorted-content",
            NoteKind::InvalidDefinition => "invalid-definition",
        }
    }
}

impl fmt::Display for NoteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single finding attached to one slice definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub kind: NoteKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// 1-based line in the definition text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
}

impl Note {
    pub fn new(kind: NoteKind) -> Self {
        Self {
            kind,
            text: None,
            line: None,
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }
}
