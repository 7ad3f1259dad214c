//! Static analysis of slice definitions
//!
//! [`analyze`] is a pure function of the decoded definition and its raw
//! text. Rules are evaluated in a fixed order, so identical input always
//! yields an identical note list.
//!
//! ## Rules
//! - **missing-copyright**: no `copyright` slice under `slices`
//! - **double-glob**: `**` in the text or in any content path
//! - **excess-blank-lines**: three consecutive blank lines (first hit only)
//! - **architecture-comments**: an architecture name inside a `#` comment (first hit only)
//! - **unsorted-content**: per slice, unsorted `contents` keys or `essential` list
//!
//! Definitions that fail to decode are never analyzed; they get a single
//! `invalid-definition` note from [`check_definition`], as do files that are
//! not UTF-8 ([`check_definition_bytes`]).
//!
//! ## Usage
//!
//! ```rust
//! use slicedb::lint::{check_definition, NoteKind};
//!
//! let text = "slices:\n  foo:\n    contents:\n      /b: {}\n      /a: {}\n";
//! let checked = check_definition(text);
//! let kinds: Vec<_> = checked.notes.iter().map(|n| n.kind).collect();
//! assert_eq!(kinds, vec![NoteKind::MissingCopyright, NoteKind::UnsortedContent]);
//! ```

mod rules;
mod types;

pub use rules::{
    check_architecture_comments, check_double_glob, check_excess_blank_lines,
    check_missing_copyright, check_unsorted_content, ARCHITECTURE_SIGNATURES, COPYRIGHT_SLICE,
};
pub use types::{Note, NoteKind};

use serde_json::Value;

/// Run every rule over a decoded definition
pub fn analyze(definition: &Value, text: &str) -> Vec<Note> {
    let mut notes = Vec::new();
    notes.extend(check_missing_copyright(definition));
    notes.extend(check_double_glob(definition, text));
    notes.extend(check_excess_blank_lines(text));
    notes.extend(check_architecture_comments(text));
    notes.extend(check_unsorted_content(definition));
    notes
}

/// Decode definition YAML into its JSON form
///
/// Mapping order is preserved. On failure the error comes back as an
/// `invalid-definition` note carrying the decoder's line when it has one.
pub fn decode_definition(text: &str) -> Result<Value, Note> {
    serde_yaml::from_str::<Value>(text).map_err(|e| {
        let note = Note::new(NoteKind::InvalidDefinition).with_text(e.to_string());
        match e.location() {
            Some(location) => note.at_line(location.line()),
            None => note,
        }
    })
}

/// A decoded definition with its notes
#[derive(Debug, Clone, PartialEq)]
pub struct CheckedDefinition {
    /// `None` when decoding failed
    pub parsed: Option<Value>,
    pub notes: Vec<Note>,
}

/// Decode, then analyze when decoding succeeded
pub fn check_definition(text: &str) -> CheckedDefinition {
    match decode_definition(text) {
        Ok(parsed) => {
            let notes = analyze(&parsed, text);
            CheckedDefinition {
                parsed: Some(parsed),
                notes,
            }
        }
        Err(note) => CheckedDefinition {
            parsed: None,
            notes: vec![note],
        },
    }
}

/// [`check_definition`] over raw file contents
///
/// Contents that are not UTF-8 never reach the decoder; they get a single
/// `invalid-definition` note at the line of the first bad byte.
pub fn check_definition_bytes(bytes: &[u8]) -> CheckedDefinition {
    match std::str::from_utf8(bytes) {
        Ok(text) => check_definition(text),
        Err(e) => {
            let line = bytes[..e.valid_up_to()].iter().filter(|&&b| b == b'\n').count() + 1;
            CheckedDefinition {
                parsed: None,
                notes: vec![Note::new(NoteKind::InvalidDefinition)
                    .with_text(e.to_string())
                    .at_line(line)],
            }
        }
    }
}
