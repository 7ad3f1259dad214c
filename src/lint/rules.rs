//! The individual slice definition checks
//!
//! Text rules look at the raw definition; structural rules look at the
//! decoded form. Missing structure (no `slices` map, a slice that is not a
//! mapping) is treated as empty so every rule is total.

use serde_json::{Map, Value};

use super::types::{Note, NoteKind};

/// Substrings that mark a comment as architecture specific
pub const ARCHITECTURE_SIGNATURES: [&str; 8] =
    ["arm", "amd64", "x86", "aarch", "i386", "riscv", "ppc64", "s390x"];

/// Slice name every definition should provide
pub const COPYRIGHT_SLICE: &str = "copyright";

fn slices(definition: &Value) -> Option<&Map<String, Value>> {
    definition.get("slices").and_then(Value::as_object)
}

pub fn check_missing_copyright(definition: &Value) -> Option<Note> {
    let has_copyright = slices(definition)
        .map(|s| s.contains_key(COPYRIGHT_SLICE))
        .unwrap_or(false);
    (!has_copyright).then(|| Note::new(NoteKind::MissingCopyright))
}

pub fn check_double_glob(definition: &Value, text: &str) -> Option<Note> {
    if let Some((idx, _)) = text.lines().enumerate().find(|(_, line)| line.contains("**")) {
        return Some(Note::new(NoteKind::DoubleGlob).at_line(idx + 1));
    }

    let path = slices(definition)?
        .values()
        .filter_map(|body| body.get("contents").and_then(Value::as_object))
        .flat_map(|contents| contents.keys())
        .find(|path| path.contains("**"))?;

    Some(Note::new(NoteKind::DoubleGlob).with_text(path.clone()))
}

pub fn check_excess_blank_lines(text: &str) -> Option<Note> {
    let mut blanks = 0;
    for (idx, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            blanks += 1;
        } else {
            blanks = 0;
        }
        if blanks > 2 {
            return Some(Note::new(NoteKind::ExcessBlankLines).at_line(idx + 1));
        }
    }
    None
}

pub fn check_architecture_comments(text: &str) -> Option<Note> {
    for (idx, line) in text.lines().enumerate() {
        let Some((_, comment)) = line.split_once('#') else {
            continue;
        };
        if let Some(arch) = ARCHITECTURE_SIGNATURES.iter().find(|sig| comment.contains(*sig)) {
            return Some(
                Note::new(NoteKind::ArchitectureComments)
                    .with_text(*arch)
                    .at_line(idx + 1),
            );
        }
    }
    None
}

/// One note per slice whose `contents` keys or `essential` entries are unsorted
pub fn check_unsorted_content(definition: &Value) -> Vec<Note> {
    let Some(slices) = slices(definition) else {
        return Vec::new();
    };

    slices
        .iter()
        .filter(|(_, body)| {
            let contents: Vec<&str> = body
                .get("contents")
                .and_then(Value::as_object)
                .map(|c| c.keys().map(String::as_str).collect())
                .unwrap_or_default();
            let essential: Vec<&str> = body
                .get("essential")
                .and_then(Value::as_array)
                .map(|e| e.iter().filter_map(Value::as_str).collect())
                .unwrap_or_default();

            !is_sorted(&contents) || !is_sorted(&essential)
        })
        .map(|(name, _)| Note::new(NoteKind::UnsortedContent).with_text(name.clone()))
        .collect()
}

fn is_sorted(names: &[&str]) -> bool {
    names.windows(2).all(|pair| pair[0] <= pair[1])
}
