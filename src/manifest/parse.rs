//! RFC822-style `Packages` stanza parsing

use std::collections::BTreeMap;

use super::{Component, Package, SubRepo};

/// Split manifest text into blank-line-delimited stanzas
pub fn split_stanzas(text: &str) -> Vec<Vec<&str>> {
    let mut stanzas = Vec::new();
    let mut current = Vec::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                stanzas.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        stanzas.push(current);
    }

    stanzas
}

/// Parse a decompressed manifest
///
/// Stanzas missing any of `Package`, `Version`, `Description` or `Section`
/// are dropped. A later stanza for the same name replaces an earlier one.
pub fn parse_manifest(text: &str, component: Component, sub_repo: SubRepo) -> Vec<Package> {
    let mut packages = BTreeMap::new();

    for stanza in split_stanzas(text) {
        if let Some(package) = parse_stanza(&stanza, component, sub_repo) {
            packages.insert(package.name.clone(), package);
        }
    }

    packages.into_values().collect()
}

fn parse_stanza(lines: &[&str], component: Component, sub_repo: SubRepo) -> Option<Package> {
    let mut name = None;
    let mut version = None;
    let mut description = None;
    let mut section = None;

    for line in lines {
        // Continuation lines belong to the previous field
        if line.starts_with(' ') || line.starts_with('\t') {
            continue;
        }
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        match key {
            "Package" => name = Some(value),
            "Version" => version = Some(value),
            "Description" => description = Some(value),
            "Section" => section = Some(value),
            _ => {}
        }
    }

    let section = section?;
    let section = section
        .strip_prefix(component.as_str())
        .and_then(|rest| rest.strip_prefix('/'))
        .unwrap_or(section);

    Some(Package {
        name: name?.to_string(),
        version: version?.to_string(),
        component,
        sub_repo,
        description: description?.to_string(),
        section: section.to_string(),
    })
}
