//! Snapshot read-back helpers

use std::collections::BTreeSet;
use std::path::Path;

use rusqlite::Connection;

/// Every row of every table as text, `meta.last_update` excluded
pub fn snapshot_rows(db: &Path) -> BTreeSet<String> {
    let conn = Connection::open(db).expect("Failed to open snapshot");
    let mut rows = BTreeSet::new();

    for (table, sql) in [
        ("release", "SELECT version, branch, codename, lts, supported, devel FROM \"release\""),
        (
            "slice",
            "SELECT branch, package, version, component, repo, section, definition, notes FROM slice",
        ),
        ("description", "SELECT package, description FROM description"),
        ("meta", "SELECT key, value FROM meta WHERE key != 'last_update'"),
    ] {
        let mut stmt = conn.prepare(sql).unwrap();
        let columns = stmt.column_count();
        let mapped = stmt
            .query_map([], |row| {
                let values: Vec<String> = (0..columns)
                    .map(|i| -> rusqlite::Result<String> {
                        let value: rusqlite::types::Value = row.get(i)?;
                        Ok(format!("{:?}", value))
                    })
                    .collect::<rusqlite::Result<_>>()?;
                Ok(format!("{}|{}", table, values.join("|")))
            })
            .unwrap();
        for row in mapped {
            rows.insert(row.unwrap());
        }
    }
    rows
}

pub fn count(db: &Path, sql: &str) -> i64 {
    let conn = Connection::open(db).expect("Failed to open snapshot");
    conn.query_row(sql, [], |row| row.get(0)).unwrap()
}

/// Assert that a `slice.notes` column holds a note of `kind`
pub fn assert_has_note(notes_json: &str, kind: &str) {
    let notes: Vec<serde_json::Value> = serde_json::from_str(notes_json).unwrap();
    assert!(
        notes.iter().any(|n| n["kind"] == kind),
        "expected a '{}' note in {}",
        kind,
        notes_json
    );
}
