//! Last-occurrence-wins deduplication

use crate::ReconcileError;
use kartei_store::Table;
use std::collections::HashMap;
use tracing::warn;

/// A deduplicated table and how it was obtained
#[derive(Debug, Clone, PartialEq)]
pub struct Deduplicated {
    /// One row per key
    pub table: Table,

    /// Column the rows were keyed on
    pub key_column: String,

    /// The preferred key column was absent and the first column was used
    pub key_fallback: bool,

    /// Rows before deduplication
    pub combined_rows: usize,

    /// Distinct keys that occurred more than once
    pub duplicate_keys: usize,
}

impl Deduplicated {
    /// Rows dropped by deduplication
    pub fn rows_removed(&self) -> usize {
        self.combined_rows - self.table.len()
    }
}

/// Concatenate master and fragments in that order, then deduplicate
pub fn merge_tables(
    master: &Table,
    fragments: &[Table],
    preferred_key: &str,
) -> Result<Deduplicated, ReconcileError> {
    let combined = Table::concat(std::iter::once(master).chain(fragments));
    deduplicate(&combined, preferred_key)
}

/// Keep the last row of every key
///
/// Kept rows appear in the order of their positions in `table`. When
/// `preferred_key` is not a column, the first column is used instead and a
/// warning is logged.
pub fn deduplicate(table: &Table, preferred_key: &str) -> Result<Deduplicated, ReconcileError> {
    let (key_index, key_fallback) = match table.column_index(preferred_key) {
        Some(index) => (index, false),
        None => {
            let first = table.headers().first().ok_or(ReconcileError::NoColumns)?;
            warn!(
                preferred = preferred_key,
                fallback = %first,
                columns = ?table.headers(),
                "Key column not found, deduplicating on the first column"
            );
            (0, true)
        }
    };

    let mut last_seen: HashMap<&str, usize> = HashMap::new();
    let mut occurrences: HashMap<&str, usize> = HashMap::new();
    for (position, row) in table.rows().iter().enumerate() {
        let key = row[key_index].as_str();
        last_seen.insert(key, position);
        *occurrences.entry(key).or_insert(0) += 1;
    }

    let kept: Vec<usize> = table
        .rows()
        .iter()
        .enumerate()
        .filter(|(position, row)| last_seen.get(row[key_index].as_str()) == Some(position))
        .map(|(position, _)| position)
        .collect();

    Ok(Deduplicated {
        table: table.select_rows(&kept),
        key_column: table.headers()[key_index].clone(),
        key_fallback,
        combined_rows: table.len(),
        duplicate_keys: occurrences.values().filter(|&&count| count > 1).count(),
    })
}

/// Rows whose key already occurred earlier in `column`
pub fn remaining_duplicates(table: &Table, column: &str) -> usize {
    let Some(index) = table.column_index(column) else {
        return 0;
    };
    let mut seen = std::collections::HashSet::new();
    table
        .rows()
        .iter()
        .filter(|row| !seen.insert(row[index].as_str()))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(headers: &[&str], rows: &[&[&str]]) -> Table {
        let mut table = Table::new(headers.iter().copied());
        for row in rows {
            table.push_row(row.iter().map(|c| c.to_string()).collect());
        }
        table
    }

    #[test]
    fn test_retry_value_overrides_master() {
        let master = table(&["Datei", "Komponist"], &[&["a.jpg", "X"]]);
        let retry = table(&["Datei", "Komponist"], &[&["a.jpg", "Y"]]);

        let merged = merge_tables(&master, &[retry], "Datei").unwrap();

        assert_eq!(merged.table.len(), 1);
        assert_eq!(merged.table.value(0, "Datei"), Some("a.jpg"));
        assert_eq!(merged.table.value(0, "Komponist"), Some("Y"));
        assert_eq!(merged.duplicate_keys, 1);
        assert_eq!(merged.rows_removed(), 1);
    }

    #[test]
    fn test_row_order_follows_last_occurrence() {
        let master = table(
            &["Datei", "Titel"],
            &[&["a.jpg", "1"], &["b.jpg", "2"], &["c.jpg", "3"]],
        );
        let retry = table(&["Datei", "Titel"], &[&["a.jpg", "1b"]]);

        let merged = merge_tables(&master, &[retry], "Datei").unwrap();

        let order: Vec<&str> = (0..3).filter_map(|i| merged.table.value(i, "Datei")).collect();
        assert_eq!(order, vec!["b.jpg", "c.jpg", "a.jpg"]);
    }

    #[test]
    fn test_key_fallback_to_first_column() {
        let master = table(&["Dateiname", "Titel"], &[&["a.jpg", "1"], &["a.jpg", "2"]]);

        let merged = deduplicate(&master, "Datei").unwrap();

        assert!(merged.key_fallback);
        assert_eq!(merged.key_column, "Dateiname");
        assert_eq!(merged.table.len(), 1);
        assert_eq!(merged.table.value(0, "Titel"), Some("2"));
    }

    #[test]
    fn test_no_columns() {
        let empty = Table::default();
        assert!(matches!(deduplicate(&empty, "Datei"), Err(ReconcileError::NoColumns)));
    }

    #[test]
    fn test_new_fragment_columns_are_appended() {
        let master = table(&["Datei", "Komponist"], &[&["a.jpg", "X"]]);
        let retry = table(&["Datei", "Batch", "Komponist"], &[&["b.jpg", "batch_002", "Z"]]);

        let merged = merge_tables(&master, &[retry], "Datei").unwrap();

        assert_eq!(merged.table.headers(), &["Datei", "Komponist", "Batch"]);
        assert_eq!(merged.table.value(0, "Batch"), Some(""));
        assert_eq!(merged.table.len(), 2);
    }

    #[test]
    fn test_remaining_duplicates() {
        let t = table(&["Datei"], &[&["a"], &["b"], &["a"], &["a"]]);
        assert_eq!(remaining_duplicates(&t, "Datei"), 2);
        assert_eq!(remaining_duplicates(&t, "Fehlt"), 0);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn keyed(keys: &[u8], tag: &str) -> Table {
        let mut table = Table::new(["Datei", "Quelle"]);
        for (position, key) in keys.iter().enumerate() {
            table.push_row(vec![format!("{}.jpg", key), format!("{}{}", tag, position)]);
        }
        table
    }

    proptest! {
        /// Property: one row per distinct key, and the last occurrence wins
        #[test]
        fn test_last_occurrence_wins(
            master_keys in prop::collection::hash_set(0u8..40, 0..20),
            fragment_keys in prop::collection::vec(prop::collection::vec(0u8..40, 0..10), 0..4),
        ) {
            let master_keys: Vec<u8> = master_keys.into_iter().collect();
            let master = keyed(&master_keys, "m");
            let fragments: Vec<Table> = fragment_keys
                .iter()
                .enumerate()
                .map(|(i, keys)| keyed(keys, &format!("f{}-", i)))
                .collect();

            let merged = merge_tables(&master, &fragments, "Datei").unwrap();

            let distinct: HashSet<&u8> = master_keys.iter().chain(fragment_keys.iter().flatten()).collect();
            prop_assert_eq!(merged.table.len(), distinct.len());
            prop_assert_eq!(remaining_duplicates(&merged.table, "Datei"), 0);
            prop_assert_eq!(merged.rows_removed(), merged.combined_rows - distinct.len());

            for row in merged.table.rows() {
                let key: u8 = row[0].trim_end_matches(".jpg").parse().unwrap();
                let expected = fragment_keys
                    .iter()
                    .enumerate()
                    .rev()
                    .find_map(|(i, keys)| {
                        keys.iter().rposition(|&k| k == key).map(|p| format!("f{}-{}", i, p))
                    })
                    .or_else(|| {
                        master_keys.iter().position(|&k| k == key).map(|p| format!("m{}", p))
                    })
                    .unwrap();
                prop_assert_eq!(&row[1], &expected);
            }
        }

        /// Property: deduplicating a deduplicated table changes nothing
        #[test]
        fn test_deduplicate_is_idempotent(keys in prop::collection::vec(0u8..20, 0..30)) {
            let once = deduplicate(&keyed(&keys, "r"), "Datei").unwrap();
            let twice = deduplicate(&once.table, "Datei").unwrap();
            prop_assert_eq!(twice.rows_removed(), 0);
            prop_assert_eq!(&twice.table, &once.table);
        }
    }
}
