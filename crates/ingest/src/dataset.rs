use std::collections::BTreeSet;

use goalset_core::{FieldValue, Row};
use indexmap::IndexSet;

/// Rows of one or more CSV files with their combined header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    /// Column names in first-seen order, process column first.
    pub columns: Vec<String>,
    pub process_column: String,
    pub rows: Vec<Row>,
}

impl Dataset {
    /// Concatenate datasets in order.
    ///
    /// Columns are the union of all headers with the process column moved to
    /// the front. The process column is taken from the last dataset.
    pub fn merge(parts: impl IntoIterator<Item = Dataset>) -> Dataset {
        let mut columns: IndexSet<String> = IndexSet::new();
        let mut merged = Dataset::default();

        for part in parts {
            columns.extend(part.columns);
            merged.process_column = part.process_column;
            merged.rows.extend(part.rows);
        }

        if let Some(index) = columns.get_index_of(&merged.process_column) {
            columns.move_index(index, 0);
        }
        merged.columns = columns.into_iter().collect();
        merged
    }

    /// Process value of a row as text, if present.
    pub fn process_of(&self, row: &Row) -> Option<String> {
        row.get(&self.process_column)
            .filter(|v| !v.is_null())
            .map(FieldValue::to_string)
    }

    /// Distinct process values, sorted.
    pub fn processes(&self) -> Vec<String> {
        self.rows
            .iter()
            .filter_map(|row| self.process_of(row))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Rows whose process is one of `selected`, in dataset order.
    pub fn filter_processes<S: AsRef<str>>(&self, selected: &[S]) -> Dataset {
        let rows = self
            .rows
            .iter()
            .filter(|row| {
                self.process_of(row)
                    .is_some_and(|p| selected.iter().any(|s| s.as_ref() == p))
            })
            .cloned()
            .collect();
        Dataset {
            columns: self.columns.clone(),
            process_column: self.process_column.clone(),
            rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CsvImporter;

    fn parse(csv: &str) -> Dataset {
        CsvImporter::from_reader(csv.as_bytes(), "inline").unwrap()
    }

    #[test]
    fn merge_unions_columns_with_process_first() {
        let q1 = parse("Process,Revenue,Cost\nB,1,2\nA,3,4\n");
        let q2 = parse("Process,Region,Revenue,Backlog\nC,West,5,1\n");

        let merged = Dataset::merge([q1, q2]);

        assert_eq!(merged.columns, vec!["Process", "Revenue", "Cost", "Region", "Backlog"]);
        assert_eq!(merged.rows.len(), 3);
        assert_eq!(merged.process_column, "Process");
        assert!(!merged.rows[0].contains("Region"));
    }

    #[test]
    fn merge_moves_process_column_to_front() {
        let first = parse("Unit,X\nU1,1\n");
        let second = parse("Process,Unit\nP1,U2\n");
        let merged = Dataset::merge([first, second]);
        assert_eq!(merged.columns, vec!["Process", "Unit", "X"]);
    }

    #[test]
    fn processes_are_sorted_and_unique() {
        let dataset = parse("Process,X\nbeta,1\nalpha,2\nbeta,3\n");
        assert_eq!(dataset.processes(), vec!["alpha", "beta"]);
    }

    #[test]
    fn filter_keeps_selected_processes_in_order() {
        let dataset = parse("Process,X\nbeta,1\nalpha,2\ngamma,3\n");
        let filtered = dataset.filter_processes(&["gamma", "beta"]);
        let kept: Vec<_> = filtered.rows.iter().filter_map(|r| filtered.process_of(r)).collect();
        assert_eq!(kept, vec!["beta", "gamma"]);
        assert!(dataset.filter_processes::<&str>(&[]).rows.is_empty());
    }
}
