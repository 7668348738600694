use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use chrono::Datelike;

use crate::error::Result;
use crate::importer::{coerce_batch, read_csv_batch};
use crate::models::{AppendOutcome, Batch, SalesRecord, REQUIRED_COLUMNS};

/// Owner of the sales dataset and its backing CSV file.
///
/// Views and reports only ever see `&SalesStore`; `append` is the single
/// mutation path.
pub struct SalesStore {
    path: PathBuf,
    records: Vec<SalesRecord>,
    notice: Option<String>,
}

impl SalesStore {
    /// Load the backing file. Never fails: a missing file gives an empty store,
    /// an unreadable or malformed one gives an empty store plus a notice.
    pub fn load(path: &Path) -> Self {
        let mut store = Self {
            path: path.to_path_buf(),
            records: Vec::new(),
            notice: None,
        };
        if !path.exists() {
            tracing::info!(path = %path.display(), "no data file yet, starting empty");
            return store;
        }
        match read_csv_batch(path).and_then(|batch| coerce_batch(&batch)) {
            Ok((records, dropped)) => {
                tracing::info!(
                    path = %path.display(),
                    records = records.len(),
                    dropped,
                    "loaded sales data"
                );
                if dropped > 0 {
                    store.notice = Some(format!(
                        "{dropped} invalid rows in {} were skipped.",
                        path.display()
                    ));
                }
                store.records = records;
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to load sales data");
                store.notice = Some(format!(
                    "Failed to load data from {}: {e}\nStarting with empty data.",
                    path.display()
                ));
            }
        }
        store
    }

    #[cfg(test)]
    pub fn from_records(path: &Path, records: Vec<SalesRecord>) -> Self {
        Self {
            path: path.to_path_buf(),
            records,
            notice: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn records(&self) -> &[SalesRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Warning produced while loading, if any. Cleared once taken.
    pub fn take_notice(&mut self) -> Option<String> {
        self.notice.take()
    }

    /// Validate, coerce and merge a batch, then persist the whole dataset.
    ///
    /// Missing columns or a batch with no valid rows leave the dataset untouched.
    pub fn append(&mut self, batch: &Batch) -> Result<AppendOutcome> {
        let (valid, dropped) = coerce_batch(batch)?;
        if valid.is_empty() {
            return Err(crate::error::SalesError::NoValidRows);
        }
        let added = valid.len();
        self.records.extend(valid);
        tracing::info!(added, dropped, total = self.records.len(), "appended batch");

        let persist_error = match self.persist() {
            Ok(()) => None,
            Err(e) => {
                tracing::error!(path = %self.path.display(), error = %e, "failed to save sales data");
                Some(format!("Failed to save data to {}: {e}", self.path.display()))
            }
        };
        Ok(AppendOutcome {
            added,
            dropped,
            persist_error,
        })
    }

    /// Write the full dataset to the backing file via a temp file and rename.
    pub fn persist(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let tmp = self.path.with_extension("csv.tmp");
        {
            let mut wtr = csv::Writer::from_path(&tmp)?;
            wtr.write_record(REQUIRED_COLUMNS)?;
            for r in &self.records {
                wtr.write_record([
                    r.date.format("%Y-%m-%d").to_string(),
                    r.branch.clone(),
                    r.product.clone(),
                    r.quantity.to_string(),
                    r.unit_price.to_string(),
                    r.total.to_string(),
                ])?;
            }
            wtr.flush()?;
        }
        std::fs::rename(&tmp, &self.path)?;
        tracing::debug!(path = %self.path.display(), records = self.records.len(), "saved sales data");
        Ok(())
    }

    pub fn branches(&self) -> Vec<String> {
        self.distinct(|r| &r.branch)
    }

    pub fn products(&self) -> Vec<String> {
        self.distinct(|r| &r.product)
    }

    /// Years present in the data; the current year when there is no data.
    pub fn years(&self) -> Vec<i32> {
        if self.records.is_empty() {
            return vec![chrono::Local::now().year()];
        }
        self.records
            .iter()
            .map(|r| r.date.year())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    fn distinct(&self, field: impl Fn(&SalesRecord) -> &String) -> Vec<String> {
        self.records
            .iter()
            .map(|r| field(r).clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SalesError;
    use chrono::NaiveDate;

    const HEADER: &str = "Date,Branch,Product,Quantity,UnitPrice,Total\n";

    fn batch(columns: &[&str], rows: &[&[&str]]) -> Batch {
        let mut b = Batch::new(columns.iter().map(|c| c.to_string()).collect());
        for row in rows {
            b.rows.push(row.iter().map(|c| c.to_string()).collect());
        }
        b
    }

    fn scenario_batch() -> Batch {
        batch(
            &REQUIRED_COLUMNS,
            &[
                &["2024-06-01", "Colombo", "Milk", "5", "150", "750"],
                &["2024-06-02", "Kandy", "Bread", "10", "50", "500"],
            ],
        )
    }

    #[test]
    fn test_load_missing_file_is_empty_without_notice() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = SalesStore::load(&dir.path().join("sales.csv"));
        assert!(store.is_empty());
        assert!(store.take_notice().is_none());
    }

    #[test]
    fn test_load_corrupt_file_is_empty_with_notice() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sales.csv");
        std::fs::write(&path, "Foo,Bar\n1,2\n").unwrap();
        let mut store = SalesStore::load(&path);
        assert!(store.is_empty());
        let notice = store.take_notice().unwrap();
        assert!(notice.contains("Starting with empty data"));
        assert!(store.take_notice().is_none());
    }

    #[test]
    fn test_load_drops_invalid_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sales.csv");
        std::fs::write(
            &path,
            format!("{HEADER}2024-06-01,Colombo,Milk,5,150,750\n2024-06-02,Kandy,Bread,x,50,500\n"),
        )
        .unwrap();
        let mut store = SalesStore::load(&path);
        assert_eq!(store.len(), 1);
        assert!(store.take_notice().unwrap().contains("1 invalid rows"));
    }

    #[test]
    fn test_append_adds_valid_rows_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("sales.csv");
        let mut store = SalesStore::load(&path);
        let mut b = scenario_batch();
        b.rows.push(vec!["bad".into(), "Kandy".into(), "Eggs".into(), "1".into(), "1".into(), "1".into()]);

        let outcome = store.append(&b).unwrap();
        assert_eq!(outcome.added, 2);
        assert_eq!(outcome.dropped, 1);
        assert!(outcome.persist_error.is_none());
        assert_eq!(store.len(), 2);

        let reloaded = SalesStore::load(&path);
        assert_eq!(reloaded.records(), store.records());
    }

    #[test]
    fn test_append_twice_accumulates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sales.csv");
        let mut store = SalesStore::load(&path);
        store.append(&scenario_batch()).unwrap();
        store.append(&scenario_batch()).unwrap();
        assert_eq!(store.len(), 4);
        assert_eq!(SalesStore::load(&path).len(), 4);
    }

    #[test]
    fn test_append_missing_column_leaves_store_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sales.csv");
        let mut store = SalesStore::load(&path);
        store.append(&scenario_batch()).unwrap();
        let before = store.records().to_vec();

        let b = batch(
            &["Date", "Branch", "Product", "Quantity", "UnitPrice"],
            &[&["2024-06-03", "Galle", "Tea", "1", "400"]],
        );
        match store.append(&b) {
            Err(SalesError::MissingColumns(cols)) => assert_eq!(cols, vec!["Total"]),
            other => panic!("expected MissingColumns, got {other:?}"),
        }
        assert_eq!(store.records(), before.as_slice());
        assert_eq!(SalesStore::load(&path).len(), 2);
    }

    #[test]
    fn test_append_with_no_valid_rows_fails_without_mutation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sales.csv");
        let mut store = SalesStore::load(&path);
        let b = batch(&REQUIRED_COLUMNS, &[&["", "Kandy", "Bread", "1", "1", "1"]]);
        assert!(matches!(store.append(&b), Err(SalesError::NoValidRows)));
        assert!(store.is_empty());
        assert!(!path.exists());
    }

    #[test]
    fn test_persist_failure_keeps_rows_in_memory() {
        let dir = tempfile::tempdir().unwrap();
        // The backing path is a directory, so the final rename fails.
        let path = dir.path().join("taken");
        std::fs::create_dir_all(path.join("inner")).unwrap();
        let mut store = SalesStore::from_records(&path, Vec::new());
        let outcome = store.append(&scenario_batch()).unwrap();
        assert!(outcome.persist_error.is_some());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_round_trip_preserves_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sales.csv");
        std::fs::write(
            &path,
            format!(
                "{HEADER}2024-06-01 00:00:00,Colombo,Milk,5,150.5,752.5\n\
                 2024/06/02,Kandy,Bread,10,50,500\n"
            ),
        )
        .unwrap();
        let store = SalesStore::load(&path);
        store.persist().unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with(HEADER));
        assert!(content.contains("2024-06-01,Colombo,Milk,5,150.5,752.5"));
        let reloaded = SalesStore::load(&path);
        assert_eq!(reloaded.records(), store.records());
    }

    #[test]
    fn test_accessors() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = SalesStore::load(&dir.path().join("sales.csv"));
        assert_eq!(store.years(), vec![chrono::Local::now().year()]);
        assert!(store.branches().is_empty());

        let b = batch(
            &REQUIRED_COLUMNS,
            &[
                &["2024-06-01", "Kandy", "Milk", "5", "150", "750"],
                &["2023-01-02", "Colombo", "Bread", "10", "50", "500"],
                &["2024-07-02", "Kandy", "Bread", "1", "50", "50"],
            ],
        );
        store.append(&b).unwrap();
        assert_eq!(store.branches(), vec!["Colombo", "Kandy"]);
        assert_eq!(store.products(), vec!["Bread", "Milk"]);
        assert_eq!(store.years(), vec![2023, 2024]);
        assert_eq!(
            store.records()[1].date,
            NaiveDate::from_ymd_opt(2023, 1, 2).unwrap()
        );
    }
}
