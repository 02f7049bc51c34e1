//! CSV-backed tables. Each table is one file; mutation is a whole-table
//! replace under the table's own lock, written to a temp file and renamed
//! into place so readers never observe a half-written table. Only the audit
//! log and fresh submissions use the true-append path.

use std::fs::{self, File, OpenOptions};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;

pub struct CsvTable<T> {
    path: PathBuf,
    lock: Mutex<()>,
    _rows: PhantomData<fn() -> T>,
}

impl<T: Serialize + DeserializeOwned> CsvTable<T> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
            _rows: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        // A poisoned lock only means another request panicked mid-write; the
        // file itself is still whole thanks to the rename, so keep serving.
        self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// All rows in file order. A missing or empty file is an empty table.
    pub fn load(&self) -> Result<Vec<T>> {
        let _guard = self.guard();
        self.read_rows()
    }

    /// Replaces the whole table with `rows`, atomically.
    pub fn replace(&self, rows: &[T]) -> Result<()> {
        let _guard = self.guard();
        self.write_atomic(rows)
    }

    /// Appends rows without rewriting the table. The header line is written
    /// only when the file does not exist yet or is empty.
    pub fn append(&self, rows: &[T]) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let _guard = self.guard();

        let needs_header = fs::metadata(&self.path).map(|m| m.len() == 0).unwrap_or(true);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("open {} for append", self.path.display()))?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);
        for row in rows {
            writer.serialize(row)?;
        }
        writer
            .flush()
            .with_context(|| format!("append to {}", self.path.display()))
    }

    /// One locked read-modify-write cycle: the closure sees the freshly
    /// re-read rows, and whatever it leaves behind is persisted as the new
    /// table before the lock is released.
    pub fn update<R>(&self, apply: impl FnOnce(&mut Vec<T>) -> R) -> Result<R> {
        let _guard = self.guard();
        let mut rows = self.read_rows()?;
        let result = apply(&mut rows);
        self.write_atomic(&rows)?;
        Ok(result)
    }

    fn read_rows(&self) -> Result<Vec<T>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let file =
            File::open(&self.path).with_context(|| format!("open {}", self.path.display()))?;
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(file);
        let mut rows = Vec::new();
        for record in reader.deserialize() {
            let row: T =
                record.with_context(|| format!("malformed row in {}", self.path.display()))?;
            rows.push(row);
        }
        Ok(rows)
    }

    fn write_atomic(&self, rows: &[T]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("create {}", parent.display()))?;
            }
        }
        let tmp = self.path.with_extension("csv.tmp");
        {
            let file =
                File::create(&tmp).with_context(|| format!("create {}", tmp.display()))?;
            let mut writer = csv::Writer::from_writer(file);
            for row in rows {
                writer.serialize(row)?;
            }
            writer.flush()?;
        }
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("replace {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Row {
        id: String,
        value: i64,
    }

    fn row(id: &str, value: i64) -> Row {
        Row { id: id.to_string(), value }
    }

    #[test]
    fn missing_file_reads_as_empty_table() {
        let dir = tempfile::tempdir().unwrap();
        let table: CsvTable<Row> = CsvTable::new(dir.path().join("rows.csv"));
        assert!(table.load().unwrap().is_empty());
    }

    #[test]
    fn replace_round_trips_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let table: CsvTable<Row> = CsvTable::new(dir.path().join("rows.csv"));

        table.replace(&[row("b", 2), row("a", 1)]).unwrap();
        assert_eq!(table.load().unwrap(), vec![row("b", 2), row("a", 1)]);

        table.replace(&[row("c", 3)]).unwrap();
        assert_eq!(table.load().unwrap(), vec![row("c", 3)]);
    }

    #[test]
    fn append_writes_header_only_once() {
        let dir = tempfile::tempdir().unwrap();
        let table: CsvTable<Row> = CsvTable::new(dir.path().join("rows.csv"));

        table.append(&[row("a", 1)]).unwrap();
        table.append(&[row("b", 2), row("c", 3)]).unwrap();

        assert_eq!(table.load().unwrap(), vec![row("a", 1), row("b", 2), row("c", 3)]);
        let text = fs::read_to_string(table.path()).unwrap();
        assert_eq!(text.matches("id,value").count(), 1);
    }

    #[test]
    fn update_persists_what_the_closure_leaves() {
        let dir = tempfile::tempdir().unwrap();
        let table: CsvTable<Row> = CsvTable::new(dir.path().join("rows.csv"));
        table.replace(&[row("a", 1), row("b", 2)]).unwrap();

        let removed = table
            .update(|rows| {
                rows.retain(|r| r.id != "a");
                rows.push(row("d", 4));
                "done"
            })
            .unwrap();

        assert_eq!(removed, "done");
        assert_eq!(table.load().unwrap(), vec![row("b", 2), row("d", 4)]);
    }
}
