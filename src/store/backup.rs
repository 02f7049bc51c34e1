//! Snapshot backup and restore. A snapshot is a timestamped directory of
//! normalized table files under `<data_dir>/backups/`; rotation of old
//! snapshots is the standalone `backup_rotate` binary's job.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::NaiveDateTime;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::db::{
    ATTENDANCE_CSV, AUDIT_CSV, EMPLOYEE_CSV, LEAVE_CSV, OVERTIME_CSV, Store,
};
use crate::store::csv_table::CsvTable;

#[derive(Debug, Default, Serialize, utoipa::ToSchema)]
pub struct RestoreReport {
    pub applied: Vec<String>,
    pub skipped: Vec<String>,
    pub errors: Vec<String>,
}

/// Writes all five tables into `backups/<prefix>_<stamp>/` and returns the
/// snapshot name. Rows are re-serialized rather than byte-copied, so a
/// snapshot is always in the current column layout.
pub fn snapshot(store: &Store, prefix: &str, now: NaiveDateTime) -> Result<String> {
    let name = format!("{prefix}_{}", now.format("%Y%m%d_%H%M%S"));
    let dir = store.backups_dir().join(&name);
    fs::create_dir_all(&dir).with_context(|| format!("create snapshot dir {}", dir.display()))?;

    copy_table(&store.attendance, &dir.join(ATTENDANCE_CSV))?;
    copy_table(&store.leave_requests, &dir.join(LEAVE_CSV))?;
    copy_table(&store.overtime_requests, &dir.join(OVERTIME_CSV))?;
    copy_table(&store.audit_log, &dir.join(AUDIT_CSV))?;
    copy_table(&store.employees, &dir.join(EMPLOYEE_CSV))?;

    Ok(name)
}

/// Snapshot names, newest first.
pub fn list_snapshots(store: &Store) -> Result<Vec<String>> {
    let dir = store.backups_dir();
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut names = Vec::new();
    for entry in fs::read_dir(&dir).with_context(|| format!("read {}", dir.display()))? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort_unstable_by(|a, b| b.cmp(a));
    Ok(names)
}

/// Replaces live tables with the snapshot's files. Files absent from the
/// snapshot are skipped, files that fail row validation are reported and the
/// corresponding live table is left untouched.
pub fn restore(store: &Store, name: &str) -> Result<RestoreReport> {
    if name.is_empty() || name.contains(['/', '\\']) || name.contains("..") {
        bail!("invalid snapshot name {name:?}");
    }
    let dir = store.backups_dir().join(name);
    if !dir.is_dir() {
        bail!("snapshot {name} not found");
    }

    let mut report = RestoreReport::default();
    restore_table(&store.attendance, &dir, ATTENDANCE_CSV, &mut report);
    restore_table(&store.leave_requests, &dir, LEAVE_CSV, &mut report);
    restore_table(&store.overtime_requests, &dir, OVERTIME_CSV, &mut report);
    restore_table(&store.audit_log, &dir, AUDIT_CSV, &mut report);
    restore_table(&store.employees, &dir, EMPLOYEE_CSV, &mut report);
    Ok(report)
}

fn copy_table<T: Serialize + DeserializeOwned>(table: &CsvTable<T>, dest: &Path) -> Result<()> {
    let rows = table.load()?;
    let dest_table: CsvTable<T> = CsvTable::new(dest);
    dest_table.replace(&rows)
}

fn restore_table<T: Serialize + DeserializeOwned>(
    table: &CsvTable<T>,
    snapshot_dir: &Path,
    file_name: &str,
    report: &mut RestoreReport,
) {
    let src = snapshot_dir.join(file_name);
    if !src.exists() {
        report.skipped.push(file_name.to_string());
        return;
    }
    let src_table: CsvTable<T> = CsvTable::new(&src);
    match src_table.load() {
        Ok(rows) => match table.replace(&rows) {
            Ok(()) => report.applied.push(file_name.to_string()),
            Err(e) => report.errors.push(format!("{file_name}: {e}")),
        },
        Err(e) => report.errors.push(format!("{file_name}: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_store;
    use crate::model::employee::Employee;

    fn employee(id: &str, name: &str) -> Employee {
        Employee {
            employee_id: id.to_string(),
            name: name.to_string(),
            department: "Sales".to_string(),
            password_hash: String::new(),
        }
    }

    fn stamp() -> NaiveDateTime {
        chrono::NaiveDate::from_ymd_opt(2025, 8, 1)
            .unwrap()
            .and_hms_opt(18, 30, 0)
            .unwrap()
    }

    #[test]
    fn snapshot_then_restore_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = init_store(dir.path().to_str().unwrap()).unwrap();
        store
            .employees
            .replace(&[employee("1001", "Sato"), employee("1002", "Tanaka")])
            .unwrap();

        let name = snapshot(&store, "backup", stamp()).unwrap();
        assert_eq!(name, "backup_20250801_183000");
        assert_eq!(list_snapshots(&store).unwrap(), vec![name.clone()]);

        store.employees.replace(&[]).unwrap();
        let report = restore(&store, &name).unwrap();
        assert!(report.errors.is_empty());
        assert!(report.applied.contains(&EMPLOYEE_CSV.to_string()));
        assert_eq!(store.employees.load().unwrap().len(), 2);
    }

    #[test]
    fn restore_rejects_traversal_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = init_store(dir.path().to_str().unwrap()).unwrap();
        assert!(restore(&store, "../outside").is_err());
        assert!(restore(&store, "no_such_snapshot").is_err());
    }
}
