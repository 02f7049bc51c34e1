use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::model::attendance::AttendanceRecord;
use crate::model::audit_log::AuditLogEntry;
use crate::model::employee::Employee;
use crate::model::leave_request::LeaveRequest;
use crate::model::overtime_request::OvertimeRequest;
use crate::store::csv_table::CsvTable;

pub const ATTENDANCE_CSV: &str = "attendance_log.csv";
pub const LEAVE_CSV: &str = "leave_requests.csv";
pub const OVERTIME_CSV: &str = "overtime_requests.csv";
pub const AUDIT_CSV: &str = "request_audit_log.csv";
pub const EMPLOYEE_CSV: &str = "employees.csv";

pub const BACKUP_DIR: &str = "backups";

/// The five persisted tables. Every mutation goes through the owning table's
/// locked read-modify-write cycle; there is no cross-table transaction, which
/// matches the one-admin, human-paced usage this service is built for.
pub struct Store {
    pub data_dir: PathBuf,
    pub attendance: CsvTable<AttendanceRecord>,
    pub leave_requests: CsvTable<LeaveRequest>,
    pub overtime_requests: CsvTable<OvertimeRequest>,
    pub audit_log: CsvTable<AuditLogEntry>,
    pub employees: CsvTable<Employee>,
}

impl Store {
    pub fn backups_dir(&self) -> PathBuf {
        self.data_dir.join(BACKUP_DIR)
    }
}

pub fn init_store(data_dir: &str) -> Result<Store> {
    let dir = PathBuf::from(data_dir);
    fs::create_dir_all(&dir).with_context(|| format!("create data dir {}", dir.display()))?;

    Ok(Store {
        attendance: CsvTable::new(dir.join(ATTENDANCE_CSV)),
        leave_requests: CsvTable::new(dir.join(LEAVE_CSV)),
        overtime_requests: CsvTable::new(dir.join(OVERTIME_CSV)),
        audit_log: CsvTable::new(dir.join(AUDIT_CSV)),
        employees: CsvTable::new(dir.join(EMPLOYEE_CSV)),
        data_dir: dir,
    })
}
