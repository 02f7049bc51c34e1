use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::worktime;

/// One employee-day of punch data. At most one row exists per
/// (employee_id, date); clock-in and clock-out fill it in independently.
/// Times are stored as "HH:MM" text, empty when not yet punched, so a
/// half-filled row round-trips through the CSV store unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub employee_id: String,
    pub name: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub clock_in: String,
    #[serde(default)]
    pub clock_out: String,
    #[serde(default)]
    pub latitude: String,
    #[serde(default)]
    pub longitude: String,
}

impl AttendanceRecord {
    pub fn new(employee_id: &str, name: &str, date: NaiveDate) -> Self {
        Self {
            employee_id: employee_id.to_string(),
            name: name.to_string(),
            date,
            clock_in: String::new(),
            clock_out: String::new(),
            latitude: String::new(),
            longitude: String::new(),
        }
    }

    /// Parsed clock-in time, `None` when absent or malformed.
    pub fn clock_in_time(&self) -> Option<NaiveTime> {
        worktime::parse_hhmm(&self.clock_in)
    }

    /// Parsed clock-out time, `None` when absent or malformed.
    pub fn clock_out_time(&self) -> Option<NaiveTime> {
        worktime::parse_hhmm(&self.clock_out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn half_filled_row_parses_partially() {
        let mut rec = AttendanceRecord::new("1001", "Sato", NaiveDate::from_ymd_opt(2025, 8, 1).unwrap());
        rec.clock_in = "08:45".into();
        assert_eq!(rec.clock_in_time(), NaiveTime::from_hms_opt(8, 45, 0));
        assert_eq!(rec.clock_out_time(), None);
    }

    #[test]
    fn malformed_time_reads_as_absent() {
        let mut rec = AttendanceRecord::new("1001", "Sato", NaiveDate::from_ymd_opt(2025, 8, 1).unwrap());
        rec.clock_in = "25:00".into();
        assert_eq!(rec.clock_in_time(), None);
    }
}
