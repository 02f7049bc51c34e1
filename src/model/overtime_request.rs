use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::lifecycle::Reviewable;
use crate::model::audit_log::RequestKind;
use crate::model::status::RequestStatus;

/// Pre-approval request for overtime on `target_date`. Identity key is
/// (employee_id, target_date, submitted_at); submission is refused while a
/// Pending or Approved request already covers the same target date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OvertimeRequest {
    pub employee_id: String,
    pub name: String,
    pub target_date: NaiveDate,
    pub submitted_at: NaiveDateTime,
    pub hours: f64,
    pub reason: String,
    pub status: RequestStatus,
    #[serde(default)]
    pub approver: String,
    pub decided_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub rejection_reason: String,
}

impl Reviewable for OvertimeRequest {
    const KIND: RequestKind = RequestKind::Overtime;

    fn employee_id(&self) -> &str {
        &self.employee_id
    }

    fn employee_name(&self) -> &str {
        &self.name
    }

    fn subject_date(&self) -> NaiveDate {
        self.target_date
    }

    fn submission_key(&self) -> String {
        // Matches the JSON rendering of `submitted_at`, so the value a client
        // reads from a listing can be sent straight back in a decision batch.
        self.submitted_at.format("%Y-%m-%dT%H:%M:%S").to_string()
    }

    fn status(&self) -> RequestStatus {
        self.status
    }

    fn set_status(&mut self, status: RequestStatus) {
        self.status = status;
    }

    fn set_decision(&mut self, approver: &str, decided_at: Option<NaiveDateTime>, reason: &str) {
        self.approver = approver.to_string();
        self.decided_at = decided_at;
        self.rejection_reason = reason.to_string();
    }
}
