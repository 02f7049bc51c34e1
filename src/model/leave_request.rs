use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

use crate::lifecycle::Reviewable;
use crate::model::audit_log::RequestKind;
use crate::model::status::RequestStatus;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LeaveType {
    /// Day off requested on short notice.
    ShortNotice,
    /// Weddings, funerals and similar ceremonial leave.
    Ceremonial,
    /// Anything else; the note field carries the explanation.
    Other,
}

/// A single-day leave request. Identity key is
/// (employee_id, leave_date, submitted_on) — an employee may hold requests
/// for several dates, and even several for one date across submission days.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaveRequest {
    pub employee_id: String,
    pub name: String,
    pub submitted_on: NaiveDate,
    pub leave_date: NaiveDate,
    pub leave_type: LeaveType,
    #[serde(default)]
    pub note: String,
    pub status: RequestStatus,
    #[serde(default)]
    pub approver: String,
    pub decided_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub rejection_reason: String,
}

impl Reviewable for LeaveRequest {
    const KIND: RequestKind = RequestKind::Leave;

    fn employee_id(&self) -> &str {
        &self.employee_id
    }

    fn employee_name(&self) -> &str {
        &self.name
    }

    fn subject_date(&self) -> NaiveDate {
        self.leave_date
    }

    fn submission_key(&self) -> String {
        self.submitted_on.to_string()
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
