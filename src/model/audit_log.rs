use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RequestKind {
    Leave,
    Overtime,
}

/// Append-only record of one request transition. Exactly one entry is written
/// per transition, in the same operation that applies it; entries are never
/// edited or removed afterwards.
///
/// `actor` is the deciding admin's name, "system" for attendance-triggered
/// auto-cancels, or the employee's own name for self-cancels. `submitted` is
/// the request's submission key (a date for leave, a datetime for overtime)
/// kept as text so both kinds share one table.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuditLogEntry {
    #[schema(value_type = String, format = "date-time")]
    pub timestamp: NaiveDateTime,
    pub actor: String,
    pub employee_id: String,
    pub name: String,
    pub kind: RequestKind,
    #[schema(value_type = String, format = "date")]
    pub subject_date: NaiveDate,
    pub submitted: String,
    pub old_status: String,
    pub new_status: String,
    #[serde(default)]
    pub rejection_reason: String,
}
