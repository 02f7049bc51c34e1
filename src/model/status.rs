use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

/// Live status of a leave or overtime request. Deleted rows are removed from
/// the table and survive only as audit-trail labels.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    pub fn label(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serde_snake_case() {
        let s: RequestStatus = serde_json::from_str("\"pending\"").unwrap();
        assert_eq!(s, RequestStatus::Pending);
        let v = serde_json::to_value(RequestStatus::Rejected).unwrap();
        assert_eq!(v, serde_json::json!("rejected"));
    }

    #[test]
    fn status_display_matches_label() {
        assert_eq!(RequestStatus::Approved.to_string(), "approved");
        assert_eq!(RequestStatus::Approved.label(), "approved");
    }
}
