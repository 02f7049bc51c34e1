//! Status machine shared by leave and overtime requests.
//!
//! Pending → Approved | Rejected, both reversible only as far as the machine
//! allows: Approved can be reopened to Pending ("un-approve"), Rejected has no
//! way back, and deletion is permitted while Pending only. Every applied
//! transition emits exactly one audit entry; rows that fail their precondition
//! are reported as conflicts and never abort the rest of the batch.
//!
//! Callers run these functions inside the owning table's locked
//! read-modify-write cycle, so the status each transition validates against is
//! the just-re-read persisted one, not the stale view an admin screen held.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::model::audit_log::{AuditLogEntry, RequestKind};
use crate::model::leave_request::LeaveRequest;
use crate::model::overtime_request::OvertimeRequest;
use crate::model::status::RequestStatus;

/// Terminal labels that only ever appear in the audit trail; the rows
/// themselves are removed from the table.
pub const LABEL_DELETED: &str = "deleted";
pub const LABEL_SELF_CANCELLED: &str = "self_cancelled";
pub const LABEL_AUTO_CANCELLED: &str = "auto_cancelled";

/// Actor recorded for attendance-triggered cancellations.
pub const SYSTEM_ACTOR: &str = "system";

/// Request row as the lifecycle machine sees it. Leave and overtime differ
/// only in their identity key and payload, so the transition contract is
/// written once against this seam.
pub trait Reviewable {
    const KIND: RequestKind;

    fn employee_id(&self) -> &str;
    fn employee_name(&self) -> &str;
    fn subject_date(&self) -> NaiveDate;
    /// Textual identity discriminator: submission date for leave, submission
    /// datetime for overtime. Compared verbatim against `DecisionItem::submitted`.
    fn submission_key(&self) -> String;
    fn status(&self) -> RequestStatus;
    fn set_status(&mut self, status: RequestStatus);
    fn set_decision(&mut self, approver: &str, decided_at: Option<NaiveDateTime>, reason: &str);
}

/// One row of an admin decision batch. Exactly one action flag may be set.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct DecisionItem {
    #[schema(example = "1001")]
    pub employee_id: String,
    /// Leave date or overtime target date of the row being decided.
    #[schema(value_type = String, format = "date", example = "2025-08-12")]
    pub date: NaiveDate,
    /// Submission key exactly as listed (date for leave, datetime for overtime).
    #[schema(example = "2025-08-01")]
    pub submitted: String,
    #[serde(default)]
    pub approve: bool,
    #[serde(default)]
    pub reject: bool,
    #[serde(default)]
    pub unapprove: bool,
    #[serde(default)]
    pub delete: bool,
    /// Required when `reject` is set; ignored otherwise.
    #[serde(default)]
    pub rejection_reason: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct DecisionBatch {
    pub decisions: Vec<DecisionItem>,
}

/// Identity of a row an employee wants to cancel.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CancelItem {
    #[schema(value_type = String, format = "date", example = "2025-08-12")]
    pub date: NaiveDate,
    #[schema(example = "2025-08-01")]
    pub submitted: String,
}

#[derive(Debug, Default, serde::Serialize, ToSchema)]
pub struct DecisionOutcome {
    pub applied: usize,
    /// Human-readable reports for rows that were skipped. Never empty strings;
    /// always carries enough context to find the row again.
    pub conflicts: Vec<String>,
}

enum Action {
    Approve,
    Reject(String),
    Unapprove,
    Delete,
}

impl Action {
    fn from_item(item: &DecisionItem) -> Result<Option<Action>, String> {
        let set = [item.approve, item.reject, item.unapprove, item.delete]
            .iter()
            .filter(|flag| **flag)
            .count();
        match set {
            0 => Ok(None),
            1 if item.approve => Ok(Some(Action::Approve)),
            1 if item.unapprove => Ok(Some(Action::Unapprove)),
            1 if item.delete => Ok(Some(Action::Delete)),
            1 => {
                let reason = item.rejection_reason.trim();
                if reason.is_empty() {
                    Err(format!(
                        "{} {}: a rejection requires a reason",
                        item.employee_id, item.date
                    ))
                } else {
                    Ok(Some(Action::Reject(reason.to_string())))
                }
            }
            _ => Err(format!(
                "{} {}: approve/reject/un-approve/delete are mutually exclusive",
                item.employee_id, item.date
            )),
        }
    }

    fn required_status(&self) -> RequestStatus {
        match self {
            Action::Approve | Action::Reject(_) | Action::Delete => RequestStatus::Pending,
            Action::Unapprove => RequestStatus::Approved,
        }
    }
}

fn audit_entry<T: Reviewable>(
    row: &T,
    actor: &str,
    old_status: &str,
    new_status: &str,
    reason: &str,
    now: NaiveDateTime,
) -> AuditLogEntry {
    AuditLogEntry {
        timestamp: now,
        actor: actor.to_string(),
        employee_id: row.employee_id().to_string(),
        name: row.employee_name().to_string(),
        kind: T::KIND,
        subject_date: row.subject_date(),
        submitted: row.submission_key(),
        old_status: old_status.to_string(),
        new_status: new_status.to_string(),
        rejection_reason: reason.to_string(),
    }
}

fn find_row<T: Reviewable>(rows: &[T], item: &DecisionItem) -> Option<usize> {
    rows.iter().position(|row| {
        row.employee_id() == item.employee_id
            && row.subject_date() == item.date
            && row.submission_key() == item.submitted
    })
}

/// Applies an admin decision batch to the freshly loaded table rows.
/// Partial application: each row succeeds or is reported on its own.
/// Returns the audit entries to append, exactly one per applied transition.
pub fn apply_decisions<T: Reviewable>(
    rows: &mut Vec<T>,
    decisions: &[DecisionItem],
    approver: &str,
    now: NaiveDateTime,
) -> (Vec<AuditLogEntry>, DecisionOutcome) {
    let mut audits = Vec::new();
    let mut outcome = DecisionOutcome::default();

    for item in decisions {
        let action = match Action::from_item(item) {
            Ok(None) => continue,
            Ok(Some(action)) => action,
            Err(conflict) => {
                outcome.conflicts.push(conflict);
                continue;
            }
        };

        let Some(index) = find_row(rows, item) else {
            outcome.conflicts.push(format!(
                "{} {}: request not found (changed or removed in the meantime)",
                item.employee_id, item.date
            ));
            continue;
        };

        let current = rows[index].status();
        if current != action.required_status() {
            outcome.conflicts.push(format!(
                "{} {}: currently {current}, skipped",
                item.employee_id, item.date
            ));
            continue;
        }

        let old_label = current.label();
        match action {
            Action::Approve => {
                let row = &mut rows[index];
                row.set_status(RequestStatus::Approved);
                row.set_decision(approver, Some(now), "");
                audits.push(audit_entry(&rows[index], approver, old_label, RequestStatus::Approved.label(), "", now));
            }
            Action::Reject(reason) => {
                let row = &mut rows[index];
                row.set_status(RequestStatus::Rejected);
                row.set_decision(approver, Some(now), &reason);
                audits.push(audit_entry(&rows[index], approver, old_label, RequestStatus::Rejected.label(), &reason, now));
            }
            Action::Unapprove => {
                let row = &mut rows[index];
                row.set_status(RequestStatus::Pending);
                row.set_decision("", None, "");
                audits.push(audit_entry(&rows[index], approver, old_label, RequestStatus::Pending.label(), "", now));
            }
            Action::Delete => {
                audits.push(audit_entry(&rows[index], approver, old_label, LABEL_DELETED, "", now));
                rows.remove(index);
            }
        }
        outcome.applied += 1;
    }

    (audits, outcome)
}

/// Removes the employee's own Pending leave rows named in `items`, audited
/// under the employee's name with a label distinct from an admin deletion.
pub fn cancel_own_pending(
    rows: &mut Vec<LeaveRequest>,
    employee_id: &str,
    employee_name: &str,
    items: &[CancelItem],
    now: NaiveDateTime,
) -> (Vec<AuditLogEntry>, usize) {
    let mut audits = Vec::new();
    let mut removed = 0;

    for item in items {
        let position = rows.iter().position(|row| {
            row.employee_id == employee_id
                && row.leave_date == item.date
                && row.submission_key() == item.submitted
                && row.status == RequestStatus::Pending
        });
        if let Some(index) = position {
            audits.push(audit_entry(
                &rows[index],
                employee_name,
                RequestStatus::Pending.label(),
                LABEL_SELF_CANCELLED,
                "",
                now,
            ));
            rows.remove(index);
            removed += 1;
        }
    }

    (audits, removed)
}

/// Attendance for a day with a Pending leave request cancels that request.
/// Runs on every clock-in and clock-out so a request can't linger Pending
/// once the employee actually worked the day.
pub fn auto_cancel_pending_leave(
    rows: &mut Vec<LeaveRequest>,
    employee_id: &str,
    date: NaiveDate,
    now: NaiveDateTime,
) -> Vec<AuditLogEntry> {
    let mut audits = Vec::new();
    rows.retain(|row| {
        let hit = row.employee_id == employee_id
            && row.leave_date == date
            && row.status == RequestStatus::Pending;
        if hit {
            audits.push(audit_entry(
                row,
                SYSTEM_ACTOR,
                RequestStatus::Pending.label(),
                LABEL_AUTO_CANCELLED,
                "",
                now,
            ));
        }
        !hit
    });
    audits
}

/// True while a Pending or Approved overtime request already covers
/// (employee, target date); submission must be refused then.
pub fn has_open_overtime(rows: &[OvertimeRequest], employee_id: &str, target_date: NaiveDate) -> bool {
    rows.iter().any(|row| {
        row.employee_id == employee_id
            && row.target_date == target_date
            && matches!(row.status, RequestStatus::Pending | RequestStatus::Approved)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::leave_request::LeaveType;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn ts(y: i32, m: u32, day: u32, h: u32, min: u32) -> NaiveDateTime {
        d(y, m, day).and_hms_opt(h, min, 0).unwrap()
    }

    fn leave(employee_id: &str, leave_date: NaiveDate, submitted_on: NaiveDate) -> LeaveRequest {
        LeaveRequest {
            employee_id: employee_id.to_string(),
            name: format!("Employee {employee_id}"),
            submitted_on,
            leave_date,
            leave_type: LeaveType::ShortNotice,
            note: String::new(),
            status: RequestStatus::Pending,
            approver: String::new(),
            decided_at: None,
            rejection_reason: String::new(),
        }
    }

    fn overtime(employee_id: &str, target: NaiveDate, status: RequestStatus) -> OvertimeRequest {
        OvertimeRequest {
            employee_id: employee_id.to_string(),
            name: format!("Employee {employee_id}"),
            target_date: target,
            submitted_at: ts(2025, 8, 1, 9, 0),
            hours: 2.0,
            reason: "release work".to_string(),
            status,
            approver: String::new(),
            decided_at: None,
            rejection_reason: String::new(),
        }
    }

    fn decision(employee_id: &str, date: NaiveDate, submitted: &str) -> DecisionItem {
        DecisionItem {
            employee_id: employee_id.to_string(),
            date,
            submitted: submitted.to_string(),
            approve: false,
            reject: false,
            unapprove: false,
            delete: false,
            rejection_reason: String::new(),
        }
    }

    #[test]
    fn approve_sets_decision_fields_and_audits_once() {
        let mut rows = vec![leave("1001", d(2025, 8, 12), d(2025, 8, 1))];
        let mut item = decision("1001", d(2025, 8, 12), "2025-08-01");
        item.approve = true;
        let now = ts(2025, 8, 2, 10, 30);

        let (audits, outcome) = apply_decisions(&mut rows, &[item], "Manager", now);

        assert_eq!(outcome.applied, 1);
        assert!(outcome.conflicts.is_empty());
        assert_eq!(rows[0].status, RequestStatus::Approved);
        assert_eq!(rows[0].approver, "Manager");
        assert_eq!(rows[0].decided_at, Some(now));
        assert_eq!(audits.len(), 1);
        assert_eq!(audits[0].old_status, "pending");
        assert_eq!(audits[0].new_status, "approved");
        assert_eq!(audits[0].kind, RequestKind::Leave);
    }

    #[test]
    fn reject_without_reason_changes_nothing() {
        let mut rows = vec![leave("1001", d(2025, 8, 12), d(2025, 8, 1))];
        let mut item = decision("1001", d(2025, 8, 12), "2025-08-01");
        item.reject = true;

        let (audits, outcome) = apply_decisions(&mut rows, &[item], "Manager", ts(2025, 8, 2, 10, 0));

        assert_eq!(outcome.applied, 0);
        assert_eq!(outcome.conflicts.len(), 1);
        assert!(audits.is_empty());
        assert_eq!(rows[0].status, RequestStatus::Pending);
    }

    #[test]
    fn reject_with_reason_records_it() {
        let mut rows = vec![leave("1001", d(2025, 8, 12), d(2025, 8, 1))];
        let mut item = decision("1001", d(2025, 8, 12), "2025-08-01");
        item.reject = true;
        item.rejection_reason = "short staffed that week".to_string();

        let (audits, outcome) = apply_decisions(&mut rows, &[item], "Manager", ts(2025, 8, 2, 10, 0));

        assert_eq!(outcome.applied, 1);
        assert_eq!(rows[0].status, RequestStatus::Rejected);
        assert_eq!(rows[0].rejection_reason, "short staffed that week");
        assert_eq!(audits[0].rejection_reason, "short staffed that week");
    }

    #[test]
    fn unapprove_reopens_and_clears_decision_fields() {
        let mut rows = vec![leave("1001", d(2025, 8, 12), d(2025, 8, 1))];
        rows[0].status = RequestStatus::Approved;
        rows[0].approver = "Manager".to_string();
        rows[0].decided_at = Some(ts(2025, 8, 2, 9, 0));

        let mut item = decision("1001", d(2025, 8, 12), "2025-08-01");
        item.unapprove = true;
        let (audits, outcome) = apply_decisions(&mut rows, &[item], "Manager", ts(2025, 8, 3, 9, 0));

        assert_eq!(outcome.applied, 1);
        assert_eq!(rows[0].status, RequestStatus::Pending);
        assert!(rows[0].approver.is_empty());
        assert_eq!(rows[0].decided_at, None);
        assert_eq!(audits[0].new_status, "pending");
    }

    #[test]
    fn rejected_rows_have_no_way_back() {
        let mut rows = vec![leave("1001", d(2025, 8, 12), d(2025, 8, 1))];
        rows[0].status = RequestStatus::Rejected;

        let mut item = decision("1001", d(2025, 8, 12), "2025-08-01");
        item.unapprove = true;
        let (audits, outcome) = apply_decisions(&mut rows, &[item], "Manager", ts(2025, 8, 3, 9, 0));

        assert_eq!(outcome.applied, 0);
        assert_eq!(outcome.conflicts.len(), 1);
        assert!(audits.is_empty());
        assert_eq!(rows[0].status, RequestStatus::Rejected);
    }

    #[test]
    fn multiple_flags_on_one_row_conflict_but_others_proceed() {
        let mut rows = vec![
            leave("1001", d(2025, 8, 12), d(2025, 8, 1)),
            leave("1002", d(2025, 8, 13), d(2025, 8, 1)),
        ];
        let mut bad = decision("1001", d(2025, 8, 12), "2025-08-01");
        bad.approve = true;
        bad.delete = true;
        let mut good = decision("1002", d(2025, 8, 13), "2025-08-01");
        good.approve = true;

        let (audits, outcome) =
            apply_decisions(&mut rows, &[bad, good], "Manager", ts(2025, 8, 2, 10, 0));

        assert_eq!(outcome.applied, 1);
        assert_eq!(outcome.conflicts.len(), 1);
        assert_eq!(audits.len(), 1);
        assert_eq!(rows[0].status, RequestStatus::Pending);
        assert_eq!(rows[1].status, RequestStatus::Approved);
    }

    #[test]
    fn stale_view_is_reported_as_conflict() {
        // Admin believed the row was still Pending; another actor approved it.
        let mut rows = vec![leave("1001", d(2025, 8, 12), d(2025, 8, 1))];
        rows[0].status = RequestStatus::Approved;

        let mut item = decision("1001", d(2025, 8, 12), "2025-08-01");
        item.approve = true;
        let (audits, outcome) = apply_decisions(&mut rows, &[item], "Manager", ts(2025, 8, 2, 10, 0));

        assert_eq!(outcome.applied, 0);
        assert!(outcome.conflicts[0].contains("approved"));
        assert!(audits.is_empty());
    }

    #[test]
    fn delete_removes_pending_row_and_audits_it() {
        let mut rows = vec![leave("1001", d(2025, 8, 12), d(2025, 8, 1))];
        let mut item = decision("1001", d(2025, 8, 12), "2025-08-01");
        item.delete = true;

        let (audits, outcome) = apply_decisions(&mut rows, &[item], "Manager", ts(2025, 8, 2, 10, 0));

        assert_eq!(outcome.applied, 1);
        assert!(rows.is_empty());
        assert_eq!(audits[0].new_status, LABEL_DELETED);
        assert_eq!(audits[0].actor, "Manager");
    }

    #[test]
    fn self_cancel_only_touches_own_pending_rows() {
        let mut rows = vec![
            leave("1001", d(2025, 8, 12), d(2025, 8, 1)),
            leave("1002", d(2025, 8, 12), d(2025, 8, 1)),
        ];
        rows[0].status = RequestStatus::Approved;

        let items = vec![
            CancelItem { date: d(2025, 8, 12), submitted: "2025-08-01".to_string() },
        ];
        let (audits, removed) =
            cancel_own_pending(&mut rows, "1001", "Employee 1001", &items, ts(2025, 8, 2, 8, 0));

        // The employee's own row is Approved, so nothing may be cancelled.
        assert_eq!(removed, 0);
        assert!(audits.is_empty());
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn self_cancel_audits_under_own_name() {
        let mut rows = vec![leave("1001", d(2025, 8, 12), d(2025, 8, 1))];
        let items = vec![
            CancelItem { date: d(2025, 8, 12), submitted: "2025-08-01".to_string() },
        ];
        let (audits, removed) =
            cancel_own_pending(&mut rows, "1001", "Employee 1001", &items, ts(2025, 8, 2, 8, 0));

        assert_eq!(removed, 1);
        assert!(rows.is_empty());
        assert_eq!(audits[0].actor, "Employee 1001");
        assert_eq!(audits[0].new_status, LABEL_SELF_CANCELLED);
    }

    #[test]
    fn attendance_auto_cancels_pending_leave_with_system_actor() {
        let mut rows = vec![
            leave("1001", d(2025, 8, 12), d(2025, 8, 1)),
            leave("1001", d(2025, 8, 13), d(2025, 8, 1)),
        ];
        let audits =
            auto_cancel_pending_leave(&mut rows, "1001", d(2025, 8, 12), ts(2025, 8, 12, 8, 55));

        assert_eq!(audits.len(), 1);
        assert_eq!(audits[0].actor, SYSTEM_ACTOR);
        assert_eq!(audits[0].new_status, LABEL_AUTO_CANCELLED);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].leave_date, d(2025, 8, 13));
    }

    #[test]
    fn auto_cancel_skips_decided_requests() {
        let mut rows = vec![leave("1001", d(2025, 8, 12), d(2025, 8, 1))];
        rows[0].status = RequestStatus::Approved;

        let audits =
            auto_cancel_pending_leave(&mut rows, "1001", d(2025, 8, 12), ts(2025, 8, 12, 8, 55));

        assert!(audits.is_empty());
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn open_overtime_blocks_duplicates_until_rejected() {
        let rows = vec![overtime("1001", d(2025, 8, 12), RequestStatus::Pending)];
        assert!(has_open_overtime(&rows, "1001", d(2025, 8, 12)));
        assert!(!has_open_overtime(&rows, "1001", d(2025, 8, 13)));
        assert!(!has_open_overtime(&rows, "1002", d(2025, 8, 12)));

        let rows = vec![overtime("1001", d(2025, 8, 12), RequestStatus::Approved)];
        assert!(has_open_overtime(&rows, "1001", d(2025, 8, 12)));

        let rows = vec![overtime("1001", d(2025, 8, 12), RequestStatus::Rejected)];
        assert!(!has_open_overtime(&rows, "1001", d(2025, 8, 12)));
    }

    #[test]
    fn overtime_decisions_share_the_same_machine() {
        let mut rows = vec![overtime("1001", d(2025, 8, 12), RequestStatus::Pending)];
        let mut item = decision("1001", d(2025, 8, 12), "2025-08-01T09:00:00");
        item.approve = true;

        let (audits, outcome) = apply_decisions(&mut rows, &[item], "Manager", ts(2025, 8, 2, 10, 0));

        assert_eq!(outcome.applied, 1);
        assert_eq!(rows[0].status, RequestStatus::Approved);
        assert_eq!(audits[0].kind, RequestKind::Overtime);
    }
}
