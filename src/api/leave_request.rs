use actix_web::{HttpResponse, Responder, web};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::{IntoParams, ToSchema};

use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::db::Store;
use crate::lifecycle::{self, CancelItem, DecisionBatch, DecisionOutcome};
use crate::model::leave_request::{LeaveRequest, LeaveType};
use crate::model::status::RequestStatus;
use crate::period;
use super::internal;
use crate::store::sanitize_cell;

#[derive(Deserialize, ToSchema)]
pub struct CreateLeave {
    #[schema(example = "2025-08-12", format = "date", value_type = String)]
    pub leave_date: NaiveDate,
    #[schema(example = "short_notice")]
    pub leave_type: LeaveType,
    /// Required for `other`, optional otherwise.
    #[serde(default)]
    pub note: String,
}

#[derive(Deserialize, IntoParams)]
pub struct LeaveFilter {
    /// Closing month 1..=12; defaults to the cycle today falls in.
    pub month: Option<u32>,
    /// Filter by request status.
    pub status: Option<RequestStatus>,
    /// Admin only: another employee's requests.
    pub employee_id: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct LeaveResponse {
    #[schema(example = "1001")]
    pub employee_id: String,
    pub name: String,
    #[schema(value_type = String, format = "date")]
    pub submitted_on: NaiveDate,
    #[schema(value_type = String, format = "date")]
    pub leave_date: NaiveDate,
    pub leave_type: LeaveType,
    pub note: String,
    pub status: RequestStatus,
    pub approver: String,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub decided_at: Option<NaiveDateTime>,
    pub rejection_reason: String,
}

impl From<LeaveRequest> for LeaveResponse {
    fn from(r: LeaveRequest) -> Self {
        Self {
            employee_id: r.employee_id,
            name: r.name,
            submitted_on: r.submitted_on,
            leave_date: r.leave_date,
            leave_type: r.leave_type,
            note: r.note,
            status: r.status,
            approver: r.approver,
            decided_at: r.decided_at,
            rejection_reason: r.rejection_reason,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct LeaveListResponse {
    #[schema(value_type = String, format = "date")]
    pub period_start: NaiveDate,
    #[schema(value_type = String, format = "date")]
    pub period_end: NaiveDate,
    pub data: Vec<LeaveResponse>,
}

#[derive(Deserialize, ToSchema)]
pub struct CancelBatch {
    pub items: Vec<CancelItem>,
}

/* =========================
Submit leave request
========================= */
#[utoipa::path(
    post,
    path = "/api/v1/leave",
    request_body = CreateLeave,
    responses(
        (status = 200, description = "Request recorded as pending", body = Object, example = json!({
            "message": "Leave request submitted", "status": "pending"
        })),
        (status = 400, description = "Past date or missing note"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn create_leave(
    auth: AuthUser,
    store: web::Data<Store>,
    config: web::Data<Config>,
    payload: web::Json<CreateLeave>,
) -> actix_web::Result<impl Responder> {
    if auth.is_admin() {
        return Err(actix_web::error::ErrorForbidden("Admins do not file leave"));
    }

    let today = config.today();
    if payload.leave_date < today {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "leave_date cannot be in the past"
        })));
    }
    if payload.leave_type == LeaveType::Other && payload.note.trim().is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "A note is required for leave type 'other'"
        })));
    }

    let request = LeaveRequest {
        employee_id: auth.employee_id.clone(),
        name: auth.name.clone(),
        submitted_on: today,
        leave_date: payload.leave_date,
        leave_type: payload.leave_type,
        note: sanitize_cell(payload.note.trim()),
        status: RequestStatus::Pending,
        approver: String::new(),
        decided_at: None,
        rejection_reason: String::new(),
    };

    store
        .leave_requests
        .append(std::slice::from_ref(&request))
        .map_err(internal("create leave: append"))?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Leave request submitted",
        "status": "pending"
    })))
}

/* =========================
List leave requests
========================= */
#[utoipa::path(
    get,
    path = "/api/v1/leave",
    params(LeaveFilter),
    responses(
        (status = 200, description = "Requests whose leave date falls in the period", body = LeaveListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn leave_list(
    auth: AuthUser,
    store: web::Data<Store>,
    config: web::Data<Config>,
    query: web::Query<LeaveFilter>,
) -> actix_web::Result<impl Responder> {
    let today = config.today();
    let month = query.month.unwrap_or_else(|| period::anchor_month(today));
    if !(1..=12).contains(&month) {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "month must be between 1 and 12"
        })));
    }
    let period = period::resolve_period(month, today);

    // Employees only ever see their own requests.
    let target_id = if auth.is_admin() {
        query.employee_id.clone()
    } else {
        Some(auth.employee_id.clone())
    };

    let mut rows: Vec<LeaveRequest> = store
        .leave_requests
        .load()
        .map_err(internal("leave list: read"))?
        .into_iter()
        .filter(|r| period.contains(r.leave_date))
        .filter(|r| target_id.as_deref().is_none_or(|id| r.employee_id == id))
        .filter(|r| query.status.is_none_or(|s| r.status == s))
        .collect();
    rows.sort_by(|a, b| {
        (a.leave_date, &a.employee_id, a.submitted_on)
            .cmp(&(b.leave_date, &b.employee_id, b.submitted_on))
    });

    Ok(HttpResponse::Ok().json(LeaveListResponse {
        period_start: period.start,
        period_end: period.end,
        data: rows.into_iter().map(LeaveResponse::from).collect(),
    }))
}

/* =========================
Decide leave requests (admin batch)
========================= */
/// Applies a batch of approve/reject/un-approve/delete decisions. Rows whose
/// precondition no longer holds are reported back as conflicts; the rest of
/// the batch still applies.
#[utoipa::path(
    post,
    path = "/api/v1/leave/decisions",
    request_body = DecisionBatch,
    responses(
        (status = 200, description = "Batch outcome", body = DecisionOutcome),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn decide_leave(
    auth: AuthUser,
    store: web::Data<Store>,
    config: web::Data<Config>,
    payload: web::Json<DecisionBatch>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let now = config.now();
    let (audits, outcome) = store
        .leave_requests
        .update(|rows| lifecycle::apply_decisions(rows, &payload.decisions, &auth.name, now))
        .map_err(internal("decide leave: update"))?;
    store
        .audit_log
        .append(&audits)
        .map_err(internal("decide leave: append audit log"))?;

    tracing::info!(
        approver = %auth.name,
        applied = outcome.applied,
        conflicts = outcome.conflicts.len(),
        "Leave decision batch processed"
    );

    Ok(HttpResponse::Ok().json(outcome))
}

/* =========================
Cancel own pending requests
========================= */
#[utoipa::path(
    post,
    path = "/api/v1/leave/cancel",
    request_body = CancelBatch,
    responses(
        (status = 200, description = "Own pending requests cancelled", body = Object, example = json!({
            "cancelled": 1
        })),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn cancel_leave(
    auth: AuthUser,
    store: web::Data<Store>,
    config: web::Data<Config>,
    payload: web::Json<CancelBatch>,
) -> actix_web::Result<impl Responder> {
    let now = config.now();
    let (audits, cancelled) = store
        .leave_requests
        .update(|rows| {
            lifecycle::cancel_own_pending(rows, &auth.employee_id, &auth.name, &payload.items, now)
        })
        .map_err(internal("cancel leave: update"))?;
    store
        .audit_log
        .append(&audits)
        .map_err(internal("cancel leave: append audit log"))?;

    Ok(HttpResponse::Ok().json(json!({ "cancelled": cancelled })))
}
