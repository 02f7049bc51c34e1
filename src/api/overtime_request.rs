use actix_web::{HttpResponse, Responder, web};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::{IntoParams, ToSchema};

use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::db::Store;
use crate::lifecycle::{self, DecisionBatch, DecisionOutcome};
use crate::model::overtime_request::OvertimeRequest;
use crate::model::status::RequestStatus;
use crate::period;
use super::internal;
use crate::store::sanitize_cell;

#[derive(Deserialize, ToSchema)]
pub struct CreateOvertime {
    #[schema(example = "2025-08-12", format = "date", value_type = String)]
    pub target_date: NaiveDate,
    /// Requested overtime in hours, e.g. 1.5.
    #[schema(example = 1.5)]
    pub hours: f64,
    #[schema(example = "month-end closing")]
    pub reason: String,
}

#[derive(Deserialize, IntoParams)]
pub struct OvertimeFilter {
    /// Closing month 1..=12; defaults to the cycle today falls in.
    pub month: Option<u32>,
    pub status: Option<RequestStatus>,
    /// Admin only: another employee's requests.
    pub employee_id: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct OvertimeResponse {
    #[schema(example = "1001")]
    pub employee_id: String,
    pub name: String,
    #[schema(value_type = String, format = "date")]
    pub target_date: NaiveDate,
    #[schema(value_type = String, format = "date-time")]
    pub submitted_at: NaiveDateTime,
    pub hours: f64,
    pub reason: String,
    pub status: RequestStatus,
    pub approver: String,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub decided_at: Option<NaiveDateTime>,
    pub rejection_reason: String,
}

impl From<OvertimeRequest> for OvertimeResponse {
    fn from(r: OvertimeRequest) -> Self {
        Self {
            employee_id: r.employee_id,
            name: r.name,
            target_date: r.target_date,
            submitted_at: r.submitted_at,
            hours: r.hours,
            reason: r.reason,
            status: r.status,
            approver: r.approver,
            decided_at: r.decided_at,
            rejection_reason: r.rejection_reason,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct OvertimeListResponse {
    #[schema(value_type = String, format = "date")]
    pub period_start: NaiveDate,
    #[schema(value_type = String, format = "date")]
    pub period_end: NaiveDate,
    pub data: Vec<OvertimeResponse>,
}

/// Submit an overtime request. At most one open (pending or approved)
/// request may exist per target date; duplicates are refused outright and
/// never persisted.
#[utoipa::path(
    post,
    path = "/api/v1/overtime",
    request_body = CreateOvertime,
    responses(
        (status = 200, description = "Request recorded as pending"),
        (status = 400, description = "Invalid hours or empty reason"),
        (status = 409, description = "An open request already covers this date", body = Object, example = json!({
            "message": "An overtime request for this date is already pending or approved"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Overtime"
)]
pub async fn create_overtime(
    auth: AuthUser,
    store: web::Data<Store>,
    config: web::Data<Config>,
    payload: web::Json<CreateOvertime>,
) -> actix_web::Result<impl Responder> {
    if auth.is_admin() {
        return Err(actix_web::error::ErrorForbidden(
            "Admins do not file overtime",
        ));
    }

    if !payload.hours.is_finite() || payload.hours <= 0.0 || payload.hours > 24.0 {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "hours must be a positive number of hours within one day"
        })));
    }
    if payload.reason.trim().is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "A reason is required"
        })));
    }

    let request = OvertimeRequest {
        employee_id: auth.employee_id.clone(),
        name: auth.name.clone(),
        target_date: payload.target_date,
        submitted_at: config.now(),
        hours: payload.hours,
        reason: sanitize_cell(payload.reason.trim()),
        status: RequestStatus::Pending,
        approver: String::new(),
        decided_at: None,
        rejection_reason: String::new(),
    };

    // The duplicate check runs against the freshly re-read table, inside the
    // same locked cycle that inserts the row.
    let inserted = store
        .overtime_requests
        .update(|rows| {
            if lifecycle::has_open_overtime(rows, &auth.employee_id, payload.target_date) {
                false
            } else {
                rows.push(request);
                true
            }
        })
        .map_err(internal("create overtime: update"))?;

    if !inserted {
        return Ok(HttpResponse::Conflict().json(json!({
            "message": "An overtime request for this date is already pending or approved"
        })));
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "Overtime request submitted",
        "status": "pending"
    })))
}

/// Requests whose target date falls in the selected closing month.
#[utoipa::path(
    get,
    path = "/api/v1/overtime",
    params(OvertimeFilter),
    responses(
        (status = 200, description = "Requests in the period", body = OvertimeListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Overtime"
)]
pub async fn overtime_list(
    auth: AuthUser,
    store: web::Data<Store>,
    config: web::Data<Config>,
    query: web::Query<OvertimeFilter>,
) -> actix_web::Result<impl Responder> {
    let today = config.today();
    let month = query.month.unwrap_or_else(|| period::anchor_month(today));
    if !(1..=12).contains(&month) {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "month must be between 1 and 12"
        })));
    }
    let period = period::resolve_period(month, today);

    let target_id = if auth.is_admin() {
        query.employee_id.clone()
    } else {
        Some(auth.employee_id.clone())
    };

    let mut rows: Vec<OvertimeRequest> = store
        .overtime_requests
        .load()
        .map_err(internal("overtime list: read"))?
        .into_iter()
        .filter(|r| period.contains(r.target_date))
        .filter(|r| target_id.as_deref().is_none_or(|id| r.employee_id == id))
        .filter(|r| query.status.is_none_or(|s| r.status == s))
        .collect();
    rows.sort_by(|a, b| {
        (a.target_date, &a.employee_id, a.submitted_at)
            .cmp(&(b.target_date, &b.employee_id, b.submitted_at))
    });

    Ok(HttpResponse::Ok().json(OvertimeListResponse {
        period_start: period.start,
        period_end: period.end,
        data: rows.into_iter().map(OvertimeResponse::from).collect(),
    }))
}

/// Admin decision batch over overtime requests; same machine and same
/// conflict semantics as leave.
#[utoipa::path(
    post,
    path = "/api/v1/overtime/decisions",
    request_body = DecisionBatch,
    responses(
        (status = 200, description = "Batch outcome", body = DecisionOutcome),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Overtime"
)]
pub async fn decide_overtime(
    auth: AuthUser,
    store: web::Data<Store>,
    config: web::Data<Config>,
    payload: web::Json<DecisionBatch>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let now = config.now();
    let (audits, outcome) = store
        .overtime_requests
        .update(|rows| lifecycle::apply_decisions(rows, &payload.decisions, &auth.name, now))
        .map_err(internal("decide overtime: update"))?;
    store
        .audit_log
        .append(&audits)
        .map_err(internal("decide overtime: append audit log"))?;

    tracing::info!(
        approver = %auth.name,
        applied = outcome.applied,
        conflicts = outcome.conflicts.len(),
        "Overtime decision batch processed"
    );

    Ok(HttpResponse::Ok().json(outcome))
}
