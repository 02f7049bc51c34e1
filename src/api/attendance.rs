use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::{IntoParams, ToSchema};

use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::db::Store;
use crate::lifecycle;
use crate::model::attendance::AttendanceRecord;
use crate::model::status::RequestStatus;
use crate::period::{self, PayPeriod};
use crate::store::sanitize_cell;
use super::internal;
use crate::worktime;

#[derive(Deserialize, ToSchema)]
pub struct PunchRequest {
    /// Defaults to today (in the configured reference timezone).
    #[schema(value_type = Option<String>, format = "date", example = "2025-08-12")]
    pub date: Option<NaiveDate>,
    /// Browser-captured coordinates, passed through as opaque text.
    #[serde(default)]
    pub latitude: String,
    #[serde(default)]
    pub longitude: String,
}

#[derive(Deserialize, IntoParams)]
pub struct AttendanceQuery {
    /// Closing month 1..=12; defaults to the cycle today falls in.
    pub month: Option<u32>,
    /// Admin only: inspect another employee's rows.
    pub employee_id: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct AttendanceRow {
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    pub clock_in: String,
    pub clock_out: String,
    pub latitude: String,
    pub longitude: String,
    pub worked_hours: f64,
    pub overtime_hours: f64,
}

#[derive(Serialize, ToSchema)]
pub struct AttendanceListResponse {
    pub employee_id: String,
    pub name: String,
    #[schema(value_type = String, format = "date")]
    pub period_start: NaiveDate,
    #[schema(value_type = String, format = "date")]
    pub period_end: NaiveDate,
    pub data: Vec<AttendanceRow>,
    pub total_worked_hours: f64,
    pub total_overtime_hours: f64,
}

#[derive(Deserialize, ToSchema)]
pub struct EditTimesRequest {
    /// "HH:MM" or empty to leave the punch absent.
    #[serde(default)]
    pub clock_in: String,
    #[serde(default)]
    pub clock_out: String,
}

#[derive(Deserialize, ToSchema)]
pub struct DeleteDatesRequest {
    #[schema(value_type = Vec<String>, example = json!(["2025-08-12"]))]
    pub dates: Vec<NaiveDate>,
}

#[derive(Deserialize, ToSchema)]
pub struct AdminEditRow {
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    #[serde(default)]
    pub clock_in: String,
    #[serde(default)]
    pub clock_out: String,
}

#[derive(Deserialize, ToSchema)]
pub struct AdminEditRequest {
    pub rows: Vec<AdminEditRow>,
}

enum PunchKind {
    In,
    Out,
}

async fn punch(
    kind: PunchKind,
    auth: AuthUser,
    store: web::Data<Store>,
    config: web::Data<Config>,
    payload: web::Json<PunchRequest>,
) -> actix_web::Result<HttpResponse> {
    if auth.is_admin() {
        return Err(actix_web::error::ErrorForbidden(
            "Admins edit rows instead of punching",
        ));
    }

    let today = config.today();
    let date = payload.date.unwrap_or(today);
    let past_limit = config.past_edit_limit(today);
    if date > today || date < past_limit {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": format!("Date outside the editable window {past_limit} to {today}")
        })));
    }

    // An approved leave day cannot be punched; the admin has to intervene.
    let leaves = store
        .leave_requests
        .load()
        .map_err(internal("punch: read leave requests"))?;
    let approved_leave = leaves.iter().any(|l| {
        l.employee_id == auth.employee_id
            && l.leave_date == date
            && l.status == RequestStatus::Approved
    });
    if approved_leave {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "This date has an approved leave; contact an administrator"
        })));
    }

    let now = config.now();
    let time = now.format("%H:%M").to_string();
    let latitude = sanitize_cell(payload.latitude.trim());
    let longitude = sanitize_cell(payload.longitude.trim());

    store
        .attendance
        .update(|rows| {
            let existing = rows
                .iter_mut()
                .find(|r| r.employee_id == auth.employee_id && r.date == date);
            match existing {
                Some(row) => match kind {
                    PunchKind::In => {
                        row.clock_in = time.clone();
                        row.latitude = latitude.clone();
                        row.longitude = longitude.clone();
                    }
                    PunchKind::Out => {
                        row.clock_out = time.clone();
                        // Keep clock-in coordinates unless the clock-out
                        // actually brought new ones.
                        if !latitude.is_empty() && !longitude.is_empty() {
                            row.latitude = latitude.clone();
                            row.longitude = longitude.clone();
                        }
                    }
                },
                None => {
                    let mut row = AttendanceRecord::new(&auth.employee_id, &auth.name, date);
                    match kind {
                        PunchKind::In => row.clock_in = time.clone(),
                        PunchKind::Out => row.clock_out = time.clone(),
                    }
                    row.latitude = latitude.clone();
                    row.longitude = longitude.clone();
                    rows.push(row);
                }
            }
        })
        .map_err(internal("punch: write attendance"))?;

    // Working the day cancels any still-pending leave request for it.
    let audits = store
        .leave_requests
        .update(|rows| lifecycle::auto_cancel_pending_leave(rows, &auth.employee_id, date, now))
        .map_err(internal("punch: auto-cancel leave"))?;
    let auto_cancelled = audits.len();
    store
        .audit_log
        .append(&audits)
        .map_err(internal("punch: append audit log"))?;

    if auto_cancelled > 0 {
        tracing::info!(
            employee_id = %auth.employee_id,
            %date,
            auto_cancelled,
            "Pending leave auto-cancelled by attendance"
        );
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": match kind {
            PunchKind::In => "Clocked in",
            PunchKind::Out => "Clocked out",
        },
        "date": date,
        "time": time,
        "auto_cancelled_leave": auto_cancelled,
    })))
}

/// Clock-in endpoint
#[utoipa::path(
    post,
    path = "/api/v1/attendance/clock-in",
    request_body = PunchRequest,
    responses(
        (status = 200, description = "Clocked in", body = Object, example = json!({
            "message": "Clocked in", "date": "2025-08-12", "time": "08:55", "auto_cancelled_leave": 0
        })),
        (status = 400, description = "Date outside window or approved leave day"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn clock_in(
    auth: AuthUser,
    store: web::Data<Store>,
    config: web::Data<Config>,
    payload: web::Json<PunchRequest>,
) -> actix_web::Result<impl Responder> {
    punch(PunchKind::In, auth, store, config, payload).await
}

/// Clock-out endpoint
#[utoipa::path(
    post,
    path = "/api/v1/attendance/clock-out",
    request_body = PunchRequest,
    responses(
        (status = 200, description = "Clocked out"),
        (status = 400, description = "Date outside window or approved leave day"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn clock_out(
    auth: AuthUser,
    store: web::Data<Store>,
    config: web::Data<Config>,
    payload: web::Json<PunchRequest>,
) -> actix_web::Result<impl Responder> {
    punch(PunchKind::Out, auth, store, config, payload).await
}

fn selected_period(month: Option<u32>, today: NaiveDate) -> Result<PayPeriod, HttpResponse> {
    let month = month.unwrap_or_else(|| period::anchor_month(today));
    if !(1..=12).contains(&month) {
        return Err(HttpResponse::BadRequest().json(json!({
            "message": "month must be between 1 and 12"
        })));
    }
    Ok(period::resolve_period(month, today))
}

/// One employee's rows for a closing month, with derived hours per day.
#[utoipa::path(
    get,
    path = "/api/v1/attendance",
    params(AttendanceQuery),
    responses(
        (status = 200, description = "Rows in the selected period", body = AttendanceListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn list_attendance(
    auth: AuthUser,
    store: web::Data<Store>,
    config: web::Data<Config>,
    query: web::Query<AttendanceQuery>,
) -> actix_web::Result<impl Responder> {
    let target_id = match &query.employee_id {
        Some(id) if id != &auth.employee_id => {
            auth.require_admin()?;
            id.clone()
        }
        _ => auth.employee_id.clone(),
    };

    let period = match selected_period(query.month, config.today()) {
        Ok(p) => p,
        Err(resp) => return Ok(resp),
    };

    let employees = store
        .employees
        .load()
        .map_err(internal("list attendance: read employee master"))?;
    let master = employees.iter().find(|e| e.employee_id == target_id);
    let department = master.map(|e| e.department.clone()).unwrap_or_default();

    let mut rows: Vec<AttendanceRecord> = store
        .attendance
        .load()
        .map_err(internal("list attendance: read attendance"))?
        .into_iter()
        .filter(|r| r.employee_id == target_id && period.contains(r.date))
        .collect();
    rows.sort_by_key(|r| r.date);

    let name = master
        .map(|e| e.name.clone())
        .or_else(|| rows.first().map(|r| r.name.clone()))
        .unwrap_or_default();

    let mut total_worked = 0.0;
    let mut total_overtime = 0.0;
    let data: Vec<AttendanceRow> = rows
        .into_iter()
        .map(|r| {
            let hours = worktime::work_and_overtime(
                r.clock_in_time(),
                r.clock_out_time(),
                &department,
                &config.fixed_shift_department,
            );
            total_worked += hours.worked;
            total_overtime += hours.overtime;
            AttendanceRow {
                date: r.date,
                clock_in: r.clock_in,
                clock_out: r.clock_out,
                latitude: r.latitude,
                longitude: r.longitude,
                worked_hours: hours.worked,
                overtime_hours: hours.overtime,
            }
        })
        .collect();

    Ok(HttpResponse::Ok().json(AttendanceListResponse {
        employee_id: target_id,
        name,
        period_start: period.start,
        period_end: period.end,
        data,
        total_worked_hours: (total_worked * 100.0).round() / 100.0,
        total_overtime_hours: (total_overtime * 100.0).round() / 100.0,
    }))
}

/// Employee correction of their own punch times for one day. Limited to the
/// currently open closing period.
#[utoipa::path(
    put,
    path = "/api/v1/attendance/{date}",
    params(("date" = String, Path, description = "Date of the row to edit, YYYY-MM-DD")),
    request_body = EditTimesRequest,
    responses(
        (status = 200, description = "Row updated"),
        (status = 400, description = "Malformed time or date outside the open period"),
        (status = 404, description = "No row for that date"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn edit_own_times(
    auth: AuthUser,
    store: web::Data<Store>,
    config: web::Data<Config>,
    path: web::Path<NaiveDate>,
    payload: web::Json<EditTimesRequest>,
) -> actix_web::Result<impl Responder> {
    let date = path.into_inner();
    let today = config.today();
    let open = period::resolve_open_period(today);
    if !open.contains(date) || date > today {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": format!("Only days of the open period {} to {today} can be edited", open.start)
        })));
    }

    let clock_in = payload.clock_in.trim().to_string();
    let clock_out = payload.clock_out.trim().to_string();
    let mut errors = Vec::new();
    if !clock_in.is_empty() && !worktime::is_hhmm(&clock_in) {
        errors.push(format!("clock_in is not HH:MM: {clock_in}"));
    }
    if !clock_out.is_empty() && !worktime::is_hhmm(&clock_out) {
        errors.push(format!("clock_out is not HH:MM: {clock_out}"));
    }
    if !errors.is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({ "errors": errors })));
    }

    let found = store
        .attendance
        .update(|rows| {
            let row = rows
                .iter_mut()
                .find(|r| r.employee_id == auth.employee_id && r.date == date);
            match row {
                Some(row) => {
                    row.clock_in = clock_in.clone();
                    row.clock_out = clock_out.clone();
                    true
                }
                None => false,
            }
        })
        .map_err(internal("self edit: write attendance"))?;

    if !found {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "No attendance row for that date"
        })));
    }

    Ok(HttpResponse::Ok().json(json!({ "message": "Row updated" })))
}

/// Employee deletion of their own rows.
#[utoipa::path(
    delete,
    path = "/api/v1/attendance",
    request_body = DeleteDatesRequest,
    responses(
        (status = 200, description = "Rows removed"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn delete_own_rows(
    auth: AuthUser,
    store: web::Data<Store>,
    config: web::Data<Config>,
    payload: web::Json<DeleteDatesRequest>,
) -> actix_web::Result<impl Responder> {
    let today = config.today();
    let open = period::resolve_open_period(today);

    let removed = store
        .attendance
        .update(|rows| {
            let before = rows.len();
            rows.retain(|r| {
                !(r.employee_id == auth.employee_id
                    && payload.dates.contains(&r.date)
                    && open.contains(r.date))
            });
            before - rows.len()
        })
        .map_err(internal("self delete: write attendance"))?;

    Ok(HttpResponse::Ok().json(json!({ "removed": removed })))
}

/// Admin batch edit of one employee's rows. Malformed times are collected per
/// row; valid rows are still applied. Rows for new dates are created.
#[utoipa::path(
    put,
    path = "/api/v1/attendance/employees/{employee_id}",
    params(("employee_id" = String, Path, description = "Employee whose rows to edit")),
    request_body = AdminEditRequest,
    responses(
        (status = 200, description = "Valid rows applied", body = Object, example = json!({
            "applied": 2, "errors": ["2025-08-03: clock_in is not HH:MM: 26:00"]
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Unknown employee")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn admin_edit_rows(
    auth: AuthUser,
    store: web::Data<Store>,
    path: web::Path<String>,
    payload: web::Json<AdminEditRequest>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    let employee_id = path.into_inner();

    let employees = store
        .employees
        .load()
        .map_err(internal("admin edit: read employee master"))?;
    let Some(employee) = employees.iter().find(|e| e.employee_id == employee_id) else {
        return Ok(HttpResponse::NotFound().json(json!({ "message": "Unknown employee" })));
    };
    let name = employee.name.clone();

    let mut errors = Vec::new();
    let mut valid = Vec::new();
    for row in &payload.rows {
        let clock_in = row.clock_in.trim().to_string();
        let clock_out = row.clock_out.trim().to_string();
        let mut row_errors = Vec::new();
        if !clock_in.is_empty() && !worktime::is_hhmm(&clock_in) {
            row_errors.push(format!("{}: clock_in is not HH:MM: {clock_in}", row.date));
        }
        if !clock_out.is_empty() && !worktime::is_hhmm(&clock_out) {
            row_errors.push(format!("{}: clock_out is not HH:MM: {clock_out}", row.date));
        }
        if row_errors.is_empty() {
            valid.push((row.date, clock_in, clock_out));
        } else {
            errors.extend(row_errors);
        }
    }

    let applied = store
        .attendance
        .update(|rows| {
            let mut applied = 0;
            for (date, clock_in, clock_out) in &valid {
                let existing = rows
                    .iter_mut()
                    .find(|r| r.employee_id == employee_id && r.date == *date);
                match existing {
                    Some(row) => {
                        if !clock_in.is_empty() {
                            row.clock_in = clock_in.clone();
                        }
                        if !clock_out.is_empty() {
                            row.clock_out = clock_out.clone();
                        }
                    }
                    None => {
                        let mut row = AttendanceRecord::new(&employee_id, &name, *date);
                        row.clock_in = clock_in.clone();
                        row.clock_out = clock_out.clone();
                        rows.push(row);
                    }
                }
                applied += 1;
            }
            applied
        })
        .map_err(internal("admin edit: write attendance"))?;

    Ok(HttpResponse::Ok().json(json!({ "applied": applied, "errors": errors })))
}

/// Admin batch delete of one employee's rows.
#[utoipa::path(
    delete,
    path = "/api/v1/attendance/employees/{employee_id}",
    params(("employee_id" = String, Path, description = "Employee whose rows to delete")),
    request_body = DeleteDatesRequest,
    responses(
        (status = 200, description = "Rows removed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn admin_delete_rows(
    auth: AuthUser,
    store: web::Data<Store>,
    path: web::Path<String>,
    payload: web::Json<DeleteDatesRequest>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    let employee_id = path.into_inner();

    let removed = store
        .attendance
        .update(|rows| {
            let before = rows.len();
            rows.retain(|r| !(r.employee_id == employee_id && payload.dates.contains(&r.date)));
            before - rows.len()
        })
        .map_err(internal("admin delete: write attendance"))?;

    Ok(HttpResponse::Ok().json(json!({ "removed": removed })))
}
