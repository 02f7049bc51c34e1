use std::collections::BTreeMap;

use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::{IntoParams, ToSchema};

use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::db::Store;
use crate::model::employee::Employee;
use crate::period;
use super::internal;
use crate::worktime;

#[derive(Deserialize, IntoParams)]
pub struct ReportQuery {
    /// Closing month 1..=12; defaults to the cycle today falls in.
    pub month: Option<u32>,
}

#[derive(Serialize, ToSchema)]
pub struct EmployeeSummary {
    pub employee_id: String,
    pub name: String,
    pub department: String,
    /// Days in the period with at least one punch.
    pub days: usize,
    pub worked_hours: f64,
    pub overtime_hours: f64,
}

#[derive(Serialize, ToSchema)]
pub struct MonthlyReportResponse {
    #[schema(value_type = String, format = "date")]
    pub period_start: NaiveDate,
    #[schema(value_type = String, format = "date")]
    pub period_end: NaiveDate,
    pub data: Vec<EmployeeSummary>,
}

#[derive(Serialize)]
struct ReportCsvRow {
    employee_id: String,
    name: String,
    department: String,
    date: NaiveDate,
    clock_in: String,
    clock_out: String,
    worked_hours: f64,
    overtime_hours: f64,
}

fn round2(hours: f64) -> f64 {
    (hours * 100.0).round() / 100.0
}

fn master_lookup(employees: &[Employee], employee_id: &str) -> (String, String) {
    employees
        .iter()
        .find(|e| e.employee_id == employee_id)
        .map(|e| (e.name.clone(), e.department.clone()))
        .unwrap_or_default()
}

/// Per-employee worked/overtime totals for one closing month.
#[utoipa::path(
    get,
    path = "/api/v1/reports/monthly",
    params(ReportQuery),
    responses(
        (status = 200, description = "Totals per employee", body = MonthlyReportResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn monthly_report(
    auth: AuthUser,
    store: web::Data<Store>,
    config: web::Data<Config>,
    query: web::Query<ReportQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let today = config.today();
    let month = query.month.unwrap_or_else(|| period::anchor_month(today));
    if !(1..=12).contains(&month) {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "month must be between 1 and 12"
        })));
    }
    let period = period::resolve_period(month, today);

    let employees = store
        .employees
        .load()
        .map_err(internal("monthly report: read employee master"))?;
    let attendance = store
        .attendance
        .load()
        .map_err(internal("monthly report: read attendance"))?;

    let mut summaries: BTreeMap<String, EmployeeSummary> = BTreeMap::new();
    for row in attendance
        .iter()
        .filter(|r| period.contains(r.date))
    {
        let (master_name, department) = master_lookup(&employees, &row.employee_id);
        let hours = worktime::work_and_overtime(
            row.clock_in_time(),
            row.clock_out_time(),
            &department,
            &config.fixed_shift_department,
        );
        let entry = summaries
            .entry(row.employee_id.clone())
            .or_insert_with(|| EmployeeSummary {
                employee_id: row.employee_id.clone(),
                name: if master_name.is_empty() {
                    row.name.clone()
                } else {
                    master_name
                },
                department,
                days: 0,
                worked_hours: 0.0,
                overtime_hours: 0.0,
            });
        entry.days += 1;
        entry.worked_hours += hours.worked;
        entry.overtime_hours += hours.overtime;
    }

    let data: Vec<EmployeeSummary> = summaries
        .into_values()
        .map(|mut s| {
            s.worked_hours = round2(s.worked_hours);
            s.overtime_hours = round2(s.overtime_hours);
            s
        })
        .collect();

    Ok(HttpResponse::Ok().json(MonthlyReportResponse {
        period_start: period.start,
        period_end: period.end,
        data,
    }))
}

/// Same period as `/reports/monthly`, day by day, rendered as a CSV download
/// for the payroll spreadsheet.
#[utoipa::path(
    get,
    path = "/api/v1/reports/monthly/csv",
    params(ReportQuery),
    responses(
        (status = 200, description = "CSV attachment, one row per employee-day"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn monthly_report_csv(
    auth: AuthUser,
    store: web::Data<Store>,
    config: web::Data<Config>,
    query: web::Query<ReportQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let today = config.today();
    let month = query.month.unwrap_or_else(|| period::anchor_month(today));
    if !(1..=12).contains(&month) {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "month must be between 1 and 12"
        })));
    }
    let period = period::resolve_period(month, today);

    let employees = store
        .employees
        .load()
        .map_err(internal("monthly csv: read employee master"))?;
    let mut rows = store
        .attendance
        .load()
        .map_err(internal("monthly csv: read attendance"))?;
    rows.retain(|r| period.contains(r.date));
    rows.sort_by(|a, b| (&a.employee_id, a.date).cmp(&(&b.employee_id, b.date)));

    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        let (master_name, department) = master_lookup(&employees, &row.employee_id);
        let hours = worktime::work_and_overtime(
            row.clock_in_time(),
            row.clock_out_time(),
            &department,
            &config.fixed_shift_department,
        );
        writer
            .serialize(ReportCsvRow {
                name: if master_name.is_empty() {
                    row.name.clone()
                } else {
                    master_name
                },
                employee_id: row.employee_id,
                department,
                date: row.date,
                clock_in: row.clock_in,
                clock_out: row.clock_out,
                worked_hours: hours.worked,
                overtime_hours: hours.overtime,
            })
            .map_err(|e| {
                tracing::error!(error = %e, "monthly csv: serialize row");
                actix_web::error::ErrorInternalServerError("Internal Server Error")
            })?;
    }
    let body = writer
        .into_inner()
        .map_err(|e| {
            tracing::error!(error = %e, "monthly csv: flush");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    let file_name = format!("attendance_{}.csv", period.label());
    Ok(HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header((
            "Content-Disposition",
            format!("attachment; filename=\"{file_name}\""),
        ))
        .body(body))
}

/// The caller's own totals for one closing month.
#[utoipa::path(
    get,
    path = "/api/v1/reports/me",
    params(ReportQuery),
    responses(
        (status = 200, description = "Own worked/overtime totals"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn my_summary(
    auth: AuthUser,
    store: web::Data<Store>,
    config: web::Data<Config>,
    query: web::Query<ReportQuery>,
) -> actix_web::Result<impl Responder> {
    let today = config.today();
    let month = query.month.unwrap_or_else(|| period::anchor_month(today));
    if !(1..=12).contains(&month) {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "month must be between 1 and 12"
        })));
    }
    let period = period::resolve_period(month, today);

    let employees = store
        .employees
        .load()
        .map_err(internal("my summary: read employee master"))?;
    let (_, department) = master_lookup(&employees, &auth.employee_id);

    let mut days = 0usize;
    let mut worked = 0.0;
    let mut overtime = 0.0;
    for row in store
        .attendance
        .load()
        .map_err(internal("my summary: read attendance"))?
        .iter()
        .filter(|r| r.employee_id == auth.employee_id && period.contains(r.date))
    {
        let hours = worktime::work_and_overtime(
            row.clock_in_time(),
            row.clock_out_time(),
            &department,
            &config.fixed_shift_department,
        );
        days += 1;
        worked += hours.worked;
        overtime += hours.overtime;
    }

    Ok(HttpResponse::Ok().json(json!({
        "period_start": period.start,
        "period_end": period.end,
        "days": days,
        "worked_hours": round2(worked),
        "overtime_hours": round2(overtime),
    })))
}
