use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;

use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::db::Store;
use super::internal;
use crate::store::backup::{self, RestoreReport};

#[derive(Deserialize, ToSchema)]
pub struct RestoreRequest {
    #[schema(example = "backup_20250801_183000")]
    pub name: String,
    /// Snapshot the current state before overwriting it. On by default.
    #[serde(default = "default_true")]
    pub backup_first: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Deserialize, ToSchema)]
pub struct WipeRequest {
    #[serde(default)]
    pub attendance: bool,
    #[serde(default)]
    pub leave_requests: bool,
    #[serde(default)]
    pub overtime_requests: bool,
    #[serde(default)]
    pub audit_log: bool,
    #[serde(default)]
    pub employees: bool,
    /// Must be the literal string "DELETE".
    pub confirm: String,
}

/// Snapshot all tables into a timestamped directory under backups/.
#[utoipa::path(
    post,
    path = "/api/v1/backups",
    responses(
        (status = 200, description = "Snapshot created", body = Object, example = json!({
            "snapshot": "backup_20250801_183000"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Backup"
)]
pub async fn create_backup(
    auth: AuthUser,
    store: web::Data<Store>,
    config: web::Data<Config>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let name = backup::snapshot(&store, "backup", config.now())
        .map_err(internal("backup: snapshot"))?;
    tracing::info!(snapshot = %name, "Backup snapshot created");

    Ok(HttpResponse::Ok().json(json!({ "snapshot": name })))
}

/// Snapshot names, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/backups",
    responses(
        (status = 200, description = "Available snapshots"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Backup"
)]
pub async fn list_backups(
    auth: AuthUser,
    store: web::Data<Store>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let snapshots = backup::list_snapshots(&store).map_err(internal("backup: list"))?;
    Ok(HttpResponse::Ok().json(json!({ "snapshots": snapshots })))
}

/// Replace the live tables with a snapshot's contents. Missing files are
/// skipped, invalid files reported; by default the pre-restore state is
/// snapshotted first so the operation can itself be undone.
#[utoipa::path(
    post,
    path = "/api/v1/backups/restore",
    request_body = RestoreRequest,
    responses(
        (status = 200, description = "Restore report", body = RestoreReport),
        (status = 400, description = "Unknown or invalid snapshot name"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Backup"
)]
pub async fn restore_backup(
    auth: AuthUser,
    store: web::Data<Store>,
    config: web::Data<Config>,
    payload: web::Json<RestoreRequest>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let pre_restore = if payload.backup_first {
        let name = backup::snapshot(&store, "pre_restore", config.now())
            .map_err(internal("restore: pre-restore snapshot"))?;
        Some(name)
    } else {
        None
    };

    let report = match backup::restore(&store, &payload.name) {
        Ok(report) => report,
        Err(e) => {
            return Ok(HttpResponse::BadRequest().json(json!({ "message": e.to_string() })));
        }
    };

    tracing::info!(
        snapshot = %payload.name,
        applied = report.applied.len(),
        errors = report.errors.len(),
        "Snapshot restored"
    );

    Ok(HttpResponse::Ok().json(json!({
        "pre_restore_snapshot": pre_restore,
        "applied": report.applied,
        "skipped": report.skipped,
        "errors": report.errors,
    })))
}

/// Destructive reset of the selected tables. Requires the literal
/// confirmation string; the current state is always snapshotted first.
#[utoipa::path(
    post,
    path = "/api/v1/backups/wipe",
    request_body = WipeRequest,
    responses(
        (status = 200, description = "Tables wiped", body = Object, example = json!({
            "wiped": ["attendance_log.csv"], "pre_wipe_snapshot": "pre_wipe_20250801_183000"
        })),
        (status = 400, description = "Confirmation string missing"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Backup"
)]
pub async fn wipe_tables(
    auth: AuthUser,
    store: web::Data<Store>,
    config: web::Data<Config>,
    payload: web::Json<WipeRequest>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    if payload.confirm.trim() != "DELETE" {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Type DELETE in the confirm field to wipe tables"
        })));
    }

    let pre_wipe = backup::snapshot(&store, "pre_wipe", config.now())
        .map_err(internal("wipe: pre-wipe snapshot"))?;

    let mut wiped = Vec::new();
    if payload.attendance {
        store
            .attendance
            .replace(&[])
            .map_err(internal("wipe: attendance"))?;
        wiped.push(crate::db::ATTENDANCE_CSV);
    }
    if payload.leave_requests {
        store
            .leave_requests
            .replace(&[])
            .map_err(internal("wipe: leave requests"))?;
        wiped.push(crate::db::LEAVE_CSV);
    }
    if payload.overtime_requests {
        store
            .overtime_requests
            .replace(&[])
            .map_err(internal("wipe: overtime requests"))?;
        wiped.push(crate::db::OVERTIME_CSV);
    }
    if payload.audit_log {
        store
            .audit_log
            .replace(&[])
            .map_err(internal("wipe: audit log"))?;
        wiped.push(crate::db::AUDIT_CSV);
    }
    if payload.employees {
        store
            .employees
            .replace(&[])
            .map_err(internal("wipe: employees"))?;
        wiped.push(crate::db::EMPLOYEE_CSV);
    }

    tracing::warn!(?wiped, pre_wipe = %pre_wipe, "Tables wiped by admin");

    Ok(HttpResponse::Ok().json(json!({
        "wiped": wiped,
        "pre_wipe_snapshot": pre_wipe,
    })))
}
