use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::IntoParams;

use crate::auth::auth::AuthUser;
use crate::db::Store;
use crate::model::audit_log::AuditLogEntry;

#[derive(Deserialize, IntoParams)]
pub struct AuditFilter {
    /// Inclusive lower bound on the entry date.
    #[param(value_type = Option<String>, example = "2025-07-26")]
    pub from: Option<NaiveDate>,
    /// Inclusive upper bound on the entry date.
    #[param(value_type = Option<String>, example = "2025-08-25")]
    pub to: Option<NaiveDate>,
    /// Substring match on the acting approver.
    pub actor: Option<String>,
}

/// Transition history, newest first. The log is append-only; this endpoint
/// is the only way to look at it.
#[utoipa::path(
    get,
    path = "/api/v1/audit",
    params(AuditFilter),
    responses(
        (status = 200, description = "Matching audit entries", body = [AuditLogEntry]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Audit"
)]
pub async fn list_audit(
    auth: AuthUser,
    store: web::Data<Store>,
    query: web::Query<AuditFilter>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let mut entries: Vec<AuditLogEntry> = store
        .audit_log
        .load()
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to read audit log");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?
        .into_iter()
        .filter(|entry| {
            let date = entry.timestamp.date();
            query.from.is_none_or(|from| date >= from)
                && query.to.is_none_or(|to| date <= to)
                && query
                    .actor
                    .as_deref()
                    .is_none_or(|actor| entry.actor.contains(actor.trim()))
        })
        .collect();
    entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

    Ok(HttpResponse::Ok().json(entries))
}
