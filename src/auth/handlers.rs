use actix_web::{HttpRequest, HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, instrument};

use crate::auth::auth::AuthUser;
use crate::auth::jwt::{generate_access_token, generate_refresh_token, verify_token};
use crate::auth::password::verify_password;
use crate::config::Config;
use crate::db::Store;
use crate::model::role::Role;
use crate::models::{LoginReqDto, TokenType};

#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
}

/// Login with an employee ID. The admin account always requires its password;
/// employee rows without a stored hash sign in by ID alone (kiosk-style
/// punching from the shop floor), rows with one must supply it.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginReqDto,
    responses(
        (status = 200, description = "Token pair issued", body = LoginResponse),
        (status = 400, description = "Missing employee ID"),
        (status = 401, description = "Unknown employee or wrong password")
    ),
    tag = "Auth"
)]
#[instrument(
    name = "auth_login",
    skip(store, config, payload),
    fields(employee_id = %payload.employee_id)
)]
pub async fn login(
    payload: web::Json<LoginReqDto>,
    store: web::Data<Store>,
    config: web::Data<Config>,
) -> impl Responder {
    info!("Login request received");

    let employee_id = payload.employee_id.trim();
    if employee_id.is_empty() {
        info!("Validation failed: empty employee ID");
        return HttpResponse::BadRequest().body("Employee ID required");
    }

    debug!("Fetching employee master");

    let employees = match store.employees.load() {
        Ok(rows) => rows,
        Err(e) => {
            tracing::error!(error = %e, "Failed to read employee master");
            return HttpResponse::InternalServerError().finish();
        }
    };

    let employee = match employees.iter().find(|e| e.employee_id == employee_id) {
        Some(e) => e,
        None => {
            info!("Invalid credentials: employee not found");
            return HttpResponse::Unauthorized().body("Invalid credentials");
        }
    };

    let role = if employee.is_admin() {
        Role::Admin
    } else {
        Role::Employee
    };

    // Admins must present a password; employees only when one is stored.
    if role == Role::Admin || !employee.password_hash.is_empty() {
        if employee.password_hash.is_empty() {
            tracing::error!(employee_id, "Admin row has no password hash");
            return HttpResponse::Unauthorized().body("Invalid credentials");
        }
        if payload.password.is_empty() {
            info!("Invalid credentials: password required");
            return HttpResponse::Unauthorized().body("Invalid credentials");
        }
        if let Err(e) = verify_password(&payload.password, &employee.password_hash) {
            info!(error = %e, "Invalid credentials: password mismatch");
            return HttpResponse::Unauthorized().body("Invalid credentials");
        }
    }

    debug!("Generating token pair");

    let access_token = generate_access_token(
        &employee.employee_id,
        &employee.name,
        role.id(),
        &config.jwt_secret,
        config.access_token_ttl,
    );
    let refresh_token = generate_refresh_token(
        &employee.employee_id,
        &employee.name,
        role.id(),
        &config.jwt_secret,
        config.refresh_token_ttl,
    );

    info!("Login successful");

    HttpResponse::Ok().json(LoginResponse {
        access_token,
        refresh_token,
    })
}

/// Exchange a refresh token for a fresh pair. Tokens are stateless; rotation
/// here does not revoke the old refresh token before it expires.
#[utoipa::path(
    post,
    path = "/auth/refresh",
    responses(
        (status = 200, description = "New token pair"),
        (status = 401, description = "Invalid or non-refresh token")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn refresh_token(req: HttpRequest, config: web::Data<Config>) -> impl Responder {
    let header = match req.headers().get("Authorization") {
        Some(h) => h.to_str().unwrap_or(""),
        None => return HttpResponse::Unauthorized().body("No token"),
    };

    let token = match header.strip_prefix("Bearer ") {
        Some(t) => t,
        None => return HttpResponse::Unauthorized().body("Invalid token"),
    };

    let claims = match verify_token(token, &config.jwt_secret) {
        Ok(c) => c,
        Err(_) => return HttpResponse::Unauthorized().finish(),
    };

    if claims.token_type != TokenType::Refresh {
        return HttpResponse::Unauthorized().finish();
    }

    let access_token = generate_access_token(
        &claims.sub,
        &claims.name,
        claims.role,
        &config.jwt_secret,
        config.access_token_ttl,
    );
    let new_refresh_token = generate_refresh_token(
        &claims.sub,
        &claims.name,
        claims.role,
        &config.jwt_secret,
        config.refresh_token_ttl,
    );

    HttpResponse::Ok().json(json!({
        "access_token": access_token,
        "refresh_token": new_refresh_token
    }))
}

/// Identity behind the presented access token.
#[utoipa::path(
    get,
    path = "/api/v1/me",
    responses((status = 200, description = "Caller identity")),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn me(auth: AuthUser) -> impl Responder {
    HttpResponse::Ok().json(json!({
        "employee_id": auth.employee_id,
        "name": auth.name,
        "is_admin": auth.is_admin(),
    }))
}
