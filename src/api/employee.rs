use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::auth::auth::AuthUser;
use crate::auth::password::hash_password;
use crate::db::Store;
use crate::model::employee::{ADMIN_ID, Employee};
use crate::store::sanitize_cell;

#[derive(Deserialize, ToSchema)]
pub struct CreateEmployee {
    #[schema(example = "1001")]
    pub employee_id: String,
    #[schema(example = "Aiko Sato")]
    pub name: String,
    #[schema(example = "Sales")]
    #[serde(default)]
    pub department: String,
    /// Optional; employees without one sign in by ID alone.
    #[serde(default)]
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct EmployeeResponse {
    pub employee_id: String,
    pub name: String,
    pub department: String,
    pub has_password: bool,
}

impl From<&Employee> for EmployeeResponse {
    fn from(e: &Employee) -> Self {
        Self {
            employee_id: e.employee_id.clone(),
            name: e.name.clone(),
            department: e.department.clone(),
            has_password: !e.password_hash.is_empty(),
        }
    }
}

/// Register an employee in the login master.
#[utoipa::path(
    post,
    path = "/api/v1/employees",
    request_body = CreateEmployee,
    responses(
        (status = 201, description = "Employee registered"),
        (status = 400, description = "Empty ID or name, or admin without password"),
        (status = 409, description = "Employee ID already exists"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Employee"
)]
pub async fn create_employee(
    auth: AuthUser,
    store: web::Data<Store>,
    payload: web::Json<CreateEmployee>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let employee_id = payload.employee_id.trim().to_string();
    let name = payload.name.trim().to_string();
    if employee_id.is_empty() || name.is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "employee_id and name must not be empty"
        })));
    }
    if employee_id == ADMIN_ID && payload.password.is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "The admin account requires a password"
        })));
    }

    let employee = Employee {
        employee_id: employee_id.clone(),
        name: sanitize_cell(&name),
        department: sanitize_cell(payload.department.trim()),
        password_hash: if payload.password.is_empty() {
            String::new()
        } else {
            hash_password(&payload.password)
        },
    };

    let inserted = store
        .employees
        .update(|rows| {
            if rows.iter().any(|e| e.employee_id == employee_id) {
                false
            } else {
                rows.push(employee);
                true
            }
        })
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to register employee");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    if !inserted {
        return Ok(HttpResponse::Conflict().json(json!({
            "message": "Employee ID already exists"
        })));
    }

    Ok(HttpResponse::Created().json(json!({
        "message": "Employee registered"
    })))
}

/// Employee master without credential material.
#[utoipa::path(
    get,
    path = "/api/v1/employees",
    responses(
        (status = 200, description = "All employees", body = [EmployeeResponse]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Employee"
)]
pub async fn list_employees(
    auth: AuthUser,
    store: web::Data<Store>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let mut employees = store.employees.load().map_err(|e| {
        tracing::error!(error = %e, "Failed to read employee master");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;
    employees.sort_by(|a, b| a.employee_id.cmp(&b.employee_id));

    let data: Vec<EmployeeResponse> = employees.iter().map(EmployeeResponse::from).collect();
    Ok(HttpResponse::Ok().json(data))
}

/// Remove an employee from the master. The admin row is protected.
#[utoipa::path(
    delete,
    path = "/api/v1/employees/{employee_id}",
    params(("employee_id" = String, Path, description = "Employee to remove")),
    responses(
        (status = 200, description = "Employee removed"),
        (status = 400, description = "Attempt to remove the admin account"),
        (status = 404, description = "Unknown employee"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Employee"
)]
pub async fn delete_employee(
    auth: AuthUser,
    store: web::Data<Store>,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    let employee_id = path.into_inner();

    if employee_id == ADMIN_ID {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "The admin account cannot be removed"
        })));
    }

    let removed = store
        .employees
        .update(|rows| {
            let before = rows.len();
            rows.retain(|e| e.employee_id != employee_id);
            before - rows.len()
        })
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to remove employee");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    if removed == 0 {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Unknown employee"
        })));
    }

    Ok(HttpResponse::Ok().json(json!({ "message": "Employee removed" })))
}
