use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

use crate::api::attendance::{
    AdminEditRequest, AdminEditRow, AttendanceListResponse, AttendanceRow, DeleteDatesRequest,
    EditTimesRequest, PunchRequest,
};
use crate::api::backup::{RestoreRequest, WipeRequest};
use crate::api::employee::{CreateEmployee, EmployeeResponse};
use crate::api::leave_request::{
    CancelBatch, CreateLeave, LeaveListResponse, LeaveResponse,
};
use crate::api::overtime_request::{CreateOvertime, OvertimeListResponse, OvertimeResponse};
use crate::api::report::{EmployeeSummary, MonthlyReportResponse};
use crate::auth::handlers::LoginResponse;
use crate::lifecycle::{CancelItem, DecisionBatch, DecisionItem, DecisionOutcome};
use crate::model::audit_log::{AuditLogEntry, RequestKind};
use crate::model::leave_request::LeaveType;
use crate::model::status::RequestStatus;
use crate::models::LoginReqDto;
use crate::store::backup::RestoreReport;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Timeclock API",
        version = "1.0.0",
        description = r#"
## Employee Attendance & Timesheet Service

Single-tenant attendance tracking over the organisation's 26th-to-25th
closing cycle, with leave and overtime request workflows.

### Key Features
- **Attendance**
  - Clock-in / clock-out with optional coordinates, per-day corrections
- **Leave & Overtime Requests**
  - Employee submission, admin batch approval with a full audit trail
- **Monthly Reports**
  - Worked/overtime totals per closing month, CSV export for payroll
- **Backups**
  - Table snapshots, restore, and a standalone rotation utility

### Security
Endpoints under the API prefix require **JWT Bearer authentication**.
Administrative operations are restricted to the admin account.
"#,
    ),
    paths(
        crate::auth::handlers::login,
        crate::auth::handlers::refresh_token,
        crate::auth::handlers::me,

        crate::api::attendance::clock_in,
        crate::api::attendance::clock_out,
        crate::api::attendance::list_attendance,
        crate::api::attendance::edit_own_times,
        crate::api::attendance::delete_own_rows,
        crate::api::attendance::admin_edit_rows,
        crate::api::attendance::admin_delete_rows,

        crate::api::leave_request::create_leave,
        crate::api::leave_request::leave_list,
        crate::api::leave_request::decide_leave,
        crate::api::leave_request::cancel_leave,

        crate::api::overtime_request::create_overtime,
        crate::api::overtime_request::overtime_list,
        crate::api::overtime_request::decide_overtime,

        crate::api::report::monthly_report,
        crate::api::report::monthly_report_csv,
        crate::api::report::my_summary,

        crate::api::audit::list_audit,

        crate::api::backup::create_backup,
        crate::api::backup::list_backups,
        crate::api::backup::restore_backup,
        crate::api::backup::wipe_tables,

        crate::api::employee::create_employee,
        crate::api::employee::list_employees,
        crate::api::employee::delete_employee,
    ),
    components(
        schemas(
            LoginReqDto,
            LoginResponse,
            PunchRequest,
            AttendanceRow,
            AttendanceListResponse,
            EditTimesRequest,
            DeleteDatesRequest,
            AdminEditRow,
            AdminEditRequest,
            CreateLeave,
            LeaveType,
            LeaveResponse,
            LeaveListResponse,
            CreateOvertime,
            OvertimeResponse,
            OvertimeListResponse,
            RequestStatus,
            RequestKind,
            DecisionItem,
            DecisionBatch,
            DecisionOutcome,
            CancelItem,
            CancelBatch,
            AuditLogEntry,
            EmployeeSummary,
            MonthlyReportResponse,
            RestoreRequest,
            RestoreReport,
            WipeRequest,
            CreateEmployee,
            EmployeeResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Login and token APIs"),
        (name = "Attendance", description = "Clock-in/out and row maintenance APIs"),
        (name = "Leave", description = "Leave request APIs"),
        (name = "Overtime", description = "Overtime request APIs"),
        (name = "Reports", description = "Monthly aggregation APIs"),
        (name = "Audit", description = "Transition history APIs"),
        (name = "Backup", description = "Snapshot and restore APIs"),
        (name = "Employee", description = "Employee master APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(openapi::Components::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
