pub mod attendance;
pub mod audit;
pub mod backup;
pub mod employee;
pub mod leave_request;
pub mod overtime_request;
pub mod report;

/// Store failures all surface the same way: log the real error, answer 500.
pub(crate) fn internal(context: &'static str) -> impl Fn(anyhow::Error) -> actix_web::Error {
    move |e| {
        tracing::error!(error = %e, "{context}");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    }
}
