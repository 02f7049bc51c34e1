use std::sync::Arc;

use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};

use crate::{
    api::{attendance, audit, backup, employee, leave_request, overtime_request, report},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let per_ms = if requests_per_min == 0 {
            1
        } else {
            60_000 / requests_per_min as u64
        };
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .unwrap();
        Governor::new(&cfg)
    }

    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    // Public routes
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/login")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/refresh")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::refresh_token)),
            ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(protected_limiter) // rate limiting
            .service(web::resource("/me").route(web::get().to(handlers::me)))
            .service(
                web::scope("/attendance")
                    .service(
                        web::resource("")
                            .route(web::get().to(attendance::list_attendance))
                            .route(web::delete().to(attendance::delete_own_rows)),
                    )
                    .service(
                        web::resource("/clock-in").route(web::post().to(attendance::clock_in)),
                    )
                    .service(
                        web::resource("/clock-out").route(web::post().to(attendance::clock_out)),
                    )
                    .service(
                        web::resource("/employees/{employee_id}")
                            .route(web::put().to(attendance::admin_edit_rows))
                            .route(web::delete().to(attendance::admin_delete_rows)),
                    )
                    // keep last: {date} would otherwise shadow the fixed segments
                    .service(
                        web::resource("/{date}").route(web::put().to(attendance::edit_own_times)),
                    ),
            )
            .service(
                web::scope("/leave")
                    .service(
                        web::resource("")
                            .route(web::get().to(leave_request::leave_list))
                            .route(web::post().to(leave_request::create_leave)),
                    )
                    .service(
                        web::resource("/decisions")
                            .route(web::post().to(leave_request::decide_leave)),
                    )
                    .service(
                        web::resource("/cancel").route(web::post().to(leave_request::cancel_leave)),
                    ),
            )
            .service(
                web::scope("/overtime")
                    .service(
                        web::resource("")
                            .route(web::get().to(overtime_request::overtime_list))
                            .route(web::post().to(overtime_request::create_overtime)),
                    )
                    .service(
                        web::resource("/decisions")
                            .route(web::post().to(overtime_request::decide_overtime)),
                    ),
            )
            .service(
                web::scope("/reports")
                    .service(web::resource("/monthly").route(web::get().to(report::monthly_report)))
                    .service(
                        web::resource("/monthly/csv")
                            .route(web::get().to(report::monthly_report_csv)),
                    )
                    .service(web::resource("/me").route(web::get().to(report::my_summary))),
            )
            .service(web::resource("/audit").route(web::get().to(audit::list_audit)))
            .service(
                web::scope("/backups")
                    .service(
                        web::resource("")
                            .route(web::get().to(backup::list_backups))
                            .route(web::post().to(backup::create_backup)),
                    )
                    .service(
                        web::resource("/restore").route(web::post().to(backup::restore_backup)),
                    )
                    .service(web::resource("/wipe").route(web::post().to(backup::wipe_tables))),
            )
            .service(
                web::scope("/employees")
                    .service(
                        web::resource("")
                            .route(web::post().to(employee::create_employee))
                            .route(web::get().to(employee::list_employees)),
                    )
                    .service(
                        web::resource("/{employee_id}")
                            .route(web::delete().to(employee::delete_employee)),
                    ),
            ),
    );
}
