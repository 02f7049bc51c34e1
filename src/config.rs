use std::env;

use chrono::{FixedOffset, Months, NaiveDate, NaiveDateTime, Timelike, Utc};
use dotenvy::dotenv;

use crate::worktime;

#[derive(Clone)]
pub struct Config {
    pub server_addr: String,
    pub data_dir: String,
    pub jwt_secret: String,
    pub access_token_ttl: usize,
    pub refresh_token_ttl: usize,

    /// Reference timezone as a fixed UTC offset in hours. "Today" is always
    /// derived from this, never from the host's local time.
    pub tz_offset_hours: i32,
    /// Department whose overtime is counted against the fixed shift window.
    pub fixed_shift_department: String,
    /// How many months back employees may still punch or edit.
    pub edit_window_months: u32,

    // Rate limiting
    pub rate_login_per_min: u32,
    pub rate_protected_per_min: u32,

    pub api_prefix: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        Self {
            server_addr: env::var("SERVER_ADDR").expect("SERVER_ADDR must be set"),
            data_dir: env::var("DATA_DIR").unwrap_or_else(|_| ".".to_string()),
            jwt_secret: env::var("JWT_SECRET").expect("JWT_SECRET must be set"),
            access_token_ttl: env::var("ACCESS_TOKEN_TTL")
                .unwrap_or_else(|_| "900".to_string()) // default 15 min
                .parse()
                .unwrap(),
            refresh_token_ttl: env::var("REFRESH_TOKEN_TTL")
                .unwrap_or_else(|_| "604800".to_string()) // default 7 days
                .parse()
                .unwrap(),

            tz_offset_hours: env::var("TZ_OFFSET_HOURS")
                .unwrap_or_else(|_| "9".to_string())
                .parse()
                .unwrap(),
            fixed_shift_department: env::var("FIXED_SHIFT_DEPARTMENT")
                .unwrap_or_else(|_| worktime::DEFAULT_FIXED_SHIFT_DEPARTMENT.to_string()),
            edit_window_months: env::var("EDIT_WINDOW_MONTHS")
                .unwrap_or_else(|_| "2".to_string())
                .parse()
                .unwrap(),

            rate_login_per_min: env::var("RATE_LOGIN_PER_MIN")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .unwrap(),
            rate_protected_per_min: env::var("RATE_PROTECTED_PER_MIN")
                .unwrap_or_else(|_| "1000".to_string())
                .parse()
                .unwrap(),

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api/v1".to_string()),
        }
    }

    pub fn offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.tz_offset_hours * 3600)
            .expect("TZ_OFFSET_HOURS must be within -23..=23")
    }

    /// Wall-clock "now" in the configured reference timezone, truncated to
    /// whole seconds so stored timestamps round-trip as listed.
    pub fn now(&self) -> NaiveDateTime {
        let now = Utc::now().with_timezone(&self.offset()).naive_local();
        now.with_nanosecond(0).unwrap_or(now)
    }

    pub fn today(&self) -> NaiveDate {
        self.now().date()
    }

    /// Oldest date employees may still punch or edit.
    pub fn past_edit_limit(&self, today: NaiveDate) -> NaiveDate {
        today
            .checked_sub_months(Months::new(self.edit_window_months))
            .unwrap_or(today)
    }
}
