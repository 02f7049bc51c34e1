//! Worked-hours and overtime derivation. Hours are never stored; they are
//! recomputed from the raw punch pair on every read.

use chrono::NaiveTime;
use once_cell::sync::Lazy;

/// Department on a fixed 07:30–17:00 shift whose overtime counts the minutes
/// outside that window instead of hours beyond a standard day. This is a real
/// payroll policy split, not a default to simplify away.
pub const DEFAULT_FIXED_SHIFT_DEPARTMENT: &str = "Recycling Division";

static SHIFT_START: Lazy<NaiveTime> =
    Lazy::new(|| NaiveTime::from_hms_opt(7, 30, 0).expect("07:30 is a valid time"));
static SHIFT_END: Lazy<NaiveTime> =
    Lazy::new(|| NaiveTime::from_hms_opt(17, 0, 0).expect("17:00 is a valid time"));

/// Unpaid break deducted from a standard-department day.
const BREAK_HOURS: f64 = 1.0;
/// Standard-department hours beyond which time counts as overtime.
const STANDARD_DAY_HOURS: f64 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DayHours {
    pub worked: f64,
    pub overtime: f64,
}

impl DayHours {
    const ZERO: DayHours = DayHours { worked: 0.0, overtime: 0.0 };
}

/// Strict 24-hour "HH:MM" parse. Round-trips through formatting so "9:00" or
/// trailing garbage fail the same way out-of-range values do.
pub fn parse_hhmm(value: &str) -> Option<NaiveTime> {
    let value = value.trim();
    let time = NaiveTime::parse_from_str(value, "%H:%M").ok()?;
    (time.format("%H:%M").to_string() == value).then_some(time)
}

pub fn is_hhmm(value: &str) -> bool {
    parse_hhmm(value).is_some()
}

fn round2(hours: f64) -> f64 {
    (hours * 100.0).round() / 100.0
}

fn hours_between(from: NaiveTime, to: NaiveTime) -> f64 {
    (to - from).num_minutes() as f64 / 60.0
}

/// Worked and overtime hours for one punch pair, both rounded to 2 decimals.
/// A missing or inverted pair is an incomplete day, not an error: both values
/// are zero. Overnight spans are not supported.
pub fn work_and_overtime(
    clock_in: Option<NaiveTime>,
    clock_out: Option<NaiveTime>,
    department: &str,
    fixed_shift_department: &str,
) -> DayHours {
    let (Some(clock_in), Some(clock_out)) = (clock_in, clock_out) else {
        return DayHours::ZERO;
    };
    if clock_out < clock_in {
        return DayHours::ZERO;
    }

    let duration = hours_between(clock_in, clock_out);

    if department.trim() == fixed_shift_department {
        let before = if clock_in < *SHIFT_START {
            hours_between(clock_in, *SHIFT_START)
        } else {
            0.0
        };
        let after = if clock_out > *SHIFT_END {
            hours_between(*SHIFT_END, clock_out)
        } else {
            0.0
        };
        DayHours {
            worked: round2(duration),
            overtime: round2(before + after),
        }
    } else {
        let worked = (duration - BREAK_HOURS).max(0.0);
        let overtime = (worked - STANDARD_DAY_HOURS).max(0.0);
        DayHours {
            worked: round2(worked),
            overtime: round2(overtime),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hours(clock_in: &str, clock_out: &str, department: &str) -> DayHours {
        work_and_overtime(
            parse_hhmm(clock_in),
            parse_hhmm(clock_out),
            department,
            DEFAULT_FIXED_SHIFT_DEPARTMENT,
        )
    }

    #[test]
    fn standard_day_with_break_deducted() {
        assert_eq!(hours("09:00", "18:00", "Sales"), DayHours { worked: 8.0, overtime: 0.0 });
    }

    #[test]
    fn standard_overtime_beyond_eight_hours() {
        assert_eq!(hours("09:00", "19:30", "Sales"), DayHours { worked: 9.5, overtime: 1.5 });
    }

    #[test]
    fn fixed_shift_counts_minutes_outside_window() {
        // 0.5h before 07:30 plus 1.0h after 17:00; worked stays the raw span.
        let h = hours("07:00", "18:00", DEFAULT_FIXED_SHIFT_DEPARTMENT);
        assert_eq!(h, DayHours { worked: 11.0, overtime: 1.5 });
    }

    #[test]
    fn fixed_shift_inside_window_has_no_overtime() {
        let h = hours("07:30", "17:00", DEFAULT_FIXED_SHIFT_DEPARTMENT);
        assert_eq!(h, DayHours { worked: 9.5, overtime: 0.0 });
    }

    #[test]
    fn inverted_or_incomplete_pairs_count_nothing() {
        assert_eq!(hours("18:00", "09:00", "Sales"), DayHours::ZERO);
        assert_eq!(hours("18:00", "09:00", DEFAULT_FIXED_SHIFT_DEPARTMENT), DayHours::ZERO);
        assert_eq!(
            work_and_overtime(parse_hhmm("09:00"), None, "Sales", DEFAULT_FIXED_SHIFT_DEPARTMENT),
            DayHours::ZERO
        );
    }

    #[test]
    fn short_day_never_goes_negative() {
        assert_eq!(hours("09:00", "09:30", "Sales"), DayHours::ZERO);
    }

    #[test]
    fn hhmm_validation_is_strict() {
        assert!(is_hhmm("07:30"));
        assert!(is_hhmm("23:59"));
        assert!(!is_hhmm("24:00"));
        assert!(!is_hhmm("9:00"));
        assert!(!is_hhmm("09:60"));
        assert!(!is_hhmm("09:00:00"));
        assert!(!is_hhmm(""));
    }
}
