//! Closing-cycle date arithmetic. The organisation bills attendance from the
//! 26th of one month through the 25th of the next; the period ending on the
//! 25th of month N is labelled "month N".

use chrono::{Datelike, NaiveDate};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayPeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl PayPeriod {
    /// Both bounds are inclusive.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Label of the closing month, e.g. "2025-08" for the Jul 26 – Aug 25
    /// period. Used for export file names.
    pub fn label(&self) -> String {
        format!("{}-{:02}", self.end.year(), self.end.month())
    }
}

fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("26th/25th exist in every month")
}

/// Closing month the reference date currently sits in. From the 26th onward
/// the date already belongs to the *next* month's cycle.
pub fn anchor_month(reference: NaiveDate) -> u32 {
    let month = reference.month() + if reference.day() >= 26 { 1 } else { 0 };
    if month > 12 { month - 12 } else { month }
}

/// Inclusive [start, end] window of the cycle labelled `selected_month`,
/// resolved relative to `reference`. Selecting a month ahead of the current
/// anchor month refers to last year's cycle of that name, which is what keeps
/// browsing past months sane across a year boundary.
pub fn resolve_period(selected_month: u32, reference: NaiveDate) -> PayPeriod {
    debug_assert!((1..=12).contains(&selected_month));

    let mut anchor_year = reference.year();
    let mut anchor = reference.month() + if reference.day() >= 26 { 1 } else { 0 };
    if anchor > 12 {
        anchor -= 12;
        anchor_year += 1;
    }

    let mut base_year = anchor_year;
    if selected_month > anchor {
        base_year -= 1;
    }

    if selected_month == 1 {
        PayPeriod {
            start: ymd(base_year - 1, 12, 26),
            end: ymd(base_year, 1, 25),
        }
    } else {
        PayPeriod {
            start: ymd(base_year, selected_month - 1, 26),
            end: ymd(base_year, selected_month, 25),
        }
    }
}

/// Period that `reference` itself falls inside. By construction one of the
/// twelve cycles always contains it; a miss would be an internal invariant
/// violation, so it is logged and papered over rather than surfaced.
pub fn resolve_open_period(reference: NaiveDate) -> PayPeriod {
    for month in 1..=12 {
        let period = resolve_period(month, reference);
        if period.contains(reference) {
            return period;
        }
    }
    tracing::warn!(%reference, "no closing period contained the reference date");
    resolve_period(reference.month(), reference)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn bounds_are_always_26th_to_25th() {
        let references = [
            d(2025, 1, 1),
            d(2025, 2, 28),
            d(2025, 6, 25),
            d(2025, 6, 26),
            d(2025, 12, 26),
            d(2024, 2, 29),
        ];
        for reference in references {
            for month in 1..=12 {
                let p = resolve_period(month, reference);
                assert!(p.start <= p.end, "{month} @ {reference}");
                assert_eq!(p.start.day(), 26, "{month} @ {reference}");
                assert_eq!(p.end.day(), 25, "{month} @ {reference}");
                assert_eq!(p.end.month(), month, "{month} @ {reference}");
            }
        }
    }

    #[test]
    fn january_period_spans_the_year_boundary() {
        let p = resolve_period(1, d(2025, 1, 10));
        assert_eq!(p.start, d(2024, 12, 26));
        assert_eq!(p.end, d(2025, 1, 25));
    }

    #[test]
    fn day_26_belongs_to_the_next_anchor_month() {
        assert_eq!(anchor_month(d(2025, 6, 25)), 6);
        assert_eq!(anchor_month(d(2025, 6, 26)), 7);
        assert_eq!(anchor_month(d(2025, 12, 26)), 1);

        // On Jun 26 the July cycle is already the open one.
        let p = resolve_open_period(d(2025, 6, 26));
        assert_eq!(p.start, d(2025, 6, 26));
        assert_eq!(p.end, d(2025, 7, 25));
    }

    #[test]
    fn selecting_a_future_named_month_resolves_to_last_year() {
        // Browsing "November" in June 2025 means Nov 2024's cycle.
        let p = resolve_period(11, d(2025, 6, 10));
        assert_eq!(p.start, d(2024, 10, 26));
        assert_eq!(p.end, d(2024, 11, 25));
    }

    #[test]
    fn open_period_contains_reference_and_is_idempotent() {
        let mut reference = d(2024, 12, 1);
        while reference < d(2026, 1, 10) {
            let first = resolve_open_period(reference);
            assert!(first.contains(reference), "{reference}");
            assert_eq!(first, resolve_open_period(reference));
            reference = reference.succ_opt().unwrap();
        }
    }
}
