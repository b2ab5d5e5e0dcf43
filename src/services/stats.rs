use crate::models::*;
use chrono::{Datelike, Duration, NaiveDate};
use std::collections::HashMap;

/// Immutable per-day puff counts, loaded in one pass from the store.
///
/// Days with no record (or a corrupt one) simply have no entry and count
/// as zero. Summaries are computed against a snapshot so all four windows
/// see the same data.
#[derive(Debug, Clone, Default)]
pub struct UsageSnapshot {
    counts: HashMap<NaiveDate, u64>,
}

impl UsageSnapshot {
    pub fn new(counts: HashMap<NaiveDate, u64>) -> Self {
        Self { counts }
    }

    pub fn count_for(&self, date: NaiveDate) -> u64 {
        self.counts.get(&date).copied().unwrap_or(0)
    }

    /// Sum of all events recorded in one calendar month.
    pub fn count_for_month(&self, year: i32, month: u32) -> u64 {
        self.counts
            .iter()
            .filter(|(date, _)| date.year() == year && date.month() == month)
            .map(|(_, count)| count)
            .sum()
    }

    /// Total events across every recorded day.
    pub fn lifetime_total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// First day with any recorded usage.
    pub fn earliest_day(&self) -> Option<NaiveDate> {
        self.counts.keys().min().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    fn range_total(&self, start: NaiveDate, end: NaiveDate) -> u64 {
        // Inclusive on both ends; iterating the range beats scanning the
        // map for the short windows involved here.
        let mut total = 0;
        let mut date = start;
        while date <= end {
            total += self.count_for(date);
            date = date + Duration::days(1);
        }
        total
    }
}

/// Computes the four trailing-window summaries from a snapshot.
///
/// Stateless and idempotent: every call derives fresh values, nothing is
/// cached or persisted.
pub struct StatsAggregator<'a> {
    snapshot: &'a UsageSnapshot,
    today: NaiveDate,
    /// Days elapsed since the user started tracking, floored at 1.
    days_since_start: u32,
    baseline_daily_rate: f64,
    cost_model: &'a CostModel,
}

impl<'a> StatsAggregator<'a> {
    /// `baseline_daily_rate` is the user-declared typical daily count; pass
    /// `None` to fall back to the lifetime daily rate.
    pub fn new(
        snapshot: &'a UsageSnapshot,
        today: NaiveDate,
        days_since_start: u32,
        baseline_daily_rate: Option<f64>,
        cost_model: &'a CostModel,
    ) -> Self {
        let days_since_start = days_since_start.max(1);
        let baseline_daily_rate = baseline_daily_rate
            .unwrap_or_else(|| snapshot.lifetime_total() as f64 / days_since_start as f64);
        Self {
            snapshot,
            today,
            days_since_start,
            baseline_daily_rate,
            cost_model,
        }
    }

    /// Summaries for all four window kinds, in display order.
    pub fn summarize_all(&self) -> Vec<WindowSummary> {
        WindowKind::ALL.iter().map(|kind| self.summarize(*kind)).collect()
    }

    pub fn summarize(&self, kind: WindowKind) -> WindowSummary {
        let (total, previous_total) = match kind {
            WindowKind::Day | WindowKind::Week | WindowKind::Month => {
                let span = kind.period_days() as i64;
                let window_start = self.today - Duration::days(span - 1);
                let baseline_end = window_start - Duration::days(1);
                let baseline_start = baseline_end - Duration::days(span - 1);
                (
                    self.snapshot.range_total(window_start, self.today),
                    self.snapshot.range_total(baseline_start, baseline_end),
                )
            }
            WindowKind::Year => (self.year_total(), 0),
        };

        let change_percent = match kind {
            // Year-over-year comparison is not computed.
            WindowKind::Year => None,
            _ => Some(change_percent(total, previous_total)),
        };

        WindowSummary {
            kind,
            total,
            previous_total,
            change_percent,
            average: self.long_run_average(kind),
            amount_saved: self.amount_saved(kind, total),
        }
    }

    /// Sum over the 12 calendar months ending with the current month,
    /// bucketed by month rather than by day.
    fn year_total(&self) -> u64 {
        let mut total = 0;
        let mut year = self.today.year();
        let mut month = self.today.month();
        for _ in 0..12 {
            total += self.snapshot.count_for_month(year, month);
            if month == 1 {
                month = 12;
                year -= 1;
            } else {
                month -= 1;
            }
        }
        total
    }

    /// Lifetime total over elapsed window units. Deliberately a long-run
    /// rate rather than this window's own mean.
    fn long_run_average(&self, kind: WindowKind) -> f64 {
        let lifetime = self.snapshot.lifetime_total() as f64;
        let days = self.days_since_start as f64;
        let units = match kind {
            WindowKind::Day => days,
            WindowKind::Week => (days / 7.0).ceil(),
            WindowKind::Month | WindowKind::Year => (days / 30.0).ceil(),
        };
        lifetime / units.max(1.0)
    }

    /// Money delta between extrapolated baseline usage and actual usage
    /// over the window, clamping the window to the days actually tracked.
    fn amount_saved(&self, kind: WindowKind, total: u64) -> f64 {
        let days_used = self.days_since_start.min(kind.period_days()) as f64;
        let expected_usage = self.baseline_daily_rate * days_used;
        let baseline_cost = self.cost_model.cost_of(expected_usage);
        let actual_cost = self.cost_model.cost_of(total as f64);
        baseline_cost - actual_cost
    }
}

/// Signed percent change of `total` against `previous`.
///
/// A zero baseline always reports 0% — even when usage rose from zero.
/// That is the product's documented contract, not an oversight to fix.
pub fn change_percent(total: u64, previous: u64) -> i32 {
    if previous == 0 {
        return 0;
    }
    let delta = total as f64 - previous as f64;
    ((delta / previous as f64) * 100.0).round() as i32
}
