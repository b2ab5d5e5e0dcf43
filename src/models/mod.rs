use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// One recorded puff.
///
/// Events are immutable once written and belong to the local calendar day
/// containing their timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageEvent {
    pub id: Uuid,
    pub timestamp: DateTime<Local>,
    /// E-liquid nicotine concentration in mg/ml at the time of the puff.
    pub strength: f64,
}

impl UsageEvent {
    pub fn new(timestamp: DateTime<Local>, strength: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp,
            strength,
        }
    }
}

/// Parameters of the quitting plan, fixed at creation time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlanSpec {
    /// Declared starting daily puff count.
    pub start_count: u32,
    /// Day 0 of the plan.
    pub start_date: NaiveDate,
    /// Last day of the plan (inclusive).
    pub target_date: NaiveDate,
    /// Inclusive day count from start_date to target_date.
    pub total_days: usize,
}

impl PlanSpec {
    pub fn new(start_count: u32, start_date: NaiveDate, target_date: NaiveDate) -> Self {
        let total_days = (target_date - start_date).num_days().max(0) as usize + 1;
        Self {
            start_count,
            start_date,
            target_date,
            total_days,
        }
    }
}

/// A plan spec together with its generated day-by-day target curve.
///
/// The curve is computed once when the plan is created and persisted
/// verbatim; it is never recomputed unless the spec changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanState {
    pub spec: PlanSpec,
    /// Per-day target maximums: index 0 == start_count, last index == 0.
    pub curve: Vec<u32>,
}

/// The four fixed aggregation windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WindowKind {
    Day,
    Week,
    Month,
    Year,
}

impl WindowKind {
    pub const ALL: [WindowKind; 4] = [
        WindowKind::Day,
        WindowKind::Week,
        WindowKind::Month,
        WindowKind::Year,
    ];

    /// Nominal window length in days, used for the savings estimate.
    pub fn period_days(&self) -> u32 {
        match self {
            WindowKind::Day => 1,
            WindowKind::Week => 7,
            WindowKind::Month => 30,
            WindowKind::Year => 365,
        }
    }
}

impl fmt::Display for WindowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            WindowKind::Day => "day",
            WindowKind::Week => "week",
            WindowKind::Month => "month",
            WindowKind::Year => "year",
        };
        write!(f, "{label}")
    }
}

/// Derived statistics for one window kind. Recomputed on every read,
/// never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowSummary {
    pub kind: WindowKind,
    /// Puffs in the current window.
    pub total: u64,
    /// Puffs in the equal-length window immediately preceding.
    pub previous_total: u64,
    /// Signed percent change vs the previous window. `None` for the year
    /// window, which has no comparison baseline.
    pub change_percent: Option<i32>,
    /// Long-run rate per window unit (lifetime total over elapsed units),
    /// not a window-local mean.
    pub average: f64,
    /// Estimated money saved vs the baseline daily rate over this window.
    /// Positive means under baseline, negative means over.
    pub amount_saved: f64,
}

/// Conversion from puff counts to money.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostModel {
    /// Puffs per pod/cartridge.
    pub puffs_per_pod: f64,
    /// Price of one pod in the configured currency.
    pub pod_cost: f64,
    pub currency_symbol: String,
}

impl Default for CostModel {
    fn default() -> Self {
        Self {
            puffs_per_pod: 500.0,
            pod_cost: 10.0,
            currency_symbol: "$".to_string(),
        }
    }
}

impl CostModel {
    /// Money value of `puffs` puffs.
    pub fn cost_of(&self, puffs: f64) -> f64 {
        (puffs / self.puffs_per_pod) * self.pod_cost
    }
}

/// User configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserConfig {
    /// User-declared typical daily puff count; when unset the lifetime
    /// daily rate is used as the savings baseline.
    pub baseline_daily_rate: Option<f64>,
    /// Default nicotine strength (mg/ml) applied to `puff` when no
    /// `--strength` is given.
    pub default_strength: f64,
    pub cost_model: CostModel,
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            baseline_daily_rate: None,
            default_strength: 20.0,
            cost_model: CostModel::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_plan_spec_total_days_inclusive() {
        let start = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let target = NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();
        let spec = PlanSpec::new(140, start, target);
        assert_eq!(spec.total_days, 14);
    }

    #[test]
    fn test_plan_spec_same_day() {
        let day = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let spec = PlanSpec::new(40, day, day);
        assert_eq!(spec.total_days, 1);
    }

    #[test]
    fn test_cost_model_default_conversion() {
        let cost = CostModel::default();
        // 500 puffs -> one 10-currency pod
        assert!((cost.cost_of(500.0) - 10.0).abs() < 1e-9);
        assert!((cost.cost_of(250.0) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_window_period_days() {
        assert_eq!(WindowKind::Day.period_days(), 1);
        assert_eq!(WindowKind::Week.period_days(), 7);
        assert_eq!(WindowKind::Month.period_days(), 30);
        assert_eq!(WindowKind::Year.period_days(), 365);
    }
}
