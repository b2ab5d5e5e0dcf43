use crate::models::PlanState;
use chrono::NaiveDate;

/// How many plateaus a normal plan is divided into, at most.
const MAX_STEPS: usize = 10;

/// Starting counts below this use the simple linear taper instead of the
/// weighted plateau schedule.
const LOW_START_THRESHOLD: u32 = 5;

/// Generate the day-by-day target curve for a reduction plan.
///
/// The result has exactly `total_days` entries, starts at `start_count`
/// and ends at 0. Reduction is front-loaded: a small number of plateaus
/// with quadratically growing day allocations, so early drops are steep
/// and the tail tapers slowly. Pure function of its inputs.
pub fn generate(total_days: usize, start_count: u32) -> Vec<u32> {
    if total_days <= 1 {
        return vec![0];
    }
    if start_count < LOW_START_THRESHOLD {
        return generate_linear(total_days, start_count);
    }

    let steps = MAX_STEPS.min(total_days - 1);
    let step_down = start_count as f64 / steps as f64;

    // Later steps carry more weight, so they are allotted more days.
    let weights: Vec<f64> = (0..steps).map(|i| ((i + 1) * (i + 1)) as f64).collect();
    let total_weight: f64 = weights.iter().sum();

    // Day slots to distribute, excluding the forced final zero day.
    let slots = total_days - 1;
    let mut lengths: Vec<usize> = weights
        .iter()
        .map(|w| (w / total_weight * slots as f64).round() as usize)
        .collect();

    // Each step rounds independently, so the sum can drift off by a few
    // slots either way.
    let mut allocated: usize = lengths.iter().sum();
    while allocated > slots {
        // Shrink from the last step backward, never below one day.
        let before = allocated;
        for i in (0..steps).rev() {
            if allocated == slots {
                break;
            }
            if lengths[i] > 1 {
                lengths[i] -= 1;
                allocated -= 1;
            }
        }
        // Over-allocation implies some step holds more than one day, so
        // every pass makes progress; the guard keeps this loop finite
        // regardless.
        if allocated == before {
            break;
        }
    }
    let mut next = 0;
    while allocated < slots {
        // Grow from the first step forward, cycling.
        lengths[next % steps] += 1;
        allocated += 1;
        next += 1;
    }

    let mut curve = Vec::with_capacity(total_days);
    for (i, length) in lengths.iter().enumerate() {
        let value = (start_count as f64 - i as f64 * step_down).round().max(0.0) as u32;
        curve.extend(std::iter::repeat(value).take(*length));
    }
    curve.push(0);

    debug_assert_eq!(curve.len(), total_days);
    curve[0] = start_count;
    let last = curve.len() - 1;
    curve[last] = 0;
    curve
}

/// Linear taper for low starting counts: `total_days - 1` entries easing
/// from `start_count` toward 1 (intermediate values never drop below 1),
/// then the final forced zero.
fn generate_linear(total_days: usize, start_count: u32) -> Vec<u32> {
    let slots = total_days - 1;
    let step = start_count as f64 / slots as f64;

    let mut curve = Vec::with_capacity(total_days);
    for i in 0..slots {
        let value = (start_count as f64 - i as f64 * step).round().max(1.0) as u32;
        curve.push(value);
    }
    curve.push(0);

    curve[0] = start_count;
    let last = curve.len() - 1;
    curve[last] = 0;
    curve
}

/// The plan's target maximum for `today`.
///
/// `None` before the plan starts; days past the target date stay at 0.
pub fn today_limit(plan: &PlanState, today: NaiveDate) -> Option<u32> {
    let index = (today - plan.spec.start_date).num_days();
    if index < 0 {
        return None;
    }
    Some(plan.curve.get(index as usize).copied().unwrap_or(0))
}
