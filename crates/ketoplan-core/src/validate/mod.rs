//! Plan validator: checks a parsed [`MealPlan`] against [`UserTargets`].
//!
//! Every check runs regardless of earlier failures, so the caller sees the
//! full list of violations in one pass. Malformed values inside the plan are
//! reported as violations; only the response parser rejects input outright.
//!
//! Boundaries are inclusive: a deviation of exactly 5% passes, net carbs of
//! exactly 20 g or 30 g pass, and a weekly total that rounds to the budget in
//! pennies passes.

pub mod violation;

use std::ops::RangeInclusive;

use crate::plan::{Amount, MealPlan, MealPlanDay, PLAN_DAYS};
use crate::targets::UserTargets;

pub use violation::{Field, Metric, ValidationResult, Violation};

/// Allowed relative deviation of daily calories and protein from target.
pub const MACRO_TOLERANCE: f64 = 0.05;

/// Allowed daily net carbs in grams under strict keto.
pub const NET_CARBS_RANGE: RangeInclusive<f64> = 20.0..=30.0;

/// Allowed relative disagreement between the reported weekly total and the
/// sum of daily costs.
pub const COST_DISCREPANCY_TOLERANCE: f64 = 0.01;

/// Absorbs binary rounding so that a value sitting exactly on a tolerance
/// boundary is not pushed over it.
const EPSILON: f64 = 1e-9;

/// Validate `plan` against `targets`, collecting every violation.
///
/// Checks, in order:
/// 1. The plan has exactly [`PLAN_DAYS`] days (empty plans are reported
///    separately).
/// 2. Per day: calories and protein within [`MACRO_TOLERANCE`] of target;
///    net carbs within [`NET_CARBS_RANGE`] when strict keto is on; a
///    numeric daily cost.
/// 3. Weekly cost: reported total vs. summed daily costs, then the
///    effective total (reported preferred) vs. the budget.
pub fn validate_plan(plan: &MealPlan, targets: &UserTargets) -> ValidationResult {
    let mut violations = Vec::new();

    match plan.days.len() {
        0 => violations.push(Violation::EmptyPlan),
        n if n != PLAN_DAYS => violations.push(Violation::DayCountMismatch {
            expected: PLAN_DAYS,
            actual: n,
        }),
        _ => {}
    }

    let mut cost_sum = 0.0;
    let mut costed_days = 0usize;

    for (i, day) in plan.days.iter().enumerate() {
        violations.extend(validate_day(day, i, targets));

        if let Some(cost) = day.cost_gbp.as_ref().and_then(Amount::value) {
            cost_sum += cost;
            costed_days += 1;
        }
    }

    let computed = (costed_days > 0).then_some(cost_sum);
    check_cost(
        &mut violations,
        plan.total_cost_gbp.as_ref(),
        computed,
        targets.weekly_budget_gbp,
    );

    tracing::debug!(
        days = plan.days.len(),
        violations = violations.len(),
        "validated meal plan"
    );

    ValidationResult { violations }
}

/// Check one day entry. `position` is the 0-based index in `days`, used for
/// the label when the entry has no `day` field.
pub fn validate_day(day: &MealPlanDay, position: usize, targets: &UserTargets) -> Vec<Violation> {
    let mut violations = Vec::new();
    let label = day.label(position);

    if let Some(kcal) = read_field(&mut violations, &label, Field::Calories, &day.calories) {
        check_macro(&mut violations, &label, Metric::Calories, kcal, targets.daily_calories);
    }

    if let Some(protein) = read_field(&mut violations, &label, Field::Protein, &day.protein_g) {
        check_macro(&mut violations, &label, Metric::Protein, protein, targets.daily_protein_g);
    }

    if targets.strict_keto {
        if let Some(carbs) = read_field(&mut violations, &label, Field::NetCarbs, &day.net_carbs_g) {
            if !NET_CARBS_RANGE.contains(&carbs) {
                violations.push(Violation::NetCarbsOutOfRange {
                    day: label.clone(),
                    actual: carbs,
                });
            }
        }
    }

    read_field(&mut violations, &label, Field::Cost, &day.cost_gbp);
    violations
}

/// Read a numeric day field, recording a violation if it is missing or not a
/// number.
fn read_field(
    violations: &mut Vec<Violation>,
    day: &str,
    field: Field,
    value: &Option<Amount>,
) -> Option<f64> {
    let Some(amount) = value else {
        violations.push(Violation::MissingField {
            day: day.to_string(),
            field,
        });
        return None;
    };

    let parsed = amount.value();
    if parsed.is_none() {
        violations.push(Violation::NonNumericField {
            day: day.to_string(),
            field,
            raw: amount.to_string(),
        });
    }
    parsed
}

/// Relative deviation of `actual` from `target`. `target` is always positive
/// (enforced by [`UserTargets::new`]).
pub fn relative_deviation(actual: f64, target: f64) -> f64 {
    (actual - target).abs() / target
}

fn check_macro(
    violations: &mut Vec<Violation>,
    day: &str,
    metric: Metric,
    actual: f64,
    target: f64,
) {
    let deviation = relative_deviation(actual, target);
    if deviation > MACRO_TOLERANCE + EPSILON {
        violations.push(Violation::MacroOffTarget {
            day: day.to_string(),
            metric,
            actual,
            target,
            deviation,
        });
    }
}

fn check_cost(
    violations: &mut Vec<Violation>,
    reported: Option<&Amount>,
    computed: Option<f64>,
    budget: f64,
) {
    let mut total_unreadable = false;
    let reported = match reported {
        None => None,
        Some(amount) => {
            let value = amount.value();
            if value.is_none() {
                violations.push(Violation::NonNumericTotal {
                    raw: amount.to_string(),
                });
                total_unreadable = true;
            }
            value
        }
    };

    if let (Some(reported), Some(computed)) = (reported, computed) {
        let scale = reported.abs().max(computed.abs());
        if scale > 0.0 && (reported - computed).abs() / scale > COST_DISCREPANCY_TOLERANCE + EPSILON
        {
            violations.push(Violation::CostDiscrepancy { reported, computed });
        }
    }

    let Some(total) = reported.or(computed) else {
        if !total_unreadable {
            violations.push(Violation::MissingTotalCost);
        }
        return;
    };

    // Budgets are in pennies: anything that rounds to £0.00 over is on budget.
    let overage = round_pennies(total - budget);
    if overage > 0.0 {
        violations.push(Violation::BudgetExceeded {
            total,
            budget,
            overage,
        });
    }
}

fn round_pennies(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}
