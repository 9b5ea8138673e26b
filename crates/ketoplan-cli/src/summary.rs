//! Terminal summary of a validated plan.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::Result;

use ketoplan_core::plan::{Amount, MealPlan};
use ketoplan_core::report::PlanReport;
use ketoplan_core::targets::UserTargets;
use ketoplan_core::validate::{ValidationResult, validate_day};

/// Render the per-day table, weekly cost and validation outcome.
pub fn render_summary(plan: &MealPlan, targets: &UserTargets, result: &ValidationResult) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "Targets: {} kcal, {} g protein, £{:.2}/week, strict keto {}",
        targets.daily_calories,
        targets.daily_protein_g,
        targets.weekly_budget_gbp,
        if targets.strict_keto { "on" } else { "off" }
    );
    let _ = writeln!(out);

    let _ = writeln!(
        out,
        "{:<12} {:>8} {:>10} {:>10} {:>9} {:>7}",
        "DAY", "KCAL", "PROTEIN", "NET CARBS", "COST", "ISSUES"
    );
    let _ = writeln!(out, "{}", "-".repeat(61));

    for (i, day) in plan.days.iter().enumerate() {
        let label = day.label(i);
        let issues = validate_day(day, i, targets).len();
        let _ = writeln!(
            out,
            "{:<12} {:>8} {:>10} {:>10} {:>9} {:>7}",
            label,
            cell(day.calories.as_ref(), ""),
            cell(day.protein_g.as_ref(), " g"),
            cell(day.net_carbs_g.as_ref(), " g"),
            money(day.cost_gbp.as_ref()),
            if issues > 0 { issues.to_string() } else { "-".to_string() },
        );
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "Weekly total: {}", money(plan.total_cost_gbp.as_ref()));
    if let Some(items) = plan.shopping_items().filter(|n| *n > 0) {
        let _ = writeln!(out, "Shopping list: {items} items");
    }
    let _ = writeln!(out);

    if result.pass() {
        let _ = writeln!(out, "PASS: plan meets every target.");
    } else {
        let _ = writeln!(out, "FAIL: {} violation(s)", result.violations.len());
        for message in result.messages() {
            let _ = writeln!(out, "  - {message}");
        }
    }

    out
}

/// Print the summary and write the report to `output`.
///
/// An output of `-` sends the report JSON to stdout and the summary to
/// stderr, so the JSON can be piped.
pub fn present(
    plan: &MealPlan,
    targets: &UserTargets,
    result: &ValidationResult,
    output: Option<&Path>,
) -> Result<()> {
    let summary = render_summary(plan, targets, result);
    let to_stdout = output == Some(Path::new("-"));

    if to_stdout {
        eprint!("{summary}");
    } else {
        print!("{summary}");
    }

    let Some(path) = output else {
        return Ok(());
    };
    let report = PlanReport::new(plan, result);
    if to_stdout {
        println!("{}", report.to_json_pretty()?);
    } else {
        report.write_to(path)?;
        println!();
        println!("Report written to {}", path.display());
    }
    Ok(())
}

fn cell(amount: Option<&Amount>, unit: &str) -> String {
    match amount {
        None => "-".to_string(),
        Some(a) => match a.value() {
            Some(v) => format!("{}{unit}", trim_number(v)),
            None => "?".to_string(),
        },
    }
}

fn money(amount: Option<&Amount>) -> String {
    match amount {
        None => "-".to_string(),
        Some(a) => match a.value() {
            Some(v) => format!("£{v:.2}"),
            None => "?".to_string(),
        },
    }
}

/// Whole numbers without a trailing ".0", everything else to one decimal.
fn trim_number(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{v:.0}")
    } else {
        format!("{v:.1}")
    }
}
