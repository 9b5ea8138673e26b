//! Violation and validation result types.

use std::fmt;

/// A per-day numeric field the validator reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Calories,
    Protein,
    NetCarbs,
    Cost,
}

impl Field {
    /// JSON key of the field in a `days[]` entry.
    pub fn key(self) -> &'static str {
        match self {
            Self::Calories => "calories",
            Self::Protein => "protein_g",
            Self::NetCarbs => "net_carbs_g",
            Self::Cost => "cost_gbp",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A macro checked against a daily target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Calories,
    Protein,
}

impl Metric {
    fn unit(self) -> &'static str {
        match self {
            Self::Calories => "kcal",
            Self::Protein => "g",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Calories => f.write_str("Calories"),
            Self::Protein => f.write_str("Protein"),
        }
    }
}

/// A single named, quantified failure of a plan to meet the user's targets.
#[derive(Debug, Clone, PartialEq)]
pub enum Violation {
    /// The plan has no days at all.
    EmptyPlan,
    /// The plan does not cover exactly one week.
    DayCountMismatch { expected: usize, actual: usize },
    /// A required numeric field is absent from a day.
    MissingField { day: String, field: Field },
    /// A numeric field holds something that is not a number.
    NonNumericField {
        day: String,
        field: Field,
        raw: String,
    },
    /// Calories or protein deviate from the daily target by more than the
    /// tolerance. `deviation` is relative (0.133 = 13.3%).
    MacroOffTarget {
        day: String,
        metric: Metric,
        actual: f64,
        target: f64,
        deviation: f64,
    },
    /// Strict keto is on and net carbs fall outside the allowed window.
    NetCarbsOutOfRange { day: String, actual: f64 },
    /// The reported weekly total is not a number.
    NonNumericTotal { raw: String },
    /// Neither a weekly total nor any daily cost was provided.
    MissingTotalCost,
    /// The reported weekly total disagrees with the sum of daily costs.
    CostDiscrepancy { reported: f64, computed: f64 },
    /// The weekly cost is over budget. `overage` is rounded to pennies.
    BudgetExceeded {
        total: f64,
        budget: f64,
        overage: f64,
    },
}

impl Violation {
    /// The day label this violation refers to, if it is day-specific.
    pub fn day(&self) -> Option<&str> {
        match self {
            Self::MissingField { day, .. }
            | Self::NonNumericField { day, .. }
            | Self::MacroOffTarget { day, .. }
            | Self::NetCarbsOutOfRange { day, .. } => Some(day),
            _ => None,
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyPlan => write!(f, "Plan contains no days"),
            Self::DayCountMismatch { expected, actual } => {
                write!(f, "Plan has {actual} days, expected {expected}")
            }
            Self::MissingField { day, field } => write!(f, "Missing {field} on {day}"),
            Self::NonNumericField { day, field, raw } => {
                write!(f, "{field} on {day} is not a number: {raw}")
            }
            Self::MacroOffTarget {
                day,
                metric,
                actual,
                target,
                deviation,
            } => {
                let unit = metric.unit();
                write!(
                    f,
                    "{metric} off target on {day}: {actual} {unit} vs target {target} {unit} ({:.1}% off, limit ±5%)",
                    deviation * 100.0
                )
            }
            Self::NetCarbsOutOfRange { day, actual } => {
                write!(f, "Net carbs outside 20–30 g on {day}: {actual} g")
            }
            Self::NonNumericTotal { raw } => write!(f, "total_cost_gbp is not a number: {raw}"),
            Self::MissingTotalCost => {
                write!(f, "Plan reports neither a weekly total nor any daily cost")
            }
            Self::CostDiscrepancy { reported, computed } => write!(
                f,
                "Reported weekly total £{reported:.2} disagrees with sum of daily costs £{computed:.2}"
            ),
            Self::BudgetExceeded {
                total,
                budget,
                overage,
            } => write!(
                f,
                "Budget exceeded: £{total:.2} > £{budget:.2} (over by £{overage:.2})"
            ),
        }
    }
}

/// Outcome of validating one plan: every violation found, in check order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValidationResult {
    pub violations: Vec<Violation>,
}

impl ValidationResult {
    /// `true` iff no violations were found.
    pub fn pass(&self) -> bool {
        self.violations.is_empty()
    }

    /// Human-readable messages, one per violation.
    pub fn messages(&self) -> Vec<String> {
        self.violations.iter().map(ToString::to_string).collect()
    }

    /// Violations that refer to the given day label.
    pub fn for_day<'a>(&'a self, day: &'a str) -> impl Iterator<Item = &'a Violation> + 'a {
        self.violations.iter().filter(move |v| v.day() == Some(day))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn macro_message_names_day_metric_and_values() {
        let v = Violation::MacroOffTarget {
            day: "day 3".to_string(),
            metric: Metric::Protein,
            actual: 170.0,
            target: 150.0,
            deviation: 20.0 / 150.0,
        };
        assert_eq!(
            v.to_string(),
            "Protein off target on day 3: 170 g vs target 150 g (13.3% off, limit ±5%)"
        );
    }

    #[test]
    fn budget_message_names_overage() {
        let v = Violation::BudgetExceeded {
            total: 60.01,
            budget: 60.0,
            overage: 0.01,
        };
        assert_eq!(v.to_string(), "Budget exceeded: £60.01 > £60.00 (over by £0.01)");
    }

    #[test]
    fn day_is_only_set_for_day_violations() {
        let day = Violation::NetCarbsOutOfRange {
            day: "Monday".to_string(),
            actual: 35.0,
        };
        assert_eq!(day.day(), Some("Monday"));
        assert_eq!(Violation::EmptyPlan.day(), None);
    }

    #[test]
    fn empty_result_passes() {
        let result = ValidationResult::default();
        assert!(result.pass());
        assert!(result.messages().is_empty());
    }
}
