//! Meal plan document types.
//!
//! These types map directly to the JSON document the model returns (and that
//! we write back out) and are deserialized via `serde`. Numeric fields are
//! deliberately lenient: the model sometimes emits numbers as strings or
//! leaves fields out, and the validator reports those defects instead of
//! the parser rejecting the whole plan.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Number of days a complete plan covers.
pub const PLAN_DAYS: usize = 7;

/// A numeric field as the model wrote it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Amount {
    Number(f64),
    Text(String),
    Other(Value),
}

impl Amount {
    /// The numeric value, accepting numeric strings such as `"150"` or
    /// `" 24.5 "`.
    ///
    /// Returns `None` for text that is not a number, non-finite values and
    /// any other JSON type.
    pub fn value(&self) -> Option<f64> {
        match self {
            Self::Number(n) if n.is_finite() => Some(*n),
            Self::Number(_) => None,
            Self::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            Self::Other(_) => None,
        }
    }
}

impl From<f64> for Amount {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s:?}"),
            Self::Other(v) => write!(f, "{v}"),
        }
    }
}

/// The `day` field of a plan entry: an index or a weekday name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DayLabel {
    Index(u64),
    Name(String),
    Other(Value),
}

impl fmt::Display for DayLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(n) => write!(f, "day {n}"),
            Self::Name(s) => f.write_str(s),
            Self::Other(v) => write!(f, "day {v}"),
        }
    }
}

/// One `days[]` entry.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MealPlanDay {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day: Option<DayLabel>,
    /// Meal descriptions as the model wrote them. Never validated.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub meals: Value,
    /// Total kcal for the day.
    #[serde(default, alias = "kcal", skip_serializing_if = "Option::is_none")]
    pub calories: Option<Amount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protein_g: Option<Amount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub net_carbs_g: Option<Amount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fat_g: Option<Amount>,
    /// Estimated cost of the day's food in GBP.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_gbp: Option<Amount>,
}

impl MealPlanDay {
    /// Label used in violation messages. Falls back to the 1-based position
    /// when the model left the `day` field out.
    pub fn label(&self, position: usize) -> String {
        match &self.day {
            Some(label) => label.to_string(),
            None => format!("day {}", position + 1),
        }
    }
}

/// A generated weekly meal plan.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MealPlan {
    /// Day entries in plan order. Should hold exactly [`PLAN_DAYS`] entries.
    pub days: Vec<MealPlanDay>,
    /// Reported total weekly cost in GBP.
    #[serde(
        default,
        alias = "total_weekly_cost_gbp",
        skip_serializing_if = "Option::is_none"
    )]
    pub total_cost_gbp: Option<Amount>,

    // Extras: carried through to the report as written, any JSON type.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub shopping_list: Value,
    /// Free text or a list of steps.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub batch_cooking_guide: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub flavour_rotation: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub optional_snacks: Value,
}

impl MealPlan {
    /// Number of shopping list entries, when the list is an array.
    pub fn shopping_items(&self) -> Option<usize> {
        self.shopping_list.as_array().map(Vec::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amount_accepts_numbers_and_numeric_strings() {
        assert_eq!(Amount::Number(150.0).value(), Some(150.0));
        assert_eq!(Amount::Text(" 24.5 ".to_string()).value(), Some(24.5));
        assert_eq!(Amount::Text("lots".to_string()).value(), None);
        assert_eq!(Amount::Other(Value::Bool(true)).value(), None);
    }

    #[test]
    fn amount_deserializes_each_json_type() {
        let values: Vec<Amount> = serde_json::from_str(r#"[165, "170", null, true]"#).unwrap();
        assert_eq!(values[0], Amount::Number(165.0));
        assert_eq!(values[1], Amount::Text("170".to_string()));
        assert_eq!(values[2], Amount::Other(Value::Null));
        assert_eq!(values[3], Amount::Other(Value::Bool(true)));
    }

    #[test]
    fn missing_numeric_field_is_none() {
        let day: MealPlanDay = serde_json::from_str(r#"{"day": 1, "meals": []}"#).unwrap();
        assert!(day.calories.is_none());
        assert!(day.cost_gbp.is_none());
        assert_eq!(day.day, Some(DayLabel::Index(1)));
    }

    #[test]
    fn kcal_alias_maps_to_calories() {
        let day: MealPlanDay = serde_json::from_str(r#"{"day": "Monday", "kcal": 2150}"#).unwrap();
        assert_eq!(day.calories, Some(Amount::Number(2150.0)));
        assert_eq!(day.label(0), "Monday");
    }

    #[test]
    fn label_falls_back_to_position() {
        let day = MealPlanDay::default();
        assert_eq!(day.label(2), "day 3");
    }

    #[test]
    fn meals_keep_whatever_shape_the_model_wrote() {
        let day: MealPlanDay =
            serde_json::from_str(r#"{"day": 1, "meals": ["Egg muffins", {"name": "Traybake"}]}"#)
                .unwrap();
        assert_eq!(day.meals, serde_json::json!(["Egg muffins", {"name": "Traybake"}]));

        let day: MealPlanDay = serde_json::from_str(r#"{"day": 2, "meals": null}"#).unwrap();
        assert!(day.meals.is_null());
    }

    #[test]
    fn mistyped_extras_are_kept_verbatim() {
        let plan: MealPlan = serde_json::from_str(
            r#"{
                "days": [],
                "flavour_rotation": "Mexican, then Thai",
                "optional_snacks": [{"name": null, "serving_desc": 30}],
                "shopping_list": {"eggs": 2}
            }"#,
        )
        .unwrap();
        assert_eq!(plan.flavour_rotation, Value::String("Mexican, then Thai".to_string()));
        assert_eq!(plan.optional_snacks[0]["serving_desc"], 30);
        assert_eq!(plan.shopping_items(), None);

        let back = serde_json::to_value(&plan).unwrap();
        assert_eq!(back["shopping_list"], serde_json::json!({"eggs": 2}));
    }

    #[test]
    fn legacy_total_key_is_accepted() {
        let plan: MealPlan =
            serde_json::from_str(r#"{"days": [], "total_weekly_cost_gbp": 58.4}"#).unwrap();
        assert_eq!(plan.total_cost_gbp, Some(Amount::Number(58.4)));
    }

    #[test]
    fn empty_extras_are_not_serialized() {
        let plan = MealPlan::default();
        let json = serde_json::to_value(&plan).unwrap();
        assert_eq!(json, serde_json::json!({ "days": [] }));
    }
}
