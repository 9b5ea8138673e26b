//! Meal plan documents: types and response parsing.

pub mod parser;
pub mod types;

pub use parser::{PlanParseError, parse_plan_json};
pub use types::{Amount, DayLabel, MealPlan, MealPlanDay, PLAN_DAYS};
