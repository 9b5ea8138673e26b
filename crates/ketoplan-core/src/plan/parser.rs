//! Model response parser with shape checking.
//!
//! Parses the raw text returned by the model into a [`MealPlan`] and checks:
//! - The text is non-empty JSON (optionally wrapped in a Markdown fence).
//! - The top level is an object with a `days` array.
//! - Every `days[]` entry is an object.
//!
//! Anything past that (missing or non-numeric fields, wrong day count) is
//! left to the validator, which reports it as a violation.

use serde_json::Value;
use thiserror::Error;

use super::types::MealPlan;

/// Errors that can occur while turning model output into a [`MealPlan`].
#[derive(Debug, Error)]
pub enum PlanParseError {
    #[error("response is empty")]
    Empty,

    #[error("response is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("response JSON is not an object (found {0})")]
    NotAnObject(&'static str),

    #[error("response has no \"days\" array")]
    MissingDays,

    #[error("unexpected plan shape: {0}")]
    Shape(String),
}

/// Parse raw model output into a [`MealPlan`].
pub fn parse_plan_json(raw: &str) -> Result<MealPlan, PlanParseError> {
    let body = strip_code_fence(raw);
    if body.is_empty() {
        return Err(PlanParseError::Empty);
    }

    let value: Value = serde_json::from_str(body)?;
    check_shape(&value)?;

    serde_json::from_value(value).map_err(|e| PlanParseError::Shape(e.to_string()))
}

/// Trim whitespace and a surrounding ```` ``` ```` / ```` ```json ```` fence.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") up to the first newline.
    let rest = match rest.find('\n') {
        Some(pos) => &rest[pos + 1..],
        None => rest,
    };
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn check_shape(value: &Value) -> Result<(), PlanParseError> {
    let obj = value
        .as_object()
        .ok_or_else(|| PlanParseError::NotAnObject(json_type(value)))?;

    let days = obj.get("days").ok_or(PlanParseError::MissingDays)?;
    let days = days.as_array().ok_or_else(|| {
        PlanParseError::Shape(format!("\"days\" must be an array, found {}", json_type(days)))
    })?;

    for (i, day) in days.iter().enumerate() {
        if !day.is_object() {
            return Err(PlanParseError::Shape(format!(
                "days[{i}] must be an object, found {}",
                json_type(day)
            )));
        }
    }

    Ok(())
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
