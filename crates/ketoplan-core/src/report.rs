//! Report document: the validated plan plus its validation summary, in the
//! JSON shape users download.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::plan::MealPlan;
use crate::validate::ValidationResult;

/// The `validation` section of a report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationSummary {
    pub pass: bool,
    pub violations: Vec<String>,
}

impl From<&ValidationResult> for ValidationSummary {
    fn from(result: &ValidationResult) -> Self {
        Self {
            pass: result.pass(),
            violations: result.messages(),
        }
    }
}

/// A plan with its validation outcome attached.
#[derive(Debug, Clone, Serialize)]
pub struct PlanReport<'a> {
    #[serde(flatten)]
    pub plan: &'a MealPlan,
    pub validation: ValidationSummary,
}

impl<'a> PlanReport<'a> {
    pub fn new(plan: &'a MealPlan, result: &ValidationResult) -> Self {
        Self {
            plan,
            validation: ValidationSummary::from(result),
        }
    }

    /// Pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("failed to serialize plan report")
    }

    /// Write the report as pretty JSON to `path`.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let json = self.to_json_pretty()?;
        std::fs::write(path, json + "\n")
            .with_context(|| format!("failed to write report to {}", path.display()))
    }
}
