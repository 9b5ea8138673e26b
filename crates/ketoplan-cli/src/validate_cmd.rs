//! `ketoplan validate` command: re-check a saved plan offline.

use std::path::Path;

use anyhow::{Context, Result, bail};

use ketoplan_core::plan::parse_plan_json;
use ketoplan_core::validate::validate_plan;

use crate::args::TargetArgs;
use crate::summary::present;

/// Run the validate command. With `strict`, any violation is an error.
pub fn run_validate(file: &Path, targets: &TargetArgs, output: Option<&Path>, strict: bool) -> Result<()> {
    let targets = targets.to_targets()?;

    let raw = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read plan file {}", file.display()))?;
    let plan = parse_plan_json(&raw)
        .with_context(|| format!("failed to parse plan file {}", file.display()))?;

    let result = validate_plan(&plan, &targets);
    present(&plan, &targets, &result, output)?;

    if strict && !result.pass() {
        bail!("plan has {} violation(s)", result.violations.len());
    }
    Ok(())
}
