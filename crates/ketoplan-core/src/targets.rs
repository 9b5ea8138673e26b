//! User targets and preferences collected once per session.
//!
//! [`UserTargets`] carries the numeric constraints the validator enforces.
//! [`Preferences`] carries everything else the user tells us; it only shapes
//! the prompt and is never checked against the plan.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Targets
// ---------------------------------------------------------------------------

/// Errors returned when constructing [`UserTargets`] from raw numbers.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TargetsError {
    #[error("{field} must be a finite number greater than zero (got {value})")]
    NotPositive { field: &'static str, value: f64 },
}

/// Numeric constraints the generated plan must satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct UserTargets {
    /// Daily calorie target in kcal.
    pub daily_calories: f64,
    /// Daily protein target in grams.
    pub daily_protein_g: f64,
    /// Weekly grocery budget in GBP.
    pub weekly_budget_gbp: f64,
    /// Whether net carbs must stay within the strict keto window.
    pub strict_keto: bool,
}

impl UserTargets {
    /// Build targets, rejecting zero, negative and non-finite numbers.
    pub fn new(
        daily_calories: f64,
        daily_protein_g: f64,
        weekly_budget_gbp: f64,
        strict_keto: bool,
    ) -> Result<Self, TargetsError> {
        check_positive("daily calorie target", daily_calories)?;
        check_positive("daily protein target", daily_protein_g)?;
        check_positive("weekly budget", weekly_budget_gbp)?;
        Ok(Self {
            daily_calories,
            daily_protein_g,
            weekly_budget_gbp,
            strict_keto,
        })
    }
}

fn check_positive(field: &'static str, value: f64) -> Result<(), TargetsError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(TargetsError::NotPositive { field, value })
    }
}

// ---------------------------------------------------------------------------
// Preference enums
// ---------------------------------------------------------------------------

/// Error returned when parsing an unknown preference value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {kind} {value:?} (expected one of: {expected})")]
pub struct PreferenceParseError {
    pub kind: &'static str,
    pub value: String,
    pub expected: &'static str,
}

/// What the user is training for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Goal {
    FatLoss,
    MuscleGain,
    #[default]
    Recomp,
}

impl Goal {
    /// Label used in the prompt.
    pub fn label(self) -> &'static str {
        match self {
            Self::FatLoss => "Fat loss",
            Self::MuscleGain => "Muscle gain",
            Self::Recomp => "Recomp",
        }
    }
}

impl fmt::Display for Goal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::FatLoss => "fat-loss",
            Self::MuscleGain => "muscle-gain",
            Self::Recomp => "recomp",
        };
        f.write_str(s)
    }
}

impl FromStr for Goal {
    type Err = PreferenceParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fat-loss" => Ok(Self::FatLoss),
            "muscle-gain" => Ok(Self::MuscleGain),
            "recomp" => Ok(Self::Recomp),
            other => Err(PreferenceParseError {
                kind: "goal",
                value: other.to_owned(),
                expected: "fat-loss, muscle-gain, recomp",
            }),
        }
    }
}

/// How happy the user is to eat the same meal several times a week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RepeatTolerance {
    Low,
    #[default]
    Medium,
    High,
}

impl RepeatTolerance {
    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "Low (varied daily)",
            Self::Medium => "Medium (repeat some meals)",
            Self::High => "High (happy to repeat often)",
        }
    }
}

impl fmt::Display for RepeatTolerance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        };
        f.write_str(s)
    }
}

impl FromStr for RepeatTolerance {
    type Err = PreferenceParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(PreferenceParseError {
                kind: "repeat tolerance",
                value: other.to_owned(),
                expected: "low, medium, high",
            }),
        }
    }
}

/// How the user wants to spread cooking across the week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CookingPreference {
    #[default]
    OneBatch,
    BatchPlusTopUp,
    CookFresh,
}

impl CookingPreference {
    pub fn label(self) -> &'static str {
        match self {
            Self::OneBatch => "One weekly batch-cook",
            Self::BatchPlusTopUp => "One batch + midweek top-up",
            Self::CookFresh => "Cook fresh most days",
        }
    }
}

impl fmt::Display for CookingPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::OneBatch => "one-batch",
            Self::BatchPlusTopUp => "batch-plus-top-up",
            Self::CookFresh => "cook-fresh",
        };
        f.write_str(s)
    }
}

impl FromStr for CookingPreference {
    type Err = PreferenceParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "one-batch" => Ok(Self::OneBatch),
            "batch-plus-top-up" => Ok(Self::BatchPlusTopUp),
            "cook-fresh" => Ok(Self::CookFresh),
            other => Err(PreferenceParseError {
                kind: "cooking preference",
                value: other.to_owned(),
                expected: "one-batch, batch-plus-top-up, cook-fresh",
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Preferences
// ---------------------------------------------------------------------------

/// Free-form preferences that shape the prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct Preferences {
    /// Body weight in kilograms.
    pub weight_kg: f64,
    pub goal: Goal,
    /// Training routine, e.g. "5 gym sessions + 2 runs/week".
    pub training_routine: String,
    /// Dietary restrictions and dislikes.
    pub restrictions: String,
    pub repeat_tolerance: RepeatTolerance,
    pub cooking_preference: CookingPreference,
    /// Whether the plan should suggest optional snacks.
    pub include_snacks: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            weight_kg: 83.0,
            goal: Goal::default(),
            training_routine: "5 gym sessions + 2 runs/week".to_string(),
            restrictions: "No sugar or grains. Avoid ultra-processed foods.".to_string(),
            repeat_tolerance: RepeatTolerance::default(),
            cooking_preference: CookingPreference::default(),
            include_snacks: true,
        }
    }
}
