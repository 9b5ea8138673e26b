//! Argument groups shared by several subcommands.

use anyhow::Result;
use clap::Args;

use ketoplan_core::targets::{CookingPreference, Goal, Preferences, RepeatTolerance, UserTargets};

/// Numeric targets the plan is validated against.
#[derive(Debug, Clone, Args)]
pub struct TargetArgs {
    /// Daily calorie target (kcal)
    #[arg(long)]
    pub calories: f64,
    /// Daily protein target (g)
    #[arg(long)]
    pub protein: f64,
    /// Weekly grocery budget (GBP)
    #[arg(long)]
    pub budget: f64,
    /// Turn off the strict keto net-carb window (20-30 g/day)
    #[arg(long)]
    pub no_keto: bool,
}

impl TargetArgs {
    pub fn to_targets(&self) -> Result<UserTargets> {
        Ok(UserTargets::new(
            self.calories,
            self.protein,
            self.budget,
            !self.no_keto,
        )?)
    }
}

/// Preferences that shape the prompt but are never validated.
#[derive(Debug, Clone, Args)]
pub struct PreferenceArgs {
    /// Body weight (kg)
    #[arg(long, default_value_t = 83.0)]
    pub weight: f64,
    /// Goal: fat-loss, muscle-gain, recomp
    #[arg(long, default_value_t = Goal::Recomp)]
    pub goal: Goal,
    /// Training routine, free text
    #[arg(long, default_value = "5 gym sessions + 2 runs/week")]
    pub training: String,
    /// Dietary restrictions and dislikes, free text
    #[arg(long, default_value = "No sugar or grains. Avoid ultra-processed foods.")]
    pub restrictions: String,
    /// Tolerance for repeated meals: low, medium, high
    #[arg(long, default_value_t = RepeatTolerance::Medium)]
    pub repeat: RepeatTolerance,
    /// Cooking style: one-batch, batch-plus-top-up, cook-fresh
    #[arg(long, default_value_t = CookingPreference::OneBatch)]
    pub cooking: CookingPreference,
    /// Do not ask for optional snacks
    #[arg(long)]
    pub no_snacks: bool,
}

impl PreferenceArgs {
    pub fn to_preferences(&self) -> Preferences {
        Preferences {
            weight_kg: self.weight,
            goal: self.goal,
            training_routine: self.training.clone(),
            restrictions: self.restrictions.clone(),
            repeat_tolerance: self.repeat,
            cooking_preference: self.cooking,
            include_snacks: !self.no_snacks,
        }
    }
}
