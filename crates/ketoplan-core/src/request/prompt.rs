//! Prompt construction.
//!
//! Assembles the system prompt (role, constraints, output schema) and the
//! user messages (targets, preferences, optional price hints). This module
//! is pure logic: no I/O.

use serde::Serialize;
use serde_json::{Value, json};

use super::PromptContext;

/// Chat role of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// One chat message as sent to the provider.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Output schema the model must follow. Mirrors [`crate::plan::MealPlan`].
const OUTPUT_SCHEMA: &str = r#"## Output format (JSON only)

Return a single JSON object with these keys:

- days: exactly 7 objects, one per day, each with
  - day: integer 1-7
  - meals: array of strings; include exact ingredient weights in each meal
  - calories: number (kcal for the whole day)
  - protein_g: number
  - net_carbs_g: number
  - fat_g: number
  - cost_gbp: number (estimated cost of that day's food)
- total_cost_gbp: number (the whole week's shopping)
- shopping_list: [{name, pack_size, unit_price_gbp, quantity, line_total_gbp}]
- batch_cooking_guide: string
- flavour_rotation: [string]
- optional_snacks: [{name, serving_desc, protein_g, net_carbs_g, fat_g, kcal, price_gbp}]
"#;

/// Planning rules included in the system prompt.
const PLANNING_RULES: &str = r#"## Constraints

- Keep total_cost_gbp at or under the user's weekly budget.
- Hit the daily protein target and the daily calorie target within 5% every day.
- If keto_strict is true, keep every day's net carbs between 20 g and 30 g.
- Prefer the best price per gram of protein, using real supermarket pack sizes and prices. Use the supplied price hints when present.
- Plan 2 main meals per day, plus optional snacks only if requested.
- Every meal must be batch-prep friendly and keep for the week with minimal mid-week cooking.
- Reuse ingredients to minimise waste, but rotate flavours to avoid fatigue.
- Minimise ultra-processed foods unless the user asks otherwise.
- Use metric weights and UK spelling.
"#;

/// Build the system prompt.
pub fn build_system_prompt() -> String {
    let mut prompt = String::with_capacity(2048);

    prompt.push_str("# Keto Meal Planner\n\n");
    prompt.push_str(
        "You are a nutrition and meal-planning assistant. You create keto-friendly, \
         high-protein, batch-cooking meal plans and shopping lists for UK supermarket \
         shoppers.\n\n",
    );
    prompt.push_str(
        "When asked, produce a complete 7-day cooking plan and shopping list from the \
         user's details, targets and preferences.\n\n",
    );

    prompt.push_str(PLANNING_RULES);
    prompt.push('\n');
    prompt.push_str(OUTPUT_SCHEMA);
    prompt.push('\n');
    prompt.push_str("Respond with the JSON object only. Do not wrap it in Markdown.\n");

    prompt
}

/// Build the JSON object describing the user's targets and preferences.
pub fn build_user_context(ctx: &PromptContext) -> Value {
    let prefs = &ctx.preferences;
    let targets = &ctx.targets;
    json!({
        "weight_kg": prefs.weight_kg,
        "goal": prefs.goal.label(),
        "training_routine": prefs.training_routine,
        "daily_protein_target_g": targets.daily_protein_g,
        "daily_calorie_target_kcal": targets.daily_calories,
        "keto_strict": targets.strict_keto,
        "dietary_restrictions": prefs.restrictions,
        "repeat_tolerance": prefs.repeat_tolerance.label(),
        "cooking_preference": prefs.cooking_preference.label(),
        "include_snacks": prefs.include_snacks,
        "budget_gbp": targets.weekly_budget_gbp,
    })
}

/// Build the full message list: system prompt, user context, and price
/// hints when a non-empty price table is present.
pub fn build_messages(ctx: &PromptContext) -> Vec<ChatMessage> {
    let user_context = serde_json::to_string_pretty(&build_user_context(ctx))
        .unwrap_or_else(|_| build_user_context(ctx).to_string());

    let mut messages = vec![
        ChatMessage::new(Role::System, build_system_prompt()),
        ChatMessage::new(
            Role::User,
            format!("Here are my preferences and goals:\n{user_context}"),
        ),
    ];

    if let Some(prices) = ctx.prices.as_ref().filter(|p| !p.is_empty()) {
        let records: Vec<_> = prices.entries().collect();
        let records = serde_json::to_string(&records).unwrap_or_else(|_| "[]".to_string());
        messages.push(ChatMessage::new(
            Role::User,
            format!("Here are current supermarket price hints (name, pack_size, price_gbp):\n{records}"),
        ));
    }

    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prices::{PriceEntry, PriceTable};
    use crate::targets::{Goal, Preferences, UserTargets};

    fn sample_context() -> PromptContext {
        PromptContext {
            targets: UserTargets::new(2200.0, 165.0, 60.0, true).unwrap(),
            preferences: Preferences::default(),
            prices: None,
            model: "gpt-4o-mini".to_string(),
        }
    }

    #[test]
    fn system_prompt_names_output_schema() {
        let prompt = build_system_prompt();
        assert!(prompt.contains("Output format (JSON only)"));
        for key in ["days", "protein_g", "net_carbs_g", "cost_gbp", "total_cost_gbp"] {
            assert!(prompt.contains(key), "prompt should mention {key}");
        }
    }

    #[test]
    fn system_prompt_states_validation_rules() {
        let prompt = build_system_prompt();
        assert!(prompt.contains("within 5%"));
        assert!(prompt.contains("between 20 g and 30 g"));
        assert!(prompt.contains("weekly budget"));
    }

    #[test]
    fn user_context_carries_targets_and_preferences() {
        let mut ctx = sample_context();
        ctx.preferences.goal = Goal::FatLoss;
        let value = build_user_context(&ctx);
        assert_eq!(value["daily_protein_target_g"], 165.0);
        assert_eq!(value["daily_calorie_target_kcal"], 2200.0);
        assert_eq!(value["budget_gbp"], 60.0);
        assert_eq!(value["keto_strict"], true);
        assert_eq!(value["goal"], "Fat loss");
        assert_eq!(value["cooking_preference"], "One weekly batch-cook");
    }

    #[test]
    fn messages_without_prices() {
        let messages = build_messages(&sample_context());
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[1].role, Role::User);
        assert!(messages[1].content.contains("\"budget_gbp\": 60.0"));
    }

    #[test]
    fn messages_include_price_hints() {
        let mut ctx = sample_context();
        ctx.prices = Some(PriceTable::from_iter([PriceEntry {
            name: "Eggs".to_string(),
            pack_size: "15 pack".to_string(),
            price_gbp: 2.65,
        }]));
        let messages = build_messages(&ctx);
        assert_eq!(messages.len(), 3);
        assert!(messages[2].content.contains("price hints"));
        assert!(messages[2].content.contains(r#""name":"Eggs""#));
        assert!(messages[2].content.contains(r#""price_gbp":2.65"#));
    }

    #[test]
    fn empty_price_table_adds_no_message() {
        let mut ctx = sample_context();
        ctx.prices = Some(PriceTable::default());
        assert_eq!(build_messages(&ctx).len(), 2);
    }

    #[test]
    fn role_serializes_lowercase() {
        let msg = ChatMessage::new(Role::System, "hi");
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({"role": "system", "content": "hi"})
        );
    }
}
