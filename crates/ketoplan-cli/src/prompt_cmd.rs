//! `ketoplan prompt` command: print the messages a generate run would send.

use std::path::Path;

use anyhow::{Context, Result};

use ketoplan_core::prices::load_price_csv;
use ketoplan_core::request::openai::DEFAULT_MODEL;
use ketoplan_core::request::{Role, build_messages};
use ketoplan_core::session::PlanSession;

use crate::args::{PreferenceArgs, TargetArgs};

/// Run the prompt command. No API key or network access is needed.
pub fn run_prompt(
    targets: &TargetArgs,
    prefs: &PreferenceArgs,
    prices: Option<&Path>,
    json: bool,
) -> Result<()> {
    let mut session =
        PlanSession::new(targets.to_targets()?, DEFAULT_MODEL).with_preferences(prefs.to_preferences());
    if let Some(path) = prices {
        session = session.with_prices(load_price_csv(path)?);
    }

    let messages = build_messages(session.context());

    if json {
        let out = serde_json::to_string_pretty(&messages).context("failed to serialize messages")?;
        println!("{out}");
        return Ok(());
    }

    for (i, message) in messages.iter().enumerate() {
        if i > 0 {
            println!();
        }
        let role = match message.role {
            Role::System => "system",
            Role::User => "user",
        };
        println!("=== {role} ===");
        println!("{}", message.content);
    }
    Ok(())
}
