//! `ketoplan generate` command: request a plan, validate it, write the report.

use std::path::{Path, PathBuf};

use anyhow::{Result, bail};

use ketoplan_core::prices::load_price_csv;
use ketoplan_core::request::{OpenAiRequester, RetryPolicy};
use ketoplan_core::session::{PlanSession, SessionError};

use crate::args::{PreferenceArgs, TargetArgs};
use crate::config::{self, KetoplanConfig};
use crate::summary::present;

/// Options for a single generate run.
pub struct GenerateOptions<'a> {
    pub targets: &'a TargetArgs,
    pub prefs: &'a PreferenceArgs,
    pub prices: Option<&'a Path>,
    pub output: Option<PathBuf>,
    /// Allow one retry of a transient failure.
    pub retry: bool,
}

/// Run the generate command. Violations are reported, not returned as errors.
pub async fn run_generate(resolved: &KetoplanConfig, opts: GenerateOptions<'_>) -> Result<()> {
    let targets = opts.targets.to_targets()?;
    let api_key = config::api_key()?;

    let mut session =
        PlanSession::new(targets, resolved.model.clone()).with_preferences(opts.prefs.to_preferences());
    if let Some(path) = opts.prices {
        let prices = load_price_csv(path)?;
        tracing::info!(entries = prices.len(), path = %path.display(), "loaded price hints");
        session = session.with_prices(prices);
    }

    let retry = if opts.retry {
        RetryPolicy::new(2, RetryPolicy::DEFAULT_BACKOFF)
    } else {
        RetryPolicy::new(resolved.max_attempts, RetryPolicy::DEFAULT_BACKOFF)
    };
    let requester = OpenAiRequester::new(api_key, &resolved.base_url, resolved.timeout, retry)?;

    eprintln!("Requesting a 7-day plan from {}...", resolved.model);
    let outcome = match session.run(&requester).await {
        Ok(outcome) => outcome,
        Err(err) => {
            if let SessionError::Parse { raw, .. } = &err {
                tracing::debug!(raw = %raw, "unparseable model response");
            }
            tracing::error!("{err}");
            bail!("{}", err.user_message());
        }
    };

    let path = opts.output.unwrap_or_else(default_output_path);
    present(&outcome.plan, session.targets(), &outcome.result, Some(&path))
}

/// `ketoplan-plan-YYYYMMDD-HHMMSS.json` in the current directory.
fn default_output_path() -> PathBuf {
    let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
    PathBuf::from(format!("ketoplan-plan-{stamp}.json"))
}
