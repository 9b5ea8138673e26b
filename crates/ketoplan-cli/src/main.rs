mod args;
mod config;
mod generate_cmd;
mod prompt_cmd;
mod summary;
#[cfg(test)]
mod test_util;
mod validate_cmd;

use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use ketoplan_core::request::openai::DEFAULT_MODEL;

use args::{PreferenceArgs, TargetArgs};
use config::KetoplanConfig;

#[derive(Parser)]
#[command(name = "ketoplan", version, about = "Generate and validate keto meal plans with an LLM")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a ketoplan config file
    Init {
        /// Model identifier
        #[arg(long, default_value = DEFAULT_MODEL)]
        model: String,
        /// Chat completions API root
        #[arg(long)]
        base_url: Option<String>,
        /// Request timeout in seconds
        #[arg(long, default_value_t = config::DEFAULT_TIMEOUT_SECS)]
        timeout: u64,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Request a 7-day plan, validate it and write the report
    Generate {
        #[command(flatten)]
        targets: TargetArgs,
        #[command(flatten)]
        prefs: PreferenceArgs,
        /// Supermarket price hints (CSV: name,pack_size,price_gbp)
        #[arg(long)]
        prices: Option<PathBuf>,
        /// Report path, or - for stdout (default: ketoplan-plan-<timestamp>.json)
        #[arg(long)]
        output: Option<PathBuf>,
        /// Model identifier (overrides KETOPLAN_MODEL and the config file)
        #[arg(long)]
        model: Option<String>,
        /// Chat completions API root (overrides OPENAI_BASE_URL)
        #[arg(long)]
        base_url: Option<String>,
        /// Request timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,
        /// Retry once on network errors, rate limiting or server errors
        #[arg(long)]
        retry: bool,
    },
    /// Re-validate a saved plan or report without calling the model
    Validate {
        /// Plan or report JSON file
        file: PathBuf,
        #[command(flatten)]
        targets: TargetArgs,
        /// Write a fresh report to this path, or - for stdout
        #[arg(long)]
        output: Option<PathBuf>,
        /// Exit non-zero if the plan has any violation
        #[arg(long)]
        strict: bool,
    },
    /// Print the prompt messages without calling the model
    Prompt {
        #[command(flatten)]
        targets: TargetArgs,
        #[command(flatten)]
        prefs: PreferenceArgs,
        /// Supermarket price hints (CSV: name,pack_size,price_gbp)
        #[arg(long)]
        prices: Option<PathBuf>,
        /// Print the messages as a JSON array
        #[arg(long)]
        json: bool,
    },
    /// Print shell completions
    Completions {
        /// Target shell
        shell: Shell,
    },
}

/// Execute the `ketoplan init` command: write config file.
fn cmd_init(model: &str, base_url: Option<&str>, timeout: u64, force: bool) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }
    if timeout == 0 {
        anyhow::bail!("--timeout must be at least 1 second");
    }

    let mut cfg = config::ConfigFile::default();
    cfg.model.name = model.to_string();
    if let Some(url) = base_url {
        cfg.model.base_url = url.to_string();
    }
    cfg.request.timeout_secs = timeout;

    config::save_config(&cfg)?;

    println!("Config written to {}", path.display());
    println!("  model.name = {}", cfg.model.name);
    println!("  model.base_url = {}", cfg.model.base_url);
    println!("  request.timeout_secs = {}", cfg.request.timeout_secs);
    println!("  request.max_attempts = {}", cfg.request.max_attempts);
    println!();
    println!("Next: export {} and run `ketoplan generate`.", config::API_KEY_ENV);

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init {
            model,
            base_url,
            timeout,
            force,
        } => {
            cmd_init(&model, base_url.as_deref(), timeout, force)?;
        }
        Commands::Generate {
            targets,
            prefs,
            prices,
            output,
            model,
            base_url,
            timeout,
            retry,
        } => {
            let resolved = KetoplanConfig::resolve(model.as_deref(), base_url.as_deref(), timeout)?;
            let opts = generate_cmd::GenerateOptions {
                targets: &targets,
                prefs: &prefs,
                prices: prices.as_deref(),
                output,
                retry,
            };
            generate_cmd::run_generate(&resolved, opts).await?;
        }
        Commands::Validate {
            file,
            targets,
            output,
            strict,
        } => {
            validate_cmd::run_validate(&file, &targets, output.as_deref(), strict)?;
        }
        Commands::Prompt {
            targets,
            prefs,
            prices,
            json,
        } => {
            prompt_cmd::run_prompt(&targets, &prefs, prices.as_deref(), json)?;
        }
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "ketoplan", &mut std::io::stdout());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn generate_parses_all_flags() {
        let cli = Cli::parse_from([
            "ketoplan", "generate", "--calories", "2200", "--protein", "150", "--budget", "60",
            "--prices", "prices.csv", "--output", "out.json", "--model", "gpt-4o", "--timeout",
            "30", "--retry",
        ]);
        match cli.command {
            Commands::Generate {
                targets,
                prices,
                output,
                model,
                timeout,
                retry,
                ..
            } => {
                assert_eq!(targets.calories, 2200.0);
                assert_eq!(prices, Some(PathBuf::from("prices.csv")));
                assert_eq!(output, Some(PathBuf::from("out.json")));
                assert_eq!(model.as_deref(), Some("gpt-4o"));
                assert_eq!(timeout, Some(30));
                assert!(retry);
            }
            _ => panic!("expected generate"),
        }
    }

    #[test]
    fn validate_requires_targets() {
        let result = Cli::try_parse_from(["ketoplan", "validate", "plan.json"]);
        assert!(result.is_err());
    }
}
