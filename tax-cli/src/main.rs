use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use tax_cli::app;
use tax_cli::config::{AppConfig, Overrides};
use tax_cli::salaries;
use tax_core::{CurrencyCode, SalaryEntry};

// ─── CLI definition ──────────────────────────────────────────────────────────

/// Income tax calculator with flat-rate and progressive policies.
///
/// Salaries paid in a foreign currency are converted into the home currency
/// before the policy is applied.
#[derive(Debug, Parser)]
#[command(name = "income-tax", version, about)]
struct Cli {
    /// TOML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Tax policy: `flat` or `progressive`.
    #[arg(long, global = true)]
    policy: Option<String>,

    /// Home currency (ISO 4217 code) that tax is computed in.
    #[arg(long, global = true)]
    home: Option<CurrencyCode>,

    /// Exchange rate backend: `exchangerate-api` or `fixed`.
    #[arg(long, global = true)]
    backend: Option<String>,

    /// API key for exchangerate-api.com.
    #[arg(long, global = true, env = "EXCHANGE_RATE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Calculate tax on one or more salaries.
    Calc {
        /// Salaries as `AMOUNT:CODE`, e.g. `5000:PLN` or `310.25:USD`.
        #[arg(allow_hyphen_values = true)]
        salaries: Vec<SalaryEntry>,

        /// CSV file with `amount,currency` columns, taxed after the
        /// salaries given as arguments.
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Replay a fiscal year on a fresh progressive calculator.
    Demo,
}

// ─── tracing ─────────────────────────────────────────────────────────────────

/// Initialise the tracing subscriber.
///
/// * Honours `RUST_LOG` when set.
/// * Falls back to `warn` so results are the only normal output.
/// * Writes to stderr, stripping timestamps and target names.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::from("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(false)
        .init();
}

// ─── entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    let config = AppConfig::load(cli.config.as_deref())
        .context("Failed to load configuration")?
        .with_overrides(Overrides {
            policy: cli.policy,
            home_currency: cli.home,
            backend: cli.backend,
            api_key: cli.api_key,
        })
        .context("Invalid configuration")?;
    debug!(?config, "resolved configuration");

    match cli.command {
        Command::Calc {
            salaries: mut entries,
            file,
        } => {
            if let Some(path) = &file {
                let loaded = salaries::load_from_file(path)
                    .with_context(|| format!("Failed to load salaries from {}", path.display()))?;
                entries.extend(loaded);
            }
            if entries.is_empty() {
                bail!("no salaries given; pass AMOUNT:CODE arguments or --file");
            }

            let registry = app::build_registry();
            let mut calculator = app::build_calculator(&config, &registry, &entries)
                .context("Failed to set up tax calculator")?;
            let report = app::run_calc(calculator.as_mut(), &entries)
                .await
                .context("Tax calculation failed")?;
            println!("{report}");
        }
        Command::Demo => {
            let mut calculator =
                app::demo_calculator(&config).context("Failed to set up demo calculator")?;
            for line in app::run_demo(&mut calculator) {
                println!("{line}");
            }
        }
    }

    Ok(())
}
