//! claimant-test: run harness scenarios against a deployed pipeline stack
//!
//! ```bash
//! # Run every scenario with the default stack endpoints
//! claimant-test run
//!
//! # Run one scenario against a custom config
//! claimant-test run --config harness.yaml --scenario queue-consumption
//!
//! # List known scenarios
//! claimant-test list
//! ```

use claimant_harness::harness::error::HarnessResult;
use claimant_harness::{EntityKind, HarnessConfig, ScenarioContext, Validity};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "claimant-test", about = "Claimant pipeline integration scenarios")]
struct Cli {
    /// Harness config file (defaults apply when omitted)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run scenarios
    Run {
        /// Run a single named scenario instead of all of them
        #[arg(long)]
        scenario: Option<String>,
    },
    /// List known scenarios
    List,
}

const SCENARIOS: &[(&str, &str)] = &[
    (
        "queue-consumption",
        "200 messages posted to the subscribed queue are consumed",
    ),
    (
        "claimant-ingest",
        "published claimant fixtures land in the claimant table under their nino hash",
    ),
    (
        "contract-ingest",
        "published contract fixtures are consumed and counted",
    ),
    (
        "statement-ingest",
        "published statement fixtures store a decryptable takeHomePay",
    ),
    (
        "mixed-validity",
        "alternating valid/invalid claimants: only the valid half lands",
    ),
    (
        "database-upsert",
        "duplicate-key upserts count each document exactly once",
    ),
];

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Command::List => {
            for (name, description) in SCENARIOS {
                println!("{:<20} {}", name, description);
            }
            ExitCode::SUCCESS
        }
        Command::Run { scenario } => {
            let selected: Vec<&str> = match scenario.as_deref() {
                Some(name) => {
                    if !SCENARIOS.iter().any(|(n, _)| *n == name) {
                        eprintln!("Unknown scenario '{}'; try 'claimant-test list'", name);
                        return ExitCode::FAILURE;
                    }
                    vec![name]
                }
                None => SCENARIOS.iter().map(|(n, _)| *n).collect(),
            };

            let mut failed = 0usize;
            for name in &selected {
                log::info!("Scenario: {}", name);
                match run_scenario(name, config.clone()).await {
                    Ok(()) => println!("PASS  {}", name),
                    Err(e) => {
                        failed += 1;
                        println!("FAIL  {}: {}", name, e);
                    }
                }
            }

            println!("{}/{} scenario(s) passed", selected.len() - failed, selected.len());
            if failed == 0 {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

fn load_config(path: Option<&std::path::Path>) -> HarnessResult<HarnessConfig> {
    match path {
        Some(path) => HarnessConfig::from_file(path),
        None => Ok(HarnessConfig::default()),
    }
}

async fn run_scenario(name: &str, config: HarnessConfig) -> HarnessResult<()> {
    let mut context = ScenarioContext::new(config);
    match name {
        "queue-consumption" => {
            context.given_messages_posted(200).await?;
            context.then_messages_consumed().await
        }
        "claimant-ingest" => {
            context
                .given_fixtures_published(EntityKind::Claimant, 10, Validity::Valid)
                .await?;
            context.then_fixtures_consumed(EntityKind::Claimant).await?;
            context.then_table_count(EntityKind::Claimant, 10).await?;
            context.then_claimant_stored(0).await
        }
        "contract-ingest" => {
            context
                .given_fixtures_published(EntityKind::Contract, 10, Validity::Valid)
                .await?;
            context.then_fixtures_consumed(EntityKind::Contract).await?;
            context.then_table_count(EntityKind::Contract, 10).await
        }
        "statement-ingest" => {
            context
                .given_fixtures_published(EntityKind::Statement, 10, Validity::Valid)
                .await?;
            context.then_fixtures_consumed(EntityKind::Statement).await?;
            context.then_table_count(EntityKind::Statement, 10).await?;
            context.then_statement_take_home_pay_decrypts(0).await
        }
        "mixed-validity" => {
            context
                .given_fixtures_published(EntityKind::Claimant, 10, Validity::Mixed)
                .await?;
            context.then_fixtures_consumed(EntityKind::Claimant).await?;
            // Odd indexes are malformed, so only the even half lands
            context.then_table_count(EntityKind::Claimant, 5).await
        }
        "database-upsert" => {
            context.given_rows_upserted(EntityKind::Contract, 10).await?;
            context.given_rows_upserted(EntityKind::Contract, 10).await?;
            context.then_upserted_rows_counted(EntityKind::Contract).await
        }
        other => Err(claimant_harness::HarnessError::ConfigError {
            message: format!("unknown scenario '{}'", other),
        }),
    }
}
