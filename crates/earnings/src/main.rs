//! earnings-estimate - what a miner would have earned on the pool
//!
//! Values a miner's graph rates against every block the pool found in the
//! last few days, using public pool and chain statistics.

mod estimate;

use std::{process::ExitCode, str::FromStr};

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use pool_client::{PoolClient, DEFAULT_POOL_API_URL};
use rustyline::DefaultEditor;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::estimate::{estimate, validate_days, BlockReward, MinerRates};

const INDENT: &str = "   ";

/// Earnings Estimate - average daily pool earnings for your graph rates
#[derive(Parser)]
#[command(name = "earnings-estimate")]
#[command(author = "Pool Tools Team")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Estimate your average daily earnings on the pool from historic data")]
struct Cli {
    /// Number of days to average over (at most 31)
    #[arg(long)]
    days: Option<u32>,

    /// Miner's C29 graphs/second
    #[arg(long)]
    c29gps: Option<f64>,

    /// Miner's C31 graphs/second
    #[arg(long)]
    c31gps: Option<f64>,

    /// Pool API URL
    #[arg(long, env = "EARNINGS_SERVER_URL", default_value = DEFAULT_POOL_API_URL)]
    server: String,

    /// Pool name shown in the report
    #[arg(long, default_value = "MWGrinPool")]
    pool_name: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

/// Flag value, or ask until the answer parses
fn value_or_prompt<T: FromStr>(editor: &mut DefaultEditor, provided: Option<T>, prompt: &str) -> Result<T> {
    if let Some(value) = provided {
        return Ok(value);
    }
    loop {
        let line = editor
            .readline(&format!("{}{}: ", INDENT, prompt))
            .context("input closed")?;
        match line.trim().parse() {
            Ok(value) => return Ok(value),
            Err(_) => println!("{}{} {}", INDENT, "-- Error:".bright_red(), "please enter a number"),
        }
    }
}

fn print_header(pool_name: &str) {
    println!();
    println!(
        "{}",
        format!("############# {} Average Daily Earnings #############", pool_name).bright_cyan()
    );
    println!("## ");
}

fn print_block(block: &BlockReward) {
    println!(
        "{}+ Miners reward for block {}: {}",
        INDENT,
        block.height,
        block.reward.to_string().bright_white()
    );
}

fn print_error(text: &str) {
    println!();
    println!("{}{} {}", INDENT, "-- Error:".bright_red().bold(), text.bright_red());
    println!();
}

async fn run(cli: Cli) -> Result<()> {
    print_header(&cli.pool_name);

    let mut editor = DefaultEditor::new().context("could not open the terminal")?;
    let days = validate_days(value_or_prompt(&mut editor, cli.days, "Number of days to average over")?)?;
    let c29 = value_or_prompt(&mut editor, cli.c29gps, "Miners C29 Graphs/second")?;
    let c31 = value_or_prompt(&mut editor, cli.c31gps, "Miners C31 Graphs/second")?;
    let miner = MinerRates::new(c29, c31)?;

    let client = PoolClient::new(&cli.server);
    debug!("Estimating against {}", client.base_url());

    println!();
    println!("{}Getting Mining Data: ", INDENT);
    let result = estimate(&client, days, miner, print_block).await?;

    println!();
    println!("## Total Rewards: {} Grin", result.total().to_string().bright_green());
    println!("## Avg Daily Reward = {}", result.daily_average().to_string().bright_green());
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("earnings_estimate={},pool_client={},warn", log_level, log_level).into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            print_error(&format!("{:#}", e));
            ExitCode::from(1)
        }
    }
}
