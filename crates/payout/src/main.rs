//! pool-payout - walk through requesting a payout from the pool

use std::{path::PathBuf, process::ExitCode};

use clap::Parser;
use pool_payout::{
    commands::{self, PayoutArgs},
    config::{DeploymentConfig, Preset},
    output::OutputHandler,
    prompt::TerminalPrompter,
};
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Pool Payout - request a payment from your mining pool
#[derive(Parser)]
#[command(name = "pool-payout")]
#[command(author = "Pool Tools Team")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Request a payout from the pool and sign it with your wallet")]
#[command(long_about = r#"
Requests a payment slate from the pool, gets it signed by your wallet and
returns it to the pool.

Wallets:
  - the pool coin's wallet CLI (grin-wallet, bitgrin-wallet)
  - Grin++ wallet daemon
  - wallet713
  - slate files you sign yourself

Anything not given on the command line is prompted for.

Examples:
  pool-payout                                   # Prompt for everything
  pool-payout --payout-method "Slate Files"     # Manual slate exchange
  pool-payout --pool bitgrinpool                # Use the BitGrin pool
"#)]
struct Cli {
    /// Payout method, by menu label or id (e.g. "Grin Wallet", slate-files)
    #[arg(long, alias = "payout_method")]
    payout_method: Option<String>,

    /// Pool username
    #[arg(long, alias = "pool_user", env = "POOL_PAYOUT_USER")]
    pool_user: Option<String>,

    /// Pool password
    #[arg(long, alias = "pool_pass", env = "POOL_PAYOUT_PASS", hide_env_values = true)]
    pool_pass: Option<String>,

    /// Wallet username (Grin++ wallet daemon)
    #[arg(long, alias = "wallet_user")]
    wallet_user: Option<String>,

    /// Wallet password
    #[arg(long, alias = "wallet_pass", env = "POOL_PAYOUT_WALLET_PASS", hide_env_values = true)]
    wallet_pass: Option<String>,

    /// Built-in pool deployment to use when no config file sets one
    #[arg(long, value_enum, env = "POOL_PAYOUT_POOL", default_value = "mwgrinpool")]
    pool: Preset,

    /// Deployment config file (defaults to ~/.pool-payout/config.toml if it exists)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory for slate files and wallet lookup (defaults to current directory)
    #[arg(short = 'd', long)]
    directory: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr, the transcript to stdout
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("pool_payout={},pool_client={},warn", log_level, log_level).into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let config = match DeploymentConfig::load(cli.config.as_deref(), cli.pool) {
        Ok(config) => config,
        Err(e) => {
            debug!("Config load failed: {}", e);
            let output = OutputHandler::new("Pool");
            output.print_error(&e.to_string());
            return ExitCode::from(1);
        }
    };
    let output = OutputHandler::new(&config.pool_name);

    let work_dir = cli
        .directory
        .clone()
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_default());

    output.print_banner();

    let mut prompter = match TerminalPrompter::new() {
        Ok(prompter) => prompter,
        Err(e) => {
            output.print_error(&format!("Could not open the terminal: {}", e));
            output.print_footer();
            return ExitCode::from(1);
        }
    };

    let args = PayoutArgs {
        payout_method: cli.payout_method,
        pool_user: cli.pool_user,
        pool_pass: cli.pool_pass,
        wallet_user: cli.wallet_user,
        wallet_pass: cli.wallet_pass,
    };

    let result = commands::request_payout(args, &config, &mut prompter, &output, &work_dir).await;
    ExitCode::from(commands::finish(&result, &output))
}
