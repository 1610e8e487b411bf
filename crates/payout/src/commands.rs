//! The `pool-payout` command: gather what the run needs, then hand over to
//! the orchestrator

use std::path::Path;

use pool_client::{PoolClient, PoolCredentials};
use tracing::{debug, info};

use crate::{
    backend::{build_backend, WalletLogin},
    config::{DeploymentConfig, PayoutMethod},
    error::PayoutResult,
    orchestrator::{PayoutOrchestrator, PayoutOutcome, ResumePoint},
    output::OutputHandler,
    prompt::{prompt_menu, value_or_prompt, Prompter},
    slate_store::SlateStore,
};

/// Values supplied on the command line; anything missing is prompted for
#[derive(Clone, Default)]
pub struct PayoutArgs {
    pub payout_method: Option<String>,
    pub pool_user: Option<String>,
    pub pool_pass: Option<String>,
    pub wallet_user: Option<String>,
    pub wallet_pass: Option<String>,
}

impl std::fmt::Debug for PayoutArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PayoutArgs")
            .field("payout_method", &self.payout_method)
            .field("pool_user", &self.pool_user)
            .field("pool_pass", &self.pool_pass.as_ref().map(|_| "***"))
            .field("wallet_user", &self.wallet_user)
            .field("wallet_pass", &self.wallet_pass.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Request a payout from the pool in `config`, keeping slate files in
/// `work_dir`
pub async fn request_payout(
    args: PayoutArgs,
    config: &DeploymentConfig,
    prompter: &mut dyn Prompter,
    output: &OutputHandler,
    work_dir: &Path,
) -> PayoutResult<PayoutOutcome> {
    let (method, mut prompted) = choose_method(args.payout_method.as_deref(), config, prompter, output)?;

    if prompted {
        output.print_blank();
    }
    output.print_indent(&format!(
        "** Requesting a payment from the pool using method: {}",
        config.method_label(method)
    ));
    if prompted {
        output.print_blank();
    }

    let indent = output.indent();
    let (username, asked) = value_or_prompt(
        prompter,
        args.pool_user,
        &format!("{}{} Username: ", indent, config.pool_name),
        false,
    )?;
    prompted |= asked;
    let (password, asked) = value_or_prompt(
        prompter,
        args.pool_pass,
        &format!("{}{} Password: ", indent, config.pool_name),
        true,
    )?;
    prompted |= asked;

    let (login, asked) = wallet_login(method, args.wallet_user, args.wallet_pass, prompter, indent)?;
    prompted |= asked;
    if prompted {
        output.print_blank();
    }

    info!("Requesting payout for {} with {}", username, method.slug());
    let pool = PoolClient::with_credentials(&config.api_url, PoolCredentials::new(username, password));
    let store = SlateStore::new(work_dir, &config.slate_file);
    let orchestrator = PayoutOrchestrator::new(pool, store, config);

    let mut backend = build_backend(method, config, login, work_dir);
    let outcome = orchestrator.run(backend.as_mut(), prompter, output).await?;
    report_outcome(&outcome, output);
    Ok(outcome)
}

/// Method from `--payout-method`, or from a numbered menu of the enabled
/// methods. The flag is true when the operator was asked.
fn choose_method(
    requested: Option<&str>,
    config: &DeploymentConfig,
    prompter: &mut dyn Prompter,
    output: &OutputHandler,
) -> PayoutResult<(PayoutMethod, bool)> {
    if let Some(requested) = requested {
        return Ok((config.resolve_method(requested)?, false));
    }

    let options: Vec<(String, String, PayoutMethod)> = config
        .payout_methods
        .iter()
        .enumerate()
        .map(|(i, m)| ((i + 1).to_string(), config.method_label(*m), *m))
        .collect();
    let method = prompt_menu(prompter, output, "Choose a method of payment:", &options, "1")?;
    Ok((method, true))
}

/// Wallet credentials `method` needs
fn wallet_login(
    method: PayoutMethod,
    wallet_user: Option<String>,
    wallet_pass: Option<String>,
    prompter: &mut dyn Prompter,
    indent: &str,
) -> PayoutResult<(WalletLogin, bool)> {
    let mut prompted = false;
    let mut login = WalletLogin::default();

    if method == PayoutMethod::WalletDaemon {
        let (username, asked) = value_or_prompt(prompter, wallet_user, &format!("{}Wallet Username: ", indent), false)?;
        login.username = Some(username);
        prompted |= asked;
    }
    if method != PayoutMethod::SlateFiles {
        let (passphrase, asked) = value_or_prompt(prompter, wallet_pass, &format!("{}Wallet Password: ", indent), true)?;
        login.passphrase = Some(passphrase);
        prompted |= asked;
    }

    Ok((login, prompted))
}

/// Print the closing transcript for `result` and return the process exit
/// status: 0 on success, 1 on any fatal error
pub fn finish(result: &PayoutResult<PayoutOutcome>, output: &OutputHandler) -> u8 {
    let code = match result {
        Ok(_) => 0,
        Err(e) => {
            debug!("Payout failed: {:?}", e);
            output.print_error(&e.to_string());
            1
        }
    };
    output.print_footer();
    code
}

fn report_outcome(outcome: &PayoutOutcome, output: &OutputHandler) {
    let source = match outcome.resumed {
        ResumePoint::Fresh => "new payment",
        ResumePoint::UnsignedArtifact => "saved payment slate",
        ResumePoint::SignedArtifact => "saved signed payment slate",
    };
    output.print_blank();
    match outcome.balance {
        Some(balance) => output.print_indent(&format!(
            "** Payout submitted for user {} from a {} (balance {})",
            outcome.user_id, source, balance
        )),
        None => output.print_indent(&format!(
            "** Payout submitted for user {} from a {}",
            outcome.user_id, source
        )),
    }
}
