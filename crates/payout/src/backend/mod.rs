//! Signing backends
//!
//! A backend turns an unsigned slate into a signed one. The orchestrator
//! drives every backend through the same three phases:
//!
//! ```text
//! prepare()  ->  sign() (at most once)  ->  release()
//! locate/login   wallet receives slate     logout
//! ```
//!
//! `release()` runs exactly once after a successful `prepare()`, whatever
//! happens in between.

mod conversation;
mod daemon;
mod locate;
mod manual;
mod native_cli;
mod wallet713;

use std::path::Path;

use async_trait::async_trait;

pub use conversation::{Conversation, ConversationError, ConversationState};
pub use daemon::WalletDaemonBackend;
pub use locate::{default_search_dirs, locate_executable, search_dirs};
pub use manual::ManualFileBackend;
pub use native_cli::NativeWalletBackend;
pub use wallet713::Wallet713Backend;

use crate::{
    config::{DeploymentConfig, PayoutMethod},
    error::PayoutResult,
    output::OutputHandler,
    prompt::Prompter,
    slate::Slate,
    slate_store::SlateStore,
};

/// Wallet login collected from flags or prompts
#[derive(Clone, Default)]
pub struct WalletLogin {
    pub username: Option<String>,
    pub passphrase: Option<String>,
}

impl std::fmt::Debug for WalletLogin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletLogin")
            .field("username", &self.username)
            .field("passphrase", &self.passphrase.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Runs on one thread; the futures need not be `Send`.
#[async_trait(?Send)]
pub trait SigningBackend {
    fn method(&self) -> PayoutMethod;

    /// Make sure the wallet is there and usable before the pool is asked
    /// for anything
    async fn prepare(&mut self, output: &OutputHandler) -> PayoutResult<()>;

    /// Produce the signed slate for `unsigned`, which is already on disk at
    /// `store.unsigned_path()`
    async fn sign(
        &mut self,
        unsigned: &Slate,
        store: &SlateStore,
        prompter: &mut dyn Prompter,
        output: &OutputHandler,
    ) -> PayoutResult<Slate>;

    /// Release anything `prepare()` acquired
    async fn release(&mut self) -> PayoutResult<()> {
        Ok(())
    }

    /// Whether an unsigned slate left by an earlier run may be signed
    /// instead of requesting a new one
    fn resumes_unsigned(&self) -> bool {
        false
    }

    /// Whether signing talks to the operator
    fn interactive(&self) -> bool {
        false
    }
}

/// Build the backend for `method` in this deployment
pub fn build_backend(
    method: PayoutMethod,
    config: &DeploymentConfig,
    login: WalletLogin,
    work_dir: &Path,
) -> Box<dyn SigningBackend> {
    let passphrase = login.passphrase.unwrap_or_default();
    match method {
        PayoutMethod::NativeWallet => {
            let binary = config.native_wallet_binary();
            Box::new(NativeWalletBackend::new(
                &binary,
                config.wallet_flags.clone(),
                passphrase,
                default_search_dirs(&binary, work_dir),
                work_dir,
            ))
        }
        PayoutMethod::Wallet713 => Box::new(Wallet713Backend::new(
            config.wallet_flags.clone(),
            passphrase,
            default_search_dirs(wallet713::BINARY, work_dir),
            work_dir,
            std::time::Duration::from_secs(config.conversation_timeout_secs),
            std::time::Duration::from_secs(config.exit_wait_secs),
        )),
        PayoutMethod::WalletDaemon => Box::new(WalletDaemonBackend::new(
            &config.wallet_daemon_url,
            login.username.unwrap_or_default(),
            passphrase,
        )),
        PayoutMethod::SlateFiles => Box::new(ManualFileBackend::new(work_dir)),
    }
}
