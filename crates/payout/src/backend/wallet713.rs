//! wallet713 interactive shell
//!
//! wallet713 only has an interactive shell, so signing is a scripted
//! [`Conversation`]: unlock with the passphrase, wait for `wallet713>`,
//! run one command, look for an error line, then `exit`.

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use super::{
    conversation::{ends_with_prompt, find_error_line, is_password_prompt, Conversation, ConversationError},
    locate::locate_executable,
    native_cli::read_response,
    SigningBackend,
};
use crate::{
    config::PayoutMethod,
    error::{PayoutError, PayoutResult},
    output::OutputHandler,
    prompt::Prompter,
    slate::Slate,
    slate_store::SlateStore,
};

pub const BINARY: &str = "wallet713";

const SHELL_PROMPT: &str = "wallet713>";
const NEW_WALLET_MARKER: &str = "new wallet";
const ERROR_MARKER: &str = "Error";

pub struct Wallet713Backend {
    flags: Vec<String>,
    passphrase: String,
    search_dirs: Vec<PathBuf>,
    work_dir: PathBuf,
    read_timeout: Duration,
    exit_wait: Duration,
    executable: Option<PathBuf>,
}

/// How an unlocked session ended up
enum Unlock {
    Shell(Conversation),
    Uninitialised,
}

impl Wallet713Backend {
    pub fn new(
        flags: Vec<String>,
        passphrase: String,
        search_dirs: Vec<PathBuf>,
        work_dir: &Path,
        read_timeout: Duration,
        exit_wait: Duration,
    ) -> Self {
        Self {
            flags,
            passphrase,
            search_dirs,
            work_dir: work_dir.to_path_buf(),
            read_timeout,
            exit_wait,
            executable: None,
        }
    }

    /// Start the shell and get past the passphrase prompt
    async fn unlock(&self, executable: &Path) -> Result<Unlock, ConversationError> {
        let mut command = Command::new(executable);
        command.args(&self.flags).current_dir(&self.work_dir);

        let mut conversation = Conversation::spawn(command, self.read_timeout)?;
        let greeting = conversation.expect(is_password_prompt).await?;
        if greeting.contains(NEW_WALLET_MARKER) {
            return Ok(Unlock::Uninitialised);
        }

        conversation.send_line(&self.passphrase).await?;
        Ok(Unlock::Shell(conversation))
    }

    /// Send `command` and return what the shell printed up to its next prompt
    async fn run_command(conversation: &mut Conversation, command: &str) -> Result<String, ConversationError> {
        conversation.send_line(command).await?;
        conversation.expect(|out| ends_with_prompt(out, SHELL_PROMPT)).await
    }

    fn executable(&self) -> PayoutResult<&Path> {
        self.executable
            .as_deref()
            .ok_or_else(|| PayoutError::WalletUnavailable("Wallet has not been located".to_string()))
    }
}

fn failure_output(err: &ConversationError) -> String {
    err.output()
        .map(|o| o.trim().to_string())
        .unwrap_or_else(|| err.to_string())
}

#[async_trait(?Send)]
impl SigningBackend for Wallet713Backend {
    fn method(&self) -> PayoutMethod {
        PayoutMethod::Wallet713
    }

    async fn prepare(&mut self, output: &OutputHandler) -> PayoutResult<()> {
        output.print_progress("Locating your wallet713 command");
        let executable = locate_executable(BINARY, &self.search_dirs)?;

        let unavailable = |e: ConversationError| {
            PayoutError::WalletUnavailable(format!("Wallet test failed with output: {}", failure_output(&e)))
        };
        let mut conversation = match self.unlock(&executable).await.map_err(unavailable)? {
            Unlock::Shell(c) => c,
            Unlock::Uninitialised => {
                return Err(PayoutError::WalletUnavailable(
                    "You must initialize your wallet first".to_string(),
                ))
            }
        };
        // The shell prompt only shows up once the passphrase was accepted
        conversation
            .expect(|out| ends_with_prompt(out, SHELL_PROMPT))
            .await
            .map_err(unavailable)?;
        Self::run_command(&mut conversation, "help").await.map_err(unavailable)?;
        if let Err(e) = conversation.finish("exit", self.exit_wait).await {
            debug!("wallet713 did not exit after the health check: {}", e);
        }

        self.executable = Some(executable);
        output.print_success(None);
        Ok(())
    }

    async fn sign(
        &mut self,
        _unsigned: &Slate,
        store: &SlateStore,
        _prompter: &mut dyn Prompter,
        _output: &OutputHandler,
    ) -> PayoutResult<Slate> {
        let executable = self.executable()?.to_path_buf();
        let failed = |e: ConversationError| {
            PayoutError::Signing(format!("Slate receive failed with error: {}", failure_output(&e)))
        };

        let mut conversation = match self.unlock(&executable).await.map_err(failed)? {
            Unlock::Shell(c) => c,
            Unlock::Uninitialised => {
                return Err(PayoutError::WalletUnavailable(
                    "You must initialize your wallet first".to_string(),
                ))
            }
        };
        conversation
            .expect(|out| ends_with_prompt(out, SHELL_PROMPT))
            .await
            .map_err(failed)?;

        // The shell runs in the slate directory; a bare file name survives
        // its whitespace splitting
        let slate_name = store
            .unsigned_path()
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let receive = format!("receive {}", slate_name);
        let transcript = Self::run_command(&mut conversation, &receive).await.map_err(failed)?;
        if let Some(message) = find_error_line(&transcript, ERROR_MARKER) {
            return Err(PayoutError::Signing(format!("Slate receive failed with: {}", message)));
        }

        if let Err(e) = conversation.finish("exit", self.exit_wait).await {
            debug!("wallet713 did not exit: {}", e);
            return Err(PayoutError::Signing("Slate receive failed".to_string()));
        }
        info!("wallet713 received the payment slate");

        read_response(store)
    }
}
