//! One-shot wallet CLI (`grin-wallet`, `bitgrin-wallet`)
//!
//! Each call is a separate process: `<wallet> [flags] -p <pass> info` checks
//! the wallet opens, `<wallet> [flags] -p <pass> receive -i <slate>` signs
//! the slate and writes `<slate>.response` next to it.

use std::{
    path::{Path, PathBuf},
    process::{Output, Stdio},
};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use super::{locate::locate_executable, SigningBackend};
use crate::{
    config::PayoutMethod,
    error::{PayoutError, PayoutResult},
    output::OutputHandler,
    prompt::Prompter,
    slate::Slate,
    slate_store::SlateStore,
};

pub struct NativeWalletBackend {
    binary: String,
    flags: Vec<String>,
    passphrase: String,
    search_dirs: Vec<PathBuf>,
    work_dir: PathBuf,
    executable: Option<PathBuf>,
}

impl NativeWalletBackend {
    pub fn new(
        binary: &str,
        flags: Vec<String>,
        passphrase: String,
        search_dirs: Vec<PathBuf>,
        work_dir: &Path,
    ) -> Self {
        Self {
            binary: binary.to_string(),
            flags,
            passphrase,
            search_dirs,
            work_dir: work_dir.to_path_buf(),
            executable: None,
        }
    }

    async fn run(&self, executable: &Path, args: &[&str]) -> std::io::Result<Output> {
        debug!("Running {} {}", executable.display(), args.first().unwrap_or(&""));
        Command::new(executable)
            .args(&self.flags)
            .arg("-p")
            .arg(&self.passphrase)
            .args(args)
            .current_dir(&self.work_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
    }

    fn executable(&self) -> PayoutResult<&Path> {
        self.executable
            .as_deref()
            .ok_or_else(|| PayoutError::WalletUnavailable("Wallet has not been located".to_string()))
    }
}

/// stdout and stderr together, as the operator would have seen them
fn combined_output(output: &Output) -> String {
    let mut text = String::from_utf8_lossy(&output.stdout).to_string();
    text.push_str(&String::from_utf8_lossy(&output.stderr));
    text.trim().to_string()
}

#[async_trait(?Send)]
impl SigningBackend for NativeWalletBackend {
    fn method(&self) -> PayoutMethod {
        PayoutMethod::NativeWallet
    }

    async fn prepare(&mut self, output: &OutputHandler) -> PayoutResult<()> {
        output.print_progress(&format!("Locating your {} command", self.binary));
        let executable = locate_executable(&self.binary, &self.search_dirs)?;

        let result = self
            .run(&executable, &["info"])
            .await
            .map_err(|e| PayoutError::WalletUnavailable(format!("Wallet test failed with error {}", e)))?;
        let text = combined_output(&result);
        if !result.status.success() || text.to_lowercase().contains("error") {
            return Err(PayoutError::WalletUnavailable(format!(
                "Wallet test failed with output: {}",
                text
            )));
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
        let slate_path = store.unsigned_path().to_string_lossy().to_string();

        let result = self
            .run(&executable, &["receive", "-i", &slate_path])
            .await
            .map_err(|e| PayoutError::Signing(format!("Wallet receive failed with error: {}", e)))?;
        if !result.status.success() {
            return Err(PayoutError::Signing(format!(
                "Signing slate failed with output: {}",
                combined_output(&result)
            )));
        }

        read_response(store)
    }
}

/// Signed slate a wallet process left at `store.signed_path()`
pub(super) fn read_response(store: &SlateStore) -> PayoutResult<Slate> {
    let path = store.signed_path();
    let text = SlateStore::read_if_present(path)
        .map_err(|e| PayoutError::Signing(format!("Wallet receive failed with error: {}", e)))?
        .ok_or_else(|| {
            PayoutError::Signing(format!(
                "Wallet did not write a signed slate to {}",
                path.display()
            ))
        })?;
    Slate::parse(text.trim_end()).map_err(|e| {
        PayoutError::Signing(format!("Wallet wrote an invalid signed slate to {}: {}", path.display(), e))
    })
}
