//! Manual slate file exchange
//!
//! The operator takes the unsigned slate file to a wallet themselves and
//! comes back with the name of the signed response file.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use super::SigningBackend;
use crate::{
    config::PayoutMethod,
    error::{PayoutError, PayoutResult},
    output::OutputHandler,
    prompt::Prompter,
    slate::Slate,
    slate_store::SlateStore,
};

const RESPONSE_PROMPT: &str = "Enter the filename with signed slate response: ";

pub struct ManualFileBackend {
    work_dir: PathBuf,
}

impl ManualFileBackend {
    pub fn new(work_dir: &Path) -> Self {
        Self {
            work_dir: work_dir.to_path_buf(),
        }
    }

    /// Load and check the file the operator named
    fn read_response(&self, filename: &str) -> PayoutResult<Slate> {
        let invalid = || PayoutError::InvalidInput("Invalid slate, please try again".to_string());
        if filename.is_empty() {
            return Err(invalid());
        }

        let path = self.work_dir.join(filename);
        let text = match SlateStore::read_if_present(&path) {
            Ok(Some(text)) => text,
            Ok(None) => {
                debug!("Signed slate file {} does not exist", path.display());
                return Err(invalid());
            }
            Err(e) => {
                debug!("Could not read {}: {}", path.display(), e);
                return Err(invalid());
            }
        };
        if !SlateStore::validate_json(&text) {
            debug!("{} is not valid JSON", path.display());
            return Err(invalid());
        }
        Slate::parse(text).map_err(|_| invalid())
    }
}

#[async_trait(?Send)]
impl SigningBackend for ManualFileBackend {
    fn method(&self) -> PayoutMethod {
        PayoutMethod::SlateFiles
    }

    async fn prepare(&mut self, _output: &OutputHandler) -> PayoutResult<()> {
        Ok(())
    }

    async fn sign(
        &mut self,
        _unsigned: &Slate,
        _store: &SlateStore,
        prompter: &mut dyn Prompter,
        output: &OutputHandler,
    ) -> PayoutResult<Slate> {
        loop {
            let filename = prompter.read_line(&format!("{}{}", output.indent(), RESPONSE_PROMPT))?;
            match self.read_response(&filename) {
                Ok(slate) => return Ok(slate),
                Err(e) if e.is_recoverable() => output.print_error(&e.to_string()),
                Err(e) => return Err(e),
            }
        }
    }

    fn resumes_unsigned(&self) -> bool {
        true
    }

    fn interactive(&self) -> bool {
        true
    }
}
