//! On-disk slate checkpoints
//!
//! The unsigned slate is written as soon as the pool hands it out and the
//! signed slate as soon as a wallet produces it, so an interrupted run can be
//! picked up again instead of asking the pool for a second payment.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use tracing::debug;

use crate::{
    error::{PayoutError, PayoutResult},
    slate::Slate,
};

#[derive(Debug, Clone)]
pub struct SlateStore {
    unsigned_path: PathBuf,
    signed_path: PathBuf,
}

impl SlateStore {
    /// Store in `dir`; the signed response sits next to the unsigned file
    /// with a `.response` suffix, where wallets write it.
    pub fn new(dir: &Path, slate_file: &str) -> Self {
        Self {
            unsigned_path: dir.join(slate_file),
            signed_path: dir.join(format!("{}.response", slate_file)),
        }
    }

    pub fn unsigned_path(&self) -> &Path {
        &self.unsigned_path
    }

    pub fn signed_path(&self) -> &Path {
        &self.signed_path
    }

    pub fn write_unsigned(&self, slate: &Slate) -> PayoutResult<()> {
        write_artifact(&self.unsigned_path, slate, "payment slate")
    }

    pub fn write_signed(&self, slate: &Slate) -> PayoutResult<()> {
        write_artifact(&self.signed_path, slate, "signed payment slate")
    }

    /// Contents of `path`, or `None` if there is no such file
    pub fn read_if_present(path: &Path) -> io::Result<Option<String>> {
        match fs::read_to_string(path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn validate_json(text: &str) -> bool {
        Slate::parse(text).is_ok()
    }

    /// Leftover unsigned slate, if one exists and is valid JSON
    pub fn load_unsigned(&self) -> Option<Slate> {
        load_artifact(&self.unsigned_path)
    }

    /// Leftover signed slate, if one exists and is valid JSON
    pub fn load_signed(&self) -> Option<Slate> {
        load_artifact(&self.signed_path)
    }

    pub fn has_artifacts(&self) -> bool {
        self.unsigned_path.exists() || self.signed_path.exists()
    }

    /// Best-effort removal of both artifacts
    pub fn cleanup(&self) {
        remove_artifact(&self.unsigned_path);
        remove_artifact(&self.signed_path);
    }

    /// Best-effort removal of the signed artifact only
    pub fn discard_signed(&self) {
        remove_artifact(&self.signed_path);
    }
}

fn remove_artifact(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => debug!("Removed {}", path.display()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => debug!("Could not remove {}: {}", path.display(), e),
    }
}

fn write_artifact(path: &Path, slate: &Slate, what: &'static str) -> PayoutResult<()> {
    fs::write(path, slate.as_str()).map_err(|source| PayoutError::Storage {
        what,
        path: path.to_path_buf(),
        source,
    })?;
    debug!("Wrote {} to {}", what, path.display());
    Ok(())
}

fn load_artifact(path: &Path) -> Option<Slate> {
    match SlateStore::read_if_present(path) {
        Ok(Some(text)) => match Slate::parse(text.trim_end()) {
            Ok(slate) => Some(slate),
            Err(e) => {
                debug!("Ignoring {}: not valid JSON ({})", path.display(), e);
                None
            }
        },
        Ok(None) => None,
        Err(e) => {
            debug!("Ignoring {}: {}", path.display(), e);
            None
        }
    }
}
