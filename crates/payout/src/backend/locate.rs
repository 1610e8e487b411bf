//! Wallet executable discovery

use std::{
    env,
    ffi::OsStr,
    path::{Path, PathBuf},
};

use tracing::debug;

use crate::error::{PayoutError, PayoutResult};

/// Directories searched for `name`, in order: PATH, the working directory,
/// then a checkout of the wallet in the working directory and its build
/// output folders.
pub fn search_dirs(path_var: Option<&OsStr>, work_dir: &Path, name: &str) -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = path_var
        .map(|p| env::split_paths(p).collect())
        .unwrap_or_default();

    let checkout = work_dir.join(name);
    dirs.push(work_dir.to_path_buf());
    dirs.push(checkout.clone());
    dirs.push(checkout.join("target").join("debug"));
    dirs.push(checkout.join("target").join("release"));
    dirs
}

/// [`search_dirs`] for this process's PATH
pub fn default_search_dirs(name: &str, work_dir: &Path) -> Vec<PathBuf> {
    search_dirs(env::var_os("PATH").as_deref(), work_dir, name)
}

/// First file called `name` (or `name` + the platform executable suffix)
/// in `dirs`
pub fn locate_executable(name: &str, dirs: &[PathBuf]) -> PayoutResult<PathBuf> {
    let mut file_names = vec![name.to_string()];
    if !env::consts::EXE_SUFFIX.is_empty() {
        file_names.insert(0, format!("{}{}", name, env::consts::EXE_SUFFIX));
    }

    for dir in dirs {
        for file_name in &file_names {
            let candidate = dir.join(file_name);
            if candidate.is_file() {
                debug!("Found {} at {}", name, candidate.display());
                return Ok(candidate);
            }
        }
    }

    Err(PayoutError::NotFound(format!(
        "Could not find {} executable, please add it to your PATH or copy it into this directory.",
        name
    )))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_search_order() {
        let work = Path::new("/work");
        let path = env::join_paths(["/usr/bin", "/opt/wallets"]).unwrap();
        let dirs = search_dirs(Some(&path), work, "grin-wallet");
        assert_eq!(
            dirs,
            vec![
                PathBuf::from("/usr/bin"),
                PathBuf::from("/opt/wallets"),
                PathBuf::from("/work"),
                PathBuf::from("/work/grin-wallet"),
                PathBuf::from("/work/grin-wallet/target/debug"),
                PathBuf::from("/work/grin-wallet/target/release"),
            ]
        );
    }

    #[test]
    fn test_search_without_path() {
        let dirs = search_dirs(None, Path::new("/work"), "wallet713");
        assert_eq!(dirs.len(), 4);
        assert_eq!(dirs[0], PathBuf::from("/work"));
    }

    #[test]
    fn test_first_match_wins() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        fs::write(second.path().join("grin-wallet"), "").unwrap();
        fs::write(first.path().join("grin-wallet"), "").unwrap();

        let dirs = vec![first.path().to_path_buf(), second.path().to_path_buf()];
        let found = locate_executable("grin-wallet", &dirs).unwrap();
        assert_eq!(found, first.path().join("grin-wallet"));
    }

    #[test]
    fn test_directories_are_not_executables() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("grin-wallet")).unwrap();
        let err = locate_executable("grin-wallet", &[dir.path().to_path_buf()]).unwrap_err();
        assert!(matches!(err, PayoutError::NotFound(_)));
    }

    #[test]
    fn test_missing_everywhere() {
        let err = locate_executable("bitgrin-wallet", &[]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Could not find bitgrin-wallet executable, please add it to your PATH or copy it into this directory."
        );
    }
}
