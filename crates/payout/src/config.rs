//! Deployment configuration
//!
//! Everything that differs between pool deployments (API location, wallet
//! binary naming, which payout methods exist) is described here and chosen at
//! startup. Loaded from `~/.pool-payout/config.toml` or an explicit file, with
//! built-in presets for the known pools.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{
    error::{PayoutError, PayoutResult},
    slate::Balance,
};

/// The ways a payment slate can get signed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PayoutMethod {
    /// The pool coin's own wallet CLI (`grin-wallet`, `bitgrin-wallet`)
    NativeWallet,
    /// Grin++ style wallet daemon with an owner HTTP API
    WalletDaemon,
    /// wallet713 interactive shell
    Wallet713,
    /// Operator moves slate files by hand
    SlateFiles,
}

impl PayoutMethod {
    pub fn slug(&self) -> &'static str {
        match self {
            PayoutMethod::NativeWallet => "native-wallet",
            PayoutMethod::WalletDaemon => "wallet-daemon",
            PayoutMethod::Wallet713 => "wallet713",
            PayoutMethod::SlateFiles => "slate-files",
        }
    }
}

/// Built-in deployments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    Mwgrinpool,
    Bitgrinpool,
    Mwfloopool,
}

impl Preset {
    fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "mwgrinpool" => Some(Preset::Mwgrinpool),
            "bitgrinpool" => Some(Preset::Bitgrinpool),
            "mwfloopool" => Some(Preset::Mwfloopool),
            _ => None,
        }
    }

    pub fn config(&self) -> DeploymentConfig {
        match self {
            Preset::Mwgrinpool => DeploymentConfig {
                pool_name: "MWGrinPool".to_string(),
                api_url: "https://api.mwgrinpool.com".to_string(),
                payout_methods: vec![
                    PayoutMethod::NativeWallet,
                    PayoutMethod::WalletDaemon,
                    PayoutMethod::Wallet713,
                    PayoutMethod::SlateFiles,
                ],
                ..DeploymentConfig::base()
            },
            Preset::Bitgrinpool => DeploymentConfig {
                pool_name: "BitGrinPool".to_string(),
                api_url: "https://api.pool.bitgrin.dev".to_string(),
                wallet_name: "BitGrin".to_string(),
                wallet_prefix: "bitgrin".to_string(),
                payout_methods: vec![PayoutMethod::NativeWallet, PayoutMethod::SlateFiles],
                ..DeploymentConfig::base()
            },
            Preset::Mwfloopool => DeploymentConfig {
                pool_name: "MWFlooPool".to_string(),
                api_url: "https://api.mwfloopool.com".to_string(),
                wallet_flags: vec!["--floonet".to_string()],
                payout_methods: vec![
                    PayoutMethod::NativeWallet,
                    PayoutMethod::Wallet713,
                    PayoutMethod::SlateFiles,
                ],
                ..DeploymentConfig::base()
            },
        }
    }
}

/// Configuration for one pool deployment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentConfig {
    /// Display name used in the banner and prompts
    pub pool_name: String,
    pub api_url: String,
    /// Display name of the native wallet ("Grin" gives "Grin Wallet")
    pub wallet_name: String,
    /// Native wallet binary is `<prefix>-wallet`
    pub wallet_prefix: String,
    /// Extra flags passed to every wallet invocation, e.g. `--floonet`
    pub wallet_flags: Vec<String>,
    /// Enabled methods, in menu order
    pub payout_methods: Vec<PayoutMethod>,
    /// Smallest balance the pool will pay out, in coins
    pub minimum_payout: f64,
    pub wallet_daemon_url: String,
    /// Unsigned slate file name; the signed response is `<name>.response`
    pub slate_file: String,
    /// Longest wait for output from an interactive wallet shell
    pub conversation_timeout_secs: u64,
    /// Longest wait for an interactive wallet shell to exit
    pub exit_wait_secs: u64,
}

/// Config file contents; anything left out falls back to `preset`
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    preset: Option<String>,
    pool_name: Option<String>,
    api_url: Option<String>,
    wallet_name: Option<String>,
    wallet_prefix: Option<String>,
    wallet_flags: Option<Vec<String>>,
    payout_methods: Option<Vec<PayoutMethod>>,
    minimum_payout: Option<f64>,
    wallet_daemon_url: Option<String>,
    slate_file: Option<String>,
    conversation_timeout_secs: Option<u64>,
    exit_wait_secs: Option<u64>,
}

impl DeploymentConfig {
    fn base() -> Self {
        Self {
            pool_name: String::new(),
            api_url: String::new(),
            wallet_name: "Grin".to_string(),
            wallet_prefix: "grin".to_string(),
            wallet_flags: Vec::new(),
            payout_methods: Vec::new(),
            minimum_payout: 0.1,
            wallet_daemon_url: "http://localhost:3420".to_string(),
            slate_file: "payment_slate.json".to_string(),
            conversation_timeout_secs: 30,
            exit_wait_secs: 5,
        }
    }

    /// Get the path to the user config file
    pub fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".pool-payout")
            .join("config.toml")
    }

    /// Load from `explicit`, else the user config file, else `preset`
    pub fn load(explicit: Option<&Path>, preset: Preset) -> PayoutResult<Self> {
        let config = match explicit {
            Some(path) => Self::from_file(path, preset)?,
            None => {
                let path = Self::config_path();
                if path.exists() {
                    Self::from_file(&path, preset)?
                } else {
                    preset.config()
                }
            }
        };
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path, preset: Preset) -> PayoutResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            PayoutError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content, preset)
    }

    /// Parse config file contents over the named (or given) preset
    pub fn from_toml(content: &str, preset: Preset) -> PayoutResult<Self> {
        let file: ConfigFile =
            toml::from_str(content).map_err(|e| PayoutError::Config(e.to_string()))?;

        let preset = match file.preset.as_deref() {
            Some(name) => Preset::from_name(name)
                .ok_or_else(|| PayoutError::Config(format!("unknown preset '{}'", name)))?,
            None => preset,
        };
        let base = preset.config();

        Ok(Self {
            pool_name: file.pool_name.unwrap_or(base.pool_name),
            api_url: file.api_url.unwrap_or(base.api_url),
            wallet_name: file.wallet_name.unwrap_or(base.wallet_name),
            wallet_prefix: file.wallet_prefix.unwrap_or(base.wallet_prefix),
            wallet_flags: file.wallet_flags.unwrap_or(base.wallet_flags),
            payout_methods: file.payout_methods.unwrap_or(base.payout_methods),
            minimum_payout: file.minimum_payout.unwrap_or(base.minimum_payout),
            wallet_daemon_url: file.wallet_daemon_url.unwrap_or(base.wallet_daemon_url),
            slate_file: file.slate_file.unwrap_or(base.slate_file),
            conversation_timeout_secs: file
                .conversation_timeout_secs
                .unwrap_or(base.conversation_timeout_secs),
            exit_wait_secs: file.exit_wait_secs.unwrap_or(base.exit_wait_secs),
        })
    }

    pub fn validate(&self) -> PayoutResult<()> {
        if self.payout_methods.is_empty() {
            return Err(PayoutError::Config("no payout methods enabled".to_string()));
        }
        if self.minimum_payout.is_nan() || self.minimum_payout <= 0.0 {
            return Err(PayoutError::Config(format!(
                "minimum_payout must be positive, got {}",
                self.minimum_payout
            )));
        }
        if self.slate_file.trim().is_empty() {
            return Err(PayoutError::Config("slate_file must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn minimum_payout_balance(&self) -> Balance {
        Balance::from_coins(self.minimum_payout)
    }

    /// Menu label for `method` in this deployment
    pub fn method_label(&self, method: PayoutMethod) -> String {
        match method {
            PayoutMethod::NativeWallet => format!("{} Wallet", self.wallet_name),
            PayoutMethod::WalletDaemon => "Grin++ Wallet".to_string(),
            PayoutMethod::Wallet713 => "Wallet713".to_string(),
            PayoutMethod::SlateFiles => "Slate Files".to_string(),
        }
    }

    /// Match a `--payout-method` value (label or slug, any case) against
    /// the enabled methods
    pub fn resolve_method(&self, input: &str) -> PayoutResult<PayoutMethod> {
        let wanted = input.trim().to_lowercase();
        self.payout_methods
            .iter()
            .copied()
            .find(|m| m.slug() == wanted || self.method_label(*m).to_lowercase() == wanted)
            .ok_or_else(|| {
                PayoutError::InvalidInput(format!("Invalid payout method requested: {}", input))
            })
    }

    /// Native wallet binary base name
    pub fn native_wallet_binary(&self) -> String {
        format!("{}-wallet", self.wallet_prefix)
    }
}

impl Default for DeploymentConfig {
    fn default() -> Self {
        Preset::Mwgrinpool.config()
    }
}
