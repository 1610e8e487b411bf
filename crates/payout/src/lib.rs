//! Pool Payout - request a payout from a mining pool
//!
//! A payout is a slate round trip: the pool hands out an unsigned payment
//! slate, a wallet signs it, and the signed slate goes back to the pool.
//!
//! ```text
//! commands ──> orchestrator ──> pool_client::PoolClient
//!                   │
//!                   ├──> backend::SigningBackend (wallet CLI, wallet713,
//!                   │                             wallet daemon, manual files)
//!                   └──> slate_store::SlateStore (resume checkpoints)
//! ```

pub mod backend;
pub mod commands;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod output;
pub mod prompt;
pub mod slate;
pub mod slate_store;

#[cfg(test)]
mod test_support;

pub use config::{DeploymentConfig, PayoutMethod, Preset};
pub use error::{PayoutError, PayoutResult};
pub use orchestrator::{PayoutOrchestrator, PayoutOutcome};
