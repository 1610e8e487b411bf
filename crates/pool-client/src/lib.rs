//! Pool Client - typed HTTP access to the mining pool REST API
//!
//! Two groups of endpoints are covered:
//! - **Payout** (basic auth): account lookup, unpaid balance, payment slate
//!   request and signed slate submission. Used by `pool-payout`.
//! - **Statistics** (public): chain height, pool-found blocks, per-block
//!   scaling/fees and pool graph rates. Used by `earnings-estimate`.
//!
//! Slates are exchanged as raw text. The client never decodes them, so the
//! bytes the pool sends are the bytes handed back to the caller.
//!
//! Nothing here retries. A non-2xx answer is surfaced as
//! [`PoolClientError::Api`] with the response body so the caller can show
//! the operator what the pool said.

mod types;

pub use types::*;

use reqwest::{RequestBuilder, Response};
use tracing::debug;

/// Public API of the default deployment
pub const DEFAULT_POOL_API_URL: &str = "https://api.mwgrinpool.com";

/// Error types for pool API operations
#[derive(Debug, thiserror::Error)]
pub enum PoolClientError {
    #[error("pool API not reachable at {url}: {source}")]
    NotReachable {
        url: String,
        source: reqwest::Error,
    },

    #[error("pool API returned error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("failed to parse pool API response: {0}")]
    Parse(#[from] reqwest::Error),

    #[error("pool credentials are required for this request")]
    MissingCredentials,
}

impl PoolClientError {
    /// HTTP status of an upstream rejection, if that is what this is
    pub fn status(&self) -> Option<u16> {
        match self {
            PoolClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Body text the pool sent along with a rejection, or the error itself
    pub fn detail(&self) -> String {
        match self {
            PoolClientError::Api { body, .. } => body.clone(),
            other => other.to_string(),
        }
    }
}

pub type PoolResult<T> = Result<T, PoolClientError>;

/// Client for one pool deployment
#[derive(Debug, Clone)]
pub struct PoolClient {
    base_url: String,
    client: reqwest::Client,
    credentials: Option<PoolCredentials>,
}

impl PoolClient {
    /// Anonymous client, enough for the statistics endpoints
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            credentials: None,
        }
    }

    /// Client that authenticates every payout request as `credentials`
    pub fn with_credentials(base_url: &str, credentials: PoolCredentials) -> Self {
        Self {
            credentials: Some(credentials),
            ..Self::new(base_url)
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Pool login name, if this client has credentials
    pub fn username(&self) -> Option<&str> {
        self.credentials.as_ref().map(|c| c.username.as_str())
    }

    // ============= Payout Endpoints =============

    /// Resolve the numeric account id for the configured login
    pub async fn get_user_id(&self) -> PoolResult<u64> {
        let req = self.authed(self.client.get(self.url("/pool/users")))?;
        let resp = self.send(req).await?;
        let account: AccountInfo = resp.json().await?;
        debug!("Resolved pool account id {}", account.id);
        Ok(account.id)
    }

    /// Unpaid balance in nano-units, `None` when the pool has no record
    pub async fn get_balance(&self, user_id: u64) -> PoolResult<Option<i64>> {
        let req = self.authed(
            self.client
                .get(self.url(&format!("/worker/utxo/{}", user_id))),
        )?;
        let resp = self.send(req).await?;
        let balance: Option<UtxoBalance> = resp.json().await?;
        Ok(balance.map(|b| b.amount))
    }

    /// Ask the pool to start a payment and return the unsigned slate text
    pub async fn get_unsigned_slate(&self, user_id: u64) -> PoolResult<String> {
        let req = self.authed(
            self.client
                .post(self.url(&format!("/pool/payment/get_tx_slate/{}", user_id))),
        )?;
        let resp = self.send(req).await?;
        let slate = resp.text().await?;
        debug!("Received unsigned slate ({} bytes)", slate.len());
        Ok(slate)
    }

    /// Hand the wallet-signed slate back so the pool can finalize and post it
    pub async fn submit_signed_slate(&self, user_id: u64, signed_slate: &str) -> PoolResult<()> {
        let req = self.authed(
            self.client
                .post(self.url(&format!("/pool/payment/submit_tx_slate/{}", user_id)))
                .body(signed_slate.to_string()),
        )?;
        self.send(req).await?;
        Ok(())
    }

    // ============= Statistics Endpoints =============

    /// Current chain height
    pub async fn get_chain_height(&self) -> PoolResult<u64> {
        let resp = self.send(self.client.get(self.url("/grin/block/height"))).await?;
        let tip: ChainHeight = resp.json().await?;
        Ok(tip.height)
    }

    /// Heights of the blocks the pool found within the last day of pool history
    pub async fn get_pool_blocks(&self) -> PoolResult<Vec<PoolBlock>> {
        let resp = self
            .send(self.client.get(self.url("/pool/blocks/0,1440/height")))
            .await?;
        Ok(resp.json().await?)
    }

    /// Secondary scaling and fees of the block at `height`
    pub async fn get_block_stats(&self, height: u64) -> PoolResult<BlockStats> {
        let resp = self
            .send(self.client.get(self.url(&format!(
                "/grin/block/{}/height,secondary_scaling,fee",
                height
            ))))
            .await?;
        Ok(resp.json().await?)
    }

    /// Pool graph rates recorded at `height`
    pub async fn get_pool_graph_rates(&self, height: u64) -> PoolResult<PoolGraphRates> {
        let resp = self
            .send(self.client.get(self.url(&format!("/pool/stat/{}/gps", height))))
            .await?;
        Ok(resp.json().await?)
    }

    // ============= Helpers =============

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authed(&self, req: RequestBuilder) -> PoolResult<RequestBuilder> {
        let creds = self
            .credentials
            .as_ref()
            .ok_or(PoolClientError::MissingCredentials)?;
        Ok(req.basic_auth(&creds.username, Some(&creds.password)))
    }

    async fn send(&self, req: RequestBuilder) -> PoolResult<Response> {
        let resp = req.send().await.map_err(|e| PoolClientError::NotReachable {
            url: self.base_url.clone(),
            source: e,
        })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(PoolClientError::Api { status, body });
        }

        Ok(resp)
    }
}

impl Default for PoolClient {
    fn default() -> Self {
        Self::new(DEFAULT_POOL_API_URL)
    }
}
