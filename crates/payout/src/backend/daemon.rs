//! Grin++ wallet owner API
//!
//! The wallet runs as a local daemon. A run logs in once in `prepare()`,
//! signs with the session token and logs out in `release()`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use tokio::{net::TcpStream, time::timeout};
use tracing::{debug, info};

use super::SigningBackend;
use crate::{
    config::PayoutMethod,
    error::{PayoutError, PayoutResult},
    output::OutputHandler,
    prompt::Prompter,
    slate::Slate,
    slate_store::SlateStore,
};

const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Deserialize)]
struct LoginResponse {
    session_token: String,
}

pub struct WalletDaemonBackend {
    base_url: String,
    username: String,
    passphrase: String,
    client: reqwest::Client,
    session_token: Option<String>,
}

impl WalletDaemonBackend {
    pub fn new(base_url: &str, username: String, passphrase: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            username,
            passphrase,
            client: reqwest::Client::new(),
            session_token: None,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1/wallet/owner/{}", self.base_url, path)
    }

    /// Check something is listening on the daemon port
    async fn probe(&self) -> PayoutResult<()> {
        let unavailable =
            || PayoutError::WalletUnavailable("Could not connect to Grin++ wallet port.  Is the wallet running?".to_string());

        let url = Url::parse(&self.base_url).map_err(|e| {
            PayoutError::Config(format!("invalid wallet daemon url {}: {}", self.base_url, e))
        })?;
        let host = url.host_str().ok_or_else(unavailable)?.to_string();
        let port = url.port_or_known_default().ok_or_else(unavailable)?;

        match timeout(PROBE_TIMEOUT, TcpStream::connect((host.as_str(), port))).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => {
                debug!("Wallet daemon probe {}:{} failed: {}", host, port, e);
                Err(unavailable())
            }
            Err(_) => {
                debug!("Wallet daemon probe {}:{} timed out", host, port);
                Err(unavailable())
            }
        }
    }

    async fn login(&self) -> PayoutResult<String> {
        let resp = self
            .client
            .post(self.url("login"))
            .header("username", &self.username)
            .header("password", &self.passphrase)
            .send()
            .await
            .map_err(|e| PayoutError::WalletUnavailable(format!("Failed to log into wallet - {}", e)))?;

        if !resp.status().is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(PayoutError::Auth(format!("Failed to log into wallet - {}", body)));
        }
        let login: LoginResponse = resp
            .json()
            .await
            .map_err(|e| PayoutError::Auth(format!("Failed to log into wallet - {}", e)))?;
        Ok(login.session_token)
    }
}

#[async_trait(?Send)]
impl SigningBackend for WalletDaemonBackend {
    fn method(&self) -> PayoutMethod {
        PayoutMethod::WalletDaemon
    }

    async fn prepare(&mut self, output: &OutputHandler) -> PayoutResult<()> {
        output.print_progress("Testing your Grin++ wallet API");
        self.probe().await?;
        output.print_success(None);

        output.print_progress("Logging in to your Grin++ wallet");
        let token = self.login().await?;
        self.session_token = Some(token);
        output.print_success(None);
        Ok(())
    }

    async fn sign(
        &mut self,
        unsigned: &Slate,
        _store: &SlateStore,
        _prompter: &mut dyn Prompter,
        _output: &OutputHandler,
    ) -> PayoutResult<Slate> {
        let token = self
            .session_token
            .as_deref()
            .ok_or_else(|| PayoutError::Auth("Not logged into wallet".to_string()))?;

        let resp = self
            .client
            .post(self.url("receive_tx"))
            .header("session_token", token)
            .body(format!("{{ \"slate\": {} }}", unsigned.as_str()))
            .send()
            .await
            .map_err(|e| PayoutError::Signing(format!("Failed to receive slate - {}", e)))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| PayoutError::Signing(format!("Failed to receive slate - {}", e)))?;
        if !status.is_success() {
            return Err(PayoutError::Signing(format!("Failed to receive slate - {}", body)));
        }

        Slate::parse(body).map_err(|e| {
            PayoutError::Signing(format!("Wallet returned an invalid signed slate: {}", e))
        })
    }

    async fn release(&mut self) -> PayoutResult<()> {
        let Some(token) = self.session_token.take() else {
            return Ok(());
        };

        let resp = self
            .client
            .post(self.url("logout"))
            .header("session_token", token)
            .send()
            .await
            .map_err(|e| PayoutError::WalletUnavailable(format!("Failed to log out of wallet - {}", e)))?;
        if !resp.status().is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(PayoutError::WalletUnavailable(format!(
                "Failed to log out of wallet - {}",
                body
            )));
        }
        info!("Logged out of the wallet daemon");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;
    use tokio::net::TcpListener;

    use super::*;
    use crate::test_support::{spawn_daemon_stub, DaemonStub, ScriptedPrompter};

    fn backend(url: &str, passphrase: &str) -> WalletDaemonBackend {
        WalletDaemonBackend::new(url, "miner".into(), passphrase.into())
    }

    async fn sign(wallet: &mut WalletDaemonBackend, body: &str) -> PayoutResult<Slate> {
        let dir = TempDir::new().unwrap();
        let store = SlateStore::new(dir.path(), "payment_slate.json");
        let mut prompter = ScriptedPrompter::new(Vec::<&str>::new());
        wallet
            .sign(
                &Slate::parse(body).unwrap(),
                &store,
                &mut prompter,
                &OutputHandler::new("TestPool"),
            )
            .await
    }

    #[tokio::test]
    async fn test_login_sign_logout() {
        let stub = spawn_daemon_stub(DaemonStub::default()).await;
        let mut wallet = backend(&stub.url, "secret");

        wallet.prepare(&OutputHandler::new("TestPool")).await.unwrap();
        let signed = sign(&mut wallet, r#"{"id":"s1"}"#).await.unwrap();
        assert_eq!(signed.as_str(), r#"{"signed":{"id":"s1"}}"#);

        wallet.release().await.unwrap();
        wallet.release().await.unwrap();
        assert_eq!(stub.logouts(), 1);
        assert_eq!(stub.received().await, vec![r#"{ "slate": {"id":"s1"} }"#.to_string()]);
    }

    #[tokio::test]
    async fn test_any_2xx_answer_is_success() {
        let stub = spawn_daemon_stub(DaemonStub {
            non_200_success: true,
            ..DaemonStub::default()
        })
        .await;
        let mut wallet = backend(&stub.url, "secret");

        wallet.prepare(&OutputHandler::new("TestPool")).await.unwrap();
        let signed = sign(&mut wallet, r#"{"id":"s2"}"#).await.unwrap();
        assert_eq!(signed.as_str(), r#"{"signed":{"id":"s2"}}"#);
        wallet.release().await.unwrap();
        assert_eq!(stub.logouts(), 1);
    }

    #[tokio::test]
    async fn test_bad_login_is_auth_error() {
        let stub = spawn_daemon_stub(DaemonStub::default()).await;
        let mut wallet = backend(&stub.url, "wrong");

        let err = wallet.prepare(&OutputHandler::new("TestPool")).await.unwrap_err();
        match err {
            PayoutError::Auth(msg) => assert_eq!(msg, "Failed to log into wallet - invalid login"),
            other => panic!("unexpected error: {other:?}"),
        }
        wallet.release().await.unwrap();
        assert_eq!(stub.logouts(), 0);
    }

    #[tokio::test]
    async fn test_rejected_receive_is_signing_error() {
        let stub = spawn_daemon_stub(DaemonStub {
            reject_receive: true,
            ..DaemonStub::default()
        })
        .await;
        let mut wallet = backend(&stub.url, "secret");
        wallet.prepare(&OutputHandler::new("TestPool")).await.unwrap();

        let err = sign(&mut wallet, r#"{"id":"s1"}"#).await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to receive slate - slate not accepted");

        wallet.release().await.unwrap();
        assert_eq!(stub.logouts(), 1);
    }

    #[tokio::test]
    async fn test_nothing_listening() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let mut wallet = backend(&format!("http://{addr}"), "secret");
        let err = wallet.prepare(&OutputHandler::new("TestPool")).await.unwrap_err();
        assert!(matches!(err, PayoutError::WalletUnavailable(_)));
    }
}
