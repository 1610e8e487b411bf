//! Payout workflow
//!
//! One run walks the same backbone for every payout method:
//!
//! ```text
//! prepare backend
//!   -> resolve account
//!   -> signed artifact on disk? ── yes, submit it ──────────────────┐
//!   -> unsigned artifact on disk? (manual exchange only) ── reuse ─┐ │
//!   -> balance + minimum check -> request slate -> save unsigned   │ │
//!   -> sign <──────────────────────────────────────────────────────┘ │
//!   -> save signed -> submit <───────────────────────────────────────┘
//!   -> clean up
//! release backend
//! ```
//!
//! Each slate is written to disk as soon as it exists so an interrupted run
//! can be resumed without asking the pool for a second payment.

use pool_client::{PoolClient, PoolClientError};
use tracing::{debug, info, warn};

use crate::{
    backend::SigningBackend,
    config::{DeploymentConfig, PayoutMethod},
    error::{PayoutError, PayoutResult},
    output::OutputHandler,
    prompt::{confirm, Prompter},
    slate::{Account, Balance, Slate},
    slate_store::SlateStore,
};

/// Where a run picked up its slate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumePoint {
    /// Requested a new slate from the pool
    Fresh,
    /// Signed an unsigned slate left by an earlier run
    UnsignedArtifact,
    /// Submitted a signed slate left by an earlier run
    SignedArtifact,
}

/// State of one run, threaded through every step
#[derive(Debug)]
pub struct PayoutContext {
    pub method: PayoutMethod,
    pub account: Option<Account>,
    pub balance: Option<Balance>,
    pub unsigned: Option<Slate>,
    pub signed: Option<Slate>,
    pub resumed: ResumePoint,
    /// Set once this run wrote or adopted a slate artifact
    touched: bool,
}

impl PayoutContext {
    pub fn new(method: PayoutMethod) -> Self {
        Self {
            method,
            account: None,
            balance: None,
            unsigned: None,
            signed: None,
            resumed: ResumePoint::Fresh,
            touched: false,
        }
    }

    fn outcome(&self, account: &Account) -> PayoutOutcome {
        PayoutOutcome {
            user_id: account.user_id,
            balance: self.balance,
            resumed: self.resumed,
        }
    }
}

/// Result of a successful run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayoutOutcome {
    pub user_id: u64,
    /// Balance when it was fetched; resumed runs skip the lookup
    pub balance: Option<Balance>,
    pub resumed: ResumePoint,
}

pub struct PayoutOrchestrator {
    pool: PoolClient,
    store: SlateStore,
    pool_name: String,
    minimum: Balance,
}

impl PayoutOrchestrator {
    pub fn new(pool: PoolClient, store: SlateStore, config: &DeploymentConfig) -> Self {
        Self {
            pool,
            store,
            pool_name: config.pool_name.clone(),
            minimum: config.minimum_payout_balance(),
        }
    }

    pub fn store(&self) -> &SlateStore {
        &self.store
    }

    /// Run one payout with `backend`.
    ///
    /// Nothing is sent to the pool unless the backend prepared successfully.
    /// Once it has, `release()` runs exactly once whatever happens next.
    pub async fn run(
        &self,
        backend: &mut dyn SigningBackend,
        prompter: &mut dyn Prompter,
        output: &OutputHandler,
    ) -> PayoutResult<PayoutOutcome> {
        backend.prepare(output).await?;

        let mut ctx = PayoutContext::new(backend.method());
        let result = self.execute(&mut ctx, backend, prompter, output).await;

        if let Err(e) = &result {
            if !ctx.touched {
                debug!("Payout failed ({}) before any slate artifact was written", e);
            } else if operator_left(e, &*backend) {
                info!("Keeping {} for the next run", self.store.unsigned_path().display());
            } else {
                debug!("Payout failed ({}), removing slate artifacts", e);
                self.store.cleanup();
            }
        }

        if let Err(e) = backend.release().await {
            warn!("Releasing the {} wallet failed: {}", ctx.method.slug(), e);
            if result.is_ok() {
                output.print_warning(&e.to_string());
            }
        }

        result
    }

    async fn execute(
        &self,
        ctx: &mut PayoutContext,
        backend: &mut dyn SigningBackend,
        prompter: &mut dyn Prompter,
        output: &OutputHandler,
    ) -> PayoutResult<PayoutOutcome> {
        let account = self.resolve_account(output).await?;
        ctx.account = Some(account.clone());

        if let Some(signed) = self.offer_signed_artifact(ctx, prompter, output)? {
            self.submit(&account, &signed, output).await?;
            ctx.signed = Some(signed);
            self.store.cleanup();
            info!("Submitted the signed slate left by an earlier run");
            return Ok(ctx.outcome(&account));
        }

        if backend.resumes_unsigned() {
            self.offer_unsigned_artifact(ctx, prompter, output)?;
        } else {
            self.store.cleanup();
        }

        let unsigned = match ctx.unsigned.clone() {
            Some(slate) => slate,
            None => {
                let slate = self.request_slate(ctx, &account, output).await?;
                if backend.interactive() {
                    output.print_blank();
                    output.print_progress("Payment slate file written to");
                    output.print_success(Some(&self.store.unsigned_path().display().to_string()));
                }
                ctx.unsigned = Some(slate.clone());
                slate
            }
        };

        let signed = if backend.interactive() {
            backend.sign(&unsigned, &self.store, prompter, output).await?
        } else {
            output.print_progress("Processing the payment with your wallet");
            let signed = backend.sign(&unsigned, &self.store, prompter, output).await?;
            output.print_success(None);
            signed
        };
        self.store.write_signed(&signed)?;
        ctx.signed = Some(signed.clone());

        self.submit(&account, &signed, output).await?;
        self.store.cleanup();
        Ok(ctx.outcome(&account))
    }

    async fn resolve_account(&self, output: &OutputHandler) -> PayoutResult<Account> {
        output.print_progress("Getting your pool User ID");
        let user_id = self.pool.get_user_id().await.map_err(|e| {
            let message = format!(
                "Failed to get your account information from {}: {}",
                self.pool_name,
                e.detail()
            );
            match e {
                PoolClientError::NotReachable { .. } => PayoutError::Network(message),
                _ => PayoutError::Auth(message),
            }
        })?;
        output.print_success(None);

        Ok(Account {
            username: self.pool.username().unwrap_or_default().to_string(),
            user_id,
        })
    }

    /// Signed slate from an earlier run the operator wants submitted
    fn offer_signed_artifact(
        &self,
        ctx: &mut PayoutContext,
        prompter: &mut dyn Prompter,
        output: &OutputHandler,
    ) -> PayoutResult<Option<Slate>> {
        let Some(signed) = self.store.load_signed() else {
            return Ok(None);
        };

        let accepted = confirm(prompter, output, "Found a signed slate file.  Process it?")?;
        ctx.touched = true;
        if accepted {
            ctx.resumed = ResumePoint::SignedArtifact;
            Ok(Some(signed))
        } else {
            self.store.discard_signed();
            Ok(None)
        }
    }

    /// Offer an unsigned slate from an earlier run; anything not reused is
    /// removed
    fn offer_unsigned_artifact(
        &self,
        ctx: &mut PayoutContext,
        prompter: &mut dyn Prompter,
        output: &OutputHandler,
    ) -> PayoutResult<()> {
        let Some(unsigned) = self.store.load_unsigned() else {
            self.store.cleanup();
            return Ok(());
        };

        if confirm(prompter, output, "Found a unsigned slate file.  Process it?")? {
            ctx.touched = true;
            ctx.resumed = ResumePoint::UnsignedArtifact;
            ctx.unsigned = Some(unsigned);
        } else {
            self.store.cleanup();
        }
        Ok(())
    }

    async fn fetch_balance(&self, account: &Account, output: &OutputHandler) -> PayoutResult<Balance> {
        output.print_progress("Getting your Available Balance");
        let amount = self
            .pool
            .get_balance(account.user_id)
            .await
            .map_err(|e| PayoutError::Network(format!("Failed to get your account balance: {}", e.detail())))?;
        let balance = amount.map(Balance::from_pool_amount).unwrap_or_default();
        output.print_success(Some(&balance.to_string()));
        Ok(balance)
    }

    /// Check the balance, then ask the pool for a payment and save the slate
    async fn request_slate(
        &self,
        ctx: &mut PayoutContext,
        account: &Account,
        output: &OutputHandler,
    ) -> PayoutResult<Slate> {
        let balance = self.fetch_balance(account, output).await?;
        ctx.balance = Some(balance);
        if balance < self.minimum {
            return Err(PayoutError::InsufficientBalance {
                minimum: self.minimum,
                available: balance,
            });
        }

        output.print_progress("Requesting a Payment from the pool");
        let text = self
            .pool
            .get_unsigned_slate(account.user_id)
            .await
            .map_err(|e| match e {
                PoolClientError::NotReachable { .. } => {
                    PayoutError::Network(format!("Failed to get a payment slate: {}", e))
                }
                other => PayoutError::PoolApi {
                    status: other.status(),
                    body: other.detail(),
                },
            })?;
        let slate = Slate::parse(text).map_err(|e| PayoutError::PoolApi {
            status: None,
            body: format!("the pool sent an invalid slate ({})", e),
        })?;

        ctx.touched = true;
        self.store.write_unsigned(&slate)?;
        output.print_success(None);
        Ok(slate)
    }

    async fn submit(&self, account: &Account, signed: &Slate, output: &OutputHandler) -> PayoutResult<()> {
        output.print_progress("Returning the signed payment slate to the pool");
        self.pool
            .submit_signed_slate(account.user_id, signed.as_str())
            .await
            .map_err(|e| PayoutError::Submission(e.detail()))?;
        output.print_success(None);
        Ok(())
    }
}

/// The operator walked away from a manual exchange, usually to sign the
/// unsigned slate elsewhere. The slate stays on disk to be offered again.
fn operator_left(err: &PayoutError, backend: &dyn SigningBackend) -> bool {
    matches!(err, PayoutError::InputClosed) && backend.resumes_unsigned()
}
