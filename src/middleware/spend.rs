//! Spend driver: commits a funded transition through the store's
//! compare-and-swap, retrying a bounded number of times under contention.

use std::time::Duration;

use rand::Rng;

use super::traits::{AccountStore, CasOutcome, EventPublisher, StoreError, WalletEvent};
use crate::ledger::{self, AccountBalance, LedgerError, SpendEffect, SpendRequest};
use crate::types::UserId;

/// Bounds on the read-compute-write retry loop.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Attempts before surfacing [`SpendFailure::Contention`].
    pub max_attempts: u32,
    /// First backoff delay; doubled per attempt, with up to 50% jitter.
    pub base_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_backoff: Duration::from_millis(25),
        }
    }
}

impl RetryPolicy {
    fn backoff_for(&self, attempt: u32) -> Duration {
        let base_ms = self.base_backoff.as_millis() as u64;
        let shifted = base_ms.saturating_mul(1u64 << attempt.min(6));
        let jitter = rand::rng().random_range(0..=shifted / 2);
        Duration::from_millis(shifted + jitter)
    }
}

/// Failures of [`execute_spend`].
#[derive(Debug, thiserror::Error)]
pub enum SpendFailure {
    /// Terminal refusal from the ledger guard. Never retried; nothing was
    /// written.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// No balance row exists for the account.
    #[error("no account record for {0}")]
    UnknownAccount(UserId),

    /// Every attempt found the stored row changed underneath it.
    #[error("balance contention persisted after {attempts} attempts")]
    Contention { attempts: u32 },

    /// Store failed in a way that is not safe to retry here.
    #[error("account store unavailable: {0}")]
    Store(String),
}

/// Result of a committed spend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpendReceipt {
    pub new_balance: AccountBalance,
    pub effect: SpendEffect,
}

/// Applies `request` to the stored account balance, atomically.
///
/// Each attempt reads a fresh snapshot, computes the transition with
/// [`ledger::apply_spend`], and commits it only if the stored row still
/// equals the snapshot. A conflicting write or a timed-out round trip
/// (unknown outcome, idempotent under the compare precondition) triggers a
/// backed-off retry up to `policy.max_attempts`. Ledger refusals are
/// terminal and returned immediately.
///
/// Publishes a [`WalletEvent`] after the commit; publishing cannot fail
/// the spend.
///
/// # Errors
///
/// See [`SpendFailure`].
pub async fn execute_spend<A, P>(
    store: &A,
    publisher: &P,
    request: &SpendRequest,
    policy: &RetryPolicy,
) -> Result<SpendReceipt, SpendFailure>
where
    A: AccountStore,
    P: EventPublisher,
{
    let mut attempt: u32 = 0;
    loop {
        attempt += 1;

        let snapshot = match store.fetch(request.user_id()).await {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => return Err(SpendFailure::UnknownAccount(request.user_id().clone())),
            Err(StoreError::Timeout) => {
                back_off_or_bail(policy, attempt, request.user_id()).await?;
                continue;
            }
            Err(StoreError::Unavailable(message)) => return Err(SpendFailure::Store(message)),
        };

        let outcome = ledger::apply_spend(&snapshot, request)?;

        match store.apply_if_unchanged(&snapshot, &outcome.new_balance).await {
            Ok(CasOutcome::Applied) => {
                tracing::info!(
                    user_id = %request.user_id(),
                    currency = %request.currency(),
                    amount = request.amount(),
                    attempt,
                    "spend committed"
                );
                publisher.publish(wallet_event(request)).await;
                return Ok(SpendReceipt {
                    new_balance: outcome.new_balance,
                    effect: outcome.effect_granted,
                });
            }
            Ok(CasOutcome::Conflict) | Err(StoreError::Timeout) => {
                back_off_or_bail(policy, attempt, request.user_id()).await?;
            }
            Err(StoreError::Unavailable(message)) => return Err(SpendFailure::Store(message)),
        }
    }
}

async fn back_off_or_bail(
    policy: &RetryPolicy,
    attempt: u32,
    user_id: &UserId,
) -> Result<(), SpendFailure> {
    if attempt >= policy.max_attempts {
        tracing::warn!(%user_id, attempts = attempt, "spend retries exhausted");
        return Err(SpendFailure::Contention { attempts: attempt });
    }
    tracing::debug!(%user_id, attempt, "balance write conflicted, retrying");
    tokio::time::sleep(policy.backoff_for(attempt)).await;
    Ok(())
}

fn wallet_event(request: &SpendRequest) -> WalletEvent {
    match request.effect() {
        SpendEffect::GrantRole(role) => WalletEvent::RoleUpgraded {
            user_id: request.user_id().clone(),
            role: *role,
            currency: request.currency(),
            amount: request.amount(),
        },
        SpendEffect::Unlock(item) => WalletEvent::ItemUnlocked {
            user_id: request.user_id().clone(),
            item: item.clone(),
            currency: request.currency(),
            amount: request.amount(),
        },
    }
}
