use std::future::Future;

use serde::Serialize;

use crate::ledger::AccountBalance;
use crate::types::{Currency, Role, UserId};

/// Outcome of a conditional balance write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CasOutcome {
    /// The store still held the expected snapshot; the update is committed.
    Applied,
    /// The stored row no longer matched the expected snapshot. Nothing was
    /// written; the caller re-reads and retries.
    Conflict,
}

/// Store-side failures, as seen through the narrow contract below.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Round trip timed out with unknown outcome. Safe to retry the whole
    /// read-compute-write sequence: a stale expected snapshot is rejected
    /// by the store, never double-applied.
    #[error("store round trip timed out")]
    Timeout,
    /// Store rejected or could not service the request.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Consumer-provided access to the account-balance rows.
///
/// This is the entire data-store contract the gate depends on: a point
/// lookup by account id, and a conditional update that commits only if the
/// stored row still equals the snapshot the caller read. The expected
/// snapshot includes the role, so a concurrent role change invalidates the
/// write just like a concurrent debit does.
///
/// # Example
///
/// ```rust,ignore
/// impl AccountStore for PgAccounts {
///     async fn fetch(&self, user_id: &UserId) -> Result<Option<AccountBalance>, StoreError> {
///         self.pool.select_account(user_id.as_ref()).await
///             .map_err(|e| StoreError::Unavailable(e.to_string()))
///     }
///
///     async fn apply_if_unchanged(
///         &self,
///         expected: &AccountBalance,
///         updated: &AccountBalance,
///     ) -> Result<CasOutcome, StoreError> {
///         // UPDATE accounts SET coins=$1, gems=$2, role=$3
///         //  WHERE id=$4 AND coins=$5 AND gems=$6 AND role=$7
///         let rows = self.pool.conditional_update(expected, updated).await?;
///         Ok(if rows == 1 { CasOutcome::Applied } else { CasOutcome::Conflict })
///     }
/// }
/// ```
pub trait AccountStore: Send + Sync + 'static {
    /// Point lookup by account id.
    fn fetch(
        &self,
        user_id: &UserId,
    ) -> impl Future<Output = Result<Option<AccountBalance>, StoreError>> + Send;

    /// Commit `updated` only if the stored row still equals `expected`.
    fn apply_if_unchanged(
        &self,
        expected: &AccountBalance,
        updated: &AccountBalance,
    ) -> impl Future<Output = Result<CasOutcome, StoreError>> + Send;
}

/// Event emitted after a spend has committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum WalletEvent {
    RoleUpgraded {
        user_id: UserId,
        role: Role,
        currency: Currency,
        amount: u64,
    },
    ItemUnlocked {
        user_id: UserId,
        item: String,
        currency: Currency,
        amount: u64,
    },
}

/// Consumer-provided publisher capability.
///
/// Handlers that need to announce wallet events receive this as an
/// explicitly injected dependency rather than reaching for a process-wide
/// hub. Events are fire-and-forget: publishing happens after the store
/// commit and cannot fail it.
///
/// # Example
///
/// ```rust,ignore
/// impl EventPublisher for SocketHub {
///     async fn publish(&self, event: WalletEvent) {
///         self.broadcast("wallet", &event).await;
///     }
/// }
/// ```
pub trait EventPublisher: Send + Sync + 'static {
    fn publish(&self, event: WalletEvent) -> impl Future<Output = ()> + Send;
}

/// Publisher that records events only in the trace log.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPublisher;

impl EventPublisher for NoopPublisher {
    async fn publish(&self, event: WalletEvent) {
        tracing::debug!(?event, "wallet event dropped (no publisher configured)");
    }
}
