//! Balance ledger guard.
//!
//! [`apply_spend`] is the single transition function for an account's
//! spendable balances. It is pure: given a snapshot and a spend request it
//! computes the would-be new state or a typed refusal, and never touches
//! storage. The atomicity obligation (two concurrent spends must not both
//! consume the same funds) is discharged by the caller committing the
//! result through a compare-and-swap keyed by the snapshot it read; see
//! `middleware::execute_spend`.

use serde::{Deserialize, Serialize};

use crate::types::{Currency, Role, UserId};

/// Per-user spendable quantities, plus the role a spend may upgrade.
///
/// Quantities are unsigned, so a stored balance can never be negative;
/// [`apply_spend`] refuses any debit that would overdraw before anything
/// is persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalance {
    pub user_id: UserId,
    pub coins: u64,
    pub gems: u64,
    pub role: Role,
}

impl AccountBalance {
    #[must_use]
    pub fn amount_of(&self, currency: Currency) -> u64 {
        match currency {
            Currency::Coins => self.coins,
            Currency::Gems => self.gems,
        }
    }

    fn with_amount(mut self, currency: Currency, amount: u64) -> Self {
        match currency {
            Currency::Coins => self.coins = amount,
            Currency::Gems => self.gems = amount,
        }
        self
    }
}

/// Entitlement granted by a successful spend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SpendEffect {
    /// Upgrade the account to the given role (e.g. VIP).
    GrantRole(Role),
    /// Unlock a named shop item.
    Unlock(String),
}

/// Request to debit an account in exchange for an effect.
///
/// Guaranteed well-formed by construction: [`SpendRequest::new`] rejects a
/// zero amount, so holding one proves `amount > 0`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpendRequest {
    user_id: UserId,
    currency: Currency,
    amount: u64,
    effect: SpendEffect,
}

impl SpendRequest {
    /// # Errors
    ///
    /// [`LedgerError::InvalidAmount`] when `amount` is zero.
    pub fn new(
        user_id: UserId,
        currency: Currency,
        amount: u64,
        effect: SpendEffect,
    ) -> Result<Self, LedgerError> {
        if amount == 0 {
            return Err(LedgerError::InvalidAmount);
        }
        Ok(Self {
            user_id,
            currency,
            amount,
            effect,
        })
    }

    #[must_use]
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    #[must_use]
    pub fn currency(&self) -> Currency {
        self.currency
    }

    #[must_use]
    pub fn amount(&self) -> u64 {
        self.amount
    }

    #[must_use]
    pub fn effect(&self) -> &SpendEffect {
        &self.effect
    }
}

/// Refusals of [`apply_spend`]. All are terminal: the caller reports them
/// and never retries, and no mutation has occurred.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("spend amount must be positive")]
    InvalidAmount,
    #[error("snapshot for {snapshot} does not match spend request for {requested}")]
    AccountMismatch { snapshot: UserId, requested: UserId },
    #[error("{currency} balance too low: need {required}, have {available}")]
    InsufficientFunds {
        currency: Currency,
        required: u64,
        available: u64,
    },
    #[error("role {role} already granted")]
    AlreadyGranted { role: Role },
}

/// Result of a successful [`apply_spend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpendOutcome {
    /// Debited balance, with the role updated for role-granting effects.
    pub new_balance: AccountBalance,
    /// Echo of the requested effect, for the caller to persist or display.
    pub effect_granted: SpendEffect,
}

/// Computes the funded state transition for `request` over `snapshot`.
///
/// Guard order: a role-granting spend against an account whose role
/// already implies the effect fails with [`LedgerError::AlreadyGranted`]
/// before any funds check, so a user is never charged for an effect they
/// already hold. The funds check then refuses any debit that would
/// overdraw.
///
/// # Errors
///
/// [`LedgerError::AccountMismatch`] when the snapshot belongs to a
/// different account than the request; [`LedgerError::AlreadyGranted`];
/// [`LedgerError::InsufficientFunds`] with `required` and `available` for
/// user-facing messaging.
pub fn apply_spend(
    snapshot: &AccountBalance,
    request: &SpendRequest,
) -> Result<SpendOutcome, LedgerError> {
    if snapshot.user_id != request.user_id {
        return Err(LedgerError::AccountMismatch {
            snapshot: snapshot.user_id.clone(),
            requested: request.user_id.clone(),
        });
    }

    if let SpendEffect::GrantRole(target) = request.effect {
        if snapshot.role >= target {
            return Err(LedgerError::AlreadyGranted { role: target });
        }
    }

    let available = snapshot.amount_of(request.currency);
    let Some(remaining) = available.checked_sub(request.amount) else {
        return Err(LedgerError::InsufficientFunds {
            currency: request.currency,
            required: request.amount,
            available,
        });
    };

    let mut new_balance = snapshot.clone().with_amount(request.currency, remaining);
    if let SpendEffect::GrantRole(target) = request.effect {
        new_balance.role = target;
    }

    Ok(SpendOutcome {
        new_balance,
        effect_granted: request.effect.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(coins: u64, gems: u64, role: Role) -> AccountBalance {
        AccountBalance {
            user_id: UserId::from("acct-1".to_string()),
            coins,
            gems,
            role,
        }
    }

    fn vip_upgrade(amount: u64) -> SpendRequest {
        SpendRequest::new(
            UserId::from("acct-1".to_string()),
            Currency::Gems,
            amount,
            SpendEffect::GrantRole(Role::Vip),
        )
        .unwrap()
    }

    #[test]
    fn zero_amount_rejected_at_construction() {
        let result = SpendRequest::new(
            UserId::from("acct-1".to_string()),
            Currency::Coins,
            0,
            SpendEffect::Unlock("badge".into()),
        );
        assert_eq!(result.unwrap_err(), LedgerError::InvalidAmount);
    }

    #[test]
    fn vip_upgrade_with_sufficient_gems() {
        let outcome = apply_spend(&account(50, 150, Role::User), &vip_upgrade(100)).unwrap();
        assert_eq!(outcome.new_balance.gems, 50);
        assert_eq!(outcome.new_balance.coins, 50);
        assert_eq!(outcome.new_balance.role, Role::Vip);
        assert_eq!(outcome.effect_granted, SpendEffect::GrantRole(Role::Vip));
    }

    #[test]
    fn vip_upgrade_with_insufficient_gems() {
        // {coins: 50, gems: 80}: a 100-gem spend can never produce -20
        let err = apply_spend(&account(50, 80, Role::User), &vip_upgrade(100)).unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientFunds {
                currency: Currency::Gems,
                required: 100,
                available: 80,
            }
        );
    }

    #[test]
    fn exact_balance_spends_to_zero() {
        let outcome = apply_spend(&account(0, 100, Role::User), &vip_upgrade(100)).unwrap();
        assert_eq!(outcome.new_balance.gems, 0);
    }

    #[test]
    fn already_vip_is_not_charged() {
        let err = apply_spend(&account(50, 500, Role::Vip), &vip_upgrade(100)).unwrap_err();
        assert_eq!(err, LedgerError::AlreadyGranted { role: Role::Vip });
    }

    #[test]
    fn admin_already_implies_vip() {
        let err = apply_spend(&account(0, 500, Role::Admin), &vip_upgrade(100)).unwrap_err();
        assert_eq!(err, LedgerError::AlreadyGranted { role: Role::Vip });
    }

    #[test]
    fn already_granted_checked_before_funds() {
        // broke VIP: still AlreadyGranted, not InsufficientFunds
        let err = apply_spend(&account(0, 0, Role::Vip), &vip_upgrade(100)).unwrap_err();
        assert_eq!(err, LedgerError::AlreadyGranted { role: Role::Vip });
    }

    #[test]
    fn unlock_spends_coins_without_role_change() {
        let request = SpendRequest::new(
            UserId::from("acct-1".to_string()),
            Currency::Coins,
            30,
            SpendEffect::Unlock("ak47-badge".into()),
        )
        .unwrap();
        let outcome = apply_spend(&account(50, 80, Role::User), &request).unwrap();
        assert_eq!(outcome.new_balance.coins, 20);
        assert_eq!(outcome.new_balance.gems, 80);
        assert_eq!(outcome.new_balance.role, Role::User);
        assert_eq!(
            outcome.effect_granted,
            SpendEffect::Unlock("ak47-badge".into())
        );
    }

    #[test]
    fn mismatched_account_rejected() {
        let other = AccountBalance {
            user_id: UserId::from("acct-2".to_string()),
            ..account(500, 500, Role::User)
        };
        let err = apply_spend(&other, &vip_upgrade(100)).unwrap_err();
        assert!(matches!(err, LedgerError::AccountMismatch { .. }));
    }

    #[test]
    fn snapshot_is_not_mutated() {
        let snapshot = account(50, 150, Role::User);
        let _ = apply_spend(&snapshot, &vip_upgrade(100)).unwrap();
        assert_eq!(snapshot, account(50, 150, Role::User));
    }
}
