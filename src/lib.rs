#![doc = include_str!("../README.md")]

pub mod error;
pub mod ledger;
#[cfg(feature = "middleware")]
pub mod middleware;
pub mod session;
pub mod steamid;
pub mod types;

// Re-exports for convenient access
pub use error::Error;
pub use ledger::{
    AccountBalance, LedgerError, SpendEffect, SpendOutcome, SpendRequest, apply_spend,
};
pub use session::{
    ForbiddenError, IssueError, Principal, SessionToken, VerifyError, authorize, issue, verify,
};
pub use steamid::is_valid_steam_id64;
pub use types::{Currency, Role, SteamId, UnixMillis, UserId};
