//! Plug-and-play session and wallet middleware for Axum.
//!
//! Mounts the session lifecycle routes (current session, refresh, logout,
//! optional dev login) and the wallet spend routes, and provides the
//! extractors protected handlers authenticate with.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use skinfall_accounts::middleware::{GateConfig, NoopPublisher, gate_routes};
//!
//! // 1. Implement the AccountStore trait for your data-store client
//! // 2. Configure from environment
//! let config = GateConfig::from_env()?;
//!
//! // 3. Mount session + wallet routes
//! let app = axum::Router::new()
//!     .merge(gate_routes(config, account_store, NoopPublisher));
//!
//! // 4. Use the AuthPrincipal extractor in your own handlers
//! async fn inventory(AuthPrincipal(principal): AuthPrincipal) { /* ... */ }
//! ```
//!
//! Spend-effect handlers beyond the built-in VIP upgrade call
//! [`execute_spend`] directly with their own [`SpendRequest`]
//! (e.g. unlocking a shop item for coins).
//!
//! [`SpendRequest`]: crate::ledger::SpendRequest

mod config;
mod cookies;
mod error;
mod extractor;
mod routes;
mod spend;
mod state;
mod traits;

pub use config::GateConfig;
pub use error::GateError;
pub use extractor::{AdminPrincipal, AuthPrincipal};
pub use routes::gate_routes;
pub use spend::{RetryPolicy, SpendFailure, SpendReceipt, execute_spend};
pub use state::GateState;
pub use traits::{
    AccountStore, CasOutcome, EventPublisher, NoopPublisher, StoreError, WalletEvent,
};

/// Re-export cookie key type for builder API.
pub use axum_extra::extract::cookie::Key as CookieKey;
