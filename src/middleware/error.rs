use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use super::spend::SpendFailure;
use crate::ledger::LedgerError;
use crate::session::{ForbiddenError, VerifyError};
use crate::types::{Currency, Role};

/// Gate errors for the middleware layer.
///
/// Every variant maps to exactly one HTTP status, so route handlers never
/// have to inspect a message string to pick between 401 and 403.
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    /// No session token presented.
    #[error("not authenticated")]
    Unauthenticated,

    /// Token presented but undecryptable or unparseable.
    #[error("session token rejected")]
    BadToken,

    /// Session exists but its validity window has passed.
    #[error("session expired")]
    SessionExpired,

    /// Authenticated, but the role is below what the endpoint requires.
    #[error("requires {required} role")]
    Forbidden { required: Role, actual: Role },

    /// Funded transition refused: balance too low.
    #[error("insufficient {currency}: need {required}, have {available}")]
    InsufficientFunds {
        currency: Currency,
        required: u64,
        available: u64,
    },

    /// Funded transition refused: effect already held.
    #[error("{role} already granted")]
    AlreadyGranted { role: Role },

    /// Balance write kept conflicting past the retry bound.
    #[error("balance busy, try again")]
    Contention,

    /// Missing or invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Account store operation failed.
    #[error("store error: {0}")]
    Store(String),

    /// Invariant violation inside the gate itself.
    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for GateError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        match self {
            Self::Unauthenticated | Self::BadToken | Self::SessionExpired => {
                (StatusCode::UNAUTHORIZED, Json(json!({ "error": message }))).into_response()
            }
            Self::Forbidden { .. } => {
                (StatusCode::FORBIDDEN, Json(json!({ "error": message }))).into_response()
            }
            Self::InsufficientFunds {
                required, available, ..
            } => (
                StatusCode::PAYMENT_REQUIRED,
                Json(json!({
                    "error": message,
                    "required": required,
                    "current": available,
                })),
            )
                .into_response(),
            Self::AlreadyGranted { .. } => {
                (StatusCode::CONFLICT, Json(json!({ "error": message }))).into_response()
            }
            Self::Contention => (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "error": message })),
            )
                .into_response(),
            Self::Config(_) | Self::Store(_) | Self::Internal(_) => {
                tracing::error!(error = %message, "gate internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "internal error" })),
                )
                    .into_response()
            }
        }
    }
}

impl From<VerifyError> for GateError {
    fn from(e: VerifyError) -> Self {
        match e {
            VerifyError::Missing => Self::Unauthenticated,
            VerifyError::Malformed(_) => Self::BadToken,
            VerifyError::Expired { .. } => Self::SessionExpired,
        }
    }
}

impl From<ForbiddenError> for GateError {
    fn from(e: ForbiddenError) -> Self {
        Self::Forbidden {
            required: e.required,
            actual: e.actual,
        }
    }
}

impl From<SpendFailure> for GateError {
    fn from(e: SpendFailure) -> Self {
        match e {
            SpendFailure::Ledger(LedgerError::InsufficientFunds {
                currency,
                required,
                available,
            }) => Self::InsufficientFunds {
                currency,
                required,
                available,
            },
            SpendFailure::Ledger(LedgerError::AlreadyGranted { role }) => {
                Self::AlreadyGranted { role }
            }
            // InvalidAmount / AccountMismatch mean the gate built a bad
            // request; surface as internal, not as a client error.
            SpendFailure::Ledger(other) => Self::Internal(other.to_string()),
            SpendFailure::UnknownAccount(user_id) => {
                Self::Internal(format!("no account record for {user_id}"))
            }
            SpendFailure::Contention { .. } => Self::Contention,
            SpendFailure::Store(message) => Self::Store(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_errors_are_unauthorized() {
        for e in [
            VerifyError::Missing,
            VerifyError::Malformed("bad".into()),
            VerifyError::Expired {
                expired_at: crate::types::UnixMillis(0),
            },
        ] {
            let response = GateError::from(e).into_response();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        }
    }

    #[test]
    fn forbidden_is_403() {
        let e = GateError::from(ForbiddenError {
            required: Role::Admin,
            actual: Role::Vip,
        });
        assert_eq!(e.into_response().status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn funds_failures_map_to_client_statuses() {
        let insufficient = GateError::from(SpendFailure::Ledger(LedgerError::InsufficientFunds {
            currency: Currency::Gems,
            required: 100,
            available: 80,
        }));
        assert_eq!(
            insufficient.into_response().status(),
            StatusCode::PAYMENT_REQUIRED
        );

        let granted =
            GateError::from(SpendFailure::Ledger(LedgerError::AlreadyGranted {
                role: Role::Vip,
            }));
        assert_eq!(granted.into_response().status(), StatusCode::CONFLICT);

        let contention = GateError::from(SpendFailure::Contention { attempts: 3 });
        assert_eq!(
            contention.into_response().status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
