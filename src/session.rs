//! Session codec and verifier.
//!
//! A [`Principal`] is serialized into a [`SessionToken`] at login time and
//! reconstructed per request. Verification is stateless: a pure function of
//! the token payload and the supplied clock reading, with no store round
//! trip. The transport layer (an authenticated-encryption cookie jar, see
//! the `middleware` module) provides tamper evidence; the codec checks
//! structure and expiry.
//!
//! Callers branch on the failure taxonomy to pick a response:
//! [`VerifyError::Missing`], [`VerifyError::Malformed`] and
//! [`VerifyError::Expired`] map to unauthorized, [`ForbiddenError`] to
//! forbidden.

use serde::{Deserialize, Serialize};

use crate::types::{Role, UnixMillis, UserId};

/// Authenticated identity attached to a request.
///
/// Created at login time, carried as a [`SessionToken`], never mutated in
/// place. A refresh re-issues the principal wholesale with a fresh validity
/// window; there is no way to resurrect an expired one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: UserId,
    /// Informational only. Never used for authorization decisions.
    pub email: String,
    pub role: Role,
    pub issued_at: UnixMillis,
    pub expires_at: UnixMillis,
}

impl Principal {
    /// Principal valid from `now` for `ttl_days` days.
    #[must_use]
    pub fn new(
        user_id: UserId,
        email: impl Into<String>,
        role: Role,
        now: UnixMillis,
        ttl_days: i64,
    ) -> Self {
        Self {
            user_id,
            email: email.into(),
            role,
            issued_at: now,
            expires_at: now.plus_days(ttl_days),
        }
    }

    /// Same identity, fresh validity window starting at `now`.
    #[must_use]
    pub fn renewed(&self, now: UnixMillis, ttl_days: i64) -> Self {
        Self {
            issued_at: now,
            expires_at: now.plus_days(ttl_days),
            ..self.clone()
        }
    }
}

/// Wire representation of a [`Principal`].
///
/// Holds the serialized payload after the transport layer has stripped its
/// tamper-evidence envelope. Deliberately has no `Display` impl so token
/// contents cannot end up in log output by accident.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    #[must_use]
    pub fn new(payload: impl Into<String>) -> Self {
        Self(payload.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Failures of [`issue`].
#[derive(Debug, thiserror::Error)]
pub enum IssueError {
    #[error("principal validity window is empty or inverted")]
    InvalidValidity,
    #[error("principal user id is empty")]
    EmptyUserId,
    #[error("payload encoding failed: {0}")]
    Encoding(String),
}

/// Failures of [`verify`].
#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    /// No token was presented.
    #[error("no session token presented")]
    Missing,
    /// Token cannot be parsed into the expected shape. Carries the parser
    /// message, never the payload itself.
    #[error("session token is malformed: {0}")]
    Malformed(String),
    /// `expires_at` is at or before the supplied clock reading.
    #[error("session expired at {expired_at}")]
    Expired { expired_at: UnixMillis },
}

/// Failure of [`authorize`]: the principal's role is below the required one.
#[derive(Debug, thiserror::Error)]
#[error("role {actual} does not satisfy required role {required}")]
pub struct ForbiddenError {
    pub required: Role,
    pub actual: Role,
}

/// Serializes a [`Principal`] into a [`SessionToken`].
///
/// Pure transformation, no side effects.
///
/// # Errors
///
/// Fails only when the principal violates its own invariants: an empty
/// user id, or `expires_at <= issued_at`.
pub fn issue(principal: &Principal) -> Result<SessionToken, IssueError> {
    if principal.user_id.0.is_empty() {
        return Err(IssueError::EmptyUserId);
    }
    if principal.expires_at <= principal.issued_at {
        return Err(IssueError::InvalidValidity);
    }
    let payload =
        serde_json::to_string(principal).map_err(|e| IssueError::Encoding(e.to_string()))?;
    Ok(SessionToken(payload))
}

/// Parses a token and checks structural validity and expiry against `now`.
///
/// Pure function of `(token, now)`, so tests run against a frozen clock.
/// A payload missing any required field is rejected in the single parse
/// step rather than read optimistically.
///
/// # Errors
///
/// [`VerifyError::Malformed`] when the payload does not parse into a
/// structurally valid [`Principal`]; [`VerifyError::Expired`] when
/// `expires_at <= now`.
pub fn verify(token: &SessionToken, now: UnixMillis) -> Result<Principal, VerifyError> {
    let principal: Principal = serde_json::from_str(token.as_str())
        .map_err(|e| VerifyError::Malformed(e.to_string()))?;
    if principal.expires_at <= principal.issued_at {
        return Err(VerifyError::Malformed(
            "validity window is empty or inverted".into(),
        ));
    }
    if principal.expires_at <= now {
        return Err(VerifyError::Expired {
            expired_at: principal.expires_at,
        });
    }
    Ok(principal)
}

/// Role check over the total order `user < vip < admin`.
///
/// Pure comparison, not a lookup. Returns the principal unchanged on
/// success so call sites can keep threading it through.
///
/// # Errors
///
/// [`ForbiddenError`] when the principal's role is below `required`.
pub fn authorize(principal: Principal, required: Role) -> Result<Principal, ForbiddenError> {
    if principal.role >= required {
        Ok(principal)
    } else {
        Err(ForbiddenError {
            required,
            actual: principal.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(role: Role, issued_at: i64, expires_at: i64) -> Principal {
        Principal {
            user_id: UserId::from("user-1".to_string()),
            email: "one@example.com".into(),
            role,
            issued_at: UnixMillis(issued_at),
            expires_at: UnixMillis(expires_at),
        }
    }

    #[test]
    fn round_trip_law() {
        let p = principal(Role::User, 1_000, 10_000);
        let token = issue(&p).unwrap();
        let verified = verify(&token, UnixMillis(5_000)).unwrap();
        assert_eq!(verified, p);
    }

    #[test]
    fn verify_fails_at_expiry_boundary() {
        let p = principal(Role::User, 1_000, 10_000);
        let token = issue(&p).unwrap();
        // expires_at == now is already expired
        match verify(&token, UnixMillis(10_000)) {
            Err(VerifyError::Expired { expired_at }) => assert_eq!(expired_at, UnixMillis(10_000)),
            other => panic!("expected Expired, got {other:?}"),
        }
    }

    #[test]
    fn verify_one_millisecond_window() {
        let now = UnixMillis(50_000);
        let p = principal(Role::User, 49_000, 50_001);
        let token = issue(&p).unwrap();
        assert!(verify(&token, now).is_ok());
        assert!(matches!(
            verify(&token, now.plus_millis(2)),
            Err(VerifyError::Expired { .. })
        ));
    }

    #[test]
    fn verify_rejects_garbage() {
        let token = SessionToken::new("not json at all");
        assert!(matches!(
            verify(&token, UnixMillis(0)),
            Err(VerifyError::Malformed(_))
        ));
    }

    #[test]
    fn verify_rejects_missing_fields() {
        // role and expiry absent: rejected at the parse step
        let token = SessionToken::new(r#"{"user_id":"u1","email":"a@b.c"}"#);
        assert!(matches!(
            verify(&token, UnixMillis(0)),
            Err(VerifyError::Malformed(_))
        ));
    }

    #[test]
    fn verify_rejects_inverted_window() {
        let token = SessionToken::new(
            r#"{"user_id":"u1","email":"a@b.c","role":"user","issued_at":10,"expires_at":5}"#,
        );
        assert!(matches!(
            verify(&token, UnixMillis(0)),
            Err(VerifyError::Malformed(_))
        ));
    }

    #[test]
    fn issue_rejects_inverted_window() {
        let p = principal(Role::User, 10_000, 10_000);
        assert!(matches!(issue(&p), Err(IssueError::InvalidValidity)));
    }

    #[test]
    fn issue_rejects_empty_user_id() {
        let mut p = principal(Role::User, 0, 1_000);
        p.user_id = UserId::from(String::new());
        assert!(matches!(issue(&p), Err(IssueError::EmptyUserId)));
    }

    #[test]
    fn authorize_total_order() {
        let roles = [Role::User, Role::Vip, Role::Admin];
        for actual in roles {
            for required in roles {
                let result = authorize(principal(actual, 0, 1), required);
                if actual >= required {
                    assert!(result.is_ok(), "{actual} should satisfy {required}");
                } else {
                    let err = result.unwrap_err();
                    assert_eq!(err.required, required);
                    assert_eq!(err.actual, actual);
                }
            }
        }
    }

    #[test]
    fn renewed_keeps_identity_fresh_window() {
        let p = principal(Role::Vip, 1_000, 2_000);
        let renewed = p.renewed(UnixMillis(5_000), 7);
        assert_eq!(renewed.user_id, p.user_id);
        assert_eq!(renewed.email, p.email);
        assert_eq!(renewed.role, p.role);
        assert_eq!(renewed.issued_at, UnixMillis(5_000));
        assert_eq!(renewed.expires_at, UnixMillis(5_000).plus_days(7));
    }
}
