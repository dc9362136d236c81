use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::{CookieJar, PrivateCookieJar};

use super::error::GateError;
use super::state::GateState;
use super::traits::{AccountStore, EventPublisher};
use crate::session::{self, Principal, SessionToken, VerifyError};
use crate::types::{Role, UnixMillis};

/// Authenticated principal extracted from the session cookie.
///
/// Use as an Axum extractor in route handlers. Rejects with
/// `401 Unauthorized` when the cookie is missing, fails authenticated
/// decryption, does not parse, or has expired.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected(AuthPrincipal(principal): AuthPrincipal) -> impl IntoResponse {
///     format!("Hello, {} ({})", principal.user_id, principal.role)
/// }
///
/// // Optional: accessible to both authenticated and anonymous users
/// async fn public(principal: Option<AuthPrincipal>) -> impl IntoResponse {
///     match principal {
///         Some(AuthPrincipal(p)) => format!("Hello, {}", p.user_id),
///         None => "Hello, guest".to_string(),
///     }
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthPrincipal(pub Principal);

impl<A, P> FromRequestParts<GateState<A, P>> for AuthPrincipal
where
    A: AccountStore,
    P: EventPublisher,
{
    type Rejection = GateError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &GateState<A, P>,
    ) -> Result<Self, Self::Rejection> {
        let jar: PrivateCookieJar = PrivateCookieJar::from_request_parts(parts, state)
            .await
            .map_err(|_| GateError::Unauthenticated)?;

        let name = &state.settings.session_cookie_name;
        let Some(cookie) = jar.get(name) else {
            // The private jar hides a cookie that failed authenticated
            // decryption; probe the plain jar to tell tampered from absent.
            let plain = CookieJar::from_request_parts(parts, state)
                .await
                .map_err(|_| GateError::Unauthenticated)?;
            if plain.get(name).is_some() {
                tracing::warn!("session cookie present but failed decryption");
                return Err(VerifyError::Malformed("authenticated decryption failed".into()).into());
            }
            return Err(VerifyError::Missing.into());
        };

        let token = SessionToken::new(cookie.value());
        let principal = session::verify(&token, UnixMillis::now())?;
        Ok(Self(principal))
    }
}

/// Principal additionally authorized at the `admin` level.
///
/// Rejects with `403 Forbidden` when the session is valid but the role is
/// below admin.
#[derive(Debug, Clone)]
pub struct AdminPrincipal(pub Principal);

impl<A, P> FromRequestParts<GateState<A, P>> for AdminPrincipal
where
    A: AccountStore,
    P: EventPublisher,
{
    type Rejection = GateError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &GateState<A, P>,
    ) -> Result<Self, Self::Rejection> {
        let AuthPrincipal(principal) = AuthPrincipal::from_request_parts(parts, state).await?;
        let principal = session::authorize(principal, Role::Admin)?;
        Ok(Self(principal))
    }
}
