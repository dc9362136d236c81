use axum_extra::extract::cookie::{Cookie, SameSite};
use serde::Serialize;
use time::Duration;

use super::config::GateSettings;
use super::error::GateError;
use crate::session::{self, Principal};
use crate::types::{Role, UnixMillis, UserId};

/// Reduced principal view placed in the client-readable cookie.
///
/// UI state only: no email, and the server never reads it back.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ClientSession<'a> {
    user_id: &'a UserId,
    role: Role,
    expires_at: UnixMillis,
}

/// Create the server-only session cookie.
pub(super) fn session_cookie(
    name: &str,
    payload: &str,
    ttl_days: i64,
    secure: bool,
) -> Cookie<'static> {
    Cookie::build((name.to_string(), payload.to_string()))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/".to_string())
        .max_age(Duration::days(ttl_days))
        .build()
}

/// Create the client-readable UI cookie.
pub(super) fn client_cookie(
    name: &str,
    value: &str,
    ttl_days: i64,
    secure: bool,
) -> Cookie<'static> {
    Cookie::build((name.to_string(), value.to_string()))
        .http_only(false)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/".to_string())
        .max_age(Duration::days(ttl_days))
        .build()
}

/// Create a removal cookie.
pub(super) fn clear_cookie(name: &str) -> Cookie<'static> {
    Cookie::build((name.to_string(), ""))
        .path("/".to_string())
        .max_age(Duration::ZERO)
        .build()
}

/// Build the session + client cookie pair for a principal.
pub(super) fn session_cookie_pair(
    settings: &GateSettings,
    principal: &Principal,
) -> Result<(Cookie<'static>, Cookie<'static>), GateError> {
    let token =
        session::issue(principal).map_err(|e| GateError::Internal(e.to_string()))?;
    let server = session_cookie(
        &settings.session_cookie_name,
        token.as_str(),
        settings.session_ttl_days,
        settings.secure_cookies,
    );

    let view = ClientSession {
        user_id: &principal.user_id,
        role: principal.role,
        expires_at: principal.expires_at,
    };
    let value =
        serde_json::to_string(&view).map_err(|e| GateError::Internal(e.to_string()))?;
    let client = client_cookie(
        &settings.client_cookie_name,
        &value,
        settings.session_ttl_days,
        settings.secure_cookies,
    );

    Ok((server, client))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal() -> Principal {
        Principal {
            user_id: UserId::from("user-1".to_string()),
            email: "one@example.com".into(),
            role: Role::User,
            issued_at: UnixMillis(0),
            expires_at: UnixMillis(1_000),
        }
    }

    #[test]
    fn session_cookie_attributes() {
        let cookie = session_cookie("session", "payload", 7, true);
        assert_eq!(cookie.name(), "session");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.max_age(), Some(Duration::days(7)));
    }

    #[test]
    fn client_cookie_is_readable() {
        let cookie = client_cookie("session_ui", "{}", 7, false);
        assert_ne!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
    }

    #[test]
    fn clear_cookie_expires_immediately() {
        let cookie = clear_cookie("session");
        assert_eq!(cookie.max_age(), Some(Duration::ZERO));
        assert_eq!(cookie.value(), "");
    }

    #[test]
    fn client_view_omits_email() {
        let settings = GateSettings::defaults();
        let (_, client) = session_cookie_pair(&settings, &principal()).unwrap();
        assert!(!client.value().contains("example.com"));
        assert!(client.value().contains("\"role\":\"user\""));
        assert!(client.value().contains("\"userId\":\"user-1\""));
    }
}
