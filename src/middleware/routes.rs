use axum::Json;
use axum::Router;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum_extra::extract::{CookieJar, PrivateCookieJar};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use super::config::GateConfig;
use super::cookies;
use super::error::GateError;
use super::extractor::AuthPrincipal;
use super::spend::execute_spend;
use super::state::GateState;
use super::traits::{AccountStore, EventPublisher};
use crate::ledger::{SpendEffect, SpendRequest};
use crate::session::Principal;
use crate::types::{Currency, Role, SteamId, UnixMillis, UserId};

/// Create the session + wallet router.
pub fn gate_routes<A, P>(config: GateConfig, store: A, publisher: P) -> Router
where
    A: AccountStore,
    P: EventPublisher,
{
    let auth_path = config.settings.auth_path.clone();
    let wallet_path = config.settings.wallet_path.clone();

    let state = GateState::new(config, store, publisher);

    let mut router = Router::new()
        .route(&format!("{auth_path}/session"), get(current_session::<A, P>))
        .route(&format!("{auth_path}/refresh"), post(refresh::<A, P>))
        .route(&format!("{auth_path}/logout"), post(logout::<A, P>))
        .route(
            &format!("{wallet_path}/vip-upgrade"),
            post(vip_upgrade::<A, P>),
        );

    if state.settings.dev_login_enabled {
        router = router.route(&format!("{auth_path}/dev-login"), get(dev_login::<A, P>));
    }

    router.with_state(state)
}

/// Principal view returned by the session routes.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionBody {
    user_id: UserId,
    email: String,
    role: Role,
    expires_at: UnixMillis,
}

impl From<Principal> for SessionBody {
    fn from(p: Principal) -> Self {
        Self {
            user_id: p.user_id,
            email: p.email,
            role: p.role,
            expires_at: p.expires_at,
        }
    }
}

// ── Session ────────────────────────────────────────────────────────

async fn current_session<A: AccountStore, P: EventPublisher>(
    State(_state): State<GateState<A, P>>,
    AuthPrincipal(principal): AuthPrincipal,
) -> Json<SessionBody> {
    Json(principal.into())
}

async fn refresh<A: AccountStore, P: EventPublisher>(
    State(state): State<GateState<A, P>>,
    jar: PrivateCookieJar,
    plain: CookieJar,
    AuthPrincipal(principal): AuthPrincipal,
) -> Result<(PrivateCookieJar, CookieJar, Json<SessionBody>), GateError> {
    let renewed = principal.renewed(UnixMillis::now(), state.settings.session_ttl_days);
    let (server, client) = cookies::session_cookie_pair(&state.settings, &renewed)?;

    tracing::info!(user_id = %renewed.user_id, "session refreshed");

    Ok((jar.add(server), plain.add(client), Json(renewed.into())))
}

async fn logout<A: AccountStore, P: EventPublisher>(
    State(state): State<GateState<A, P>>,
    jar: PrivateCookieJar,
    plain: CookieJar,
) -> (PrivateCookieJar, CookieJar, StatusCode) {
    let jar = jar.remove(cookies::clear_cookie(&state.settings.session_cookie_name));
    let plain = plain.remove(cookies::clear_cookie(&state.settings.client_cookie_name));
    (jar, plain, StatusCode::NO_CONTENT)
}

// ── Wallet ─────────────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VipUpgradeBody {
    success: bool,
    new_role: Role,
    gems_deducted: u64,
    remaining_gems: u64,
}

async fn vip_upgrade<A: AccountStore, P: EventPublisher>(
    State(state): State<GateState<A, P>>,
    jar: PrivateCookieJar,
    plain: CookieJar,
    AuthPrincipal(principal): AuthPrincipal,
) -> Result<(PrivateCookieJar, CookieJar, Json<VipUpgradeBody>), GateError> {
    let price = state.settings.vip_price_gems;
    let request = SpendRequest::new(
        principal.user_id.clone(),
        Currency::Gems,
        price,
        SpendEffect::GrantRole(Role::Vip),
    )
    .map_err(|e| GateError::Internal(e.to_string()))?;

    let receipt = execute_spend(
        state.store.as_ref(),
        state.publisher.as_ref(),
        &request,
        &state.settings.retry,
    )
    .await?;

    // Re-issue the session wholesale so the cookie carries the new role.
    let mut upgraded = principal.renewed(UnixMillis::now(), state.settings.session_ttl_days);
    upgraded.role = receipt.new_balance.role;
    let (server, client) = cookies::session_cookie_pair(&state.settings, &upgraded)?;

    tracing::info!(user_id = %upgraded.user_id, "vip upgrade purchased");

    Ok((
        jar.add(server),
        plain.add(client),
        Json(VipUpgradeBody {
            success: true,
            new_role: receipt.new_balance.role,
            gems_deducted: price,
            remaining_gems: receipt.new_balance.gems,
        }),
    ))
}

// ── Dev Login ──────────────────────────────────────────────────────

#[derive(Deserialize)]
struct DevLoginParams {
    steamid: Option<String>,
    role: Option<Role>,
}

/// Deterministic dev identity for a SteamID64.
pub(super) fn dev_user_id(steam_id: &SteamId) -> UserId {
    let ulid: Ulid = format!("{:0>26}", steam_id.as_str())
        .parse()
        .expect("zero-padded digits are valid Crockford Base32");
    UserId::from(ulid.to_string())
}

async fn dev_login<A: AccountStore, P: EventPublisher>(
    State(state): State<GateState<A, P>>,
    jar: PrivateCookieJar,
    plain: CookieJar,
    Query(params): Query<DevLoginParams>,
) -> Result<(PrivateCookieJar, CookieJar, Json<SessionBody>), GateError> {
    // No runtime guard needed — route is only registered when dev_login_enabled is true

    let steam_id: SteamId = params
        .steamid
        .filter(|s| s.parse::<SteamId>().is_ok())
        .unwrap_or_else(|| "76561190000000001".to_string())
        .parse()
        .map_err(|_| GateError::Internal("default dev SteamID64 invalid".into()))?;

    let principal = Principal::new(
        dev_user_id(&steam_id),
        format!("{steam_id}@dev.local"),
        params.role.unwrap_or(Role::User),
        UnixMillis::now(),
        state.settings.session_ttl_days,
    );

    let (server, client) = cookies::session_cookie_pair(&state.settings, &principal)?;

    tracing::info!(user_id = %principal.user_id, role = %principal.role, "dev login");

    Ok((jar.add(server), plain.add(client), Json(principal.into())))
}
