use std::sync::Arc;

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;

use super::config::{GateConfig, GateSettings};
use super::traits::{AccountStore, EventPublisher};

/// Shared state for gate route handlers.
///
/// Public so consumers can mount their own protected routes against it and
/// use the [`AuthPrincipal`](super::AuthPrincipal) extractor there.
pub struct GateState<A, P> {
    pub(super) store: Arc<A>,
    pub(super) publisher: Arc<P>,
    pub(super) settings: GateSettings,
}

impl<A: AccountStore, P: EventPublisher> GateState<A, P> {
    #[must_use]
    pub fn new(config: GateConfig, store: A, publisher: P) -> Self {
        Self {
            store: Arc::new(store),
            publisher: Arc::new(publisher),
            settings: config.settings,
        }
    }
}

// Manual Clone: avoid derive adding `A: Clone, P: Clone` bounds.
impl<A, P> Clone for GateState<A, P> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            publisher: self.publisher.clone(),
            settings: self.settings.clone(),
        }
    }
}

// PrivateCookieJar requires Key to be extractable from state
impl<A: AccountStore, P: EventPublisher> FromRef<GateState<A, P>> for Key {
    fn from_ref(state: &GateState<A, P>) -> Self {
        state.settings.cookie_key.clone()
    }
}
