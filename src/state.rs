//! Shared application state handed to every handler.

use crate::{
    auth::AccessGate,
    services::{client_factory::ClientFactory, credential_store::CredentialStore},
};
use std::sync::Arc;

/// Dependencies injected at startup. Cloned per request; holds no
/// per-tenant state, and storage clients are never stored here.
#[derive(Clone)]
pub struct AppState {
    pub store: CredentialStore,
    pub clients: Arc<dyn ClientFactory>,
    pub gate: Arc<dyn AccessGate>,
}

impl AppState {
    pub fn new(
        store: CredentialStore,
        clients: Arc<dyn ClientFactory>,
        gate: Arc<dyn AccessGate>,
    ) -> Self {
        Self {
            store,
            clients,
            gate,
        }
    }
}
