// ABOUTME: Shared application state for the flashcards HTTP server.
// ABOUTME: Holds the store handle, the session manager, and the optional identity verifier.

use std::sync::Arc;

use flashcards_store::Store;

use crate::identity::IdentityVerifier;
use crate::session::{AuthManager, TokenPolicy};

/// Shared application state accessible by every request.
pub struct AppState {
    pub store: Store,
    pub auth: AuthManager,
    /// Present only when Google sign-in is configured.
    pub identity: Option<Arc<dyn IdentityVerifier>>,
}

/// Type alias for the Arc-wrapped state used with Axum's State extractor.
pub type SharedState = Arc<AppState>;

impl AppState {
    /// Create state over an opened store, without third-party sign-in.
    pub fn new(store: Store, policy: TokenPolicy) -> Self {
        Self {
            auth: AuthManager::new(store.clone(), policy),
            store,
            identity: None,
        }
    }

    /// Enable `/google_signin` with the given verifier.
    pub fn with_identity_verifier(mut self, verifier: Arc<dyn IdentityVerifier>) -> Self {
        self.identity = Some(verifier);
        self
    }
}
