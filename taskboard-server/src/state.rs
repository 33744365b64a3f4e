//! Shared server state.

use std::sync::Arc;

use axum::extract::FromRef;

use crate::identity::IdentityProvider;
use crate::images::ImageStore;
use crate::notify::Notifier;
use crate::store::DocumentStore;

/// Handles every request needs: persistence, identity, image storage and
/// notifications.
pub struct BoardState<S> {
    pub store: Arc<S>,
    pub identity: Arc<dyn IdentityProvider>,
    pub images: Arc<ImageStore>,
    pub notifier: Arc<dyn Notifier>,
    /// Length of generated invite codes.
    pub invite_code_length: usize,
}

impl<S: DocumentStore> BoardState<S> {
    #[must_use]
    pub fn new(
        store: S,
        identity: Arc<dyn IdentityProvider>,
        notifier: Arc<dyn Notifier>,
        invite_code_length: usize,
    ) -> Self {
        Self {
            store: Arc::new(store),
            identity,
            images: Arc::new(ImageStore::new()),
            notifier,
            invite_code_length,
        }
    }
}

impl<S> Clone for BoardState<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            identity: Arc::clone(&self.identity),
            images: Arc::clone(&self.images),
            notifier: Arc::clone(&self.notifier),
            invite_code_length: self.invite_code_length,
        }
    }
}

impl<S> FromRef<BoardState<S>> for Arc<dyn IdentityProvider> {
    fn from_ref(state: &BoardState<S>) -> Self {
        Arc::clone(&state.identity)
    }
}
