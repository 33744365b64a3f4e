//! Session and identity.
//!
//! Authentication itself is external; the server only resolves a bearer
//! token to a [`User`] through an [`IdentityProvider`]. Requests without a
//! valid token are rejected by the [`CurrentUser`] extractor before any
//! handler runs.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{FromRef, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use parking_lot::RwLock;
use taskboard_proto::model::User;

use crate::error::BoardError;

/// Resolves session tokens and user ids to users.
pub trait IdentityProvider: Send + Sync {
    /// The user owning `token`, if the session is valid.
    fn authenticate(&self, token: &str) -> Option<User>;

    /// Looks up a user by id.
    fn user(&self, id: &str) -> Option<User>;
}

/// In-memory identity provider seeded with fixed tokens.
#[derive(Debug, Default)]
pub struct StaticIdentity {
    inner: RwLock<Accounts>,
}

#[derive(Debug, Default)]
struct Accounts {
    by_token: HashMap<String, String>,
    by_id: HashMap<String, User>,
}

impl StaticIdentity {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `user` and binds `token` to it. Re-registering an id
    /// replaces the stored profile and keeps earlier tokens valid.
    pub fn insert(&self, token: impl Into<String>, user: User) {
        let mut accounts = self.inner.write();
        accounts.by_token.insert(token.into(), user.id.clone());
        accounts.by_id.insert(user.id.clone(), user);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().by_id.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl IdentityProvider for StaticIdentity {
    fn authenticate(&self, token: &str) -> Option<User> {
        let accounts = self.inner.read();
        let id = accounts.by_token.get(token)?;
        accounts.by_id.get(id).cloned()
    }

    fn user(&self, id: &str) -> Option<User> {
        self.inner.read().by_id.get(id).cloned()
    }
}

/// The authenticated caller of a request.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
    Arc<dyn IdentityProvider>: FromRef<S>,
{
    type Rejection = BoardError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(parts) else {
            tracing::debug!(path = %parts.uri.path(), "request without session");
            return Err(BoardError::Unauthorized);
        };
        let identity = Arc::<dyn IdentityProvider>::from_ref(state);
        identity.authenticate(token).map(Self).ok_or_else(|| {
            tracing::debug!(path = %parts.uri.path(), "unknown session token");
            BoardError::Unauthorized
        })
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}
