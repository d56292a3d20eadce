//! Principal resolution for incoming requests.
//!
//! Authentication is an external collaborator: something resolves a
//! bearer credential to a `{id, role}` principal and the core trusts
//! the result. [`TokenTable`] is the bundled implementation, a plain
//! token-to-principal map.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use common::Principal;
use domain::DomainError;
use store::Store;

use crate::error::ApiError;
use crate::routes::AppState;

/// Resolves a bearer credential to an authenticated principal.
pub trait Authenticator: Send + Sync {
    /// Returns the principal for a credential, or `None` if unknown.
    fn resolve(&self, credential: &str) -> Option<Principal>;
}

/// Token-to-principal map.
#[derive(Default)]
pub struct TokenTable {
    tokens: RwLock<HashMap<String, Principal>>,
}

impl TokenTable {
    /// Creates an empty token table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Grants a credential access as the given principal.
    pub fn grant(&self, token: impl Into<String>, principal: Principal) {
        self.tokens
            .write()
            .expect("token table lock poisoned")
            .insert(token.into(), principal);
    }
}

impl Authenticator for TokenTable {
    fn resolve(&self, credential: &str) -> Option<Principal> {
        self.tokens
            .read()
            .expect("token table lock poisoned")
            .get(credential)
            .copied()
    }
}

/// Extractor for an authenticated principal.
///
/// Rejects with 401 when the `Authorization: Bearer` header is missing
/// or the credential is unknown.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub Principal);

impl<S: Store> FromRequestParts<Arc<AppState<S>>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState<S>>,
    ) -> Result<Self, Self::Rejection> {
        let credential = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or(ApiError::Domain(DomainError::Auth))?;

        let principal = state
            .authenticator
            .resolve(credential)
            .ok_or(ApiError::Domain(DomainError::Auth))?;

        Ok(AuthUser(principal))
    }
}

/// Extractor for an authenticated administrator.
///
/// Rejects with 403 when the principal is not an admin.
#[derive(Debug, Clone, Copy)]
pub struct AdminUser(pub Principal);

impl<S: Store> FromRequestParts<Arc<AppState<S>>> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState<S>>,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser(principal) = AuthUser::from_request_parts(parts, state).await?;
        if !principal.is_admin() {
            return Err(ApiError::Domain(DomainError::Forbidden(
                "admin role required".to_string(),
            )));
        }
        Ok(AdminUser(principal))
    }
}
