//! # Bearer authentication
//!
//! The core never inspects credential internals; an external provider
//! turns an opaque bearer token into an authenticated principal. The
//! [`AuthProvider`] trait is that seam, and the [`Principal`] extractor
//! applies it to every protected route.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use std::collections::HashMap;
use uuid::Uuid;

use crate::context::ApiContext;
use crate::error::ApiError;

/// Permission required to create missions.
pub const PERM_CREATE_MISSIONS: &str = "create_missions";
/// Permission required to delete missions.
pub const PERM_DELETE_MISSIONS: &str = "delete_missions";

/// An already-authenticated operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: Uuid,
    pub role: String,
    pub permissions: Vec<String>,
}

impl Principal {
    /// Admins hold every permission implicitly.
    #[must_use]
    pub fn has_permission(&self, permission: &str) -> bool {
        self.role == "admin" || self.permissions.iter().any(|p| p == permission)
    }

    /// Fail with 403 unless the principal holds `permission`.
    pub fn require_permission(&self, permission: &str) -> Result<(), ApiError> {
        if self.has_permission(permission) {
            Ok(())
        } else {
            Err(ApiError::Forbidden)
        }
    }
}

/// Validates opaque bearer tokens into principals.
pub trait AuthProvider: Send + Sync {
    fn validate(&self, token: &str) -> Option<Principal>;
}

/// Token-map provider seeded from the environment or by hand.
///
/// `API_TOKEN`/`API_OPERATOR_ID` seed a single fully-privileged
/// operator, which is enough for single-tenant deployments and the
/// simulator; anything bigger plugs in its own [`AuthProvider`].
#[derive(Default)]
pub struct StaticTokenAuth {
    tokens: HashMap<String, Principal>,
}

impl StaticTokenAuth {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let mut auth = Self::new();
        if let (Ok(token), Ok(operator)) =
            (std::env::var("API_TOKEN"), std::env::var("API_OPERATOR_ID"))
        {
            if let Ok(user_id) = operator.parse() {
                auth.insert(
                    token,
                    Principal {
                        user_id,
                        role: "operator".to_string(),
                        permissions: vec![
                            PERM_CREATE_MISSIONS.to_string(),
                            PERM_DELETE_MISSIONS.to_string(),
                        ],
                    },
                );
            } else {
                tracing::warn!("API_OPERATOR_ID is not a valid UUID; token ignored");
            }
        }
        auth
    }

    pub fn insert(&mut self, token: impl Into<String>, principal: Principal) {
        self.tokens.insert(token.into(), principal);
    }
}

impl AuthProvider for StaticTokenAuth {
    fn validate(&self, token: &str) -> Option<Principal> {
        self.tokens.get(token).cloned()
    }
}

/// Pull the bearer token out of an Authorization header value.
pub fn bearer_token(header: &str) -> Option<&str> {
    header.strip_prefix("Bearer ").map(str::trim).filter(|t| !t.is_empty())
}

impl FromRequestParts<ApiContext> for Principal {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        ctx: &ApiContext,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(bearer_token)
            .ok_or_else(|| ApiError::Unauthorized("Missing bearer token".to_string()))?;

        ctx.auth
            .validate(token)
            .ok_or_else(|| ApiError::Unauthorized("Invalid token".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn operator() -> Principal {
        Principal {
            user_id: Uuid::new_v4(),
            role: "operator".to_string(),
            permissions: vec![PERM_CREATE_MISSIONS.to_string()],
        }
    }

    #[test]
    fn bearer_token_parsing() {
        assert_eq!(bearer_token("Bearer abc123"), Some("abc123"));
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("Basic abc123"), None);
    }

    #[test]
    fn static_provider_validates_known_tokens_only() {
        let mut auth = StaticTokenAuth::new();
        let principal = operator();
        auth.insert("tok-1", principal.clone());

        assert_eq!(auth.validate("tok-1"), Some(principal));
        assert_eq!(auth.validate("tok-2"), None);
    }

    #[test]
    fn permissions_are_explicit_except_for_admins() {
        let principal = operator();
        assert!(principal.has_permission(PERM_CREATE_MISSIONS));
        assert!(!principal.has_permission(PERM_DELETE_MISSIONS));
        assert!(principal.require_permission(PERM_DELETE_MISSIONS).is_err());

        let admin = Principal {
            user_id: Uuid::new_v4(),
            role: "admin".to_string(),
            permissions: Vec::new(),
        };
        assert!(admin.has_permission(PERM_DELETE_MISSIONS));
    }
}
