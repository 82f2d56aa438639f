use std::sync::Arc;

use axum::http::HeaderMap;
use vitrine_core::{AUTHORIZATION_METADATA_KEY, Method, Role};

use super::AuthError;
use super::token::TokenService;

/// The authenticated principal behind a call to a guarded method.
///
/// Inserted into the request extensions by [`AccessLayer`](super::AccessLayer).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub username: String,
    pub role: Role,
}

/// Decides, per method, whether a call may proceed.
#[derive(Debug, Clone)]
pub struct AccessGate {
    tokens: Arc<TokenService>,
}

impl AccessGate {
    pub fn new(tokens: Arc<TokenService>) -> Self {
        Self { tokens }
    }

    /// Authorize a call to `method` carrying `headers`.
    ///
    /// Open methods proceed without a caller. Guarded methods need a valid
    /// token whose role is entitled to the method.
    pub fn authorize(&self, method: Method, headers: &HeaderMap) -> Result<Option<Caller>, AuthError> {
        if !method.requires_token() {
            return Ok(None);
        }

        let token = access_token(headers).ok_or(AuthError::MissingToken)?;
        let claims = self.tokens.verify(token)?;
        let role = claims
            .role()
            .ok_or_else(|| AuthError::InvalidToken(format!("unknown role: {}", claims.role)))?;

        if !method.permits(role) {
            return Err(AuthError::PermissionDenied);
        }

        Ok(Some(Caller {
            username: claims.sub,
            role,
        }))
    }
}

/// The token in the `authorization` header, with or without a `Bearer `
/// prefix.
fn access_token(headers: &HeaderMap) -> Option<&str> {
    let raw = headers.get(AUTHORIZATION_METADATA_KEY)?.to_str().ok()?.trim();
    let token = raw.strip_prefix("Bearer ").unwrap_or(raw).trim();
    (!token.is_empty()).then_some(token)
}
