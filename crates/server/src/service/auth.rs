use std::sync::Arc;

use tracing::{info, warn};
use vitrine_core::{LoginRequest, LoginResponse, Status};
use vitrine_store::IdentityStore;

use crate::auth::TokenService;

/// Handler for the open `Login` method.
#[derive(Debug, Clone)]
pub struct AuthService {
    identities: Arc<IdentityStore>,
    tokens: Arc<TokenService>,
}

impl AuthService {
    pub fn new(identities: Arc<IdentityStore>, tokens: Arc<TokenService>) -> Self {
        Self { identities, tokens }
    }

    /// Exchange a username and password for an access token.
    ///
    /// An unknown user and a wrong password fail identically.
    pub async fn login(&self, req: LoginRequest) -> Result<LoginResponse, Status> {
        let identity = self
            .identities
            .find(&req.username)
            .await
            .filter(|identity| identity.verify_password(&req.password));

        let Some(identity) = identity else {
            warn!(username = %req.username, "login failed");
            return Err(Status::not_found("incorrect username/password"));
        };

        let issued = self.tokens.issue(&identity).map_err(|e| {
            warn!(username = %req.username, error = %e, "cannot issue token");
            Status::from(e)
        })?;

        info!(username = %req.username, role = %identity.role(), "login succeeded");
        Ok(LoginResponse {
            access_token: issued.access_token,
            expires_in: issued.expires_in,
        })
    }
}
