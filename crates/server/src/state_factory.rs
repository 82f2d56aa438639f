use std::sync::Arc;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use vitrine_blob::DiskBlobStore;
use vitrine_core::{MAX_ATTACHMENT_BYTES, Role};
use vitrine_store::{Identity, IdentityStore, MemoryRecordStore, RatingStore};

use crate::api::AppState;
use crate::auth::{AccessGate, TokenService};
use crate::config::{AuthConfig, VitrineConfig};
use crate::error::ServerError;
use crate::service::{AuthService, CatalogService};

/// Environment variable that overrides `[auth] token_secret`.
pub const TOKEN_SECRET_ENV: &str = "VITRINE_TOKEN_SECRET";

const DEMO_PASSWORD: &str = "secret";

/// Build the application state from the given configuration.
///
/// Opens the attachment directory, registers the configured identities and
/// wires the services together. Every call context is derived from
/// `shutdown`.
pub async fn create_state(
    config: &VitrineConfig,
    token_secret: &SecretString,
    shutdown: CancellationToken,
) -> Result<AppState, ServerError> {
    let blobs = DiskBlobStore::open(&config.attachments.dir)
        .await?
        .with_max_size(MAX_ATTACHMENT_BYTES as u64);
    info!(dir = %config.attachments.dir.display(), "attachment store opened");

    let identities = Arc::new(IdentityStore::new());
    seed_identities(&identities, &config.auth).await?;

    let tokens = Arc::new(TokenService::new(
        token_secret,
        Duration::from_secs(config.auth.token_ttl_seconds),
    ));

    let catalog = CatalogService::new(
        Arc::new(MemoryRecordStore::new()),
        Arc::new(blobs),
        Arc::new(RatingStore::new()),
    );

    Ok(AppState {
        catalog: Arc::new(catalog),
        auth: Arc::new(AuthService::new(identities, Arc::clone(&tokens))),
        gate: Arc::new(AccessGate::new(tokens)),
        shutdown,
    })
}

/// Pick the token signing secret: the environment, then the configuration,
/// then a random per-process value.
pub fn resolve_token_secret(config: &AuthConfig) -> SecretString {
    if let Ok(secret) = std::env::var(TOKEN_SECRET_ENV)
        && !secret.is_empty()
    {
        return SecretString::new(secret);
    }
    if let Some(secret) = &config.token_secret
        && !secret.expose_secret().is_empty()
    {
        return SecretString::new(secret.expose_secret().clone());
    }
    warn!("no token secret configured, generating a random one; tokens will not survive a restart");
    SecretString::new(format!(
        "{}{}",
        uuid::Uuid::new_v4().simple(),
        uuid::Uuid::new_v4().simple()
    ))
}

/// Register the configured identities, plus the demo pair when enabled.
pub async fn seed_identities(store: &IdentityStore, config: &AuthConfig) -> Result<(), ServerError> {
    for user in &config.users {
        let role = Role::from_str_loose(&user.role).ok_or_else(|| {
            ServerError::Config(format!(
                "user {}: unknown role {:?}, expected \"admin\" or \"user\"",
                user.username, user.role
            ))
        })?;
        let identity = Identity::from_hash(
            &user.username,
            user.password_hash.expose_secret(),
            role,
        )?;
        store.save(identity).await?;
        info!(username = %user.username, %role, "identity registered");
    }

    if config.seed_demo_users {
        warn!("registering demo identities admin1 and user1 with the default password");
        for (username, role) in [("admin1", Role::Admin), ("user1", Role::User)] {
            store
                .save(Identity::new(username, DEMO_PASSWORD, role)?)
                .await?;
        }
    }
    Ok(())
}
