use secrecy::SecretString;
use serde::Deserialize;

/// Token signing and identity configuration.
///
/// # Example
///
/// ```toml
/// [auth]
/// token_secret = "change-me"
/// token_ttl_seconds = 900
///
/// [[auth.users]]
/// username = "admin1"
/// password_hash = "$argon2id$v=19$..."
/// role = "admin"
/// ```
#[derive(Debug, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret for signing access tokens.
    ///
    /// When unset, a random secret is generated on startup and tokens do
    /// not survive a restart. `VITRINE_TOKEN_SECRET` overrides this value.
    pub token_secret: Option<SecretString>,
    /// Access token lifetime in seconds.
    #[serde(default = "default_token_ttl")]
    pub token_ttl_seconds: u64,
    /// Register the demo identities `admin1` and `user1` (password `secret`).
    #[serde(default)]
    pub seed_demo_users: bool,
    /// Identities registered at startup.
    #[serde(default)]
    pub users: Vec<UserConfig>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_secret: None,
            token_ttl_seconds: default_token_ttl(),
            seed_demo_users: false,
            users: Vec::new(),
        }
    }
}

fn default_token_ttl() -> u64 {
    900
}

/// An identity registered at startup.
#[derive(Debug, Deserialize)]
pub struct UserConfig {
    pub username: String,
    /// Argon2 password hash, as printed by `vitrine-server hash-password`.
    ///
    /// Wrapped in [`SecretString`] so it is redacted in logs.
    pub password_hash: SecretString,
    /// Role: `"admin"` or `"user"`.
    pub role: String,
}
