use std::collections::HashMap;
use std::collections::hash_map::Entry;

use argon2::Argon2;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use rand_core::OsRng;
use tokio::sync::RwLock;
use vitrine_core::Role;

use crate::error::StoreError;

/// A user account: a username, an argon2 password hash and a role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    username: String,
    password_hash: String,
    role: Role,
}

impl Identity {
    /// Create an identity from a plaintext password, hashing it with argon2
    /// and a random salt.
    pub fn new(
        username: impl Into<String>,
        password: &str,
        role: Role,
    ) -> Result<Self, StoreError> {
        Ok(Self {
            username: username.into(),
            password_hash: hash_password(password)?,
            role,
        })
    }

    /// Create an identity from an existing PHC-format hash, e.g. one read
    /// from configuration.
    pub fn from_hash(
        username: impl Into<String>,
        password_hash: impl Into<String>,
        role: Role,
    ) -> Result<Self, StoreError> {
        let password_hash = password_hash.into();
        PasswordHash::new(&password_hash)
            .map_err(|e| StoreError::PasswordHash(e.to_string()))?;
        Ok(Self {
            username: username.into(),
            password_hash,
            role,
        })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }

    /// Returns `true` if `candidate` matches the stored hash.
    pub fn verify_password(&self, candidate: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(&self.password_hash) else {
            return false;
        };
        Argon2::default()
            .verify_password(candidate.as_bytes(), &parsed)
            .is_ok()
    }
}

/// Hash a password into a PHC string with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, StoreError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| StoreError::PasswordHash(e.to_string()))
}

/// Identities keyed by username.
#[derive(Debug, Default)]
pub struct IdentityStore {
    identities: RwLock<HashMap<String, Identity>>,
}

impl IdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an identity. Fails when the username is taken.
    pub async fn save(&self, identity: Identity) -> Result<(), StoreError> {
        let mut identities = self.identities.write().await;
        match identities.entry(identity.username.clone()) {
            Entry::Occupied(occupied) => {
                Err(StoreError::already_exists("identity", occupied.key().as_str()))
            }
            Entry::Vacant(vacant) => {
                vacant.insert(identity);
                Ok(())
            }
        }
    }

    /// Get a copy of the identity registered under `username`.
    pub async fn find(&self, username: &str) -> Option<Identity> {
        self.identities.read().await.get(username).cloned()
    }

    pub async fn len(&self) -> usize {
        self.identities.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.identities.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashed_password_verifies() {
        let identity = Identity::new("admin1", "secret", Role::Admin).unwrap();
        assert!(identity.password_hash().starts_with("$argon2"));
        assert!(identity.verify_password("secret"));
        assert!(!identity.verify_password("wrong"));
    }

    #[test]
    fn same_password_gets_distinct_salts() {
        let a = hash_password("secret").unwrap();
        let b = hash_password("secret").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn from_hash_rejects_garbage() {
        let err = Identity::from_hash("u", "not-a-hash", Role::User).unwrap_err();
        assert!(matches!(err, StoreError::PasswordHash(_)));
    }

    #[test]
    fn from_hash_accepts_generated_hash() {
        let hash = hash_password("pw").unwrap();
        let identity = Identity::from_hash("user1", hash, Role::User).unwrap();
        assert!(identity.verify_password("pw"));
        assert_eq!(identity.role(), Role::User);
    }

    #[tokio::test]
    async fn duplicate_username_is_rejected() {
        let store = IdentityStore::new();
        store
            .save(Identity::new("user1", "a", Role::User).unwrap())
            .await
            .unwrap();
        let err = store
            .save(Identity::new("user1", "b", Role::Admin).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists { .. }));

        let stored = store.find("user1").await.unwrap();
        assert_eq!(stored.role(), Role::User);
        assert!(stored.verify_password("a"));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn unknown_username_is_none() {
        let store = IdentityStore::new();
        assert!(store.find("ghost").await.is_none());
        assert!(store.is_empty().await);
    }
}
