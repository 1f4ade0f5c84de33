//! # bingo-auth-simple
//!
//! Argon2-based implementation of `IdentityProvider`.
//! Accounts and sessions live in process memory; a restart signs everyone out.

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use base64::Engine;
use bingo_core::error::AuthError;
use bingo_core::traits::{AuthListener, AuthSession, AuthUser, IdentityProvider};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use sha2::{Digest, Sha256};
use std::sync::Mutex;

#[derive(Debug, Clone)]
struct Account {
    username: String,
    email: String,
    password_hash: String,
}

impl Account {
    fn user(&self) -> AuthUser {
        AuthUser {
            display_name: self.username.clone(),
            email: self.email.clone(),
        }
    }
}

pub struct SimpleIdentityProvider {
    /// Mixed into every stored token digest.
    session_salt: String,
    /// Keyed by lower-cased email.
    accounts: DashMap<String, Account>,
    /// Display name to account key. A name is reserved here before the
    /// account exists, since page ownership is decided by display name.
    usernames: DashMap<String, String>,
    /// Token digest to account key.
    sessions: DashMap<String, String>,
    /// Reset token digest to account key.
    resets: DashMap<String, String>,
    listeners: Mutex<Vec<AuthListener>>,
}

impl SimpleIdentityProvider {
    /// Accepts a salt string (e.g., from configuration)
    pub fn new(salt: &str) -> Self {
        Self {
            session_salt: salt.to_string(),
            accounts: DashMap::new(),
            usernames: DashMap::new(),
            sessions: DashMap::new(),
            resets: DashMap::new(),
            listeners: Mutex::new(Vec::new()),
        }
    }

    fn digest(&self, token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.session_salt.as_bytes());
        hasher.update(token.as_bytes());
        hex::encode(hasher.finalize())
    }

    fn random_token() -> Result<String, AuthError> {
        let mut bytes = [0u8; 32];
        getrandom::getrandom(&mut bytes).map_err(|e| anyhow::anyhow!("random source failed: {e}"))?;
        Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes))
    }

    fn hash_password(password: &str) -> Result<String, AuthError> {
        let mut bytes = [0u8; 16];
        getrandom::getrandom(&mut bytes).map_err(|e| anyhow::anyhow!("random source failed: {e}"))?;
        let salt = SaltString::encode_b64(&bytes).map_err(|e| anyhow::anyhow!("salt encoding failed: {e}"))?;
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!("password hashing failed: {e}"))?;
        Ok(hash.to_string())
    }

    fn verify_password(password: &str, hash: &str) -> bool {
        let parsed_hash = match PasswordHash::new(hash) {
            Ok(p) => p,
            Err(_) => return false,
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }

    fn open_session(&self, key: &str, account: &Account) -> Result<AuthSession, AuthError> {
        let token = Self::random_token()?;
        self.sessions.insert(self.digest(&token), key.to_string());
        Ok(AuthSession {
            token,
            user: account.user(),
        })
    }

    fn account_key(&self, token: &str) -> Result<String, AuthError> {
        self.sessions
            .get(&self.digest(token))
            .map(|entry| entry.value().clone())
            .ok_or(AuthError::InvalidSession)
    }

    fn notify(&self, user: Option<&AuthUser>) {
        let listeners = match self.listeners.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        for listener in listeners {
            listener(user);
        }
    }
}

#[async_trait]
impl IdentityProvider for SimpleIdentityProvider {
    async fn create_account(&self, username: &str, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let key = email.trim().to_lowercase();
        if key.is_empty() || username.trim().is_empty() || password.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }
        match self.usernames.entry(username.to_string()) {
            Entry::Occupied(_) => return Err(AuthError::UsernameTaken),
            Entry::Vacant(slot) => {
                slot.insert(key.clone());
            }
        }

        let account = match Self::hash_password(password) {
            Ok(password_hash) => Account {
                username: username.to_string(),
                email: email.trim().to_string(),
                password_hash,
            },
            Err(err) => {
                self.usernames.remove(username);
                return Err(err);
            }
        };
        match self.accounts.entry(key.clone()) {
            Entry::Occupied(_) => {
                self.usernames.remove(username);
                return Err(AuthError::EmailTaken);
            }
            Entry::Vacant(slot) => {
                slot.insert(account.clone());
            }
        }

        log::info!("account created for {}", username);
        let session = self.open_session(&key, &account)?;
        self.notify(Some(&session.user));
        Ok(session)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let key = email.trim().to_lowercase();
        let account = self
            .accounts
            .get(&key)
            .map(|entry| entry.value().clone())
            .ok_or(AuthError::InvalidCredentials)?;
        if !Self::verify_password(password, &account.password_hash) {
            return Err(AuthError::InvalidCredentials);
        }

        let session = self.open_session(&key, &account)?;
        self.notify(Some(&session.user));
        Ok(session)
    }

    async fn sign_out(&self, token: &str) -> Result<(), AuthError> {
        self.sessions
            .remove(&self.digest(token))
            .ok_or(AuthError::InvalidSession)?;
        self.notify(None);
        Ok(())
    }

    async fn current_user(&self, token: &str) -> Option<AuthUser> {
        let key = self.account_key(token).ok()?;
        self.accounts.get(&key).map(|entry| entry.user())
    }

    fn on_auth_state_changed(&self, listener: AuthListener) {
        match self.listeners.lock() {
            Ok(mut guard) => guard.push(listener),
            Err(poisoned) => poisoned.into_inner().push(listener),
        }
    }

    /// No mail is sent; the token is written to the log for the operator.
    async fn send_password_reset(&self, email: &str) -> Result<(), AuthError> {
        let key = email.trim().to_lowercase();
        if !self.accounts.contains_key(&key) {
            log::debug!("password reset requested for unknown email");
            return Ok(());
        }
        let token = Self::random_token()?;
        self.resets.insert(self.digest(&token), key);
        log::info!("password reset token for {}: {}", email.trim(), token);
        Ok(())
    }

    async fn confirm_password_reset(&self, reset_token: &str, new_password: &str) -> Result<(), AuthError> {
        if new_password.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }
        let (_, key) = self
            .resets
            .remove(&self.digest(reset_token))
            .ok_or(AuthError::InvalidResetToken)?;
        let hash = Self::hash_password(new_password)?;
        let mut account = self.accounts.get_mut(&key).ok_or(AuthError::InvalidResetToken)?;
        account.password_hash = hash;
        Ok(())
    }

    async fn update_email(&self, token: &str, email: &str) -> Result<(), AuthError> {
        let old_key = self.account_key(token)?;
        let new_key = email.trim().to_lowercase();
        if new_key.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }
        let mut account = self
            .accounts
            .get(&old_key)
            .map(|entry| entry.value().clone())
            .ok_or(AuthError::InvalidSession)?;
        account.email = email.trim().to_string();
        let user = account.user();

        if new_key == old_key {
            if let Some(mut current) = self.accounts.get_mut(&old_key) {
                current.email = account.email;
            }
            self.notify(Some(&user));
            return Ok(());
        }

        // Claim the new address before releasing the old one.
        match self.accounts.entry(new_key.clone()) {
            Entry::Occupied(_) => return Err(AuthError::EmailTaken),
            Entry::Vacant(slot) => {
                slot.insert(account);
            }
        }
        self.accounts.remove(&old_key);
        self.usernames.insert(user.display_name.clone(), new_key.clone());
        for mut session in self.sessions.iter_mut() {
            if *session.value() == old_key {
                *session.value_mut() = new_key.clone();
            }
        }

        self.notify(Some(&user));
        Ok(())
    }

    async fn update_password(&self, token: &str, password: &str) -> Result<(), AuthError> {
        if password.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }
        let key = self.account_key(token)?;
        let hash = Self::hash_password(password)?;
        let mut account = self.accounts.get_mut(&key).ok_or(AuthError::InvalidSession)?;
        account.password_hash = hash;
        Ok(())
    }
}
