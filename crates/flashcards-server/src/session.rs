// ABOUTME: Session lifecycle: signup, login, third-party login, refresh rotation, logout, and validation.
// ABOUTME: Tokens come from the OS CSPRNG and passwords are stored as salted Argon2 hashes.

use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::{Duration, Utc};
use flashcards_core::{Credentials, RowId, Session, SessionTokens, User};
use flashcards_store::{Store, UserInsert};
use rand::distributions::Alphanumeric;
use rand::rngs::OsRng;
use rand::{Rng, RngCore};
use thiserror::Error;

/// Length of every access and refresh token.
pub const TOKEN_LEN: usize = 64;

/// Errors from the session lifecycle. Everything except `Storage` is the
/// caller's fault and maps to 401.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("username is already registered")]
    UsernameTaken,

    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("token is unknown")]
    UnknownToken,

    #[error("token has expired")]
    Expired,

    #[error("session storage failed")]
    Storage,
}

/// Lifetimes applied to newly issued tokens.
#[derive(Debug, Clone, Copy)]
pub struct TokenPolicy {
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

impl Default for TokenPolicy {
    fn default() -> Self {
        Self {
            access_ttl: Duration::hours(2),
            refresh_ttl: Duration::days(30),
        }
    }
}

/// A user proven by a third-party identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalIdentity {
    pub subject: String,
    pub name: String,
}

/// Issues, validates, rotates, and revokes sessions on top of the store.
/// All methods block on the store and belong on the blocking pool.
#[derive(Clone)]
pub struct AuthManager {
    store: Store,
    policy: TokenPolicy,
}

impl AuthManager {
    pub fn new(store: Store, policy: TokenPolicy) -> Self {
        Self { store, policy }
    }

    /// Register a password user and open their first session. The user row
    /// and the session are written together or not at all.
    pub fn signup(&self, creds: &Credentials) -> Result<SessionTokens, AuthError> {
        if self.store.user_by_username(&creds.username).is_some() {
            return Err(AuthError::UsernameTaken);
        }

        let hash = hash_password(&creds.password)?;
        match self
            .store
            .register_user(&creds.username, &hash, |user_id| self.new_session(user_id))
        {
            UserInsert::Created { user, session } => {
                tracing::info!(user_id = user.id, "user signed up");
                Ok(session.tokens())
            }
            UserInsert::Taken => Err(AuthError::UsernameTaken),
            UserInsert::Failed => Err(AuthError::Storage),
        }
    }

    /// Check a password and replace every session the user holds with a
    /// fresh one.
    pub fn login(&self, creds: &Credentials) -> Result<SessionTokens, AuthError> {
        let user = self
            .store
            .user_by_username(&creds.username)
            .ok_or(AuthError::InvalidCredentials)?;

        let matches = user
            .password_hash
            .as_deref()
            .is_some_and(|hash| verify_password(&creds.password, hash));
        if !matches {
            tracing::debug!(user_id = user.id, "password mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        self.open_exclusive_session(&user)
    }

    /// Log in (creating the account on first use) a user vouched for by an
    /// identity provider. Same single-session rule as `login`.
    pub fn external_login(&self, identity: &ExternalIdentity) -> Result<SessionTokens, AuthError> {
        let user = self
            .store
            .find_or_create_external_user(&identity.subject, &identity.name)
            .ok_or(AuthError::Storage)?;
        self.open_exclusive_session(&user)
    }

    /// Trade a live refresh token for a new token pair. The old refresh
    /// token stops working once this succeeds.
    pub fn refresh(&self, refresh_token: &str) -> Result<SessionTokens, AuthError> {
        let current = self
            .store
            .session_by_refresh_token(refresh_token)
            .ok_or(AuthError::UnknownToken)?;
        if current.refresh_expired(Utc::now()) {
            return Err(AuthError::Expired);
        }

        let next = self.new_session(current.user_id);
        if !self.store.rotate_session(refresh_token, &next) {
            // Another request rotated this token first.
            return Err(AuthError::UnknownToken);
        }
        tracing::debug!(user_id = next.user_id, "session rotated");
        Ok(next.tokens())
    }

    /// End the session keyed by `access_token`.
    pub fn logout(&self, access_token: &str) -> Result<(), AuthError> {
        if self.store.delete_session(access_token) {
            Ok(())
        } else {
            Err(AuthError::UnknownToken)
        }
    }

    /// Resolve an access token to the id of the user it belongs to.
    pub fn validate(&self, access_token: &str) -> Result<RowId, AuthError> {
        let session = self
            .store
            .session_by_access_token(access_token)
            .ok_or(AuthError::UnknownToken)?;
        if session.access_expired(Utc::now()) {
            return Err(AuthError::Expired);
        }
        Ok(session.user_id)
    }

    fn open_exclusive_session(&self, user: &User) -> Result<SessionTokens, AuthError> {
        let session = self.new_session(user.id);
        if !self.store.replace_user_sessions(&session) {
            return Err(AuthError::Storage);
        }
        tracing::info!(user_id = user.id, "user logged in");
        Ok(session.tokens())
    }

    fn new_session(&self, user_id: RowId) -> Session {
        let now = Utc::now();
        Session {
            access_token: generate_token(),
            refresh_token: generate_token(),
            user_id,
            access_expires: now + self.policy.access_ttl,
            refresh_expires: now + self.policy.refresh_ttl,
        }
    }
}

/// A fresh alphanumeric token of `TOKEN_LEN` characters.
pub fn generate_token() -> String {
    OsRng
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect()
}

fn hash_password(password: &str) -> Result<String, AuthError> {
    let mut salt = [0u8; 16];
    OsRng.fill_bytes(&mut salt);
    let salt = SaltString::encode_b64(&salt).map_err(|e| {
        tracing::error!(error = %e, "salt encoding failed");
        AuthError::Storage
    })?;

    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| {
            tracing::error!(error = %e, "password hashing failed");
            AuthError::Storage
        })?;
    Ok(hash.to_string())
}

fn verify_password(password: &str, stored: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::warn!(error = %e, "stored password hash is unreadable");
            false
        }
    }
}
