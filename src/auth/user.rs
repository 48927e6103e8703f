use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{self, SaltString, rand_core::OsRng},
};
use async_session::async_trait;
use axum_login::{AuthUser, AuthnBackend, UserId};
use sea_orm::{ActiveModelTrait, IntoActiveModel, Set, prelude::*};
use sea_orm::{DatabaseConnection, EntityTrait};
use serde::Deserialize;
use tokio::task;
use tracing::{debug, info};

use crate::entities::user;

impl AuthUser for user::Model {
    type Id = i32;

    fn id(&self) -> Self::Id {
        self.id
    }

    // Changing the password invalidates existing sessions.
    fn session_auth_hash(&self) -> &[u8] {
        self.password_hash.as_bytes()
    }
}

#[derive(Clone, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub next: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[redacted]")
            .field("next", &self.next)
            .finish()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error(transparent)]
    Seaorm(sea_orm::DbErr),

    #[error(transparent)]
    TaskJoin(#[from] task::JoinError),

    #[error(transparent)]
    PasswordHash(password_hash::Error),
}

#[derive(Debug, Clone)]
pub struct Backend {
    db: DatabaseConnection,
}

impl Backend {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AuthnBackend for Backend {
    type User = user::Model;
    type Credentials = Credentials;
    type Error = BackendError;

    async fn authenticate(
        &self,
        creds: Self::Credentials,
    ) -> Result<Option<Self::User>, Self::Error> {
        let user = user::Entity::find()
            .filter(user::Column::Username.eq(creds.username.trim()))
            .one(&self.db)
            .await
            .map_err(Self::Error::Seaorm)?;

        let Some(user) = user else {
            debug!(username = %creds.username, "Login for unknown user");
            return Ok(None);
        };

        // Hashing blocks; keep it off the async workers.
        let password_hash = user.password_hash.clone();
        let verified =
            task::spawn_blocking(move || verify_password(&creds.password, &password_hash))
                .await??;
        if !verified {
            debug!(username = %user.username, "Login with wrong password");
            return Ok(None);
        }

        let mut active = user.into_active_model();
        active.last_login = Set(Some(chrono::Utc::now().naive_utc()));
        let user = active
            .update(&self.db)
            .await
            .map_err(Self::Error::Seaorm)?;

        info!(username = %user.username, "User logged in");
        Ok(Some(user))
    }

    async fn get_user(&self, user_id: &UserId<Self>) -> Result<Option<Self::User>, Self::Error> {
        user::Entity::find_by_id(*user_id)
            .one(&self.db)
            .await
            .map_err(Self::Error::Seaorm)
    }
}

// We use a type alias for convenience.
//
// Note that we've supplied our concrete backend here.
pub type AuthSession = axum_login::AuthSession<Backend>;

fn verify_password(password: &str, password_hash: &str) -> Result<bool, BackendError> {
    let parsed = PasswordHash::new(password_hash).map_err(BackendError::PasswordHash)?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(err) => Err(BackendError::PasswordHash(err)),
    }
}

/// Argon2id PHC string with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, BackendError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(BackendError::PasswordHash)
}

/// Creates the bootstrap admin account unless the username already exists.
/// An existing account keeps its password.
pub async fn ensure_admin(
    db: &DatabaseConnection,
    username: &str,
    password: &str,
) -> Result<user::Model, BackendError> {
    let existing = user::Entity::find()
        .filter(user::Column::Username.eq(username))
        .one(db)
        .await
        .map_err(BackendError::Seaorm)?;
    if let Some(existing) = existing {
        debug!(username, "Admin account already present");
        return Ok(existing);
    }

    let password = password.to_owned();
    let password_hash = task::spawn_blocking(move || hash_password(&password)).await??;
    let user = user::ActiveModel {
        username: Set(username.to_owned()),
        password_hash: Set(password_hash),
        last_login: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(BackendError::Seaorm)?;

    info!(username, "Created admin account");
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashes_verify_against_their_password_only() {
        let hash = hash_password("hunter2").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("hunter2", &hash).unwrap());
        assert!(!verify_password("hunter3", &hash).unwrap());
    }

    #[test]
    fn malformed_hash_is_an_error_not_a_mismatch() {
        assert!(matches!(
            verify_password("hunter2", "not-a-phc-string"),
            Err(BackendError::PasswordHash(_))
        ));
    }

    #[test]
    fn credentials_debug_hides_password() {
        let creds = Credentials {
            username: "admin".into(),
            password: "hunter2".into(),
            next: None,
        };

        assert!(!format!("{creds:?}").contains("hunter2"));
    }
}
