use std::sync::Arc;

use argon2::Config as ArgonConfig;
use rand::Rng;
use tracing::{debug, info, instrument, warn};

use crate::contract::model::{User, UserId};
use crate::domain::error::DomainError;
use crate::domain::repo::{UsernameExists, UsersRepository};
use crate::domain::validation;

/// Seeded for every new account.
pub const DEFAULT_CATEGORIES: [(&str, &str); 5] = [
    ("Work", "#FF5722"),
    ("Personal", "#4CAF50"),
    ("Health", "#2196F3"),
    ("Social", "#9C27B0"),
    ("Education", "#FF9800"),
];

/// Registration, login and the phone number used for notifications.
#[derive(Clone)]
pub struct Accounts {
    users: Arc<dyn UsersRepository>,
}

impl Accounts {
    pub fn new(users: Arc<dyn UsersRepository>) -> Self {
        Self { users }
    }

    #[instrument(name = "event_tracker.accounts.register", skip(self, password))]
    pub async fn register(&self, username: &str, password: &str) -> Result<UserId, DomainError> {
        let username = username.trim();
        validation::validate_username(username)?;
        validation::validate_password(password)?;

        if self
            .users
            .find_user_by_name(username)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?
            .is_some()
        {
            return Err(DomainError::username_taken(username));
        }

        let hash = hash_password(password)?;
        let id = self
            .users
            .insert_user_with_categories(username, &hash, &DEFAULT_CATEGORIES)
            .await
            .map_err(|e| {
                if e.downcast_ref::<UsernameExists>().is_some() {
                    DomainError::username_taken(username)
                } else {
                    warn!(error = %e, "registration rolled back");
                    DomainError::database(e.to_string())
                }
            })?;
        info!(user_id = id, "registered new user");
        Ok(id)
    }

    /// Unknown users and wrong passwords fail the same way.
    #[instrument(name = "event_tracker.accounts.login", skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<UserId, DomainError> {
        let stored = self
            .users
            .find_user_by_name(username.trim())
            .await
            .map_err(|e| DomainError::database(e.to_string()))?
            .ok_or(DomainError::InvalidCredentials)?;

        if !verify_password(&stored.password_hash, password) {
            debug!("password mismatch");
            return Err(DomainError::InvalidCredentials);
        }
        Ok(stored.user.id)
    }

    pub async fn user_id(&self, username: &str) -> Result<UserId, DomainError> {
        self.users
            .find_user_by_name(username.trim())
            .await
            .map_err(|e| DomainError::database(e.to_string()))?
            .map(|s| s.user.id)
            .ok_or_else(|| DomainError::user_not_found(username.trim()))
    }

    pub async fn user(&self, id: UserId) -> Result<User, DomainError> {
        self.users
            .find_user(id)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?
            .ok_or_else(|| DomainError::user_not_found(id))
    }

    pub async fn phone_number(&self, id: UserId) -> Result<Option<String>, DomainError> {
        Ok(self.user(id).await?.phone)
    }

    /// Validates the number; stored as entered (trimmed).
    #[instrument(name = "event_tracker.accounts.set_phone_number", skip(self, phone))]
    pub async fn set_phone_number(&self, id: UserId, phone: &str) -> Result<(), DomainError> {
        let phone = phone.trim();
        validation::validate_phone(phone)?;
        let updated = self
            .users
            .update_phone(id, Some(phone))
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;
        if !updated {
            return Err(DomainError::user_not_found(id));
        }
        Ok(())
    }
}

fn hash_password(password: &str) -> Result<String, DomainError> {
    let salt: [u8; 16] = rand::thread_rng().gen();
    argon2::hash_encoded(password.as_bytes(), &salt, &ArgonConfig::default())
        .map_err(|e| DomainError::external("password hashing", e.to_string()))
}

fn verify_password(encoded: &str, password: &str) -> bool {
    argon2::verify_encoded(encoded, password.as_bytes()).unwrap_or(false)
}
