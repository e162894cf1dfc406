//! Domain service for accounts and authentication.
//!
//! Handles registration, login (token issue), profile management, password
//! changes, and account activation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::{ProfileUpdate, User};
use crate::domain::{Principal, Role};

/// Errors specific to account operations.
#[derive(Debug, Error)]
pub enum UserError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account is deactivated")]
    AccountDisabled,

    #[error("User not found")]
    NotFound,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Not allowed to manage this account")]
    Forbidden,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for UserError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for UserError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<Role>,
    pub fullname: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// Login result containing the bearer token and the account.
#[derive(Debug, Clone, Serialize)]
pub struct LoginResult {
    pub token: String,
    pub user: User,
}

#[async_trait::async_trait]
pub trait UserService: Send + Sync {
    /// Self-service signup. Only buyer and seller roles may be chosen.
    async fn register(&self, registration: Registration) -> Result<User, UserError>;

    /// Creates an account with any role. Used by the operator CLI.
    async fn create_account(&self, registration: Registration) -> Result<User, UserError>;

    /// Verifies credentials and issues a bearer token.
    ///
    /// # Errors
    ///
    /// Returns [`UserError::InvalidCredentials`] if the email is unknown or
    /// the password does not match, and [`UserError::AccountDisabled`] for
    /// deactivated accounts.
    async fn login(&self, email: &str, password: &str) -> Result<LoginResult, UserError>;

    async fn list(&self, principal: &Principal) -> Result<Vec<User>, UserError>;

    async fn get(&self, principal: &Principal, id: i32) -> Result<User, UserError>;

    async fn update_profile(
        &self,
        principal: &Principal,
        id: i32,
        update: ProfileUpdate,
    ) -> Result<User, UserError>;

    /// Changes the caller's own password.
    ///
    /// # Errors
    ///
    /// Returns [`UserError::Validation`] if the current password is wrong or
    /// the new one is too short.
    async fn change_password(
        &self,
        principal: &Principal,
        id: i32,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), UserError>;

    async fn delete(&self, principal: &Principal, id: i32) -> Result<(), UserError>;

    async fn set_active(
        &self,
        principal: &Principal,
        id: i32,
        is_active: bool,
    ) -> Result<User, UserError>;
}
