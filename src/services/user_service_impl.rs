//! `SeaORM` implementation of the `UserService` trait.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::config::SecurityConfig;
use crate::db::repositories::user::verify_hash;
use crate::db::{NewUser, ProfileUpdate, Store, User, is_unique_violation};
use crate::domain::{Principal, Role};
use crate::services::token::TokenService;
use crate::services::user_service::{LoginResult, Registration, UserError, UserService};

pub const MIN_PASSWORD_LEN: usize = 8;

pub struct SeaOrmUserService {
    store: Store,
    security: SecurityConfig,
    tokens: Arc<TokenService>,
}

impl SeaOrmUserService {
    #[must_use]
    pub fn new(store: Store, security: SecurityConfig, tokens: Arc<TokenService>) -> Self {
        Self {
            store,
            security,
            tokens,
        }
    }

    const fn authorize(principal: &Principal, id: i32) -> Result<(), UserError> {
        if principal.can_act_for(id) {
            Ok(())
        } else {
            Err(UserError::Forbidden)
        }
    }

    async fn insert(&self, registration: Registration, role: Role) -> Result<User, UserError> {
        let username = registration.username.trim().to_string();
        let email = registration.email.trim().to_lowercase();

        if username.is_empty() || email.is_empty() {
            return Err(UserError::Validation(
                "Username and email are required".to_string(),
            ));
        }
        if registration.password.len() < MIN_PASSWORD_LEN {
            return Err(UserError::Validation(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        if self.store.get_user_by_username(&username).await?.is_some() {
            return Err(UserError::Conflict("Username already taken".to_string()));
        }
        if self.store.get_user_by_email(&email).await?.is_some() {
            return Err(UserError::Conflict("Email already registered".to_string()));
        }

        let new_user = NewUser {
            username,
            email,
            password: registration.password,
            role,
            fullname: registration.fullname,
            phone: registration.phone,
            address: registration.address,
        };

        let user = match self.store.create_user(new_user, &self.security).await {
            Ok(user) => user,
            Err(e) if is_unique_violation(&e) => {
                return Err(UserError::Conflict(
                    "Username or email already registered".to_string(),
                ));
            }
            Err(e) => return Err(e.into()),
        };

        info!(user_id = user.id, username = %user.username, role = %user.role, "Account created");
        Ok(user)
    }
}

#[async_trait]
impl UserService for SeaOrmUserService {
    async fn register(&self, registration: Registration) -> Result<User, UserError> {
        let role = registration.role.unwrap_or_default();
        if role == Role::Admin {
            return Err(UserError::Forbidden);
        }
        self.insert(registration, role).await
    }

    async fn create_account(&self, registration: Registration) -> Result<User, UserError> {
        let role = registration.role.unwrap_or_default();
        self.insert(registration, role).await
    }

    async fn login(&self, email: &str, password: &str) -> Result<LoginResult, UserError> {
        let email = email.trim().to_lowercase();

        let Some((user, password_hash)) =
            self.store.get_user_with_password_by_email(&email).await?
        else {
            return Err(UserError::InvalidCredentials);
        };

        if !verify_hash(password_hash, password.to_string()).await? {
            warn!(user_id = user.id, "Failed login attempt");
            return Err(UserError::InvalidCredentials);
        }

        if !user.is_active {
            return Err(UserError::AccountDisabled);
        }

        let token = self
            .tokens
            .issue(user.id, user.role)
            .map_err(|e| UserError::Internal(e.to_string()))?;

        info!(user_id = user.id, "User logged in");
        Ok(LoginResult { token, user })
    }

    async fn list(&self, principal: &Principal) -> Result<Vec<User>, UserError> {
        if !principal.is_admin() {
            return Err(UserError::Forbidden);
        }
        Ok(self.store.list_users().await?)
    }

    async fn get(&self, principal: &Principal, id: i32) -> Result<User, UserError> {
        Self::authorize(principal, id)?;
        self.store.get_user(id).await?.ok_or(UserError::NotFound)
    }

    async fn update_profile(
        &self,
        principal: &Principal,
        id: i32,
        mut update: ProfileUpdate,
    ) -> Result<User, UserError> {
        Self::authorize(principal, id)?;

        if let Some(email) = update.email.take() {
            let email = email.trim().to_lowercase();
            if !email.is_empty() {
                if let Some(other) = self.store.get_user_by_email(&email).await?
                    && other.id != id
                {
                    return Err(UserError::Conflict("Email already registered".to_string()));
                }
                update.email = Some(email);
            }
        }

        match self.store.update_user_profile(id, update).await {
            Ok(Some(user)) => Ok(user),
            Ok(None) => Err(UserError::NotFound),
            Err(e) if is_unique_violation(&e) => {
                Err(UserError::Conflict("Email already registered".to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn change_password(
        &self,
        principal: &Principal,
        id: i32,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), UserError> {
        if principal.user_id != id {
            return Err(UserError::Forbidden);
        }

        if current_password.is_empty() || new_password.is_empty() {
            return Err(UserError::Validation(
                "Current and new password are required".to_string(),
            ));
        }
        if new_password.len() < MIN_PASSWORD_LEN {
            return Err(UserError::Validation(format!(
                "New password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        if current_password == new_password {
            return Err(UserError::Validation(
                "New password must be different from current password".to_string(),
            ));
        }

        if !self.store.user_exists(id).await? {
            return Err(UserError::NotFound);
        }

        let is_valid = self.store.verify_user_password(id, current_password).await?;
        if !is_valid {
            return Err(UserError::Validation(
                "Current password is incorrect".to_string(),
            ));
        }

        self.store
            .update_user_password(id, new_password, &self.security)
            .await?;

        info!(user_id = id, "Password changed");
        Ok(())
    }

    async fn delete(&self, principal: &Principal, id: i32) -> Result<(), UserError> {
        Self::authorize(principal, id)?;

        if !self.store.delete_user(id).await? {
            return Err(UserError::NotFound);
        }

        info!(user_id = id, "Account deleted");
        Ok(())
    }

    async fn set_active(
        &self,
        principal: &Principal,
        id: i32,
        is_active: bool,
    ) -> Result<User, UserError> {
        if !principal.is_admin() {
            return Err(UserError::Forbidden);
        }

        let user = self
            .store
            .set_user_active(id, is_active)
            .await?
            .ok_or(UserError::NotFound)?;

        info!(user_id = id, is_active, "Account activation changed");
        Ok(user)
    }
}
