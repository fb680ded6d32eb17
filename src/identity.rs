//! User accounts: registration, login, refresh-token rotation and role
//! management. The booking core only sees the resulting id and role.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::auth::{AuthError, TokenService};
use crate::models::{PublicUser, Role, User};
use crate::store::{EntityStore, StoreError};
use crate::validation::{is_blank, is_valid_email};

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("All fields are required")]
    MissingFields,
    #[error("Invalid email format")]
    InvalidEmail,
    #[error("User with email already exists")]
    EmailTaken,
    #[error("User does not exist")]
    UserMissing,
    #[error("Invalid user credentials")]
    InvalidCredentials,
    #[error("Invalid old password")]
    InvalidOldPassword,
    #[error("Invalid refresh token")]
    InvalidRefresh,
    #[error("Refresh token is expired or used")]
    RefreshReused,
    #[error("No trainers found")]
    NoTrainers,
    #[error(transparent)]
    Hash(#[from] bcrypt::BcryptError),
    #[error(transparent)]
    Token(#[from] AuthError),
    #[error("store failure: {0}")]
    Store(StoreError),
}

impl From<StoreError> for IdentityError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::EmailTaken => IdentityError::EmailTaken,
            other => IdentityError::Store(other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoggedInUser {
    pub user: PublicUser,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

pub struct IdentityService {
    store: Arc<dyn EntityStore>,
    tokens: Arc<TokenService>,
}

impl IdentityService {
    pub fn new(store: Arc<dyn EntityStore>, tokens: Arc<TokenService>) -> Self {
        Self { store, tokens }
    }

    pub async fn register(
        &self,
        full_name: &str,
        email: &str,
        password: &str,
    ) -> Result<PublicUser, IdentityError> {
        self.create_user(full_name, email, password, Role::Trainee)
            .await
    }

    /// Creates the configured admin account at startup; a no-op when the
    /// email is already registered.
    pub async fn bootstrap_admin(&self, email: &str, password: &str) -> Result<(), IdentityError> {
        match self.create_user("Administrator", email, password, Role::Admin).await {
            Ok(user) => {
                info!("bootstrap admin created: {}", user.email);
                Ok(())
            }
            Err(IdentityError::EmailTaken) => Ok(()),
            Err(err) => Err(err),
        }
    }

    async fn create_user(
        &self,
        full_name: &str,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<PublicUser, IdentityError> {
        if is_blank(full_name) || is_blank(email) || is_blank(password) {
            return Err(IdentityError::MissingFields);
        }
        let email = email.trim().to_lowercase();
        if !is_valid_email(&email) {
            return Err(IdentityError::InvalidEmail);
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            full_name: full_name.trim().to_string(),
            email,
            password_hash: bcrypt::hash(password, bcrypt::DEFAULT_COST)?,
            role,
            refresh_token: None,
            created_at: now,
            updated_at: now,
        };
        let created = self.store.insert_user(user).await?;
        Ok(created.into())
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<LoggedInUser, IdentityError> {
        if is_blank(email) || is_blank(password) {
            return Err(IdentityError::MissingFields);
        }
        let email = email.trim().to_lowercase();
        if !is_valid_email(&email) {
            return Err(IdentityError::InvalidEmail);
        }

        let user = self
            .store
            .find_user_by_email(&email)
            .await?
            .ok_or(IdentityError::UserMissing)?;
        if !bcrypt::verify(password, &user.password_hash)? {
            return Err(IdentityError::InvalidCredentials);
        }

        let pair = self.issue_pair(&user).await?;
        Ok(LoggedInUser {
            user: user.into(),
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
        })
    }

    pub async fn logout(&self, user_id: Uuid) -> Result<(), IdentityError> {
        self.store
            .set_refresh_token(user_id, None)
            .await?
            .ok_or(IdentityError::UserMissing)?;
        Ok(())
    }

    /// Rotates the refresh token: the presented token must match the one on
    /// record, and a new pair replaces it.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, IdentityError> {
        let claims = self
            .tokens
            .verify_refresh(refresh_token)
            .map_err(|_| IdentityError::InvalidRefresh)?;
        let user = self
            .store
            .find_user(claims.sub)
            .await?
            .ok_or(IdentityError::InvalidRefresh)?;
        if user.refresh_token.as_deref() != Some(refresh_token) {
            return Err(IdentityError::RefreshReused);
        }

        self.issue_pair(&user).await
    }

    pub async fn change_password(
        &self,
        user_id: Uuid,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), IdentityError> {
        if is_blank(new_password) {
            return Err(IdentityError::MissingFields);
        }
        let user = self
            .store
            .find_user(user_id)
            .await?
            .ok_or(IdentityError::UserMissing)?;
        if !bcrypt::verify(old_password, &user.password_hash)? {
            return Err(IdentityError::InvalidOldPassword);
        }

        let hash = bcrypt::hash(new_password, bcrypt::DEFAULT_COST)?;
        self.store.set_password_hash(user_id, hash).await?;
        Ok(())
    }

    pub async fn current_user(&self, user_id: Uuid) -> Result<PublicUser, IdentityError> {
        let user = self
            .store
            .find_user(user_id)
            .await?
            .ok_or(IdentityError::UserMissing)?;
        Ok(user.into())
    }

    /// Updates the caller's own name and email.
    pub async fn update_details(
        &self,
        user_id: Uuid,
        full_name: &str,
        email: &str,
    ) -> Result<PublicUser, IdentityError> {
        if is_blank(full_name) || is_blank(email) {
            return Err(IdentityError::MissingFields);
        }
        let email = email.trim().to_lowercase();
        if !is_valid_email(&email) {
            return Err(IdentityError::InvalidEmail);
        }

        let user = self
            .store
            .set_user_details(user_id, full_name.trim().to_string(), email)
            .await?
            .ok_or(IdentityError::UserMissing)?;
        Ok(user.into())
    }

    pub async fn update_role(&self, user_id: Uuid, role: Role) -> Result<PublicUser, IdentityError> {
        let user = self
            .store
            .set_role(user_id, role)
            .await?
            .ok_or(IdentityError::UserMissing)?;
        info!("role updated: {} -> {:?}", user.email, role);
        Ok(user.into())
    }

    pub async fn list_trainers(&self) -> Result<Vec<PublicUser>, IdentityError> {
        let trainers = self.store.list_users_by_role(Role::Trainer).await?;
        if trainers.is_empty() {
            return Err(IdentityError::NoTrainers);
        }
        Ok(trainers.into_iter().map(PublicUser::from).collect())
    }

    async fn issue_pair(&self, user: &User) -> Result<TokenPair, IdentityError> {
        let access_token = self.tokens.issue_access(user)?;
        let refresh_token = self.tokens.issue_refresh(user.id)?;
        self.store
            .set_refresh_token(user.id, Some(refresh_token.clone()))
            .await?;
        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }
}
