//! Membership service: signup, login and token issuance

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use chrono::Duration;
use validator::Validate;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::user::{AccessClaims, CreateUser, User},
    repository::Repository,
};

/// Issued access token
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub token: String,
    pub expires_in: i64,
}

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
    config: AuthConfig,
    hasher: Argon2<'static>,
}

impl UsersService {
    pub fn new(repository: Repository, config: AuthConfig) -> AppResult<Self> {
        let params = Params::new(
            config.password_memory_kib,
            config.password_iterations,
            1,
            None,
        )
        .map_err(|e| AppError::Internal(format!("Invalid password hashing parameters: {}", e)))?;

        Ok(Self {
            repository,
            config,
            hasher: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// Register a new user
    pub async fn signup(&self, request: CreateUser) -> AppResult<User> {
        request.validate()?;
        let email = request.email.trim().to_lowercase();

        if self.repository.users.get_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict(
                "User already exists. Please log in.".to_string(),
            ));
        }

        let hash = self.hash_password(&request.password)?;
        let user = User::new(request.name, email, hash);
        let created = self.repository.users.create(&user).await?;

        tracing::info!("New user registered id={}", created.id);
        Ok(created)
    }

    /// Check credentials and issue a short-lived access token
    pub async fn login(&self, email: &str, password: &str) -> AppResult<AccessToken> {
        let email = email.trim().to_lowercase();
        let user = self
            .repository
            .users
            .get_by_email(&email)
            .await?
            .ok_or_else(|| AppError::NotFound("Email does not exist".to_string()))?;

        if !self.verify_password(&user, password)? {
            tracing::debug!("Rejected login for user id={}", user.id);
            return Err(AppError::InvalidCredentials(
                "Password is incorrect".to_string(),
            ));
        }

        let ttl = Duration::minutes(self.config.token_ttl_minutes);
        let token = AccessClaims::new(user.id, ttl)
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))?;

        Ok(AccessToken {
            token,
            expires_in: ttl.num_seconds(),
        })
    }

    fn verify_password(&self, user: &User, password: &str) -> AppResult<bool> {
        let parsed_hash = PasswordHash::new(&user.password)
            .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
        Ok(self
            .hasher
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    fn hash_password(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .hasher
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
        Ok(hash.to_string())
    }
}
