//! Domain service for accounts.
//!
//! Handles admin login, student sign-up and sign-in, password changes, API
//! keys and the authorized-student allow-list that gates sign-up.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::Actor;
use crate::entities::{authorized_students, issues, users};

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("{0} not found")]
    NotFound(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignupInput {
    pub roll_number: String,
    pub name: String,
    pub phone_number: String,
    pub room_number: String,
    pub password: String,
    pub confirm_password: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChangePasswordInput {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthorizedStudentInput {
    pub roll_number: String,
    pub name: String,
}

/// Successful login: who the caller is and the key for header auth.
#[derive(Debug, Clone, Serialize)]
pub struct LoginResult {
    pub actor: Actor,
    pub api_key: String,
    /// Set for the seeded admin until its password is changed.
    pub must_change_password: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Profile {
    Admin {
        username: String,
        must_change_password: bool,
        created_at: String,
    },
    Student {
        #[serde(flatten)]
        user: users::Model,
        issues: Vec<issues::Model>,
    },
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Admin username/password login.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] if login fails.
    async fn admin_login(&self, username: &str, password: &str) -> Result<LoginResult, AuthError>;

    /// Student roll number/password sign-in.
    async fn student_signin(
        &self,
        roll_number: &str,
        password: &str,
    ) -> Result<LoginResult, AuthError>;

    /// Registers a student.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Forbidden`] if the roll number and name are not
    /// on the allow-list and [`AuthError::Conflict`] if the roll number is
    /// already registered.
    async fn signup(&self, input: SignupInput) -> Result<LoginResult, AuthError>;

    /// Resolves an API key to the admin or student who owns it.
    async fn verify_api_key(&self, api_key: &str) -> Result<Option<Actor>, AuthError>;

    async fn profile(&self, actor: &Actor) -> Result<Profile, AuthError>;

    /// # Errors
    ///
    /// Returns [`AuthError::Validation`] if the current password is wrong,
    /// the confirmation does not match or the new password is too short.
    async fn change_password(
        &self,
        actor: &Actor,
        input: ChangePasswordInput,
    ) -> Result<(), AuthError>;

    async fn get_api_key(&self, actor: &Actor) -> Result<String, AuthError>;

    async fn regenerate_api_key(&self, actor: &Actor) -> Result<String, AuthError>;

    /// Admin only.
    async fn list_users(&self, actor: &Actor) -> Result<Vec<users::Model>, AuthError>;

    /// Admin only.
    async fn list_authorized(
        &self,
        actor: &Actor,
    ) -> Result<Vec<authorized_students::Model>, AuthError>;

    /// Admin only. Replaces the allow-list in one transaction and returns the
    /// number of entries stored.
    async fn replace_authorized(
        &self,
        actor: &Actor,
        entries: Vec<AuthorizedStudentInput>,
    ) -> Result<usize, AuthError>;
}
