//! `SeaORM` implementation of the `AuthService` trait.

use async_trait::async_trait;
use regex::Regex;
use std::collections::HashSet;
use std::sync::{Arc, LazyLock};
use tokio::sync::{RwLock, broadcast};
use tracing::{info, warn};

use crate::config::Config;
use crate::constants::limits::{MAX_AUTHORIZED_BATCH, MAX_NAME_LENGTH, PHONE_NUMBER_DIGITS};
use crate::db::{AuthorizedEntry, IssueFilter, NewUser, Store};
use crate::domain::events::LendingEvent;
use crate::domain::{Actor, names_match, normalize_roll_number};
use crate::entities::{authorized_students, users};
use crate::services::auth_service::{
    AuthError, AuthService, AuthorizedStudentInput, ChangePasswordInput, LoginResult, Profile,
    SignupInput,
};

static PHONE_NUMBER: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(&format!(r"^\d{{{PHONE_NUMBER_DIGITS}}}$")));

pub struct SeaOrmAuthService {
    store: Store,
    config: Arc<RwLock<Config>>,
    event_bus: broadcast::Sender<LendingEvent>,
}

impl SeaOrmAuthService {
    #[must_use]
    pub const fn new(
        store: Store,
        config: Arc<RwLock<Config>>,
        event_bus: broadcast::Sender<LendingEvent>,
    ) -> Self {
        Self {
            store,
            config,
            event_bus,
        }
    }

    fn require_admin(actor: &Actor) -> Result<(), AuthError> {
        if actor.is_admin() {
            Ok(())
        } else {
            Err(AuthError::Forbidden("Admin access required".to_string()))
        }
    }

    async fn check_new_password(&self, password: &str) -> Result<(), AuthError> {
        let min = self.config.read().await.lending.min_password_length;
        if password.chars().count() < min {
            return Err(AuthError::Validation(format!(
                "Password must be at least {min} characters"
            )));
        }
        Ok(())
    }

    fn student_login(user: users::Model) -> LoginResult {
        LoginResult {
            api_key: user.api_key.clone(),
            actor: Actor::Student {
                roll_number: user.roll_number,
                name: user.name,
            },
            must_change_password: false,
        }
    }
}

fn required<'a>(field: &str, value: &'a str) -> Result<&'a str, AuthError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AuthError::Validation(format!("{field} is required")));
    }
    if value.chars().count() > MAX_NAME_LENGTH {
        return Err(AuthError::Validation(format!(
            "{field} cannot exceed {MAX_NAME_LENGTH} characters"
        )));
    }
    Ok(value)
}

fn valid_phone_number(phone: &str) -> Result<bool, AuthError> {
    match &*PHONE_NUMBER {
        Ok(re) => Ok(re.is_match(phone)),
        Err(e) => Err(AuthError::Internal(format!("Invalid phone pattern: {e}"))),
    }
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn admin_login(&self, username: &str, password: &str) -> Result<LoginResult, AuthError> {
        let is_valid = self.store.verify_admin_password(username, password).await?;

        if !is_valid {
            warn!("Failed admin login for {username}");
            return Err(AuthError::InvalidCredentials);
        }

        let admin = self
            .store
            .get_admin(username)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        Ok(LoginResult {
            actor: Actor::Admin {
                username: admin.username,
            },
            api_key: admin.api_key,
            must_change_password: admin.must_change_password,
        })
    }

    async fn student_signin(
        &self,
        roll_number: &str,
        password: &str,
    ) -> Result<LoginResult, AuthError> {
        let roll_number = normalize_roll_number(roll_number);

        if !self
            .store
            .verify_user_password(&roll_number, password)
            .await?
        {
            warn!("Failed sign-in for {roll_number}");
            return Err(AuthError::InvalidCredentials);
        }

        let user = self
            .store
            .get_user(&roll_number)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        Ok(Self::student_login(user))
    }

    async fn signup(&self, input: SignupInput) -> Result<LoginResult, AuthError> {
        let roll_number = normalize_roll_number(required("Roll number", &input.roll_number)?);
        let name = required("Name", &input.name)?.to_string();
        let phone_number = required("Phone number", &input.phone_number)?.to_string();
        let room_number = required("Room number", &input.room_number)?.to_string();

        if input.password.is_empty() {
            return Err(AuthError::Validation("Password is required".to_string()));
        }
        if !valid_phone_number(&phone_number)? {
            return Err(AuthError::Validation(
                format!("Phone number must be exactly {PHONE_NUMBER_DIGITS} digits"),
            ));
        }
        if let Some(confirm) = &input.confirm_password
            && *confirm != input.password
        {
            return Err(AuthError::Validation("Passwords do not match".to_string()));
        }
        self.check_new_password(&input.password).await?;

        let authorized = self.store.find_authorized_student(&roll_number).await?;
        if !authorized.is_some_and(|a| names_match(&a.name, &name)) {
            warn!("Sign-up refused for {roll_number}: not on the authorized list");
            return Err(AuthError::Forbidden(
                "Roll number and name are not on the authorized student list".to_string(),
            ));
        }

        if self.store.get_user(&roll_number).await?.is_some() {
            return Err(AuthError::Conflict(
                "An account with this roll number already exists".to_string(),
            ));
        }

        let security = self.config.read().await.security.clone();
        let user = self
            .store
            .create_user(
                NewUser {
                    roll_number,
                    name,
                    phone_number,
                    room_number,
                    password: input.password,
                },
                &security,
            )
            .await
            .map_err(|e| {
                if e.downcast_ref::<sea_orm::DbErr>()
                    .is_some_and(crate::db::repositories::is_unique_violation)
                {
                    AuthError::Conflict(
                        "An account with this roll number already exists".to_string(),
                    )
                } else {
                    AuthError::from(e)
                }
            })?;

        let _ = self.event_bus.send(LendingEvent::UserRegistered {
            roll_number: user.roll_number.clone(),
        });

        Ok(Self::student_login(user))
    }

    async fn verify_api_key(&self, api_key: &str) -> Result<Option<Actor>, AuthError> {
        if let Some(admin) = self.store.verify_admin_api_key(api_key).await? {
            return Ok(Some(Actor::Admin {
                username: admin.username,
            }));
        }

        let user = self.store.verify_user_api_key(api_key).await?;
        Ok(user.map(|u| Actor::Student {
            roll_number: u.roll_number,
            name: u.name,
        }))
    }

    async fn profile(&self, actor: &Actor) -> Result<Profile, AuthError> {
        match actor {
            Actor::Admin { username } => {
                let admin = self
                    .store
                    .get_admin(username)
                    .await?
                    .ok_or_else(|| AuthError::NotFound("Admin".to_string()))?;

                Ok(Profile::Admin {
                    username: admin.username,
                    must_change_password: admin.must_change_password,
                    created_at: admin.created_at,
                })
            }
            Actor::Student { roll_number, .. } => {
                let user = self
                    .store
                    .get_user(roll_number)
                    .await?
                    .ok_or_else(|| AuthError::NotFound("User".to_string()))?;

                let issues = self
                    .store
                    .list_issues(&IssueFilter {
                        student_id: Some(roll_number.clone()),
                        ..IssueFilter::default()
                    })
                    .await?;

                Ok(Profile::Student { user, issues })
            }
        }
    }

    async fn change_password(
        &self,
        actor: &Actor,
        input: ChangePasswordInput,
    ) -> Result<(), AuthError> {
        if input.current_password.is_empty() {
            return Err(AuthError::Validation(
                "Current password is required".to_string(),
            ));
        }
        if input.new_password != input.confirm_password {
            return Err(AuthError::Validation(
                "New passwords do not match".to_string(),
            ));
        }
        self.check_new_password(&input.new_password).await?;

        let security = self.config.read().await.security.clone();

        match actor {
            Actor::Admin { username } => {
                if !self
                    .store
                    .verify_admin_password(username, &input.current_password)
                    .await?
                {
                    return Err(AuthError::Validation(
                        "Current password is incorrect".to_string(),
                    ));
                }
                self.store
                    .update_admin_password(username, &input.new_password, &security)
                    .await?;
            }
            Actor::Student { roll_number, .. } => {
                if !self
                    .store
                    .verify_user_password(roll_number, &input.current_password)
                    .await?
                {
                    return Err(AuthError::Validation(
                        "Current password is incorrect".to_string(),
                    ));
                }
                self.store
                    .update_user_password(roll_number, &input.new_password, &security)
                    .await?;
            }
        }

        info!("Password changed for {actor}");
        Ok(())
    }

    async fn get_api_key(&self, actor: &Actor) -> Result<String, AuthError> {
        match actor {
            Actor::Admin { username } => self
                .store
                .get_admin(username)
                .await?
                .map(|a| a.api_key)
                .ok_or_else(|| AuthError::NotFound("Admin".to_string())),
            Actor::Student { roll_number, .. } => self
                .store
                .get_user(roll_number)
                .await?
                .map(|u| u.api_key)
                .ok_or_else(|| AuthError::NotFound("User".to_string())),
        }
    }

    async fn regenerate_api_key(&self, actor: &Actor) -> Result<String, AuthError> {
        let key = match actor {
            Actor::Admin { username } => self.store.regenerate_admin_api_key(username).await?,
            Actor::Student { roll_number, .. } => {
                self.store.regenerate_user_api_key(roll_number).await?
            }
        };

        info!("API key regenerated for {actor}");
        Ok(key)
    }

    async fn list_users(&self, actor: &Actor) -> Result<Vec<users::Model>, AuthError> {
        Self::require_admin(actor)?;
        Ok(self.store.list_users().await?)
    }

    async fn list_authorized(
        &self,
        actor: &Actor,
    ) -> Result<Vec<authorized_students::Model>, AuthError> {
        Self::require_admin(actor)?;
        Ok(self.store.list_authorized_students().await?)
    }

    async fn replace_authorized(
        &self,
        actor: &Actor,
        entries: Vec<AuthorizedStudentInput>,
    ) -> Result<usize, AuthError> {
        Self::require_admin(actor)?;

        if entries.len() > MAX_AUTHORIZED_BATCH {
            return Err(AuthError::Validation(format!(
                "At most {MAX_AUTHORIZED_BATCH} students can be uploaded at once"
            )));
        }

        let mut seen = HashSet::with_capacity(entries.len());
        let mut cleaned = Vec::with_capacity(entries.len());

        for (index, entry) in entries.into_iter().enumerate() {
            let roll_number = normalize_roll_number(&entry.roll_number);
            let name = entry.name.trim().to_string();

            if roll_number.is_empty() || name.is_empty() {
                return Err(AuthError::Validation(format!(
                    "Entry {} is missing a roll number or name",
                    index + 1
                )));
            }
            // First occurrence of a roll number wins.
            if seen.insert(roll_number.clone()) {
                cleaned.push(AuthorizedEntry { roll_number, name });
            }
        }

        let count = self.store.replace_authorized_students(cleaned).await?;

        info!("{actor} replaced the authorized student list ({count} entries)");
        let _ = self
            .event_bus
            .send(LendingEvent::AuthorizedStudentsReplaced { count });
        Ok(count)
    }
}
