use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use tracing::info;

use super::password::{generate_api_key, hash_password_blocking, verify_password_blocking};
use crate::config::SecurityConfig;
use crate::entities::{prelude::*, users};

/// Fields collected at sign-up. `roll_number` is expected to be normalized.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub roll_number: String,
    pub name: String,
    pub phone_number: String,
    pub room_number: String,
    pub password: String,
}

/// Repository for registered students.
pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create(&self, user: NewUser, config: &SecurityConfig) -> Result<users::Model> {
        let password_hash = hash_password_blocking(&user.password, Some(config)).await?;
        let now = chrono::Utc::now();

        let model = users::ActiveModel {
            roll_number: Set(user.roll_number),
            name: Set(user.name),
            phone_number: Set(user.phone_number),
            room_number: Set(user.room_number),
            password_hash: Set(password_hash),
            api_key: Set(generate_api_key()),
            registered_date: Set(now.date_naive().to_string()),
            created_at: Set(now.to_rfc3339()),
            ..Default::default()
        }
        .insert(&self.conn)
        .await?;

        info!("Registered student {}", model.roll_number);
        Ok(model)
    }

    pub async fn get_by_roll_number(&self, roll_number: &str) -> Result<Option<users::Model>> {
        Users::find()
            .filter(users::Column::RollNumber.eq(roll_number))
            .one(&self.conn)
            .await
            .context("Failed to query user by roll number")
    }

    pub async fn list(&self) -> Result<Vec<users::Model>> {
        Users::find()
            .order_by_desc(users::Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("Failed to list users")
    }

    pub async fn count(&self) -> Result<u64> {
        Ok(Users::find().count(&self.conn).await?)
    }

    pub async fn verify_password(&self, roll_number: &str, password: &str) -> Result<bool> {
        let Some(user) = self.get_by_roll_number(roll_number).await? else {
            return Ok(false);
        };

        verify_password_blocking(password, user.password_hash).await
    }

    pub async fn update_password(
        &self,
        roll_number: &str,
        new_password: &str,
        config: &SecurityConfig,
    ) -> Result<()> {
        let user = self
            .get_by_roll_number(roll_number)
            .await?
            .ok_or_else(|| anyhow::anyhow!("User not found: {roll_number}"))?;

        let new_hash = hash_password_blocking(new_password, Some(config)).await?;

        let mut active: users::ActiveModel = user.into();
        active.password_hash = Set(new_hash);
        active.update(&self.conn).await?;

        Ok(())
    }

    pub async fn verify_api_key(&self, api_key: &str) -> Result<Option<users::Model>> {
        Users::find()
            .filter(users::Column::ApiKey.eq(api_key))
            .one(&self.conn)
            .await
            .context("Failed to query user by API key")
    }

    pub async fn regenerate_api_key(&self, roll_number: &str) -> Result<String> {
        let user = self
            .get_by_roll_number(roll_number)
            .await?
            .ok_or_else(|| anyhow::anyhow!("User not found: {roll_number}"))?;

        let new_api_key = generate_api_key();

        let mut active: users::ActiveModel = user.into();
        active.api_key = Set(new_api_key.clone());
        active.update(&self.conn).await?;

        Ok(new_api_key)
    }
}
