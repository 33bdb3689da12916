use anyhow::{Context, Result};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

use super::password::{generate_api_key, hash_password_blocking, verify_password_blocking};
use crate::config::SecurityConfig;
use crate::entities::admins;

/// Admin data returned from repository (without sensitive password hash)
#[derive(Debug, Clone)]
pub struct Admin {
    pub id: i32,
    pub username: String,
    pub api_key: String,
    pub must_change_password: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<admins::Model> for Admin {
    fn from(model: admins::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            api_key: model.api_key,
            must_change_password: model.must_change_password,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

pub struct AdminRepository {
    conn: DatabaseConnection,
}

impl AdminRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    async fn find_model(&self, username: &str) -> Result<Option<admins::Model>> {
        admins::Entity::find()
            .filter(admins::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query admin by username")
    }

    pub async fn get_by_username(&self, username: &str) -> Result<Option<Admin>> {
        Ok(self.find_model(username).await?.map(Admin::from))
    }

    pub async fn verify_password(&self, username: &str, password: &str) -> Result<bool> {
        let Some(admin) = self.find_model(username).await? else {
            return Ok(false);
        };

        verify_password_blocking(password, admin.password_hash).await
    }

    pub async fn update_password(
        &self,
        username: &str,
        new_password: &str,
        config: &SecurityConfig,
    ) -> Result<()> {
        let admin = self
            .find_model(username)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Admin not found: {username}"))?;

        let new_hash = hash_password_blocking(new_password, Some(config)).await?;
        let now = chrono::Utc::now().to_rfc3339();

        let mut active: admins::ActiveModel = admin.into();
        active.password_hash = Set(new_hash);
        active.must_change_password = Set(false);
        active.updated_at = Set(now);
        active.update(&self.conn).await?;

        Ok(())
    }

    /// Verify API key and return the associated admin
    pub async fn verify_api_key(&self, api_key: &str) -> Result<Option<Admin>> {
        let admin = admins::Entity::find()
            .filter(admins::Column::ApiKey.eq(api_key))
            .one(&self.conn)
            .await
            .context("Failed to query admin by API key")?;

        Ok(admin.map(Admin::from))
    }

    pub async fn regenerate_api_key(&self, username: &str) -> Result<String> {
        let admin = self
            .find_model(username)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Admin not found: {username}"))?;

        let new_api_key = generate_api_key();
        let now = chrono::Utc::now().to_rfc3339();

        let mut active: admins::ActiveModel = admin.into();
        active.api_key = Set(new_api_key.clone());
        active.updated_at = Set(now);
        active.update(&self.conn).await?;

        Ok(new_api_key)
    }
}
