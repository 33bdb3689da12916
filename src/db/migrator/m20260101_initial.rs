use crate::entities::prelude::*;
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Schema;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Hash the default admin password using Argon2id
fn hash_default_password() -> Result<String, DbErr> {
    use argon2::{
        Argon2,
        password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
    };

    let password = b"password";
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password, &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| DbErr::Custom(format!("Failed to hash default password: {e}")))
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        let schema = Schema::new(backend);

        // Parents before children so foreign keys resolve.
        let tables = [
            schema.create_table_from_entity(Inventory),
            schema.create_table_from_entity(Users),
            schema.create_table_from_entity(Admins),
            schema.create_table_from_entity(AuthorizedStudents),
            schema.create_table_from_entity(Issues),
            schema.create_table_from_entity(ReturnRequests),
            schema.create_table_from_entity(TransferRequests),
            schema.create_table_from_entity(Notifications),
            schema.create_table_from_entity(HallEvents),
            schema.create_table_from_entity(EventRegistrations),
        ];

        for mut table in tables {
            manager
                .create_table(table.if_not_exists().to_owned())
                .await?;
        }

        let now = chrono::Utc::now().to_rfc3339();
        let password_hash = hash_default_password()?;

        let insert = sea_orm_migration::sea_query::Query::insert()
            .into_table(Admins)
            .columns([
                crate::entities::admins::Column::Username,
                crate::entities::admins::Column::PasswordHash,
                crate::entities::admins::Column::ApiKey,
                crate::entities::admins::Column::MustChangePassword,
                crate::entities::admins::Column::CreatedAt,
                crate::entities::admins::Column::UpdatedAt,
            ])
            .values_panic([
                crate::constants::auth::DEFAULT_ADMIN_USERNAME.into(),
                password_hash.into(),
                crate::constants::auth::DEFAULT_ADMIN_API_KEY.into(),
                true.into(),
                now.clone().into(),
                now.into(),
            ])
            .to_owned();

        manager.exec_stmt(insert).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(EventRegistrations).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(HallEvents).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Notifications).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(TransferRequests).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ReturnRequests).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Issues).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AuthorizedStudents).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Admins).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Inventory).to_owned())
            .await?;

        Ok(())
    }
}
