use sea_orm::entity::prelude::*;
use serde::Serialize;

/// A registered student.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Stored upper-cased, see `domain::normalize_roll_number`.
    #[sea_orm(unique)]
    pub roll_number: String,

    pub name: String,

    pub phone_number: String,

    pub room_number: String,

    #[serde(skip_serializing)]
    pub password_hash: String,

    #[sea_orm(unique)]
    #[serde(skip_serializing)]
    pub api_key: String,

    pub registered_date: String,

    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
