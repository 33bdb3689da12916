use sea_orm::entity::prelude::*;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "notifications")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// `issue`, `return_request` or `transfer_request`
    #[serde(rename = "type")]
    pub kind: String,

    pub message: String,

    pub read: bool,

    /// Ids needed to resolve the referenced request.
    pub data: Option<Json>,

    /// Roll number of the addressee. `None` is the admin inbox.
    pub recipient: Option<String>,

    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
