use sea_orm::entity::prelude::*;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "event_registrations")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub event_id: i32,
    pub user_id: String,
    pub user_name: String,
    pub registered_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::hall_events::Entity",
        from = "Column::EventId",
        to = "super::hall_events::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    HallEvents,
}

impl Related<super::hall_events::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::HallEvents.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
