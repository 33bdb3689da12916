use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    FromQueryResult, QueryFilter, QueryOrder, QuerySelect, Set, Statement,
};
use std::collections::HashMap;
use tracing::info;

use super::is_unique_violation;
use crate::domain;
use crate::entities::{event_registrations, hall_events, prelude::*};

#[derive(Debug, Clone)]
pub struct NewHallEvent {
    pub title: String,
    pub description: Option<String>,
    pub event_date: String,
    pub event_time: Option<String>,
    pub location: Option<String>,
    pub link: Option<String>,
    pub max_participants: Option<i32>,
}

#[derive(Debug)]
pub enum Registration {
    Registered(event_registrations::Model),
    EventNotFound,
    AlreadyRegistered,
    Full,
}

#[derive(Debug, FromQueryResult)]
struct RegistrationCount {
    event_id: i32,
    total: i64,
}

pub struct HallEventRepository {
    conn: DatabaseConnection,
}

impl HallEventRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Events ordered by date; `from_date` drops events before it.
    pub async fn list(&self, from_date: Option<&str>) -> Result<Vec<hall_events::Model>> {
        let mut query = HallEvents::find();

        if let Some(date) = from_date {
            query = query.filter(hall_events::Column::EventDate.gte(date));
        }

        query
            .order_by_asc(hall_events::Column::EventDate)
            .order_by_asc(hall_events::Column::EventTime)
            .all(&self.conn)
            .await
            .context("Failed to list hall events")
    }

    pub async fn get(&self, id: i32) -> Result<Option<hall_events::Model>> {
        HallEvents::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query hall event")
    }

    pub async fn create(&self, event: NewHallEvent) -> Result<hall_events::Model> {
        let now = domain::now();

        let model = hall_events::ActiveModel {
            title: Set(event.title),
            description: Set(event.description),
            event_date: Set(event.event_date),
            event_time: Set(event.event_time),
            location: Set(event.location),
            link: Set(event.link),
            max_participants: Set(event.max_participants),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.conn)
        .await
        .context("Failed to insert hall event")?;

        info!("Created hall event {} ({})", model.id, model.title);
        Ok(model)
    }

    /// Registrations are removed by the foreign key cascade.
    pub async fn delete(&self, id: i32) -> Result<bool> {
        let result = HallEvents::delete_by_id(id).exec(&self.conn).await?;
        Ok(result.rows_affected > 0)
    }

    pub async fn registration_counts(&self) -> Result<HashMap<i32, i64>> {
        let rows = EventRegistrations::find()
            .select_only()
            .column(event_registrations::Column::EventId)
            .column_as(event_registrations::Column::Id.count(), "total")
            .group_by(event_registrations::Column::EventId)
            .into_model::<RegistrationCount>()
            .all(&self.conn)
            .await?;

        Ok(rows.into_iter().map(|r| (r.event_id, r.total)).collect())
    }

    pub async fn registrations_of(&self, user_id: &str) -> Result<Vec<i32>> {
        let rows = EventRegistrations::find()
            .filter(event_registrations::Column::UserId.eq(user_id))
            .all(&self.conn)
            .await?;

        Ok(rows.into_iter().map(|r| r.event_id).collect())
    }

    /// Registers in one statement that also enforces the participant cap, so
    /// two concurrent registrations cannot overfill an event.
    pub async fn register(
        &self,
        event_id: i32,
        user_id: &str,
        user_name: &str,
    ) -> Result<Registration> {
        if self.get(event_id).await?.is_none() {
            return Ok(Registration::EventNotFound);
        }

        let existing = EventRegistrations::find()
            .filter(event_registrations::Column::EventId.eq(event_id))
            .filter(event_registrations::Column::UserId.eq(user_id))
            .one(&self.conn)
            .await?;
        if existing.is_some() {
            return Ok(Registration::AlreadyRegistered);
        }

        let backend = self.conn.get_database_backend();
        let stmt = Statement::from_sql_and_values(
            backend,
            r"INSERT INTO event_registrations (event_id, user_id, user_name, registered_at)
              SELECT e.id, ?, ?, ?
              FROM hall_events e
              WHERE e.id = ?
                AND (e.max_participants IS NULL
                     OR (SELECT COUNT(*) FROM event_registrations r WHERE r.event_id = e.id)
                        < e.max_participants)",
            [
                user_id.into(),
                user_name.into(),
                domain::now().into(),
                event_id.into(),
            ],
        );

        let result = match self.conn.execute(stmt).await {
            Ok(result) => result,
            Err(err) if is_unique_violation(&err) => return Ok(Registration::AlreadyRegistered),
            Err(err) => return Err(err).context("Failed to register for hall event"),
        };

        if result.rows_affected() == 0 {
            return Ok(Registration::Full);
        }

        let registration = EventRegistrations::find()
            .filter(event_registrations::Column::EventId.eq(event_id))
            .filter(event_registrations::Column::UserId.eq(user_id))
            .one(&self.conn)
            .await?
            .context("Registration missing after insert")?;

        info!("{user_id} registered for hall event {event_id}");
        Ok(Registration::Registered(registration))
    }
}
