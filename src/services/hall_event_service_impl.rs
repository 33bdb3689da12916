//! `SeaORM` implementation of the `HallEventService` trait.

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::info;

use crate::constants::limits::MAX_NAME_LENGTH;
use crate::db::{NewHallEvent, Registration, Store};
use crate::domain::events::LendingEvent;
use crate::domain::{self, Actor};
use crate::entities::{event_registrations, hall_events};
use crate::services::hall_event_service::{
    CreateHallEventInput, HallEventError, HallEventQuery, HallEventService, HallEventView,
};

pub struct SeaOrmHallEventService {
    store: Store,
    event_bus: broadcast::Sender<LendingEvent>,
}

impl SeaOrmHallEventService {
    #[must_use]
    pub const fn new(store: Store, event_bus: broadcast::Sender<LendingEvent>) -> Self {
        Self { store, event_bus }
    }

    fn require_admin(actor: &Actor) -> Result<(), HallEventError> {
        if actor.is_admin() {
            Ok(())
        } else {
            Err(HallEventError::Forbidden(
                "Only admins can manage hall events".to_string(),
            ))
        }
    }
}

#[async_trait]
impl HallEventService for SeaOrmHallEventService {
    async fn list(
        &self,
        viewer: &Actor,
        query: HallEventQuery,
    ) -> Result<Vec<HallEventView>, HallEventError> {
        let from_date = query.upcoming.then(domain::today);
        let events = self.store.list_hall_events(from_date.as_deref()).await?;
        let counts = self.store.hall_event_registration_counts().await?;
        let mine = match viewer.roll_number() {
            Some(roll) => self.store.hall_events_registered_by(roll).await?,
            None => Vec::new(),
        };

        Ok(events
            .into_iter()
            .map(|event| HallEventView {
                registrations: counts.get(&event.id).copied().unwrap_or(0),
                registered: mine.contains(&event.id),
                event,
            })
            .collect())
    }

    async fn create(
        &self,
        actor: &Actor,
        input: CreateHallEventInput,
    ) -> Result<hall_events::Model, HallEventError> {
        Self::require_admin(actor)?;

        let title = input.title.trim().to_string();
        if title.is_empty() {
            return Err(HallEventError::Validation("Title is required".to_string()));
        }
        if title.chars().count() > MAX_NAME_LENGTH {
            return Err(HallEventError::Validation(format!(
                "Title cannot exceed {MAX_NAME_LENGTH} characters"
            )));
        }

        // Stored zero-padded so text comparison orders by date.
        let event_date = chrono::NaiveDate::parse_from_str(input.event_date.trim(), "%Y-%m-%d")
            .map_err(|_| HallEventError::Validation("Event date must be YYYY-MM-DD".to_string()))?
            .format("%Y-%m-%d")
            .to_string();

        if let Some(max) = input.max_participants
            && max <= 0
        {
            return Err(HallEventError::Validation(
                "max_participants must be greater than zero".to_string(),
            ));
        }

        let event = self
            .store
            .create_hall_event(NewHallEvent {
                title,
                description: domain::clean_text(input.description),
                event_date,
                event_time: domain::clean_text(input.event_time),
                location: domain::clean_text(input.location),
                link: domain::clean_text(input.link),
                max_participants: input.max_participants,
            })
            .await?;

        let _ = self
            .event_bus
            .send(LendingEvent::HallEventChanged { event_id: event.id });
        Ok(event)
    }

    async fn delete(&self, actor: &Actor, id: i32) -> Result<(), HallEventError> {
        Self::require_admin(actor)?;

        if !self.store.delete_hall_event(id).await? {
            return Err(HallEventError::NotFound);
        }

        info!("{actor} deleted hall event {id}");
        let _ = self
            .event_bus
            .send(LendingEvent::HallEventChanged { event_id: id });
        Ok(())
    }

    async fn register(
        &self,
        actor: &Actor,
        id: i32,
    ) -> Result<event_registrations::Model, HallEventError> {
        let Actor::Student { roll_number, name } = actor else {
            return Err(HallEventError::Forbidden(
                "Only students can register for events".to_string(),
            ));
        };

        match self
            .store
            .register_for_hall_event(id, roll_number, name)
            .await?
        {
            Registration::Registered(registration) => {
                let _ = self
                    .event_bus
                    .send(LendingEvent::HallEventChanged { event_id: id });
                Ok(registration)
            }
            Registration::EventNotFound => Err(HallEventError::NotFound),
            Registration::AlreadyRegistered => {
                Err(HallEventError::Conflict("Already registered".to_string()))
            }
            Registration::Full => Err(HallEventError::Conflict("Event is full".to_string())),
        }
    }
}
