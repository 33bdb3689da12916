use std::sync::Arc;
use tokio::sync::{RwLock, broadcast};

use crate::config::Config;
use crate::db::Store;
use crate::domain::events::LendingEvent;
use crate::services::{
    AuthService, HallEventService, InventoryService, LendingService, NotificationService,
    SeaOrmAuthService, SeaOrmHallEventService, SeaOrmInventoryService, SeaOrmLendingService,
    SeaOrmNotificationService,
};

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,

    pub store: Store,

    pub event_bus: broadcast::Sender<LendingEvent>,

    pub auth_service: Arc<dyn AuthService>,

    pub inventory_service: Arc<dyn InventoryService>,

    pub lending_service: Arc<dyn LendingService>,

    pub notification_service: Arc<dyn NotificationService>,

    pub hall_event_service: Arc<dyn HallEventService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let (event_bus, _) = broadcast::channel(config.general.event_bus_buffer_size);
        Self::with_event_bus(config, event_bus).await
    }

    pub async fn with_event_bus(
        config: Config,
        event_bus: broadcast::Sender<LendingEvent>,
    ) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let config = Arc::new(RwLock::new(config));

        let auth_service = Arc::new(SeaOrmAuthService::new(
            store.clone(),
            config.clone(),
            event_bus.clone(),
        )) as Arc<dyn AuthService>;

        let inventory_service = Arc::new(SeaOrmInventoryService::new(
            store.clone(),
            event_bus.clone(),
        )) as Arc<dyn InventoryService>;

        let lending_service = Arc::new(SeaOrmLendingService::new(
            store.clone(),
            config.clone(),
            event_bus.clone(),
        )) as Arc<dyn LendingService>;

        let notification_service =
            Arc::new(SeaOrmNotificationService::new(store.clone())) as Arc<dyn NotificationService>;

        let hall_event_service = Arc::new(SeaOrmHallEventService::new(
            store.clone(),
            event_bus.clone(),
        )) as Arc<dyn HallEventService>;

        Ok(Self {
            config,
            store,
            event_bus,
            auth_service,
            inventory_service,
            lending_service,
            notification_service,
            hall_event_service,
        })
    }
}
