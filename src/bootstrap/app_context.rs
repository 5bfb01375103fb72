use std::sync::Arc;

use mongodb::Database;

use crate::application::ports::delivery_notifier::DeliveryNotifier;
use crate::bootstrap::config::Config;
use crate::infrastructure::realtime::DeliverySocketHandler;

/// Shared state handed to every route factory and handler.
#[derive(Clone)]
pub struct AppContext {
    pub cfg: Config,
    services: Arc<AppServices>,
}

pub struct AppServices {
    db: Database,
    delivery_socket: Arc<DeliverySocketHandler>,
    delivery_notifier: Arc<dyn DeliveryNotifier>,
}

impl AppServices {
    pub fn new(db: Database, delivery_socket: Arc<DeliverySocketHandler>) -> Self {
        let delivery_notifier: Arc<dyn DeliveryNotifier> = delivery_socket.clone();
        Self {
            db,
            delivery_socket,
            delivery_notifier,
        }
    }
}

impl AppContext {
    pub fn new(cfg: Config, services: AppServices) -> Self {
        Self {
            cfg,
            services: Arc::new(services),
        }
    }

    pub fn db(&self) -> Database {
        self.services.db.clone()
    }

    pub fn delivery_socket(&self) -> Arc<DeliverySocketHandler> {
        self.services.delivery_socket.clone()
    }

    pub fn delivery_notifier(&self) -> Arc<dyn DeliveryNotifier> {
        self.services.delivery_notifier.clone()
    }
}
