use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::config::AppConfig;
use crate::models::BusinessProfile;
use crate::services::engine::BookingEngine;
use crate::services::messaging::MessagingProvider;

pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub config: AppConfig,
    pub profile: BusinessProfile,
    pub engine: BookingEngine,
    pub messaging: Box<dyn MessagingProvider>,
}
