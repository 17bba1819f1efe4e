/// 핸들러와 엔진이 공유하는 상태
// region:    --- Imports
use crate::config::{AuctionPolicy, BookingPolicy};
use crate::database::DatabaseManager;
use crate::directory::UserDirectory;
use crate::notification::Notifier;
use std::sync::Arc;
// endregion: --- Imports

#[derive(Clone)]
pub struct AppState {
    pub db_manager: Arc<DatabaseManager>,
    pub directory: Arc<dyn UserDirectory>,
    pub notifier: Arc<dyn Notifier>,
    pub booking_policy: BookingPolicy,
    pub auction_policy: AuctionPolicy,
}
