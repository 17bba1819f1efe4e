pub mod app_state;
pub mod auction;
pub mod booking;
pub mod config;
pub mod database;
pub mod directory;
pub mod error;
pub mod handlers;
pub mod message_broker;
pub mod notification;
pub mod query;

pub use app_state::AppState;
pub use error::AppError;
