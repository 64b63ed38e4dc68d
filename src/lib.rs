pub mod actions;
pub mod api;
pub mod auth;
pub mod config;
pub mod events;
pub mod models;
pub mod views;

pub use api::{Api, ApiClient, ApiError};
pub use auth::{SessionManager, TokenStore};
pub use config::Config;
pub use events::{EventBus, TweetEvent};
