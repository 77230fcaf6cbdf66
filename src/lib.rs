pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod kiosk;
pub mod meeting;
pub mod models;
pub mod scoring;
pub mod serial;
pub mod state;

pub use api::router;
pub use state::AppState;
