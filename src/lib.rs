pub mod app;
pub mod auth;
pub mod db;
pub mod errors;
pub mod models;
pub mod routes;
pub mod utils;

// Re-export commonly used items for tests
pub use app::{create_app, create_app_with};
