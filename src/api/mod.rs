//! Roulette HTTP API
//!
//! Authentication and sessions live upstream; requests arrive with an
//! already-validated `player_id`.

pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod server;

pub use handlers::AppState;
pub use server::{build_app, ApiServer};
