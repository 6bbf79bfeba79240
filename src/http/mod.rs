//! HTTP control surface
//!
//! Thin axum layer over the session handle: start/stop/mode commands, state
//! snapshots, and the persisted recording list.

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
