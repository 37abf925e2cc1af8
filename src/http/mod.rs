//! HTTP API for the display layer
//!
//! This module exposes the supervisor to a UI:
//! - GET /state - transcript, listening flag, error, capability
//! - GET /messages - conversation log
//! - POST /listen/start - Start listening
//! - POST /listen/stop - Stop listening
//! - POST /listen/enabled - Enable or disable listening
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
