//! HTTP API server for driving interview sessions
//!
//! This module provides a REST API for a front end to control sessions:
//! - POST /sessions - Fetch a question set and start planning
//! - GET /sessions/:id - Query session status
//! - POST /sessions/:id/planning/finish - End planning early
//! - POST /sessions/:id/slots/:phase/:index/lock - Mark an answer done
//! - POST /sessions/:id/immediate/start - Speak the first immediate question
//! - POST /sessions/:id/finish - Submit the session log
//! - DELETE /sessions/:id - Leave without saving
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
