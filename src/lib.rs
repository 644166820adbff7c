//! Library crate for veto-session-back, exposing modules for binaries and integration tests.

/// Runtime configuration loaded from disk.
pub mod config;
mod dto;
mod error;
/// HTTP routes exposed by the server.
pub mod routes;
/// Use cases invoked by the routes.
pub mod services;
/// Shared in-memory session state.
pub mod state;
/// Token and playback providers.
pub mod upstream;
