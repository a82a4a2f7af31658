//! API request handlers.

/// Clarifying question generation.
pub mod clarify;
/// Liveness endpoint.
pub mod health;
/// Research run handlers (blocking and streamed).
pub mod research;
