//! Thin HTTP/SSE surface over the Session Manager and Persistence Gateway,
//! wrapping `axum` + `tower-http` over the engine. Request validation,
//! auth, and transport hardening are out of scope; this crate is carried
//! anyway as the ambient binding the rest of the workspace needs to be
//! runnable end to end.

pub mod error;
pub mod routes;
pub mod state;

pub use routes::router;
pub use state::AppState;
