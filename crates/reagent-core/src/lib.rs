//! Shared types and errors for the ReAct agent server.

pub mod error;
pub mod event;
pub mod session;

pub use error::{Error, Result};
pub use event::{Event, EventType, SessionRecord, SessionStatus};
pub use session::SessionKey;
