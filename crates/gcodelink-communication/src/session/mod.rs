//! Port sessions
//!
//! - [`port`]: the per-port task and its handle
//! - [`registry`]: the set of open ports
//! - [`events`]: what observers receive

pub mod events;
pub mod port;
pub mod registry;

pub use events::PortEvent;
pub use port::{PortHandle, PortSession, SessionConfig};
pub use registry::PortRegistry;
