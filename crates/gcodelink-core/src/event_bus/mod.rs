//! # Event Bus Module
//!
//! Provides the publish/subscribe hub each port session uses to reach its
//! observers.
//!
//! ## Overview
//!
//! - Publishers emit typed events without knowing subscribers
//! - Subscribers filter by [`EventCategory`] and receive events of interest
//! - Supports both synchronous handlers and async broadcast receivers
//!
//! ## Usage
//!
//! ```rust,ignore
//! use gcodelink_core::event_bus::{EventBus, EventCategory, EventFilter};
//!
//! let bus: EventBus<PortEvent> = EventBus::new();
//! let subscription = bus.subscribe(
//!     EventFilter::Categories(vec![EventCategory::Workflow]),
//!     |event| tracing::info!(?event, "workflow changed"),
//! );
//!
//! bus.publish(event);
//! bus.unsubscribe(subscription);
//! ```

mod bus;
mod events;

pub use bus::*;
pub use events::*;
