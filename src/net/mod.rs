//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! ListenerFactory::build(ServiceContext)
//!     → ServiceListener::start (bind, serve)
//!     → ServiceListener::stop(deadline) (drain)
//!
//! Listener States:
//!     Stopped → Running → Draining → Stopped
//! ```

pub mod listener;

pub use listener::{
    ListenerError, ListenerFactory, ListenerState, ServiceContext, ServiceListener,
};
