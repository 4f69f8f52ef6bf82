//! # async_emitter - Promise-style Async Event Emitter
//!
//! This crate provides an event emitter whose every operation is async:
//!
//! - Named and symbol-keyed event types with ordered listener sequences
//! - `newListener`/`removeListener` meta-events awaited during (un)registration
//! - One-shot listeners consumed at the start of the next emission
//! - Emissions that resolve to the listeners' results, in registration order,
//!   passed through a configurable result filter
//! - The reserved `"error"` event, which fails when nobody listens to it
//!
//! ## Design Principles
//!
//! - **Runtime-Agnostic**: Plain futures, no executor or spawned tasks
//! - **Snapshot Emission**: Listeners may re-enter the dispatcher safely
//! - **Payload-Agnostic**: Arguments and results are opaque [`Payload`]s
//! - **Instance-Scoped**: Each [`Dispatcher`] owns its registry; no globals

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod event;
pub mod filter;
pub mod listener;
pub mod macros;

// Re-export commonly used types
pub use config::EmitterConfig;
pub use dispatcher::{Binding, Dispatcher, WeakDispatcher};
pub use error::{Error, Result, SharedError};
pub use event::{EventType, Payload, Symbol};
pub use filter::ResultFilter;
pub use listener::{Handler, Listener, ListenerResult};

// Re-export async_trait for Handler implementations
pub use async_trait::async_trait;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::EmitterConfig;
    pub use crate::dispatcher::{Dispatcher, WeakDispatcher};
    pub use crate::error::{Error, Result, SharedError};
    pub use crate::event::{EventType, Payload};
    pub use crate::filter::ResultFilter;
    pub use crate::listener::{Handler, Listener, ListenerResult};
    pub use crate::{args, emit};
}
