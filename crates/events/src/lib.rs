//! `tinybus-events` — in-process publish/subscribe registry.
//!
//! Handlers subscribe to an event type (or to every type through the wildcard
//! slot); publishing an event synchronously invokes them in registration order.
//!
//! ```
//! use tinybus_events::Registry;
//!
//! let bus: Registry<&str, u32> = Registry::new();
//! let handler = bus.on("stock.adjusted", |qty| println!("adjusted by {qty}"));
//! bus.on_any(|event_type, qty| println!("{event_type}: {qty}"));
//!
//! bus.publish("stock.adjusted", 10);
//! bus.unsubscribe(&"stock.adjusted", Some(&handler));
//! ```

pub mod config;
pub mod error;
pub mod event;
pub mod handler;
pub mod map;
pub mod registry;
pub mod summary;

pub use config::{MissingHandlerPolicy, RegistryConfig};
pub use error::{RegistryError, RegistryResult};
pub use event::Event;
pub use handler::{Handler, WildcardHandler};
pub use map::{HandlerMap, SharedHandlerMap};
pub use registry::{Registry, RegistryBuilder, Unsubscribed};
pub use summary::{RegistrySummary, TypeSummary};
