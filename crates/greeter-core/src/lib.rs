//! greeter-core: shared types and configuration for the greeter service.
//!
//! Everything that crosses a crate boundary lives here: the wire types
//! returned by the HTTP surface (and decoded again by peers), and the
//! layered `GreeterConfig` the daemon builds at startup.

pub mod config;
pub mod types;

pub use config::{ConfigError, GreeterConfig, StoreBackend, parse_duration, with_default_port};
pub use types::*;
