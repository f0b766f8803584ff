//! greeter-store: persistent greeting counters.
//!
//! Counts live in a single sorted set: the member is the greeted name and
//! the score is how many times it was greeted. `ZINCRBY` does the
//! increment atomically on the server, so concurrent requests need no
//! coordination on our side.
//!
//! The `CounterStore` handle is `Clone` + `Send` + `Sync`. It is created
//! once at startup and injected into every handler; the Redis backend
//! reconnects on its own after a dropped connection. An in-memory
//! backend with the same ordering rules exists for local runs and tests.

pub mod error;
pub mod memory;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use store::CounterStore;
