//! greeter-health: node-level health reporting.
//!
//! Gathers the numbers behind `GET /health` and provides the outbound
//! HTTP plumbing the rest of the service uses to talk to peers and to
//! the instance metadata endpoint.
//!
//! # Architecture
//!
//! ```text
//! HostProbe::probe()
//!   ├── InstanceIdentity
//!   │   ├── Local → "local"
//!   │   └── Metadata → MetadataClient::instance_id() → client::get()
//!   └── spawn_blocking(sample_host)
//!       ├── CPU percent (delta since previous probe)
//!       ├── memory used / available
//!       ├── disk used percent, summed over partitions
//!       └── uptime
//! ```
//!
//! Every sub-probe must succeed; the first failure fails the whole
//! report with a [`ProbeError`].

pub mod client;
pub mod metadata;
pub mod probe;

pub use client::{FetchError, FetchResult};
pub use metadata::{MetadataClient, MetadataError};
pub use probe::{HostProbe, InstanceIdentity, ProbeError, ProbeResult};
