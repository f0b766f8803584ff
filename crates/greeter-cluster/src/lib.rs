//! greeter-cluster: cluster-wide health for the greeter service.
//!
//! # Architecture
//!
//! ```text
//! ClusterReporter::cluster_health()
//!   ├── PeerDiscovery::discover()
//!   │   ├── Local → [local_peer]
//!   │   └── Cloud → Inventory
//!   │       ├── registered_instances(load_balancer)
//!   │       └── private_addresses(instance_ids)
//!   └── ClusterAggregator::aggregate(peers)
//!       └── GET http://<peer>/health, all peers concurrently,
//!           each bounded by the peer timeout
//! ```
//!
//! Results keep discovery order. With the default all-or-nothing policy
//! a single failing peer fails the report; the partial policy lists
//! failed peers next to the healthy ones instead.

pub mod aggregator;
pub mod aws;
pub mod discovery;
pub mod reporter;

pub use aggregator::{AggregateError, AggregateResult, AggregationPolicy, ClusterAggregator};
pub use aws::AwsInventory;
pub use discovery::{DiscoveryError, DiscoveryResult, Inventory, PeerDiscovery};
pub use reporter::{ClusterError, ClusterReporter};
