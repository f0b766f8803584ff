//! Discovery followed by aggregation, as served on `/health/cluster`.

use thiserror::Error;
use tracing::debug;

use greeter_core::ClusterHealth;

use crate::aggregator::{AggregateError, ClusterAggregator};
use crate::discovery::{DiscoveryError, PeerDiscovery};

#[derive(Debug, Error)]
pub enum ClusterError {
    #[error("peer discovery failed: {0}")]
    Discovery(#[from] DiscoveryError),

    #[error(transparent)]
    Aggregate(#[from] AggregateError),
}

#[derive(Clone)]
pub struct ClusterReporter {
    discovery: PeerDiscovery,
    aggregator: ClusterAggregator,
}

impl ClusterReporter {
    pub fn new(discovery: PeerDiscovery, aggregator: ClusterAggregator) -> Self {
        Self {
            discovery,
            aggregator,
        }
    }

    pub async fn cluster_health(&self) -> Result<ClusterHealth, ClusterError> {
        let peers = self.discovery.discover().await?;
        debug!(peer_count = peers.len(), "querying peers");
        Ok(self.aggregator.aggregate(&peers).await?)
    }
}
