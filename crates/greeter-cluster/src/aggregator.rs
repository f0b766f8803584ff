//! Cluster health aggregation.
//!
//! Queries every peer's `/health` endpoint concurrently, each bounded by
//! the peer timeout, and assembles the reports in discovery order.

use std::time::Duration;

use futures_util::future::join_all;
use thiserror::Error;
use tracing::{debug, warn};

use greeter_core::{ClusterHealth, GreeterConfig, NodeHealth, PeerFailure};
use greeter_health::client::{self, FetchError};

/// Path every node serves its own health report on.
pub const HEALTH_PATH: &str = "/health";

pub type AggregateResult<T> = Result<T, AggregateError>;

#[derive(Debug, Error)]
pub enum AggregateError {
    #[error("peer {address} health request failed: {source}")]
    Fetch {
        address: String,
        #[source]
        source: FetchError,
    },

    #[error("peer {address} returned an undecodable health report: {reason}")]
    Decode { address: String, reason: String },
}

impl AggregateError {
    /// The peer the error came from.
    pub fn address(&self) -> &str {
        match self {
            AggregateError::Fetch { address, .. } | AggregateError::Decode { address, .. } => {
                address
            }
        }
    }
}

/// What to do when some peers fail.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AggregationPolicy {
    /// Fail the whole report with the first failed peer in discovery order.
    #[default]
    AllOrNothing,
    /// Report healthy peers and list the failed ones.
    Partial,
}

#[derive(Debug, Clone)]
pub struct ClusterAggregator {
    timeout: Duration,
    policy: AggregationPolicy,
}

impl ClusterAggregator {
    pub fn new(timeout: Duration, policy: AggregationPolicy) -> Self {
        Self { timeout, policy }
    }

    pub fn from_config(config: &GreeterConfig) -> Self {
        let policy = if config.cluster.partial_results {
            AggregationPolicy::Partial
        } else {
            AggregationPolicy::AllOrNothing
        };
        Self::new(config.peer_timeout(), policy)
    }

    pub fn policy(&self) -> AggregationPolicy {
        self.policy
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Collect one health report per peer address, in `peers` order.
    pub async fn aggregate(&self, peers: &[String]) -> AggregateResult<ClusterHealth> {
        let results = join_all(peers.iter().map(|address| query_peer(address, self.timeout))).await;

        let mut cluster = ClusterHealth::default();
        for result in results {
            match result {
                Ok(health) => cluster.node_healths.push(health),
                Err(e) => match self.policy {
                    AggregationPolicy::AllOrNothing => return Err(e),
                    AggregationPolicy::Partial => {
                        warn!(address = %e.address(), error = %e, "peer left out of cluster health");
                        cluster.failures.push(PeerFailure {
                            address: e.address().to_string(),
                            error: e.to_string(),
                        });
                    }
                },
            }
        }

        debug!(
            peers = peers.len(),
            healthy = cluster.node_healths.len(),
            failed = cluster.failures.len(),
            "cluster health aggregated"
        );
        Ok(cluster)
    }
}

/// Fetch and decode a single peer's health report.
pub async fn query_peer(address: &str, timeout: Duration) -> AggregateResult<NodeHealth> {
    let body = client::get(address, HEALTH_PATH, timeout)
        .await
        .map_err(|source| AggregateError::Fetch {
            address: address.to_string(),
            source,
        })?;
    serde_json::from_slice(&body).map_err(|e| AggregateError::Decode {
        address: address.to_string(),
        reason: e.to_string(),
    })
}
