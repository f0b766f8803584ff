//! Peer discovery.
//!
//! In debug mode the cluster is just the configured local peer. Deployed,
//! peers are the instances currently registered with the load balancer,
//! resolved to private addresses through the cloud inventory.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info};

use greeter_core::GreeterConfig;

use crate::aws::AwsInventory;

pub type DiscoveryResult<T> = Result<T, DiscoveryError>;

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("load balancer {0:?} not found")]
    LoadBalancerNotFound(String),

    #[error("load balancer query failed: {0}")]
    LoadBalancer(String),

    #[error("instance inventory query failed: {0}")]
    Inventory(String),
}

/// The two cloud lookups discovery needs.
#[async_trait]
pub trait Inventory: Send + Sync {
    /// Instance ids registered with `load_balancer`, in provider order.
    async fn registered_instances(&self, load_balancer: &str) -> DiscoveryResult<Vec<String>>;

    /// Private addresses of `instance_ids`, in the provider's response order.
    async fn private_addresses(&self, instance_ids: &[String]) -> DiscoveryResult<Vec<String>>;
}

#[derive(Clone)]
pub enum PeerDiscovery {
    /// A single fixed peer, no external calls.
    Local { address: String },
    /// Peers behind a load balancer.
    Cloud {
        inventory: Arc<dyn Inventory>,
        load_balancer: String,
    },
}

impl PeerDiscovery {
    pub fn local(address: impl Into<String>) -> Self {
        PeerDiscovery::Local {
            address: address.into(),
        }
    }

    pub fn cloud(inventory: Arc<dyn Inventory>, load_balancer: impl Into<String>) -> Self {
        PeerDiscovery::Cloud {
            inventory,
            load_balancer: load_balancer.into(),
        }
    }

    /// Local discovery in debug mode, otherwise AWS clients for `region`.
    pub async fn from_config(config: &GreeterConfig, region: &str) -> Self {
        if config.cluster.debug {
            let address = config.local_peer_address();
            info!(peer = %address, "peer discovery: local");
            return Self::local(address);
        }
        let inventory = AwsInventory::for_region(region).await;
        info!(%region, load_balancer = %config.cluster.load_balancer, "peer discovery: load balancer");
        Self::cloud(Arc::new(inventory), config.cluster.load_balancer.clone())
    }

    /// Current peer addresses. Any failed lookup fails discovery.
    pub async fn discover(&self) -> DiscoveryResult<Vec<String>> {
        match self {
            PeerDiscovery::Local { address } => Ok(vec![address.clone()]),
            PeerDiscovery::Cloud {
                inventory,
                load_balancer,
            } => {
                let instance_ids = inventory.registered_instances(load_balancer).await?;
                if instance_ids.is_empty() {
                    // An empty id filter would list every instance in the account.
                    debug!(%load_balancer, "no instances registered");
                    return Ok(Vec::new());
                }
                let addresses = inventory.private_addresses(&instance_ids).await?;
                debug!(
                    %load_balancer,
                    instances = instance_ids.len(),
                    peers = addresses.len(),
                    "peers discovered"
                );
                Ok(addresses)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Canned inventory that records every lookup.
    #[derive(Default)]
    struct FakeInventory {
        instances: Vec<String>,
        addresses: Vec<String>,
        fail_load_balancer: bool,
        fail_inventory: bool,
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Inventory for FakeInventory {
        async fn registered_instances(&self, load_balancer: &str) -> DiscoveryResult<Vec<String>> {
            self.calls.lock().unwrap().push(format!("lb:{load_balancer}"));
            if self.fail_load_balancer {
                return Err(DiscoveryError::LoadBalancer("throttled".to_string()));
            }
            Ok(self.instances.clone())
        }

        async fn private_addresses(&self, instance_ids: &[String]) -> DiscoveryResult<Vec<String>> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("ec2:{}", instance_ids.join(",")));
            if self.fail_inventory {
                return Err(DiscoveryError::Inventory("denied".to_string()));
            }
            Ok(self.addresses.clone())
        }
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn local_mode_returns_single_peer() {
        let discovery = PeerDiscovery::local("localhost");
        assert_eq!(discovery.discover().await.unwrap(), vec!["localhost"]);
        assert_eq!(discovery.discover().await.unwrap(), vec!["localhost"]);
    }

    #[tokio::test]
    async fn cloud_mode_resolves_registered_instances() {
        let inventory = Arc::new(FakeInventory {
            instances: strings(&["i-b", "i-a"]),
            addresses: strings(&["10.0.0.2", "10.0.0.1"]),
            ..Default::default()
        });
        let discovery = PeerDiscovery::cloud(inventory.clone(), "hello-service-elb");

        let peers = discovery.discover().await.unwrap();
        assert_eq!(peers, vec!["10.0.0.2", "10.0.0.1"]);
        assert_eq!(
            *inventory.calls.lock().unwrap(),
            vec!["lb:hello-service-elb", "ec2:i-b,i-a"]
        );
    }

    #[tokio::test]
    async fn empty_load_balancer_skips_inventory_lookup() {
        let inventory = Arc::new(FakeInventory::default());
        let discovery = PeerDiscovery::cloud(inventory.clone(), "hello-service-elb");

        assert!(discovery.discover().await.unwrap().is_empty());
        assert_eq!(*inventory.calls.lock().unwrap(), vec!["lb:hello-service-elb"]);
    }

    #[tokio::test]
    async fn load_balancer_failure_aborts_discovery() {
        let inventory = Arc::new(FakeInventory {
            fail_load_balancer: true,
            ..Default::default()
        });
        let discovery = PeerDiscovery::cloud(inventory.clone(), "elb");

        let err = discovery.discover().await.unwrap_err();
        assert!(matches!(err, DiscoveryError::LoadBalancer(_)));
        assert_eq!(inventory.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn inventory_failure_returns_no_partial_list() {
        let inventory = Arc::new(FakeInventory {
            instances: strings(&["i-a"]),
            addresses: strings(&["10.0.0.1"]),
            fail_inventory: true,
            ..Default::default()
        });
        let discovery = PeerDiscovery::cloud(inventory, "elb");
        assert!(matches!(
            discovery.discover().await.unwrap_err(),
            DiscoveryError::Inventory(_)
        ));
    }

    #[tokio::test]
    async fn debug_config_builds_local_discovery() {
        let mut config = GreeterConfig::default();
        config.cluster.debug = true;
        config.cluster.local_peer = "127.0.0.1:8080".to_string();

        let discovery = PeerDiscovery::from_config(&config, "us-west-2").await;
        assert_eq!(discovery.discover().await.unwrap(), vec!["127.0.0.1:8080"]);
    }

    #[tokio::test]
    async fn debug_local_peer_targets_listen_port() {
        let mut config = GreeterConfig::default();
        config.cluster.debug = true;
        config.server.port = 8080;

        let discovery = PeerDiscovery::from_config(&config, "us-west-2").await;
        assert_eq!(discovery.discover().await.unwrap(), vec!["localhost:8080"]);
    }
}
