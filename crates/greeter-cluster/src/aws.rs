//! AWS-backed inventory: classic ELB for registrations, EC2 for addresses.

use async_trait::async_trait;
use aws_sdk_ec2::config::Region;
use aws_sdk_ec2::error::DisplayErrorContext;
use aws_sdk_ec2::types::Reservation;
use aws_sdk_elasticloadbalancing::types::LoadBalancerDescription;
use tracing::{debug, warn};

use crate::discovery::{DiscoveryError, DiscoveryResult, Inventory};

/// SDK clients for one region, built once and reused for every lookup.
#[derive(Clone, Debug)]
pub struct AwsInventory {
    elb: aws_sdk_elasticloadbalancing::Client,
    ec2: aws_sdk_ec2::Client,
}

impl AwsInventory {
    /// Load credentials from the default provider chain for `region`.
    pub async fn for_region(region: &str) -> Self {
        let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .load()
            .await;
        debug!(%region, "aws clients configured");
        Self::new(&sdk_config)
    }

    pub fn new(sdk_config: &aws_config::SdkConfig) -> Self {
        Self {
            elb: aws_sdk_elasticloadbalancing::Client::new(sdk_config),
            ec2: aws_sdk_ec2::Client::new(sdk_config),
        }
    }
}

#[async_trait]
impl Inventory for AwsInventory {
    async fn registered_instances(&self, load_balancer: &str) -> DiscoveryResult<Vec<String>> {
        let output = self
            .elb
            .describe_load_balancers()
            .load_balancer_names(load_balancer)
            .send()
            .await
            .map_err(|e| DiscoveryError::LoadBalancer(DisplayErrorContext(&e).to_string()))?;

        let description = output
            .load_balancer_descriptions()
            .first()
            .ok_or_else(|| DiscoveryError::LoadBalancerNotFound(load_balancer.to_string()))?;
        Ok(registered_instance_ids(description))
    }

    async fn private_addresses(&self, instance_ids: &[String]) -> DiscoveryResult<Vec<String>> {
        let output = self
            .ec2
            .describe_instances()
            .set_instance_ids(Some(instance_ids.to_vec()))
            .send()
            .await
            .map_err(|e| DiscoveryError::Inventory(DisplayErrorContext(&e).to_string()))?;
        Ok(flatten_private_addresses(output.reservations()))
    }
}

/// Instance ids attached to a load balancer, in the order listed.
pub fn registered_instance_ids(description: &LoadBalancerDescription) -> Vec<String> {
    description
        .instances()
        .iter()
        .filter_map(|instance| instance.instance_id().map(str::to_string))
        .collect()
}

/// Private addresses across all reservations, in response order.
pub fn flatten_private_addresses(reservations: &[Reservation]) -> Vec<String> {
    reservations
        .iter()
        .flat_map(|reservation| reservation.instances())
        .filter_map(|instance| match instance.private_ip_address() {
            Some(address) => Some(address.to_string()),
            None => {
                warn!(
                    instance_id = instance.instance_id().unwrap_or("?"),
                    "instance has no private address, skipping"
                );
                None
            }
        })
        .collect()
}
