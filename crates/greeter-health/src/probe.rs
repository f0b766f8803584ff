//! Host metrics probe.
//!
//! Reads local OS counters into a [`NodeHealth`]. Sampling is blocking
//! work, so it runs on tokio's blocking pool.

use std::sync::{Arc, Mutex};

use sysinfo::{Disks, System};
use thiserror::Error;
use tracing::{debug, warn};

use greeter_core::{GreeterConfig, NodeHealth};

use crate::metadata::{MetadataClient, MetadataError};

pub type ProbeResult<T> = Result<T, ProbeError>;

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("instance identity lookup failed: {0}")]
    Identity(#[from] MetadataError),

    #[error("host metrics are not supported on this platform")]
    Unsupported,

    #[error("{0} metrics unavailable")]
    Unavailable(&'static str),

    #[error("metrics sampler failed: {0}")]
    Sampler(String),
}

/// Where the instance id in a health report comes from.
#[derive(Debug, Clone)]
pub enum InstanceIdentity {
    /// Debug mode: a fixed placeholder, no network calls.
    Local,
    /// Deployed: ask the instance metadata endpoint.
    Metadata(MetadataClient),
}

impl InstanceIdentity {
    pub const LOCAL_ID: &'static str = "local";

    pub fn from_config(config: &GreeterConfig) -> Self {
        if config.cluster.debug {
            InstanceIdentity::Local
        } else {
            InstanceIdentity::Metadata(MetadataClient::from_config(config))
        }
    }

    pub async fn resolve(&self) -> ProbeResult<String> {
        match self {
            InstanceIdentity::Local => Ok(Self::LOCAL_ID.to_string()),
            InstanceIdentity::Metadata(client) => Ok(client.instance_id().await?),
        }
    }
}

/// Raw host numbers from one sampling pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HostSample {
    pub uptime_seconds: u64,
    pub cpu_percent: f64,
    pub disk_percent: f64,
    pub ram_used_bytes: u64,
    pub ram_available_bytes: u64,
}

/// Produces this node's health report.
///
/// Holds one long-lived sampler so that CPU utilization is measured
/// between consecutive probes rather than over a fixed window.
#[derive(Clone)]
pub struct HostProbe {
    identity: InstanceIdentity,
    sampler: Arc<Mutex<System>>,
}

impl HostProbe {
    pub fn new(identity: InstanceIdentity) -> Self {
        let mut system = System::new();
        // Baseline for the first CPU delta.
        system.refresh_cpu_usage();
        Self {
            identity,
            sampler: Arc::new(Mutex::new(system)),
        }
    }

    pub fn from_config(config: &GreeterConfig) -> Self {
        Self::new(InstanceIdentity::from_config(config))
    }

    /// Gather a full health report. Any failing sub-probe fails the report.
    pub async fn probe(&self) -> ProbeResult<NodeHealth> {
        let instance_id = self.identity.resolve().await?;

        let sampler = Arc::clone(&self.sampler);
        let sample = tokio::task::spawn_blocking(move || sample_host(&sampler))
            .await
            .map_err(|e| ProbeError::Sampler(e.to_string()))??;

        debug!(
            %instance_id,
            cpu = sample.cpu_percent,
            disk = sample.disk_percent,
            "host probed"
        );

        Ok(NodeHealth {
            instance_id,
            uptime_seconds: sample.uptime_seconds,
            cpu_percent: sample.cpu_percent,
            disk_percent: sample.disk_percent,
            ram_used_bytes: sample.ram_used_bytes,
            ram_available_bytes: sample.ram_available_bytes,
        })
    }
}

fn sample_host(sampler: &Mutex<System>) -> ProbeResult<HostSample> {
    if !sysinfo::IS_SUPPORTED_SYSTEM {
        return Err(ProbeError::Unsupported);
    }

    let (cpu_percent, ram_used_bytes, ram_available_bytes) = {
        let mut system = sampler
            .lock()
            .map_err(|_| ProbeError::Sampler("sampler lock poisoned".to_string()))?;

        system.refresh_cpu_usage();
        if system.cpus().is_empty() {
            return Err(ProbeError::Unavailable("cpu"));
        }
        let cpu = f64::from(system.global_cpu_usage());

        system.refresh_memory();
        if system.total_memory() == 0 {
            return Err(ProbeError::Unavailable("memory"));
        }
        (cpu, system.used_memory(), system.available_memory())
    };

    let disks = Disks::new_with_refreshed_list();
    let disk_percent = sum_used_percent(
        disks
            .list()
            .iter()
            .map(|disk| (disk.total_space(), disk.available_space())),
    );
    if disks.list().is_empty() {
        warn!("no disks listed; reporting 0% disk utilization");
    }

    Ok(HostSample {
        uptime_seconds: System::uptime(),
        cpu_percent,
        disk_percent,
        ram_used_bytes,
        ram_available_bytes,
    })
}

/// Sum of used percent over `(total, available)` byte pairs.
///
/// A sum, not an average: two half-full partitions
/// report 100. Zero-capacity entries are skipped.
pub fn sum_used_percent<I>(partitions: I) -> f64
where
    I: IntoIterator<Item = (u64, u64)>,
{
    partitions
        .into_iter()
        .filter(|(total, _)| *total > 0)
        .map(|(total, available)| {
            let used = total.saturating_sub(available);
            used as f64 / total as f64 * 100.0
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    const GIB: u64 = 1024 * 1024 * 1024;

    #[test]
    fn disk_percent_is_a_sum_not_an_average() {
        let partitions = [(100 * GIB, 25 * GIB), (50 * GIB, 10 * GIB)];
        let total = sum_used_percent(partitions);
        assert!((total - 155.0).abs() < 1e-9, "got {total}");
    }

    #[test]
    fn disk_percent_can_exceed_one_hundred() {
        let partitions = [(10, 1), (10, 1), (10, 1)];
        assert!(sum_used_percent(partitions) > 100.0);
    }

    #[test]
    fn zero_capacity_partitions_are_skipped() {
        let partitions = [(0, 0), (100, 50)];
        assert_eq!(sum_used_percent(partitions), 50.0);
        assert_eq!(sum_used_percent(std::iter::empty()), 0.0);
    }

    #[test]
    fn available_above_total_counts_as_empty() {
        assert_eq!(sum_used_percent([(100, 150)]), 0.0);
    }

    #[tokio::test]
    async fn local_identity_is_placeholder() {
        let id = InstanceIdentity::Local.resolve().await.unwrap();
        assert_eq!(id, "local");
    }

    #[test]
    fn debug_config_selects_local_identity() {
        let mut config = GreeterConfig::default();
        config.cluster.debug = true;
        assert!(matches!(InstanceIdentity::from_config(&config), InstanceIdentity::Local));

        config.cluster.debug = false;
        assert!(matches!(
            InstanceIdentity::from_config(&config),
            InstanceIdentity::Metadata(_)
        ));
    }

    #[tokio::test]
    async fn local_probe_reports_placeholder_and_host_numbers() {
        if !sysinfo::IS_SUPPORTED_SYSTEM {
            return;
        }
        let probe = HostProbe::new(InstanceIdentity::Local);
        let health = probe.probe().await.unwrap();
        assert_eq!(health.instance_id, "local");
        assert!(health.cpu_percent >= 0.0);
        assert!(health.disk_percent >= 0.0);
        assert!(health.ram_used_bytes > 0);
    }

    #[tokio::test]
    async fn unreachable_metadata_fails_the_probe() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = MetadataClient::new(addr.to_string(), std::time::Duration::from_secs(1));
        let probe = HostProbe::new(InstanceIdentity::Metadata(client));
        let err = probe.probe().await.unwrap_err();
        assert!(matches!(err, ProbeError::Identity(_)));
    }
}
