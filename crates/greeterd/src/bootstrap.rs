//! Region resolution at startup.

use tracing::{info, warn};

use greeter_core::GreeterConfig;
use greeter_core::config::DEFAULT_REGION;
use greeter_health::MetadataClient;

/// Region the cloud clients are built for.
///
/// An explicit region (config file or `AWS_REGION`) wins. Debug mode never
/// touches the metadata service. Otherwise the instance identity document
/// decides, and an unreachable metadata service falls back to the default.
pub async fn resolve_region(config: &GreeterConfig, metadata: &MetadataClient) -> String {
    if let Some(region) = &config.cluster.region {
        info!(%region, "region from configuration");
        return region.clone();
    }
    if config.cluster.debug {
        return DEFAULT_REGION.to_string();
    }
    match metadata.region().await {
        Ok(region) => {
            info!(%region, "region from instance identity document");
            region
        }
        Err(e) => {
            warn!(error = %e, fallback = DEFAULT_REGION, "could not read region from metadata");
            DEFAULT_REGION.to_string()
        }
    }
}
