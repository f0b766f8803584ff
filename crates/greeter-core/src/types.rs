//! Wire types shared by the greeter crates.
//!
//! Field names are part of the wire contract: a node's `/health` response
//! is decoded by every other node during cluster aggregation, so renaming
//! a field breaks mixed-version clusters.

use serde::{Deserialize, Serialize};

// ── Counts ─────────────────────────────────────────────────────────

/// A greeted name and how many times it has been greeted.
///
/// The count is the backing sorted set's score exactly as the store
/// renders it (a decimal string), not a parsed integer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameCount {
    pub name: String,
    pub count: String,
}

impl NameCount {
    pub fn new(name: impl Into<String>, count: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            count: count.into(),
        }
    }
}

/// Response body of `GET /counts`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountList {
    pub counts: Vec<NameCount>,
}

// ── Health ─────────────────────────────────────────────────────────

/// Point-in-time health of a single node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeHealth {
    /// Cloud instance id, or `"local"` in debug mode.
    #[serde(rename = "ec2_instance_id")]
    pub instance_id: String,
    /// Seconds since host boot.
    #[serde(rename = "uptime")]
    pub uptime_seconds: u64,
    #[serde(rename = "cpu_utilization_percent")]
    pub cpu_percent: f64,
    /// Sum of per-partition used percent. Exceeds 100 on multi-disk hosts.
    #[serde(rename = "disk_utilization_percent")]
    pub disk_percent: f64,
    #[serde(rename = "total_ram_bytes_used")]
    pub ram_used_bytes: u64,
    #[serde(rename = "total_ram_bytes_available")]
    pub ram_available_bytes: u64,
}

/// A peer that could not report its health.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerFailure {
    pub address: String,
    pub error: String,
}

/// Aggregate health of every discovered peer, in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterHealth {
    pub node_healths: Vec<NodeHealth>,
    /// Only populated when partial results are enabled.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<PeerFailure>,
}

impl ClusterHealth {
    /// True when every discovered peer reported.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_health() -> NodeHealth {
        NodeHealth {
            instance_id: "i-0abc".to_string(),
            uptime_seconds: 3600,
            cpu_percent: 12.5,
            disk_percent: 140.0,
            ram_used_bytes: 1024,
            ram_available_bytes: 2048,
        }
    }

    #[test]
    fn node_health_uses_wire_field_names() {
        let json = serde_json::to_value(sample_health()).unwrap();
        assert_eq!(json["ec2_instance_id"], "i-0abc");
        assert_eq!(json["uptime"], 3600);
        assert_eq!(json["cpu_utilization_percent"], 12.5);
        assert_eq!(json["disk_utilization_percent"], 140.0);
        assert_eq!(json["total_ram_bytes_used"], 1024);
        assert_eq!(json["total_ram_bytes_available"], 2048);
    }

    #[test]
    fn node_health_decodes_peer_payload() {
        let body = r#"{"ec2_instance_id":"local","uptime":10,"cpu_utilization_percent":0,
            "disk_utilization_percent":55.5,"total_ram_bytes_used":1,"total_ram_bytes_available":2}"#;
        let health: NodeHealth = serde_json::from_str(body).unwrap();
        assert_eq!(health.instance_id, "local");
        assert_eq!(health.disk_percent, 55.5);
    }

    #[test]
    fn count_list_serializes_counts_as_strings() {
        let list = CountList {
            counts: vec![NameCount::new("Ada", "2")],
        };
        let json = serde_json::to_string(&list).unwrap();
        assert_eq!(json, r#"{"counts":[{"name":"Ada","count":"2"}]}"#);
    }

    #[test]
    fn empty_count_list_is_an_empty_array() {
        let json = serde_json::to_string(&CountList::default()).unwrap();
        assert_eq!(json, r#"{"counts":[]}"#);
    }

    #[test]
    fn complete_cluster_health_omits_failures() {
        let cluster = ClusterHealth {
            node_healths: vec![sample_health()],
            failures: Vec::new(),
        };
        let json = serde_json::to_value(&cluster).unwrap();
        assert!(json.get("failures").is_none());
        assert_eq!(json["node_healths"].as_array().unwrap().len(), 1);
        assert!(cluster.is_complete());
    }

    #[test]
    fn partial_cluster_health_lists_failures() {
        let cluster = ClusterHealth {
            node_healths: Vec::new(),
            failures: vec![PeerFailure {
                address: "10.0.0.7".to_string(),
                error: "timed out".to_string(),
            }],
        };
        let json = serde_json::to_value(&cluster).unwrap();
        assert_eq!(json["failures"][0]["address"], "10.0.0.7");
        assert!(!cluster.is_complete());
    }
}
