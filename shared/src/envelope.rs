use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use crate::types::NodeDescriptor;

/// ISO-8601 UTC with millisecond precision, e.g. "2024-05-01T12:00:00.000Z"
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Listing returned by the node's collection endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct Collection<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

/// Any listed resource; only the id matters for discovery.
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceRef {
    pub id: String,
}

/// `result` block of a configuration observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigResult {
    pub user: String,
    pub nodes: Vec<NodeDescriptor>,
    pub num_nodes: usize,
}

/// Body posted to a configuration datastream.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservationBody<'a> {
    pub phenomenon_time: &'a str,
    pub result: ConfigResultRef<'a>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigResultRef<'a> {
    pub user: &'a str,
    pub nodes: &'a [NodeDescriptor],
    pub num_nodes: usize,
}

/// Configuration observation as read back from a node.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigObservation {
    pub id: String,
    pub phenomenon_time: String,
    pub result: ConfigResult,
}

/// One snapshot of the dashboard configuration.
///
/// Envelopes are never edited; build a new one instead. `node_count` is derived
/// from `nodes` when an envelope is built locally and copied verbatim from the
/// wire when one is parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigEnvelope {
    timestamp: String,
    datastream_id: String,
    user: String,
    nodes: Vec<NodeDescriptor>,
    node_count: usize,
}

impl ConfigEnvelope {
    pub fn new(
        timestamp: impl Into<String>,
        datastream_id: impl Into<String>,
        user: impl Into<String>,
        nodes: Vec<NodeDescriptor>,
    ) -> Self {
        let node_count = nodes.len();
        Self {
            timestamp: timestamp.into(),
            datastream_id: datastream_id.into(),
            user: user.into(),
            nodes,
            node_count,
        }
    }

    /// Build from a fetched observation. The observation's own id takes the
    /// datastream id slot.
    pub fn from_observation(obs: ConfigObservation) -> Self {
        Self {
            timestamp: obs.phenomenon_time,
            datastream_id: obs.id,
            user: obs.result.user,
            nodes: obs.result.nodes,
            node_count: obs.result.num_nodes,
        }
    }

    /// Parse a raw observation record.
    pub fn from_json(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        let obs: ConfigObservation = serde_json::from_value(value)?;
        Ok(Self::from_observation(obs))
    }

    /// Wire body for submission to a configuration datastream.
    pub fn to_observation(&self) -> ObservationBody<'_> {
        ObservationBody {
            phenomenon_time: &self.timestamp,
            result: ConfigResultRef {
                user: &self.user,
                nodes: &self.nodes,
                num_nodes: self.node_count,
            },
        }
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn datastream_id(&self) -> &str {
        &self.datastream_id
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn nodes(&self) -> &[NodeDescriptor] {
        &self.nodes
    }

    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// False when a parsed envelope's advertised count disagrees with its list.
    pub fn is_consistent(&self) -> bool {
        self.node_count == self.nodes.len()
    }

    pub fn into_parts(self) -> (String, Vec<NodeDescriptor>) {
        (self.user, self.nodes)
    }
}
