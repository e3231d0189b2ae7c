use std::sync::Arc;
use chrono::Utc;
use tokio::sync::watch;
use shared::envelope::{format_timestamp, ConfigEnvelope};
use shared::protocol::{DATASTREAMS_PATH, OBSERVATIONS_PATH, UNKNOWN_USER};
use shared::types::NodeDescriptor;
use crate::discovery::DiscoveryClient;
use crate::outcome::{FailureReason, Outcome};
use crate::state_manager::DashboardState;
use crate::transport::Transport;

pub const SAVE_CONFIRMATION: &str = "OSCAR Configuration Saved";

/// Where a save run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SavePhase {
    Idle,
    Resolving,
    Submitting,
    Succeeded,
    Failed(FailureReason),
}

impl SavePhase {
    /// True while a run is in flight; the trigger should stay disabled.
    pub fn is_busy(self) -> bool {
        matches!(self, SavePhase::Resolving | SavePhase::Submitting)
    }
}

/// Writes the dashboard configuration to the default node's configuration
/// datastream.
pub struct SaveOrchestrator<T: ?Sized> {
    discovery: DiscoveryClient<T>,
    phase: watch::Sender<SavePhase>,
}

impl<T: Transport + ?Sized> SaveOrchestrator<T> {
    pub fn new(transport: Arc<T>) -> Self {
        let (phase, _) = watch::channel(SavePhase::Idle);
        Self {
            discovery: DiscoveryClient::new(transport),
            phase,
        }
    }

    pub fn phase(&self) -> SavePhase {
        *self.phase.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<SavePhase> {
        self.phase.subscribe()
    }

    /// Run one save against `state`'s default node.
    pub async fn save<S: DashboardState + ?Sized>(&self, state: &S) -> Outcome {
        let outcome = self.run(state).await;
        self.phase.send_replace(match &outcome {
            Outcome::Success(_) => SavePhase::Succeeded,
            Outcome::Failure(reason) => SavePhase::Failed(*reason),
        });
        outcome
    }

    async fn run<S: DashboardState + ?Sized>(&self, state: &S) -> Outcome {
        self.phase.send_replace(SavePhase::Resolving);

        let Some(node) = state.default_node().await else {
            tracing::info!("No default node configured, nothing to save to");
            return Outcome::Failure(FailureReason::NoSystemFound);
        };

        let resolved = match self.discovery.resolve(&node).await {
            Ok(resolved) => resolved,
            Err(e) => {
                tracing::error!("Configuration discovery failed: {}", e);
                return Outcome::Failure(FailureReason::TransportError);
            }
        };

        let Some(datastream_id) = resolved.datastream_id() else {
            let reason = if resolved.system_id().is_none() {
                FailureReason::NoSystemFound
            } else {
                FailureReason::NoDatastreamFound
            };
            tracing::info!("Not saving to {}: {}", node.base_url(node.secure), reason);
            return Outcome::Failure(reason);
        };

        let user = state
            .current_user()
            .await
            .unwrap_or_else(|| UNKNOWN_USER.to_string());
        let envelope = ConfigEnvelope::new(
            format_timestamp(Utc::now()),
            datastream_id,
            user,
            state.nodes().await,
        );

        self.phase.send_replace(SavePhase::Submitting);
        self.submit(&node, &envelope).await
    }

    async fn submit(&self, node: &NodeDescriptor, envelope: &ConfigEnvelope) -> Outcome {
        let url = format!(
            "{}{}/{}{}",
            node.config_endpoint(node.secure),
            DATASTREAMS_PATH,
            envelope.datastream_id(),
            OBSERVATIONS_PATH
        );

        let body = match serde_json::to_value(envelope.to_observation()) {
            Ok(body) => body,
            Err(e) => {
                tracing::error!("Failed to encode configuration observation: {}", e);
                return Outcome::Failure(FailureReason::TransportError);
            }
        };

        match self.discovery.transport().post_json(&url, &body, &node.auth).await {
            Ok(status) if (200..300).contains(&status) => {
                tracing::info!(
                    "Saved configuration with {} nodes to {}",
                    envelope.node_count(),
                    url
                );
                Outcome::Success(SAVE_CONFIRMATION.to_string())
            }
            Ok(status) => {
                tracing::error!("Configuration save to {} rejected with HTTP {}", url, status);
                Outcome::Failure(FailureReason::TransportError)
            }
            Err(e) => {
                tracing::error!("Configuration save failed: {}", e);
                Outcome::Failure(FailureReason::TransportError)
            }
        }
    }
}
