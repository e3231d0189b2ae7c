use std::sync::Arc;
use serde_json::Value;
use tokio::sync::watch;
use shared::envelope::{Collection, ConfigEnvelope};
use shared::protocol::{
    DATASTREAMS_PATH, OBSERVATIONS_PATH, QUERY_LIMIT, QUERY_RESULT_TIME, RESULT_TIME_LATEST,
};
use shared::types::NodeDescriptor;
use crate::discovery::DiscoveryClient;
use crate::outcome::{FailureReason, Outcome};
use crate::state_manager::DashboardState;
use crate::transport::Transport;

pub const LOAD_CONFIRMATION: &str = "OSCAR State Loaded";

/// Where a load run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPhase {
    Idle,
    Resolving,
    Fetching,
    Parsing,
    Succeeded,
    Failed(FailureReason),
}

impl LoadPhase {
    pub fn is_busy(self) -> bool {
        matches!(self, LoadPhase::Resolving | LoadPhase::Fetching | LoadPhase::Parsing)
    }
}

/// Restores the dashboard configuration from a node's latest configuration
/// observation. The target node need not be the one currently active.
pub struct LoadOrchestrator<T: ?Sized> {
    discovery: DiscoveryClient<T>,
    phase: watch::Sender<LoadPhase>,
}

impl<T: Transport + ?Sized> LoadOrchestrator<T> {
    pub fn new(transport: Arc<T>) -> Self {
        let (phase, _) = watch::channel(LoadPhase::Idle);
        Self {
            discovery: DiscoveryClient::new(transport),
            phase,
        }
    }

    pub fn phase(&self) -> LoadPhase {
        *self.phase.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<LoadPhase> {
        self.phase.subscribe()
    }

    /// Run one load from `target`, applying the result to `state` on success only.
    pub async fn load<S: DashboardState + ?Sized>(&self, target: &NodeDescriptor, state: &S) -> Outcome {
        let outcome = match self.fetch(target).await {
            Ok(envelope) => {
                let (user, nodes) = envelope.into_parts();
                state.set_current_user(user).await;
                state.set_nodes(nodes).await;
                Outcome::Success(LOAD_CONFIRMATION.to_string())
            }
            Err(reason) => Outcome::Failure(reason),
        };

        self.finish(outcome.failure());
        outcome
    }

    /// Resolve, fetch and parse the newest configuration on `target` without
    /// applying it. The phase ends terminal either way.
    pub async fn fetch_envelope(&self, target: &NodeDescriptor) -> Result<ConfigEnvelope, FailureReason> {
        let result = self.fetch(target).await;
        self.finish(result.as_ref().err().copied());
        result
    }

    fn finish(&self, failure: Option<FailureReason>) {
        self.phase.send_replace(match failure {
            None => LoadPhase::Succeeded,
            Some(reason) => LoadPhase::Failed(reason),
        });
    }

    async fn fetch(&self, target: &NodeDescriptor) -> Result<ConfigEnvelope, FailureReason> {
        self.phase.send_replace(LoadPhase::Resolving);

        let resolved = self.discovery.resolve(target).await.map_err(|e| {
            tracing::error!("Configuration discovery failed: {}", e);
            FailureReason::TransportError
        })?;

        let datastream_id = match (resolved.system_id(), resolved.datastream_id()) {
            (None, _) => return Err(FailureReason::NoSystemFound),
            (Some(_), None) => return Err(FailureReason::NoDatastreamFound),
            (Some(_), Some(datastream_id)) => datastream_id,
        };

        self.phase.send_replace(LoadPhase::Fetching);
        let latest = self.fetch_latest(target, datastream_id).await?;

        self.phase.send_replace(LoadPhase::Parsing);
        let envelope = ConfigEnvelope::from_json(latest).map_err(|e| {
            tracing::error!("Latest configuration on datastream {} is malformed: {}", datastream_id, e);
            FailureReason::ParseError
        })?;

        if !envelope.is_consistent() {
            tracing::warn!(
                "Configuration {} advertises {} nodes but lists {}",
                envelope.datastream_id(),
                envelope.node_count(),
                envelope.nodes().len()
            );
        }

        Ok(envelope)
    }

    async fn fetch_latest(&self, target: &NodeDescriptor, datastream_id: &str) -> Result<Value, FailureReason> {
        let url = format!(
            "{}{}/{}{}",
            target.api_endpoint(target.secure),
            DATASTREAMS_PATH,
            datastream_id,
            OBSERVATIONS_PATH
        );
        let query = [(QUERY_RESULT_TIME, RESULT_TIME_LATEST), (QUERY_LIMIT, "1")];

        let page = self
            .discovery
            .transport()
            .get_json(&url, &query, &target.auth)
            .await
            .map_err(|e| {
                tracing::error!("Failed to fetch latest configuration: {}", e);
                FailureReason::TransportError
            })?;

        let page: Collection<Value> = serde_json::from_value(page).map_err(|e| {
            tracing::error!("Observation page from {} is malformed: {}", url, e);
            FailureReason::ParseError
        })?;

        page.items.into_iter().next().ok_or_else(|| {
            tracing::info!("Configuration datastream {} has no observations yet", datastream_id);
            FailureReason::EmptyResult
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use shared::protocol::{CONFIG_OUTPUT_NAME, CONFIG_SYSTEM_UID, QUERY_OUTPUT_NAME, QUERY_UID};
    use crate::testing::MemoryState;
    use crate::transport::testing::{key, ScriptedTransport};

    const API: &str = "http://remote:8181/sensorhub/api";

    fn target() -> NodeDescriptor {
        NodeDescriptor {
            address: "remote".to_string(),
            port: 8181,
            ..NodeDescriptor::default()
        }
    }

    fn test_node(name: &str) -> NodeDescriptor {
        NodeDescriptor {
            name: name.to_string(),
            address: format!("{}.lanes.local", name.to_lowercase()),
            port: 8282,
            ..NodeDescriptor::default()
        }
    }

    fn observations_key() -> String {
        key(
            &format!("{}/datastreams/ds-9/observations", API),
            &[(QUERY_RESULT_TIME, RESULT_TIME_LATEST), (QUERY_LIMIT, "1")],
        )
    }

    fn resolving_transport() -> Arc<ScriptedTransport> {
        let transport = Arc::new(ScriptedTransport::new());
        transport
            .on_get(
                key(&format!("{}/systems", API), &[(QUERY_UID, CONFIG_SYSTEM_UID)]),
                json!({"items": [{"id": "sys-1"}]}),
            )
            .on_get(
                key(
                    &format!("{}/systems/sys-1/datastreams", API),
                    &[(QUERY_OUTPUT_NAME, CONFIG_OUTPUT_NAME)],
                ),
                json!({"items": [{"id": "ds-9"}]}),
            );
        transport
    }

    fn observation(user: &str, nodes: &[NodeDescriptor], num_nodes: usize) -> Value {
        json!({
            "id": "obs-42",
            "phenomenonTime": "2024-05-01T12:00:00.000Z",
            "result": { "user": user, "nodes": nodes, "numNodes": num_nodes }
        })
    }

    #[tokio::test]
    async fn test_load_replaces_state() {
        let transport = resolving_transport();
        let restored = vec![test_node("A"), test_node("B")];
        transport.on_get(observations_key(), json!({"items": [observation("supervisor", &restored, 2)]}));
        let state = MemoryState::new(Some("operator"), vec![test_node("C"), test_node("D"), test_node("E")]);

        let orchestrator = LoadOrchestrator::new(transport);
        let outcome = orchestrator.load(&target(), &state).await;

        assert_eq!(outcome, Outcome::Success(LOAD_CONFIRMATION.to_string()));
        assert_eq!(orchestrator.phase(), LoadPhase::Succeeded);
        let (user, nodes) = state.snapshot();
        assert_eq!(user.as_deref(), Some("supervisor"));
        assert_eq!(nodes, restored);
    }

    #[tokio::test]
    async fn test_envelope_fields() {
        let transport = resolving_transport();
        transport.on_get(observations_key(), json!({"items": [observation("supervisor", &[test_node("A")], 3)]}));

        let orchestrator = LoadOrchestrator::new(transport);
        let envelope = orchestrator.fetch_envelope(&target()).await.unwrap();

        assert_eq!(envelope.datastream_id(), "obs-42");
        assert_eq!(envelope.timestamp(), "2024-05-01T12:00:00.000Z");
        assert_eq!(envelope.node_count(), 3, "count is taken verbatim from the wire");
        assert_eq!(orchestrator.phase(), LoadPhase::Succeeded);
    }

    #[tokio::test]
    async fn test_fetch_envelope_failure_ends_phase() {
        let orchestrator = LoadOrchestrator::new(Arc::new(ScriptedTransport::new()));

        let result = orchestrator.fetch_envelope(&NodeDescriptor::default()).await;

        assert_eq!(result.unwrap_err(), FailureReason::TransportError);
        assert_eq!(orchestrator.phase(), LoadPhase::Failed(FailureReason::TransportError));
        assert!(!orchestrator.phase().is_busy());
    }

    #[tokio::test]
    async fn test_empty_datastream_leaves_state_untouched() {
        let transport = resolving_transport();
        transport.on_get(observations_key(), json!({"items": []}));
        let state = MemoryState::new(Some("operator"), vec![test_node("A")]);

        let orchestrator = LoadOrchestrator::new(transport);
        let outcome = orchestrator.load(&target(), &state).await;

        assert_eq!(outcome, Outcome::Failure(FailureReason::EmptyResult));
        assert_eq!(orchestrator.phase(), LoadPhase::Failed(FailureReason::EmptyResult));
        assert_eq!(state.write_count(), 0);
    }

    #[tokio::test]
    async fn test_no_system() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.on_get(
            key(&format!("{}/systems", API), &[(QUERY_UID, CONFIG_SYSTEM_UID)]),
            json!({"items": []}),
        );
        let state = MemoryState::new(Some("operator"), vec![test_node("A")]);

        let outcome = LoadOrchestrator::new(transport.clone()).load(&target(), &state).await;

        assert_eq!(outcome, Outcome::Failure(FailureReason::NoSystemFound));
        assert_eq!(state.write_count(), 0);
        assert_eq!(transport.get_log.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_no_datastream() {
        let transport = Arc::new(ScriptedTransport::new());
        transport
            .on_get(
                key(&format!("{}/systems", API), &[(QUERY_UID, CONFIG_SYSTEM_UID)]),
                json!({"items": [{"id": "sys-1"}]}),
            )
            .on_get(
                key(
                    &format!("{}/systems/sys-1/datastreams", API),
                    &[(QUERY_OUTPUT_NAME, CONFIG_OUTPUT_NAME)],
                ),
                json!({"items": []}),
            );
        let state = MemoryState::default();

        let outcome = LoadOrchestrator::new(transport).load(&target(), &state).await;

        assert_eq!(outcome, Outcome::Failure(FailureReason::NoDatastreamFound));
        assert_eq!(state.write_count(), 0);
    }

    #[tokio::test]
    async fn test_malformed_observation_is_parse_error() {
        let transport = resolving_transport();
        transport.on_get(
            observations_key(),
            json!({"items": [{"id": "obs-1", "phenomenonTime": "2024-05-01T12:00:00.000Z", "result": {"nodes": []}}]}),
        );
        let state = MemoryState::new(Some("operator"), vec![test_node("A")]);

        let outcome = LoadOrchestrator::new(transport).load(&target(), &state).await;

        assert_eq!(outcome, Outcome::Failure(FailureReason::ParseError));
        assert_eq!(state.write_count(), 0);
    }

    #[tokio::test]
    async fn test_fetch_failure_is_transport_error() {
        let transport = resolving_transport();
        transport.fail_get(observations_key(), 500);
        let state = MemoryState::default();

        let outcome = LoadOrchestrator::new(transport).load(&target(), &state).await;

        assert_eq!(outcome, Outcome::Failure(FailureReason::TransportError));
        assert_eq!(state.write_count(), 0);
    }
}
