use std::sync::Arc;
use serde_json::Value;
use shared::envelope::{Collection, ResourceRef};
use shared::protocol::{
    CONFIG_OUTPUT_NAME, CONFIG_SYSTEM_UID, DATASTREAMS_PATH, QUERY_OUTPUT_NAME, QUERY_UID,
    SYSTEMS_PATH,
};
use shared::types::NodeDescriptor;
use crate::error::TransportError;
use crate::transport::Transport;

/// Identifiers resolved on a node. A datastream id only ever exists alongside
/// the system id it was looked up under.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveryResult {
    system_id: Option<String>,
    datastream_id: Option<String>,
}

impl DiscoveryResult {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn system_only(system_id: impl Into<String>) -> Self {
        Self {
            system_id: Some(system_id.into()),
            datastream_id: None,
        }
    }

    pub fn resolved(system_id: impl Into<String>, datastream_id: impl Into<String>) -> Self {
        Self {
            system_id: Some(system_id.into()),
            datastream_id: Some(datastream_id.into()),
        }
    }

    pub fn system_id(&self) -> Option<&str> {
        self.system_id.as_deref()
    }

    pub fn datastream_id(&self) -> Option<&str> {
        self.datastream_id.as_deref()
    }
}

/// Locates the configuration system and its datastream on a node.
///
/// Nothing is cached: every save and load resolves again, so a datastream
/// recreated between sessions is picked up.
pub struct DiscoveryClient<T: ?Sized> {
    transport: Arc<T>,
}

impl<T: ?Sized> Clone for DiscoveryClient<T> {
    fn clone(&self) -> Self {
        Self {
            transport: self.transport.clone(),
        }
    }
}

impl<T: Transport + ?Sized> DiscoveryClient<T> {
    pub fn new(transport: Arc<T>) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    /// Id of the node's configuration system, `None` if the node has none yet.
    pub async fn find_config_system_id(
        &self,
        node: &NodeDescriptor,
    ) -> Result<Option<String>, TransportError> {
        let url = format!("{}{}", node.api_endpoint(node.secure), SYSTEMS_PATH);
        let listing = self
            .transport
            .get_json(&url, &[(QUERY_UID, CONFIG_SYSTEM_UID)], &node.auth)
            .await?;

        first_id(&url, listing)
    }

    /// Id of the configuration datastream under an already resolved system.
    pub async fn find_config_datastream_id(
        &self,
        node: &NodeDescriptor,
        system_id: &str,
    ) -> Result<Option<String>, TransportError> {
        let url = format!(
            "{}{}/{}{}",
            node.api_endpoint(node.secure),
            SYSTEMS_PATH,
            system_id,
            DATASTREAMS_PATH
        );
        let listing = self
            .transport
            .get_json(&url, &[(QUERY_OUTPUT_NAME, CONFIG_OUTPUT_NAME)], &node.auth)
            .await?;

        first_id(&url, listing)
    }

    /// Resolve both identifiers, stopping at the first one that is missing.
    pub async fn resolve(&self, node: &NodeDescriptor) -> Result<DiscoveryResult, TransportError> {
        let Some(system_id) = self.find_config_system_id(node).await? else {
            tracing::info!("No configuration system on {}", node.base_url(node.secure));
            return Ok(DiscoveryResult::none());
        };

        match self.find_config_datastream_id(node, &system_id).await? {
            Some(datastream_id) => {
                tracing::debug!(
                    "Resolved configuration datastream {} under system {}",
                    datastream_id,
                    system_id
                );
                Ok(DiscoveryResult::resolved(system_id, datastream_id))
            }
            None => {
                tracing::info!("Configuration system {} has no datastream", system_id);
                Ok(DiscoveryResult::system_only(system_id))
            }
        }
    }
}

fn first_id(url: &str, listing: Value) -> Result<Option<String>, TransportError> {
    let listing: Collection<ResourceRef> =
        serde_json::from_value(listing).map_err(|source| TransportError::Decode {
            url: url.to_string(),
            source,
        })?;

    if listing.items.len() > 1 {
        tracing::warn!("{} listed {} matches, using the first", url, listing.items.len());
    }

    Ok(listing.items.into_iter().next().map(|item| item.id))
}
