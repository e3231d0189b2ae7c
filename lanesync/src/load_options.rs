use std::str::FromStr;
use anyhow::{bail, Context};
use shared::types::NodeDescriptor;

/// One edit to the load form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOptionUpdate {
    Address(String),
    Port(u16),
    PathRoot(String),
    ApiEndpoint(String),
    Username(String),
    Password(String),
}

impl FromStr for LoadOptionUpdate {
    type Err = anyhow::Error;

    /// Parse `key=value`; unknown keys are an error, never ignored.
    fn from_str(s: &str) -> anyhow::Result<Self> {
        let Some((key, value)) = s.split_once('=') else {
            bail!("expected key=value, got {:?}", s);
        };
        let value = value.to_string();

        let update = match key {
            "address" => LoadOptionUpdate::Address(value),
            "port" => LoadOptionUpdate::Port(
                value
                    .parse()
                    .with_context(|| format!("invalid port {:?}", value))?,
            ),
            "pathRoot" => LoadOptionUpdate::PathRoot(value),
            "apiEndpoint" => LoadOptionUpdate::ApiEndpoint(value),
            "username" => LoadOptionUpdate::Username(value),
            "password" => LoadOptionUpdate::Password(value),
            other => bail!("unknown load option {:?}", other),
        };

        Ok(update)
    }
}

/// Fields describing the node a load reads from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadOptions {
    node: NodeDescriptor,
}

impl LoadOptions {
    /// Start from an existing node, usually the dashboard's default one.
    pub fn from_node(node: &NodeDescriptor) -> Self {
        Self { node: node.clone() }
    }

    /// Returns a new set of options with `update` applied.
    pub fn apply(&self, update: LoadOptionUpdate) -> Self {
        let mut node = self.node.clone();
        match update {
            LoadOptionUpdate::Address(address) => node.address = address,
            LoadOptionUpdate::Port(port) => node.port = port,
            LoadOptionUpdate::PathRoot(path_root) => node.path_root = path_root,
            LoadOptionUpdate::ApiEndpoint(api_endpoint) => node.api_endpoint = api_endpoint,
            LoadOptionUpdate::Username(username) => node.auth.username = username,
            LoadOptionUpdate::Password(password) => node.auth.password = password,
        }
        Self { node }
    }

    /// Target node for a load.
    pub fn descriptor(&self) -> NodeDescriptor {
        self.node.clone()
    }
}
