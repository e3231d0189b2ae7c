use serde::{Deserialize, Serialize};

/// Credentials passed through to a node untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Auth {
    pub username: String,
    pub password: String,
}

impl Auth {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// True when no username was entered; requests then go out unauthenticated.
    pub fn is_anonymous(&self) -> bool {
        self.username.is_empty()
    }
}

/// A remote sensor-data node the dashboard is registered with.
///
/// This is the canonical node model used by the state store, the load form and
/// the configuration observations. Field names on the wire follow the node's
/// own client conventions so a stored node list round-trips losslessly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDescriptor {
    /// Friendly name shown in the dashboard
    #[serde(default)]
    pub name: String,

    /// Host name or IP address, e.g. "192.168.1.40"
    pub address: String,

    pub port: u16,

    /// Root path of the node's web services, e.g. "/sensorhub"
    #[serde(rename = "oshPathRoot")]
    pub path_root: String,

    /// Legacy SOS service path, e.g. "/sos"
    #[serde(default = "default_sos_endpoint")]
    pub sos_endpoint: String,

    /// Configuration service path, e.g. "/config"
    #[serde(rename = "configsEndpoint")]
    pub config_endpoint: String,

    /// Connected Systems API path, e.g. "/api"
    #[serde(rename = "csAPIEndpoint")]
    pub api_endpoint: String,

    #[serde(default)]
    pub auth: Auth,

    #[serde(rename = "isSecure", default)]
    pub secure: bool,

    #[serde(rename = "isDefaultNode", default)]
    pub is_default: bool,
}

fn default_sos_endpoint() -> String {
    "/sos".to_string()
}

impl Default for NodeDescriptor {
    fn default() -> Self {
        Self {
            name: String::new(),
            address: "localhost".to_string(),
            port: 0,
            path_root: "/sensorhub".to_string(),
            sos_endpoint: default_sos_endpoint(),
            config_endpoint: "/config".to_string(),
            api_endpoint: "/api".to_string(),
            auth: Auth::default(),
            secure: false,
            is_default: false,
        }
    }
}

impl NodeDescriptor {
    /// `scheme://address:port`, with the scheme picked by `secure`.
    pub fn base_url(&self, secure: bool) -> String {
        let scheme = if secure { "https" } else { "http" };
        format!("{}://{}:{}", scheme, self.address, self.port)
    }

    /// URL prefix of the node's configuration service.
    pub fn config_endpoint(&self, secure: bool) -> String {
        format!("{}{}{}", self.base_url(secure), self.path_root, self.config_endpoint)
    }

    /// URL prefix of the node's Connected Systems API.
    pub fn api_endpoint(&self, secure: bool) -> String {
        format!("{}{}{}", self.base_url(secure), self.path_root, self.api_endpoint)
    }

    pub fn sos_endpoint(&self, secure: bool) -> String {
        format!("{}{}{}", self.base_url(secure), self.path_root, self.sos_endpoint)
    }
}
