//! HTTP capability used by discovery and the save/load orchestrators

use async_trait::async_trait;
use serde_json::Value;
use shared::types::Auth;
use crate::error::TransportError;

/// `GET`/`POST` with JSON bodies against a node.
#[async_trait]
pub trait Transport: Send + Sync {
    /// GET `url` with the given query pairs. Non-2xx answers are errors.
    async fn get_json(
        &self,
        url: &str,
        query: &[(&str, &str)],
        auth: &Auth,
    ) -> Result<Value, TransportError>;

    /// POST a JSON body and return the response status code, whatever it is.
    async fn post_json(&self, url: &str, body: &Value, auth: &Auth) -> Result<u16, TransportError>;
}

/// Production transport backed by reqwest.
#[derive(Clone, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    fn authorize(builder: reqwest::RequestBuilder, auth: &Auth) -> reqwest::RequestBuilder {
        if auth.is_anonymous() {
            builder
        } else {
            builder.basic_auth(&auth.username, Some(&auth.password))
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get_json(
        &self,
        url: &str,
        query: &[(&str, &str)],
        auth: &Auth,
    ) -> Result<Value, TransportError> {
        let request = Self::authorize(self.client.get(url).query(query), auth);

        let response = request.send().await.map_err(|source| TransportError::Request {
            url: url.to_string(),
            source,
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|source| TransportError::Request {
            url: url.to_string(),
            source,
        })?;

        serde_json::from_slice(&body).map_err(|source| TransportError::Decode {
            url: url.to_string(),
            source,
        })
    }

    async fn post_json(&self, url: &str, body: &Value, auth: &Auth) -> Result<u16, TransportError> {
        let request = Self::authorize(self.client.post(url).json(body), auth);

        let response = request.send().await.map_err(|source| TransportError::Request {
            url: url.to_string(),
            source,
        })?;

        tracing::debug!("POST {} -> {}", url, response.status());
        Ok(response.status().as_u16())
    }
}
