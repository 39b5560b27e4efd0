//! # REST Client
//!
//! Blocking client for the controller's REST API, authenticated with a bearer
//! token. Used by the generator to fetch the schema dump and by
//! [`crate::runtime::HttpController`] at run time.
//!
//! | Call              | Endpoint                               |
//! |-------------------|----------------------------------------|
//! | `fetch_states`    | `GET  /api/states`                     |
//! | `fetch_services`  | `GET  /api/services`                   |
//! | `fetch_state`     | `GET  /api/states/<entity_id>`         |
//! | `call_service`    | `POST /api/services/<domain>/<service>`|
//!
//! Any non-2xx response is an error; nothing is retried.

use reqwest::blocking::{Client, RequestBuilder};
use serde_json::Value;
use std::fmt;
use url::Url;

use crate::config::ControllerConfig;

/// Transport error talking to the controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// The request could not be built or sent
    Transport { url: String, message: String },
    /// The controller answered with a non-success status
    Status { url: String, status: u16 },
    /// The response body is not the expected JSON
    Decode { url: String, message: String },
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::Transport { url, message } => {
                write!(f, "Request to {url} failed: {message}")
            }
            ClientError::Status { url, status } => {
                write!(f, "Request to {url} returned HTTP {status}")
            }
            ClientError::Decode { url, message } => {
                write!(f, "Invalid response from {url}: {message}")
            }
        }
    }
}

impl std::error::Error for ClientError {}

/// Blocking REST client
#[derive(Debug, Clone)]
pub struct HomeAssistantClient {
    http: Client,
    api_url: Url,
    token: String,
}

impl HomeAssistantClient {
    pub fn new(config: &ControllerConfig) -> Result<Self, ClientError> {
        let http = Client::builder()
            .user_agent(concat!("hatyper/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ClientError::Transport {
                url: config.api_url().to_string(),
                message: e.to_string(),
            })?;
        Ok(HomeAssistantClient {
            http,
            api_url: config.api_url().clone(),
            token: config.token().to_string(),
        })
    }

    /// The full state list
    pub fn fetch_states(&self) -> Result<Value, ClientError> {
        self.get_json(&["states"])
    }

    /// The service registry
    pub fn fetch_services(&self) -> Result<Value, ClientError> {
        self.get_json(&["services"])
    }

    pub fn fetch_state(&self, entity_id: &str) -> Result<Value, ClientError> {
        self.get_json(&["states", entity_id])
    }

    pub fn call_service(
        &self,
        domain: &str,
        service: &str,
        data: &Value,
    ) -> Result<(), ClientError> {
        let url = self.endpoint(&["services", domain, service])?;
        tracing::debug!(%url, "POST");
        let request = self.http.post(url.clone()).json(data);
        self.send(request, &url).map(|_| ())
    }

    /// `<api>/<segments...>`, each segment percent-encoded
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.api_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::Transport {
                url: self.api_url.to_string(),
                message: "base URL cannot carry a path".to_string(),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn get_json(&self, segments: &[&str]) -> Result<Value, ClientError> {
        let url = self.endpoint(segments)?;
        tracing::debug!(%url, "GET");
        let response = self.send(self.http.get(url.clone()), &url)?;
        response.json::<Value>().map_err(|e| ClientError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    fn send(
        &self,
        request: RequestBuilder,
        url: &Url,
    ) -> Result<reqwest::blocking::Response, ClientError> {
        let response = request
            .bearer_auth(&self.token)
            .send()
            .map_err(|e| ClientError::Transport {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        let status = response.status();
        if !status.is_success() {
            tracing::warn!(%url, status = status.as_u16(), "Controller returned an error status");
            return Err(ClientError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> HomeAssistantClient {
        let config = ControllerConfig::new(Some("http://ha.local:8123/"), Some("t")).unwrap();
        HomeAssistantClient::new(&config).unwrap()
    }

    #[test]
    fn test_endpoints() {
        let client = client();
        assert_eq!(
            client.endpoint(&["states"]).unwrap().as_str(),
            "http://ha.local:8123/api/states"
        );
        assert_eq!(
            client.endpoint(&["states", "light.kitchen"]).unwrap().as_str(),
            "http://ha.local:8123/api/states/light.kitchen"
        );
        assert_eq!(
            client.endpoint(&["services", "light", "turn_on"]).unwrap().as_str(),
            "http://ha.local:8123/api/services/light/turn_on"
        );
    }

    #[test]
    fn test_segments_are_encoded() {
        let url = client().endpoint(&["states", "a/b"]).unwrap();
        assert_eq!(url.as_str(), "http://ha.local:8123/api/states/a%2Fb");
    }

    #[test]
    fn test_error_display() {
        let err = ClientError::Status {
            url: "http://ha/api/states".into(),
            status: 401,
        };
        assert_eq!(err.to_string(), "Request to http://ha/api/states returned HTTP 401");
    }
}
