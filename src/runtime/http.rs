use serde_json::{Map, Value};

use super::error::{Result, RuntimeError};
use super::state::{Controller, EntityState};
use crate::client::HomeAssistantClient;
use crate::config::ControllerConfig;

/// [`Controller`] backed by the REST API
#[derive(Debug, Clone)]
pub struct HttpController {
    client: HomeAssistantClient,
}

impl HttpController {
    pub fn new(config: &ControllerConfig) -> Result<Self> {
        Ok(HttpController {
            client: HomeAssistantClient::new(config)?,
        })
    }

    pub fn from_client(client: HomeAssistantClient) -> Self {
        HttpController { client }
    }
}

impl Controller for HttpController {
    fn fetch_state(&self, entity_id: &str) -> Result<EntityState> {
        let raw = self.client.fetch_state(entity_id)?;
        serde_json::from_value(raw).map_err(|e| RuntimeError::Controller {
            message: format!("malformed state for {entity_id}: {e}"),
        })
    }

    fn call_service(&self, domain: &str, service: &str, data: Map<String, Value>) -> Result<()> {
        self.client
            .call_service(domain, service, &Value::Object(data))
            .map_err(RuntimeError::from)
    }
}
