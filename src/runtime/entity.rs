use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use super::decode;
use super::error::{Result, RuntimeError};
use super::state::{EntityState, SharedState};
use super::values::{ServiceData, Timestamp};

/// Identity of one entity plus the shared state it reads through
#[derive(Clone)]
pub struct EntityHandle {
    shared: Arc<SharedState>,
    entity_id: String,
}

impl EntityHandle {
    pub fn new(shared: Arc<SharedState>, entity_id: impl Into<String>) -> Self {
        EntityHandle {
            shared,
            entity_id: entity_id.into(),
        }
    }

    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }

    pub fn shared(&self) -> &SharedState {
        &self.shared
    }

    /// Repeatable-read snapshot of the entity
    pub fn snapshot(&self) -> Result<Arc<EntityState>> {
        self.shared.state(&self.entity_id)
    }
}

impl fmt::Debug for EntityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityHandle")
            .field("entity_id", &self.entity_id)
            .finish()
    }
}

/// Base of every generated entity type.
///
/// Generated traits build on these methods; only [`Entity::handle`] has to be
/// implemented.
pub trait Entity {
    fn handle(&self) -> &EntityHandle;

    fn entity_id(&self) -> &str {
        self.handle().entity_id()
    }

    /// Raw state value
    fn state_value(&self) -> Result<Value> {
        Ok(self.handle().snapshot()?.state.clone())
    }

    /// Raw attribute value; a missing attribute is an error.
    fn attribute_value(&self, attribute: &str) -> Result<Value> {
        self.handle()
            .snapshot()?
            .attributes
            .get(attribute)
            .cloned()
            .ok_or_else(|| RuntimeError::MissingAttribute {
                entity_id: self.entity_id().to_string(),
                attribute: attribute.to_string(),
            })
    }

    /// When the entity last changed state
    fn last_changed(&self) -> Result<Timestamp> {
        let snapshot = self.handle().snapshot()?;
        match &snapshot.last_changed {
            Some(at) => decode::timestamp(&Value::String(at.clone())),
            None => Err(RuntimeError::MissingAttribute {
                entity_id: self.entity_id().to_string(),
                attribute: "last_changed".to_string(),
            }),
        }
    }

    /// Untyped service call targeting this entity.
    ///
    /// `entity_id` is added to the payload.
    fn call(&self, domain: &str, service: &str, data: ServiceData) -> Result<()> {
        let mut payload = data.into_map();
        payload.insert("entity_id".to_string(), Value::String(self.entity_id().to_string()));
        tracing::debug!(entity_id = self.entity_id(), domain, service, "Calling service");
        self.handle().shared().controller().call_service(domain, service, payload)
    }
}

/// Domain-level access: entity handles and headless service calls
#[derive(Clone)]
pub struct Domain {
    shared: Arc<SharedState>,
    name: String,
}

impl Domain {
    pub fn new(shared: Arc<SharedState>, name: &str) -> Self {
        Domain {
            shared,
            name: name.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Handle for `<domain>.<entity_name>`
    pub fn entity_handle(&self, entity_name: &str) -> EntityHandle {
        EntityHandle::new(Arc::clone(&self.shared), format!("{}.{}", self.name, entity_name))
    }

    pub fn call(&self, service: &str, data: ServiceData) -> Result<()> {
        tracing::debug!(domain = %self.name, service, "Calling headless service");
        self.shared
            .controller()
            .call_service(&self.name, service, data.into_map())
    }
}

impl fmt::Debug for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Domain").field("name", &self.name).finish()
    }
}
