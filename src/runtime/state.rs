use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::error::Result;

/// One entity as reported by the controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityState {
    pub entity_id: String,
    pub state: Value,
    #[serde(default)]
    pub attributes: Map<String, Value>,
    #[serde(default)]
    pub last_changed: Option<String>,
}

/// Access to a live controller.
///
/// [`super::HttpController`] talks to the REST API; tests and embedders can
/// provide their own.
pub trait Controller: Send + Sync {
    fn fetch_state(&self, entity_id: &str) -> Result<EntityState>;

    /// `data` already carries `entity_id` for entity-scoped calls.
    fn call_service(&self, domain: &str, service: &str, data: Map<String, Value>) -> Result<()>;
}

/// State shared by every generated object of one `Entities` root.
///
/// Reads are repeatable: the first read of an entity is cached and returned
/// again until [`SharedState::clear_caches`] is called, so an event handler
/// sees one consistent snapshot per entity.
pub struct SharedState {
    controller: Arc<dyn Controller>,
    cache: Mutex<HashMap<String, Arc<EntityState>>>,
}

impl SharedState {
    pub fn new(controller: Arc<dyn Controller>) -> Self {
        SharedState {
            controller,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn controller(&self) -> &dyn Controller {
        self.controller.as_ref()
    }

    /// Cached snapshot of `entity_id`, fetched on first use.
    pub fn state(&self, entity_id: &str) -> Result<Arc<EntityState>> {
        if let Some(cached) = self.lock().get(entity_id) {
            return Ok(Arc::clone(cached));
        }
        let fetched = Arc::new(self.controller.fetch_state(entity_id)?);
        tracing::debug!(entity_id, "Fetched entity state");
        // The lock is not held across the fetch; a concurrent reader may have
        // cached first, and its snapshot wins.
        let mut cache = self.lock();
        Ok(Arc::clone(
            cache.entry(entity_id.to_string()).or_insert(fetched),
        ))
    }

    /// Record a state observed elsewhere (e.g. in a state-change event).
    pub fn prime(&self, state: EntityState) {
        self.lock().insert(state.entity_id.clone(), Arc::new(state));
    }

    /// Drop all snapshots. Call at the beginning of every event handler.
    pub fn clear_caches(&self) {
        self.lock().clear();
    }

    pub fn is_cached(&self, entity_id: &str) -> bool {
        self.lock().contains_key(entity_id)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<EntityState>>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for SharedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedState")
            .field("cached", &self.lock().len())
            .finish()
    }
}
