use crate::config::Config;
use crate::storage::StorageAdapter;
use crate::store::DictStore;
use std::sync::Arc;

/// Shared application state
///
/// Handlers receive the storage handle through this state instead of
/// constructing it themselves, so tests can inject in-memory or failing
/// backends.
#[derive(Clone)]
pub struct AppState {
    /// Dictionary operations over the shared document
    pub store: DictStore,
    /// Raw record operations against the same backend
    pub storage: Arc<dyn StorageAdapter>,
    pub config: Arc<Config>,
}
