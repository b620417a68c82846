use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{Catalog, ModerationList};
use crate::storage::BlendStore;

/// Shared application state
///
/// Blends live in the store; the moderation list is loaded from the store
/// at startup and cached here. The per-viewer liked-id sets are
/// process-local by design and never persisted.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn BlendStore>,
    pub catalog: Arc<RwLock<Catalog>>,
    pub moderation: Arc<RwLock<ModerationList>>,
    pub likes: Arc<RwLock<HashMap<String, HashSet<Uuid>>>>,
}

impl AppState {
    /// Builds the state around an opened store, loading the persisted
    /// moderation list and seeding the catalog.
    pub async fn new(store: Arc<dyn BlendStore>) -> AppResult<Self> {
        let moderation = store.load_moderation().await?;
        Ok(Self {
            store,
            catalog: Arc::new(RwLock::new(Catalog::seeded())),
            moderation: Arc::new(RwLock::new(moderation)),
            likes: Arc::new(RwLock::new(HashMap::new())),
        })
    }
}
