//! Persistence for blends and the moderation word list.
//!
//! Two backends sit behind one trait: a JSON-file store (the default) and
//! a SQLite store. Both guarantee that `append` and `update` are applied
//! atomically and that concurrent updates to the same record serialize,
//! so no like toggle or submission is ever lost.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::config::{Config, StorageBackend};
use crate::error::AppResult;
use crate::models::{Blend, ModerationList, NewBlend};

pub mod file;
pub mod sqlite;

pub use file::JsonFileStore;
pub use sqlite::SqliteStore;

/// In-place mutation applied to one blend under the store's record lock
pub type BlendMutator = Box<dyn FnOnce(&mut Blend) + Send>;

#[async_trait]
pub trait BlendStore: Send + Sync {
    /// All persisted blends in submission order (ascending `created_at`).
    async fn load_all(&self) -> AppResult<Vec<Blend>>;

    /// Persists a finalized composition, assigning its id and timestamp.
    /// Either the whole append is durably applied or none of it is.
    async fn append(&self, blend: NewBlend) -> AppResult<Blend>;

    /// Read-modify-write on one blend, serialized against concurrent
    /// updates. `NotFound` when the id does not exist.
    async fn update(&self, id: Uuid, mutate: BlendMutator) -> AppResult<Blend>;

    async fn load_moderation(&self) -> AppResult<ModerationList>;

    async fn save_moderation(&self, list: &ModerationList) -> AppResult<()>;
}

/// Opens the backend selected by the configuration.
pub async fn open(config: &Config) -> AppResult<Arc<dyn BlendStore>> {
    match config.storage {
        StorageBackend::File => Ok(Arc::new(JsonFileStore::open(&config.data_dir).await?)),
        StorageBackend::Sqlite => Ok(Arc::new(SqliteStore::connect(&config.database_url).await?)),
    }
}
