//! JSON-file backed store: `mixes.json` + `moderation.json` in a data
//! directory.
//!
//! The blend collection is held in memory behind a `tokio::sync::RwLock`;
//! every mutation runs under the write lock, so read-modify-write cycles
//! are globally serialized. Files are replaced via write-temp-then-rename
//! so a crash mid-write never leaves a truncated file behind.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Blend, ModerationList, NewBlend};

use super::{BlendMutator, BlendStore};

const BLENDS_FILE: &str = "mixes.json";
const MODERATION_FILE: &str = "moderation.json";

pub struct JsonFileStore {
    blends_path: PathBuf,
    moderation_path: PathBuf,
    blends: RwLock<Vec<Blend>>,
}

impl JsonFileStore {
    /// Opens (and if needed creates) the data directory, loading any
    /// existing blend collection.
    pub async fn open(data_dir: impl AsRef<Path>) -> AppResult<Self> {
        let dir = data_dir.as_ref();
        tokio::fs::create_dir_all(dir).await?;

        let blends_path = dir.join(BLENDS_FILE);
        let blends = read_json_or_default::<Vec<Blend>>(&blends_path).await?;

        tracing::info!(
            path = %blends_path.display(),
            count = blends.len(),
            "opened file store"
        );

        Ok(Self {
            blends_path,
            moderation_path: dir.join(MODERATION_FILE),
            blends: RwLock::new(blends),
        })
    }

    async fn persist(&self, blends: &[Blend]) -> AppResult<()> {
        let bytes = serde_json::to_vec_pretty(blends)?;
        write_atomic(&self.blends_path, &bytes).await
    }
}

#[async_trait]
impl BlendStore for JsonFileStore {
    async fn load_all(&self) -> AppResult<Vec<Blend>> {
        Ok(self.blends.read().await.clone())
    }

    async fn append(&self, blend: NewBlend) -> AppResult<Blend> {
        let mut guard = self.blends.write().await;

        let blend = Blend {
            id: Uuid::new_v4(),
            title: blend.title,
            author: blend.author,
            components: blend.components,
            average_intensity: blend.average_intensity,
            like_count: 0,
            created_at: Utc::now(),
        };

        // Persist the next snapshot before exposing it; a failed write
        // leaves the in-memory state untouched.
        let mut next = guard.clone();
        next.push(blend.clone());
        self.persist(&next).await?;
        *guard = next;

        Ok(blend)
    }

    async fn update(&self, id: Uuid, mutate: BlendMutator) -> AppResult<Blend> {
        let mut guard = self.blends.write().await;

        let index = guard
            .iter()
            .position(|b| b.id == id)
            .ok_or_else(|| AppError::NotFound(format!("blend {id} not found")))?;

        let mut next = guard.clone();
        mutate(&mut next[index]);
        self.persist(&next).await?;
        let updated = next[index].clone();
        *guard = next;

        Ok(updated)
    }

    async fn load_moderation(&self) -> AppResult<ModerationList> {
        read_json_or_default(&self.moderation_path).await
    }

    async fn save_moderation(&self, list: &ModerationList) -> AppResult<()> {
        let bytes = serde_json::to_vec_pretty(list)?;
        write_atomic(&self.moderation_path, &bytes).await
    }
}

async fn read_json_or_default<T>(path: &Path) -> AppResult<T>
where
    T: serde::de::DeserializeOwned + Default,
{
    match tokio::fs::read(path).await {
        Ok(bytes) if bytes.is_empty() => Ok(T::default()),
        Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(T::default()),
        Err(e) => Err(e.into()),
    }
}

/// Writes to a sibling temp file, then renames over the target.
async fn write_atomic(path: &Path, bytes: &[u8]) -> AppResult<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    tokio::fs::write(&tmp, bytes).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FlavorComponent, SourceId};
    use crate::services::recommendation::apply_like_toggle;
    use std::sync::Arc;

    fn new_blend(title: &str) -> NewBlend {
        NewBlend {
            title: title.to_string(),
            author: "Guest".to_string(),
            components: vec![FlavorComponent {
                source_id: SourceId::new("alfakher", "mint"),
                display_name: "Mint".to_string(),
                taste_tags: "fresh, minty".to_string(),
                intensity: 2,
                percent: 100,
            }],
            average_intensity: 2,
        }
    }

    #[tokio::test]
    async fn append_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();

        {
            let store = JsonFileStore::open(dir.path()).await.unwrap();
            store.append(new_blend("Minty")).await.unwrap();
        }

        let store = JsonFileStore::open(dir.path()).await.unwrap();
        let blends = store.load_all().await.unwrap();
        assert_eq!(blends.len(), 1);
        assert_eq!(blends[0].title, "Minty");
        assert_eq!(blends[0].like_count, 0);
    }

    #[tokio::test]
    async fn load_all_preserves_submission_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path()).await.unwrap();
        store.append(new_blend("first")).await.unwrap();
        store.append(new_blend("second")).await.unwrap();
        store.append(new_blend("third")).await.unwrap();

        let titles: Vec<String> = store
            .load_all()
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.title)
            .collect();
        assert_eq!(titles, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn update_unknown_id_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path()).await.unwrap();
        let err = store
            .update(Uuid::new_v4(), Box::new(|_| {}))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn concurrent_likes_from_two_viewers_both_land() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(JsonFileStore::open(dir.path()).await.unwrap());
        let blend = store.append(new_blend("popular")).await.unwrap();

        let mut tasks = Vec::new();
        for _ in 0..2 {
            let store = Arc::clone(&store);
            let id = blend.id;
            tasks.push(tokio::spawn(async move {
                store
                    .update(id, Box::new(|b| apply_like_toggle(b, false)))
                    .await
                    .unwrap();
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let blends = store.load_all().await.unwrap();
        assert_eq!(blends[0].like_count, 2);
    }

    #[tokio::test]
    async fn moderation_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path()).await.unwrap();

        assert!(store.load_moderation().await.unwrap().is_empty());

        let list = ModerationList::from_words(["candy", "spam"]);
        store.save_moderation(&list).await.unwrap();
        assert_eq!(store.load_moderation().await.unwrap(), list);
    }
}
