//! SQLite-backed store via `sqlx`.
//!
//! Components are stored as a JSON column; rows are keyed by the blend's
//! uuid. Updates run inside a transaction guarded by a process-local mutex,
//! which serializes read-modify-write cycles per store and sidesteps
//! SQLite's busy-on-upgrade behavior under concurrent writers.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Blend, FlavorComponent, ModerationList, NewBlend};

use super::{BlendMutator, BlendStore};

const BLENDS_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS blends (
    id                TEXT PRIMARY KEY,
    title             TEXT NOT NULL,
    author            TEXT NOT NULL,
    components        TEXT NOT NULL,
    average_intensity INTEGER NOT NULL,
    like_count        INTEGER NOT NULL DEFAULT 0,
    created_at        TEXT NOT NULL
)
"#;

const MODERATION_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS moderation_words (
    word TEXT PRIMARY KEY
)
"#;

type BlendRow = (String, String, String, String, i64, i64, String);

const SELECT_COLUMNS: &str =
    "id, title, author, components, average_intensity, like_count, created_at";

pub struct SqliteStore {
    pool: SqlitePool,
    write_lock: Mutex<()>,
}

impl SqliteStore {
    /// Connects to the database and creates the schema if missing.
    pub async fn connect(database_url: &str) -> AppResult<Self> {
        ensure_parent_dir(database_url).await?;
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;
        Self::with_pool(pool).await
    }

    /// Single-connection in-memory database, used by tests.
    pub async fn connect_in_memory() -> AppResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        Self::with_pool(pool).await
    }

    async fn with_pool(pool: SqlitePool) -> AppResult<Self> {
        sqlx::query(BLENDS_SCHEMA).execute(&pool).await?;
        sqlx::query(MODERATION_SCHEMA).execute(&pool).await?;
        Ok(Self {
            pool,
            write_lock: Mutex::new(()),
        })
    }
}

#[async_trait]
impl BlendStore for SqliteStore {
    async fn load_all(&self) -> AppResult<Vec<Blend>> {
        let rows: Vec<BlendRow> = sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS} FROM blends ORDER BY created_at ASC, rowid ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_blend).collect()
    }

    async fn append(&self, blend: NewBlend) -> AppResult<Blend> {
        let blend = Blend {
            id: Uuid::new_v4(),
            title: blend.title,
            author: blend.author,
            components: blend.components,
            average_intensity: blend.average_intensity,
            like_count: 0,
            created_at: Utc::now(),
        };

        sqlx::query(
            "INSERT INTO blends (id, title, author, components, average_intensity, like_count, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(blend.id.to_string())
        .bind(&blend.title)
        .bind(&blend.author)
        .bind(serde_json::to_string(&blend.components)?)
        .bind(blend.average_intensity as i64)
        .bind(blend.like_count as i64)
        .bind(blend.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(blend)
    }

    async fn update(&self, id: Uuid, mutate: BlendMutator) -> AppResult<Blend> {
        let _guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await?;

        let row: Option<BlendRow> = sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS} FROM blends WHERE id = ?"
        ))
        .bind(id.to_string())
        .fetch_optional(&mut *tx)
        .await?;

        let row = row.ok_or_else(|| AppError::NotFound(format!("blend {id} not found")))?;
        let mut blend = row_to_blend(row)?;
        mutate(&mut blend);

        sqlx::query(
            "UPDATE blends SET title = ?, author = ?, components = ?, \
             average_intensity = ?, like_count = ? WHERE id = ?",
        )
        .bind(&blend.title)
        .bind(&blend.author)
        .bind(serde_json::to_string(&blend.components)?)
        .bind(blend.average_intensity as i64)
        .bind(blend.like_count as i64)
        .bind(blend.id.to_string())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(blend)
    }

    async fn load_moderation(&self) -> AppResult<ModerationList> {
        let words: Vec<(String,)> = sqlx::query_as("SELECT word FROM moderation_words")
            .fetch_all(&self.pool)
            .await?;
        Ok(ModerationList::from_words(words.into_iter().map(|(w,)| w)))
    }

    async fn save_moderation(&self, list: &ModerationList) -> AppResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM moderation_words")
            .execute(&mut *tx)
            .await?;
        for word in list.words() {
            sqlx::query("INSERT INTO moderation_words (word) VALUES (?)")
                .bind(word)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }
}

/// `mode=rwc` creates the database file but not its directory.
async fn ensure_parent_dir(database_url: &str) -> AppResult<()> {
    if let Some(path) = database_url.strip_prefix("sqlite://") {
        let path = path.split('?').next().unwrap_or(path);
        if let Some(parent) = std::path::Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
    }
    Ok(())
}

fn row_to_blend(row: BlendRow) -> AppResult<Blend> {
    let (id, title, author, components, average_intensity, like_count, created_at) = row;

    let id = Uuid::parse_str(&id)
        .map_err(|e| AppError::Internal(format!("corrupt blend id {id}: {e}")))?;
    let components: Vec<FlavorComponent> = serde_json::from_str(&components)?;
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map_err(|e| AppError::Internal(format!("corrupt timestamp for blend {id}: {e}")))?
        .with_timezone(&Utc);

    Ok(Blend {
        id,
        title,
        author,
        components,
        average_intensity: average_intensity as u8,
        like_count: like_count.max(0) as u32,
        created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SourceId;
    use crate::services::recommendation::apply_like_toggle;

    fn new_blend(title: &str) -> NewBlend {
        NewBlend {
            title: title.to_string(),
            author: "Guest".to_string(),
            components: vec![FlavorComponent {
                source_id: SourceId::new("darkside", "pear"),
                display_name: "Pear".to_string(),
                taste_tags: "pear, juicy".to_string(),
                intensity: 5,
                percent: 100,
            }],
            average_intensity: 5,
        }
    }

    #[tokio::test]
    async fn append_assigns_id_and_round_trips() {
        let store = SqliteStore::connect_in_memory().await.unwrap();
        let created = store.append(new_blend("Pear Solo")).await.unwrap();

        let blends = store.load_all().await.unwrap();
        assert_eq!(blends.len(), 1);
        assert_eq!(blends[0].id, created.id);
        assert_eq!(blends[0].title, "Pear Solo");
        assert_eq!(blends[0].components[0].source_id, SourceId::new("darkside", "pear"));
    }

    #[tokio::test]
    async fn load_all_is_in_submission_order() {
        let store = SqliteStore::connect_in_memory().await.unwrap();
        store.append(new_blend("first")).await.unwrap();
        store.append(new_blend("second")).await.unwrap();

        let titles: Vec<String> = store
            .load_all()
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.title)
            .collect();
        assert_eq!(titles, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn update_applies_like_toggle_atomically() {
        let store = SqliteStore::connect_in_memory().await.unwrap();
        let blend = store.append(new_blend("liked")).await.unwrap();

        let updated = store
            .update(blend.id, Box::new(|b| apply_like_toggle(b, false)))
            .await
            .unwrap();
        assert_eq!(updated.like_count, 1);

        let updated = store
            .update(blend.id, Box::new(|b| apply_like_toggle(b, true)))
            .await
            .unwrap();
        assert_eq!(updated.like_count, 0);
    }

    #[tokio::test]
    async fn update_unknown_id_is_not_found() {
        let store = SqliteStore::connect_in_memory().await.unwrap();
        let err = store
            .update(Uuid::new_v4(), Box::new(|_| {}))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn moderation_round_trips() {
        let store = SqliteStore::connect_in_memory().await.unwrap();
        let list = ModerationList::from_words(["candy"]);
        store.save_moderation(&list).await.unwrap();
        assert_eq!(store.load_moderation().await.unwrap(), list);
    }
}
