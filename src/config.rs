use serde::Deserialize;

/// Which persistence backend to run against
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// JSON files under `data_dir` (the default)
    File,
    /// SQLite database at `database_url`
    Sqlite,
}

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Persistence backend selection
    #[serde(default = "default_storage")]
    pub storage: StorageBackend,

    /// Directory holding `mixes.json` and `moderation.json` (file backend)
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// SQLite connection URL (sqlite backend)
    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_storage() -> StorageBackend {
    StorageBackend::File
}

fn default_data_dir() -> String {
    "data".to_string()
}

fn default_database_url() -> String {
    "sqlite://data/mixer.db?mode=rwc".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }
}
