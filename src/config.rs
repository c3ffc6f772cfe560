use anyhow::{Context, Result};
use directories::ProjectDirs;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::infrastructure::embedding::parse_model_name;

const DEFAULT_CONFIG_FILE: &str = "rag_config.toml";
const CONFIG_PATH_ENV: &str = "RAG_CONFIG_PATH";

fn project_cache_dir() -> Option<PathBuf> {
    ProjectDirs::from("dev", "rag-mcp", "rag-mcp").map(|dirs| dirs.cache_dir().to_path_buf())
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Persistent Qdrant collection.
    Qdrant,
    /// Process-local store, lost on exit. Opts out of persistence; for tests and throwaway runs.
    Memory,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub qdrant_url: String,
    pub collection: String,
    /// Start a local Qdrant container through Docker when none is reachable.
    pub auto_start_qdrant: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Qdrant,
            qdrant_url: "http://localhost:6334".to_string(),
            collection: "documents".to_string(),
            auto_start_qdrant: true,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct EmbeddingConfig {
    pub model: String,
    /// Where fastembed keeps downloaded model files.
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
    pub max_concurrent: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "all-MiniLM-L6-v2".to_string(),
            cache_dir: project_cache_dir(),
            max_concurrent: 2,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct IngestConfig {
    pub staging_dir: PathBuf,
}

impl Default for IngestConfig {
    fn default() -> Self {
        let staging_dir = project_cache_dir()
            .map(|dir| dir.join("staging"))
            .unwrap_or_else(|| std::env::temp_dir().join("rag-mcp-staging"));
        Self { staging_dir }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct QueryConfig {
    pub default_top_k: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self { default_top_k: 5 }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct RagConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub query: QueryConfig,
}

/// Loads configuration from defaults, then the TOML file, then `RAG_*` env vars.
pub fn load_config() -> Result<RagConfig> {
    let config_path_env = std::env::var(CONFIG_PATH_ENV).ok();
    let config_path = config_path_env.clone().unwrap_or_else(|| DEFAULT_CONFIG_FILE.to_string());

    if let Some(ref env_path) = config_path_env {
        if !std::path::Path::new(env_path).exists() {
            return Err(anyhow::anyhow!("Config file not found at {}: {}", CONFIG_PATH_ENV, env_path));
        }
        log::info!("{} is set: {}", CONFIG_PATH_ENV, env_path);
    } else {
        log::info!("{} not set, falling back to default: {}", CONFIG_PATH_ENV, config_path);
    }

    let figment = Figment::new()
        .merge(Serialized::defaults(RagConfig::default()))
        .merge(Toml::file(&config_path))
        .merge(Env::prefixed("RAG_").ignore(&["CONFIG_PATH"]).split("__"));

    let config: RagConfig = figment.extract().context("Failed to extract RagConfig")?;
    validate_config(&config)?;
    Ok(config)
}

pub fn validate_config(config: &RagConfig) -> Result<()> {
    if config.store.collection.trim().is_empty() {
        return Err(anyhow::anyhow!("store.collection cannot be empty"));
    }
    if config.store.backend == StoreBackend::Qdrant && config.store.qdrant_url.trim().is_empty() {
        return Err(anyhow::anyhow!("store.qdrant_url cannot be empty"));
    }
    if config.embedding.max_concurrent == 0 {
        return Err(anyhow::anyhow!("embedding.max_concurrent must be greater than zero"));
    }
    if parse_model_name(&config.embedding.model).is_none() {
        return Err(anyhow::anyhow!("Unknown embedding model: {}", config.embedding.model));
    }
    if config.query.default_top_k == 0 {
        return Err(anyhow::anyhow!("query.default_top_k must be greater than zero"));
    }
    if config.ingest.staging_dir.as_os_str().is_empty() {
        return Err(anyhow::anyhow!("ingest.staging_dir cannot be empty"));
    }
    Ok(())
}
