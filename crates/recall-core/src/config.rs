//! Lightweight configuration loader and path helpers.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env vars
//! (nested keys separated by `__`, e.g. `APP_RETRIEVAL__CACHE_CAPACITY=50`).
//! Typed sections fall back to their defaults when absent.
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::new().merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment };
        config.validate()?;
        Ok(config)
    }

    /// Wrap an already assembled figment (tests, embedding applications).
    pub fn from_figment(figment: Figment) -> anyhow::Result<Self> {
        let config = Self { figment };
        config.validate()?;
        Ok(config)
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    /// Like [`Config::get`], but a missing section yields `T::default()`.
    pub fn section<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned + Default,
    {
        if self.figment.contains(key) { self.get(key) } else { Ok(T::default()) }
    }

    pub fn retrieval(&self) -> anyhow::Result<RetrievalConfig> { self.section("retrieval") }

    pub fn embedding(&self) -> anyhow::Result<EmbeddingConfig> { self.section("embedding") }

    pub fn data(&self) -> anyhow::Result<DataConfig> { self.section("data") }

    fn validate(&self) -> anyhow::Result<()> {
        self.retrieval()?.validate()?;
        self.embedding()?.validate()?;
        Ok(())
    }
}

/// Tuning knobs of the retrieval pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub lexical_top_n: usize,
    pub semantic_top_n: usize,
    pub rrf_k: u32,
    pub mmr_pool_size: usize,
    pub mmr_lambda: f32,
    pub default_top_k: usize,
    pub cache_capacity: usize,
    pub embed_timeout_ms: u64,
    /// Drop every cached result list after a document mutation.
    pub invalidate_cache_on_mutation: bool,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            lexical_top_n: 8,
            semantic_top_n: 8,
            rrf_k: 60,
            mmr_pool_size: 8,
            mmr_lambda: 0.7,
            default_top_k: 3,
            cache_capacity: 30,
            embed_timeout_ms: 2_000,
            invalidate_cache_on_mutation: true,
        }
    }
}

impl RetrievalConfig {
    pub fn embed_timeout(&self) -> Duration { Duration::from_millis(self.embed_timeout_ms) }

    pub fn validate(&self) -> Result<()> {
        if self.cache_capacity == 0 {
            return Err(Error::InvalidConfig("retrieval.cache_capacity must be at least 1".into()));
        }
        if self.mmr_pool_size == 0 {
            return Err(Error::InvalidConfig("retrieval.mmr_pool_size must be at least 1".into()));
        }
        if !(0.0..=1.0).contains(&self.mmr_lambda) {
            return Err(Error::InvalidConfig(format!("retrieval.mmr_lambda must be within [0, 1], got {}", self.mmr_lambda)));
        }
        if self.embed_timeout_ms == 0 {
            return Err(Error::InvalidConfig("retrieval.embed_timeout_ms must be positive".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Directory holding `config.json`, `tokenizer.json` and the weights.
    pub model_dir: Option<String>,
    pub max_len: usize,
    pub use_fake: bool,
    pub fake_dim: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self { model_dir: None, max_len: 256, use_fake: false, fake_dim: 384 }
    }
}

impl EmbeddingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_len == 0 {
            return Err(Error::InvalidConfig("embedding.max_len must be at least 1".into()));
        }
        if self.use_fake && self.fake_dim == 0 {
            return Err(Error::InvalidConfig("embedding.fake_dim must be at least 1".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// JSON knowledge file or a directory of `.txt` files.
    pub knowledge_path: String,
    /// Directory a relative `knowledge_path` is resolved against.
    pub base_dir: Option<String>,
}

impl Default for DataConfig {
    fn default() -> Self { Self { knowledge_path: "knowledge_base.json".to_string(), base_dir: None } }
}

impl DataConfig {
    /// Location of the knowledge base. Relative paths resolve against
    /// `base_dir` when set, otherwise against `cwd`.
    pub fn knowledge_file(&self, cwd: &Path) -> PathBuf {
        let base = self.base_dir.as_deref().map(expand_path).unwrap_or_else(|| cwd.to_path_buf());
        resolve_with_base(&base, &self.knowledge_path)
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
