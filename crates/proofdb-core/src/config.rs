//! Lightweight configuration loader and path helpers.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env vars
//! (`__` separates nested keys, e.g. `APP_VECTOR__PATH`). Provides helpers to
//! expand `~` and `${VAR}` and to resolve relative paths against a known base
//! directory.
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::types::FusionParams;

pub struct Config {
    figment: Figment,
    base_dir: PathBuf,
}

impl Config {
    /// Load `config.toml` from the working directory.
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new("config.toml"))
    }

    /// Load from an explicit base file; the env-specific overlay is looked up
    /// next to it. A missing file is not an error, defaults apply.
    pub fn load_from(path: &Path) -> Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
        let base_dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);

        let mut figment = Figment::new().merge(Toml::file(path));
        let overlay = match env_name.as_str() {
            "dev" | "development" => Some("config.dev.toml"),
            "prod" | "production" => Some("config.prod.toml"),
            "test" | "testing" => Some("config.test.toml"),
            _ => None,
        };
        if let Some(name) = overlay {
            figment = figment.merge(Toml::file(base_dir.join(name)));
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        Ok(Self { figment, base_dir })
    }

    pub fn get<T>(&self, key: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| Error::InvalidConfig(format!("Failed to get '{key}': {e}")))
    }

    /// Typed settings with paths resolved against the config file's directory.
    pub fn settings(&self) -> Result<Settings> {
        let mut settings: Settings = self
            .figment
            .extract()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        settings.resolve_paths(&self.base_dir);
        settings.validate()?;
        Ok(settings)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub corpus: CorpusSettings,
    pub vector: VectorSettings,
    pub embedding: EmbeddingSettings,
    pub retrieval: RetrievalSettings,
    pub fusion: FusionParams,
}

impl Settings {
    fn resolve_paths(&mut self, base: &Path) {
        self.corpus.path = resolve_with_base(base, self.corpus.path.to_string_lossy());
        self.vector.path = resolve_with_base(base, self.vector.path.to_string_lossy());
        if let Some(dir) = &self.embedding.model_dir {
            self.embedding.model_dir = Some(resolve_with_base(base, dir.to_string_lossy()));
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.vector.collection.trim().is_empty() {
            return Err(Error::InvalidConfig("vector.collection must not be empty".into()));
        }
        if self.vector.batch_size == 0 {
            return Err(Error::InvalidConfig("vector.batch_size must be positive".into()));
        }
        if self.fusion.rrf_c.is_nan() || self.fusion.rrf_c < 0.0 {
            return Err(Error::InvalidConfig("fusion.rrf_c must be a non-negative number".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusSettings {
    pub path: PathBuf,
}

impl Default for CorpusSettings {
    fn default() -> Self {
        Self { path: PathBuf::from("./data/isabelle_judge.jsonl") }
    }
}

/// Distance used by the dense index for nearest-neighbour search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Distance {
    #[default]
    Cosine,
    L2,
    Dot,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorSettings {
    /// Directory of the persistent vector store.
    pub path: PathBuf,
    pub collection: String,
    /// Rows per insert call; a throughput knob only.
    pub batch_size: usize,
    pub distance: Distance,
}

impl Default for VectorSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./data/lancedb"),
            collection: "rag_collection".to_string(),
            batch_size: 2048,
            distance: Distance::Cosine,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Directory holding `config.json`, `tokenizer.json` and the weights.
    pub model_dir: Option<PathBuf>,
    pub max_len: usize,
    /// Use the deterministic hashing embedder instead of loading a model.
    pub use_fake: bool,
    /// Dimension of the hashing embedder.
    pub fake_dim: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self { model_dir: None, max_len: 256, use_fake: false, fake_dim: 384 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    pub topk: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self { topk: 5 }
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
