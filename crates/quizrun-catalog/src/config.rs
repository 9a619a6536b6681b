//! Configuration and backend factory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use quizrun_core::model::TakerContext;
use quizrun_core::traits::{QuizCatalog, ScoreSink};

use crate::directory::DirectoryCatalog;
use crate::http::{HttpCatalog, DEFAULT_TIMEOUT_SECS};
use crate::sink::JsonFileSink;

/// Configuration for a single quiz catalog.
///
/// Note: Custom Debug impl masks API tokens to keep them out of logs.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CatalogConfig {
    Http {
        base_url: String,
        #[serde(default)]
        api_token: Option<String>,
    },
    Directory {
        path: PathBuf,
    },
}

impl std::fmt::Debug for CatalogConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogConfig::Http {
                base_url,
                api_token,
            } => f
                .debug_struct("Http")
                .field("base_url", base_url)
                .field("api_token", &api_token.as_ref().map(|_| "***"))
                .finish(),
            CatalogConfig::Directory { path } => {
                f.debug_struct("Directory").field("path", path).finish()
            }
        }
    }
}

/// The person taking quizzes on this machine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TakerConfig {
    #[serde(default = "default_taker_id")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub class_id: String,
}

impl Default for TakerConfig {
    fn default() -> Self {
        Self {
            id: default_taker_id(),
            name: None,
            class_id: String::new(),
        }
    }
}

impl TakerConfig {
    pub fn context(&self) -> TakerContext {
        TakerContext {
            taker_id: self.id.clone(),
            display_name: self.name.clone(),
            class_id: self.class_id.clone(),
        }
    }
}

fn default_taker_id() -> String {
    "anonymous".to_string()
}

/// Top-level quizrun configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizrunConfig {
    /// Catalog configurations keyed by name.
    #[serde(default)]
    pub catalogs: HashMap<String, CatalogConfig>,
    /// Catalog used when none is named on the command line.
    #[serde(default = "default_catalog")]
    pub default_catalog: String,
    #[serde(default)]
    pub taker: TakerConfig,
    /// Where attempt records are written.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Timeout for data-service requests, in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_catalog() -> String {
    "local".to_string()
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./quizrun-results")
}
fn default_request_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for QuizrunConfig {
    fn default() -> Self {
        let mut catalogs = HashMap::new();
        catalogs.insert(
            default_catalog(),
            CatalogConfig::Directory {
                path: PathBuf::from("quizzes"),
            },
        );
        Self {
            catalogs,
            default_catalog: default_catalog(),
            taker: TakerConfig::default(),
            output_dir: default_output_dir(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl QuizrunConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Look up a catalog by name, falling back to the default.
    pub fn catalog(&self, name: Option<&str>) -> Result<(&str, &CatalogConfig)> {
        let name = name.unwrap_or(&self.default_catalog);
        self.catalogs
            .get_key_value(name)
            .map(|(k, v)| (k.as_str(), v))
            .with_context(|| {
                let mut known: Vec<_> = self.catalogs.keys().collect();
                known.sort();
                format!("catalog '{name}' not found in config. Available: {known:?}")
            })
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    // Substituted values are copied out verbatim, never rescanned.
    while let Some(start) = rest.find("${") {
        let Some(end) = rest[start..].find('}') else {
            break;
        };
        result.push_str(&rest[..start]);
        let var_name = &rest[start + 2..start + end];
        result.push_str(&std::env::var(var_name).unwrap_or_default());
        rest = &rest[start + end + 1..];
    }
    result.push_str(rest);
    result
}

fn resolve_catalog_config(config: &CatalogConfig) -> CatalogConfig {
    match config {
        CatalogConfig::Http {
            base_url,
            api_token,
        } => CatalogConfig::Http {
            base_url: resolve_env_vars(base_url),
            api_token: api_token.as_deref().map(resolve_env_vars),
        },
        CatalogConfig::Directory { path } => CatalogConfig::Directory {
            path: PathBuf::from(resolve_env_vars(&path.to_string_lossy())),
        },
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `quizrun.toml` in the current directory
/// 2. `~/.config/quizrun/config.toml`
///
/// Environment variable overrides: `QUIZRUN_API_TOKEN`, `QUIZRUN_TAKER_ID`.
pub fn load_config() -> Result<QuizrunConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<QuizrunConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("quizrun.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            let config = toml::from_str::<QuizrunConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?;
            tracing::debug!(path = %path.display(), "loaded config");
            config
        }
        None => QuizrunConfig::default(),
    };

    apply_env_overrides(&mut config);

    config.catalogs = config
        .catalogs
        .iter()
        .map(|(k, v)| (k.clone(), resolve_catalog_config(v)))
        .collect();
    config.taker.class_id = resolve_env_vars(&config.taker.class_id);

    Ok(config)
}

fn apply_env_overrides(config: &mut QuizrunConfig) {
    if let Ok(token) = std::env::var("QUIZRUN_API_TOKEN") {
        for catalog in config.catalogs.values_mut() {
            if let CatalogConfig::Http { api_token, .. } = catalog {
                *api_token = Some(token.clone());
            }
        }
    }

    if let Ok(id) = std::env::var("QUIZRUN_TAKER_ID") {
        config.taker.id = id;
    }
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("quizrun"))
}

/// Create a catalog instance from its configuration.
pub fn create_catalog(config: &CatalogConfig, timeout: Duration) -> Result<Box<dyn QuizCatalog>> {
    match config {
        CatalogConfig::Http {
            base_url,
            api_token,
        } => Ok(Box::new(HttpCatalog::new(
            base_url,
            api_token.clone(),
            timeout,
        )?)),
        CatalogConfig::Directory { path } => Ok(Box::new(DirectoryCatalog::new(path))),
    }
}

/// Create the sink finished attempts are handed to.
///
/// HTTP catalogs accept results back; directory catalogs write JSON files
/// into `output_dir`.
pub fn create_sink(
    config: &CatalogConfig,
    output_dir: &Path,
    timeout: Duration,
) -> Result<Box<dyn ScoreSink>> {
    match config {
        CatalogConfig::Http {
            base_url,
            api_token,
        } => Ok(Box::new(HttpCatalog::new(
            base_url,
            api_token.clone(),
            timeout,
        )?)),
        CatalogConfig::Directory { .. } => Ok(Box::new(JsonFileSink::new(output_dir))),
    }
}
