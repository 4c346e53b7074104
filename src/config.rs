use config::{Config, Environment, File as ConfigFile};
use serde::Deserialize;
use std::path::{Component, Path, PathBuf};
use tracing::warn;

use crate::error::ConfigError;
use crate::matcher::PathMatcher;

pub const DEFAULT_CONFIG_NAME: &str = "Inventory";
pub const DEFAULT_STORE_PATH: &str = "inventory.json";
pub const DEFAULT_WORKERS: usize = 4;

/// The configuration document as written by the user.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfig {
    #[serde(default)]
    pub roots: Vec<RawRoot>,
    #[serde(default)]
    pub exclude: Vec<String>,
    pub store_path: Option<String>,
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawRoot {
    pub path: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub exclude: Vec<String>,
}

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Clone)]
pub struct RootConfig {
    pub path: PathBuf,
    pub enabled: bool,
    pub matcher: PathMatcher,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub roots: Vec<RootConfig>,
    pub store_path: PathBuf,
    pub workers: usize,
}

impl AppConfig {
    pub fn enabled_roots(&self) -> impl Iterator<Item = &RootConfig> {
        self.roots.iter().filter(|root| root.enabled)
    }
}

/// Load `<name>.{toml,json,yaml,...}` layered with `INVENTORY_*` env vars.
pub fn load_configuration(name: &str) -> Result<AppConfig, ConfigError> {
    let builder = Config::builder()
        .add_source(ConfigFile::with_name(name).required(true))
        .add_source(Environment::with_prefix("INVENTORY"))
        .build()?;
    let raw = builder.try_deserialize::<RawConfig>()?;
    normalize(raw)
}

/// Expand `~`, normalize separators, reject relative and duplicate roots,
/// and compile every root's exclusion patterns merged with the global ones.
pub fn normalize(raw: RawConfig) -> Result<AppConfig, ConfigError> {
    let mut roots: Vec<RootConfig> = Vec::with_capacity(raw.roots.len());
    let mut sources: Vec<&str> = Vec::with_capacity(raw.roots.len());

    for root in &raw.roots {
        let path = normalize_root_path(&root.path)?;

        if let Some(index) = roots.iter().position(|existing| existing.path == path) {
            return Err(ConfigError::DuplicateRoot {
                first: sources[index].to_string(),
                second: root.path.clone(),
                path,
            });
        }

        let patterns: Vec<&str> = root
            .exclude
            .iter()
            .chain(raw.exclude.iter())
            .map(String::as_str)
            .collect();

        roots.push(RootConfig {
            path,
            enabled: root.enabled,
            matcher: PathMatcher::new(&patterns)?,
        });
        sources.push(&root.path);
    }

    for (outer, inner) in overlapping_roots(&roots) {
        warn!(
            "Root {} is nested inside root {}; its files will be inventoried twice",
            inner.display(),
            outer.display()
        );
    }

    Ok(AppConfig {
        roots,
        store_path: raw
            .store_path
            .map(|p| expand_home(&p))
            .transpose()?
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_PATH)),
        workers: raw.workers.filter(|n| *n > 0).unwrap_or(DEFAULT_WORKERS),
    })
}

pub fn normalize_root_path(raw: &str) -> Result<PathBuf, ConfigError> {
    let expanded = expand_home(raw)?;
    let path: PathBuf = expanded
        .components()
        .filter(|component| !matches!(component, Component::CurDir))
        .collect();
    if !path.is_absolute() {
        return Err(ConfigError::RelativeRoot(raw.to_string()));
    }
    Ok(path)
}

fn expand_home(raw: &str) -> Result<PathBuf, ConfigError> {
    let rest = match raw.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with(['/', '\\']) => rest,
        _ => return Ok(PathBuf::from(raw)),
    };
    let home = dirs::home_dir().ok_or_else(|| ConfigError::NoHomeDir(raw.to_string()))?;
    Ok(home.join(rest.trim_start_matches(['/', '\\'])))
}

/// Pairs of enabled roots where the second lives under the first.
fn overlapping_roots(roots: &[RootConfig]) -> Vec<(&Path, &Path)> {
    let mut result = Vec::new();
    for outer in roots.iter().filter(|r| r.enabled) {
        for inner in roots.iter().filter(|r| r.enabled) {
            if outer.path != inner.path && inner.path.starts_with(&outer.path) {
                result.push((outer.path.as_path(), inner.path.as_path()));
            }
        }
    }
    result
}
