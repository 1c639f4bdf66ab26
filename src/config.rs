//! Configuration for govflow.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (GOVFLOW_HOME, GOVFLOW_CATALOG, GOVFLOW_GENERATOR)
//! 2. Config file (.govflow/config.yaml)
//! 3. Defaults (~/.govflow, built-in catalog, canned generator)
//!
//! Config file discovery:
//! - Searches current directory and parents for .govflow/config.yaml
//! - Paths in config file are relative to the project root (parent of .govflow/)

use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::core::StagePacing;

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<Result<ResolvedConfig, String>> = OnceLock::new();

const CONFIG_DIR: &str = ".govflow";
const CONFIG_FILE: &str = "config.yaml";

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub pacing: Option<StagePacing>,
    #[serde(default)]
    pub generator: Option<GeneratorConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    /// State directory (audit exports)
    pub home: Option<String>,
    /// Catalog file replacing the built-in frameworks
    pub catalog: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeneratorConfig {
    /// Program that reads a prompt on stdin and prints the output
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    pub timeout_seconds: Option<u64>,
}

/// Resolved command generator settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorSettings {
    pub command: String,
    pub args: Vec<String>,
    pub timeout: Duration,
}

fn default_generator_timeout() -> Duration {
    Duration::from_secs(120)
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Absolute path to govflow home
    pub home: PathBuf,
    /// Catalog file, if the built-in catalog is replaced
    pub catalog: Option<PathBuf>,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
    /// Stage delays
    pub pacing: StagePacing,
    /// External generator; None uses the canned generator
    pub generator: Option<GeneratorSettings>,
}

impl ResolvedConfig {
    /// Directory for audit log exports
    pub fn audit_dir(&self) -> PathBuf {
        self.home.join("audit")
    }
}

/// Find config file by searching `start` and its parents
fn find_config_file_from(start: PathBuf) -> Option<PathBuf> {
    let mut current = start;

    loop {
        let config_path = current.join(CONFIG_DIR).join(CONFIG_FILE);
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to `base`
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
            .canonicalize()
            .unwrap_or_else(|_| base.join(path_str))
    }
}

/// Parse `GOVFLOW_GENERATOR` ("program arg1 arg2")
fn generator_from_env(value: &str) -> Option<GeneratorSettings> {
    let mut parts = value.split_whitespace().map(str::to_string);
    let command = parts.next()?;
    Some(GeneratorSettings {
        command,
        args: parts.collect(),
        timeout: default_generator_timeout(),
    })
}

/// Combine the config file (if any) with environment overrides
fn resolve(config_path: Option<PathBuf>, default_home: PathBuf) -> Result<ResolvedConfig> {
    let file = match config_path {
        Some(ref path) => Some(load_config_file(path)?),
        None => None,
    };

    // Project root is the parent of .govflow/
    let base_dir = config_path
        .as_deref()
        .and_then(Path::parent)
        .and_then(Path::parent)
        .unwrap_or(Path::new("."))
        .to_path_buf();

    let paths = file.as_ref().map(|f| f.paths.clone()).unwrap_or_default();

    let home = if let Ok(env_home) = std::env::var("GOVFLOW_HOME") {
        PathBuf::from(env_home)
    } else if let Some(ref home_path) = paths.home {
        resolve_path(&base_dir, home_path)
    } else {
        default_home
    };

    let catalog = if let Ok(env_catalog) = std::env::var("GOVFLOW_CATALOG") {
        Some(PathBuf::from(env_catalog))
    } else {
        paths.catalog.as_deref().map(|p| resolve_path(&base_dir, p))
    };

    let pacing = file
        .as_ref()
        .and_then(|f| f.pacing.clone())
        .unwrap_or_default();

    let generator = match std::env::var("GOVFLOW_GENERATOR") {
        Ok(value) => generator_from_env(&value),
        Err(_) => file.as_ref().and_then(|f| f.generator.as_ref()).map(|g| {
            GeneratorSettings {
                command: g.command.clone(),
                args: g.args.clone(),
                timeout: g
                    .timeout_seconds
                    .map(Duration::from_secs)
                    .unwrap_or_else(default_generator_timeout),
            }
        }),
    };

    Ok(ResolvedConfig {
        home,
        catalog,
        config_file: config_path,
        pacing,
        generator,
    })
}

/// Load configuration from all sources
fn load_config() -> Result<ResolvedConfig> {
    let default_home = dirs::home_dir()
        .context("Failed to determine home directory")?
        .join(CONFIG_DIR);

    let config_file = std::env::current_dir()
        .ok()
        .and_then(find_config_file_from);

    resolve(config_file, default_home)
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| format!("{:#}", e)));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}

/// Force reload configuration (useful for testing)
pub fn reload_config() -> Result<ResolvedConfig> {
    load_config()
}
