use anyhow::Result;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::hook::{ProjectLayout, DEFAULT_MAIN_TARGET, DEFAULT_PROJECT_SUBPATH};

/// Default config file name, looked up in the current directory
pub const CONFIG_FILE: &str = "product-name.toml";

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub product: ProductConfig,
    #[serde(default)]
    pub xcode: XcodeConfig,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProductConfig {
    /// ASCII-safe PRODUCT_NAME. Leaving it out keeps the hook a no-op.
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct XcodeConfig {
    #[serde(default = "default_project_path")]
    pub project_path: String,
    #[serde(default = "default_main_target")]
    pub main_target: String,
}

impl Default for XcodeConfig {
    fn default() -> Self {
        Self {
            project_path: default_project_path(),
            main_target: default_main_target(),
        }
    }
}

fn default_project_path() -> String {
    DEFAULT_PROJECT_SUBPATH.to_string()
}

fn default_main_target() -> String {
    DEFAULT_MAIN_TARGET.to_string()
}

impl Config {
    pub fn layout(&self) -> ProjectLayout {
        ProjectLayout {
            project_subpath: PathBuf::from(&self.xcode.project_path),
            main_target: self.xcode.main_target.clone(),
        }
    }
}

/// Load and parse a product-name.toml configuration file
pub fn load_config(path: &str) -> Result<Config> {
    let content = fs::read_to_string(path)
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                anyhow::anyhow!("could not find `{}`", path)
            } else {
                anyhow::anyhow!("failed to read `{}`: {}", path, e)
            }
        })?;

    let config = parse_config(&content)
        .map_err(|e| anyhow::anyhow!("failed to parse `{}`: {}", path, e))?;

    Ok(config)
}

/// Load `path` when given, else `product-name.toml` if it exists, else defaults
pub fn load_optional_config(path: Option<&str>) -> Result<Config> {
    match path {
        Some(path) => load_config(path),
        None if Path::new(CONFIG_FILE).exists() => load_config(CONFIG_FILE),
        None => Ok(Config::default()),
    }
}

fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content)?;
    validate_xcode_config(&config.xcode)?;
    Ok(config)
}

fn validate_xcode_config(xcode: &XcodeConfig) -> Result<()> {
    if xcode.project_path.trim().is_empty() {
        anyhow::bail!("`xcode.project_path` must not be empty");
    }
    if Path::new(&xcode.project_path).is_absolute() {
        anyhow::bail!(
            "`xcode.project_path` must be relative to the build output directory, got '{}'",
            xcode.project_path
        );
    }
    if xcode.main_target.trim().is_empty() {
        anyhow::bail!("`xcode.main_target` must not be empty");
    }
    Ok(())
}
