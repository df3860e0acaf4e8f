use anyhow::{Context, Result};
use colored::Colorize;
use std::fs;
use std::path::Path;

use crate::config::CONFIG_FILE;

const CONFIG_TEMPLATE: &str = include_str!("../../templates/product-name.toml");

/// Write a product-name.toml template into `dir`
pub fn execute(dir: &str, name: Option<&str>) -> Result<()> {
    let config_path = Path::new(dir).join(CONFIG_FILE);

    if config_path.exists() {
        anyhow::bail!("'{}' already exists", config_path.display());
    }

    let name_line = match name {
        Some(name) => format!("name = {}", toml::Value::String(name.to_string())),
        None => "# name = \"MyApp\"".to_string(),
    };
    let content = CONFIG_TEMPLATE.replace("{{PRODUCT_NAME_LINE}}", &name_line);

    fs::write(&config_path, content)
        .context(format!("Failed to write {}", config_path.display()))?;

    println!(
        "     {} {}",
        "Created".green().bold(),
        config_path.display()
    );

    Ok(())
}
