use anyhow::{Context, Result};
use colored::Colorize;

use crate::commands::find_projects;
use crate::config;
use crate::hook::PRODUCT_NAME_KEY;
use crate::pbxproj::ProjectFile;

/// Print each target's PRODUCT_NAME without modifying anything
pub fn execute(target: &str, config_path: Option<&str>) -> Result<()> {
    let config = config::load_optional_config(config_path)
        .context("Failed to load product name configuration")?;

    for path in find_projects(target)? {
        let project = ProjectFile::load_from_path(&path)
            .with_context(|| format!("Failed to load {}", path.display()))?;

        println!("{}", path.display().to_string().cyan().bold());

        let primary = project.primary_target(&config.xcode.main_target).ok();
        for t in project.targets()? {
            let is_primary = primary.as_ref().is_some_and(|p| p.handle == t.handle);
            let marker = if is_primary { "*".green().bold() } else { " ".normal() };
            let product_type = t
                .product_type
                .as_deref()
                .and_then(|p| p.strip_prefix("com.apple.product-type."))
                .unwrap_or("-");

            println!("  {} {} ({})", marker, t.name.bold(), product_type.dimmed());

            for (config_name, value) in project.build_property(&t.handle, PRODUCT_NAME_KEY)? {
                let value = match value {
                    Some(v) if v.is_ascii() => v.normal(),
                    Some(v) => v.yellow(),
                    None => "(unset)".dimmed(),
                };
                println!("      {:<10} {} = {}", config_name, PRODUCT_NAME_KEY, value);
            }
        }
    }

    Ok(())
}
