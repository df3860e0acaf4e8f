use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;

use crate::config;
use crate::hook::{HookOutcome, PostBuildHook, SkipReason};
use crate::platform::BuildPlatform;
use crate::provider::ProviderSlot;
use crate::registry::HookRegistry;

/// Fire the build-completion event for `output_path`.
///
/// `name` overrides `[product].name` from the config file. With neither set
/// the hook stays a no-op.
pub fn execute(
    platform: &str,
    output_path: &str,
    name: Option<&str>,
    config_path: Option<&str>,
) -> Result<()> {
    let platform: BuildPlatform = platform.parse().map_err(|e: String| anyhow::anyhow!(e))?;

    let config = config::load_optional_config(config_path)
        .context("Failed to load product name configuration")?;

    let slot = ProviderSlot::new();
    if let Some(product_name) = name.map(str::to_string).or(config.product.name.clone()) {
        if !product_name.is_ascii() {
            eprintln!(
                "{} product name '{}' contains non-ASCII characters; iOS may still fail to show permission dialogs",
                "warning:".yellow().bold(),
                product_name
            );
        }
        slot.set(move || product_name.clone());
    }

    let hook = PostBuildHook::new(slot).with_layout(config.layout());
    let mut registry = HookRegistry::new();
    registry.register_post_build_hook(BuildPlatform::Ios, hook);

    let outcomes = registry.notify_build_completed(platform, Path::new(output_path))?;

    if outcomes.is_empty() {
        println!(
            "{} No post-build hooks for {} builds",
            "info:".blue().bold(),
            platform
        );
    }

    for outcome in outcomes {
        match outcome {
            HookOutcome::Patched(report) => println!(
                "     {} PRODUCT_NAME = {} on `{}` ({} configuration(s)) in {}",
                "Patched".green().bold(),
                report.product_name,
                report.target_name,
                report.configurations,
                report.project_path.display()
            ),
            HookOutcome::Skipped(SkipReason::NoProvider) => println!(
                "{} No product name configured, leaving the Xcode project untouched",
                "info:".blue().bold()
            ),
            HookOutcome::Skipped(SkipReason::PlatformMismatch) => println!(
                "{} Nothing to do for {} builds",
                "info:".blue().bold(),
                platform
            ),
        }
    }

    Ok(())
}
