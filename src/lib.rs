pub mod commands;
pub mod config;
pub mod hook;
pub mod pbxproj;
pub mod platform;
pub mod provider;
pub mod registry;

pub use hook::{HookError, HookOutcome, PatchReport, PostBuildHook, ProjectLayout, SkipReason};
pub use platform::BuildPlatform;
pub use provider::{ProductNameProvider, ProviderSlot};
pub use registry::{HookRegistry, PostBuildHandler};
