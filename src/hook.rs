//! Post-build hook that rewrites `PRODUCT_NAME` in the generated Xcode project
//!
//! Build tools copy the display name into `PRODUCT_NAME`. When that name
//! contains non-Latin characters iOS fails to show the notification
//! permission dialog, so after an iOS build the main target's product name is
//! replaced with a caller-supplied ASCII-safe value.

use std::path::{Path, PathBuf};

use log::{debug, info};
use thiserror::Error;

use crate::pbxproj::{ProjectError, ProjectFile, Target};
use crate::platform::BuildPlatform;
use crate::provider::ProviderSlot;

/// Build setting holding the binary's internal product name
pub const PRODUCT_NAME_KEY: &str = "PRODUCT_NAME";

pub const DEFAULT_PROJECT_SUBPATH: &str = "Unity-iPhone.xcodeproj/project.pbxproj";
pub const DEFAULT_MAIN_TARGET: &str = "Unity-iPhone";

/// Where the Xcode project lives inside a build output directory
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectLayout {
    pub project_subpath: PathBuf,
    pub main_target: String,
}

impl Default for ProjectLayout {
    fn default() -> Self {
        Self {
            project_subpath: PathBuf::from(DEFAULT_PROJECT_SUBPATH),
            main_target: DEFAULT_MAIN_TARGET.to_string(),
        }
    }
}

impl ProjectLayout {
    pub fn project_path(&self, output_path: &Path) -> PathBuf {
        output_path.join(&self.project_subpath)
    }
}

/// Operations the hook needs from a project-file library
pub trait ProjectStore {
    type Project;

    fn load(&self, path: &Path) -> Result<Self::Project, ProjectError>;

    fn primary_target(
        &self,
        project: &Self::Project,
        preferred_name: &str,
    ) -> Result<Target, ProjectError>;

    fn set_build_property(
        &self,
        project: &mut Self::Project,
        target: &Target,
        key: &str,
        value: &str,
    ) -> Result<usize, ProjectError>;

    fn write(&self, project: &Self::Project, path: &Path) -> Result<(), ProjectError>;
}

/// [`ProjectStore`] backed by on-disk `project.pbxproj` files
#[derive(Debug, Clone, Copy, Default)]
pub struct PbxprojStore;

impl ProjectStore for PbxprojStore {
    type Project = ProjectFile;

    fn load(&self, path: &Path) -> Result<ProjectFile, ProjectError> {
        ProjectFile::load_from_path(path)
    }

    fn primary_target(
        &self,
        project: &ProjectFile,
        preferred_name: &str,
    ) -> Result<Target, ProjectError> {
        project.primary_target(preferred_name)
    }

    fn set_build_property(
        &self,
        project: &mut ProjectFile,
        target: &Target,
        key: &str,
        value: &str,
    ) -> Result<usize, ProjectError> {
        project.set_build_property(&target.handle, key, value)
    }

    fn write(&self, project: &ProjectFile, path: &Path) -> Result<(), ProjectError> {
        project.write_to_path(path)
    }
}

#[derive(Debug, Error)]
pub enum HookError {
    #[error("failed to load Xcode project `{}`: {source}", .path.display())]
    ProjectFileLoad {
        path: PathBuf,
        #[source]
        source: ProjectError,
    },
    #[error("failed to resolve the main target in `{}`: {source}", .path.display())]
    TargetResolution {
        path: PathBuf,
        #[source]
        source: ProjectError,
    },
    #[error("failed to write Xcode project `{}`: {source}", .path.display())]
    ProjectFileWrite {
        path: PathBuf,
        #[source]
        source: ProjectError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    PlatformMismatch,
    NoProvider,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PatchReport {
    pub project_path: PathBuf,
    pub target_name: String,
    pub product_name: String,
    pub configurations: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum HookOutcome {
    Skipped(SkipReason),
    Patched(PatchReport),
}

pub struct PostBuildHook<S: ProjectStore = PbxprojStore> {
    provider: ProviderSlot,
    layout: ProjectLayout,
    store: S,
}

impl PostBuildHook<PbxprojStore> {
    pub fn new(provider: ProviderSlot) -> Self {
        Self::with_store(provider, ProjectLayout::default(), PbxprojStore)
    }
}

impl<S: ProjectStore> PostBuildHook<S> {
    /// The only platform whose builds are patched
    pub const TARGET_PLATFORM: BuildPlatform = BuildPlatform::Ios;

    pub fn with_store(provider: ProviderSlot, layout: ProjectLayout, store: S) -> Self {
        Self {
            provider,
            layout,
            store,
        }
    }

    pub fn with_layout(mut self, layout: ProjectLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn provider(&self) -> &ProviderSlot {
        &self.provider
    }

    pub fn layout(&self) -> &ProjectLayout {
        &self.layout
    }

    /// Handle one finished build.
    ///
    /// Does nothing unless `platform` is iOS and a provider is installed.
    /// Otherwise loads the project under `output_path`, sets `PRODUCT_NAME`
    /// on the main target to the provider's value, and writes it back.
    pub fn on_build_completed(
        &self,
        platform: BuildPlatform,
        output_path: &Path,
    ) -> Result<HookOutcome, HookError> {
        if platform != Self::TARGET_PLATFORM {
            debug!("skipping {} build: only {} is patched", platform, Self::TARGET_PLATFORM);
            return Ok(HookOutcome::Skipped(SkipReason::PlatformMismatch));
        }

        let provider = match self.provider.get() {
            Some(provider) => provider,
            None => {
                debug!("skipping build: no product name provider installed");
                return Ok(HookOutcome::Skipped(SkipReason::NoProvider));
            }
        };

        let path = self.layout.project_path(output_path);
        debug!("loading {}", path.display());

        let mut project = self
            .store
            .load(&path)
            .map_err(|source| HookError::ProjectFileLoad {
                path: path.clone(),
                source,
            })?;

        let target = self
            .store
            .primary_target(&project, &self.layout.main_target)
            .map_err(|source| HookError::TargetResolution {
                path: path.clone(),
                source,
            })?;

        let product_name = provider();

        let configurations = self
            .store
            .set_build_property(&mut project, &target, PRODUCT_NAME_KEY, &product_name)
            .map_err(|source| HookError::TargetResolution {
                path: path.clone(),
                source,
            })?;

        self.store
            .write(&project, &path)
            .map_err(|source| HookError::ProjectFileWrite {
                path: path.clone(),
                source,
            })?;

        info!(
            "set {} = {:?} on target `{}` ({} configuration(s)) in {}",
            PRODUCT_NAME_KEY,
            product_name,
            target.name,
            configurations,
            path.display()
        );

        Ok(HookOutcome::Patched(PatchReport {
            project_path: path,
            target_name: target.name,
            product_name,
            configurations,
        }))
    }
}
