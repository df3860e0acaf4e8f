use std::path::Path;

use log::debug;

use crate::hook::{HookError, HookOutcome, PostBuildHook, ProjectStore};
use crate::platform::BuildPlatform;

/// Something that runs after a build finishes
pub trait PostBuildHandler {
    fn on_build_completed(
        &self,
        platform: BuildPlatform,
        output_path: &Path,
    ) -> Result<HookOutcome, HookError>;
}

impl<S: ProjectStore> PostBuildHandler for PostBuildHook<S> {
    fn on_build_completed(
        &self,
        platform: BuildPlatform,
        output_path: &Path,
    ) -> Result<HookOutcome, HookError> {
        PostBuildHook::on_build_completed(self, platform, output_path)
    }
}

impl<F> PostBuildHandler for F
where
    F: Fn(BuildPlatform, &Path) -> Result<HookOutcome, HookError>,
{
    fn on_build_completed(
        &self,
        platform: BuildPlatform,
        output_path: &Path,
    ) -> Result<HookOutcome, HookError> {
        self(platform, output_path)
    }
}

/// Post-build hooks keyed by platform.
///
/// The embedding build pipeline registers hooks during setup and calls
/// [`HookRegistry::notify_build_completed`] once per finished build.
#[derive(Default)]
pub struct HookRegistry {
    hooks: Vec<(BuildPlatform, Box<dyn PostBuildHandler>)>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_post_build_hook<H>(&mut self, platform: BuildPlatform, handler: H)
    where
        H: PostBuildHandler + 'static,
    {
        self.hooks.push((platform, Box::new(handler)));
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Run every hook registered for `platform`, in registration order.
    ///
    /// Stops at the first error. Returns the outcomes of the hooks that ran.
    pub fn notify_build_completed(
        &self,
        platform: BuildPlatform,
        output_path: &Path,
    ) -> Result<Vec<HookOutcome>, HookError> {
        let mut outcomes = Vec::new();

        for (registered, handler) in &self.hooks {
            if *registered != platform {
                continue;
            }
            debug!("running post-build hook for {} ({})", platform, output_path.display());
            outcomes.push(handler.on_build_completed(platform, output_path)?);
        }

        Ok(outcomes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hook::SkipReason;
    use crate::pbxproj::ProjectError;
    use std::cell::RefCell;
    use std::path::PathBuf;
    use std::rc::Rc;

    fn recording(
        log: &Rc<RefCell<Vec<String>>>,
        label: &'static str,
    ) -> impl Fn(BuildPlatform, &Path) -> Result<HookOutcome, HookError> {
        let log = Rc::clone(log);
        move |platform: BuildPlatform, _path: &Path| {
            log.borrow_mut().push(format!("{}:{}", label, platform));
            Ok(HookOutcome::Skipped(SkipReason::NoProvider))
        }
    }

    #[test]
    fn test_dispatches_only_matching_platform() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut registry = HookRegistry::new();
        registry.register_post_build_hook(BuildPlatform::Ios, recording(&log, "first"));
        registry.register_post_build_hook(BuildPlatform::Android, recording(&log, "android"));
        registry.register_post_build_hook(BuildPlatform::Ios, recording(&log, "second"));

        let outcomes = registry
            .notify_build_completed(BuildPlatform::Ios, Path::new("/out"))
            .unwrap();

        assert_eq!(outcomes.len(), 2);
        assert_eq!(*log.borrow(), vec!["first:ios", "second:ios"]);
    }

    #[test]
    fn test_no_hooks_for_platform() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut registry = HookRegistry::new();
        registry.register_post_build_hook(BuildPlatform::Ios, recording(&log, "ios"));

        let outcomes = registry
            .notify_build_completed(BuildPlatform::WebGl, Path::new("/out"))
            .unwrap();
        assert!(outcomes.is_empty());
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_first_error_stops_dispatch() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut registry = HookRegistry::new();
        let failing = |_: BuildPlatform, path: &Path| -> Result<HookOutcome, HookError> {
            Err(HookError::ProjectFileLoad {
                path: PathBuf::from(path),
                source: ProjectError::Parse("broken".to_string()),
            })
        };
        registry.register_post_build_hook(BuildPlatform::Ios, failing);
        registry.register_post_build_hook(BuildPlatform::Ios, recording(&log, "after"));

        let err = registry
            .notify_build_completed(BuildPlatform::Ios, Path::new("/out"))
            .unwrap_err();
        assert!(matches!(err, HookError::ProjectFileLoad { .. }));
        assert!(log.borrow().is_empty());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_registered_hook_without_provider() {
        use crate::provider::ProviderSlot;

        let mut registry = HookRegistry::new();
        let hook = PostBuildHook::new(ProviderSlot::new());
        registry.register_post_build_hook(BuildPlatform::Ios, hook);

        let outcomes = registry
            .notify_build_completed(BuildPlatform::Ios, Path::new("/does/not/exist"))
            .unwrap();
        assert_eq!(outcomes, vec![HookOutcome::Skipped(SkipReason::NoProvider)]);
    }
}
