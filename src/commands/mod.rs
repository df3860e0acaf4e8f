pub mod init;
pub mod post_build;
pub mod show;

use anyhow::Result;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const PBXPROJ_FILE: &str = "project.pbxproj";

/// Resolve a user-supplied path to the project.pbxproj files it refers to.
///
/// Accepts the file itself, an `.xcodeproj` bundle, or any directory
/// (searched a few levels deep, e.g. a build output directory).
pub fn find_projects(target: &str) -> Result<Vec<PathBuf>> {
    let path = Path::new(target);

    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    if !path.is_dir() {
        anyhow::bail!("'{}' does not exist", target);
    }

    if is_xcodeproj(path) {
        let pbxproj = path.join(PBXPROJ_FILE);
        if !pbxproj.is_file() {
            anyhow::bail!("'{}' has no {}", target, PBXPROJ_FILE);
        }
        return Ok(vec![pbxproj]);
    }

    let mut projects: Vec<PathBuf> = WalkDir::new(path)
        .max_depth(3)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.file_type().is_file()
                && e.file_name() == PBXPROJ_FILE
                && e.path().parent().is_some_and(is_xcodeproj)
        })
        .map(|e| e.into_path())
        .collect();
    projects.sort();

    if projects.is_empty() {
        anyhow::bail!("No Xcode project found under '{}'", target);
    }

    Ok(projects)
}

fn is_xcodeproj(path: &Path) -> bool {
    path.extension().and_then(|s| s.to_str()) == Some("xcodeproj")
}
