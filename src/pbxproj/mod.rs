//! Reading and editing Xcode `project.pbxproj` files
//!
//! The project is kept as its original text plus a parsed tree with byte
//! spans. Edits replace only the bytes of the values they touch, so anything
//! Xcode wrote (comments, section markers, ordering) survives a rewrite.

pub mod parser;
pub mod value;
pub mod writer;

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::pbxproj::parser::Parser;
use crate::pbxproj::value::Dict;
use crate::pbxproj::writer::{apply_edits, quote_string, Edit};

/// Product type of a runnable app target
pub const APPLICATION_PRODUCT_TYPE: &str = "com.apple.product-type.application";

const TARGET_ISAS: &[&str] = &["PBXNativeTarget", "PBXAggregateTarget", "PBXLegacyTarget"];

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("failed to read `{}`: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write `{}`: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse project: {0}")]
    Parse(String),
    #[error("project has no `{0}` entry")]
    MissingKey(&'static str),
    #[error("object `{0}` is referenced but not defined")]
    MissingObject(String),
    #[error("object `{id}` has a missing or malformed `{key}`")]
    Malformed { id: String, key: &'static str },
    #[error("no application target found (looked for `{0}` and any com.apple.product-type.application target)")]
    TargetNotFound(String),
}

/// Object id of a target inside the project
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TargetHandle(pub String);

#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    pub handle: TargetHandle,
    pub name: String,
    pub product_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BuildConfiguration {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct ProjectFile {
    source: String,
    root: Dict,
}

impl ProjectFile {
    pub fn load_from_path(path: &Path) -> Result<Self, ProjectError> {
        let source = fs::read_to_string(path).map_err(|source| ProjectError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(source)
    }

    pub fn parse(source: impl Into<String>) -> Result<Self, ProjectError> {
        let source = source.into();
        let root = Parser::new(&source).parse().map_err(ProjectError::Parse)?;
        let project = ProjectFile { source, root };

        // Everything else hangs off these two
        project.objects()?;
        project.root_object_id()?;

        Ok(project)
    }

    /// Current text of the project, including any edits made so far
    pub fn as_str(&self) -> &str {
        &self.source
    }

    fn objects(&self) -> Result<&Dict, ProjectError> {
        self.root
            .get_dict("objects")
            .ok_or(ProjectError::MissingKey("objects"))
    }

    fn root_object_id(&self) -> Result<&str, ProjectError> {
        self.root
            .get_str("rootObject")
            .ok_or(ProjectError::MissingKey("rootObject"))
    }

    fn object(&self, id: &str) -> Result<&Dict, ProjectError> {
        self.objects()?
            .get_dict(id)
            .ok_or_else(|| ProjectError::MissingObject(id.to_string()))
    }

    fn target_from_object(id: &str, object: &Dict) -> Target {
        Target {
            handle: TargetHandle(id.to_string()),
            name: object.get_str("name").unwrap_or(id).to_string(),
            product_type: object.get_str("productType").map(str::to_string),
        }
    }

    /// All targets, in the order the root project lists them
    pub fn targets(&self) -> Result<Vec<Target>, ProjectError> {
        let root_id = self.root_object_id()?;
        let root = self.object(root_id)?;

        match root.get_str_list("targets") {
            Some(ids) => ids
                .into_iter()
                .map(|id| -> Result<Target, ProjectError> {
                    Ok(Self::target_from_object(id, self.object(id)?))
                })
                .collect(),
            // No list on the root object: fall back to declaration order
            None => Ok(self
                .objects()?
                .entries
                .iter()
                .filter_map(|entry| {
                    let object = entry.value.value.as_dict()?;
                    let isa = object.get_str("isa")?;
                    TARGET_ISAS
                        .contains(&isa)
                        .then(|| Self::target_from_object(&entry.key, object))
                })
                .collect()),
        }
    }

    /// The main application target.
    ///
    /// Prefers the target named `preferred_name`; otherwise the first listed
    /// target that builds an application.
    pub fn primary_target(&self, preferred_name: &str) -> Result<Target, ProjectError> {
        let targets = self.targets()?;

        if let Some(target) = targets.iter().find(|t| t.name == preferred_name) {
            return Ok(target.clone());
        }

        targets
            .into_iter()
            .find(|t| t.product_type.as_deref() == Some(APPLICATION_PRODUCT_TYPE))
            .ok_or_else(|| ProjectError::TargetNotFound(preferred_name.to_string()))
    }

    fn configuration_ids(&self, target: &TargetHandle) -> Result<Vec<&str>, ProjectError> {
        let target_object = self.object(&target.0)?;
        let list_id = target_object
            .get_str("buildConfigurationList")
            .ok_or_else(|| ProjectError::Malformed {
                id: target.0.clone(),
                key: "buildConfigurationList",
            })?;

        self.object(list_id)?
            .get_str_list("buildConfigurations")
            .ok_or_else(|| ProjectError::Malformed {
                id: list_id.to_string(),
                key: "buildConfigurations",
            })
    }

    pub fn build_configurations(
        &self,
        target: &TargetHandle,
    ) -> Result<Vec<BuildConfiguration>, ProjectError> {
        self.configuration_ids(target)?
            .into_iter()
            .map(|id| -> Result<BuildConfiguration, ProjectError> {
                let config = self.object(id)?;
                Ok(BuildConfiguration {
                    id: id.to_string(),
                    name: config.get_str("name").unwrap_or(id).to_string(),
                })
            })
            .collect()
    }

    fn build_settings(&self, config_id: &str) -> Result<&Dict, ProjectError> {
        self.object(config_id)?
            .get_dict("buildSettings")
            .ok_or_else(|| ProjectError::Malformed {
                id: config_id.to_string(),
                key: "buildSettings",
            })
    }

    /// Value of `key` in each of the target's configurations
    pub fn build_property(
        &self,
        target: &TargetHandle,
        key: &str,
    ) -> Result<Vec<(String, Option<String>)>, ProjectError> {
        self.build_configurations(target)?
            .into_iter()
            .map(|config| -> Result<(String, Option<String>), ProjectError> {
                let value = self.build_settings(&config.id)?.get_str(key).map(str::to_string);
                Ok((config.name, value))
            })
            .collect()
    }

    /// Set `key = value` in every build configuration of `target`.
    ///
    /// Returns the number of configurations touched. On error the project is
    /// left unchanged.
    pub fn set_build_property(
        &mut self,
        target: &TargetHandle,
        key: &str,
        value: &str,
    ) -> Result<usize, ProjectError> {
        let rendered = quote_string(value);
        let mut edits = Vec::new();

        let config_ids = self.configuration_ids(target)?;
        for config_id in &config_ids {
            let settings = self.build_settings(config_id)?;
            edits.push(match settings.entry(key) {
                Some(entry) => Edit {
                    range: entry.value.span.clone(),
                    text: rendered.clone(),
                },
                None => self.insertion_edit(settings, key, &rendered),
            });
        }
        let touched = config_ids.len();

        let source = apply_edits(&self.source, edits);
        let root = Parser::new(&source).parse().map_err(ProjectError::Parse)?;
        self.source = source;
        self.root = root;

        Ok(touched)
    }

    /// Build the edit that adds a new `key = value;` line to `settings`,
    /// keeping Xcode's alphabetical key order and the dictionary's indentation
    fn insertion_edit(&self, settings: &Dict, key: &str, rendered: &str) -> Edit {
        let line = format!("{} = {};", quote_string(key), rendered);

        let anchor = settings
            .entries
            .iter()
            .find(|e| e.key.as_str() > key)
            .map(|e| e.key_span.start)
            .unwrap_or(settings.close);
        let line_start = self.line_start(anchor);

        if !self.source[line_start..anchor].trim().is_empty() {
            // Not on its own line (e.g. `buildSettings = {a = b;};`)
            return Edit {
                range: anchor..anchor,
                text: format!("{} ", line),
            };
        }

        let indent = match settings.entries.first() {
            Some(first) => {
                let start = self.line_start(first.key_span.start);
                let prefix = &self.source[start..first.key_span.start];
                if prefix.trim().is_empty() {
                    prefix.to_string()
                } else {
                    format!("{}\t", &self.source[line_start..anchor])
                }
            }
            None => format!("{}\t", &self.source[self.line_start(settings.close)..settings.close]),
        };

        Edit {
            range: line_start..line_start,
            text: format!("{}{}{}", indent, line, self.line_ending(anchor)),
        }
    }

    fn line_start(&self, pos: usize) -> usize {
        self.source[..pos].rfind('\n').map(|i| i + 1).unwrap_or(0)
    }

    /// Terminator of the line containing `pos`, so CRLF projects stay CRLF
    fn line_ending(&self, pos: usize) -> &'static str {
        match self.source[pos..].find('\n') {
            Some(i) if self.source[..pos + i].ends_with('\r') => "\r\n",
            _ => "\n",
        }
    }

    /// Replace the file at `path` with this project.
    ///
    /// The text goes to a temporary file next to `path` first and is renamed
    /// over it, so readers see either the old or the new project. A symlinked
    /// `path` is followed and the file it points to is replaced.
    pub fn write_to_path(&self, path: &Path) -> Result<(), ProjectError> {
        let write_err = |source| ProjectError::Write {
            path: path.to_path_buf(),
            source,
        };

        let resolved = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        let path = resolved.as_path();
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
        tmp.write_all(self.source.as_bytes()).map_err(write_err)?;
        // Temp files are created 0600; keep the original file's mode
        if let Ok(metadata) = fs::metadata(path) {
            tmp.as_file()
                .set_permissions(metadata.permissions())
                .map_err(write_err)?;
        }
        tmp.as_file().sync_all().map_err(write_err)?;
        tmp.persist(path).map_err(|e| write_err(e.error))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROJECT: &str = r#"// !$*UTF8*$!
{
	archiveVersion = 1;
	classes = {
	};
	objectVersion = 50;
	objects = {

/* Begin PBXNativeTarget section */
		AAAA /* Unity-iPhone */ = {
			isa = PBXNativeTarget;
			buildConfigurationList = AAL /* Build configuration list for PBXNativeTarget "Unity-iPhone" */;
			name = "Unity-iPhone";
			productType = "com.apple.product-type.application";
		};
		BBBB /* UnityFramework */ = {
			isa = PBXNativeTarget;
			buildConfigurationList = BBL;
			name = UnityFramework;
			productType = "com.apple.product-type.framework";
		};
/* End PBXNativeTarget section */

		PROJ /* Project object */ = {
			isa = PBXProject;
			buildConfigurationList = PRL;
			targets = (
				AAAA /* Unity-iPhone */,
				BBBB /* UnityFramework */,
			);
		};

/* Begin XCBuildConfiguration section */
		AAD /* Debug */ = {
			isa = XCBuildConfiguration;
			buildSettings = {
				INFOPLIST_FILE = Info.plist;
				PRODUCT_NAME = "日本語アプリ";
				SDKROOT = iphoneos;
			};
			name = Debug;
		};
		AAR /* Release */ = {
			isa = XCBuildConfiguration;
			buildSettings = {
				INFOPLIST_FILE = Info.plist;
				SDKROOT = iphoneos;
			};
			name = Release;
		};
		BBD /* Debug */ = {
			isa = XCBuildConfiguration;
			buildSettings = {
				PRODUCT_NAME = UnityFramework;
			};
			name = Debug;
		};
		PRD /* Debug */ = {
			isa = XCBuildConfiguration;
			buildSettings = {
			};
			name = Debug;
		};
/* End XCBuildConfiguration section */

/* Begin XCConfigurationList section */
		AAL = {
			isa = XCConfigurationList;
			buildConfigurations = (
				AAD /* Debug */,
				AAR /* Release */,
			);
		};
		BBL = {
			isa = XCConfigurationList;
			buildConfigurations = (
				BBD /* Debug */,
			);
		};
		PRL = {
			isa = XCConfigurationList;
			buildConfigurations = (
				PRD /* Debug */,
			);
		};
/* End XCConfigurationList section */
	};
	rootObject = PROJ /* Project object */;
}
"#;

    fn handle(id: &str) -> TargetHandle {
        TargetHandle(id.to_string())
    }

    #[test]
    fn test_targets_in_root_order() {
        let project = ProjectFile::parse(PROJECT).unwrap();
        let targets = project.targets().unwrap();

        let names: Vec<&str> = targets.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Unity-iPhone", "UnityFramework"]);
        assert_eq!(targets[0].product_type.as_deref(), Some(APPLICATION_PRODUCT_TYPE));
    }

    #[test]
    fn test_primary_target_by_name() {
        let project = ProjectFile::parse(PROJECT).unwrap();
        assert_eq!(project.primary_target("UnityFramework").unwrap().handle, handle("BBBB"));
        assert_eq!(project.primary_target("Unity-iPhone").unwrap().handle, handle("AAAA"));
    }

    #[test]
    fn test_primary_target_falls_back_to_application() {
        let project = ProjectFile::parse(PROJECT).unwrap();
        let target = project.primary_target("MainApp").unwrap();
        assert_eq!(target.name, "Unity-iPhone");
    }

    #[test]
    fn test_primary_target_not_found() {
        let source = PROJECT.replace(
            "productType = \"com.apple.product-type.application\";",
            "productType = \"com.apple.product-type.bundle\";",
        );
        let project = ProjectFile::parse(source).unwrap();
        let err = project.primary_target("MainApp").unwrap_err();
        assert!(matches!(err, ProjectError::TargetNotFound(name) if name == "MainApp"));
    }

    #[test]
    fn test_build_property_per_configuration() {
        let project = ProjectFile::parse(PROJECT).unwrap();
        let values = project.build_property(&handle("AAAA"), "PRODUCT_NAME").unwrap();
        assert_eq!(
            values,
            vec![
                ("Debug".to_string(), Some("日本語アプリ".to_string())),
                ("Release".to_string(), None),
            ]
        );
    }

    #[test]
    fn test_set_replaces_and_inserts() {
        let mut project = ProjectFile::parse(PROJECT).unwrap();
        let touched = project
            .set_build_property(&handle("AAAA"), "PRODUCT_NAME", "MyApp")
            .unwrap();
        assert_eq!(touched, 2);

        let values = project.build_property(&handle("AAAA"), "PRODUCT_NAME").unwrap();
        assert!(values.iter().all(|(_, v)| v.as_deref() == Some("MyApp")));

        // Replaced in place in Debug, inserted alphabetically in Release
        let text = project.as_str();
        assert!(text.contains(
            "\t\t\t\tINFOPLIST_FILE = Info.plist;\n\t\t\t\tPRODUCT_NAME = MyApp;\n\t\t\t\tSDKROOT = iphoneos;\n\t\t\t};\n\t\t\tname = Release;"
        ));
        assert!(!text.contains("日本語アプリ"));
    }

    #[test]
    fn test_set_leaves_other_targets_alone() {
        let mut project = ProjectFile::parse(PROJECT).unwrap();
        project
            .set_build_property(&handle("AAAA"), "PRODUCT_NAME", "MyApp")
            .unwrap();

        let framework = project.build_property(&handle("BBBB"), "PRODUCT_NAME").unwrap();
        assert_eq!(framework, vec![("Debug".to_string(), Some("UnityFramework".to_string()))]);
        // Comments and section markers survive
        assert!(project.as_str().contains("/* Begin XCBuildConfiguration section */"));
        assert!(project.as_str().contains("AAL /* Build configuration list for PBXNativeTarget \"Unity-iPhone\" */;"));
    }

    #[test]
    fn test_set_into_empty_settings() {
        // Point the framework at the project-level list, whose settings are empty
        let source = PROJECT.replace("buildConfigurationList = BBL;", "buildConfigurationList = PRL;");
        let mut project = ProjectFile::parse(source).unwrap();

        project
            .set_build_property(&handle("BBBB"), "PRODUCT_NAME", "Fw Name")
            .unwrap();
        assert!(project
            .as_str()
            .contains("\t\t\tbuildSettings = {\n\t\t\t\tPRODUCT_NAME = \"Fw Name\";\n\t\t\t};"));
    }

    #[test]
    fn test_set_on_single_line_dictionary() {
        let source = PROJECT.replace(
            "buildSettings = {\n\t\t\t\tPRODUCT_NAME = UnityFramework;\n\t\t\t};",
            "buildSettings = {SDKROOT = iphoneos;};",
        );
        let mut project = ProjectFile::parse(source).unwrap();
        project
            .set_build_property(&handle("BBBB"), "PRODUCT_NAME", "Fw")
            .unwrap();
        assert!(project
            .as_str()
            .contains("buildSettings = {PRODUCT_NAME = Fw; SDKROOT = iphoneos;};"));
    }

    #[test]
    fn test_set_is_idempotent() {
        let mut once = ProjectFile::parse(PROJECT).unwrap();
        once.set_build_property(&handle("AAAA"), "PRODUCT_NAME", "MyApp").unwrap();

        let mut twice = ProjectFile::parse(once.as_str()).unwrap();
        twice.set_build_property(&handle("AAAA"), "PRODUCT_NAME", "MyApp").unwrap();

        assert_eq!(once.as_str(), twice.as_str());
    }

    #[test]
    fn test_dangling_configuration_list() {
        let source = PROJECT.replace("buildConfigurationList = BBL;", "buildConfigurationList = NOPE;");
        let mut project = ProjectFile::parse(source).unwrap();
        let before = project.as_str().to_string();

        let err = project
            .set_build_property(&handle("BBBB"), "PRODUCT_NAME", "Fw")
            .unwrap_err();
        assert!(matches!(err, ProjectError::MissingObject(id) if id == "NOPE"));
        assert_eq!(project.as_str(), before);
    }

    #[test]
    fn test_parse_requires_objects_and_root() {
        assert!(matches!(
            ProjectFile::parse("{ archiveVersion = 1; }").unwrap_err(),
            ProjectError::MissingKey("objects")
        ));
        assert!(matches!(
            ProjectFile::parse("{ objects = { }; }").unwrap_err(),
            ProjectError::MissingKey("rootObject")
        ));
        assert!(matches!(
            ProjectFile::parse("not a project").unwrap_err(),
            ProjectError::Parse(_)
        ));
    }

    #[test]
    fn test_write_to_path_replaces_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("project.pbxproj");
        fs::write(&path, PROJECT).unwrap();

        let mut project = ProjectFile::load_from_path(&path).unwrap();
        project.set_build_property(&handle("AAAA"), "PRODUCT_NAME", "MyApp").unwrap();
        project.write_to_path(&path).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(written, project.as_str());
        // Only the project file remains in the directory
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_insert_keeps_crlf_line_endings() {
        let crlf = PROJECT.replace('\n', "\r\n");
        let mut project = ProjectFile::parse(crlf.as_str()).unwrap();
        project.set_build_property(&handle("AAAA"), "PRODUCT_NAME", "MyApp").unwrap();

        let text = project.as_str();
        let bare_lf = text
            .match_indices('\n')
            .filter(|(i, _)| !text[..*i].ends_with('\r'))
            .count();
        assert_eq!(bare_lf, 0);
        assert!(text.contains("PRODUCT_NAME = MyApp;\r\n"));
    }

    #[cfg(unix)]
    #[test]
    fn test_write_through_symlink() {
        let dir = tempfile::tempdir().unwrap();
        let real = dir.path().join("real.pbxproj");
        let link = dir.path().join("project.pbxproj");
        fs::write(&real, PROJECT).unwrap();
        std::os::unix::fs::symlink(&real, &link).unwrap();

        let mut project = ProjectFile::load_from_path(&link).unwrap();
        project.set_build_property(&handle("AAAA"), "PRODUCT_NAME", "MyApp").unwrap();
        project.write_to_path(&link).unwrap();

        assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
        assert_eq!(fs::read_to_string(&real).unwrap(), project.as_str());
    }

    #[test]
    fn test_failed_write_leaves_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let project = ProjectFile::parse(PROJECT).unwrap();

        // Parent is a regular file, so no temp file can be created next to it
        let blocker = dir.path().join("Unity-iPhone.xcodeproj");
        fs::write(&blocker, "not a directory").unwrap();
        let err = project
            .write_to_path(&blocker.join("project.pbxproj"))
            .unwrap_err();
        assert!(matches!(err, ProjectError::Write { .. }));
        assert_eq!(fs::read_to_string(&blocker).unwrap(), "not a directory");

        // Target is a non-empty directory, so the final rename fails
        let occupied = dir.path().join("occupied");
        fs::create_dir(&occupied).unwrap();
        fs::write(occupied.join("keep"), "old").unwrap();
        let err = project.write_to_path(&occupied).unwrap_err();
        assert!(matches!(err, ProjectError::Write { .. }));
        assert_eq!(fs::read_to_string(occupied.join("keep")).unwrap(), "old");

        // No temp files left behind
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 2);
    }
}
