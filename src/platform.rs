use std::fmt;
use std::str::FromStr;

/// Platforms a host build tool can report a finished build for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildPlatform {
    Ios,
    Android,
    MacOs,
    Windows,
    Linux,
    WebGl,
    TvOs,
    VisionOs,
}

impl BuildPlatform {
    pub const ALL: [BuildPlatform; 8] = [
        BuildPlatform::Ios,
        BuildPlatform::Android,
        BuildPlatform::MacOs,
        BuildPlatform::Windows,
        BuildPlatform::Linux,
        BuildPlatform::WebGl,
        BuildPlatform::TvOs,
        BuildPlatform::VisionOs,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BuildPlatform::Ios => "ios",
            BuildPlatform::Android => "android",
            BuildPlatform::MacOs => "macos",
            BuildPlatform::Windows => "windows",
            BuildPlatform::Linux => "linux",
            BuildPlatform::WebGl => "webgl",
            BuildPlatform::TvOs => "tvos",
            BuildPlatform::VisionOs => "visionos",
        }
    }
}

impl fmt::Display for BuildPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuildPlatform {
    type Err = String;

    /// Accepts our own identifiers as well as the spellings build tools
    /// commonly use (`iPhone`, `StandaloneOSX`, `StandaloneWindows64`, ...)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', '_', ' '], "");
        let platform = match normalized.as_str() {
            "ios" | "iphone" => BuildPlatform::Ios,
            "android" => BuildPlatform::Android,
            "macos" | "osx" | "standaloneosx" | "mac" => BuildPlatform::MacOs,
            "windows" | "win" | "standalonewindows" | "standalonewindows64" => BuildPlatform::Windows,
            "linux" | "standalonelinux64" => BuildPlatform::Linux,
            "webgl" | "web" => BuildPlatform::WebGl,
            "tvos" | "appletv" => BuildPlatform::TvOs,
            "visionos" => BuildPlatform::VisionOs,
            _ => {
                let known: Vec<&str> = BuildPlatform::ALL.iter().map(|p| p.as_str()).collect();
                return Err(format!(
                    "Unknown build platform '{}'. Expected one of: {}",
                    s,
                    known.join(", ")
                ));
            }
        };
        Ok(platform)
    }
}
