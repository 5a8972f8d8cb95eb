//! Project-level settings derived from the build settings.

use crate::graph::{BuildArgs, BuildSettings};
use crate::pbx::Attributes;

/// Operating system the build targets, as far as the project cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetOs {
    /// iOS; executables cannot run on their own.
    Ios,
    /// tvOS; executables cannot run on their own.
    Tvos,
    /// Everything else is treated as macOS.
    Macos,
}

impl TargetOs {
    /// Classify the `target_os` build argument.
    #[must_use]
    pub fn from_args(args: &BuildArgs) -> Self {
        match args.target_os.as_deref() {
            Some("ios") => Self::Ios,
            Some("tvos") => Self::Tvos,
            _ => Self::Macos,
        }
    }

    /// Whether plain executables are skipped for this OS.
    #[must_use]
    pub const fn skips_executables(self) -> bool {
        matches!(self, Self::Ios | Self::Tvos)
    }
}

// Set so the IDE does not offer to upgrade the project. Ninja ignores them.
const UPGRADE_CHECK_SETTINGS: [(&str, &str); 30] = [
    ("ALWAYS_SEARCH_USER_PATHS", "NO"),
    ("CLANG_ANALYZER_LOCALIZABILITY_NONLOCALIZED", "YES"),
    ("CLANG_WARN__DUPLICATE_METHOD_MATCH", "YES"),
    ("CLANG_WARN_BLOCK_CAPTURE_AUTORELEASING", "YES"),
    ("CLANG_WARN_BOOL_CONVERSION", "YES"),
    ("CLANG_WARN_COMMA", "YES"),
    ("CLANG_WARN_CONSTANT_CONVERSION", "YES"),
    ("CLANG_WARN_DEPRECATED_OBJC_IMPLEMENTATIONS", "YES"),
    ("CLANG_WARN_EMPTY_BODY", "YES"),
    ("CLANG_WARN_ENUM_CONVERSION", "YES"),
    ("CLANG_WARN_INFINITE_RECURSION", "YES"),
    ("CLANG_WARN_INT_CONVERSION", "YES"),
    ("CLANG_WARN_NON_LITERAL_NULL_CONVERSION", "YES"),
    ("CLANG_WARN_OBJC_IMPLICIT_RETAIN_SELF", "YES"),
    ("CLANG_WARN_OBJC_LITERAL_CONVERSION", "YES"),
    ("CLANG_WARN_QUOTED_INCLUDE_IN_FRAMEWORK_HEADER", "YES"),
    ("CLANG_WARN_RANGE_LOOP_ANALYSIS", "YES"),
    ("CLANG_WARN_STRICT_PROTOTYPES", "YES"),
    ("CLANG_WARN_SUSPICIOUS_MOVE", "YES"),
    ("CLANG_WARN_UNREACHABLE_CODE", "YES"),
    ("ENABLE_STRICT_OBJC_MSGSEND", "YES"),
    ("ENABLE_TESTABILITY", "YES"),
    ("GCC_NO_COMMON_BLOCKS", "YES"),
    ("GCC_WARN_64_TO_32_BIT_CONVERSION", "YES"),
    ("GCC_WARN_ABOUT_RETURN_TYPE", "YES"),
    ("GCC_WARN_UNDECLARED_SELECTOR", "YES"),
    ("GCC_WARN_UNINITIALIZED_AUTOS", "YES"),
    ("GCC_WARN_UNUSED_FUNCTION", "YES"),
    ("GCC_WARN_UNUSED_VARIABLE", "YES"),
    ("ONLY_ACTIVE_ARCH", "YES"),
];

/// Build settings of the project's single configuration.
#[must_use]
pub fn project_attributes(settings: &BuildSettings) -> Attributes {
    let mut attributes = Attributes::new();
    let sdk = match TargetOs::from_args(&settings.args) {
        TargetOs::Ios => {
            attributes.insert(String::from("TARGETED_DEVICE_FAMILY"), String::from("1,2"));
            "iphoneos"
        }
        TargetOs::Tvos => {
            attributes.insert(String::from("TARGETED_DEVICE_FAMILY"), String::from("3"));
            "appletvos"
        }
        TargetOs::Macos => "macosx",
    };
    attributes.insert(String::from("SDKROOT"), sdk.to_owned());
    attributes.extend(
        UPGRADE_CHECK_SETTINGS
            .iter()
            .map(|(key, value)| ((*key).to_owned(), (*value).to_owned())),
    );
    attributes
}

/// Configuration name: the build directory's base name up to the first `-`.
///
/// A build directory at the source root falls back to the root's own name.
///
/// # Examples
///
/// ```
/// use camino::Utf8PathBuf;
/// use pbxgen::graph::{BuildArgs, BuildSettings, SourceDir};
/// use pbxgen::synth::attributes::config_name;
///
/// let settings = BuildSettings {
///     root_path: Utf8PathBuf::from("/src"),
///     build_dir: SourceDir::parse("//out/Release-iphoneos/").expect("dir"),
///     args: BuildArgs::default(),
/// };
/// assert_eq!(config_name(&settings), "Release");
/// ```
#[must_use]
pub fn config_name(settings: &BuildSettings) -> String {
    let base = settings
        .build_dir
        .components()
        .last()
        .or_else(|| settings.root_path.file_name())
        .unwrap_or_default();
    base.split_once('-')
        .map_or(base, |(head, _)| head)
        .to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::SourceDir;
    use camino::Utf8PathBuf;
    use rstest::rstest;

    fn settings(build_dir: &str, target_os: Option<&str>) -> BuildSettings {
        BuildSettings {
            root_path: Utf8PathBuf::from("/work/chromium"),
            build_dir: SourceDir::parse(build_dir).expect("dir"),
            args: BuildArgs {
                target_os: target_os.map(str::to_owned),
            },
        }
    }

    #[rstest]
    #[case(Some("ios"), "iphoneos", Some("1,2"))]
    #[case(Some("tvos"), "appletvos", Some("3"))]
    #[case(Some("mac"), "macosx", None)]
    #[case(None, "macosx", None)]
    fn sdk_follows_target_os(
        #[case] target_os: Option<&str>,
        #[case] sdk: &str,
        #[case] family: Option<&str>,
    ) {
        let attributes = project_attributes(&settings("//out/Debug", target_os));
        assert_eq!(attributes.get("SDKROOT").map(String::as_str), Some(sdk));
        assert_eq!(
            attributes.get("TARGETED_DEVICE_FAMILY").map(String::as_str),
            family
        );
        assert_eq!(
            attributes.get("ALWAYS_SEARCH_USER_PATHS").map(String::as_str),
            Some("NO")
        );
        assert_eq!(
            attributes.get("ONLY_ACTIVE_ARCH").map(String::as_str),
            Some("YES")
        );
    }

    #[rstest]
    #[case("//out/Debug-iphonesimulator/", "Debug")]
    #[case("//out/Release", "Release")]
    #[case("//out/a-b-c", "a")]
    #[case("//", "chromium")]
    fn config_name_is_truncated_at_first_dash(#[case] build_dir: &str, #[case] expected: &str) {
        assert_eq!(config_name(&settings(build_dir, None)), expected);
    }
}
