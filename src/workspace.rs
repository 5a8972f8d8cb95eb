//! The workspace embedded in the generated `.xcodeproj`.
//!
//! The workspace settings pin the build system; without them the IDE picks
//! its default, which cannot index test files whose compilation is
//! suppressed.

use crate::synth::BuildSystem;

/// Contents of `project.xcworkspace/contents.xcworkspacedata`.
pub const WORKSPACE_DATA: &str = concat!(
    "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n",
    "<Workspace\n",
    "   version = \"1.0\">\n",
    "   <FileRef\n",
    "      location = \"self:\">\n",
    "   </FileRef>\n",
    "</Workspace>\n",
);

/// Path of the workspace data file inside the `.xcodeproj` directory.
pub const WORKSPACE_DATA_PATH: &str = "project.xcworkspace/contents.xcworkspacedata";

/// Path of the workspace settings file inside the `.xcodeproj` directory.
pub const WORKSPACE_SETTINGS_PATH: &str =
    "project.xcworkspace/xcshareddata/WorkspaceSettings.xcsettings";

/// Contents of `WorkspaceSettings.xcsettings` for `build_system`.
///
/// # Examples
///
/// ```
/// use pbxgen::synth::BuildSystem;
/// use pbxgen::workspace::workspace_settings;
///
/// assert!(workspace_settings(BuildSystem::Legacy).contains("<string>Original</string>"));
/// assert!(!workspace_settings(BuildSystem::New).contains("BuildSystemType"));
/// ```
#[must_use]
pub fn workspace_settings(build_system: BuildSystem) -> String {
    let mut out = String::from(concat!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n",
        "<!DOCTYPE plist PUBLIC \"-//Apple//DTD PLIST 1.0//EN\" ",
        "\"http://www.apple.com/DTDs/PropertyList-1.0.dtd\">\n",
        "<plist version=\"1.0\">\n",
        "<dict>\n",
    ));
    if build_system == BuildSystem::Legacy {
        out.push_str("\t<key>BuildSystemType</key>\n\t<string>Original</string>\n");
    }
    out.push_str("</dict>\n</plist>\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_build_system_settings_are_an_empty_dict() {
        let settings = workspace_settings(BuildSystem::New);
        assert!(settings.ends_with("<plist version=\"1.0\">\n<dict>\n</dict>\n</plist>\n"));
    }

    #[test]
    fn workspace_data_references_the_project_itself() {
        assert!(WORKSPACE_DATA.contains("location = \"self:\""));
        assert!(WORKSPACE_DATA.ends_with("</Workspace>\n"));
    }
}
