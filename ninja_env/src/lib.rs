#![forbid(unsafe_code)]

//! Environment names shared by the pbxgen library, its tests and helpers.

/// Environment variable that overrides the Ninja executable embedded in the
/// generated build scripts and spawned by `pbxgen relay`.
///
/// # Examples
///
/// ```
/// use ninja_env::NINJA_ENV;
/// assert_eq!(NINJA_ENV, "PBXGEN_NINJA");
/// ```
pub const NINJA_ENV: &str = "PBXGEN_NINJA";

/// Executable name used when neither the command line nor [`NINJA_ENV`]
/// names a backend.
pub const DEFAULT_NINJA: &str = "ninja";
