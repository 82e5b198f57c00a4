//! ---
//! elektra_section: "01-core-functionality"
//! elektra_subsection: "module"
//! elektra_type: "source"
//! elektra_scope: "code"
//! elektra_description: "Shared configuration primitives for the estimation runtime."
//! elektra_version: "v0.1.0"
//! elektra_owner: "tbd"
//! ---
use serde::Serialize;

const UNKNOWN: &str = "UNKNOWN";

/// Build provenance baked into the binary, surfaced by `--version` flags and
/// the startup log line.
///
/// Release builds inject the `VERGEN_*` values; local builds fall back to
/// `UNKNOWN` without needing a build script.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct VersionInfo {
    pub semver: &'static str,
    pub git_sha: &'static str,
    pub build_timestamp: &'static str,
    pub target: &'static str,
    pub profile: &'static str,
}

impl VersionInfo {
    /// Version metadata of the running binary.
    #[must_use]
    pub fn current() -> Self {
        Self {
            semver: env!("CARGO_PKG_VERSION"),
            git_sha: option_env!("VERGEN_GIT_SHA").unwrap_or(UNKNOWN),
            build_timestamp: option_env!("VERGEN_BUILD_TIMESTAMP").unwrap_or(UNKNOWN),
            target: option_env!("VERGEN_CARGO_TARGET_TRIPLE").unwrap_or(UNKNOWN),
            profile: option_env!("VERGEN_CARGO_PROFILE").unwrap_or(UNKNOWN),
        }
    }

    /// Short `version (sha)` form for log fields.
    #[must_use]
    pub fn cli_string(&self) -> String {
        format!("{} ({})", self.semver, self.git_sha)
    }

    /// Multi-line form for `--version` output.
    #[must_use]
    pub fn extended(&self) -> String {
        [
            format!("Elektra v{} (git {})", self.semver, self.git_sha),
            format!("Built: {}", self.build_timestamp),
            format!("Target: {}", self.target),
            format!("Profile: {}", self.profile),
        ]
        .join("\n")
    }
}
