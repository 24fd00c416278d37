use std::path::PathBuf;

use mj_core::OutputFormat;

pub fn workspace_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
}

pub fn fixtures_root() -> PathBuf {
    workspace_root().join("fixtures")
}

pub fn bundles_dir() -> PathBuf {
    fixtures_root().join("bundles")
}

pub fn bundle_path(format: OutputFormat) -> PathBuf {
    bundles_dir().join(format.bundle_file_name())
}

/// Lockfile pinning the library at the version the bridge expects.
pub fn lockfile_path() -> PathBuf {
    fixtures_root().join("package-lock.json")
}

/// Lockfile pinning an older library release.
pub fn mismatched_lockfile_path() -> PathBuf {
    fixtures_root().join("package-lock.mismatch.json")
}
