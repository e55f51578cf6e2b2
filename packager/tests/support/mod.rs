//! Test support utilities for packager behavioural tests.
//!
//! Provides a throwaway project tree, a fake NDK that passes discovery, and
//! helpers for running the pipeline against the scripted fake toolchain.

#![allow(dead_code)]

use camino::{Utf8Path, Utf8PathBuf};
use spatialite_aar::config::{BuildPlan, ConfigOverrides, PackagerConfig};
use spatialite_aar::ndk::Ndk;
use std::fs;
use tempfile::TempDir;

/// NDK revision the default build description pins.
pub const PINNED_NDK: &str = "23.1.7779620";

/// A temporary project root with a resolved plan.
pub struct Project {
    _temp: TempDir,
    /// Absolute project root.
    pub root: Utf8PathBuf,
    /// Plan resolved from the project's build description.
    pub plan: BuildPlan,
}

/// Default build description with the static build script enabled.
pub fn static_build_config() -> PackagerConfig {
    PackagerConfig::default().with_overrides(&ConfigOverrides {
        skip_static_build: Some(false),
        ..ConfigOverrides::default()
    })
}

impl Project {
    /// A project that runs the static build script.
    pub fn new() -> Self {
        Self::with_config(static_build_config())
    }

    /// A project using `config`.
    pub fn with_config(config: PackagerConfig) -> Self {
        let temp = tempfile::tempdir().expect("temp dir");
        let root = utf8(temp.path());
        let plan = config.resolve(&root).expect("valid build description");
        Self {
            _temp: temp,
            root,
            plan,
        }
    }

    /// A located-looking NDK handle that is never executed.
    pub fn ndk(&self) -> Ndk {
        Ndk::unchecked(Utf8Path::new("/opt/android-ndk"), None)
    }

    /// Local repository root used by the default plan.
    pub fn repository_root(&self) -> Utf8PathBuf {
        self.root.join(&self.plan.repository)
    }
}

/// Create an NDK directory that passes discovery for `revision`.
pub fn fake_ndk(parent: &Utf8Path, revision: &str) -> Utf8PathBuf {
    let root = parent.join("android-ndk");
    let cmake = root.join("build/cmake");
    fs::create_dir_all(&cmake).expect("create NDK tree");
    fs::write(cmake.join("android.toolchain.cmake"), "# toolchain\n").expect("write toolchain");
    fs::write(
        root.join("source.properties"),
        format!("Pkg.Desc = Android NDK\nPkg.Revision = {revision}\n"),
    )
    .expect("write source.properties");
    root
}

/// Convert a temp path to UTF-8.
pub fn utf8(path: &std::path::Path) -> Utf8PathBuf {
    Utf8PathBuf::try_from(path.to_path_buf()).expect("temp path is UTF-8")
}
