//! Android NDK detection and validation.
//!
//! The NDK is located from, in order: an explicit path, `NDK_HOME`,
//! `ANDROID_NDK_HOME`, then `<sdk>/ndk/<pinned version>` under
//! `ANDROID_HOME` or `ANDROID_SDK_ROOT`. The chosen directory must contain the
//! CMake toolchain file, and its `source.properties` revision must match the
//! pinned version when it declares one.

use crate::error::{PackagerError, Result};
use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, warn};

/// Relative path of the CMake toolchain file inside an NDK.
const TOOLCHAIN_FILE: &str = "build/cmake/android.toolchain.cmake";

/// Where to look for the NDK and SDK.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NdkSearch {
    /// Path given on the command line.
    pub explicit: Option<Utf8PathBuf>,
    /// Value of `NDK_HOME`.
    pub ndk_home: Option<Utf8PathBuf>,
    /// Value of `ANDROID_NDK_HOME`.
    pub android_ndk_home: Option<Utf8PathBuf>,
    /// Value of `ANDROID_HOME`, falling back to `ANDROID_SDK_ROOT`.
    pub sdk_root: Option<Utf8PathBuf>,
}

impl NdkSearch {
    /// Build a search from the process environment.
    #[must_use]
    pub fn from_env(explicit: Option<Utf8PathBuf>) -> Self {
        let var = |key: &str| {
            std::env::var(key)
                .ok()
                .filter(|v| !v.is_empty())
                .map(Utf8PathBuf::from)
        };
        Self {
            explicit,
            ndk_home: var("NDK_HOME"),
            android_ndk_home: var("ANDROID_NDK_HOME"),
            sdk_root: var("ANDROID_HOME").or_else(|| var("ANDROID_SDK_ROOT")),
        }
    }

    /// Candidate NDK roots in priority order.
    fn candidates(&self, pinned_version: &str) -> Vec<Utf8PathBuf> {
        let sdk_candidate = self
            .sdk_root
            .as_ref()
            .map(|sdk| sdk.join("ndk").join(pinned_version));
        [
            self.explicit.clone(),
            self.ndk_home.clone(),
            self.android_ndk_home.clone(),
            sdk_candidate,
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    /// Locate and validate the NDK.
    ///
    /// The first candidate that exists is used; later candidates are not
    /// consulted even if the first one turns out to be invalid.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::NdkNotFound`] if no candidate exists or the
    /// chosen one lacks the toolchain file, and
    /// [`PackagerError::NdkVersionMismatch`] if its revision differs from
    /// `pinned_version`.
    pub fn locate(&self, pinned_version: &str) -> Result<Ndk> {
        let candidates = self.candidates(pinned_version);
        let root = candidates
            .iter()
            .find(|c| c.is_dir())
            .cloned()
            .ok_or_else(|| PackagerError::NdkNotFound {
                reason: if candidates.is_empty() {
                    "no NDK location configured".to_owned()
                } else {
                    format!(
                        "none of {} exist",
                        candidates
                            .iter()
                            .map(|c| c.as_str())
                            .collect::<Vec<_>>()
                            .join(", ")
                    )
                },
            })?;
        debug!("using NDK at {root}");

        let ndk = Ndk {
            toolchain_file: root.join(TOOLCHAIN_FILE),
            revision: read_revision(&root)?,
            root,
            sdk_root: self.sdk_root.clone(),
        };

        if !ndk.toolchain_file.is_file() {
            return Err(PackagerError::NdkNotFound {
                reason: format!("{} has no {TOOLCHAIN_FILE}", ndk.root),
            });
        }

        match &ndk.revision {
            Some(found) if found != pinned_version => Err(PackagerError::NdkVersionMismatch {
                path: ndk.root.clone(),
                expected: pinned_version.to_owned(),
                found: found.clone(),
            }),
            Some(_) => Ok(ndk),
            None => {
                warn!("{} has no Pkg.Revision; cannot confirm version {pinned_version}", ndk.root);
                Ok(ndk)
            }
        }
    }
}

/// A located Android NDK.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ndk {
    root: Utf8PathBuf,
    toolchain_file: Utf8PathBuf,
    revision: Option<String>,
    sdk_root: Option<Utf8PathBuf>,
}

impl Ndk {
    /// Construct an NDK handle without validation.
    ///
    /// Callers are responsible for ensuring `root` is a real NDK.
    #[must_use]
    pub fn unchecked(root: &Utf8Path, sdk_root: Option<&Utf8Path>) -> Self {
        Self {
            root: root.to_owned(),
            toolchain_file: root.join(TOOLCHAIN_FILE),
            revision: None,
            sdk_root: sdk_root.map(Utf8Path::to_owned),
        }
    }

    /// NDK root directory.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// CMake toolchain file.
    #[must_use]
    pub fn toolchain_file(&self) -> &Utf8Path {
        &self.toolchain_file
    }

    /// Revision from `source.properties`, if declared.
    #[must_use]
    pub fn revision(&self) -> Option<&str> {
        self.revision.as_deref()
    }

    /// CMake program to use for `version`.
    ///
    /// Prefers the SDK-managed `<sdk>/cmake/<version>/bin/cmake` and falls
    /// back to `cmake` on `PATH`.
    #[must_use]
    pub fn cmake_program(&self, version: &str) -> String {
        let exe = if cfg!(windows) { "cmake.exe" } else { "cmake" };
        self.sdk_root
            .as_ref()
            .map(|sdk| sdk.join("cmake").join(version).join("bin").join(exe))
            .filter(|path| path.is_file())
            .map_or_else(|| exe.to_owned(), Utf8PathBuf::into_string)
    }
}

fn read_revision(root: &Utf8Path) -> Result<Option<String>> {
    let path = root.join("source.properties");
    if !path.is_file() {
        return Ok(None);
    }
    let contents = std::fs::read_to_string(&path)?;
    Ok(parse_revision(&contents))
}

/// Extract `Pkg.Revision` from the contents of an NDK `source.properties`.
///
/// # Examples
///
/// ```
/// use spatialite_aar::ndk::parse_revision;
///
/// let props = "Pkg.Desc = Android NDK\nPkg.Revision = 23.1.7779620\n";
/// assert_eq!(parse_revision(props).as_deref(), Some("23.1.7779620"));
/// ```
#[must_use]
pub fn parse_revision(contents: &str) -> Option<String> {
    contents.lines().find_map(|line| {
        let (key, value) = line.split_once('=')?;
        (key.trim() == "Pkg.Revision").then(|| value.trim().to_owned())
    })
}
