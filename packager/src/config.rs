//! Build description loading and validation.
//!
//! The build description is a TOML file (by default `spatialite-aar.toml` in
//! the project root). Every key is optional; the defaults reproduce the
//! SpatiaLite Android library as it has always been shipped. Command-line
//! overrides are applied on top, then [`PackagerConfig::resolve`] validates the
//! result into a [`BuildPlan`] with absolute paths and typed values.

use crate::abi::{AbiSet, AndroidAbi};
use crate::error::{PackagerError, Result};
use crate::publish::coordinate::{Coordinate, dotted_identifier_problem};
use camino::{Utf8Path, Utf8PathBuf};
use log::debug;
use serde::{Deserialize, Serialize};

/// Default file name of the build description.
pub const DEFAULT_CONFIG_FILE: &str = "spatialite-aar.toml";

/// Placeholder substituted with the ABI in path templates.
pub const ABI_PLACEHOLDER: &str = "{abi}";

/// Raw build description as written in TOML.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct PackagerConfig {
    /// Android library metadata and target ABIs.
    pub android: AndroidSection,
    /// Native CMake project settings.
    pub cmake: CmakeSection,
    /// Static library build script settings.
    pub static_build: StaticBuildSection,
    /// Work and output directories.
    pub output: OutputSection,
    /// Maven publication settings.
    pub publication: PublicationSection,
}

/// `[android]` section.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct AndroidSection {
    /// Manifest package / library namespace.
    pub namespace: String,
    /// SDK level the library is compiled against.
    pub compile_sdk: u32,
    /// Minimum supported SDK level.
    pub min_sdk: u32,
    /// ABIs packaged into the AAR.
    pub abis: Vec<AndroidAbi>,
    /// Pinned NDK version.
    pub ndk_version: String,
}

impl Default for AndroidSection {
    fn default() -> Self {
        Self {
            namespace: "org.spatialite".to_owned(),
            compile_sdk: 33,
            min_sdk: 21,
            abis: AndroidAbi::ALL.to_vec(),
            ndk_version: "23.1.7779620".to_owned(),
        }
    }
}

/// `[cmake]` section.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct CmakeSection {
    /// Pinned CMake version looked up in the Android SDK.
    pub version: String,
    /// Path of the top-level `CMakeLists.txt`, relative to the project root.
    pub path: Utf8PathBuf,
    /// Directory of prebuilt shared objects keyed by ABI.
    pub jni_libs: Utf8PathBuf,
}

impl Default for CmakeSection {
    fn default() -> Self {
        Self {
            version: "3.22.1".to_owned(),
            path: Utf8PathBuf::from("app/src/main/jni/CMakeLists.txt"),
            jni_libs: Utf8PathBuf::from("app/src/main/jniLibs"),
        }
    }
}

/// `[static_build]` section.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct StaticBuildSection {
    /// Skip running the script; archives must already exist. On by default.
    pub skip: bool,
    /// Script to run, relative to `working_dir`.
    pub script: String,
    /// Directory the script runs in, relative to the project root.
    pub working_dir: Utf8PathBuf,
    /// ABIs requested from the script; empty means the packaged ABIs.
    pub abis: Vec<AndroidAbi>,
    /// Per-ABI archive directory template containing `{abi}`.
    pub archive_dir: String,
    /// Archive file names required in every ABI directory.
    pub archives: Vec<String>,
}

impl Default for StaticBuildSection {
    fn default() -> Self {
        Self {
            skip: true,
            script: "masterbuild.sh".to_owned(),
            working_dir: Utf8PathBuf::from("static_libs"),
            abis: Vec::new(),
            archive_dir: "static_libs/build/{abi}/lib".to_owned(),
            archives: Vec::new(),
        }
    }
}

/// `[output]` section.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct OutputSection {
    /// Root of intermediate build trees.
    pub work_dir: Utf8PathBuf,
    /// Directory receiving the finished AAR.
    pub output_dir: Utf8PathBuf,
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            work_dir: Utf8PathBuf::from("build"),
            output_dir: Utf8PathBuf::from("build/outputs/aar"),
        }
    }
}

/// `[publication]` section.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct PublicationSection {
    /// Maven group id.
    pub group: String,
    /// Maven artifact id.
    pub artifact: String,
    /// Published version.
    pub version: String,
    /// Destination: a directory path, `file://` URL, or `http(s)://` URL.
    pub repository: String,
    /// Human-readable project name for the POM.
    pub name: String,
    /// Project description for the POM.
    pub description: String,
}

impl Default for PublicationSection {
    fn default() -> Self {
        Self {
            group: "org.spatialite".to_owned(),
            artifact: "spatialite".to_owned(),
            version: "2.0.10".to_owned(),
            repository: "build/repo".to_owned(),
            name: "SpatiaLite for Android".to_owned(),
            description: "SpatiaLite spatial SQL extension and SQLite bindings for Android"
                .to_owned(),
        }
    }
}

/// Command-line values that take precedence over the build description.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    /// Skip (`Some(true)`) or run (`Some(false)`) the static build script.
    pub skip_static_build: Option<bool>,
    /// Restrict the packaged ABIs to this subset.
    pub abis: Vec<AndroidAbi>,
    /// Replace the publication version.
    pub version: Option<String>,
    /// Replace the publication repository.
    pub repository: Option<String>,
}

impl PackagerConfig {
    /// Load the build description at `path`.
    ///
    /// A missing file yields the defaults only when `required` is false, so an
    /// explicitly named file must exist.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::ConfigRead`] or [`PackagerError::ConfigParse`].
    pub fn load(path: &Utf8Path, required: bool) -> Result<Self> {
        if !path.exists() && !required {
            debug!("no build description at {path}; using defaults");
            return Ok(Self::default());
        }
        let contents =
            std::fs::read_to_string(path).map_err(|e| PackagerError::ConfigRead {
                path: path.to_owned(),
                reason: e.to_string(),
            })?;
        Self::parse(path, &contents)
    }

    /// Parse build description `contents`; `path` is used in errors only.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::ConfigParse`] on invalid TOML, unknown keys,
    /// or unsupported ABI identifiers.
    pub fn parse(path: &Utf8Path, contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| PackagerError::ConfigParse {
            path: path.to_owned(),
            reason: e.to_string(),
        })
    }

    /// Apply command-line overrides.
    #[must_use]
    pub fn with_overrides(mut self, overrides: &ConfigOverrides) -> Self {
        if let Some(skip) = overrides.skip_static_build {
            self.static_build.skip = skip;
        }
        if !overrides.abis.is_empty() {
            self.android.abis.clone_from(&overrides.abis);
        }
        if let Some(version) = &overrides.version {
            self.publication.version.clone_from(version);
        }
        if let Some(repository) = &overrides.repository {
            self.publication.repository.clone_from(repository);
        }
        self
    }

    /// Render the effective description as TOML.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::InvalidConfig`] if serialisation fails.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| PackagerError::InvalidConfig {
            reason: format!("cannot render configuration: {e}"),
        })
    }

    /// Validate the description and resolve paths against `project_root`.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::InvalidConfig`],
    /// [`PackagerError::AbiSetMismatch`], or
    /// [`PackagerError::InvalidCoordinate`] when a constraint is violated.
    pub fn resolve(&self, project_root: &Utf8Path) -> Result<BuildPlan> {
        if let Some(problem) = dotted_identifier_problem(&self.android.namespace) {
            return Err(PackagerError::InvalidConfig {
                reason: format!("android.namespace `{}` {problem}", self.android.namespace),
            });
        }
        if self.android.min_sdk > self.android.compile_sdk {
            return Err(PackagerError::InvalidConfig {
                reason: format!(
                    "android.min_sdk ({}) exceeds android.compile_sdk ({})",
                    self.android.min_sdk, self.android.compile_sdk
                ),
            });
        }

        let abis: AbiSet = self.android.abis.iter().copied().collect();
        if abis.is_empty() {
            return Err(PackagerError::InvalidConfig {
                reason: "android.abis must list at least one ABI".to_owned(),
            });
        }
        let static_abis: AbiSet = if self.static_build.abis.is_empty() {
            abis.clone()
        } else {
            self.static_build.abis.iter().copied().collect()
        };
        let missing = abis.missing_from(&static_abis);
        if !missing.is_empty() {
            return Err(PackagerError::AbiSetMismatch {
                missing: missing.to_string(),
            });
        }

        if !self.static_build.archive_dir.contains(ABI_PLACEHOLDER) {
            return Err(PackagerError::InvalidConfig {
                reason: format!("static_build.archive_dir must contain {ABI_PLACEHOLDER}"),
            });
        }
        if self.static_build.script.trim().is_empty() {
            return Err(PackagerError::InvalidConfig {
                reason: "static_build.script must not be empty".to_owned(),
            });
        }

        let coordinate = Coordinate::new(
            self.publication.group.clone(),
            self.publication.artifact.clone(),
            self.publication.version.clone(),
        )?;

        let join = |path: &Utf8PathBuf| project_root.join(path);
        Ok(BuildPlan {
            project_root: project_root.to_owned(),
            namespace: self.android.namespace.clone(),
            compile_sdk: self.android.compile_sdk,
            min_sdk: self.android.min_sdk,
            abis,
            ndk_version: self.android.ndk_version.clone(),
            cmake_version: self.cmake.version.clone(),
            cmake_lists: join(&self.cmake.path),
            jni_libs: join(&self.cmake.jni_libs),
            static_build: StaticBuildPlan {
                skip: self.static_build.skip,
                script: self.static_build.script.clone(),
                working_dir: join(&self.static_build.working_dir),
                abis: static_abis,
                archive_dir_template: project_root
                    .join(&self.static_build.archive_dir)
                    .into_string(),
                archives: self.static_build.archives.clone(),
            },
            work_dir: join(&self.output.work_dir),
            output_dir: join(&self.output.output_dir),
            coordinate,
            repository: self.publication.repository.clone(),
            pom: PomDetails {
                name: self.publication.name.clone(),
                description: self.publication.description.clone(),
            },
        })
    }
}

/// Validated static build settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticBuildPlan {
    /// Whether the script invocation is skipped.
    pub skip: bool,
    /// Script file name, relative to `working_dir`.
    pub script: String,
    /// Absolute working directory for the script.
    pub working_dir: Utf8PathBuf,
    /// ABIs the script must produce archives for.
    pub abis: AbiSet,
    /// Absolute archive directory template containing `{abi}`.
    pub archive_dir_template: String,
    /// Archive names required in every ABI directory.
    pub archives: Vec<String>,
}

impl StaticBuildPlan {
    /// Archive directory for `abi`.
    #[must_use]
    pub fn archive_dir(&self, abi: AndroidAbi) -> Utf8PathBuf {
        Utf8PathBuf::from(self.archive_dir_template.replace(ABI_PLACEHOLDER, abi.as_str()))
    }
}

/// Descriptive POM fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PomDetails {
    /// Project name.
    pub name: String,
    /// Project description.
    pub description: String,
}

/// A validated, fully resolved build description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildPlan {
    /// Project root every relative path was resolved against.
    pub project_root: Utf8PathBuf,
    /// Manifest package / library namespace.
    pub namespace: String,
    /// Target SDK level written to the manifest.
    pub compile_sdk: u32,
    /// Minimum SDK level.
    pub min_sdk: u32,
    /// ABIs packaged into the AAR.
    pub abis: AbiSet,
    /// Pinned NDK version.
    pub ndk_version: String,
    /// Pinned CMake version.
    pub cmake_version: String,
    /// Absolute path of the top-level `CMakeLists.txt`.
    pub cmake_lists: Utf8PathBuf,
    /// Absolute directory of prebuilt shared objects.
    pub jni_libs: Utf8PathBuf,
    /// Static build settings.
    pub static_build: StaticBuildPlan,
    /// Absolute root of intermediate build trees.
    pub work_dir: Utf8PathBuf,
    /// Absolute directory receiving the AAR.
    pub output_dir: Utf8PathBuf,
    /// Publication coordinate.
    pub coordinate: Coordinate,
    /// Publication destination as configured.
    pub repository: String,
    /// Descriptive POM fields.
    pub pom: PomDetails,
}

impl BuildPlan {
    /// CMake build tree for `abi`.
    #[must_use]
    pub fn cmake_build_dir(&self, abi: AndroidAbi) -> Utf8PathBuf {
        self.work_dir.join("cmake").join(abi.as_str())
    }

    /// Directory CMake writes `abi`'s shared objects to.
    #[must_use]
    pub fn native_output_dir(&self, abi: AndroidAbi) -> Utf8PathBuf {
        self.work_dir.join("native").join(abi.as_str())
    }

    /// Final AAR path.
    #[must_use]
    pub fn aar_path(&self) -> Utf8PathBuf {
        self.output_dir.join(self.coordinate.file_name("aar"))
    }
}
