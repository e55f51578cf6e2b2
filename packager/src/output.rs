//! User-facing output for the packager CLI.
//!
//! Progress and results go to stderr as plain lines; detailed diagnostics go
//! through the `log` facade instead.

use crate::aar::packaging::PackagedAar;
use crate::config::BuildPlan;
use crate::executor::CommandSpec;
use crate::publish::publisher::PublicationReceipt;
use crate::static_libs::StaticArchives;
use camino::Utf8Path;
use std::io::Write;

/// Write one line to `out`, ignoring write failures.
///
/// Progress and errors go to stderr; `show-config` output goes to stdout.
pub fn write_line(out: &mut dyn Write, message: impl std::fmt::Display) {
    if writeln!(out, "{message}").is_err() {
        // Best-effort output; ignore write failures.
    }
}

/// Summary printed after the static library build.
#[must_use]
pub fn static_libs_message(archives: &StaticArchives) -> String {
    let abis: Vec<String> = archives.abis().map(|abi| abi.to_string()).collect();
    format!("Static archives ready for {}", abis.join(", "))
}

/// Summary printed after packaging.
#[must_use]
pub fn packaged_message(aar: &PackagedAar) -> String {
    let libraries: usize = aar.libraries.values().map(Vec::len).sum();
    let plural = if libraries == 1 { "library" } else { "libraries" };
    format!(
        "Packaged {libraries} native {plural} for {} ABI(s) into {}\n  sha256 {}",
        aar.libraries.len(),
        aar.path,
        aar.digest
    )
}

/// Summary printed after publication.
#[must_use]
pub fn published_message(receipt: &PublicationReceipt) -> String {
    format!(
        "Published {} to {} ({} files)",
        receipt.coordinate,
        receipt.repository,
        receipt.files.len()
    )
}

/// Information shown by `--dry-run`.
///
/// # Example
///
/// ```
/// use camino::Utf8Path;
/// use spatialite_aar::config::PackagerConfig;
/// use spatialite_aar::output::DryRunInfo;
///
/// let plan = PackagerConfig::default()
///     .resolve(Utf8Path::new("/work/spatialite-android"))
///     .expect("defaults are valid");
/// let info = DryRunInfo {
///     plan: &plan,
///     ndk_root: Utf8Path::new("/opt/android-ndk"),
///     last_stage: "build",
///     commands: &[],
/// };
///
/// let text = info.display_text();
/// assert!(text.contains("Dry run"));
/// assert!(text.contains("org.spatialite:spatialite:2.0.10"));
/// ```
#[derive(Debug)]
pub struct DryRunInfo<'a> {
    /// Resolved build description.
    pub plan: &'a BuildPlan,
    /// NDK that would be used.
    pub ndk_root: &'a Utf8Path,
    /// Last pipeline stage that would run.
    pub last_stage: &'a str,
    /// External commands that would run, in order.
    pub commands: &'a [CommandSpec],
}

impl DryRunInfo<'_> {
    /// Format the dry-run information for display.
    #[must_use]
    pub fn display_text(&self) -> String {
        let plan = self.plan;
        let mut lines = vec![
            "Dry run - no files will be modified".to_owned(),
            String::new(),
            format!("Project root: {}", plan.project_root),
            format!("NDK: {}", self.ndk_root),
            format!("ABIs: {}", plan.abis),
            format!("Static build ABIs: {}", plan.static_build.abis),
            format!("Skip static build: {}", plan.static_build.skip),
            format!("CMake project: {}", plan.cmake_lists),
            format!("AAR: {}", plan.aar_path()),
            format!("Coordinate: {}", plan.coordinate),
            format!("Repository: {}", plan.repository),
            format!("Last stage: {}", self.last_stage),
        ];

        if !self.commands.is_empty() {
            lines.push(String::new());
            lines.push("Commands:".to_owned());
            for command in self.commands {
                lines.push(format!("  $ {command}"));
            }
        }

        lines.join("\n")
    }
}
