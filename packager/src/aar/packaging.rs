//! AAR archive creation.
//!
//! Writes `AndroidManifest.xml`, an empty `classes.jar`, an empty `R.txt`,
//! and `jni/<abi>/<lib>.so` for every declared ABI into a zip archive. All
//! entries carry the same fixed timestamp and permissions and are written in
//! sorted order, so identical inputs produce identical bytes. The archive is
//! built in a temporary file next to its destination and renamed into place.

use super::digest::{Sha256Digest, compute_sha256};
use super::manifest::{JAR_MANIFEST, LibraryManifest};
use super::packaging_error::PackagingError;
use crate::abi::{AbiSet, AndroidAbi};
use crate::native::SharedObjects;
use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, info};
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Cursor, Seek, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

/// Input parameters for [`package_aar`].
#[derive(Debug, Clone)]
pub struct AarParams {
    /// Manifest fields.
    pub manifest: LibraryManifest,
    /// ABIs the archive must contain.
    pub declared: AbiSet,
    /// Shared objects to package, keyed by ABI.
    pub shared_objects: SharedObjects,
    /// Directory receiving the archive.
    pub output_dir: Utf8PathBuf,
    /// Archive file name, e.g. `spatialite-2.0.10.aar`.
    pub file_name: String,
}

/// A finished AAR on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackagedAar {
    /// Location of the archive.
    pub path: Utf8PathBuf,
    /// SHA-256 of the archive bytes.
    pub digest: Sha256Digest,
    /// Shared object file names packaged per ABI.
    pub libraries: BTreeMap<AndroidAbi, Vec<String>>,
}

enum EntrySource<'a> {
    Bytes(Vec<u8>),
    File(&'a Utf8Path),
}

fn entry_options() -> SimpleFileOptions {
    SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default())
        .unix_permissions(0o644)
}

/// Check that shared objects cover exactly the declared ABIs.
///
/// # Errors
///
/// Returns [`PackagingError::NoAbis`], [`PackagingError::MissingAbi`], or
/// [`PackagingError::UndeclaredAbi`].
pub fn check_abi_coverage(
    declared: &AbiSet,
    shared_objects: &SharedObjects,
) -> Result<(), PackagingError> {
    if declared.is_empty() {
        return Err(PackagingError::NoAbis);
    }
    if let Some(abi) = shared_objects.abis().iter().find(|abi| !declared.contains(*abi)) {
        return Err(PackagingError::UndeclaredAbi { abi });
    }
    if let Some(abi) = declared.iter().find(|abi| shared_objects.get(*abi).is_empty()) {
        return Err(PackagingError::MissingAbi { abi });
    }
    Ok(())
}

/// Build the bytes of an empty `classes.jar`.
///
/// # Errors
///
/// Returns [`PackagingError::Zip`] if the in-memory archive cannot be written.
pub fn empty_classes_jar() -> Result<Vec<u8>, PackagingError> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    writer.start_file("META-INF/MANIFEST.MF", entry_options())?;
    writer.write_all(JAR_MANIFEST.as_bytes())?;
    Ok(writer.finish()?.into_inner())
}

/// Package shared objects into an AAR.
///
/// # Errors
///
/// Returns an ABI coverage error before anything is written, or
/// [`PackagingError::Io`] / [`PackagingError::Zip`] if writing fails. On
/// failure no file exists at the destination path.
pub fn package_aar(params: AarParams) -> Result<PackagedAar, PackagingError> {
    check_abi_coverage(&params.declared, &params.shared_objects)?;

    let mut entries: BTreeMap<String, EntrySource<'_>> = BTreeMap::new();
    entries.insert(
        "AndroidManifest.xml".to_owned(),
        EntrySource::Bytes(params.manifest.render().into_bytes()),
    );
    entries.insert(
        "classes.jar".to_owned(),
        EntrySource::Bytes(empty_classes_jar()?),
    );
    entries.insert("R.txt".to_owned(), EntrySource::Bytes(Vec::new()));

    let mut libraries = BTreeMap::new();
    for abi in params.declared.iter() {
        let objects = params.shared_objects.get(abi);
        for object in objects {
            entries.insert(
                format!("jni/{abi}/{}", object.file_name),
                EntrySource::File(&object.path),
            );
        }
        libraries.insert(
            abi,
            objects.iter().map(|o| o.file_name.clone()).collect::<Vec<_>>(),
        );
    }

    fs::create_dir_all(&params.output_dir)?;
    let path = params.output_dir.join(&params.file_name);
    let mut staged = tempfile::NamedTempFile::new_in(&params.output_dir)?;
    write_entries(staged.as_file_mut(), &entries)?;
    staged.as_file().sync_all()?;
    staged.persist(&path).map_err(|e| PackagingError::Io(e.error))?;

    let digest = compute_sha256(&path)?;
    info!("packaged {path} ({} entries)", entries.len());
    debug!("{path} sha256 {digest}");
    Ok(PackagedAar {
        path,
        digest,
        libraries,
    })
}

fn write_entries<W: Write + Seek>(
    sink: W,
    entries: &BTreeMap<String, EntrySource<'_>>,
) -> Result<(), PackagingError> {
    let mut writer = ZipWriter::new(sink);
    for (name, source) in entries {
        writer.start_file(name.as_str(), entry_options())?;
        match source {
            EntrySource::Bytes(bytes) => writer.write_all(bytes)?,
            EntrySource::File(path) => {
                let mut file = fs::File::open(path)?;
                io::copy(&mut file, &mut writer)?;
            }
        }
    }
    writer.finish()?;
    Ok(())
}

#[cfg(test)]
#[path = "packaging_tests.rs"]
mod tests;
