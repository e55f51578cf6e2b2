//! Publication of a packaged AAR under a Maven coordinate.
//!
//! A [`Publication`] starts [`PublicationState::Unpublished`] and moves to
//! `Published` or `Failed` after one attempt. The attempt first asks the
//! repository whether the coordinate's POM or AAR already exists and writes
//! nothing if so. Otherwise it uploads the AAR, the POM, and their SHA-256 and
//! SHA-512 checksums as one version, then refreshes `maven-metadata.xml`.

use super::coordinate::Coordinate;
use super::error::PublishError;
use super::metadata::{METADATA_FILE, MavenMetadata};
use super::pom::render_pom;
use super::repository::{PublishedFile, Repository};
use crate::aar::digest::{sha256_hex, sha512_hex};
use crate::config::PomDetails;
use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, info};

/// Lifecycle of one publication attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublicationState {
    /// Nothing has been attempted yet.
    Unpublished,
    /// Every file was written.
    Published,
    /// The attempt failed.
    Failed {
        /// Rendered error.
        reason: String,
    },
}

/// Proof of a completed publication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicationReceipt {
    /// Published coordinate.
    pub coordinate: Coordinate,
    /// Repository the files went to.
    pub repository: String,
    /// Repository-relative paths written, in upload order.
    pub files: Vec<String>,
    /// SHA-256 of the published AAR.
    pub aar_sha256: String,
}

/// One artifact awaiting publication.
#[derive(Debug)]
pub struct Publication {
    coordinate: Coordinate,
    aar: Utf8PathBuf,
    pom: PomDetails,
    state: PublicationState,
}

impl Publication {
    /// Prepare the publication of the AAR at `aar` under `coordinate`.
    #[must_use]
    pub fn new(coordinate: Coordinate, aar: &Utf8Path, pom: PomDetails) -> Self {
        Self {
            coordinate,
            aar: aar.to_owned(),
            pom,
            state: PublicationState::Unpublished,
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> &PublicationState {
        &self.state
    }

    /// Coordinate being published.
    #[must_use]
    pub fn coordinate(&self) -> &Coordinate {
        &self.coordinate
    }

    /// Publish to `repository`, stamping metadata with `timestamp`.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::AlreadyAttempted`] unless the publication is
    /// still unpublished, [`PublishError::DuplicateCoordinate`] if the
    /// coordinate exists, or the backend's I/O or HTTP error.
    pub fn publish(
        &mut self,
        repository: &dyn Repository,
        timestamp: &str,
    ) -> Result<PublicationReceipt, PublishError> {
        if self.state != PublicationState::Unpublished {
            return Err(PublishError::AlreadyAttempted {
                coordinate: self.coordinate.clone(),
            });
        }
        match self.attempt(repository, timestamp) {
            Ok(receipt) => {
                self.state = PublicationState::Published;
                Ok(receipt)
            }
            Err(err) => {
                self.state = PublicationState::Failed {
                    reason: err.to_string(),
                };
                Err(err)
            }
        }
    }

    fn attempt(
        &self,
        repository: &dyn Repository,
        timestamp: &str,
    ) -> Result<PublicationReceipt, PublishError> {
        let coordinate = &self.coordinate;
        for extension in ["pom", "aar"] {
            if repository.exists(&coordinate.file_path(extension))? {
                return Err(PublishError::DuplicateCoordinate {
                    coordinate: coordinate.clone(),
                });
            }
        }

        let aar = std::fs::read(&self.aar)?;
        let aar_sha256 = sha256_hex(&aar);
        let pom = render_pom(coordinate, &self.pom).into_bytes();

        let mut files = Vec::with_capacity(6);
        push_with_checksums(&mut files, coordinate.file_name("aar"), aar);
        push_with_checksums(&mut files, coordinate.file_name("pom"), pom);

        info!("publishing {coordinate} to {}", repository.describe());
        repository.publish_version(coordinate, &files)?;

        let mut written: Vec<String> = files
            .iter()
            .map(|f| format!("{}/{}", coordinate.version_dir(), f.name))
            .collect();
        written.extend(self.update_metadata(repository, timestamp)?);

        Ok(PublicationReceipt {
            coordinate: coordinate.clone(),
            repository: repository.describe(),
            files: written,
            aar_sha256,
        })
    }

    fn update_metadata(
        &self,
        repository: &dyn Repository,
        timestamp: &str,
    ) -> Result<Vec<String>, PublishError> {
        let coordinate = &self.coordinate;
        let path = format!("{}/{METADATA_FILE}", coordinate.artifact_dir());
        let mut metadata = match repository.read(&path)? {
            Some(bytes) => {
                let xml = String::from_utf8(bytes).map_err(|e| PublishError::Metadata {
                    path: path.clone(),
                    reason: e.to_string(),
                })?;
                MavenMetadata::parse(coordinate, &xml)?
            }
            None => MavenMetadata::new(coordinate),
        };
        metadata.add_version(coordinate.version(), timestamp);
        debug!("{path}: versions {}", metadata.versions().join(", "));

        let xml = metadata.render().into_bytes();
        let sha256 = sha256_hex(&xml);
        let sha512 = sha512_hex(&xml);
        repository.write(&path, &xml)?;
        repository.write(&format!("{path}.sha256"), sha256.as_bytes())?;
        repository.write(&format!("{path}.sha512"), sha512.as_bytes())?;
        Ok(vec![
            path.clone(),
            format!("{path}.sha256"),
            format!("{path}.sha512"),
        ])
    }
}

fn push_with_checksums(files: &mut Vec<PublishedFile>, name: String, contents: Vec<u8>) {
    let sha256 = sha256_hex(&contents);
    let sha512 = sha512_hex(&contents);
    files.push(PublishedFile {
        name: format!("{name}.sha256"),
        contents: sha256.into_bytes(),
    });
    files.push(PublishedFile {
        name: format!("{name}.sha512"),
        contents: sha512.into_bytes(),
    });
    files.push(PublishedFile { name, contents });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::publish::repository::{LocalRepository, MockRepository};
    use mockall::predicate::eq;
    use rstest::{fixture, rstest};
    use std::fs;
    use tempfile::TempDir;

    const STAMP: &str = "20261016120000";

    struct Fixture {
        _temp: TempDir,
        root: Utf8PathBuf,
        aar: Utf8PathBuf,
    }

    #[fixture]
    fn fixture() -> Fixture {
        let temp = tempfile::tempdir().expect("temp dir");
        let root = Utf8PathBuf::try_from(temp.path().to_path_buf()).expect("utf-8");
        let aar = root.join("spatialite-2.0.10.aar");
        fs::write(&aar, b"PK\x03\x04 fake aar").expect("write");
        Fixture {
            _temp: temp,
            root,
            aar,
        }
    }

    fn coordinate(version: &str) -> Coordinate {
        Coordinate::new("org.spatialite", "spatialite", version).expect("valid coordinate")
    }

    fn pom() -> PomDetails {
        PomDetails {
            name: "SpatiaLite for Android".to_owned(),
            description: "test".to_owned(),
        }
    }

    #[rstest]
    fn publishes_files_checksums_and_metadata(fixture: Fixture) {
        let repo = LocalRepository::new(fixture.root.join("repo"));
        let mut publication = Publication::new(coordinate("2.0.10"), &fixture.aar, pom());

        let receipt = publication.publish(&repo, STAMP).expect("publish succeeds");

        assert_eq!(publication.state(), &PublicationState::Published);
        let version_dir = repo.root().join("org/spatialite/spatialite/2.0.10");
        for name in [
            "spatialite-2.0.10.aar",
            "spatialite-2.0.10.aar.sha256",
            "spatialite-2.0.10.aar.sha512",
            "spatialite-2.0.10.pom",
            "spatialite-2.0.10.pom.sha256",
            "spatialite-2.0.10.pom.sha512",
        ] {
            assert!(version_dir.join(name).is_file(), "{name} missing");
        }
        let aar_sum = fs::read_to_string(version_dir.join("spatialite-2.0.10.aar.sha256"))
            .expect("read checksum");
        assert_eq!(aar_sum, receipt.aar_sha256);
        let metadata = fs::read_to_string(
            repo.root()
                .join("org/spatialite/spatialite/maven-metadata.xml"),
        )
        .expect("metadata written");
        assert!(metadata.contains("<release>2.0.10</release>"));
        assert_eq!(receipt.files.len(), 9);
    }

    #[rstest]
    fn second_publication_of_same_coordinate_fails(fixture: Fixture) {
        let repo = LocalRepository::new(fixture.root.join("repo"));
        Publication::new(coordinate("2.0.10"), &fixture.aar, pom())
            .publish(&repo, STAMP)
            .expect("first publish");
        let aar_path = repo
            .root()
            .join("org/spatialite/spatialite/2.0.10/spatialite-2.0.10.aar");
        let before = fs::read(&aar_path).expect("read");

        fs::write(&fixture.aar, b"rebuilt").expect("write");
        let mut again = Publication::new(coordinate("2.0.10"), &fixture.aar, pom());
        let err = again.publish(&repo, STAMP).expect_err("duplicate");

        assert!(matches!(err, PublishError::DuplicateCoordinate { .. }));
        assert!(matches!(again.state(), PublicationState::Failed { .. }));
        assert_eq!(fs::read(&aar_path).expect("read"), before);
    }

    #[rstest]
    fn new_version_extends_metadata(fixture: Fixture) {
        let repo = LocalRepository::new(fixture.root.join("repo"));
        Publication::new(coordinate("2.0.9"), &fixture.aar, pom())
            .publish(&repo, "20250101000000")
            .expect("first");
        Publication::new(coordinate("2.0.10"), &fixture.aar, pom())
            .publish(&repo, STAMP)
            .expect("second");

        let metadata = fs::read_to_string(
            repo.root()
                .join("org/spatialite/spatialite/maven-metadata.xml"),
        )
        .expect("read");
        let parsed = MavenMetadata::parse(&coordinate("2.0.10"), &metadata).expect("parses");
        assert_eq!(parsed.versions(), ["2.0.9", "2.0.10"]);
        assert_eq!(parsed.latest(), Some("2.0.10"));
    }

    #[rstest]
    fn existing_pom_blocks_all_uploads(fixture: Fixture) {
        let mut repo = MockRepository::new();
        repo.expect_exists()
            .with(eq("org/spatialite/spatialite/2.0.10/spatialite-2.0.10.pom"))
            .times(1)
            .returning(|_| Ok(true));
        repo.expect_publish_version().never();
        repo.expect_write().never();

        let mut publication = Publication::new(coordinate("2.0.10"), &fixture.aar, pom());
        let err = publication.publish(&repo, STAMP).expect_err("duplicate");
        assert!(matches!(err, PublishError::DuplicateCoordinate { .. }));
    }

    #[rstest]
    fn upload_failure_marks_publication_failed(fixture: Fixture) {
        let mut repo = MockRepository::new();
        repo.expect_exists().returning(|_| Ok(false));
        repo.expect_describe()
            .returning(|| "https://maven.example.org".to_owned());
        repo.expect_publish_version().times(1).returning(|_, _| {
            Err(PublishError::Http {
                url: "https://maven.example.org".to_owned(),
                reason: "connection reset".to_owned(),
            })
        });
        repo.expect_write().never();

        let mut publication = Publication::new(coordinate("2.0.10"), &fixture.aar, pom());
        publication.publish(&repo, STAMP).expect_err("upload fails");

        assert!(
            matches!(publication.state(), PublicationState::Failed { reason } if reason.contains("connection reset"))
        );
        let retry = publication.publish(&repo, STAMP).expect_err("single attempt");
        assert!(matches!(retry, PublishError::AlreadyAttempted { .. }));
    }
}
