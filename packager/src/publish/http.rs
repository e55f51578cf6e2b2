//! HTTP Maven repository backend using `ureq`.
//!
//! Files are uploaded with one `PUT` each and probed with `HEAD`. Servers
//! that refuse to overwrite a release answer `409 Conflict`, which maps to a
//! duplicate-coordinate error. Retries are left to the caller's
//! infrastructure.
//!
//! A version upload sends the POM last, since resolvers take the POM as
//! the sign that a version exists. If any `PUT` fails, the files already
//! sent are deleted again in reverse order.

use super::coordinate::Coordinate;
use super::error::PublishError;
use super::repository::{PublishedFile, Repository};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use log::{debug, warn};
use std::fmt;
use std::sync::OnceLock;

/// Environment variable holding the repository user name.
pub const USERNAME_ENV: &str = "MAVEN_USERNAME";
/// Environment variable holding the repository password or token.
pub const PASSWORD_ENV: &str = "MAVEN_PASSWORD";

/// Basic authentication credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// Credentials from a user name and password.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Read `MAVEN_USERNAME` and `MAVEN_PASSWORD`; both must be set and
    /// non-empty.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let var = |key: &str| std::env::var(key).ok().filter(|v| !v.is_empty());
        Some(Self::new(var(USERNAME_ENV)?, var(PASSWORD_ENV)?))
    }

    /// `Authorization` header value.
    #[must_use]
    pub fn header_value(&self) -> String {
        let token = STANDARD.encode(format!("{}:{}", self.username, self.password));
        format!("Basic {token}")
    }
}

/// A Maven repository reachable over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpRepository {
    base_url: String,
    credentials: Option<Credentials>,
    agent: ureq::Agent,
}

impl HttpRepository {
    /// Repository at `base_url`.
    #[must_use]
    pub fn new(base_url: &str, credentials: Option<Credentials>) -> Self {
        Self::with_agent(base_url, credentials, http_agent().clone())
    }

    fn with_agent(base_url: &str, credentials: Option<Credentials>, agent: ureq::Agent) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            credentials,
            agent,
        }
    }

    /// Absolute URL of the repository-relative `path`.
    ///
    /// # Examples
    ///
    /// ```
    /// use spatialite_aar::publish::http::HttpRepository;
    ///
    /// let repo = HttpRepository::new("https://maven.example.org/releases/", None);
    /// assert_eq!(
    ///     repo.url_for("org/spatialite/maven-metadata.xml"),
    ///     "https://maven.example.org/releases/org/spatialite/maven-metadata.xml"
    /// );
    /// ```
    #[must_use]
    pub fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn auth(&self) -> Option<String> {
        self.credentials.as_ref().map(Credentials::header_value)
    }

    fn put(&self, path: &str, contents: &[u8]) -> Result<(), ureq::Error> {
        let url = self.url_for(path);
        debug!("PUT {url} ({} bytes)", contents.len());
        let request = self.agent.put(&url);
        let request = match self.auth() {
            Some(value) => request.header("Authorization", &value),
            None => request,
        };
        request.send(contents)?;
        Ok(())
    }

    fn delete(&self, path: &str) -> Result<(), ureq::Error> {
        let url = self.url_for(path);
        debug!("DELETE {url}");
        let request = self.agent.delete(&url);
        let request = match self.auth() {
            Some(value) => request.header("Authorization", &value),
            None => request,
        };
        match request.call() {
            Ok(_) | Err(ureq::Error::StatusCode(404)) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Delete `uploaded` newest first, folding anything left into `cause`.
    fn roll_back(&self, uploaded: &[String], cause: PublishError) -> PublishError {
        let mut left = Vec::new();
        for path in uploaded.iter().rev() {
            if let Err(e) = self.delete(path) {
                warn!("could not remove {}: {e}", self.url_for(path));
                left.push(path.clone());
            }
        }
        if left.is_empty() {
            cause
        } else {
            PublishError::IncompleteRollback {
                cause: Box::new(cause),
                left,
            }
        }
    }
}

impl Repository for HttpRepository {
    fn describe(&self) -> String {
        self.base_url.clone()
    }

    fn exists(&self, path: &str) -> Result<bool, PublishError> {
        let url = self.url_for(path);
        let request = self.agent.head(&url);
        let request = match self.auth() {
            Some(value) => request.header("Authorization", &value),
            None => request,
        };
        match request.call() {
            Ok(_) => Ok(true),
            Err(ureq::Error::StatusCode(404)) => Ok(false),
            Err(e) => Err(map_ureq_error(&url, &e)),
        }
    }

    fn read(&self, path: &str) -> Result<Option<Vec<u8>>, PublishError> {
        let url = self.url_for(path);
        let request = self.agent.get(&url);
        let request = match self.auth() {
            Some(value) => request.header("Authorization", &value),
            None => request,
        };
        match request.call() {
            Ok(response) => response
                .into_body()
                .read_to_vec()
                .map(Some)
                .map_err(|e| map_ureq_error(&url, &e)),
            Err(ureq::Error::StatusCode(404)) => Ok(None),
            Err(e) => Err(map_ureq_error(&url, &e)),
        }
    }

    fn publish_version(
        &self,
        coordinate: &Coordinate,
        files: &[PublishedFile],
    ) -> Result<(), PublishError> {
        let mut ordered: Vec<&PublishedFile> = files.iter().collect();
        ordered.sort_by_key(|file| file.name.ends_with(".pom"));

        let mut uploaded = Vec::with_capacity(ordered.len());
        for file in ordered {
            let path = format!("{}/{}", coordinate.version_dir(), file.name);
            match self.put(&path, &file.contents) {
                Ok(()) => uploaded.push(path),
                // The conflicting files belong to the existing release.
                Err(ureq::Error::StatusCode(409)) => {
                    return Err(PublishError::DuplicateCoordinate {
                        coordinate: coordinate.clone(),
                    });
                }
                Err(e) => {
                    let cause = map_ureq_error(&self.url_for(&path), &e);
                    return Err(self.roll_back(&uploaded, cause));
                }
            }
        }
        Ok(())
    }

    fn write(&self, path: &str, contents: &[u8]) -> Result<(), PublishError> {
        self.put(path, contents)
            .map_err(|e| map_ureq_error(&self.url_for(path), &e))
    }
}

/// Shared `ureq` agent.
fn http_agent() -> &'static ureq::Agent {
    static AGENT: OnceLock<ureq::Agent> = OnceLock::new();
    AGENT.get_or_init(ureq::Agent::new_with_defaults)
}

/// Map a `ureq` error to a [`PublishError`].
fn map_ureq_error(url: &str, err: &ureq::Error) -> PublishError {
    let reason = match err {
        ureq::Error::StatusCode(401 | 403) => {
            format!("{err}; check {USERNAME_ENV} and {PASSWORD_ENV}")
        }
        other => other.to_string(),
    };
    PublishError::Http {
        url: url.to_owned(),
        reason,
    }
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;
