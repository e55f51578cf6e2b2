//! Artifact-level `maven-metadata.xml` handling.
//!
//! Maven clients discover available versions through this file. Each
//! publication merges its version into the existing document (if any) and
//! marks it as both `latest` and `release`.

use super::coordinate::Coordinate;
use super::error::PublishError;
use super::pom::escape_xml;

/// File name of the artifact-level metadata document.
pub const METADATA_FILE: &str = "maven-metadata.xml";

/// Parsed artifact-level metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MavenMetadata {
    group: String,
    artifact: String,
    versions: Vec<String>,
    last_updated: Option<String>,
}

/// Current UTC time in the `yyyyMMddHHmmss` form Maven uses for
/// `lastUpdated`.
#[must_use]
pub fn timestamp_now() -> String {
    chrono::Utc::now().format("%Y%m%d%H%M%S").to_string()
}

impl MavenMetadata {
    /// Empty metadata for the coordinate's group and artifact.
    #[must_use]
    pub fn new(coordinate: &Coordinate) -> Self {
        Self {
            group: coordinate.group().to_owned(),
            artifact: coordinate.artifact().to_owned(),
            versions: Vec::new(),
            last_updated: None,
        }
    }

    /// Parse an existing document and check it belongs to `coordinate`.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::Metadata`] if the group or artifact is absent
    /// or differs from the coordinate.
    pub fn parse(coordinate: &Coordinate, xml: &str) -> Result<Self, PublishError> {
        let path = format!("{}/{METADATA_FILE}", coordinate.artifact_dir());
        let fail = |reason: String| PublishError::Metadata {
            path: path.clone(),
            reason,
        };

        let group = tag_text(xml, "groupId").ok_or_else(|| fail("missing groupId".to_owned()))?;
        let artifact =
            tag_text(xml, "artifactId").ok_or_else(|| fail("missing artifactId".to_owned()))?;
        if group != coordinate.group() || artifact != coordinate.artifact() {
            return Err(fail(format!(
                "describes {group}:{artifact}, not {}:{}",
                coordinate.group(),
                coordinate.artifact()
            )));
        }

        let versions = tag_block(xml, "versions")
            .map(|block| tag_texts(block, "version"))
            .unwrap_or_default();
        Ok(Self {
            group: group.to_owned(),
            artifact: artifact.to_owned(),
            versions: versions.into_iter().map(str::to_owned).collect(),
            last_updated: tag_text(xml, "lastUpdated").map(str::to_owned),
        })
    }

    /// Known versions in publication order.
    #[must_use]
    pub fn versions(&self) -> &[String] {
        &self.versions
    }

    /// The most recently published version.
    #[must_use]
    pub fn latest(&self) -> Option<&str> {
        self.versions.last().map(String::as_str)
    }

    /// Record `version` as the newest publication at `timestamp`.
    pub fn add_version(&mut self, version: &str, timestamp: &str) {
        self.versions.retain(|v| v != version);
        self.versions.push(version.to_owned());
        self.last_updated = Some(timestamp.to_owned());
    }

    /// Render the document.
    #[must_use]
    pub fn render(&self) -> String {
        let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<metadata>\n");
        xml.push_str(&format!("  <groupId>{}</groupId>\n", escape_xml(&self.group)));
        xml.push_str(&format!(
            "  <artifactId>{}</artifactId>\n",
            escape_xml(&self.artifact)
        ));
        xml.push_str("  <versioning>\n");
        if let Some(latest) = self.latest() {
            let latest = escape_xml(latest);
            xml.push_str(&format!("    <latest>{latest}</latest>\n"));
            xml.push_str(&format!("    <release>{latest}</release>\n"));
        }
        xml.push_str("    <versions>\n");
        for version in &self.versions {
            xml.push_str(&format!("      <version>{}</version>\n", escape_xml(version)));
        }
        xml.push_str("    </versions>\n");
        if let Some(stamp) = &self.last_updated {
            xml.push_str(&format!("    <lastUpdated>{stamp}</lastUpdated>\n"));
        }
        xml.push_str("  </versioning>\n</metadata>\n");
        xml
    }
}

/// Text between the first `<tag>` and its closing tag.
fn tag_block<'a>(xml: &'a str, tag: &str) -> Option<&'a str> {
    let open = format!("<{tag}>");
    let close = format!("</{tag}>");
    let start = xml.find(&open)? + open.len();
    let end = xml.get(start..)?.find(&close)? + start;
    xml.get(start..end)
}

fn tag_text<'a>(xml: &'a str, tag: &str) -> Option<&'a str> {
    tag_block(xml, tag).map(str::trim)
}

fn tag_texts<'a>(xml: &'a str, tag: &str) -> Vec<&'a str> {
    let close = format!("</{tag}>");
    let mut found = Vec::new();
    let mut rest = xml;
    while let Some(text) = tag_text(rest, tag) {
        found.push(text);
        let Some(pos) = rest.find(&close) else { break };
        rest = rest.get(pos + close.len()..).unwrap_or_default();
    }
    found
}
