//! POM rendering.

use super::coordinate::Coordinate;
use crate::config::PomDetails;

/// Render the POM for an AAR publication.
///
/// # Examples
///
/// ```
/// use spatialite_aar::config::PomDetails;
/// use spatialite_aar::publish::coordinate::Coordinate;
/// use spatialite_aar::publish::pom::render_pom;
///
/// let coordinate = Coordinate::new("org.spatialite", "spatialite", "2.0.10").expect("valid");
/// let details = PomDetails {
///     name: "SpatiaLite for Android".to_owned(),
///     description: "Spatial SQL".to_owned(),
/// };
/// let pom = render_pom(&coordinate, &details);
/// assert!(pom.contains("<packaging>aar</packaging>"));
/// ```
#[must_use]
pub fn render_pom(coordinate: &Coordinate, details: &PomDetails) -> String {
    format!(
        concat!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n",
            "<project xmlns=\"http://maven.apache.org/POM/4.0.0\"",
            " xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\"",
            " xsi:schemaLocation=\"http://maven.apache.org/POM/4.0.0",
            " https://maven.apache.org/xsd/maven-4.0.0.xsd\">\n",
            "  <modelVersion>4.0.0</modelVersion>\n",
            "  <groupId>{group}</groupId>\n",
            "  <artifactId>{artifact}</artifactId>\n",
            "  <version>{version}</version>\n",
            "  <packaging>aar</packaging>\n",
            "  <name>{name}</name>\n",
            "  <description>{description}</description>\n",
            "</project>\n",
        ),
        group = escape_xml(coordinate.group()),
        artifact = escape_xml(coordinate.artifact()),
        version = escape_xml(coordinate.version()),
        name = escape_xml(&details.name),
        description = escape_xml(&details.description),
    )
}

/// Escape the five XML special characters.
pub(crate) fn escape_xml(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_coordinate_and_details() {
        let coordinate =
            Coordinate::new("org.spatialite", "spatialite", "2.0.10").expect("valid coordinate");
        let pom = render_pom(
            &coordinate,
            &PomDetails {
                name: "SpatiaLite & friends".to_owned(),
                description: "<native> libraries".to_owned(),
            },
        );

        assert!(pom.contains("<groupId>org.spatialite</groupId>"));
        assert!(pom.contains("<artifactId>spatialite</artifactId>"));
        assert!(pom.contains("<version>2.0.10</version>"));
        assert!(pom.contains("<name>SpatiaLite &amp; friends</name>"));
        assert!(pom.contains("<description>&lt;native&gt; libraries</description>"));
    }
}
