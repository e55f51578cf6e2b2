//! Library manifest rendering.

/// Fields written to the library's `AndroidManifest.xml`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryManifest {
    /// Manifest `package` attribute.
    pub namespace: String,
    /// `android:minSdkVersion`.
    pub min_sdk: u32,
    /// `android:targetSdkVersion`.
    pub target_sdk: u32,
}

impl LibraryManifest {
    /// Render the manifest XML.
    ///
    /// # Examples
    ///
    /// ```
    /// use spatialite_aar::aar::manifest::LibraryManifest;
    ///
    /// let xml = LibraryManifest {
    ///     namespace: "org.spatialite".to_owned(),
    ///     min_sdk: 21,
    ///     target_sdk: 33,
    /// }
    /// .render();
    /// assert!(xml.contains(r#"package="org.spatialite""#));
    /// ```
    #[must_use]
    pub fn render(&self) -> String {
        format!(
            concat!(
                "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n",
                "<manifest xmlns:android=\"http://schemas.android.com/apk/res/android\"\n",
                "    package=\"{namespace}\">\n",
                "\n",
                "    <uses-sdk\n",
                "        android:minSdkVersion=\"{min}\"\n",
                "        android:targetSdkVersion=\"{target}\" />\n",
                "\n",
                "</manifest>\n",
            ),
            namespace = self.namespace,
            min = self.min_sdk,
            target = self.target_sdk,
        )
    }
}

/// Contents of `META-INF/MANIFEST.MF` inside the empty `classes.jar`.
pub const JAR_MANIFEST: &str = "Manifest-Version: 1.0\r\n\r\n";
