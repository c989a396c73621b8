use semver::Version;
use serde::Serialize;
use std::cmp::Ordering;
use thiserror::Error;

use crate::util::{parse_version, PublishedDateTime};

/// Errors raised while building a [`Release`].
#[derive(Debug, Error)]
pub enum ReleaseError {
    /// The version string is not a (leniently) valid semantic version.
    #[error("invalid version {value:?}: {source}")]
    InvalidVersion {
        value: String,
        #[source]
        source: semver::Error,
    },
}

/// A downloadable file attached to a release.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Download {
    pub url: String,
    /// MIME-type-like string, e.g. `application/octet-stream`.
    pub filetype: String,
    /// Size in bytes as advertised by the feed (0 when absent).
    pub length: u64,
    pub dsa_signature: Option<String>,
    pub md5: Option<String>,
    pub ed_signature: Option<String>,
}

impl Download {
    pub fn new(url: impl Into<String>, filetype: impl Into<String>, length: u64) -> Self {
        Self {
            url: url.into(),
            filetype: filetype.into(),
            length,
            ..Self::default()
        }
    }
}

/// One application release, normalized from any feed dialect.
///
/// The version is validated once in [`Release::new`]. Setters exist for the
/// unmarshallers; changing a release after it joined a
/// [`Releases`](super::Releases) collection is unusual.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Release {
    version: Version,
    build: String,
    title: String,
    description: String,
    downloads: Vec<Download>,
    published: Option<PublishedDateTime>,
    release_notes_link: Option<String>,
    minimum_system_version: Option<String>,
    /// Set when `version` was parsed from `build` because the feed had no
    /// version string of its own.
    #[serde(skip)]
    version_from_build: bool,
}

impl Release {
    /// Creates a release from a version string.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::InvalidVersion`] if `version` cannot be parsed.
    pub fn new(version: &str) -> Result<Self, ReleaseError> {
        Ok(Self {
            version: parse(version)?,
            build: String::new(),
            title: String::new(),
            description: String::new(),
            downloads: Vec::new(),
            published: None,
            release_notes_link: None,
            minimum_system_version: None,
            version_from_build: false,
        })
    }

    /// Creates a release that only has a build number, which doubles as
    /// its version for sorting.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::InvalidVersion`] if `build` cannot be parsed.
    pub fn from_build(build: &str) -> Result<Self, ReleaseError> {
        let mut release = Self::new(build)?;
        release.build = build.to_string();
        release.version_from_build = true;
        Ok(release)
    }

    pub fn version(&self) -> &Version {
        &self.version
    }

    pub fn set_version(&mut self, version: &str) -> Result<(), ReleaseError> {
        self.version = parse(version)?;
        self.version_from_build = false;
        Ok(())
    }

    pub fn build(&self) -> &str {
        &self.build
    }

    pub fn set_build(&mut self, build: impl Into<String>) {
        self.build = build.into();
    }

    /// The version string, or the build as written in the feed when the
    /// release was created with [`Release::from_build`].
    pub fn version_or_build(&self) -> String {
        if self.version_from_build {
            self.build.clone()
        } else {
            self.version.to_string()
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    pub fn downloads(&self) -> &[Download] {
        &self.downloads
    }

    /// The first download, which feeds treat as the primary file.
    pub fn primary_download(&self) -> Option<&Download> {
        self.downloads.first()
    }

    pub fn add_download(&mut self, download: Download) {
        self.downloads.push(download);
    }

    pub fn published(&self) -> Option<&PublishedDateTime> {
        self.published.as_ref()
    }

    pub fn set_published(&mut self, published: Option<PublishedDateTime>) {
        self.published = published;
    }

    pub fn release_notes_link(&self) -> Option<&str> {
        self.release_notes_link.as_deref()
    }

    pub fn set_release_notes_link(&mut self, link: Option<String>) {
        self.release_notes_link = link;
    }

    pub fn minimum_system_version(&self) -> Option<&str> {
        self.minimum_system_version.as_deref()
    }

    pub fn set_minimum_system_version(&mut self, version: Option<String>) {
        self.minimum_system_version = version;
    }

    pub fn is_prerelease(&self) -> bool {
        !self.version.pre.is_empty()
    }

    /// Semantic-version precedence: numeric triple, then prerelease.
    /// Build metadata does not participate.
    pub fn cmp_precedence(&self, other: &Release) -> Ordering {
        let (a, b) = (&self.version, &other.version);
        a.major
            .cmp(&b.major)
            .then(a.minor.cmp(&b.minor))
            .then(a.patch.cmp(&b.patch))
            .then_with(|| a.pre.cmp(&b.pre))
    }
}

fn parse(version: &str) -> Result<Version, ReleaseError> {
    parse_version(version).map_err(|source| ReleaseError::InvalidVersion {
        value: version.to_string(),
        source,
    })
}
