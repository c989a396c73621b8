//! Per-dialect unmarshalling of raw feed bytes into [`Releases`].
//!
//! All three dialects share one contract:
//!
//! - empty input fails with [`UnmarshalError::NoSource`]
//! - malformed XML fails with [`UnmarshalError::Syntax`], never per item
//! - per-item failures (missing or invalid version) are all collected and
//!   returned together as [`UnmarshalError::Items`]; when any item fails, no
//!   collection is returned at all
//! - an unparsable publication date is not an error: the release is kept
//!   without a date
//!
//! [`unmarshal`] dispatches on [`Provider`].

pub mod github;
pub mod sourceforge;
pub mod sparkle;
mod xml;

use serde::Serialize;
use thiserror::Error;

use crate::provider::Provider;
use crate::release::{PublishedDateTime, Release, ReleaseError, Releases};
use crate::util::parse_datetime;

pub use xml::MAX_DEPTH;

/// Why a single feed item could not become a [`Release`].
#[derive(Debug, Error)]
pub enum ItemErrorKind {
    #[error("no version found")]
    NoVersion,

    /// GitHub entry id without a trailing `/<tag>` segment.
    #[error("no version in entry id {0:?}")]
    NoVersionInId(String),

    #[error(transparent)]
    InvalidVersion(#[from] ReleaseError),
}

/// A per-item failure, identified by the item's 1-based position in the feed.
#[derive(Debug, Error)]
#[error("release #{index}: {kind}")]
pub struct ItemError {
    pub index: usize,
    pub kind: ItemErrorKind,
}

impl ItemError {
    pub fn new(index: usize, kind: impl Into<ItemErrorKind>) -> Self {
        Self {
            index,
            kind: kind.into(),
        }
    }
}

/// Errors that abort an unmarshal. No partial result accompanies any of them.
#[derive(Debug, Error)]
pub enum UnmarshalError {
    #[error("no source content to unmarshal")]
    NoSource,

    #[error("cannot unmarshal a feed from an unknown provider")]
    UnknownProvider,

    #[error("XML syntax error: {0}")]
    Syntax(#[from] quick_xml::Error),

    /// SEC-003: Element nesting exceeds safety limit.
    #[error("XML nesting depth exceeds maximum of {0} levels")]
    TooDeep(usize),

    #[error("{}", describe_items(.0))]
    Items(Vec<ItemError>),
}

impl UnmarshalError {
    /// Per-item failures, empty for document-level errors.
    pub fn item_errors(&self) -> &[ItemError] {
        match self {
            UnmarshalError::Items(errors) => errors,
            _ => &[],
        }
    }
}

fn describe_items(errors: &[ItemError]) -> String {
    let details: Vec<String> = errors.iter().map(ToString::to_string).collect();
    format!(
        "{} release(s) failed to unmarshal: {}",
        errors.len(),
        details.join("; ")
    )
}

/// Channel metadata carried by the RSS dialects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Channel {
    pub title: String,
    pub link: String,
    pub description: String,
    pub language: String,
}

/// A successfully unmarshalled feed.
#[derive(Debug, Clone)]
pub struct Unmarshalled {
    pub releases: Releases,
    /// `None` for GitHub Atom feeds.
    pub channel: Option<Channel>,
}

/// Unmarshals `content` with the dialect selected by `provider`.
pub fn unmarshal(provider: Provider, content: &[u8]) -> Result<Unmarshalled, UnmarshalError> {
    match provider {
        Provider::Unknown => {
            if content.is_empty() {
                return Err(UnmarshalError::NoSource);
            }
            Err(UnmarshalError::UnknownProvider)
        }
        Provider::SourceForgeRss => sourceforge::unmarshal(content),
        Provider::SparkleRss => sparkle::unmarshal(content),
        Provider::GitHubAtom => github::unmarshal(content),
    }
}

fn channel_from(element: &xml::Element) -> Channel {
    let text = |name: &str| element.child_text(name).unwrap_or_default().to_string();
    Channel {
        title: text("title"),
        link: text("link"),
        description: text("description"),
        language: text("language"),
    }
}

/// Parses an optional date, logging and dropping it if unrecognized.
fn published(index: usize, text: Option<&str>) -> Option<PublishedDateTime> {
    let text = text?;
    match parse_datetime(text) {
        Ok(published) => Some(published),
        Err(e) => {
            tracing::debug!(index, error = %e, "Keeping release without publication date");
            None
        }
    }
}

/// Applies the all-or-nothing item policy.
fn collect(
    provider: Provider,
    items: Vec<Result<Release, ItemError>>,
    channel: Option<Channel>,
) -> Result<Unmarshalled, UnmarshalError> {
    let total = items.len();
    let mut releases = Vec::with_capacity(total);
    let mut errors = Vec::new();

    for item in items {
        match item {
            Ok(release) => releases.push(release),
            Err(e) => {
                tracing::warn!(provider = %provider, index = e.index, error = %e.kind, "Feed item failed to unmarshal");
                errors.push(e);
            }
        }
    }

    if !errors.is_empty() {
        return Err(UnmarshalError::Items(errors));
    }

    tracing::debug!(provider = %provider, releases = total, "Unmarshalled feed");
    Ok(Unmarshalled {
        releases: Releases::new(releases),
        channel,
    })
}
