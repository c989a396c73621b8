//! GitHub releases Atom feeds (`https://github.com/<owner>/<repo>/releases.atom`).
//!
//! The version lives in the tail of each entry id
//! (`tag:github.com,2008:Repository/123/v1.2.3`), with a leading `v` dropped.
//! Entries carry no download URLs and the feed has no channel metadata.

use super::xml::{self, Element};
use super::{collect, published, ItemError, ItemErrorKind, Unmarshalled, UnmarshalError};
use crate::provider::Provider;
use crate::release::Release;

pub fn unmarshal(content: &[u8]) -> Result<Unmarshalled, UnmarshalError> {
    if content.is_empty() {
        return Err(UnmarshalError::NoSource);
    }

    let document = xml::parse_document(content)?;
    let items = match document.child("feed") {
        Some(feed) => feed
            .children_named("entry")
            .enumerate()
            .map(|(i, entry)| parse_entry(i + 1, entry))
            .collect(),
        None => {
            tracing::debug!("GitHub feed has no feed element");
            Vec::new()
        }
    };

    collect(Provider::GitHubAtom, items, None)
}

fn parse_entry(index: usize, entry: &Element) -> Result<Release, ItemError> {
    let id = entry.child_text("id").unwrap_or_default();
    let version = version_from_id(id)
        .ok_or_else(|| ItemError::new(index, ItemErrorKind::NoVersionInId(id.to_string())))?;

    let mut release = Release::new(version).map_err(|e| ItemError::new(index, e))?;
    release.set_title(entry.child_text("title").unwrap_or_default());
    release.set_description(entry.child_text("content").unwrap_or_default());
    release.set_published(published(index, entry.child_text("updated")));

    Ok(release)
}

/// Everything after the last `/`, minus a leading `v`.
fn version_from_id(id: &str) -> Option<&str> {
    let (_, tail) = id.rsplit_once('/')?;
    let tail = tail.strip_prefix('v').unwrap_or(tail);
    (!tail.is_empty()).then_some(tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(entries: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom" xmlns:media="http://search.yahoo.com/mrss/" xml:lang="en-US">
  <id>tag:github.com,2008:https://github.com/owner/repo/releases</id>
  <link type="text/html" rel="alternate" href="https://github.com/owner/repo/releases"/>
  <title>Release notes from repo</title>
  <updated>2016-05-13T12:00:00+02:00</updated>
  {entries}
</feed>"#
        )
    }

    #[test]
    fn test_unmarshal() {
        let content = feed(
            r#"<entry>
    <id>tag:github.com,2008:Repository/12345/v2.0.0</id>
    <updated>2016-05-13T12:00:00+02:00</updated>
    <link rel="alternate" type="text/html" href="https://github.com/owner/repo/releases/tag/v2.0.0"/>
    <title>2.0.0</title>
    <content type="html">&lt;p&gt;Release notes&lt;/p&gt;</content>
  </entry>
  <entry>
    <id>tag:github.com,2008:Repository/12345/2.1.0-rc.1</id>
    <updated>not a date</updated>
    <title>2.1.0 RC1</title>
  </entry>"#,
        );

        let parsed = unmarshal(content.as_bytes()).unwrap();
        assert!(parsed.channel.is_none());
        assert_eq!(parsed.releases.len(), 2);

        let first = parsed.releases.first();
        assert_eq!(first.version().to_string(), "2.0.0");
        assert_eq!(first.title(), "2.0.0");
        assert_eq!(first.description(), "<p>Release notes</p>");
        assert!(first.downloads().is_empty());
        assert!(first.published().is_some());

        let second = parsed.releases.get(1).unwrap();
        assert!(second.is_prerelease());
        assert!(second.published().is_none());
    }

    #[test]
    fn test_id_without_version_is_named_error() {
        let content = feed(
            r#"<entry><id>tag:github.com,2008:Repository/12345/v1.0.0</id></entry>
  <entry><id>tag:github.com,2008:no-slashes</id><title>1.1.0</title></entry>
  <entry><id>tag:github.com,2008:Repository/12345/nightly</id></entry>"#,
        );

        let err = unmarshal(content.as_bytes()).unwrap_err();
        let errors = err.item_errors();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].index, 2);
        assert!(matches!(errors[0].kind, ItemErrorKind::NoVersionInId(_)));
        assert_eq!(errors[1].index, 3);
        assert!(matches!(errors[1].kind, ItemErrorKind::InvalidVersion(_)));
    }

    #[test]
    fn test_version_from_id() {
        assert_eq!(version_from_id("tag:github.com,2008:Repository/1/v1.2.3"), Some("1.2.3"));
        assert_eq!(version_from_id("a/b/1.2.3"), Some("1.2.3"));
        assert_eq!(version_from_id("a/b/"), None);
        assert_eq!(version_from_id("a/b/v"), None);
        assert_eq!(version_from_id("no-slash"), None);
    }
}
