//! SourceForge project RSS feeds (`https://sourceforge.net/projects/<name>/rss`).
//!
//! Items carry no structured version: it is the first semantic version found
//! in the item title (typically a file path such as `/App/1.2.3/app.dmg`),
//! falling back to the description. The file itself is described by a
//! `<media:content url type filesize>` element.

use super::xml::{self, Element};
use super::{channel_from, collect, published, ItemError, ItemErrorKind, Unmarshalled, UnmarshalError};
use crate::provider::Provider;
use crate::release::{Download, Release};
use crate::util::extract_semantic_versions;

pub fn unmarshal(content: &[u8]) -> Result<Unmarshalled, UnmarshalError> {
    if content.is_empty() {
        return Err(UnmarshalError::NoSource);
    }

    let document = xml::parse_document(content)?;
    let Some(channel) = document.child("rss").and_then(|rss| rss.child("channel")) else {
        tracing::debug!("SourceForge feed has no rss > channel element");
        return collect(Provider::SourceForgeRss, Vec::new(), None);
    };

    let items = channel
        .children_named("item")
        .enumerate()
        .map(|(i, item)| parse_item(i + 1, item))
        .collect();

    collect(Provider::SourceForgeRss, items, Some(channel_from(channel)))
}

fn parse_item(index: usize, item: &Element) -> Result<Release, ItemError> {
    let title = item.child_text("title").unwrap_or_default();
    let description = item.child_text("description").unwrap_or_default();

    let versions = extract_semantic_versions(title)
        .or_else(|_| extract_semantic_versions(description))
        .map_err(|_| ItemError::new(index, ItemErrorKind::NoVersion))?;

    let mut release = Release::new(&versions[0]).map_err(|e| ItemError::new(index, e))?;
    release.set_title(title);
    release.set_description(description);
    release.set_published(published(index, item.child_text("pubDate")));

    if let Some(content) = item.child("content") {
        let length = content
            .attr("filesize")
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(0);
        release.add_download(Download::new(
            content.attr("url").unwrap_or_default(),
            content.attr("type").unwrap_or_default(),
            length,
        ));
    }

    Ok(release)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<rss xmlns:content="http://purl.org/rss/1.0/modules/content/" xmlns:files="https://sourceforge.net/api/files.rdf#" xmlns:media="http://video.search.yahoo.com/mrss/" xmlns:doap="http://usefulinc.com/ns/doap#" xmlns:sf="https://sourceforge.net/api/sfelements.rdf#" version="2.0">
  <channel xmlns:files="https://sourceforge.net/api/files.rdf#" xmlns:media="http://video.search.yahoo.com/mrss/" xmlns:doap="http://usefulinc.com/ns/doap#" xmlns:sf="https://sourceforge.net/api/sfelements.rdf#">
    <title>Example Files</title>
    <link>https://sourceforge.net</link>
    <description>Files from Example hosted on SourceForge.net</description>
    <language>en</language>
    <item>
      <title><![CDATA[/Example/2.0.0/Example-2.0.0.dmg]]></title>
      <link>https://sourceforge.net/projects/example/files/Example/2.0.0/Example-2.0.0.dmg/download</link>
      <guid>https://sourceforge.net/projects/example/files/Example/2.0.0/Example-2.0.0.dmg/download</guid>
      <pubDate>Sun, 15 May 2016 10:00:00 UT</pubDate>
      <description><![CDATA[/Example/2.0.0/Example-2.0.0.dmg]]></description>
      <files:sf-file-id xmlns:files="https://sourceforge.net/api/files.rdf#">1</files:sf-file-id>
      <media:content xmlns:media="http://video.search.yahoo.com/mrss/" type="application/x-apple-diskimage; charset=binary" url="https://sourceforge.net/projects/example/files/Example/2.0.0/Example-2.0.0.dmg/download" filesize="100000"><media:hash algo="md5">0e5c6a2d1b8b3c2f</media:hash></media:content>
    </item>
    <item>
      <title><![CDATA[/Example/README.txt]]></title>
      <pubDate>Sun, 15 May 2016 10:00:00 UT</pubDate>
      <description><![CDATA[Notes for 1.9.0-beta]]></description>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn test_unmarshal() {
        let parsed = unmarshal(FEED.as_bytes()).unwrap();
        assert_eq!(parsed.releases.len(), 2);

        let first = parsed.releases.first();
        assert_eq!(first.version().to_string(), "2.0.0");
        assert_eq!(first.title(), "/Example/2.0.0/Example-2.0.0.dmg");
        assert_eq!(first.downloads().len(), 1);
        assert_eq!(first.downloads()[0].length, 100000);
        assert_eq!(
            first.downloads()[0].filetype,
            "application/x-apple-diskimage; charset=binary"
        );
        assert!(first.published().is_some());

        let channel = parsed.channel.unwrap();
        assert_eq!(channel.title, "Example Files");
        assert_eq!(channel.language, "en");
    }

    #[test]
    fn test_version_falls_back_to_description() {
        let parsed = unmarshal(FEED.as_bytes()).unwrap();
        let second = parsed.releases.get(1).unwrap();
        assert_eq!(second.version().to_string(), "1.9.0-beta");
        assert!(second.is_prerelease());
        assert!(second.downloads().is_empty());
    }

    #[test]
    fn test_item_without_version_aborts() {
        let feed = r#"<rss xmlns:sf="https://sourceforge.net/api/sfelements.rdf#"><channel>
            <item><title>/Example/1.0.0/a.zip</title></item>
            <item><title>/Example/README.txt</title></item>
        </channel></rss>"#;

        let err = unmarshal(feed.as_bytes()).unwrap_err();
        assert_eq!(err.item_errors().len(), 1);
        assert_eq!(err.item_errors()[0].index, 2);
        assert!(err.to_string().contains("release #2"));
    }
}
