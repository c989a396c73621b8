//! Ties a [`Source`] to the releases unmarshalled from it.

use thiserror::Error;

use crate::provider::Provider;
use crate::release::Releases;
use crate::source::{Fetcher, Source, SourceError};
use crate::unmarshal::{self, Channel, UnmarshalError, Unmarshalled};

#[derive(Debug, Error)]
pub enum AppcastError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Unmarshal(#[from] UnmarshalError),
}

/// An appcast: the source it came from and, once unmarshalled, its releases.
///
/// `releases` and `channel` are only ever set together by a successful
/// [`Appcast::unmarshal`]. A failed unmarshal clears both.
#[derive(Debug, Clone)]
pub struct Appcast {
    source: Source,
    releases: Option<Releases>,
    channel: Option<Channel>,
}

impl Appcast {
    pub fn new(source: Source) -> Self {
        Self {
            source,
            releases: None,
            channel: None,
        }
    }

    /// Wraps resident bytes, detecting the provider from `location` and content.
    pub fn from_bytes(location: Option<String>, content: Vec<u8>) -> Self {
        Self::new(Source::new(location, content))
    }

    /// Fetches the source and unmarshals it.
    ///
    /// # Errors
    ///
    /// Returns [`AppcastError::Source`] if fetching fails and
    /// [`AppcastError::Unmarshal`] if the content cannot be unmarshalled.
    pub async fn load<F: Fetcher + ?Sized>(fetcher: &F) -> Result<Self, AppcastError> {
        let source = Source::load(fetcher).await?;
        let mut appcast = Self::new(source);
        appcast.unmarshal()?;
        Ok(appcast)
    }

    /// Unmarshals the source content with the dialect of its provider.
    pub fn unmarshal(&mut self) -> Result<&Releases, UnmarshalError> {
        self.releases = None;
        self.channel = None;

        let Unmarshalled { releases, channel } =
            unmarshal::unmarshal(self.source.provider(), self.source.content())?;
        self.channel = channel;
        Ok(self.releases.insert(releases))
    }

    /// Uncomments the Sparkle source. Previously unmarshalled releases are
    /// discarded since they no longer describe the content.
    pub fn uncomment(&mut self) -> Result<(), SourceError> {
        self.source.uncomment()?;
        self.releases = None;
        self.channel = None;
        Ok(())
    }

    pub fn provider(&self) -> Provider {
        self.source.provider()
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut Source {
        &mut self.source
    }

    pub fn releases(&self) -> Option<&Releases> {
        self.releases.as_ref()
    }

    pub fn releases_mut(&mut self) -> Option<&mut Releases> {
        self.releases.as_mut()
    }

    pub fn channel(&self) -> Option<&Channel> {
        self.channel.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::release::SortOrder;

    const SPARKLE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<rss version="2.0" xmlns:sparkle="http://www.andymatuschak.org/xml-namespaces/sparkle">
  <channel>
    <title>App</title>
    <item><enclosure sparkle:shortVersionString="1.0.0" url="https://example.com/1.0.0.dmg"/></item>
    <!-- <item><enclosure sparkle:shortVersionString="0.9.0" url="https://example.com/0.9.0.dmg"/></item> -->
    <item><enclosure sparkle:shortVersionString="1.1.0" url="https://example.com/1.1.0.dmg"/></item>
  </channel>
</rss>"#;

    #[test]
    fn test_unmarshal_populates_releases_and_channel() {
        let mut appcast = Appcast::from_bytes(None, SPARKLE.as_bytes().to_vec());
        assert_eq!(appcast.provider(), Provider::SparkleRss);
        assert!(appcast.releases().is_none());

        assert_eq!(appcast.unmarshal().unwrap().len(), 2);
        assert_eq!(appcast.channel().unwrap().title, "App");

        let releases = appcast.releases_mut().unwrap();
        releases.sort_by_versions(SortOrder::Descending);
        assert_eq!(releases.first().version().to_string(), "1.1.0");
    }

    #[test]
    fn test_uncomment_discards_stale_releases() {
        let mut appcast = Appcast::from_bytes(None, SPARKLE.as_bytes().to_vec());
        appcast.unmarshal().unwrap();

        appcast.uncomment().unwrap();
        assert!(appcast.releases().is_none());
        assert!(appcast.channel().is_none());

        assert_eq!(appcast.unmarshal().unwrap().len(), 3);
    }

    #[test]
    fn test_failed_unmarshal_clears_state() {
        let mut appcast = Appcast::from_bytes(None, SPARKLE.as_bytes().to_vec());
        appcast.unmarshal().unwrap();

        appcast.source_mut().set_content(b"<rss><channel><item></item></channel></rss>".to_vec());
        assert!(matches!(appcast.unmarshal(), Err(UnmarshalError::Items(_))));
        assert!(appcast.releases().is_none());
        assert!(appcast.channel().is_none());
    }

    #[test]
    fn test_unknown_provider() {
        let mut appcast = Appcast::from_bytes(None, b"<html></html>".to_vec());
        assert_eq!(appcast.provider(), Provider::Unknown);
        assert!(matches!(
            appcast.unmarshal(),
            Err(UnmarshalError::UnknownProvider)
        ));
    }
}
