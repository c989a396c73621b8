//! Raw appcast content and its provenance.
//!
//! A [`Source`] binds fetched bytes to where they came from, the detected
//! [`Provider`], and a content [`Checksum`]. Fetching itself is delegated to a
//! [`Fetcher`]: [`LocalFile`] for paths, [`RemoteUrl`] for HTTP(S).

mod checksum;
mod local;
mod remote;

use thiserror::Error;

use crate::provider::{self, Provider};

pub use checksum::{uncomment, Checksum, ChecksumAlgorithm};
pub use local::LocalFile;
pub use remote::RemoteUrl;

/// Default cap on feed size for both fetchers.
pub const MAX_FEED_SIZE: usize = 10 * 1024 * 1024; // 10MB

/// Errors that can occur while obtaining or preparing source content.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Local file could not be read
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Request exceeded the configured timeout
    #[error("Request timed out")]
    Timeout,
    /// Server returned 429 Too Many Requests after max retries
    #[error("Rate limited after {0} retries")]
    RateLimited(u32),
    /// Content exceeded the size limit
    #[error("Content too large (exceeds {0} bytes)")]
    TooLarge(usize),
    /// Response was incomplete (received fewer bytes than Content-Length)
    #[error("Incomplete response: expected {expected} bytes, received {received}")]
    IncompleteResponse { expected: u64, received: usize },
    /// The URL string could not be parsed
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// The URL uses a scheme other than http or https
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
    /// Uncommenting only applies to Sparkle feeds
    #[error("Only Sparkle feeds can be uncommented, this source is {0}")]
    NotUncommentable(Provider),
}

/// Supplies the raw bytes of a source.
#[allow(async_fn_in_trait)]
pub trait Fetcher {
    /// Fetches the complete content.
    async fn fetch(&self) -> Result<Vec<u8>, SourceError>;

    /// Path or URL, for provenance and logging.
    fn location(&self) -> &str;

    /// Provider implied by the location alone, consulted before content sniffing.
    fn provider_hint(&self) -> Provider {
        Provider::Unknown
    }
}

/// Fetched appcast bytes with their provider and checksum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    location: Option<String>,
    content: Vec<u8>,
    provider: Provider,
    checksum: Checksum,
}

impl Source {
    /// Wraps resident bytes. The provider is detected from the location's URL
    /// shape when possible, otherwise from the content. The checksum is SHA-256.
    pub fn new(location: Option<String>, content: Vec<u8>) -> Self {
        let provider = provider::detect(location.as_deref(), &content);
        Self::with_provider(location, content, provider)
    }

    /// Wraps resident bytes with a known provider, skipping detection.
    pub fn with_provider(location: Option<String>, content: Vec<u8>, provider: Provider) -> Self {
        let checksum = Checksum::generate(ChecksumAlgorithm::default(), &content);
        Self {
            location,
            content,
            provider,
            checksum,
        }
    }

    /// Fetches content through `fetcher`, then detects the provider (hint
    /// first, content second) and generates a SHA-256 checksum.
    pub async fn load<F: Fetcher + ?Sized>(fetcher: &F) -> Result<Self, SourceError> {
        let content = fetcher.fetch().await?;

        let provider = match fetcher.provider_hint() {
            Provider::Unknown => provider::detect_by_content(&content),
            hinted => hinted,
        };

        tracing::info!(
            location = %fetcher.location(),
            provider = %provider,
            bytes = content.len(),
            "Loaded appcast source"
        );

        Ok(Self::with_provider(
            Some(fetcher.location().to_string()),
            content,
            provider,
        ))
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn set_location(&mut self, location: Option<String>) {
        self.location = location;
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// Replaces the content and regenerates the checksum with the current algorithm.
    /// The provider is left as is.
    pub fn set_content(&mut self, content: Vec<u8>) {
        self.content = content;
        self.generate_checksum(self.checksum.algorithm());
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    pub fn set_provider(&mut self, provider: Provider) {
        self.provider = provider;
    }

    pub fn checksum(&self) -> &Checksum {
        &self.checksum
    }

    pub fn set_checksum(&mut self, checksum: Checksum) {
        self.checksum = checksum;
    }

    /// Recomputes the checksum over the current content with `algorithm`.
    pub fn generate_checksum(&mut self, algorithm: ChecksumAlgorithm) -> &Checksum {
        self.checksum = Checksum::generate(algorithm, &self.content);
        &self.checksum
    }

    /// Reveals commented-out markup in a Sparkle feed.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::NotUncommentable`] for any other provider.
    pub fn uncomment(&mut self) -> Result<(), SourceError> {
        if self.provider != Provider::SparkleRss {
            return Err(SourceError::NotUncommentable(self.provider));
        }

        let uncommented = uncomment(&self.content);
        tracing::debug!(
            before = self.content.len(),
            after = uncommented.len(),
            "Uncommented Sparkle feed"
        );
        self.set_content(uncommented);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPARKLE: &str = r#"<rss xmlns:sparkle="http://www.andymatuschak.org/xml-namespaces/sparkle"><channel>
<!-- <item><enclosure sparkle:shortVersionString="0.9.0" url="old"/></item> -->
</channel></rss>"#;

    struct StaticFetcher {
        location: String,
        content: &'static str,
        hint: Provider,
    }

    impl Fetcher for StaticFetcher {
        async fn fetch(&self) -> Result<Vec<u8>, SourceError> {
            Ok(self.content.as_bytes().to_vec())
        }

        fn location(&self) -> &str {
            &self.location
        }

        fn provider_hint(&self) -> Provider {
            self.hint
        }
    }

    #[test]
    fn test_new_detects_and_checksums() {
        let source = Source::new(None, SPARKLE.as_bytes().to_vec());
        assert_eq!(source.provider(), Provider::SparkleRss);
        assert_eq!(source.checksum().algorithm(), ChecksumAlgorithm::Sha256);
        assert_eq!(
            source.checksum(),
            &Checksum::generate(ChecksumAlgorithm::Sha256, SPARKLE.as_bytes())
        );
    }

    #[test]
    fn test_new_prefers_url_shape() {
        let source = Source::new(
            Some("https://github.com/owner/repo/releases.atom".into()),
            SPARKLE.as_bytes().to_vec(),
        );
        assert_eq!(source.provider(), Provider::GitHubAtom);
    }

    #[tokio::test]
    async fn test_load_uses_hint_then_content() {
        let hinted = StaticFetcher {
            location: "https://sourceforge.net/projects/example/rss".into(),
            content: SPARKLE,
            hint: Provider::SourceForgeRss,
        };
        let source = Source::load(&hinted).await.unwrap();
        assert_eq!(source.provider(), Provider::SourceForgeRss);
        assert_eq!(
            source.location(),
            Some("https://sourceforge.net/projects/example/rss")
        );

        let sniffed = StaticFetcher {
            location: "appcast.xml".into(),
            content: SPARKLE,
            hint: Provider::Unknown,
        };
        let source = Source::load(&sniffed).await.unwrap();
        assert_eq!(source.provider(), Provider::SparkleRss);
    }

    #[test]
    fn test_generate_checksum_switches_algorithm() {
        let mut source = Source::new(None, b"<rss/>".to_vec());
        let md5 = source.generate_checksum(ChecksumAlgorithm::Md5).clone();
        assert_eq!(md5.algorithm(), ChecksumAlgorithm::Md5);
        assert_eq!(source.checksum(), &md5);
    }

    #[test]
    fn test_uncomment_sparkle_only() {
        let mut source = Source::new(None, SPARKLE.as_bytes().to_vec());
        let before = source.checksum().clone();
        source.uncomment().unwrap();
        assert!(!String::from_utf8_lossy(source.content()).contains("<!--"));
        assert_ne!(source.checksum(), &before);

        let mut other = Source::with_provider(None, b"<feed/>".to_vec(), Provider::GitHubAtom);
        assert!(matches!(
            other.uncomment(),
            Err(SourceError::NotUncommentable(Provider::GitHubAtom))
        ));
    }

    #[test]
    fn test_set_content_regenerates_checksum() {
        let mut source = Source::new(None, b"a".to_vec());
        source.generate_checksum(ChecksumAlgorithm::Md5);
        source.set_content(b"b".to_vec());
        assert_eq!(
            source.checksum(),
            &Checksum::generate(ChecksumAlgorithm::Md5, b"b")
        );
    }
}
