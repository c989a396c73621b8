//! Dialect detection for appcast feeds.
//!
//! The URL is matched against well-known hosting shapes first. When that is
//! inconclusive the body is sniffed with dot-matches-newline regexes. Every
//! input maps to exactly one [`Provider`].

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// The feed dialect a document is written in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Provider {
    #[default]
    Unknown,
    /// SourceForge project RSS (`xmlns:sf`, `<media:content>`).
    SourceForgeRss,
    /// Sparkle RSS (`xmlns:sparkle`, `<enclosure>`).
    SparkleRss,
    /// GitHub releases Atom feed.
    GitHubAtom,
}

impl Provider {
    pub const ALL: [Provider; 4] = [
        Provider::Unknown,
        Provider::SourceForgeRss,
        Provider::SparkleRss,
        Provider::GitHubAtom,
    ];

    /// Stable, human-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            Provider::Unknown => "Unknown",
            Provider::SourceForgeRss => "SourceForge RSS Feed",
            Provider::SparkleRss => "Sparkle RSS Feed",
            Provider::GitHubAtom => "GitHub Atom Feed",
        }
    }

    fn slug(&self) -> &'static str {
        match self {
            Provider::Unknown => "unknown",
            Provider::SourceForgeRss => "sourceforge",
            Provider::SparkleRss => "sparkle",
            Provider::GitHubAtom => "github",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Provider {
    type Err = String;

    /// Accepts the slug (`sparkle`, `sourceforge`, `github`, `unknown`) or
    /// the display name, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Provider::ALL
            .into_iter()
            .find(|p| p.slug().eq_ignore_ascii_case(wanted) || p.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("unknown provider {wanted:?}"))
    }
}

struct ContentRule {
    provider: Provider,
    pattern: &'static str,
}

/// Checked in order, first match wins.
const CONTENT_RULES: [ContentRule; 3] = [
    ContentRule {
        provider: Provider::SparkleRss,
        pattern: r"(?s)(?:<rss.*xmlns:sparkle)|(?:<rss.*<enclosure)",
    },
    ContentRule {
        provider: Provider::SourceForgeRss,
        pattern: r"(?s)(?:<rss.*xmlns:sf)|(?:<channel.*xmlns:sf)",
    },
    ContentRule {
        provider: Provider::GitHubAtom,
        pattern: r"(?s)<feed.*<id>tag:github\.com",
    },
];

const URL_RULES: [(Provider, &str); 2] = [
    (Provider::SourceForgeRss, r"sourceforge\.net/projects/[^/]+/rss"),
    (Provider::GitHubAtom, r"github\.com/[^/]+/[^/]+/releases\.atom"),
];

static CONTENT_REGEXES: OnceLock<Vec<(Provider, Regex)>> = OnceLock::new();
static URL_REGEXES: OnceLock<Vec<(Provider, Regex)>> = OnceLock::new();

fn content_regexes() -> &'static [(Provider, Regex)] {
    CONTENT_REGEXES.get_or_init(|| {
        CONTENT_RULES
            .iter()
            .map(|rule| {
                let regex = Regex::new(rule.pattern).expect("content detection pattern is valid");
                (rule.provider, regex)
            })
            .collect()
    })
}

fn url_regexes() -> &'static [(Provider, Regex)] {
    URL_REGEXES.get_or_init(|| {
        URL_RULES
            .iter()
            .map(|(provider, pattern)| {
                let regex = Regex::new(pattern).expect("URL detection pattern is valid");
                (*provider, regex)
            })
            .collect()
    })
}

/// Classifies raw feed bytes. Non-UTF-8 input is sniffed lossily.
pub fn detect_by_content(content: &[u8]) -> Provider {
    let text = String::from_utf8_lossy(content);
    content_regexes()
        .iter()
        .find(|(_, regex)| regex.is_match(&text))
        .map(|(provider, _)| *provider)
        .unwrap_or(Provider::Unknown)
}

/// Classifies a feed by the shape of its URL alone.
///
/// Sparkle feeds are self-hosted and have no recognizable URL shape, so they
/// are only ever found by [`detect_by_content`].
pub fn detect_by_url(url: &str) -> Provider {
    url_regexes()
        .iter()
        .find(|(_, regex)| regex.is_match(url))
        .map(|(provider, _)| *provider)
        .unwrap_or(Provider::Unknown)
}

/// URL shape first, content second.
pub fn detect(url: Option<&str>, content: &[u8]) -> Provider {
    match url.map(detect_by_url) {
        Some(provider) if provider != Provider::Unknown => {
            tracing::debug!(provider = %provider, "Provider detected from URL");
            provider
        }
        _ => detect_by_content(content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const SPARKLE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<rss version="2.0" xmlns:sparkle="http://www.andymatuschak.org/xml-namespaces/sparkle">
  <channel><title>App</title></channel>
</rss>"#;

    const SPARKLE_NO_NAMESPACE: &str = r#"<rss version="2.0"><channel>
  <item><enclosure url="https://example.com/app.dmg" length="1" type="application/octet-stream"/></item>
</channel></rss>"#;

    const SOURCEFORGE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<rss xmlns:content="http://purl.org/rss/1.0/modules/content/" xmlns:files="https://sourceforge.net/api/files.rdf#" xmlns:media="http://video.search.yahoo.com/mrss/" xmlns:doap="http://usefulinc.com/ns/doap#" xmlns:sf="https://sourceforge.net/api/sfelements.rdf#" version="2.0">
  <channel><title>Project</title></channel>
</rss>"#;

    const GITHUB: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom" xml:lang="en-US">
  <id>tag:github.com,2008:https://github.com/owner/repo/releases</id>
</feed>"#;

    #[test]
    fn test_detect_by_content() {
        assert_eq!(detect_by_content(SPARKLE.as_bytes()), Provider::SparkleRss);
        assert_eq!(
            detect_by_content(SPARKLE_NO_NAMESPACE.as_bytes()),
            Provider::SparkleRss
        );
        assert_eq!(
            detect_by_content(SOURCEFORGE.as_bytes()),
            Provider::SourceForgeRss
        );
        assert_eq!(detect_by_content(GITHUB.as_bytes()), Provider::GitHubAtom);
    }

    #[test]
    fn test_detect_by_content_unknown() {
        assert_eq!(detect_by_content(b""), Provider::Unknown);
        assert_eq!(
            detect_by_content(b"<feed><id>tag:gitlab.com,2008</id></feed>"),
            Provider::Unknown
        );
        assert_eq!(
            detect_by_content(b"<rss version=\"2.0\"><channel></channel></rss>"),
            Provider::Unknown
        );
    }

    #[test]
    fn test_detect_by_url() {
        assert_eq!(
            detect_by_url("https://sourceforge.net/projects/filezilla/rss"),
            Provider::SourceForgeRss
        );
        assert_eq!(
            detect_by_url("https://sourceforge.net/projects/filezilla/rss?path=/"),
            Provider::SourceForgeRss
        );
        assert_eq!(
            detect_by_url("https://github.com/owner/repo/releases.atom"),
            Provider::GitHubAtom
        );
        assert_eq!(
            detect_by_url("https://example.com/appcast.xml"),
            Provider::Unknown
        );
    }

    #[test]
    fn test_detect_prefers_url() {
        assert_eq!(
            detect(
                Some("https://github.com/owner/repo/releases.atom"),
                SPARKLE.as_bytes()
            ),
            Provider::GitHubAtom
        );
        assert_eq!(
            detect(Some("https://example.com/appcast.xml"), SPARKLE.as_bytes()),
            Provider::SparkleRss
        );
        assert_eq!(detect(None, GITHUB.as_bytes()), Provider::GitHubAtom);
    }

    #[test]
    fn test_names_and_parsing() {
        for provider in Provider::ALL {
            assert_eq!(provider.name().parse::<Provider>().unwrap(), provider);
            assert_eq!(provider.slug().parse::<Provider>().unwrap(), provider);
        }
        assert_eq!(Provider::SparkleRss.to_string(), "Sparkle RSS Feed");
        assert!("atom-ish".parse::<Provider>().is_err());
    }

    proptest! {
        #[test]
        fn prop_detection_is_deterministic(bytes in proptest::collection::vec(any::<u8>(), 0..512)) {
            let first = detect_by_content(&bytes);
            prop_assert_eq!(first, detect_by_content(&bytes));
            prop_assert!(Provider::ALL.contains(&first));
        }
    }
}
