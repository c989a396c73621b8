//! Normalizes software-update feeds ("appcasts") into typed releases.
//!
//! Three dialects are understood: Sparkle RSS, SourceForge project RSS and
//! GitHub releases Atom. Raw bytes are wrapped in a [`Source`], the dialect is
//! detected, and the matching unmarshaller produces [`Releases`] that can be
//! sorted by semantic version and narrowed with reversible filters.
//!
//! ```
//! use appcast::{Appcast, SortOrder};
//!
//! let xml = br#"<rss xmlns:sparkle="http://www.andymatuschak.org/xml-namespaces/sparkle"><channel>
//!   <item><enclosure sparkle:shortVersionString="1.0.0" url="https://example.com/1.0.0.dmg"/></item>
//!   <item><enclosure sparkle:shortVersionString="1.1.0" url="https://example.com/1.1.0.dmg"/></item>
//! </channel></rss>"#;
//!
//! let mut appcast = Appcast::from_bytes(None, xml.to_vec());
//! appcast.unmarshal().unwrap();
//!
//! let releases = appcast.releases_mut().unwrap();
//! releases.sort_by_versions(SortOrder::Descending);
//! assert_eq!(releases.first().version().to_string(), "1.1.0");
//! ```

pub mod appcast;
pub mod config;
pub mod provider;
pub mod release;
pub mod source;
pub mod unmarshal;
pub mod util;

pub use appcast::{Appcast, AppcastError};
pub use provider::Provider;
pub use release::{Download, Release, Releases, SortOrder};
pub use source::{Checksum, ChecksumAlgorithm, Fetcher, LocalFile, RemoteUrl, Source, SourceError};
pub use unmarshal::{Channel, UnmarshalError};
