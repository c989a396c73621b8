//! Sparkle RSS appcasts.
//!
//! Each `channel > item` is one release. Sparkle spreads the version over
//! two places, so resolution is layered:
//!
//! - version: `enclosure@sparkle:shortVersionString`, else `<sparkle:shortVersionString>`
//! - build: `enclosure@sparkle:version`, else `<sparkle:version>`
//!
//! When only the build resolves it doubles as the version. When neither
//! resolves the item fails with [`ItemErrorKind::NoVersion`].

use super::xml::{self, Element};
use super::{channel_from, collect, published, ItemError, ItemErrorKind, Unmarshalled, UnmarshalError};
use crate::provider::Provider;
use crate::release::{Download, Release};

pub fn unmarshal(content: &[u8]) -> Result<Unmarshalled, UnmarshalError> {
    if content.is_empty() {
        return Err(UnmarshalError::NoSource);
    }

    let document = xml::parse_document(content)?;
    let Some(channel) = document.child("rss").and_then(|rss| rss.child("channel")) else {
        tracing::debug!("Sparkle feed has no rss > channel element");
        return collect(Provider::SparkleRss, Vec::new(), None);
    };

    let items = channel
        .children_named("item")
        .enumerate()
        .map(|(i, item)| parse_item(i + 1, item))
        .collect();

    collect(Provider::SparkleRss, items, Some(channel_from(channel)))
}

fn parse_item(index: usize, item: &Element) -> Result<Release, ItemError> {
    let enclosure = item.child("enclosure");

    let version = enclosure
        .and_then(|e| e.attr("shortVersionString"))
        .or_else(|| item.child_text("shortVersionString"));
    let build = enclosure
        .and_then(|e| e.attr("version"))
        .or_else(|| item.child_text("version"));

    let mut release = match (version, build) {
        (Some(version), build) => {
            let mut release = Release::new(version).map_err(|e| ItemError::new(index, e))?;
            if let Some(build) = build {
                release.set_build(build);
            }
            release
        }
        (None, Some(build)) => {
            tracing::debug!(index, build, "Sparkle item has no short version, using build");
            Release::from_build(build).map_err(|e| ItemError::new(index, e))?
        }
        (None, None) => return Err(ItemError::new(index, ItemErrorKind::NoVersion)),
    };
    release.set_title(item.child_text("title").unwrap_or_default());
    release.set_description(item.child_text("description").unwrap_or_default());
    release.set_published(published(index, item.child_text("pubDate")));
    release.set_release_notes_link(item.child_text("releaseNotesLink").map(str::to_string));
    release.set_minimum_system_version(
        item.child_text("minimumSystemVersion")
            .map(str::to_string),
    );

    if let Some(enclosure) = enclosure {
        release.add_download(download_from(index, enclosure));
    }

    Ok(release)
}

fn download_from(index: usize, enclosure: &Element) -> Download {
    let owned = |name: &str| enclosure.attr(name).map(str::to_string);

    let length = match enclosure.attr("length") {
        Some(raw) => raw.parse().unwrap_or_else(|e| {
            tracing::debug!(index, length = raw, error = %e, "Ignoring invalid enclosure length");
            0
        }),
        None => 0,
    };

    Download {
        url: owned("url").unwrap_or_default(),
        filetype: owned("type").unwrap_or_default(),
        length,
        dsa_signature: owned("dsaSignature"),
        md5: owned("md5Sum").or_else(|| owned("md5")),
        ed_signature: owned("edSignature"),
    }
}
