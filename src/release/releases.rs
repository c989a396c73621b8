use regex::Regex;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

use super::Release;

/// Direction for [`Releases::sort_by_versions`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum SortOrder {
    #[serde(rename = "asc", alias = "ascending")]
    Ascending,
    #[default]
    #[serde(rename = "desc", alias = "descending")]
    Descending,
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortOrder::Ascending),
            "desc" | "descending" => Ok(SortOrder::Descending),
            other => Err(format!("unknown sort order {other:?} (expected asc or desc)")),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortOrder::Ascending => f.write_str("asc"),
            SortOrder::Descending => f.write_str("desc"),
        }
    }
}

/// Sortable, filterable view over the releases of one feed.
///
/// `original` is fixed at construction. `filtered` holds indices into it, so
/// the current view is always a subset of the original releases. Filters
/// narrow the current view and compose; [`Releases::reset_filters`] restores
/// the full set.
#[derive(Debug, Clone, Default)]
pub struct Releases {
    original: Vec<Release>,
    filtered: Vec<usize>,
}

impl Releases {
    pub fn new(releases: Vec<Release>) -> Self {
        let filtered = (0..releases.len()).collect();
        Self {
            original: releases,
            filtered,
        }
    }

    /// Number of releases in the current view.
    pub fn len(&self) -> usize {
        self.filtered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filtered.is_empty()
    }

    /// First release of the current view.
    ///
    /// # Panics
    ///
    /// Panics if the view is empty. Check [`Releases::is_empty`] first or use
    /// [`Releases::get`].
    pub fn first(&self) -> &Release {
        match self.filtered.first() {
            Some(&index) => &self.original[index],
            None => panic!("Releases::first called on an empty release view"),
        }
    }

    pub fn get(&self, position: usize) -> Option<&Release> {
        self.filtered.get(position).map(|&index| &self.original[index])
    }

    /// Highest-precedence release in the current view, regardless of order.
    pub fn latest(&self) -> Option<&Release> {
        self.filtered()
            .max_by(|a, b| a.cmp_precedence(b))
    }

    /// Releases in the current view, in view order.
    pub fn filtered(&self) -> impl ExactSizeIterator<Item = &Release> + '_ {
        self.filtered.iter().map(|&index| &self.original[index])
    }

    /// All releases as unmarshalled, ignoring filters and sorting.
    pub fn original(&self) -> &[Release] {
        &self.original
    }

    /// Stable sort of the current view by semantic-version precedence.
    ///
    /// Releases with equal precedence keep their view order in both
    /// directions, so `Descending` is the exact reverse of `Ascending` only
    /// when all versions are distinct.
    pub fn sort_by_versions(&mut self, order: SortOrder) {
        let original = &self.original;
        self.filtered.sort_by(|&a, &b| {
            let ordering = original[a].cmp_precedence(&original[b]);
            match order {
                SortOrder::Ascending => ordering,
                SortOrder::Descending => ordering.reverse(),
            }
        });
    }

    /// Keeps releases whose title matches `pattern` (or does not, if `invert`).
    pub fn filter_by_title(&mut self, pattern: &Regex, invert: bool) {
        self.retain(|release| pattern.is_match(release.title()) != invert);
        tracing::debug!(pattern = %pattern, invert, remaining = self.len(), "Filtered releases by title");
    }

    /// Keeps releases with any download whose filetype matches `pattern`
    /// (or, with `invert`, any download whose filetype does not match).
    pub fn filter_by_media_type(&mut self, pattern: &Regex, invert: bool) {
        self.retain(|release| {
            release
                .downloads()
                .iter()
                .any(|download| pattern.is_match(&download.filetype) != invert)
        });
        tracing::debug!(pattern = %pattern, invert, remaining = self.len(), "Filtered releases by media type");
    }

    /// Keeps releases with any download whose URL matches `pattern`
    /// (or, with `invert`, any download whose URL does not match).
    pub fn filter_by_url(&mut self, pattern: &Regex, invert: bool) {
        self.retain(|release| {
            release
                .downloads()
                .iter()
                .any(|download| pattern.is_match(&download.url) != invert)
        });
        tracing::debug!(pattern = %pattern, invert, remaining = self.len(), "Filtered releases by URL");
    }

    /// Keeps prereleases, or with `invert` keeps stable releases only.
    pub fn filter_by_prerelease(&mut self, invert: bool) {
        self.retain(|release| release.is_prerelease() != invert);
        tracing::debug!(invert, remaining = self.len(), "Filtered releases by prerelease");
    }

    pub fn reset_filters(&mut self) {
        self.filtered = (0..self.original.len()).collect();
    }

    fn retain(&mut self, keep: impl Fn(&Release) -> bool) {
        let original = &self.original;
        self.filtered.retain(|&index| keep(&original[index]));
    }
}

impl From<Vec<Release>> for Releases {
    fn from(releases: Vec<Release>) -> Self {
        Self::new(releases)
    }
}
