//! Free-text extraction helpers shared by every feed dialect.
//!
//! This module provides the pure functions the unmarshallers lean on when a
//! feed does not carry structured data:
//!
//! - **Versions**: scan titles and descriptions for semantic versions, and
//!   parse loosely written version strings
//! - **Dates**: parse publication dates against an ordered list of formats
//!
//! # Examples
//!
//! ```
//! use appcast::util::{extract_semantic_versions, parse_datetime, DateFormat};
//!
//! let versions = extract_semantic_versions("Example 1.2.3 (build 42)").unwrap();
//! assert_eq!(versions, vec!["1.2.3".to_string()]);
//!
//! let date = parse_datetime("Fri, 13 May 2016 12:00:00 +0200").unwrap();
//! assert_eq!(date.format, DateFormat::Rfc1123Z);
//! ```

mod datetime;
mod version;

use thiserror::Error;

pub use datetime::{parse_datetime, DateFormat, PublishedDateTime};
pub use version::{extract_semantic_versions, parse_version};

/// Errors returned by the extraction helpers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExtractError {
    /// The scanned text contained no `MAJOR.MINOR.PATCH` sequence.
    #[error("no semantic version found")]
    NoVersionFound,

    /// None of the supported date formats matched.
    #[error("failed to parse date/time {0:?}")]
    DateTimeParseFailed(String),
}
