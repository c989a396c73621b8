//! The normalized release model shared by every feed dialect.
//!
//! - [`Release`] / [`Download`]: one versioned entry and its files
//! - [`Releases`]: the sortable, filterable collection an unmarshaller produces

mod entity;
mod releases;

pub use crate::util::{DateFormat, PublishedDateTime};
pub use entity::{Download, Release, ReleaseError};
pub use releases::{Releases, SortOrder};
