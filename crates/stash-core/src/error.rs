//! Error types shared across the Stash workspace.

use std::error::Error;
use std::fmt;

use crate::id::ItemId;

/// Errors from item creation and lookup.
///
/// Placement itself never fails with an error: a container reports
/// rejected placements through its boolean / outcome results.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ItemError {
    /// An item must cover at least one cell on each axis.
    InvalidSize {
        /// Requested width.
        width: i32,
        /// Requested height.
        height: i32,
    },
    /// The id does not name a live item (never allocated, or destroyed).
    UnknownItem {
        /// The offending id.
        item: ItemId,
    },
}

impl fmt::Display for ItemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSize { width, height } => {
                write!(f, "item size {width}x{height} must be at least 1x1")
            }
            Self::UnknownItem { item } => write!(f, "unknown item {item}"),
        }
    }
}

impl Error for ItemError {}
