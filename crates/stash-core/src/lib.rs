//! Core types and traits for the Stash spatial container engine.
//!
//! This is the leaf crate with zero internal dependencies. It defines the
//! grid primitives ([`Vec2i`], [`Rect`]), the [`Item`] descriptor, the
//! identifiers used throughout the workspace, and the collaborator traits a
//! container is configured with ([`Eligibility`], [`ItemLifecycle`]).

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod geometry;
pub mod id;
pub mod item;
pub mod traits;

pub use error::ItemError;
pub use geometry::{Rect, Vec2i};
pub use id::{CategoryId, ContainerId, ItemId};
pub use item::Item;
pub use traits::{Eligibility, ItemLifecycle, UntrackedItems};
