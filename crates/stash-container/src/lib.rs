//! Grid container engine for Stash.
//!
//! A [`Container`] stores a bounded set of rectangular items on a fixed 2D
//! grid. It finds free space (first fit in row-major order), validates
//! positioned adds and moves, serialises concurrent mutation behind one
//! lock per container, and reports every structural change as a
//! [`ChangeEvent`] for replication and UI layers.
//!
//! # Collaborators
//!
//! - An [`Eligibility`](stash_core::Eligibility) filter decides which items
//!   may ever be stored ([`CategoryFilter`] is a ready-made one).
//! - An [`ItemLifecycle`](stash_core::ItemLifecycle) owns item lifetimes
//!   and mirrors which container holds each item ([`ItemRegistry`] is the
//!   reference implementation).
//! - Replication consumes [`ChangeEvent`]s, [`EntryOp`]s and
//!   [`ContainerSnapshot`]s; [`EntryMirror`] rebuilds the ordered sequence
//!   on the observing side.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod container;
pub mod eligibility;
pub mod entry;
pub mod event;
mod exclusion;
mod handle;
pub mod metrics;
pub mod outcome;
mod placement;
pub mod registry;
pub mod replication;

pub use config::{ConfigError, ContainerConfig};
pub use container::Container;
pub use eligibility::CategoryFilter;
pub use entry::StoredEntry;
pub use event::{ChangeEvent, ChangeKind, ObserverId};
pub use metrics::ContainerMetrics;
pub use outcome::AddOutcome;
pub use registry::ItemRegistry;
pub use replication::{ContainerSnapshot, EntryMirror, EntryOp, ReplicationError};
