//! Core layer for Yachtwatch: vessel record reconciliation and enrichment.
//!
//! Raw capture payloads are normalized into the canonical [`model::Vessel`]
//! shape, deduplicated by identity key in a live [`session::SessionStore`],
//! reconciled against a curated registry, and enriched offline from tracker
//! detail pages and Wikipedia by the [`enrich`] pipeline.

pub mod config;
pub mod enrich;
pub mod extract;
pub mod merge;
pub mod model;
pub mod normalize;
pub mod registry;
pub mod session;
pub mod store;

pub use yachtwatch_api;

pub use enrich::{EnrichOptions, EnrichReport, Enricher};
pub use merge::merge_richer;
pub use model::{Category, DisplayCategory, MotionStatus, Owner, Vessel};
pub use registry::{merge_registry, CuratedRegistry};
pub use session::SessionStore;
pub use store::{SnapshotStore, StoreError};
