//! tl-engine - Reconciliation engine for Tideline
//!
//! Drives migration resources through their create/read/update/delete
//! lifecycle, plans changes from configuration against persisted state and
//! applies them through the state store.

pub mod error;
pub mod lifecycle;
pub mod migration;
pub mod planner;
pub mod reconciler;

pub use error::{EngineError, EngineResult};
pub use lifecycle::{
    Attribute, AttributeKind, Lifecycle, MetadataProvider, Persist, Presence, ResourceKind,
    SchemaProvider, Transition,
};
pub use migration::MigrationResource;
pub use planner::{plan, planned_resource, Action, PlannedChange};
pub use reconciler::{Outcome, Reconciler};
