//! Capability traits for managed resource kinds
//!
//! A resource kind is described by what it can do: name itself
//! ([`MetadataProvider`]), describe its attributes ([`SchemaProvider`]) and
//! move through the create/read/update/delete lifecycle ([`Lifecycle`]).
//! The set of kinds is closed: see [`ResourceKind`].

use crate::error::EngineError;
use async_trait::async_trait;
use tl_core::ReconciledResource;

/// Type name of a resource kind
pub trait MetadataProvider {
    fn type_name(&self) -> &'static str;
}

/// Value type of a resource attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    String,
    Bool,
    Int,
    StringList,
    Timeouts,
}

/// How an attribute is supplied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Required,
    Optional,
    /// Computed by the engine, never configured
    Computed,
}

/// One attribute of a resource schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: &'static str,
    pub kind: AttributeKind,
    pub presence: Presence,
    /// Changing it after creation is rejected
    pub immutable: bool,
}

impl Attribute {
    const fn new(name: &'static str, kind: AttributeKind, presence: Presence) -> Self {
        Self {
            name,
            kind,
            presence,
            immutable: false,
        }
    }

    const fn immutable(mut self) -> Self {
        self.immutable = true;
        self
    }
}

/// Attribute schema of a resource kind
pub trait SchemaProvider {
    fn schema(&self) -> Vec<Attribute>;
}

/// What to do with persisted state after a lifecycle call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Persist {
    /// Store this resource
    Put(ReconciledResource),
    /// Drop the resource from state
    Remove,
    /// Leave state as it was
    Keep,
}

/// Result of one lifecycle call.
///
/// State and error are independent: an update can fail and still move the
/// persisted state forward, and a delete removes state even when teardown
/// reports an error.
#[derive(Debug)]
pub struct Transition {
    pub persist: Persist,
    pub error: Option<EngineError>,
}

impl Transition {
    pub fn put(resource: ReconciledResource) -> Self {
        Self {
            persist: Persist::Put(resource),
            error: None,
        }
    }

    pub fn keep(error: EngineError) -> Self {
        Self {
            persist: Persist::Keep,
            error: Some(error),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// The create/read/update/delete lifecycle of a resource kind
#[async_trait]
pub trait Lifecycle: MetadataProvider + SchemaProvider + Send + Sync {
    /// Bring a planned resource into existence.
    async fn create(&self, plan: &ReconciledResource) -> Transition;

    /// Refresh persisted state from the backend.
    async fn read(&self, state: &ReconciledResource) -> Transition;

    /// Move an existing resource from `state` to `plan`.
    async fn update(&self, plan: &ReconciledResource, state: &ReconciledResource) -> Transition;

    /// Tear a resource down.
    async fn delete(&self, state: &ReconciledResource) -> Transition;
}

/// Every resource kind Tideline manages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    MigrationResource,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 1] = [ResourceKind::MigrationResource];

    /// Look a kind up by its type name.
    pub fn from_type_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.type_name() == name)
    }
}

impl MetadataProvider for ResourceKind {
    fn type_name(&self) -> &'static str {
        match self {
            ResourceKind::MigrationResource => "tideline_migration",
        }
    }
}

impl SchemaProvider for ResourceKind {
    fn schema(&self) -> Vec<Attribute> {
        use AttributeKind as K;
        use Presence as P;
        match self {
            ResourceKind::MigrationResource => vec![
                Attribute::new("name", K::String, P::Required).immutable(),
                Attribute::new("endpoint", K::String, P::Required),
                Attribute::new("database", K::String, P::Required),
                Attribute::new("tls_enabled", K::Bool, P::Optional),
                Attribute::new("migration_table", K::String, P::Optional).immutable(),
                Attribute::new("migrations_dir", K::String, P::Required),
                Attribute::new("target_version", K::Int, P::Optional),
                Attribute::new("version", K::Int, P::Computed),
                Attribute::new("migrations", K::StringList, P::Computed),
                Attribute::new("timeouts", K::Timeouts, P::Optional),
            ],
        }
    }
}
