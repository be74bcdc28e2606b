//! CLI command implementations

pub(crate) mod apply;
pub(crate) mod common;
pub(crate) mod destroy;
pub(crate) mod plan;
pub(crate) mod refresh;
pub(crate) mod status;
