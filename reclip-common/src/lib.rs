//! Shared plumbing for the reclip workspace.
//!
//! Deliberately small: every other crate depends on this one, so it carries
//! only the centralised [`observability`] helpers and nothing with heavy
//! transitive cost.

pub mod observability;
