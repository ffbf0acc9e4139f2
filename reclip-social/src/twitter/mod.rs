//! Twitter/X v1.1-style integration surface.
//!
//! Submodules provide the HTTP client wrapper, the pure media-extraction
//! helpers, and the typed response models.

pub mod client;
pub mod extract;
pub mod types;

pub use client::TwitterApi;
