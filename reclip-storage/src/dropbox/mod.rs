//! Dropbox-style cloud storage wrapper.
//!
//! Uploads go to the content host with the request shaped by a
//! `Dropbox-API-Arg` header; everything else is plain JSON against the api
//! host.

pub mod client;
pub mod types;

pub use client::DropboxApi;
