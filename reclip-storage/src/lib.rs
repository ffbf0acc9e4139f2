//! Storage backends for re-hosted media.
//!
//! [`traits::StorageClient`] is the seam the sinks and the sweeper share;
//! [`dropbox`] talks to a Dropbox-style REST API, [`local`] is backed by a
//! plain directory so the same sweeper works for locally saved files.

pub mod dropbox;
pub mod local;
pub mod traits;

pub use dropbox::DropboxApi;
pub use local::LocalStore;
pub use traits::{RemoteFile, StorageClient, StorageError};
