//! Core traits and types for filestore sessions and transports.
//!
//! This crate defines the abstractions shared between the session layer and
//! the transports that talk to a file store:
//! - `RemoteFileStore`: upload, delete, rename and lookup of remote files
//! - `FileHeader`: what a session knows about a remote file
//! - `UploadSource`: the deferred write callback behind an upload
//! - `StoreConventions`: store-wide settings read when a session opens
//! - `SessionListener`: notification hook consulted by the store factory

mod conventions;
mod error;
mod header;
mod listener;
mod store;
mod upload;

pub use conventions::StoreConventions;
pub use error::{FileStoreError, Result};
pub use header::{Etag, FileHeader, FileMetadata};
pub use listener::{NoopListener, SessionListener};
pub use store::RemoteFileStore;
pub use upload::{UploadSink, UploadSource};
