//! Unit-of-work sessions over a remote file store.
//!
//! A [`FilesSession`] remembers which files the caller has already seen,
//! queues uploads, deletions and renames without touching the store, and
//! executes the whole queue in registration order when
//! [`FilesSession::save_changes`] is called. Each session also caps the
//! number of round trips it may make, so chatty per-item access fails fast
//! instead of quietly slowing everything down.
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use filestore_core::{RemoteFileStore, UploadSource};
//! # use filestore_session::FilesStore;
//! # async fn example(transport: Arc<dyn RemoteFileStore>) -> filestore_core::Result<()> {
//! let store = FilesStore::builder("http://files.example", "reports")
//!     .with_commands(transport)
//!     .build();
//!
//! let session = store.open_session();
//! session.register_upload("/q3.csv", 5, UploadSource::from_bytes(*b"a,b,c"), None, None);
//! session.register_rename("/q2.csv", "/archive/q2.csv");
//! session.save_changes().await?;
//! # Ok(())
//! # }
//! ```

mod governor;
mod operation;
mod queue;
mod session;
mod store;
mod tracker;

#[cfg(test)]
mod testing;

pub use governor::RequestGovernor;
pub use operation::FileOperation;
pub use queue::{Drain, OperationQueue};
pub use session::{FileTarget, FilesSession};
pub use store::{FilesStore, FilesStoreBuilder};
pub use tracker::{EntityTracker, IdentitySet};
