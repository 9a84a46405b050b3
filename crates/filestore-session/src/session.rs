use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use filestore_core::{
    Etag, FileHeader, FileMetadata, FileStoreError, RemoteFileStore, Result, SessionListener,
    UploadSource,
};
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::governor::RequestGovernor;
use crate::operation::FileOperation;
use crate::queue::OperationQueue;
use crate::store::FilesStore;
use crate::tracker::EntityTracker;

/// Counter for generating unique session IDs.
static SESSION_COUNTER: AtomicU64 = AtomicU64::new(0);

/// The file a registration refers to: a bare path, or a header the session
/// handed out earlier.
#[derive(Debug, Clone, Copy)]
pub enum FileTarget<'a> {
    Path(&'a str),
    Entity(&'a Arc<FileHeader>),
}

impl<'a> FileTarget<'a> {
    pub fn path(&self) -> &'a str {
        match *self {
            FileTarget::Path(path) => path,
            FileTarget::Entity(header) => &header.path,
        }
    }
}

impl<'a> From<&'a str> for FileTarget<'a> {
    fn from(path: &'a str) -> Self {
        FileTarget::Path(path)
    }
}

impl<'a> From<&'a String> for FileTarget<'a> {
    fn from(path: &'a String) -> Self {
        FileTarget::Path(path)
    }
}

impl<'a> From<&'a Arc<FileHeader>> for FileTarget<'a> {
    fn from(header: &'a Arc<FileHeader>) -> Self {
        FileTarget::Entity(header)
    }
}

/// Clears the flush flag when a flush ends, however it ends.
struct FlushGuard<'a>(&'a AtomicBool);

impl<'a> FlushGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self> {
        if flag
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(FileStoreError::FlushInProgress);
        }
        Ok(Self(flag))
    }
}

impl Drop for FlushGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// A unit of work against one file system of a store.
///
/// Registration methods only queue records; nothing reaches the store until
/// [`save_changes`](Self::save_changes). Registrations may come from many
/// threads at once. Flushes may not: a second concurrent flush is rejected
/// with [`FileStoreError::FlushInProgress`].
///
/// Sessions are equal only to themselves.
pub struct FilesSession {
    id: u64,
    correlation_id: Uuid,
    store_identifier: String,
    file_system: String,
    commands: Option<Arc<dyn RemoteFileStore>>,
    listener: Arc<dyn SessionListener>,
    tracker: EntityTracker,
    queue: OperationQueue,
    governor: RequestGovernor,
    flushing: AtomicBool,
}

impl FilesSession {
    pub(crate) fn open(store: &FilesStore, file_system: &str, correlation_id: Uuid) -> Self {
        Self {
            id: SESSION_COUNTER.fetch_add(1, Ordering::Relaxed),
            correlation_id,
            store_identifier: store.identifier().to_string(),
            file_system: file_system.to_string(),
            commands: store.commands().cloned(),
            listener: Arc::clone(store.listener()),
            tracker: EntityTracker::new(),
            queue: OperationQueue::new(),
            governor: RequestGovernor::new(
                store.conventions().max_number_of_requests_per_session,
            ),
            flushing: AtomicBool::new(false),
        }
    }

    /// Process-unique session id.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    pub fn file_system(&self) -> &str {
        &self.file_system
    }

    /// `{store identifier};{file system name}`
    pub fn store_identifier(&self) -> String {
        format!("{};{}", self.store_identifier, self.file_system)
    }

    pub fn listener(&self) -> &Arc<dyn SessionListener> {
        &self.listener
    }

    /// Transport used to execute queued operations.
    pub(crate) fn commands(&self) -> Result<&Arc<dyn RemoteFileStore>> {
        self.commands.as_ref().ok_or_else(|| {
            FileStoreError::InvalidSessionCast(format!(
                "session {} on {} was opened by a store without a transport",
                self.id,
                self.store_identifier()
            ))
        })
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Queue an upload of `size` bytes produced by `source`.
    pub fn register_upload<'a>(
        &self,
        target: impl Into<FileTarget<'a>>,
        size: u64,
        source: UploadSource,
        metadata: Option<FileMetadata>,
        etag: Option<Etag>,
    ) {
        self.enqueue(FileOperation::Upload {
            path: target.into().path().to_string(),
            size,
            source,
            metadata,
            etag,
        });
    }

    /// Queue a file deletion. A header target is also marked deleted.
    pub fn register_file_deletion<'a>(
        &self,
        target: impl Into<FileTarget<'a>>,
        etag: Option<Etag>,
    ) {
        let target = target.into();
        if let FileTarget::Entity(header) = target {
            self.tracker.mark_deleted(header);
        }
        self.enqueue(FileOperation::DeleteFile {
            path: target.path().to_string(),
            etag,
        });
    }

    /// Queue a directory deletion.
    pub fn register_directory_deletion<'a>(
        &self,
        target: impl Into<FileTarget<'a>>,
        recurse: bool,
    ) {
        self.enqueue(FileOperation::DeleteDirectory {
            path: target.into().path().to_string(),
            recurse,
        });
    }

    /// Queue a move of `source` to `destination`.
    pub fn register_rename<'a>(&self, source: impl Into<FileTarget<'a>>, destination: &str) {
        self.enqueue(FileOperation::Rename {
            source: source.into().path().to_string(),
            destination: destination.to_string(),
        });
    }

    /// Queue a move of `source` into `directory` under `name`.
    ///
    /// `name` must be a single file name: not empty, not `.` or `..`, and
    /// without path separators.
    pub fn register_rename_to_directory<'a>(
        &self,
        source: impl Into<FileTarget<'a>>,
        directory: &str,
        name: &str,
    ) -> Result<()> {
        if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
            return Err(FileStoreError::InvalidArgument(format!(
                "'{}' is not a file name",
                name
            )));
        }
        let destination = format!("{}/{}", directory.trim_end_matches('/'), name);
        self.register_rename(source, &destination);
        Ok(())
    }

    fn enqueue(&self, operation: FileOperation) {
        debug!(
            "Session {} queued {} on {}",
            self.id,
            operation.kind(),
            operation.path()
        );
        self.queue.enqueue(operation);
    }

    /// Number of records waiting for the next flush.
    pub fn pending_operations(&self) -> usize {
        self.queue.len()
    }

    // =========================================================================
    // Known state
    // =========================================================================

    pub fn is_loaded(&self, path: &str) -> bool {
        self.tracker.is_loaded(path)
    }

    /// Whether `path` is known not to exist remotely.
    ///
    /// Headers marked for deletion by this session do not count.
    pub fn is_deleted(&self, path: &str) -> bool {
        self.tracker.is_known_missing(path)
    }

    pub fn is_marked_deleted(&self, header: &Arc<FileHeader>) -> bool {
        self.tracker.is_marked_deleted(header)
    }

    pub fn record_loaded(&self, header: Arc<FileHeader>) {
        let path = header.path.clone();
        self.tracker.record_loaded(&path, header);
    }

    pub fn record_missing(&self, path: &str) {
        self.tracker.record_missing(path);
    }

    /// Look up a file, using what the session already knows when it can.
    ///
    /// Loaded and known-missing paths are answered without a round trip.
    /// Anything else charges the request budget and asks the store.
    #[instrument(skip(self), level = "debug", fields(session = self.id))]
    pub async fn load_file(&self, path: &str) -> Result<Option<Arc<FileHeader>>> {
        if let Some(header) = self.tracker.loaded(path) {
            return Ok(Some(header));
        }
        if self.tracker.is_known_missing(path) {
            return Ok(None);
        }

        let commands = self.commands()?;
        self.increment_request_count()?;

        match commands.file_info(path).await? {
            Some(header) => {
                let header = Arc::new(header);
                self.tracker.record_loaded(path, Arc::clone(&header));
                Ok(Some(header))
            }
            None => {
                self.tracker.record_missing(path);
                Ok(None)
            }
        }
    }

    // =========================================================================
    // Request budget
    // =========================================================================

    /// Charge one round trip against the session's budget.
    pub fn increment_request_count(&self) -> Result<()> {
        self.governor.charge().map(|_| ())
    }

    pub fn number_of_requests(&self) -> usize {
        self.governor.current_count()
    }

    pub fn max_number_of_requests_per_session(&self) -> usize {
        self.governor.max_requests()
    }

    pub fn set_max_number_of_requests_per_session(&self, max: usize) {
        self.governor.set_max_requests(max);
    }

    // =========================================================================
    // Flush
    // =========================================================================

    /// Execute every queued record in registration order.
    ///
    /// Each record finishes before the next starts. The first failure stops
    /// the flush and is returned; records before it stay applied and records
    /// after it stay queued.
    pub async fn save_changes(&self) -> Result<()> {
        self.flush(None).await
    }

    /// Like [`save_changes`](Self::save_changes), but stops before the next
    /// record once `cancel` reads `true`.
    pub async fn save_changes_until(&self, cancel: &watch::Receiver<bool>) -> Result<()> {
        self.flush(Some(cancel)).await
    }

    #[instrument(skip(self, cancel), level = "debug", fields(session = self.id))]
    async fn flush(&self, cancel: Option<&watch::Receiver<bool>>) -> Result<()> {
        let _guard = FlushGuard::acquire(&self.flushing)?;
        self.commands()?;

        let mut executed = 0usize;
        for operation in self.queue.drain_in_order() {
            // Only a record still waiting can be cancelled.
            if cancel.is_some_and(|rx| *rx.borrow()) {
                self.queue.requeue_front(operation);
                let remaining = self.queue.len();
                info!(
                    "Session {} flush cancelled after {} operation(s), {} remaining",
                    self.id, executed, remaining
                );
                return Err(FileStoreError::Cancelled { remaining });
            }

            let kind = operation.kind();
            let path = operation.path().to_string();

            if let Err(e) = operation.execute(self).await {
                warn!(
                    "Session {} failed {} on {} after {} operation(s): {}",
                    self.id, kind, path, executed, e
                );
                return Err(e);
            }
            executed += 1;
        }

        if executed > 0 {
            info!(
                "Session {} saved {} operation(s) to {}",
                self.id,
                executed,
                self.store_identifier()
            );
        }
        Ok(())
    }
}

impl PartialEq for FilesSession {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for FilesSession {}

impl Hash for FilesSession {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl std::fmt::Debug for FilesSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilesSession")
            .field("id", &self.id)
            .field("correlation_id", &self.correlation_id)
            .field("store", &self.store_identifier())
            .field("pending", &self.queue.len())
            .field("requests", &self.governor.current_count())
            .finish_non_exhaustive()
    }
}

impl Drop for FilesSession {
    fn drop(&mut self) {
        let pending = self.queue.len();
        if pending > 0 {
            warn!(
                "Session {} dropped with {} unsaved operation(s)",
                self.id, pending
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::hash_map::DefaultHasher;
    use std::sync::Arc;

    use filestore_core::StoreConventions;
    use tokio::io::AsyncWriteExt;

    use super::*;
    use crate::testing::RecordingStore;

    fn setup(max_requests: usize) -> (FilesStore, Arc<RecordingStore>) {
        let transport = Arc::new(RecordingStore::new());
        let store = FilesStore::builder("http://files.test", "docs")
            .with_conventions(StoreConventions {
                max_number_of_requests_per_session: max_requests,
            })
            .with_commands(transport.clone())
            .build();
        (store, transport)
    }

    fn hash_of(session: &FilesSession) -> u64 {
        let mut hasher = DefaultHasher::new();
        session.hash(&mut hasher);
        hasher.finish()
    }

    #[tokio::test]
    async fn test_flush_runs_in_registration_order() {
        let (store, transport) = setup(30);
        let session = store.open_session();

        session.register_upload("/a.txt", 3, UploadSource::from_bytes(*b"abc"), None, None);
        session.register_rename("/a.txt", "/b.txt");
        session.register_file_deletion("/c.txt", Some(Etag::from("7")));
        session.register_directory_deletion("/old", true);

        session.save_changes().await.unwrap();

        assert_eq!(
            transport.calls(),
            vec![
                "upload /a.txt 3",
                "rename /a.txt -> /b.txt",
                "delete_file /c.txt etag=7",
                "delete_directory /old recurse=true",
            ]
        );
        assert_eq!(session.pending_operations(), 0);
    }

    #[tokio::test]
    async fn test_registration_has_no_remote_effect() {
        let (store, transport) = setup(30);
        let session = store.open_session();

        session.register_upload("/a.txt", 1, UploadSource::from_bytes(*b"x"), None, None);
        session.register_file_deletion("/a.txt", None);

        assert!(transport.calls().is_empty());
        assert_eq!(session.pending_operations(), 2);
        assert_eq!(session.number_of_requests(), 0);
    }

    #[tokio::test]
    async fn test_failed_upload_stops_flush() {
        let (store, transport) = setup(30);
        transport.fail_on("upload", "/a.txt");
        let session = store.open_session();

        session.register_upload("/a.txt", 3, UploadSource::from_bytes(*b"abc"), None, None);
        session.register_file_deletion("/a.txt", None);

        let err = session.save_changes().await.unwrap_err();
        assert!(matches!(err, FileStoreError::Io(msg) if msg.contains("upload")));
        assert_eq!(transport.calls(), vec!["upload /a.txt 3"]);
        assert_eq!(session.pending_operations(), 1);
    }

    #[tokio::test]
    async fn test_failure_keeps_earlier_work_and_queues_rest() {
        let (store, transport) = setup(30);
        transport.fail_on("rename", "/2");
        let session = store.open_session();

        session.register_file_deletion("/1", None);
        session.register_rename("/2", "/2b");
        session.register_file_deletion("/3", None);
        session.register_file_deletion("/4", None);

        assert!(session.save_changes().await.is_err());
        assert_eq!(transport.calls().len(), 2);
        assert_eq!(session.pending_operations(), 2);

        // Nothing fails the remaining records, so a second flush finishes them.
        session.save_changes().await.unwrap();
        assert_eq!(
            transport.calls(),
            vec![
                "delete_file /1",
                "rename /2 -> /2b",
                "delete_file /3",
                "delete_file /4",
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_flush() {
        let (store, transport) = setup(30);
        let session = store.open_session();

        session.save_changes().await.unwrap();
        assert!(transport.calls().is_empty());
        assert_eq!(session.number_of_requests(), 0);
    }

    #[tokio::test]
    async fn test_flush_without_transport() {
        let store = FilesStore::builder("http://files.test", "docs").build();
        let session = store.open_session();
        session.register_file_deletion("/a.txt", None);

        let err = session.save_changes().await.unwrap_err();
        assert!(matches!(err, FileStoreError::InvalidSessionCast(_)));
        assert_eq!(session.pending_operations(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_producers() {
        let (store, transport) = setup(30);
        let session = store.open_session();

        std::thread::scope(|scope| {
            for t in 0..4 {
                let session = &session;
                scope.spawn(move || {
                    for i in 0..50 {
                        session.register_file_deletion(format!("/{}/{}", t, i).as_str(), None);
                    }
                });
            }
        });
        assert_eq!(session.pending_operations(), 200);

        session.save_changes().await.unwrap();
        let calls = transport.calls();
        assert_eq!(calls.len(), 200);
        for t in 0..4 {
            let prefix = format!("delete_file /{}/", t);
            let seen: Vec<usize> = calls
                .iter()
                .filter_map(|c| c.strip_prefix(&prefix))
                .map(|i| i.parse().unwrap())
                .collect();
            assert_eq!(seen, (0..50).collect::<Vec<_>>());
        }
    }

    #[tokio::test]
    async fn test_concurrent_flush_rejected() {
        let (store, transport) = setup(30);
        let session = store.open_session();
        let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();

        session.register_upload(
            "/slow.bin",
            1,
            UploadSource::new(move |mut sink| async move {
                let _ = release_rx.await;
                sink.write_all(b"x").await
            }),
            None,
            None,
        );

        let first = session.save_changes();
        tokio::pin!(first);
        assert!(futures::poll!(&mut first).is_pending());

        let second = session.save_changes().await;
        assert!(matches!(second, Err(FileStoreError::FlushInProgress)));

        release_tx.send(()).unwrap();
        first.await.unwrap();
        assert_eq!(transport.uploaded("/slow.bin"), Some(b"x".to_vec()));

        // The flag is cleared once the first flush ends.
        session.save_changes().await.unwrap();
    }

    #[tokio::test]
    async fn test_cancelled_flush_leaves_remainder() {
        let (store, transport) = setup(30);
        let session = store.open_session();
        let (cancel_tx, cancel_rx) = watch::channel(false);

        session.register_file_deletion("/1", None);
        session.register_file_deletion("/2", None);
        cancel_tx.send(true).unwrap();

        let err = session.save_changes_until(&cancel_rx).await.unwrap_err();
        assert!(matches!(err, FileStoreError::Cancelled { remaining: 2 }));
        assert!(transport.calls().is_empty());

        cancel_tx.send(false).unwrap();
        session.save_changes_until(&cancel_rx).await.unwrap();
        assert_eq!(transport.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_cancel_during_last_record_completes() {
        let (store, transport) = setup(30);
        let session = store.open_session();
        let (cancel_tx, cancel_rx) = watch::channel(false);

        session.register_upload(
            "/a",
            1,
            UploadSource::new(move |mut sink| async move {
                cancel_tx.send(true).unwrap();
                sink.write_all(b"x").await
            }),
            None,
            None,
        );

        session.save_changes_until(&cancel_rx).await.unwrap();
        assert_eq!(transport.calls(), vec!["upload /a 1"]);
        assert_eq!(session.pending_operations(), 0);
    }

    #[tokio::test]
    async fn test_cancel_mid_flush_keeps_next_record() {
        let (store, transport) = setup(30);
        let session = store.open_session();
        let (cancel_tx, cancel_rx) = watch::channel(false);

        session.register_upload(
            "/a",
            1,
            UploadSource::new(move |mut sink| async move {
                cancel_tx.send(true).unwrap();
                sink.write_all(b"x").await
            }),
            None,
            None,
        );
        session.register_file_deletion("/b", None);
        session.register_file_deletion("/c", None);

        let err = session.save_changes_until(&cancel_rx).await.unwrap_err();
        assert!(matches!(err, FileStoreError::Cancelled { remaining: 2 }));
        assert_eq!(transport.calls(), vec!["upload /a 1"]);
        assert_eq!(session.pending_operations(), 2);

        session.save_changes().await.unwrap();
        assert_eq!(
            transport.calls(),
            vec!["upload /a 1", "delete_file /b", "delete_file /c"]
        );
    }

    #[tokio::test]
    async fn test_cancelled_empty_flush_succeeds() {
        let (store, transport) = setup(30);
        let session = store.open_session();
        let (cancel_tx, cancel_rx) = watch::channel(false);
        cancel_tx.send(true).unwrap();

        session.save_changes_until(&cancel_rx).await.unwrap();
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn test_records_queued_during_flush_run_last() {
        let (store, transport) = setup(30);
        let session = Arc::new(store.open_session());

        let producer = Arc::clone(&session);
        session.register_upload(
            "/a",
            1,
            UploadSource::new(move |mut sink| async move {
                producer.register_file_deletion("/late", None);
                sink.write_all(b"x").await
            }),
            None,
            None,
        );
        session.register_file_deletion("/b", None);

        session.save_changes().await.unwrap();
        assert_eq!(
            transport.calls(),
            vec!["upload /a 1", "delete_file /b", "delete_file /late"]
        );
        assert_eq!(session.pending_operations(), 0);
    }

    #[test]
    fn test_request_budget() {
        let (store, _transport) = setup(3);
        let session = store.open_session();

        for _ in 0..3 {
            session.increment_request_count().unwrap();
        }
        assert_eq!(session.number_of_requests(), 3);

        let err = session.increment_request_count().unwrap_err();
        assert!(matches!(err, FileStoreError::RequestBudgetExceeded { max: 3 }));
        assert!(session.increment_request_count().is_err());
    }

    #[test]
    fn test_ceiling_is_per_session() {
        let (store, _transport) = setup(1);
        let first = store.open_session();
        let second = store.open_session();

        first.set_max_number_of_requests_per_session(2);
        assert_eq!(first.max_number_of_requests_per_session(), 2);
        assert_eq!(second.max_number_of_requests_per_session(), 1);

        first.increment_request_count().unwrap();
        first.increment_request_count().unwrap();
        second.increment_request_count().unwrap();
        assert!(second.increment_request_count().is_err());
    }

    #[test]
    fn test_sessions_are_never_equal() {
        let (store, _transport) = setup(30);
        let correlation = Uuid::new_v4();
        let first = FilesSession::open(&store, "docs", correlation);
        let second = FilesSession::open(&store, "docs", correlation);

        assert_ne!(first, second);
        assert_eq!(first, first);
        assert_ne!(first.id(), second.id());
        assert_ne!(hash_of(&first), hash_of(&second));
    }

    #[test]
    fn test_store_identifier() {
        let (store, _transport) = setup(30);
        let session = store.open_session_for("media");
        assert_eq!(session.store_identifier(), "http://files.test;media");
        assert_eq!(session.file_system(), "media");
    }

    #[test]
    fn test_is_deleted_tracks_known_missing_only() {
        let (store, _transport) = setup(30);
        let session = store.open_session();
        let header = Arc::new(FileHeader::new("/a.txt", 1));

        session.register_file_deletion(&header, None);
        assert!(session.is_marked_deleted(&header));
        assert!(!session.is_deleted("/a.txt"));

        session.record_missing("/B.txt");
        assert!(session.is_deleted("/b.txt"));
    }

    #[test]
    fn test_is_loaded() {
        let (store, _transport) = setup(30);
        let session = store.open_session();

        session.record_loaded(Arc::new(FileHeader::new("/Reports/Q3.csv", 10)));
        assert!(session.is_loaded("/reports/q3.csv"));
        assert!(!session.is_loaded("/reports/q4.csv"));
    }

    #[tokio::test]
    async fn test_rename_to_directory() {
        let (store, transport) = setup(30);
        let session = store.open_session();
        let header = Arc::new(FileHeader::new("/inbox/a.txt", 1));

        session
            .register_rename_to_directory(&header, "/archive/", "a-2024.txt")
            .unwrap();
        session.save_changes().await.unwrap();

        assert_eq!(
            transport.calls(),
            vec!["rename /inbox/a.txt -> /archive/a-2024.txt"]
        );
    }

    #[test]
    fn test_rename_to_directory_rejects_bad_names() {
        let (store, _transport) = setup(30);
        let session = store.open_session();

        for name in ["", ".", "..", "nested/name.txt", "dir/", "win\\name"] {
            let result = session.register_rename_to_directory("/a.txt", "/archive", name);
            assert!(
                matches!(result, Err(FileStoreError::InvalidArgument(_))),
                "accepted {:?}",
                name
            );
        }
        assert_eq!(session.pending_operations(), 0);
    }

    #[tokio::test]
    async fn test_load_file_records_results() {
        let (store, transport) = setup(30);
        transport.insert_header(FileHeader::new("/a.txt", 4));
        let session = store.open_session();

        let loaded = session.load_file("/a.txt").await.unwrap().unwrap();
        assert_eq!(loaded.size, 4);
        assert!(session.is_loaded("/A.TXT"));

        assert!(session.load_file("/missing.txt").await.unwrap().is_none());
        assert!(session.is_deleted("/missing.txt"));
        assert_eq!(session.number_of_requests(), 2);

        // Both answers now come from the session.
        let again = session.load_file("/a.txt").await.unwrap().unwrap();
        assert!(Arc::ptr_eq(&loaded, &again));
        assert!(session.load_file("/MISSING.txt").await.unwrap().is_none());
        assert_eq!(session.number_of_requests(), 2);
        assert_eq!(transport.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_load_file_respects_budget() {
        let (store, transport) = setup(1);
        let session = store.open_session();

        session.load_file("/a.txt").await.unwrap();
        let err = session.load_file("/b.txt").await.unwrap_err();
        assert!(matches!(err, FileStoreError::RequestBudgetExceeded { max: 1 }));
        assert_eq!(transport.calls(), vec!["file_info /a.txt"]);
    }
}
