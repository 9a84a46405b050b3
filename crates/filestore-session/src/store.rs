use std::sync::Arc;

use filestore_core::{NoopListener, RemoteFileStore, SessionListener, StoreConventions};
use tracing::debug;
use uuid::Uuid;

use crate::session::FilesSession;

/// Entry point that opens sessions against one store.
///
/// Holds what every session shares: the store identifier, the conventions,
/// the transport and the listener. A store built without a transport opens
/// sessions that can track and queue but not flush.
pub struct FilesStore {
    identifier: String,
    default_file_system: String,
    conventions: StoreConventions,
    commands: Option<Arc<dyn RemoteFileStore>>,
    listener: Arc<dyn SessionListener>,
}

impl FilesStore {
    pub fn builder(
        identifier: impl Into<String>,
        default_file_system: impl Into<String>,
    ) -> FilesStoreBuilder {
        FilesStoreBuilder {
            identifier: identifier.into(),
            default_file_system: default_file_system.into(),
            conventions: StoreConventions::default(),
            commands: None,
            listener: Arc::new(NoopListener),
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn default_file_system(&self) -> &str {
        &self.default_file_system
    }

    pub fn conventions(&self) -> &StoreConventions {
        &self.conventions
    }

    pub fn commands(&self) -> Option<&Arc<dyn RemoteFileStore>> {
        self.commands.as_ref()
    }

    pub fn listener(&self) -> &Arc<dyn SessionListener> {
        &self.listener
    }

    /// Open a session on the default file system.
    pub fn open_session(&self) -> FilesSession {
        self.open_session_for(&self.default_file_system)
    }

    /// Open a session on `file_system`.
    pub fn open_session_for(&self, file_system: &str) -> FilesSession {
        let session = FilesSession::open(self, file_system, Uuid::new_v4());
        debug!(
            "Opened session {} ({}) on {}",
            session.id(),
            session.correlation_id(),
            session.store_identifier()
        );
        self.listener.on_session_opened(session.id(), file_system);
        session
    }
}

impl std::fmt::Debug for FilesStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilesStore")
            .field("identifier", &self.identifier)
            .field("default_file_system", &self.default_file_system)
            .field("conventions", &self.conventions)
            .field(
                "backend",
                &self.commands.as_ref().map(|c| c.backend_name()),
            )
            .finish_non_exhaustive()
    }
}

/// Builder for [`FilesStore`].
pub struct FilesStoreBuilder {
    identifier: String,
    default_file_system: String,
    conventions: StoreConventions,
    commands: Option<Arc<dyn RemoteFileStore>>,
    listener: Arc<dyn SessionListener>,
}

impl FilesStoreBuilder {
    pub fn with_conventions(mut self, conventions: StoreConventions) -> Self {
        self.conventions = conventions;
        self
    }

    pub fn with_commands(mut self, commands: Arc<dyn RemoteFileStore>) -> Self {
        self.commands = Some(commands);
        self
    }

    pub fn with_listener(mut self, listener: Arc<dyn SessionListener>) -> Self {
        self.listener = listener;
        self
    }

    pub fn build(self) -> FilesStore {
        FilesStore {
            identifier: self.identifier,
            default_file_system: self.default_file_system,
            conventions: self.conventions,
            commands: self.commands,
            listener: self.listener,
        }
    }
}
