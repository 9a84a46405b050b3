/// Notification hook handed to every session a store opens.
///
/// Sessions never consult the listener themselves; it is carried for the
/// layer around them.
pub trait SessionListener: Send + Sync {
    /// Called once per session right after it is opened.
    fn on_session_opened(&self, _session_id: u64, _file_system: &str) {}
}

/// Listener that ignores every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopListener;

impl SessionListener for NoopListener {}
