use serde::{Deserialize, Serialize};

/// Store-wide settings, read by every session when it opens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConventions {
    /// Round trips a session may charge before failing fast
    #[serde(default = "default_max_requests")]
    pub max_number_of_requests_per_session: usize,
}

fn default_max_requests() -> usize {
    30
}

impl Default for StoreConventions {
    fn default() -> Self {
        Self {
            max_number_of_requests_per_session: default_max_requests(),
        }
    }
}
