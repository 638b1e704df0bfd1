//! Configuration for the sync session.

use std::time::Duration;

use crate::drive::DuplicatePolicy;

/// Application name, used for the local entry directory and the remote
/// sync folder.
pub const APP_NAME: &str = "dolphypretzel";

/// Interval between sync ticks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Settings for a sync session.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Name of the remote folder that holds synced entries.
    pub folder_name: String,
    /// Interval between sync ticks.
    pub poll_interval: Duration,
    /// How pushes treat remote files that already carry the same name.
    pub duplicate_policy: DuplicatePolicy,
}

impl SyncConfig {
    /// Create a configuration with stock settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            folder_name: APP_NAME.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            duplicate_policy: DuplicatePolicy::default(),
        }
    }

    /// Set the remote folder name.
    #[must_use]
    pub fn with_folder_name(mut self, folder_name: impl Into<String>) -> Self {
        self.folder_name = folder_name.into();
        self
    }

    /// Set the interval between sync ticks.
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Set the push behavior for duplicate remote names.
    #[must_use]
    pub const fn with_duplicate_policy(mut self, duplicate_policy: DuplicatePolicy) -> Self {
        self.duplicate_policy = duplicate_policy;
        self
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new()
    }
}
