//! Periodic synchronization between the local entry store and the
//! remote shared folder.
//!
//! A tick lists the remote folder, materializes shared files that are
//! not yet on disk, and notifies per new entry. Ticks never overlap; a
//! failed tick is dropped and the next interval retries from scratch.

use std::path::Path;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::config::SyncConfig;
use crate::drive::{DriveFiles, DriveFolder, RemoteFile};
use crate::models::{is_shared_name, strip_shared_prefix, EntryId};
use crate::store::EntryStore;
use crate::Result;

/// Where the session is in its tick cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncState {
    /// Waiting for the next tick.
    #[default]
    Idle,
    /// A tick is in progress.
    Syncing,
}

/// Change notifications produced by sync activity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// A shared entry was materialized into the local store.
    EntryReceived {
        /// Local file name of the new entry.
        name: String,
    },
    /// The set of local entries may have changed; listings should refresh.
    EntriesChanged,
}

/// One journal session: the local store plus the remote folder it syncs
/// against. Built once at startup and discarded on shutdown.
#[derive(Debug)]
pub struct SyncSession<C> {
    store: EntryStore,
    folder: DriveFolder<C>,
    poll_interval: Duration,
    state: SyncState,
}

impl<C: DriveFiles> SyncSession<C> {
    /// Resolve the remote folder and build a session over it.
    pub async fn connect(store: EntryStore, client: C, config: SyncConfig) -> Result<Self> {
        let folder = DriveFolder::ensure(client, &config.folder_name)
            .await?
            .with_duplicate_policy(config.duplicate_policy);
        Ok(Self::new(store, folder, config.poll_interval))
    }

    /// Build a session over an already-resolved folder.
    #[must_use]
    pub const fn new(store: EntryStore, folder: DriveFolder<C>, poll_interval: Duration) -> Self {
        Self {
            store,
            folder,
            poll_interval,
            state: SyncState::Idle,
        }
    }

    /// Current position in the tick cycle.
    #[must_use]
    pub const fn state(&self) -> SyncState {
        self.state
    }

    /// Local entry store backing this session.
    #[must_use]
    pub const fn store(&self) -> &EntryStore {
        &self.store
    }

    /// Remote folder this session syncs against.
    #[must_use]
    pub const fn folder(&self) -> &DriveFolder<C> {
        &self.folder
    }

    /// Save a new entry locally, then push its text to the remote folder.
    ///
    /// The push is a blind create; a push failure leaves the completed
    /// local save in place.
    pub async fn save_entry(&self, text: &str, image: Option<&Path>) -> Result<EntryId> {
        let id = self.store.save_entry(text, image)?;
        self.folder
            .push(&self.store.text_path(&id), false)
            .await?;
        Ok(id)
    }

    /// Copy an entry into the local shared directory and push its text
    /// under the shared prefix. Images are staged locally but not pushed.
    pub async fn send_entry(&self, id: &EntryId) -> Result<RemoteFile> {
        let staged = self.store.stage_shared(id)?;
        self.folder.push(&staged, true).await
    }

    /// Run one sync tick: pull the manifest, materialize shared files
    /// that are not yet on disk, and notify per new entry as it lands.
    ///
    /// Notifications are delivered eagerly: a failure partway through
    /// the tick keeps the notices for entries already materialized,
    /// which later ticks skip as present. A successful tick ends with
    /// one `EntriesChanged`; any failure aborts the rest of the tick,
    /// and nothing is retried until the next interval.
    pub async fn tick(&mut self, notify: impl FnMut(SyncEvent)) -> Result<()> {
        self.state = SyncState::Syncing;
        let outcome = self.tick_inner(notify).await;
        self.state = SyncState::Idle;
        outcome
    }

    async fn tick_inner(&self, mut notify: impl FnMut(SyncEvent)) -> Result<()> {
        let manifest = self.folder.manifest().await?;
        tracing::debug!("sync tick listed {} remote files", manifest.len());

        for file in manifest {
            if !is_shared_name(&file.name) {
                continue;
            }
            let local_name = strip_shared_prefix(&file.name);
            if self.store.contains_file(local_name) {
                continue;
            }
            let bytes = self.folder.download(&file.id).await?;
            if self.store.materialize_shared(&file.name, &bytes)? {
                tracing::info!("Received shared entry {local_name}");
                notify(SyncEvent::EntryReceived {
                    name: local_name.to_string(),
                });
            }
        }
        notify(SyncEvent::EntriesChanged);
        Ok(())
    }

    /// Drive the poll loop, forwarding tick events into the channel
    /// until the receiver is dropped. Failed ticks are logged and
    /// retried on the next interval.
    ///
    /// `run` borrows the session for its whole lifetime, so it suits a
    /// shell that only consumes events. An interactive shell should own
    /// the session on one task and interleave `tick` with `save_entry`
    /// and `send_entry`; user actions and ticks then never overlap.
    pub async fn run(&mut self, events: UnboundedSender<SyncEvent>) {
        let mut ticker = interval_at(Instant::now() + self.poll_interval, self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let outcome = self
                .tick(|event| {
                    let _ = events.send(event);
                })
                .await;
            if let Err(error) = outcome {
                tracing::warn!("sync tick failed: {error}");
            }
            if events.is_closed() {
                return;
            }
        }
    }
}
