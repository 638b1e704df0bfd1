//! Remote sync adapter over the Drive files capability.
//!
//! [`DriveFiles`] is the boundary to the cloud provider (implemented over
//! HTTP by [`DriveApiClient`]); [`DriveFolder`] scopes it to the single
//! remote folder a journal syncs through.

mod api;

#[cfg(test)]
pub(crate) mod fake;

pub use api::DriveApiClient;

use std::path::Path;

use serde::Deserialize;

use crate::models::shared_name;
use crate::{Error, Result};

/// Descriptor of one remote file, as carried by a folder manifest.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteFile {
    /// Provider-assigned file id
    pub id: String,
    /// File name under the sync folder
    pub name: String,
}

/// Remote duplicate handling for pushes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    /// Every push is a blind create; pushing the same entry again produces
    /// a duplicate remote object.
    #[default]
    AllowDuplicates,
    /// Consult the folder listing first and skip a push whose remote name
    /// is already present.
    SkipExisting,
}

/// Capability boundary over the cloud files API.
// Consumers run on a single task; no Send bound is required.
#[allow(async_fn_in_trait)]
pub trait DriveFiles {
    /// List folders carrying this exact name.
    async fn find_folders(&self, name: &str) -> Result<Vec<RemoteFile>>;

    /// Create a folder and return its descriptor.
    async fn create_folder(&self, name: &str) -> Result<RemoteFile>;

    /// List every file under the folder, following pagination to
    /// exhaustion.
    async fn list_children(&self, folder_id: &str) -> Result<Vec<RemoteFile>>;

    /// Create a file with the given bytes under the folder.
    async fn upload(
        &self,
        folder_id: &str,
        name: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> Result<RemoteFile>;

    /// Download the full content of one file.
    async fn download(&self, file_id: &str) -> Result<Vec<u8>>;
}

/// A Drive client scoped to the journal's remote folder.
#[derive(Debug, Clone)]
pub struct DriveFolder<C> {
    client: C,
    folder: RemoteFile,
    duplicate_policy: DuplicatePolicy,
}

impl<C: DriveFiles> DriveFolder<C> {
    /// Resolve the remote folder by name, creating it when no match exists.
    ///
    /// The name query can match several folders; the first descriptor
    /// returned wins.
    pub async fn ensure(client: C, name: &str) -> Result<Self> {
        let mut matches = client.find_folders(name).await?;
        let folder = if matches.is_empty() {
            let created = client.create_folder(name).await?;
            tracing::info!("Created remote sync folder {name}");
            created
        } else {
            matches.remove(0)
        };
        Ok(Self {
            client,
            folder,
            duplicate_policy: DuplicatePolicy::default(),
        })
    }

    /// Set the remote duplicate handling for pushes.
    #[must_use]
    pub const fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_policy = policy;
        self
    }

    /// Provider-assigned id of the folder.
    #[must_use]
    pub fn folder_id(&self) -> &str {
        &self.folder.id
    }

    /// Name of the folder.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.folder.name
    }

    /// Upload a local file under the folder, prefixing the remote name with
    /// the shared marker when `as_shared` is set.
    pub async fn push(&self, local_path: &Path, as_shared: bool) -> Result<RemoteFile> {
        let file_name = local_path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                Error::Validation(format!(
                    "push source has no usable file name: {}",
                    local_path.display()
                ))
            })?;
        let remote_name = if as_shared {
            shared_name(file_name)
        } else {
            file_name.to_string()
        };

        if self.duplicate_policy == DuplicatePolicy::SkipExisting {
            let manifest = self.manifest().await?;
            if let Some(existing) = manifest.into_iter().find(|file| file.name == remote_name) {
                tracing::debug!("Skipping push of {remote_name}: already present remotely");
                return Ok(existing);
            }
        }

        let bytes = std::fs::read(local_path)?;
        let content_type = content_type_for_name(file_name);
        self.client
            .upload(&self.folder.id, &remote_name, content_type, &bytes)
            .await
    }

    /// Current listing of every file under the folder.
    pub async fn manifest(&self) -> Result<Vec<RemoteFile>> {
        self.client.list_children(&self.folder.id).await
    }

    /// Download the full content of one remote file.
    pub async fn download(&self, file_id: &str) -> Result<Vec<u8>> {
        self.client.download(file_id).await
    }
}

/// Attach the failing operation to a sync error message.
pub(crate) fn sync_error(operation: &str, error: impl std::fmt::Display) -> Error {
    Error::Sync(format!("{operation}: {error}"))
}

/// MIME type for an uploaded file, from its name's extension.
fn content_type_for_name(name: &str) -> &'static str {
    let extension = name.rsplit_once('.').map(|(_, ext)| ext).unwrap_or_default();
    match extension.to_ascii_lowercase().as_str() {
        "txt" => "text/plain",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        _ => "application/octet-stream",
    }
}
