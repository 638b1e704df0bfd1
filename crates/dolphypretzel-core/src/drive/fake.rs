//! In-memory Drive capability for exercising adapter and session logic.

use std::sync::{Arc, Mutex};

use super::{DriveFiles, RemoteFile};
use crate::{Error, Result};

/// Shared in-memory stand-in for the Drive files API.
///
/// Clones share one state, so a test can keep a handle for seeding and
/// inspection while the adapter owns another.
#[derive(Debug, Clone, Default)]
pub(crate) struct FakeDrive {
    state: Arc<Mutex<State>>,
}

#[derive(Debug, Default)]
struct State {
    folders: Vec<RemoteFile>,
    files: Vec<StoredFile>,
    uploads: Vec<(String, String)>,
    downloads: Vec<String>,
    created_folders: Vec<String>,
    fail_listings: bool,
    fail_uploads: bool,
    fail_downloads: bool,
    failing_downloads: Vec<String>,
    next_id: u64,
}

#[derive(Debug, Clone)]
struct StoredFile {
    folder_id: String,
    file: RemoteFile,
    bytes: Vec<u8>,
}

impl FakeDrive {
    /// Seed a folder and return its descriptor.
    pub fn add_folder(&self, name: &str) -> RemoteFile {
        let mut state = self.state.lock().unwrap();
        let folder = RemoteFile {
            id: next_id(&mut state, "folder"),
            name: name.to_string(),
        };
        state.folders.push(folder.clone());
        folder
    }

    /// Seed a file under a folder and return its descriptor.
    pub fn add_file(&self, folder_id: &str, name: &str, bytes: &[u8]) -> RemoteFile {
        let mut state = self.state.lock().unwrap();
        let file = RemoteFile {
            id: next_id(&mut state, "file"),
            name: name.to_string(),
        };
        state.files.push(StoredFile {
            folder_id: folder_id.to_string(),
            file: file.clone(),
            bytes: bytes.to_vec(),
        });
        file
    }

    /// Uploads recorded so far, as (remote name, content type) pairs.
    pub fn uploads(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().uploads.clone()
    }

    /// Ids of files downloaded so far, in request order.
    pub fn downloads(&self) -> Vec<String> {
        self.state.lock().unwrap().downloads.clone()
    }

    /// Names of folders created through the capability.
    pub fn created_folders(&self) -> Vec<String> {
        self.state.lock().unwrap().created_folders.clone()
    }

    /// Make every listing call fail until cleared.
    pub fn set_fail_listings(&self, fail: bool) {
        self.state.lock().unwrap().fail_listings = fail;
    }

    /// Make every upload call fail until cleared.
    pub fn set_fail_uploads(&self, fail: bool) {
        self.state.lock().unwrap().fail_uploads = fail;
    }

    /// Make every download call fail until cleared.
    pub fn set_fail_downloads(&self, fail: bool) {
        self.state.lock().unwrap().fail_downloads = fail;
    }

    /// Make downloads of one file fail until cleared.
    pub fn set_fail_download_of(&self, file_id: &str, fail: bool) {
        let mut state = self.state.lock().unwrap();
        if fail {
            state.failing_downloads.push(file_id.to_string());
        } else {
            state.failing_downloads.retain(|id| id != file_id);
        }
    }
}

fn next_id(state: &mut State, kind: &str) -> String {
    state.next_id += 1;
    format!("{kind}-{}", state.next_id)
}

impl DriveFiles for FakeDrive {
    async fn find_folders(&self, name: &str) -> Result<Vec<RemoteFile>> {
        let state = self.state.lock().unwrap();
        if state.fail_listings {
            return Err(Error::Sync("list files: simulated failure".to_string()));
        }
        Ok(state
            .folders
            .iter()
            .filter(|folder| folder.name == name)
            .cloned()
            .collect())
    }

    async fn create_folder(&self, name: &str) -> Result<RemoteFile> {
        let mut state = self.state.lock().unwrap();
        let folder = RemoteFile {
            id: next_id(&mut state, "folder"),
            name: name.to_string(),
        };
        state.folders.push(folder.clone());
        state.created_folders.push(name.to_string());
        Ok(folder)
    }

    async fn list_children(&self, folder_id: &str) -> Result<Vec<RemoteFile>> {
        let state = self.state.lock().unwrap();
        if state.fail_listings {
            return Err(Error::Sync("list files: simulated failure".to_string()));
        }
        Ok(state
            .files
            .iter()
            .filter(|stored| stored.folder_id == folder_id)
            .map(|stored| stored.file.clone())
            .collect())
    }

    async fn upload(
        &self,
        folder_id: &str,
        name: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> Result<RemoteFile> {
        let mut state = self.state.lock().unwrap();
        if state.fail_uploads {
            return Err(Error::Sync("upload file: simulated failure".to_string()));
        }
        state
            .uploads
            .push((name.to_string(), content_type.to_string()));
        let file = RemoteFile {
            id: next_id(&mut state, "file"),
            name: name.to_string(),
        };
        state.files.push(StoredFile {
            folder_id: folder_id.to_string(),
            file: file.clone(),
            bytes: bytes.to_vec(),
        });
        Ok(file)
    }

    async fn download(&self, file_id: &str) -> Result<Vec<u8>> {
        let mut state = self.state.lock().unwrap();
        if state.fail_downloads || state.failing_downloads.iter().any(|id| id == file_id) {
            return Err(Error::Sync("download file: simulated failure".to_string()));
        }
        let Some(stored) = state.files.iter().find(|stored| stored.file.id == file_id) else {
            return Err(Error::Sync(format!("download file: no such file {file_id}")));
        };
        let bytes = stored.bytes.clone();
        state.downloads.push(file_id.to_string());
        Ok(bytes)
    }
}
