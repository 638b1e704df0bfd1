//! Local entry store: one text file per entry, optional image alongside it.

use std::path::{Path, PathBuf};

use crate::config::APP_NAME;
use crate::models::{strip_shared_prefix, Entry, EntryId, IMAGE_EXTENSIONS, SHARED_PREFIX};
use crate::{Error, Result};

/// Subdirectory holding local copies of sent entries.
const SHARED_DIR_NAME: &str = "shared";

/// Directory-backed persistence for entries.
///
/// The base directory holds `entry_<ts>.txt` files plus their images; the
/// `shared/` subdirectory stages local copies of entries the user sent.
#[derive(Debug, Clone)]
pub struct EntryStore {
    base_dir: PathBuf,
    shared_dir: PathBuf,
}

impl EntryStore {
    /// Open a store rooted at the given directory, creating it (and the
    /// shared subdirectory) if absent.
    pub fn open(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let base_dir = base_dir.into();
        let shared_dir = base_dir.join(SHARED_DIR_NAME);
        std::fs::create_dir_all(&shared_dir)?;
        Ok(Self {
            base_dir,
            shared_dir,
        })
    }

    /// Open the store at the default per-user location,
    /// `<documents>/dolphypretzel`.
    pub fn open_default() -> Result<Self> {
        let documents = dirs::document_dir().unwrap_or_else(|| PathBuf::from("."));
        Self::open(documents.join(APP_NAME))
    }

    /// Directory holding the entry files.
    #[must_use]
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Directory holding staged copies of sent entries.
    #[must_use]
    pub fn shared_dir(&self) -> &Path {
        &self.shared_dir
    }

    /// List ids of entries present locally, excluding shared-prefixed files.
    ///
    /// Order follows directory enumeration order and is not guaranteed
    /// chronological.
    pub fn list_entries(&self) -> Result<Vec<EntryId>> {
        let mut ids = Vec::new();
        for dir_entry in std::fs::read_dir(&self.base_dir)? {
            let dir_entry = dir_entry?;
            if !dir_entry.file_type()?.is_file() {
                continue;
            }
            let file_name = dir_entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };
            if name.starts_with(SHARED_PREFIX) {
                continue;
            }
            if let Some(id) = EntryId::from_file_name(name) {
                ids.push(id);
            }
        }
        Ok(ids)
    }

    /// Save a new entry from text and an optional image source path.
    ///
    /// The text is trimmed before writing; empty or whitespace-only text is
    /// rejected without touching the disk, as is an image whose extension is
    /// not a recognized image type. The image is copied alongside the text
    /// file under the entry's base name with its extension lowercased.
    pub fn save_entry(&self, text: &str, image: Option<&Path>) -> Result<EntryId> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(Error::Validation("entry text cannot be empty".to_string()));
        }
        let image = match image {
            Some(source) => Some((source, image_extension_of(source)?)),
            None => None,
        };

        let id = EntryId::now();
        std::fs::write(self.text_path(&id), trimmed)?;
        if let Some((source, extension)) = image {
            std::fs::copy(source, self.base_dir.join(id.image_file_name(&extension)))?;
        }
        Ok(id)
    }

    /// Load an entry's text and locate its image, if any.
    pub fn read_entry(&self, id: &EntryId) -> Result<Entry> {
        let text = match std::fs::read_to_string(self.text_path(id)) {
            Ok(text) => text,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::NotFound(format!(
                    "entry {id} has no text file on disk"
                )));
            }
            Err(error) => return Err(error.into()),
        };
        Ok(Entry {
            id: id.clone(),
            text,
            image: self.find_image(id),
        })
    }

    /// First existing image for the entry, probing extensions in fixed order.
    #[must_use]
    pub fn find_image(&self, id: &EntryId) -> Option<PathBuf> {
        IMAGE_EXTENSIONS.iter().find_map(|extension| {
            let candidate = self.base_dir.join(id.image_file_name(extension));
            candidate.exists().then_some(candidate)
        })
    }

    /// Copy an entry's text file and every existing image variant into the
    /// shared subdirectory. Returns the staged text path.
    pub fn stage_shared(&self, id: &EntryId) -> Result<PathBuf> {
        let text_path = self.text_path(id);
        if !text_path.exists() {
            return Err(Error::NotFound(format!(
                "entry {id} has no text file on disk"
            )));
        }

        let staged_text = self.shared_dir.join(id.text_file_name());
        std::fs::copy(&text_path, &staged_text)?;
        for extension in IMAGE_EXTENSIONS {
            let image_path = self.base_dir.join(id.image_file_name(extension));
            if image_path.exists() {
                std::fs::copy(&image_path, self.shared_dir.join(id.image_file_name(extension)))?;
            }
        }
        Ok(staged_text)
    }

    /// Write a downloaded shared file into the entry directory under its
    /// de-prefixed name.
    ///
    /// Skips the write (returning `false`) when the file already exists, so
    /// repeated materialization of the same remote file is a no-op.
    pub fn materialize_shared(&self, name: &str, bytes: &[u8]) -> Result<bool> {
        let local_name = strip_shared_prefix(name);
        if local_name.is_empty() || local_name.contains('/') || local_name.contains('\\') {
            return Err(Error::Validation(format!(
                "unsafe remote file name: {name}"
            )));
        }

        let path = self.base_dir.join(local_name);
        if path.exists() {
            return Ok(false);
        }
        std::fs::write(path, bytes)?;
        Ok(true)
    }

    /// Whether a file with this exact name exists in the entry directory.
    #[must_use]
    pub fn contains_file(&self, name: &str) -> bool {
        self.base_dir.join(name).exists()
    }

    /// Path of the entry's text file in the entry directory.
    #[must_use]
    pub fn text_path(&self, id: &EntryId) -> PathBuf {
        self.base_dir.join(id.text_file_name())
    }
}

fn image_extension_of(source: &Path) -> Result<String> {
    let extension = source
        .extension()
        .and_then(|extension| extension.to_str())
        .unwrap_or_default();
    if crate::models::is_image_extension(extension) {
        Ok(extension.to_ascii_lowercase())
    } else {
        Err(Error::Validation(format!(
            "unrecognized image extension: {}",
            source.display()
        )))
    }
}
