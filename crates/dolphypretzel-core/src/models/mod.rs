//! Data models for dolphypretzel

mod entry;

pub use entry::{
    is_image_extension, is_shared_name, shared_name, strip_shared_prefix, Entry, EntryId,
    ENTRY_PREFIX, IMAGE_EXTENSIONS, SHARED_PREFIX,
};
