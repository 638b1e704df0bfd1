//! dolphypretzel-core - Core library for dolphypretzel
//!
//! This crate contains the local entry store, the Drive-backed sync
//! adapter, and the session logic behind the journal's save, send, and
//! poll actions.

pub mod config;
pub mod drive;
pub mod error;
pub mod models;
pub mod store;
pub mod sync;
mod util;

pub use error::{Error, Result};
pub use models::{Entry, EntryId};
