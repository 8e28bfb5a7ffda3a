//! Persistence of chiseled blocks and the `[C&B]` share-string format.
#![forbid(unsafe_code)]

pub mod document;
pub mod error;
pub mod record;
pub mod share;

pub use document::{BlockEntry, WorldDocument};
pub use error::IoError;
pub use record::ChiseledRecord;
pub use share::{ShareData, SharedModel};
