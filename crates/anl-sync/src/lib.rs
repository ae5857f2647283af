//! # anl-sync
//!
//! Moves documents between IDOL and Doccano through a local staging
//! folder: export unlabeled IDOL documents, upload them for annotation,
//! and download the annotated result.

mod error;
pub mod ports;
pub mod service;

pub use error::SyncError;
pub use ports::{AnnotationService, SearchIndex};
pub use service::{SyncService, authenticate};
