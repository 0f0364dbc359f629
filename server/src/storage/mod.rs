//! Storage module
//!
//! Provides named blob storage for uploaded user images.

pub mod blob_store;

pub use blob_store::{is_valid_name, BlobStore, DiskBlobStore, MemoryBlobStore};
