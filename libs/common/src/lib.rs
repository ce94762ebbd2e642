//! Common library for the memorial-book backend
//!
//! This crate provides the pieces shared between the service binary and
//! its tests: the persisted document model, the document store with its
//! JSON-file and embedded-SQLite backends, and the store error types.

pub mod document;
pub mod error;
pub mod store;

pub use document::Document;
pub use error::{StoreError, StoreResult};
pub use store::DocumentStore;
