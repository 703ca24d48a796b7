//! # Gatebox Store
//!
//! Object backend abstraction for gatebox. Access boxes are persisted as
//! opaque objects in a container; this crate defines the [`ObjectBackend`]
//! trait the credential service talks to, plus two implementations.
//!
//! ## Key Types
//!
//! - [`ObjectBackend`] - The async trait for put/get/head of objects
//! - [`SqliteBackend`] - SQLite-based persistent storage
//! - [`MemoryBackend`] - In-memory storage for tests
//! - [`Attribute`] / [`ObjectHeader`] - Object metadata
//!
//! ## Usage
//!
//! ```rust,no_run
//! use bytes::BytesMut;
//! use gatebox_core::{Address, ContainerId, OwnerId};
//! use gatebox_store::{ObjectBackend, SqliteBackend};
//!
//! async fn example() {
//!     let backend = SqliteBackend::open("objects.db").unwrap();
//!
//!     let cid = ContainerId::from_bytes([1; 32]);
//!     let owner = OwnerId::from_bytes([2; 32]);
//!     let oid = backend.put_object(&cid, &owner, &[], b"box").await.unwrap();
//!
//!     let mut buf = BytesMut::new();
//!     backend.get_object(&Address::new(cid, oid), &mut buf).await.unwrap();
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Content addressed**: object IDs are Blake3 over container, owner, attributes and payload
//! - **Idempotent puts**: storing the same object twice is a no-op
//! - **No retries**: transport failures surface unchanged

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryBackend;
pub use sqlite::SqliteBackend;
pub use traits::{
    compute_object_id, Attribute, ObjectBackend, ObjectHeader, ATTRIBUTE_FILE_NAME,
    ATTRIBUTE_TIMESTAMP,
};

/// Current unix time in seconds.
pub(crate) fn now_secs() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
