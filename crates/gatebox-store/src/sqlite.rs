//! SQLite implementation of the ObjectBackend trait.
//!
//! Persistent backend for a single gateway node. It uses rusqlite with
//! bundled SQLite, wrapped in async via tokio::spawn_blocking.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::BytesMut;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use gatebox_core::{Address, ContainerId, ObjectId, OwnerId};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::{compute_object_id, Attribute, ObjectBackend, ObjectHeader};

/// SQLite-based backend.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime.
pub struct SqliteBackend {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteBackend {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection on the blocking pool.
    async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();

        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().map_err(|e| {
                StoreError::Database(rusqlite::Error::SqliteFailure(
                    rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_LOCKED),
                    Some(format!("mutex poisoned: {}", e)),
                ))
            })?;
            f(&conn)
        })
        .await
        .map_err(|e| StoreError::Task(format!("spawn_blocking failed: {}", e)))?
    }
}

fn encode_attributes(attributes: &[Attribute]) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    ciborium::into_writer(attributes, &mut buf)
        .map_err(|e| StoreError::Serialization(e.to_string()))?;
    Ok(buf)
}

fn decode_attributes(bytes: &[u8]) -> Result<Vec<Attribute>> {
    ciborium::from_reader(bytes).map_err(|e| StoreError::Serialization(e.to_string()))
}

fn owner_from_blob(bytes: Vec<u8>) -> Result<OwnerId> {
    let bytes: [u8; 32] = bytes
        .try_into()
        .map_err(|_| StoreError::InvalidData("owner_id must be 32 bytes".into()))?;
    Ok(OwnerId::from_bytes(bytes))
}

#[async_trait]
impl ObjectBackend for SqliteBackend {
    async fn put_object(
        &self,
        container_id: &ContainerId,
        owner_id: &OwnerId,
        attributes: &[Attribute],
        payload: &[u8],
    ) -> Result<ObjectId> {
        let object_id = compute_object_id(container_id, owner_id, attributes, payload);
        let attributes_cbor = encode_attributes(attributes)?;
        let container_id = *container_id;
        let owner_id = *owner_id;
        let payload = payload.to_vec();

        let inserted = self
            .run(move |conn| {
                let rows = conn.execute(
                    "INSERT OR IGNORE INTO objects (
                        container_id, object_id, owner_id, attributes, payload, stored_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![
                        container_id.as_bytes().as_slice(),
                        object_id.as_bytes().as_slice(),
                        owner_id.as_bytes().as_slice(),
                        attributes_cbor,
                        payload,
                        crate::now_secs(),
                    ],
                )?;
                Ok(rows > 0)
            })
            .await?;

        if !inserted {
            debug!(object = %object_id, "object already stored");
        }

        Ok(object_id)
    }

    async fn get_object(&self, address: &Address, out: &mut BytesMut) -> Result<()> {
        let address = *address;

        let payload: Option<Vec<u8>> = self
            .run(move |conn| {
                Ok(conn
                    .query_row(
                        "SELECT payload FROM objects WHERE container_id = ?1 AND object_id = ?2",
                        params![
                            address.container_id.as_bytes().as_slice(),
                            address.object_id.as_bytes().as_slice(),
                        ],
                        |row| row.get(0),
                    )
                    .optional()?)
            })
            .await?;

        let payload = payload.ok_or(StoreError::NotFound(address))?;
        out.extend_from_slice(&payload);
        Ok(())
    }

    async fn head_object(&self, address: &Address) -> Result<ObjectHeader> {
        let address = *address;

        let row: Option<(Vec<u8>, Vec<u8>, i64)> = self
            .run(move |conn| {
                Ok(conn
                    .query_row(
                        "SELECT owner_id, attributes, length(payload) FROM objects
                         WHERE container_id = ?1 AND object_id = ?2",
                        params![
                            address.container_id.as_bytes().as_slice(),
                            address.object_id.as_bytes().as_slice(),
                        ],
                        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
                    )
                    .optional()?)
            })
            .await?;

        let (owner_bytes, attributes_cbor, payload_len) =
            row.ok_or(StoreError::NotFound(address))?;

        Ok(ObjectHeader {
            owner_id: owner_from_blob(owner_bytes)?,
            attributes: decode_attributes(&attributes_cbor)?,
            payload_len: u64::try_from(payload_len)
                .map_err(|_| StoreError::InvalidData("negative payload length".into()))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{ATTRIBUTE_FILE_NAME, ATTRIBUTE_TIMESTAMP};

    fn ids() -> (ContainerId, OwnerId) {
        (ContainerId::from_bytes([7; 32]), OwnerId::from_bytes([8; 32]))
    }

    #[tokio::test]
    async fn test_put_get_head() {
        let backend = SqliteBackend::open_memory().unwrap();
        let (cid, owner) = ids();
        let attrs = vec![
            Attribute::new(ATTRIBUTE_TIMESTAMP, "1700000000"),
            Attribute::new(ATTRIBUTE_FILE_NAME, "1700000000_access.box"),
        ];

        let oid = backend.put_object(&cid, &owner, &attrs, b"payload").await.unwrap();
        let address = Address::new(cid, oid);

        let mut buf = BytesMut::new();
        backend.get_object(&address, &mut buf).await.unwrap();
        assert_eq!(&buf[..], b"payload");

        let header = backend.head_object(&address).await.unwrap();
        assert_eq!(header.owner_id, owner);
        assert_eq!(header.attributes, attrs);
        assert_eq!(header.payload_len, 7);
    }

    #[tokio::test]
    async fn test_put_idempotent() {
        let backend = SqliteBackend::open_memory().unwrap();
        let (cid, owner) = ids();

        let first = backend.put_object(&cid, &owner, &[], b"x").await.unwrap();
        let second = backend.put_object(&cid, &owner, &[], b"x").await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_missing_object() {
        let backend = SqliteBackend::open_memory().unwrap();
        let address = Address::new(ContainerId::from_bytes([1; 32]), ObjectId::from_bytes([1; 32]));

        let mut buf = BytesMut::new();
        assert!(matches!(
            backend.get_object(&address, &mut buf).await,
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            backend.head_object(&address).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("objects.db");
        let (cid, owner) = ids();

        let oid = {
            let backend = SqliteBackend::open(&path).unwrap();
            backend.put_object(&cid, &owner, &[], b"durable").await.unwrap()
        };

        let backend = SqliteBackend::open(&path).unwrap();
        let mut buf = BytesMut::new();
        backend.get_object(&Address::new(cid, oid), &mut buf).await.unwrap();
        assert_eq!(&buf[..], b"durable");
    }
}
