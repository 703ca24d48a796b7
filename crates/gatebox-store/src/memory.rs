//! In-memory implementation of the ObjectBackend trait.
//!
//! This is primarily for testing. It has the same semantics as SQLite
//! but keeps everything in memory with no persistence.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use bytes::BytesMut;

use gatebox_core::{Address, ContainerId, ObjectId, OwnerId};

use crate::error::{Result, StoreError};
use crate::traits::{compute_object_id, Attribute, ObjectBackend, ObjectHeader};

/// In-memory backend.
///
/// All data is lost when the backend is dropped. Thread-safe via RwLock.
pub struct MemoryBackend {
    objects: RwLock<HashMap<Address, StoredObject>>,
}

struct StoredObject {
    header: ObjectHeader,
    payload: Vec<u8>,
}

impl MemoryBackend {
    /// Create a new empty in-memory backend.
    pub fn new() -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
        }
    }

    /// Number of stored objects.
    pub fn len(&self) -> usize {
        self.read().map(|objects| objects.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<Address, StoredObject>>> {
        self.objects
            .read()
            .map_err(|e| StoreError::InvalidData(format!("lock poisoned: {}", e)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<Address, StoredObject>>> {
        self.objects
            .write()
            .map_err(|e| StoreError::InvalidData(format!("lock poisoned: {}", e)))
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ObjectBackend for MemoryBackend {
    async fn put_object(
        &self,
        container_id: &ContainerId,
        owner_id: &OwnerId,
        attributes: &[Attribute],
        payload: &[u8],
    ) -> Result<ObjectId> {
        let object_id = compute_object_id(container_id, owner_id, attributes, payload);
        let address = Address::new(*container_id, object_id);

        let mut objects = self.write()?;
        objects.entry(address).or_insert_with(|| StoredObject {
            header: ObjectHeader {
                owner_id: *owner_id,
                attributes: attributes.to_vec(),
                payload_len: payload.len() as u64,
            },
            payload: payload.to_vec(),
        });

        Ok(object_id)
    }

    async fn get_object(&self, address: &Address, out: &mut BytesMut) -> Result<()> {
        let objects = self.read()?;
        let object = objects
            .get(address)
            .ok_or(StoreError::NotFound(*address))?;
        out.extend_from_slice(&object.payload);
        Ok(())
    }

    async fn head_object(&self, address: &Address) -> Result<ObjectHeader> {
        let objects = self.read()?;
        objects
            .get(address)
            .map(|object| object.header.clone())
            .ok_or(StoreError::NotFound(*address))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::ATTRIBUTE_FILE_NAME;

    fn ids() -> (ContainerId, OwnerId) {
        (ContainerId::from_bytes([1; 32]), OwnerId::from_bytes([2; 32]))
    }

    #[tokio::test]
    async fn test_put_get() {
        let backend = MemoryBackend::new();
        let (cid, owner) = ids();

        let oid = backend.put_object(&cid, &owner, &[], b"hello").await.unwrap();

        let mut buf = BytesMut::new();
        backend.get_object(&Address::new(cid, oid), &mut buf).await.unwrap();
        assert_eq!(&buf[..], b"hello");
    }

    #[tokio::test]
    async fn test_get_appends() {
        let backend = MemoryBackend::new();
        let (cid, owner) = ids();
        let oid = backend.put_object(&cid, &owner, &[], b"world").await.unwrap();

        let mut buf = BytesMut::from(&b"hello "[..]);
        backend.get_object(&Address::new(cid, oid), &mut buf).await.unwrap();
        assert_eq!(&buf[..], b"hello world");
    }

    #[tokio::test]
    async fn test_put_idempotent() {
        let backend = MemoryBackend::new();
        let (cid, owner) = ids();

        let first = backend.put_object(&cid, &owner, &[], b"same").await.unwrap();
        let second = backend.put_object(&cid, &owner, &[], b"same").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(backend.len(), 1);
    }

    #[tokio::test]
    async fn test_get_missing() {
        let backend = MemoryBackend::new();
        let address = Address::new(ContainerId::from_bytes([0; 32]), ObjectId::from_bytes([0; 32]));

        let mut buf = BytesMut::new();
        let result = backend.get_object(&address, &mut buf).await;
        assert!(matches!(result, Err(StoreError::NotFound(a)) if a == address));
        assert!(buf.is_empty());
    }

    #[tokio::test]
    async fn test_head() {
        let backend = MemoryBackend::new();
        let (cid, owner) = ids();
        let attrs = vec![Attribute::new(ATTRIBUTE_FILE_NAME, "x.box")];

        let oid = backend.put_object(&cid, &owner, &attrs, b"abc").await.unwrap();
        let header = backend.head_object(&Address::new(cid, oid)).await.unwrap();

        assert_eq!(header.owner_id, owner);
        assert_eq!(header.attributes, attrs);
        assert_eq!(header.payload_len, 3);
    }
}
