//! Backend trait: the abstract interface to the object store.
//!
//! The credential service only needs to put opaque payloads into a
//! container and read them back by address. Implementations include
//! SQLite (persistent) and in-memory (for tests and embedding).

use std::sync::Arc;

use async_trait::async_trait;
use bytes::BytesMut;
use serde::{Deserialize, Serialize};

use gatebox_core::{Address, ContainerId, ObjectId, OwnerId};

use crate::error::Result;

/// Well-known attribute holding the creation time in unix seconds.
pub const ATTRIBUTE_TIMESTAMP: &str = "Timestamp";

/// Well-known attribute holding a human-readable file name.
pub const ATTRIBUTE_FILE_NAME: &str = "FileName";

/// Context string for object ID derivation.
const OBJECT_ID_CONTEXT: &str = "gatebox-store-v1-object-id";

/// A key/value attribute attached to an object header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub key: String,
    pub value: String,
}

impl Attribute {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Metadata of a stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectHeader {
    pub owner_id: OwnerId,
    pub attributes: Vec<Attribute>,
    pub payload_len: u64,
}

impl ObjectHeader {
    /// Value of the first attribute with the given key.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.key == key)
            .map(|a| a.value.as_str())
    }
}

/// Compute the content address of an object.
///
/// Blake3 in derive-key mode over the container, owner, attributes and
/// payload, each length-prefixed. Identical content always maps to the
/// same ID.
pub fn compute_object_id(
    container_id: &ContainerId,
    owner_id: &OwnerId,
    attributes: &[Attribute],
    payload: &[u8],
) -> ObjectId {
    let mut hasher = blake3::Hasher::new_derive_key(OBJECT_ID_CONTEXT);
    hasher.update(container_id.as_bytes());
    hasher.update(owner_id.as_bytes());

    hasher.update(&(attributes.len() as u64).to_le_bytes());
    for attribute in attributes {
        hasher.update(&(attribute.key.len() as u64).to_le_bytes());
        hasher.update(attribute.key.as_bytes());
        hasher.update(&(attribute.value.len() as u64).to_le_bytes());
        hasher.update(attribute.value.as_bytes());
    }

    hasher.update(&(payload.len() as u64).to_le_bytes());
    hasher.update(payload);

    ObjectId::from_bytes(*hasher.finalize().as_bytes())
}

/// The ObjectBackend trait: async interface to a content-addressed store.
///
/// # Design Notes
///
/// - **Opaque payloads**: the backend never interprets what it stores.
/// - **Idempotent puts**: putting identical content twice yields the same ID.
/// - **Caller-owned buffers**: `get_object` appends into a buffer supplied by
///   the caller so that transfer buffers can be pooled.
/// - **No retries**: errors are returned as-is; retry policy belongs to the caller.
#[async_trait]
pub trait ObjectBackend: Send + Sync {
    /// Store a new object in `container_id`, owned by `owner_id`.
    async fn put_object(
        &self,
        container_id: &ContainerId,
        owner_id: &OwnerId,
        attributes: &[Attribute],
        payload: &[u8],
    ) -> Result<ObjectId>;

    /// Append the payload of the object at `address` to `out`.
    ///
    /// Returns `NotFound` if there is no such object.
    async fn get_object(&self, address: &Address, out: &mut BytesMut) -> Result<()>;

    /// Read the header of the object at `address`.
    async fn head_object(&self, address: &Address) -> Result<ObjectHeader>;
}

#[async_trait]
impl<B: ObjectBackend + ?Sized> ObjectBackend for Arc<B> {
    async fn put_object(
        &self,
        container_id: &ContainerId,
        owner_id: &OwnerId,
        attributes: &[Attribute],
        payload: &[u8],
    ) -> Result<ObjectId> {
        (**self)
            .put_object(container_id, owner_id, attributes, payload)
            .await
    }

    async fn get_object(&self, address: &Address, out: &mut BytesMut) -> Result<()> {
        (**self).get_object(address, out).await
    }

    async fn head_object(&self, address: &Address) -> Result<ObjectHeader> {
        (**self).head_object(address).await
    }
}
