//! The credential service: persists packed access boxes and reads them back.
//!
//! The service never encrypts anything itself. Boxes come in already packed
//! and leave as wire bytes; on the way out they are decoded and, for
//! [`get_box`](Credentials::get_box) and [`get_tokens`](Credentials::get_tokens),
//! opened with the caller's private key.

use std::sync::Arc;

use tracing::{debug, warn};

use gatebox_accessbox::{AccessBox, GateData, UnpackedBox};
use gatebox_core::{Address, ContainerId, OwnerId, PrivateKey, PublicKey};
use gatebox_store::{Attribute, ObjectBackend, ATTRIBUTE_FILE_NAME, ATTRIBUTE_TIMESTAMP};

use crate::config::CredentialsConfig;
use crate::error::{CredentialsError, Result};
use crate::pool::BufferPool;

/// Suffix of the file name attribute written with every box.
const FILE_NAME_SUFFIX: &str = "_access.box";

/// Credential store service over an object backend.
///
/// Owns its transfer buffer pool; call [`shutdown`](Self::shutdown) to
/// release the pooled buffers.
pub struct Credentials<B: ObjectBackend> {
    backend: Arc<B>,
    pool: BufferPool,
    config: CredentialsConfig,
}

impl<B: ObjectBackend> Credentials<B> {
    /// Create a new service instance.
    pub fn new(backend: B, config: CredentialsConfig) -> Self {
        Self {
            backend: Arc::new(backend),
            pool: BufferPool::from_config(&config),
            config,
        }
    }

    /// Get the backend reference.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn pool(&self) -> &BufferPool {
        &self.pool
    }

    pub fn config(&self) -> &CredentialsConfig {
        &self.config
    }

    /// Persist a packed box as a new object in `container_id`.
    ///
    /// `recipients` is only checked for emptiness; the gates inside the box
    /// were already sealed for them by `pack`.
    pub async fn put(
        &self,
        container_id: &ContainerId,
        issuer: &OwnerId,
        access_box: &AccessBox,
        recipients: &[PublicKey],
    ) -> Result<Address> {
        if recipients.is_empty() {
            return Err(CredentialsError::EmptyRecipients);
        }
        if access_box.is_empty() {
            return Err(CredentialsError::EmptyBox);
        }

        let payload = access_box.to_bytes();
        let timestamp = unix_secs().to_string();
        let attributes = [
            Attribute::new(ATTRIBUTE_FILE_NAME, format!("{}{}", timestamp, FILE_NAME_SUFFIX)),
            Attribute::new(ATTRIBUTE_TIMESTAMP, timestamp),
        ];

        let object_id = self
            .backend
            .put_object(container_id, issuer, &attributes, &payload)
            .await
            .map_err(|e| {
                warn!(container = %container_id, error = %e, "failed to store access box");
                CredentialsError::from(e)
            })?;

        let address = Address::new(*container_id, object_id);
        debug!(
            %address,
            gates = access_box.gates.len(),
            recipients = recipients.len(),
            size = payload.len(),
            "stored access box"
        );

        Ok(address)
    }

    /// Read and decode the box at `address`.
    pub async fn fetch_box(&self, address: &Address) -> Result<AccessBox> {
        let mut buf = self.pool.acquire();

        self.backend
            .get_object(address, &mut buf)
            .await
            .map_err(|e| {
                warn!(%address, error = %e, "failed to fetch access box");
                CredentialsError::from(e)
            })?;

        let access_box = AccessBox::from_bytes(&buf)?;
        debug!(%address, size = buf.len(), gates = access_box.gates.len(), "fetched access box");

        Ok(access_box)
    }

    /// Fetch the box at `address` and open the gate for `key`.
    pub async fn get_box(&self, address: &Address, key: &PrivateKey) -> Result<UnpackedBox> {
        let access_box = self.fetch_box(address).await?;
        Ok(access_box.unpack(key)?)
    }

    /// Fetch the box at `address` and return only the gate data for `key`.
    pub async fn get_tokens(&self, address: &Address, key: &PrivateKey) -> Result<GateData> {
        Ok(self.get_box(address, key).await?.gate)
    }

    /// Drain the buffer pool. Returns the number of buffers released.
    ///
    /// The service stays usable; later fetches allocate fresh buffers.
    pub fn shutdown(&self) -> usize {
        let drained = self.pool.drain();
        debug!(drained, "credential service shut down");
        drained
    }
}

fn unix_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
