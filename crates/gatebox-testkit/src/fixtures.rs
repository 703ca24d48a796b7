//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::BytesMut;

use gatebox::{Credentials, CredentialsConfig};
use gatebox_accessbox::{AccessBox, BearerToken, BoxBuilder, Recipient, Secrets, SessionToken};
use gatebox_core::{Address, ContainerId, ObjectId, OwnerId, PrivateKey, PublicKey};
use gatebox_store::{Attribute, MemoryBackend, ObjectBackend, ObjectHeader, Result, StoreError};

/// A recipient with a deterministic key and the tokens delegated to them.
pub struct RecipientFixture {
    pub key: PrivateKey,
    pub bearer_token: BearerToken,
    pub session_token: Option<SessionToken>,
}

impl RecipientFixture {
    /// Create with a deterministic key whose scalar is `seed` repeated.
    ///
    /// `seed` must be in `1..=0xfe`; larger values exceed the curve order.
    pub fn with_seed(seed: u8) -> Self {
        let key = match PrivateKey::from_bytes(&[seed; 32]) {
            Ok(key) => key,
            Err(e) => panic!("fixture seed {:#04x} is not a valid scalar: {}", seed, e),
        };

        Self {
            key,
            bearer_token: BearerToken::from_bytes(format!("bearer-{}", seed).into_bytes()),
            session_token: None,
        }
    }

    /// Attach a session token.
    pub fn with_session(mut self) -> Self {
        let seed = self.key.to_bytes()[0];
        self.session_token = Some(SessionToken::from_bytes(
            format!("session-{}", seed).into_bytes(),
        ));
        self
    }

    pub fn public_key(&self) -> PublicKey {
        self.key.public_key()
    }

    /// The recipient entry for packing.
    pub fn recipient(&self) -> Recipient {
        let recipient = Recipient::new(self.public_key(), self.bearer_token.clone());
        match &self.session_token {
            Some(session) => recipient.with_session_token(session.clone()),
            None => recipient,
        }
    }
}

/// Create `count` recipients with distinct deterministic keys.
///
/// Every odd-indexed recipient carries a session token.
pub fn multi_recipient_fixtures(count: usize) -> Vec<RecipientFixture> {
    assert!(count <= 0xfe, "at most 254 deterministic recipients");
    (0..count)
        .map(|i| {
            let fixture = RecipientFixture::with_seed(i as u8 + 1);
            if i % 2 == 1 {
                fixture.with_session()
            } else {
                fixture
            }
        })
        .collect()
}

/// A credential service over a counting in-memory backend, plus recipients.
pub struct TestFixture {
    pub credentials: Credentials<CountingBackend<MemoryBackend>>,
    pub container_id: ContainerId,
    pub issuer: OwnerId,
    pub recipients: Vec<RecipientFixture>,
}

impl TestFixture {
    /// Create a fixture with `recipient_count` recipients.
    pub fn new(recipient_count: usize) -> Self {
        let recipients = multi_recipient_fixtures(recipient_count);
        let issuer = recipients
            .first()
            .map(|r| OwnerId::from_public_key(&r.public_key()))
            .unwrap_or_else(|| OwnerId::from_bytes([0; 32]));

        Self {
            credentials: Credentials::new(
                CountingBackend::new(MemoryBackend::new()),
                CredentialsConfig::default(),
            ),
            container_id: ContainerId::from_bytes([0xc0; 32]),
            issuer,
            recipients,
        }
    }

    pub fn recipient_keys(&self) -> Vec<PublicKey> {
        self.recipients.iter().map(|r| r.public_key()).collect()
    }

    /// Pack a box for every recipient.
    pub fn pack(&self) -> (AccessBox, Secrets) {
        match BoxBuilder::new()
            .recipients(self.recipients.iter().map(|r| r.recipient()))
            .pack()
        {
            Ok(packed) => packed,
            Err(e) => panic!("packing fixture box failed: {}", e),
        }
    }

    /// Pack and store a box for every recipient.
    pub async fn store_box(&self) -> gatebox::Result<(Address, Secrets)> {
        let (access_box, secrets) = self.pack();
        let address = self
            .credentials
            .put(
                &self.container_id,
                &self.issuer,
                &access_box,
                &self.recipient_keys(),
            )
            .await?;
        Ok((address, secrets))
    }
}

/// Backend wrapper that counts every call reaching the inner backend.
pub struct CountingBackend<B> {
    inner: B,
    puts: AtomicUsize,
    gets: AtomicUsize,
    heads: AtomicUsize,
}

impl<B> CountingBackend<B> {
    pub fn new(inner: B) -> Self {
        Self {
            inner,
            puts: AtomicUsize::new(0),
            gets: AtomicUsize::new(0),
            heads: AtomicUsize::new(0),
        }
    }

    pub fn inner(&self) -> &B {
        &self.inner
    }

    pub fn puts(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    /// Total number of backend calls of any kind.
    pub fn io_count(&self) -> usize {
        self.puts() + self.gets() + self.heads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<B: ObjectBackend> ObjectBackend for CountingBackend<B> {
    async fn put_object(
        &self,
        container_id: &ContainerId,
        owner_id: &OwnerId,
        attributes: &[Attribute],
        payload: &[u8],
    ) -> Result<ObjectId> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.inner
            .put_object(container_id, owner_id, attributes, payload)
            .await
    }

    async fn get_object(&self, address: &Address, out: &mut BytesMut) -> Result<()> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.inner.get_object(address, out).await
    }

    async fn head_object(&self, address: &Address) -> Result<ObjectHeader> {
        self.heads.fetch_add(1, Ordering::SeqCst);
        self.inner.head_object(address).await
    }
}

/// Backend whose every call fails with an I/O error.
#[derive(Debug, Default)]
pub struct FailingBackend;

impl FailingBackend {
    fn error() -> StoreError {
        StoreError::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "backend unavailable",
        ))
    }
}

#[async_trait]
impl ObjectBackend for FailingBackend {
    async fn put_object(
        &self,
        _container_id: &ContainerId,
        _owner_id: &OwnerId,
        _attributes: &[Attribute],
        _payload: &[u8],
    ) -> Result<ObjectId> {
        Err(Self::error())
    }

    async fn get_object(&self, _address: &Address, _out: &mut BytesMut) -> Result<()> {
        Err(Self::error())
    }

    async fn head_object(&self, _address: &Address) -> Result<ObjectHeader> {
        Err(Self::error())
    }
}
