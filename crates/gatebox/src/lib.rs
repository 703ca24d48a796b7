//! # Gatebox
//!
//! Credential service for a storage gateway: delegated bearer and session
//! tokens are sealed into a multi-recipient access box, persisted as an
//! opaque object, and later opened by any one of the recipients.
//!
//! ## Overview
//!
//! - **Access box**: one ephemeral sender key, one encrypted gate per recipient
//! - **Gate**: ECDH(P-256) + HKDF-SHA256 + XChaCha20-Poly1305 over the tokens
//! - **Backend**: any [`ObjectBackend`](store::ObjectBackend); SQLite and memory ship here
//! - **Buffer pool**: per-service, bounded, drained on shutdown
//!
//! ## Usage
//!
//! ```rust,no_run
//! use gatebox::{Credentials, CredentialsConfig};
//! use gatebox::accessbox::{BearerToken, BoxBuilder, Recipient};
//! use gatebox::core::{ContainerId, OwnerId, PrivateKey};
//! use gatebox::store::SqliteBackend;
//!
//! async fn example() {
//!     let backend = SqliteBackend::open("gatebox.db").unwrap();
//!     let creds = Credentials::new(backend, CredentialsConfig::default());
//!
//!     let alice = PrivateKey::generate();
//!     let (access_box, _secrets) = BoxBuilder::new()
//!         .recipient(Recipient::new(alice.public_key(), BearerToken::from_bytes(b"token".to_vec())))
//!         .pack()
//!         .unwrap();
//!
//!     let cid = ContainerId::from_bytes([1; 32]);
//!     let owner = OwnerId::from_public_key(&alice.public_key());
//!     let address = creds
//!         .put(&cid, &owner, &access_box, &[alice.public_key()])
//!         .await
//!         .unwrap();
//!
//!     let gate = creds.get_tokens(&address, &alice).await.unwrap();
//!     assert_eq!(gate.bearer_token.as_bytes(), b"token");
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `gatebox::core` - Keys, crypto primitives and identifiers
//! - `gatebox::accessbox` - Access box model, wire format, pack/unpack
//! - `gatebox::store` - Object backend trait and implementations

pub mod config;
pub mod credentials;
pub mod error;
pub mod pool;

// Re-export component crates
pub use gatebox_accessbox as accessbox;
pub use gatebox_core as core;
pub use gatebox_store as store;

pub use config::CredentialsConfig;
pub use credentials::Credentials;
pub use error::{CredentialsError, Result};
pub use pool::{BufferPool, PooledBuffer};

pub use gatebox_accessbox::{
    pack, unpack, AccessBox, BoxBuilder, BoxError, GateData, Recipient, Secrets, UnpackedBox,
};
pub use gatebox_core::{Address, ContainerId, ObjectId, OwnerId, PrivateKey, PublicKey};
