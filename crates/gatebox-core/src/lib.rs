//! # Gatebox Core
//!
//! Pure primitives for gatebox: key agreement, key derivation, authenticated
//! encryption and the identifiers used to address stored objects.
//!
//! This crate contains no I/O, no storage, no networking. Every function is
//! reentrant and free of shared mutable state.
//!
//! ## Key Types
//!
//! - [`PrivateKey`] / [`PublicKey`] - P-256 key material
//! - [`SharedSecret`] - Raw ECDH output (32-byte x coordinate)
//! - [`SymmetricKey`] - HKDF-SHA-256 output used with XChaCha20-Poly1305
//! - [`ContainerId`], [`ObjectId`], [`OwnerId`], [`Address`] - backend addressing
//!
//! ## Sealing
//!
//! ```rust
//! use gatebox_core::{derive_shared_secret, derive_symmetric_key, open, seal, PrivateKey};
//!
//! let sender = PrivateKey::generate();
//! let recipient = PrivateKey::generate();
//!
//! let key = derive_symmetric_key(
//!     &derive_shared_secret(&sender, &recipient.public_key()).unwrap(),
//! ).unwrap();
//! let sealed = seal(&key, b"bearer").unwrap();
//!
//! let same = derive_symmetric_key(
//!     &derive_shared_secret(&recipient, &sender.public_key()).unwrap(),
//! ).unwrap();
//! assert_eq!(open(&same, &sealed).unwrap(), b"bearer");
//! ```

pub mod crypto;
pub mod error;
pub mod types;

pub use crypto::{
    derive_shared_secret, derive_symmetric_key, generate_random_secret, open, seal, PrivateKey,
    PublicKey, SharedSecret, SymmetricKey, COMPRESSED_KEY_SIZE, KEY_SIZE, NONCE_SIZE, TAG_SIZE,
};
pub use error::{CryptoError, IdError, Result};
pub use types::{Address, ContainerId, ObjectId, OwnerId};
