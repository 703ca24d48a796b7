//! # Gatebox Access Box
//!
//! The secure multi-recipient credential container.
//!
//! ## Overview
//!
//! An access box lets the holder of object-storage credentials delegate
//! bearer and session tokens to several named recipients at once. Each
//! recipient gets a [`Gate`]: their tokens sealed under a key only they
//! can re-derive. The storage backend sees nothing but ciphertext.
//!
//! ## Encryption Model
//!
//! 1. **Ephemeral key**: every pack generates a fresh P-256 key pair; its
//!    public half is stored in the box as `owner_public_key`
//! 2. **Per-recipient key**: ECDH(ephemeral, recipient) → HKDF-SHA-256
//! 3. **Gate**: XChaCha20-Poly1305 over the encoded [`Tokens`]
//!
//! All recipients of one box share the same random access key; only the
//! envelope around it differs.
//!
//! ## Usage
//!
//! ```rust
//! use gatebox_accessbox::{pack, BearerToken, Recipient};
//! use gatebox_core::PrivateKey;
//!
//! let gate_key = PrivateKey::generate();
//! let recipient = Recipient::new(gate_key.public_key(), BearerToken::from_bytes(b"token".to_vec()));
//!
//! let (access_box, secrets) = pack(&[recipient]).unwrap();
//! let bytes = access_box.to_bytes();
//!
//! let restored = gatebox_accessbox::AccessBox::from_bytes(&bytes).unwrap();
//! let gate = restored.gate_data(&gate_key).unwrap();
//! assert_eq!(gate.access_key, secrets.access_key);
//! ```
//!
//! ## Wire Format
//!
//! Boxes are encoded as protobuf messages so that boxes written by other
//! gateway deployments stay readable. See [`model`] for the field layout.

pub mod envelope;
pub mod error;
pub mod model;
pub mod policy;
mod wire;

pub use envelope::{pack, unpack, BoxBuilder, Recipient, ACCESS_KEY_SIZE};
pub use error::{BoxError, Result};
pub use model::{
    AccessBox, BearerToken, Gate, GateData, Secrets, SessionToken, Tokens, UnpackedBox,
};
pub use policy::{ContainerPolicy, PlacementPolicy, PolicyEntry, Replica};
