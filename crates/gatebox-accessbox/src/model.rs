//! Access box data model and its wire encoding.
//!
//! An [`AccessBox`] is what gets persisted: the sender's ephemeral public
//! key, one encrypted [`Gate`] per recipient and the cleartext container
//! policies. [`Tokens`] is the plaintext sealed inside each gate.

use std::fmt;

use gatebox_core::{PrivateKey, PublicKey};
use zeroize::Zeroize;

use crate::error::Result;
use crate::policy::{ContainerPolicy, PolicyEntry};
use crate::wire::{self, FieldReader};

/// Protobuf field numbers.
///
/// These are fixed by the boxes already in storage and must not change.
mod fields {
    pub const BOX_OWNER_PUBLIC_KEY: u32 = 1;
    pub const BOX_GATES: u32 = 2;
    pub const BOX_CONTAINER_POLICY: u32 = 3;

    pub const GATE_TOKENS: u32 = 1;
    pub const GATE_PUBLIC_KEY: u32 = 2;

    pub const TOKENS_ACCESS_KEY: u32 = 1;
    pub const TOKENS_BEARER: u32 = 2;
    pub const TOKENS_SESSION: u32 = 3;
}

/// An opaque bearer token, passed through uninterpreted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BearerToken(pub Vec<u8>);

impl BearerToken {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// An opaque session token, passed through uninterpreted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionToken(pub Vec<u8>);

impl SessionToken {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// One recipient's slot: their public key and the sealed [`Tokens`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Gate {
    /// Compressed public key of the recipient.
    pub gate_public_key: Vec<u8>,
    /// `nonce || ciphertext || tag` of the encoded tokens.
    pub tokens: Vec<u8>,
}

impl Gate {
    fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.tokens.len() + self.gate_public_key.len() + 8);
        wire::put_bytes_field(&mut buf, fields::GATE_TOKENS, &self.tokens);
        wire::put_bytes_field(&mut buf, fields::GATE_PUBLIC_KEY, &self.gate_public_key);
        buf
    }

    fn decode(bytes: &[u8]) -> Result<Self> {
        let mut gate = Self::default();

        let mut reader = FieldReader::new(bytes);
        while let Some((field, value)) = reader.next_field()? {
            match field {
                fields::GATE_TOKENS => gate.tokens = value.bytes("gate.tokens")?.to_vec(),
                fields::GATE_PUBLIC_KEY => {
                    gate.gate_public_key = value.bytes("gate.gate_public_key")?.to_vec()
                }
                _ => {}
            }
        }

        Ok(gate)
    }
}

/// The persisted multi-recipient credential container.
///
/// Never mutated after packing; rotating recipients means packing a new box.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessBox {
    /// Ephemeral public key of the packer (compressed).
    pub owner_public_key: Vec<u8>,
    /// One gate per recipient, in recipient order.
    pub gates: Vec<Gate>,
    /// Cleartext placement policies.
    pub container_policies: Vec<PolicyEntry>,
}

impl AccessBox {
    /// True for the default value: no owner key, no gates, no policies.
    pub fn is_empty(&self) -> bool {
        self.owner_public_key.is_empty() && self.gates.is_empty() && self.container_policies.is_empty()
    }

    /// Encode to the wire form.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.encode_into(&mut buf);
        buf
    }

    /// Encode into an existing buffer.
    pub fn encode_into(&self, buf: &mut Vec<u8>) {
        wire::put_bytes_field(buf, fields::BOX_OWNER_PUBLIC_KEY, &self.owner_public_key);
        for gate in &self.gates {
            wire::put_message_field(buf, fields::BOX_GATES, &gate.encode());
        }
        for entry in &self.container_policies {
            wire::put_message_field(buf, fields::BOX_CONTAINER_POLICY, &entry.encode());
        }
    }

    /// Decode from the wire form.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut access_box = Self::default();

        let mut reader = FieldReader::new(bytes);
        while let Some((field, value)) = reader.next_field()? {
            match field {
                fields::BOX_OWNER_PUBLIC_KEY => {
                    access_box.owner_public_key = value.bytes("owner_public_key")?.to_vec()
                }
                fields::BOX_GATES => access_box.gates.push(Gate::decode(value.bytes("gates")?)?),
                fields::BOX_CONTAINER_POLICY => access_box
                    .container_policies
                    .push(PolicyEntry::decode(value.bytes("container_policy")?)?),
                _ => {}
            }
        }

        Ok(access_box)
    }
}

/// Plaintext sealed inside a gate.
///
/// All three fields are wiped when the value is dropped.
#[derive(Default, PartialEq, Eq)]
pub struct Tokens {
    pub access_key: Vec<u8>,
    pub bearer_token: Vec<u8>,
    pub session_token: Vec<u8>,
}

impl Tokens {
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        wire::put_bytes_field(&mut buf, fields::TOKENS_ACCESS_KEY, &self.access_key);
        wire::put_bytes_field(&mut buf, fields::TOKENS_BEARER, &self.bearer_token);
        wire::put_bytes_field(&mut buf, fields::TOKENS_SESSION, &self.session_token);
        buf
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut tokens = Self::default();

        let mut reader = FieldReader::new(bytes);
        while let Some((field, value)) = reader.next_field()? {
            match field {
                fields::TOKENS_ACCESS_KEY => {
                    tokens.access_key = value.bytes("tokens.access_key")?.to_vec()
                }
                fields::TOKENS_BEARER => {
                    tokens.bearer_token = value.bytes("tokens.bearer_token")?.to_vec()
                }
                fields::TOKENS_SESSION => {
                    tokens.session_token = value.bytes("tokens.session_token")?.to_vec()
                }
                _ => {}
            }
        }

        Ok(tokens)
    }
}

impl Drop for Tokens {
    fn drop(&mut self) {
        self.access_key.zeroize();
        self.bearer_token.zeroize();
        self.session_token.zeroize();
    }
}

impl fmt::Debug for Tokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tokens").finish_non_exhaustive()
    }
}

/// Decrypted contents of one gate.
#[derive(Clone, PartialEq, Eq)]
pub struct GateData {
    /// Hex of the 32-byte access key shared by all recipients of the box.
    pub access_key: String,
    pub bearer_token: BearerToken,
    pub session_token: Option<SessionToken>,
    /// Public key of the recipient this gate was sealed for.
    pub gate_key: PublicKey,
}

impl GateData {
    /// Gate data with only a bearer token, as used before packing.
    pub fn new(gate_key: PublicKey, bearer_token: BearerToken) -> Self {
        Self {
            access_key: String::new(),
            bearer_token,
            session_token: None,
            gate_key,
        }
    }
}

impl fmt::Debug for GateData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GateData")
            .field("access_key", &"[REDACTED]")
            .field("bearer_token_len", &self.bearer_token.0.len())
            .field("has_session_token", &self.session_token.is_some())
            .field("gate_key", &self.gate_key)
            .finish()
    }
}

/// Decoded view of a box for one recipient: their gate plus all policies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnpackedBox {
    pub gate: GateData,
    pub policies: Vec<ContainerPolicy>,
}

/// What only the packer ever sees. Never persisted.
pub struct Secrets {
    /// Hex of the access key sealed into every gate.
    pub access_key: String,
    /// Ephemeral private key the box was packed with.
    pub ephemeral_key: PrivateKey,
}

impl fmt::Debug for Secrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secrets")
            .field("access_key", &"[REDACTED]")
            .field("ephemeral_key", &self.ephemeral_key)
            .finish()
    }
}

impl Drop for Secrets {
    fn drop(&mut self) {
        self.access_key.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BoxError;
    use crate::policy::{PlacementPolicy, Replica};

    fn sample_box() -> AccessBox {
        AccessBox {
            owner_public_key: vec![0x02; 33],
            gates: vec![
                Gate {
                    gate_public_key: vec![0x03; 33],
                    tokens: vec![0xaa; 60],
                },
                Gate {
                    gate_public_key: vec![0x02; 33],
                    tokens: vec![0xbb; 70],
                },
            ],
            container_policies: vec![
                ContainerPolicy::new("eu", PlacementPolicy::new(vec![Replica::new(2, "")], 0))
                    .to_entry(),
            ],
        }
    }

    #[test]
    fn test_box_encode_decode() {
        let access_box = sample_box();
        let decoded = AccessBox::from_bytes(&access_box.to_bytes()).unwrap();
        assert_eq!(decoded, access_box);
    }

    #[test]
    fn test_box_field_layout() {
        let access_box = AccessBox {
            owner_public_key: vec![0x01, 0x02],
            gates: vec![Gate {
                gate_public_key: vec![0x03],
                tokens: vec![0x04],
            }],
            container_policies: vec![PolicyEntry {
                location_constraint: "a".into(),
                policy: vec![],
            }],
        };

        assert_eq!(
            access_box.to_bytes(),
            vec![
                0x0a, 0x02, 0x01, 0x02, // owner_public_key
                0x12, 0x06, 0x0a, 0x01, 0x04, 0x12, 0x01, 0x03, // gates[0]
                0x1a, 0x03, 0x0a, 0x01, b'a', // container_policy[0]
            ]
        );
    }

    #[test]
    fn test_default_box_is_empty() {
        assert!(AccessBox::default().is_empty());
        assert!(AccessBox::default().to_bytes().is_empty());
        assert!(AccessBox::from_bytes(&[]).unwrap().is_empty());
        assert!(!sample_box().is_empty());
    }

    #[test]
    fn test_decode_skips_unknown_fields() {
        let mut bytes = sample_box().to_bytes();
        // field 9, varint 1
        bytes.extend_from_slice(&[0x48, 0x01]);

        assert_eq!(AccessBox::from_bytes(&bytes).unwrap(), sample_box());
    }

    #[test]
    fn test_decode_garbage_fails() {
        let result = AccessBox::from_bytes(&[0x12, 0x7f, 0x00]);
        assert!(matches!(result, Err(BoxError::MalformedBox(_))));
    }

    #[test]
    fn test_tokens_encode_decode() {
        let tokens = Tokens {
            access_key: vec![1; 32],
            bearer_token: b"bearer".to_vec(),
            session_token: Vec::new(),
        };

        let decoded = Tokens::from_bytes(&tokens.to_bytes()).unwrap();
        assert!(decoded == tokens);
        assert!(decoded.session_token.is_empty());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let secrets = Secrets {
            access_key: "deadbeef".into(),
            ephemeral_key: PrivateKey::generate(),
        };
        let debug = format!("{:?}", secrets);
        assert!(!debug.contains("deadbeef"));
        assert!(debug.contains("REDACTED"));
    }
}
