//! Strong type definitions for backend addressing.
//!
//! All identifiers are 32-byte newtypes to prevent misuse at compile time.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::crypto::PublicKey;
use crate::error::IdError;

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub [u8; 32]);

        impl $name {
            /// Create from raw bytes.
            pub const fn from_bytes(bytes: [u8; 32]) -> Self {
                Self(bytes)
            }

            /// Get the raw bytes.
            pub const fn as_bytes(&self) -> &[u8; 32] {
                &self.0
            }

            /// Convert to hex string.
            pub fn to_hex(&self) -> String {
                hex::encode(self.0)
            }

            /// Parse from hex string.
            pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
                let bytes = hex::decode(s)?;
                if bytes.len() != 32 {
                    return Err(hex::FromHexError::InvalidStringLength);
                }
                let mut arr = [0u8; 32];
                arr.copy_from_slice(&bytes);
                Ok(Self(arr))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), &self.to_hex()[..16])
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", &self.to_hex()[..16])
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl From<[u8; 32]> for $name {
            fn from(bytes: [u8; 32]) -> Self {
                Self(bytes)
            }
        }

        impl TryFrom<&[u8]> for $name {
            type Error = std::array::TryFromSliceError;

            fn try_from(slice: &[u8]) -> Result<Self, Self::Error> {
                let arr: [u8; 32] = slice.try_into()?;
                Ok(Self(arr))
            }
        }
    };
}

id_type! {
    /// Identifier of a backend container (bucket).
    ContainerId
}

id_type! {
    /// Content address of an object within a container.
    ObjectId
}

id_type! {
    /// Identity of the party that owns a stored object.
    OwnerId
}

impl OwnerId {
    /// Derive the owner identity of a key holder.
    ///
    /// Blake3 over the compressed public key.
    pub fn from_public_key(key: &PublicKey) -> Self {
        Self(*blake3::hash(&key.to_bytes()).as_bytes())
    }
}

/// Full address of a stored object: container plus object ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address {
    pub container_id: ContainerId,
    pub object_id: ObjectId,
}

impl Address {
    pub const fn new(container_id: ContainerId, object_id: ObjectId) -> Self {
        Self {
            container_id,
            object_id,
        }
    }
}

/// Formats as `<container hex>/<object hex>`.
impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.container_id.to_hex(), self.object_id.to_hex())
    }
}

impl FromStr for Address {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (cid, oid) = s
            .split_once('/')
            .ok_or_else(|| IdError::Address(format!("missing '/' separator in {s:?}")))?;
        Ok(Self {
            container_id: ContainerId::from_hex(cid)?,
            object_id: ObjectId::from_hex(oid)?,
        })
    }
}
