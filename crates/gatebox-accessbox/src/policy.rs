//! Placement policies attached to an access box.
//!
//! A placement policy tells the gateway where new containers created with
//! the delegated credentials should live. Policies are not secret and are
//! stored in clear next to the gates.

use crate::error::Result;
use crate::wire::{self, FieldReader};

/// Protobuf field numbers.
mod fields {
    pub const POLICY_REPLICAS: u32 = 1;
    pub const POLICY_BACKUP_FACTOR: u32 = 2;

    pub const REPLICA_COUNT: u32 = 1;
    pub const REPLICA_SELECTOR: u32 = 2;

    pub const ENTRY_LOCATION: u32 = 1;
    pub const ENTRY_POLICY: u32 = 2;
}

/// One replication rule: keep `count` copies on nodes chosen by `selector`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replica {
    pub count: u32,
    pub selector: String,
}

impl Replica {
    pub fn new(count: u32, selector: impl Into<String>) -> Self {
        Self {
            count,
            selector: selector.into(),
        }
    }
}

/// A structured placement policy.
///
/// Decoding keeps the original bytes, so fields this type does not model
/// (selectors, filters) survive a decode/encode cycle unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementPolicy {
    replicas: Vec<Replica>,
    container_backup_factor: u32,
    encoded: Vec<u8>,
}

impl PlacementPolicy {
    /// Build a policy and compute its encoding.
    pub fn new(replicas: Vec<Replica>, container_backup_factor: u32) -> Self {
        let mut encoded = Vec::new();
        for replica in &replicas {
            let mut msg = Vec::new();
            wire::put_uint32_field(&mut msg, fields::REPLICA_COUNT, replica.count);
            wire::put_bytes_field(&mut msg, fields::REPLICA_SELECTOR, replica.selector.as_bytes());
            wire::put_message_field(&mut encoded, fields::POLICY_REPLICAS, &msg);
        }
        wire::put_uint32_field(&mut encoded, fields::POLICY_BACKUP_FACTOR, container_backup_factor);

        Self {
            replicas,
            container_backup_factor,
            encoded,
        }
    }

    /// Decode a policy from its wire form.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut replicas = Vec::new();
        let mut container_backup_factor = 0;

        let mut reader = FieldReader::new(bytes);
        while let Some((field, value)) = reader.next_field()? {
            match field {
                fields::POLICY_REPLICAS => {
                    replicas.push(decode_replica(value.bytes("policy.replicas")?)?);
                }
                fields::POLICY_BACKUP_FACTOR => {
                    container_backup_factor = value.uint32("policy.container_backup_factor")?;
                }
                _ => {}
            }
        }

        Ok(Self {
            replicas,
            container_backup_factor,
            encoded: bytes.to_vec(),
        })
    }

    /// The wire form.
    pub fn as_bytes(&self) -> &[u8] {
        &self.encoded
    }

    pub fn replicas(&self) -> &[Replica] {
        &self.replicas
    }

    pub fn container_backup_factor(&self) -> u32 {
        self.container_backup_factor
    }
}

fn decode_replica(bytes: &[u8]) -> Result<Replica> {
    let mut replica = Replica::new(0, String::new());

    let mut reader = FieldReader::new(bytes);
    while let Some((field, value)) = reader.next_field()? {
        match field {
            fields::REPLICA_COUNT => replica.count = value.uint32("replica.count")?,
            fields::REPLICA_SELECTOR => replica.selector = value.string("replica.selector")?,
            _ => {}
        }
    }

    Ok(replica)
}

/// A placement policy bound to an S3 location constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerPolicy {
    pub location_constraint: String,
    pub policy: PlacementPolicy,
}

impl ContainerPolicy {
    pub fn new(location_constraint: impl Into<String>, policy: PlacementPolicy) -> Self {
        Self {
            location_constraint: location_constraint.into(),
            policy,
        }
    }

    /// Convert to the cleartext entry stored in the box.
    pub fn to_entry(&self) -> PolicyEntry {
        PolicyEntry {
            location_constraint: self.location_constraint.clone(),
            policy: self.policy.as_bytes().to_vec(),
        }
    }

    /// Decode a stored entry.
    pub fn from_entry(entry: &PolicyEntry) -> Result<Self> {
        Ok(Self {
            location_constraint: entry.location_constraint.clone(),
            policy: PlacementPolicy::from_bytes(&entry.policy)?,
        })
    }
}

/// Wire-level container policy: location constraint plus encoded policy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicyEntry {
    pub location_constraint: String,
    pub policy: Vec<u8>,
}

impl PolicyEntry {
    pub(crate) fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        wire::put_bytes_field(&mut buf, fields::ENTRY_LOCATION, self.location_constraint.as_bytes());
        wire::put_bytes_field(&mut buf, fields::ENTRY_POLICY, &self.policy);
        buf
    }

    pub(crate) fn decode(bytes: &[u8]) -> Result<Self> {
        let mut entry = Self::default();

        let mut reader = FieldReader::new(bytes);
        while let Some((field, value)) = reader.next_field()? {
            match field {
                fields::ENTRY_LOCATION => {
                    entry.location_constraint = value.string("container_policy.location_constraint")?
                }
                fields::ENTRY_POLICY => {
                    entry.policy = value.bytes("container_policy.policy")?.to_vec()
                }
                _ => {}
            }
        }

        Ok(entry)
    }
}
