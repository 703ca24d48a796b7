//! Golden test vectors for wire and crypto interop.
//!
//! The box vector was sealed with fixed keys and nonces, so it pins down
//! the whole chain: SEC1 key encoding, ECDH, HKDF-SHA256, XChaCha20-Poly1305
//! and the protobuf field layout. Any change that breaks it breaks every
//! box already in storage.

use serde::Serialize;

use gatebox_accessbox::{AccessBox, ContainerPolicy, PlacementPolicy, Replica};
use gatebox_core::{derive_shared_secret, derive_symmetric_key, PrivateKey, PublicKey};

/// Private key of the packer that produced [`BOX_VECTOR`].
pub const EPHEMERAL_PRIVATE_KEY: &str =
    "0101010101010101010101010101010101010101010101010101010101010101";

/// A private key and its compressed public key.
#[derive(Debug, Clone, Serialize)]
pub struct KeyVector {
    pub name: &'static str,
    pub private_key: &'static str,
    pub public_key: &'static str,
}

/// One side of an ECDH agreement and the derived key material.
#[derive(Debug, Clone, Serialize)]
pub struct AgreementVector {
    pub name: &'static str,
    pub private_key: &'static str,
    pub peer_public_key: &'static str,
    pub shared_secret: &'static str,
    pub symmetric_key: &'static str,
}

/// What one recipient must recover from a box vector.
#[derive(Debug, Clone, Serialize)]
pub struct GateVector {
    pub private_key: &'static str,
    pub access_key: &'static str,
    pub bearer_token: &'static [u8],
    pub session_token: Option<&'static [u8]>,
}

/// An encoded access box and what each recipient gets out of it.
#[derive(Debug, Clone, Serialize)]
pub struct BoxVector {
    pub name: &'static str,
    pub box_hex: &'static str,
    pub gates: &'static [GateVector],
    pub location_constraint: &'static str,
    pub policy_hex: &'static str,
}

/// Get all key vectors.
pub fn key_vectors() -> Vec<KeyVector> {
    vec![
        KeyVector {
            name: "ephemeral 0x01",
            private_key: EPHEMERAL_PRIVATE_KEY,
            public_key: "026ff03b949241ce1dadd43519e6960e0a85b41a69a05c328103aa2bce1594ca16",
        },
        KeyVector {
            name: "recipient 0x02",
            private_key: "0202020202020202020202020202020202020202020202020202020202020202",
            public_key: "02550f471003f3df97c3df506ac797f6721fb1a1fb7b8f6f83d224498a65c88e24",
        },
        KeyVector {
            name: "recipient 0x03",
            private_key: "0303030303030303030303030303030303030303030303030303030303030303",
            public_key: "02591ab771ebbcfd6d9cb9094d106528add1a69d44c2c1f627f089ec58b9c61adf",
        },
    ]
}

/// Get all agreement vectors. Both sides of a pair derive the same secret.
pub fn agreement_vectors() -> Vec<AgreementVector> {
    vec![
        AgreementVector {
            name: "packer side",
            private_key: EPHEMERAL_PRIVATE_KEY,
            peer_public_key: "02550f471003f3df97c3df506ac797f6721fb1a1fb7b8f6f83d224498a65c88e24",
            shared_secret: "eb459a6b30d70eb4c0ddcd34ea96ed59e8f8d1843c22dd895ab603aa13d9a81d",
            symmetric_key: "8ce095688d962700130525dfc28dbd6fee0441cddc061fe62e23c73fca15053d",
        },
        AgreementVector {
            name: "recipient side",
            private_key: "0202020202020202020202020202020202020202020202020202020202020202",
            peer_public_key: "026ff03b949241ce1dadd43519e6960e0a85b41a69a05c328103aa2bce1594ca16",
            shared_secret: "eb459a6b30d70eb4c0ddcd34ea96ed59e8f8d1843c22dd895ab603aa13d9a81d",
            symmetric_key: "8ce095688d962700130525dfc28dbd6fee0441cddc061fe62e23c73fca15053d",
        },
    ]
}

/// Two recipients and one container policy, sealed with nonces 0..24 and 24..48.
pub const BOX_VECTOR: BoxVector = BoxVector {
    name: "two recipients with policy",
    box_hex: concat!(
        "0a21026ff03b949241ce1dadd43519e6960e0a85b41a69a05c328103aa2bce1594ca16",
        "127b0a56000102030405060708090a0b0c0d0e0f1011121314151617558886f03680072a",
        "8fbe1eaf48df1d2a36eb4962331581b995b5ee87b37f7d7ef1e749c097cbf1c88bfaee29",
        "8e73f33bd611cd755a8ab00127696365ba10122102550f471003f3df97c3df506ac797f6",
        "721fb1a1fb7b8f6f83d224498a65c88e241288010a6318191a1b1c1d1e1f202122232425",
        "262728292a2b2c2d2e2f46d2786edc51bbd04ca874aaa2059e0d79a26a2fdc1b7c02aeb3",
        "699193083a5c89a5422a06bdee9b68c0b9ee1c46c7088c09e0a353865500b3d21c821e65",
        "5c8ca5b836c825f14626d45ffa122102591ab771ebbcfd6d9cb9094d106528add1a69d44",
        "c2c1f627f089ec58b9c61adf1a0f0a02657512090a0508021201581001",
    ),
    gates: &[
        GateVector {
            private_key: "0202020202020202020202020202020202020202020202020202020202020202",
            access_key: "5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a",
            bearer_token: b"bearer-one",
            session_token: None,
        },
        GateVector {
            private_key: "0303030303030303030303030303030303030303030303030303030303030303",
            access_key: "5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a",
            bearer_token: b"bearer-two",
            session_token: Some(b"session-two"),
        },
    ],
    location_constraint: "eu",
    policy_hex: "0a0508021201581001",
};

/// The placement policy carried by [`BOX_VECTOR`].
pub fn box_vector_policy() -> ContainerPolicy {
    ContainerPolicy::new("eu", PlacementPolicy::new(vec![Replica::new(2, "X")], 1))
}

fn private_key(hex_str: &str) -> Result<PrivateKey, String> {
    let bytes = hex::decode(hex_str).map_err(|e| e.to_string())?;
    PrivateKey::from_bytes(&bytes).map_err(|e| e.to_string())
}

fn check_key(v: &KeyVector) -> Result<String, String> {
    let public = private_key(v.private_key)?.public_key();
    let hex = public.to_hex();
    if hex != v.public_key {
        return Err(hex);
    }
    Ok(hex)
}

fn check_agreement(v: &AgreementVector) -> Result<String, String> {
    let private = private_key(v.private_key)?;
    let peer = PublicKey::from_hex(v.peer_public_key).map_err(|e| e.to_string())?;
    let shared = derive_shared_secret(&private, &peer).map_err(|e| e.to_string())?;
    let key = derive_symmetric_key(&shared).map_err(|e| e.to_string())?;

    let shared_hex = hex::encode(shared.as_bytes());
    let key_hex = hex::encode(key.as_bytes());
    if shared_hex != v.shared_secret || key_hex != v.symmetric_key {
        return Err(format!("{} / {}", shared_hex, key_hex));
    }
    Ok(key_hex)
}

fn check_box(v: &BoxVector) -> Result<String, String> {
    let bytes = hex::decode(v.box_hex).map_err(|e| e.to_string())?;
    let access_box = AccessBox::from_bytes(&bytes).map_err(|e| e.to_string())?;

    if access_box.to_bytes() != bytes {
        return Err("re-encoding differs".into());
    }

    for gate in v.gates {
        let unpacked = access_box
            .unpack(&private_key(gate.private_key)?)
            .map_err(|e| e.to_string())?;

        let session = unpacked.gate.session_token.as_ref().map(|t| t.as_bytes());
        if unpacked.gate.access_key != gate.access_key
            || unpacked.gate.bearer_token.as_bytes() != gate.bearer_token
            || session != gate.session_token
        {
            return Err(format!("gate mismatch for {}", gate.private_key));
        }

        let policy = unpacked.policies.first().ok_or("missing policy")?;
        if policy.location_constraint != v.location_constraint
            || hex::encode(policy.policy.as_bytes()) != v.policy_hex
        {
            return Err("policy mismatch".into());
        }
    }

    Ok(v.name.to_string())
}

/// Verify every vector. Returns `(name, passed, detail)` per vector.
pub fn verify_all_vectors() -> Vec<(String, bool, String)> {
    let mut results = Vec::new();

    for v in key_vectors() {
        let outcome = check_key(&v);
        results.push((v.name.to_string(), outcome.is_ok(), flatten(outcome)));
    }
    for v in agreement_vectors() {
        let outcome = check_agreement(&v);
        results.push((v.name.to_string(), outcome.is_ok(), flatten(outcome)));
    }
    let outcome = check_box(&BOX_VECTOR);
    results.push((BOX_VECTOR.name.to_string(), outcome.is_ok(), flatten(outcome)));

    results
}

fn flatten(outcome: Result<String, String>) -> String {
    match outcome {
        Ok(detail) | Err(detail) => detail,
    }
}

/// All vectors as pretty JSON, for other implementations to consume.
pub fn vectors_json() -> serde_json::Result<String> {
    #[derive(Serialize)]
    struct All {
        keys: Vec<KeyVector>,
        agreements: Vec<AgreementVector>,
        boxes: Vec<BoxVector>,
    }

    serde_json::to_string_pretty(&All {
        keys: key_vectors(),
        agreements: agreement_vectors(),
        boxes: vec![BOX_VECTOR],
    })
}
