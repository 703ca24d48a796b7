//! Proptest generators for property-based testing.

use proptest::prelude::*;

use gatebox_accessbox::{
    BearerToken, ContainerPolicy, PlacementPolicy, Recipient, Replica, SessionToken,
};
use gatebox_core::PrivateKey;

/// Generate a random private key.
///
/// Byte strings that are not a valid scalar (zero or above the curve
/// order) are rejected.
pub fn private_key() -> impl Strategy<Value = PrivateKey> {
    any::<[u8; 32]>().prop_filter_map("not a valid P-256 scalar", |bytes| {
        PrivateKey::from_bytes(&bytes).ok()
    })
}

/// Generate token bytes of at most `max_len` bytes.
pub fn token_bytes(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=max_len)
}

/// Inputs for one recipient of a box.
#[derive(Debug, Clone)]
pub struct RecipientParams {
    pub key: PrivateKey,
    pub bearer: Vec<u8>,
    /// `None` and `Some(empty)` both unpack as no session token.
    pub session: Option<Vec<u8>>,
}

impl RecipientParams {
    pub fn recipient(&self) -> Recipient {
        let recipient = Recipient::new(
            self.key.public_key(),
            BearerToken::from_bytes(self.bearer.clone()),
        );
        match &self.session {
            Some(session) => recipient.with_session_token(SessionToken::from_bytes(session.clone())),
            None => recipient,
        }
    }

    /// The session token a recipient should get back after unpacking.
    pub fn expected_session(&self) -> Option<Vec<u8>> {
        self.session.clone().filter(|s| !s.is_empty())
    }
}

/// Generate one recipient.
pub fn recipient_params() -> impl Strategy<Value = RecipientParams> {
    (private_key(), token_bytes(256), prop::option::of(token_bytes(128)))
        .prop_map(|(key, bearer, session)| RecipientParams { key, bearer, session })
}

/// Generate between 1 and `max` recipients with distinct keys.
pub fn recipients(max: usize) -> impl Strategy<Value = Vec<RecipientParams>> {
    prop::collection::vec(recipient_params(), 1..=max).prop_filter(
        "recipient keys must be distinct",
        |params| {
            let mut keys: Vec<_> = params.iter().map(|p| p.key.public_key().to_bytes()).collect();
            keys.sort();
            keys.dedup();
            keys.len() == params.len()
        },
    )
}

/// Generate a replica descriptor.
pub fn replica() -> impl Strategy<Value = Replica> {
    (1u32..=16, "[A-Z]{0,8}").prop_map(|(count, selector)| Replica::new(count, selector))
}

/// Generate a placement policy.
pub fn placement_policy() -> impl Strategy<Value = PlacementPolicy> {
    (prop::collection::vec(replica(), 0..4), 0u32..8)
        .prop_map(|(replicas, backup)| PlacementPolicy::new(replicas, backup))
}

/// Generate a container policy with a location constraint.
pub fn container_policy() -> impl Strategy<Value = ContainerPolicy> {
    ("[a-z]{1,12}(-[a-z0-9]{1,6})?", placement_policy())
        .prop_map(|(location, policy)| ContainerPolicy::new(location, policy))
}

/// Generate up to `max` container policies.
pub fn container_policies(max: usize) -> impl Strategy<Value = Vec<ContainerPolicy>> {
    prop::collection::vec(container_policy(), 0..=max)
}
