//! Per-recipient envelope encryption.
//!
//! Packing generates one ephemeral P-256 key pair per box. For every
//! recipient, ECDH between the ephemeral private key and the recipient's
//! public key yields a shared secret, HKDF turns it into a symmetric key,
//! and XChaCha20-Poly1305 seals that recipient's tokens into a gate.
//!
//! A recipient reverses this with their own private key and the ephemeral
//! public key stored in the box. No key material other than the box itself
//! ever travels.

use gatebox_core::{
    derive_shared_secret, derive_symmetric_key, generate_random_secret, open, seal, PrivateKey,
    PublicKey,
};
use zeroize::Zeroizing;

use crate::error::{BoxError, Result};
use crate::model::{AccessBox, BearerToken, Gate, GateData, Secrets, SessionToken, Tokens, UnpackedBox};
use crate::policy::ContainerPolicy;

/// Size of the access key shared by all recipients of a box.
pub const ACCESS_KEY_SIZE: usize = 32;

/// One recipient of a box and the tokens delegated to them.
#[derive(Debug, Clone)]
pub struct Recipient {
    pub public_key: PublicKey,
    pub bearer_token: BearerToken,
    pub session_token: Option<SessionToken>,
}

impl Recipient {
    pub fn new(public_key: PublicKey, bearer_token: BearerToken) -> Self {
        Self {
            public_key,
            bearer_token,
            session_token: None,
        }
    }

    pub fn with_session_token(mut self, session_token: SessionToken) -> Self {
        self.session_token = Some(session_token);
        self
    }
}

impl From<GateData> for Recipient {
    fn from(gate: GateData) -> Self {
        Self {
            public_key: gate.gate_key,
            bearer_token: gate.bearer_token,
            session_token: gate.session_token,
        }
    }
}

/// Builder for packing a box with recipients and container policies.
#[derive(Debug, Default)]
pub struct BoxBuilder {
    recipients: Vec<Recipient>,
    policies: Vec<ContainerPolicy>,
}

impl BoxBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a recipient.
    pub fn recipient(mut self, recipient: Recipient) -> Self {
        self.recipients.push(recipient);
        self
    }

    /// Add several recipients, keeping their order.
    pub fn recipients(mut self, recipients: impl IntoIterator<Item = Recipient>) -> Self {
        self.recipients.extend(recipients);
        self
    }

    /// Attach a cleartext container policy.
    pub fn policy(mut self, policy: ContainerPolicy) -> Self {
        self.policies.push(policy);
        self
    }

    /// Attach several container policies, keeping their order.
    pub fn policies(mut self, policies: impl IntoIterator<Item = ContainerPolicy>) -> Self {
        self.policies.extend(policies);
        self
    }

    /// Encrypt the tokens for every recipient.
    ///
    /// All-or-nothing: the first failing recipient aborts the whole pack.
    pub fn pack(self) -> Result<(AccessBox, Secrets)> {
        let ephemeral_key = PrivateKey::generate();
        let access_key = Zeroizing::new(generate_random_secret(ACCESS_KEY_SIZE)?);

        let gates = self
            .recipients
            .iter()
            .map(|recipient| seal_gate(&ephemeral_key, recipient, &access_key))
            .collect::<Result<Vec<_>>>()?;

        let access_box = AccessBox {
            owner_public_key: ephemeral_key.public_key().to_bytes(),
            gates,
            container_policies: self.policies.iter().map(ContainerPolicy::to_entry).collect(),
        };

        let secrets = Secrets {
            access_key: hex::encode(access_key.as_slice()),
            ephemeral_key,
        };

        Ok((access_box, secrets))
    }
}

/// Pack tokens for `recipients` into a new box without container policies.
pub fn pack(recipients: &[Recipient]) -> Result<(AccessBox, Secrets)> {
    BoxBuilder::new().recipients(recipients.iter().cloned()).pack()
}

/// Decode the gate for `owner` and all container policies.
pub fn unpack(access_box: &AccessBox, owner: &PrivateKey) -> Result<UnpackedBox> {
    access_box.unpack(owner)
}

fn seal_gate(ephemeral_key: &PrivateKey, recipient: &Recipient, access_key: &[u8]) -> Result<Gate> {
    let tokens = Tokens {
        access_key: access_key.to_vec(),
        bearer_token: recipient.bearer_token.as_bytes().to_vec(),
        session_token: recipient
            .session_token
            .as_ref()
            .map(|t| t.as_bytes().to_vec())
            .unwrap_or_default(),
    };
    let plaintext = Zeroizing::new(tokens.to_bytes());

    let shared = derive_shared_secret(ephemeral_key, &recipient.public_key)?;
    let key = derive_symmetric_key(&shared)?;

    Ok(Gate {
        gate_public_key: recipient.public_key.to_bytes(),
        tokens: seal(&key, &plaintext)?,
    })
}

impl AccessBox {
    /// Decrypt the gate addressed to `owner`.
    ///
    /// Fails with `NoMatchingGate` if `owner` was never a recipient, and with
    /// `AuthenticationFailed` if the matching gate does not decrypt.
    pub fn gate_data(&self, owner: &PrivateKey) -> Result<GateData> {
        let sender = PublicKey::from_bytes(&self.owner_public_key)
            .map_err(|e| BoxError::MalformedBox(format!("couldn't decode owner public key: {e}")))?;

        let owner_key = owner.public_key();
        let owner_bytes = owner_key.to_bytes();

        let gate = self
            .gates
            .iter()
            .find(|gate| gate.gate_public_key == owner_bytes)
            .ok_or_else(|| BoxError::NoMatchingGate(hex::encode(&owner_bytes)))?;

        let shared = derive_shared_secret(owner, &sender)?;
        let key = derive_symmetric_key(&shared)?;

        let plaintext =
            Zeroizing::new(open(&key, &gate.tokens).map_err(|_| BoxError::AuthenticationFailed)?);
        let tokens = Tokens::from_bytes(&plaintext)?;

        let session_token = if tokens.session_token.is_empty() {
            None
        } else {
            Some(SessionToken::from_bytes(tokens.session_token.as_slice()))
        };

        Ok(GateData {
            access_key: hex::encode(&tokens.access_key),
            bearer_token: BearerToken::from_bytes(tokens.bearer_token.as_slice()),
            session_token,
            gate_key: owner_key,
        })
    }

    /// Decode every container policy. One bad entry fails the whole call.
    pub fn container_policy_list(&self) -> Result<Vec<ContainerPolicy>> {
        self.container_policies
            .iter()
            .map(ContainerPolicy::from_entry)
            .collect()
    }

    /// Decrypt the gate for `owner` and decode the container policies.
    pub fn unpack(&self, owner: &PrivateKey) -> Result<UnpackedBox> {
        let gate = self.gate_data(owner)?;
        let policies = self.container_policy_list()?;
        Ok(UnpackedBox { gate, policies })
    }
}
