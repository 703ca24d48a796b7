//! Property tests for packing, unpacking and the credential service.

use std::collections::HashSet;

use proptest::prelude::*;

use gatebox::{Credentials, CredentialsConfig, CredentialsError};
use gatebox_accessbox::{AccessBox, BearerToken, BoxBuilder, BoxError, Recipient};
use gatebox_core::{ContainerId, OwnerId, PrivateKey, NONCE_SIZE};
use gatebox_store::StoreError;
use gatebox_testkit::fixtures::{FailingBackend, TestFixture};
use gatebox_testkit::generators::{container_policies, private_key, recipients};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn round_trip_every_recipient(params in recipients(5)) {
        let (access_box, secrets) = BoxBuilder::new()
            .recipients(params.iter().map(|p| p.recipient()))
            .pack()
            .unwrap();

        prop_assert_eq!(access_box.gates.len(), params.len());

        for p in &params {
            let gate = access_box.gate_data(&p.key).unwrap();
            // Every recipient recovers the same access key.
            prop_assert_eq!(&gate.access_key, &secrets.access_key);
            prop_assert_eq!(gate.bearer_token.as_bytes(), p.bearer.as_slice());
            prop_assert_eq!(
                gate.session_token.map(|t| t.as_bytes().to_vec()),
                p.expected_session()
            );
            prop_assert_eq!(gate.gate_key, p.key.public_key());
        }
    }

    #[test]
    fn tamper_is_detected(
        params in recipients(3),
        which in any::<prop::sample::Index>(),
        bit in any::<prop::sample::Index>(),
    ) {
        let (mut access_box, _) = BoxBuilder::new()
            .recipients(params.iter().map(|p| p.recipient()))
            .pack()
            .unwrap();

        let target = which.index(params.len());
        let tokens = &mut access_box.gates[target].tokens;
        let bit = bit.index(tokens.len() * 8);
        tokens[bit / 8] ^= 1 << (bit % 8);

        let result = access_box.gate_data(&params[target].key);
        prop_assert!(matches!(result, Err(BoxError::AuthenticationFailed)));
    }

    #[test]
    fn stranger_gets_no_matching_gate(params in recipients(3), stranger in private_key()) {
        prop_assume!(params.iter().all(|p| p.key.public_key() != stranger.public_key()));

        let (access_box, _) = BoxBuilder::new()
            .recipients(params.iter().map(|p| p.recipient()))
            .pack()
            .unwrap();

        prop_assert!(matches!(
            access_box.gate_data(&stranger),
            Err(BoxError::NoMatchingGate(_))
        ));
    }

    #[test]
    fn policies_pass_through(params in recipients(3), policies in container_policies(4)) {
        let (access_box, _) = BoxBuilder::new()
            .recipients(params.iter().map(|p| p.recipient()))
            .policies(policies.clone())
            .pack()
            .unwrap();

        let decoded = AccessBox::from_bytes(&access_box.to_bytes()).unwrap();
        for p in &params {
            let unpacked = decoded.unpack(&p.key).unwrap();
            prop_assert_eq!(&unpacked.policies, &policies);
        }
    }
}

#[test]
fn nonces_are_distinct_across_packs() {
    let alice = PrivateKey::generate();
    let bob = PrivateKey::generate();
    let single = [Recipient::new(alice.public_key(), BearerToken::from_bytes(b"a".to_vec()))];
    let double = [
        single[0].clone(),
        Recipient::new(bob.public_key(), BearerToken::from_bytes(b"b".to_vec())),
    ];

    let mut nonces = HashSet::new();
    let mut total = 0;
    for i in 0..10_000 {
        let batch: &[Recipient] = if i % 2 == 0 { &single } else { &double };
        let (access_box, _) = gatebox_accessbox::pack(batch).unwrap();

        for gate in &access_box.gates {
            total += 1;
            assert!(
                nonces.insert(gate.tokens[..NONCE_SIZE].to_vec()),
                "nonce repeated after {} gates",
                total
            );
        }
    }
    assert_eq!(nonces.len(), 15_000);
}

#[tokio::test]
async fn preconditions_do_no_backend_io() {
    let fixture = TestFixture::new(2);
    let (access_box, _) = fixture.pack();

    let result = fixture
        .credentials
        .put(&fixture.container_id, &fixture.issuer, &access_box, &[])
        .await;
    assert!(matches!(result, Err(CredentialsError::EmptyRecipients)));

    let result = fixture
        .credentials
        .put(
            &fixture.container_id,
            &fixture.issuer,
            &AccessBox::default(),
            &fixture.recipient_keys(),
        )
        .await;
    assert!(matches!(result, Err(CredentialsError::EmptyBox)));

    assert_eq!(fixture.credentials.backend().io_count(), 0);
}

#[tokio::test]
async fn every_recipient_reads_through_service() {
    let fixture = TestFixture::new(4);
    let (address, secrets) = fixture.store_box().await.unwrap();

    for recipient in &fixture.recipients {
        let gate = fixture
            .credentials
            .get_tokens(&address, &recipient.key)
            .await
            .unwrap();
        assert_eq!(gate.access_key, secrets.access_key);
        assert_eq!(gate.bearer_token, recipient.bearer_token);
        assert_eq!(gate.session_token, recipient.session_token);
    }
    assert_eq!(fixture.credentials.backend().gets(), 4);
}

#[tokio::test]
async fn backend_errors_pass_through() {
    let creds = Credentials::new(FailingBackend, CredentialsConfig::default());
    let fixture = TestFixture::new(1);
    let (access_box, _) = fixture.pack();

    let result = creds
        .put(
            &ContainerId::from_bytes([1; 32]),
            &OwnerId::from_bytes([2; 32]),
            &access_box,
            &fixture.recipient_keys(),
        )
        .await;
    assert!(matches!(
        result,
        Err(CredentialsError::Backend(StoreError::Io(_)))
    ));

    let address = gatebox_core::Address::new(
        ContainerId::from_bytes([1; 32]),
        gatebox_core::ObjectId::from_bytes([3; 32]),
    );
    let result = creds.fetch_box(&address).await;
    assert!(matches!(
        result,
        Err(CredentialsError::Backend(StoreError::Io(_)))
    ));
    assert_eq!(creds.pool().idle_count(), 1);
}
