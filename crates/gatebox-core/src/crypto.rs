//! Cryptographic primitives.
//!
//! Provides P-256 ECDH key agreement, HKDF-SHA-256 key derivation and
//! XChaCha20-Poly1305 authenticated encryption. All functions are pure.

use std::fmt;

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    Key, XChaCha20Poly1305, XNonce,
};
use hkdf::Hkdf;
use p256::elliptic_curve::group::Group;
use p256::elliptic_curve::point::AffineCoordinates;
use p256::elliptic_curve::sec1::ToEncodedPoint;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;
use zeroize::Zeroize;

use crate::error::{CryptoError, Result};

/// Size of symmetric keys and shared secrets in bytes.
pub const KEY_SIZE: usize = 32;

/// Size of the XChaCha20-Poly1305 nonce prepended to every sealed payload.
pub const NONCE_SIZE: usize = 24;

/// Size of the Poly1305 authentication tag.
pub const TAG_SIZE: usize = 16;

/// Size of a SEC1 compressed P-256 public key.
pub const COMPRESSED_KEY_SIZE: usize = 33;

/// Size of a SEC1 uncompressed P-256 public key.
const UNCOMPRESSED_KEY_SIZE: usize = 65;

/// A P-256 public key.
///
/// The wire form is the 33-byte SEC1 compressed point.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct PublicKey(p256::PublicKey);

impl PublicKey {
    /// Parse a SEC1 encoded point (compressed or uncompressed).
    ///
    /// Encodings sized for P-384 or P-521 fail with `CurveMismatch`; anything
    /// else that does not decode to a non-identity P-256 point fails with
    /// `InvalidPoint`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let tag = bytes.first().copied();
        match (bytes.len(), tag) {
            (COMPRESSED_KEY_SIZE, Some(0x02 | 0x03)) | (UNCOMPRESSED_KEY_SIZE, Some(0x04)) => {
                p256::PublicKey::from_sec1_bytes(bytes)
                    .map(Self)
                    .map_err(|_| CryptoError::InvalidPoint)
            }
            // P-384 and P-521 compressed / uncompressed sizes.
            (49 | 67, Some(0x02 | 0x03)) | (97 | 133, Some(0x04)) => {
                Err(CryptoError::CurveMismatch)
            }
            _ => Err(CryptoError::InvalidPoint),
        }
    }

    /// Parse from a hex string.
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s).map_err(|_| CryptoError::InvalidPoint)?;
        Self::from_bytes(&bytes)
    }

    /// The 33-byte compressed encoding.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.0.to_encoded_point(true).as_bytes().to_vec()
    }

    /// Convert to hex string (compressed encoding).
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// A P-256 private key.
///
/// The scalar is wiped from memory when the key is dropped.
#[derive(Clone)]
pub struct PrivateKey(p256::SecretKey);

impl PrivateKey {
    /// Generate a new random key from the OS random source.
    pub fn generate() -> Self {
        Self(p256::SecretKey::random(&mut OsRng))
    }

    /// Create from a 32-byte big-endian scalar.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != KEY_SIZE {
            return Err(CryptoError::InvalidPrivateKey);
        }
        p256::SecretKey::from_slice(bytes)
            .map(Self)
            .map_err(|_| CryptoError::InvalidPrivateKey)
    }

    /// The 32-byte big-endian scalar.
    pub fn to_bytes(&self) -> [u8; KEY_SIZE] {
        self.0.to_bytes().into()
    }

    /// Derive the public key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.0.public_key())
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PrivateKey").field(&"[REDACTED]").finish()
    }
}

/// The x coordinate of an ECDH result, left-padded to 32 bytes.
pub struct SharedSecret([u8; KEY_SIZE]);

impl SharedSecret {
    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl Drop for SharedSecret {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

/// A 256-bit XChaCha20-Poly1305 key.
pub struct SymmetricKey([u8; KEY_SIZE]);

impl SymmetricKey {
    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl Drop for SymmetricKey {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SymmetricKey").field(&"[REDACTED]").finish()
    }
}

/// Compute the ECDH shared secret between a private and a public key.
///
/// Fails with `InvalidPoint` if the scalar multiplication yields the
/// point at infinity.
pub fn derive_shared_secret(private: &PrivateKey, public: &PublicKey) -> Result<SharedSecret> {
    let product = public.0.to_projective() * *private.0.to_nonzero_scalar();
    if bool::from(product.is_identity()) {
        return Err(CryptoError::InvalidPoint);
    }

    // FieldBytes is already the fixed-width big-endian x coordinate.
    let x = product.to_affine().x();
    let mut secret = [0u8; KEY_SIZE];
    secret[KEY_SIZE - x.len()..].copy_from_slice(&x);
    Ok(SharedSecret(secret))
}

/// Derive a symmetric key with HKDF-SHA-256 (no salt, empty info).
pub fn derive_symmetric_key(shared: &SharedSecret) -> Result<SymmetricKey> {
    let hkdf = Hkdf::<Sha256>::new(None, shared.as_bytes());
    let mut okm = [0u8; KEY_SIZE];
    hkdf.expand(&[], &mut okm)
        .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;
    Ok(SymmetricKey(okm))
}

/// Encrypt `plaintext`, returning `nonce || ciphertext || tag`.
///
/// Every call draws a fresh 24-byte nonce from the OS random source.
pub fn seal(key: &SymmetricKey, plaintext: &[u8]) -> Result<Vec<u8>> {
    let cipher = XChaCha20Poly1305::new(Key::from_slice(key.as_bytes()));

    let mut nonce = [0u8; NONCE_SIZE];
    OsRng
        .try_fill_bytes(&mut nonce)
        .map_err(|e| CryptoError::Random(e.to_string()))?;

    let ciphertext = cipher
        .encrypt(XNonce::from_slice(&nonce), plaintext)
        .map_err(|_| CryptoError::Encryption)?;

    let mut sealed = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    sealed.extend_from_slice(&nonce);
    sealed.extend_from_slice(&ciphertext);
    Ok(sealed)
}

/// Decrypt `nonce || ciphertext || tag` produced by [`seal`].
///
/// Any failure, including input too short to hold a nonce and tag, is
/// reported as `AuthenticationFailed`.
pub fn open(key: &SymmetricKey, sealed: &[u8]) -> Result<Vec<u8>> {
    if sealed.len() < NONCE_SIZE + TAG_SIZE {
        return Err(CryptoError::AuthenticationFailed);
    }

    let (nonce, ciphertext) = sealed.split_at(NONCE_SIZE);
    let cipher = XChaCha20Poly1305::new(Key::from_slice(key.as_bytes()));
    cipher
        .decrypt(XNonce::from_slice(nonce), ciphertext)
        .map_err(|_| CryptoError::AuthenticationFailed)
}

/// Generate `n` bytes from the OS random source.
pub fn generate_random_secret(n: usize) -> Result<Vec<u8>> {
    let mut bytes = vec![0u8; n];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| CryptoError::Random(e.to_string()))?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key_between(a: &PrivateKey, b: &PublicKey) -> SymmetricKey {
        derive_symmetric_key(&derive_shared_secret(a, b).unwrap()).unwrap()
    }

    #[test]
    fn test_p256_key_agreement() {
        let alice = PrivateKey::generate();
        let bob = PrivateKey::generate();

        let alice_shared = derive_shared_secret(&alice, &bob.public_key()).unwrap();
        let bob_shared = derive_shared_secret(&bob, &alice.public_key()).unwrap();

        assert_eq!(alice_shared.as_bytes(), bob_shared.as_bytes());
    }

    #[test]
    fn test_public_key_compressed_roundtrip() {
        let key = PrivateKey::generate().public_key();
        let bytes = key.to_bytes();

        assert_eq!(bytes.len(), COMPRESSED_KEY_SIZE);
        assert_eq!(PublicKey::from_bytes(&bytes).unwrap(), key);
        assert_eq!(PublicKey::from_hex(&key.to_hex()).unwrap(), key);
    }

    #[test]
    fn test_public_key_accepts_uncompressed() {
        let key = PrivateKey::generate().public_key();
        let uncompressed = key.0.to_encoded_point(false);

        assert_eq!(PublicKey::from_bytes(uncompressed.as_bytes()).unwrap(), key);
    }

    #[test]
    fn test_public_key_other_curve_sizes() {
        let mut p384 = vec![0u8; 49];
        p384[0] = 0x02;
        assert_eq!(PublicKey::from_bytes(&p384), Err(CryptoError::CurveMismatch));

        let mut p521 = vec![0u8; 133];
        p521[0] = 0x04;
        assert_eq!(PublicKey::from_bytes(&p521), Err(CryptoError::CurveMismatch));
    }

    #[test]
    fn test_public_key_rejects_garbage() {
        assert_eq!(PublicKey::from_bytes(&[]), Err(CryptoError::InvalidPoint));
        assert_eq!(PublicKey::from_bytes(&[0x00]), Err(CryptoError::InvalidPoint));

        // x is larger than the field modulus.
        let mut off_curve = [0xffu8; COMPRESSED_KEY_SIZE];
        off_curve[0] = 0x02;
        assert_eq!(PublicKey::from_bytes(&off_curve), Err(CryptoError::InvalidPoint));
    }

    #[test]
    fn test_private_key_bytes_roundtrip() {
        let key = PrivateKey::generate();
        let restored = PrivateKey::from_bytes(&key.to_bytes()).unwrap();
        assert_eq!(key.public_key(), restored.public_key());

        assert_eq!(PrivateKey::from_bytes(&[0u8; 32]).unwrap_err(), CryptoError::InvalidPrivateKey);
        assert_eq!(PrivateKey::from_bytes(&[1u8; 31]).unwrap_err(), CryptoError::InvalidPrivateKey);
    }

    #[test]
    fn test_private_key_debug_redacted() {
        let debug = format!("{:?}", PrivateKey::generate());
        assert_eq!(debug, "PrivateKey(\"[REDACTED]\")");
    }

    #[test]
    fn test_key_derivation_deterministic() {
        let shared = SharedSecret([0x42; 32]);

        let key1 = derive_symmetric_key(&shared).unwrap();
        let key2 = derive_symmetric_key(&shared).unwrap();

        assert_eq!(key1.as_bytes(), key2.as_bytes());
        assert_ne!(key1.as_bytes(), shared.as_bytes());
    }

    #[test]
    fn test_seal_open() {
        let alice = PrivateKey::generate();
        let bob = PrivateKey::generate();
        let key = key_between(&alice, &bob.public_key());

        let sealed = seal(&key, b"hello, world!").unwrap();
        assert_eq!(sealed.len(), NONCE_SIZE + 13 + TAG_SIZE);

        let opened = open(&key_between(&bob, &alice.public_key()), &sealed).unwrap();
        assert_eq!(opened, b"hello, world!");
    }

    #[test]
    fn test_seal_uses_fresh_nonce() {
        let key = SymmetricKey::from_bytes([7; 32]);

        let a = seal(&key, b"same").unwrap();
        let b = seal(&key, b"same").unwrap();

        assert_ne!(a[..NONCE_SIZE], b[..NONCE_SIZE]);
    }

    #[test]
    fn test_open_wrong_key_fails() {
        let sealed = seal(&SymmetricKey::from_bytes([1; 32]), b"secret").unwrap();
        let result = open(&SymmetricKey::from_bytes([2; 32]), &sealed);
        assert_eq!(result, Err(CryptoError::AuthenticationFailed));
    }

    #[test]
    fn test_open_truncated_fails() {
        let key = SymmetricKey::from_bytes([1; 32]);
        let sealed = seal(&key, b"secret").unwrap();

        assert_eq!(open(&key, &sealed[..NONCE_SIZE]), Err(CryptoError::AuthenticationFailed));
        assert_eq!(
            open(&key, &sealed[..sealed.len() - 1]),
            Err(CryptoError::AuthenticationFailed)
        );
    }

    #[test]
    fn test_open_tampered_fails() {
        let key = SymmetricKey::from_bytes([3; 32]);
        let sealed = seal(&key, b"secret").unwrap();

        for i in 0..sealed.len() {
            let mut tampered = sealed.clone();
            tampered[i] ^= 0x01;
            assert_eq!(open(&key, &tampered), Err(CryptoError::AuthenticationFailed));
        }
    }

    #[test]
    fn test_generate_random_secret() {
        let a = generate_random_secret(32).unwrap();
        let b = generate_random_secret(32).unwrap();

        assert_eq!(a.len(), 32);
        assert_ne!(a, b);
        assert!(generate_random_secret(0).unwrap().is_empty());
    }

    proptest::proptest! {
        #[test]
        fn arbitrary_compressed_points_only_fail_as_invalid_point(
            tag in proptest::sample::select(vec![0x02u8, 0x03]),
            x in proptest::prelude::any::<[u8; 32]>(),
        ) {
            let mut bytes = vec![tag];
            bytes.extend_from_slice(&x);

            match PublicKey::from_bytes(&bytes) {
                Ok(key) => proptest::prop_assert_eq!(key.to_bytes(), bytes),
                Err(e) => proptest::prop_assert_eq!(e, CryptoError::InvalidPoint),
            }
        }
    }
}
