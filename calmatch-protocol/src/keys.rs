//! Ephemeral key agreement for the note channel.
//!
//! Each session generates one keypair on the Ristretto group. Exchanging the
//! public halves over JOIN/STEP_1 gives both parties the same Diffie-Hellman
//! point, hashed down to a fixed 32-byte AEAD key.

use crate::error::{CalMatchError, Result};
use curve25519_dalek::constants::RISTRETTO_BASEPOINT_POINT;
use curve25519_dalek::ristretto::{CompressedRistretto, RistrettoPoint};
use curve25519_dalek::Scalar;
use rand::rngs::OsRng;
use sha2::{Digest, Sha512};

/// Ephemeral session keypair.
///
/// The secret scalar doubles as the blinding scalar for the PSI rounds, so a
/// session needs exactly one of these. It is never serialized; only the
/// compressed public point leaves the process.
#[derive(Debug, Clone)]
pub struct KeyPair {
    pub(crate) secret: Scalar,
    public: CompressedRistretto,
}

impl KeyPair {
    /// Generate a fresh keypair from the OS random source.
    pub fn generate() -> Self {
        let secret = Scalar::random(&mut OsRng);
        Self {
            public: derive_public_point(&secret),
            secret,
        }
    }

    /// Compressed public point, hex-encoded for the wire.
    pub fn public_hex(&self) -> String {
        hex::encode(self.public.to_bytes())
    }

    pub fn public_point(&self) -> CompressedRistretto {
        self.public
    }

    #[cfg(test)]
    pub(crate) fn secret(&self) -> &Scalar {
        &self.secret
    }
}

/// Scalar multiplication of the group basepoint.
pub fn derive_public_point(secret: &Scalar) -> CompressedRistretto {
    (secret * RISTRETTO_BASEPOINT_POINT).compress()
}

/// Symmetric key derived from the Diffie-Hellman exchange.
#[derive(Clone, PartialEq, Eq)]
pub struct SharedSecret([u8; 32]);

impl SharedSecret {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl std::fmt::Debug for SharedSecret {
    // Never log key material.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SharedSecret(..)")
    }
}

/// Compute the shared secret from the peer's hex-encoded public point.
///
/// The DH point's compressed encoding is hashed with SHA-512 and truncated to
/// 32 bytes. Both directions yield the same key.
///
/// # Errors
/// `InvalidPeerKey` if the encoding is not valid hex, not 32 bytes, or does
/// not decompress to a curve point.
pub fn derive_shared_secret(peer_public_hex: &str, secret: &Scalar) -> Result<SharedSecret> {
    let peer = decode_public_point(peer_public_hex)?;
    let dh = secret * peer;
    let digest = Sha512::digest(dh.compress().as_bytes());
    let mut key = [0u8; 32];
    key.copy_from_slice(&digest[..32]);
    Ok(SharedSecret(key))
}

fn decode_public_point(peer_public_hex: &str) -> Result<RistrettoPoint> {
    let bytes = hex::decode(peer_public_hex.trim())
        .map_err(|e| CalMatchError::InvalidPeerKey(e.to_string()))?;
    let array: [u8; 32] = bytes
        .try_into()
        .map_err(|_| CalMatchError::InvalidPeerKey("expected 32-byte point".to_string()))?;
    CompressedRistretto(array)
        .decompress()
        .ok_or_else(|| CalMatchError::InvalidPeerKey("point decompression failed".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_keypair_distinct() {
        let a = KeyPair::generate();
        let b = KeyPair::generate();
        assert_ne!(a.public_hex(), b.public_hex());
    }

    #[test]
    fn test_public_point_matches_secret() {
        let pair = KeyPair::generate();
        assert_eq!(derive_public_point(pair.secret()), pair.public_point());
    }

    #[test]
    fn test_shared_secret_symmetry() {
        let alice = KeyPair::generate();
        let bob = KeyPair::generate();

        let from_alice = derive_shared_secret(&bob.public_hex(), alice.secret()).unwrap();
        let from_bob = derive_shared_secret(&alice.public_hex(), bob.secret()).unwrap();

        assert_eq!(from_alice.as_bytes(), from_bob.as_bytes());
    }

    #[test]
    fn test_shared_secret_rejects_bad_hex() {
        let pair = KeyPair::generate();
        let result = derive_shared_secret("not hex", pair.secret());
        assert!(matches!(result, Err(CalMatchError::InvalidPeerKey(_))));
    }

    #[test]
    fn test_shared_secret_rejects_wrong_length() {
        let pair = KeyPair::generate();
        let result = derive_shared_secret("aabbcc", pair.secret());
        assert!(matches!(result, Err(CalMatchError::InvalidPeerKey(_))));
    }

    #[test]
    fn test_shared_secret_rejects_off_curve() {
        let pair = KeyPair::generate();
        // 0xff..ff is not a valid Ristretto encoding.
        let bad = hex::encode([0xffu8; 32]);
        let result = derive_shared_secret(&bad, pair.secret());
        assert!(matches!(result, Err(CalMatchError::InvalidPeerKey(_))));
    }

    #[test]
    fn test_shared_secret_debug_redacted() {
        let alice = KeyPair::generate();
        let bob = KeyPair::generate();
        let secret = derive_shared_secret(&bob.public_hex(), alice.secret()).unwrap();
        assert_eq!(format!("{:?}", secret), "SharedSecret(..)");
    }
}
