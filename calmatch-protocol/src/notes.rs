//! Authenticated encryption for post-match notes.
//!
//! AES-256-GCM with a random 96-bit nonce per call.
//!
//! Envelope wire format: `hex(nonce) ":" hex(ciphertext + tag)`.
//!
//! The nonce comes from the OS random source rather than a counter; nothing
//! about a session persists, so a counter could repeat across restarts while
//! a random nonce cannot (up to negligible probability).

use crate::error::{CalMatchError, Result};
use crate::keys::SharedSecret;
use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Nonce};

const NONCE_LEN: usize = 12;
const SEPARATOR: char = ':';

/// Encrypt a note under the session's shared secret.
pub fn encrypt(plaintext: &str, key: &SharedSecret) -> Result<String> {
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|_| CalMatchError::AuthenticationFailed)?;
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let ciphertext = cipher
        .encrypt(&nonce, plaintext.as_bytes())
        .map_err(|_| CalMatchError::AuthenticationFailed)?;

    Ok(format!(
        "{}{}{}",
        hex::encode(nonce),
        SEPARATOR,
        hex::encode(ciphertext)
    ))
}

/// Decrypt a note envelope.
///
/// # Errors
/// `MalformedEnvelope` if the separator, hex, or nonce length is wrong;
/// `AuthenticationFailed` if the tag check fails.
pub fn decrypt(envelope: &str, key: &SharedSecret) -> Result<String> {
    let (nonce_hex, cipher_hex) = envelope.split_once(SEPARATOR).ok_or_else(|| {
        CalMatchError::MalformedEnvelope("missing nonce separator".to_string())
    })?;

    let nonce_bytes =
        hex::decode(nonce_hex).map_err(|e| CalMatchError::MalformedEnvelope(e.to_string()))?;
    if nonce_bytes.len() != NONCE_LEN {
        return Err(CalMatchError::MalformedEnvelope(format!(
            "nonce must be {} bytes, got {}",
            NONCE_LEN,
            nonce_bytes.len()
        )));
    }
    let ciphertext =
        hex::decode(cipher_hex).map_err(|e| CalMatchError::MalformedEnvelope(e.to_string()))?;

    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|_| CalMatchError::AuthenticationFailed)?;
    let plaintext = cipher
        .decrypt(Nonce::from_slice(&nonce_bytes), ciphertext.as_ref())
        .map_err(|_| CalMatchError::AuthenticationFailed)?;

    String::from_utf8(plaintext)
        .map_err(|_| CalMatchError::MalformedEnvelope("note is not valid UTF-8".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::{derive_shared_secret, KeyPair};

    fn test_key() -> SharedSecret {
        let alice = KeyPair::generate();
        let bob = KeyPair::generate();
        derive_shared_secret(&bob.public_hex(), &alice.secret).unwrap()
    }

    #[test]
    fn test_round_trip() {
        let key = test_key();
        let envelope = encrypt("see you at the keynote", &key).unwrap();
        assert_eq!(decrypt(&envelope, &key).unwrap(), "see you at the keynote");
    }

    #[test]
    fn test_nonce_freshness() {
        let key = test_key();
        let first = encrypt("same note", &key).unwrap();
        let second = encrypt("same note", &key).unwrap();
        assert_ne!(first, second);
        assert_eq!(decrypt(&first, &key).unwrap(), "same note");
        assert_eq!(decrypt(&second, &key).unwrap(), "same note");
    }

    #[test]
    fn test_wrong_key_fails_authentication() {
        let envelope = encrypt("secret", &test_key()).unwrap();
        let result = decrypt(&envelope, &test_key());
        assert!(matches!(result, Err(CalMatchError::AuthenticationFailed)));
    }

    #[test]
    fn test_tamper_detection() {
        let key = test_key();
        let envelope = encrypt("tamper me", &key).unwrap();
        let (nonce_hex, cipher_hex) = envelope.split_once(':').unwrap();

        // Flip one bit in every ciphertext byte position in turn.
        let mut bytes = hex::decode(cipher_hex).unwrap();
        for i in 0..bytes.len() {
            bytes[i] ^= 0x01;
            let tampered = format!("{}:{}", nonce_hex, hex::encode(&bytes));
            assert!(matches!(
                decrypt(&tampered, &key),
                Err(CalMatchError::AuthenticationFailed)
            ));
            bytes[i] ^= 0x01;
        }
    }

    #[test]
    fn test_missing_separator() {
        let result = decrypt("deadbeef", &test_key());
        assert!(matches!(result, Err(CalMatchError::MalformedEnvelope(_))));
    }

    #[test]
    fn test_bad_nonce_length() {
        let result = decrypt("aabb:ccdd", &test_key());
        assert!(matches!(result, Err(CalMatchError::MalformedEnvelope(_))));
    }

    #[test]
    fn test_non_hex_ciphertext() {
        let key = test_key();
        let envelope = encrypt("x", &key).unwrap();
        let (nonce_hex, _) = envelope.split_once(':').unwrap();
        let result = decrypt(&format!("{}:nothex", nonce_hex), &key);
        assert!(matches!(result, Err(CalMatchError::MalformedEnvelope(_))));
    }

    #[test]
    fn test_empty_plaintext() {
        let key = test_key();
        let envelope = encrypt("", &key).unwrap();
        assert_eq!(decrypt(&envelope, &key).unwrap(), "");
    }
}
