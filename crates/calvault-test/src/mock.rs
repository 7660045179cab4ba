//! Deterministic [`CalendarCrypto`] implementation for tests.
//!
//! Signatures are keyed SHA-256 digests and encryption is a SHA-256
//! keystream XOR. Both halves of a key pair share one secret, so this is
//! only good for exercising the envelope logic, never for protecting data.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use calvault_service::crypto::{
    CalendarCrypto, CryptoError, Decrypted, SessionKey, VerificationStatus,
};
use sha2::{Digest, Sha256};

const SIGNATURE_PREFIX: &str = "mock-sig";
const SESSION_KEY_ALGORITHM: &str = "mock-xor-sha256";

/// Verifying half of a mock key pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockPublicKey {
    pub fingerprint: String,
    secret: Vec<u8>,
}

/// Signing and unwrapping half of a mock key pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockPrivateKey {
    pub fingerprint: String,
    secret: Vec<u8>,
}

/// A named key pair derived from its name.
#[derive(Debug, Clone)]
pub struct MockKeyPair {
    pub public: MockPublicKey,
    pub private: MockPrivateKey,
}

impl MockKeyPair {
    #[must_use]
    pub fn derive(name: &str) -> Self {
        let secret = Sha256::new()
            .chain_update(b"mock-key:")
            .chain_update(name.as_bytes())
            .finalize()
            .to_vec();
        let fingerprint = hex::encode(&secret[..8]);
        Self {
            public: MockPublicKey {
                fingerprint: fingerprint.clone(),
                secret: secret.clone(),
            },
            private: MockPrivateKey {
                fingerprint,
                secret,
            },
        }
    }
}

/// Mock capability. Session keys come from an internal counter, so a fresh
/// instance always produces the same sequence.
#[derive(Debug, Default)]
pub struct MockCrypto {
    session_counter: AtomicU64,
}

impl MockCrypto {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn digest(secret: &[u8], data: &[u8]) -> String {
        hex::encode(Sha256::new().chain_update(secret).chain_update(data).finalize())
    }

    /// XORs `data` with a keystream of SHA-256 blocks over `key`.
    fn keystream_xor(key: &[u8], data: &[u8]) -> Vec<u8> {
        data.chunks(32)
            .zip(0_u64..)
            .flat_map(|(chunk, block)| {
                let pad = Sha256::new()
                    .chain_update(key)
                    .chain_update(block.to_be_bytes())
                    .finalize();
                chunk
                    .iter()
                    .zip(pad)
                    .map(|(byte, pad)| byte ^ pad)
                    .collect::<Vec<u8>>()
            })
            .collect()
    }

    fn check_signature(
        data: &[u8],
        signature: &str,
        public_keys: &[MockPublicKey],
    ) -> Result<VerificationStatus, CryptoError> {
        if signature.is_empty() {
            return Ok(VerificationStatus::NotSigned);
        }
        let mut parts = signature.splitn(3, ':');
        let (Some(SIGNATURE_PREFIX), Some(fingerprint), Some(digest)) =
            (parts.next(), parts.next(), parts.next())
        else {
            return Err(CryptoError::MalformedSignature(signature.to_string()));
        };

        let valid = public_keys
            .iter()
            .filter(|key| key.fingerprint == fingerprint)
            .any(|key| Self::digest(&key.secret, data) == digest);

        Ok(if valid {
            VerificationStatus::SignedAndValid
        } else {
            VerificationStatus::SignedAndInvalid
        })
    }
}

#[async_trait]
impl CalendarCrypto for MockCrypto {
    type PublicKey = MockPublicKey;
    type PrivateKey = MockPrivateKey;

    async fn verify_detached(
        &self,
        data: &[u8],
        signature: &str,
        public_keys: &[MockPublicKey],
    ) -> Result<VerificationStatus, CryptoError> {
        Self::check_signature(data, signature, public_keys)
    }

    async fn decrypt(
        &self,
        ciphertext: &[u8],
        signature: &str,
        session_key: &SessionKey,
        public_keys: &[MockPublicKey],
    ) -> Result<Decrypted, CryptoError> {
        let data = Self::keystream_xor(&session_key.data, ciphertext);
        let verified = Self::check_signature(&data, signature, public_keys)?;
        Ok(Decrypted { data, verified })
    }

    async fn decrypt_session_key(
        &self,
        packet: &[u8],
        private_keys: &[MockPrivateKey],
    ) -> Result<SessionKey, CryptoError> {
        let separator = packet
            .iter()
            .position(|b| *b == b'\n')
            .ok_or_else(|| CryptoError::MalformedMessage("key packet has no header".into()))?;
        let (header, body) = packet.split_at(separator);
        let fingerprint = std::str::from_utf8(header)
            .ok()
            .ok_or_else(|| CryptoError::MalformedMessage("key packet header".into()))?;

        let key = private_keys
            .iter()
            .find(|key| key.fingerprint == fingerprint)
            .ok_or(CryptoError::NoMatchingKey)?;

        Ok(SessionKey {
            data: Self::keystream_xor(&key.secret, &body[1..]),
            algorithm: SESSION_KEY_ALGORITHM.to_string(),
        })
    }

    async fn sign_detached(
        &self,
        data: &[u8],
        private_key: &MockPrivateKey,
    ) -> Result<String, CryptoError> {
        Ok(format!(
            "{SIGNATURE_PREFIX}:{}:{}",
            private_key.fingerprint,
            Self::digest(&private_key.secret, data)
        ))
    }

    async fn generate_session_key(&self) -> Result<SessionKey, CryptoError> {
        let counter = self.session_counter.fetch_add(1, Ordering::Relaxed);
        let data = Sha256::new()
            .chain_update(b"mock-session:")
            .chain_update(counter.to_be_bytes())
            .finalize()
            .to_vec();
        tracing::trace!(counter, "Generated mock session key");
        Ok(SessionKey {
            data,
            algorithm: SESSION_KEY_ALGORITHM.to_string(),
        })
    }

    async fn encrypt(&self, data: &[u8], session_key: &SessionKey) -> Result<Vec<u8>, CryptoError> {
        Ok(Self::keystream_xor(&session_key.data, data))
    }

    async fn encrypt_session_key(
        &self,
        session_key: &SessionKey,
        public_key: &MockPublicKey,
    ) -> Result<Vec<u8>, CryptoError> {
        let mut packet = public_key.fingerprint.as_bytes().to_vec();
        packet.push(b'\n');
        packet.extend(Self::keystream_xor(&public_key.secret, &session_key.data));
        Ok(packet)
    }
}
