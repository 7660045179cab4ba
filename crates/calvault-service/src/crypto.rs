//! Cryptographic capability consumed by the calendar envelope code.
//!
//! Nothing in this crate signs, hashes keys, or encrypts by itself; every
//! primitive goes through [`CalendarCrypto`]. Implementations own their key
//! types and any timeout or cancellation policy.

use async_trait::async_trait;
use thiserror::Error;

/// Outcome of a signature check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationStatus {
    /// No signature was present.
    NotSigned,
    /// Signed by one of the supplied keys, and the signature is valid.
    SignedAndValid,
    /// Signed, but not validly by any supplied key.
    SignedAndInvalid,
}

impl VerificationStatus {
    #[must_use]
    pub const fn is_valid(self) -> bool {
        matches!(self, Self::SignedAndValid)
    }
}

/// Symmetric key material for one group of cards.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionKey {
    pub data: Vec<u8>,
    pub algorithm: String,
}

impl std::fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionKey")
            .field("algorithm", &self.algorithm)
            .field("len", &self.data.len())
            .finish()
    }
}

/// Plaintext plus the verification outcome of its signature.
#[derive(Debug, Clone)]
pub struct Decrypted {
    pub data: Vec<u8>,
    pub verified: VerificationStatus,
}

/// Failures raised by a capability implementation.
#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("Malformed signature: {0}")]
    MalformedSignature(String),

    #[error("Malformed message: {0}")]
    MalformedMessage(String),

    #[error("No key can unwrap this session key")]
    NoMatchingKey,

    #[error("Crypto backend error: {0}")]
    Backend(String),
}

/// Signing, verification and encryption primitives for calendar cards.
///
/// Signatures travel as armored strings; ciphertext and key packets as raw
/// bytes.
#[async_trait]
pub trait CalendarCrypto: Send + Sync {
    type PublicKey: Send + Sync;
    type PrivateKey: Send + Sync;

    /// Checks a detached `signature` over `data` against `public_keys`.
    async fn verify_detached(
        &self,
        data: &[u8],
        signature: &str,
        public_keys: &[Self::PublicKey],
    ) -> Result<VerificationStatus, CryptoError>;

    /// Decrypts `ciphertext` with `session_key` and verifies `signature`
    /// over the plaintext.
    async fn decrypt(
        &self,
        ciphertext: &[u8],
        signature: &str,
        session_key: &SessionKey,
        public_keys: &[Self::PublicKey],
    ) -> Result<Decrypted, CryptoError>;

    /// Unwraps a session key packet with the first private key that fits.
    async fn decrypt_session_key(
        &self,
        packet: &[u8],
        private_keys: &[Self::PrivateKey],
    ) -> Result<SessionKey, CryptoError>;

    /// Produces an armored detached signature over `data`.
    async fn sign_detached(
        &self,
        data: &[u8],
        private_key: &Self::PrivateKey,
    ) -> Result<String, CryptoError>;

    /// Generates a fresh session key.
    async fn generate_session_key(&self) -> Result<SessionKey, CryptoError>;

    /// Encrypts `data` with `session_key`.
    async fn encrypt(&self, data: &[u8], session_key: &SessionKey)
    -> Result<Vec<u8>, CryptoError>;

    /// Wraps `session_key` for the holder of `public_key`.
    async fn encrypt_session_key(
        &self,
        session_key: &SessionKey,
        public_key: &Self::PublicKey,
    ) -> Result<Vec<u8>, CryptoError>;
}
