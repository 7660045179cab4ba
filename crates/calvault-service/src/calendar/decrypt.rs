//! Verification and decryption of individual cards.

use std::collections::HashMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;

use super::card::{CalendarCard, CardKind, CardPart};
use crate::crypto::{CalendarCrypto, SessionKey};
use crate::error::{ServiceError, ServiceResult};

/// ## Summary
/// Verifies a detached signature over cleartext card data.
///
/// Returns `data` unchanged so cleartext and decrypted payloads flow
/// through the same code afterwards.
///
/// ## Errors
/// Returns `SignatureError` unless the status is exactly "signed and valid"
/// for one of `public_keys`.
pub async fn verify_signed_card<'a, C: CalendarCrypto>(
    crypto: &C,
    data: &'a str,
    signature: &str,
    public_keys: &[C::PublicKey],
) -> ServiceResult<&'a str> {
    let status = crypto
        .verify_detached(data.as_bytes(), signature, public_keys)
        .await?;

    if !status.is_valid() {
        tracing::warn!(?status, key_count = public_keys.len(), "Card signature rejected");
        return Err(ServiceError::SignatureError);
    }

    Ok(data)
}

/// ## Summary
/// Decrypts an encrypted card and verifies the signature over its plaintext.
///
/// ## Errors
/// Returns `MissingData` without a session key, `SignatureError` unless the
/// plaintext is validly signed by one of `public_keys`, and `DecodingError`
/// if the plaintext is not UTF-8.
pub async fn decrypt_card<C: CalendarCrypto>(
    crypto: &C,
    ciphertext: &[u8],
    signature: &str,
    public_keys: &[C::PublicKey],
    session_key: Option<&SessionKey>,
) -> ServiceResult<String> {
    let session_key = session_key
        .ok_or_else(|| ServiceError::MissingData("session key for encrypted card".into()))?;

    let decrypted = crypto
        .decrypt(ciphertext, signature, session_key, public_keys)
        .await?;

    if !decrypted.verified.is_valid() {
        tracing::warn!(status = ?decrypted.verified, "Encrypted card signature rejected");
        return Err(ServiceError::SignatureError);
    }

    String::from_utf8(decrypted.data)
        .map_err(|e| ServiceError::DecodingError(format!("card plaintext is not text: {e}")))
}

/// ## Summary
/// Decodes the signed and the encrypted card of one part concurrently.
///
/// A missing card yields `None` in its slot.
///
/// ## Errors
/// Fails if either present card fails to verify or decrypt.
pub async fn decrypt_and_verify_part<C: CalendarCrypto>(
    crypto: &C,
    part: &CardPart,
    public_keys: &[C::PublicKey],
    session_key: Option<&SessionKey>,
) -> ServiceResult<(Option<String>, Option<String>)> {
    futures::try_join!(
        verify_optional(crypto, part.signed.as_ref(), public_keys),
        decrypt_optional(crypto, part.encrypted.as_ref(), public_keys, session_key),
    )
}

/// ## Summary
/// Verifies or decrypts one card according to its kind.
///
/// Public keys are looked up by the card's author; an unknown author gets
/// an empty key set and therefore fails verification. Clear cards carry no
/// protected content and yield `None`.
///
/// ## Errors
/// Propagates every verification, decryption and decoding failure.
#[tracing::instrument(skip_all, fields(author = %card.author, kind = ?card.kind))]
pub async fn decrypt_and_verify_calendar_event<C: CalendarCrypto>(
    crypto: &C,
    card: &CalendarCard,
    keys_by_author: &HashMap<String, Vec<C::PublicKey>>,
    session_key: Option<&SessionKey>,
) -> ServiceResult<Option<String>> {
    let public_keys = keys_by_author.get(&card.author).map_or(&[][..], Vec::as_slice);
    if public_keys.is_empty() {
        tracing::debug!("No public keys known for card author");
    }

    match card.kind {
        CardKind::Signed => verify_optional(crypto, Some(card), public_keys).await,
        CardKind::EncryptedAndSigned => {
            decrypt_optional(crypto, Some(card), public_keys, session_key).await
        }
        CardKind::Clear => Ok(None),
    }
}

async fn verify_optional<C: CalendarCrypto>(
    crypto: &C,
    card: Option<&CalendarCard>,
    public_keys: &[C::PublicKey],
) -> ServiceResult<Option<String>> {
    let Some(card) = card else {
        return Ok(None);
    };
    let signature = card_signature(card)?;
    let data = verify_signed_card(crypto, &card.data, signature, public_keys).await?;
    Ok(Some(data.to_owned()))
}

async fn decrypt_optional<C: CalendarCrypto>(
    crypto: &C,
    card: Option<&CalendarCard>,
    public_keys: &[C::PublicKey],
    session_key: Option<&SessionKey>,
) -> ServiceResult<Option<String>> {
    match card {
        Some(card) => decrypt_encrypted(crypto, card, public_keys, session_key)
            .await
            .map(Some),
        None => Ok(None),
    }
}

async fn decrypt_encrypted<C: CalendarCrypto>(
    crypto: &C,
    card: &CalendarCard,
    public_keys: &[C::PublicKey],
    session_key: Option<&SessionKey>,
) -> ServiceResult<String> {
    let signature = card_signature(card)?;
    let ciphertext = BASE64.decode(&card.data)?;
    decrypt_card(crypto, &ciphertext, signature, public_keys, session_key).await
}

/// A protected card without a signature cannot verify.
pub(super) fn card_signature(card: &CalendarCard) -> ServiceResult<&str> {
    match card.signature.as_deref() {
        Some(signature) if !signature.is_empty() => Ok(signature),
        _ => {
            tracing::warn!(author = %card.author, "Protected card has no signature");
            Err(ServiceError::SignatureError)
        }
    }
}
