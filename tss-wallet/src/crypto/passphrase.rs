//! Passphrase encryption for locally stored private shares.

use super::{
    generic::{AssociatedData, EncryptionKey, Sealed, NONCE_LENGTH},
    CryptoError,
};
use argon2::Argon2;
use base64::{engine::general_purpose, Engine};
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

const SALT_LENGTH: usize = 16;

/// The JSON envelope stored as a keychain's `encryptedPrv`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct PassphraseEnvelope {
    salt: String,
    nonce: String,
    ciphertext: String,
}

fn context() -> AssociatedData {
    AssociatedData::new().with_str("TSS passphrase-encrypted private share")
}

fn derive_key(passphrase: &str, salt: &[u8]) -> Result<EncryptionKey, CryptoError> {
    let mut key_material = [0u8; 32];
    // Argon2 with default parameters
    Argon2::default()
        .hash_password_into(passphrase.as_bytes(), salt, &mut key_material)
        .map_err(CryptoError::PassphraseHashFailed)?;
    let key = EncryptionKey::from_bytes(key_material);
    key_material.zeroize();
    Ok(key)
}

pub fn encrypt_with_passphrase(
    rng: &mut (impl CryptoRng + RngCore),
    passphrase: &str,
    plaintext: &[u8],
) -> Result<String, CryptoError> {
    let mut salt = [0u8; SALT_LENGTH];
    rng.fill_bytes(&mut salt);

    let key = derive_key(passphrase, &salt)?;
    let sealed = key.seal(rng, plaintext, &context())?;

    let envelope = PassphraseEnvelope {
        salt: general_purpose::STANDARD.encode(salt),
        nonce: general_purpose::STANDARD.encode(sealed.nonce),
        ciphertext: general_purpose::STANDARD.encode(&sealed.ciphertext),
    };
    serde_json::to_string(&envelope).map_err(|_| CryptoError::ConversionError)
}

/// Fails with [`CryptoError::DecryptionFailed`] if the passphrase is wrong.
pub fn decrypt_with_passphrase(passphrase: &str, encrypted: &str) -> Result<Vec<u8>, CryptoError> {
    let envelope: PassphraseEnvelope =
        serde_json::from_str(encrypted).map_err(|_| CryptoError::ConversionError)?;

    let salt = general_purpose::STANDARD.decode(envelope.salt)?;
    let nonce: [u8; NONCE_LENGTH] = general_purpose::STANDARD
        .decode(envelope.nonce)?
        .try_into()
        .map_err(|_| CryptoError::ConversionError)?;
    let ciphertext = general_purpose::STANDARD.decode(envelope.ciphertext)?;

    let key = derive_key(passphrase, &salt)?;
    key.open(&Sealed { nonce, ciphertext }, &context())
}
