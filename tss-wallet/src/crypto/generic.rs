use chacha20poly1305::{
    aead::{Aead, Payload},
    AeadCore, ChaCha20Poly1305, KeyInit, Nonce,
};
use hkdf::Hkdf;
use rand::{CryptoRng, RngCore};
use sha3::Sha3_256;
use thiserror::Error;
use tracing::error;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Length in bytes of a ChaCha20Poly1305 nonce.
pub(super) const NONCE_LENGTH: usize = 12;

/// Errors that arise in the cryptography module.
#[derive(Debug, Clone, Error)]
pub enum CryptoError {
    #[error("Encryption failed")]
    EncryptionFailed,
    #[error("Decryption failed")]
    DecryptionFailed,
    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(hkdf::InvalidLength),
    #[error("Passphrase hashing failed: {0}")]
    PassphraseHashFailed(argon2::Error),
    #[error("Conversion error")]
    ConversionError,
    #[error("Invalid armored message: {0}")]
    InvalidArmor(String),
    #[error("Invalid scalar encoding")]
    InvalidScalar,
    #[error("Invalid point encoding")]
    InvalidPoint,
    #[error("Invalid share: {0}")]
    InvalidShare(String),
    #[error("Signature did not verify")]
    VerificationFailed,

    // Wrapped errors
    #[error(transparent)]
    Base64(#[from] base64::DecodeError),
    #[error(transparent)]
    Hex(#[from] hex::FromHexError),
}

/// The associated data bound into AEAD ciphertexts and key derivations.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(super) struct AssociatedData(Vec<u8>);

impl Default for AssociatedData {
    fn default() -> Self {
        Self(b"TSS wallet version 0.3.".to_vec())
    }
}

impl<'a> From<&'a AssociatedData> for &'a [u8] {
    fn from(associated_data: &'a AssociatedData) -> Self {
        associated_data.0.as_ref()
    }
}

impl AssociatedData {
    pub(super) fn new() -> Self {
        Self::default()
    }

    pub(super) fn with_str(self, ad: &str) -> Self {
        self.with_bytes(ad.bytes())
    }

    pub(super) fn with_bytes(self, ad: impl IntoIterator<Item = u8>) -> Self {
        AssociatedData(self.0.into_iter().chain(ad).collect())
    }
}

/// A ChaCha20Poly1305 ciphertext together with the nonce it was sealed under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct Sealed {
    pub(super) nonce: [u8; NONCE_LENGTH],
    pub(super) ciphertext: Vec<u8>,
}

/// A symmetric key for the
/// [ChaCha20Poly1305 scheme](https://www.rfc-editor.org/rfc/rfc8439).
#[derive(Zeroize, ZeroizeOnDrop)]
pub(super) struct EncryptionKey([u8; 32]);

impl std::fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("EncryptionKey(REDACTED)")
    }
}

impl EncryptionKey {
    pub(super) fn from_bytes(key_material: [u8; 32]) -> Self {
        Self(key_material)
    }

    /// Derive a key from shared input key material with HKDF, using the
    /// associated data as extra info.
    pub(super) fn derive(
        input_key_material: &[u8],
        context: &AssociatedData,
    ) -> Result<Self, CryptoError> {
        let mut key_material = [0u8; 32];
        Hkdf::<Sha3_256>::new(None, input_key_material)
            .expand(context.into(), &mut key_material)
            // Only a length mismatch can fail here, and the length is fixed.
            .map_err(|e| {
                error!("HKDF failed unexpectedly. {:?}", e);
                CryptoError::KeyDerivationFailed(e)
            })?;
        Ok(Self(key_material))
    }

    pub(super) fn seal(
        &self,
        rng: &mut (impl CryptoRng + RngCore),
        plaintext: &[u8],
        associated_data: &AssociatedData,
    ) -> Result<Sealed, CryptoError> {
        let cipher = ChaCha20Poly1305::new(&self.0.into());
        let nonce = ChaCha20Poly1305::generate_nonce(rng);
        let payload = Payload {
            msg: plaintext,
            aad: associated_data.into(),
        };

        let ciphertext = cipher
            .encrypt(&nonce, payload)
            .map_err(|_| CryptoError::EncryptionFailed)?;

        Ok(Sealed {
            nonce: nonce.into(),
            ciphertext,
        })
    }

    pub(super) fn open(
        &self,
        sealed: &Sealed,
        associated_data: &AssociatedData,
    ) -> Result<Vec<u8>, CryptoError> {
        let cipher = ChaCha20Poly1305::new(&self.0.into());
        let payload = Payload {
            msg: &sealed.ciphertext,
            aad: associated_data.into(),
        };

        cipher
            .decrypt(Nonce::from_slice(&sealed.nonce), payload)
            .map_err(|_| CryptoError::DecryptionFailed)
    }
}
