//! Encryption of key share components for a recipient's transport key.
//!
//! A message is sealed under a key derived from an ephemeral-static
//! Diffie-Hellman exchange on edwards25519 and armored as base64 text so it
//! can travel inside JSON request bodies.

use super::{
    generic::{AssociatedData, EncryptionKey, Sealed, NONCE_LENGTH},
    CryptoError, ShareTransportCrypto,
};
use base64::{engine::general_purpose, Engine};
use curve25519_dalek::{
    edwards::{CompressedEdwardsY, EdwardsPoint},
    Scalar,
};
use rand::{CryptoRng, RngCore};
use zeroize::{Zeroize, ZeroizeOnDrop};

const MESSAGE_LABEL: &str = "TSS SHARE MESSAGE";
const PUBLIC_KEY_LABEL: &str = "TSS PUBLIC KEY";
const LINE_WIDTH: usize = 64;
const POINT_LENGTH: usize = 32;

/// Public half of a transport key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportPublicKey(EdwardsPoint);

impl TransportPublicKey {
    pub fn to_bytes(&self) -> [u8; POINT_LENGTH] {
        self.0.compress().to_bytes()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let bytes: [u8; POINT_LENGTH] = bytes.try_into().map_err(|_| CryptoError::InvalidPoint)?;
        let point = CompressedEdwardsY(bytes)
            .decompress()
            .ok_or(CryptoError::InvalidPoint)?;
        if point.is_small_order() {
            return Err(CryptoError::InvalidPoint);
        }
        Ok(Self(point))
    }

    pub fn to_armored(&self) -> String {
        armor(PUBLIC_KEY_LABEL, &self.to_bytes())
    }

    pub fn from_armored(armored: &str) -> Result<Self, CryptoError> {
        Self::from_bytes(&dearmor(PUBLIC_KEY_LABEL, armored)?)
    }
}

/// A transport key pair. The secret scalar is zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct TransportKeyPair {
    secret: Scalar,
    #[zeroize(skip)]
    public: TransportPublicKey,
}

impl std::fmt::Debug for TransportKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportKeyPair")
            .field("secret", &"REDACTED")
            .field("public", &self.public)
            .finish()
    }
}

impl TransportKeyPair {
    pub fn generate(rng: &mut (impl CryptoRng + RngCore)) -> Self {
        let secret = super::random_scalar(rng);
        let public = TransportPublicKey(EdwardsPoint::mul_base(&secret));
        Self { secret, public }
    }

    pub fn public_key(&self) -> &TransportPublicKey {
        &self.public
    }
}

/// The bundled [`ShareTransportCrypto`] provider.
#[derive(Debug, Clone, Copy, Default)]
pub struct EciesShareTransport;

impl EciesShareTransport {
    fn context(ephemeral: &[u8], recipient: &[u8]) -> AssociatedData {
        AssociatedData::new()
            .with_str("TSS share transport")
            .with_bytes(ephemeral.iter().copied())
            .with_bytes(recipient.iter().copied())
    }
}

impl ShareTransportCrypto for EciesShareTransport {
    type PublicKey = TransportPublicKey;
    type SecretKey = TransportKeyPair;

    fn generate_key_pair(&self, rng: &mut (impl CryptoRng + RngCore)) -> Self::SecretKey {
        TransportKeyPair::generate(rng)
    }

    fn public_key(&self, secret_key: &Self::SecretKey) -> Self::PublicKey {
        *secret_key.public_key()
    }

    fn armor_public_key(&self, public_key: &Self::PublicKey) -> String {
        public_key.to_armored()
    }

    fn parse_public_key(&self, armored: &str) -> Result<Self::PublicKey, CryptoError> {
        TransportPublicKey::from_armored(armored)
    }

    fn encrypt(
        &self,
        rng: &mut (impl CryptoRng + RngCore),
        plaintext: &[u8],
        receiver_pk: &Self::PublicKey,
    ) -> Result<String, CryptoError> {
        let ephemeral = TransportKeyPair::generate(rng);
        let ephemeral_bytes = ephemeral.public.to_bytes();
        let receiver_bytes = receiver_pk.to_bytes();

        let mut shared = (ephemeral.secret * receiver_pk.0).compress().to_bytes();
        let context = Self::context(&ephemeral_bytes, &receiver_bytes);
        let key = EncryptionKey::derive(&shared, &context);
        shared.zeroize();

        let sealed = key?.seal(rng, plaintext, &context)?;
        let message: Vec<u8> = ephemeral_bytes
            .into_iter()
            .chain(sealed.nonce)
            .chain(sealed.ciphertext)
            .collect();

        Ok(armor(MESSAGE_LABEL, &message))
    }

    fn decrypt(
        &self,
        ciphertext: &str,
        receiver_sk: &Self::SecretKey,
    ) -> Result<Vec<u8>, CryptoError> {
        let message = dearmor(MESSAGE_LABEL, ciphertext)?;
        if message.len() < POINT_LENGTH + NONCE_LENGTH {
            return Err(CryptoError::InvalidArmor("message too short".to_string()));
        }
        let (ephemeral_bytes, rest) = message.split_at(POINT_LENGTH);
        let (nonce, ciphertext) = rest.split_at(NONCE_LENGTH);

        let ephemeral = TransportPublicKey::from_bytes(ephemeral_bytes)?;
        let receiver_bytes = receiver_sk.public.to_bytes();

        let mut shared = (receiver_sk.secret * ephemeral.0).compress().to_bytes();
        let context = Self::context(ephemeral_bytes, &receiver_bytes);
        let key = EncryptionKey::derive(&shared, &context);
        shared.zeroize();

        let sealed = Sealed {
            nonce: nonce.try_into().map_err(|_| CryptoError::ConversionError)?,
            ciphertext: ciphertext.to_vec(),
        };
        key?.open(&sealed, &context)
    }
}

fn armor(label: &str, bytes: &[u8]) -> String {
    let encoded = general_purpose::STANDARD.encode(bytes);
    let mut armored = format!("-----BEGIN {label}-----\n");
    for line in encoded.as_bytes().chunks(LINE_WIDTH) {
        // base64 output is ASCII
        armored.push_str(&String::from_utf8_lossy(line));
        armored.push('\n');
    }
    armored.push_str(&format!("-----END {label}-----\n"));
    armored
}

fn dearmor(label: &str, armored: &str) -> Result<Vec<u8>, CryptoError> {
    let header = format!("-----BEGIN {label}-----");
    let footer = format!("-----END {label}-----");

    let body = armored
        .trim()
        .strip_prefix(&header)
        .and_then(|rest| rest.strip_suffix(&footer))
        .ok_or_else(|| CryptoError::InvalidArmor(format!("expected {label} block")))?;
    let encoded: String = body.split_whitespace().collect();

    Ok(general_purpose::STANDARD.decode(encoded)?)
}
