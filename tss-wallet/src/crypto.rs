//! Cryptographic interfaces consumed by the coordinators, and the providers
//! bundled with this crate.
//!
//! The coordinators only ever see hex-encoded shares. [`ShareCrypto`]
//! performs the threshold arithmetic on them and [`ShareTransportCrypto`]
//! moves secret components between parties. Both take randomness as an
//! explicit argument.

use crate::types::{
    key_share::{CombinedKey, KeyShare, PShare, UShare, YShare},
    party::PartyIndex,
    signing::{GShare, RShare, SignShare, Signature, XShare},
};
use curve25519_dalek::{
    edwards::{CompressedEdwardsY, EdwardsPoint},
    Scalar,
};
use rand::{CryptoRng, RngCore};
use zeroize::Zeroize;

mod eddsa;
mod generic;
mod passphrase;
mod transport;

pub use eddsa::Ed25519ShareCrypto;
pub use generic::CryptoError;
pub use passphrase::{decrypt_with_passphrase, encrypt_with_passphrase};
pub use transport::{EciesShareTransport, TransportKeyPair, TransportPublicKey};

/// Threshold key generation and signing over hex-encoded shares.
pub trait ShareCrypto: Send + Sync {
    /// Generate party `index`'s key share for a `threshold`-of-`total`
    /// scheme.
    fn key_share(
        &self,
        rng: &mut (impl CryptoRng + RngCore),
        index: PartyIndex,
        threshold: u8,
        total: u8,
    ) -> Result<KeyShare, CryptoError>;

    /// Combine a party's own secret component with the public components its
    /// peers addressed to it.
    fn key_combine(&self, u_share: &UShare, y_shares: &[YShare])
        -> Result<CombinedKey, CryptoError>;

    /// Start a signing session over `message` with the given signing set.
    fn sign_share(
        &self,
        rng: &mut (impl CryptoRng + RngCore),
        message: &[u8],
        p_share: &PShare,
        signers: &[PartyIndex],
    ) -> Result<SignShare, CryptoError>;

    /// Compute the caller's partial signature from its own [`XShare`] and the
    /// nonce shares its counterparties addressed to it.
    fn sign(&self, message: &[u8], x_share: &XShare, r_shares: &[RShare])
        -> Result<GShare, CryptoError>;

    fn sign_combine(&self, g_shares: &[GShare]) -> Result<Signature, CryptoError>;

    /// Fails with [`CryptoError::VerificationFailed`] if `signature` does not
    /// verify over `message`.
    fn verify(&self, message: &[u8], signature: &Signature) -> Result<(), CryptoError>;
}

/// Public-key encryption of share components between parties.
pub trait ShareTransportCrypto: Send + Sync {
    type PublicKey: Clone + Send + Sync;
    type SecretKey: Send + Sync;

    fn generate_key_pair(&self, rng: &mut (impl CryptoRng + RngCore)) -> Self::SecretKey;

    fn public_key(&self, secret_key: &Self::SecretKey) -> Self::PublicKey;

    /// Text-safe encoding of a public key, as exchanged with the remote
    /// service.
    fn armor_public_key(&self, public_key: &Self::PublicKey) -> String;

    fn parse_public_key(&self, armored: &str) -> Result<Self::PublicKey, CryptoError>;

    /// Encrypt `plaintext` for the holder of `receiver_pk`, returning an
    /// armored message.
    fn encrypt(
        &self,
        rng: &mut (impl CryptoRng + RngCore),
        plaintext: &[u8],
        receiver_pk: &Self::PublicKey,
    ) -> Result<String, CryptoError>;

    fn decrypt(&self, ciphertext: &str, receiver_sk: &Self::SecretKey)
        -> Result<Vec<u8>, CryptoError>;
}

pub(crate) fn random_scalar(rng: &mut (impl CryptoRng + RngCore)) -> Scalar {
    let mut wide = [0u8; 64];
    rng.fill_bytes(&mut wide);
    let scalar = Scalar::from_bytes_mod_order_wide(&wide);
    wide.zeroize();
    scalar
}

pub(crate) fn scalar_to_hex(scalar: &Scalar) -> String {
    hex::encode(scalar.to_bytes())
}

pub(crate) fn scalar_from_hex(encoded: &str) -> Result<Scalar, CryptoError> {
    let mut bytes: [u8; 32] = hex::decode(encoded)?
        .try_into()
        .map_err(|_| CryptoError::InvalidScalar)?;
    let scalar = Option::<Scalar>::from(Scalar::from_canonical_bytes(bytes));
    bytes.zeroize();
    scalar.ok_or(CryptoError::InvalidScalar)
}

pub(crate) fn point_to_hex(point: &EdwardsPoint) -> String {
    hex::encode(point.compress().to_bytes())
}

pub(crate) fn point_from_hex(encoded: &str) -> Result<EdwardsPoint, CryptoError> {
    let bytes: [u8; 32] = hex::decode(encoded)?
        .try_into()
        .map_err(|_| CryptoError::InvalidPoint)?;
    CompressedEdwardsY(bytes)
        .decompress()
        .ok_or(CryptoError::InvalidPoint)
}
