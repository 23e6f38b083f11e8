//! Threshold Ed25519 over Shamir-shared secrets.
//!
//! Every party Shamir-shares a random secret to its peers during key
//! generation; the wallet key is the sum of those secrets. Signing repeats
//! the construction for the nonce, so that interpolating the partial
//! signatures of any `t` parties yields a standard Ed25519 signature.

use super::{
    point_from_hex, point_to_hex, random_scalar, scalar_from_hex, scalar_to_hex, CryptoError,
    ShareCrypto,
};
use crate::types::{
    key_share::{CombinedKey, KeyShare, PShare, UShare, YShare},
    party::PartyIndex,
    signing::{GShare, RShare, SignShare, Signature, XShare},
    SecretString,
};
use curve25519_dalek::{EdwardsPoint, Scalar};
use rand::{CryptoRng, RngCore};
use sha2::{Digest, Sha512};
use std::collections::{BTreeMap, BTreeSet};
use tracing::error;
use zeroize::{Zeroize, ZeroizeOnDrop};

const PREFIX_LENGTH: usize = 32;

/// The bundled [`ShareCrypto`] provider.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ed25519ShareCrypto;

/// A polynomial over the Ed25519 scalar field, lowest coefficient first.
#[derive(Zeroize, ZeroizeOnDrop)]
struct Polynomial(Vec<Scalar>);

impl Polynomial {
    fn random(rng: &mut (impl CryptoRng + RngCore), constant: Scalar, degree: usize) -> Self {
        let coefficients = std::iter::once(constant)
            .chain((0..degree).map(|_| random_scalar(rng)))
            .collect();
        Self(coefficients)
    }

    fn evaluate(&self, index: PartyIndex) -> Scalar {
        let x = Scalar::from(index.get());
        self.0
            .iter()
            .rev()
            .fold(Scalar::ZERO, |acc, coefficient| acc * x + coefficient)
    }
}

/// SHA-512 of the concatenated parts, reduced mod l.
fn hash_to_scalar(parts: &[&[u8]]) -> Scalar {
    let mut hasher = Sha512::new();
    for part in parts {
        hasher.update(part);
    }
    let mut wide = [0u8; 64];
    wide.copy_from_slice(&hasher.finalize());
    Scalar::from_bytes_mod_order_wide(&wide)
}

/// The Ed25519 challenge `H(R || y || message)`.
fn challenge(r_commitment: &[u8], public_key: &[u8], message: &[u8]) -> Scalar {
    hash_to_scalar(&[r_commitment, public_key, message])
}

/// Lagrange coefficient of `index` for interpolation at zero over `indices`.
fn lagrange_coefficient(index: PartyIndex, indices: &[PartyIndex]) -> Scalar {
    let i = Scalar::from(index.get());
    let (numerator, denominator) = indices
        .iter()
        .filter(|&&j| j != index)
        .map(|j| Scalar::from(j.get()))
        .fold((Scalar::ONE, Scalar::ONE), |(num, den), j| {
            (num * j, den * (j - i))
        });
    numerator * denominator.invert()
}

fn check_scheme(index: PartyIndex, threshold: u8, total: u8) -> Result<(), CryptoError> {
    if threshold < 2 || threshold > total || index.get() > total {
        return Err(CryptoError::InvalidShare(format!(
            "party {index} cannot hold a {threshold}-of-{total} share"
        )));
    }
    Ok(())
}

impl ShareCrypto for Ed25519ShareCrypto {
    fn key_share(
        &self,
        rng: &mut (impl CryptoRng + RngCore),
        index: PartyIndex,
        threshold: u8,
        total: u8,
    ) -> Result<KeyShare, CryptoError> {
        check_scheme(index, threshold, total)?;

        let u = random_scalar(rng);
        let y = point_to_hex(&EdwardsPoint::mul_base(&u));
        let mut prefix = [0u8; PREFIX_LENGTH];
        rng.fill_bytes(&mut prefix);

        let polynomial = Polynomial::random(rng, u, usize::from(threshold - 1));

        let mut y_shares = BTreeMap::new();
        for j in 1..=total {
            let j = PartyIndex::new(j).map_err(|_| CryptoError::ConversionError)?;
            if j == index {
                continue;
            }
            let _ = y_shares.insert(
                j,
                YShare {
                    i: index,
                    j,
                    y: y.clone(),
                    u: SecretString::new(scalar_to_hex(&polynomial.evaluate(j))),
                },
            );
        }

        let u_share = UShare {
            i: index,
            t: threshold,
            n: total,
            y,
            u: SecretString::new(scalar_to_hex(&u)),
            x: SecretString::new(scalar_to_hex(&polynomial.evaluate(index))),
            prefix: SecretString::new(hex::encode(prefix)),
        };
        prefix.zeroize();

        Ok(KeyShare { u_share, y_shares })
    }

    fn key_combine(
        &self,
        u_share: &UShare,
        y_shares: &[YShare],
    ) -> Result<CombinedKey, CryptoError> {
        let mut x = scalar_from_hex(u_share.x.expose())?;
        let mut y = point_from_hex(&u_share.y)?;

        for y_share in y_shares {
            if y_share.j != u_share.i || y_share.i == u_share.i {
                return Err(CryptoError::InvalidShare(format!(
                    "YShare from {} to {} cannot be combined by {}",
                    y_share.i, y_share.j, u_share.i
                )));
            }
            x += scalar_from_hex(y_share.u.expose())?;
            y += point_from_hex(&y_share.y)?;
        }

        let p_share = PShare {
            i: u_share.i,
            t: u_share.t,
            n: u_share.n,
            y: point_to_hex(&y),
            x: SecretString::new(scalar_to_hex(&x)),
            prefix: u_share.prefix.clone(),
        };
        x.zeroize();

        Ok(CombinedKey {
            p_share,
            j_shares: y_shares.iter().map(|y_share| y_share.i).collect(),
        })
    }

    fn sign_share(
        &self,
        rng: &mut (impl CryptoRng + RngCore),
        message: &[u8],
        p_share: &PShare,
        signers: &[PartyIndex],
    ) -> Result<SignShare, CryptoError> {
        check_scheme(p_share.i, p_share.t, p_share.n)?;
        let distinct: BTreeSet<_> = signers.iter().collect();
        if !distinct.contains(&p_share.i)
            || distinct.len() != signers.len()
            || signers.len() < usize::from(p_share.t)
        {
            return Err(CryptoError::InvalidShare(format!(
                "party {} cannot sign with signers {signers:?}",
                p_share.i
            )));
        }

        let mut prefix = hex::decode(p_share.prefix.expose())?;
        let mut entropy = [0u8; 32];
        rng.fill_bytes(&mut entropy);
        let r = hash_to_scalar(&[&prefix, message, &entropy]);
        prefix.zeroize();
        entropy.zeroize();

        let r_commitment = point_to_hex(&EdwardsPoint::mul_base(&r));
        let polynomial = Polynomial::random(rng, r, usize::from(p_share.t - 1));

        let r_shares = signers
            .iter()
            .filter(|&&j| j != p_share.i)
            .map(|&j| {
                let r_share = RShare {
                    i: p_share.i,
                    j,
                    r: SecretString::new(scalar_to_hex(&polynomial.evaluate(j))),
                    r_commitment: r_commitment.clone(),
                };
                (j, r_share)
            })
            .collect();

        let x_share = XShare {
            i: p_share.i,
            y: p_share.y.clone(),
            x: p_share.x.clone(),
            r: SecretString::new(scalar_to_hex(&polynomial.evaluate(p_share.i))),
            r_commitment,
        };

        Ok(SignShare { x_share, r_shares })
    }

    fn sign(
        &self,
        message: &[u8],
        x_share: &XShare,
        r_shares: &[RShare],
    ) -> Result<GShare, CryptoError> {
        let mut r_commitment = point_from_hex(&x_share.r_commitment)?;
        let mut r = scalar_from_hex(x_share.r.expose())?;

        for r_share in r_shares {
            if r_share.j != x_share.i || r_share.i == x_share.i {
                return Err(CryptoError::InvalidShare(format!(
                    "RShare from {} to {} cannot be used by {}",
                    r_share.i, r_share.j, x_share.i
                )));
            }
            r_commitment += point_from_hex(&r_share.r_commitment)?;
            r += scalar_from_hex(r_share.r.expose())?;
        }

        let r_commitment = r_commitment.compress().to_bytes();
        let public_key = hex::decode(&x_share.y)?;
        let k = challenge(&r_commitment, &public_key, message);

        let mut x = scalar_from_hex(x_share.x.expose())?;
        let gamma = r + k * x;
        r.zeroize();
        x.zeroize();

        Ok(GShare {
            i: x_share.i,
            y: x_share.y.clone(),
            gamma: scalar_to_hex(&gamma),
            r_commitment: hex::encode(r_commitment),
        })
    }

    fn sign_combine(&self, g_shares: &[GShare]) -> Result<Signature, CryptoError> {
        let first = g_shares
            .first()
            .ok_or_else(|| CryptoError::InvalidShare("no GShares to combine".to_string()))?;

        let indices: Vec<PartyIndex> = g_shares.iter().map(|g_share| g_share.i).collect();
        if indices.iter().collect::<BTreeSet<_>>().len() != indices.len() {
            return Err(CryptoError::InvalidShare(format!(
                "duplicate GShare indices {indices:?}"
            )));
        }
        if g_shares
            .iter()
            .any(|g_share| g_share.r_commitment != first.r_commitment || g_share.y != first.y)
        {
            return Err(CryptoError::InvalidShare(
                "GShares disagree on R or y".to_string(),
            ));
        }

        let mut sigma = Scalar::ZERO;
        for g_share in g_shares {
            sigma += lagrange_coefficient(g_share.i, &indices) * scalar_from_hex(&g_share.gamma)?;
        }

        Ok(Signature {
            y: first.y.clone(),
            r_commitment: first.r_commitment.clone(),
            sigma: scalar_to_hex(&sigma),
        })
    }

    fn verify(&self, message: &[u8], signature: &Signature) -> Result<(), CryptoError> {
        let r_bytes = hex::decode(&signature.r_commitment)?;
        let y_bytes = hex::decode(&signature.y)?;
        let r_commitment = point_from_hex(&signature.r_commitment)?;
        let public_key = point_from_hex(&signature.y)?;
        let sigma = scalar_from_hex(&signature.sigma)?;

        let k = challenge(&r_bytes, &y_bytes, message);
        if EdwardsPoint::mul_base(&sigma) != r_commitment + k * public_key {
            error!("Combined signature failed to verify");
            return Err(CryptoError::VerificationFailed);
        }
        Ok(())
    }
}
