//! Per-session signing state exchanged during the two-round signing
//! protocol.

use crate::types::{party::PartyIndex, SecretString};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A party's own commitment material for one signing session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XShare {
    pub i: PartyIndex,
    /// The wallet's aggregate public key.
    pub y: String,
    pub x: SecretString,
    /// The party's share of its own signing nonce.
    pub r: SecretString,
    /// The party's nonce commitment.
    #[serde(rename = "R")]
    pub r_commitment: String,
}

/// A nonce share produced by party `i` and addressed to party `j`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RShare {
    pub i: PartyIndex,
    pub j: PartyIndex,
    pub r: SecretString,
    #[serde(rename = "R")]
    pub r_commitment: String,
}

/// Ephemeral state of one signing attempt: the signer's [`XShare`] and the
/// [`RShare`]s it addresses to each counterparty, keyed by counterparty
/// index. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignShare {
    pub x_share: XShare,
    pub r_shares: BTreeMap<PartyIndex, RShare>,
}

/// The partial signature of party `i`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GShare {
    pub i: PartyIndex,
    pub y: String,
    pub gamma: String,
    /// The aggregate nonce commitment of the signing set.
    #[serde(rename = "R")]
    pub r_commitment: String,
}

/// A combined threshold signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    /// Public key the signature verifies under.
    pub y: String,
    #[serde(rename = "R")]
    pub r_commitment: String,
    pub sigma: String,
}

impl Signature {
    /// Hex encoding of `R ++ sigma`, the form handed to broadcasters.
    pub fn to_hex(&self) -> String {
        format!("{}{}", self.r_commitment, self.sigma)
    }
}
