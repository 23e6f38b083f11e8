//! Key shares produced during key generation and the combined signing
//! share derived from them.

use crate::{
    types::{party::PartyIndex, SecretString},
    TssWalletError,
};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, str::FromStr};

/// The private component of a party's key share. Never leaves the generating
/// party unencrypted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UShare {
    pub i: PartyIndex,
    pub t: u8,
    pub n: u8,
    /// Public key of the party's secret.
    pub y: String,
    /// The party's secret.
    pub u: SecretString,
    /// The party's own evaluation of its sharing polynomial.
    pub x: SecretString,
    pub prefix: SecretString,
}

/// A public component of a key share, produced by party `i` for party `j`.
///
/// `y` is the sender's public key. `u` is the sender's secret polynomial
/// evaluated at `j` and must only be consumed by `j`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YShare {
    pub i: PartyIndex,
    pub j: PartyIndex,
    pub y: String,
    pub u: SecretString,
}

/// One party's key share for a wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyShare {
    pub u_share: UShare,
    /// Public components keyed by recipient index.
    pub y_shares: BTreeMap<PartyIndex, YShare>,
}

impl KeyShare {
    /// Index of the party that generated this share.
    pub fn owner(&self) -> PartyIndex {
        self.u_share.i
    }

    /// The public component addressed to `recipient`, if any.
    pub fn y_share_for(&self, recipient: PartyIndex) -> Option<&YShare> {
        self.y_shares.get(&recipient)
    }
}

/// A party's combined private signing share.
///
/// `y` is the wallet's aggregate public key (the common pub).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PShare {
    pub i: PartyIndex,
    pub t: u8,
    pub n: u8,
    pub y: String,
    pub x: SecretString,
    pub prefix: SecretString,
}

impl PShare {
    /// Serialize to the JSON form used for `prv` and for passphrase
    /// encryption.
    pub fn to_json(&self) -> Result<SecretString, TssWalletError> {
        Ok(SecretString::new(serde_json::to_string(self)?))
    }
}

impl FromStr for PShare {
    type Err = TssWalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(serde_json::from_str(s)?)
    }
}

/// Output of combining a party's [`UShare`] with the [`YShare`]s its peers
/// addressed to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombinedKey {
    pub p_share: PShare,
    /// Indices of the peers whose components were combined.
    pub j_shares: Vec<PartyIndex>,
}

impl CombinedKey {
    /// The aggregate public key.
    pub fn common_pub(&self) -> &str {
        &self.p_share.y
    }
}
