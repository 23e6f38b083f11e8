//! Transaction requests owned by the remote coordination service.

use crate::types::party::{Direction, Role};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a pending transaction request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxRequestId(String);

impl TxRequestId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TxRequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TxRequestId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for TxRequestId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Identifier of a wallet on the coordination service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WalletId(String);

impl WalletId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WalletId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WalletId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for WalletId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnsignedTx {
    pub signable_hex: String,
    pub serialized_tx_hex: String,
}

/// A directed share payload exchanged between two roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureShareRecord {
    pub from: Role,
    pub to: Role,
    pub share: String,
}

impl SignatureShareRecord {
    pub fn new(direction: Direction, share: String) -> Self {
        Self {
            from: direction.sender(),
            to: direction.recipient(),
            share,
        }
    }

    /// `None` if the record claims to travel from a role to itself.
    pub fn direction(&self) -> Option<Direction> {
        Direction::between(self.from, self.to)
    }
}

/// One pending transaction intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxRequest {
    pub tx_request_id: TxRequestId,
    #[serde(default)]
    pub unsigned_txs: Vec<UnsignedTx>,
    #[serde(default)]
    pub signature_shares: Vec<SignatureShareRecord>,
}

/// Response body of a transaction request lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxRequestList {
    pub tx_requests: Vec<TxRequest>,
}
