use thiserror::Error;

use crate::crypto::CryptoError;

#[derive(Debug, Error)]
pub enum TssWalletError {
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error("Invalid party index: {0}")]
    InvalidPartyIndex(String),
    #[error("Keychain {0} has no encrypted private share")]
    MissingEncryptedPrv(String),

    // Wrapped errors
    #[error(transparent)]
    Hex(#[from] hex::FromHexError),
    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),
}
