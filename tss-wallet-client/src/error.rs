use crate::remote::TransportError;
use std::path::PathBuf;
use strum::Display;
use thiserror::Error;
use tss_wallet::{crypto::CryptoError, types::party::Role, TssWalletError};

pub type Result<T> = std::result::Result<T, TssWalletClientError>;

#[derive(Debug, Error)]
pub enum TssWalletClientError {
    // Ownership
    #[error("Invalid PShare, PShare doesnt belong to the User")]
    PShareNotOwned,
    #[error("Invalid XShare, doesnt belong to the User")]
    XShareNotOwned,
    #[error("Invalid GShare, doesnt belong to the User")]
    GShareNotOwned,
    #[error("Invalid KeyShare, doesnt belong to the {}", .0.label())]
    KeyShareNotOwned(Role),

    // Direction
    #[error("userToBitgo RShare not found")]
    RShareNotFound,
    #[error("Invalid RShare, is not from User to Bitgo")]
    RShareNotUserToBitgo,
    #[error("Invalid RShare, is not from Bitgo to User")]
    RShareNotBitgoToUser,
    #[error("Invalid YShare, is not from {} to {}", .from.label(), .to.label())]
    YShareMisdirected { from: Role, to: Role },
    #[error("Missing BitGo to {} key share", .0.label())]
    MissingBitgoKeyShare(Role),

    // Integrity
    #[error("Failed to create {} keychain - commonPubs do not match.", .0)]
    CommonPubMismatch(Role),
    #[error("Bitgo keychain {0} has no commonPub")]
    MissingCommonPub(String),
    #[error("Malformed signature share: {0}")]
    MalformedSignatureShare(String),

    // Not found
    #[error("Unable to find TxRequest with id {0}")]
    TxRequestNotFound(String),
    #[error("No signatures shares found for id: {0}")]
    NoSignatureShares(String),
    #[error("Bitgo to User RShare not found for id: {0}")]
    BitgoToUserRShareNotFound(String),

    // Invalid input
    #[error("TxRequest {0} has no unsigned transactions")]
    MissingUnsignedTx(String),
    #[error("Invalid intent: {0}")]
    InvalidIntent(String),
    #[error("No valid CA certificates found in {0:?}")]
    InvalidCaChain(PathBuf),

    // Wrapped errors
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    TssWallet(#[from] TssWalletError),
    #[error(transparent)]
    Crypto(#[from] CryptoError),
    #[error(transparent)]
    Hex(#[from] hex::FromHexError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    InvalidUri(#[from] http::uri::InvalidUri),
    #[error(transparent)]
    LoggingInit(#[from] tracing_subscriber::util::TryInitError),
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}

/// Coarse classification of [`TssWalletClientError`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ErrorKind {
    /// A share does not belong to the party using it.
    Ownership,
    /// A share travels in the wrong direction for the current step.
    Direction,
    /// Independently derived values disagree, or a payload is malformed.
    Integrity,
    /// The remote service has no record of the requested item yet.
    NotFound,
    /// The remote service could not be reached or rejected the request.
    Transport,
    /// The caller passed unusable arguments or configuration.
    InvalidInput,
    /// A local cryptographic operation failed.
    Crypto,
}

impl TssWalletClientError {
    pub fn kind(&self) -> ErrorKind {
        use TssWalletClientError::*;

        match self {
            PShareNotOwned | XShareNotOwned | GShareNotOwned | KeyShareNotOwned(_) => {
                ErrorKind::Ownership
            }
            RShareNotFound
            | RShareNotUserToBitgo
            | RShareNotBitgoToUser
            | YShareMisdirected { .. }
            | MissingBitgoKeyShare(_) => ErrorKind::Direction,
            CommonPubMismatch(_) | MissingCommonPub(_) | MalformedSignatureShare(_) | Hex(_) => {
                ErrorKind::Integrity
            }
            TxRequestNotFound(_) | NoSignatureShares(_) | BitgoToUserRShareNotFound(_) => {
                ErrorKind::NotFound
            }
            Transport(_) => ErrorKind::Transport,
            MissingUnsignedTx(_) | InvalidIntent(_) | InvalidCaChain(_) | Io(_) | InvalidUri(_)
            | LoggingInit(_) | Toml(_) => ErrorKind::InvalidInput,
            TssWallet(_) | Crypto(_) => ErrorKind::Crypto,
        }
    }

    /// Whether repeating the failed operation may succeed.
    ///
    /// Only lookups that can lag behind a preceding write qualify; callers
    /// should bound their retries. Transport failures are passed through
    /// untouched and left to the caller's policy.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}
