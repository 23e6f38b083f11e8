//! The network boundary to the remote coordination service.

mod http;

pub use self::http::HttpCoordinationClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tss_wallet::types::{
    intent::IntentRequest,
    keychain::{CreateKeychainParams, Keychain},
    tx_request::{SignatureShareRecord, TxRequest, TxRequestId, TxRequestList, WalletId},
};

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Request failed with status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("Server URI {0} cannot carry a path")]
    CannotBeABase(String),

    // Wrapped errors
    #[error(transparent)]
    Http(#[from] ::http::Error),
    #[error(transparent)]
    Hyper(#[from] hyper::Error),
    #[error(transparent)]
    InvalidUri(#[from] ::http::uri::InvalidUri),
    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),
    #[error(transparent)]
    Url(#[from] url::ParseError),
}

/// Service-wide constants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constants {
    pub tss: TssConstants,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TssConstants {
    /// Armored transport public key of the operating service.
    pub bitgo_public_key: String,
}

/// Body of the constants endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstantsResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u64>,
    pub constants: Constants,
}

/// Body of a send-transaction-request call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxSendRequest {
    pub tx_request_id: TxRequestId,
}

/// Request/response operations of the remote coordination service.
///
/// Implementations must not retry; failures are reported as
/// [`TransportError`]s and left to the caller.
#[async_trait]
pub trait RemoteCoordinationClient: Send + Sync {
    async fn get_constants(&self) -> Result<Constants, TransportError>;

    async fn create_key(
        &self,
        coin: &str,
        params: &CreateKeychainParams,
    ) -> Result<Keychain, TransportError>;

    async fn get_tx_requests(
        &self,
        wallet_id: &WalletId,
        tx_request_id: &TxRequestId,
        latest: bool,
    ) -> Result<TxRequestList, TransportError>;

    /// Returns the record as stored by the service.
    async fn post_signature_share(
        &self,
        wallet_id: &WalletId,
        tx_request_id: &TxRequestId,
        record: &SignatureShareRecord,
    ) -> Result<SignatureShareRecord, TransportError>;

    async fn post_tx_request_create(
        &self,
        wallet_id: &WalletId,
        intent: &IntentRequest,
    ) -> Result<TxRequest, TransportError>;

    async fn post_tx_send(
        &self,
        coin: &str,
        wallet_id: &WalletId,
        tx_request_id: &TxRequestId,
    ) -> Result<(), TransportError>;
}
