//! [`RemoteCoordinationClient`] over HTTPS.

use super::{
    Constants, ConstantsResponse, RemoteCoordinationClient, TransportError, TxSendRequest,
};
use crate::config::Config;
use ::http::{
    header::{AUTHORIZATION, CONTENT_TYPE},
    Method, Request, StatusCode, Uri,
};
use async_trait::async_trait;
use hyper::{client::HttpConnector, Body};
use hyper_rustls::HttpsConnector;
use rustls::{ClientConfig, RootCertStore};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, error};
use tss_wallet::types::{
    intent::IntentRequest,
    keychain::{CreateKeychainParams, Keychain},
    tx_request::{SignatureShareRecord, TxRequest, TxRequestId, TxRequestList, WalletId},
    SecretString,
};
use url::Url;

type HttpsClient = hyper::Client<HttpsConnector<HttpConnector>, Body>;

/// Error body returned by the service with a failure status.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Clone)]
pub struct HttpCoordinationClient {
    server_uri: String,
    access_token: Option<SecretString>,
    client: HttpsClient,
}

impl std::fmt::Debug for HttpCoordinationClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpCoordinationClient")
            .field("server_uri", &self.server_uri)
            .finish_non_exhaustive()
    }
}

impl HttpCoordinationClient {
    pub fn new(config: &Config) -> Self {
        let builder = hyper_rustls::HttpsConnectorBuilder::new();
        let connector = match &config.tls_config {
            Some(tls_config) => builder.with_tls_config(tls_config.clone()),
            // Plain HTTP needs no trust roots.
            None if config.server_uri.scheme_str() == Some("http") => {
                builder.with_tls_config(no_roots_tls_config())
            }
            None => builder.with_native_roots(),
        }
        .https_or_http()
        .enable_http1()
        .enable_http2()
        .build();

        Self {
            server_uri: config.server_uri.to_string().trim_end_matches('/').to_string(),
            access_token: config.access_token.clone(),
            client: hyper::Client::builder().build(connector),
        }
    }

    /// Append `segments` to the server URI and set `query`, percent-encoding
    /// each part.
    fn uri(&self, segments: &[&str], query: &[(&str, &str)]) -> Result<Uri, TransportError> {
        let mut url = Url::parse(&self.server_uri)?;
        url.path_segments_mut()
            .map_err(|_| TransportError::CannotBeABase(self.server_uri.clone()))?
            .pop_if_empty()
            .extend(segments);
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url.as_str().parse()?)
    }

    /// Send a request and return the raw body of a successful response.
    async fn send(
        &self,
        method: Method,
        uri: Uri,
        body: Option<Vec<u8>>,
    ) -> Result<hyper::body::Bytes, TransportError> {
        debug!(%method, %uri, "Sending request to coordination service");

        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = &self.access_token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {}", token.expose()));
        }
        let request = match body {
            Some(body) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body))?,
            None => builder.body(Body::empty())?,
        };

        let response = self.client.request(request).await?;
        let status = response.status();
        let bytes = hyper::body::to_bytes(response.into_body()).await?;

        if !status.is_success() {
            let message = serde_json::from_slice::<ErrorBody>(&bytes)
                .map(|body| body.error)
                .unwrap_or_else(|_| String::from_utf8_lossy(&bytes).into_owned());
            error!(status = status.as_u16(), %message, "Coordination service returned failure");
            return Err(status_error(status, message));
        }

        Ok(bytes)
    }

    async fn get<T: DeserializeOwned>(&self, uri: Uri) -> Result<T, TransportError> {
        let bytes = self.send(Method::GET, uri, None).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        uri: Uri,
        body: &B,
    ) -> Result<T, TransportError> {
        let bytes = self
            .send(Method::POST, uri, Some(serde_json::to_vec(body)?))
            .await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

fn no_roots_tls_config() -> ClientConfig {
    ClientConfig::builder()
        .with_safe_defaults()
        .with_root_certificates(RootCertStore::empty())
        .with_no_client_auth()
}

fn status_error(status: StatusCode, message: String) -> TransportError {
    TransportError::Status {
        status: status.as_u16(),
        message,
    }
}

#[async_trait]
impl RemoteCoordinationClient for HttpCoordinationClient {
    async fn get_constants(&self) -> Result<Constants, TransportError> {
        let response: ConstantsResponse = self
            .get(self.uri(&["api", "v1", "client", "constants"], &[])?)
            .await?;
        Ok(response.constants)
    }

    async fn create_key(
        &self,
        coin: &str,
        params: &CreateKeychainParams,
    ) -> Result<Keychain, TransportError> {
        self.post(self.uri(&["api", "v2", coin, "key"], &[])?, params)
            .await
    }

    async fn get_tx_requests(
        &self,
        wallet_id: &WalletId,
        tx_request_id: &TxRequestId,
        latest: bool,
    ) -> Result<TxRequestList, TransportError> {
        let latest = latest.to_string();
        self.get(self.uri(
            &["api", "v2", "wallet", wallet_id.as_str(), "txrequests"],
            &[("txRequestIds", tx_request_id.as_str()), ("latest", latest.as_str())],
        )?)
        .await
    }

    async fn post_signature_share(
        &self,
        wallet_id: &WalletId,
        tx_request_id: &TxRequestId,
        record: &SignatureShareRecord,
    ) -> Result<SignatureShareRecord, TransportError> {
        self.post(
            self.uri(
                &[
                    "api",
                    "v2",
                    "wallet",
                    wallet_id.as_str(),
                    "txrequests",
                    tx_request_id.as_str(),
                    "signatureshares",
                ],
                &[],
            )?,
            record,
        )
        .await
    }

    async fn post_tx_request_create(
        &self,
        wallet_id: &WalletId,
        intent: &IntentRequest,
    ) -> Result<TxRequest, TransportError> {
        self.post(
            self.uri(&["api", "v2", "wallet", wallet_id.as_str(), "txrequests"], &[])?,
            intent,
        )
        .await
    }

    async fn post_tx_send(
        &self,
        coin: &str,
        wallet_id: &WalletId,
        tx_request_id: &TxRequestId,
    ) -> Result<(), TransportError> {
        let body = TxSendRequest {
            tx_request_id: tx_request_id.clone(),
        };
        // The response body carries nothing the protocol needs.
        let _ = self
            .send(
                Method::POST,
                self.uri(
                    &["api", "v2", coin, "wallet", wallet_id.as_str(), "tx", "send"],
                    &[],
                )?,
                Some(serde_json::to_vec(&body)?),
            )
            .await?;
        Ok(())
    }
}
