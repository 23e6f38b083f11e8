//! The per-transaction, two-round signing protocol between the user and the
//! operating service.
//!
//! A signing attempt moves through the states of [`SigningState`]:
//! ```text
//! Fetched -> UserSignShareCreated -> RShareOffered -> BitgoRShareReceived
//!         -> UserToBitgoGShareCreated -> GShareSent -> Sent
//! ```
//! Any failure ends the attempt in [`SigningState::Failed`]. Each step is
//! also callable on its own.

use crate::{
    config::Config,
    remote::{HttpCoordinationClient, RemoteCoordinationClient},
    Result, TssWalletClientError,
};
use rand::{rngs::StdRng, SeedableRng};
use std::{fmt, sync::Arc};
use tokio::sync::Mutex;
use tracing::{error, field, info, info_span, instrument};
use tracing_futures::Instrument;
use tss_wallet::{
    constants::SHARE_COMPONENT_LENGTH,
    crypto::{Ed25519ShareCrypto, ShareCrypto},
    infrastructure::logging::record_field,
    types::{
        key_share::PShare,
        party::{Direction, PartyIndex, Role},
        signing::{GShare, RShare, SignShare},
        tx_request::{SignatureShareRecord, TxRequest, TxRequestId, WalletId},
        SecretString,
    },
    validation::{is_directed, is_own_share, is_r_share_directed},
};
use uuid::Uuid;

/// The parties taking part in every user-initiated signature.
const SIGNERS: [PartyIndex; 2] = [PartyIndex::USER, PartyIndex::BITGO];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SigningState {
    Fetched,
    UserSignShareCreated,
    RShareOffered,
    BitgoRShareReceived,
    UserToBitgoGShareCreated,
    GShareSent,
    Sent,
    Failed(String),
}

/// Identifies one caller-level operation across every log line it produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTracer(Uuid);

impl RequestTracer {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestTracer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestTracer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A transaction request to sign, given either by id or already fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxRequestRef {
    Id(TxRequestId),
    Request(TxRequest),
}

impl From<TxRequestId> for TxRequestRef {
    fn from(id: TxRequestId) -> Self {
        Self::Id(id)
    }
}

impl From<&str> for TxRequestRef {
    fn from(id: &str) -> Self {
        Self::Id(TxRequestId::from(id))
    }
}

impl From<TxRequest> for TxRequestRef {
    fn from(tx_request: TxRequest) -> Self {
        Self::Request(tx_request)
    }
}

fn transition(state: SigningState) {
    record_field("state", &state);
    match &state {
        SigningState::Failed(reason) => error!(%reason, "Signing failed"),
        _ => info!(?state, "Signing state changed"),
    }
}

pub struct SigningCoordinator<R, C = Ed25519ShareCrypto> {
    pub(crate) remote: Arc<R>,
    pub(crate) coin: String,
    pub(crate) wallet_id: WalletId,
    crypto: C,
    rng: Arc<Mutex<StdRng>>,
}

impl<R> SigningCoordinator<R>
where
    R: RemoteCoordinationClient,
{
    pub fn new(remote: Arc<R>, coin: impl Into<String>, wallet_id: WalletId) -> Self {
        Self::with_provider(
            remote,
            coin,
            wallet_id,
            Ed25519ShareCrypto,
            StdRng::from_entropy(),
        )
    }

    /// Deterministic randomness, for tests only.
    pub fn with_seed(
        remote: Arc<R>,
        coin: impl Into<String>,
        wallet_id: WalletId,
        seed: u64,
    ) -> Self {
        Self::with_provider(
            remote,
            coin,
            wallet_id,
            Ed25519ShareCrypto,
            StdRng::seed_from_u64(seed),
        )
    }
}

impl SigningCoordinator<HttpCoordinationClient> {
    /// Coordinator for the wallet named in `config`.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Arc::new(HttpCoordinationClient::new(config)),
            config.coin.clone(),
            config.wallet_id.clone(),
        )
    }
}

impl<R, C> SigningCoordinator<R, C>
where
    R: RemoteCoordinationClient,
    C: ShareCrypto,
{
    pub fn with_provider(
        remote: Arc<R>,
        coin: impl Into<String>,
        wallet_id: WalletId,
        crypto: C,
        rng: StdRng,
    ) -> Self {
        Self {
            remote,
            coin: coin.into(),
            wallet_id,
            crypto,
            rng: Arc::new(Mutex::new(rng)),
        }
    }

    pub fn wallet_id(&self) -> &WalletId {
        &self.wallet_id
    }

    /// Run every signing step for `tx_request` and return the request as
    /// the service holds it afterwards.
    ///
    /// Given an id the request is fetched first; given a request object that
    /// fetch is skipped.
    pub async fn sign_tx_request(
        &self,
        tx_request: impl Into<TxRequestRef>,
        user_p_share: &PShare,
        tracer: &RequestTracer,
    ) -> Result<TxRequest> {
        let span = info_span!(
            "sign_tx_request",
            trace_id = %tracer,
            tx_request_id = field::Empty,
            state = field::Empty,
        );
        let tx_request = tx_request.into();

        async move {
            let result = self.run_signing(tx_request, user_p_share).await;
            if let Err(e) = &result {
                transition(SigningState::Failed(e.to_string()));
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn run_signing(
        &self,
        tx_request: TxRequestRef,
        user_p_share: &PShare,
    ) -> Result<TxRequest> {
        let tx_request = match tx_request {
            TxRequestRef::Id(id) => {
                record_field("tx_request_id", &id.as_str());
                self.get_tx_request(&id).await?
            }
            TxRequestRef::Request(tx_request) => {
                record_field("tx_request_id", &tx_request.tx_request_id.as_str());
                tx_request
            }
        };
        transition(SigningState::Fetched);

        let id = &tx_request.tx_request_id;
        let unsigned_tx = tx_request
            .unsigned_txs
            .first()
            .ok_or_else(|| TssWalletClientError::MissingUnsignedTx(id.to_string()))?;
        let signable = hex::decode(&unsigned_tx.signable_hex)?;

        let user_sign_share = self.create_user_sign_share(&signable, user_p_share).await?;
        transition(SigningState::UserSignShareCreated);

        self.offer_user_to_bitgo_r_share(id, &user_sign_share).await?;
        transition(SigningState::RShareOffered);

        let bitgo_to_user_r_share = self.get_bitgo_to_user_r_share(id).await?;
        transition(SigningState::BitgoRShareReceived);

        let g_share = self.create_user_to_bitgo_g_share(
            &user_sign_share,
            &bitgo_to_user_r_share,
            &signable,
        )?;
        transition(SigningState::UserToBitgoGShareCreated);

        self.send_user_to_bitgo_g_share(id, &g_share).await?;
        transition(SigningState::GShareSent);

        self.send_tx_request(id).await?;
        transition(SigningState::Sent);

        self.get_tx_request(id).await
    }

    /// Fetch the latest version of a transaction request.
    #[instrument(skip_all, fields(tx_request_id = %tx_request_id))]
    pub async fn get_tx_request(&self, tx_request_id: &TxRequestId) -> Result<TxRequest> {
        let tx_requests = self
            .remote
            .get_tx_requests(&self.wallet_id, tx_request_id, true)
            .await?
            .tx_requests;

        tx_requests
            .into_iter()
            .next()
            .ok_or_else(|| TssWalletClientError::TxRequestNotFound(tx_request_id.to_string()))
    }

    /// Start a signing session for the user with the service as counterparty.
    ///
    /// Fails before any randomness is drawn if `user_p_share` is not the
    /// user's.
    #[instrument(skip_all)]
    pub async fn create_user_sign_share(
        &self,
        signable: &[u8],
        user_p_share: &PShare,
    ) -> Result<SignShare> {
        if !is_own_share(user_p_share, PartyIndex::USER) {
            error!(index = %user_p_share.i, "PShare is not the user's");
            return Err(TssWalletClientError::PShareNotOwned);
        }

        let mut rng = self.rng.lock().await;
        Ok(self
            .crypto
            .sign_share(&mut *rng, signable, user_p_share, &SIGNERS)?)
    }

    /// Post the user's nonce share for the service as `r ++ R`.
    #[instrument(skip_all, fields(tx_request_id = %tx_request_id))]
    pub async fn offer_user_to_bitgo_r_share(
        &self,
        tx_request_id: &TxRequestId,
        user_sign_share: &SignShare,
    ) -> Result<()> {
        let r_share = user_sign_share
            .r_shares
            .get(&PartyIndex::BITGO)
            .ok_or(TssWalletClientError::RShareNotFound)?;
        if !is_r_share_directed(r_share, PartyIndex::USER, PartyIndex::BITGO) {
            error!(i = %r_share.i, j = %r_share.j, "RShare is not from user to bitgo");
            return Err(TssWalletClientError::RShareNotUserToBitgo);
        }

        let record = SignatureShareRecord::new(
            Direction::UserToBitgo,
            format!("{}{}", r_share.r.expose(), r_share.r_commitment),
        );
        let _ = self.send_signature_share(tx_request_id, &record).await?;
        Ok(())
    }

    /// Fetch the service's reply to the user's offer.
    #[instrument(skip_all, fields(tx_request_id = %tx_request_id))]
    pub async fn get_bitgo_to_user_r_share(
        &self,
        tx_request_id: &TxRequestId,
    ) -> Result<SignatureShareRecord> {
        let tx_request = self.get_tx_request(tx_request_id).await?;
        if tx_request.signature_shares.is_empty() {
            return Err(TssWalletClientError::NoSignatureShares(
                tx_request_id.to_string(),
            ));
        }

        tx_request
            .signature_shares
            .into_iter()
            .find(|record| is_directed(record, Role::Bitgo, Role::User))
            .ok_or_else(|| {
                TssWalletClientError::BitgoToUserRShareNotFound(tx_request_id.to_string())
            })
    }

    /// Compute the user's partial signature from its own session state and
    /// the service's `bitgo -> user` nonce share.
    #[instrument(skip_all)]
    pub fn create_user_to_bitgo_g_share(
        &self,
        user_sign_share: &SignShare,
        bitgo_to_user_r_share: &SignatureShareRecord,
        signable: &[u8],
    ) -> Result<GShare> {
        if !is_own_share(&user_sign_share.x_share, PartyIndex::USER) {
            error!(index = %user_sign_share.x_share.i, "XShare is not the user's");
            return Err(TssWalletClientError::XShareNotOwned);
        }
        if !is_directed(bitgo_to_user_r_share, Role::Bitgo, Role::User) {
            error!(
                from = %bitgo_to_user_r_share.from,
                to = %bitgo_to_user_r_share.to,
                "RShare is not from bitgo to user"
            );
            return Err(TssWalletClientError::RShareNotBitgoToUser);
        }

        let r_share = parse_bitgo_to_user_r_share(&bitgo_to_user_r_share.share)?;
        Ok(self
            .crypto
            .sign(signable, &user_sign_share.x_share, &[r_share])?)
    }

    /// Post the user's partial signature as `R ++ gamma`.
    #[instrument(skip_all, fields(tx_request_id = %tx_request_id))]
    pub async fn send_user_to_bitgo_g_share(
        &self,
        tx_request_id: &TxRequestId,
        g_share: &GShare,
    ) -> Result<()> {
        if !is_own_share(g_share, PartyIndex::USER) {
            error!(index = %g_share.i, "GShare is not the user's");
            return Err(TssWalletClientError::GShareNotOwned);
        }

        let record = SignatureShareRecord::new(
            Direction::UserToBitgo,
            format!("{}{}", g_share.r_commitment, g_share.gamma),
        );
        let _ = self.send_signature_share(tx_request_id, &record).await?;
        Ok(())
    }

    /// Ask the service to combine the signature and broadcast the
    /// transaction.
    #[instrument(skip_all, fields(tx_request_id = %tx_request_id))]
    pub async fn send_tx_request(&self, tx_request_id: &TxRequestId) -> Result<()> {
        self.remote
            .post_tx_send(&self.coin, &self.wallet_id, tx_request_id)
            .await?;
        info!("Transaction request sent");
        Ok(())
    }

    /// Post any directed share record and return it as stored.
    pub async fn send_signature_share(
        &self,
        tx_request_id: &TxRequestId,
        record: &SignatureShareRecord,
    ) -> Result<SignatureShareRecord> {
        Ok(self
            .remote
            .post_signature_share(&self.wallet_id, tx_request_id, record)
            .await?)
    }
}

/// Split a `bitgo -> user` share payload `r ++ R` into the service's
/// [`RShare`] for the user.
fn parse_bitgo_to_user_r_share(share: &str) -> Result<RShare> {
    let bytes = hex::decode(share)?;
    if bytes.len() != 2 * SHARE_COMPONENT_LENGTH {
        return Err(TssWalletClientError::MalformedSignatureShare(format!(
            "expected {} bytes, got {}",
            2 * SHARE_COMPONENT_LENGTH,
            bytes.len()
        )));
    }
    let (r, r_commitment) = bytes.split_at(SHARE_COMPONENT_LENGTH);

    Ok(RShare {
        i: PartyIndex::BITGO,
        j: PartyIndex::USER,
        r: SecretString::new(hex::encode(r)),
        r_commitment: hex::encode(r_commitment),
    })
}
