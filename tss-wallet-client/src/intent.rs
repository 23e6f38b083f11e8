//! Creating transaction requests from payment intents.

use crate::{
    remote::RemoteCoordinationClient, signing::SigningCoordinator, Result, TssWalletClientError,
};
use tracing::{info, instrument};
use tss_wallet::{
    crypto::ShareCrypto,
    types::{
        intent::{IntentRequest, PrebuildParams, Recipient},
        tx_request::TxRequest,
    },
};

impl<R, C> SigningCoordinator<R, C>
where
    R: RemoteCoordinationClient,
    C: ShareCrypto,
{
    /// Ask the service to build a transaction request for `params`.
    ///
    /// Parameters are checked before anything is sent: there must be at least
    /// one recipient and every amount must be a base-10 integer string.
    #[instrument(skip_all, fields(coin = %self.coin, wallet_id = %self.wallet_id))]
    pub async fn prebuild_tx_with_intent(&self, params: &PrebuildParams) -> Result<TxRequest> {
        check_recipients(&params.recipients)?;

        let intent = IntentRequest::from_params(params, &self.coin);
        let tx_request = self
            .remote
            .post_tx_request_create(&self.wallet_id, &intent)
            .await?;

        info!(tx_request_id = %tx_request.tx_request_id, "Created transaction request");
        Ok(tx_request)
    }
}

fn check_recipients(recipients: &[Recipient]) -> Result<()> {
    if recipients.is_empty() {
        return Err(TssWalletClientError::InvalidIntent(
            "at least one recipient is required".to_string(),
        ));
    }

    for recipient in recipients {
        let amount = &recipient.amount;
        if amount.is_empty() || !amount.bytes().all(|b| b.is_ascii_digit()) {
            return Err(TssWalletClientError::InvalidIntent(format!(
                "amount {amount:?} for {} is not a base-10 integer",
                recipient.address
            )));
        }
    }

    Ok(())
}
