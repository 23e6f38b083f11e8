//! The one-time, three-party key generation ceremony.
//!
//! The user and backup key shares are generated locally. The operating
//! service generates its own share when its keychain is created, combines it
//! with the user and backup components addressed to it, and returns its own
//! components encrypted for the user's transport key. Each local party then
//! combines its share independently and must arrive at the service's
//! `commonPub`.

use crate::{
    config::Config,
    remote::{HttpCoordinationClient, RemoteCoordinationClient},
    Result, TssWalletClientError,
};
use rand::{rngs::StdRng, SeedableRng};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, instrument};
use tss_wallet::{
    constants::{THRESHOLD, TOTAL_SHARES},
    crypto::{
        encrypt_with_passphrase, CryptoError, EciesShareTransport, Ed25519ShareCrypto,
        ShareCrypto, ShareTransportCrypto,
    },
    types::{
        key_share::{CombinedKey, KeyShare, YShare},
        keychain::{CreateKeychainParams, Keychain, KeychainShare},
        party::{PartyIndex, Role},
        SecretString,
    },
    validation::{is_own_share, is_y_share_directed},
};

/// The three keychains produced by a full ceremony.
#[derive(Debug, Clone)]
pub struct Keychains {
    pub user: Keychain,
    pub backup: Keychain,
    pub bitgo: Keychain,
}

pub struct KeychainCoordinator<R, C = Ed25519ShareCrypto, T = EciesShareTransport> {
    remote: Arc<R>,
    coin: String,
    crypto: C,
    transport: T,
    rng: Arc<Mutex<StdRng>>,
}

impl<R> KeychainCoordinator<R>
where
    R: RemoteCoordinationClient,
{
    pub fn new(remote: Arc<R>, coin: impl Into<String>) -> Self {
        Self::with_providers(
            remote,
            coin,
            Ed25519ShareCrypto,
            EciesShareTransport,
            StdRng::from_entropy(),
        )
    }

    /// Deterministic randomness, for tests only.
    pub fn with_seed(remote: Arc<R>, coin: impl Into<String>, seed: u64) -> Self {
        Self::with_providers(
            remote,
            coin,
            Ed25519ShareCrypto,
            EciesShareTransport,
            StdRng::seed_from_u64(seed),
        )
    }
}

impl KeychainCoordinator<HttpCoordinationClient> {
    /// Coordinator for the service and coin named in `config`.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Arc::new(HttpCoordinationClient::new(config)),
            config.coin.clone(),
        )
    }
}

impl<R, C, T> KeychainCoordinator<R, C, T>
where
    R: RemoteCoordinationClient,
    C: ShareCrypto,
    T: ShareTransportCrypto,
{
    pub fn with_providers(
        remote: Arc<R>,
        coin: impl Into<String>,
        crypto: C,
        transport: T,
        rng: StdRng,
    ) -> Self {
        Self {
            remote,
            coin: coin.into(),
            crypto,
            transport,
            rng: Arc::new(Mutex::new(rng)),
        }
    }

    pub fn coin(&self) -> &str {
        &self.coin
    }

    /// Generate the transport key the service encrypts its components for.
    pub async fn generate_transport_key(&self) -> T::SecretKey {
        let mut rng = self.rng.lock().await;
        self.transport.generate_key_pair(&mut *rng)
    }

    /// Generate the 2-of-3 key share for the party in `role`'s slot.
    pub async fn generate_key_share(&self, role: Role) -> Result<KeyShare> {
        let mut rng = self.rng.lock().await;
        Ok(self
            .crypto
            .key_share(&mut *rng, role.index(), THRESHOLD, TOTAL_SHARES)?)
    }

    /// Run the whole ceremony: generate the user transport key and the user
    /// and backup key shares, then create all three keychains.
    #[instrument(skip_all, fields(coin = %self.coin))]
    pub async fn create_keychains(
        &self,
        passphrase: &str,
        enterprise: Option<String>,
        original_passcode_encryption_code: Option<String>,
    ) -> Result<Keychains> {
        let transport_key = self.generate_transport_key().await;
        let user_key_share = self.generate_key_share(Role::User).await?;
        let backup_key_share = self.generate_key_share(Role::Backup).await?;

        let bitgo = self
            .create_bitgo_keychain(&transport_key, &user_key_share, &backup_key_share, enterprise)
            .await?;
        let user = self
            .create_user_keychain(
                &transport_key,
                &user_key_share,
                &backup_key_share,
                &bitgo,
                passphrase,
                original_passcode_encryption_code,
            )
            .await?;
        let backup = self
            .create_backup_keychain(
                &transport_key,
                &user_key_share,
                &backup_key_share,
                &bitgo,
                passphrase,
            )
            .await?;

        info!("Created user, backup and bitgo keychains");
        Ok(Keychains { user, backup, bitgo })
    }

    /// Submit the user and backup components addressed to the service, each
    /// encrypted for the service's transport key, and return the service's
    /// keychain.
    #[instrument(skip_all, fields(coin = %self.coin))]
    pub async fn create_bitgo_keychain(
        &self,
        user_transport_key: &T::SecretKey,
        user_key_share: &KeyShare,
        backup_key_share: &KeyShare,
        enterprise: Option<String>,
    ) -> Result<Keychain> {
        check_owner(user_key_share, Role::User)?;
        check_owner(backup_key_share, Role::Backup)?;
        let user_to_bitgo = addressed_component(user_key_share, Role::User, Role::Bitgo)?;
        let backup_to_bitgo = addressed_component(backup_key_share, Role::Backup, Role::Bitgo)?;

        let constants = self.remote.get_constants().await?;
        let bitgo_public_key = self
            .transport
            .parse_public_key(&constants.tss.bitgo_public_key)?;

        let key_shares = {
            let mut rng = self.rng.lock().await;
            [(Role::User, user_to_bitgo), (Role::Backup, backup_to_bitgo)]
                .into_iter()
                .map(|(from, y_share)| {
                    Ok(KeychainShare {
                        from,
                        to: Role::Bitgo,
                        public_share: y_share.y.clone(),
                        private_share: self.transport.encrypt(
                            &mut *rng,
                            y_share.u.expose().as_bytes(),
                            &bitgo_public_key,
                        )?,
                    })
                })
                .collect::<std::result::Result<Vec<_>, CryptoError>>()?
        };

        // The backup's components are also encrypted for the user's key.
        let transport_public_key = self
            .transport
            .armor_public_key(&self.transport.public_key(user_transport_key));
        let params = CreateKeychainParams::bitgo(
            key_shares,
            transport_public_key.clone(),
            transport_public_key,
            enterprise,
        );

        let keychain = self.remote.create_key(&self.coin, &params).await?;
        info!(keychain_id = %keychain.id, "Created bitgo keychain");
        Ok(keychain)
    }

    /// Combine the user's share and store it encrypted under `passphrase`.
    ///
    /// Fails without submitting anything if the combined public key differs
    /// from `bitgo_keychain`'s `commonPub`.
    #[instrument(skip_all, fields(coin = %self.coin, bitgo_keychain_id = %bitgo_keychain.id))]
    pub async fn create_user_keychain(
        &self,
        user_transport_key: &T::SecretKey,
        user_key_share: &KeyShare,
        backup_key_share: &KeyShare,
        bitgo_keychain: &Keychain,
        passphrase: &str,
        original_passcode_encryption_code: Option<String>,
    ) -> Result<Keychain> {
        let combined = self.combine(
            CombiningParty::User,
            user_transport_key,
            user_key_share,
            backup_key_share,
            bitgo_keychain,
        )?;
        let prv = combined.p_share.to_json()?;
        let encrypted_prv = self.encrypt_prv(passphrase, &prv).await?;

        let params = CreateKeychainParams::user(
            combined.common_pub().to_string(),
            encrypted_prv.clone(),
            original_passcode_encryption_code,
        );
        let mut keychain = self.remote.create_key(&self.coin, &params).await?;
        keychain.encrypted_prv = Some(encrypted_prv);

        info!(keychain_id = %keychain.id, "Created user keychain");
        Ok(keychain)
    }

    /// Combine the backup's share. The returned keychain carries both the
    /// plain `prv` and `encryptedPrv`.
    #[instrument(skip_all, fields(coin = %self.coin, bitgo_keychain_id = %bitgo_keychain.id))]
    pub async fn create_backup_keychain(
        &self,
        user_transport_key: &T::SecretKey,
        user_key_share: &KeyShare,
        backup_key_share: &KeyShare,
        bitgo_keychain: &Keychain,
        passphrase: &str,
    ) -> Result<Keychain> {
        let combined = self.combine(
            CombiningParty::Backup,
            user_transport_key,
            backup_key_share,
            user_key_share,
            bitgo_keychain,
        )?;
        let prv = combined.p_share.to_json()?;
        let encrypted_prv = self.encrypt_prv(passphrase, &prv).await?;

        let params =
            CreateKeychainParams::backup(combined.common_pub().to_string(), encrypted_prv.clone());
        let mut keychain = self.remote.create_key(&self.coin, &params).await?;
        keychain.prv = Some(prv);
        keychain.encrypted_prv = Some(encrypted_prv);

        info!(keychain_id = %keychain.id, "Created backup keychain");
        Ok(keychain)
    }

    /// Combine `own` key share for `party` with the component `peer` addressed
    /// to it and the service's component from `bitgo_keychain`, and check
    /// the result against the service's `commonPub`.
    fn combine(
        &self,
        party: CombiningParty,
        transport_key: &T::SecretKey,
        own: &KeyShare,
        peer: &KeyShare,
        bitgo_keychain: &Keychain,
    ) -> Result<CombinedKey> {
        let role = party.role();
        let peer_role = party.peer().role();
        check_owner(own, role)?;
        check_owner(peer, peer_role)?;
        let peer_component = addressed_component(peer, peer_role, role)?;

        let bitgo_share = bitgo_keychain
            .key_share(Role::Bitgo, role)
            .ok_or(TssWalletClientError::MissingBitgoKeyShare(role))?;
        let decrypted = self
            .transport
            .decrypt(&bitgo_share.private_share, transport_key)?;
        let bitgo_component = YShare {
            i: PartyIndex::BITGO,
            j: role.index(),
            y: bitgo_share.public_share.clone(),
            u: SecretString::new(
                String::from_utf8(decrypted).map_err(|_| CryptoError::ConversionError)?,
            ),
        };

        let combined = self
            .crypto
            .key_combine(&own.u_share, &[peer_component.clone(), bitgo_component])?;

        let common_pub = bitgo_keychain
            .common_pub
            .as_deref()
            .ok_or_else(|| TssWalletClientError::MissingCommonPub(bitgo_keychain.id.clone()))?;
        if combined.common_pub() != common_pub {
            error!(%role, "Combined public key does not match the bitgo keychain");
            return Err(TssWalletClientError::CommonPubMismatch(role));
        }

        Ok(combined)
    }

    async fn encrypt_prv(&self, passphrase: &str, prv: &SecretString) -> Result<String> {
        let mut rng = self.rng.lock().await;
        Ok(encrypt_with_passphrase(
            &mut *rng,
            passphrase,
            prv.expose().as_bytes(),
        )?)
    }
}

/// A party whose keychain is combined on the client. The service combines
/// its own share.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CombiningParty {
    User,
    Backup,
}

impl CombiningParty {
    fn role(self) -> Role {
        match self {
            CombiningParty::User => Role::User,
            CombiningParty::Backup => Role::Backup,
        }
    }

    /// The other client-side party, whose component is combined in.
    fn peer(self) -> Self {
        match self {
            CombiningParty::User => CombiningParty::Backup,
            CombiningParty::Backup => CombiningParty::User,
        }
    }
}

fn check_owner(key_share: &KeyShare, role: Role) -> Result<()> {
    if !is_own_share(key_share, role.index()) {
        error!(owner = %key_share.owner(), %role, "Key share is in the wrong slot");
        return Err(TssWalletClientError::KeyShareNotOwned(role));
    }
    Ok(())
}

/// The component of `key_share` sent from `from` to `to`.
fn addressed_component(key_share: &KeyShare, from: Role, to: Role) -> Result<&YShare> {
    key_share
        .y_share_for(to.index())
        .filter(|y_share| is_y_share_directed(y_share, from.index(), to.index()))
        .ok_or(TssWalletClientError::YShareMisdirected { from, to })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn addressed_component_requires_matching_indices() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut key_share = Ed25519ShareCrypto
            .key_share(&mut rng, PartyIndex::USER, THRESHOLD, TOTAL_SHARES)
            .unwrap();

        assert!(addressed_component(&key_share, Role::User, Role::Bitgo).is_ok());
        assert!(matches!(
            addressed_component(&key_share, Role::Backup, Role::Bitgo),
            Err(TssWalletClientError::YShareMisdirected {
                from: Role::Backup,
                to: Role::Bitgo
            })
        ));

        key_share
            .y_shares
            .get_mut(&PartyIndex::BITGO)
            .unwrap()
            .j = PartyIndex::BACKUP;
        assert!(addressed_component(&key_share, Role::User, Role::Bitgo).is_err());
    }

    #[test]
    fn combining_parties_pair_with_each_other() {
        for party in [CombiningParty::User, CombiningParty::Backup] {
            assert_ne!(party.peer(), party);
            assert_eq!(party.peer().peer(), party);
            assert_ne!(party.role(), Role::Bitgo);
            assert_ne!(party.peer().role(), party.role());
        }
        assert_eq!(CombiningParty::User.role(), Role::User);
        assert_eq!(CombiningParty::Backup.peer().role(), Role::User);
    }

    #[test]
    fn key_share_in_wrong_slot_is_rejected() {
        let mut rng = StdRng::seed_from_u64(2);
        let key_share = Ed25519ShareCrypto
            .key_share(&mut rng, PartyIndex::BACKUP, THRESHOLD, TOTAL_SHARES)
            .unwrap();

        assert!(check_owner(&key_share, Role::Backup).is_ok());
        assert!(matches!(
            check_owner(&key_share, Role::User),
            Err(TssWalletClientError::KeyShareNotOwned(Role::User))
        ));
    }
}
