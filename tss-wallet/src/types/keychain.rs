//! Keychain records and the requests that create them.

use crate::{
    constants::TSS_KEY_TYPE,
    crypto::decrypt_with_passphrase,
    types::{key_share::PShare, party::Role, SecretString},
    TssWalletError,
};
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

/// A key share exchanged during key generation, with its secret component
/// encrypted for the recipient's transport key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeychainShare {
    pub from: Role,
    pub to: Role,
    pub public_share: String,
    /// Armored ciphertext of the secret component.
    pub private_share: String,
}

/// The durable record for one party of a wallet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Keychain {
    pub id: String,
    #[serde(rename = "pub", default)]
    pub public_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub common_pub: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub key_shares: Vec<KeychainShare>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub key_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Role>,
    /// Unencrypted combined private share. Only ever attached locally.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prv: Option<SecretString>,
    /// Passphrase-encrypted combined private share.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypted_prv: Option<String>,
}

impl Keychain {
    /// The key share sent from `from` to `to`, if this keychain carries one.
    pub fn key_share(&self, from: Role, to: Role) -> Option<&KeychainShare> {
        self.key_shares
            .iter()
            .find(|share| share.from == from && share.to == to)
    }

    /// Recover the combined private share from `encrypted_prv`.
    pub fn decrypt_prv(&self, passphrase: &str) -> Result<PShare, TssWalletError> {
        let encrypted_prv = self
            .encrypted_prv
            .as_deref()
            .ok_or_else(|| TssWalletError::MissingEncryptedPrv(self.id.clone()))?;

        let mut decrypted = decrypt_with_passphrase(passphrase, encrypted_prv)?;
        let p_share = serde_json::from_slice::<PShare>(&decrypted);
        decrypted.zeroize();
        Ok(p_share?)
    }
}

/// Body of a create-keychain request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateKeychainParams {
    #[serde(rename = "type")]
    pub key_type: String,
    pub source: Role,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub key_shares: Vec<KeychainShare>,
    #[serde(
        rename = "userGPGPublicKey",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub user_gpg_public_key: Option<String>,
    #[serde(
        rename = "backupGPGPublicKey",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub backup_gpg_public_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub common_pub: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypted_prv: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enterprise: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_passcode_encryption_code: Option<String>,
}

impl CreateKeychainParams {
    fn new(source: Role) -> Self {
        Self {
            key_type: TSS_KEY_TYPE.to_string(),
            source,
            key_shares: Vec::new(),
            user_gpg_public_key: None,
            backup_gpg_public_key: None,
            common_pub: None,
            encrypted_prv: None,
            enterprise: None,
            original_passcode_encryption_code: None,
        }
    }

    /// Request asking the service to generate its own key share and combine
    /// it with the given user and backup shares.
    pub fn bitgo(
        key_shares: Vec<KeychainShare>,
        user_transport_public_key: String,
        backup_transport_public_key: String,
        enterprise: Option<String>,
    ) -> Self {
        Self {
            key_shares,
            user_gpg_public_key: Some(user_transport_public_key),
            backup_gpg_public_key: Some(backup_transport_public_key),
            enterprise,
            ..Self::new(Role::Bitgo)
        }
    }

    pub fn user(
        common_pub: String,
        encrypted_prv: String,
        original_passcode_encryption_code: Option<String>,
    ) -> Self {
        Self {
            common_pub: Some(common_pub),
            encrypted_prv: Some(encrypted_prv),
            original_passcode_encryption_code,
            ..Self::new(Role::User)
        }
    }

    pub fn backup(common_pub: String, encrypted_prv: String) -> Self {
        Self {
            common_pub: Some(common_pub),
            encrypted_prv: Some(encrypted_prv),
            ..Self::new(Role::Backup)
        }
    }
}
