use http::Uri;
use rustls::{ClientConfig, RootCertStore};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};
use std::{
    path::{Path, PathBuf},
    str::FromStr,
};
use tracing::Level;
use tss_wallet::types::{tx_request::WalletId, SecretString};

use crate::TssWalletClientError;

/// Client configuration with all fields ready to use.
#[derive(Clone)]
pub struct Config {
    pub server_uri: Uri,
    pub coin: String,
    pub wallet_id: WalletId,
    /// `None` uses the platform's native root certificates for HTTPS.
    pub tls_config: Option<ClientConfig>,
    pub access_token: Option<SecretString>,
    pub logging: LoggingConfig,
}

impl Config {
    pub fn from_file(
        config_path: impl AsRef<Path>,
        access_token: Option<String>,
    ) -> Result<Self, TssWalletClientError> {
        let config_string = std::fs::read_to_string(&config_path)?;
        let config_file = ConfigFile::from_str(&config_string)?;
        Self::from_config_file(config_file, access_token)
    }

    pub fn from_config_file(
        config: ConfigFile,
        access_token: Option<String>,
    ) -> Result<Self, TssWalletClientError> {
        Ok(Self {
            server_uri: Uri::from_str(&config.server_uri)?,
            tls_config: config.tls_config()?,
            coin: config.coin,
            wallet_id: WalletId::from(config.wallet_id),
            access_token: access_token.map(SecretString::from),
            logging: config.logging,
        })
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("server_uri", &self.server_uri)
            .field("coin", &self.coin)
            .field("wallet_id", &self.wallet_id)
            .field("tls_config", &"[Does not implement Debug]")
            .field("access_token", &self.access_token.as_ref().map(|_| "REDACTED"))
            .field("logging", &self.logging)
            .finish()
    }
}

/// Client configuration file format.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "snake_case")]
#[non_exhaustive]
pub struct ConfigFile {
    pub server_uri: String,
    pub coin: String,
    pub wallet_id: String,
    pub ca_chain: Option<PathBuf>,
    pub logging: LoggingConfig,
}

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "snake_case")]
pub struct LoggingConfig {
    #[serde_as(as = "DisplayFromStr")]
    pub stdout_log_level: Level,
    /// Also emit every event as JSON.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            stdout_log_level: Level::INFO,
            json: false,
        }
    }
}

impl ConfigFile {
    /// TLS settings trusting only the configured CA chain, if there is one.
    pub fn tls_config(&self) -> Result<Option<ClientConfig>, TssWalletClientError> {
        let Some(ca_chain) = &self.ca_chain else {
            return Ok(None);
        };

        let mut root_store = RootCertStore::empty();
        let (added, _ignored) = root_store.add_parsable_certificates(&read_certificates(ca_chain)?);
        if added == 0 {
            return Err(TssWalletClientError::InvalidCaChain(ca_chain.clone()));
        }

        let tls_config = ClientConfig::builder()
            .with_safe_defaults()
            .with_root_certificates(root_store)
            .with_no_client_auth();

        Ok(Some(tls_config))
    }
}

impl FromStr for ConfigFile {
    type Err = TssWalletClientError;

    fn from_str(config_string: &str) -> Result<Self, Self::Err> {
        Ok(toml::from_str(config_string)?)
    }
}

/// Returns the DER bytes of every certificate in the pemfile at the given path.
fn read_certificates(path: impl AsRef<Path>) -> Result<Vec<Vec<u8>>, TssWalletClientError> {
    let fd = std::fs::File::open(path.as_ref())?;
    let mut buf = std::io::BufReader::new(&fd);
    Ok(rustls_pemfile::certs(&mut buf)?)
}
