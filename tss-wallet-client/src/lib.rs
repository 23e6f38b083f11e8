//! Client-side orchestration of a 2-of-3 threshold-signature wallet.
//!
//! [`KeychainCoordinator`] runs the one-time key generation ceremony between
//! the user, the backup and the operating service. [`SigningCoordinator`]
//! signs pending transaction requests with the user's private share in
//! cooperation with the service. Both talk to the service only through a
//! [`RemoteCoordinationClient`]; [`HttpCoordinationClient`] is the HTTPS
//! implementation.
#![warn(unused_results)]
#![warn(future_incompatible)]
#![warn(unused)]
#![forbid(rustdoc::broken_intra_doc_links)]

pub mod config;
pub mod error;
pub mod intent;
pub mod keychain;
pub mod logging;
pub mod remote;
pub mod signing;

pub use config::Config;
pub use error::{ErrorKind, Result, TssWalletClientError};
pub use keychain::{KeychainCoordinator, Keychains};
pub use logging::init_logging;
pub use remote::{HttpCoordinationClient, RemoteCoordinationClient, TransportError};
pub use signing::{RequestTracer, SigningCoordinator, SigningState, TxRequestRef};
