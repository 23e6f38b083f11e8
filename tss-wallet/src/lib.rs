//! Shared data model, share validation and cryptographic providers for the
//! TSS wallet threshold-signing protocol.
//!
//! ⚠️ __Usage__: This crate is designed as a dependency of
//! `tss-wallet-client`, which drives the key generation and signing
//! protocols against the remote coordination service. Applications should
//! use the client crate instead of calling into this one directly.
#![warn(unused_results)]
#![warn(future_incompatible)]
#![warn(unused)]
#![forbid(rustdoc::broken_intra_doc_links)]

pub mod constants;
pub mod crypto;
pub mod error;
pub mod infrastructure;
pub mod types;
pub mod validation;

pub use error::TssWalletError;
