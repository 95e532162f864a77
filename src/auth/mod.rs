//! Credential storage.
//!
//! This module provides:
//! - `Credential`: the one account identity + app-specific password pair
//! - `SecretStore`: the get/set/delete contract over a named credential
//! - `KeychainStore`: the OS keychain implementation via keyring
//!
//! The secret never touches disk, environment variables, or log output;
//! the keychain is the only durable store.

pub mod credentials;

pub use credentials::{Credential, KeychainStore, SecretStore, SecretStoreError};
