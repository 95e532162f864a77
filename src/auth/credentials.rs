use keyring::Entry;
use thiserror::Error;

/// Keychain service name all entries are stored under.
pub const SERVICE_NAME: &str = "icloud-bridge";

/// Keychain account holding the Apple ID.
const IDENTITY_KEY: &str = "apple_id";

/// Keychain account holding the app-specific password.
const SECRET_KEY: &str = "app_specific_password";

/// The single account credential: Apple ID plus app-specific password.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub identity: String,
    pub secret: String,
}

// Manual Debug so the secret can never leak through a formatted error or log.
impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("identity", &self.identity)
            .field("secret", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum SecretStoreError {
    /// No credential has been provisioned yet.
    #[error("no credential stored")]
    NotFound,

    /// The underlying store refused the operation (locked, permission
    /// denied, platform service unreachable). Distinct from `NotFound`.
    #[error("secret store unavailable: {0}")]
    Unavailable(String),
}

/// Contract over the OS secret store.
///
/// No caching at this layer: every call reads or writes the underlying
/// store directly, so external credential rotation is observed on the next
/// access. `set` overwrites; `get` and `delete` are idempotent.
pub trait SecretStore: Send + Sync {
    fn get(&self) -> Result<Credential, SecretStoreError>;
    fn set(&self, credential: &Credential) -> Result<(), SecretStoreError>;
    fn delete(&self) -> Result<(), SecretStoreError>;
}

/// OS keychain implementation.
///
/// Identity and secret are stored as two entries under one service name,
/// mirroring how the account is provisioned on macOS.
pub struct KeychainStore {
    service: String,
}

impl KeychainStore {
    pub fn new() -> Self {
        Self::with_service(SERVICE_NAME)
    }

    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, key: &str) -> Result<Entry, SecretStoreError> {
        Entry::new(&self.service, key).map_err(store_error)
    }

    fn read(&self, key: &str) -> Result<String, SecretStoreError> {
        self.entry(key)?.get_password().map_err(store_error)
    }
}

impl Default for KeychainStore {
    fn default() -> Self {
        Self::new()
    }
}

fn store_error(err: keyring::Error) -> SecretStoreError {
    match err {
        keyring::Error::NoEntry => SecretStoreError::NotFound,
        other => SecretStoreError::Unavailable(other.to_string()),
    }
}

impl SecretStore for KeychainStore {
    fn get(&self) -> Result<Credential, SecretStoreError> {
        let identity = self.read(IDENTITY_KEY)?;
        let secret = self.read(SECRET_KEY)?;
        Ok(Credential { identity, secret })
    }

    fn set(&self, credential: &Credential) -> Result<(), SecretStoreError> {
        self.entry(IDENTITY_KEY)?
            .set_password(&credential.identity)
            .map_err(store_error)?;
        self.entry(SECRET_KEY)?
            .set_password(&credential.secret)
            .map_err(store_error)?;
        Ok(())
    }

    fn delete(&self) -> Result<(), SecretStoreError> {
        let identity = self.entry(IDENTITY_KEY)?.delete_credential();
        let secret = self.entry(SECRET_KEY)?.delete_credential();
        match (identity.map_err(store_error), secret.map_err(store_error)) {
            (Ok(()), _) | (_, Ok(())) => Ok(()),
            (Err(SecretStoreError::NotFound), Err(SecretStoreError::NotFound)) => {
                Err(SecretStoreError::NotFound)
            }
            (Err(e), _) => Err(e),
        }
    }
}
