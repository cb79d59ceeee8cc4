//! OS keyring backend
//!
//! One keyring entry per account: service `followlist`, user = account DID.
//! The password is the JSON-encoded [`Credentials`].

use crate::credentials::store::CredentialStore;
use crate::error::{CliError, CliResult};
use crate::models::Credentials;
use followlist_core::Did;
use keyring::Entry;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::debug;

const SERVICE_NAME: &str = "followlist";

/// Entry used only to see whether a keyring backend answers
const AVAILABILITY_USER: &str = "availability-check";

/// Credentials kept in the platform keyring (Keychain, Credential Manager
/// or the Linux secret service)
pub struct KeyringCredentialStore {
    service: String,
    entries: Mutex<HashMap<Did, Arc<Entry>>>,
}

impl KeyringCredentialStore {
    pub fn new() -> Self {
        Self::with_service(SERVICE_NAME)
    }

    /// Store filing entries under another service name
    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Whether a keyring backend is reachable on this host
    pub fn is_available(&self) -> bool {
        let Ok(entry) = Entry::new(&self.service, AVAILABILITY_USER) else {
            return false;
        };
        matches!(entry.get_password(), Ok(_) | Err(keyring::Error::NoEntry))
    }

    fn entry(&self, account: &Did) -> CliResult<Arc<Entry>> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| CliError::CredentialStorage("Keyring entry cache poisoned".to_string()))?;
        if let Some(entry) = entries.get(account) {
            return Ok(Arc::clone(entry));
        }

        let entry = Entry::new(&self.service, account.as_str()).map_err(|e| {
            CliError::CredentialStorage(format!("Failed to open keyring entry for {account}: {e}"))
        })?;
        let entry = Arc::new(entry);
        entries.insert(account.clone(), Arc::clone(&entry));
        Ok(entry)
    }
}

impl Default for KeyringCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialStore for KeyringCredentialStore {
    fn store(&self, account: &Did, credentials: &Credentials) -> CliResult<()> {
        let json = serde_json::to_string(credentials)?;
        self.entry(account)?
            .set_password(&json)
            .map_err(|e| CliError::CredentialStorage(format!("Failed to store credentials: {e}")))?;
        debug!(did = %account, "Credentials written to keyring");
        Ok(())
    }

    fn load(&self, account: &Did) -> CliResult<Option<Credentials>> {
        match self.entry(account)?.get_password() {
            Ok(json) => Ok(Some(serde_json::from_str(&json)?)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(CliError::CredentialStorage(format!(
                "Failed to load credentials: {e}"
            ))),
        }
    }

    fn delete(&self, account: &Did) -> CliResult<()> {
        match self.entry(account)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(CliError::CredentialStorage(format!(
                "Failed to delete credentials: {e}"
            ))),
        }
    }

    fn exists(&self, account: &Did) -> bool {
        self.entry(account)
            .map(|entry| entry.get_password().is_ok())
            .unwrap_or(false)
    }

    fn backend(&self) -> &'static str {
        "keyring"
    }
}
