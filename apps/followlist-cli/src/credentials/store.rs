//! Where session secrets live
//!
//! Secrets are filed under the DID of the account they belong to. The session
//! file names that DID, so a store can never hand one account's tokens to
//! another account's session.

use crate::config::ConfigPaths;
use crate::credentials::{FileCredentialStore, KeyringCredentialStore};
use crate::error::CliResult;
use crate::models::Credentials;
use followlist_core::Did;
use tracing::{debug, warn};

/// Per-account secret storage
pub trait CredentialStore: Send + Sync {
    /// Save the secrets for `account`, replacing any earlier ones
    fn store(&self, account: &Did, credentials: &Credentials) -> CliResult<()>;

    /// Secrets saved for `account`, if any
    fn load(&self, account: &Did) -> CliResult<Option<Credentials>>;

    /// Forget the secrets for `account`; a missing entry is not an error
    fn delete(&self, account: &Did) -> CliResult<()>;

    /// Whether secrets are saved for `account`
    fn exists(&self, account: &Did) -> bool;

    /// Short backend name shown to the user
    fn backend(&self) -> &'static str;
}

/// Pick the platform keyring when it answers, else the encrypted file
pub fn get_credential_store(paths: &ConfigPaths) -> Box<dyn CredentialStore> {
    let keyring = KeyringCredentialStore::new();
    if keyring.is_available() {
        debug!("Using system keyring for credentials");
        return Box::new(keyring);
    }

    warn!(
        path = %paths.credentials_file.display(),
        "System keyring unavailable, using encrypted file storage"
    );
    Box::new(FileCredentialStore::new(paths.credentials_file.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_get_credential_store_names_its_backend() {
        let temp_dir = TempDir::new().unwrap();
        let paths = ConfigPaths::in_dir(temp_dir.path());

        let store = get_credential_store(&paths);
        assert!(["keyring", "file"].contains(&store.backend()));

        let did = Did::new("did:plc:nobody").unwrap();
        if store.backend() == "file" {
            assert!(!store.exists(&did));
            assert!(store.load(&did).unwrap().is_none());
        }
    }
}
