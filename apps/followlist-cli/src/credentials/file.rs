//! Encrypted file credential storage backend

use crate::credentials::store::CredentialStore;
use crate::error::{CliError, CliResult};
use crate::models::Credentials;
use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use followlist_core::Did;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use tracing::debug;

const NONCE_LEN: usize = 12;
const KEY_CONTEXT: &[u8] = b"followlist-credential-encryption-v1";

/// Plaintext sealed into the file
#[derive(Serialize, Deserialize)]
struct Sealed {
    account: Did,
    credentials: Credentials,
}

/// Credential store using an AES-256-GCM encrypted file
///
/// The key is a SHA-256 digest of machine and user identifiers, so the file
/// only decrypts for the same user on the same host. The file holds one
/// account at a time; storing another account replaces it. Fallback for
/// hosts without a usable keyring.
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    /// Create a new file credential store
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn encryption_key() -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(KEY_CONTEXT);

        for var in [["HOSTNAME", "COMPUTERNAME"], ["USER", "USERNAME"]] {
            if let Some(value) = var.iter().find_map(|name| std::env::var(name).ok()) {
                hasher.update(value.as_bytes());
            }
            hasher.update([0u8]);
        }
        if let Some(home) = dirs::home_dir() {
            hasher.update(home.to_string_lossy().as_bytes());
        }

        hasher.finalize().into()
    }

    fn cipher() -> CliResult<Aes256Gcm> {
        Aes256Gcm::new_from_slice(&Self::encryption_key())
            .map_err(|e| CliError::CredentialStorage(format!("Cipher init failed: {e}")))
    }

    fn encrypt(&self, data: &[u8]) -> CliResult<Vec<u8>> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);

        let ciphertext = Self::cipher()?
            .encrypt(Nonce::from_slice(&nonce_bytes), data)
            .map_err(|e| CliError::CredentialStorage(format!("Encryption failed: {e}")))?;

        let mut sealed = nonce_bytes.to_vec();
        sealed.extend(ciphertext);
        Ok(sealed)
    }

    fn decrypt(&self, data: &[u8]) -> CliResult<Vec<u8>> {
        if data.len() <= NONCE_LEN {
            return Err(CliError::CredentialStorage(
                "Invalid encrypted data".to_string(),
            ));
        }

        let (nonce, ciphertext) = data.split_at(NONCE_LEN);
        Self::cipher()?
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|e| CliError::CredentialStorage(format!("Decryption failed: {e}")))
    }
}

impl FileCredentialStore {
    fn read_sealed(&self) -> CliResult<Option<Sealed>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let encoded = std::fs::read_to_string(&self.path)?;
        let encrypted = BASE64
            .decode(encoded.trim())
            .map_err(|e| CliError::CredentialStorage(format!("Invalid credential file: {e}")))?;
        let decrypted = self.decrypt(&encrypted)?;
        let sealed = serde_json::from_slice(&decrypted)
            .map_err(|e| CliError::CredentialStorage(format!("Invalid credential data: {e}")))?;
        Ok(Some(sealed))
    }
}

impl CredentialStore for FileCredentialStore {
    fn store(&self, account: &Did, credentials: &Credentials) -> CliResult<()> {
        let sealed = Sealed {
            account: account.clone(),
            credentials: credentials.clone(),
        };
        let json = serde_json::to_vec(&sealed)?;
        let encoded = BASE64.encode(self.encrypt(&json)?);

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, encoded)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))?;
        }

        debug!(path = %self.path.display(), did = %account, "Credentials written");
        Ok(())
    }

    fn load(&self, account: &Did) -> CliResult<Option<Credentials>> {
        match self.read_sealed()? {
            Some(sealed) if &sealed.account == account => Ok(Some(sealed.credentials)),
            Some(sealed) => {
                debug!(stored = %sealed.account, requested = %account, "Credential file holds another account");
                Ok(None)
            }
            None => Ok(None),
        }
    }

    fn delete(&self, account: &Did) -> CliResult<()> {
        // Unreadable files are removed as well
        let other = match self.read_sealed() {
            Ok(Some(sealed)) => sealed.account != *account,
            Ok(None) => return Ok(()),
            Err(_) => false,
        };
        if other {
            debug!(did = %account, "Credential file holds another account, leaving it");
            return Ok(());
        }
        std::fs::remove_file(&self.path)?;
        Ok(())
    }

    fn exists(&self, account: &Did) -> bool {
        matches!(self.load(account), Ok(Some(_)))
    }

    fn backend(&self) -> &'static str {
        "file"
    }
}
