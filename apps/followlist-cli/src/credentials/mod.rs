//! Secure credential storage for the followlist CLI

mod file;
mod keyring_store;
mod store;

pub use file::FileCredentialStore;
pub use keyring_store::KeyringCredentialStore;
pub use store::{get_credential_store, CredentialStore};
