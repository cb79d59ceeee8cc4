//! PKCE (S256) and state generation

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Code verifier and its S256 challenge
#[derive(Debug, Clone)]
pub struct PkcePair {
    /// Sent with the code exchange
    pub verifier: String,
    /// Sent with the authorization request
    pub challenge: String,
}

impl PkcePair {
    /// Fresh pair from 32 random bytes
    pub fn generate() -> Self {
        let verifier = random_token(32);
        let challenge = s256_challenge(&verifier);
        Self {
            verifier,
            challenge,
        }
    }
}

/// base64url(SHA-256(verifier)), unpadded
pub fn s256_challenge(verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}

/// `len` random bytes, base64url without padding
pub fn random_token(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
