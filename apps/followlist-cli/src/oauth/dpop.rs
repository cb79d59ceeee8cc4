//! DPoP proof-of-possession (RFC 9449)
//!
//! Every request to the authorization server and the PDS carries a `DPoP`
//! header: an ES256 JWT signed with the session's key, naming the HTTP method
//! and URL. Servers may demand a nonce; [`NonceCache`] remembers the latest
//! one per origin.

use crate::error::{CliError, CliResult};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, engine::general_purpose::STANDARD, Engine};
use chrono::Utc;
use jsonwebtoken::jwk::{
    AlgorithmParameters, CommonParameters, EllipticCurve, EllipticCurveKeyParameters,
    EllipticCurveKeyType, Jwk,
};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::header::{HeaderMap, WWW_AUTHENTICATE};
use ring::rand::SystemRandom;
use ring::signature::{EcdsaKeyPair, KeyPair, ECDSA_P256_SHA256_FIXED_SIGNING};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Mutex;
use url::Url;

/// Request header carrying the proof
pub const DPOP_HEADER: &str = "DPoP";

/// Response header carrying a fresh server nonce
pub const DPOP_NONCE_HEADER: &str = "DPoP-Nonce";

/// JWT `typ` for proofs
const DPOP_JWT_TYPE: &str = "dpop+jwt";

/// P-256 signing key bound to a session's tokens
pub struct DpopKey {
    pkcs8: Vec<u8>,
    encoding_key: EncodingKey,
    jwk: Jwk,
}

#[derive(Serialize)]
struct ProofClaims<'a> {
    jti: String,
    htm: &'a str,
    htu: String,
    iat: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    nonce: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ath: Option<String>,
}

impl DpopKey {
    /// Fresh random key
    pub fn generate() -> CliResult<Self> {
        let pkcs8 = EcdsaKeyPair::generate_pkcs8(&ECDSA_P256_SHA256_FIXED_SIGNING, &SystemRandom::new())
            .map_err(|_| CliError::AuthenticationFailed("Failed to generate DPoP key".to_string()))?;
        Self::from_pkcs8(pkcs8.as_ref())
    }

    /// Load a key from PKCS#8 DER
    pub fn from_pkcs8(der: &[u8]) -> CliResult<Self> {
        let pair = EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_FIXED_SIGNING, der, &SystemRandom::new())
            .map_err(|e| CliError::CredentialStorage(format!("Invalid DPoP key: {e}")))?;

        // Uncompressed SEC1 point: 0x04 || x || y
        let point = pair.public_key().as_ref();
        if point.len() != 65 || point[0] != 0x04 {
            return Err(CliError::CredentialStorage(
                "Unexpected DPoP public key encoding".to_string(),
            ));
        }

        let jwk = Jwk {
            common: CommonParameters::default(),
            algorithm: AlgorithmParameters::EllipticCurve(EllipticCurveKeyParameters {
                key_type: EllipticCurveKeyType::EC,
                curve: EllipticCurve::P256,
                x: URL_SAFE_NO_PAD.encode(&point[1..33]),
                y: URL_SAFE_NO_PAD.encode(&point[33..65]),
            }),
        };

        Ok(Self {
            pkcs8: der.to_vec(),
            encoding_key: EncodingKey::from_ec_der(der),
            jwk,
        })
    }

    /// Load a key stored with [`DpopKey::to_base64`]
    pub fn from_base64(encoded: &str) -> CliResult<Self> {
        let der = STANDARD
            .decode(encoded.trim())
            .map_err(|e| CliError::CredentialStorage(format!("Invalid DPoP key encoding: {e}")))?;
        Self::from_pkcs8(&der)
    }

    /// PKCS#8 DER, base64
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.pkcs8)
    }

    /// Public half, as embedded in every proof header
    pub fn public_jwk(&self) -> &Jwk {
        &self.jwk
    }

    /// Build a proof for one request.
    ///
    /// `access_token` is set for resource requests and adds the `ath` claim.
    pub fn proof(
        &self,
        method: &str,
        url: &str,
        nonce: Option<&str>,
        access_token: Option<&str>,
    ) -> CliResult<String> {
        let mut header = Header::new(Algorithm::ES256);
        header.typ = Some(DPOP_JWT_TYPE.to_string());
        header.jwk = Some(self.jwk.clone());

        let claims = ProofClaims {
            jti: uuid::Uuid::new_v4().to_string(),
            htm: method,
            htu: target_uri(url)?,
            iat: Utc::now().timestamp(),
            nonce,
            ath: access_token.map(access_token_hash),
        };

        encode(&header, &claims, &self.encoding_key)
            .map_err(|e| CliError::AuthenticationFailed(format!("Failed to sign DPoP proof: {e}")))
    }
}

impl std::fmt::Debug for DpopKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DpopKey").field("jwk", &self.jwk).finish()
    }
}

/// `htu` value: the request URL without query or fragment
pub fn target_uri(url: &str) -> CliResult<String> {
    let mut parsed =
        Url::parse(url).map_err(|e| CliError::Validation(format!("Invalid URL '{url}': {e}")))?;
    parsed.set_query(None);
    parsed.set_fragment(None);
    Ok(parsed.to_string())
}

/// `ath` value: base64url(SHA-256(access token))
pub fn access_token_hash(access_token: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(access_token.as_bytes()))
}

/// Whether a resource server's 401 asks for a DPoP nonce
pub fn wants_nonce(headers: &HeaderMap) -> bool {
    headers
        .get_all(WWW_AUTHENTICATE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| v.starts_with("DPoP") && v.contains("use_dpop_nonce"))
}

/// Latest server-provided nonce per origin
#[derive(Debug, Default)]
pub struct NonceCache {
    nonces: Mutex<HashMap<String, String>>,
}

impl NonceCache {
    /// Empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Nonce last seen from the origin of `url`
    pub fn get(&self, url: &str) -> Option<String> {
        let origin = origin_of(url)?;
        self.lock().get(&origin).cloned()
    }

    /// Remember the nonce a response carried, if any; returns whether one did
    pub fn update_from(&self, url: &str, headers: &HeaderMap) -> bool {
        let Some(nonce) = headers
            .get(DPOP_NONCE_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
        else {
            return false;
        };
        let Some(origin) = origin_of(url) else {
            return false;
        };
        self.lock().insert(origin, nonce.to_string());
        true
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        match self.nonces.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

fn origin_of(url: &str) -> Option<String> {
    Url::parse(url).ok().map(|u| u.origin().ascii_serialization())
}
