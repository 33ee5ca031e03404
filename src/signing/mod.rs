//! HMAC-SHA256 signing for ledger-bound payloads.
//!
//! Covers two uses: attributing mutating HTTP requests to this client, and
//! signing the serialized terms blob of a trust agreement before submission.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::domain::AgreementTerms;
use crate::error::{PropdeskError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Signs request payloads with a shared secret; signatures are hex encoded.
#[derive(Clone)]
pub struct RequestSigner {
    key_id: String,
    secret: String,
}

impl RequestSigner {
    pub fn new(key_id: String, secret: String) -> Self {
        Self { key_id, secret }
    }

    pub fn from_env() -> Option<Self> {
        let key_id = std::env::var("PROPDESK_LEDGER_KEY").ok()?;
        let secret = std::env::var("PROPDESK_LEDGER_SECRET").ok()?;
        Some(Self::new(key_id, secret))
    }

    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    pub fn sign(&self, payload: &str) -> String {
        // Key length is unrestricted for HMAC, new_from_slice cannot fail.
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .unwrap_or_else(|_| unreachable!("HMAC accepts any key length"));
        mac.update(payload.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Serialize and sign agreement terms; returns `(terms_blob, signature)`.
    pub fn sign_terms(&self, terms: &AgreementTerms) -> Result<(String, String)> {
        let blob = serde_json::to_string(terms)
            .map_err(|e| PropdeskError::Signature(format!("terms serialization: {}", e)))?;
        let signature = self.sign(&blob);
        Ok((blob, signature))
    }
}

impl std::fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestSigner")
            .field("key_id", &self.key_id)
            .finish_non_exhaustive()
    }
}
