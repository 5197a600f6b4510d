//! Websocket login authentication.
//!
//! FTX authenticates a websocket session with a single `login` op whose
//! signature is the hex HMAC-SHA256 of `"{time}websocket_login"`, keyed by
//! the API secret, where `time` is the signing timestamp in milliseconds.
//!
//! # Example
//!
//! ```rust
//! use ftx_feed::client::auth::Signer;
//!
//! let signer = Signer::new("my-api-secret");
//! let timestamp = Signer::current_timestamp_ms();
//! let args = signer.login_args("my-api-key", timestamp);
//! assert_eq!(args.time, timestamp);
//! ```

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::types::messages::LoginArgs;

type HmacSha256 = Hmac<Sha256>;

/// HMAC-SHA256 signer for the websocket `login` op
#[derive(Clone)]
pub struct Signer {
    secret: Vec<u8>,
}

impl std::fmt::Debug for Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print the secret.
        f.debug_struct("Signer").finish_non_exhaustive()
    }
}

impl Signer {
    /// Create a signer from the API secret
    pub fn new(api_secret: impl Into<String>) -> Self {
        Self {
            secret: api_secret.into().into_bytes(),
        }
    }

    /// Current Unix time in milliseconds
    #[must_use]
    pub fn current_timestamp_ms() -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }

    /// Build signed arguments for the `login` op
    #[must_use]
    pub fn login_args(&self, api_key: &str, time: u64) -> LoginArgs {
        LoginArgs {
            key: api_key.to_string(),
            sign: self.sign(format!("{time}websocket_login").as_bytes()),
            time,
        }
    }

    /// Hex HMAC-SHA256 of `payload` under the API secret
    fn sign(&self, payload: &[u8]) -> String {
        // HMAC accepts keys of any length, so this cannot fail.
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .expect("HMAC accepts keys of any length");
        mac.update(payload);
        hex::encode(mac.finalize().into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_is_hex_sha256_length() {
        let signer = Signer::new("secret");
        let args = signer.login_args("key", 1656364800000);
        assert_eq!(args.sign.len(), 64);
        assert!(args.sign.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_signature_is_deterministic_per_timestamp() {
        let signer = Signer::new("secret");
        let a = signer.login_args("key", 1000);
        let b = signer.login_args("key", 1000);
        let c = signer.login_args("key", 2000);
        assert_eq!(a.sign, b.sign);
        assert_ne!(a.sign, c.sign);
    }

    #[test]
    fn test_debug_hides_secret() {
        let signer = Signer::new("topsecret");
        assert!(!format!("{signer:?}").contains("topsecret"));
    }
}
