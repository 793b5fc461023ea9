//! Inbound webhook validation.
//!
//! Checks run in a fixed order: shared-secret token, optional
//! HMAC-SHA256 body signature, optional IP allow-list, then a per-IP
//! sliding-window rate limit. The limiter store is an injectable trait
//! so a horizontally-scaled deployment can swap in a shared store
//! without touching the validation logic; the default in-memory store
//! is LRU-bounded so tracked identities never grow past capacity.

use desk_common::DeskError;
use lru::LruCache;
use sha2::{Digest, Sha256};
use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Signature header prefix, GitHub/JIRA convention
const SIGNATURE_PREFIX: &str = "sha256=";

/// Sliding-window counter keyed by client identity.
pub trait RateStore: Send + Sync {
    /// Record one request for `identity` and decide whether it fits the
    /// window budget.
    fn try_acquire(&self, identity: &str) -> bool;
}

/// In-memory sliding-window store with an LRU capacity bound.
pub struct MemoryRateStore {
    entries: Mutex<LruCache<String, Vec<Instant>>>,
    limit: usize,
    window: Duration,
}

impl MemoryRateStore {
    pub fn new(limit: u32, window: Duration, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap();
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            limit: limit as usize,
            window,
        }
    }

    /// Tracked identity count, for monitoring and tests.
    pub fn tracked(&self) -> usize {
        self.entries.lock().unwrap().len()
    }
}

impl RateStore for MemoryRateStore {
    fn try_acquire(&self, identity: &str) -> bool {
        let mut entries = self.entries.lock().unwrap();
        let now = Instant::now();

        if let Some(stamps) = entries.get_mut(identity) {
            stamps.retain(|t| now.duration_since(*t) < self.window);
            if stamps.len() >= self.limit {
                debug!("Rate limit hit for {identity} ({}/{})", stamps.len(), self.limit);
                return false;
            }
            stamps.push(now);
        } else {
            // LRU insert: over capacity, the stalest identity is evicted
            entries.put(identity.to_string(), vec![now]);
        }
        true
    }
}

/// Validates inbound webhook requests.
pub struct WebhookValidator {
    secret: String,
    signing_key: Option<String>,
    allowed_ips: Vec<String>,
    store: Box<dyn RateStore>,
}

impl WebhookValidator {
    pub fn new(
        secret: String,
        signing_key: Option<String>,
        allowed_ips: Vec<String>,
        store: Box<dyn RateStore>,
    ) -> Self {
        Self {
            secret,
            signing_key,
            allowed_ips,
            store,
        }
    }

    /// Build from config with the default in-memory store.
    pub fn from_config(config: &desk_common::config::WebhookConfig) -> Self {
        Self::new(
            config.secret.clone(),
            config.signing_key.clone(),
            config.allowed_ips.clone(),
            Box::new(MemoryRateStore::new(
                config.rate_limit_per_minute,
                Duration::from_secs(60),
                config.max_tracked_ips,
            )),
        )
    }

    /// Validate one request. `token` comes from the X-Webhook-Token
    /// header or the `token` query parameter; `signature` from
    /// X-Hub-Signature-256.
    pub fn validate(
        &self,
        caller_ip: &str,
        token: Option<&str>,
        signature: Option<&str>,
        body: &[u8],
    ) -> Result<(), DeskError> {
        // Fail closed: an unconfigured secret rejects everything
        if self.secret.is_empty() {
            warn!("Webhook secret not configured; rejecting call from {caller_ip}");
            return Err(DeskError::Unauthorized);
        }
        let presented = token.unwrap_or("");
        if !constant_time_eq(presented.as_bytes(), self.secret.as_bytes()) {
            warn!("Webhook token mismatch from {caller_ip}");
            return Err(DeskError::Unauthorized);
        }

        if let Some(key) = &self.signing_key {
            let Some(signature) = signature else {
                warn!("Webhook signature missing from {caller_ip}");
                return Err(DeskError::Unauthorized);
            };
            if !verify_signature(key.as_bytes(), body, signature) {
                warn!("Webhook signature mismatch from {caller_ip}");
                return Err(DeskError::Unauthorized);
            }
        }

        if !self.allowed_ips.is_empty() && !self.allowed_ips.iter().any(|ip| ip == caller_ip) {
            warn!("Webhook caller {caller_ip} not on allow-list");
            return Err(DeskError::Forbidden(format!("IP {caller_ip} not allowed")));
        }

        if !self.store.try_acquire(caller_ip) {
            return Err(DeskError::Validation(format!(
                "Rate limit exceeded for {caller_ip}"
            )));
        }

        Ok(())
    }
}

/// Verify a `sha256=<hex>` signature over the raw body.
pub fn verify_signature(key: &[u8], body: &[u8], signature: &str) -> bool {
    let Some(hex_digest) = signature.strip_prefix(SIGNATURE_PREFIX) else {
        return false;
    };
    let Ok(presented) = hex::decode(hex_digest.trim()) else {
        return false;
    };
    let expected = hmac_sha256(key, body);
    constant_time_eq(&presented, &expected)
}

/// HMAC-SHA256 (RFC 2104) over sha2.
fn hmac_sha256(key: &[u8], message: &[u8]) -> [u8; 32] {
    const BLOCK: usize = 64;

    let mut key_block = [0u8; BLOCK];
    if key.len() > BLOCK {
        key_block[..32].copy_from_slice(&Sha256::digest(key));
    } else {
        key_block[..key.len()].copy_from_slice(key);
    }

    let mut ipad = [0x36u8; BLOCK];
    let mut opad = [0x5cu8; BLOCK];
    for i in 0..BLOCK {
        ipad[i] ^= key_block[i];
        opad[i] ^= key_block[i];
    }

    let inner = Sha256::new()
        .chain_update(ipad)
        .chain_update(message)
        .finalize();
    let outer = Sha256::new()
        .chain_update(opad)
        .chain_update(inner)
        .finalize();
    outer.into()
}

/// Byte comparison that never short-circuits on the first difference.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator(allowed_ips: Vec<String>, signing_key: Option<String>) -> WebhookValidator {
        WebhookValidator::new(
            "secret-token".to_string(),
            signing_key,
            allowed_ips,
            Box::new(MemoryRateStore::new(60, Duration::from_secs(60), 1000)),
        )
    }

    #[test]
    fn valid_token_passes() {
        let v = validator(vec![], None);
        assert!(v.validate("10.0.0.1", Some("secret-token"), None, b"{}").is_ok());
    }

    #[test]
    fn missing_or_wrong_token_is_unauthorized() {
        let v = validator(vec![], None);
        assert!(matches!(
            v.validate("10.0.0.1", None, None, b"{}"),
            Err(DeskError::Unauthorized)
        ));
        assert!(matches!(
            v.validate("10.0.0.1", Some("wrong"), None, b"{}"),
            Err(DeskError::Unauthorized)
        ));
    }

    #[test]
    fn ip_outside_allow_list_is_forbidden() {
        let v = validator(vec!["10.0.0.1".to_string()], None);
        assert!(v.validate("10.0.0.1", Some("secret-token"), None, b"{}").is_ok());
        assert!(matches!(
            v.validate("10.0.0.9", Some("secret-token"), None, b"{}"),
            Err(DeskError::Forbidden(_))
        ));
    }

    #[test]
    fn signature_is_required_and_verified_when_key_is_set() {
        let v = validator(vec![], Some("signing-key".to_string()));
        let body = br#"{"key": "SUP-1"}"#;
        let digest = hmac_sha256(b"signing-key", body);
        let good = format!("sha256={}", hex::encode(digest));

        assert!(v.validate("10.0.0.1", Some("secret-token"), Some(&good), body).is_ok());
        assert!(matches!(
            v.validate("10.0.0.1", Some("secret-token"), None, body),
            Err(DeskError::Unauthorized)
        ));
        assert!(matches!(
            v.validate("10.0.0.1", Some("secret-token"), Some("sha256=deadbeef"), body),
            Err(DeskError::Unauthorized)
        ));
        // Signature over a different body must not validate
        assert!(matches!(
            v.validate("10.0.0.1", Some("secret-token"), Some(&good), b"tampered"),
            Err(DeskError::Unauthorized)
        ));
    }

    #[test]
    fn rate_limit_rejects_after_budget() {
        let store = MemoryRateStore::new(3, Duration::from_secs(60), 1000);
        for _ in 0..3 {
            assert!(store.try_acquire("10.0.0.1"));
        }
        assert!(!store.try_acquire("10.0.0.1"));
        // Other identities are unaffected
        assert!(store.try_acquire("10.0.0.2"));
    }

    #[test]
    fn rate_limit_window_slides() {
        let store = MemoryRateStore::new(2, Duration::from_millis(40), 1000);
        assert!(store.try_acquire("ip"));
        assert!(store.try_acquire("ip"));
        assert!(!store.try_acquire("ip"));

        std::thread::sleep(Duration::from_millis(50));
        assert!(store.try_acquire("ip"));
    }

    #[test]
    fn store_capacity_is_bounded() {
        let store = MemoryRateStore::new(60, Duration::from_secs(60), 10);
        for i in 0..50 {
            store.try_acquire(&format!("10.0.0.{i}"));
        }
        assert!(store.tracked() <= 10);
    }

    #[test]
    fn constant_time_eq_handles_lengths_and_content() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"abcd"));
        assert!(constant_time_eq(b"", b""));
    }

    #[test]
    fn hmac_matches_known_vector() {
        // RFC 4231 test case 2
        let digest = hmac_sha256(b"Jefe", b"what do ya want for nothing?");
        assert_eq!(
            hex::encode(digest),
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }
}
