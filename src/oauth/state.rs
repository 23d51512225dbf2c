// SPDX-License-Identifier: MIT

//! Anti-forgery state tokens for OAuth flows.
//!
//! One manager serves all five platforms: the state carried through the
//! provider redirect is an HMAC-signed `platform|nonce|timestamp` payload,
//! and the nonce is also tracked in a keyed store so each state verifies
//! exactly once. A PKCE verifier is issued alongside for platforms that
//! need one (Twitter).

use crate::error::AppError;
use crate::models::Platform;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use dashmap::DashMap;
use hmac::{Hmac, Mac};
use ring::rand::{SecureRandom, SystemRandom};
use sha2::Sha256;
use std::time::{SystemTime, UNIX_EPOCH};

type HmacSha256 = Hmac<Sha256>;

/// How long an issued state stays valid.
const STATE_TTL_MILLIS: u128 = 10 * 60 * 1000;

const NONCE_BYTES: usize = 16;
const PKCE_VERIFIER_BYTES: usize = 32;

/// A freshly issued state token plus its associated PKCE verifier.
#[derive(Debug, Clone)]
pub struct IssuedState {
    /// Opaque value to embed in the authorization URL's `state` parameter
    pub state: String,
    /// Plain-method PKCE verifier (only Twitter embeds it)
    pub pkce_verifier: String,
}

/// Pending flow data keyed by nonce.
struct PendingState {
    issued_at_millis: u128,
    pkce_verifier: String,
}

/// Issues and verifies anti-forgery state for all adapters.
pub struct StateManager {
    key: Vec<u8>,
    rng: SystemRandom,
    pending: DashMap<String, PendingState>,
}

impl StateManager {
    pub fn new(key: Vec<u8>) -> Self {
        Self {
            key,
            rng: SystemRandom::new(),
            pending: DashMap::new(),
        }
    }

    /// Issue a fresh signed state for a platform and remember its nonce.
    pub fn issue(&self, platform: Platform) -> Result<IssuedState, AppError> {
        self.sweep_expired();

        let nonce = self.random_hex(NONCE_BYTES)?;
        let pkce_verifier = self.random_hex(PKCE_VERIFIER_BYTES)?;
        let now = now_millis()?;

        // Payload format: "platform|nonce|timestamp_hex"
        let payload = format!("{}|{}|{:x}", platform, nonce, now);
        let signature = self.sign(&payload)?;
        let state = URL_SAFE_NO_PAD.encode(format!("{payload}|{signature}").as_bytes());

        self.pending.insert(
            nonce,
            PendingState {
                issued_at_millis: now,
                pkce_verifier: pkce_verifier.clone(),
            },
        );

        Ok(IssuedState {
            state,
            pkce_verifier,
        })
    }

    /// Verify a state returned by a provider redirect and consume it.
    ///
    /// Fails with [`AppError::StateMismatch`] on any of: bad encoding, bad
    /// signature, platform mismatch, expiry, or reuse. Must be called
    /// before any token exchange.
    pub fn verify_and_consume(
        &self,
        platform: Platform,
        state: &str,
    ) -> Result<IssuedState, AppError> {
        let decoded = URL_SAFE_NO_PAD
            .decode(state)
            .map_err(|_| AppError::StateMismatch)?;
        let decoded = String::from_utf8(decoded).map_err(|_| AppError::StateMismatch)?;

        let parts: Vec<&str> = decoded.splitn(4, '|').collect();
        if parts.len() != 4 {
            return Err(AppError::StateMismatch);
        }
        let (state_platform, nonce, timestamp_hex, signature) =
            (parts[0], parts[1], parts[2], parts[3]);

        let payload = format!("{state_platform}|{nonce}|{timestamp_hex}");
        let expected = self.sign(&payload)?;
        if signature != expected {
            tracing::warn!(platform = %platform, "OAuth state signature mismatch");
            return Err(AppError::StateMismatch);
        }

        if state_platform != platform.as_str() {
            tracing::warn!(
                expected = %platform,
                received = state_platform,
                "OAuth state platform mismatch"
            );
            return Err(AppError::StateMismatch);
        }

        let issued_at =
            u128::from_str_radix(timestamp_hex, 16).map_err(|_| AppError::StateMismatch)?;
        if now_millis()?.saturating_sub(issued_at) > STATE_TTL_MILLIS {
            return Err(AppError::StateMismatch);
        }

        // Single use: the nonce must still be pending, and is removed here.
        let (_, pending) = self
            .pending
            .remove(nonce)
            .ok_or(AppError::StateMismatch)?;

        Ok(IssuedState {
            state: state.to_string(),
            pkce_verifier: pending.pkce_verifier,
        })
    }

    fn sign(&self, payload: &str) -> Result<String, AppError> {
        let mut mac = HmacSha256::new_from_slice(&self.key)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("HMAC init failed: {e}")))?;
        mac.update(payload.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    fn random_hex(&self, bytes: usize) -> Result<String, AppError> {
        let mut buf = vec![0u8; bytes];
        self.rng
            .fill(&mut buf)
            .map_err(|_| AppError::Internal(anyhow::anyhow!("RNG failure")))?;
        Ok(hex::encode(buf))
    }

    fn sweep_expired(&self) {
        if let Ok(now) = now_millis() {
            self.pending
                .retain(|_, entry| now.saturating_sub(entry.issued_at_millis) <= STATE_TTL_MILLIS);
        }
    }
}

fn now_millis() -> Result<u128, AppError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .map_err(|e| AppError::Internal(anyhow::anyhow!("System time error: {e}")))
}
