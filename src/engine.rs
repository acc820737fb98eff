//! Token engine abstraction shared by the driver.
//!
//! Exactly two encoding strategies exist, selected once at construction via
//! [`EngineKind`](crate::config::EngineKind). The driver depends only on the
//! shared create/verify capability, never on engine internals.

use crate::config::{CsrfConfig, EngineKind};
use crate::error::Result;
use crate::hash_engine::HashTokenEngine;
use crate::signed_engine::SignedTokenEngine;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Claim name carrying the per-issuance correlation id.
pub const CLAIM_CORRELATION_ID: &str = "cid";

/// Claim name carrying the role tag.
pub const CLAIM_ROLE: &str = "role";

/// Which half of a token pair a token was minted for. A header token can
/// never be replayed as a cookie token or vice versa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenRole {
    Header,
    Cookie,
}

impl TokenRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenRole::Header => "header",
            TokenRole::Cookie => "cookie",
        }
    }
}

/// The unit of issuance: a header token and a cookie token sharing one
/// correlation id. The two strings are never equal; in the keyed-hash
/// engine the cookie is intentionally just the short hash salt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub header: String,
    pub cookie: String,
}

/// Claims recovered from a successfully verified pair. Adapters may read
/// arbitrary payload fields attached at creation time.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedTokens {
    /// Decoded claims of the header token.
    pub header: Value,

    /// Decoded claims of the cookie token.
    pub cookie: Value,
}

impl VerifiedTokens {
    /// The correlation id both halves share.
    pub fn correlation_id(&self) -> Option<&str> {
        self.header.get(CLAIM_CORRELATION_ID).and_then(Value::as_str)
    }
}

/// A configured token engine, one of the two encoding strategies.
#[derive(Debug, Clone)]
pub enum TokenEngine {
    Signed(SignedTokenEngine),
    Hashed(HashTokenEngine),
}

impl TokenEngine {
    /// Build the engine selected by the configuration.
    pub fn from_config(config: &CsrfConfig) -> Result<Self> {
        match config.engine {
            EngineKind::Signed => Ok(TokenEngine::Signed(SignedTokenEngine::new(config)?)),
            EngineKind::Hash => Ok(TokenEngine::Hashed(HashTokenEngine::new(config)?)),
        }
    }

    /// Mint a fresh pair embedding `payload` in both halves.
    pub fn create(&self, payload: &Value) -> Result<TokenPair> {
        match self {
            TokenEngine::Signed(engine) => engine.create(payload),
            TokenEngine::Hashed(engine) => engine.create(payload),
        }
    }

    /// Verify that the two tokens decode, correlate, and carry the right
    /// roles.
    pub fn verify(&self, header_token: &str, cookie_token: &str) -> Result<VerifiedTokens> {
        match self {
            TokenEngine::Signed(engine) => engine.verify(header_token, cookie_token),
            TokenEngine::Hashed(engine) => engine.verify(header_token, cookie_token),
        }
    }
}
