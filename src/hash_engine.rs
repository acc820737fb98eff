//! Keyed-hash token engine.
//!
//! A non-encrypting, lower-overhead alternative to the signed-claim engine.
//! The payload is only base64-encoded - tokens carry nothing secret, since
//! anyone can obtain a valid pair with a GET request anyway. What matters is
//! the browser restriction that cross-site scripts can neither read the
//! cookie nor set the custom header. Origin is proven by a keyed digest over
//! the token content, so security rests entirely on secret length: use a
//! 1024+ byte secret.
//!
//! Wire format:
//!
//! ```text
//! content     = version "." base36(nowSeconds) "." expiresInSpec
//!               "." base64(JSON(payload)) "." correlationId
//! digest      = base64(sha(content "-" secret "-" shaKey))
//! headerToken = content "." digest
//! cookieToken = shaKey            (a second fresh correlation id)
//! ```

use crate::config::CsrfConfig;
use crate::engine::{CLAIM_CORRELATION_ID, CLAIM_ROLE, TokenPair, TokenRole, VerifiedTokens};
use crate::error::{CsrfError, Result};
use crate::expiry::{self, from_base36, to_base36};
use crate::id_generator::IdGenerator;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use sha2::{Digest, Sha256, Sha512};
use std::fmt;

/// Version tag leading every hash token. Bump on format changes.
pub const TOKEN_FORMAT_VERSION: &str = "1";

/// Secrets shorter than this trigger a construction-time warning.
pub const RECOMMENDED_SECRET_LEN: usize = 1024;

const TOKEN_PARTS: usize = 6;

/// Digest backing the keyed hash.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    #[default]
    Sha256,
    Sha512,
}

/// Keyed-hash token engine.
#[derive(Clone)]
pub struct HashTokenEngine {
    secret: String,
    expires_in: String,
    id_generator: IdGenerator,
    algorithm: HashAlgorithm,
}

impl HashTokenEngine {
    /// Build an engine from configuration. A short secret logs a warning
    /// but never fails construction.
    pub fn new(config: &CsrfConfig) -> Result<Self> {
        if config.secret.is_empty() {
            return Err(CsrfError::MissingSecret);
        }

        // The spec is embedded between dots in the token, so it must not
        // contain the delimiter itself.
        expiry::parse_spec(&config.expires_in)?;
        if config.expires_in.contains('.') {
            return Err(CsrfError::Config(format!(
                "hash engine expiry spec must not contain '.': {:?}",
                config.expires_in
            )));
        }

        if config.id_generator.generate().is_empty() {
            return Err(CsrfError::Config(
                "id generator must not return empty ids".to_string(),
            ));
        }

        if config.secret.len() < RECOMMENDED_SECRET_LEN {
            log::warn!(
                "hash token engine secret is {} bytes; set a {}+ byte secret, \
                 token security depends entirely on its length",
                config.secret.len(),
                RECOMMENDED_SECRET_LEN
            );
        }

        Ok(Self {
            secret: config.secret.clone(),
            expires_in: config.expires_in.clone(),
            id_generator: config.id_generator.clone(),
            algorithm: config.hash_algorithm,
        })
    }

    /// Mint a header/cookie pair embedding `payload`.
    pub fn create(&self, payload: &Value) -> Result<TokenPair> {
        let encoded_payload = match payload {
            Value::Null => String::new(),
            Value::Object(_) => {
                let bytes = serde_json::to_vec(payload)
                    .map_err(|e| CsrfError::Encoding(e.to_string()))?;
                STANDARD.encode(bytes)
            }
            _ => {
                return Err(CsrfError::Encoding(
                    "token payload must be a JSON object".to_string(),
                ));
            }
        };

        let now_sec = to_base36(chrono::Utc::now().timestamp().max(0) as u64);
        let correlation_id = self.id_generator.generate();
        let content = format!(
            "{TOKEN_FORMAT_VERSION}.{now_sec}.{}.{encoded_payload}.{correlation_id}",
            self.expires_in
        );

        Ok(self.encode_pair(&content, &self.id_generator.generate()))
    }

    fn encode_pair(&self, content: &str, sha_key: &str) -> TokenPair {
        let digest = self.digest(&format!("{content}-{}-{sha_key}", self.secret));
        TokenPair {
            header: format!("{content}.{digest}"),
            cookie: sha_key.to_string(),
        }
    }

    fn digest(&self, content: &str) -> String {
        match self.algorithm {
            HashAlgorithm::Sha256 => {
                let mut hasher = Sha256::new();
                hasher.update(content.as_bytes());
                STANDARD.encode(hasher.finalize())
            }
            HashAlgorithm::Sha512 => {
                let mut hasher = Sha512::new();
                hasher.update(content.as_bytes());
                STANDARD.encode(hasher.finalize())
            }
        }
    }

    /// Verify a pair: the header token must parse, be unexpired, and carry a
    /// digest keyed by the secret and the cookie token.
    pub fn verify(&self, header_token: &str, cookie_token: &str) -> Result<VerifiedTokens> {
        if header_token.is_empty() || cookie_token.is_empty() {
            return Err(CsrfError::MissingToken);
        }

        let parts: Vec<&str> = header_token.split('.').collect();
        if parts.len() != TOKEN_PARTS || parts[0] != TOKEN_FORMAT_VERSION {
            return Err(CsrfError::BadToken(
                "malformed token structure".to_string(),
            ));
        }

        let issued_sec = from_base36(parts[1])
            .ok_or_else(|| CsrfError::BadToken("unparseable timestamp".to_string()))?;
        let window = expiry::parse_spec(parts[2])
            .map_err(|_| CsrfError::BadToken("unparseable expiry spec".to_string()))?;
        let now_ms = chrono::Utc::now().timestamp_millis().max(0) as u128;
        if issued_sec as u128 * 1000 + window.as_millis() < now_ms {
            return Err(CsrfError::BadToken("token expired".to_string()));
        }

        let content = parts[..TOKEN_PARTS - 1].join(".");
        let expected = self.digest(&format!("{content}-{}-{cookie_token}", self.secret));
        if !constant_time_eq(&expected, parts[5]) {
            return Err(CsrfError::InvalidToken("digest mismatch"));
        }

        let payload = decode_payload(parts[3])?;
        let correlation_id = parts[4];
        Ok(VerifiedTokens {
            header: claims_for(TokenRole::Header, correlation_id, &payload),
            cookie: claims_for(TokenRole::Cookie, correlation_id, &payload),
        })
    }
}

impl fmt::Debug for HashTokenEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashTokenEngine")
            .field("expires_in", &self.expires_in)
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

fn decode_payload(encoded: &str) -> Result<Map<String, Value>> {
    if encoded.is_empty() {
        return Ok(Map::new());
    }
    let bytes = STANDARD
        .decode(encoded)
        .map_err(|e| CsrfError::BadToken(format!("undecodable payload: {e}")))?;
    match serde_json::from_slice(&bytes) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(CsrfError::BadToken(
            "payload is not a JSON object".to_string(),
        )),
        Err(e) => Err(CsrfError::BadToken(format!("undecodable payload: {e}"))),
    }
}

fn claims_for(role: TokenRole, correlation_id: &str, payload: &Map<String, Value>) -> Value {
    let mut claims = payload.clone();
    claims.insert(CLAIM_ROLE.to_string(), json!(role.as_str()));
    claims.insert(CLAIM_CORRELATION_ID.to_string(), json!(correlation_id));
    Value::Object(claims)
}

/// Constant-time comparison; digest checks must not leak prefix length
/// through timing.
fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut acc = 0u8;
    for (byte_a, byte_b) in a.bytes().zip(b.bytes()) {
        acc |= byte_a ^ byte_b;
    }
    acc == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineKind;

    fn engine_with(config: CsrfConfig) -> HashTokenEngine {
        HashTokenEngine::new(&config.with_engine(EngineKind::Hash)).unwrap()
    }

    fn engine() -> HashTokenEngine {
        engine_with(CsrfConfig::new(CsrfConfig::generate_secret(1024)))
    }

    #[test]
    fn test_debug_redacts_secret() {
        let engine = engine_with(CsrfConfig::new("short but memorable"));
        let rendered = format!("{engine:?}");
        assert!(rendered.starts_with("HashTokenEngine"));
        assert!(!rendered.contains("short but memorable"));
    }

    #[test]
    fn test_create_and_verify() {
        let engine = engine();
        let pair = engine.create(&json!({})).unwrap();
        let verified = engine.verify(&pair.header, &pair.cookie).unwrap();
        assert_eq!(verified.header[CLAIM_ROLE], "header");
        assert_eq!(verified.cookie[CLAIM_ROLE], "cookie");
        assert_eq!(
            verified.header[CLAIM_CORRELATION_ID],
            verified.cookie[CLAIM_CORRELATION_ID]
        );
    }

    #[test]
    fn test_cookie_token_is_just_the_salt() {
        let engine = engine();
        let pair = engine.create(&json!({})).unwrap();
        assert!(pair.cookie.len() < 64);
        assert!(pair.header.len() > pair.cookie.len());
        assert_eq!(pair.header.split('.').count(), TOKEN_PARTS);
    }

    #[test]
    fn test_payload_round_trips() {
        let engine = engine();
        let pair = engine.create(&json!({ "ip": "10.0.0.1" })).unwrap();
        let verified = engine.verify(&pair.header, &pair.cookie).unwrap();
        assert_eq!(verified.header["ip"], "10.0.0.1");
        assert_eq!(verified.cookie["ip"], "10.0.0.1");
    }

    #[test]
    fn test_null_payload_verifies_to_bare_claims() {
        let engine = engine();
        let pair = engine.create(&Value::Null).unwrap();
        let verified = engine.verify(&pair.header, &pair.cookie).unwrap();
        assert_eq!(verified.header.as_object().unwrap().len(), 2);
    }

    #[test]
    fn test_missing_tokens() {
        let engine = engine();
        let pair = engine.create(&json!({})).unwrap();
        assert_eq!(engine.verify("", ""), Err(CsrfError::MissingToken));
        assert_eq!(engine.verify(&pair.header, ""), Err(CsrfError::MissingToken));
        assert_eq!(engine.verify("", &pair.cookie), Err(CsrfError::MissingToken));
    }

    #[test]
    fn test_mixed_pairs_have_digest_mismatch() {
        let engine = engine();
        let first = engine.create(&json!({})).unwrap();
        let second = engine.create(&json!({})).unwrap();
        assert_eq!(
            engine.verify(&first.header, &second.cookie),
            Err(CsrfError::InvalidToken("digest mismatch"))
        );
        assert_eq!(
            engine.verify(&second.header, &first.cookie),
            Err(CsrfError::InvalidToken("digest mismatch"))
        );
    }

    #[test]
    fn test_garbage_header_is_bad() {
        let engine = engine();
        assert!(matches!(
            engine.verify("garbage", "garbage"),
            Err(CsrfError::BadToken(_))
        ));
    }

    #[test]
    fn test_version_mismatch_is_bad() {
        let engine = engine();
        let pair = engine.create(&json!({})).unwrap();
        let forged = format!("2{}", &pair.header[1..]);
        assert!(matches!(
            engine.verify(&forged, &pair.cookie),
            Err(CsrfError::BadToken(_))
        ));
    }

    #[test]
    fn test_undecodable_payload_is_bad() {
        // Correctly signed content whose payload part is not base64 JSON.
        let engine = engine();
        let now_sec = to_base36(chrono::Utc::now().timestamp() as u64);
        let bad_payload = STANDARD.encode("foo");
        let content = format!("1.{now_sec}.1h.{bad_payload}.12345");
        let pair = engine.encode_pair(&content, "bar");
        assert!(matches!(
            engine.verify(&pair.header, &pair.cookie),
            Err(CsrfError::BadToken(_))
        ));
    }

    #[test]
    fn test_expired_pair_is_bad() {
        let secret = CsrfConfig::generate_secret(1024);
        let engine = engine_with(CsrfConfig::new(secret).with_expires_in("0s"));
        let pair = engine.create(&json!({})).unwrap();
        // Issuance is second-granular, so the zero window may not have
        // elapsed within this second; re-sign the content one hour back.
        let mut parts: Vec<String> = pair.header.split('.').map(str::to_string).collect();
        parts[1] = to_base36((chrono::Utc::now().timestamp() - 3600) as u64);
        let stale = engine.encode_pair(&parts[..5].join("."), &pair.cookie);
        assert_eq!(
            engine.verify(&stale.header, &stale.cookie),
            Err(CsrfError::BadToken("token expired".to_string()))
        );
    }

    #[test]
    fn test_short_secret_still_works() {
        // Warns but constructs, and the tokens still round-trip.
        let engine = engine_with(CsrfConfig::new("short secret"));
        let pair = engine.create(&json!({})).unwrap();
        assert!(engine.verify(&pair.header, &pair.cookie).is_ok());
    }

    #[test]
    fn test_empty_secret_rejected() {
        let config = CsrfConfig::new("").with_engine(EngineKind::Hash);
        assert_eq!(
            HashTokenEngine::new(&config).unwrap_err(),
            CsrfError::MissingSecret
        );
    }

    #[test]
    fn test_dotted_expiry_spec_rejected() {
        let config = CsrfConfig::new("secret")
            .with_engine(EngineKind::Hash)
            .with_expires_in("1.5h");
        assert!(matches!(
            HashTokenEngine::new(&config),
            Err(CsrfError::Config(_))
        ));
    }

    #[test]
    fn test_sha512_round_trip() {
        let secret = CsrfConfig::generate_secret(1024);
        let engine = engine_with(CsrfConfig::new(secret).with_hash_algorithm(HashAlgorithm::Sha512));
        let pair = engine.create(&json!({})).unwrap();
        assert!(engine.verify(&pair.header, &pair.cookie).is_ok());
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq("abc", "abc"));
        assert!(!constant_time_eq("abc", "abd"));
        assert!(!constant_time_eq("abc", "abcd"));
    }
}
