//! Signed-claim token engine.
//!
//! Issues a pair of HS256-signed claim tokens sharing a correlation id.
//! Neither half can be forged without the shared secret, and the embedded
//! `exp` claim bounds the pair's lifetime.

use crate::config::{ClaimOptions, CsrfConfig};
use crate::engine::{CLAIM_CORRELATION_ID, CLAIM_ROLE, TokenPair, TokenRole, VerifiedTokens};
use crate::error::{CsrfError, Result};
use crate::expiry;
use crate::id_generator::IdGenerator;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde_json::{Map, Value, json};
use std::fmt;
use std::time::Duration;

/// Signed-claim (JWT) token engine.
#[derive(Clone)]
pub struct SignedTokenEngine {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    expires_in: Duration,
    not_before: Option<Duration>,
    id_generator: IdGenerator,
    claims: ClaimOptions,
}

impl SignedTokenEngine {
    /// Build an engine from configuration. Fails on an empty secret, an
    /// unparseable expiry spec, or an id generator that yields empty ids.
    pub fn new(config: &CsrfConfig) -> Result<Self> {
        if config.secret.is_empty() {
            return Err(CsrfError::MissingSecret);
        }

        let expires_in = expiry::parse_spec(&config.expires_in)?;
        let not_before = config
            .claims
            .not_before
            .as_deref()
            .map(expiry::parse_spec)
            .transpose()?;

        if config.id_generator.generate().is_empty() {
            return Err(CsrfError::Config(
                "id generator must not return empty ids".to_string(),
            ));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked manually below so that the boundary second
        // counts as expired; a "0s" pair is dead on arrival.
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.leeway = 0;
        validation.validate_aud = config.claims.audience.is_some();
        if let Some(audience) = &config.claims.audience {
            validation.set_audience(&[audience]);
        }
        if let Some(issuer) = &config.claims.issuer {
            validation.set_issuer(&[issuer]);
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            expires_in,
            not_before,
            id_generator: config.id_generator.clone(),
            claims: config.claims.clone(),
        })
    }

    /// Mint a header/cookie pair carrying `payload` plus the engine's claim
    /// parameters.
    pub fn create(&self, payload: &Value) -> Result<TokenPair> {
        let correlation_id = self.id_generator.generate();
        Ok(TokenPair {
            header: self.sign_half(payload, &correlation_id, TokenRole::Header)?,
            cookie: self.sign_half(payload, &correlation_id, TokenRole::Cookie)?,
        })
    }

    fn sign_half(&self, payload: &Value, correlation_id: &str, role: TokenRole) -> Result<String> {
        let mut claims = match payload {
            Value::Object(map) => map.clone(),
            Value::Null => Map::new(),
            _ => {
                return Err(CsrfError::Encoding(
                    "token payload must be a JSON object".to_string(),
                ));
            }
        };

        let now = chrono::Utc::now().timestamp();
        claims.insert(CLAIM_CORRELATION_ID.to_string(), json!(correlation_id));
        claims.insert(CLAIM_ROLE.to_string(), json!(role.as_str()));
        claims.insert("iat".to_string(), json!(now));
        claims.insert(
            "exp".to_string(),
            json!(now + self.expires_in.as_secs() as i64),
        );
        if let Some(not_before) = self.not_before {
            claims.insert("nbf".to_string(), json!(now + not_before.as_secs() as i64));
        }
        if let Some(audience) = &self.claims.audience {
            claims.insert("aud".to_string(), json!(audience));
        }
        if let Some(issuer) = &self.claims.issuer {
            claims.insert("iss".to_string(), json!(issuer));
        }
        if let Some(subject) = &self.claims.subject {
            claims.insert("sub".to_string(), json!(subject));
        }
        if let Some(jwt_id) = &self.claims.jwt_id {
            claims.insert("jti".to_string(), json!(jwt_id));
        }

        let mut header = Header::new(Algorithm::HS256);
        header.kid = self.claims.key_id.clone();
        header.cty = self.claims.content_type.clone();

        encode(&header, &Value::Object(claims), &self.encoding_key)
            .map_err(|e| CsrfError::Encoding(e.to_string()))
    }

    /// Verify a pair: both halves must decode under the secret, share a
    /// correlation id, and carry the header/cookie roles respectively.
    pub fn verify(&self, header_token: &str, cookie_token: &str) -> Result<VerifiedTokens> {
        if header_token.is_empty() || cookie_token.is_empty() {
            return Err(CsrfError::MissingToken);
        }

        let header = self.decode_half(header_token)?;
        let cookie = self.decode_half(cookie_token)?;

        let header_cid = header
            .get(CLAIM_CORRELATION_ID)
            .and_then(Value::as_str)
            .unwrap_or("");
        let cookie_cid = cookie
            .get(CLAIM_CORRELATION_ID)
            .and_then(Value::as_str)
            .unwrap_or("");
        if header_cid.is_empty() || header_cid != cookie_cid {
            return Err(CsrfError::InvalidToken("correlation id mismatch"));
        }

        let header_role = header.get(CLAIM_ROLE).and_then(Value::as_str);
        let cookie_role = cookie.get(CLAIM_ROLE).and_then(Value::as_str);
        if header_role != Some(TokenRole::Header.as_str())
            || cookie_role != Some(TokenRole::Cookie.as_str())
        {
            return Err(CsrfError::InvalidToken("role mismatch"));
        }

        Ok(VerifiedTokens { header, cookie })
    }

    fn decode_half(&self, token: &str) -> Result<Value> {
        let claims = decode::<Value>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| CsrfError::BadToken(e.to_string()))?;

        let now = chrono::Utc::now().timestamp();
        match claims.get("exp").and_then(Value::as_i64) {
            Some(exp) if exp > now => {}
            Some(_) => return Err(CsrfError::BadToken("token expired".to_string())),
            None => return Err(CsrfError::BadToken("missing exp claim".to_string())),
        }
        if let Some(nbf) = claims.get("nbf").and_then(Value::as_i64) {
            if nbf > now {
                return Err(CsrfError::BadToken("token not yet valid".to_string()));
            }
        }

        Ok(claims)
    }
}

impl fmt::Debug for SignedTokenEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignedTokenEngine")
            .field("expires_in", &self.expires_in)
            .field("not_before", &self.not_before)
            .field("claims", &self.claims)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(config: CsrfConfig) -> SignedTokenEngine {
        SignedTokenEngine::new(&config).unwrap()
    }

    #[test]
    fn test_create_and_verify() {
        let engine = engine(CsrfConfig::new("test 123"));
        let pair = engine.create(&json!({})).unwrap();
        assert!(!pair.header.is_empty());
        assert!(!pair.cookie.is_empty());
        assert_ne!(pair.header, pair.cookie);

        let verified = engine.verify(&pair.header, &pair.cookie).unwrap();
        assert_eq!(verified.header[CLAIM_ROLE], "header");
        assert_eq!(verified.cookie[CLAIM_ROLE], "cookie");
        assert_eq!(
            verified.header[CLAIM_CORRELATION_ID],
            verified.cookie[CLAIM_CORRELATION_ID]
        );
    }

    #[test]
    fn test_payload_round_trips() {
        let engine = engine(CsrfConfig::new("test 123"));
        let pair = engine.create(&json!({ "ip": "10.0.0.1" })).unwrap();
        let verified = engine.verify(&pair.header, &pair.cookie).unwrap();
        assert_eq!(verified.header["ip"], "10.0.0.1");
        assert_eq!(verified.cookie["ip"], "10.0.0.1");
    }

    #[test]
    fn test_garbage_tokens_are_bad() {
        let engine = engine(CsrfConfig::new("test 123"));
        let result = engine.verify("foo", "bar");
        assert!(matches!(result, Err(CsrfError::BadToken(_))));
    }

    #[test]
    fn test_mixed_pairs_are_invalid() {
        let engine = engine(CsrfConfig::new("test 123"));
        let first = engine.create(&json!({})).unwrap();
        let second = engine.create(&json!({})).unwrap();
        assert_eq!(
            engine.verify(&first.header, &second.cookie),
            Err(CsrfError::InvalidToken("correlation id mismatch"))
        );
    }

    #[test]
    fn test_swapped_roles_are_invalid() {
        let engine = engine(CsrfConfig::new("test 123"));
        let pair = engine.create(&json!({})).unwrap();
        assert_eq!(
            engine.verify(&pair.cookie, &pair.header),
            Err(CsrfError::InvalidToken("role mismatch"))
        );
    }

    #[test]
    fn test_missing_tokens() {
        let engine = engine(CsrfConfig::new("test 123"));
        assert_eq!(engine.verify("", ""), Err(CsrfError::MissingToken));
        let pair = engine.create(&json!({})).unwrap();
        assert_eq!(engine.verify("", &pair.cookie), Err(CsrfError::MissingToken));
        assert_eq!(engine.verify(&pair.header, ""), Err(CsrfError::MissingToken));
    }

    #[test]
    fn test_expired_pair_is_bad() {
        let engine = engine(CsrfConfig::new("test 123").with_expires_in("0s"));
        let pair = engine.create(&json!({})).unwrap();
        assert!(matches!(
            engine.verify(&pair.header, &pair.cookie),
            Err(CsrfError::BadToken(_))
        ));
    }

    #[test]
    fn test_empty_secret_rejected() {
        assert_eq!(
            SignedTokenEngine::new(&CsrfConfig::new("")).unwrap_err(),
            CsrfError::MissingSecret
        );
    }

    #[test]
    fn test_empty_id_generator_rejected() {
        let config =
            CsrfConfig::new("test 123").with_id_generator(IdGenerator::custom(String::new));
        assert!(matches!(
            SignedTokenEngine::new(&config),
            Err(CsrfError::Config(_))
        ));
    }

    #[test]
    fn test_scalar_payload_rejected() {
        let engine = engine(CsrfConfig::new("test 123"));
        assert!(matches!(
            engine.create(&json!(42)),
            Err(CsrfError::Encoding(_))
        ));
    }

    #[test]
    fn test_issuer_and_audience_claims() {
        let config = CsrfConfig::new("test 123").with_claims(
            ClaimOptions::default()
                .with_issuer("csrf-pair")
                .with_audience("browser")
                .with_subject("session"),
        );
        let engine = engine(config);
        let pair = engine.create(&json!({})).unwrap();
        let verified = engine.verify(&pair.header, &pair.cookie).unwrap();
        assert_eq!(verified.header["iss"], "csrf-pair");
        assert_eq!(verified.header["aud"], "browser");
        assert_eq!(verified.header["sub"], "session");
    }

    #[test]
    fn test_key_id_and_content_type_header_parameters() {
        let config = CsrfConfig::new("test 123").with_claims(
            ClaimOptions::default()
                .with_key_id("rotation-2026-08")
                .with_content_type("JWT"),
        );
        let engine = engine(config);
        let pair = engine.create(&json!({})).unwrap();

        for token in [&pair.header, &pair.cookie] {
            let decoded = jsonwebtoken::decode_header(token).unwrap();
            assert_eq!(decoded.kid.as_deref(), Some("rotation-2026-08"));
            assert_eq!(decoded.cty.as_deref(), Some("JWT"));
        }
        assert!(engine.verify(&pair.header, &pair.cookie).is_ok());
    }

    #[test]
    fn test_debug_redacts_key_material() {
        let rendered = format!("{:?}", engine(CsrfConfig::new("test 123")));
        assert!(rendered.starts_with("SignedTokenEngine"));
        assert!(!rendered.contains("test 123"));
    }

    #[test]
    fn test_cross_secret_rejection() {
        let minting = engine(CsrfConfig::new("secret one"));
        let verifying = engine(CsrfConfig::new("secret two"));
        let pair = minting.create(&json!({})).unwrap();
        assert!(matches!(
            verifying.verify(&pair.header, &pair.cookie),
            Err(CsrfError::BadToken(_))
        ));
    }
}
