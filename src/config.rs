//! Engine and driver configuration.

use crate::hash_engine::HashAlgorithm;
use crate::id_generator::IdGenerator;
use serde::{Deserialize, Serialize};

/// Default name used for both the token header and the token cookie.
pub const DEFAULT_TOKEN_NAME: &str = "x-csrf-jwt";

/// Default expiry window for freshly minted token pairs.
pub const DEFAULT_EXPIRES_IN: &str = "1h";

/// Which token encoding strategy backs the protection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// Signed-claim tokens (JWT, HS256). Tamper-evident via signature,
    /// expiry enforced by the signing scheme.
    #[default]
    Signed,

    /// Keyed-hash tokens: faster, smaller cookie, no encryption. Security
    /// rests entirely on secret length, so the secret should be 1024+ bytes.
    Hash,
}

/// Claim and header parameters forwarded verbatim to the signed-claim
/// engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClaimOptions {
    /// `aud` claim; also enforced at verification.
    pub audience: Option<String>,

    /// `iss` claim; also enforced at verification.
    pub issuer: Option<String>,

    /// `sub` claim.
    pub subject: Option<String>,

    /// `jti` claim.
    pub jwt_id: Option<String>,

    /// `nbf` claim as a duration spec relative to issuance, e.g. `"0s"`.
    pub not_before: Option<String>,

    /// `kid` header parameter, stamped on both signed halves.
    pub key_id: Option<String>,

    /// `cty` header parameter.
    pub content_type: Option<String>,
}

impl ClaimOptions {
    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn with_jwt_id(mut self, jwt_id: impl Into<String>) -> Self {
        self.jwt_id = Some(jwt_id.into());
        self
    }

    pub fn with_not_before(mut self, spec: impl Into<String>) -> Self {
        self.not_before = Some(spec.into());
        self
    }

    pub fn with_key_id(mut self, key_id: impl Into<String>) -> Self {
        self.key_id = Some(key_id.into());
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// Cookie SameSite attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl SameSite {
    pub fn as_str(&self) -> &'static str {
        match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        }
    }
}

/// Attributes the adapter should set on the token cookie.
///
/// This is policy, not mechanism: the core never writes a `Set-Cookie`
/// header itself. `http_only` defaults to true - scripts may read the
/// header token from a same-origin response but must never be able to read
/// the cookie half, which is what makes the double-submit pairing work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CookieOptions {
    /// Cookie path. Defaults to `/`.
    pub path: String,

    /// HTTPS-only flag. Defaults to false; set true in production TLS
    /// deployments.
    pub secure: bool,

    /// Deny script access to the cookie. Defaults to true.
    pub http_only: bool,

    /// Optional cookie domain.
    pub domain: Option<String>,

    /// Optional SameSite policy.
    pub same_site: Option<SameSite>,
}

impl Default for CookieOptions {
    fn default() -> Self {
        Self {
            path: "/".to_string(),
            secure: false,
            http_only: true,
            domain: None,
            same_site: None,
        }
    }
}

impl CookieOptions {
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn with_http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn with_same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = Some(same_site);
        self
    }
}

/// CSRF protection configuration. Constructed once, immutable for the life
/// of the engine; independently configured instances (different secrets,
/// different routes) coexist without interference.
#[derive(Debug, Clone)]
pub struct CsrfConfig {
    /// Secret material shared by both token halves. Required; engine
    /// construction fails on an empty secret. The keyed-hash engine wants
    /// 1024+ bytes.
    pub secret: String,

    /// Expiry window as a duration spec. Defaults to [`DEFAULT_EXPIRES_IN`].
    pub expires_in: String,

    /// Name of the token cookie. Defaults to [`DEFAULT_TOKEN_NAME`].
    pub cookie_name: String,

    /// Name of the token header. Defaults to the cookie name.
    pub header_name: Option<String>,

    /// Token encoding strategy.
    pub engine: EngineKind,

    /// Digest used by the keyed-hash engine.
    pub hash_algorithm: HashAlgorithm,

    /// Correlation id strategy.
    pub id_generator: IdGenerator,

    /// Claim parameters for the signed-claim engine.
    pub claims: ClaimOptions,

    /// Cookie attribute policy handed to the adapter.
    pub cookie: CookieOptions,
}

impl CsrfConfig {
    /// Create a configuration with the given secret and defaults everywhere
    /// else.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            expires_in: DEFAULT_EXPIRES_IN.to_string(),
            cookie_name: DEFAULT_TOKEN_NAME.to_string(),
            header_name: None,
            engine: EngineKind::default(),
            hash_algorithm: HashAlgorithm::default(),
            id_generator: IdGenerator::default(),
            claims: ClaimOptions::default(),
            cookie: CookieOptions::default(),
        }
    }

    /// Generate a random alphanumeric secret of the given length. Handy for
    /// the keyed-hash engine, which wants 1024+ bytes.
    pub fn generate_secret(len: usize) -> String {
        use rand::Rng;
        rand::rng()
            .sample_iter(rand::distr::Alphanumeric)
            .take(len)
            .map(char::from)
            .collect()
    }

    /// Effective header name: the configured one, or the cookie name.
    pub fn header_name(&self) -> &str {
        self.header_name.as_deref().unwrap_or(&self.cookie_name)
    }

    pub fn with_expires_in(mut self, spec: impl Into<String>) -> Self {
        self.expires_in = spec.into();
        self
    }

    pub fn with_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.cookie_name = name.into();
        self
    }

    pub fn with_header_name(mut self, name: impl Into<String>) -> Self {
        self.header_name = Some(name.into());
        self
    }

    pub fn with_engine(mut self, engine: EngineKind) -> Self {
        self.engine = engine;
        self
    }

    pub fn with_hash_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.hash_algorithm = algorithm;
        self
    }

    pub fn with_id_generator(mut self, id_generator: IdGenerator) -> Self {
        self.id_generator = id_generator;
        self
    }

    pub fn with_claims(mut self, claims: ClaimOptions) -> Self {
        self.claims = claims;
        self
    }

    pub fn with_cookie(mut self, cookie: CookieOptions) -> Self {
        self.cookie = cookie;
        self
    }
}
