//! Request-processing policy.
//!
//! [`CsrfProtection`] wraps one token engine and decides, per request,
//! whether to skip the mechanism, mint fresh tokens, and/or verify the
//! inbound pair. It is framework-neutral: an adapter extracts
//! [`RequestFacts`] from its request type, calls [`CsrfProtection::process`],
//! and maps the returned [`Outcome`] onto its own response mechanics.

use crate::config::{CookieOptions, CsrfConfig};
use crate::engine::{TokenEngine, TokenPair, VerifiedTokens};
use crate::error::{CsrfError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Injectable skip policy, evaluated against the adapter-extracted request
/// view. Defaults to "never".
pub type RequestPredicate = Arc<dyn Fn(&RequestFacts<'_>) -> bool + Send + Sync>;

/// The facts an adapter extracts from an inbound request.
#[derive(Debug, Clone, Default)]
pub struct RequestFacts<'a> {
    /// HTTP method, matched case-insensitively.
    pub method: &'a str,

    /// Request path, available to skip predicates.
    pub path: &'a str,

    /// Whether the adapter detected the first-POST marker header: a
    /// mutating request with no prior safe request in this flow.
    pub first_post: bool,

    /// Inbound header token, if any.
    pub header_token: Option<&'a str>,

    /// Inbound cookie token, if any.
    pub cookie_token: Option<&'a str>,
}

impl<'a> RequestFacts<'a> {
    pub fn new(method: &'a str) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }

    pub fn with_path(mut self, path: &'a str) -> Self {
        self.path = path;
        self
    }

    pub fn with_first_post(mut self, first_post: bool) -> Self {
        self.first_post = first_post;
        self
    }

    pub fn with_tokens(
        mut self,
        header_token: Option<&'a str>,
        cookie_token: Option<&'a str>,
    ) -> Self {
        self.header_token = header_token;
        self.cookie_token = cookie_token;
        self
    }
}

/// Per-route overrides, supplied on every call and allowed to vary between
/// routes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutePolicy {
    /// `Some(false)` disables the mechanism entirely for this route.
    pub enabled: Option<bool>,

    /// Skip both creation and verification.
    pub should_skip: bool,

    /// Do not mint fresh tokens this cycle.
    pub skip_create: bool,

    /// Do not verify inbound tokens, even on mutating methods.
    pub skip_verify: bool,

    /// Accept mutating requests that arrive without a prior safe request.
    pub allow_first_post: bool,
}

impl RoutePolicy {
    /// A policy with the mechanism switched off.
    pub fn disabled() -> Self {
        Self {
            enabled: Some(false),
            ..Self::default()
        }
    }

    pub fn with_should_skip(mut self, should_skip: bool) -> Self {
        self.should_skip = should_skip;
        self
    }

    pub fn with_skip_create(mut self, skip_create: bool) -> Self {
        self.skip_create = skip_create;
        self
    }

    pub fn with_skip_verify(mut self, skip_verify: bool) -> Self {
        self.skip_verify = skip_verify;
        self
    }

    pub fn with_allow_first_post(mut self, allow_first_post: bool) -> Self {
        self.allow_first_post = allow_first_post;
        self
    }
}

/// The three-outcome decision for one request.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// The mechanism does not apply; proceed without touching tokens.
    Skip,

    /// Proceed to the protected handler. `verified` carries the decoded
    /// claims when inbound tokens were checked.
    Proceed { verified: Option<VerifiedTokens> },

    /// Reject the request. The adapter chooses the transport-level response.
    Reject(CsrfError),
}

/// What the adapter must do with the response: attach `tokens` when present
/// (header value + cookie value), then act on `decision`.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    /// Freshly minted pair to attach to the outbound response. Tokens are
    /// refreshed even when verification fails - the rolling design keeps a
    /// single pair from living forever. `None` when creation was skipped.
    pub tokens: Option<TokenPair>,

    /// Whether to continue or reject.
    pub decision: Decision,
}

impl Outcome {
    /// Whether the request may proceed (skipped or verified).
    pub fn allowed(&self) -> bool {
        !matches!(self.decision, Decision::Reject(_))
    }

    /// The rejection error, if any.
    pub fn rejection(&self) -> Option<&CsrfError> {
        match &self.decision {
            Decision::Reject(error) => Some(error),
            _ => None,
        }
    }
}

/// Double-submit CSRF protection: one token engine plus the skip/verify/
/// create decision policy. Stateless beyond its immutable configuration;
/// share one instance across all requests.
#[derive(Clone)]
pub struct CsrfProtection {
    engine: TokenEngine,
    cookie_name: String,
    header_name: String,
    cookie: CookieOptions,
    should_skip: Option<RequestPredicate>,
    skip_create: Option<RequestPredicate>,
    skip_verify: Option<RequestPredicate>,
}

impl CsrfProtection {
    /// Construct from configuration. Fails on configuration errors such as
    /// a missing secret; never fails per-request afterwards.
    pub fn new(config: CsrfConfig) -> Result<Self> {
        let engine = TokenEngine::from_config(&config)?;
        Ok(Self {
            engine,
            header_name: config.header_name().to_string(),
            cookie_name: config.cookie_name,
            cookie: config.cookie,
            should_skip: None,
            skip_create: None,
            skip_verify: None,
        })
    }

    /// Skip the mechanism entirely for matching requests.
    pub fn with_should_skip(
        mut self,
        predicate: impl Fn(&RequestFacts<'_>) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.should_skip = Some(Arc::new(predicate));
        self
    }

    /// Suppress token creation for matching requests.
    pub fn with_skip_create(
        mut self,
        predicate: impl Fn(&RequestFacts<'_>) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.skip_create = Some(Arc::new(predicate));
        self
    }

    /// Suppress verification for matching requests.
    pub fn with_skip_verify(
        mut self,
        predicate: impl Fn(&RequestFacts<'_>) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.skip_verify = Some(Arc::new(predicate));
        self
    }

    /// Name of the token cookie.
    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Name of the token header.
    pub fn header_name(&self) -> &str {
        &self.header_name
    }

    /// Cookie attributes the adapter should apply when setting the token
    /// cookie.
    pub fn cookie_options(&self) -> &CookieOptions {
        &self.cookie
    }

    /// Mint a token pair directly, bypassing the request policy.
    pub fn create(&self, payload: &Value) -> Result<TokenPair> {
        self.engine.create(payload)
    }

    /// Verify a pair directly, bypassing the request policy.
    pub fn verify(&self, header_token: &str, cookie_token: &str) -> Result<VerifiedTokens> {
        self.engine.verify(header_token, cookie_token)
    }

    /// Process one request with an empty token payload.
    pub fn process(&self, request: &RequestFacts<'_>, route: &RoutePolicy) -> Result<Outcome> {
        self.process_with_payload(&Value::Null, request, route)
    }

    /// Process one request, embedding `payload` in any tokens minted this
    /// cycle.
    ///
    /// `Err` is reserved for creation failures (broken configuration or a
    /// non-object payload); verification failures are reported through
    /// [`Decision::Reject`].
    pub fn process_with_payload(
        &self,
        payload: &Value,
        request: &RequestFacts<'_>,
        route: &RoutePolicy,
    ) -> Result<Outcome> {
        let method = request.method.to_ascii_uppercase();

        // Fully skipped: diagnostic methods, caller predicate, or route
        // opt-out. First match wins; neither create nor verify runs.
        if method == "OPTIONS"
            || method == "TRACE"
            || route.enabled == Some(false)
            || route.should_skip
            || self.applies(&self.should_skip, request)
        {
            return Ok(Outcome {
                tokens: None,
                decision: Decision::Skip,
            });
        }

        let tokens = if route.skip_create || self.applies(&self.skip_create, request) {
            None
        } else {
            Some(self.engine.create(payload)?)
        };

        // Read-only requests get fresh tokens without verification.
        if method == "GET"
            || method == "HEAD"
            || route.skip_verify
            || self.applies(&self.skip_verify, request)
        {
            return Ok(Outcome {
                tokens,
                decision: Decision::Proceed { verified: None },
            });
        }

        let decision = match self.engine.verify(
            request.header_token.unwrap_or(""),
            request.cookie_token.unwrap_or(""),
        ) {
            Err(error) => Decision::Reject(error),
            Ok(_) if request.first_post && !route.allow_first_post => {
                Decision::Reject(CsrfError::FirstPostNotAllowed)
            }
            Ok(verified) => Decision::Proceed {
                verified: Some(verified),
            },
        };

        Ok(Outcome { tokens, decision })
    }

    fn applies(&self, predicate: &Option<RequestPredicate>, request: &RequestFacts<'_>) -> bool {
        predicate.as_ref().is_some_and(|p| p(request))
    }
}

impl fmt::Debug for CsrfProtection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CsrfProtection")
            .field("cookie_name", &self.cookie_name)
            .field("header_name", &self.header_name)
            .field("cookie", &self.cookie)
            .finish_non_exhaustive()
    }
}
