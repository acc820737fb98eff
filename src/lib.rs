//! # csrf-pair
//!
//! Stateless double-submit CSRF protection built on paired,
//! cryptographically-bound tokens: one delivered in a custom header, one in
//! an `HttpOnly` cookie. A request is accepted only when both halves decode
//! under the shared secret, carry the same per-issuance correlation id, and
//! carry the right role tags - a cross-site attacker can trigger the
//! cookie-bearing request but can neither read nor forge the header half.
//!
//! ## Features
//!
//! - **Two token engines** - signed-claim (JWT, HS256) or keyed-hash
//!   (SHA-2 over the token content, smaller cookie, no encryption), selected
//!   once at construction
//! - **Stateless** - nothing is persisted server-side; every token carries
//!   its own expiry and correlation state
//! - **Framework-neutral driver** - adapters hand in [`RequestFacts`] and
//!   map the returned [`Outcome`] onto their own response mechanics
//! - **Per-route policy** - skip, verify-only, create-only, and first-POST
//!   overrides via [`RoutePolicy`] and injectable predicates
//! - **Rolling tokens** - fresh pairs are minted even while verifying old
//!   ones, so no pair lives forever
//!
//! ## Quick Start
//!
//! ```rust
//! use csrf_pair::{CsrfConfig, CsrfProtection, Decision, RequestFacts, RoutePolicy};
//!
//! let config = CsrfConfig::new(CsrfConfig::generate_secret(1024));
//! let csrf = CsrfProtection::new(config).unwrap();
//!
//! // Safe request: mints a fresh pair, verifies nothing.
//! let outcome = csrf
//!     .process(&RequestFacts::new("GET"), &RoutePolicy::default())
//!     .unwrap();
//! let tokens = outcome.tokens.expect("fresh pair for the response");
//! assert!(matches!(outcome.decision, Decision::Proceed { .. }));
//!
//! // Mutating request presenting both halves: verified, then allowed.
//! let request = RequestFacts::new("POST")
//!     .with_tokens(Some(&tokens.header), Some(&tokens.cookie));
//! let outcome = csrf.process(&request, &RoutePolicy::default()).unwrap();
//! assert!(outcome.allowed());
//!
//! // Mutating request with no tokens: rejected.
//! let outcome = csrf
//!     .process(&RequestFacts::new("POST"), &RoutePolicy::default())
//!     .unwrap();
//! assert!(!outcome.allowed());
//! ```
//!
//! ## Keyed-hash engine
//!
//! ```rust
//! use csrf_pair::{CsrfConfig, CsrfProtection, EngineKind};
//!
//! // The hash engine trades the JWT signature for a keyed SHA-256 digest;
//! // its security rests entirely on secret length, so use 1024+ bytes.
//! let config = CsrfConfig::new(CsrfConfig::generate_secret(1024))
//!     .with_engine(EngineKind::Hash);
//! let csrf = CsrfProtection::new(config).unwrap();
//!
//! let pair = csrf.create(&serde_json::json!({})).unwrap();
//! assert!(csrf.verify(&pair.header, &pair.cookie).is_ok());
//! // The cookie half is just a short salt, not a full token.
//! assert!(pair.cookie.len() < pair.header.len());
//! ```
//!
//! ## Adapter contract
//!
//! The core never touches a concrete request or response. Per request, an
//! adapter extracts the method, the first-POST marker, and both inbound
//! tokens into [`RequestFacts`], then:
//!
//! 1. attaches `outcome.tokens` (when present) as the
//!    [`header_name`](CsrfProtection::header_name) response header and the
//!    [`cookie_name`](CsrfProtection::cookie_name) cookie, using
//!    [`cookie_options`](CsrfProtection::cookie_options) for the attributes;
//! 2. continues to the protected handler on [`Decision::Skip`] /
//!    [`Decision::Proceed`], or rejects the single request on
//!    [`Decision::Reject`] with a client error of its choosing.

pub mod config;
pub mod driver;
pub mod engine;
pub mod error;
pub mod expiry;
pub mod hash_engine;
pub mod id_generator;
pub mod signed_engine;

pub use config::{
    ClaimOptions, CookieOptions, CsrfConfig, DEFAULT_EXPIRES_IN, DEFAULT_TOKEN_NAME, EngineKind,
    SameSite,
};
pub use driver::{CsrfProtection, Decision, Outcome, RequestFacts, RequestPredicate, RoutePolicy};
pub use engine::{TokenEngine, TokenPair, TokenRole, VerifiedTokens};
pub use error::{CsrfError, Result};
pub use hash_engine::{HashAlgorithm, HashTokenEngine, RECOMMENDED_SECRET_LEN};
pub use id_generator::IdGenerator;
pub use signed_engine::SignedTokenEngine;
