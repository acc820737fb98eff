use thiserror::Error;

/// Errors produced while configuring engines or processing requests.
///
/// Construction-time errors (`MissingSecret`, `Config`) are fatal: the
/// engine refuses to initialize. Verification errors are per-request and
/// recoverable; the same engine instance keeps serving later requests.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CsrfError {
    /// A non-empty secret is required to construct any token engine.
    #[error("missing secret: CSRF token engines require a non-empty secret")]
    MissingSecret,

    /// The request carried no header token or no cookie token on a path
    /// that requires verification.
    #[error("missing CSRF token")]
    MissingToken,

    /// The token could not be decoded: malformed structure, bad signature,
    /// or expired.
    #[error("bad CSRF token: {0}")]
    BadToken(String),

    /// The token decoded cleanly but the pair does not belong together:
    /// correlation id, role tag, or digest mismatch. Evidence of tampering
    /// or cross-session replay.
    #[error("invalid CSRF token: {0}")]
    InvalidToken(&'static str),

    /// A mutating request arrived without a prior safe request in the same
    /// flow, and the route did not opt in to allowing it.
    #[error("first POST is not allowed on this route")]
    FirstPostNotAllowed,

    /// Invalid engine configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Token creation failed. Only reachable with broken configuration or
    /// a non-object payload.
    #[error("token encoding failed: {0}")]
    Encoding(String),
}

impl CsrfError {
    /// Whether this error rejects a single request rather than indicating a
    /// configuration problem. Adapters map rejections to a client error
    /// response; everything else should fail loudly at startup.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            CsrfError::MissingToken
                | CsrfError::BadToken(_)
                | CsrfError::InvalidToken(_)
                | CsrfError::FirstPostNotAllowed
        )
    }
}

pub type Result<T> = std::result::Result<T, CsrfError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_classification() {
        assert!(CsrfError::MissingToken.is_rejection());
        assert!(CsrfError::BadToken("expired".to_string()).is_rejection());
        assert!(CsrfError::InvalidToken("digest mismatch").is_rejection());
        assert!(CsrfError::FirstPostNotAllowed.is_rejection());

        assert!(!CsrfError::MissingSecret.is_rejection());
        assert!(!CsrfError::Config("bad expiry".to_string()).is_rejection());
    }
}
