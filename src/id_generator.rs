//! Correlation id generation.
//!
//! Every token pair embeds a per-issuance correlation id so that header and
//! cookie halves from unrelated issuances cannot be mixed. The ids exist for
//! correlation, not secrecy.

use crate::expiry::to_base36;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Strategy for producing correlation ids.
#[derive(Clone, Default)]
pub enum IdGenerator {
    /// UUID v4 from a cryptographically secure source (default).
    #[default]
    Uuid,

    /// A fast, collision-tolerant id combining a random component with a
    /// millisecond timestamp, e.g. `2s53xp2feox_jeohy54s`. Lower-quality
    /// randomness than [`IdGenerator::Uuid`]; acceptable here because the id
    /// only correlates the two halves of a pair.
    Simple,

    /// Caller-supplied generator. Must never return an empty string; engine
    /// construction checks this once and fails otherwise.
    Custom(Arc<dyn Fn() -> String + Send + Sync>),
}

impl IdGenerator {
    /// Produce one id.
    pub fn generate(&self) -> String {
        match self {
            IdGenerator::Uuid => Uuid::new_v4().to_string(),
            IdGenerator::Simple => simple_id(),
            IdGenerator::Custom(generate) => generate(),
        }
    }

    /// Wrap a custom generator function.
    pub fn custom(generate: impl Fn() -> String + Send + Sync + 'static) -> Self {
        IdGenerator::Custom(Arc::new(generate))
    }
}

impl fmt::Debug for IdGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdGenerator::Uuid => f.write_str("IdGenerator::Uuid"),
            IdGenerator::Simple => f.write_str("IdGenerator::Simple"),
            IdGenerator::Custom(_) => f.write_str("IdGenerator::Custom(..)"),
        }
    }
}

fn simple_id() -> String {
    let random: u64 = rand::random();
    let now_ms = chrono::Utc::now().timestamp_millis().max(0) as u64;
    format!("{}_{}", to_base36(random), to_base36(now_ms))
}
