use crate::value::{Collation, Value, ValueHash, ValueHasher};
use std::fmt;

///
/// RouteCacheKey
///
/// Digest of the rule fingerprint, the trimmed SQL text and the bound values
/// at the routing parameter positions, in position order.
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct RouteCacheKey(ValueHash);

impl RouteCacheKey {
    /// Positions past the end of `params` hash as null; eligibility checks
    /// reject such executions before a key is built.
    #[must_use]
    pub fn new(
        rule_fingerprint: ValueHash,
        sql: &str,
        sharding_param_positions: &[usize],
        params: &[Value],
    ) -> Self {
        let sql = sql.trim();
        let mut hasher = ValueHasher::new();
        hasher.push_bytes(&rule_fingerprint.get().to_be_bytes());
        hasher.push_bytes(sql.as_bytes());
        hasher.push_bytes(&(sharding_param_positions.len() as u64).to_be_bytes());
        for position in sharding_param_positions {
            hasher.push_bytes(&(*position as u64).to_be_bytes());
            hasher.push(params.get(*position).unwrap_or(&Value::Null), Collation::Binary);
        }

        Self(hasher.finish())
    }

    #[must_use]
    pub const fn digest(self) -> ValueHash {
        self.0
    }
}

impl fmt::Display for RouteCacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
