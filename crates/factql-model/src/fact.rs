//! Opaque fact handle

use serde::{Deserialize, Serialize};
use std::fmt;

/// Handle to a single fact, owned by the evaluator.
///
/// The engine only ever passes handles back to the evaluator that issued
/// them; it never inspects a fact directly. What the inner id indexes is up
/// to the evaluator implementation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct FactId(pub u64);

impl fmt::Display for FactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fact#{}", self.0)
    }
}
