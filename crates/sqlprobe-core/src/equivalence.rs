//! Result-set equivalence checking for (original, rewritten) query pairs.

use crate::db::SqlSession;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EquivalenceVerdict {
    True,
    False,
    Error,
    ColumnMismatch,
}

impl fmt::Display for EquivalenceVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EquivalenceVerdict::True => "TRUE",
            EquivalenceVerdict::False => "FALSE",
            EquivalenceVerdict::Error => "ERROR",
            EquivalenceVerdict::ColumnMismatch => "COLUMN_MISMATCH",
        };
        f.write_str(s)
    }
}

/// Both verdicts for one pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairVerdict {
    /// Exact sequence equality: same length, same values, same order.
    pub ordered: EquivalenceVerdict,
    /// Set equality over row tuples: order ignored, duplicates collapse.
    pub set_based: EquivalenceVerdict,
}

impl PairVerdict {
    fn error() -> Self {
        Self {
            ordered: EquivalenceVerdict::Error,
            set_based: EquivalenceVerdict::Error,
        }
    }
}

/// Compares the outputs of `original` and `candidate`. A statement that
/// cannot execute cannot be meaningfully compared, so an execution error
/// during the ordered phase fails both verdicts together. The set-based
/// phase re-executes both statements on fresh fetches and judges them
/// independently of the ordered outcome.
pub async fn compare_pair(
    session: &mut dyn SqlSession,
    original: &str,
    candidate: &str,
) -> PairVerdict {
    let first = match session.query(original).await {
        Ok(t) => t,
        Err(e) => {
            tracing::warn!(error = %e, "original statement failed in equivalence check");
            return PairVerdict::error();
        }
    };
    let second = match session.query(candidate).await {
        Ok(t) => t,
        Err(e) => {
            tracing::warn!(error = %e, "candidate statement failed in equivalence check");
            return PairVerdict::error();
        }
    };

    let ordered = if first.rows == second.rows {
        EquivalenceVerdict::True
    } else {
        EquivalenceVerdict::False
    };

    let set_based = compare_as_sets(session, original, candidate).await;

    PairVerdict { ordered, set_based }
}

/// Unordered comparison on fresh result sets, normalized to positional
/// columns so aliasing differences cannot matter.
async fn compare_as_sets(
    session: &mut dyn SqlSession,
    original: &str,
    candidate: &str,
) -> EquivalenceVerdict {
    let (first, second) = match (session.query(original).await, session.query(candidate).await) {
        (Ok(a), Ok(b)) => (a, b),
        (Err(e), _) | (_, Err(e)) => {
            tracing::warn!(error = %e, "set comparison failed to execute");
            return EquivalenceVerdict::Error;
        }
    };

    if first.columns != second.columns {
        tracing::warn!(
            left = first.columns,
            right = second.columns,
            "column count mismatch"
        );
        return EquivalenceVerdict::ColumnMismatch;
    }

    let left: HashSet<&Vec<Option<String>>> = first.rows.iter().collect();
    let right: HashSet<&Vec<Option<String>>> = second.rows.iter().collect();
    if left == right {
        EquivalenceVerdict::True
    } else {
        EquivalenceVerdict::False
    }
}
