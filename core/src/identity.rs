//! Identity reconciliation — one canonical account id per deposit user.
//!
//! Two independent passes:
//!   1. `candidate_id`: per row. Self-paid rows offer their payer id;
//!      rows paid by someone else offer `NeedsReview`.
//!   2. `resolve_ids`: per user. Missing candidates are dropped; more than
//!      one distinct remaining candidate collapses to `NeedsReview`.

use crate::types::UserKey;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// Text written in place of an id that a human has to check.
pub const REVIEW_SENTINEL: &str = "revisar ID";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UserId {
    Resolved(f64),
    NeedsReview,
}

impl UserId {
    pub fn is_review(&self) -> bool {
        matches!(self, UserId::NeedsReview)
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserId::Resolved(id) => f.write_str(&crate::source::render_number(*id)),
            UserId::NeedsReview  => f.write_str(REVIEW_SENTINEL),
        }
    }
}

// Serialized the way the exported sheet shows it: a number or the sentinel.
impl Serialize for UserId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            UserId::Resolved(id) => serializer.serialize_f64(*id),
            UserId::NeedsReview  => serializer.serialize_str(REVIEW_SENTINEL),
        }
    }
}

/// Pass 1. `payer_id` is the already-coerced numeric id (`None` if
/// unparsable). Payer and payee are compared after trimming.
pub fn candidate_id(payer: &str, payee: &str, payer_id: Option<f64>) -> Option<UserId> {
    if payer.trim() == payee.trim() {
        payer_id.map(UserId::Resolved)
    } else {
        Some(UserId::NeedsReview)
    }
}

/// Pass 2. `candidates` is every (user, candidate) pair in row order.
/// Users whose candidates are all missing are absent from the result.
pub fn resolve_ids<I>(candidates: I) -> BTreeMap<UserKey, UserId>
where
    I: IntoIterator<Item = (UserKey, Option<UserId>)>,
{
    let mut distinct: BTreeMap<UserKey, Vec<UserId>> = BTreeMap::new();
    for (user, candidate) in candidates {
        let Some(candidate) = candidate else { continue };
        let seen = distinct.entry(user).or_default();
        if !seen.contains(&candidate) {
            seen.push(candidate);
        }
    }

    distinct
        .into_iter()
        .map(|(user, seen)| {
            let resolved = match seen.as_slice() {
                [only] => *only,
                _ => UserId::NeedsReview,
            };
            (user, resolved)
        })
        .collect()
}
