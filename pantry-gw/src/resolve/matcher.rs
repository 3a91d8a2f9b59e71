//! Name normalization and candidate scoring
//!
//! Pure functions; everything here is deterministic and total.

use serde::Serialize;

pub const SCORE_EXACT: u8 = 100;
pub const SCORE_PREFIX: u8 = 60;
pub const SCORE_CONTAINS: u8 = 30;

/// Canonical token form of a free-text name: lowercased, trimmed, with
/// every character outside `[a-z0-9\s]` stripped.
pub fn normalize(s: &str) -> String {
    s.to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace())
        .collect::<String>()
        .trim()
        .to_string()
}

/// Ordinal match score of a normalized candidate against a normalized query
///
/// Exact → 100, prefix → 60, substring → 30, otherwise 0. Scores are never
/// combined or weighted; ties keep backend iteration order.
pub fn score(candidate_norm: &str, query_norm: &str) -> u8 {
    if query_norm.is_empty() {
        return 0;
    }
    if candidate_norm == query_norm {
        SCORE_EXACT
    } else if candidate_norm.starts_with(query_norm) {
        SCORE_PREFIX
    } else if candidate_norm.contains(query_norm) {
        SCORE_CONTAINS
    } else {
        0
    }
}

/// A candidate with its match score
#[derive(Debug, Clone, Serialize)]
pub struct Scored<T> {
    pub entity: T,
    pub score: u8,
}

/// Score every candidate against `query`, drop zero scores, and sort
/// descending by score. The sort is stable, so equal scores keep the
/// candidate set's original order.
pub fn rank<'a, T, F>(query: &str, candidates: &'a [T], name: F) -> Vec<Scored<&'a T>>
where
    F: Fn(&T) -> &str,
{
    let query_norm = normalize(query);

    let mut ranked: Vec<Scored<&T>> = candidates
        .iter()
        .map(|c| Scored {
            score: score(&normalize(name(c)), &query_norm),
            entity: c,
        })
        .filter(|s| s.score > 0)
        .collect();

    ranked.sort_by_key(|s| std::cmp::Reverse(s.score));
    ranked
}
