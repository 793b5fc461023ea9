//! Word-overlap similarity for reconciliation review.
//!
//! The dedup/backfill review flow sorts candidate matches into 80/90/100
//! tiers for a human to confirm. The thresholds are load-bearing: review
//! queues are built from `match_level`, so the scoring here is pinned by
//! tests and must not be "improved" without migrating those queues.

/// Candidates at or above this score are worth surfacing
pub const SIMILAR_MIN: u8 = 80;

/// Strong candidates, pre-ticked in review
pub const SIMILAR_STRONG: u8 = 90;

/// Identical word sets
pub const SIMILAR_EXACT: u8 = 100;

/// Match tier for a candidate pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchLevel {
    None,
    Similar,
    Strong,
    Exact,
}

/// Case-insensitive word-overlap ratio in whole percent.
///
/// Counts distinct words shared by both strings against the smaller
/// word set, so a subject that is fully contained in a longer one still
/// scores 100. Empty input scores 0 against everything.
pub fn similarity(a: &str, b: &str) -> u8 {
    let words_a = word_set(a);
    let words_b = word_set(b);

    if words_a.is_empty() || words_b.is_empty() {
        return 0;
    }

    let smaller = words_a.len().min(words_b.len());
    let shared = words_a.iter().filter(|w| words_b.contains(*w)).count();

    ((shared * 100) / smaller) as u8
}

/// Tier a candidate pair by the pinned thresholds.
pub fn match_level(a: &str, b: &str) -> MatchLevel {
    let score = similarity(a, b);
    if score >= SIMILAR_EXACT {
        MatchLevel::Exact
    } else if score >= SIMILAR_STRONG {
        MatchLevel::Strong
    } else if score >= SIMILAR_MIN {
        MatchLevel::Similar
    } else {
        MatchLevel::None
    }
}

fn word_set(s: &str) -> Vec<String> {
    let mut words: Vec<String> = s
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect();
    words.sort();
    words.dedup();
    words
}
