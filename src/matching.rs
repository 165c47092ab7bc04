//! Relevance scoring for catalog search hits.
//!
//! Given the candidates returned by a catalog search and the target
//! (artist, title), each candidate is scored on how well its fields
//! match; zero-score candidates are dropped and the rest ordered
//! best-first. Whether an empty result triggers a broader search or a
//! placeholder record is the import engine's call, not the scorer's.

use crate::catalog::CandidateRecord;

const EXACT_MATCH_SCORE: i64 = 100;
const PARTIAL_MATCH_SCORE: i64 = 50;

/// A candidate with its computed relevance score.
#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    pub candidate: CandidateRecord,
    pub score: i64,
}

/// Score one field pair: exact match scores full, a substring match in
/// either direction scores half, anything else zero.
fn field_score(candidate_value: &str, target_value: &str) -> i64 {
    let candidate_value = candidate_value.to_lowercase();
    let target_value = target_value.to_lowercase();

    if candidate_value == target_value {
        EXACT_MATCH_SCORE
    } else if candidate_value.contains(&target_value) || target_value.contains(&candidate_value) {
        PARTIAL_MATCH_SCORE
    } else {
        0
    }
}

/// Filter and order candidates by relevance to the target.
///
/// Candidates scoring zero on both fields are discarded; the remainder
/// is sorted descending by score with ties keeping the catalog's
/// original result order.
pub fn score_candidates(
    candidates: Vec<CandidateRecord>,
    target_artist: &str,
    target_title: &str,
) -> Vec<ScoredCandidate> {
    let mut scored: Vec<ScoredCandidate> = candidates
        .into_iter()
        .map(|candidate| {
            let score = field_score(&candidate.artist, target_artist)
                + field_score(&candidate.title, target_title);
            ScoredCandidate { candidate, score }
        })
        .filter(|s| s.score > 0)
        .collect();

    // Stable sort preserves catalog order between equal scores
    scored.sort_by(|a, b| b.score.cmp(&a.score));
    scored
}
