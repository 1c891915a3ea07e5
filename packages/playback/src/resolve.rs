//! Free-text resolution scoring
//!
//! Turns search candidates into a ranked choice. Exact name matches beat
//! substring matches beat non-matches; an artist hint contributes a smaller
//! weight than the name. The acceptance threshold is supplied by the caller
//! (a tunable, not a constant).

use chorus_spotify_client::SearchItem;

/// Weight of the name component in the combined score
const NAME_WEIGHT: f64 = 0.7;

/// Weight of the artist component in the combined score
const ARTIST_WEIGHT: f64 = 0.3;

/// Score a single name against the query: 1.0 exact, 0.7 substring, 0.0 none
fn name_score(query: &str, candidate: &str) -> f64 {
    let query = query.trim().to_lowercase();
    let candidate = candidate.trim().to_lowercase();
    if query == candidate {
        1.0
    } else if candidate.contains(&query) || query.contains(&candidate) {
        0.7
    } else {
        0.0
    }
}

/// Combined score for a search candidate.
///
/// With an artist hint the score is a weighted average of name and artist
/// components; without one the name score stands alone.
pub(crate) fn score_candidate(query: &str, artist_hint: Option<&str>, item: &SearchItem) -> f64 {
    let name = name_score(query, &item.name);
    match (artist_hint, item.artist.as_deref()) {
        (Some(hint), Some(artist)) => NAME_WEIGHT * name + ARTIST_WEIGHT * name_score(hint, artist),
        _ => name,
    }
}

/// Pick the best-scoring candidate above the threshold, if any
pub(crate) fn best_match<'a>(
    items: &'a [SearchItem],
    query: &str,
    artist_hint: Option<&str>,
    min_score: f64,
) -> Option<&'a SearchItem> {
    items
        .iter()
        .map(|item| (score_candidate(query, artist_hint, item), item))
        .filter(|(score, _)| *score > min_score)
        .max_by(|(a, _), (b, _)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(_, item)| item)
}
