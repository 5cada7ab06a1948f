//! Fuzzy matching and composite relevance scoring.
//!
//! The ranking stage runs in two passes:
//! 1. A typo-tolerant Smith-Waterman pass over `title subtitle`, with the
//!    typo allowance scaled to query length.
//! 2. When that pass comes back empty or uniformly poor, three bespoke
//!    heuristics take over for short queries: substring containment,
//!    then initials, then ordered subsequence. Fallback results replace
//!    the primary set, they are never merged into it.
//!
//! Every surviving match gets a composite score blending text distance,
//! usage frequency, and a per-kind priority.

use std::time::Instant;

use frizbee::{match_list, Config};

use super::result::{Candidate, ResultKind, SearchResponse, SearchResult};
use crate::config::ScoringConfig;

/// Normalized distances above this are treated as "poor" when deciding
/// whether the fallback heuristics should run.
const POOR_DISTANCE: f64 = 0.5;

/// Fallback heuristics only apply to queries of this length.
const FALLBACK_CHARS: std::ops::RangeInclusive<usize> = 2..=10;

const SUBSTRING_AT_START_DISTANCE: f64 = 0.05;
const SUBSTRING_DISTANCE: f64 = 0.15;
const INITIALS_DISTANCE: f64 = 0.25;
const SUBSEQUENCE_DISTANCE: f64 = 0.40;

/// One candidate that survived a matching pass, with its normalized
/// text distance (0 = perfect, 1 = no evidence).
#[derive(Debug, Clone, Copy)]
struct ScoredMatch {
    index: usize,
    distance: f64,
}

/// Ranks candidates for a query using the weights it was built with.
#[derive(Debug, Clone)]
pub struct Matcher {
    scoring: ScoringConfig,
}

impl Matcher {
    pub fn new(scoring: ScoringConfig) -> Self {
        Self { scoring }
    }

    /// Rank `candidates` against `query`, truncated to `limit`.
    pub fn rank(&self, candidates: &[Candidate], query: &str, limit: usize) -> SearchResponse {
        let started = Instant::now();
        let total_candidates = candidates.len();
        let trimmed = query.trim();

        // 1. Empty query is a deliberate pass-through: provider order,
        //    unscored, for "show defaults" behavior.
        if trimmed.is_empty() {
            let results = candidates
                .iter()
                .take(limit)
                .map(|c| c.clone().into_result())
                .collect();
            return SearchResponse {
                results,
                total_candidates,
                elapsed: started.elapsed(),
            };
        }

        // 2. Primary typo-tolerant pass.
        let mut matches = primary_pass(candidates, trimmed);

        // 3. Quality gate.
        if (matches.is_empty() || matches.iter().all(|m| m.distance > POOR_DISTANCE))
            && FALLBACK_CHARS.contains(&trimmed.chars().count())
        {
            if let Some(fallback) = fallback_pass(candidates, trimmed) {
                matches = fallback;
            }
        }

        // 4. Composite score per match, then a stable sort so score ties
        //    keep their pre-sort order.
        let mut results: Vec<SearchResult> = matches
            .iter()
            .map(|m| {
                let candidate = &candidates[m.index];
                let mut result = candidate.clone().into_result();
                result.score = self.composite_score(candidate, m.distance);
                result
            })
            .collect();

        results.sort_by(|a, b| b.score.total_cmp(&a.score));
        results.truncate(limit);

        SearchResponse {
            results,
            total_candidates,
            elapsed: started.elapsed(),
        }
    }

    /// `(1 - distance) * fuzzyWeight + min(freq/100, 1) * frequencyWeight
    /// + typePriority * typeWeight`.
    fn composite_score(&self, candidate: &Candidate, distance: f64) -> f64 {
        let fuzzy = (1.0 - distance).clamp(0.0, 1.0);
        let frequency = (candidate.usage_frequency / 100.0).clamp(0.0, 1.0);
        let priority = type_priority(candidate.kind);

        fuzzy * self.scoring.fuzzy_weight
            + frequency * self.scoring.frequency_weight
            + priority * self.scoring.type_weight
    }
}

/// Static per-kind priority. Applications and resolved colors outrank
/// generic files, plugin results, and raw URLs.
pub(crate) fn type_priority(kind: ResultKind) -> f64 {
    match kind {
        ResultKind::App => 1.0,
        ResultKind::Color => 0.95,
        ResultKind::Action => 0.85,
        ResultKind::File => 0.7,
        ResultKind::Clipboard => 0.65,
        ResultKind::Bookmark => 0.6,
        ResultKind::History => 0.5,
        ResultKind::Plugin => 0.45,
        ResultKind::Url => 0.35,
    }
}

/// Typo-tolerant match over each candidate's combined title and subtitle.
/// Distances are normalized against the query's self-match score.
fn primary_pass(candidates: &[Candidate], query: &str) -> Vec<ScoredMatch> {
    let needle = query.to_lowercase();
    let options = options_for_query(&needle);

    // The score of the query matched against itself is the ceiling used
    // to turn raw scores into a 0..=1 distance.
    let self_score = match_list(&needle, &[needle.as_str()], &options)
        .first()
        .map(|entry| entry.score)
        .unwrap_or(1)
        .max(1) as f64;

    let haystacks: Vec<String> = candidates.iter().map(haystack_for).collect();
    let refs: Vec<&str> = haystacks.iter().map(String::as_str).collect();

    let mut matches: Vec<ScoredMatch> = match_list(&needle, &refs, &options)
        .into_iter()
        .filter(|entry| entry.score > 0)
        .map(|entry| ScoredMatch {
            index: entry.index as usize,
            distance: (1.0 - entry.score as f64 / self_score).clamp(0.0, 1.0),
        })
        .collect();

    // Pre-sort order is candidate order, so equal composite scores keep
    // the providers' relative ordering later.
    matches.sort_by_key(|m| m.index);
    matches
}

fn haystack_for(candidate: &Candidate) -> String {
    match &candidate.subtitle {
        Some(subtitle) => format!("{} {}", candidate.title, subtitle).to_lowercase(),
        None => candidate.title.to_lowercase(),
    }
}

/// Typo allowance scales with query length; a one-character query gets none.
fn options_for_query(query: &str) -> Config {
    let length = query.chars().count();
    let mut allowed_typos: u16 = match length {
        0 | 1 => 0,
        2..=4 => 1,
        5..=7 => 2,
        8..=12 => 3,
        _ => 4,
    };
    if let Ok(max_reasonable) = u16::try_from(length.saturating_sub(1)) {
        allowed_typos = allowed_typos.min(max_reasonable);
    }

    Config {
        max_typos: Some(allowed_typos),
        sort: false,
        ..Config::default()
    }
}

/// The three hand-rolled heuristics, applied to titles only, in strict
/// preference order. Returns `None` when nothing matched at all.
fn fallback_pass(candidates: &[Candidate], query: &str) -> Option<Vec<ScoredMatch>> {
    let needle = query.to_lowercase();
    let mut matches = Vec::new();

    for (index, candidate) in candidates.iter().enumerate() {
        let title = candidate.title.to_lowercase();

        let distance = if let Some(position) = title.find(&needle) {
            if position == 0 {
                SUBSTRING_AT_START_DISTANCE
            } else {
                SUBSTRING_DISTANCE
            }
        } else if initials_of(&title).contains(&needle) {
            INITIALS_DISTANCE
        } else if is_subsequence(&needle, &title) {
            SUBSEQUENCE_DISTANCE
        } else {
            continue;
        };

        matches.push(ScoredMatch { index, distance });
    }

    if matches.is_empty() {
        None
    } else {
        Some(matches)
    }
}

/// First letter of each whitespace-separated word.
fn initials_of(title: &str) -> String {
    title
        .split_whitespace()
        .filter_map(|word| word.chars().next())
        .collect()
}

/// Every needle character appears in the haystack in the same relative
/// order, not necessarily contiguously.
fn is_subsequence(needle: &str, haystack: &str) -> bool {
    let mut haystack_chars = haystack.chars();
    needle
        .chars()
        .all(|n| haystack_chars.by_ref().any(|h| h == n))
}
