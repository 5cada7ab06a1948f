//! Query dispatcher - orchestrates one search from raw query to ranked list.
//!
//! The pipeline per query:
//! 1. Gather candidates from every registered [`CandidateSource`]
//! 2. Fill in usage frequency for candidates whose provider left it at 0
//! 3. Rank candidates with the fuzzy matcher and composite scorer
//! 4. Resolve inline results (hex colors, URL-shaped queries)
//! 5. Ask the trigger resolver which extensions may respond, invoke each
//!    one's `search` concurrently, and append their results after the
//!    ranked static results in registration order
//!
//! Extension calls run under isolation: an error, panic, or timeout is
//! recorded against that extension's sandbox context and contributes zero
//! results. One bad extension never empties the response.

use std::time::Instant;

use tokio::time::timeout;
use tracing::{debug, warn};

use crate::config::Config;
use crate::core::matcher::Matcher;
use crate::core::result::{Candidate, ResultKind, SearchResponse, SearchResult};
use crate::executor::ActionData;
use crate::extensions::loader::ExtensionHost;
use crate::extensions::triggers::{resolve_eligible, AbbreviationStore};
use crate::services::usage::UsageTracker;

/// A provider of static candidates (apps, files, clipboard history,
/// bookmarks). How the records were produced or persisted is the
/// provider's business; the dispatcher only consumes the snapshot.
pub trait CandidateSource: Send + Sync {
    fn name(&self) -> &str;

    fn candidates(&self) -> Vec<Candidate>;
}

/// A fixed in-memory candidate list. Useful for embedders with their own
/// indexing and for tests.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    name: String,
    items: Vec<Candidate>,
}

impl StaticSource {
    pub fn new(name: impl Into<String>, items: Vec<Candidate>) -> Self {
        Self {
            name: name.into(),
            items,
        }
    }
}

impl CandidateSource for StaticSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn candidates(&self) -> Vec<Candidate> {
        self.items.clone()
    }
}

/// The search service that powers the launcher's unified result list.
pub struct SearchService {
    matcher: Matcher,
    sources: Vec<Box<dyn CandidateSource>>,
    usage: Option<UsageTracker>,
    config: Config,
}

impl SearchService {
    pub fn new(config: Config) -> Self {
        Self {
            matcher: Matcher::new(config.scoring.clone()),
            sources: Vec::new(),
            usage: None,
            config,
        }
    }

    /// Register a candidate provider. Providers are queried in
    /// registration order on every search.
    pub fn add_source(&mut self, source: Box<dyn CandidateSource>) {
        self.sources.push(source);
    }

    pub fn with_source(mut self, source: Box<dyn CandidateSource>) -> Self {
        self.add_source(source);
        self
    }

    /// Attach a usage tracker; its scores feed the frequency term for
    /// candidates whose provider reported none.
    pub fn with_usage(mut self, usage: UsageTracker) -> Self {
        self.usage = Some(usage);
        self
    }

    pub fn usage(&self) -> Option<&UsageTracker> {
        self.usage.as_ref()
    }

    /// Record that the user picked a result, feeding future frequency
    /// scores.
    pub fn record_selection(&mut self, result: &SearchResult) {
        if let Some(usage) = &mut self.usage {
            usage.record_use(&result.id, result.kind);
        }
    }

    /// Run one query through the whole pipeline.
    ///
    /// `total_candidates` in the response counts statically gathered
    /// candidates; inline and extension results are contributions, not
    /// candidates. `elapsed` covers the full dispatch including extension
    /// calls.
    pub async fn search(
        &self,
        query: &str,
        host: &mut ExtensionHost,
        abbreviations: &AbbreviationStore,
    ) -> SearchResponse {
        let started = Instant::now();

        // 1. Static candidates
        let mut candidates = Vec::new();
        for source in &self.sources {
            candidates.extend(source.candidates());
        }

        // 2. Usage frequency for providers that track none themselves
        if let Some(usage) = &self.usage {
            for candidate in &mut candidates {
                if candidate.usage_frequency == 0.0 {
                    candidate.usage_frequency = usage.frequency(&candidate.id);
                }
            }
        }

        // 3. Rank
        let mut response = self
            .matcher
            .rank(&candidates, query, self.config.search.max_results);

        // 4. Inline results go ahead of the ranked list
        let inline = inline_results(query);
        if !inline.is_empty() {
            let ranked = std::mem::take(&mut response.results);
            response.results = inline;
            response.results.extend(ranked);
        }

        // 5. Extension contributions, merged in registration order
        let contributions = self.dispatch_extensions(query, host, abbreviations).await;
        response.results.extend(contributions);

        response.results.truncate(self.config.search.max_results);
        response.elapsed = started.elapsed();
        response
    }

    /// Invoke every eligible extension's search entry point and collect
    /// the results in registration order.
    ///
    /// Calls are started concurrently but merged strictly in the order the
    /// extensions were registered, so completion timing never reorders the
    /// list. A timed-out task is abandoned, not cancelled; its output is
    /// discarded when it eventually finishes.
    async fn dispatch_extensions(
        &self,
        query: &str,
        host: &mut ExtensionHost,
        abbreviations: &AbbreviationStore,
    ) -> Vec<SearchResult> {
        let eligible = resolve_eligible(query, host, abbreviations);
        if eligible.is_empty() {
            return Vec::new();
        }

        let modules = host.modules_for(&eligible);
        let limit = self.config.search.extension_timeout();

        let tasks: Vec<_> = modules
            .into_iter()
            .map(|(id, module)| {
                let query = query.to_string();
                let task = tokio::spawn(async move { module.search(&query).await });
                (id, task)
            })
            .collect();

        let mut merged = Vec::new();
        for (id, task) in tasks {
            match timeout(limit, task).await {
                Ok(Ok(Ok(mut results))) => {
                    debug!("extension {id} contributed {} results", results.len());
                    for result in &mut results {
                        result.source = Some(id.clone());
                    }
                    host.clear_search_error(&id);
                    merged.extend(results);
                }
                Ok(Ok(Err(e))) => {
                    warn!("extension {id} search failed: {e}");
                    host.record_search_error(&id, e.to_string());
                }
                Ok(Err(join_error)) => {
                    warn!("extension {id} search panicked: {join_error}");
                    host.record_search_error(&id, "panicked during search");
                }
                Err(_) => {
                    warn!(
                        "extension {id} search timed out after {}ms",
                        limit.as_millis()
                    );
                    host.record_search_error(
                        &id,
                        format!("timed out after {}ms", limit.as_millis()),
                    );
                }
            }
        }
        merged
    }
}

/// Results resolved directly from the query text, without any candidate.
fn inline_results(query: &str) -> Vec<SearchResult> {
    let mut results = Vec::new();

    if let Some((r, g, b)) = parse_hex_color(query) {
        let hex = query.trim().to_string();
        results.push(
            SearchResult::new(format!("color:{hex}"), hex.clone(), ResultKind::Color)
                .with_subtitle(format!("rgb({r}, {g}, {b})"))
                .with_action(ActionData::clipboard(hex)),
        );
    }

    if let Some(url) = detect_url(query) {
        results.push(
            SearchResult::new(format!("url:{url}"), query.trim(), ResultKind::Url)
                .with_subtitle("Open in browser")
                .with_action(ActionData::open_url(url)),
        );
    }

    results
}

/// Parse `#rgb` or `#rrggbb` into channel values.
fn parse_hex_color(query: &str) -> Option<(u8, u8, u8)> {
    let hex = query.trim().strip_prefix('#')?;
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }

    match hex.len() {
        3 => {
            let mut nibbles = hex.chars().filter_map(|c| c.to_digit(16));
            let r = nibbles.next()? as u8;
            let g = nibbles.next()? as u8;
            let b = nibbles.next()? as u8;
            Some((r * 17, g * 17, b * 17))
        }
        6 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            Some((r, g, b))
        }
        _ => None,
    }
}

/// Recognize a URL-shaped query. `www.` hosts get an https scheme.
fn detect_url(query: &str) -> Option<String> {
    let trimmed = query.trim();
    if trimmed.is_empty() || trimmed.contains(char::is_whitespace) {
        return None;
    }

    for scheme in ["http://", "https://"] {
        if let Some(rest) = trimmed.strip_prefix(scheme) {
            return (!rest.is_empty()).then(|| trimmed.to_string());
        }
    }

    let rest = trimmed.strip_prefix("www.")?;
    rest.contains('.').then(|| format!("https://{trimmed}"))
}
