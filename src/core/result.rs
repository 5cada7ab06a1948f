//! Result and candidate types shared across the pipeline.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::executor::ActionData;
use crate::extensions::ExtensionId;

/// Category of a search result, used by the type-priority term of the
/// composite score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultKind {
    App,
    File,
    Clipboard,
    Bookmark,
    History,
    Plugin,
    Action,
    Url,
    Color,
}

/// A ranked entry in the launcher's result list.
///
/// `score` is only meaningful after the scorer has run; before that it is
/// `0.0`. `source` is a weak reference to the contributing extension id,
/// lookup-only, never ownership.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    /// Unique within one result set.
    pub id: String,

    pub title: String,

    #[serde(default)]
    pub subtitle: Option<String>,

    #[serde(default)]
    pub icon: Option<String>,

    #[serde(rename = "type")]
    pub kind: ResultKind,

    #[serde(default)]
    pub score: f64,

    /// Originating extension id or trigger string, when not a static result.
    #[serde(default)]
    pub source: Option<ExtensionId>,

    /// Zero-argument capability invocation to run when the user picks this.
    #[serde(default)]
    pub action: ActionData,
}

impl SearchResult {
    pub fn new(id: impl Into<String>, title: impl Into<String>, kind: ResultKind) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            subtitle: None,
            icon: None,
            kind,
            score: 0.0,
            source: None,
            action: ActionData::None,
        }
    }

    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }

    pub fn with_action(mut self, action: ActionData) -> Self {
        self.action = action;
        self
    }
}

/// An unranked item supplied by a candidate provider.
///
/// Providers report `usage_frequency` on a 0–100 scale; the scorer clamps
/// anything above 100.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub id: String,

    pub title: String,

    #[serde(default)]
    pub subtitle: Option<String>,

    #[serde(default)]
    pub icon: Option<String>,

    #[serde(rename = "type")]
    pub kind: ResultKind,

    #[serde(default)]
    pub usage_frequency: f64,

    /// What selecting this candidate does. Attached at construction time so
    /// the ranked result stays executable without a second lookup.
    #[serde(default)]
    pub action: ActionData,
}

impl Candidate {
    pub fn new(id: impl Into<String>, title: impl Into<String>, kind: ResultKind) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            subtitle: None,
            icon: None,
            kind,
            usage_frequency: 0.0,
            action: ActionData::None,
        }
    }

    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }

    pub fn with_frequency(mut self, usage_frequency: f64) -> Self {
        self.usage_frequency = usage_frequency;
        self
    }

    pub fn with_action(mut self, action: ActionData) -> Self {
        self.action = action;
        self
    }

    /// Convert into an unranked result, carrying the candidate's action.
    pub fn into_result(self) -> SearchResult {
        SearchResult {
            id: self.id,
            title: self.title,
            subtitle: self.subtitle,
            icon: self.icon,
            kind: self.kind,
            score: 0.0,
            source: None,
            action: self.action,
        }
    }
}

/// A completed search: the ranked list plus observability metadata.
///
/// `total_candidates` counts everything considered before truncation;
/// `elapsed` is wall time for the whole dispatch. Neither feeds ranking.
#[derive(Debug, Clone)]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,
    pub total_candidates: usize,
    pub elapsed: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_kind_serializes_lowercase() {
        let json = serde_json::to_string(&ResultKind::Bookmark).unwrap();
        assert_eq!(json, "\"bookmark\"");

        let kind: ResultKind = serde_json::from_str("\"app\"").unwrap();
        assert_eq!(kind, ResultKind::App);
    }

    #[test]
    fn test_search_result_wire_shape() {
        let result = SearchResult::new("app:firefox", "Firefox", ResultKind::App)
            .with_subtitle("Web Browser");

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["type"], "app");
        assert_eq!(value["title"], "Firefox");
        assert_eq!(value["score"], 0.0);

        let back: SearchResult = serde_json::from_value(value).unwrap();
        assert_eq!(back.id, "app:firefox");
        assert_eq!(back.kind, ResultKind::App);
    }

    #[test]
    fn test_candidate_into_result_keeps_action() {
        let candidate = Candidate::new("url:1", "Example", ResultKind::Url)
            .with_action(ActionData::open_url("https://example.com"));

        let result = candidate.into_result();
        assert_eq!(result.score, 0.0);
        assert!(matches!(result.action, ActionData::OpenUrl(_)));
    }
}
