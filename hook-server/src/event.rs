//! Event identity derivation.
//!
//! Extracts the canonical (event, repo, ref) tuple from a decoded payload
//! in one place, so downstream code never re-derives shape assumptions from
//! the raw JSON. A payload that cannot yield a non-empty event name or
//! repository name is rejected here and becomes a 400 upstream.

use serde_json::Value;
use thiserror::Error;
use url::form_urlencoded;

/// Why a decoded payload does not carry a usable event identity.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShapeError {
    /// Missing `repository` object or missing/non-string `repository.name`.
    #[error("payload is missing repository.name")]
    MissingRepositoryName,

    /// Neither a push marker nor an `object_kind` string to name the event.
    #[error("payload carries no event kind")]
    MissingEventKind,
}

/// Canonical identity of a received webhook event.
///
/// `git_ref` may legitimately be absent; the absent case still participates
/// in key composition as an empty trailing segment, which keeps "no ref" a
/// distinct subscription identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookEvent {
    /// Event kind: `"push"` when the payload carries a commit count,
    /// otherwise the payload's `object_kind`.
    pub kind: String,

    /// Repository name from `repository.name`.
    pub repo: String,

    /// Git ref from the payload's `ref` field, when present.
    pub git_ref: Option<String>,
}

impl HookEvent {
    /// Derive the event identity from a decoded payload.
    ///
    /// A present, non-null `total_commits_count` marks a push event
    /// regardless of any `object_kind` in the payload.
    pub fn from_payload(payload: &Value) -> Result<Self, ShapeError> {
        let repo = payload
            .get("repository")
            .and_then(|r| r.get("name"))
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty())
            .ok_or(ShapeError::MissingRepositoryName)?
            .to_string();

        let is_push = payload
            .get("total_commits_count")
            .is_some_and(|count| !count.is_null());

        let kind = if is_push {
            "push".to_string()
        } else {
            payload
                .get("object_kind")
                .and_then(Value::as_str)
                .filter(|kind| !kind.is_empty())
                .ok_or(ShapeError::MissingEventKind)?
                .to_string()
        };

        let git_ref = payload
            .get("ref")
            .and_then(Value::as_str)
            .map(str::to_string);

        Ok(HookEvent {
            kind,
            repo,
            git_ref,
        })
    }

    /// The ref segment used in composed keys: empty string when absent.
    pub fn ref_segment(&self) -> &str {
        self.git_ref.as_deref().unwrap_or("")
    }

    /// `repo:ref` key. An absent ref yields a trailing empty segment
    /// (e.g. `demo:`), kept verbatim for subscriber compatibility.
    pub fn repo_ref_key(&self) -> String {
        format!("{}:{}", self.repo, self.ref_segment())
    }

    /// `event:repo` key.
    pub fn event_repo_key(&self) -> String {
        format!("{}:{}", self.kind, self.repo)
    }

    /// `event:repo:ref` key, same trailing-segment rule as `repo_ref_key`.
    pub fn event_repo_ref_key(&self) -> String {
        format!("{}:{}:{}", self.kind, self.repo, self.ref_segment())
    }
}

/// Query parameters of the webhook request, order-preserving.
///
/// Shared by reference with every listener on every key for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    /// Parse a raw query string (without the leading `?`).
    pub fn parse(raw: &str) -> Self {
        QueryParams(
            form_urlencoded::parse(raw.as_bytes())
                .map(|(name, value)| (name.into_owned(), value.into_owned()))
                .collect(),
        )
    }

    /// First value for an exact parameter name, if any.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over parameters in request order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.0.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}
