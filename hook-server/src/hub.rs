//! Typed event dispatch hub.
//!
//! The hub replaces a single untyped string-keyed event bus with five
//! explicit channels, one per subscription granularity:
//!
//! | channel            | key               | listener receives          |
//! |--------------------|-------------------|----------------------------|
//! | `on_repo`          | `repo`            | event, ref, payload, query |
//! | `on_repo_ref`      | `repo:ref`        | event, payload, query      |
//! | `on_event`         | `event`           | repo, ref, payload, query  |
//! | `on_event_repo`    | `event:repo`      | ref, payload, query        |
//! | `on_event_repo_ref`| `event:repo:ref`  | payload, query             |
//!
//! Every validated request produces exactly five emissions, in the table's
//! order. Keys are exact strings; there is no pattern matching. The hub is
//! owned by the server state, not a process-wide singleton.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::Value;

use crate::event::{HookEvent, QueryParams};

/// Handle returned by subscribe calls, used to unsubscribe.
///
/// Closures have no identity to compare, so removal goes by id rather than
/// by the listener value itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Listener on a repository key: receives event kind, ref, payload, query.
pub type RepoListener = Arc<dyn Fn(&str, Option<&str>, &Value, &QueryParams) + Send + Sync>;

/// Listener on a `repo:ref` key: receives event kind, payload, query.
pub type RepoRefListener = Arc<dyn Fn(&str, &Value, &QueryParams) + Send + Sync>;

/// Listener on an event-kind key: receives repo, ref, payload, query.
pub type EventListener = Arc<dyn Fn(&str, Option<&str>, &Value, &QueryParams) + Send + Sync>;

/// Listener on an `event:repo` key: receives ref, payload, query.
pub type EventRepoListener = Arc<dyn Fn(Option<&str>, &Value, &QueryParams) + Send + Sync>;

/// Listener on an `event:repo:ref` key: receives payload, query.
pub type EventRepoRefListener = Arc<dyn Fn(&Value, &QueryParams) + Send + Sync>;

/// One channel's registry: exact string key to listeners in registration
/// order. Dispatch snapshots the listener list and invokes outside the
/// lock, so listeners may subscribe or unsubscribe reentrantly.
struct Registry<F> {
    listeners: Mutex<HashMap<String, Vec<(ListenerId, F)>>>,
}

impl<F: Clone> Registry<F> {
    fn new() -> Self {
        Registry {
            listeners: Mutex::new(HashMap::new()),
        }
    }

    fn subscribe(&self, key: String, id: ListenerId, listener: F) {
        let mut map = self.listeners.lock().expect("hub lock poisoned");
        map.entry(key).or_default().push((id, listener));
    }

    fn unsubscribe(&self, key: &str, id: ListenerId) -> bool {
        let mut map = self.listeners.lock().expect("hub lock poisoned");
        let Some(entries) = map.get_mut(key) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|(entry_id, _)| *entry_id != id);
        let removed = entries.len() != before;
        if entries.is_empty() {
            map.remove(key);
        }
        removed
    }

    fn snapshot(&self, key: &str) -> Vec<F> {
        let map = self.listeners.lock().expect("hub lock poisoned");
        map.get(key)
            .map(|entries| entries.iter().map(|(_, f)| f.clone()).collect())
            .unwrap_or_default()
    }
}

/// Publish/subscribe hub for derived webhook events.
pub struct HookHub {
    next_id: AtomicU64,
    by_repo: Registry<RepoListener>,
    by_repo_ref: Registry<RepoRefListener>,
    by_event: Registry<EventListener>,
    by_event_repo: Registry<EventRepoListener>,
    by_event_repo_ref: Registry<EventRepoRefListener>,
}

impl HookHub {
    pub fn new() -> Self {
        HookHub {
            next_id: AtomicU64::new(1),
            by_repo: Registry::new(),
            by_repo_ref: Registry::new(),
            by_event: Registry::new(),
            by_event_repo: Registry::new(),
            by_event_repo_ref: Registry::new(),
        }
    }

    fn allocate_id(&self) -> ListenerId {
        ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Subscribe to every event on a repository.
    pub fn on_repo(
        &self,
        repo: impl Into<String>,
        listener: impl Fn(&str, Option<&str>, &Value, &QueryParams) + Send + Sync + 'static,
    ) -> ListenerId {
        let id = self.allocate_id();
        self.by_repo.subscribe(repo.into(), id, Arc::new(listener));
        id
    }

    /// Subscribe to every event on a repository + ref pair. Pass the
    /// composed `repo:ref` key; an absent ref is the empty segment.
    pub fn on_repo_ref(
        &self,
        key: impl Into<String>,
        listener: impl Fn(&str, &Value, &QueryParams) + Send + Sync + 'static,
    ) -> ListenerId {
        let id = self.allocate_id();
        self.by_repo_ref.subscribe(key.into(), id, Arc::new(listener));
        id
    }

    /// Subscribe to an event kind across all repositories.
    pub fn on_event(
        &self,
        event: impl Into<String>,
        listener: impl Fn(&str, Option<&str>, &Value, &QueryParams) + Send + Sync + 'static,
    ) -> ListenerId {
        let id = self.allocate_id();
        self.by_event.subscribe(event.into(), id, Arc::new(listener));
        id
    }

    /// Subscribe to an event kind on one repository (`event:repo` key).
    pub fn on_event_repo(
        &self,
        key: impl Into<String>,
        listener: impl Fn(Option<&str>, &Value, &QueryParams) + Send + Sync + 'static,
    ) -> ListenerId {
        let id = self.allocate_id();
        self.by_event_repo.subscribe(key.into(), id, Arc::new(listener));
        id
    }

    /// Subscribe to an event kind on one repository + ref
    /// (`event:repo:ref` key).
    pub fn on_event_repo_ref(
        &self,
        key: impl Into<String>,
        listener: impl Fn(&Value, &QueryParams) + Send + Sync + 'static,
    ) -> ListenerId {
        let id = self.allocate_id();
        self.by_event_repo_ref.subscribe(key.into(), id, Arc::new(listener));
        id
    }

    /// Remove a repository listener. Returns whether anything was removed.
    pub fn off_repo(&self, repo: &str, id: ListenerId) -> bool {
        self.by_repo.unsubscribe(repo, id)
    }

    pub fn off_repo_ref(&self, key: &str, id: ListenerId) -> bool {
        self.by_repo_ref.unsubscribe(key, id)
    }

    pub fn off_event(&self, event: &str, id: ListenerId) -> bool {
        self.by_event.unsubscribe(event, id)
    }

    pub fn off_event_repo(&self, key: &str, id: ListenerId) -> bool {
        self.by_event_repo.unsubscribe(key, id)
    }

    pub fn off_event_repo_ref(&self, key: &str, id: ListenerId) -> bool {
        self.by_event_repo_ref.unsubscribe(key, id)
    }

    /// Deliver one validated event: exactly five emissions in fixed order,
    /// sharing the same payload and query across every listener. Listener
    /// panics are not caught.
    pub fn dispatch(&self, event: &HookEvent, payload: &Value, query: &QueryParams) {
        let git_ref = event.git_ref.as_deref();

        for listener in self.by_repo.snapshot(&event.repo) {
            listener(&event.kind, git_ref, payload, query);
        }
        for listener in self.by_repo_ref.snapshot(&event.repo_ref_key()) {
            listener(&event.kind, payload, query);
        }
        for listener in self.by_event.snapshot(&event.kind) {
            listener(&event.repo, git_ref, payload, query);
        }
        for listener in self.by_event_repo.snapshot(&event.event_repo_key()) {
            listener(git_ref, payload, query);
        }
        for listener in self.by_event_repo_ref.snapshot(&event.event_repo_ref_key()) {
            listener(payload, query);
        }
    }
}

impl Default for HookHub {
    fn default() -> Self {
        Self::new()
    }
}
