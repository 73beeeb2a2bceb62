//! In-memory build registry.
//!
//! One entry per commit under validation. The webhook listener, the queue
//! consumer, and the poller all share the registry behind an `Arc`; the
//! mutex serializes their writes. Nothing is persisted: state lost on
//! restart is rebuilt by startup reconciliation against the check-run API.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{Duration, Utc};
use tracing::debug;

use crate::build::{Build, CheckRunHandle, CommitId};

#[derive(Debug, Default)]
pub struct BuildRegistry {
    builds: Mutex<HashMap<String, Build>>,
}

impl BuildRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a build for the commit. Returns `None` when one already
    /// exists; duplicate suite deliveries must not reset in-flight state.
    pub fn create(&self, commit: &CommitId) -> Option<Build> {
        let mut builds = self.builds.lock().unwrap();
        if builds.contains_key(commit.as_str()) {
            return None;
        }
        let build = Build::new(commit.clone());
        builds.insert(commit.as_str().to_string(), build.clone());
        Some(build)
    }

    /// Install a build, replacing any existing entry for the commit. The
    /// re-request path uses this to scope a fresh build to one target.
    pub fn replace(&self, build: Build) {
        let mut builds = self.builds.lock().unwrap();
        builds.insert(build.commit.as_str().to_string(), build);
    }

    pub fn get(&self, commit: &CommitId) -> Option<Build> {
        self.builds.lock().unwrap().get(commit.as_str()).cloned()
    }

    pub fn attach_run(&self, commit: &CommitId, target: &str, handle: CheckRunHandle) {
        let mut builds = self.builds.lock().unwrap();
        if let Some(build) = builds.get_mut(commit.as_str()) {
            build.attach_run(target, handle);
        }
    }

    /// Record the resolved firmware source and clear the pending-CI flag.
    pub fn set_source_url(&self, commit: &CommitId, url: impl Into<String>) {
        let mut builds = self.builds.lock().unwrap();
        if let Some(build) = builds.get_mut(commit.as_str()) {
            build.source_url = Some(url.into());
            build.awaiting_ci = false;
        }
    }

    /// Snapshot of builds still waiting for upstream CI to publish an
    /// artifact. The poller walks these every tick.
    pub fn awaiting_ci(&self) -> Vec<Build> {
        self.builds
            .lock()
            .unwrap()
            .values()
            .filter(|b| b.awaiting_ci && !b.is_completed())
            .cloned()
            .collect()
    }

    pub fn mark_completed(&self, commit: &CommitId) {
        let mut builds = self.builds.lock().unwrap();
        if let Some(build) = builds.get_mut(commit.as_str()) {
            build.completed_at = Some(Utc::now());
        }
    }

    /// Eviction pass: drop completed builds older than `completed_ttl` and
    /// builds still waiting on CI older than `abandoned_ttl`. Builds that
    /// are queued or running (artifact attached, not yet completed) are
    /// never evicted. Returns how many entries were dropped.
    pub fn evict_finished(&self, completed_ttl: Duration, abandoned_ttl: Duration) -> usize {
        let now = Utc::now();
        let mut builds = self.builds.lock().unwrap();
        let before = builds.len();
        builds.retain(|_, build| match build.completed_at {
            Some(done) => now - done < completed_ttl,
            None => !(build.awaiting_ci && now - build.created_at > abandoned_ttl),
        });
        let evicted = before - builds.len();
        if evicted > 0 {
            debug!(evicted, remaining = builds.len(), "evicted finished builds");
        }
        evicted
    }

    pub fn len(&self) -> usize {
        self.builds.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
