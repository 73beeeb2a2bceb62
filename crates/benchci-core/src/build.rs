//! Builds and their check-run references.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Full commit SHA of the toolchain revision under validation.
///
/// Treated as an opaque string; webhook payloads are the source of truth
/// for its shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommitId(String);

impl CommitId {
    pub fn new(sha: impl Into<String>) -> Self {
        CommitId(sha.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short form (first 7 chars) used to tag toolchain images.
    ///
    /// Counted in chars, not bytes: the id comes straight off the wire and
    /// slicing an arbitrary payload at a byte offset can split a char.
    pub fn short(&self) -> &str {
        match self.0.char_indices().nth(7) {
            Some((idx, _)) => &self.0[..idx],
            None => &self.0,
        }
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reference to an externally created check run.
///
/// `id` is the provider's identifier; the cached `name` carries the board
/// target in the `benchci: <target>` convention. Status bookkeeping for
/// handles lives in the check-run gateway; builds only hold references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckRunHandle {
    pub id: u64,
    pub name: String,
}

impl CheckRunHandle {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// One validation of one commit across the attached board fleet.
#[derive(Debug, Clone)]
pub struct Build {
    pub commit: CommitId,
    /// Where the orchestrator fetches the prebuilt toolchain from, once
    /// upstream CI has published it.
    pub source_url: Option<String>,
    /// Still waiting for upstream CI to publish the artifact.
    pub awaiting_ci: bool,
    pub created_at: DateTime<Utc>,
    /// Time bound for the poller's workflow-run search. Suite-queued builds
    /// only match runs created after this; re-request builds carry no bound
    /// because the matching run predates the retry.
    pub poll_after: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Check runs attached to this build, keyed by board target. A
    /// `BTreeMap` keeps board processing order deterministic.
    pub runs: BTreeMap<String, CheckRunHandle>,
}

impl Build {
    pub fn new(commit: CommitId) -> Self {
        let now = Utc::now();
        Self {
            commit,
            source_url: None,
            awaiting_ci: true,
            created_at: now,
            poll_after: Some(now),
            completed_at: None,
            runs: BTreeMap::new(),
        }
    }

    /// Build scoped to a single re-requested target. No poll bound: the
    /// workflow run that produced the artifact already exists.
    pub fn for_rerequest(commit: CommitId, target: impl Into<String>, handle: CheckRunHandle) -> Self {
        let mut build = Build::new(commit);
        build.poll_after = None;
        build.runs.insert(target.into(), handle);
        build
    }

    pub fn attach_run(&mut self, target: impl Into<String>, handle: CheckRunHandle) {
        self.runs.insert(target.into(), handle);
    }

    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }
}
