//! # Core Traits (Ports)
//!
//! Any plugin must implement these traits to be used by the binary.

use async_trait::async_trait;
use crate::error::Result;
use crate::models::{Client, LintError, Post, Suggestion, Vote, VoteCounts};
use chrono::{DateTime, Utc};
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Data persistence contract for posts, clients, votes, and suggestions.
#[async_trait]
pub trait SnipRepo: Send + Sync {
    // Post Operations
    async fn create_post(&self, post: Post) -> Result<()>;
    async fn get_post(&self, id: Uuid) -> Result<Option<Post>>;
    /// Uniform draw over all posts, minus `exclude` when given. `None` when
    /// the eligible set is empty.
    async fn random_post(&self, exclude: Option<Uuid>) -> Result<Option<Post>>;

    // Client Operations
    async fn find_or_create_client(&self, packed_addr: &[u8]) -> Result<Client>;

    // Vote Operations
    /// Duplicate-guard lookup. Advisory only: `create_vote` re-validates
    /// uniqueness at insert time.
    async fn has_voted(&self, client_id: Uuid, post_id: Uuid) -> Result<bool>;
    async fn create_vote(&self, vote: Vote) -> Result<()>;
    async fn vote_counts(&self, post_id: Uuid) -> Result<VoteCounts>;

    // Suggestion Operations
    async fn has_suggested(&self, client_id: Uuid, post_id: Uuid) -> Result<bool>;
    async fn create_suggestion(&self, suggestion: Suggestion) -> Result<()>;
    async fn list_suggestions(&self, post_id: Uuid) -> Result<Vec<Suggestion>>;
    async fn get_suggestion(&self, post_id: Uuid, suggestion_id: Uuid) -> Result<Option<Suggestion>>;

    // Moderation Operations
    /// Posts with no approval entry yet, oldest first.
    async fn pending_posts(&self) -> Result<Vec<Post>>;
    /// Records an approval. Returns `false` when the post was already
    /// approved (the existing entry is left untouched).
    async fn approve_post(&self, post_id: Uuid, approved_at: DateTime<Utc>) -> Result<bool>;
    async fn set_note(&self, post_id: Uuid, note: &str) -> Result<()>;
    /// Refused with `Conflict` while votes or suggestions reference the post.
    async fn delete_post(&self, post_id: Uuid) -> Result<()>;
}

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Request may proceed; `remaining` permits are left in the window.
    Allowed { remaining: u32 },
    /// Request is rejected; the caller should wait `retry_after`.
    Limited { retry_after: Duration },
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allowed { .. })
    }
}

/// Request throttling contract for the gated route groups.
///
/// Keys are the packed client address plus a group name, so each named
/// route group gets its own window per visitor.
pub trait RateGate: Send + Sync {
    fn check(&self, packed_addr: &[u8], group: &str) -> Decision;
}

/// Time source for rate limiting. Swappable so tests can drive time by hand.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Snippet validation contract. An empty result means the code parsed.
pub trait SnippetLinter: Send + Sync {
    fn lint(&self, code: &str) -> Vec<LintError>;
}
