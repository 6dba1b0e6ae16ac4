//! # Visitor Session State
//!
//! Typed view over the cookie session. The whole struct is read once per
//! request and written back whole; it carries UX state only — the duplicate
//! guard's uniqueness key is the client address, never the session.

use actix_session::Session;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

const SESSION_KEY: &str = "visitor";

/// A vote this visitor already cast, echoed back by the index page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRecord {
    pub vote_id: Uuid,
    pub is_bad: bool,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct VisitorState {
    #[serde(default)]
    pub seen_posts: HashSet<Uuid>,
    #[serde(default)]
    pub suggestions_by_post: HashMap<Uuid, Uuid>,
    #[serde(default)]
    pub votes_by_post: HashMap<Uuid, VoteRecord>,
}

impl VisitorState {
    /// A fresh or unreadable session yields the default state.
    pub fn load(session: &Session) -> Self {
        session
            .get::<VisitorState>(SESSION_KEY)
            .ok()
            .flatten()
            .unwrap_or_default()
    }

    pub fn store(self, session: &Session) {
        if let Err(err) = session.insert(SESSION_KEY, self) {
            log::warn!("failed to persist visitor session: {err}");
        }
    }
}
