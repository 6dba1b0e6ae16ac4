//! # Domain Models
//!
//! These structs represent the core entities of Snipvote.
//! We use UUID v7 for time-ordered, globally unique identification —
//! the ascending-id scan order is also what the random selector pages over.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use uuid::Uuid;

/// A submitted code snippet, shown to visitors for judgment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub code: String,
    /// Moderation note attached by an admin after review.
    pub note: Option<String>,
    /// Client that submitted the snippet, when the origin was resolvable.
    pub submitter_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// A visitor identity, keyed by packed IP address.
///
/// Created lazily on the first write action and never updated. The packed
/// form is 4 bytes for IPv4 and 16 for IPv6.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub id: Uuid,
    pub ip_address: Vec<u8>,
    pub created_at: DateTime<Utc>,
}

impl Client {
    /// Packs an address into network-order bytes.
    pub fn aton(addr: IpAddr) -> Vec<u8> {
        match addr {
            IpAddr::V4(v4) => v4.octets().to_vec(),
            IpAddr::V6(v6) => v6.octets().to_vec(),
        }
    }

    /// Unpacks address bytes produced by [`Client::aton`].
    /// Returns `None` for byte slices that are neither 4 nor 16 long.
    pub fn ntoa(packed: &[u8]) -> Option<IpAddr> {
        match packed.len() {
            4 => {
                let octets: [u8; 4] = packed.try_into().ok()?;
                Some(IpAddr::V4(Ipv4Addr::from(octets)))
            }
            16 => {
                let octets: [u8; 16] = packed.try_into().ok()?;
                Some(IpAddr::V6(Ipv6Addr::from(octets)))
            }
            _ => None,
        }
    }
}

/// A verdict on a snippet, good or bad code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Good,
    Bad,
}

impl Verdict {
    pub fn from_is_bad(is_bad: bool) -> Self {
        if is_bad {
            Verdict::Bad
        } else {
            Verdict::Good
        }
    }

    pub fn is_bad(self) -> bool {
        matches!(self, Verdict::Bad)
    }
}

/// A single judgment on a Post. At most one per (client, post).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vote {
    pub id: Uuid,
    pub client_id: Uuid,
    pub post_id: Uuid,
    pub is_bad: bool,
    pub created_at: DateTime<Utc>,
}

/// A proposed replacement snippet for a Post. At most one per (client, post).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Suggestion {
    pub id: Uuid,
    pub client_id: Uuid,
    pub post_id: Uuid,
    pub code: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// Moderation ledger entry recording when an admin approved a post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Approval {
    pub id: Uuid,
    pub post_id: Uuid,
    pub approved_at: DateTime<Utc>,
}

/// Aggregate vote tally for a post, two buckets by verdict.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteCounts {
    pub bad: i64,
    pub not_bad: i64,
}

/// One parse failure in a submitted snippet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LintError {
    #[serde(rename = "lineNum")]
    pub line: usize,
    pub reason: String,
}
