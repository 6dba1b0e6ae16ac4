//! snipvote/crates/sv-core/src/lib.rs
//!
//! The central domain logic and interface definitions for Snipvote.

pub mod error;
pub mod identity;
pub mod models;
pub mod traits;

// Re-exporting for easier access in other crates
pub use error::*;
pub use identity::resolve_client_ip;
pub use models::*;
pub use traits::*;
