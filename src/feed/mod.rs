//! Facebook page feed ingestion.
//!
//! A thin Graph API client plus the flattening step that turns the
//! post+comment bundle into per-comment analysis rows.

pub mod graph;
pub mod records;

pub use graph::{FeedConfig, FeedError, GraphClient, PostWithComments};
pub use records::{flatten, CommentRecord};
