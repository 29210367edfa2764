//! Muhtar — municipal complaint radar.
//!
//! Pulls a municipality's Facebook page posts and comments, geotags each
//! comment to a known neighborhood via a layered text-matching resolver,
//! attaches complaint/category labels from injected classifiers, and serves
//! the resulting rows to a dashboard.

pub mod classify;
pub mod feed;
pub mod gazetteer;
pub mod report;
pub mod resolve;
pub mod server;
