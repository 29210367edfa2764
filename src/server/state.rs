use crate::gazetteer::Gazetteer;
use crate::report::AnalyzedComment;
use crate::resolve::{NeighborhoodResolver, ResolverConfig};
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

/// Shared server state.
///
/// The gazetteer is an immutable snapshot behind an `Arc`; a reload builds a
/// new one and swaps the reference, so in-flight resolutions keep the
/// snapshot they started with. Rows are replaced wholesale per fetch cycle.
pub struct AppState {
    pub gazetteer: RwLock<Arc<Gazetteer>>,
    pub resolver_config: ResolverConfig,
    pub rows: RwLock<Vec<AnalyzedComment>>,
    /// Reload source for POST /api/refresh; None keeps the startup snapshot.
    pub gazetteer_path: Option<PathBuf>,
    pub limit_posts: usize,
    pub limit_comments: usize,
    pub complaint_url: Option<String>,
    pub category_url: Option<String>,
}

impl AppState {
    /// A resolver over the current gazetteer snapshot.
    pub fn resolver(&self) -> NeighborhoodResolver {
        let snapshot = self.gazetteer.read().unwrap().clone();
        NeighborhoodResolver::with_config(snapshot, self.resolver_config.clone())
    }
}
