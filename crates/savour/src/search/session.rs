use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, instrument};

use super::{RankingPipeline, SearchRequest, SearchResponse};
use crate::store::EntityStore;

/// Searches issued on behalf of one searcher, where a newer query supersedes older ones.
///
/// Starting a search (or calling [`SearchSession::cancel`]) bumps the session generation. Any
/// search still waiting on the store when that happens drops its store future and resolves to
/// `None`, so results for a stale query are never delivered.
#[derive(Debug)]
pub struct SearchSession<S> {
    pipeline: Arc<RankingPipeline<S>>,
    generation: watch::Sender<u64>,
}

impl<S: EntityStore> SearchSession<S> {
    pub fn new(pipeline: Arc<RankingPipeline<S>>) -> Self {
        let (generation, _) = watch::channel(0);
        Self {
            pipeline,
            generation,
        }
    }

    /// Run `request`, or return `None` if a newer search on this session overtook it.
    #[instrument(name = "Session search", skip_all, fields(query = %request.query), level = "debug")]
    pub async fn search(&self, request: &SearchRequest) -> Option<SearchResponse> {
        let mut superseded = self.begin();
        tokio::select! {
            response = self.pipeline.search(request) => Some(response),
            () = wait_for_newer(&mut superseded) => {
                debug!("Search superseded by a newer query");
                None
            }
        }
    }

    /// Supersede whatever search is in flight without starting a new one.
    pub fn cancel(&self) {
        self.generation.send_modify(|generation| *generation += 1);
    }

    pub fn generation(&self) -> u64 {
        *self.generation.borrow()
    }

    fn begin(&self) -> watch::Receiver<u64> {
        self.cancel();
        self.generation.subscribe()
    }
}

async fn wait_for_newer(receiver: &mut watch::Receiver<u64>) {
    if receiver.changed().await.is_err() {
        // Sender gone: nothing can supersede us any more.
        std::future::pending::<()>().await;
    }
}
