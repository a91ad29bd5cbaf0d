use std::time::Duration;

use ahash::AHashSet as HashSet;
use tracing::{debug, warn};

use super::{RetrievalStep, SearchError, error::Result};
use crate::{
    entity::{EntityId, EntityKind, SearchableEntity},
    filter::FilterSpec,
    store::EntityStore,
};

/// The store call used to gather candidates.
#[derive(Debug, Clone, Copy)]
pub enum Lookup<'a> {
    Text(&'a str),
    Facet(&'a FilterSpec),
}

impl Lookup<'_> {
    const fn step(&self) -> RetrievalStep {
        match self {
            Self::Text(_) => RetrievalStep::TextLookup,
            Self::Facet(_) => RetrievalStep::FacetLookup,
        }
    }
}

/// Run one bounded store lookup for `kind`, mapping store failures and timeouts into
/// [`SearchError`]s that say which kind and which lookup failed.
///
/// Entities of the wrong kind, or that break the snapshot invariants, are dropped.
pub async fn retrieve_kind<S: EntityStore>(
    store: &S,
    lookup: Lookup<'_>,
    kind: EntityKind,
    timeout: Duration,
) -> Result<Vec<SearchableEntity>> {
    let step = lookup.step();
    let outcome = match lookup {
        Lookup::Text(term) => tokio::time::timeout(timeout, store.find_by_text(term, kind)).await,
        Lookup::Facet(spec) => tokio::time::timeout(timeout, store.find_by_facet(spec, kind)).await,
    };

    let candidates = match outcome {
        Err(_elapsed) => {
            warn!(%kind, %step, ?timeout, "Store lookup timed out");
            return Err(SearchError::Timeout {
                kind,
                step,
                after: timeout,
            });
        }
        Ok(Err(err)) => {
            warn!(%kind, %step, error = %err, "Store lookup failed");
            return Err(SearchError::RetrievalFailure {
                kind,
                step,
                reason: err.to_string(),
            });
        }
        Ok(Ok(candidates)) => candidates,
    };

    let returned = candidates.len();
    let kept: Vec<SearchableEntity> = candidates
        .into_iter()
        .filter(|entity| entity.kind() == kind)
        .filter(|entity| match entity.validate() {
            Ok(()) => true,
            Err(err) => {
                warn!(error = %err, "Dropping invalid entity returned by store");
                false
            }
        })
        .collect();
    debug!(%kind, %step, returned, kept = kept.len(), "Retrieved candidates");
    Ok(kept)
}

/// Collapse repeated `(kind, id)` pairs, keeping the first occurrence.
pub fn dedup_candidates(candidates: Vec<SearchableEntity>) -> Vec<SearchableEntity> {
    let mut seen: HashSet<(EntityKind, EntityId)> = HashSet::with_capacity(candidates.len());
    candidates
        .into_iter()
        .filter(|entity| seen.insert((entity.kind(), entity.id().clone())))
        .collect()
}
