use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::models::search::{FacetSet, FacetValue};
use crate::search_client::{SearchBackend, SearchError};

/// Read-through cache of facet values, loaded at most once per session.
#[derive(Debug, Default)]
pub struct FacetCatalog {
    cached: Mutex<Option<FacetSet>>,
}

impl FacetCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn cached(&self) -> Option<FacetSet> {
        self.cached.lock().await.clone()
    }

    /// Returns the cached catalog or loads it. Concurrent callers wait on the
    /// same load instead of issuing their own.
    pub async fn get_or_load(&self, backend: &dyn SearchBackend) -> Result<FacetSet, SearchError> {
        let mut cached = self.cached.lock().await;
        if let Some(facets) = cached.as_ref() {
            debug!("facet catalog served from cache");
            return Ok(facets.clone());
        }

        let mut facets = backend.get_facets().await?;
        sort_by_count(&mut facets.locations);
        sort_by_count(&mut facets.professions);
        sort_by_count(&mut facets.skills);

        info!(
            locations = facets.locations.len(),
            professions = facets.professions.len(),
            skills = facets.skills.len(),
            "facet catalog loaded"
        );
        *cached = Some(facets.clone());
        Ok(facets)
    }
}

fn sort_by_count(values: &mut [FacetValue]) {
    values.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));
}
