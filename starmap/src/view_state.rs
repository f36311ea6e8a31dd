//! The single coordination object between the pipeline and the host UI.
//!
//! [`ViewState`] owns the loaded catalog, the active query, the derived
//! visible set with its point cloud, and the current selection. The host
//! calls into it from its event loop:
//!
//! - catalog load completion: [`ViewState::finish_load`] / [`ViewState::fail_load`]
//! - search input: [`ViewState::set_query`]
//! - pointer clicks: [`ViewState::pick`]
//! - detail panel close: [`ViewState::dismiss`]
//!
//! Selection is sticky. Neither a new catalog nor a query change clears it,
//! even when the selected star is no longer visible; the detail panel keeps
//! showing that star until the user dismisses it.

use std::sync::Arc;
use std::time::Instant;

use crate::catalog::{Catalog, LoadResult, StarRecord};
use crate::config::ViewerConfig;
use crate::error::StarmapError;
use crate::filter::QueryFilter;
use crate::picking::{PickOutcome, PickingEngine, PointerEvent, RayCaster, SurfaceRect};
use crate::point_set::PointCloud;

/// Catalog load lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    /// Fetch in flight; nothing to render or pick
    Loading,
    /// Catalog available
    Ready,
    /// Fetch gave up; carries a message for the user
    Failed(String),
}

/// View state for one star map session.
#[derive(Debug)]
pub struct ViewState {
    load_state: LoadState,
    catalog: Option<Catalog>,
    query: String,
    filter: QueryFilter,
    /// Catalog indices of visible stars, in catalog order
    visible: Vec<usize>,
    cloud: Option<Arc<PointCloud>>,
    cloud_revision: u64,
    selected: Option<StarRecord>,
    picking: PickingEngine,
    parallel_threshold: usize,
}

impl ViewState {
    /// Fresh state in [`LoadState::Loading`].
    pub fn new(config: &ViewerConfig) -> Self {
        Self {
            load_state: LoadState::Loading,
            catalog: None,
            query: String::new(),
            filter: QueryFilter::new(),
            visible: Vec::new(),
            cloud: None,
            cloud_revision: 0,
            selected: None,
            picking: PickingEngine::new(config.pick_threshold),
            parallel_threshold: config.parallel_threshold,
        }
    }

    pub fn load_state(&self) -> &LoadState {
        &self.load_state
    }

    pub fn is_loading(&self) -> bool {
        self.load_state == LoadState::Loading
    }

    /// Install a loaded catalog and rebuild the visible set.
    ///
    /// Any query typed while loading is applied now. The selection is kept.
    pub fn finish_load(&mut self, catalog: Catalog) {
        log::info!("Catalog ready with {} stars", catalog.len());
        self.catalog = Some(catalog);
        self.load_state = LoadState::Ready;
        self.filter.invalidate();
        self.refresh();
    }

    /// Record a failed load. Previously loaded data, if any, stays visible.
    pub fn fail_load(&mut self, error: &StarmapError) {
        log::error!("Catalog load failed: {error}");
        self.load_state = LoadState::Failed(error.to_string());
    }

    /// Apply the completion message from a background load.
    pub fn apply_load_result(&mut self, result: LoadResult) {
        match result {
            Ok((catalog, _report)) => self.finish_load(catalog),
            Err(e) => self.fail_load(&e),
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Change the search text and synchronously rebuild the visible set.
    pub fn set_query(&mut self, query: &str) {
        if self.query == query {
            return;
        }
        self.query = query.to_string();
        self.refresh();
    }

    /// Recompute the visible set and point cloud, swapping both in together.
    fn refresh(&mut self) {
        let Some(catalog) = &self.catalog else {
            return;
        };

        let start = Instant::now();
        let visible = self.filter.apply(catalog, &self.query).to_vec();
        let cloud = PointCloud::from_selection(catalog.stars(), &visible, self.parallel_threshold)
            .map(Arc::new);

        self.visible = visible;
        self.cloud = cloud;
        self.cloud_revision += 1;

        log::debug!(
            "Rebuilt point cloud for {:?}: {} of {} stars in {:?}",
            self.query,
            self.visible.len(),
            catalog.len(),
            start.elapsed()
        );
    }

    /// Every loaded star, in catalog order.
    pub fn all_records(&self) -> &[StarRecord] {
        self.catalog.as_ref().map(Catalog::stars).unwrap_or(&[])
    }

    /// Number of visible stars.
    pub fn visible_len(&self) -> usize {
        self.visible.len()
    }

    /// The visible star at point cloud index `index`.
    pub fn visible_record(&self, index: usize) -> Option<&StarRecord> {
        let catalog_index = *self.visible.get(index)?;
        self.catalog.as_ref()?.get_star(catalog_index)
    }

    /// Visible stars in point cloud order.
    pub fn filtered_records(&self) -> Vec<&StarRecord> {
        let stars = self.all_records();
        self.visible.iter().map(|&i| &stars[i]).collect()
    }

    /// The current point cloud, if anything is visible.
    pub fn point_cloud(&self) -> Option<Arc<PointCloud>> {
        self.cloud.clone()
    }

    /// Incremented on every rebuild so a renderer knows when to re-upload.
    pub fn cloud_revision(&self) -> u64 {
        self.cloud_revision
    }

    pub fn picking_engine(&self) -> &PickingEngine {
        &self.picking
    }

    /// Resolve a click and select the star under it.
    ///
    /// A miss leaves the current selection untouched.
    pub fn pick<C>(
        &mut self,
        pointer: &PointerEvent,
        surface: &SurfaceRect,
        caster: &C,
    ) -> PickOutcome
    where
        C: RayCaster + ?Sized,
    {
        let outcome = self
            .picking
            .pick(pointer, surface, caster, self.cloud.as_deref());

        if let PickOutcome::Hit(hit) = outcome {
            match self.visible_record(hit.index).cloned() {
                Some(star) => {
                    log::info!("Selected {}", star.display_name());
                    self.selected = Some(star);
                }
                None => {
                    log::warn!(
                        "Pick index {} outside visible set of {}",
                        hit.index,
                        self.visible.len()
                    );
                    return PickOutcome::Miss;
                }
            }
        }

        outcome
    }

    /// The star shown in the detail panel, if any.
    pub fn selected(&self) -> Option<&StarRecord> {
        self.selected.as_ref()
    }

    /// Close the detail panel.
    pub fn dismiss(&mut self) {
        if let Some(star) = self.selected.take() {
            log::debug!("Dismissed {}", star.display_name());
        }
    }
}
