//! Headless host for the star map core.
//!
//! Plays the part of the browser page: owns a [`ViewState`], a software
//! [`PerspectiveCamera`] and a fixed-size surface, pumps the background
//! catalog load, and turns pixel clicks into picks. Used by the
//! `star_probe` binary and by end-to-end tests.

use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, TryRecvError};
use nalgebra::{Point3, Vector3};
use serde::Serialize;

use starmap::camera::PerspectiveCamera;
use starmap::catalog::{spawn_catalog_load, LoadResult};
use starmap::config::ViewerConfig;
use starmap::picking::{PickOutcome, PointerEvent, SurfaceRect};
use starmap::{LoadState, PointCloud, StarRecord, StarmapError, ViewState};

/// Vertical field of view used by the headless camera.
pub const DEFAULT_FOV_DEGREES: f64 = 60.0;

/// Axis-aligned bounds of a point cloud.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Point3<f64>,
    pub max: Point3<f64>,
}

impl Bounds {
    /// Bounds of every point in `cloud`.
    pub fn of_cloud(cloud: &PointCloud) -> Option<Self> {
        let mut points = cloud
            .positions()
            .chunks_exact(3)
            .map(|p| Point3::new(p[0] as f64, p[1] as f64, p[2] as f64))
            .filter(|p| p.iter().all(|c| c.is_finite()));

        let first = points.next()?;
        let (min, max) = points.fold((first, first), |(lo, hi), p| {
            (lo.inf(&p), hi.sup(&p))
        });
        Some(Self { min, max })
    }

    pub fn center(&self) -> Point3<f64> {
        nalgebra::center(&self.min, &self.max)
    }

    /// Radius of the bounding sphere around [`Self::center`].
    pub fn radius(&self) -> f64 {
        (self.max - self.min).norm() / 2.0
    }
}

/// Selected star as printed by the probe.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectionReport {
    pub name: String,
    pub fields: Vec<(String, String)>,
}

impl SelectionReport {
    pub fn from_star(star: &StarRecord) -> Self {
        Self {
            name: star.display_name(),
            fields: star
                .detail_fields()
                .into_iter()
                .map(|(label, value)| (label.to_string(), value))
                .collect(),
        }
    }
}

/// A star map session without a window.
pub struct HeadlessViewer {
    view: ViewState,
    camera: PerspectiveCamera,
    surface: SurfaceRect,
    pending: Option<Receiver<LoadResult>>,
}

impl HeadlessViewer {
    /// Viewer with an empty view in [`LoadState::Loading`] and a camera
    /// looking down -z from `distance` units.
    pub fn new(config: &ViewerConfig, surface: SurfaceRect, distance: f64) -> Self {
        let camera = PerspectiveCamera::look_at(
            Point3::new(0.0, 0.0, distance),
            Point3::origin(),
            DEFAULT_FOV_DEGREES,
            surface.aspect(),
        );
        Self {
            view: ViewState::new(config),
            camera,
            surface,
            pending: None,
        }
    }

    /// Kick off a background load of the configured catalog.
    pub fn start_load(&mut self, config: &ViewerConfig) {
        log::info!("Loading catalog from {}", config.catalog);
        self.pending = Some(spawn_catalog_load(
            config.catalog.clone(),
            config.retry.clone(),
        ));
    }

    /// Install a finished load if one has arrived. Returns true when a
    /// completion was applied.
    pub fn poll_load(&mut self) -> bool {
        let Some(rx) = &self.pending else {
            return false;
        };
        match rx.try_recv() {
            Ok(result) => {
                self.pending = None;
                self.view.apply_load_result(result);
                true
            }
            Err(TryRecvError::Empty) => false,
            Err(TryRecvError::Disconnected) => {
                self.pending = None;
                self.view.fail_load(&StarmapError::LoaderExited);
                true
            }
        }
    }

    /// Block until the pending load completes or `timeout` elapses.
    pub fn wait_for_load(&mut self, timeout: Duration) -> &LoadState {
        if let Some(rx) = self.pending.take() {
            match rx.recv_timeout(timeout) {
                Ok(result) => self.view.apply_load_result(result),
                Err(RecvTimeoutError::Timeout) => {
                    log::warn!("Catalog still loading after {timeout:?}");
                    self.pending = Some(rx);
                }
                Err(RecvTimeoutError::Disconnected) => {
                    self.view.fail_load(&StarmapError::LoaderExited)
                }
            }
        }
        self.view.load_state()
    }

    /// Aim the camera so every visible star fits in the vertical field of
    /// view. Returns false when nothing is visible.
    pub fn frame_visible(&mut self) -> bool {
        let Some(bounds) = self.view.point_cloud().and_then(|c| Bounds::of_cloud(&c)) else {
            return false;
        };

        let center = bounds.center();
        let radius = bounds.radius().max(1.0);
        let half_vertical = self.camera.fov_y_degrees.to_radians() / 2.0;
        let half_horizontal = (half_vertical.tan() * self.camera.aspect).atan();
        let half_fov = half_vertical.min(half_horizontal);
        let distance = radius / half_fov.sin();

        self.camera.target = center;
        self.camera.position = center + Vector3::z() * distance;
        self.camera.far = self.camera.far.max(distance + radius * 2.0);
        log::debug!("Framed {radius:.2} unit radius from {distance:.2} units");
        true
    }

    /// Resize the surface, keeping the camera aspect in step.
    pub fn resize(&mut self, surface: SurfaceRect) {
        self.surface = surface;
        self.camera.fit_surface(&surface);
    }

    /// Click at client pixel coordinates.
    pub fn click(&mut self, client_x: f64, client_y: f64) -> PickOutcome {
        self.view.pick(
            &PointerEvent::new(client_x, client_y),
            &self.surface,
            &self.camera,
        )
    }

    /// Pixel coordinates where `point` currently lands on the surface.
    pub fn screen_position(&self, point: &Point3<f64>) -> Option<(f64, f64)> {
        self.camera.project_to_surface(point, &self.surface)
    }

    pub fn selection_report(&self) -> Option<SelectionReport> {
        self.view.selected().map(SelectionReport::from_star)
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut ViewState {
        &mut self.view
    }

    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    pub fn surface(&self) -> &SurfaceRect {
        &self.surface
    }
}
