//! Pointer picking against the current point cloud.
//!
//! Picking maps a click on the rendering surface to the star nearest the
//! viewer among those the click ray passes close to:
//!
//! 1. The pointer position is normalized to device coordinates in [-1, 1]²
//!    using the surface bounding rectangle (y up).
//! 2. The rendering collaborator turns that into a world-space ray from the
//!    camera ([`RayCaster::ray_from_ndc`]).
//! 3. The collaborator intersects the ray with every point using the pick
//!    tolerance and returns hits sorted by distance along the ray
//!    ([`RayCaster::intersect_points`]).
//! 4. The closest hit's buffer index is reported.
//!
//! The tolerance belongs to the [`PickingEngine`] rather than the renderer so
//! it can be configured and tested without a GPU backend.

use nalgebra::{Point2, Point3, Unit, Vector3};

use crate::point_set::{PointCloud, COMPONENTS};

/// A pointer click in client (page) pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub client_x: f64,
    pub client_y: f64,
}

impl PointerEvent {
    pub fn new(client_x: f64, client_y: f64) -> Self {
        Self { client_x, client_y }
    }
}

/// Bounding rectangle of the rendering surface in client pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl SurfaceRect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Surface anchored at the client origin.
    pub fn sized(width: f64, height: f64) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    pub fn aspect(&self) -> f64 {
        self.width / self.height
    }

    /// Normalized device coordinates of a pointer event.
    ///
    /// Returns `None` for a degenerate (zero or negative area) surface.
    pub fn to_ndc(&self, pointer: &PointerEvent) -> Option<Point2<f64>> {
        if !(self.width > 0.0 && self.height > 0.0) {
            return None;
        }
        let x = ((pointer.client_x - self.left) / self.width) * 2.0 - 1.0;
        let y = -((pointer.client_y - self.top) / self.height) * 2.0 + 1.0;
        Some(Point2::new(x, y))
    }

    /// Client coordinates of a point in normalized device coordinates.
    pub fn from_ndc(&self, ndc: &Point2<f64>) -> PointerEvent {
        PointerEvent::new(
            self.left + (ndc.x + 1.0) / 2.0 * self.width,
            self.top + (1.0 - ndc.y) / 2.0 * self.height,
        )
    }
}

/// A half-line in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Point3<f64>,
    pub direction: Unit<Vector3<f64>>,
}

impl Ray {
    pub fn new(origin: Point3<f64>, direction: Vector3<f64>) -> Self {
        Self {
            origin,
            direction: Unit::new_normalize(direction),
        }
    }

    /// Signed distance along the ray to the foot of the perpendicular from `point`.
    pub fn projection(&self, point: &Point3<f64>) -> f64 {
        (point - self.origin).dot(&self.direction)
    }

    pub fn at(&self, t: f64) -> Point3<f64> {
        self.origin + self.direction.into_inner() * t
    }
}

/// One point the ray passed within tolerance of.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intersection {
    /// Point index in the cloud buffers
    pub index: usize,
    /// Distance from the ray origin to the closest approach
    pub distance: f64,
    /// Perpendicular distance between the point and the ray
    pub distance_to_ray: f64,
}

/// The rendering collaborator's ray casting services.
pub trait RayCaster {
    /// World-space ray from the camera through a point in normalized device
    /// coordinates.
    fn ray_from_ndc(&self, ndc: &Point2<f64>) -> Ray;

    /// All points within `threshold` of `ray`, sorted nearest first along the ray.
    fn intersect_points(&self, ray: &Ray, positions: &[f32], threshold: f32) -> Vec<Intersection>;
}

/// Intersect a ray with a flat position buffer.
///
/// A point hits when its perpendicular distance to the ray is below
/// `threshold` and its closest approach lies within `[near, far]` along the
/// ray. Points with non-finite coordinates never hit. Results are sorted by
/// distance along the ray.
pub fn intersect_point_buffer(
    ray: &Ray,
    positions: &[f32],
    threshold: f32,
    near: f64,
    far: f64,
) -> Vec<Intersection> {
    let threshold_sq = f64::from(threshold) * f64::from(threshold);

    let mut hits: Vec<Intersection> = positions
        .chunks_exact(COMPONENTS)
        .enumerate()
        .filter_map(|(index, p)| {
            let point = Point3::new(f64::from(p[0]), f64::from(p[1]), f64::from(p[2]));
            if !point.coords.iter().all(|c| c.is_finite()) {
                return None;
            }

            let t = ray.projection(&point);
            if t < near || t > far {
                return None;
            }

            let distance_sq = (point - ray.at(t)).norm_squared();
            (distance_sq < threshold_sq).then(|| Intersection {
                index,
                distance: t,
                distance_to_ray: distance_sq.sqrt(),
            })
        })
        .collect();

    hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    hits
}

/// Result of a pick attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PickOutcome {
    /// The click landed on a point; `index` is its buffer index.
    Hit(Intersection),
    /// The click hit nothing, or there was nothing to hit.
    Miss,
}

impl PickOutcome {
    pub fn index(&self) -> Option<usize> {
        match self {
            PickOutcome::Hit(hit) => Some(hit.index),
            PickOutcome::Miss => None,
        }
    }
}

/// Resolves pointer events to point indices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickingEngine {
    threshold: f32,
}

impl PickingEngine {
    /// Create an engine with the given intersection tolerance in world units.
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Pick the nearest point under the pointer.
    ///
    /// With no point cloud (still loading, or nothing matches the query) this
    /// is a no-op reporting [`PickOutcome::Miss`].
    pub fn pick<C>(
        &self,
        pointer: &PointerEvent,
        surface: &SurfaceRect,
        caster: &C,
        cloud: Option<&PointCloud>,
    ) -> PickOutcome
    where
        C: RayCaster + ?Sized,
    {
        let Some(cloud) = cloud else {
            return PickOutcome::Miss;
        };
        let Some(ndc) = surface.to_ndc(pointer) else {
            log::debug!("Ignoring pick on degenerate surface {surface:?}");
            return PickOutcome::Miss;
        };

        let ray = caster.ray_from_ndc(&ndc);
        let hits = caster.intersect_points(&ray, cloud.positions(), self.threshold);

        match hits.first() {
            Some(hit) => {
                log::debug!(
                    "Pick at ({:.3}, {:.3}) hit point {} of {} candidates",
                    ndc.x,
                    ndc.y,
                    hit.index,
                    hits.len()
                );
                PickOutcome::Hit(*hit)
            }
            None => PickOutcome::Miss,
        }
    }
}

impl Default for PickingEngine {
    fn default() -> Self {
        Self::new(1.0)
    }
}
