//! Software perspective camera implementing [`RayCaster`].
//!
//! Mirrors the conventions of typical WebGL scene graphs: the camera looks
//! from `position` toward `target`, `fov_y_degrees` is the full vertical
//! field of view, and normalized device coordinates have +y up. Hosts with a
//! GPU renderer normally supply their own [`RayCaster`]; this one serves
//! headless tools and tests.

use nalgebra::{Point2, Point3, Vector3};

use crate::picking::{intersect_point_buffer, Intersection, Ray, RayCaster, SurfaceRect};

/// A look-at perspective camera.
#[derive(Debug, Clone, PartialEq)]
pub struct PerspectiveCamera {
    pub position: Point3<f64>,
    pub target: Point3<f64>,
    pub up: Vector3<f64>,
    /// Full vertical field of view in degrees
    pub fov_y_degrees: f64,
    /// Width over height of the rendering surface
    pub aspect: f64,
    pub near: f64,
    pub far: f64,
}

/// Orthonormal camera frame: right, up, forward.
struct Basis {
    right: Vector3<f64>,
    up: Vector3<f64>,
    forward: Vector3<f64>,
}

impl PerspectiveCamera {
    /// Camera at `position` looking at `target` with +y as the up hint.
    pub fn look_at(
        position: Point3<f64>,
        target: Point3<f64>,
        fov_y_degrees: f64,
        aspect: f64,
    ) -> Self {
        Self {
            position,
            target,
            up: Vector3::y(),
            fov_y_degrees,
            aspect,
            near: 0.1,
            far: 100_000.0,
        }
    }

    /// Update the aspect ratio to match a rendering surface.
    pub fn fit_surface(&mut self, surface: &SurfaceRect) {
        if surface.width > 0.0 && surface.height > 0.0 {
            self.aspect = surface.aspect();
        }
    }

    fn basis(&self) -> Basis {
        let forward = (self.target - self.position).normalize();
        let mut right = forward.cross(&self.up);
        if right.norm_squared() < 1e-12 {
            // Looking along the up hint; pick any perpendicular
            right = forward.cross(&Vector3::z());
        }
        let right = right.normalize();
        let up = right.cross(&forward).normalize();
        Basis { right, up, forward }
    }

    fn half_extents(&self) -> (f64, f64) {
        let half_height = (self.fov_y_degrees.to_radians() / 2.0).tan();
        (half_height * self.aspect, half_height)
    }

    /// Project a world point to normalized device coordinates.
    ///
    /// Returns `None` for points at or behind the camera plane.
    pub fn project_to_ndc(&self, point: &Point3<f64>) -> Option<Point2<f64>> {
        let basis = self.basis();
        let v = point - self.position;
        let depth = v.dot(&basis.forward);
        if depth <= 0.0 {
            return None;
        }
        let (half_width, half_height) = self.half_extents();
        Some(Point2::new(
            v.dot(&basis.right) / (depth * half_width),
            v.dot(&basis.up) / (depth * half_height),
        ))
    }

    /// Project a world point to client pixel coordinates on `surface`.
    pub fn project_to_surface(
        &self,
        point: &Point3<f64>,
        surface: &SurfaceRect,
    ) -> Option<(f64, f64)> {
        let ndc = self.project_to_ndc(point)?;
        let pointer = surface.from_ndc(&ndc);
        Some((pointer.client_x, pointer.client_y))
    }
}

impl RayCaster for PerspectiveCamera {
    fn ray_from_ndc(&self, ndc: &Point2<f64>) -> Ray {
        let basis = self.basis();
        let (half_width, half_height) = self.half_extents();
        let direction =
            basis.forward + basis.right * (ndc.x * half_width) + basis.up * (ndc.y * half_height);
        Ray::new(self.position, direction)
    }

    fn intersect_points(&self, ray: &Ray, positions: &[f32], threshold: f32) -> Vec<Intersection> {
        intersect_point_buffer(ray, positions, threshold, self.near, self.far)
    }
}
