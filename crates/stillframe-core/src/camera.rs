//! Perspective camera with automatic framing
//!
//! `reset_to_bounds` places the camera so that the bounding sphere of the
//! visible geometry fills the view, keeping the current view direction.

use crate::geometry::Bounds;
use glam::{Mat4, Vec3};

/// Perspective camera
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// Eye position
    pub position: Vec3,
    /// Point the camera looks at
    pub focal_point: Vec3,
    /// Up hint
    pub view_up: Vec3,
    /// Vertical field of view in degrees
    pub view_angle_deg: f32,
    /// Near clipping distance
    pub near: f32,
    /// Far clipping distance
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 1.0),
            focal_point: Vec3::ZERO,
            view_up: Vec3::Y,
            view_angle_deg: 30.0,
            near: 0.01,
            far: 1000.01,
        }
    }
}

impl Camera {
    /// Create a camera with default placement (looking down -Z)
    pub fn new() -> Self {
        Self::default()
    }

    /// Unit vector from the focal point towards the eye
    pub fn view_plane_normal(&self) -> Vec3 {
        let n = self.position - self.focal_point;
        if n.length_squared() > 0.0 {
            n.normalize()
        } else {
            Vec3::Z
        }
    }

    /// Unit vector the camera looks along
    pub fn view_direction(&self) -> Vec3 {
        -self.view_plane_normal()
    }

    /// Distance from eye to focal point
    pub fn distance(&self) -> f32 {
        self.position.distance(self.focal_point)
    }

    /// Frame the given bounds for a viewport with the given aspect ratio
    /// (width / height). Empty bounds leave the camera untouched.
    pub fn reset_to_bounds(&mut self, bounds: &Bounds, aspect: f32) {
        if bounds.is_empty() {
            tracing::debug!("No visible geometry, camera left in place");
            return;
        }

        let center = bounds.center();
        let mut radius = bounds.diagonal() * 0.5;
        if radius <= 0.0 {
            radius = 1.0;
        }

        let mut angle = self.view_angle_deg.to_radians();
        if aspect > 0.0 && aspect < 1.0 {
            angle = 2.0 * ((angle * 0.5).tan() * aspect).atan();
        }

        let distance = radius / (angle * 0.5).sin();
        let normal = self.view_plane_normal();

        self.focal_point = center;
        self.position = center + normal * distance;

        // Keep view-up usable when it lines up with the view direction
        if self.view_up.cross(normal).length_squared() < 1e-12 {
            self.view_up = normal.any_orthogonal_vector().normalize();
        }

        self.far = distance + radius * 1.01;
        self.near = (distance - radius * 1.01).max(self.far * 0.001);

        tracing::debug!(
            center = ?center,
            radius,
            distance,
            near = self.near,
            far = self.far,
            "Camera fitted to bounds"
        );
    }

    /// World to view transform
    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.focal_point, self.view_up)
    }

    /// Perspective projection with depth mapped to 0..1
    pub fn projection(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.view_angle_deg.to_radians(), aspect, self.near, self.far)
    }

    /// Combined projection * view
    pub fn view_projection(&self, aspect: f32) -> Mat4 {
        self.projection(aspect) * self.view()
    }
}
