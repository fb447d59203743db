//! Parametric geometry generators
//!
//! Generators have no inputs: each is a shape type plus numeric parameters,
//! and tessellates into an unindexed triangle list with facet normals.

use glam::{Mat3, Mat4, Vec3};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::f32::consts::{PI, TAU};
use thiserror::Error;

/// Highest accepted cone resolution
pub const MAX_RESOLUTION: u32 = 1 << 16;

/// Highest accepted sphere theta/phi resolution
pub const MAX_SPHERE_RESOLUTION: u32 = 1 << 12;

/// Geometry validation errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error("{name} must be a positive finite number, got {value}")]
    InvalidLength { name: &'static str, value: f32 },

    #[error("{name} must be within {min}..={max}, got {value}")]
    InvalidResolution {
        name: &'static str,
        value: u32,
        min: u32,
        max: u32,
    },

    #[error("Direction must be a non-zero finite vector, got {0:?}")]
    InvalidDirection([f32; 3]),

    #[error("Center must be finite, got {0:?}")]
    InvalidCenter([f32; 3]),

    #[error("Actor position must be finite, got {0:?}")]
    InvalidPosition([f32; 3]),

    #[error("Actor scale must be finite and non-zero on every axis, got {0:?}")]
    InvalidScale([f32; 3]),

    #[error("Transformed {0} geometry is not finite")]
    NonFiniteGeometry(&'static str),
}

/// A parametric shape definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GeometrySource {
    Cone(ConeSource),
    Sphere(SphereSource),
    Cube(CubeSource),
}

impl GeometrySource {
    /// Shape name for logging
    pub fn name(&self) -> &'static str {
        match self {
            Self::Cone(_) => "cone",
            Self::Sphere(_) => "sphere",
            Self::Cube(_) => "cube",
        }
    }

    /// Check parameters without tessellating
    pub fn validate(&self) -> Result<(), GeometryError> {
        match self {
            Self::Cone(s) => s.validate(),
            Self::Sphere(s) => s.validate(),
            Self::Cube(s) => s.validate(),
        }
    }

    /// Produce the triangle mesh for this shape
    pub fn tessellate(&self) -> Result<Mesh, GeometryError> {
        match self {
            Self::Cone(s) => s.tessellate(),
            Self::Sphere(s) => s.tessellate(),
            Self::Cube(s) => s.tessellate(),
        }
    }
}

/// Right circular cone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConeSource {
    /// Distance from base to apex along the axis
    pub height: f32,
    /// Base radius
    pub radius: f32,
    /// Number of facets around the axis
    pub resolution: u32,
    /// Midpoint of the axis
    pub center: [f32; 3],
    /// Axis direction, base towards apex
    pub direction: [f32; 3],
    /// Close the base with a polygon
    pub capping: bool,
}

impl Default for ConeSource {
    fn default() -> Self {
        Self {
            height: 1.0,
            radius: 0.5,
            resolution: 6,
            center: [0.0, 0.0, 0.0],
            direction: [1.0, 0.0, 0.0],
            capping: true,
        }
    }
}

impl ConeSource {
    pub fn validate(&self) -> Result<(), GeometryError> {
        check_length("height", self.height)?;
        check_length("radius", self.radius)?;
        check_resolution("resolution", self.resolution, 3, MAX_RESOLUTION)?;
        check_center(self.center)?;
        axis(self.direction)?;
        Ok(())
    }

    pub fn tessellate(&self) -> Result<Mesh, GeometryError> {
        self.validate()?;

        let center = Vec3::from(self.center);
        let dir = axis(self.direction)?;
        let (u, v) = dir.any_orthonormal_pair();

        let half = self.height / 2.0;
        let apex = center + dir * half;
        let base_center = center - dir * half;

        let n = self.resolution as usize;
        let rim: Vec<Vec3> = (0..n)
            .map(|i| {
                let theta = TAU * i as f32 / n as f32;
                base_center + self.radius * (theta.cos() * u + theta.sin() * v)
            })
            .collect();

        let mut mesh = Mesh::with_capacity(if self.capping { n * 2 } else { n });

        for i in 0..n {
            let a = rim[i];
            let b = rim[(i + 1) % n];
            mesh.push_outward(apex, a, b, center);
        }

        if self.capping {
            for i in 0..n {
                let a = rim[i];
                let b = rim[(i + 1) % n];
                mesh.push_outward(base_center, b, a, center);
            }
        }

        Ok(mesh)
    }
}

/// UV sphere
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SphereSource {
    pub radius: f32,
    pub center: [f32; 3],
    /// Divisions around the polar axis
    pub theta_resolution: u32,
    /// Divisions from pole to pole
    pub phi_resolution: u32,
}

impl Default for SphereSource {
    fn default() -> Self {
        Self {
            radius: 0.5,
            center: [0.0, 0.0, 0.0],
            theta_resolution: 8,
            phi_resolution: 8,
        }
    }
}

impl SphereSource {
    pub fn validate(&self) -> Result<(), GeometryError> {
        check_length("radius", self.radius)?;
        check_resolution(
            "theta_resolution",
            self.theta_resolution,
            3,
            MAX_SPHERE_RESOLUTION,
        )?;
        check_resolution(
            "phi_resolution",
            self.phi_resolution,
            2,
            MAX_SPHERE_RESOLUTION,
        )?;
        check_center(self.center)
    }

    pub fn tessellate(&self) -> Result<Mesh, GeometryError> {
        self.validate()?;

        let center = Vec3::from(self.center);
        let thetas = self.theta_resolution as usize;
        let phis = self.phi_resolution as usize;

        let point = |i: usize, j: usize| -> Vec3 {
            // Poles are shared exactly by every meridian
            if j == 0 {
                return center + Vec3::Z * self.radius;
            }
            if j == phis {
                return center - Vec3::Z * self.radius;
            }

            let theta = TAU * i as f32 / thetas as f32;
            let phi = PI * j as f32 / phis as f32;
            center
                + self.radius
                    * Vec3::new(phi.sin() * theta.cos(), phi.sin() * theta.sin(), phi.cos())
        };

        let mut mesh = Mesh::with_capacity(thetas * phis * 2);

        for j in 0..phis {
            for i in 0..thetas {
                let next = (i + 1) % thetas;
                let p00 = point(i, j);
                let p10 = point(next, j);
                let p01 = point(i, j + 1);
                let p11 = point(next, j + 1);

                // Triangles touching a pole collapse to zero area and are dropped
                mesh.push_outward(p00, p01, p11, center);
                mesh.push_outward(p00, p11, p10, center);
            }
        }

        Ok(mesh)
    }
}

/// Axis-aligned box
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CubeSource {
    pub x_length: f32,
    pub y_length: f32,
    pub z_length: f32,
    pub center: [f32; 3],
}

impl Default for CubeSource {
    fn default() -> Self {
        Self {
            x_length: 1.0,
            y_length: 1.0,
            z_length: 1.0,
            center: [0.0, 0.0, 0.0],
        }
    }
}

impl CubeSource {
    pub fn validate(&self) -> Result<(), GeometryError> {
        check_length("x_length", self.x_length)?;
        check_length("y_length", self.y_length)?;
        check_length("z_length", self.z_length)?;
        check_center(self.center)
    }

    pub fn tessellate(&self) -> Result<Mesh, GeometryError> {
        self.validate()?;

        let center = Vec3::from(self.center);
        let h = Vec3::new(self.x_length, self.y_length, self.z_length) / 2.0;
        let corner = |x: f32, y: f32, z: f32| center + Vec3::new(x * h.x, y * h.y, z * h.z);

        // Each face as a quad of corner sign patterns
        const FACES: [[[f32; 3]; 4]; 6] = [
            [[1., -1., -1.], [1., 1., -1.], [1., 1., 1.], [1., -1., 1.]],
            [[-1., -1., -1.], [-1., -1., 1.], [-1., 1., 1.], [-1., 1., -1.]],
            [[-1., 1., -1.], [-1., 1., 1.], [1., 1., 1.], [1., 1., -1.]],
            [[-1., -1., -1.], [1., -1., -1.], [1., -1., 1.], [-1., -1., 1.]],
            [[-1., -1., 1.], [1., -1., 1.], [1., 1., 1.], [-1., 1., 1.]],
            [[-1., -1., -1.], [-1., 1., -1.], [1., 1., -1.], [1., -1., -1.]],
        ];

        let mut mesh = Mesh::with_capacity(12);
        for face in FACES {
            let q: Vec<Vec3> = face.iter().map(|c| corner(c[0], c[1], c[2])).collect();
            mesh.push_outward(q[0], q[1], q[2], center);
            mesh.push_outward(q[0], q[2], q[3], center);
        }

        Ok(mesh)
    }
}

/// Vertex with position and facet normal
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

/// Unindexed triangle list; every three vertices form one triangle
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub vertices: Vec<MeshVertex>,
}

impl Mesh {
    /// Create an empty mesh with room for `triangles` triangles
    pub fn with_capacity(triangles: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(triangles * 3),
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.vertices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Iterate over triangles as position triples
    pub fn triangles(&self) -> impl Iterator<Item = [&MeshVertex; 3]> {
        self.vertices.chunks_exact(3).map(|t| [&t[0], &t[1], &t[2]])
    }

    /// Add a triangle with a computed normal, dropping degenerate ones.
    ///
    /// Winding is flipped if needed so the normal points away from `interior`,
    /// which must lie inside the (convex) shape being built.
    pub fn push_outward(&mut self, a: Vec3, b: Vec3, c: Vec3, interior: Vec3) {
        let cross = (b - a).cross(c - a);
        if cross.length_squared() <= f32::EPSILON * f32::EPSILON {
            return;
        }

        let centroid = (a + b + c) / 3.0;
        let (b, c, normal) = if cross.dot(centroid - interior) < 0.0 {
            (c, b, -cross.normalize())
        } else {
            (b, c, cross.normalize())
        };

        for p in [a, b, c] {
            self.vertices.push(MeshVertex {
                position: p.into(),
                normal: normal.into(),
            });
        }
    }

    /// Axis-aligned bounds of all vertices
    pub fn bounds(&self) -> Bounds {
        self.vertices
            .iter()
            .fold(Bounds::EMPTY, |b, v| b.including(Vec3::from(v.position)))
    }

    /// Apply a model transform to positions and normals
    pub fn transformed(&self, model: Mat4) -> Mesh {
        let normal_matrix = Mat3::from_mat4(model).inverse().transpose();

        let vertices = self
            .vertices
            .iter()
            .map(|v| MeshVertex {
                position: model.transform_point3(Vec3::from(v.position)).into(),
                normal: (normal_matrix * Vec3::from(v.normal))
                    .normalize_or_zero()
                    .into(),
            })
            .collect();

        Mesh { vertices }
    }

    /// Unique triangle edges, for wireframe drawing
    pub fn edges(&self) -> Vec<[Vec3; 2]> {
        let key = |p: &[f32; 3]| [p[0].to_bits(), p[1].to_bits(), p[2].to_bits()];

        let mut seen = HashSet::new();
        let mut edges = Vec::new();

        for tri in self.vertices.chunks_exact(3) {
            for (a, b) in [(0, 1), (1, 2), (2, 0)] {
                let (ka, kb) = (key(&tri[a].position), key(&tri[b].position));
                let ordered = if ka <= kb { (ka, kb) } else { (kb, ka) };
                if seen.insert(ordered) {
                    edges.push([Vec3::from(tri[a].position), Vec3::from(tri[b].position)]);
                }
            }
        }

        edges
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl Default for Bounds {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Bounds {
    /// Bounds containing nothing
    pub const EMPTY: Bounds = Bounds {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Grow to include a point
    pub fn including(self, p: Vec3) -> Self {
        Self {
            min: self.min.min(p),
            max: self.max.max(p),
        }
    }

    pub fn union(self, other: Bounds) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn extent(&self) -> Vec3 {
        self.max - self.min
    }

    /// Length of the box diagonal
    pub fn diagonal(&self) -> f32 {
        if self.is_empty() {
            0.0
        } else {
            self.extent().length()
        }
    }
}

fn check_length(name: &'static str, value: f32) -> Result<(), GeometryError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(GeometryError::InvalidLength { name, value })
    }
}

fn check_resolution(name: &'static str, value: u32, min: u32, max: u32) -> Result<(), GeometryError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(GeometryError::InvalidResolution {
            name,
            value,
            min,
            max,
        })
    }
}

fn check_center(center: [f32; 3]) -> Result<(), GeometryError> {
    if center.iter().all(|c| c.is_finite()) {
        Ok(())
    } else {
        Err(GeometryError::InvalidCenter(center))
    }
}

fn axis(direction: [f32; 3]) -> Result<Vec3, GeometryError> {
    let d = Vec3::from(direction);
    if d.is_finite() && d.length_squared() > 0.0 {
        Ok(d.normalize())
    } else {
        Err(GeometryError::InvalidDirection(direction))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn test_cone_triangle_count() {
        let cone = ConeSource {
            resolution: 60,
            ..Default::default()
        };
        let mesh = cone.tessellate().unwrap();
        assert_eq!(mesh.triangle_count(), 120);

        let open = ConeSource {
            resolution: 60,
            capping: false,
            ..Default::default()
        };
        assert_eq!(open.tessellate().unwrap().triangle_count(), 60);
    }

    #[test]
    fn test_cone_bounds_follow_direction() {
        let mesh = ConeSource::default().tessellate().unwrap();
        let bounds = mesh.bounds();

        // Default axis is +X: apex at x = 0.5, base at x = -0.5
        assert!(approx(bounds.min.x, -0.5));
        assert!(approx(bounds.max.x, 0.5));
        assert!(bounds.max.y <= 0.5 + 1e-4);
        assert!(bounds.min.z >= -0.5 - 1e-4);
    }

    #[test]
    fn test_cone_normals_point_outward() {
        let cone = ConeSource {
            resolution: 16,
            center: [1.0, 2.0, 3.0],
            direction: [0.0, 1.0, 0.0],
            ..Default::default()
        };
        let center = Vec3::from(cone.center);
        let mesh = cone.tessellate().unwrap();

        for tri in mesh.triangles() {
            let centroid = (Vec3::from(tri[0].position)
                + Vec3::from(tri[1].position)
                + Vec3::from(tri[2].position))
                / 3.0;
            let normal = Vec3::from(tri[0].normal);
            assert!(normal.dot(centroid - center) > 0.0);
            assert!(approx(normal.length(), 1.0));
        }
    }

    #[test]
    fn test_cone_rejects_bad_parameters() {
        let bad_radius = ConeSource {
            radius: -1.0,
            ..Default::default()
        };
        assert!(matches!(
            bad_radius.validate(),
            Err(GeometryError::InvalidLength { name: "radius", .. })
        ));

        let bad_height = ConeSource {
            height: f32::NAN,
            ..Default::default()
        };
        assert!(bad_height.tessellate().is_err());

        let bad_resolution = ConeSource {
            resolution: 2,
            ..Default::default()
        };
        assert!(matches!(
            bad_resolution.validate(),
            Err(GeometryError::InvalidResolution { value: 2, .. })
        ));

        let bad_direction = ConeSource {
            direction: [0.0, 0.0, 0.0],
            ..Default::default()
        };
        assert!(matches!(
            bad_direction.validate(),
            Err(GeometryError::InvalidDirection(_))
        ));
    }

    #[test]
    fn test_sphere_tessellation() {
        let sphere = SphereSource::default();
        let mesh = sphere.tessellate().unwrap();

        // 8 x 8 quads, minus one collapsed triangle per quad on each pole ring
        assert_eq!(mesh.triangle_count(), 8 * 8 * 2 - 8 * 2);

        let bounds = mesh.bounds();
        assert!(approx(bounds.max.z, 0.5));
        assert!(approx(bounds.min.z, -0.5));
    }

    #[test]
    fn test_cube_tessellation() {
        let cube = CubeSource {
            x_length: 2.0,
            ..Default::default()
        };
        let mesh = cube.tessellate().unwrap();
        assert_eq!(mesh.triangle_count(), 12);

        let bounds = mesh.bounds();
        assert!(approx(bounds.min.x, -1.0));
        assert!(approx(bounds.max.x, 1.0));
        assert!(approx(bounds.extent().y, 1.0));

        // 12 outer edges + 6 face diagonals
        assert_eq!(mesh.edges().len(), 18);
    }

    #[test]
    fn test_bounds() {
        assert!(Bounds::EMPTY.is_empty());
        assert_eq!(Bounds::EMPTY.diagonal(), 0.0);

        let b = Bounds::EMPTY
            .including(Vec3::new(-1.0, 0.0, 0.0))
            .including(Vec3::new(1.0, 2.0, 0.0));
        assert!(!b.is_empty());
        assert_eq!(b.center(), Vec3::new(0.0, 1.0, 0.0));

        let u = b.union(Bounds::new(Vec3::ZERO, Vec3::new(0.0, 0.0, 4.0)));
        assert_eq!(u.max, Vec3::new(1.0, 2.0, 4.0));
        assert_eq!(Bounds::EMPTY.union(b), b);
    }

    #[test]
    fn test_transformed_mesh() {
        let mesh = CubeSource::default().tessellate().unwrap();
        let moved = mesh.transformed(Mat4::from_translation(Vec3::new(5.0, 0.0, 0.0)));
        let bounds = moved.bounds();
        assert!(approx(bounds.center().x, 5.0));
        assert_eq!(moved.triangle_count(), mesh.triangle_count());
    }

    #[test]
    fn test_source_json_tag() {
        let source = GeometrySource::Cube(CubeSource::default());
        let json = serde_json::to_string(&source).unwrap();
        assert!(json.contains("\"type\":\"cube\""));
        assert_eq!(source.name(), "cube");
    }
}
