//! Declarative scene description
//!
//! A `SceneDescription` is what the caller hands to a capture: an ordered list
//! of actors on top of a background color. It carries no camera, surface or
//! backend state - those only exist for the duration of one capture.

use crate::geometry::{ConeSource, GeometryError, GeometrySource, Mesh};
use serde::{Deserialize, Serialize};

/// A complete scene to capture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneDescription {
    /// Background color (linear RGB, 0.0 - 1.0)
    #[serde(default)]
    pub background: [f32; 3],

    /// Actors in draw order
    #[serde(default)]
    pub actors: Vec<Actor>,
}

impl Default for SceneDescription {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneDescription {
    /// Create a new empty scene with a black background
    pub fn new() -> Self {
        Self {
            background: [0.0, 0.0, 0.0],
            actors: Vec::new(),
        }
    }

    /// The reference scene: a 60-sided cone on a slate blue background
    pub fn cone_demo() -> Self {
        let cone = ConeSource {
            height: 1.0,
            radius: 0.5,
            resolution: 60,
            ..Default::default()
        };

        Self::new()
            .with_background([0.2, 0.3, 0.4])
            .with_actor(Actor::new(GeometrySource::Cone(cone)))
    }

    /// Set the background color
    pub fn with_background(mut self, background: [f32; 3]) -> Self {
        self.background = background;
        self
    }

    /// Add an actor to the scene
    pub fn with_actor(mut self, actor: Actor) -> Self {
        self.actors.push(actor);
        self
    }

    /// Add multiple actors
    pub fn with_actors(mut self, actors: impl IntoIterator<Item = Actor>) -> Self {
        self.actors.extend(actors);
        self
    }

    /// Iterate over actors that will actually be drawn
    pub fn visible_actors(&self) -> impl Iterator<Item = &Actor> {
        self.actors.iter().filter(|a| a.visible)
    }

    /// Whether anything in the scene will be drawn
    pub fn has_visible_geometry(&self) -> bool {
        self.visible_actors().next().is_some()
    }

    /// Background as 8-bit RGBA
    pub fn background_rgba8(&self) -> [u8; 4] {
        [
            unit_to_u8(self.background[0]),
            unit_to_u8(self.background[1]),
            unit_to_u8(self.background[2]),
            255,
        ]
    }
}

/// A visual wrapper: one geometry generator plus how its surface looks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    /// Geometry generator feeding this actor
    pub source: GeometrySource,

    /// Surface appearance
    #[serde(default)]
    pub property: SurfaceProperty,

    /// World-space translation
    #[serde(default)]
    pub position: [f32; 3],

    /// Per-axis scale
    #[serde(default = "unit_scale")]
    pub scale: [f32; 3],

    /// Hidden actors are skipped entirely, including by camera auto-fit
    #[serde(default = "default_true")]
    pub visible: bool,
}

impl Actor {
    /// Create a visible actor with the default surface property
    pub fn new(source: GeometrySource) -> Self {
        Self {
            source,
            property: SurfaceProperty::default(),
            position: [0.0, 0.0, 0.0],
            scale: unit_scale(),
            visible: true,
        }
    }

    /// Set the surface property
    pub fn with_property(mut self, property: SurfaceProperty) -> Self {
        self.property = property;
        self
    }

    /// Set the surface color
    pub fn with_color(mut self, color: [f32; 3]) -> Self {
        self.property.color = color;
        self
    }

    /// Set the world position
    pub fn with_position(mut self, position: [f32; 3]) -> Self {
        self.position = position;
        self
    }

    /// Set a uniform scale
    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = [scale, scale, scale];
        self
    }

    /// Set visibility
    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    /// Check the actor transform and its geometry parameters
    pub fn validate(&self) -> Result<(), GeometryError> {
        if !self.position.iter().all(|p| p.is_finite()) {
            return Err(GeometryError::InvalidPosition(self.position));
        }
        if !self.scale.iter().all(|s| s.is_finite() && *s != 0.0) {
            return Err(GeometryError::InvalidScale(self.scale));
        }
        self.source.validate()
    }

    /// Tessellate the source and move it into world space.
    ///
    /// Fails if the transform pushes any vertex or the bounds out of f32 range.
    pub fn world_mesh(&self) -> Result<Mesh, GeometryError> {
        self.validate()?;

        let mesh = self.source.tessellate()?.transformed(self.model_matrix());
        let finite = mesh
            .vertices
            .iter()
            .all(|v| v.position.iter().all(|p| p.is_finite()));
        if !finite || !mesh.bounds().diagonal().is_finite() {
            return Err(GeometryError::NonFiniteGeometry(self.source.name()));
        }

        Ok(mesh)
    }

    /// Model matrix (scale, then translate)
    pub fn model_matrix(&self) -> glam::Mat4 {
        glam::Mat4::from_scale_rotation_translation(
            glam::Vec3::from(self.scale),
            glam::Quat::IDENTITY,
            glam::Vec3::from(self.position),
        )
    }
}

/// How a surface responds to light
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceProperty {
    /// Base color (linear RGB, 0.0 - 1.0)
    pub color: [f32; 3],
    /// Ambient coefficient
    pub ambient: f32,
    /// Diffuse coefficient
    pub diffuse: f32,
    /// Specular coefficient
    pub specular: f32,
    /// Specular exponent
    pub specular_power: f32,
    /// Filled triangles or edges only
    pub representation: Representation,
}

impl Default for SurfaceProperty {
    fn default() -> Self {
        Self {
            color: [1.0, 1.0, 1.0],
            ambient: 0.0,
            diffuse: 1.0,
            specular: 0.0,
            specular_power: 1.0,
            representation: Representation::Surface,
        }
    }
}

impl SurfaceProperty {
    /// Wireframe variant of this property
    pub fn wireframe(mut self) -> Self {
        self.representation = Representation::Wireframe;
        self
    }
}

/// Geometry representation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Representation {
    /// Shaded, filled triangles
    #[default]
    Surface,
    /// Unshaded triangle edges
    Wireframe,
}

/// Convert a unit float to a byte, clamping out-of-range values
pub fn unit_to_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn unit_scale() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}

fn default_true() -> bool {
    true
}
