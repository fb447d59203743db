//! Headlight shading
//!
//! The single light sits at the camera and shines along the view direction.
//! Both faces of a triangle are lit, so open or inverted geometry still shows.

use glam::Vec3;
use stillframe_core::scene::unit_to_u8;
use stillframe_core::SurfaceProperty;

/// Shade a facet with normal `normal`, lit from `to_eye` (unit, towards the camera)
pub fn shade(property: &SurfaceProperty, normal: Vec3, to_eye: Vec3) -> [u8; 4] {
    let color = Vec3::from(property.color);
    let n_dot_l = normal.dot(to_eye).abs();

    // Light and eye coincide, so r.v reduces to 2(n.l)^2 - 1
    let specular = if property.specular > 0.0 {
        let r_dot_v = (2.0 * n_dot_l * n_dot_l - 1.0).max(0.0);
        property.specular * r_dot_v.powf(property.specular_power.max(0.0))
    } else {
        0.0
    };

    let lit = color * (property.ambient + property.diffuse * n_dot_l) + Vec3::splat(specular);

    [unit_to_u8(lit.x), unit_to_u8(lit.y), unit_to_u8(lit.z), 255]
}

/// Unlit colour, used for wireframe edges
pub fn flat(property: &SurfaceProperty) -> [u8; 4] {
    let [r, g, b] = property.color;
    [unit_to_u8(r), unit_to_u8(g), unit_to_u8(b), 255]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_facing_light_is_full_diffuse() {
        let property = SurfaceProperty::default();
        assert_eq!(shade(&property, Vec3::Z, Vec3::Z), [255, 255, 255, 255]);
    }

    #[test]
    fn test_two_sided() {
        let property = SurfaceProperty::default();
        assert_eq!(
            shade(&property, Vec3::Z, Vec3::Z),
            shade(&property, -Vec3::Z, Vec3::Z)
        );
    }

    #[test]
    fn test_grazing_light_uses_ambient() {
        let property = SurfaceProperty {
            color: [1.0, 0.0, 0.0],
            ambient: 0.2,
            ..Default::default()
        };
        assert_eq!(shade(&property, Vec3::X, Vec3::Z), [51, 0, 0, 255]);
    }

    #[test]
    fn test_specular_highlight() {
        let property = SurfaceProperty {
            color: [0.0, 0.0, 0.0],
            specular: 1.0,
            specular_power: 10.0,
            ..Default::default()
        };
        assert_eq!(shade(&property, Vec3::Z, Vec3::Z), [255, 255, 255, 255]);
        assert_eq!(shade(&property, Vec3::X, Vec3::Z), [0, 0, 0, 255]);
    }
}
