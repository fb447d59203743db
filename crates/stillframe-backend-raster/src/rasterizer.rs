//! Triangle and line rasterization in clip space
//!
//! Inputs are clip-space positions produced by a 0..1 depth projection
//! (`glam::Mat4::perspective_rh`). Geometry in front of the near plane has
//! `z >= 0`; anything behind it is clipped before the perspective divide.

use crate::framebuffer::Framebuffer;
use glam::Vec4;

#[derive(Debug, Clone, Copy)]
struct ScreenVertex {
    x: f32,
    y: f32,
    z: f32,
}

/// Clip-space plane tests; a point is inside when all are non-negative
const LINE_PLANES: [Vec4; 6] = [
    Vec4::new(0.0, 0.0, 1.0, 0.0),  // near: z >= 0
    Vec4::new(0.0, 0.0, -1.0, 1.0), // far: z <= w
    Vec4::new(1.0, 0.0, 0.0, 1.0),  // left
    Vec4::new(-1.0, 0.0, 0.0, 1.0), // right
    Vec4::new(0.0, 1.0, 0.0, 1.0),  // bottom
    Vec4::new(0.0, -1.0, 0.0, 1.0), // top
];

fn to_screen(fb: &Framebuffer, clip: Vec4) -> ScreenVertex {
    let ndc = clip.truncate() / clip.w;
    ScreenVertex {
        x: (ndc.x * 0.5 + 0.5) * fb.width() as f32,
        y: (0.5 - ndc.y * 0.5) * fb.height() as f32,
        z: ndc.z,
    }
}

/// Sutherland-Hodgman against the near plane only
fn clip_near(polygon: &[Vec4]) -> Vec<Vec4> {
    let mut out = Vec::with_capacity(polygon.len() + 1);

    for (i, &a) in polygon.iter().enumerate() {
        let b = polygon[(i + 1) % polygon.len()];
        let (a_in, b_in) = (a.z >= 0.0, b.z >= 0.0);

        if a_in {
            out.push(a);
        }
        if a_in != b_in {
            let t = a.z / (a.z - b.z);
            out.push(a.lerp(b, t));
        }
    }

    out
}

/// Liang-Barsky style clip of a segment against the whole view volume
fn clip_segment(a: Vec4, b: Vec4) -> Option<(Vec4, Vec4)> {
    let (mut t0, mut t1) = (0.0f32, 1.0f32);

    for plane in LINE_PLANES {
        let da = plane.dot(a);
        let db = plane.dot(b);

        if da < 0.0 && db < 0.0 {
            return None;
        }
        if da < 0.0 {
            t0 = t0.max(da / (da - db));
        } else if db < 0.0 {
            t1 = t1.min(da / (da - db));
        }
        if t0 > t1 {
            return None;
        }
    }

    Some((a.lerp(b, t0), a.lerp(b, t1)))
}

fn edge(a: ScreenVertex, b: ScreenVertex, x: f32, y: f32) -> f32 {
    (b.x - a.x) * (y - a.y) - (b.y - a.y) * (x - a.x)
}

fn fill_triangle(
    fb: &mut Framebuffer,
    a: ScreenVertex,
    b: ScreenVertex,
    c: ScreenVertex,
    rgba: [u8; 4],
) {
    let area = edge(a, b, c.x, c.y);
    if area == 0.0 || !area.is_finite() {
        return;
    }

    let (w, h) = (fb.width() as f32, fb.height() as f32);
    let min_x = a.x.min(b.x).min(c.x).floor().clamp(0.0, w) as i32;
    let max_x = a.x.max(b.x).max(c.x).ceil().clamp(0.0, w) as i32;
    let min_y = a.y.min(b.y).min(c.y).floor().clamp(0.0, h) as i32;
    let max_y = a.y.max(b.y).max(c.y).ceil().clamp(0.0, h) as i32;

    for py in min_y..max_y {
        for px in min_x..max_x {
            let (sx, sy) = (px as f32 + 0.5, py as f32 + 0.5);

            // Dividing by the signed area accepts either winding
            let w0 = edge(b, c, sx, sy) / area;
            let w1 = edge(c, a, sx, sy) / area;
            let w2 = edge(a, b, sx, sy) / area;
            if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                continue;
            }

            let z = w0 * a.z + w1 * b.z + w2 * c.z;
            fb.plot(px, py, z, rgba);
        }
    }
}

/// Rasterize one triangle given in clip space
pub fn draw_triangle(fb: &mut Framebuffer, clip: [Vec4; 3], rgba: [u8; 4]) {
    let polygon = clip_near(&clip);
    if polygon.len() < 3 {
        return;
    }

    let screen: Vec<ScreenVertex> = polygon.iter().map(|&v| to_screen(fb, v)).collect();
    for i in 1..screen.len() - 1 {
        fill_triangle(fb, screen[0], screen[i], screen[i + 1], rgba);
    }
}

/// Draw a depth-tested line using Bresenham's algorithm
pub fn draw_line(fb: &mut Framebuffer, a: Vec4, b: Vec4, rgba: [u8; 4]) {
    let Some((a, b)) = clip_segment(a, b) else {
        return;
    };

    let (sa, sb) = (to_screen(fb, a), to_screen(fb, b));
    let start = (sa.x.floor() as i32, sa.y.floor() as i32);
    let end = (sb.x.floor() as i32, sb.y.floor() as i32);

    let dx = (end.0 - start.0).abs();
    let dy = -(end.1 - start.1).abs();
    let sx = if start.0 < end.0 { 1 } else { -1 };
    let sy = if start.1 < end.1 { 1 } else { -1 };
    let mut err = dx + dy;

    let steps = dx.max(-dy).max(1) as f32;
    let mut step = 0;

    let mut x = start.0;
    let mut y = start.1;

    loop {
        let t = step as f32 / steps;
        fb.plot(x, y, sa.z + (sb.z - sa.z) * t, rgba);

        if x == end.0 && y == end.1 {
            break;
        }

        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
        step += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: [u8; 4] = [255, 0, 0, 255];
    const BLUE: [u8; 4] = [0, 0, 255, 255];
    const BLACK: [u8; 4] = [0, 0, 0, 255];

    fn framebuffer(w: u32, h: u32) -> Framebuffer {
        let mut fb = Framebuffer::try_new(w, h).unwrap();
        fb.clear(BLACK);
        fb
    }

    fn tri(z: f32) -> [Vec4; 3] {
        [
            Vec4::new(-1.0, -1.0, z, 1.0),
            Vec4::new(3.0, -1.0, z, 1.0),
            Vec4::new(-1.0, 3.0, z, 1.0),
        ]
    }

    #[test]
    fn test_triangle_covers_viewport() {
        let mut fb = framebuffer(16, 16);
        draw_triangle(&mut fb, tri(0.5), RED);
        assert!(fb.to_frame().is_uniform(RED));
    }

    #[test]
    fn test_either_winding() {
        let mut fb = framebuffer(16, 16);
        let [a, b, c] = tri(0.5);
        draw_triangle(&mut fb, [a, c, b], RED);
        assert!(fb.to_frame().is_uniform(RED));
    }

    #[test]
    fn test_nearer_triangle_wins() {
        let mut fb = framebuffer(8, 8);
        draw_triangle(&mut fb, tri(0.3), BLUE);
        draw_triangle(&mut fb, tri(0.6), RED);
        assert!(fb.to_frame().is_uniform(BLUE));
    }

    #[test]
    fn test_behind_near_plane_is_clipped() {
        let mut fb = framebuffer(8, 8);
        draw_triangle(&mut fb, tri(-0.5), RED);
        assert!(fb.to_frame().is_uniform(BLACK));
    }

    #[test]
    fn test_triangle_crossing_near_plane() {
        let mut fb = framebuffer(8, 8);
        // Left half in front of the near plane, right half behind it
        draw_triangle(
            &mut fb,
            [
                Vec4::new(-1.0, -1.0, 0.5, 1.0),
                Vec4::new(1.0, -1.0, -0.5, 1.0),
                Vec4::new(-1.0, 1.0, 0.5, 1.0),
            ],
            RED,
        );

        let frame = fb.to_frame();
        assert_eq!(frame.get_pixel(0, 7), Some(RED));
        assert_eq!(frame.get_pixel(7, 7), Some(BLACK));
    }

    #[test]
    fn test_horizontal_line() {
        let mut fb = framebuffer(8, 8);
        draw_line(
            &mut fb,
            Vec4::new(-0.99, 0.0, 0.5, 1.0),
            Vec4::new(0.99, 0.0, 0.5, 1.0),
            RED,
        );

        let frame = fb.to_frame();
        for x in 0..8 {
            assert_eq!(frame.get_pixel(x, 4), Some(RED), "x = {}", x);
        }
        assert_eq!(frame.get_pixel(0, 0), Some(BLACK));
    }

    #[test]
    fn test_line_outside_view_is_dropped() {
        let mut fb = framebuffer(8, 8);
        draw_line(
            &mut fb,
            Vec4::new(2.0, 2.0, 0.5, 1.0),
            Vec4::new(3.0, 5.0, 0.5, 1.0),
            RED,
        );
        assert!(fb.to_frame().is_uniform(BLACK));
    }

    #[test]
    fn test_line_is_depth_tested() {
        let mut fb = framebuffer(8, 8);
        draw_triangle(&mut fb, tri(0.2), BLUE);
        draw_line(
            &mut fb,
            Vec4::new(-0.99, 0.0, 0.5, 1.0),
            Vec4::new(0.99, 0.0, 0.5, 1.0),
            RED,
        );
        assert!(fb.to_frame().is_uniform(BLUE));
    }
}
