//! Fill triangulation for simple polygons, wrapping `earcutr`.

use glam::Vec2;

use crate::{Error, Result};

/// Largest vertex count for which a convex polygon is fanned instead of being
/// ear clipped.
const MAX_FAN_VERTICES: usize = 8;

/// Triangulates a simple polygon (no holes). Returns triangle indices into
/// `points`, three per triangle.
pub fn triangulate_polygon(points: &[Vec2]) -> Result<Vec<u32>> {
    let n = points.len();

    if n < 3 {
        return Err(Error::triangulation(format!(
            "need at least 3 points to triangulate, got {n}"
        )));
    }

    if n == 3 {
        return Ok(vec![0, 1, 2]);
    }

    if n <= MAX_FAN_VERTICES && is_convex(points) {
        return Ok(fan_triangulate(n));
    }

    let mut coords = Vec::with_capacity(n * 2);
    for p in points {
        coords.push(p.x as f64);
        coords.push(p.y as f64);
    }

    let indices = earcutr::earcut(&coords, &[], 2)
        .map_err(|e| Error::triangulation(format!("{e:?}")))?;

    Ok(indices.into_iter().map(|i| i as u32).collect())
}

/// Fan triangulation around the first vertex. Only correct for convex
/// polygons; also used as the fallback when ear clipping fails.
pub fn fan_triangulate(n: usize) -> Vec<u32> {
    let mut indices = Vec::with_capacity(n.saturating_sub(2) * 3);
    for i in 1..n.saturating_sub(1) {
        indices.extend([0, i as u32, i as u32 + 1]);
    }
    indices
}

/// All consecutive corner cross products share a sign (collinear corners are
/// skipped).
fn is_convex(points: &[Vec2]) -> bool {
    let n = points.len();
    let mut sign = 0.;

    for i in 0..n {
        let p0 = points[i];
        let p1 = points[(i + 1) % n];
        let p2 = points[(i + 2) % n];

        let cross = (p1 - p0).perp_dot(p2 - p1);
        if cross.abs() <= 1e-6 {
            continue;
        }

        if sign == 0. {
            sign = cross.signum();
        } else if sign != cross.signum() {
            return false;
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    /// Shoelace formula; positive for CCW winding.
    fn signed_area(points: &[Vec2]) -> f32 {
        let n = points.len();
        (0..n)
            .map(|i| points[i].perp_dot(points[(i + 1) % n]))
            .sum::<f32>()
            / 2.
    }

    fn triangle_area_sum(points: &[Vec2], indices: &[u32]) -> f32 {
        indices
            .chunks(3)
            .map(|tri| {
                let [a, b, c] = [0, 1, 2].map(|k| points[tri[k] as usize]);
                ((b - a).perp_dot(c - a) / 2.).abs()
            })
            .sum()
    }

    #[test]
    fn too_few_points() {
        assert!(triangulate_polygon(&[Vec2::ZERO, Vec2::X]).is_err());
    }

    #[test]
    fn triangle() {
        let points = [Vec2::ZERO, Vec2::new(5., 0.), Vec2::new(5., 5.)];
        assert_eq!(triangulate_polygon(&points).unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn convex_square_is_fanned() {
        let points = [
            Vec2::new(0., 0.),
            Vec2::new(10., 0.),
            Vec2::new(10., 10.),
            Vec2::new(0., 10.),
        ];
        assert_eq!(triangulate_polygon(&points).unwrap(), vec![0, 1, 2, 0, 2, 3]);
    }

    #[test]
    fn concave_polygon_covers_its_area() {
        // An "L" shape.
        let points = [
            Vec2::new(0., 0.),
            Vec2::new(4., 0.),
            Vec2::new(4., 1.),
            Vec2::new(1., 1.),
            Vec2::new(1., 4.),
            Vec2::new(0., 4.),
        ];

        let indices = triangulate_polygon(&points).unwrap();
        assert_eq!(indices.len(), (points.len() - 2) * 3);
        assert_relative_eq!(
            triangle_area_sum(&points, &indices),
            signed_area(&points).abs(),
            epsilon = 1e-4
        );
    }

    #[test]
    fn clockwise_winding() {
        let points = [
            Vec2::new(0., 0.),
            Vec2::new(0., 10.),
            Vec2::new(10., 10.),
            Vec2::new(10., 0.),
        ];
        assert!(signed_area(&points) < 0.);
        let indices = triangulate_polygon(&points).unwrap();
        assert_relative_eq!(triangle_area_sum(&points, &indices), 100., epsilon = 1e-4);
    }

    #[test]
    fn fan_of_degenerate_count_is_empty() {
        assert!(fan_triangulate(2).is_empty());
        assert_eq!(fan_triangulate(5).len(), 9);
    }
}
