//! Pointer ray casting against the ground plane.

use glam::{Mat4, Vec2, Vec3};

use crate::polygon::Vertex;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Normalized.
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    /// Builds the ray under a pointer from its normalized device coordinates
    /// (x right, y up, both in [-1, 1]) and the inverse of the camera's
    /// view-projection matrix. Uses wgpu's [0, 1] clip depth range.
    pub fn from_ndc(ndc: Vec2, inverse_proj_view: &Mat4) -> Option<Self> {
        let near = inverse_proj_view.project_point3(ndc.extend(0.));
        let far = inverse_proj_view.project_point3(ndc.extend(1.));
        let direction = far - near;

        if !near.is_finite() || !direction.is_finite() || direction.length_squared() == 0. {
            return None;
        }

        Some(Self::new(near, direction))
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// The z = 0 drawing surface: a square of side `2 * half_extent` centred on
/// the origin.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GroundPlane {
    pub half_extent: f32,
}

impl GroundPlane {
    pub fn new(half_extent: f32) -> Self {
        Self { half_extent }
    }

    /// Where `ray` crosses the plane, or `None` when it runs parallel to it,
    /// crosses behind its origin, or lands off the square.
    pub fn intersect(&self, ray: &Ray) -> Option<Vertex> {
        if ray.direction.z.abs() <= f32::EPSILON {
            return None;
        }

        let t = -ray.origin.z / ray.direction.z;
        if t < 0. {
            return None;
        }

        let hit = ray.at(t).truncate();
        if hit.abs().max_element() > self.half_extent {
            return None;
        }

        Some(hit)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn straight_down_hits() {
        let ground = GroundPlane::new(500.);
        let ray = Ray::new(Vec3::new(3., -4., 10.), Vec3::NEG_Z);
        assert_eq!(ground.intersect(&ray), Some(Vec2::new(3., -4.)));
    }

    #[test]
    fn oblique_hit() {
        let ground = GroundPlane::new(500.);
        let ray = Ray::new(Vec3::new(0., 0., 10.), Vec3::new(1., 0., -1.));
        let hit = ground.intersect(&ray).unwrap();
        assert_relative_eq!(hit.x, 10., epsilon = 1e-4);
        assert_relative_eq!(hit.y, 0., epsilon = 1e-4);
    }

    #[test]
    fn misses() {
        let ground = GroundPlane::new(500.);

        let parallel = Ray::new(Vec3::new(0., 0., 10.), Vec3::X);
        assert_eq!(ground.intersect(&parallel), None);

        let away = Ray::new(Vec3::new(0., 0., 10.), Vec3::Z);
        assert_eq!(ground.intersect(&away), None);

        let off_edge = Ray::new(Vec3::new(600., 0., 10.), Vec3::NEG_Z);
        assert_eq!(ground.intersect(&off_edge), None);
    }

    #[test]
    fn unproject_orthographic_camera() {
        let proj = Mat4::orthographic_rh(-640., 640., -360., 360., 0.1, 1000.);
        let view = Mat4::look_at_rh(Vec3::new(20., 10., 10.), Vec3::new(20., 10., 0.), Vec3::Y);
        let inverse = (proj * view).inverse();

        let ray = Ray::from_ndc(Vec2::new(0.5, -0.5), &inverse).unwrap();
        assert_relative_eq!(ray.direction.z, -1., epsilon = 1e-4);

        let hit = GroundPlane::new(500.).intersect(&ray).unwrap();
        assert_relative_eq!(hit.x, 20. + 320., epsilon = 1e-2);
        assert_relative_eq!(hit.y, 10. - 180., epsilon = 1e-2);
    }
}
