use glam::{Mat4, Vec2, Vec3};
use polydraw::Ray;

const EYE_HEIGHT: f32 = 10.;
const NEAR: f32 = 0.1;
const FAR: f32 = 1000.;
const MIN_ZOOM: f32 = 0.05;
const MAX_ZOOM: f32 = 50.;

/// Top-down orthographic camera over the ground plane. At zoom 1 one world
/// unit covers one physical pixel. Pans and zooms; never rotates.
#[derive(Clone, Debug)]
pub struct OrthoCamera {
    center: Vec2,
    zoom: f32,
    viewport: Vec2,
}

impl OrthoCamera {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            center: Vec2::ZERO,
            zoom: 1.,
            viewport: viewport_size(width, height),
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.viewport = viewport_size(width, height);
    }

    pub fn proj_view(&self) -> Mat4 {
        let half = self.viewport / (2. * self.zoom);
        let proj = Mat4::orthographic_rh(-half.x, half.x, -half.y, half.y, NEAR, FAR);
        let view = Mat4::look_at_rh(
            self.center.extend(EYE_HEIGHT),
            self.center.extend(0.),
            Vec3::Y,
        );

        proj * view
    }

    /// Ray under a cursor given in physical pixels from the window's top-left
    /// corner.
    pub fn cursor_ray(&self, cursor: Vec2) -> Option<Ray> {
        let ndc = Vec2::new(
            cursor.x / self.viewport.x * 2. - 1.,
            1. - cursor.y / self.viewport.y * 2.,
        );

        Ray::from_ndc(ndc, &self.proj_view().inverse())
    }

    /// Drags the view by a cursor delta in physical pixels, so the ground
    /// point under the cursor stays under it.
    pub fn pan_by_pixels(&mut self, delta: Vec2) {
        self.center -= Vec2::new(delta.x, -delta.y) / self.zoom;
    }

    /// Zooms by `steps` wheel notches, positive zooming in.
    pub fn zoom_by(&mut self, steps: f32) {
        self.zoom = (self.zoom * 1.1_f32.powf(steps)).clamp(MIN_ZOOM, MAX_ZOOM);
    }
}

fn viewport_size(width: u32, height: u32) -> Vec2 {
    Vec2::new(width.max(1) as f32, height.max(1) as f32)
}

#[cfg(test)]
mod tests {
    use polydraw::GroundPlane;

    use super::*;

    fn ground_hit(camera: &OrthoCamera, cursor: Vec2) -> Vec2 {
        GroundPlane::new(500.)
            .intersect(&camera.cursor_ray(cursor).unwrap())
            .unwrap()
    }

    #[test]
    fn window_center_hits_camera_center() {
        let camera = OrthoCamera::new(1280, 720);
        assert!(ground_hit(&camera, Vec2::new(640., 360.)).length() < 1e-3);
    }

    #[test]
    fn one_pixel_is_one_unit_at_unit_zoom() {
        let camera = OrthoCamera::new(1280, 720);
        let hit = ground_hit(&camera, Vec2::new(740., 260.));
        assert!((hit - Vec2::new(100., 100.)).length() < 1e-2);
    }

    #[test]
    fn pan_keeps_point_under_cursor() {
        let mut camera = OrthoCamera::new(800, 600);
        camera.zoom_by(3.);

        let before = ground_hit(&camera, Vec2::new(100., 100.));
        camera.pan_by_pixels(Vec2::new(50., -20.));
        let after = ground_hit(&camera, Vec2::new(150., 80.));

        assert!((before - after).length() < 1e-2);
    }

    #[test]
    fn zoom_is_clamped() {
        let mut camera = OrthoCamera::new(800, 600);
        camera.zoom_by(-1000.);
        assert_eq!(camera.zoom, MIN_ZOOM);
        camera.zoom_by(1000.);
        assert_eq!(camera.zoom, MAX_ZOOM);
    }
}
