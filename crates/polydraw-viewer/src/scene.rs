use std::collections::BTreeMap;

use glam::{Vec2, Vec3};
use polydraw::{Color, Polygon, PolygonId, Representation, SceneEvent, Session};

use crate::render::{ColorVertex, GpuObject, MeshData, Renderer};

/// Grid and ground sit just below the drawing plane so polygon geometry wins
/// the depth test.
const GRID_DEPTH: f32 = -0.01;
const GROUND_DEPTH: f32 = -0.02;
const GRID_DIVISIONS: u32 = 100;
const GROUND_COLOR: Color = Color::from_hex(0xffffff);
const GRID_COLOR: Color = Color::from_hex(0xcccccc);

/// GPU mirror of a session's polygons, kept in step by draining the
/// session's scene events.
pub struct SceneMirror {
    ground: GpuObject,
    objects: BTreeMap<PolygonId, GpuObject>,
    point_size: f32,
}

impl SceneMirror {
    pub fn new(renderer: &Renderer, session: &Session) -> Self {
        let config = session.config();
        let ground = renderer.create_object(&ground_mesh(config.ground_half_extent), Vec2::ZERO);

        let mut mirror = Self {
            ground,
            objects: BTreeMap::new(),
            point_size: config.point_size,
        };

        for polygon in session.polygons() {
            mirror.refresh(renderer, polygon);
        }

        mirror
    }

    pub fn sync(&mut self, renderer: &Renderer, session: &mut Session) {
        let events: Vec<_> = session.drain_scene_events().collect();

        for event in events {
            match event {
                SceneEvent::Refreshed(id) => match session.polygon(id) {
                    Some(polygon) => self.refresh(renderer, polygon),
                    None => {
                        self.objects.remove(&id);
                    }
                },
                SceneEvent::Moved { id, position } => {
                    if let Some(object) = self.objects.get(&id) {
                        renderer.set_object_position(object, position);
                    }
                }
                SceneEvent::Removed(id) => {
                    self.objects.remove(&id);
                }
            }
        }
    }

    /// Ground first, then polygons in id (creation) order.
    pub fn objects(&self) -> Vec<&GpuObject> {
        std::iter::once(&self.ground)
            .chain(self.objects.values())
            .collect()
    }

    fn refresh(&mut self, renderer: &Renderer, polygon: &Polygon) {
        let Some(mesh) = polygon_mesh(polygon, self.point_size) else {
            self.objects.remove(&polygon.id());
            return;
        };

        let object = renderer.create_object(&mesh, polygon.position());
        self.objects.insert(polygon.id(), object);
    }
}

/// Flattens a polygon's representation into colored triangle and line
/// vertices. Open polygons show their vertices as squares of side
/// `point_size`.
pub fn polygon_mesh(polygon: &Polygon, point_size: f32) -> Option<MeshData> {
    let fill = polygon.fill_color().to_linear();
    let line = polygon.line_color().to_linear();

    let mesh = match polygon.representation()? {
        Representation::Provisional(shape) => MeshData {
            triangles: shape
                .points
                .iter()
                .flat_map(|&p| square(p, point_size, line))
                .collect(),
            lines: segment_vertices(&shape.polyline, line),
        },
        Representation::Completed(shape) => MeshData {
            triangles: shape
                .fill_indices
                .iter()
                .map(|&i| [shape.fill_positions[i as usize], fill])
                .collect(),
            lines: segment_vertices(&shape.outline, line),
        },
    };

    Some(mesh)
}

fn segment_vertices(segments: &[[Vec3; 2]], color: Vec3) -> Vec<ColorVertex> {
    segments
        .iter()
        .flat_map(|&[a, b]| [[a, color], [b, color]])
        .collect()
}

fn square(center: Vec3, size: f32, color: Vec3) -> [ColorVertex; 6] {
    let h = size / 2.;
    let [a, b, c, d] = [(-h, -h), (h, -h), (h, h), (-h, h)]
        .map(|(x, y)| [center + Vec3::new(x, y, 0.), color]);

    [a, b, c, a, c, d]
}

/// White ground square with a light grid, like a drafting table.
fn ground_mesh(half_extent: f32) -> MeshData {
    let ground = GROUND_COLOR.to_linear();
    let grid = GRID_COLOR.to_linear();

    let triangles = square(Vec3::new(0., 0., GROUND_DEPTH), half_extent * 2., ground).to_vec();

    let step = half_extent * 2. / GRID_DIVISIONS as f32;
    let lines = (0..=GRID_DIVISIONS)
        .flat_map(|i| {
            let t = -half_extent + step * i as f32;
            [
                [Vec3::new(t, -half_extent, GRID_DEPTH), grid],
                [Vec3::new(t, half_extent, GRID_DEPTH), grid],
                [Vec3::new(-half_extent, t, GRID_DEPTH), grid],
                [Vec3::new(half_extent, t, GRID_DEPTH), grid],
            ]
        })
        .collect();

    MeshData { triangles, lines }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn polygon(vertices: &[(f32, f32)]) -> Polygon {
        let mut polygon = Polygon::new(
            PolygonId(0),
            Color::from_hex(0xff0000),
            Color::from_hex(0x00ff00),
        );
        for &(x, y) in vertices {
            polygon.add_vertex(Vec2::new(x, y));
        }
        polygon
    }

    #[test]
    fn empty_polygon_has_no_mesh() {
        assert!(polygon_mesh(&polygon(&[]), 5.).is_none());
    }

    #[test]
    fn open_polygon_mesh() {
        let mesh = polygon_mesh(&polygon(&[(0., 0.), (10., 0.), (10., 10.)]), 5.).unwrap();

        // Two triangles per vertex square, one line per polyline segment.
        assert_eq!(mesh.triangles.len(), 3 * 6);
        assert_eq!(mesh.lines.len(), 2 * 2);

        let green = Color::from_hex(0x00ff00).to_linear();
        assert!(mesh.triangles.iter().all(|v| v[1] == green));
        assert_eq!(mesh.triangles[0][0], Vec3::new(-2.5, -2.5, 0.));
    }

    #[test]
    fn completed_polygon_mesh() {
        let mut quad = polygon(&[(0., 0.), (10., 0.), (10., 10.), (0., 10.)]);
        quad.complete();

        let mesh = polygon_mesh(&quad, 5.).unwrap();
        assert_eq!(mesh.triangles.len(), 6);
        assert_eq!(mesh.lines.len(), 4 * 2);

        let red = Color::from_hex(0xff0000).to_linear();
        assert!(mesh.triangles.iter().all(|v| v[1] == red));
    }

    #[test]
    fn moving_keeps_mesh() {
        let mut triangle = polygon(&[(0., 0.), (10., 0.), (10., 10.)]);
        triangle.complete();
        let before = polygon_mesh(&triangle, 5.);

        triangle.move_to(100., 100.);
        assert_eq!(polygon_mesh(&triangle, 5.), before);
    }

    #[test]
    fn ground_grid() {
        let mesh = ground_mesh(500.);
        assert_eq!(mesh.triangles.len(), 6);
        assert_eq!(mesh.lines.len(), (GRID_DIVISIONS as usize + 1) * 4);
        assert!(mesh.lines.iter().all(|v| v[0].z == GRID_DEPTH));
    }
}
