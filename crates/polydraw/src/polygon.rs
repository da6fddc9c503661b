use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::triangulate::{fan_triangulate, triangulate_polygon};

/// A boundary point on the ground plane. The plane sits at z = 0, so the
/// third coordinate is implied.
pub type Vertex = Vec2;

/// Session-unique polygon handle. Renderers key their GPU objects by it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PolygonId(pub u32);

/// An sRGB color stored as `0xRRGGBB`. Bits above the low 24 are dropped,
/// including when deserialized.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub struct Color(u32);

impl From<u32> for Color {
    fn from(hex: u32) -> Self {
        Self::from_hex(hex)
    }
}

impl From<Color> for u32 {
    fn from(color: Color) -> Self {
        color.hex()
    }
}

impl Color {
    pub const fn from_hex(hex: u32) -> Self {
        Self(hex & 0xff_ffff)
    }

    pub const fn hex(self) -> u32 {
        self.0
    }

    /// Channels in [0, 1], still sRGB encoded.
    pub fn to_srgb(self) -> Vec3 {
        Vec3::new(
            ((self.0 >> 16) & 0xff) as f32,
            ((self.0 >> 8) & 0xff) as f32,
            (self.0 & 0xff) as f32,
        ) / 255.
    }

    /// Channels in [0, 1], decoded to linear light for writing to an sRGB
    /// render target.
    pub fn to_linear(self) -> Vec3 {
        self.to_srgb().map(|c| {
            if c <= 0.04045 {
                c / 12.92
            } else {
                ((c + 0.055) / 1.055).powf(2.4)
            }
        })
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PolygonState {
    /// Accepting vertices.
    Open,
    /// Vertices are frozen.
    Completed,
}

/// Geometry shown for an open polygon: one point per vertex plus an open
/// polyline through the vertices in order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProvisionalShape {
    pub points: Vec<Vec3>,
    pub polyline: Vec<[Vec3; 2]>,
}

/// Geometry shown for a completed polygon, in polygon-local coordinates. The
/// placement offset is applied by the renderer.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CompletedShape {
    pub fill_positions: Vec<Vec3>,
    /// Three indices into `fill_positions` per triangle.
    pub fill_indices: Vec<u32>,
    /// One segment per boundary edge, the closing edge last.
    pub outline: Vec<[Vec3; 2]>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Representation {
    Provisional(ProvisionalShape),
    Completed(CompletedShape),
}

/// A polygon and the renderable geometry derived from its vertices.
///
/// Only [`Polygon::add_vertex`] and [`Polygon::complete`] regenerate
/// geometry. [`Polygon::move_to`] changes the placement offset alone.
#[derive(Debug)]
pub struct Polygon {
    id: PolygonId,
    vertices: Vec<Vertex>,
    state: PolygonState,
    fill_color: Color,
    line_color: Color,
    position: Vec2,
    representation: Option<Representation>,
}

impl Polygon {
    pub fn new(id: PolygonId, fill_color: Color, line_color: Color) -> Self {
        Self {
            id,
            vertices: Vec::new(),
            state: PolygonState::Open,
            fill_color,
            line_color,
            position: Vec2::ZERO,
            representation: None,
        }
    }

    pub fn id(&self) -> PolygonId {
        self.id
    }

    /// Vertices in boundary order.
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn state(&self) -> PolygonState {
        self.state
    }

    pub fn is_completed(&self) -> bool {
        self.state == PolygonState::Completed
    }

    pub fn fill_color(&self) -> Color {
        self.fill_color
    }

    pub fn line_color(&self) -> Color {
        self.line_color
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// The currently attached geometry, if any.
    pub fn representation(&self) -> Option<&Representation> {
        self.representation.as_ref()
    }

    /// Whether the boundary has more than two vertices and ends within
    /// `epsilon` of where it started.
    pub fn is_closed_within(&self, epsilon: f32) -> bool {
        match (self.vertices.first(), self.vertices.last()) {
            (Some(first), Some(last)) if self.vertices.len() > 2 => first.distance(*last) < epsilon,
            _ => false,
        }
    }

    /// Appends a vertex to an open polygon. Returns `false` and leaves the
    /// polygon untouched once it is completed.
    pub fn add_vertex(&mut self, vertex: Vertex) -> bool {
        if self.state != PolygonState::Open {
            return false;
        }

        self.vertices.push(vertex);
        self.representation = Some(Representation::Provisional(self.provisional_shape()));

        true
    }

    /// Freezes the vertices and replaces the provisional geometry with a
    /// fill and outline. Requires an open polygon with at least three
    /// vertices; returns `false` without changes otherwise.
    pub fn complete(&mut self) -> bool {
        if self.state != PolygonState::Open || self.vertices.len() < 3 {
            return false;
        }

        self.representation = Some(Representation::Completed(self.completed_shape()));
        self.state = PolygonState::Completed;

        true
    }

    /// Duplicates a completed polygon under a new id. The copy owns its own
    /// vertices, keeps the colors, starts at placement zero and is already
    /// completed.
    pub fn copy(&self, id: PolygonId) -> Option<Polygon> {
        if !self.is_completed() {
            return None;
        }

        let mut copy = Polygon::new(id, self.fill_color, self.line_color);
        copy.vertices = self.vertices.clone();
        copy.complete();

        Some(copy)
    }

    /// Sets the placement offset of a completed polygon. Vertices and
    /// geometry are left alone. Returns `false` (no-op) for open polygons.
    pub fn move_to(&mut self, x: f32, y: f32) -> bool {
        if !self.is_completed() {
            return false;
        }

        self.position = Vec2::new(x, y);

        true
    }

    /// Detaches all geometry. Safe to call in any state and more than once;
    /// returns whether anything was attached.
    pub fn remove(&mut self) -> bool {
        self.representation.take().is_some()
    }

    fn provisional_shape(&self) -> ProvisionalShape {
        let points: Vec<Vec3> = self.vertices.iter().map(|v| v.extend(0.)).collect();
        let polyline = points.windows(2).map(|pair| [pair[0], pair[1]]).collect();

        ProvisionalShape { points, polyline }
    }

    fn completed_shape(&self) -> CompletedShape {
        let fill_positions: Vec<Vec3> = self.vertices.iter().map(|v| v.extend(0.)).collect();

        let fill_indices = triangulate_polygon(&self.vertices).unwrap_or_else(|err| {
            log::warn!(
                "polygon {:?}: {err}, falling back to fan triangulation",
                self.id
            );
            fan_triangulate(self.vertices.len())
        });

        let n = fill_positions.len();
        let outline = (0..n)
            .map(|i| [fill_positions[i], fill_positions[(i + 1) % n]])
            .filter(|[a, b]| a != b)
            .collect();

        CompletedShape {
            fill_positions,
            fill_indices,
            outline,
        }
    }
}
