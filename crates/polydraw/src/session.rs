use std::vec::Drain;

use glam::Vec2;

use crate::{
    config::DrawConfig,
    polygon::{Polygon, PolygonId, Vertex},
};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Mode {
    /// A polygon was finished or a duplicate was dropped, and nothing new has
    /// been started.
    Idle,
    /// Clicks add vertices to the open polygon.
    Drawing,
    /// A duplicate follows the pointer until the next click drops it.
    DraggingDuplicate,
}

/// Which UI actions currently make sense.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ActionStates {
    pub complete: bool,
    pub copy: bool,
    pub new_polygon: bool,
    pub reset: bool,
}

/// What a renderer has to do to mirror the session. Events are queued in
/// the order the mutations happened.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum SceneEvent {
    /// The polygon's geometry was (re)generated; re-read its representation.
    Refreshed(PolygonId),
    /// Only the placement offset changed.
    Moved { id: PolygonId, position: Vec2 },
    /// The polygon's geometry was detached and it is gone from the session.
    Removed(PolygonId),
}

/// The interaction state machine: owns every polygon of a drawing session
/// and routes pointer input and UI actions to them.
#[derive(Debug)]
pub struct Session {
    config: DrawConfig,
    next_id: u32,
    drawing: Option<Polygon>,
    pending: Option<Polygon>,
    committed: Vec<Polygon>,
    events: Vec<SceneEvent>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(DrawConfig::default())
    }
}

impl Session {
    /// Starts a session in [`Mode::Drawing`] with an empty polygon.
    pub fn new(config: DrawConfig) -> Self {
        let mut session = Self {
            config,
            next_id: 0,
            drawing: None,
            pending: None,
            committed: Vec::new(),
            events: Vec::new(),
        };
        session.drawing = Some(session.new_polygon());

        session
    }

    pub fn config(&self) -> &DrawConfig {
        &self.config
    }

    pub fn mode(&self) -> Mode {
        if self.pending.is_some() {
            Mode::DraggingDuplicate
        } else if self.drawing.is_some() {
            Mode::Drawing
        } else {
            Mode::Idle
        }
    }

    pub fn actions(&self) -> ActionStates {
        let mode = self.mode();

        ActionStates {
            complete: mode == Mode::Drawing
                && self.drawing.as_ref().is_some_and(|p| p.vertex_count() >= 3),
            copy: mode == Mode::Idle && !self.committed.is_empty(),
            new_polygon: mode == Mode::Idle,
            reset: true,
        }
    }

    pub fn drawing_polygon(&self) -> Option<&Polygon> {
        self.drawing.as_ref()
    }

    pub fn pending_duplicate(&self) -> Option<&Polygon> {
        self.pending.as_ref()
    }

    /// Completed and placed polygons, oldest first.
    pub fn committed_polygons(&self) -> &[Polygon] {
        &self.committed
    }

    /// Every polygon the session tracks.
    pub fn polygons(&self) -> impl Iterator<Item = &Polygon> {
        self.committed
            .iter()
            .chain(self.drawing.as_ref())
            .chain(self.pending.as_ref())
    }

    pub fn polygon(&self, id: PolygonId) -> Option<&Polygon> {
        self.polygons().find(|p| p.id() == id)
    }

    /// Hands the queued scene events to the renderer.
    pub fn drain_scene_events(&mut self) -> Drain<'_, SceneEvent> {
        self.events.drain(..)
    }

    /// Pointer click resolved to a ground-plane point. `None` (the ray missed
    /// the ground) is ignored.
    pub fn click(&mut self, point: Option<Vertex>) {
        let Some(point) = point else {
            log::trace!("click missed the ground plane");
            return;
        };

        match self.mode() {
            Mode::DraggingDuplicate => self.place_duplicate(point),
            Mode::Drawing => self.add_vertex(point),
            Mode::Idle => log::trace!("click at {point} ignored while idle"),
        }
    }

    /// Pointer movement resolved to a ground-plane point. Only a pending
    /// duplicate reacts to it.
    pub fn pointer_moved(&mut self, point: Option<Vertex>) {
        let Some(point) = point else {
            return;
        };

        if let Some(pending) = &mut self.pending {
            if pending.move_to(point.x, point.y) {
                self.events.push(SceneEvent::Moved {
                    id: pending.id(),
                    position: pending.position(),
                });
            }
        }
    }

    /// Finishes the polygon being drawn. No-op returning `false` unless the
    /// session is drawing a polygon with at least three vertices.
    pub fn complete(&mut self) -> bool {
        if self.mode() != Mode::Drawing {
            log::trace!("complete ignored in {:?}", self.mode());
            return false;
        }

        let Some(mut polygon) = self.drawing.take() else {
            return false;
        };

        if !polygon.complete() {
            log::trace!(
                "complete ignored with {} vertices",
                polygon.vertex_count()
            );
            self.drawing = Some(polygon);
            return false;
        }

        log::debug!(
            "completed polygon {:?} with {} vertices",
            polygon.id(),
            polygon.vertex_count()
        );

        self.events.push(SceneEvent::Refreshed(polygon.id()));
        self.committed.push(polygon);

        true
    }

    /// Duplicates the most recently committed polygon and stages it at the
    /// configured offset, entering [`Mode::DraggingDuplicate`]. Only valid
    /// from [`Mode::Idle`].
    pub fn copy_last(&mut self) -> bool {
        if self.mode() != Mode::Idle {
            log::trace!("copy ignored in {:?}", self.mode());
            return false;
        }

        let id = PolygonId(self.next_id);
        let Some(mut duplicate) = self.committed.last().and_then(|source| source.copy(id)) else {
            log::trace!("copy ignored without a committed polygon");
            return false;
        };
        self.next_id += 1;

        let offset = self.config.duplicate_offset;
        duplicate.move_to(offset.x, offset.y);

        log::debug!("staged duplicate {id:?} at {offset}");

        self.events.push(SceneEvent::Refreshed(id));
        self.events.push(SceneEvent::Moved {
            id,
            position: duplicate.position(),
        });
        self.pending = Some(duplicate);

        true
    }

    /// Starts a new empty polygon from [`Mode::Idle`], keeping everything
    /// committed so far.
    pub fn begin_polygon(&mut self) -> bool {
        if self.mode() != Mode::Idle {
            log::trace!("new polygon ignored in {:?}", self.mode());
            return false;
        }

        let polygon = self.new_polygon();
        log::debug!("started polygon {:?}", polygon.id());
        self.drawing = Some(polygon);

        true
    }

    /// Detaches every polygon and starts over in [`Mode::Drawing`]. Valid in
    /// any mode.
    pub fn reset(&mut self) {
        let polygons = self
            .committed
            .drain(..)
            .chain(self.drawing.take())
            .chain(self.pending.take());

        for mut polygon in polygons {
            if polygon.remove() {
                self.events.push(SceneEvent::Removed(polygon.id()));
            }
        }

        self.drawing = Some(self.new_polygon());

        log::debug!("session reset");
    }

    fn add_vertex(&mut self, point: Vertex) {
        let Some(polygon) = &mut self.drawing else {
            return;
        };

        if !polygon.add_vertex(point) {
            return;
        }

        self.events.push(SceneEvent::Refreshed(polygon.id()));

        if polygon.is_closed_within(self.config.closure_epsilon) {
            log::debug!("polygon {:?} closed by proximity", polygon.id());
            self.complete();
        }
    }

    fn place_duplicate(&mut self, point: Vertex) {
        let Some(mut duplicate) = self.pending.take() else {
            return;
        };

        duplicate.move_to(point.x, point.y);
        self.events.push(SceneEvent::Moved {
            id: duplicate.id(),
            position: duplicate.position(),
        });

        log::debug!("placed duplicate {:?} at {point}", duplicate.id());
        self.committed.push(duplicate);
    }

    fn new_polygon(&mut self) -> Polygon {
        let id = PolygonId(self.next_id);
        self.next_id += 1;

        Polygon::new(id, self.config.fill_color, self.config.line_color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_drawing() {
        let session = Session::default();
        assert_eq!(session.mode(), Mode::Drawing);
        assert_eq!(session.drawing_polygon().unwrap().vertex_count(), 0);
        assert_eq!(
            session.actions(),
            ActionStates {
                complete: false,
                copy: false,
                new_polygon: false,
                reset: true,
            }
        );
    }

    #[test]
    fn ray_miss_is_ignored() {
        let mut session = Session::default();
        session.click(None);
        session.pointer_moved(None);
        assert_eq!(session.drawing_polygon().unwrap().vertex_count(), 0);
        assert_eq!(session.drain_scene_events().count(), 0);
    }

    #[test]
    fn idle_click_is_ignored() {
        let mut session = Session::default();
        for (x, y) in [(0., 0.), (5., 0.), (5., 5.)] {
            session.click(Some(Vec2::new(x, y)));
        }
        assert!(session.complete());
        session.drain_scene_events().for_each(drop);

        session.click(Some(Vec2::new(1., 1.)));
        assert_eq!(session.mode(), Mode::Idle);
        assert_eq!(session.committed_polygons().len(), 1);
        assert_eq!(session.drain_scene_events().count(), 0);
    }

    #[test]
    fn ids_are_not_reused() {
        let mut session = Session::default();
        let first = session.drawing_polygon().unwrap().id();
        session.reset();
        let second = session.drawing_polygon().unwrap().id();
        assert_ne!(first, second);
    }

    #[test]
    fn begin_polygon_only_from_idle() {
        let mut session = Session::default();
        assert!(!session.begin_polygon());

        for (x, y) in [(0., 0.), (5., 0.), (5., 5.)] {
            session.click(Some(Vec2::new(x, y)));
        }
        session.complete();
        assert!(session.actions().new_polygon);
        assert!(session.begin_polygon());
        assert_eq!(session.mode(), Mode::Drawing);
        assert_eq!(session.committed_polygons().len(), 1);
        assert_eq!(session.drawing_polygon().unwrap().vertex_count(), 0);
    }
}
