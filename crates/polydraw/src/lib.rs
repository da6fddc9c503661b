//! Core of an interactive polygon drawing tool: the polygon lifecycle
//! (open → completed → duplicated → placed) and the session state machine
//! that routes pointer input to it.
//!
//! Nothing here touches a GPU or a window. A renderer drives a [`Session`]
//! with ground-plane points (see [`GroundPlane`]) and mirrors it by draining
//! [`SceneEvent`]s and reading each polygon's [`Representation`].

pub use crate::config::DrawConfig;
pub use crate::error::{Error, Result};
pub use crate::polygon::{
    Color, CompletedShape, Polygon, PolygonId, PolygonState, ProvisionalShape, Representation,
    Vertex,
};
pub use crate::ray::{GroundPlane, Ray};
pub use crate::session::{ActionStates, Mode, SceneEvent, Session};

mod config;
mod error;
mod polygon;
mod ray;
mod session;
pub mod triangulate;
