//! helioplan — spatial layout and snapping engine for solar plant editors
//!
//! The engine behind interactive panel dragging in a plant layout tool:
//! - boundary geometry: point-in-polygon tests, nearest-edge projection,
//!   elastic resistance and hard clamping ([`layout`])
//! - snapping: row detection, gap/extension infill and neighbor-lattice
//!   alignment with force-snap priority between the two ([`snap`])
//! - the panel/group store and its mutation API ([`plant`])
//! - the drag session state machine that threads a pointer point through
//!   the correction pipeline and commits or reverts on release ([`drag`])
//!
//! Rendering, cameras and input systems are external collaborators: the host
//! projects pointer events to world points (see [`ray`]) and draws whatever
//! the [`drag::DragFeedback`] flags tell it to.

pub mod math;
pub mod ray;
pub mod layout;
pub mod snap;
pub mod plant;
pub mod drag;

pub use math::{Vec2, Vec3};
pub use layout::{Polygon, ZBounds};
pub use plant::{PlantDefinition, PlantState, PlantError};
pub use drag::{DragSession, DragSettings, DragFeedback, DragEnd};
