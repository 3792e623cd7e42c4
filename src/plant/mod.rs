//! Panel/group data model and plant definition files
//!
//! [`PlantState`] is the single writable source of truth for panel and group
//! state; snapping and drag code only read it, and the drag session writes
//! back through its mutation API at commit time.

mod model;
mod definition;

pub use model::*;
pub use definition::*;
