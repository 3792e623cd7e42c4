//! Drag session controller
//!
//! Orchestrates one interactive panel drag from pointer-down to pointer-up.
//! Structured after a handle-drag-tracker pattern: the session owns all
//! gesture-local state, the host feeds it projected world points, and the
//! plant store is only written at commit time.
//!
//! Per-frame pipeline (fixed order, each stage feeds the next):
//! boundary resistance → row/gap snap → grid snap (skipped when the row snap
//! is forced) → hard polygon clamp → translation rounding → validity check.
//!
//! A drag whose final position never lands inside the boundary simply
//! reverts; that is a normal outcome, not an error.

use tracing::debug;

use crate::math::{Vec2, Vec3};
use crate::layout::{apply_boundary_resistance, clamp_to_polygon, ZBounds};
use crate::snap::{apply_row_snapping, apply_snapping, detect_rows, Row, ROW_BUCKET_FACTOR};
use crate::plant::{PlantError, PlantState};

/// Host-side drag parameters
#[derive(Debug, Clone, Copy)]
pub struct DragSettings {
    /// Coarse rounding applied after all snapping: each axis is rounded to
    /// the nearest multiple. 1.0 normally, 0.01 while edit mode is active.
    pub translation_snap: f32,
    /// Vertical clamp for the drag plane
    pub z_bounds: ZBounds,
}

impl DragSettings {
    pub fn new(z_bounds: ZBounds) -> Self {
        Self { translation_snap: 1.0, z_bounds }
    }

    /// Fine-grained rounding for edit mode
    pub fn edit_mode(z_bounds: ZBounds) -> Self {
        Self { translation_snap: 0.01, z_bounds }
    }
}

/// Per-frame result emitted for rendering feedback
#[derive(Debug, Clone, Copy)]
pub struct DragFeedback {
    /// Corrected position for this frame
    pub position: Vec3,
    /// Final position lies inside the boundary polygon
    pub is_valid: bool,
    /// Raw pointer was outside the boundary (resistance is engaged)
    pub is_out_of_bounds: bool,
    /// Grid/neighbor snap moved the point this frame
    pub is_snapping: bool,
    /// Row/gap snap moved the point this frame
    pub is_row_snapping: bool,
}

/// How a drag gesture ended
#[derive(Debug, Clone)]
pub enum DragEnd {
    /// Final position persisted; the panel may have adopted a new group
    Committed {
        position: Vec3,
        reassigned_group: Option<String>,
    },
    /// Position restored — nothing persisted. `position` is the pre-drag
    /// position the renderer should snap back to.
    Reverted { position: Vec3 },
}

/// Row detection memo, keyed by the store's mutation counter
#[derive(Debug, Clone)]
struct RowCache {
    version: u64,
    rows: Vec<Row>,
    other_positions: Vec<Vec2>,
}

/// State local to one active gesture
#[derive(Debug, Clone)]
struct PanelDrag {
    panel_id: String,
    original_position: Vec3,
    /// Drags stay on the horizontal plane through the panel's original Z
    plane_z: f32,
    last: Option<DragFeedback>,
    cache: Option<RowCache>,
}

/// Drag gesture state machine: Idle → Dragging → (Committed | Reverted).
///
/// Only one panel can be dragged at a time; beginning a new drag while one is
/// active implicitly cancels the old one.
#[derive(Debug, Clone, Default)]
pub struct DragSession {
    active: Option<PanelDrag>,
}

impl DragSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dragging(&self) -> bool {
        self.active.is_some()
    }

    /// Panel currently being dragged, if any
    pub fn dragged_panel(&self) -> Option<&str> {
        self.active.as_ref().map(|d| d.panel_id.as_str())
    }

    /// Idle → Dragging. Fails if the panel does not exist.
    pub fn begin(&mut self, panel_id: &str, plant: &PlantState) -> Result<(), PlantError> {
        let panel = plant
            .panel(panel_id)
            .ok_or_else(|| PlantError::UnknownPanel(panel_id.to_string()))?;
        if self.active.is_some() {
            debug!(panel_id, "drag restarted over an active gesture");
        }
        self.active = Some(PanelDrag {
            panel_id: panel_id.to_string(),
            original_position: panel.position,
            plane_z: panel.position.z,
            last: None,
            cache: None,
        });
        Ok(())
    }

    /// Run one pointer-move tick through the correction pipeline.
    ///
    /// `pointer` is the pointer ray projected onto the drag plane (see
    /// [`crate::ray::project_to_drag_plane`]). Returns None when idle.
    pub fn update(
        &mut self,
        pointer: Vec3,
        plant: &PlantState,
        settings: &DragSettings,
    ) -> Option<DragFeedback> {
        let drag = self.active.as_mut()?;
        let boundary = plant.boundary();
        let config = plant.snap_config();

        // Refresh derived row structure when the store has changed
        let stale = drag
            .cache
            .as_ref()
            .map(|c| c.version != plant.version())
            .unwrap_or(true);
        if stale {
            let other_positions = plant.other_panel_positions(&drag.panel_id);
            let row_tolerance = plant.dimensions().width * ROW_BUCKET_FACTOR;
            let rows = detect_rows(&other_positions, row_tolerance, config.step_x);
            drag.cache = Some(RowCache {
                version: plant.version(),
                rows,
                other_positions,
            });
        }
        let cache = match &drag.cache {
            Some(c) => c,
            None => return None,
        };

        let raw = pointer.xy();
        let is_out_of_bounds = !boundary.contains(raw);

        let resisted = apply_boundary_resistance(raw, boundary);

        let row = apply_row_snapping(resisted, &cache.rows, &config);

        let grid = if row.forced {
            None
        } else {
            Some(apply_snapping(row.position, &cache.other_positions, &config))
        };
        let after_snap = grid.map(|g| g.position).unwrap_or(row.position);

        let clamped = clamp_to_polygon(
            after_snap.with_z(drag.plane_z),
            boundary,
            settings.z_bounds,
        );

        let position = Vec3::new(
            snap_value(clamped.x, settings.translation_snap),
            snap_value(clamped.y, settings.translation_snap),
            snap_value(clamped.z, settings.translation_snap),
        );

        let feedback = DragFeedback {
            position,
            is_valid: boundary.contains(position.xy()),
            is_out_of_bounds,
            is_snapping: grid.map(|g| g.snapped).unwrap_or(false),
            is_row_snapping: row.snapped,
        };
        drag.last = Some(feedback);
        Some(feedback)
    }

    /// Pointer-up: Dragging → Committed when the last position was valid,
    /// Reverted otherwise.
    ///
    /// Committing persists the position through the store and, when the drop
    /// point collides with a foreign group's panels, reassigns the panel to
    /// that group. Returns None when idle.
    pub fn end(&mut self, plant: &mut PlantState) -> Option<DragEnd> {
        let drag = self.active.take()?;

        let feedback = match drag.last {
            Some(f) if f.is_valid => f,
            _ => {
                debug!(panel_id = %drag.panel_id, "drag reverted: no valid position");
                return Some(DragEnd::Reverted {
                    position: drag.original_position,
                });
            }
        };

        let reassigned_group = plant
            .detect_group_collision(&drag.panel_id, feedback.position.xy())
            .map(str::to_string);
        if let Some(group_id) = &reassigned_group {
            // Collision with another group's string: the panel joins it
            if plant
                .move_panels(std::slice::from_ref(&drag.panel_id), group_id)
                .is_err()
            {
                debug!(panel_id = %drag.panel_id, %group_id, "group reassignment failed");
            }
        }

        match plant.set_panel_position(&drag.panel_id, feedback.position) {
            Ok(()) => {
                debug!(panel_id = %drag.panel_id, ?reassigned_group, "drag committed");
                Some(DragEnd::Committed {
                    position: feedback.position,
                    reassigned_group,
                })
            }
            Err(_) => {
                // Panel vanished mid-drag (e.g. corridor deletion); revert
                Some(DragEnd::Reverted {
                    position: drag.original_position,
                })
            }
        }
    }

    /// Abort the gesture without committing (edit mode toggled off,
    /// pointer-cancel). Dragging → Reverted; no-op when idle.
    pub fn cancel(&mut self) -> Option<DragEnd> {
        let drag = self.active.take()?;
        debug!(panel_id = %drag.panel_id, "drag cancelled");
        Some(DragEnd::Reverted {
            position: drag.original_position,
        })
    }
}

/// Round a value to the nearest multiple of the snap increment
fn snap_value(value: f32, snap: f32) -> f32 {
    if snap <= 0.0 {
        return value;
    }
    (value / snap).round() * snap
}
