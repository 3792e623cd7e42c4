//! In-memory panel/group store and its mutation API
//!
//! Invariants maintained by every operation:
//! - each panel's `group_id` references an existing group, and the panel's id
//!   appears in exactly that group's member list;
//! - panels are never destroyed — deletion reassigns them to the reserved
//!   deleted-panels group;
//! - failed operations mutate nothing.

use std::collections::HashMap;
use tracing::debug;

use crate::math::{Vec2, Vec3};
use crate::layout::Polygon;
use crate::snap::SnapConfig;
use super::PlantDefinition;

/// Reserved group holding soft-deleted panels. Created at init, never removed.
pub const DELETED_GROUP_ID: &str = "deleted";

/// Factor of panel length within which a dropped panel adopts a neighbor's group
const GROUP_COLLISION_FACTOR: f32 = 1.5;

/// A single solar panel record
#[derive(Debug, Clone)]
pub struct Panel {
    pub id: String,
    pub group_id: String,
    pub position: Vec3,
    /// Operability flag, independent of spatial state
    pub active: bool,
}

/// A named collection of panels, independently enable/disable-able
#[derive(Debug, Clone)]
pub struct Group {
    pub id: String,
    pub name: String,
    pub color: [f32; 3],
    pub active: bool,
    pub panel_ids: Vec<String>,
}

/// Shared panel geometry (plant-wide, not per panel)
#[derive(Debug, Clone, Copy)]
pub struct PanelDimensions {
    pub length: f32,
    pub width: f32,
}

/// Error type for mutation operations
#[derive(Debug)]
pub enum PlantError {
    /// A group with this name already exists (compared case-insensitively)
    DuplicateName(String),
    /// The operation was given no panels to act on
    EmptySelection,
    UnknownGroup(String),
    UnknownPanel(String),
}

impl std::fmt::Display for PlantError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlantError::DuplicateName(name) => write!(f, "group name already in use: {}", name),
            PlantError::EmptySelection => write!(f, "no panels selected"),
            PlantError::UnknownGroup(id) => write!(f, "unknown group: {}", id),
            PlantError::UnknownPanel(id) => write!(f, "unknown panel: {}", id),
        }
    }
}

impl std::error::Error for PlantError {}

/// The plant: panels, groups, boundary and shared geometry.
///
/// `version` increases on every successful mutation; derived caches (row
/// detection, active summaries) key off it instead of hashing state.
#[derive(Debug, Clone)]
pub struct PlantState {
    panels: HashMap<String, Panel>,
    groups: HashMap<String, Group>,
    dimensions: PanelDimensions,
    tilt_angle: f32,
    boundary: Polygon,
    snap: SnapConfig,
    version: u64,
    next_group_seq: u64,
}

impl PlantState {
    /// Build the store from a plant definition (read-only startup input)
    pub fn from_definition(def: &PlantDefinition) -> Self {
        let mut panels = HashMap::new();
        let mut groups = HashMap::new();

        for group_def in &def.groups {
            let mut panel_ids = Vec::with_capacity(group_def.panels.len());
            for (i, pos) in group_def.panels.iter().enumerate() {
                let id = format!("{}-{}", group_def.id, i);
                panels.insert(id.clone(), Panel {
                    id: id.clone(),
                    group_id: group_def.id.clone(),
                    position: *pos,
                    active: true,
                });
                panel_ids.push(id);
            }
            groups.insert(group_def.id.clone(), Group {
                id: group_def.id.clone(),
                name: group_def.name.clone(),
                color: group_def.color,
                active: !panel_ids.is_empty(),
                panel_ids,
            });
        }

        groups.insert(DELETED_GROUP_ID.to_string(), Group {
            id: DELETED_GROUP_ID.to_string(),
            name: "Deleted".to_string(),
            color: [0.3, 0.3, 0.3],
            active: false,
            panel_ids: Vec::new(),
        });

        Self {
            panels,
            groups,
            dimensions: PanelDimensions {
                length: def.panel_length,
                width: def.panel_width,
            },
            tilt_angle: def.tilt_angle,
            boundary: Polygon::new(def.boundary.clone()),
            snap: def.snap_config(),
            version: 0,
            next_group_seq: 0,
        }
    }

    // ------------------------------------------------------------------
    // Read access
    // ------------------------------------------------------------------

    pub fn panel(&self, id: &str) -> Option<&Panel> {
        self.panels.get(id)
    }

    pub fn group(&self, id: &str) -> Option<&Group> {
        self.groups.get(id)
    }

    pub fn panels(&self) -> impl Iterator<Item = &Panel> {
        self.panels.values()
    }

    pub fn groups(&self) -> impl Iterator<Item = &Group> {
        self.groups.values()
    }

    pub fn dimensions(&self) -> PanelDimensions {
        self.dimensions
    }

    pub fn tilt_angle(&self) -> f32 {
        self.tilt_angle
    }

    pub fn boundary(&self) -> &Polygon {
        &self.boundary
    }

    pub fn snap_config(&self) -> SnapConfig {
        self.snap
    }

    /// Mutation counter for derived caches
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn panel_count(&self) -> usize {
        self.panels.len()
    }

    pub fn active_panel_count(&self) -> usize {
        self.panels.values().filter(|p| p.active).count()
    }

    /// Panel ids of a group, in membership order
    pub fn panels_in_group(&self, group_id: &str) -> &[String] {
        self.groups
            .get(group_id)
            .map(|g| g.panel_ids.as_slice())
            .unwrap_or(&[])
    }

    /// Ground-plane positions of every layout panel except the named one.
    /// Soft-deleted panels are out of the layout and never attract snaps.
    pub fn other_panel_positions(&self, exclude_id: &str) -> Vec<Vec2> {
        self.panels
            .values()
            .filter(|p| p.id != exclude_id && p.group_id != DELETED_GROUP_ID)
            .map(|p| p.position.xy())
            .collect()
    }

    /// Group of the nearest foreign panel within the collision radius, if any.
    ///
    /// Used at drag commit: a panel dropped on top of another group's string
    /// joins that group.
    pub fn detect_group_collision(&self, panel_id: &str, position: Vec2) -> Option<&str> {
        let own_group = &self.panels.get(panel_id)?.group_id;
        let radius = self.dimensions.length * GROUP_COLLISION_FACTOR;

        self.panels
            .values()
            .filter(|p| p.id != panel_id && p.group_id != DELETED_GROUP_ID)
            .map(|p| (position.distance(p.position.xy()), p))
            .filter(|(d, _)| *d < radius)
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .and_then(|(_, p)| {
                if p.group_id != *own_group {
                    Some(p.group_id.as_str())
                } else {
                    None
                }
            })
    }

    // ------------------------------------------------------------------
    // Mutation API
    // ------------------------------------------------------------------

    /// Move a single panel (drag commit path)
    pub fn set_panel_position(&mut self, id: &str, position: Vec3) -> Result<(), PlantError> {
        let panel = self
            .panels
            .get_mut(id)
            .ok_or_else(|| PlantError::UnknownPanel(id.to_string()))?;
        panel.position = position;
        self.version += 1;
        Ok(())
    }

    /// Bulk-flip the active flag on named panels.
    ///
    /// Each affected group's active flag is re-derived as the OR of its
    /// members. (Group-level bulk toggles force-set instead; see
    /// [`set_group_active`](Self::set_group_active).)
    pub fn set_panels_active(&mut self, ids: &[String], active: bool) -> Result<(), PlantError> {
        for id in ids {
            if !self.panels.contains_key(id) {
                return Err(PlantError::UnknownPanel(id.clone()));
            }
        }

        let mut touched_groups = Vec::new();
        for id in ids {
            if let Some(panel) = self.panels.get_mut(id) {
                panel.active = active;
                if !touched_groups.contains(&panel.group_id) {
                    touched_groups.push(panel.group_id.clone());
                }
            }
        }
        for group_id in &touched_groups {
            self.rederive_group_active(group_id);
        }
        self.version += 1;
        debug!(count = ids.len(), active, "panel active flags updated");
        Ok(())
    }

    /// Enable or disable a whole group.
    ///
    /// Flips every member panel and force-sets the group flag rather than
    /// re-deriving it — so an empty group still reports the requested state.
    /// The asymmetry with [`set_panels_active`](Self::set_panels_active) is
    /// deliberate and matches operator expectations for the bulk switch.
    pub fn set_group_active(&mut self, group_id: &str, active: bool) -> Result<(), PlantError> {
        let member_ids = self
            .groups
            .get(group_id)
            .ok_or_else(|| PlantError::UnknownGroup(group_id.to_string()))?
            .panel_ids
            .clone();

        for id in &member_ids {
            if let Some(panel) = self.panels.get_mut(id) {
                panel.active = active;
            }
        }
        if let Some(group) = self.groups.get_mut(group_id) {
            group.active = active;
        }
        self.version += 1;
        debug!(group_id, active, members = member_ids.len(), "group active force-set");
        Ok(())
    }

    /// Create a new group owning exactly the given panels.
    ///
    /// Fails on an empty selection or a case-insensitive name collision; on
    /// failure no state changes. Returns the new group's id.
    pub fn create_group(
        &mut self,
        name: &str,
        color: [f32; 3],
        panel_ids: &[String],
    ) -> Result<String, PlantError> {
        if panel_ids.is_empty() {
            return Err(PlantError::EmptySelection);
        }
        let lowered = name.to_lowercase();
        if self.groups.values().any(|g| g.name.to_lowercase() == lowered) {
            return Err(PlantError::DuplicateName(name.to_string()));
        }
        for id in panel_ids {
            if !self.panels.contains_key(id) {
                return Err(PlantError::UnknownPanel(id.clone()));
            }
        }

        let group_id = loop {
            let candidate = format!("group-{}", self.next_group_seq);
            self.next_group_seq += 1;
            if !self.groups.contains_key(&candidate) {
                break candidate;
            }
        };

        self.groups.insert(group_id.clone(), Group {
            id: group_id.clone(),
            name: name.to_string(),
            color,
            active: false,
            panel_ids: Vec::new(),
        });
        self.reparent(panel_ids, &group_id);
        self.rederive_group_active(&group_id);
        self.version += 1;
        debug!(%group_id, panels = panel_ids.len(), "group created");
        Ok(group_id)
    }

    /// Re-parent the listed panels into an existing target group
    pub fn move_panels(&mut self, panel_ids: &[String], target_group_id: &str) -> Result<(), PlantError> {
        if !self.groups.contains_key(target_group_id) {
            return Err(PlantError::UnknownGroup(target_group_id.to_string()));
        }
        for id in panel_ids {
            if !self.panels.contains_key(id) {
                return Err(PlantError::UnknownPanel(id.clone()));
            }
        }

        let sources = self.reparent(panel_ids, target_group_id);
        for group_id in &sources {
            self.rederive_group_active(group_id);
        }
        self.rederive_group_active(target_group_id);
        self.version += 1;
        debug!(count = panel_ids.len(), target_group_id, "panels moved");
        Ok(())
    }

    /// Move every panel of one group into another, then discard the emptied
    /// source group. The reserved deleted group is never discarded.
    pub fn move_group(&mut self, source_group_id: &str, target_group_id: &str) -> Result<(), PlantError> {
        if !self.groups.contains_key(target_group_id) {
            return Err(PlantError::UnknownGroup(target_group_id.to_string()));
        }
        let member_ids = self
            .groups
            .get(source_group_id)
            .ok_or_else(|| PlantError::UnknownGroup(source_group_id.to_string()))?
            .panel_ids
            .clone();
        if source_group_id == target_group_id {
            return Ok(());
        }

        self.reparent(&member_ids, target_group_id);
        self.rederive_group_active(target_group_id);
        if source_group_id != DELETED_GROUP_ID {
            self.groups.remove(source_group_id);
        }
        self.version += 1;
        debug!(source_group_id, target_group_id, moved = member_ids.len(), "group merged");
        Ok(())
    }

    /// Soft-delete every layout panel lying within `corridor_width / 2` of
    /// the segment from `line_start` to `line_end` (an access corridor being
    /// carved through the field).
    ///
    /// Returns the affected panel ids, sorted, for UI feedback. Records are
    /// kept — panels just move to the reserved deleted group.
    pub fn delete_panels_in_area(
        &mut self,
        line_start: Vec2,
        line_end: Vec2,
        corridor_width: f32,
    ) -> Vec<String> {
        let half_width = corridor_width * 0.5;
        let mut affected: Vec<String> = self
            .panels
            .values()
            .filter(|p| p.group_id != DELETED_GROUP_ID)
            .filter(|p| {
                crate::layout::distance_to_segment(p.position.xy(), line_start, line_end) < half_width
            })
            .map(|p| p.id.clone())
            .collect();
        affected.sort();

        if affected.is_empty() {
            return affected;
        }

        let sources = self.reparent(&affected, DELETED_GROUP_ID);
        for group_id in &sources {
            self.rederive_group_active(group_id);
        }
        self.version += 1;
        debug!(count = affected.len(), "panels soft-deleted in corridor");
        affected
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Detach panels from their current groups and attach them to the target.
    /// Callers have validated both sides. Returns the distinct source groups.
    fn reparent(&mut self, panel_ids: &[String], target_group_id: &str) -> Vec<String> {
        let mut sources = Vec::new();
        for id in panel_ids {
            let panel = match self.panels.get_mut(id) {
                Some(p) => p,
                None => continue,
            };
            let old_group = std::mem::replace(&mut panel.group_id, target_group_id.to_string());
            if let Some(group) = self.groups.get_mut(&old_group) {
                group.panel_ids.retain(|pid| pid != id);
            }
            if !sources.contains(&old_group) {
                sources.push(old_group);
            }
        }
        if let Some(target) = self.groups.get_mut(target_group_id) {
            for id in panel_ids {
                if !target.panel_ids.contains(id) {
                    target.panel_ids.push(id.clone());
                }
            }
        }
        sources
    }

    /// Re-derive a group's active flag as the OR of its members.
    /// Empty (or vanished) groups derive to inactive; the reserved deleted
    /// group always stays inactive.
    fn rederive_group_active(&mut self, group_id: &str) {
        let derived = self
            .groups
            .get(group_id)
            .map(|g| {
                g.panel_ids
                    .iter()
                    .any(|id| self.panels.get(id).map(|p| p.active).unwrap_or(false))
            })
            .unwrap_or(false);
        if let Some(group) = self.groups.get_mut(group_id) {
            group.active = if group_id == DELETED_GROUP_ID { false } else { derived };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plant::GroupDefinition;

    fn two_group_plant() -> PlantState {
        // Two groups of three panels each, one row per group
        let def = PlantDefinition {
            boundary: vec![
                Vec2::new(-100.0, -100.0),
                Vec2::new(100.0, -100.0),
                Vec2::new(100.0, 100.0),
                Vec2::new(-100.0, 100.0),
            ],
            groups: vec![
                GroupDefinition {
                    id: "1".to_string(),
                    name: "North".to_string(),
                    color: [0.9, 0.4, 0.1],
                    panels: vec![
                        Vec3::new(0.0, 0.0, 1.0),
                        Vec3::new(14.0, 0.0, 1.0),
                        Vec3::new(28.0, 0.0, 1.0),
                    ],
                },
                GroupDefinition {
                    id: "2".to_string(),
                    name: "South".to_string(),
                    color: [0.1, 0.4, 0.9],
                    panels: vec![
                        Vec3::new(0.0, 9.0, 1.0),
                        Vec3::new(14.0, 9.0, 1.0),
                        Vec3::new(28.0, 9.0, 1.0),
                    ],
                },
            ],
            panel_length: 4.0,
            panel_width: 2.0,
            tilt_angle: 25.0,
            step_x: None,
            step_y: None,
        };
        PlantState::from_definition(&def)
    }

    fn ids(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_init_builds_groups_and_reserved_group() {
        let plant = two_group_plant();
        assert_eq!(plant.panel_count(), 6);
        assert_eq!(plant.panels_in_group("1").len(), 3);
        assert_eq!(plant.panels_in_group("2").len(), 3);
        assert!(plant.group(DELETED_GROUP_ID).is_some());
        assert!(plant.group("1").unwrap().active);
        assert_eq!(plant.panel("1-0").unwrap().group_id, "1");
    }

    #[test]
    fn test_group_active_or_derivation_end_to_end() {
        let mut plant = two_group_plant();
        plant
            .set_panels_active(&ids(&["1-0", "1-1", "1-2"]), false)
            .unwrap();
        assert!(!plant.group("1").unwrap().active);
        assert!(plant.group("2").unwrap().active);

        plant.set_panels_active(&ids(&["1-0"]), true).unwrap();
        assert!(plant.group("1").unwrap().active);
    }

    #[test]
    fn test_group_bulk_toggle_force_sets() {
        let mut plant = two_group_plant();
        plant.set_group_active("2", false).unwrap();
        assert!(!plant.group("2").unwrap().active);
        assert!(plant.panels_in_group("2").iter().all(|id| !plant.panel(id).unwrap().active));

        plant.set_group_active("2", true).unwrap();
        assert!(plant.group("2").unwrap().active);
        assert!(plant.panel("2-1").unwrap().active);
    }

    #[test]
    fn test_create_group_reparents_selection() {
        let mut plant = two_group_plant();
        let new_id = plant
            .create_group("Repowered", [1.0, 1.0, 0.0], &ids(&["1-0", "2-2"]))
            .unwrap();
        assert_eq!(plant.panel("1-0").unwrap().group_id, new_id);
        assert_eq!(plant.panels_in_group(&new_id).len(), 2);
        assert_eq!(plant.panels_in_group("1").len(), 2);
        assert_eq!(plant.panels_in_group("2").len(), 2);
        assert!(plant.group(&new_id).unwrap().active);
    }

    #[test]
    fn test_create_group_duplicate_name_leaves_state_unchanged() {
        let mut plant = two_group_plant();
        let before = plant.version();
        let result = plant.create_group("north", [0.0; 3], &ids(&["2-0"]));
        assert!(matches!(result, Err(PlantError::DuplicateName(_))));
        assert_eq!(plant.panel("2-0").unwrap().group_id, "2");
        assert_eq!(plant.version(), before);
    }

    #[test]
    fn test_create_group_empty_selection_fails() {
        let mut plant = two_group_plant();
        assert!(matches!(
            plant.create_group("Empty", [0.0; 3], &[]),
            Err(PlantError::EmptySelection)
        ));
    }

    #[test]
    fn test_move_panels_unknown_target_fails() {
        let mut plant = two_group_plant();
        assert!(matches!(
            plant.move_panels(&ids(&["1-0"]), "nope"),
            Err(PlantError::UnknownGroup(_))
        ));
        assert_eq!(plant.panel("1-0").unwrap().group_id, "1");
    }

    #[test]
    fn test_move_panels_updates_both_sides() {
        let mut plant = two_group_plant();
        plant.move_panels(&ids(&["1-0", "1-1"]), "2").unwrap();
        assert_eq!(plant.panels_in_group("2").len(), 5);
        assert_eq!(plant.panels_in_group("1").len(), 1);
        assert_eq!(plant.panel("1-1").unwrap().group_id, "2");
    }

    #[test]
    fn test_move_group_discards_emptied_source() {
        let mut plant = two_group_plant();
        plant.move_group("1", "2").unwrap();
        assert!(plant.group("1").is_none());
        assert_eq!(plant.panels_in_group("2").len(), 6);
        // Every panel still accounted for in exactly one group
        for panel in plant.panels() {
            assert!(plant.panels_in_group(&panel.group_id).contains(&panel.id));
        }
    }

    #[test]
    fn test_delete_panels_in_area_is_exact() {
        let mut plant = two_group_plant();
        // Vertical corridor at x = 14, width 6: catches exactly the middle column
        let affected = plant.delete_panels_in_area(
            Vec2::new(14.0, -50.0),
            Vec2::new(14.0, 50.0),
            6.0,
        );
        assert_eq!(affected, ids(&["1-1", "2-1"]));
        assert_eq!(plant.panel("1-1").unwrap().group_id, DELETED_GROUP_ID);
        assert_eq!(plant.panel("1-0").unwrap().group_id, "1");
        assert_eq!(plant.panel("2-2").unwrap().group_id, "2");
        // Records survive soft deletion
        assert_eq!(plant.panel_count(), 6);
    }

    #[test]
    fn test_delete_uses_segment_not_infinite_line() {
        let mut plant = two_group_plant();
        // Corridor segment ends well before the panels; the infinite line
        // through it would hit the whole first column
        let affected = plant.delete_panels_in_area(
            Vec2::new(0.0, -90.0),
            Vec2::new(0.0, -50.0),
            6.0,
        );
        assert!(affected.is_empty());
    }

    #[test]
    fn test_deleted_panels_do_not_attract_snapping() {
        let mut plant = two_group_plant();
        plant.delete_panels_in_area(Vec2::new(14.0, -50.0), Vec2::new(14.0, 50.0), 6.0);
        let others = plant.other_panel_positions("1-0");
        assert_eq!(others.len(), 3);  // 6 panels - self - 2 deleted
    }

    #[test]
    fn test_group_collision_detects_foreign_neighbor() {
        let plant = two_group_plant();
        // Panel 1-0 dropped right next to group 2's string
        let hit = plant.detect_group_collision("1-0", Vec2::new(14.0, 9.5));
        assert_eq!(hit, Some("2"));
        // Dropped near its own group: no reassignment
        let own = plant.detect_group_collision("1-0", Vec2::new(14.5, 0.0));
        assert!(own.is_none());
        // Dropped in the open: nothing within the collision radius
        let open = plant.detect_group_collision("1-0", Vec2::new(60.0, 60.0));
        assert!(open.is_none());
    }

    #[test]
    fn test_version_bumps_on_mutation() {
        let mut plant = two_group_plant();
        let v0 = plant.version();
        plant.set_panel_position("1-0", Vec3::new(1.0, 2.0, 1.0)).unwrap();
        assert!(plant.version() > v0);
    }
}
