//! Row detection and row/gap snapping
//!
//! Rows are the primary structural unit of a plant: strings of panels sharing
//! a Y coordinate along an access path. When the pointer is near a row's
//! Y-line, placements inside that row (gap infills and row-end extensions)
//! take priority over generic lattice alignment.

use crate::math::Vec2;
use super::SnapConfig;

/// Row bucketing tolerance as a fraction of panel width
pub const ROW_BUCKET_FACTOR: f32 = 0.3;

/// Gaps wider than this multiple of the row spacing accept an infill
const GAP_FACTOR: f32 = 1.5;

/// A detected row of panels (derived, never persisted)
#[derive(Debug, Clone)]
pub struct Row {
    /// Representative Y: the Y of the first panel bucketed into this row.
    /// Not recentered as members join, so detection is order-dependent —
    /// acceptable because the tolerance is generous relative to real spread.
    pub y: f32,
    pub min_x: f32,
    pub max_x: f32,
    /// Nominal member spacing. Always the plant-wide `step_x`, not measured
    /// from actual gaps.
    pub spacing: f32,
    /// Member X coordinates, in bucketing order
    pub xs: Vec<f32>,
}

/// Bucket panel positions into rows by Y proximity.
///
/// `row_tolerance` is typically `panel_width * ROW_BUCKET_FACTOR`. A single
/// pass: each position joins the first row whose representative Y is within
/// tolerance, else starts a new row.
pub fn detect_rows(positions: &[Vec2], row_tolerance: f32, spacing: f32) -> Vec<Row> {
    let mut rows: Vec<Row> = Vec::new();
    for pos in positions {
        match rows.iter_mut().find(|r| (pos.y - r.y).abs() < row_tolerance) {
            Some(row) => {
                row.min_x = row.min_x.min(pos.x);
                row.max_x = row.max_x.max(pos.x);
                row.xs.push(pos.x);
            }
            None => rows.push(Row {
                y: pos.y,
                min_x: pos.x,
                max_x: pos.x,
                spacing,
                xs: vec![pos.x],
            }),
        }
    }
    rows
}

/// Result of a row snap attempt
#[derive(Debug, Clone, Copy)]
pub struct RowSnap {
    /// Corrected position (the input point when `snapped` is false)
    pub position: Vec2,
    pub snapped: bool,
    /// True when the pointer sits within the force threshold of the row's
    /// Y-line: the placement commits to this row and grid snap is skipped.
    pub forced: bool,
}

impl RowSnap {
    fn miss(point: Vec2) -> Self {
        Self { position: point, snapped: false, forced: false }
    }
}

/// Snap a candidate point into the nearest detected row.
///
/// Candidates are midpoints of gaps wider than `GAP_FACTOR * spacing` plus
/// one extension past each row end. The candidate nearest the pointer's X
/// wins if it falls inside the row snap tolerance; the result lands exactly
/// on the row's Y-line.
pub fn apply_row_snapping(point: Vec2, rows: &[Row], config: &SnapConfig) -> RowSnap {
    // Nearest row by Y, within tolerance
    let row = rows
        .iter()
        .map(|r| ((point.y - r.y).abs(), r))
        .filter(|(dy, _)| *dy < config.row_snap_tolerance)
        .min_by(|a, b| a.0.total_cmp(&b.0));
    let (y_dist, row) = match row {
        Some(r) => r,
        None => return RowSnap::miss(point),
    };

    let mut xs = row.xs.clone();
    xs.sort_by(|a, b| a.total_cmp(b));

    let mut candidates: Vec<f32> = Vec::new();
    for pair in xs.windows(2) {
        let gap = pair[1] - pair[0];
        if gap > GAP_FACTOR * row.spacing {
            candidates.push(pair[0] + gap * 0.5);
        }
    }
    if let (Some(first), Some(last)) = (xs.first(), xs.last()) {
        candidates.push(first - row.spacing);
        candidates.push(last + row.spacing);
    }

    let best = candidates
        .into_iter()
        .map(|x| ((point.x - x).abs(), x))
        .filter(|(dx, _)| *dx < config.row_snap_tolerance)
        .min_by(|a, b| a.0.total_cmp(&b.0));

    match best {
        Some((_, x)) => RowSnap {
            position: Vec2::new(x, row.y),
            snapped: true,
            forced: y_dist < config.force_threshold,
        },
        None => RowSnap::miss(point),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SnapConfig {
        SnapConfig {
            step_x: 20.0,
            row_snap_tolerance: 15.0,
            force_threshold: 8.0,
            ..Default::default()
        }
    }

    fn row_of(xs: &[f32], y: f32, spacing: f32) -> Vec<Row> {
        let positions: Vec<Vec2> = xs.iter().map(|x| Vec2::new(*x, y)).collect();
        detect_rows(&positions, 3.0, spacing)
    }

    #[test]
    fn test_detect_rows_buckets_by_y() {
        let positions = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(14.0, 0.5),
            Vec2::new(28.0, -0.4),
            Vec2::new(0.0, 9.0),
            Vec2::new(14.0, 9.2),
        ];
        let rows = detect_rows(&positions, 2.0, 14.0);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].xs.len(), 3);
        assert!((rows[0].y - 0.0).abs() < 0.001);  // First panel defines the row Y
        assert!((rows[0].min_x - 0.0).abs() < 0.001);
        assert!((rows[0].max_x - 28.0).abs() < 0.001);
        assert_eq!(rows[1].xs.len(), 2);
    }

    #[test]
    fn test_detect_rows_empty_input() {
        assert!(detect_rows(&[], 2.0, 14.0).is_empty());
    }

    #[test]
    fn test_gap_midpoint_snap() {
        // Gap from 20 to 60 spans 40 > 1.5 * 20, midpoint 40
        let rows = row_of(&[0.0, 20.0, 60.0], 0.0, 20.0);
        assert_eq!(rows.len(), 1);
        let result = apply_row_snapping(Vec2::new(40.0, 1.0), &rows, &config());
        assert!(result.snapped);
        assert!((result.position.x - 40.0).abs() < 0.001);
        assert!(result.position.y.abs() < 0.001);
        assert!(result.forced);  // 1.0 < force threshold
    }

    #[test]
    fn test_regular_gaps_offer_no_infill() {
        // Spacing-sized gaps are full; only the row-end extensions remain
        let rows = row_of(&[0.0, 20.0, 40.0], 0.0, 20.0);
        let result = apply_row_snapping(Vec2::new(30.0, 1.0), &rows, &config());
        assert!(!result.snapped);
    }

    #[test]
    fn test_row_end_extension_snap() {
        let rows = row_of(&[0.0, 20.0], 0.0, 20.0);
        let result = apply_row_snapping(Vec2::new(42.0, 2.0), &rows, &config());
        assert!(result.snapped);
        assert!((result.position.x - 40.0).abs() < 0.001);

        let before = apply_row_snapping(Vec2::new(-18.0, 2.0), &rows, &config());
        assert!(before.snapped);
        assert!((before.position.x - -20.0).abs() < 0.001);
    }

    #[test]
    fn test_forced_only_inside_threshold() {
        let rows = row_of(&[0.0, 20.0], 0.0, 20.0);
        // Y distance 10: inside the row tolerance (15) but past the force
        // threshold (8) — snaps, not forced
        let result = apply_row_snapping(Vec2::new(41.0, 10.0), &rows, &config());
        assert!(result.snapped);
        assert!(!result.forced);
    }

    #[test]
    fn test_far_from_any_row_is_a_miss() {
        let rows = row_of(&[0.0, 20.0], 0.0, 20.0);
        let result = apply_row_snapping(Vec2::new(10.0, 40.0), &rows, &config());
        assert!(!result.snapped);
        assert!(!result.forced);
    }

    #[test]
    fn test_nearest_row_wins() {
        let mut rows = row_of(&[0.0, 20.0, 60.0], 0.0, 20.0);
        rows.extend(row_of(&[0.0, 20.0, 60.0], 9.0, 20.0));
        let result = apply_row_snapping(Vec2::new(40.0, 7.0), &rows, &config());
        assert!(result.snapped);
        assert!((result.position.y - 9.0).abs() < 0.001);
    }
}
