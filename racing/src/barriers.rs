//! Barrier panels placed along a road edge at fixed arc-length spacing.
//!
//! Panel density is independent of how densely the edge polyline was sampled,
//! so colliders can be coarser (or finer) than the visual road.

use bevy_math::Vec3;
use tracing::warn;

use crate::error::TrackError;
use crate::math;

/// Panels shorter than this are dropped.
pub const MIN_SEGMENT_LENGTH: f32 = 0.01;
/// Upper bound on panels per side.
pub const MAX_SEGMENTS: usize = 1 << 20;
const MIN_EDGE_LENGTH: f32 = 1e-6;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BarrierSegment {
    pub midpoint: Vec3,
    pub heading_yaw: f32,
    pub length: f32,
}

impl BarrierSegment {
    fn between(a: Vec3, b: Vec3) -> Self {
        Self {
            midpoint: (a + b) * 0.5,
            heading_yaw: math::yaw_of(b - a),
            length: a.distance(b),
        }
    }

    pub fn to_record(&self) -> race_records::BarrierRecord {
        race_records::BarrierRecord {
            midpoint: self.midpoint.to_array(),
            heading_yaw: self.heading_yaw,
            length: self.length,
        }
    }
}

/// Cumulative arc length over a closed polyline.
struct ArcTable<'a> {
    points: &'a [Vec3],
    /// `cumulative[k]` is the distance from vertex 0 to vertex `k`;
    /// the last entry is the full loop, back at vertex 0.
    cumulative: Vec<f32>,
}

impl<'a> ArcTable<'a> {
    fn new(points: &'a [Vec3]) -> Self {
        let n = points.len();
        let mut cumulative = Vec::with_capacity(n + 1);
        let mut length = 0.0f32;
        cumulative.push(0.0);
        for i in 0..n {
            length += points[i].distance(points[(i + 1) % n]);
            cumulative.push(length);
        }
        Self { points, cumulative }
    }

    fn total(&self) -> f32 {
        self.cumulative[self.cumulative.len() - 1]
    }

    /// Point at distance `s` along the loop, `s` in `[0, total]`.
    fn point_at(&self, s: f32) -> Vec3 {
        let n = self.points.len();
        let edges = self.cumulative.len() - 1;
        let edge = self
            .cumulative
            .partition_point(|&l| l <= s)
            .saturating_sub(1)
            .min(edges - 1);

        let start = self.points[edge];
        let end = self.points[(edge + 1) % n];
        let edge_length = self.cumulative[edge + 1] - self.cumulative[edge];
        if edge_length < MIN_EDGE_LENGTH {
            return start;
        }
        let frac = ((s - self.cumulative[edge]) / edge_length).clamp(0.0, 1.0);
        start.lerp(end, frac)
    }
}

/// Walk the closed `polyline` in steps of `spacing` and emit one panel per
/// step. The final panel closes the loop and may be shorter.
pub fn generate_barrier_segments(
    polyline: &[Vec3],
    spacing: f32,
) -> Result<Vec<BarrierSegment>, TrackError> {
    if !(spacing > 0.0 && spacing.is_finite()) {
        return Err(TrackError::NonPositiveSpacing(spacing));
    }
    if polyline.len() < 2 {
        return Ok(Vec::new());
    }

    let table = ArcTable::new(polyline);
    let total = table.total();
    let steps = (total / spacing).ceil();
    if !(steps.is_finite() && steps <= MAX_SEGMENTS as f32) {
        return Err(TrackError::SpacingTooSmall {
            spacing,
            length: total,
        });
    }
    let mut segments = Vec::with_capacity(steps as usize);
    let mut dropped = 0usize;

    let mut step = 0usize;
    let mut cursor = 0.0f32;
    while cursor < total {
        let next = ((step + 1) as f32 * spacing).min(total);
        let segment = BarrierSegment::between(table.point_at(cursor), table.point_at(next));
        if segment.length >= MIN_SEGMENT_LENGTH {
            segments.push(segment);
        } else {
            dropped += 1;
        }
        step += 1;
        cursor = next;
    }

    if dropped > 0 {
        warn!(dropped, "skipped degenerate barrier segments");
    }
    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::TAU;

    fn square(side: f32) -> Vec<Vec3> {
        vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(side, 0.0, 0.0),
            Vec3::new(side, 0.0, side),
            Vec3::new(0.0, 0.0, side),
        ]
    }

    fn circle(radius: f32, vertices: usize) -> Vec<Vec3> {
        (0..vertices)
            .map(|i| {
                let a = TAU * i as f32 / vertices as f32;
                Vec3::new(radius * a.cos(), 0.0, radius * a.sin())
            })
            .collect()
    }

    #[test]
    fn rejects_non_positive_spacing() {
        assert_eq!(
            generate_barrier_segments(&square(10.0), 0.0).unwrap_err(),
            TrackError::NonPositiveSpacing(0.0)
        );
        assert!(generate_barrier_segments(&square(10.0), -1.0).is_err());
        assert!(generate_barrier_segments(&square(10.0), f32::NAN).is_err());
    }

    #[test]
    fn rejects_spacing_too_small_for_the_loop() {
        assert_eq!(
            generate_barrier_segments(&square(100.0), 1e-38).unwrap_err(),
            TrackError::SpacingTooSmall {
                spacing: 1e-38,
                length: 400.0,
            }
        );
        assert!(matches!(
            generate_barrier_segments(&square(250.0), 1e-6),
            Err(TrackError::SpacingTooSmall { .. })
        ));
        // A million panels is still under the cap
        let segments = generate_barrier_segments(&square(10_000.0), 0.04).unwrap();
        assert!(segments.len() > 900_000 && segments.len() <= MAX_SEGMENTS);
    }

    #[test]
    fn count_and_total_length_follow_arc_length() {
        // Perimeter 160, corners land on multiples of the spacing
        let segments = generate_barrier_segments(&square(40.0), 10.0).unwrap();
        assert_eq!(segments.len(), 16);
        let sum: f32 = segments.iter().map(|s| s.length).sum();
        assert!((sum - 160.0).abs() < 1e-3);
    }

    #[test]
    fn last_segment_is_clipped_to_close_the_loop() {
        // Perimeter 160 with spacing 15 leaves a 10-unit closing panel
        let segments = generate_barrier_segments(&square(40.0), 15.0).unwrap();
        assert_eq!(segments.len(), (160.0f32 / 15.0).ceil() as usize);
        let last = segments.last().unwrap();
        assert!((last.length - 10.0).abs() < 1e-3);
        assert!(last.midpoint.distance(Vec3::new(0.0, 0.0, 5.0)) < 1e-3);
    }

    #[test]
    fn count_is_independent_of_vertex_density() {
        let coarse = generate_barrier_segments(&circle(50.0, 64), 5.0).unwrap();
        let fine = generate_barrier_segments(&circle(50.0, 512), 5.0).unwrap();

        let length = |points: &[Vec3]| ArcTable::new(points).total();
        assert_eq!(coarse.len(), (length(&circle(50.0, 64)) / 5.0).ceil() as usize);
        assert_eq!(fine.len(), (length(&circle(50.0, 512)) / 5.0).ceil() as usize);

        // Chords cut tiny corners off the arc
        let total = length(&circle(50.0, 512));
        let sum: f32 = fine.iter().map(|s| s.length).sum();
        assert!(sum <= total + 1e-3);
        assert!(total - sum < total * 1e-3);
    }

    #[test]
    fn segments_follow_the_edge_heading() {
        let segments = generate_barrier_segments(&square(40.0), 10.0).unwrap();
        let first = segments[0];
        assert!(first.midpoint.distance(Vec3::new(5.0, 0.0, 0.0)) < 1e-4);
        // Travelling along +X
        assert!((first.heading_yaw - std::f32::consts::FRAC_PI_2).abs() < 1e-5);
        // Fifth panel travels along +Z
        assert!(segments[4].heading_yaw.abs() < 1e-5);
    }

    #[test]
    fn duplicate_vertices_do_not_produce_nan() {
        let mut points = square(40.0);
        points.insert(1, points[0]);
        points.insert(3, points[2]);
        let segments = generate_barrier_segments(&points, 7.0).unwrap();
        assert!(segments.iter().all(|s| s.midpoint.is_finite() && s.heading_yaw.is_finite()));
        let sum: f32 = segments.iter().map(|s| s.length).sum();
        assert!(sum > 150.0 && sum <= 160.0 + 1e-3);
    }

    #[test]
    fn collapsed_polyline_yields_no_segments() {
        let points = vec![Vec3::ONE; 5];
        assert!(generate_barrier_segments(&points, 1.0).unwrap().is_empty());
        assert!(generate_barrier_segments(&[Vec3::ZERO], 1.0).unwrap().is_empty());
    }

    #[test]
    fn repeated_calls_are_identical() {
        let a = generate_barrier_segments(&circle(30.0, 100), 3.0).unwrap();
        let b = generate_barrier_segments(&circle(30.0, 100), 3.0).unwrap();
        assert_eq!(a, b);
    }
}
