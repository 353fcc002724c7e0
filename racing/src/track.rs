use bevy_math::Vec3;
use tracing::debug;

use crate::barriers::{BarrierSegment, generate_barrier_segments};
use crate::error::{FileError, TrackError};
use crate::math;
use crate::track_format::TrackFile;

pub const DEFAULT_SAMPLE_COUNT: usize = 200;

/// Linear subdivisions per control segment used for arc-length lookup.
const ARC_LENGTH_DIVISIONS: usize = 64;
const MIN_KNOT_INTERVAL: f32 = 1e-4;

/// One cubic piece `c0 + c1·s + c2·s² + c3·s³`, `s` in `[0, 1]`.
#[derive(Clone, Copy, Debug)]
struct CubicPiece {
    coeff: [Vec3; 4],
}

impl CubicPiece {
    /// Centripetal Catmull-Rom piece between `p1` and `p2`.
    fn centripetal(p0: Vec3, p1: Vec3, p2: Vec3, p3: Vec3) -> Self {
        let mut dt0 = p0.distance(p1).sqrt();
        let mut dt1 = p1.distance(p2).sqrt();
        let mut dt2 = p2.distance(p3).sqrt();

        if dt1 < MIN_KNOT_INTERVAL {
            dt1 = 1.0;
        }
        if dt0 < MIN_KNOT_INTERVAL {
            dt0 = dt1;
        }
        if dt2 < MIN_KNOT_INTERVAL {
            dt2 = dt1;
        }

        // Tangents on the non-uniform knot sequence, rescaled to [0, 1].
        let m1 = ((p1 - p0) / dt0 - (p2 - p0) / (dt0 + dt1) + (p2 - p1) / dt1) * dt1;
        let m2 = ((p2 - p1) / dt1 - (p3 - p1) / (dt1 + dt2) + (p3 - p2) / dt2) * dt1;

        Self {
            coeff: [
                p1,
                m1,
                -3.0 * p1 + 3.0 * p2 - 2.0 * m1 - m2,
                2.0 * p1 - 2.0 * p2 + m1 + m2,
            ],
        }
    }

    fn position(&self, s: f32) -> Vec3 {
        let [c0, c1, c2, c3] = self.coeff;
        c0 + s * (c1 + s * (c2 + s * c3))
    }
}

/// Closed centripetal Catmull-Rom curve through the track control points.
///
/// The parameter runs over `[0, n)` where `n` is the number of control
/// points; `position(i as f32)` is control point `i`.
#[derive(Clone, Debug)]
pub struct TrackSpline {
    pieces: Vec<CubicPiece>,
}

impl TrackSpline {
    pub fn domain_end(&self) -> f32 {
        self.pieces.len() as f32
    }

    pub fn position(&self, t: f32) -> Vec3 {
        let end = self.domain_end();
        let t = t.rem_euclid(end);
        let index = (t.floor() as usize).min(self.pieces.len() - 1);
        self.pieces[index].position(t - index as f32)
    }

    /// Points at `count` equal arc-length steps around the loop, starting at
    /// parameter 0. The closing point (which equals the first) is not included.
    pub fn spaced_points(&self, count: usize) -> Vec<Vec3> {
        let table = self.arc_length_table();
        let total = table[table.len() - 1];
        let steps = (table.len() - 1) as f32;

        (0..count)
            .map(|i| {
                let target = total * i as f32 / count as f32;
                let hi = table.partition_point(|&l| l <= target).min(table.len() - 1);
                let lo = hi.saturating_sub(1);
                let span = table[hi] - table[lo];
                let frac = if span > 0.0 {
                    ((target - table[lo]) / span).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                let t = (lo as f32 + frac) / steps * self.domain_end();
                self.position(t)
            })
            .collect()
    }

    fn arc_length_table(&self) -> Vec<f32> {
        let steps = self.pieces.len() * ARC_LENGTH_DIVISIONS;
        let end = self.domain_end();
        let mut table = Vec::with_capacity(steps + 1);
        let mut length = 0.0f32;
        let mut prev = self.position(0.0);
        table.push(0.0);
        for i in 1..=steps {
            let t = (i as f32 / steps as f32) * end;
            let p = self.position(t);
            length += prev.distance(p);
            table.push(length);
            prev = p;
        }
        table
    }
}

/// Build the closed centripetal spline through the control points.
pub fn build_spline(control_points: &[Vec3]) -> Result<TrackSpline, TrackError> {
    let n = control_points.len();
    if n < 4 {
        return Err(TrackError::TooFewControlPoints { got: n });
    }
    let pieces = (0..n)
        .map(|i| {
            CubicPiece::centripetal(
                control_points[(i + n - 1) % n],
                control_points[i],
                control_points[(i + 1) % n],
                control_points[(i + 2) % n],
            )
        })
        .collect();
    Ok(TrackSpline { pieces })
}

/// Compute the arc-length of a closed spline by sampling.
pub fn spline_length(spline: &TrackSpline, samples: usize) -> f32 {
    let t_max = spline.domain_end();
    let mut length = 0.0f32;
    let mut prev = spline.position(0.0);
    for i in 1..=samples {
        let t = (i as f32 / samples as f32) * t_max;
        let p = spline.position(t);
        length += prev.distance(p);
        prev = p;
    }
    length
}

/// Sample the closed track centre line at `sample_count` evenly spaced points.
pub fn generate_centerline(
    control_points: &[Vec3],
    sample_count: usize,
) -> Result<Vec<Vec3>, TrackError> {
    if sample_count == 0 {
        return Err(TrackError::ZeroSamples);
    }
    let spline = build_spline(control_points)?;
    let points = spline.spaced_points(sample_count);
    debug!(
        control_points = control_points.len(),
        samples = points.len(),
        "generated centerline"
    );
    Ok(points)
}

/// Road edges, index-aligned with the centerline they were derived from.
#[derive(Clone, Debug, PartialEq)]
pub struct SideOffsets {
    pub left: Vec<Vec3>,
    pub right: Vec<Vec3>,
}

pub fn generate_offsets(centerline: &[Vec3], width: f32) -> Result<SideOffsets, TrackError> {
    if !(width > 0.0 && width.is_finite()) {
        return Err(TrackError::NonPositiveWidth(width));
    }
    let n = centerline.len();
    if n < 3 {
        return Err(TrackError::TooFewSamples { needed: 3, got: n });
    }
    let half_width = width * 0.5;
    let mut left = Vec::with_capacity(n);
    let mut right = Vec::with_capacity(n);

    for i in 0..n {
        let prev = centerline[(i + n - 1) % n];
        let next = centerline[(i + 1) % n];
        let tangent = (next - prev).normalize_or_zero();
        let normal = math::ground_normal(tangent);

        left.push(centerline[i] + normal * half_width);
        right.push(centerline[i] - normal * half_width);
    }

    Ok(SideOffsets { left, right })
}

/// Spawn placement at the start of the lap.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrackStart {
    pub position: Vec3,
    pub yaw: f32,
}

/// Start position is the first centerline sample, heading towards the
/// furthest of the next three samples.
pub fn track_start(centerline: &[Vec3]) -> Result<TrackStart, TrackError> {
    if centerline.len() < 2 {
        return Err(TrackError::TooFewSamples {
            needed: 2,
            got: centerline.len(),
        });
    }
    let position = centerline[0];
    let ahead = centerline[centerline.len().min(4) - 1];
    Ok(TrackStart {
        position,
        yaw: math::yaw_of(ahead - position),
    })
}

/// Triangle-list road surface between the two edges.
#[derive(Clone, Debug, Default)]
pub struct RoadMesh {
    pub positions: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
}

pub fn road_mesh(offsets: &SideOffsets) -> RoadMesh {
    let segments = offsets.left.len().min(offsets.right.len());
    let mut positions = Vec::with_capacity(segments * 2);
    let mut indices = Vec::with_capacity(segments * 6);

    for i in 0..segments {
        let inner = offsets.right[i];
        let outer = offsets.left[i];
        positions.push(inner.to_array());
        positions.push(outer.to_array());
    }

    // Two triangles per segment, the last one closing back to sample 0
    for i in 0..segments {
        let base = (i * 2) as u32;
        let next_base = ((i + 1) % segments * 2) as u32;

        indices.push(base);
        indices.push(next_base);
        indices.push(base + 1);

        indices.push(base + 1);
        indices.push(next_base);
        indices.push(next_base + 1);
    }

    RoadMesh { positions, indices }
}

/// All derived geometry of one track.
#[derive(Clone, Debug)]
pub struct TrackGeometry {
    pub name: String,
    pub track_width: f32,
    pub centerline: Vec<Vec3>,
    pub offsets: SideOffsets,
    pub left_barriers: Vec<BarrierSegment>,
    pub right_barriers: Vec<BarrierSegment>,
    pub start: TrackStart,
    pub mesh: RoadMesh,
}

impl TrackGeometry {
    pub fn build(track_file: &TrackFile) -> Result<Self, FileError> {
        let meta = &track_file.metadata;
        let geometry = |source| FileError::Geometry {
            name: meta.name.clone(),
            source,
        };

        let centerline = generate_centerline(&track_file.control_points_vec3(), meta.sample_count)
            .map_err(geometry)?;
        let offsets = generate_offsets(&centerline, meta.track_width).map_err(geometry)?;
        let left_barriers =
            generate_barrier_segments(&offsets.left, meta.barrier_spacing).map_err(geometry)?;
        let right_barriers =
            generate_barrier_segments(&offsets.right, meta.barrier_spacing).map_err(geometry)?;
        let start = track_start(&centerline).map_err(geometry)?;
        let mesh = road_mesh(&offsets);

        debug!(
            track = %meta.name,
            left_barriers = left_barriers.len(),
            right_barriers = right_barriers.len(),
            triangles = mesh.indices.len() / 3,
            "built track geometry"
        );

        Ok(Self {
            name: meta.name.clone(),
            track_width: meta.track_width,
            centerline,
            offsets,
            left_barriers,
            right_barriers,
            start,
            mesh,
        })
    }

    pub fn to_record(&self) -> race_records::TrackGeometryRecord {
        let flatten =
            |points: &[Vec3]| -> Vec<[f32; 3]> { points.iter().map(|p| p.to_array()).collect() };
        let barriers = |segments: &[BarrierSegment]| -> Vec<race_records::BarrierRecord> {
            segments.iter().map(BarrierSegment::to_record).collect()
        };
        race_records::TrackGeometryRecord {
            version: race_records::RECORD_VERSION,
            name: self.name.clone(),
            track_width: self.track_width,
            centerline: flatten(&self.centerline),
            left: flatten(&self.offsets.left),
            right: flatten(&self.offsets.right),
            left_barriers: barriers(&self.left_barriers),
            right_barriers: barriers(&self.right_barriers),
            start: race_records::StartRecord {
                position: self.start.position.to_array(),
                yaw: self.start.yaw,
            },
            road_indices: self.mesh.indices.clone(),
        }
    }
}
