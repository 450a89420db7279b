//! Planar convex hull via Graham scan.
//!
//! Works on indices so callers can map hull vertices back to whatever the
//! points belong to (faces in a cluster, usually).

use std::cmp::Ordering;

use crate::shared::point::Point2;

/// Index of the lowest point, ties broken by smallest x.
fn lowest_point(points: &[Point2]) -> Option<usize> {
    (0..points.len()).min_by(|&a, &b| {
        let (pa, pb) = (&points[a], &points[b]);
        pa.y.total_cmp(&pb.y).then_with(|| pa.x.total_cmp(&pb.x))
    })
}

/// Returns the hull as indices into `points`, counter-clockwise, starting
/// at the lowest point.
///
/// Collinear points along hull edges are dropped. Fewer than three input
/// points are returned as-is (in scan order).
pub fn graham_scan(points: &[Point2]) -> Vec<usize> {
    let Some(start) = lowest_point(points) else {
        return Vec::new();
    };
    let origin = points[start];

    let mut rest: Vec<usize> = (0..points.len()).filter(|&i| i != start).collect();
    rest.sort_by(|&a, &b| compare_by_angle(&origin, &points[a], &points[b]));

    let mut hull: Vec<usize> = Vec::with_capacity(points.len());
    hull.push(start);
    for idx in rest {
        let candidate = &points[idx];
        while hull.len() >= 2 {
            let top = hull[hull.len() - 1];
            let below = hull[hull.len() - 2];
            if Point2::cross(&points[below], &points[top], candidate) > 0.0 {
                break;
            }
            hull.pop();
        }
        hull.push(idx);
    }
    hull
}

/// Polar angle around `origin`; equal angles put the closer point first.
fn compare_by_angle(origin: &Point2, a: &Point2, b: &Point2) -> Ordering {
    let angle_a = origin.polar_angle(a);
    let angle_b = origin.polar_angle(b);
    if angle_a == angle_b {
        origin
            .distance_squared(a)
            .total_cmp(&origin.distance_squared(b))
    } else {
        angle_a.total_cmp(&angle_b)
    }
}

/// True when `p` lies inside or on the boundary of a counter-clockwise hull.
pub fn hull_contains(points: &[Point2], hull: &[usize], p: &Point2, tolerance: f64) -> bool {
    match hull.len() {
        0 => false,
        1 => points[hull[0]].distance(p) <= tolerance,
        2 => {
            let (a, b) = (&points[hull[0]], &points[hull[1]]);
            let len = a.distance(b);
            Point2::cross(a, b, p).abs() <= tolerance * len.max(1.0)
                && a.distance(p) + p.distance(b) <= len + tolerance
        }
        n => (0..n).all(|k| {
            let a = &points[hull[k]];
            let b = &points[hull[(k + 1) % n]];
            Point2::cross(a, b, p) >= -tolerance
        }),
    }
}
