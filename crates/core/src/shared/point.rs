use serde::{Deserialize, Serialize};

/// Double-precision 2D display position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_squared(&self, other: &Point2) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    pub fn distance(&self, other: &Point2) -> f64 {
        self.distance_squared(other).sqrt()
    }

    /// Angle of the vector `self → to`, in `(-π, π]`.
    pub fn polar_angle(&self, to: &Point2) -> f64 {
        (to.y - self.y).atan2(to.x - self.x)
    }

    /// Z component of `(b - a) × (c - a)`. Positive for a counter-clockwise turn.
    pub fn cross(a: &Point2, b: &Point2, c: &Point2) -> f64 {
        (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
    }
}

impl From<(f64, f64)> for Point2 {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;
    use std::f64::consts::PI;

    #[test]
    fn test_distance_pythagorean() {
        let a = Point2::new(0.0, 0.0);
        let b = Point2::new(3.0, 4.0);
        assert_relative_eq!(a.distance(&b), 5.0);
        assert_relative_eq!(a.distance_squared(&b), 25.0);
    }

    #[test]
    fn test_distance_symmetric() {
        let a = Point2::new(1.5, -2.0);
        let b = Point2::new(-0.5, 7.25);
        assert_eq!(a.distance(&b), b.distance(&a));
    }

    #[rstest]
    #[case::east((1.0, 0.0), 0.0)]
    #[case::north((0.0, 1.0), PI / 2.0)]
    #[case::west((-1.0, 0.0), PI)]
    #[case::south((0.0, -1.0), -PI / 2.0)]
    fn test_polar_angle(#[case] to: (f64, f64), #[case] expected: f64) {
        let origin = Point2::default();
        assert_relative_eq!(origin.polar_angle(&to.into()), expected);
    }

    #[rstest]
    #[case::left_turn((1.0, 0.0), (1.0, 1.0), 1.0)]
    #[case::right_turn((1.0, 0.0), (1.0, -1.0), -1.0)]
    #[case::collinear((1.0, 0.0), (2.0, 0.0), 0.0)]
    fn test_cross(#[case] b: (f64, f64), #[case] c: (f64, f64), #[case] expected: f64) {
        let cross = Point2::cross(&Point2::default(), &b.into(), &c.into());
        assert_relative_eq!(cross, expected);
    }
}
