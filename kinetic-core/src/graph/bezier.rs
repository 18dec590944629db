//! Cubic Easing Curves
//!
//! Bezier nodes map a normalized-time child through a cubic bezier easing
//! curve with fixed endpoints (0,0) and (1,1), the same curve family as
//! CSS `cubic-bezier()`. Solving x(t) = input for t uses Newton-Raphson
//! with a bisection fallback for flat regions of the curve.

use serde::{Deserialize, Serialize};

const NEWTON_ITERATIONS: usize = 8;
const NEWTON_EPSILON: f64 = 1e-7;
const SUBDIVISION_EPSILON: f64 = 1e-9;
const SUBDIVISION_MAX_ITERATIONS: usize = 64;

/// A cubic bezier easing curve defined by its two control points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CubicBezier {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

fn coefficient_a(p1: f64, p2: f64) -> f64 {
    1.0 - 3.0 * p2 + 3.0 * p1
}

fn coefficient_b(p1: f64, p2: f64) -> f64 {
    3.0 * p2 - 6.0 * p1
}

fn coefficient_c(p1: f64) -> f64 {
    3.0 * p1
}

/// Polynomial form of one bezier axis at parameter `t`.
fn sample(t: f64, p1: f64, p2: f64) -> f64 {
    ((coefficient_a(p1, p2) * t + coefficient_b(p1, p2)) * t + coefficient_c(p1)) * t
}

fn sample_derivative(t: f64, p1: f64, p2: f64) -> f64 {
    3.0 * coefficient_a(p1, p2) * t * t + 2.0 * coefficient_b(p1, p2) * t + coefficient_c(p1)
}

impl CubicBezier {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Evaluate the curve at normalized time `x` in [0, 1].
    ///
    /// Inputs outside the unit interval extrapolate through the solver the
    /// same way browser easing does; exact endpoints return exactly 0 or 1.
    pub fn solve(&self, x: f64) -> f64 {
        if x == 0.0 {
            return 0.0;
        }
        if x == 1.0 {
            return 1.0;
        }
        sample(self.solve_curve_x(x), self.y1, self.y2)
    }

    /// Find t such that sample_x(t) = x.
    fn solve_curve_x(&self, x: f64) -> f64 {
        // Newton-Raphson from the midpoint-ish initial guess.
        let mut t = x;
        for _ in 0..NEWTON_ITERATIONS {
            let error = sample(t, self.x1, self.x2) - x;
            if error.abs() < NEWTON_EPSILON {
                return t;
            }
            let slope = sample_derivative(t, self.x1, self.x2);
            if slope.abs() < 1e-6 {
                break;
            }
            t -= error / slope;
        }

        // Fall back to bisection when the slope is too flat for Newton.
        let mut lo = 0.0;
        let mut hi = 1.0;
        t = x.clamp(lo, hi);
        for _ in 0..SUBDIVISION_MAX_ITERATIONS {
            let error = sample(t, self.x1, self.x2) - x;
            if error.abs() < SUBDIVISION_EPSILON {
                break;
            }
            if error > 0.0 {
                hi = t;
            } else {
                lo = t;
            }
            t = (lo + hi) / 2.0;
        }
        t
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_are_exact() {
        let curve = CubicBezier::new(0.42, 0.0, 0.58, 1.0);
        assert_eq!(curve.solve(0.0), 0.0);
        assert_eq!(curve.solve(1.0), 1.0);
    }

    #[test]
    fn linear_curve_is_identity() {
        let curve = CubicBezier::new(0.25, 0.25, 0.75, 0.75);
        for i in 0..=10 {
            let x = i as f64 / 10.0;
            assert!((curve.solve(x) - x).abs() < 1e-5, "x = {x}");
        }
    }

    #[test]
    fn ease_in_out_is_symmetric_and_monotonic() {
        let curve = CubicBezier::new(0.42, 0.0, 0.58, 1.0);
        assert!((curve.solve(0.5) - 0.5).abs() < 1e-5);

        let mut previous = 0.0;
        for i in 1..=20 {
            let y = curve.solve(i as f64 / 20.0);
            assert!(y >= previous, "non-monotonic at step {i}");
            previous = y;
        }
    }

    #[test]
    fn ease_in_starts_slow() {
        let curve = CubicBezier::new(0.42, 0.0, 1.0, 1.0);
        assert!(curve.solve(0.25) < 0.25);
    }
}
