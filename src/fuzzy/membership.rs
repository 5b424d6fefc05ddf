//! Membership degrees and piecewise-linear membership functions

use serde::Serialize;

use crate::dpi_ensure;
use crate::error::{DpiResult, ErrorCode};

/// A fuzzy truth value in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct FuzzyValue(f64);

impl FuzzyValue {
    pub const ZERO: FuzzyValue = FuzzyValue(0.0);
    pub const ONE: FuzzyValue = FuzzyValue(1.0);

    /// Clamp into [0, 1]. NaN maps to zero.
    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            return Self::ZERO;
        }
        Self(value.clamp(0.0, 1.0))
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 <= 0.0
    }

    /// Fuzzy NOT (complement)
    pub fn not(&self) -> Self {
        Self::new(1.0 - self.0)
    }

    /// Fuzzy AND (t-norm) - minimum
    pub fn and(&self, other: &Self) -> Self {
        Self::new(self.0.min(other.0))
    }

    /// Fuzzy OR (t-conorm) - maximum
    pub fn or(&self, other: &Self) -> Self {
        Self::new(self.0.max(other.0))
    }

    /// Algebraic product t-norm
    pub fn product(&self, other: &Self) -> Self {
        Self::new(self.0 * other.0)
    }
}

impl Default for FuzzyValue {
    fn default() -> Self {
        Self::ZERO
    }
}

impl From<f64> for FuzzyValue {
    fn from(v: f64) -> Self {
        Self::new(v)
    }
}

/// One vertex of a membership shape
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl From<[f64; 2]> for Point {
    fn from([x, y]: [f64; 2]) -> Self {
        Self { x, y }
    }
}

impl From<Point> for [f64; 2] {
    fn from(p: Point) -> Self {
        [p.x, p.y]
    }
}

/// Piecewise-linear membership function.
///
/// Points are strictly increasing in x with degrees in [0, 1], so the shape is
/// continuous by construction. Outside the first and last breakpoints the
/// function extends flat, which is what open-ended "low"/"high" terms need.
#[derive(Debug, Clone, PartialEq)]
pub struct MembershipFunction {
    points: Vec<Point>,
}

impl MembershipFunction {
    /// Build a membership function, rejecting malformed shapes.
    pub fn new(points: Vec<Point>) -> DpiResult<Self> {
        dpi_ensure!(
            points.len() >= 2,
            ErrorCode::InvalidFuzzySet,
            "a membership shape needs at least 2 points (got {})",
            points.len()
        );

        for (i, p) in points.iter().enumerate() {
            dpi_ensure!(
                p.x.is_finite() && p.y.is_finite(),
                ErrorCode::InvalidFuzzySet,
                "point {} is not finite",
                i
            );
            dpi_ensure!(
                (0.0..=1.0).contains(&p.y),
                ErrorCode::InvalidFuzzySet,
                "point {} has degree {} outside [0, 1]",
                i,
                p.y
            );
        }

        for (i, pair) in points.windows(2).enumerate() {
            // A repeated x would be a vertical jump.
            dpi_ensure!(
                pair[1].x > pair[0].x,
                ErrorCode::InvalidFuzzySet,
                "x must be strictly increasing (point {} at x={} follows x={})",
                i + 1,
                pair[1].x,
                pair[0].x
            );
        }

        Ok(Self { points })
    }

    /// Convenience constructor from `[x, y]` pairs
    pub fn from_pairs(pairs: &[[f64; 2]]) -> DpiResult<Self> {
        Self::new(pairs.iter().copied().map(Point::from).collect())
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Evaluate membership for a crisp value
    pub fn evaluate(&self, x: f64) -> FuzzyValue {
        if x.is_nan() {
            return FuzzyValue::ZERO;
        }

        let first = self.points[0];
        let last = self.points[self.points.len() - 1];

        if x <= first.x {
            return FuzzyValue::new(first.y);
        }
        if x >= last.x {
            return FuzzyValue::new(last.y);
        }

        // first.x < x < last.x, so 1 <= idx < len
        let idx = self.points.partition_point(|p| p.x <= x);
        let (a, b) = (self.points[idx - 1], self.points[idx]);
        let t = (x - a.x) / (b.x - a.x);
        FuzzyValue::new(a.y + (b.y - a.y) * t)
    }
}

/// A named term of a linguistic variable
#[derive(Debug, Clone, PartialEq)]
pub struct FuzzySet {
    term: String,
    function: MembershipFunction,
}

impl FuzzySet {
    pub fn new(term: impl Into<String>, function: MembershipFunction) -> Self {
        Self {
            term: term.into(),
            function,
        }
    }

    /// Build from raw `[x, y]` pairs, tagging any shape error with the term name
    pub fn from_pairs(term: impl Into<String>, pairs: &[[f64; 2]]) -> DpiResult<Self> {
        let term = term.into();
        let function = MembershipFunction::from_pairs(pairs)
            .map_err(|e| e.with_context("term", term.as_str()))?;
        Ok(Self::new(term, function))
    }

    pub fn term(&self) -> &str {
        &self.term
    }

    pub fn function(&self) -> &MembershipFunction {
        &self.function
    }

    pub fn points(&self) -> &[Point] {
        self.function.points()
    }

    /// Get membership degree for a value
    pub fn membership(&self, x: f64) -> FuzzyValue {
        self.function.evaluate(x)
    }
}
