//! Linguistic variables and their universes of discourse

use std::collections::HashSet;

use indexmap::IndexMap;

use crate::dpi_ensure;
use crate::error::{DpiError, DpiResult, ErrorCode};
use super::membership::{FuzzySet, FuzzyValue};

/// Degree of every term of one variable, in declaration order
pub type TermDegrees = IndexMap<String, FuzzyValue>;

/// Closed real interval a variable is defined over
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Universe {
    min: f64,
    max: f64,
}

impl Universe {
    pub fn new(min: f64, max: f64) -> DpiResult<Self> {
        dpi_ensure!(
            min.is_finite() && max.is_finite(),
            ErrorCode::InvalidUniverse,
            "universe bounds must be finite (got [{}, {}])",
            min,
            max
        );
        dpi_ensure!(
            min < max,
            ErrorCode::InvalidUniverse,
            "universe minimum {} must be below maximum {}",
            min,
            max
        );
        Ok(Self { min, max })
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn midpoint(&self) -> f64 {
        (self.min + self.max) / 2.0
    }

    pub fn contains(&self, x: f64) -> bool {
        (self.min..=self.max).contains(&x)
    }

    /// Evenly spaced sample points, `intervals + 1` of them including both ends
    pub fn samples(&self, intervals: usize) -> impl Iterator<Item = f64> {
        let Universe { min, max } = *self;
        let intervals = intervals.max(1);
        let step = (max - min) / intervals as f64;
        (0..=intervals).map(move |i| {
            if i == intervals {
                max
            } else {
                min + i as f64 * step
            }
        })
    }

    pub fn as_array(&self) -> [f64; 2] {
        [self.min, self.max]
    }
}

/// A linguistic variable with associated fuzzy sets
#[derive(Debug, Clone, PartialEq)]
pub struct LinguisticVariable {
    name: String,
    concept: String,
    universe: Universe,
    sets: Vec<FuzzySet>,
}

impl LinguisticVariable {
    pub fn new(
        name: impl Into<String>,
        concept: impl Into<String>,
        universe: Universe,
        sets: Vec<FuzzySet>,
    ) -> DpiResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DpiError::new(
                ErrorCode::ModelError,
                "variable name must not be empty",
            ));
        }
        if sets.is_empty() {
            return Err(DpiError::new(
                ErrorCode::ModelError,
                format!("variable '{}' declares no terms", name),
            )
            .with_context("variable", name.as_str()));
        }

        let mut seen = HashSet::new();
        for set in &sets {
            if !seen.insert(set.term()) {
                return Err(DpiError::new(
                    ErrorCode::DuplicateTerm,
                    format!("term '{}' is declared twice in variable '{}'", set.term(), name),
                )
                .with_context("variable", name.as_str()));
            }
        }

        Ok(Self {
            name,
            concept: concept.into(),
            universe,
            sets,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn concept(&self) -> &str {
        &self.concept
    }

    pub fn universe(&self) -> Universe {
        self.universe
    }

    pub fn sets(&self) -> &[FuzzySet] {
        &self.sets
    }

    /// Look up a term by name
    pub fn term(&self, term: &str) -> Option<&FuzzySet> {
        self.sets.iter().find(|s| s.term() == term)
    }

    pub fn has_term(&self, term: &str) -> bool {
        self.term(term).is_some()
    }

    /// Fuzzify a crisp value - get membership for all terms.
    ///
    /// Degrees are not normalised, overlapping terms may sum past 1. Values
    /// outside the universe follow each shape's flat extension.
    pub fn fuzzify(&self, value: f64) -> TermDegrees {
        self.sets
            .iter()
            .map(|set| (set.term().to_string(), set.membership(value)))
            .collect()
    }

    /// Term with the highest membership at `value`; ties go to the first declared
    pub fn dominant_term(&self, value: f64) -> (&str, FuzzyValue) {
        let mut best = (self.sets[0].term(), self.sets[0].membership(value));
        for set in &self.sets[1..] {
            let degree = set.membership(value);
            if degree.value() > best.1.value() {
                best = (set.term(), degree);
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn focus_time() -> LinguisticVariable {
        LinguisticVariable::new(
            "FocusTime",
            "Focus Time",
            Universe::new(0.0, 24.0).unwrap(),
            vec![
                FuzzySet::from_pairs("Low", &[[0.0, 1.0], [2.0, 1.0], [3.0, 0.0]]).unwrap(),
                FuzzySet::from_pairs("Medium", &[[2.0, 0.0], [4.0, 1.0], [6.0, 0.0]]).unwrap(),
                FuzzySet::from_pairs("High", &[[5.0, 0.0], [7.0, 1.0], [24.0, 1.0]]).unwrap(),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_universe_validation() {
        assert!(Universe::new(0.0, 1.0).is_ok());
        assert_eq!(Universe::new(1.0, 1.0).unwrap_err().code, ErrorCode::InvalidUniverse);
        assert!(Universe::new(5.0, 1.0).is_err());
        assert!(Universe::new(0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_universe_samples() {
        let u = Universe::new(0.0, 10.0).unwrap();
        let xs: Vec<f64> = u.samples(4).collect();
        assert_eq!(xs, vec![0.0, 2.5, 5.0, 7.5, 10.0]);
        assert_eq!(u.midpoint(), 5.0);
        assert!(u.contains(10.0));
        assert!(!u.contains(10.5));
    }

    #[test]
    fn test_fuzzify_keeps_declaration_order() {
        let degrees = focus_time().fuzzify(2.5);
        let terms: Vec<&str> = degrees.keys().map(String::as_str).collect();
        assert_eq!(terms, vec!["Low", "Medium", "High"]);
        assert!((degrees["Low"].value() - 0.5).abs() < 1e-12);
        assert!((degrees["Medium"].value() - 0.25).abs() < 1e-12);
        assert_eq!(degrees["High"].value(), 0.0);
    }

    #[test]
    fn test_fuzzify_is_not_normalised() {
        // Medium and High overlap between 5 and 6
        let degrees = focus_time().fuzzify(5.5);
        let total: f64 = degrees.values().map(|d| d.value()).sum();
        assert!((total - 1.0).abs() > 1e-6);
    }

    #[test]
    fn test_fuzzify_outside_universe() {
        let degrees = focus_time().fuzzify(40.0);
        assert_eq!(degrees["High"].value(), 1.0);
        let degrees = focus_time().fuzzify(-3.0);
        assert_eq!(degrees["Low"].value(), 1.0);
    }

    #[test]
    fn test_dominant_term() {
        let var = focus_time();
        assert_eq!(var.dominant_term(1.0).0, "Low");
        assert_eq!(var.dominant_term(4.0).0, "Medium");
        assert_eq!(var.dominant_term(10.0).0, "High");
    }

    #[test]
    fn test_dominant_term_tie_goes_to_first_declared() {
        let var = LinguisticVariable::new(
            "Level",
            "Level",
            Universe::new(0.0, 10.0).unwrap(),
            vec![
                FuzzySet::from_pairs("Down", &[[0.0, 1.0], [10.0, 0.0]]).unwrap(),
                FuzzySet::from_pairs("Up", &[[0.0, 0.0], [10.0, 1.0]]).unwrap(),
            ],
        )
        .unwrap();
        assert_eq!(var.dominant_term(5.0).0, "Down");
    }

    #[test]
    fn test_rejects_duplicate_terms() {
        let set = FuzzySet::from_pairs("Low", &[[0.0, 1.0], [1.0, 0.0]]).unwrap();
        let err = LinguisticVariable::new(
            "X",
            "X",
            Universe::new(0.0, 1.0).unwrap(),
            vec![set.clone(), set],
        )
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::DuplicateTerm);
    }

    #[test]
    fn test_rejects_empty_variable() {
        let err = LinguisticVariable::new("X", "X", Universe::new(0.0, 1.0).unwrap(), vec![])
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ModelError);
        assert!(LinguisticVariable::new(" ", "X", Universe::new(0.0, 1.0).unwrap(), vec![]).is_err());
    }
}
