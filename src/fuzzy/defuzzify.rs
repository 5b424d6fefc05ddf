//! Defuzzification and linguistic labelling

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::dpi_ensure;
use crate::error::{DpiError, DpiResult, ErrorCode};
use super::inference::AggregatedSet;
use super::membership::FuzzyValue;
use super::variable::{LinguisticVariable, Universe};

/// Sample intervals used when none is configured
pub const DEFAULT_RESOLUTION: usize = 200;

/// Fewest sample intervals accepted
pub const MIN_RESOLUTION: usize = 10;

/// Label reported when no rule fired for an output
pub const UNDETERMINED_LABEL: &str = "Undetermined";

const MAX_TOLERANCE: f64 = 1e-9;

/// Defuzzification method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DefuzzificationMethod {
    /// Center of Gravity (Centroid)
    #[default]
    #[serde(rename = "centroid")]
    Centroid,
    /// Bisector of Area
    #[serde(rename = "bisector")]
    Bisector,
    /// Mean of Maximum
    #[serde(rename = "mom")]
    MeanOfMaximum,
    /// Smallest of Maximum
    #[serde(rename = "som")]
    SmallestOfMaximum,
    /// Largest of Maximum
    #[serde(rename = "lom")]
    LargestOfMaximum,
}

impl DefuzzificationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            DefuzzificationMethod::Centroid => "centroid",
            DefuzzificationMethod::Bisector => "bisector",
            DefuzzificationMethod::MeanOfMaximum => "mom",
            DefuzzificationMethod::SmallestOfMaximum => "som",
            DefuzzificationMethod::LargestOfMaximum => "lom",
        }
    }
}

impl fmt::Display for DefuzzificationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DefuzzificationMethod {
    type Err = DpiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "centroid" | "cog" => Ok(DefuzzificationMethod::Centroid),
            "bisector" => Ok(DefuzzificationMethod::Bisector),
            "mom" | "mean_of_maximum" => Ok(DefuzzificationMethod::MeanOfMaximum),
            "som" | "smallest_of_maximum" => Ok(DefuzzificationMethod::SmallestOfMaximum),
            "lom" | "largest_of_maximum" => Ok(DefuzzificationMethod::LargestOfMaximum),
            other => Err(DpiError::new(
                ErrorCode::InvalidConfigValue,
                format!("unknown defuzzification method '{}'", other),
            )
            .with_hint("Use one of: centroid, bisector, mom, som, lom")),
        }
    }
}

/// A crisp output value.
///
/// `determined` is false when the aggregated shape was empty and the value is
/// the universe midpoint fallback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Defuzzified {
    pub value: f64,
    pub determined: bool,
}

/// Turns aggregated shapes into crisp values over a fixed sampling
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Defuzzifier {
    method: DefuzzificationMethod,
    resolution: usize,
}

impl Default for Defuzzifier {
    fn default() -> Self {
        Self {
            method: DefuzzificationMethod::Centroid,
            resolution: DEFAULT_RESOLUTION,
        }
    }
}

impl Defuzzifier {
    pub fn new(method: DefuzzificationMethod, resolution: usize) -> DpiResult<Self> {
        dpi_ensure!(
            resolution >= MIN_RESOLUTION,
            ErrorCode::InvalidConfigValue,
            "resolution must be at least {} (got {})",
            MIN_RESOLUTION,
            resolution
        );
        Ok(Self { method, resolution })
    }

    pub fn method(&self) -> DefuzzificationMethod {
        self.method
    }

    pub fn resolution(&self) -> usize {
        self.resolution
    }

    pub fn defuzzify(&self, aggregate: &AggregatedSet<'_>) -> Defuzzified {
        if aggregate.is_empty() {
            return undetermined(aggregate.universe());
        }
        self.defuzzify_with(aggregate.universe(), |x| aggregate.membership(x))
    }

    /// Defuzzify an arbitrary shape sampled over `universe`
    pub fn defuzzify_with<F>(&self, universe: Universe, shape: F) -> Defuzzified
    where
        F: Fn(f64) -> FuzzyValue,
    {
        let samples: Vec<(f64, f64)> = universe
            .samples(self.resolution)
            .map(|x| (x, shape(x).value()))
            .collect();

        let total: f64 = samples.iter().map(|(_, m)| m).sum();
        if total <= 0.0 {
            return undetermined(universe);
        }

        let value = match self.method {
            DefuzzificationMethod::Centroid => {
                let moment: f64 = samples.iter().map(|(x, m)| x * m).sum();
                moment / total
            }
            DefuzzificationMethod::Bisector => {
                let half = total / 2.0;
                let mut cumulative = 0.0;
                samples
                    .iter()
                    .find(|(_, m)| {
                        cumulative += m;
                        cumulative >= half
                    })
                    .map(|(x, _)| *x)
                    .unwrap_or_else(|| universe.max())
            }
            DefuzzificationMethod::MeanOfMaximum => {
                let maxima = maxima(&samples);
                maxima.iter().sum::<f64>() / maxima.len() as f64
            }
            DefuzzificationMethod::SmallestOfMaximum => maxima(&samples)
                .first()
                .copied()
                .unwrap_or_else(|| universe.midpoint()),
            DefuzzificationMethod::LargestOfMaximum => maxima(&samples)
                .last()
                .copied()
                .unwrap_or_else(|| universe.midpoint()),
        };

        Defuzzified {
            value,
            determined: true,
        }
    }
}

fn undetermined(universe: Universe) -> Defuzzified {
    Defuzzified {
        value: universe.midpoint(),
        determined: false,
    }
}

/// Sample positions at the peak degree; never empty when total > 0
fn maxima(samples: &[(f64, f64)]) -> Vec<f64> {
    let peak = samples.iter().map(|(_, m)| *m).fold(0.0, f64::max);
    samples
        .iter()
        .filter(|(_, m)| (peak - m).abs() <= MAX_TOLERANCE)
        .map(|(x, _)| *x)
        .collect()
}

/// Human-readable status for a crisp output.
///
/// Undetermined when no rule fired, or when the value falls where every term
/// of the variable has degree 0.
pub fn linguistic_label(variable: &LinguisticVariable, result: &Defuzzified) -> String {
    if !result.determined {
        return UNDETERMINED_LABEL.to_string();
    }
    match variable.dominant_term(result.value) {
        (_, degree) if degree.is_zero() => UNDETERMINED_LABEL.to_string(),
        (term, _) => term.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fuzzy::membership::{FuzzySet, MembershipFunction};

    fn universe() -> Universe {
        Universe::new(0.0, 10.0).unwrap()
    }

    fn triangle(a: f64, b: f64, c: f64) -> MembershipFunction {
        MembershipFunction::from_pairs(&[[a, 0.0], [b, 1.0], [c, 0.0]]).unwrap()
    }

    #[test]
    fn test_centroid_of_symmetric_triangle_is_peak() {
        let tri = triangle(2.0, 5.0, 8.0);
        let result = Defuzzifier::default().defuzzify_with(universe(), |x| tri.evaluate(x));
        assert!(result.determined);
        assert!((result.value - 5.0).abs() < 1e-6, "centroid {}", result.value);

        let off_centre = triangle(1.0, 3.0, 5.0);
        let result = Defuzzifier::default().defuzzify_with(universe(), |x| off_centre.evaluate(x));
        assert!((result.value - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_empty_shape_falls_back_to_midpoint() {
        let result = Defuzzifier::default().defuzzify_with(universe(), |_| FuzzyValue::ZERO);
        assert!(!result.determined);
        assert_eq!(result.value, 5.0);
    }

    #[test]
    fn test_maximum_methods_on_plateau() {
        // Plateau from 4 to 6
        let trap = MembershipFunction::from_pairs(&[[2.0, 0.0], [4.0, 1.0], [6.0, 1.0], [8.0, 0.0]])
            .unwrap();
        let run = |method| {
            Defuzzifier::new(method, 100)
                .unwrap()
                .defuzzify_with(universe(), |x| trap.evaluate(x))
                .value
        };
        assert!((run(DefuzzificationMethod::SmallestOfMaximum) - 4.0).abs() < 1e-9);
        assert!((run(DefuzzificationMethod::LargestOfMaximum) - 6.0).abs() < 1e-9);
        assert!((run(DefuzzificationMethod::MeanOfMaximum) - 5.0).abs() < 1e-9);
        assert!((run(DefuzzificationMethod::Bisector) - 5.0).abs() < 0.2);
    }

    #[test]
    fn test_higher_resolution_stays_close() {
        let shape = MembershipFunction::from_pairs(&[[0.0, 0.2], [3.0, 0.9], [10.0, 0.1]]).unwrap();
        let coarse = Defuzzifier::new(DefuzzificationMethod::Centroid, 50)
            .unwrap()
            .defuzzify_with(universe(), |x| shape.evaluate(x));
        let fine = Defuzzifier::new(DefuzzificationMethod::Centroid, 1000)
            .unwrap()
            .defuzzify_with(universe(), |x| shape.evaluate(x));
        assert!((coarse.value - fine.value).abs() < 0.1);
    }

    #[test]
    fn test_resolution_minimum() {
        let err = Defuzzifier::new(DefuzzificationMethod::Centroid, 5).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidConfigValue);
        assert!(Defuzzifier::new(DefuzzificationMethod::Centroid, MIN_RESOLUTION).is_ok());
    }

    #[test]
    fn test_method_from_str() {
        assert_eq!(
            "MOM".parse::<DefuzzificationMethod>().unwrap(),
            DefuzzificationMethod::MeanOfMaximum
        );
        assert_eq!(
            "centroid".parse::<DefuzzificationMethod>().unwrap(),
            DefuzzificationMethod::Centroid
        );
        assert!("median".parse::<DefuzzificationMethod>().is_err());
    }

    #[test]
    fn test_labels() {
        let var = LinguisticVariable::new(
            "Out",
            "Output",
            universe(),
            vec![
                FuzzySet::from_pairs("Low", &[[0.0, 1.0], [6.0, 0.0]]).unwrap(),
                FuzzySet::from_pairs("High", &[[4.0, 0.0], [10.0, 1.0]]).unwrap(),
            ],
        )
        .unwrap();

        let high = Defuzzified { value: 8.0, determined: true };
        assert_eq!(linguistic_label(&var, &high), "High");

        // Both terms are 1/6 at 5; first declared wins
        let tie = Defuzzified { value: 5.0, determined: true };
        assert_eq!(linguistic_label(&var, &tie), "Low");

        let none = Defuzzified { value: 5.0, determined: false };
        assert_eq!(linguistic_label(&var, &none), UNDETERMINED_LABEL);
    }

    #[test]
    fn test_label_in_gap_between_terms() {
        let var = LinguisticVariable::new(
            "Out",
            "Output",
            universe(),
            vec![
                FuzzySet::from_pairs("Low", &[[0.0, 1.0], [3.0, 0.0]]).unwrap(),
                FuzzySet::from_pairs("High", &[[7.0, 0.0], [10.0, 1.0]]).unwrap(),
            ],
        )
        .unwrap();

        let gap = Defuzzified { value: 5.0, determined: true };
        assert_eq!(linguistic_label(&var, &gap), UNDETERMINED_LABEL);

        let low = Defuzzified { value: 2.0, determined: true };
        assert_eq!(linguistic_label(&var, &low), "Low");
    }
}
