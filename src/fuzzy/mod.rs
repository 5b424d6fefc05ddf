//! Mamdani fuzzy inference
//!
//! - `membership` - degrees and piecewise-linear shapes
//! - `variable` - linguistic variables over a universe
//! - `fuzzifier` - crisp inputs to term degrees
//! - `rule` / `parse` - antecedent trees and rule text
//! - `inference` - rule firing and output aggregation
//! - `defuzzify` - crisp outputs and labels

pub mod defuzzify;
pub mod fuzzifier;
pub mod inference;
pub mod membership;
pub mod parse;
pub mod rule;
pub mod variable;

pub use defuzzify::{
    linguistic_label, DefuzzificationMethod, Defuzzified, Defuzzifier, DEFAULT_RESOLUTION,
    MIN_RESOLUTION, UNDETERMINED_LABEL,
};
pub use fuzzifier::{CrispInputs, Fuzzifier};
pub use inference::{AggregatedSet, FiredRule, Implication, Inference, InferenceEngine};
pub use membership::{FuzzySet, FuzzyValue, MembershipFunction, Point};
pub use parse::{parse_rule, RuleSyntaxError};
pub use rule::{Antecedent, Fuzzification, Proposition, Rule};
pub use variable::{LinguisticVariable, TermDegrees, Universe};
