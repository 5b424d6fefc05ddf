//! Mamdani rule evaluation and output aggregation

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{DpiError, ErrorCode};
use super::membership::FuzzyValue;
use super::rule::{Fuzzification, Rule};
use super::variable::{LinguisticVariable, Universe};

/// A rule whose firing strength was above zero
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FiredRule {
    pub id: u32,
    pub text: String,
    pub strength: FuzzyValue,
}

/// How a rule's strength shapes its consequent term
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Implication {
    /// Clip the consequent at the strength (Mamdani)
    #[default]
    Minimum,
    /// Scale the consequent by the strength (Larsen)
    Product,
}

impl Implication {
    pub fn apply(&self, strength: FuzzyValue, degree: FuzzyValue) -> FuzzyValue {
        match self {
            Implication::Minimum => strength.and(&degree),
            Implication::Product => strength.product(&degree),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Implication::Minimum => "minimum",
            Implication::Product => "product",
        }
    }
}

impl fmt::Display for Implication {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Implication {
    type Err = DpiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "minimum" | "min" | "mamdani" => Ok(Implication::Minimum),
            "product" | "prod" | "larsen" => Ok(Implication::Product),
            other => Err(DpiError::new(
                ErrorCode::InvalidConfigValue,
                format!("unknown implication '{}'", other),
            )
            .with_hint("Use 'minimum' or 'product'")),
        }
    }
}

/// Aggregated output shape of one variable.
///
/// Holds the strongest activation per consequent term; the shape itself is
/// `max_t implication(activation_t, mu_t(x))` and is evaluated lazily.
#[derive(Debug, Clone)]
pub struct AggregatedSet<'m> {
    variable: &'m LinguisticVariable,
    activations: IndexMap<String, FuzzyValue>,
    implication: Implication,
}

impl<'m> AggregatedSet<'m> {
    fn new(variable: &'m LinguisticVariable, implication: Implication) -> Self {
        Self {
            variable,
            activations: IndexMap::new(),
            implication,
        }
    }

    fn activate(&mut self, term: &str, strength: FuzzyValue) {
        let slot = self
            .activations
            .entry(term.to_string())
            .or_insert(FuzzyValue::ZERO);
        *slot = slot.or(&strength);
    }

    pub fn variable(&self) -> &'m LinguisticVariable {
        self.variable
    }

    pub fn universe(&self) -> Universe {
        self.variable.universe()
    }

    /// Strongest activation per term, in the order terms were first hit
    pub fn activations(&self) -> &IndexMap<String, FuzzyValue> {
        &self.activations
    }

    /// No rule targeting this variable fired
    pub fn is_empty(&self) -> bool {
        self.activations.values().all(FuzzyValue::is_zero)
    }

    /// Aggregated membership at `x`
    pub fn membership(&self, x: f64) -> FuzzyValue {
        self.activations
            .iter()
            .filter_map(|(term, strength)| {
                self.variable
                    .term(term)
                    .map(|set| self.implication.apply(*strength, set.membership(x)))
            })
            .fold(FuzzyValue::ZERO, |acc, m| acc.or(&m))
    }
}

/// Result of evaluating the rule base once
#[derive(Debug, Clone)]
pub struct Inference<'m> {
    /// Rules with strength > 0, in definition order
    pub fired_rules: Vec<FiredRule>,
    /// One aggregated shape per output variable, in declaration order
    pub outputs: IndexMap<String, AggregatedSet<'m>>,
}

/// Evaluates a rule base against fuzzified inputs
#[derive(Debug, Clone, Copy)]
pub struct InferenceEngine<'m> {
    rules: &'m [Rule],
    outputs: &'m [LinguisticVariable],
    implication: Implication,
}

impl<'m> InferenceEngine<'m> {
    pub fn new(rules: &'m [Rule], outputs: &'m [LinguisticVariable]) -> Self {
        Self {
            rules,
            outputs,
            implication: Implication::default(),
        }
    }

    pub fn with_implication(mut self, implication: Implication) -> Self {
        self.implication = implication;
        self
    }

    pub fn evaluate(&self, fuzzified: &Fuzzification) -> Inference<'m> {
        let mut outputs: IndexMap<String, AggregatedSet<'m>> = self
            .outputs
            .iter()
            .map(|var| (var.name().to_string(), AggregatedSet::new(var, self.implication)))
            .collect();
        let mut fired_rules = Vec::new();

        for rule in self.rules {
            let strength = rule.firing_strength(fuzzified);
            if strength.is_zero() {
                continue;
            }

            let consequent = rule.consequent();
            if let Some(aggregate) = outputs.get_mut(&consequent.variable) {
                aggregate.activate(&consequent.term, strength);
            }

            fired_rules.push(FiredRule {
                id: rule.id(),
                text: rule.text(),
                strength,
            });
        }

        Inference {
            fired_rules,
            outputs,
        }
    }
}
