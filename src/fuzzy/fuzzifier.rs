//! Crisp inputs to term degrees

use indexmap::IndexMap;

use crate::error::{DpiError, DpiResult, ErrorCode};
use super::rule::Fuzzification;
use super::variable::LinguisticVariable;

/// Crisp value per input variable name
pub type CrispInputs = IndexMap<String, f64>;

/// Fuzzifies a full input vector against a set of input variables
#[derive(Debug, Clone, Copy)]
pub struct Fuzzifier<'m> {
    inputs: &'m [LinguisticVariable],
}

impl<'m> Fuzzifier<'m> {
    pub fn new(inputs: &'m [LinguisticVariable]) -> Self {
        Self { inputs }
    }

    /// Every declared input must be present and finite. Extra entries are ignored.
    pub fn fuzzify(&self, crisp: &CrispInputs) -> DpiResult<Fuzzification> {
        let mut result = Fuzzification::with_capacity(self.inputs.len());

        for var in self.inputs {
            let value = *crisp
                .get(var.name())
                .ok_or_else(|| DpiError::missing(var.name()))?;
            if !value.is_finite() {
                return Err(DpiError::new(
                    ErrorCode::InvalidValue,
                    format!("input '{}' must be a finite number", var.name()),
                )
                .with_context("field", var.name()));
            }
            result.insert(var.name().to_string(), var.fuzzify(value));
        }

        Ok(result)
    }
}
