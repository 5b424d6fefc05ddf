//! Daily productivity index (DPI) calculation
//!
//! Maps a day's raw measurements onto the productivity model's four inputs,
//! runs the simulator and rounds the result for display.

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{DpiError, DpiResult, ErrorCode};
use crate::fuzzy::{CrispInputs, FiredRule, FuzzyValue};
use crate::model::{FuzzyMetadata, Registry};
use super::Simulator;

pub const FOCUS_TIME: &str = "FocusTime";
pub const DISTRACTIONS: &str = "Distractions";
pub const SLEEP_QUALITY: &str = "SleepQuality";
pub const WORKLOAD: &str = "Workload";
pub const PRODUCTIVITY: &str = "Productivity";

const REQUIRED_INPUTS: [&str; 4] = [FOCUS_TIME, DISTRACTIONS, SLEEP_QUALITY, WORKLOAD];

/// Sleep beyond this many hours earns no extra credit
const FULL_NIGHT_HOURS: f64 = 8.0;

const SCORE_DECIMALS: usize = 2;
const DEGREE_DECIMALS: usize = 4;

struct FieldRule {
    name: &'static str,
    min: f64,
    max: f64,
    whole: bool,
    hint: &'static str,
}

const FIELDS: [FieldRule; 5] = [
    FieldRule {
        name: "focus_time",
        min: 0.0,
        max: 24.0,
        whole: false,
        hint: "Focus time is hours of deep work in the day",
    },
    FieldRule {
        name: "distractions",
        min: 0.0,
        max: f64::INFINITY,
        whole: true,
        hint: "Distractions is a count of interruptions",
    },
    FieldRule {
        name: "sleep_hours",
        min: 0.0,
        max: 24.0,
        whole: false,
        hint: "Sleep hours is the previous night's sleep duration",
    },
    FieldRule {
        name: "sleep_quality_score",
        min: 0.0,
        max: 10.0,
        whole: true,
        hint: "Sleep quality is a whole-number rating from 0 to 10",
    },
    FieldRule {
        name: "workload",
        min: 1.0,
        max: 10.0,
        whole: true,
        hint: "Workload is a whole-number rating from 1 to 10",
    },
];

/// One day's raw measurements
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyInput {
    pub focus_time: f64,
    pub distractions: f64,
    pub sleep_hours: f64,
    pub sleep_quality_score: f64,
    pub workload: f64,
}

impl DailyInput {
    pub fn new(
        focus_time: f64,
        distractions: f64,
        sleep_hours: f64,
        sleep_quality_score: f64,
        workload: f64,
    ) -> Self {
        Self {
            focus_time,
            distractions,
            sleep_hours,
            sleep_quality_score,
            workload,
        }
    }

    /// Read and validate a JSON request body, naming the offending field on failure
    pub fn from_json(body: &Value) -> DpiResult<Self> {
        let obj = body.as_object().ok_or_else(|| {
            DpiError::new(ErrorCode::InvalidFormat, "request body must be a JSON object")
        })?;

        let field = |name: &str| -> DpiResult<f64> {
            match obj.get(name) {
                None | Some(Value::Null) => Err(DpiError::missing(name)),
                Some(v) => v.as_f64().ok_or_else(|| {
                    DpiError::new(ErrorCode::InvalidValue, format!("{} must be a number", name))
                        .with_context("field", name)
                }),
            }
        };

        let input = Self {
            focus_time: field("focus_time")?,
            distractions: field("distractions")?,
            sleep_hours: field("sleep_hours")?,
            sleep_quality_score: field("sleep_quality_score")?,
            workload: field("workload")?,
        };
        input.validate()?;
        Ok(input)
    }

    fn values(&self) -> [f64; 5] {
        [
            self.focus_time,
            self.distractions,
            self.sleep_hours,
            self.sleep_quality_score,
            self.workload,
        ]
    }

    /// Range and whole-number checks for every field
    pub fn validate(&self) -> DpiResult<()> {
        for (rule, value) in FIELDS.iter().zip(self.values()) {
            if !value.is_finite() {
                return Err(DpiError::new(
                    ErrorCode::InvalidValue,
                    format!("{} must be a finite number", rule.name),
                )
                .with_context("field", rule.name));
            }
            if value < rule.min || value > rule.max {
                let err = if rule.max.is_finite() {
                    DpiError::out_of_range(rule.name, value, rule.min, rule.max)
                } else {
                    DpiError::new(
                        ErrorCode::OutOfRange,
                        format!("{} must be at least {} (got {})", rule.name, rule.min, value),
                    )
                    .with_context("field", rule.name)
                };
                return Err(err.with_hint(rule.hint));
            }
            if rule.whole && value.fract() != 0.0 {
                return Err(DpiError::new(
                    ErrorCode::InvalidValue,
                    format!("{} must be a whole number (got {})", rule.name, value),
                )
                .with_context("field", rule.name)
                .with_hint(rule.hint));
            }
        }
        Ok(())
    }

    pub fn adjusted_sleep_score(&self) -> f64 {
        adjusted_sleep_score(self.sleep_hours, self.sleep_quality_score)
    }

    /// Model inputs for this day
    pub fn crisp_inputs(&self) -> CrispInputs {
        [
            (FOCUS_TIME, self.focus_time),
            (DISTRACTIONS, self.distractions),
            (SLEEP_QUALITY, self.adjusted_sleep_score()),
            (WORKLOAD, self.workload),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
    }
}

/// Blend of sleep duration (capped at a full night) and the 0-10 quality
/// rating, half each, on [0, 1]
pub fn adjusted_sleep_score(sleep_hours: f64, sleep_quality_score: f64) -> f64 {
    (sleep_hours.min(FULL_NIGHT_HOURS) / FULL_NIGHT_HOURS) * 0.5 + (sleep_quality_score / 10.0) * 0.5
}

/// Decimal rounding of the exact binary value, ties to even
fn round_to(value: f64, places: usize) -> f64 {
    format!("{:.*}", places, value).parse().unwrap_or(value)
}

/// Per-call introspection: what the inputs fuzzified to and which rules fired
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationDetails {
    pub fuzzified_inputs: IndexMap<String, IndexMap<String, f64>>,
    pub fired_rules: Vec<FiredRule>,
}

/// Result of one DPI calculation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DpiReport {
    pub dpi_score: f64,
    pub adjusted_sleep_score: f64,
    pub linguistic_result: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    pub simulation: SimulationDetails,
}

impl DpiReport {
    pub fn dated(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }
}

/// The productivity-index calculator
#[derive(Debug, Clone)]
pub struct DpiCalculator {
    simulator: Simulator,
}

impl DpiCalculator {
    /// Wrap a simulator whose model declares the four DPI inputs and the
    /// `Productivity` output
    pub fn new(simulator: Simulator) -> DpiResult<Self> {
        let registry = simulator.registry();
        for name in REQUIRED_INPUTS {
            if registry.input(name).is_none() {
                return Err(DpiError::model(format!(
                    "model has no '{}' input required for DPI calculation",
                    name
                ))
                .with_context("variable", name));
            }
        }
        if registry.output(PRODUCTIVITY).is_none() {
            return Err(DpiError::model(format!(
                "model has no '{}' output",
                PRODUCTIVITY
            ))
            .with_context("variable", PRODUCTIVITY));
        }
        Ok(Self { simulator })
    }

    /// Calculator over the built-in model with default engine settings
    pub fn builtin() -> DpiResult<Self> {
        Self::new(Simulator::with_defaults(std::sync::Arc::new(Registry::builtin()?)))
    }

    pub fn simulator(&self) -> &Simulator {
        &self.simulator
    }

    pub fn registry(&self) -> &Registry {
        self.simulator.registry()
    }

    pub fn metadata(&self) -> FuzzyMetadata {
        self.registry().metadata()
    }

    pub fn calculate(&self, input: &DailyInput) -> DpiResult<DpiReport> {
        input.validate()?;
        let adjusted = input.adjusted_sleep_score();
        let eval = self.simulator.calculate(&input.crisp_inputs())?;

        let output = eval.outputs.get(PRODUCTIVITY).ok_or_else(|| {
            DpiError::internal(format!("no result for output '{}'", PRODUCTIVITY))
        })?;

        let fuzzified_inputs: IndexMap<String, IndexMap<String, f64>> = eval
            .fuzzified
            .iter()
            .map(|(var, terms)| {
                let degrees: IndexMap<String, f64> = terms
                    .iter()
                    .map(|(term, d)| (term.clone(), round_to(d.value(), DEGREE_DECIMALS)))
                    .collect();
                (var.clone(), degrees)
            })
            .collect();

        let fired_rules: Vec<FiredRule> = eval
            .fired_rules
            .into_iter()
            .map(|r| FiredRule {
                strength: FuzzyValue::new(round_to(r.strength.value(), DEGREE_DECIMALS)),
                ..r
            })
            // a strength that rounds to 0 would contradict the rounded snapshot
            .filter(|r| !r.strength.is_zero())
            .collect();

        Ok(DpiReport {
            dpi_score: round_to(output.value, SCORE_DECIMALS),
            adjusted_sleep_score: round_to(adjusted, SCORE_DECIMALS),
            linguistic_result: output.label.clone(),
            date: None,
            simulation: SimulationDetails {
                fuzzified_inputs,
                fired_rules,
            },
        })
    }
}
