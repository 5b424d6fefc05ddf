//! Fuzzy DPI - Mamdani fuzzy inference for the daily productivity index
//!
//! A rule-based fuzzy logic engine with linguistic variables, piecewise-linear
//! membership functions, Mamdani inference and defuzzification, plus the
//! productivity-index calculator and HTTP service built on top of it.
//!
//! # Architecture
//!
//! - [`fuzzy`] - membership functions, linguistic variables, rules, the
//!   inference engine and defuzzifiers
//! - [`model`] - model definitions (TOML/JSON), the validated [`Registry`]
//!   and the metadata exporter
//! - [`simulation`] - the [`Simulator`] pipeline and the [`DpiCalculator`]
//! - [`server`] - axum HTTP API
//! - [`config`] - TOML and environment configuration
//!
//! # Example
//!
//! ```rust,ignore
//! use fuzzy_dpi::{DailyInput, DpiCalculator};
//!
//! let calculator = DpiCalculator::builtin()?;
//! let report = calculator.calculate(&DailyInput::new(8.0, 1.0, 8.0, 9.0, 5.0))?;
//! assert_eq!(report.linguistic_result, "Excellent");
//! ```

pub mod config;
pub mod error;
pub mod fuzzy;
pub mod logging;
pub mod model;
pub mod server;
pub mod simulation;

pub use config::{DpiConfig, LogLevel, ServerConfig};
pub use error::{DpiError, DpiResult, ErrorCode, ErrorResponse};
pub use fuzzy::{
    Antecedent, DefuzzificationMethod, Defuzzifier, FiredRule, FuzzySet, FuzzyValue, Implication,
    LinguisticVariable, MembershipFunction, Proposition, Rule, Universe,
};
pub use model::{FuzzyMetadata, ModelDefinition, Registry};
pub use simulation::{
    adjusted_sleep_score, DailyInput, DpiCalculator, DpiReport, EngineSettings, Evaluation,
    Simulator,
};
