//! Calculation orchestration
//!
//! [`Simulator`] runs fuzzify -> infer -> defuzzify against any registry.
//! [`dpi`] layers the productivity-index request/response shape on top.

pub mod dpi;

use std::sync::Arc;

use indexmap::IndexMap;
use serde::Serialize;
use tracing::debug;

use crate::error::DpiResult;
use crate::fuzzy::{
    linguistic_label, CrispInputs, DefuzzificationMethod, Defuzzifier, FiredRule, Fuzzification,
    Implication, DEFAULT_RESOLUTION,
};
use crate::model::Registry;

pub use dpi::{adjusted_sleep_score, DailyInput, DpiCalculator, DpiReport, SimulationDetails};

/// Engine tunables
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineSettings {
    pub defuzzification: DefuzzificationMethod,
    pub resolution: usize,
    pub implication: Implication,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            defuzzification: DefuzzificationMethod::Centroid,
            resolution: DEFAULT_RESOLUTION,
            implication: Implication::Minimum,
        }
    }
}

/// Crisp result for one output variable
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputValue {
    pub value: f64,
    pub label: String,
    /// False when no rule fired and `value` is the universe midpoint
    pub determined: bool,
}

/// Everything one calculation produced
#[derive(Debug, Clone, Serialize)]
pub struct Evaluation {
    pub fuzzified: Fuzzification,
    pub fired_rules: Vec<FiredRule>,
    pub outputs: IndexMap<String, OutputValue>,
}

/// Stateless calculator over a shared registry
#[derive(Debug, Clone)]
pub struct Simulator {
    registry: Arc<Registry>,
    defuzzifier: Defuzzifier,
    implication: Implication,
}

impl Simulator {
    pub fn new(registry: Arc<Registry>, settings: EngineSettings) -> DpiResult<Self> {
        Ok(Self {
            registry,
            defuzzifier: Defuzzifier::new(settings.defuzzification, settings.resolution)?,
            implication: settings.implication,
        })
    }

    pub fn with_defaults(registry: Arc<Registry>) -> Self {
        Self {
            registry,
            defuzzifier: Defuzzifier::default(),
            implication: Implication::default(),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Run one calculation. Fails only on missing or non-finite inputs.
    pub fn calculate(&self, inputs: &CrispInputs) -> DpiResult<Evaluation> {
        let fuzzified = self.registry.fuzzifier().fuzzify(inputs)?;
        let inference = self.registry.engine(self.implication).evaluate(&fuzzified);

        let outputs = inference
            .outputs
            .iter()
            .map(|(name, aggregate)| {
                let crisp = self.defuzzifier.defuzzify(aggregate);
                let value = OutputValue {
                    value: crisp.value,
                    label: linguistic_label(aggregate.variable(), &crisp),
                    determined: crisp.determined,
                };
                (name.clone(), value)
            })
            .collect::<IndexMap<_, _>>();

        debug!(
            fired = inference.fired_rules.len(),
            outputs = ?outputs.iter().map(|(n, o)| (n.as_str(), o.value)).collect::<Vec<_>>(),
            "calculation complete"
        );

        Ok(Evaluation {
            fuzzified,
            fired_rules: inference.fired_rules,
            outputs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::fuzzy::{Antecedent, FuzzySet, LinguisticVariable, Proposition, Rule, Universe};

    fn builtin() -> Simulator {
        Simulator::with_defaults(Arc::new(Registry::builtin().unwrap()))
    }

    fn crisp(values: &[(&str, f64)]) -> CrispInputs {
        values.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_midpoints_fire_rules() {
        let sim = builtin();
        let inputs: CrispInputs = sim
            .registry()
            .inputs()
            .iter()
            .map(|v| (v.name().to_string(), v.universe().midpoint()))
            .collect();
        let eval = sim.calculate(&inputs).unwrap();
        assert!(!eval.fired_rules.is_empty());
        assert!(eval.fired_rules.iter().any(|r| r.strength.value() > 0.0));
        assert!(eval.outputs["Productivity"].determined);
    }

    #[test]
    fn test_deterministic() {
        let sim = builtin();
        let inputs = crisp(&[
            ("FocusTime", 4.0),
            ("Distractions", 5.0),
            ("SleepQuality", 0.7875),
            ("Workload", 5.0),
        ]);
        let a = sim.calculate(&inputs).unwrap();
        let b = sim.calculate(&inputs).unwrap();
        assert_eq!(a.outputs, b.outputs);
        assert_eq!(a.fired_rules, b.fired_rules);
    }

    #[test]
    fn test_missing_input_is_validation_error() {
        let sim = builtin();
        let err = sim
            .calculate(&crisp(&[("FocusTime", 4.0), ("Distractions", 5.0)]))
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::MissingRequired);
        assert!(err.is_client_error());
    }

    #[test]
    fn test_synthetic_registry_undetermined() {
        let input = LinguisticVariable::new(
            "Temp",
            "Temperature",
            Universe::new(0.0, 40.0).unwrap(),
            vec![
                FuzzySet::from_pairs("Cold", &[[0.0, 1.0], [15.0, 0.0]]).unwrap(),
                FuzzySet::from_pairs("Hot", &[[25.0, 0.0], [40.0, 1.0]]).unwrap(),
            ],
        )
        .unwrap();
        let output = LinguisticVariable::new(
            "Fan",
            "Fan speed",
            Universe::new(0.0, 100.0).unwrap(),
            vec![
                FuzzySet::from_pairs("Slow", &[[0.0, 1.0], [50.0, 0.0]]).unwrap(),
                FuzzySet::from_pairs("Fast", &[[50.0, 0.0], [100.0, 1.0]]).unwrap(),
            ],
        )
        .unwrap();
        let rules = vec![
            Rule::new(1, Antecedent::is("Temp", "Cold"), Proposition::new("Fan", "Slow")),
            Rule::new(2, Antecedent::is("Temp", "Hot"), Proposition::new("Fan", "Fast")),
        ];
        let registry = Registry::new("fan", vec![input], vec![output], rules).unwrap();
        let sim = Simulator::new(Arc::new(registry), EngineSettings::default()).unwrap();

        // 20 degrees sits between Cold and Hot
        let eval = sim.calculate(&crisp(&[("Temp", 20.0)])).unwrap();
        let fan = &eval.outputs["Fan"];
        assert!(eval.fired_rules.is_empty());
        assert!(!fan.determined);
        assert_eq!(fan.value, 50.0);
        assert_eq!(fan.label, "Undetermined");

        let eval = sim.calculate(&crisp(&[("Temp", 40.0)])).unwrap();
        assert_eq!(eval.outputs["Fan"].label, "Fast");
        assert!(eval.outputs["Fan"].value > 50.0);
    }

    #[test]
    fn test_settings_validated() {
        let settings = EngineSettings {
            resolution: 2,
            ..EngineSettings::default()
        };
        let err = Simulator::new(Arc::new(Registry::builtin().unwrap()), settings).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidConfigValue);
    }
}
