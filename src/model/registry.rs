//! The validated, immutable variable and rule registry

use std::collections::HashSet;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::error::{DpiError, DpiResult, ErrorCode};
use crate::fuzzy::{
    FuzzySet, Fuzzifier, Implication, InferenceEngine, LinguisticVariable, Proposition, Rule,
    Universe,
};
use super::definition::{ModelDefinition, VariableDefinition};

const BUILTIN_MODEL: &str = include_str!("dpi_model.toml");

/// Input and output variables plus the rule base.
///
/// Built once and shared read-only; every reference in every rule has been
/// checked against the declared variables.
#[derive(Debug, Clone)]
pub struct Registry {
    name: String,
    inputs: Vec<LinguisticVariable>,
    outputs: Vec<LinguisticVariable>,
    rules: Vec<Rule>,
}

impl Registry {
    /// Validate and assemble a registry
    pub fn new(
        name: impl Into<String>,
        inputs: Vec<LinguisticVariable>,
        outputs: Vec<LinguisticVariable>,
        rules: Vec<Rule>,
    ) -> DpiResult<Self> {
        let name = name.into();

        if inputs.is_empty() || outputs.is_empty() {
            return Err(DpiError::new(
                ErrorCode::EmptyModel,
                "model needs at least one input and one output variable",
            ));
        }
        if rules.is_empty() {
            return Err(DpiError::new(ErrorCode::EmptyModel, "model declares no rules"));
        }

        let mut names = HashSet::new();
        for var in inputs.iter().chain(&outputs) {
            if !names.insert(var.name()) {
                return Err(DpiError::new(
                    ErrorCode::DuplicateVariable,
                    format!("variable '{}' is declared more than once", var.name()),
                )
                .with_context("variable", var.name()));
            }
        }

        let mut ids = HashSet::new();
        for rule in &rules {
            if !ids.insert(rule.id()) {
                return Err(DpiError::new(
                    ErrorCode::DuplicateRuleId,
                    format!("rule id {} is used more than once", rule.id()),
                )
                .with_context("rule", rule.id().to_string()));
            }

            let weight = rule.weight();
            if !(0.0..=1.0).contains(&weight) {
                return Err(DpiError::new(
                    ErrorCode::InvalidWeight,
                    format!("rule {} has weight {} outside [0, 1]", rule.id(), weight),
                )
                .with_context("rule", rule.id().to_string()));
            }

            for prop in rule.antecedent().propositions() {
                check_reference(&inputs, prop)
                    .map_err(|e| e.with_context("rule", rule.id().to_string()))?;
            }
            check_reference(&outputs, rule.consequent()).map_err(|e| {
                e.with_context("rule", rule.id().to_string())
                    .with_hint("Consequents must name an output variable")
            })?;
        }

        for output in &outputs {
            if !rules.iter().any(|r| r.consequent().variable == output.name()) {
                warn!(output = output.name(), "no rule targets this output; it will always be undetermined");
            }
        }

        Ok(Self {
            name,
            inputs,
            outputs,
            rules,
        })
    }

    /// Build from a parsed definition
    pub fn from_definition(def: &ModelDefinition) -> DpiResult<Self> {
        let inputs = def
            .inputs
            .iter()
            .map(build_variable)
            .collect::<DpiResult<Vec<_>>>()?;
        let outputs = def
            .outputs
            .iter()
            .map(build_variable)
            .collect::<DpiResult<Vec<_>>>()?;

        let mut rules = Vec::with_capacity(def.rules.len());
        for rd in &def.rules {
            let rule = Rule::parse(rd.id, &rd.rule).map_err(|e| {
                DpiError::new(
                    ErrorCode::InvalidRuleSyntax,
                    format!("rule {} could not be parsed", rd.id),
                )
                .with_cause(e.to_string())
                .with_context("rule", rd.id.to_string())
            })?;
            let rule = match rd.weight {
                Some(w) => rule.with_weight(w),
                None => rule,
            };
            debug!(id = rd.id, text = %rule, "parsed rule");
            rules.push(rule);
        }

        let name = def.name.clone().unwrap_or_else(|| "model".to_string());
        let registry = Self::new(name, inputs, outputs, rules)?;
        info!(
            model = %registry.name,
            inputs = registry.inputs.len(),
            outputs = registry.outputs.len(),
            rules = registry.rules.len(),
            "model loaded"
        );
        Ok(registry)
    }

    /// The embedded productivity model
    pub fn builtin() -> DpiResult<Self> {
        Self::from_definition(&ModelDefinition::from_toml_str(BUILTIN_MODEL)?)
    }

    /// Load a model file, or the built-in model when no path is given
    pub fn load(path: Option<&Path>) -> DpiResult<Self> {
        match path {
            Some(path) => {
                info!(path = %path.display(), "loading model file");
                Self::from_definition(&ModelDefinition::from_file(path)?)
            }
            None => Self::builtin(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn inputs(&self) -> &[LinguisticVariable] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[LinguisticVariable] {
        &self.outputs
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn input(&self, name: &str) -> Option<&LinguisticVariable> {
        self.inputs.iter().find(|v| v.name() == name)
    }

    pub fn output(&self, name: &str) -> Option<&LinguisticVariable> {
        self.outputs.iter().find(|v| v.name() == name)
    }

    pub fn rule(&self, id: u32) -> Option<&Rule> {
        self.rules.iter().find(|r| r.id() == id)
    }

    pub fn fuzzifier(&self) -> Fuzzifier<'_> {
        Fuzzifier::new(&self.inputs)
    }

    pub fn engine(&self, implication: Implication) -> InferenceEngine<'_> {
        InferenceEngine::new(&self.rules, &self.outputs).with_implication(implication)
    }
}

fn check_reference(vars: &[LinguisticVariable], prop: &Proposition) -> DpiResult<()> {
    let var = vars
        .iter()
        .find(|v| v.name() == prop.variable)
        .ok_or_else(|| DpiError::unknown_reference(&prop.variable, None))?;
    if !var.has_term(&prop.term) {
        return Err(DpiError::unknown_reference(&prop.variable, Some(&prop.term)));
    }
    Ok(())
}

fn build_variable(def: &VariableDefinition) -> DpiResult<LinguisticVariable> {
    let [min, max] = def.universe;
    let universe = Universe::new(min, max).map_err(|e| e.with_context("variable", def.name.as_str()))?;
    let sets = def
        .sets
        .iter()
        .map(|s| FuzzySet::from_pairs(s.term.as_str(), &s.points))
        .collect::<DpiResult<Vec<_>>>()
        .map_err(|e| e.with_context("variable", def.name.as_str()))?;
    let concept = def.concept.clone().unwrap_or_else(|| def.name.clone());
    LinguisticVariable::new(def.name.as_str(), concept, universe, sets)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small(rules: &str) -> String {
        format!(
            r#"
[[inputs]]
name = "A"
universe = [0, 10]
sets = [
    {{ term = "x", points = [[0, 1], [10, 0]] }},
    {{ term = "y", points = [[0, 0], [10, 1]] }},
]

[[outputs]]
name = "Out"
universe = [0, 1]
sets = [{{ term = "z", points = [[0, 0], [1, 1]] }}]

{}
"#,
            rules
        )
    }

    fn load(text: &str) -> DpiResult<Registry> {
        Registry::from_definition(&ModelDefinition::from_toml_str(text)?)
    }

    #[test]
    fn test_builtin_model() {
        let reg = Registry::builtin().unwrap();
        let inputs: Vec<&str> = reg.inputs().iter().map(|v| v.name()).collect();
        assert_eq!(inputs, vec!["FocusTime", "Distractions", "SleepQuality", "Workload"]);
        assert_eq!(reg.outputs()[0].name(), "Productivity");
        assert_eq!(reg.rules().len(), 25);
        assert_eq!(reg.name(), "dpi");
        assert_eq!(
            reg.rule(1).unwrap().text(),
            "IF FocusTime IS High AND Distractions IS Low AND SleepQuality IS Excellent THEN Productivity IS Excellent"
        );
        assert_eq!(reg.rule(18).unwrap().text(), "IF SleepQuality IS Poor THEN Productivity IS Low");
    }

    #[test]
    fn test_small_model_loads() {
        let reg = load(&small("[[rules]]\nid = 1\nrule = \"IF A IS x OR NOT A IS y THEN Out IS z\"")).unwrap();
        assert_eq!(reg.rules().len(), 1);
        assert_eq!(reg.input("A").unwrap().universe().as_array(), [0.0, 10.0]);
        assert!(reg.output("A").is_none());
        assert_eq!(reg.name(), "model");
    }

    #[test]
    fn test_unknown_term() {
        let err = load(&small("[[rules]]\nid = 1\nrule = \"IF A IS huge THEN Out IS z\"")).unwrap_err();
        assert_eq!(err.code, ErrorCode::UnknownReference);
        assert_eq!(err.context_field("rule"), Some("1"));
    }

    #[test]
    fn test_unknown_variable() {
        let err = load(&small("[[rules]]\nid = 1\nrule = \"IF B IS x THEN Out IS z\"")).unwrap_err();
        assert_eq!(err.code, ErrorCode::UnknownReference);
        assert_eq!(err.context_field("variable"), Some("B"));
    }

    #[test]
    fn test_consequent_must_be_output() {
        let err = load(&small("[[rules]]\nid = 1\nrule = \"IF A IS x THEN A IS y\"")).unwrap_err();
        assert_eq!(err.code, ErrorCode::UnknownReference);
        assert!(err.hint.is_some());
    }

    #[test]
    fn test_antecedent_must_be_input() {
        let err = load(&small("[[rules]]\nid = 1\nrule = \"IF Out IS z THEN Out IS z\"")).unwrap_err();
        assert_eq!(err.code, ErrorCode::UnknownReference);
    }

    #[test]
    fn test_duplicate_rule_id() {
        let rules = "[[rules]]\nid = 4\nrule = \"IF A IS x THEN Out IS z\"\n\n[[rules]]\nid = 4\nrule = \"IF A IS y THEN Out IS z\"";
        let err = load(&small(rules)).unwrap_err();
        assert_eq!(err.code, ErrorCode::DuplicateRuleId);
    }

    #[test]
    fn test_bad_weight() {
        let rules = "[[rules]]\nid = 1\nrule = \"IF A IS x THEN Out IS z\"\nweight = 1.5";
        let err = load(&small(rules)).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidWeight);
    }

    #[test]
    fn test_syntax_error_names_rule() {
        let err = load(&small("[[rules]]\nid = 9\nrule = \"IF A x THEN Out IS z\"")).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidRuleSyntax);
        assert_eq!(err.context_field("rule"), Some("9"));
        assert!(err.to_string().contains("position"));
    }

    #[test]
    fn test_empty_rule_base() {
        let reg = load(&small("[[rules]]\nid = 1\nrule = \"IF A IS x THEN Out IS z\"")).unwrap();
        let err = Registry::new("m", reg.inputs().to_vec(), reg.outputs().to_vec(), vec![])
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::EmptyModel);
    }

    #[test]
    fn test_discontinuous_set_rejected() {
        let text = small("[[rules]]\nid = 1\nrule = \"IF A IS x THEN Out IS z\"")
            .replace("[[0, 1], [10, 0]]", "[[0, 1], [5, 1], [5, 0], [10, 0]]");
        let err = load(&text).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidFuzzySet);
        assert_eq!(err.context_field("variable"), Some("A"));
        assert_eq!(err.context_field("term"), Some("x"));
    }

    #[test]
    fn test_duplicate_term_rejected() {
        let text = small("[[rules]]\nid = 1\nrule = \"IF A IS x THEN Out IS z\"")
            .replace("term = \"y\"", "term = \"x\"");
        let err = load(&text).unwrap_err();
        assert_eq!(err.code, ErrorCode::DuplicateTerm);
    }

    #[test]
    fn test_duplicate_variable_across_inputs_and_outputs() {
        let text = small("[[rules]]\nid = 1\nrule = \"IF A IS x THEN Out IS z\"")
            .replace("name = \"Out\"", "name = \"A\"");
        let err = load(&text).unwrap_err();
        assert_eq!(err.code, ErrorCode::DuplicateVariable);
    }

    #[test]
    fn test_bad_universe_rejected() {
        let text = small("[[rules]]\nid = 1\nrule = \"IF A IS x THEN Out IS z\"")
            .replace("universe = [0, 10]", "universe = [10, 0]");
        let err = load(&text).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidUniverse);
    }
}
