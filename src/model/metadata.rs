//! Variable and rule definitions for client-side display

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::DpiResult;
use crate::fuzzy::{FuzzySet, LinguisticVariable, Universe};
use super::registry::Registry;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuzzySetInfo {
    pub term: String,
    pub points: Vec<[f64; 2]>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableInfo {
    pub concept: String,
    pub universe: [f64; 2],
    pub sets: Vec<FuzzySetInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleInfo {
    pub id: u32,
    pub text: String,
}

/// Body of `GET /metadata`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuzzyMetadata {
    pub input_variables: IndexMap<String, VariableInfo>,
    pub output_variables: IndexMap<String, VariableInfo>,
    pub rules: Vec<RuleInfo>,
}

impl From<&LinguisticVariable> for VariableInfo {
    fn from(var: &LinguisticVariable) -> Self {
        Self {
            concept: var.concept().to_string(),
            universe: var.universe().as_array(),
            sets: var
                .sets()
                .iter()
                .map(|set| FuzzySetInfo {
                    term: set.term().to_string(),
                    points: set.points().iter().map(|&p| p.into()).collect(),
                })
                .collect(),
        }
    }
}

impl VariableInfo {
    /// Rebuild the variable this entry describes
    pub fn to_variable(&self, name: &str) -> DpiResult<LinguisticVariable> {
        let [min, max] = self.universe;
        let sets = self
            .sets
            .iter()
            .map(|s| FuzzySet::from_pairs(s.term.as_str(), &s.points))
            .collect::<DpiResult<Vec<_>>>()?;
        LinguisticVariable::new(name, self.concept.as_str(), Universe::new(min, max)?, sets)
    }
}

impl Registry {
    /// Export every variable and the canonical rule texts. Runs no inference.
    pub fn metadata(&self) -> FuzzyMetadata {
        let describe = |vars: &[LinguisticVariable]| {
            vars.iter()
                .map(|v| (v.name().to_string(), VariableInfo::from(v)))
                .collect::<IndexMap<_, _>>()
        };

        FuzzyMetadata {
            input_variables: describe(self.inputs()),
            output_variables: describe(self.outputs()),
            rules: self
                .rules()
                .iter()
                .map(|r| RuleInfo {
                    id: r.id(),
                    text: r.text(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_metadata_shape() {
        let meta = Registry::builtin().unwrap().metadata();
        let inputs: Vec<&str> = meta.input_variables.keys().map(String::as_str).collect();
        assert_eq!(inputs, vec!["FocusTime", "Distractions", "SleepQuality", "Workload"]);
        assert_eq!(meta.output_variables.len(), 1);

        let focus = &meta.input_variables["FocusTime"];
        assert_eq!(focus.concept, "Focus Time");
        assert_eq!(focus.universe, [0.0, 24.0]);
        assert_eq!(focus.sets[0].term, "Low");
        assert_eq!(focus.sets[0].points, vec![[0.0, 1.0], [2.0, 1.0], [3.0, 0.0]]);

        assert_eq!(meta.rules.len(), 25);
        assert_eq!(meta.rules[24].id, 25);
        assert_eq!(
            meta.rules[24].text,
            "IF FocusTime IS Medium AND Distractions IS Low AND Workload IS Balanced THEN Productivity IS Good"
        );
    }

    #[test]
    fn test_metadata_json_round_trip() {
        let reg = Registry::builtin().unwrap();
        let meta = reg.metadata();
        let json = serde_json::to_string(&meta).unwrap();
        let parsed: FuzzyMetadata = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, meta);

        for var in reg.inputs().iter().chain(reg.outputs()) {
            let info = parsed
                .input_variables
                .get(var.name())
                .or_else(|| parsed.output_variables.get(var.name()))
                .unwrap();
            let rebuilt = info.to_variable(var.name()).unwrap();
            assert_eq!(&rebuilt, var);
        }
    }

    #[test]
    fn test_json_field_names() {
        let meta = Registry::builtin().unwrap().metadata();
        let value = serde_json::to_value(&meta).unwrap();
        assert!(value["input_variables"]["Workload"]["sets"][1]["points"].is_array());
        assert_eq!(value["output_variables"]["Productivity"]["universe"][1], 100.0);
        assert_eq!(value["rules"][0]["id"], 1);
    }
}
