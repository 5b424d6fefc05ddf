//! Fuzzy rules: antecedent trees, consequents and canonical rule text

use std::fmt;

use indexmap::IndexMap;

use super::membership::FuzzyValue;
use super::parse::{parse_rule, RuleSyntaxError};
use super::variable::TermDegrees;

/// Fuzzified inputs: variable -> term -> degree
pub type Fuzzification = IndexMap<String, TermDegrees>;

/// A `Variable IS Term` reference
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Proposition {
    pub variable: String,
    pub term: String,
}

impl Proposition {
    pub fn new(variable: impl Into<String>, term: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
            term: term.into(),
        }
    }

    /// Degree of this proposition in a fuzzification; absent references read as 0
    pub fn degree(&self, fuzzified: &Fuzzification) -> FuzzyValue {
        fuzzified
            .get(&self.variable)
            .and_then(|terms| terms.get(&self.term))
            .copied()
            .unwrap_or_default()
    }
}

impl fmt::Display for Proposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} IS {}", self.variable, self.term)
    }
}

/// Rule condition as a boolean tree over propositions
#[derive(Debug, Clone, PartialEq)]
pub enum Antecedent {
    Is(Proposition),
    Not(Box<Antecedent>),
    And(Vec<Antecedent>),
    Or(Vec<Antecedent>),
}

impl Antecedent {
    pub fn is(variable: impl Into<String>, term: impl Into<String>) -> Self {
        Antecedent::Is(Proposition::new(variable, term))
    }

    /// Conjunction, flattening nested ANDs
    pub fn and(self, other: Antecedent) -> Self {
        match self {
            Antecedent::And(mut items) => {
                items.push(other);
                Antecedent::And(items)
            }
            first => Antecedent::And(vec![first, other]),
        }
    }

    /// Disjunction, flattening nested ORs
    pub fn or(self, other: Antecedent) -> Self {
        match self {
            Antecedent::Or(mut items) => {
                items.push(other);
                Antecedent::Or(items)
            }
            first => Antecedent::Or(vec![first, other]),
        }
    }

    pub fn negate(self) -> Self {
        Antecedent::Not(Box::new(self))
    }

    /// Mamdani evaluation: AND = min, OR = max, NOT = 1 - x
    pub fn evaluate(&self, fuzzified: &Fuzzification) -> FuzzyValue {
        match self {
            Antecedent::Is(prop) => prop.degree(fuzzified),
            Antecedent::Not(inner) => inner.evaluate(fuzzified).not(),
            Antecedent::And(items) => items
                .iter()
                .map(|a| a.evaluate(fuzzified))
                .fold(FuzzyValue::ONE, |acc, d| acc.and(&d)),
            Antecedent::Or(items) => items
                .iter()
                .map(|a| a.evaluate(fuzzified))
                .fold(FuzzyValue::ZERO, |acc, d| acc.or(&d)),
        }
    }

    /// Every proposition in the tree, left to right
    pub fn propositions(&self) -> Vec<&Proposition> {
        let mut out = Vec::new();
        self.collect_propositions(&mut out);
        out
    }

    fn collect_propositions<'a>(&'a self, out: &mut Vec<&'a Proposition>) {
        match self {
            Antecedent::Is(prop) => out.push(prop),
            Antecedent::Not(inner) => inner.collect_propositions(out),
            Antecedent::And(items) | Antecedent::Or(items) => {
                for item in items {
                    item.collect_propositions(out);
                }
            }
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            Antecedent::Or(_) => 1,
            Antecedent::And(_) => 2,
            Antecedent::Not(_) | Antecedent::Is(_) => 3,
        }
    }

    fn write_operand(&self, f: &mut fmt::Formatter<'_>, min_precedence: u8) -> fmt::Result {
        if self.precedence() < min_precedence {
            write!(f, "({})", self)
        } else {
            write!(f, "{}", self)
        }
    }
}

impl fmt::Display for Antecedent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Antecedent::Is(prop) => write!(f, "{}", prop),
            Antecedent::Not(inner) => write!(f, "NOT ({})", inner),
            Antecedent::And(items) | Antecedent::Or(items) => {
                let (sep, prec) = if matches!(self, Antecedent::And(_)) {
                    (" AND ", 2)
                } else {
                    (" OR ", 1)
                };
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(sep)?;
                    }
                    item.write_operand(f, prec)?;
                }
                Ok(())
            }
        }
    }
}

/// An `IF antecedent THEN consequent` rule with an optional weight
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    id: u32,
    antecedent: Antecedent,
    consequent: Proposition,
    weight: f64,
}

impl Rule {
    pub fn new(id: u32, antecedent: Antecedent, consequent: Proposition) -> Self {
        Self {
            id,
            antecedent,
            consequent,
            weight: 1.0,
        }
    }

    /// Parse rule text such as `IF (A IS x) AND (B IS y) THEN (C IS z)`
    pub fn parse(id: u32, text: &str) -> Result<Self, RuleSyntaxError> {
        let (antecedent, consequent) = parse_rule(text)?;
        Ok(Self::new(id, antecedent, consequent))
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn antecedent(&self) -> &Antecedent {
        &self.antecedent
    }

    pub fn consequent(&self) -> &Proposition {
        &self.consequent
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// Antecedent degree scaled by the rule weight
    pub fn firing_strength(&self, fuzzified: &Fuzzification) -> FuzzyValue {
        FuzzyValue::new(self.antecedent.evaluate(fuzzified).value() * self.weight)
    }

    /// Canonical rule text
    pub fn text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IF {} THEN {}", self.antecedent, self.consequent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fuzzified(entries: &[(&str, &str, f64)]) -> Fuzzification {
        let mut map = Fuzzification::new();
        for (var, term, degree) in entries {
            map.entry(var.to_string())
                .or_default()
                .insert(term.to_string(), FuzzyValue::new(*degree));
        }
        map
    }

    #[test]
    fn test_and_or_not() {
        let f = fuzzified(&[("A", "x", 0.7), ("B", "y", 0.2)]);
        let and = Antecedent::is("A", "x").and(Antecedent::is("B", "y"));
        let or = Antecedent::is("A", "x").or(Antecedent::is("B", "y"));
        let not = Antecedent::is("A", "x").negate();

        assert!((and.evaluate(&f).value() - 0.2).abs() < 1e-12);
        assert!((or.evaluate(&f).value() - 0.7).abs() < 1e-12);
        assert!((not.evaluate(&f).value() - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_and_never_exceeds_min_or_never_below_max() {
        let grid = [0.0, 0.1, 0.25, 0.5, 0.75, 0.9, 1.0];
        for &a in &grid {
            for &b in &grid {
                let f = fuzzified(&[("A", "x", a), ("B", "y", b)]);
                let and = Antecedent::is("A", "x").and(Antecedent::is("B", "y"));
                let or = Antecedent::is("A", "x").or(Antecedent::is("B", "y"));
                assert!(and.evaluate(&f).value() <= a.min(b));
                assert!(or.evaluate(&f).value() >= a.max(b));
            }
        }
    }

    #[test]
    fn test_missing_reference_reads_zero() {
        let f = fuzzified(&[("A", "x", 1.0)]);
        assert_eq!(Antecedent::is("A", "nope").evaluate(&f).value(), 0.0);
        assert_eq!(Antecedent::is("Q", "x").evaluate(&f).value(), 0.0);
    }

    #[test]
    fn test_weight_scales_strength() {
        let f = fuzzified(&[("A", "x", 0.8)]);
        let rule = Rule::new(1, Antecedent::is("A", "x"), Proposition::new("Out", "High"))
            .with_weight(0.5);
        assert!((rule.firing_strength(&f).value() - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_render_plain_conjunction() {
        let rule = Rule::new(
            1,
            Antecedent::is("FocusTime", "High").and(Antecedent::is("Distractions", "Low")),
            Proposition::new("Productivity", "Excellent"),
        );
        assert_eq!(
            rule.text(),
            "IF FocusTime IS High AND Distractions IS Low THEN Productivity IS Excellent"
        );
    }

    #[test]
    fn test_render_parenthesises_by_precedence() {
        let a = Antecedent::is("A", "x");
        let b = Antecedent::is("B", "y");
        let c = Antecedent::is("C", "z");

        let or_in_and = a.clone().and(b.clone().or(c.clone()));
        assert_eq!(or_in_and.to_string(), "A IS x AND (B IS y OR C IS z)");

        let and_in_or = a.clone().and(b.clone()).or(c.clone());
        assert_eq!(and_in_or.to_string(), "A IS x AND B IS y OR C IS z");

        let not = a.and(b).negate();
        assert_eq!(not.to_string(), "NOT (A IS x AND B IS y)");
    }

    #[test]
    fn test_propositions_in_order() {
        let tree = Antecedent::is("A", "x")
            .and(Antecedent::is("B", "y").negate())
            .or(Antecedent::is("C", "z"));
        let props: Vec<String> = tree.propositions().iter().map(|p| p.to_string()).collect();
        assert_eq!(props, vec!["A IS x", "B IS y", "C IS z"]);
    }

    #[test]
    fn test_parse_and_render_round_trip() {
        let text = "IF (FocusTime IS Low) AND (NOT (Workload IS Balanced) OR SleepQuality IS Poor) THEN (Productivity IS Low)";
        let rule = Rule::parse(7, text).unwrap();
        let rendered = rule.text();
        assert_eq!(
            rendered,
            "IF FocusTime IS Low AND (NOT (Workload IS Balanced) OR SleepQuality IS Poor) THEN Productivity IS Low"
        );
        assert_eq!(Rule::parse(7, &rendered).unwrap(), rule);
    }
}
