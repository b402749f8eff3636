//! Immutable decision-graph definition.
//!
//! Built once by the [`DefinitionFactory`](crate::DefinitionFactory) and
//! safely shared across execution contexts.

use std::collections::{HashMap, HashSet};

use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitPolicy {
    Unique,
    First,
    Priority,
    Any,
    Collect,
    RuleOrder,
    OutputOrder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectAggregation {
    List,
    Sum,
    Min,
    Max,
    Count,
}

/// An input-data variable of the model. `is_input_parameter` cells are
/// write-protected in the execution context.
#[derive(Debug, Clone)]
pub struct InputVariable {
    /// Normalised name (the variable-store key).
    pub name: String,
    /// The original model name, used to seed FEEL parse scopes so
    /// multi-word references resolve.
    pub feel_name: String,
    pub label: Option<String>,
    pub type_ref: Option<String>,
    pub is_input_parameter: bool,
}

#[derive(Debug, Clone)]
pub struct ExpressionDecision {
    pub expression: String,
    /// Normalised output variable name.
    pub output_variable: String,
    pub type_ref: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TableInput {
    pub label: Option<String>,
    /// Unparsed FEEL expression text producing the column's input value.
    pub expression: String,
    /// Normalised variable bound to the evaluated input value.
    pub variable: String,
    pub type_ref: Option<String>,
    pub allowed_values: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct TableOutput {
    pub label: Option<String>,
    /// Normalised output variable name.
    pub variable: String,
    pub type_ref: Option<String>,
    /// Ordered allowed values; position defines output priority (first =
    /// highest) for the Priority and OutputOrder hit policies.
    pub allowed_values: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct TableRule {
    /// 1-based declaration index.
    pub index: usize,
    pub name: Option<String>,
    pub input_entries: Vec<String>,
    pub output_entries: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct DecisionTable {
    pub hit_policy: HitPolicy,
    pub aggregation: Option<CollectAggregation>,
    pub inputs: Vec<TableInput>,
    pub outputs: Vec<TableOutput>,
    pub rules: Vec<TableRule>,
}

#[derive(Debug, Clone)]
pub enum DecisionBody {
    Expression(ExpressionDecision),
    Table(DecisionTable),
}

#[derive(Debug, Clone)]
pub struct Decision {
    pub name: String,
    /// Normalised names of required input variables.
    pub required_inputs: Vec<String>,
    /// Names of directly required decisions, in declared order.
    pub required_decisions: Vec<String>,
    pub body: DecisionBody,
}

#[derive(Debug)]
pub struct Definition {
    id: Uuid,
    dmn_version: Option<String>,
    inputs: Vec<InputVariable>,
    decisions: Vec<Decision>,
    decision_index: HashMap<String, usize>,
    /// input name → alias names appearing in table input expressions.
    aliases: HashMap<String, HashSet<String>>,
}

impl Definition {
    pub(crate) fn new(
        dmn_version: Option<String>,
        inputs: Vec<InputVariable>,
        decisions: Vec<Decision>,
        aliases: HashMap<String, HashSet<String>>,
    ) -> Self {
        let decision_index = decisions
            .iter()
            .enumerate()
            .map(|(i, d)| (d.name.clone(), i))
            .collect();
        Self {
            id: Uuid::new_v4(),
            dmn_version,
            inputs,
            decisions,
            decision_index,
            aliases,
        }
    }

    /// Stable identifier used to scope definition-level AST caches.
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn dmn_version(&self) -> Option<&str> {
        self.dmn_version.as_deref()
    }

    pub fn inputs(&self) -> &[InputVariable] {
        &self.inputs
    }

    pub fn decisions(&self) -> &[Decision] {
        &self.decisions
    }

    pub fn decision(&self, name: &str) -> Option<&Decision> {
        self.decision_index.get(name).map(|&i| &self.decisions[i])
    }

    pub fn input(&self, name: &str) -> Option<&InputVariable> {
        self.inputs.iter().find(|i| i.name == name)
    }

    pub fn aliases_of(&self, input_name: &str) -> impl Iterator<Item = &str> {
        self.aliases
            .get(input_name)
            .into_iter()
            .flat_map(|set| set.iter().map(String::as_str))
    }

    /// Every variable name the execution context must carry: inputs,
    /// aliases, table-input variables, and decision outputs.
    pub fn variable_names(&self) -> HashSet<String> {
        let mut names: HashSet<String> = self.inputs.iter().map(|i| i.name.clone()).collect();
        for set in self.aliases.values() {
            names.extend(set.iter().cloned());
        }
        for decision in &self.decisions {
            match &decision.body {
                DecisionBody::Expression(e) => {
                    names.insert(e.output_variable.clone());
                }
                DecisionBody::Table(t) => {
                    names.extend(t.inputs.iter().map(|i| i.variable.clone()));
                    names.extend(t.outputs.iter().map(|o| o.variable.clone()));
                }
            }
        }
        names
    }

    /// Original (FEEL) names of all model variables, for parse-scope
    /// seeding.
    pub fn feel_names(&self) -> Vec<String> {
        self.inputs.iter().map(|i| i.feel_name.clone()).collect()
    }
}

impl HitPolicy {
    pub fn parse(text: &str) -> Option<HitPolicy> {
        let policy = match text.trim().to_ascii_uppercase().as_str() {
            "U" | "UNIQUE" => HitPolicy::Unique,
            "F" | "FIRST" => HitPolicy::First,
            "P" | "PRIORITY" => HitPolicy::Priority,
            "A" | "ANY" => HitPolicy::Any,
            "C" | "COLLECT" => HitPolicy::Collect,
            "R" | "RULE ORDER" | "RULEORDER" | "RULE_ORDER" => HitPolicy::RuleOrder,
            "O" | "OUTPUT ORDER" | "OUTPUTORDER" | "OUTPUT_ORDER" => HitPolicy::OutputOrder,
            _ => return None,
        };
        Some(policy)
    }
}

impl CollectAggregation {
    pub fn parse(text: &str) -> Option<CollectAggregation> {
        let agg = match text.trim().to_ascii_uppercase().as_str() {
            "LIST" | "" => CollectAggregation::List,
            "SUM" | "+" => CollectAggregation::Sum,
            "MIN" | "<" => CollectAggregation::Min,
            "MAX" | ">" => CollectAggregation::Max,
            "COUNT" | "#" => CollectAggregation::Count,
            _ => return None,
        };
        Some(agg)
    }
}
