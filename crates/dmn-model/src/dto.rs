//! Parsed-model DTO — the contract with the DMN XML deserialiser.
//!
//! The deserialiser lives outside this workspace; it hands over ids, names,
//! information requirements, and unparsed expression/test text. The
//! [`DefinitionFactory`](crate::DefinitionFactory) turns this into an
//! immutable [`Definition`](crate::Definition).

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ParsedModel {
    /// Opaque DMN version marker, carried through untouched.
    #[serde(default)]
    pub dmn_version: Option<String>,
    #[serde(default)]
    pub inputs: Vec<ParsedInputData>,
    #[serde(default)]
    pub decisions: Vec<ParsedDecision>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParsedInputData {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub type_ref: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParsedDecision {
    pub id: String,
    pub name: String,
    /// Ids of required input data (information requirements).
    #[serde(default)]
    pub required_inputs: Vec<String>,
    /// Ids of required decisions (direct, not transitive).
    #[serde(default)]
    pub required_decisions: Vec<String>,
    pub body: ParsedDecisionBody,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParsedDecisionBody {
    Expression {
        expression: String,
        output_variable: String,
        #[serde(default)]
        type_ref: Option<String>,
    },
    Table(ParsedDecisionTable),
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParsedDecisionTable {
    pub hit_policy: String,
    #[serde(default)]
    pub aggregation: Option<String>,
    pub inputs: Vec<ParsedTableInput>,
    pub outputs: Vec<ParsedTableOutput>,
    pub rules: Vec<ParsedRule>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParsedTableInput {
    #[serde(default)]
    pub label: Option<String>,
    pub expression: String,
    #[serde(default)]
    pub type_ref: Option<String>,
    #[serde(default)]
    pub allowed_values: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParsedTableOutput {
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub type_ref: Option<String>,
    #[serde(default)]
    pub allowed_values: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParsedRule {
    #[serde(default)]
    pub name: Option<String>,
    /// Per-input unary-test text, aligned with the table's inputs.
    pub input_entries: Vec<String>,
    /// Per-output expression text, aligned with the table's outputs.
    pub output_entries: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialises_a_table_model() {
        let json = r#"{
            "dmn_version": "1.3",
            "inputs": [{"id": "i1", "name": "CS Score"}],
            "decisions": [{
                "id": "d1",
                "name": "Rating",
                "required_inputs": ["i1"],
                "body": {
                    "table": {
                        "hit_policy": "UNIQUE",
                        "inputs": [{"expression": "CS_Score"}],
                        "outputs": [{"name": "rating"}],
                        "rules": [
                            {"input_entries": ["< 50"], "output_entries": ["\"poor\""]},
                            {"input_entries": [">= 50"], "output_entries": ["\"good\""]}
                        ]
                    }
                }
            }]
        }"#;
        let model: ParsedModel = serde_json::from_str(json).unwrap();
        assert_eq!(model.dmn_version.as_deref(), Some("1.3"));
        assert_eq!(model.inputs.len(), 1);
        let ParsedDecisionBody::Table(table) = &model.decisions[0].body else {
            panic!("expected a table body");
        };
        assert_eq!(table.rules.len(), 2);
        assert!(model.decisions[0].required_decisions.is_empty());
    }

    #[test]
    fn deserialises_an_expression_body() {
        let json = r#"{
            "decisions": [{
                "id": "d1",
                "name": "Double",
                "body": {
                    "expression": {
                        "expression": "x * 2",
                        "output_variable": "doubled"
                    }
                }
            }]
        }"#;
        let model: ParsedModel = serde_json::from_str(json).unwrap();
        assert!(matches!(
            model.decisions[0].body,
            ParsedDecisionBody::Expression { .. }
        ));
    }
}
