mod definition;
mod dto;
mod error;
mod factory;
mod names;

pub use definition::{
    CollectAggregation, Decision, DecisionBody, DecisionTable, Definition, ExpressionDecision,
    HitPolicy, InputVariable, TableInput, TableOutput, TableRule,
};
pub use dto::{
    ParsedDecision, ParsedDecisionBody, ParsedDecisionTable, ParsedInputData, ParsedModel,
    ParsedRule, ParsedTableInput, ParsedTableOutput,
};
pub use error::{ModelError, ModelResult};
pub use factory::DefinitionFactory;
pub use names::{can_normalise_variable_name, normalise_variable_name};
