//! Execution context: one evaluation session over a shared definition.
//!
//! Owns the variable cells, snapshots, and the context-level AST cache.
//! Input-parameter cells are write-protected from the normal setter and
//! mutated only via [`DmnExecutionContext::set_input_parameter`], which also
//! propagates to aliases when alias resolution is enabled.

use std::collections::HashMap;
use std::sync::Arc;

use dmn_core::{EvalContext, Value};
use dmn_feel::ParseScope;
use dmn_model::{Definition, normalise_variable_name};
use orion_error::prelude::*;
use tracing::debug;
use uuid::Uuid;

use crate::cache::AstCache;
use crate::error::{RuntimeReason, RuntimeResult};
use crate::options::EvaluationOptions;
use crate::result::DecisionResult;
use crate::snapshot::Snapshot;

pub struct DmnExecutionContext {
    definition: Arc<Definition>,
    id: Uuid,
    options: EvaluationOptions,
    variables: HashMap<String, Value>,
    snapshots: Vec<Snapshot>,
    cache: AstCache,
    parse_scope: ParseScope,
}

impl DmnExecutionContext {
    pub fn new(definition: Arc<Definition>, options: EvaluationOptions) -> Self {
        let mut variables = HashMap::new();
        for name in definition.variable_names() {
            variables.insert(name, Value::Null);
        }
        let parse_scope = ParseScope::with_names(definition.feel_names());
        Self {
            definition,
            id: Uuid::new_v4(),
            options,
            variables,
            snapshots: Vec::new(),
            cache: AstCache::new(),
            parse_scope,
        }
    }

    pub fn with_defaults(definition: Arc<Definition>) -> Self {
        Self::new(definition, EvaluationOptions::default())
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn definition(&self) -> &Arc<Definition> {
        &self.definition
    }

    pub fn options(&self) -> &EvaluationOptions {
        &self.options
    }

    pub fn cache(&self) -> &AstCache {
        &self.cache
    }

    pub fn parse_scope(&self) -> &ParseScope {
        &self.parse_scope
    }

    // -----------------------------------------------------------------
    // Variables
    // -----------------------------------------------------------------

    /// Set a model input parameter. The name may be unnormalised; it must
    /// name a declared input. Aliases receive the value too when alias
    /// resolution is enabled.
    pub fn set_input_parameter(&mut self, name: &str, value: Value) -> RuntimeResult<()> {
        let Some(normalised) = normalise_variable_name(name) else {
            return StructError::from(RuntimeReason::InputParameterNotFound)
                .with_detail(format!("'{name}' cannot be normalised"))
                .err();
        };
        if self.definition.input(&normalised).is_none() {
            return StructError::from(RuntimeReason::InputParameterNotFound)
                .with_detail(format!("'{name}' is not an input of the definition"))
                .err();
        }
        if self.options.resolve_aliases {
            let aliases: Vec<String> = self
                .definition
                .aliases_of(&normalised)
                .map(str::to_string)
                .collect();
            for alias in aliases {
                debug!(input = %normalised, %alias, "propagating input to alias");
                self.variables.insert(alias, value.clone());
            }
        }
        self.variables.insert(normalised, value);
        Ok(())
    }

    /// Set a non-input variable. Input-parameter cells are write-protected.
    pub fn set_variable(&mut self, name: &str, value: Value) -> RuntimeResult<()> {
        let Some(normalised) = normalise_variable_name(name) else {
            return StructError::from(RuntimeReason::ProtectedVariable)
                .with_detail(format!("'{name}' cannot be normalised"))
                .err();
        };
        if self.definition.input(&normalised).is_some() {
            return StructError::from(RuntimeReason::ProtectedVariable)
                .with_detail(format!("'{normalised}' is an input parameter"))
                .err();
        }
        self.variables.insert(normalised, value);
        Ok(())
    }

    /// Unchecked write used by the orchestrator for outputs and
    /// table-input variables.
    pub(crate) fn write_variable(&mut self, name: &str, value: Value) {
        self.variables.insert(name.to_string(), value);
    }

    pub fn get_variable(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    pub fn variables(&self) -> &HashMap<String, Value> {
        &self.variables
    }

    /// Clear all non-input variables back to `Null`, drop snapshots, and
    /// purge the context-scoped AST cache. The session can then be reused.
    pub fn reset(&mut self) {
        let input_names: Vec<String> = self
            .definition
            .inputs()
            .iter()
            .map(|i| i.name.clone())
            .collect();
        for (name, value) in self.variables.iter_mut() {
            if !input_names.contains(name) {
                *value = Value::Null;
            }
        }
        self.snapshots.clear();
        self.cache.purge_context();
    }

    // -----------------------------------------------------------------
    // Snapshots
    // -----------------------------------------------------------------

    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    pub(crate) fn reset_snapshots(&mut self) {
        self.snapshots.clear();
    }

    pub(crate) fn take_snapshot(&mut self, decision: Option<String>, result: Option<DecisionResult>) {
        let snapshot = Snapshot {
            index: self.snapshots.len(),
            decision,
            result,
            variables: self.variables.clone(),
        };
        self.snapshots.push(snapshot);
    }

    // -----------------------------------------------------------------
    // FEEL evaluation environment
    // -----------------------------------------------------------------

    /// A fresh FEEL evaluation context over the current variable state.
    /// Variables bind under their normalised names; declared inputs also
    /// bind under their original (possibly multi-word) model names.
    pub fn eval_context(&self) -> EvalContext {
        let env = EvalContext::new();
        for (name, value) in &self.variables {
            env.set_variable(name.clone(), value.clone());
        }
        for input in self.definition.inputs() {
            if input.feel_name != input.name {
                if let Some(value) = self.variables.get(&input.name) {
                    env.set_variable(input.feel_name.clone(), value.clone());
                }
            }
        }
        env
    }
}
