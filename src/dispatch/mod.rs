//! Prompt dispatch core.
//!
//! Pipeline for one prompt: matcher answer -> [`envelope::unwrap`] ->
//! [`resolve`] -> [`Dispatcher::invoke`] -> [`normalize::normalize`].
//! With [`Mode::SkipExecution`] the pipeline stops after `resolve`.

pub mod alias;
pub mod envelope;
pub mod error;
pub mod matcher;
pub mod normalize;

use std::collections::HashMap;
use std::fmt;

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::transport::Invoker;
use alias::{Alias, Domain, Operation};
use envelope::MatchResult;
pub use error::DispatchError;
use normalize::NormalizedResult;

/// Operation an invocation targets: from the alias table, or passed through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationRef {
    Known(Operation),
    Unresolved(String),
}

impl OperationRef {
    pub fn as_str(&self) -> &str {
        match self {
            OperationRef::Known(op) => op.as_str(),
            OperationRef::Unresolved(name) => name,
        }
    }

    pub fn known(&self) -> Option<Operation> {
        match self {
            OperationRef::Known(op) => Some(*op),
            OperationRef::Unresolved(_) => None,
        }
    }
}

impl fmt::Display for OperationRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved backend call.
#[derive(Debug, Clone, PartialEq)]
pub struct InvocationRequest {
    pub operation: OperationRef,
    pub parameters: Map<String, Value>,
    /// Alias the operation was resolved through, if any.
    pub alias: Option<Alias>,
}

impl InvocationRequest {
    pub fn to_json(&self) -> Value {
        serde_json::json!({
            "operation": self.operation.as_str(),
            "parameters": self.parameters,
            "alias": self.alias.map(|a| a.function_id()),
        })
    }
}

/// Map a match onto a concrete operation.
///
/// Known names get their canonical operation with the operation's defaults
/// merged under the caller's parameters. Unknown names pass through as-is.
pub fn resolve(matched: &MatchResult) -> InvocationRequest {
    let Some(alias) = Alias::lookup(&matched.function_id, &matched.title) else {
        debug!(function_id = %matched.function_id, "no alias; passing through");
        return InvocationRequest {
            operation: OperationRef::Unresolved(matched.function_id.clone()),
            parameters: matched.parameters.clone(),
            alias: None,
        };
    };

    let operation = alias.rule().operation_for(&matched.parameters);
    let mut parameters: Map<String, Value> = operation
        .defaults()
        .iter()
        .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
        .collect();
    for (k, v) in &matched.parameters {
        parameters.insert(k.clone(), v.clone());
    }
    // The goals backend compares `action` exactly.
    if let Some(Value::String(action)) = parameters.get_mut("action")
        && let Some(canonical) = operation.goal_action()
        && Operation::from_goal_action(action.as_str()) == Some(operation)
    {
        *action = canonical.to_string();
    }

    debug!(
        function_id = %matched.function_id,
        alias = alias.function_id(),
        operation = operation.as_str(),
        "resolved alias"
    );

    InvocationRequest {
        operation: OperationRef::Known(operation),
        parameters,
        alias: Some(alias),
    }
}

/// Whether to call the backend after resolving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Execute,
    SkipExecution,
}

/// Unwrapped match plus the call it resolved to.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    pub matched: MatchResult,
    pub request: InvocationRequest,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Planned(Plan),
    Executed {
        plan: Plan,
        raw: Value,
        result: NormalizedResult,
    },
}

impl Outcome {
    pub fn plan(&self) -> &Plan {
        match self {
            Outcome::Planned(plan) => plan,
            Outcome::Executed { plan, .. } => plan,
        }
    }
}

/// Backends by domain, plus an optional catch-all for unresolved operations.
#[derive(Default)]
pub struct BackendRoutes {
    domains: HashMap<Domain, Box<dyn Invoker>>,
    fallback: Option<Box<dyn Invoker>>,
}

impl BackendRoutes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_domain(mut self, domain: Domain, invoker: Box<dyn Invoker>) -> Self {
        self.domains.insert(domain, invoker);
        self
    }

    pub fn with_fallback(mut self, invoker: Box<dyn Invoker>) -> Self {
        self.fallback = Some(invoker);
        self
    }

    /// Number of connected backends, fallback included.
    pub fn count(&self) -> usize {
        self.domains.len() + usize::from(self.fallback.is_some())
    }
}

pub struct Dispatcher {
    routes: BackendRoutes,
}

impl Dispatcher {
    pub fn new(routes: BackendRoutes) -> Self {
        Self { routes }
    }

    /// Unwrap and resolve a raw matcher answer without calling anything.
    pub fn plan(&self, raw: Value) -> Result<Plan, DispatchError> {
        let matched = envelope::unwrap(raw)?;
        if matched.is_no_match() {
            return Err(DispatchError::NoMatch);
        }
        info!(function_id = %matched.function_id, title = %matched.title, "match received");
        let request = resolve(&matched);
        Ok(Plan { matched, request })
    }

    /// Call the backend for `request`. `user_id`, when given, is sent along
    /// with the parameters and replaces any `user_id` the matcher extracted.
    pub fn invoke(
        &self,
        request: &InvocationRequest,
        user_id: Option<&str>,
    ) -> Result<Value, DispatchError> {
        let mut payload = request.parameters.clone();
        if let Some(uid) = user_id {
            payload.insert("user_id".to_string(), Value::String(uid.to_string()));
        }

        let invoker = match &request.operation {
            OperationRef::Known(op) => {
                let domain = op.domain();
                self.routes.domains.get(&domain).ok_or_else(|| {
                    DispatchError::unavailable(
                        domain.as_str(),
                        "no backend configured for this domain",
                    )
                })?
            }
            OperationRef::Unresolved(name) => {
                let Some(fallback) = &self.routes.fallback else {
                    return Err(DispatchError::unknown_function(
                        name.clone(),
                        "no alias matches and no fallback backend is configured",
                    ));
                };
                payload.insert("function_id".to_string(), Value::String(name.clone()));
                fallback
            }
        };

        info!(
            operation = %request.operation,
            endpoint = invoker.target(),
            "invoking backend"
        );
        let response = envelope::open_body(invoker.invoke(&Value::Object(payload))?);

        if let Some(message) = explicit_error(&response) {
            warn!(operation = %request.operation, %message, "backend reported an error");
            return Err(match &request.operation {
                OperationRef::Known(op) => DispatchError::backend(op.as_str(), message),
                OperationRef::Unresolved(name) => {
                    DispatchError::unknown_function(name.clone(), message)
                }
            });
        }
        Ok(response)
    }

    /// Run the whole pipeline for one matcher answer.
    pub fn run(
        &self,
        raw: Value,
        user_id: Option<&str>,
        mode: Mode,
    ) -> Result<Outcome, DispatchError> {
        let plan = self.plan(raw)?;
        if mode == Mode::SkipExecution {
            return Ok(Outcome::Planned(plan));
        }
        let raw = self.invoke(&plan.request, user_id)?;
        let result = normalize::normalize(&plan.request.operation, &raw);
        Ok(Outcome::Executed { plan, raw, result })
    }
}

fn explicit_error(response: &Value) -> Option<String> {
    ["errorMessage", "error"]
        .iter()
        .find_map(|k| response.get(*k).filter(|v| !v.is_null()))
        .map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
}
