//! Step Contract
//!
//! A [`Step`] is a typed unit of pipeline work. It declares an input schema
//! and an output schema and delegates the actual work either to an agent
//! (through [`AgentActivator`]) or to a pure function (through
//! [`FunctionActivator`]).
//!
//! Input must pass [`Step::validate`] before [`Step::execute`] will accept it;
//! the [`ValidatedInput`] token can only be obtained that way, so a delegate is
//! never invoked with input that failed its schema.
//!
//! # Example
//!
//! ```ignore
//! let step = Step::agent(
//!     "primary_source_lookup",
//!     "Look up the primary encyclopedia article",
//!     AgentMode::PrimaryLookup,
//!     Schema::new().required("topic", FieldType::String),
//!     Schema::new().required("documents", FieldType::Array),
//! );
//! let output = step.run(params, &ctx).await?;
//! ```

/// Step registry with the standard pipeline step set.
pub mod registry;
/// Input/output schema declarations.
pub mod schema;

pub use registry::StepRegistry;
pub use schema::{FieldSpec, FieldType, Params, Schema};

use crate::agents::AgentMode;
use crate::processing::FunctionName;
use crate::types::{PipelineError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::timeout;

/// Response returned by every step delegate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DelegateResponse {
    pub success: bool,
    #[serde(default)]
    pub data: Params,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DelegateResponse {
    pub fn ok(data: Params) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: Params::new(),
            error: Some(error.into()),
        }
    }
}

/// Activates an agent in a given mode.
#[async_trait]
pub trait AgentActivator: Send + Sync {
    async fn activate(&self, mode: AgentMode, params: Params) -> Result<DelegateResponse>;
}

/// Calls a named pipeline function.
#[async_trait]
pub trait FunctionActivator: Send + Sync {
    async fn call(&self, function: FunctionName, params: Params) -> Result<DelegateResponse>;
}

/// What a step delegates to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Executor {
    Agent(AgentMode),
    Function(FunctionName),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutorKind {
    Agent,
    Function,
}

impl Executor {
    pub fn kind(&self) -> ExecutorKind {
        match self {
            Executor::Agent(_) => ExecutorKind::Agent,
            Executor::Function(_) => ExecutorKind::Function,
        }
    }
}

/// Input that passed a step's schema. Only [`Step::validate`] creates one.
#[derive(Debug, Clone)]
pub struct ValidatedInput {
    step: String,
    params: Params,
}

impl ValidatedInput {
    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn into_params(self) -> Params {
        self.params
    }
}

/// Delegates and limits available to a step while it executes.
pub struct StepContext<'a> {
    pub agents: &'a dyn AgentActivator,
    pub functions: &'a dyn FunctionActivator,
    pub timeout: Duration,
}

/// Typed, schema-validated unit of pipeline work.
#[derive(Debug, Clone)]
pub struct Step {
    name: String,
    description: String,
    input_schema: Schema,
    output_schema: Schema,
    executor: Executor,
}

impl Step {
    pub fn agent(
        name: &str,
        description: &str,
        mode: AgentMode,
        input_schema: Schema,
        output_schema: Schema,
    ) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            input_schema,
            output_schema,
            executor: Executor::Agent(mode),
        }
    }

    pub fn function(
        name: &str,
        description: &str,
        function: FunctionName,
        input_schema: Schema,
        output_schema: Schema,
    ) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            input_schema,
            output_schema,
            executor: Executor::Function(function),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn input_schema(&self) -> &Schema {
        &self.input_schema
    }

    pub fn output_schema(&self) -> &Schema {
        &self.output_schema
    }

    pub fn executor(&self) -> Executor {
        self.executor
    }

    pub fn executor_kind(&self) -> ExecutorKind {
        self.executor.kind()
    }

    /// Check `input` against the declared input schema.
    pub fn validate(&self, input: Params) -> Result<ValidatedInput> {
        self.input_schema.check(&self.name, &input)?;
        Ok(ValidatedInput {
            step: self.name.clone(),
            params: input,
        })
    }

    /// Run the delegate on validated input and check its output.
    ///
    /// A delegate error, a `success = false` response, or a timeout all
    /// surface as step-level errors; the caller decides whether they are
    /// fatal.
    pub async fn execute(&self, input: ValidatedInput, ctx: &StepContext<'_>) -> Result<Params> {
        if input.step != self.name {
            return Err(PipelineError::InvalidInput(format!(
                "input validated for step '{}' cannot run step '{}'",
                input.step, self.name
            )));
        }

        tracing::debug!(step = %self.name, kind = ?self.executor_kind(), "Executing step");

        let call = async {
            match self.executor {
                Executor::Agent(mode) => ctx.agents.activate(mode, input.params).await,
                Executor::Function(function) => ctx.functions.call(function, input.params).await,
            }
        };

        let response = timeout(ctx.timeout, call)
            .await
            .map_err(|_| PipelineError::Timeout {
                step: self.name.clone(),
                timeout_secs: ctx.timeout.as_secs(),
            })?
            .map_err(|e| self.delegate_error(e))?;

        if !response.success {
            return Err(PipelineError::collaborator(
                &self.name,
                response
                    .error
                    .unwrap_or_else(|| "delegate reported success=false".to_string()),
            ));
        }

        self.output_schema.check(&self.name, &response.data)?;
        Ok(response.data)
    }

    /// Validate then execute.
    pub async fn run(&self, input: Params, ctx: &StepContext<'_>) -> Result<Params> {
        let validated = self.validate(input)?;
        self.execute(validated, ctx).await
    }

    fn delegate_error(&self, err: PipelineError) -> PipelineError {
        match err {
            e @ (PipelineError::Collaborator { .. }
            | PipelineError::Timeout { .. }
            | PipelineError::SchemaValidation { .. }
            | PipelineError::UnknownTag { .. }) => e,
            other => PipelineError::collaborator(&self.name, other.to_string()),
        }
    }
}
