//! Tool call supports.

mod error;
mod executor;

use std::pin::Pin;

use research_agent_model::ModelTool;
use serde::de::DeserializeOwned;
use serde_json::Value;

pub use error::{Error, ErrorKind};
pub(crate) use executor::Executor;

/// The result of a tool call.
pub type ToolResult = Result<String, Error>;

/// A tool that can be called by the model.
///
/// Implementations of this trait should be stateless, and may not maintain any
/// internal state.
///
/// The tool can be context-aware, meaning it can access additional information
/// about the current execution context, such as a client for a remote service.
/// To do this, make the context an immutable state of the tool, which can be
/// set during initialization, and clone it when executing.
pub trait Tool: Send + Sync + 'static {
    /// The type of input that the tool accepts.
    type Input: DeserializeOwned;

    /// Returns the name of the tool.
    fn name(&self) -> &str;

    /// Returns the description of the tool.
    fn description(&self) -> &str;

    /// Returns the parameter schema of the tool.
    fn parameter_schema(&self) -> &Value;

    /// Executes the tool with the given input.
    ///
    /// This method must return a future that is fully independent of `self`,
    /// and the future should be cancellation safe.
    fn execute(
        &self,
        input: Self::Input,
    ) -> impl Future<Output = ToolResult> + Send + 'static;
}

pub(crate) type BoxedToolFuture = Pin<Box<dyn Future<Output = ToolResult> + Send>>;

pub(crate) trait ToolObject: Send + Sync + 'static {
    fn name(&self) -> &str;

    fn definition(&self) -> ModelTool;

    fn execute(&self, arguments: Value) -> BoxedToolFuture;
}

pub(crate) struct AnyTool<T: Tool>(pub T);

impl<T: Tool> ToolObject for AnyTool<T> {
    #[inline]
    fn name(&self) -> &str {
        self.0.name()
    }

    fn definition(&self) -> ModelTool {
        ModelTool {
            name: self.0.name().to_owned(),
            description: self.0.description().to_owned(),
            parameters: self.0.parameter_schema().clone(),
        }
    }

    fn execute(&self, arguments: Value) -> BoxedToolFuture {
        let input: T::Input = match serde_json::from_value(arguments) {
            Ok(input) => input,
            Err(err) => {
                let reason = format!("{err}");
                return Box::pin(std::future::ready(ToolResult::Err(
                    Error::invalid_input().with_reason(reason),
                )));
            }
        };
        Box::pin(self.0.execute(input))
    }
}
