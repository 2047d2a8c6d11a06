use std::collections::HashMap;
use std::future::ready;

use futures_util::future::join_all;
use research_agent_model::{ModelTool, ToolCallRequest, ToolCallResult};
use tracing::Instrument;

use crate::tool::{BoxedToolFuture, Error, ToolObject, ToolResult};

/// An executor that handles tool call requests from the model.
///
/// Tools keep the order they were registered in, which is also the order
/// their definitions are presented to the model.
pub struct Executor {
    tools: Vec<Box<dyn ToolObject>>,
    index: HashMap<String, usize>,
}

impl Executor {
    /// Creates an executor, or returns the first duplicated tool name.
    pub fn with_tools(tools: Vec<Box<dyn ToolObject>>) -> Result<Self, String> {
        let mut index = HashMap::with_capacity(tools.len());
        for (idx, tool) in tools.iter().enumerate() {
            if index.insert(tool.name().to_owned(), idx).is_some() {
                return Err(tool.name().to_owned());
            }
        }
        Ok(Self { tools, index })
    }

    #[inline]
    pub fn definitions(&self) -> Vec<ModelTool> {
        self.tools.iter().map(|tool| tool.definition()).collect()
    }

    /// Runs all requested tools concurrently.
    ///
    /// Every request gets exactly one result, in request order. Failures
    /// are reported to the model as text rather than dropped, so it can
    /// correct itself.
    pub fn execute(
        &self,
        requests: Vec<ToolCallRequest>,
    ) -> impl Future<Output = Vec<ToolCallResult>> + Send + 'static {
        let span = debug_span!("tool executor");
        let _enter = span.enter();

        let mut ids = Vec::with_capacity(requests.len());
        let mut futures: Vec<BoxedToolFuture> = Vec::with_capacity(requests.len());
        for req in requests {
            let fut = match self.index.get(&req.name) {
                Some(idx) => {
                    trace!("spawning a tool ({}) with args: {:?}", req.id, req.arguments);
                    self.tools[*idx].execute(req.arguments)
                }
                None => {
                    warn!("tool not found: {}", req.name);
                    let err = Error::not_found()
                        .with_reason(format!("no tool named `{}`", req.name));
                    Box::pin(ready(ToolResult::Err(err)))
                }
            };
            ids.push(req.id);
            futures.push(fut);
        }

        async move {
            let results = join_all(futures).await;
            ids.into_iter()
                .zip(results)
                .map(|(id, result)| {
                    let content = match result {
                        Ok(output) => output,
                        Err(err) => {
                            debug!("tool call {id} failed: {err}");
                            format!("Error: {}", err.reason())
                        }
                    };
                    ToolCallResult { id, content }
                })
                .collect()
        }
        .instrument(span.clone())
    }
}
