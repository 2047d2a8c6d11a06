use std::future::poll_fn;
use std::pin::{Pin, pin};
use std::sync::Arc;

use research_agent_model::{
    AssistantMessage, ModelFinishReason, ModelProvider, ModelProviderError,
    ModelRequest, ModelResponse, ModelResponseEvent, ToolCallRequest,
};
use tracing::Instrument;

type SendRequestResult =
    Result<ModelClientResponse, Box<dyn ModelProviderError>>;
type BoxedSendRequestFuture =
    Pin<Box<dyn Future<Output = SendRequestResult> + Send>>;
type HandlerFn = Arc<dyn Fn(ModelRequest) -> BoxedSendRequestFuture + Send + Sync>;

/// A wrapper around a model provider that provides a type-erased interface
/// for the other modules.
#[derive(Clone)]
pub struct ModelClient {
    handler_fn: HandlerFn,
}

impl ModelClient {
    #[inline]
    pub fn new<P: ModelProvider + 'static>(provider: P) -> Self {
        // We have to erase the type `P`, since `ModelClient` doesn't have a
        // generic parameter and we don't want it either.
        let handler_fn: HandlerFn = Arc::new(move |req| {
            let fut = provider.send_request(&req);
            Box::pin(
                async move {
                    trace!(
                        "sending a request with {} messages and {} tools",
                        req.messages.len(),
                        req.tools.len()
                    );
                    let resp_or_err = fut.await;
                    collect_response::<P>(resp_or_err).await
                }
                .instrument(trace_span!("model client req")),
            )
        });
        Self { handler_fn }
    }

    /// Sends a request and waits for the whole response.
    ///
    /// # Cancel safety
    ///
    /// This method is cancel safe. The response stops streaming further
    /// events when this operation is cancelled.
    #[inline]
    pub async fn send_request(&self, req: ModelRequest) -> SendRequestResult {
        (self.handler_fn)(req).await
    }
}

/// A completely received response from the model client.
#[derive(Clone, Debug, Default)]
pub struct ModelClientResponse {
    pub content: String,
    /// Tool calls requested by the model.
    pub tool_calls: Vec<ToolCallRequest>,
    /// The reason the model finished generating.
    pub finish_reason: Option<ModelFinishReason>,
}

impl ModelClientResponse {
    #[inline]
    pub fn into_message(self) -> AssistantMessage {
        AssistantMessage {
            content: self.content,
            tool_calls: self.tool_calls,
        }
    }
}

async fn collect_response<P: ModelProvider + 'static>(
    resp_or_err: Result<P::Response, P::Error>,
) -> SendRequestResult {
    let resp = match resp_or_err {
        Ok(resp) => resp,
        Err(err) => {
            error!("got an error: {err:?}");
            return Err(Box::new(err));
        }
    };

    let mut collected = ModelClientResponse::default();
    let mut pinned_resp = pin!(resp);
    loop {
        let event_or_err =
            poll_fn(|cx| pinned_resp.as_mut().poll_next_event(cx)).await;
        let event = match event_or_err {
            Ok(Some(event)) => event,
            Ok(None) => break,
            Err(err) => {
                error!("got an error: {err:?}");
                return Err(Box::new(err));
            }
        };
        trace!("got an event: {event:?}");

        match event {
            ModelResponseEvent::MessageDelta(delta) => {
                collected.content.push_str(&delta);
            }
            ModelResponseEvent::ToolCall(req) => {
                collected.tool_calls.push(req);
            }
            ModelResponseEvent::Completed(reason) => {
                collected.finish_reason = Some(reason);
            }
        }
    }

    trace!("finished a request: {:?}", collected.finish_reason);
    Ok(collected)
}
