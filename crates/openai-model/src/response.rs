use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use pin_project_lite::pin_project;
use research_agent_model::{
    ErrorKind, ModelFinishReason, ModelResponse, ModelResponseEvent,
    ToolCallRequest,
};
use serde_json::Value;

use crate::Error;
use crate::io::{Sse, SseError};
use crate::proto::{ChatCompletionChunk, ToolCall};

/// Everything accumulated while reading one streamed completion.
struct PartialState {
    sse: Sse,
    tool_calls: Vec<ToolCall>,
    // Events decoded from the stream but not yet returned to the caller.
    pending_events: VecDeque<ModelResponseEvent>,
    finished: bool,
}

impl PartialState {
    /// Queues every assembled tool call followed by the finish reason.
    fn finish(&mut self, reason: ModelFinishReason) {
        for tool_call in self.tool_calls.drain(..) {
            self.pending_events
                .push_back(ModelResponseEvent::ToolCall(into_request(tool_call)));
        }
        self.pending_events
            .push_back(ModelResponseEvent::Completed(reason));
        self.finished = true;
    }

    fn merge_tool_call(&mut self, fragment: ToolCall) {
        let Some(partial) = self
            .tool_calls
            .iter_mut()
            .find(|t| t.index == fragment.index)
        else {
            self.tool_calls.push(fragment);
            return;
        };
        if let Some(id) = fragment.id {
            partial.id.get_or_insert_default().push_str(&id);
        }
        if let Some(ty) = fragment.r#type {
            // The type is sent whole, never in pieces.
            partial.r#type = Some(ty);
        }
        let Some(function) = fragment.function else {
            return;
        };
        let partial_func = partial.function.get_or_insert_default();
        if let Some(name) = function.name {
            partial_func.name.get_or_insert_default().push_str(&name);
        }
        if let Some(arguments) = function.arguments {
            partial_func
                .arguments
                .get_or_insert_default()
                .push_str(&arguments);
        }
    }
}

fn into_request(tool_call: ToolCall) -> ToolCallRequest {
    let function = tool_call.function.unwrap_or_default();
    let arguments = function
        .arguments
        .as_deref()
        .filter(|args| !args.trim().is_empty())
        .map(|args| {
            serde_json::from_str::<Value>(args).unwrap_or_else(|err| {
                warn!("tool call arguments are not valid JSON: {err}");
                Value::String(args.to_owned())
            })
        })
        .unwrap_or_else(|| Value::Object(Default::default()));
    ToolCallRequest {
        id: tool_call.id.unwrap_or_default(),
        name: function.name.unwrap_or_default(),
        arguments,
    }
}

fn parse_finish_reason(reason: &str) -> ModelFinishReason {
    match reason {
        "tool_calls" | "function_call" => ModelFinishReason::ToolCalls,
        "length" => ModelFinishReason::Length,
        _ => ModelFinishReason::Stop,
    }
}

type PinnedFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;
type NextEvent = Result<(Option<ModelResponseEvent>, PartialState), Error>;

pin_project! {
    /// A streamed chat completion.
    pub struct OpenAIResponse {
        next_event_fut: Option<PinnedFuture<NextEvent>>,
    }
}

impl OpenAIResponse {
    #[inline]
    pub fn from_sse(sse: Sse) -> Self {
        let partial_state = PartialState {
            sse,
            tool_calls: Default::default(),
            pending_events: Default::default(),
            finished: false,
        };
        Self {
            next_event_fut: Some(Box::pin(next_event(partial_state))),
        }
    }
}

impl ModelResponse for OpenAIResponse {
    type Error = crate::Error;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        let this = self.project();
        let Some(next_event_fut) = this.next_event_fut else {
            return Poll::Ready(Ok(None));
        };
        let result = ready!(next_event_fut.as_mut().poll(cx));
        match result {
            Ok((Some(event), partial_state)) => {
                *this.next_event_fut =
                    Some(Box::pin(next_event(partial_state)));
                Poll::Ready(Ok(Some(event)))
            }
            Ok((None, _)) => {
                *this.next_event_fut = None;
                Poll::Ready(Ok(None))
            }
            Err(err) => {
                *this.next_event_fut = None;
                Poll::Ready(Err(err))
            }
        }
    }
}

async fn next_event(mut partial_state: PartialState) -> NextEvent {
    loop {
        if let Some(event) = partial_state.pending_events.pop_front() {
            return Ok((Some(event), partial_state));
        }
        if partial_state.finished {
            return Ok((None, partial_state));
        }

        let data = match partial_state.sse.next_event().await {
            Ok(Some(data)) => data,
            Ok(None) => {
                // The server closed the stream without a finish reason.
                partial_state.finish(ModelFinishReason::Stop);
                continue;
            }
            Err(SseError::Chunks(err)) => {
                return Err(Error::new(err.0, ErrorKind::Transport));
            }
            Err(SseError::InvalidPayload) => {
                return Err(Error::new("invalid event payload", ErrorKind::Other));
            }
        };
        trace!("got sse event: {data}");
        if data == "[DONE]" {
            partial_state.finish(ModelFinishReason::Stop);
            continue;
        }

        let chunk = serde_json::from_str::<ChatCompletionChunk>(&data)
            .map_err(|err| Error::new(format!("{err}"), ErrorKind::Other))?;

        // Usage-only chunks carry no choice.
        for choice in chunk.choices {
            if let Some(content) = choice.delta.content {
                if !content.is_empty() {
                    partial_state
                        .pending_events
                        .push_back(ModelResponseEvent::MessageDelta(content));
                }
            }
            for fragment in choice.delta.tool_calls.into_iter().flatten() {
                partial_state.merge_tool_call(fragment);
            }
            if let Some(reason) = choice.finish_reason {
                partial_state.finish(parse_finish_reason(&reason));
            }
        }
    }
}
