//! A local fake model for testing purpose.

mod preset;

use std::error::Error as StdError;
use std::fmt::{self, Display, Formatter};
use std::future::ready;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll, ready};
use std::time::Duration;

use research_agent_model::{
    ErrorKind, ModelFinishReason, ModelMessage, ModelProvider,
    ModelProviderError, ModelRequest, ModelResponse, ModelResponseEvent,
};
use tokio::time::{Sleep, sleep};

pub use preset::*;

#[derive(Debug)]
pub struct Error {
    message: String,
    kind: ErrorKind,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.kind)
    }
}

impl StdError for Error {}

impl ModelProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

pub struct TestModelResponse {
    preset: PresetResponse,
    event_idx: usize,
    delay: Duration,
    sleep: Option<Pin<Box<Sleep>>>,
}

impl ModelResponse for TestModelResponse {
    type Error = crate::Error;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        let this = self.get_mut();
        let delay = this.delay;
        let sleep = this.sleep.get_or_insert_with(|| Box::pin(sleep(delay)));
        ready!(sleep.as_mut().poll(cx));
        this.sleep = None;

        let events = &this.preset.events;
        let event = if this.event_idx < events.len() {
            match &events[this.event_idx] {
                PresetEvent::MessageDelta(msg) => {
                    ModelResponseEvent::MessageDelta(msg.clone())
                }
                PresetEvent::ToolCall(req) => {
                    ModelResponseEvent::ToolCall(req.clone())
                }
            }
        } else if this.event_idx == events.len() {
            ModelResponseEvent::Completed(if this.preset.has_tool_call() {
                ModelFinishReason::ToolCalls
            } else {
                ModelFinishReason::Stop
            })
        } else {
            // In case this method is called after completion.
            return Poll::Ready(Ok(None));
        };
        this.event_idx += 1;
        Poll::Ready(Ok(Some(event)))
    }
}

/// A local fake model for testing purpose.
///
/// The provider replays a script of assistant turns. Which turn answers a
/// request is decided by the number of assistant messages already in the
/// request, so the script stays in sync with the conversation no matter how
/// many tool results sit between turns. A request beyond the end of the
/// script fails.
///
/// Every request is recorded and can be inspected with
/// [`TestModelProvider::requests`].
///
/// # Note
///
/// This type is not optimized for production use, there are heavy memory
/// copies involved. You should only use it for testing.
#[derive(Clone, Default)]
pub struct TestModelProvider {
    script: Vec<PresetResponse>,
    delay: Option<Duration>,
    requests: Arc<Mutex<Vec<ModelRequest>>>,
}

impl TestModelProvider {
    /// Appends an assistant turn to the script.
    #[inline]
    pub fn add_assistant_turn(&mut self, preset: PresetResponse) {
        self.script.push(preset);
    }

    /// Sets the delay before each event.
    #[inline]
    pub fn set_delay(&mut self, duration: Duration) {
        self.delay = Some(duration);
    }

    /// Returns all requests received so far.
    pub fn requests(&self) -> Vec<ModelRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }
}

impl ModelProvider for TestModelProvider {
    type Error = crate::Error;
    type Response = TestModelResponse;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(req.clone());
        }

        let turn = req
            .messages
            .iter()
            .filter(|msg| matches!(msg, ModelMessage::Assistant(_)))
            .count();
        let result = match self.script.get(turn) {
            None => Err(Error {
                message: format!("no scripted response for turn {turn}"),
                kind: ErrorKind::Other,
            }),
            Some(PresetResponse {
                failure: Some(message),
                ..
            }) => Err(Error {
                message: message.clone(),
                kind: ErrorKind::Other,
            }),
            Some(preset) => Ok(TestModelResponse {
                preset: preset.clone(),
                event_idx: 0,
                delay: self.delay.unwrap_or(Duration::from_millis(1)),
                sleep: None,
            }),
        };
        ready(result)
    }
}
