//! Scripted transport used by the fetch tests

use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

use super::{Request, Transport, TransportError, TransportResponse};

/// One scripted reply
pub(crate) enum Step {
    Respond(Result<TransportResponse, TransportError>),
    Delayed(Duration, Box<Step>),
}

impl Step {
    pub(crate) fn ok(body: Value) -> Self {
        Step::Respond(Ok(TransportResponse::ok(body)))
    }

    pub(crate) fn status(status: u16) -> Self {
        Step::Respond(Ok(TransportResponse::new(status, Value::Null)))
    }

    pub(crate) fn network(message: &str) -> Self {
        Step::Respond(Err(TransportError::Other(message.to_string())))
    }

    pub(crate) fn delayed(delay: Duration, then: Step) -> Self {
        Step::Delayed(delay, Box::new(then))
    }
}

/// Replies from per-URL queues first, then from a shared queue.
/// Records every call with the (possibly paused) tokio clock.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    steps: Mutex<VecDeque<Step>>,
    routes: Mutex<HashMap<String, VecDeque<Step>>>,
    calls: Mutex<Vec<(String, Instant)>>,
}

impl ScriptedTransport {
    pub(crate) fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            ..Default::default()
        }
    }

    pub(crate) fn route(self, url: &str, steps: Vec<Step>) -> Self {
        self.routes
            .lock()
            .unwrap()
            .insert(url.to_string(), steps.into());
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub(crate) fn calls_for(&self, url: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(called, _)| called == url)
            .count()
    }

    pub(crate) fn call_times(&self) -> Vec<Instant> {
        self.calls.lock().unwrap().iter().map(|(_, at)| *at).collect()
    }

    fn next_step(&self, url: &str) -> Step {
        let routed = self
            .routes
            .lock()
            .unwrap()
            .get_mut(url)
            .and_then(VecDeque::pop_front);
        routed
            .or_else(|| self.steps.lock().unwrap().pop_front())
            .unwrap_or_else(|| Step::network("script exhausted"))
    }
}

impl Transport for ScriptedTransport {
    async fn issue(&self, request: &Request) -> Result<TransportResponse, TransportError> {
        self.calls
            .lock()
            .unwrap()
            .push((request.url.clone(), Instant::now()));
        let mut step = self.next_step(&request.url);

        loop {
            match step {
                Step::Respond(result) => return result,
                Step::Delayed(delay, then) => {
                    tokio::time::sleep(delay).await;
                    step = *then;
                }
            }
        }
    }
}
