use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use tether::runtime::prelude::{
    BoxFuture,
    CancellationToken,
    Outbound,
    OutboundRequest,
    OutboundResponse,
    TetherError,
    TetherResult,
};

/// One scripted reaction to an outbound call.
#[derive(Clone, Debug)]
pub enum Step {
    Status(u16),
    StatusWithHeader(u16, &'static str, &'static str),
    Fail(&'static str),
    /// The call's own deadline passed; the token is untouched.
    TimedOut(u64),
    /// Respond 200 after a delay, unless cancelled first.
    Delayed(Duration),
    /// Never respond; resolve only through cancellation.
    Hang,
    /// Cancel the token on behalf of a peer, then fail.
    CancelThenFail(&'static str),
}

/// Outbound double driven by per-target scripts. The last step of a script
/// repeats once the script is exhausted.
#[derive(Default)]
pub struct ScriptedOutbound {
    scripts: Mutex<HashMap<String, VecDeque<Step>>>,
    last: Mutex<HashMap<String, Step>>,
    calls: Mutex<HashMap<String, u64>>,
}

impl ScriptedOutbound {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(self, target: &str, steps: Vec<Step>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(target.to_string(), steps.into_iter().collect());
        self
    }

    pub fn calls(&self, target: &str) -> u64 {
        self.calls.lock().unwrap().get(target).copied().unwrap_or(0)
    }

    fn next_step(&self, target: &str) -> Step {
        *self.calls.lock().unwrap().entry(target.to_string()).or_default() += 1;
        let popped = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(target)
            .and_then(VecDeque::pop_front);
        let mut last = self.last.lock().unwrap();
        match popped {
            Some(step) => {
                last.insert(target.to_string(), step.clone());
                step
            }
            None => last.get(target).cloned().unwrap_or(Step::Status(200)),
        }
    }
}

impl Outbound for ScriptedOutbound {
    fn fetch<'a>(
        &'a self,
        request: &'a OutboundRequest,
        token: &'a CancellationToken,
    ) -> BoxFuture<'a, TetherResult<OutboundResponse>> {
        let step = self.next_step(&request.target);
        Box::pin(async move {
            match step {
                Step::Status(status) => Ok(OutboundResponse::new(status)),
                Step::StatusWithHeader(status, name, value) => {
                    Ok(OutboundResponse::new(status).with_header(name, value))
                }
                Step::Fail(message) => Err(TetherError::transport(&request.target, message)),
                Step::TimedOut(after_ms) => Err(TetherError::DeadlineExceeded { after_ms }),
                Step::Delayed(delay) => {
                    tokio::select! {
                        _ = token.cancelled() => Err(token.cancellation_error()),
                        _ = tokio::time::sleep(delay) => Ok(OutboundResponse::new(200)),
                    }
                }
                Step::Hang => {
                    token.cancelled().await;
                    Err(token.cancellation_error())
                }
                Step::CancelThenFail(message) => {
                    token.cancel_with_reason("peer failed");
                    Err(TetherError::transport(&request.target, message))
                }
            }
        })
    }
}
