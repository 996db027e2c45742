use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use bytes::Bytes;
use reqwest::Method;
use serde::Serialize;
use sonic_rs::to_vec;
use tokio_util::sync::CancellationToken;

use super::adapter::{
    RestBytes, RestError, RestErrorKind, RestFuture, RestRequest, RestResponse, RestResult,
    RestTransport, RestTransportState,
};

#[derive(Clone, Debug, Default)]
pub enum MockBehavior {
    #[default]
    Pass,
    Delay(Duration),
    /// Never answers; resolves only when the request's token is cancelled.
    Hang,
    Reject {
        status: u16,
        reason: String,
    },
    ConnectError {
        status: Option<u16>,
        reason: String,
        retryable: bool,
    },
    SendError {
        status: Option<u16>,
        reason: String,
        retryable: bool,
    },
    ReceiveError {
        status: Option<u16>,
        reason: String,
        retryable: bool,
    },
    TimeoutError {
        status: Option<u16>,
        reason: String,
        retryable: bool,
    },
    InternalError {
        reason: String,
    },
    Drop,
    Replay(Vec<MockResponse>),
}

impl MockBehavior {
    pub fn pass() -> Self {
        Self::Pass
    }

    pub fn delay(ms: u64) -> Self {
        Self::Delay(Duration::from_millis(ms))
    }

    pub fn hang() -> Self {
        Self::Hang
    }

    pub fn reject(status: u16, reason: impl Into<String>) -> Self {
        Self::Reject {
            status,
            reason: reason.into(),
        }
    }

    pub fn connect_error(reason: impl Into<String>, status: Option<u16>, retryable: bool) -> Self {
        Self::ConnectError {
            status,
            reason: reason.into(),
            retryable,
        }
    }

    pub fn send_error(reason: impl Into<String>, status: Option<u16>, retryable: bool) -> Self {
        Self::SendError {
            status,
            reason: reason.into(),
            retryable,
        }
    }

    pub fn receive_error(reason: impl Into<String>, status: Option<u16>, retryable: bool) -> Self {
        Self::ReceiveError {
            status,
            reason: reason.into(),
            retryable,
        }
    }

    pub fn timeout_error(reason: impl Into<String>, status: Option<u16>, retryable: bool) -> Self {
        Self::TimeoutError {
            status,
            reason: reason.into(),
            retryable,
        }
    }

    pub fn internal_error(reason: impl Into<String>) -> Self {
        Self::InternalError {
            reason: reason.into(),
        }
    }

    pub fn drop_response() -> Self {
        Self::Drop
    }

    pub fn replay(frames: impl IntoIterator<Item = MockResponse>) -> Self {
        Self::Replay(frames.into_iter().collect())
    }
}

#[derive(Clone, Debug, Default)]
pub struct MockBehaviorPlan {
    request: VecDeque<MockBehavior>,
}

impl MockBehaviorPlan {
    pub fn push(&mut self, behavior: MockBehavior) -> &mut Self {
        self.request.push_back(behavior);
        self
    }

    pub fn pop(&mut self) -> MockBehavior {
        self.request.pop_front().unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.request.len()
    }

    pub fn is_empty(&self) -> bool {
        self.request.is_empty()
    }
}

impl FromIterator<MockBehavior> for MockBehaviorPlan {
    fn from_iter<I: IntoIterator<Item = MockBehavior>>(iter: I) -> Self {
        Self {
            request: iter.into_iter().collect(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct MockResponse {
    pub status: u16,
    pub headers: Vec<(String, RestBytes)>,
    pub body: RestBytes,
}

impl MockResponse {
    pub fn new(status: u16, body: impl Into<RestBytes>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<RestBytes>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self::new(status, body.into())
    }

    pub fn json<T: Serialize>(status: u16, payload: &T) -> RestResult<Self> {
        let body = to_vec(payload).map_err(RestError::from)?;
        Ok(Self::new(status, body).with_header("content-type", "application/json"))
    }
}

#[derive(Clone, Debug)]
pub struct MockRestStateSnapshot {
    pub state: RestTransportState,
    pub request_count: usize,
    pub last_url: Option<String>,
    pub last_status: Option<u16>,
    pub behavior_remaining: usize,
    pub response_queue_len: usize,
    pub route_queue_len: usize,
    pub inbound_count: usize,
    pub outbound_count: usize,
    pub cancelled_count: usize,
    pub closed: bool,
    pub elapsed_total: Duration,
    pub last_error: Option<String>,
}

#[derive(Debug)]
struct MockRestAdapterState {
    state: RestTransportState,
    request_count: usize,
    last_url: Option<String>,
    last_status: Option<u16>,
    behavior_plan: MockBehaviorPlan,
    default_response_queue: VecDeque<MockResponse>,
    route_response_queues: HashMap<(Method, String), VecDeque<MockResponse>>,
    outbound_log: Vec<RestRequest>,
    inbound_log: Vec<RestResponse>,
    cancelled_count: usize,
    closed: bool,
    last_error: Option<String>,
    elapsed_total: Duration,
}

impl MockRestAdapterState {
    fn snapshot(&self) -> MockRestStateSnapshot {
        MockRestStateSnapshot {
            state: self.state,
            request_count: self.request_count,
            last_url: self.last_url.clone(),
            last_status: self.last_status,
            behavior_remaining: self.behavior_plan.len(),
            response_queue_len: self.default_response_queue.len(),
            route_queue_len: self.route_response_queues.values().map(VecDeque::len).sum(),
            inbound_count: self.inbound_log.len(),
            outbound_count: self.outbound_log.len(),
            cancelled_count: self.cancelled_count,
            closed: self.closed,
            elapsed_total: self.elapsed_total,
            last_error: self.last_error.clone(),
        }
    }
}

impl Default for MockRestAdapterState {
    fn default() -> Self {
        Self {
            state: RestTransportState::Idle,
            request_count: 0,
            last_url: None,
            last_status: None,
            behavior_plan: MockBehaviorPlan::default(),
            default_response_queue: VecDeque::new(),
            route_response_queues: HashMap::new(),
            outbound_log: Vec::new(),
            inbound_log: Vec::new(),
            cancelled_count: 0,
            closed: false,
            last_error: None,
            elapsed_total: Duration::from_millis(0),
        }
    }
}

/// In-memory sender for deterministic tests.
///
/// Clones share state, so a test can keep one handle for assertions while
/// another is lent out to the code under test.
#[derive(Clone, Debug)]
pub struct MockRestAdapter {
    state: Arc<Mutex<MockRestAdapterState>>,
}

impl MockRestAdapter {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockRestAdapterState::default())),
        }
    }

    pub fn with_behavior_plan(behavior_plan: MockBehaviorPlan) -> Self {
        let state = MockRestAdapterState {
            behavior_plan,
            ..MockRestAdapterState::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn with_behavior(behavior: MockBehavior) -> Self {
        Self::with_behavior_plan(MockBehaviorPlan::from_iter([behavior]))
    }

    pub fn snapshot(&self) -> MockRestStateSnapshot {
        self.state
            .lock()
            .expect("mock-restapi mutex poisoned while taking snapshot")
            .snapshot()
    }

    pub fn push_behavior(&self, behavior: MockBehavior) {
        self.state
            .lock()
            .expect("mock-restapi mutex poisoned while pushing behavior")
            .behavior_plan
            .push(behavior);
    }

    pub fn queue_response(&self, response: MockResponse) {
        self.state
            .lock()
            .expect("mock-restapi mutex poisoned while queueing response")
            .default_response_queue
            .push_back(response);
    }

    pub fn queue_response_for(
        &self,
        method: Method,
        url: impl Into<String>,
        response: MockResponse,
    ) {
        let key = (method, url.into());
        self.state
            .lock()
            .expect("mock-restapi mutex poisoned while queueing response by route")
            .route_response_queues
            .entry(key)
            .or_default()
            .push_back(response);
    }

    pub fn queue_get_response(&self, url: impl Into<String>, response: MockResponse) {
        self.queue_response_for(Method::GET, url, response);
    }

    pub fn queue_put_response(&self, url: impl Into<String>, response: MockResponse) {
        self.queue_response_for(Method::PUT, url, response);
    }

    pub fn outbound_requests(&self) -> Vec<RestRequest> {
        self.state
            .lock()
            .expect("mock-restapi mutex poisoned while reading outbound log")
            .outbound_log
            .clone()
    }

    pub fn outbound_count(&self) -> usize {
        self.state
            .lock()
            .expect("mock-restapi mutex poisoned while reading outbound count")
            .outbound_log
            .len()
    }

    pub fn inbound_count(&self) -> usize {
        self.state
            .lock()
            .expect("mock-restapi mutex poisoned while reading inbound count")
            .inbound_log
            .len()
    }

    pub fn is_closed(&self) -> bool {
        self.state
            .lock()
            .expect("mock-restapi mutex poisoned while reading closed flag")
            .closed
    }

    pub fn clear_logs(&self) {
        let mut state = self
            .state
            .lock()
            .expect("mock-restapi mutex poisoned while clearing logs");
        state.outbound_log.clear();
        state.inbound_log.clear();
    }

    fn pop_behavior(&self) -> MockBehavior {
        self.state
            .lock()
            .expect("mock-restapi mutex poisoned while reading behavior plan")
            .behavior_plan
            .pop()
    }

    fn next_default_response(&self, request: &RestRequest) -> Option<MockResponse> {
        let mut state = self
            .state
            .lock()
            .expect("mock-restapi mutex poisoned while selecting default response");
        let route_key = (request.method.clone(), request.url.clone());
        if let Some(response) = state
            .route_response_queues
            .get_mut(&route_key)
            .and_then(VecDeque::pop_front)
        {
            return Some(response);
        }
        state.default_response_queue.pop_front()
    }

    fn record_outbound(&self, request: &RestRequest) -> bool {
        let mut state = self
            .state
            .lock()
            .expect("mock-restapi mutex poisoned while updating state before send");
        state.outbound_log.push(request.clone());
        state.request_count += 1;
        state.last_url = Some(request.url.clone());
        state.last_error = None;
        if !state.closed {
            state.state = RestTransportState::Busy;
        }
        state.closed
    }

    fn record_inbound(&self, response: &RestResponse) {
        let mut state = self
            .state
            .lock()
            .expect("mock-restapi mutex poisoned while recording inbound response");
        state.inbound_log.push(response.clone());
        state.last_status = Some(response.status);
        state.state = RestTransportState::Idle;
        state.elapsed_total += response.elapsed;
    }

    fn cancelled(&self) -> RestError {
        let message = "mock transport request cancelled";
        let mut state = self
            .state
            .lock()
            .expect("mock-restapi mutex poisoned while recording cancellation");
        state.cancelled_count += 1;
        state.state = RestTransportState::Idle;
        state.last_error = Some(message.to_string());
        RestError::cancelled(message)
    }

    fn error(
        &self,
        kind: RestErrorKind,
        status: Option<u16>,
        message: impl Into<String>,
        retryable: bool,
    ) -> RestError {
        let message = message.into();
        let error = RestError::new(kind, status, message.clone(), retryable);

        let mut state = self
            .state
            .lock()
            .expect("mock-restapi mutex poisoned while recording error");
        if !state.closed {
            state.state = RestTransportState::Error;
        }
        state.last_error = Some(message);
        state.last_status = status;
        error
    }

    async fn respond(
        &self,
        request: RestRequest,
        behavior: MockBehavior,
        cancel: &CancellationToken,
    ) -> RestResult<RestResponse> {
        let start = Instant::now();

        match behavior {
            MockBehavior::Hang => {
                cancel.cancelled().await;
                return Err(self.cancelled());
            }
            MockBehavior::Delay(duration) => {
                tokio::select! {
                    _ = cancel.cancelled() => return Err(self.cancelled()),
                    _ = tokio::time::sleep(duration) => {}
                }
            }
            MockBehavior::Drop => {
                return Err(self.error(
                    RestErrorKind::Timeout,
                    None,
                    "mock transport dropped response",
                    false,
                ));
            }
            MockBehavior::ConnectError {
                status,
                reason,
                retryable,
            } => {
                return Err(self.error(RestErrorKind::Connect, status, reason, retryable));
            }
            MockBehavior::SendError {
                status,
                reason,
                retryable,
            } => {
                return Err(self.error(RestErrorKind::Send, status, reason, retryable));
            }
            MockBehavior::ReceiveError {
                status,
                reason,
                retryable,
            } => {
                return Err(self.error(RestErrorKind::Receive, status, reason, retryable));
            }
            MockBehavior::TimeoutError {
                status,
                reason,
                retryable,
            } => {
                return Err(self.error(RestErrorKind::Timeout, status, reason, retryable));
            }
            MockBehavior::InternalError { reason } => {
                return Err(self.error(RestErrorKind::Internal, None, reason, false));
            }
            MockBehavior::Reject { status, reason } => {
                return Err(self.error(RestErrorKind::Rejected, Some(status), reason, true));
            }
            MockBehavior::Replay(list) => {
                self.state
                    .lock()
                    .expect("mock-restapi mutex poisoned while enqueueing replay responses")
                    .default_response_queue
                    .extend(list);
            }
            MockBehavior::Pass => {}
        }

        if cancel.is_cancelled() {
            return Err(self.cancelled());
        }

        let response = match self.next_default_response(&request) {
            Some(response) => RestResponse {
                status: response.status,
                headers: response.headers,
                body: response.body,
                elapsed: start.elapsed(),
            },
            None => RestResponse {
                status: 200,
                headers: Vec::new(),
                body: Bytes::new(),
                elapsed: start.elapsed(),
            },
        };
        self.record_inbound(&response);
        Ok(response)
    }
}

impl Default for MockRestAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl RestTransport for MockRestAdapter {
    fn send(
        &self,
        request: RestRequest,
        cancel: CancellationToken,
    ) -> RestFuture<RestResult<RestResponse>> {
        let adapter = self.clone();
        Box::pin(async move {
            if adapter.record_outbound(&request) {
                return Err(adapter.error(
                    RestErrorKind::Internal,
                    None,
                    "mock transport is closed",
                    false,
                ));
            }
            let behavior = adapter.pop_behavior();
            adapter.respond(request, behavior, &cancel).await
        })
    }

    fn close(&self) {
        let mut state = self
            .state
            .lock()
            .expect("mock-restapi mutex poisoned while closing");
        state.closed = true;
        state.state = RestTransportState::Closed;
    }
}
