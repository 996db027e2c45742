use std::fmt;

use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::adapter::{RestError, RestFuture, RestRequest, RestResponse, RestResult, RestTransport};

/// The transport shape a consuming client library is written against.
///
/// Client code accepts any `MessageHandler` and never learns what sits behind it.
pub trait MessageHandler: Send + Sync {
    fn send(
        &self,
        request: RestRequest,
        cancel: CancellationToken,
    ) -> RestFuture<RestResult<RestResponse>>;

    /// Called by the consumer on its own teardown.
    fn close(&self) {}
}

/// Exposes an existing [`RestTransport`] as a [`MessageHandler`].
///
/// The forwarder only borrows its sender. Closing or dropping the forwarder
/// leaves the sender untouched, so one long-lived transport can back any number
/// of forwarders and stay usable after they are gone.
pub struct RequestForwarder<'a, S: ?Sized> {
    sender: &'a S,
}

impl<'a, S> RequestForwarder<'a, S>
where
    S: RestTransport + ?Sized,
{
    pub fn new(sender: &'a S) -> Self {
        Self { sender }
    }

    /// Fails with [`crate::RestErrorKind::InvalidArgument`] when no sender is given.
    pub fn try_new(sender: Option<&'a S>) -> RestResult<Self> {
        sender
            .map(Self::new)
            .ok_or_else(|| RestError::invalid_argument("sender", "a configured sender is required"))
    }

    pub fn sender(&self) -> &'a S {
        self.sender
    }
}

impl<S: ?Sized> Clone for RequestForwarder<'_, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S: ?Sized> Copy for RequestForwarder<'_, S> {}

impl<S: ?Sized> fmt::Debug for RequestForwarder<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestForwarder").finish_non_exhaustive()
    }
}

impl<S> MessageHandler for RequestForwarder<'_, S>
where
    S: RestTransport + ?Sized,
{
    fn send(
        &self,
        request: RestRequest,
        cancel: CancellationToken,
    ) -> RestFuture<RestResult<RestResponse>> {
        trace!(method = %request.method, url = %request.url, "forwarding request");
        self.sender.send(request, cancel)
    }

    fn close(&self) {
        // The sender belongs to whoever built it.
        trace!("forwarder closed; sender left open");
    }
}
