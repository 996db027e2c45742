use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::adapter::{RestResult, RestTransport};
use crate::client::SubmodelClient;
use crate::forward::RequestForwarder;

pub const DEFAULT_TRANSPORT_NAME: &str = "basyx";

/// Named, long-lived senders.
///
/// The registry owns its transports; forwarders and clients handed out by it
/// borrow from the registry and cannot outlive it.
#[derive(Default)]
pub struct TransportRegistry {
    transports: HashMap<String, Arc<dyn RestTransport>>,
}

impl TransportRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<T>(&mut self, name: impl Into<String>, transport: T) -> &mut Self
    where
        T: RestTransport + 'static,
    {
        self.register_shared(name, Arc::new(transport))
    }

    /// Replaces any transport already registered under `name`.
    pub fn register_shared(
        &mut self,
        name: impl Into<String>,
        transport: Arc<dyn RestTransport>,
    ) -> &mut Self {
        let name = name.into();
        debug!(%name, "registering transport");
        self.transports.insert(name, transport);
        self
    }

    pub fn get(&self, name: &str) -> Option<&dyn RestTransport> {
        self.transports.get(name).map(|transport| transport.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.transports.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.transports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transports.is_empty()
    }

    pub fn forwarder(&self, name: &str) -> RestResult<RequestForwarder<'_, dyn RestTransport>> {
        let sender = self.transports.get(name).map(|transport| transport.as_ref());
        if sender.is_none() {
            warn!(%name, "no transport registered");
        }
        RequestForwarder::try_new(sender)
    }

    pub fn submodel_client(
        &self,
        name: &str,
        endpoint: impl Into<String>,
    ) -> RestResult<SubmodelClient<RequestForwarder<'_, dyn RestTransport>>> {
        let forwarder = self.forwarder(name)?;
        Ok(SubmodelClient::new(endpoint, forwarder))
    }
}

impl fmt::Debug for TransportRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.transports.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("TransportRegistry")
            .field("transports", &names)
            .finish()
    }
}
