//! Glue between HTTP transport abstractions.
//!
//! [`RequestForwarder`] lets an already-configured [`RestTransport`] stand in
//! wherever a [`MessageHandler`] is expected, without taking ownership of it.
//! [`SerializationOptions`] carries the JSON settings submodel payloads are
//! written with.

pub mod adapter;
pub mod client;
pub mod config;
pub mod forward;
pub mod mock;
pub mod registry;
pub mod serialization;

pub use reqwest::Method;
pub use tokio_util::sync::CancellationToken;

pub use adapter::{
    ReqwestTransport, RestBytes, RestError, RestErrorKind, RestFuture, RestRequest, RestResponse,
    RestResult, RestTransport, RestTransportState,
};
pub use client::SubmodelClient;
pub use config::TransportConfig;
pub use forward::{MessageHandler, RequestForwarder};
pub use mock::{
    MockBehavior, MockBehaviorPlan, MockResponse, MockRestAdapter, MockRestStateSnapshot,
};
pub use registry::{DEFAULT_TRANSPORT_NAME, TransportRegistry};
pub use serialization::{FieldNaming, SerializationError, SerializationOptions};
