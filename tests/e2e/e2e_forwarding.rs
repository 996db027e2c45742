use std::time::Duration;

use axum::Router;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::get;
use rest_forwarder::{
    CancellationToken, MessageHandler, RequestForwarder, ReqwestTransport, RestErrorKind,
    RestRequest, SubmodelClient, TransportConfig, TransportRegistry,
};
use tokio::net::TcpListener;
use tokio::time::sleep;

#[derive(Debug, serde::Serialize, serde::Deserialize, PartialEq)]
struct Submodel {
    id: String,
    id_short: String,
    kind: Option<String>,
}

#[tokio::test]
async fn e2e_forwarder_returns_server_response() {
    let server = TestServer::start().await;
    let transport = ReqwestTransport::new();
    let forwarder = RequestForwarder::new(&transport);

    let response = forwarder
        .send(RestRequest::get(server.url("/ok")), CancellationToken::new())
        .await
        .expect("server should answer");

    assert_eq!(response.status(), 200);
    assert_eq!(response.body(), b"ok");
}

#[tokio::test]
async fn e2e_cancellation_aborts_slow_request() {
    let server = TestServer::start().await;
    let transport = ReqwestTransport::new();
    let forwarder = RequestForwarder::new(&transport);
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });

    let err = forwarder
        .send(RestRequest::get(server.url("/slow")), cancel)
        .await
        .expect_err("cancelled request should fail");

    assert_eq!(err.kind(), RestErrorKind::Cancelled);
}

#[tokio::test]
async fn e2e_configured_timeout_is_the_senders_not_the_forwarders() {
    let server = TestServer::start().await;
    let transport =
        ReqwestTransport::from_config(&TransportConfig::new().with_timeout(Duration::from_millis(200)))
            .expect("config should build a client");
    let forwarder = RequestForwarder::new(&transport);

    let err = forwarder
        .send(RestRequest::get(server.url("/slow")), CancellationToken::new())
        .await
        .expect_err("sender timeout should trigger");

    assert_eq!(err.kind(), RestErrorKind::Timeout);
}

#[tokio::test]
async fn e2e_submodel_roundtrip_through_registry() {
    let server = TestServer::start().await;
    let mut registry = TransportRegistry::new();
    registry.register(
        rest_forwarder::DEFAULT_TRANSPORT_NAME,
        ReqwestTransport::from_config(&TransportConfig::new().with_user_agent("rest-forwarder-e2e"))
            .expect("config should build a client"),
    );

    let client: SubmodelClient<_> = registry
        .submodel_client(rest_forwarder::DEFAULT_TRANSPORT_NAME, server.url("/submodel/"))
        .expect("default transport is registered");

    let submodel: Submodel = client
        .retrieve(CancellationToken::new())
        .await
        .expect("submodel should be served");
    assert_eq!(submodel.id_short, "Nameplate");

    client
        .update(&submodel, CancellationToken::new())
        .await
        .expect("server accepts json without null members");
}

struct TestServer {
    base_url: String,
    task: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn start() -> Self {
        let app = Router::new()
            .route("/ok", get(ok_handler))
            .route("/slow", get(slow_handler))
            .route("/submodel", get(submodel_handler).put(update_handler));

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("local addr");
        let base_url = format!("http://{}", addr);

        let task = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { base_url, task }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn ok_handler() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ok")
}

async fn slow_handler() -> (StatusCode, &'static str) {
    sleep(Duration::from_millis(2500)).await;
    (StatusCode::OK, "too late")
}

async fn submodel_handler(headers: HeaderMap) -> (StatusCode, &'static str) {
    let agent = headers
        .get("user-agent")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    if agent != "rest-forwarder-e2e" {
        return (StatusCode::FORBIDDEN, "unexpected user agent");
    }
    (
        StatusCode::OK,
        r#"{"id":"urn:example:sm:nameplate","id_short":"Nameplate","kind":null}"#,
    )
}

async fn update_handler(body: String) -> StatusCode {
    if body.contains("null") || !body.contains('\n') {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::NO_CONTENT
    }
}
