use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::adapter::{RestError, RestRequest, RestResponse, RestResult};
use crate::forward::MessageHandler;
use crate::serialization::SerializationOptions;

/// Reads and writes one submodel endpoint through whatever [`MessageHandler`]
/// it is given.
#[derive(Debug)]
pub struct SubmodelClient<H> {
    endpoint: String,
    handler: H,
    options: SerializationOptions,
}

impl<H> SubmodelClient<H>
where
    H: MessageHandler,
{
    pub fn new(endpoint: impl Into<String>, handler: H) -> Self {
        let mut endpoint = endpoint.into();
        while endpoint.ends_with('/') {
            endpoint.pop();
        }
        Self {
            endpoint,
            handler,
            options: SerializationOptions::default(),
        }
    }

    pub fn with_options(mut self, options: SerializationOptions) -> Self {
        self.options = options;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn options(&self) -> &SerializationOptions {
        &self.options
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub async fn retrieve<T>(&self, cancel: CancellationToken) -> RestResult<T>
    where
        T: DeserializeOwned,
    {
        let response = self
            .dispatch(RestRequest::get(self.endpoint.clone()), cancel)
            .await?;
        response.json_with(&self.options)
    }

    pub async fn retrieve_element<T>(
        &self,
        id_short_path: &str,
        cancel: CancellationToken,
    ) -> RestResult<T>
    where
        T: DeserializeOwned,
    {
        let id_short_path = id_short_path.trim_matches('/');
        if id_short_path.is_empty() {
            return Err(RestError::invalid_argument(
                "id_short_path",
                "element path must not be empty",
            ));
        }
        let url = format!("{}/submodel-elements/{id_short_path}", self.endpoint);
        let response = self.dispatch(RestRequest::get(url), cancel).await?;
        response.json_with(&self.options)
    }

    pub async fn update<T>(&self, submodel: &T, cancel: CancellationToken) -> RestResult<()>
    where
        T: Serialize + ?Sized,
    {
        let body = self.options.to_vec(submodel)?;
        let request = RestRequest::put(self.endpoint.clone())
            .with_header("content-type", "application/json")
            .with_body(body);
        self.dispatch(request, cancel).await?;
        Ok(())
    }

    pub fn close(&self) {
        debug!(endpoint = %self.endpoint, "closing submodel client");
        self.handler.close();
    }

    async fn dispatch(
        &self,
        request: RestRequest,
        cancel: CancellationToken,
    ) -> RestResult<RestResponse> {
        debug!(method = %request.method, url = %request.url, "submodel request");
        let response = self.handler.send(request, cancel).await?;
        if !response.is_success() {
            let message = String::from_utf8_lossy(response.body()).into_owned();
            return Err(RestError::rejected(
                response.status(),
                message,
                response.status() >= 500,
            ));
        }
        Ok(response)
    }
}
