use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Duration;

use crate::errors::CoreError;

#[cfg(not(target_arch = "wasm32"))]
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client shared by the REST providers. Native builds get a request
/// timeout; the browser enforces its own.
pub(crate) fn client() -> Client {
    let builder = Client::builder();
    #[cfg(not(target_arch = "wasm32"))]
    let builder = builder.timeout(REQUEST_TIMEOUT);
    builder.build().unwrap_or_else(|_| Client::new())
}

pub(crate) fn api_error(provider: &str, message: impl Into<String>) -> CoreError {
    CoreError::Api {
        provider: provider.to_string(),
        message: message.into(),
    }
}

/// Send `request`, fail on non-2xx and decode the body as `T`.
/// `what` names the thing being fetched in the decode error.
pub(crate) async fn get_json<T: DeserializeOwned>(
    request: RequestBuilder,
    provider: &str,
    what: &str,
) -> Result<T, CoreError> {
    let resp = request.send().await?.error_for_status()?;
    resp.json::<T>()
        .await
        .map_err(|e| api_error(provider, format!("Unreadable response for {what}: {e}")))
}
