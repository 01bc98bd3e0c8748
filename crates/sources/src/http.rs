//! Shared HTTP plumbing for the provider clients.

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use trendcast_core::SourceError;

/// Builds the reqwest client the providers share their settings from.
/// No per-client timeout: the deadline race in [`get_json`] governs.
pub(crate) fn build_client() -> Client {
    Client::builder()
        .user_agent(concat!("trendcast/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_default()
}

/// Performs a GET and deserializes the body, racing the whole exchange
/// (request, headers, and body) against `deadline`.
///
/// Mapping into the source taxonomy:
/// - deadline expiry or any transport-level failure (the provider produced
///   no response) → [`SourceError::Timeout`]
/// - non-2xx status → [`SourceError::HttpError`]
/// - undecodable body → [`SourceError::MalformedPayload`]
pub(crate) async fn get_json<T: DeserializeOwned>(
    http: &Client,
    url: &str,
    deadline: Duration,
) -> Result<T, SourceError> {
    tracing::debug!(%url, ?deadline, "GET");

    let exchange = async {
        let response = http.get(url).send().await.map_err(|e| {
            tracing::debug!(%url, error = %e, "transport failure");
            SourceError::Timeout
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::HttpError(status.as_u16()));
        }

        response.json::<T>().await.map_err(|e| {
            tracing::debug!(%url, error = %e, "undecodable payload");
            SourceError::MalformedPayload
        })
    };

    tokio::time::timeout(deadline, exchange)
        .await
        .map_err(|_| SourceError::Timeout)?
}
