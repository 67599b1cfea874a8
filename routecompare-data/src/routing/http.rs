//! JSON-over-HTTP plumbing shared by the adapters.

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;

use super::config::{HttpProviderConfig, ProviderBuildError};
use super::error::{ProviderError, convert_reqwest_error};

/// A configured client bound to one provider endpoint.
#[derive(Debug, Clone)]
pub(crate) struct JsonEndpoint {
    client: Client,
    config: HttpProviderConfig,
}

impl JsonEndpoint {
    pub(crate) fn new(config: HttpProviderConfig) -> Result<Self, ProviderBuildError> {
        let client = config.build_client()?;
        Ok(Self { client, config })
    }

    pub(crate) const fn config(&self) -> &HttpProviderConfig {
        &self.config
    }

    /// Issue a GET request and fail on transport errors or non-success
    /// statuses. `url` must not carry credentials; it appears in errors,
    /// while `query` never does.
    pub(crate) async fn send(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<Response, ProviderError> {
        self.client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|err| convert_reqwest_error(err, url, self.config.timeout))?
            .error_for_status()
            .map_err(|err| convert_reqwest_error(err, url, self.config.timeout))
    }

    pub(crate) async fn read_json<T: DeserializeOwned>(
        &self,
        url: &str,
        response: Response,
    ) -> Result<T, ProviderError> {
        response
            .json()
            .await
            .map_err(|err| convert_reqwest_error(err, url, self.config.timeout))
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, ProviderError> {
        let response = self.send(url, query).await?;
        self.read_json(url, response).await
    }
}

/// Format a coordinate as the `lat,lon` pair most vendors expect.
pub(crate) fn lat_lon(coord: geo::Coord<f64>) -> String {
    format!("{},{}", coord.y, coord.x)
}
