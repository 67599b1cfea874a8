//! Failures raised inside adapters before they are absorbed into
//! [`RouteOutcome::NoRoute`](routecompare_core::RouteOutcome::NoRoute).

use std::time::Duration;

use routecompare_core::{RouteDetailsError, RouteError};
use thiserror::Error;

use crate::polyline::PolylineError;

/// Why a provider request produced no route.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The request exceeded its timeout.
    #[error("request to {url} timed out after {timeout_secs}s")]
    Timeout {
        /// Endpoint without query parameters.
        url: String,
        /// Configured timeout.
        timeout_secs: u64,
    },
    /// The service answered with a non-success HTTP status.
    #[error("HTTP {status} from {url}: {message}")]
    Http {
        /// Endpoint without query parameters.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Error text reported by the client.
        message: String,
    },
    /// The request never produced a response.
    #[error("network error calling {url}: {message}")]
    Network {
        /// Endpoint without query parameters.
        url: String,
        /// Error text reported by the client.
        message: String,
    },
    /// The body was not the JSON shape the adapter expects.
    #[error("failed to parse response: {message}")]
    Parse {
        /// Deserialiser message.
        message: String,
    },
    /// The service reported an error code in a successful response.
    #[error("service returned {code}: {message}")]
    Service {
        /// Vendor status code.
        code: String,
        /// Vendor message, possibly empty.
        message: String,
    },
    /// The service found no route between the points.
    #[error("no route between origin and destination")]
    NoRoute,
    /// The route geometry could not be decoded.
    #[error(transparent)]
    Polyline(#[from] PolylineError),
    /// The decoded geometry is not a usable route.
    #[error(transparent)]
    Route(#[from] RouteError),
    /// Distance or duration was out of range.
    #[error(transparent)]
    Details(#[from] RouteDetailsError),
}

/// Convert a reqwest error to a [`ProviderError`].
///
/// The request URL is stripped from the client's message because vendors
/// take API keys as query parameters.
pub(crate) fn convert_reqwest_error(
    error: reqwest::Error,
    url: &str,
    timeout: Duration,
) -> ProviderError {
    if error.is_timeout() {
        return ProviderError::Timeout {
            url: url.to_owned(),
            timeout_secs: timeout.as_secs(),
        };
    }

    let status = error.status();
    let is_decode = error.is_decode();
    let message = error.without_url().to_string();

    if let Some(status) = status {
        return ProviderError::Http {
            url: url.to_owned(),
            status: status.as_u16(),
            message,
        };
    }

    if is_decode {
        return ProviderError::Parse { message };
    }

    ProviderError::Network {
        url: url.to_owned(),
        message,
    }
}
