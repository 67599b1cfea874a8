//! Stub comparator wiring and runtime helpers for CLI tests.

use std::sync::Arc;

use routecompare_core::test_support::StubRouteProvider;
use routecompare_core::{Comparator, ProviderKind, ProviderSet, RouteProvider};

use super::*;
use crate::providers::{ComparatorFactory, ProviderSettings};

pub(super) fn block_on<F>(future: F) -> F::Output
where
    F: std::future::Future,
{
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("failed to build Tokio runtime")
        .block_on(future)
}

/// Google and the open-data backend draw straight lines; HERE finds nothing.
pub(super) struct StubComparatorFactory;

impl ComparatorFactory for StubComparatorFactory {
    fn build(&self, settings: &ProviderSettings) -> Result<Comparator, CliError> {
        let google: Arc<dyn RouteProvider> =
            Arc::new(StubRouteProvider::straight_line(ProviderKind::Google));
        let here: Arc<dyn RouteProvider> = Arc::new(StubRouteProvider::no_route(ProviderKind::Here));
        let open_data: Arc<dyn RouteProvider> =
            Arc::new(StubRouteProvider::straight_line(settings.open_data_kind()));
        let providers = ProviderSet::new(google, vec![here, open_data])?;
        Ok(Comparator::new(providers))
    }
}

/// Credentials for both commercial providers.
pub(super) fn key_args() -> Vec<String> {
    [
        format!("--{ARG_GOOGLE_API_KEY}"),
        "google-key".to_owned(),
        format!("--{ARG_HERE_API_KEY}"),
        "here-key".to_owned(),
    ]
    .into()
}
