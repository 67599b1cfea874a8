//! Test doubles for the comparison pipeline.
//!
//! [`StubRouteProvider`] answers with pre-configured routes without any
//! network access, [`StubSnapper`] replaces a road snapping service, and
//! [`RecordingProgress`] and [`MemoryBatchStore`] capture what a run
//! reports and saves.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use geo::Coord;
use thiserror::Error;

use crate::{
    BatchResult, BatchStore, PlanarProjection, ProgressEvent, ProgressSink, ProviderKind,
    ProviderRoute, RoadSnapper, Route, RouteDetails, RouteOutcome, RouteProvider, RoutingOptions,
    SnapError,
};

/// Speed used to derive durations for straight-line routes, in m/s.
const STRAIGHT_LINE_SPEED: f64 = 13.9;

/// Stub `RouteProvider` for testing.
///
/// # Example
///
/// ```
/// use geo::Coord;
/// use routecompare_core::test_support::StubRouteProvider;
/// use routecompare_core::{ProviderKind, RouteProvider};
///
/// let provider = StubRouteProvider::no_route(ProviderKind::Here);
/// assert_eq!(provider.kind(), ProviderKind::Here);
/// assert_eq!(provider.calls(), 0);
/// ```
#[derive(Debug)]
pub struct StubRouteProvider {
    kind: ProviderKind,
    response: StubResponse,
    calls: AtomicUsize,
}

#[derive(Debug, Clone)]
enum StubResponse {
    Route(ProviderRoute),
    NoRoute,
    StraightLine,
}

impl StubRouteProvider {
    fn with_response(kind: ProviderKind, response: StubResponse) -> Self {
        Self {
            kind,
            response,
            calls: AtomicUsize::new(0),
        }
    }

    /// Return `route` for every request.
    #[must_use]
    pub fn with_route(kind: ProviderKind, route: ProviderRoute) -> Self {
        Self::with_response(kind, StubResponse::Route(route))
    }

    /// Never find a route, as an adapter does after absorbing a failure.
    #[must_use]
    pub fn no_route(kind: ProviderKind) -> Self {
        Self::with_response(kind, StubResponse::NoRoute)
    }

    /// Route in a straight line from origin to destination.
    ///
    /// Coincident endpoints yield [`RouteOutcome::NoRoute`].
    #[must_use]
    pub fn straight_line(kind: ProviderKind) -> Self {
        Self::with_response(kind, StubResponse::StraightLine)
    }

    /// Number of `route` calls served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RouteProvider for StubRouteProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    async fn route(
        &self,
        origin: Coord<f64>,
        destination: Coord<f64>,
        _options: &RoutingOptions,
    ) -> RouteOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.response {
            StubResponse::Route(route) => RouteOutcome::Found(route.clone()),
            StubResponse::NoRoute => RouteOutcome::NoRoute,
            StubResponse::StraightLine => straight_line(origin, destination).into(),
        }
    }
}

/// Build a straight two-vertex route with planar distance and a nominal
/// duration, or `None` for coincident endpoints.
pub fn straight_line(origin: Coord<f64>, destination: Coord<f64>) -> Option<ProviderRoute> {
    if origin == destination {
        return None;
    }
    let route = Route::new(vec![origin, destination]).ok()?;
    let projection = PlanarProjection::for_region(origin);
    let distance = projection.project_route(&route).length();
    let details = RouteDetails::new(
        distance,
        distance / STRAIGHT_LINE_SPEED,
        ["Head straight to the destination", "Arrive at the destination"],
    )
    .ok()?;
    Some(ProviderRoute::new(route, details))
}

/// Stub `RoadSnapper` returning a fixed point or a fixed error.
#[derive(Debug, Clone)]
pub struct StubSnapper {
    response: Result<Coord<f64>, SnapError>,
}

impl StubSnapper {
    /// Snap every point to `target`.
    #[must_use]
    pub fn to(target: Coord<f64>) -> Self {
        Self {
            response: Ok(target),
        }
    }

    /// Fail every lookup with `error`.
    #[must_use]
    pub fn failing(error: SnapError) -> Self {
        Self {
            response: Err(error),
        }
    }
}

#[async_trait]
impl RoadSnapper for StubSnapper {
    async fn nearest_road(&self, _point: Coord<f64>) -> Result<Coord<f64>, SnapError> {
        self.response.clone()
    }
}

/// Progress sink that keeps every event.
#[derive(Debug, Default)]
pub struct RecordingProgress {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingProgress {
    /// Events received so far, in order.
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Percentages of the events received so far.
    pub fn percentages(&self) -> Vec<u8> {
        self.events().iter().map(ProgressEvent::percent).collect()
    }
}

impl ProgressSink for RecordingProgress {
    fn report(&self, event: &ProgressEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

/// Error raised by a failing [`MemoryBatchStore`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("in-memory store rejected the batch")]
pub struct StubStoreError;

/// Batch store that keeps saved results in memory.
#[derive(Debug, Default)]
pub struct MemoryBatchStore {
    saved: Mutex<Vec<BatchResult>>,
    fail: bool,
}

impl MemoryBatchStore {
    /// A store that rejects every save.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            saved: Mutex::default(),
            fail: true,
        }
    }

    /// Results saved so far.
    pub fn saved(&self) -> Vec<BatchResult> {
        self.saved
            .lock()
            .map(|saved| saved.clone())
            .unwrap_or_default()
    }
}

impl BatchStore for MemoryBatchStore {
    type Error = StubStoreError;

    fn save(&self, result: &BatchResult) -> Result<(), Self::Error> {
        if self.fail {
            return Err(StubStoreError);
        }
        self.saved
            .lock()
            .map_err(|_| StubStoreError)?
            .push(result.clone());
        Ok(())
    }
}
