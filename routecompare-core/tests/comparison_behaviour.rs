//! Behavioural coverage for batch and single-pair comparison.

use std::cell::RefCell;
use std::sync::Arc;

use geo::Coord;
use routecompare_core::test_support::{MemoryBatchStore, RecordingProgress, StubRouteProvider};
use routecompare_core::{
    BatchRequest, BatchResult, BoundingBox, Comparator, ComparisonError, PairComparison,
    ProviderKind, ProviderRoute, ProviderSet, Route, RouteDetails, RouteProvider, RoutingOptions,
    RunGuard, RunPermit,
};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use tokio::runtime::Builder;

fn block_on<F>(future: F) -> F::Output
where
    F: std::future::Future,
{
    Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("failed to build Tokio runtime")
        .block_on(future)
}

/// Single pair location shared by the single-mode steps.
const SINGLE_POINT: Coord<f64> = Coord { x: 9.15, y: 48.83 };

/// Roughly 5 km eastwards through Stuttgart.
fn five_km_route(lat_offset: f64) -> ProviderRoute {
    let route = Route::from_lon_lat([
        (9.100, 48.800 + lat_offset),
        (9.125, 48.800 + lat_offset),
        (9.150, 48.800 + lat_offset),
        (9.168, 48.800 + lat_offset),
    ])
    .expect("valid route");
    let details = RouteDetails::new(4_990.0, 540.0, ["Head east", "Continue", "Arrive"])
        .expect("valid details");
    ProviderRoute::new(route, details)
}

#[derive(Default)]
struct ComparisonWorld {
    providers: RefCell<Vec<Arc<StubRouteProvider>>>,
    guard: RunGuard,
    held: RefCell<Option<RunPermit>>,
    store: MemoryBatchStore,
    progress: RecordingProgress,
    batch: RefCell<Option<Result<BatchResult, ComparisonError>>>,
    single: RefCell<Option<Result<PairComparison, ComparisonError>>>,
}

impl ComparisonWorld {
    fn comparator(&self) -> Comparator {
        let providers = self.providers.borrow();
        let mut iter = providers
            .iter()
            .map(|provider| Arc::clone(provider) as Arc<dyn RouteProvider>);
        let reference = iter.next().expect("reference provider configured");
        let set = ProviderSet::new(reference, iter.collect()).expect("distinct providers");
        Comparator::new(set).with_guard(self.guard.clone())
    }

    fn push(&self, provider: StubRouteProvider) {
        self.providers.borrow_mut().push(Arc::new(provider));
    }
}

#[fixture]
fn world() -> ComparisonWorld {
    ComparisonWorld::default()
}

#[given("a reference provider returning a 5 km route")]
fn given_reference(world: &ComparisonWorld) {
    world.push(StubRouteProvider::with_route(
        ProviderKind::Google,
        five_km_route(0.0),
    ));
}

#[given("a candidate provider returning the same route")]
fn given_same_candidate(world: &ComparisonWorld) {
    world.push(StubRouteProvider::with_route(
        ProviderKind::Here,
        five_km_route(0.0),
    ));
}

#[given("a candidate provider returning a route 1 km to the north")]
fn given_distant_candidate(world: &ComparisonWorld) {
    world.push(StubRouteProvider::with_route(
        ProviderKind::Here,
        five_km_route(0.009),
    ));
}

#[given("a candidate provider that always fails")]
fn given_failing_candidate(world: &ComparisonWorld) {
    world.push(StubRouteProvider::no_route(ProviderKind::Here));
}

#[given("straight-line providers")]
fn given_straight_line_providers(world: &ComparisonWorld) {
    for kind in [ProviderKind::Google, ProviderKind::Here, ProviderKind::Osrm] {
        world.push(StubRouteProvider::straight_line(kind));
    }
}

#[given("providers returning a zero-length route at the pair origin")]
fn given_zero_length_providers(world: &ComparisonWorld) {
    let route = Route::new(vec![SINGLE_POINT, SINGLE_POINT]).expect("two vertices");
    let details = RouteDetails::new(0.0, 0.0, ["Arrive at the destination"]).expect("valid");
    for kind in [ProviderKind::Google, ProviderKind::Here, ProviderKind::Osrm] {
        world.push(StubRouteProvider::with_route(
            kind,
            ProviderRoute::new(route.clone(), details.clone()),
        ));
    }
}

#[given("a comparison is already running")]
fn given_running(world: &ComparisonWorld) {
    let permit = world.guard.try_acquire().expect("guard should be idle");
    world.held.replace(Some(permit));
}

#[when("I compare {count} pairs in the default bounding box")]
fn when_compare_batch(world: &ComparisonWorld, count: usize) {
    let request = BatchRequest::new(BoundingBox::default())
        .with_pair_count(count)
        .with_seed(7);
    let comparator = world.comparator();
    let result = block_on(comparator.run_batch(&request, &world.progress, &world.store));
    world.batch.replace(Some(result));
}

#[when("I compare a single pair with identical origin and destination")]
fn when_compare_single(world: &ComparisonWorld) {
    let comparator = world.comparator();
    let result = block_on(comparator.compare_single(
        SINGLE_POINT,
        SINGLE_POINT,
        &RoutingOptions::default(),
        &world.progress,
    ));
    world.single.replace(Some(result));
}

#[when("the running comparison finishes")]
fn when_running_finishes(world: &ComparisonWorld) {
    world.held.replace(None);
}

#[then("the batch completes with {count} coverage statistics")]
fn then_batch_completes(world: &ComparisonWorld, count: usize) {
    let borrowed = world.batch.borrow();
    let result = borrowed
        .as_ref()
        .expect("batch should have run")
        .as_ref()
        .expect("batch should succeed");
    assert_eq!(result.stats().len(), count);
}

#[then("every {provider} coverage is about {expected} percent")]
fn then_every_coverage(world: &ComparisonWorld, provider: String, expected: f64) {
    let kind: ProviderKind = provider.parse().expect("known provider");
    let borrowed = world.batch.borrow();
    let result = borrowed
        .as_ref()
        .expect("batch should have run")
        .as_ref()
        .expect("batch should succeed");
    for (pair_id, stat) in result.stats() {
        let coverage = stat.coverage_for(kind).expect("candidate coverage");
        assert!(
            (coverage - expected).abs() < 0.01,
            "pair {pair_id}: {kind} coverage {coverage} differs from {expected}"
        );
    }
}

#[then("the saved {provider} route collection is empty")]
fn then_saved_collection_empty(world: &ComparisonWorld, provider: String) {
    let kind: ProviderKind = provider.parse().expect("known provider");
    let saved = world.store.saved();
    let batch = saved.first().expect("batch should be saved");
    assert!(batch.providers.contains(&kind));
    assert_eq!(batch.routes_for(kind).count(), 0);
}

#[then("progress was reported {count} times")]
fn then_progress_count(world: &ComparisonWorld, count: usize) {
    let events = world.progress.events();
    assert_eq!(events.len(), count);
    let steps: Vec<u32> = events.iter().map(|event| event.step).collect();
    assert!(steps.windows(2).all(|w| w[0] < w[1]), "steps {steps:?}");
    assert_eq!(world.progress.percentages().last(), Some(&100));
}

#[then("the single result has no coverage statistic")]
fn then_single_has_no_stat(world: &ComparisonWorld) {
    let borrowed = world.single.borrow();
    let comparison = borrowed
        .as_ref()
        .expect("single comparison should have run")
        .as_ref()
        .expect("single comparison should succeed");
    assert!(comparison.stats.is_none());
}

#[then("every provider reported a result")]
fn then_every_provider_reported(world: &ComparisonWorld) {
    let borrowed = world.single.borrow();
    let comparison = borrowed
        .as_ref()
        .expect("single comparison should have run")
        .as_ref()
        .expect("single comparison should succeed");
    let kinds: Vec<ProviderKind> = comparison.results.iter().map(|r| r.kind).collect();
    assert_eq!(
        kinds,
        vec![ProviderKind::Google, ProviderKind::Here, ProviderKind::Osrm]
    );
    assert_eq!(comparison.pair.pair_id, 0);
}

#[then("the batch is rejected as already running")]
fn then_batch_rejected(world: &ComparisonWorld) {
    let borrowed = world.batch.borrow();
    let result = borrowed.as_ref().expect("batch should have run");
    assert!(matches!(result, Err(ComparisonError::AlreadyRunning)));
    assert!(world.progress.events().is_empty());
    assert!(world.store.saved().is_empty());
}

#[then("no provider was called")]
fn then_no_provider_called(world: &ComparisonWorld) {
    assert!(
        world
            .providers
            .borrow()
            .iter()
            .all(|provider| provider.calls() == 0)
    );
}

#[scenario(path = "tests/features/route_comparison.feature", index = 0)]
fn identical_geometry(world: ComparisonWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/route_comparison.feature", index = 1)]
fn distant_geometry(world: ComparisonWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/route_comparison.feature", index = 2)]
fn failing_candidate(world: ComparisonWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/route_comparison.feature", index = 3)]
fn coincident_endpoints(world: ComparisonWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/route_comparison.feature", index = 4)]
fn second_run_rejected(world: ComparisonWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/route_comparison.feature", index = 5)]
fn zero_length_reference(world: ComparisonWorld) {
    let _ = world;
}
