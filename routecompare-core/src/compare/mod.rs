//! Batch and single-pair route comparison.
//!
//! A [`Comparator`] owns a [`ProviderSet`] (one reference provider plus the
//! candidates scored against it), the shared [`RunGuard`], the coverage
//! scorer and an optional road snapper.
//!
//! A batch moves through pair generation, one fetch step per pair and a save
//! step. Every step emits one [`ProgressEvent`], so a batch of `N` pairs
//! reports `N + 2` events. Pairs are fetched one after another; within a
//! pair all providers are queried concurrently and joined before the next
//! pair starts.

mod error;
mod guard;
mod progress;
mod stats;
mod store;

use std::collections::BTreeMap;
use std::sync::Arc;

use futures_util::future::join_all;
use geo::Coord;
use log::{debug, info, warn};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::{
    BoundingBox, CoverageScorer, NUM_ROUTES, OdPair, PlanarProjection, ProviderKind, ProviderRoute,
    RoadSnapper, RouteOutcome, RouteProvider, RoutingOptions, sample_pairs, snap_or_original,
};

pub use error::ComparisonError;
pub use guard::{RunGuard, RunPermit};
pub use progress::{NoProgress, ProgressEvent, ProgressSink};
pub use stats::CoverageStat;
pub use store::BatchStore;

/// The providers queried for every pair.
///
/// The reference provider's route defines the corridor; every candidate is
/// scored against it.
#[derive(Clone)]
pub struct ProviderSet {
    reference: Arc<dyn RouteProvider>,
    candidates: Vec<Arc<dyn RouteProvider>>,
}

impl std::fmt::Debug for ProviderSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderSet")
            .field("kinds", &self.kinds())
            .finish()
    }
}

impl ProviderSet {
    /// Combine a reference provider with its candidates.
    ///
    /// # Errors
    ///
    /// Returns [`ComparisonError::DuplicateProvider`] when two providers
    /// report the same [`ProviderKind`].
    pub fn new(
        reference: Arc<dyn RouteProvider>,
        candidates: Vec<Arc<dyn RouteProvider>>,
    ) -> Result<Self, ComparisonError> {
        let mut seen = vec![reference.kind()];
        for candidate in &candidates {
            let kind = candidate.kind();
            if seen.contains(&kind) {
                return Err(ComparisonError::DuplicateProvider { kind });
            }
            seen.push(kind);
        }
        Ok(Self {
            reference,
            candidates,
        })
    }

    /// Kind of the reference provider.
    pub fn reference_kind(&self) -> ProviderKind {
        self.reference.kind()
    }

    /// Every provider kind, reference first.
    pub fn kinds(&self) -> Vec<ProviderKind> {
        self.iter().map(|provider| provider.kind()).collect()
    }

    fn iter(&self) -> impl Iterator<Item = &Arc<dyn RouteProvider>> {
        std::iter::once(&self.reference).chain(self.candidates.iter())
    }
}

/// Parameters of one batch run.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchRequest {
    /// Region to sample; must have area.
    pub bbox: BoundingBox,
    /// Number of pairs to compare.
    pub pair_count: usize,
    /// Options passed to every provider.
    pub options: RoutingOptions,
    /// Seed for reproducible sampling; OS entropy when `None`.
    pub seed: Option<u64>,
    /// Snap sampled points to the road network before routing.
    pub snap_to_road: bool,
}

impl BatchRequest {
    /// A request for [`NUM_ROUTES`] pairs in `bbox` with default options.
    pub fn new(bbox: BoundingBox) -> Self {
        Self {
            bbox,
            pair_count: NUM_ROUTES,
            options: RoutingOptions::default(),
            seed: None,
            snap_to_road: false,
        }
    }

    /// Override the number of pairs.
    #[must_use]
    pub fn with_pair_count(mut self, pair_count: usize) -> Self {
        self.pair_count = pair_count;
        self
    }

    /// Override the routing options.
    #[must_use]
    pub fn with_options(mut self, options: RoutingOptions) -> Self {
        self.options = options;
        self
    }

    /// Fix the sampling seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Enable or disable road snapping.
    #[must_use]
    pub fn with_snapping(mut self, snap_to_road: bool) -> Self {
        self.snap_to_road = snap_to_road;
        self
    }
}

/// What one provider returned for one pair.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderResult {
    /// Provider that answered.
    pub kind: ProviderKind,
    /// Route or absence.
    pub outcome: RouteOutcome,
}

/// Outcome of comparing every provider on one pair.
#[derive(Debug, Clone, PartialEq)]
pub struct PairComparison {
    /// The pair that was routed.
    pub pair: OdPair,
    /// One entry per provider, reference first.
    pub results: Vec<ProviderResult>,
    /// Present only when the reference provider found a route.
    pub stats: Option<CoverageStat>,
}

impl PairComparison {
    /// Outcome reported by `kind`, if that provider took part.
    pub fn outcome(&self, kind: ProviderKind) -> Option<&RouteOutcome> {
        self.results
            .iter()
            .find(|result| result.kind == kind)
            .map(|result| &result.outcome)
    }
}

/// Everything produced by one batch.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchResult {
    /// Providers that took part, reference first.
    pub providers: Vec<ProviderKind>,
    /// One comparison per pair, in pair-id order.
    pub pairs: Vec<PairComparison>,
}

impl BatchResult {
    /// Routes found by `kind`, keyed by pair id.
    pub fn routes_for(&self, kind: ProviderKind) -> impl Iterator<Item = (u32, &ProviderRoute)> {
        self.pairs.iter().filter_map(move |comparison| {
            comparison
                .outcome(kind)
                .and_then(RouteOutcome::provider_route)
                .map(|route| (comparison.pair.pair_id, route))
        })
    }

    /// Coverage statistics keyed by pair id; pairs without a reference
    /// route are omitted.
    pub fn stats(&self) -> BTreeMap<u32, &CoverageStat> {
        self.pairs
            .iter()
            .filter_map(|comparison| {
                comparison
                    .stats
                    .as_ref()
                    .map(|stat| (comparison.pair.pair_id, stat))
            })
            .collect()
    }
}

/// Runs comparisons across a [`ProviderSet`].
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use routecompare_core::test_support::StubRouteProvider;
/// use routecompare_core::{Comparator, ProviderKind, ProviderSet, RouteProvider};
///
/// let candidate: Arc<dyn RouteProvider> =
///     Arc::new(StubRouteProvider::straight_line(ProviderKind::Here));
/// let providers = ProviderSet::new(
///     Arc::new(StubRouteProvider::straight_line(ProviderKind::Google)),
///     vec![candidate],
/// )?;
/// let comparator = Comparator::new(providers);
/// assert!(!comparator.guard().is_busy());
/// # Ok::<(), routecompare_core::ComparisonError>(())
/// ```
#[derive(Clone)]
pub struct Comparator {
    providers: ProviderSet,
    guard: RunGuard,
    scorer: CoverageScorer,
    snapper: Option<Arc<dyn RoadSnapper>>,
}

impl std::fmt::Debug for Comparator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Comparator")
            .field("providers", &self.providers)
            .field("guard", &self.guard)
            .field("scorer", &self.scorer)
            .field("snapper", &self.snapper.is_some())
            .finish()
    }
}

impl Comparator {
    /// Build a comparator with a private guard and the default scorer.
    ///
    /// Separately built comparators do not exclude each other; share one
    /// [`RunGuard`] through [`Comparator::with_guard`] for process-wide
    /// exclusion.
    pub fn new(providers: ProviderSet) -> Self {
        Self {
            providers,
            guard: RunGuard::default(),
            scorer: CoverageScorer::default(),
            snapper: None,
        }
    }

    /// Share `guard` with other comparators.
    #[must_use]
    pub fn with_guard(mut self, guard: RunGuard) -> Self {
        self.guard = guard;
        self
    }

    /// Replace the coverage scorer.
    #[must_use]
    pub fn with_scorer(mut self, scorer: CoverageScorer) -> Self {
        self.scorer = scorer;
        self
    }

    /// Snap sampled points through `snapper` when a batch asks for it.
    #[must_use]
    pub fn with_snapper(mut self, snapper: Arc<dyn RoadSnapper>) -> Self {
        self.snapper = Some(snapper);
        self
    }

    /// The run guard; [`RunGuard::is_busy`] is the busy signal.
    pub fn guard(&self) -> &RunGuard {
        &self.guard
    }

    /// The providers queried for every pair.
    pub fn providers(&self) -> &ProviderSet {
        &self.providers
    }

    /// Compare `request.pair_count` random pairs and save the result.
    ///
    /// # Errors
    ///
    /// Fails before any provider call with
    /// [`ComparisonError::AlreadyRunning`],
    /// [`ComparisonError::InvalidBoundingBox`] or
    /// [`ComparisonError::EmptyBatch`], and after fetching with
    /// [`ComparisonError::Save`] when the store rejects the result.
    pub async fn run_batch<S>(
        &self,
        request: &BatchRequest,
        progress: &dyn ProgressSink,
        store: &S,
    ) -> Result<BatchResult, ComparisonError>
    where
        S: BatchStore + ?Sized,
    {
        let _permit = self
            .guard
            .try_acquire()
            .ok_or(ComparisonError::AlreadyRunning)?;
        let bbox = request.bbox.require_area()?;
        if request.pair_count == 0 {
            return Err(ComparisonError::EmptyBatch);
        }
        let total = u32::try_from(request.pair_count)
            .unwrap_or(u32::MAX)
            .saturating_add(2);

        let mut rng = request
            .seed
            .map_or_else(ChaCha8Rng::from_entropy, ChaCha8Rng::seed_from_u64);
        let mut pairs = sample_pairs(&bbox, request.pair_count, &mut rng);
        if request.snap_to_road {
            self.snap_pairs(&mut pairs).await;
        }
        progress.report(&ProgressEvent::new(
            1,
            total,
            format!("Generated {} origin/destination pairs", pairs.len()),
        ));

        let projection = PlanarProjection::for_region(bbox.center());
        let mut comparisons = Vec::with_capacity(pairs.len());
        for (step, pair) in (2..).zip(pairs) {
            info!(
                "processing route {}/{} from ({}, {}) to ({}, {})",
                pair.pair_id + 1,
                request.pair_count,
                pair.origin.x,
                pair.origin.y,
                pair.destination.x,
                pair.destination.y
            );
            let comparison = self.compare_pair(pair, &request.options, &projection).await;
            comparisons.push(comparison);
            progress.report(&ProgressEvent::new(
                step,
                total,
                format!("Processed route {}/{}", pair.pair_id + 1, request.pair_count),
            ));
        }

        let result = BatchResult {
            providers: self.providers.kinds(),
            pairs: comparisons,
        };
        store.save(&result).map_err(|err| ComparisonError::Save {
            source: Box::new(err),
        })?;
        progress.report(&ProgressEvent::new(total, total, "Saved comparison results"));
        Ok(result)
    }

    /// Compare one explicit origin/destination pair.
    ///
    /// The pair gets id 0 and the projection is chosen from its midpoint. A
    /// single completion event is reported.
    ///
    /// # Errors
    ///
    /// Returns [`ComparisonError::InvalidCoordinate`] for a non-finite or
    /// out-of-range coordinate and [`ComparisonError::AlreadyRunning`] when
    /// the guard is held.
    pub async fn compare_single(
        &self,
        origin: Coord<f64>,
        destination: Coord<f64>,
        options: &RoutingOptions,
        progress: &dyn ProgressSink,
    ) -> Result<PairComparison, ComparisonError> {
        validate_coordinate("origin", origin)?;
        validate_coordinate("destination", destination)?;
        let _permit = self
            .guard
            .try_acquire()
            .ok_or(ComparisonError::AlreadyRunning)?;

        let midpoint = Coord {
            x: (origin.x + destination.x) / 2.0,
            y: (origin.y + destination.y) / 2.0,
        };
        let projection = PlanarProjection::for_region(midpoint);
        let pair = OdPair {
            pair_id: 0,
            origin,
            destination,
        };
        let comparison = self.compare_pair(pair, options, &projection).await;
        progress.report(&ProgressEvent::new(1, 1, "Route comparison complete"));
        Ok(comparison)
    }

    async fn snap_pairs(&self, pairs: &mut [OdPair]) {
        let Some(snapper) = self.snapper.as_deref() else {
            warn!("road snapping requested but no snapper is configured; using raw points");
            return;
        };
        for pair in pairs {
            pair.origin = snap_or_original(snapper, pair.origin).await.coord;
            pair.destination = snap_or_original(snapper, pair.destination).await.coord;
        }
    }

    async fn compare_pair(
        &self,
        pair: OdPair,
        options: &RoutingOptions,
        projection: &PlanarProjection,
    ) -> PairComparison {
        let calls = self.providers.iter().map(|provider| async move {
            let kind = provider.kind();
            debug!("requesting {kind} route for pair {}", pair.pair_id);
            let outcome = provider.route(pair.origin, pair.destination, options).await;
            if !outcome.is_found() {
                debug!("{kind} returned no route for pair {}", pair.pair_id);
            }
            ProviderResult { kind, outcome }
        });
        let results = join_all(calls).await;
        let stats = self.coverage_stat(&results, projection);
        PairComparison {
            pair,
            results,
            stats,
        }
    }

    fn coverage_stat(
        &self,
        results: &[ProviderResult],
        projection: &PlanarProjection,
    ) -> Option<CoverageStat> {
        let reference_kind = self.providers.reference_kind();
        let reference = results
            .iter()
            .find(|result| result.kind == reference_kind)?
            .outcome
            .route()?;
        let planar_reference = projection.project_route(reference);
        if planar_reference.length() <= 0.0 {
            debug!("{reference_kind} returned a zero-length route; skipping coverage");
            return None;
        }
        let corridor = self.scorer.corridor(&planar_reference);
        let coverage = results
            .iter()
            .filter(|result| result.kind != reference_kind)
            .map(|result| {
                let planar = result
                    .outcome
                    .route()
                    .map(|route| projection.project_route(route));
                (result.kind, corridor.coverage(planar.as_ref()))
            })
            .collect();
        let details = results
            .iter()
            .map(|result| (result.kind, result.outcome.details().cloned()))
            .collect();
        Some(CoverageStat {
            reference: reference_kind,
            coverage,
            details,
        })
    }
}

fn validate_coordinate(role: &'static str, coord: Coord<f64>) -> Result<(), ComparisonError> {
    let valid = coord.x.is_finite()
        && coord.y.is_finite()
        && (-180.0..=180.0).contains(&coord.x)
        && (-90.0..=90.0).contains(&coord.y);
    if valid {
        Ok(())
    } else {
        Err(ComparisonError::InvalidCoordinate {
            role,
            lon: coord.x,
            lat: coord.y,
        })
    }
}
