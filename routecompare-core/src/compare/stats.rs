//! Per-pair coverage statistics.

use std::collections::BTreeMap;

use crate::{ProviderKind, RouteDetails};

/// Coverage of each candidate against the reference route of one pair.
///
/// Only produced when the reference provider returned a route. Every
/// candidate has a coverage entry (0 when it found nothing) and every
/// provider, reference included, has a details entry (`None` when absent).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CoverageStat {
    /// Provider whose route defines the corridor.
    pub reference: ProviderKind,
    /// Coverage percentage in `[0, 100]` per candidate provider.
    pub coverage: BTreeMap<ProviderKind, f64>,
    /// Route details per provider.
    pub details: BTreeMap<ProviderKind, Option<RouteDetails>>,
}

impl CoverageStat {
    /// Coverage for `kind`, if it was a candidate.
    pub fn coverage_for(&self, kind: ProviderKind) -> Option<f64> {
        self.coverage.get(&kind).copied()
    }

    /// Details for `kind`, if that provider returned a route.
    pub fn details_for(&self, kind: ProviderKind) -> Option<&RouteDetails> {
        self.details.get(&kind).and_then(Option::as_ref)
    }
}
