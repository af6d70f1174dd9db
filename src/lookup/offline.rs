//! Lookups that never touch the network

use super::{AddressResolver, Coordinates, YieldEstimator, YieldRequest};

/// Never resolves; the engine falls back to its default location
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopResolver;

impl AddressResolver for NoopResolver {
    fn resolve(&self, _address: &str) -> Option<Coordinates> {
        None
    }
}

/// Yield from a flat specific yield: `kWp × kWh/kWp`
///
/// Ignores location and orientation. Typical values are 850–1000 kWh/kWp
/// for Germany.
#[derive(Debug, Clone, Copy)]
pub struct SpecificYieldEstimator {
    pub kwh_per_kwp: f64,
}

impl SpecificYieldEstimator {
    pub fn new(kwh_per_kwp: f64) -> Self {
        Self { kwh_per_kwp }
    }
}

impl YieldEstimator for SpecificYieldEstimator {
    fn estimate(&self, request: &YieldRequest) -> Option<f64> {
        Some(request.kwp.max(0.0) * self.kwh_per_kwp)
    }
}
