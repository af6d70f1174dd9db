//! External lookups consumed by the engine: geocoding and first-year yield
//!
//! Both lookups are fallible remote calls. Implementations never return
//! errors; they log the cause and answer `None`, and the engine decides how to
//! substitute a default.

mod cache;
mod nominatim;
mod offline;
mod pvgis;

pub use cache::{CacheStats, CachedEstimator, CachedResolver};
pub use nominatim::NominatimResolver;
pub use offline::{NoopResolver, SpecificYieldEstimator};
pub use pvgis::PvgisEstimator;

use serde::{Deserialize, Serialize};

use crate::params::PanelGeometry;

/// Geographic position in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Everything the yield estimator needs for one installation
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct YieldRequest {
    pub coordinates: Coordinates,
    pub kwp: f64,
    pub geometry: PanelGeometry,
    /// System losses (cabling, inverter, soiling) in %
    pub system_loss_pct: f64,
}

/// Turns a free-text address into coordinates
pub trait AddressResolver: Send + Sync {
    fn resolve(&self, address: &str) -> Option<Coordinates>;

    /// Hit/miss counters when the resolver memoizes its answers
    fn cache_stats(&self) -> Option<CacheStats> {
        None
    }
}

/// Estimates the first-year energy yield (kWh) of an installation
pub trait YieldEstimator: Send + Sync {
    fn estimate(&self, request: &YieldRequest) -> Option<f64>;

    /// Hit/miss counters when the estimator memoizes its answers
    fn cache_stats(&self) -> Option<CacheStats> {
        None
    }
}

impl<T: AddressResolver + ?Sized> AddressResolver for Box<T> {
    fn resolve(&self, address: &str) -> Option<Coordinates> {
        (**self).resolve(address)
    }

    fn cache_stats(&self) -> Option<CacheStats> {
        (**self).cache_stats()
    }
}

impl<T: YieldEstimator + ?Sized> YieldEstimator for Box<T> {
    fn estimate(&self, request: &YieldRequest) -> Option<f64> {
        (**self).estimate(request)
    }

    fn cache_stats(&self) -> Option<CacheStats> {
        (**self).cache_stats()
    }
}
