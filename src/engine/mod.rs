//! Financial engine: runs both scenarios for a site and derives NPV, IRR,
//! payback and the overall diagnosis
//!
//! Lookups are injected as trait objects, so the same engine serves the
//! online CLI (Nominatim + PVGIS behind a cache), offline runs and tests.

mod result;

pub use result::{
    Diagnosis, Evaluation, LocationSource, Payback, ResolvedLocation, ScenarioAnalysis,
    ScenarioResult, YieldSource,
};

use crate::config::{EngineConfig, MissingYieldPolicy};
use crate::error::{EngineError, Result};
use crate::lookup::{
    AddressResolver, CacheStats, CachedEstimator, CachedResolver, Coordinates, NominatimResolver,
    NoopResolver, PvgisEstimator, SpecificYieldEstimator, YieldEstimator, YieldRequest,
};
use crate::params::{InvestmentParameters, PanelGeometry, SiteInputs};
use crate::projection::{calculate_irr, npv, CashFlowSeries, Scenario, ScenarioProjector};

/// Cache counters of both lookups; `None` for a lookup without a cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LookupStats {
    pub geocoding: Option<CacheStats>,
    pub yields: Option<CacheStats>,
}

pub struct FinancialEngine {
    config: EngineConfig,
    resolver: Box<dyn AddressResolver>,
    estimator: Box<dyn YieldEstimator>,
}

impl FinancialEngine {
    pub fn new(
        config: EngineConfig,
        resolver: impl AddressResolver + 'static,
        estimator: impl YieldEstimator + 'static,
    ) -> Self {
        Self {
            config,
            resolver: Box::new(resolver),
            estimator: Box::new(estimator),
        }
    }

    /// Cached Nominatim + PVGIS clients, or the offline lookups when
    /// `config.offline` is set
    pub fn from_config(config: EngineConfig) -> Result<Self> {
        if config.offline {
            let estimator = SpecificYieldEstimator::new(config.specific_yield_kwh_per_kwp);
            return Ok(Self::new(config, NoopResolver, estimator));
        }

        let timeout = config.lookup_timeout();
        let resolver = NominatimResolver::new(&config.nominatim_url, &config.user_agent, timeout)
            .map_err(|e| EngineError::Config(format!("geocoding client: {}", e)))?;
        let estimator = PvgisEstimator::new(&config.pvgis_url, &config.user_agent, timeout)
            .map_err(|e| EngineError::Config(format!("PVGIS client: {}", e)))?;

        Ok(Self::new(
            config,
            CachedResolver::new(resolver),
            CachedEstimator::new(estimator),
        ))
    }

    /// Counters of the geocoding and yield caches, where the lookups are cached
    pub fn lookup_stats(&self) -> LookupStats {
        LookupStats {
            geocoding: self.resolver.cache_stats(),
            yields: self.estimator.cache_stats(),
        }
    }

    /// Validate raw inputs, resolve location and yield, run both scenarios
    pub fn evaluate(&self, inputs: &SiteInputs) -> Result<Evaluation> {
        let params = InvestmentParameters::from_inputs(inputs)?;
        let geometry = inputs.geometry()?;
        let location = self.locate(&inputs.address);
        self.evaluate_at(&params, location, geometry)
    }

    /// Evaluate already validated parameters at caller-supplied coordinates
    pub fn evaluate_parameters(
        &self,
        params: &InvestmentParameters,
        coordinates: Coordinates,
        geometry: PanelGeometry,
    ) -> Result<Evaluation> {
        let location = ResolvedLocation {
            coordinates,
            source: LocationSource::Resolved,
        };
        self.evaluate_at(params, location, geometry)
    }

    fn evaluate_at(
        &self,
        params: &InvestmentParameters,
        location: ResolvedLocation,
        geometry: PanelGeometry,
    ) -> Result<Evaluation> {
        params.validate()?;

        let (base_yield_kwh, yield_source) =
            self.first_year_yield(params, location.coordinates, geometry)?;
        let analysis = evaluate_with_yield(params, base_yield_kwh)?;

        log::info!(
            "{:.2} kWp at {:.4}, {:.4}: yield {:.0} kWh, NPV {:.0} / {:.0}, {:?}",
            params.capacity_kwp,
            location.coordinates.lat,
            location.coordinates.lon,
            base_yield_kwh,
            analysis.average.npv,
            analysis.worst.npv,
            analysis.diagnosis
        );

        Ok(Evaluation {
            location,
            base_yield_kwh,
            yield_source,
            parameters: params.clone(),
            analysis,
        })
    }

    /// Resolved coordinates, or the configured default location
    pub fn locate(&self, address: &str) -> ResolvedLocation {
        let resolved = if address.trim().is_empty() {
            None
        } else {
            self.resolver.resolve(address)
        };

        match resolved {
            Some(coordinates) => ResolvedLocation {
                coordinates,
                source: LocationSource::Resolved,
            },
            None => {
                let fallback = self.config.default_location;
                log::warn!(
                    "address {:?} not resolved, using default location {:.4}, {:.4}",
                    address,
                    fallback.lat,
                    fallback.lon
                );
                ResolvedLocation {
                    coordinates: fallback,
                    source: LocationSource::Default,
                }
            }
        }
    }

    fn first_year_yield(
        &self,
        params: &InvestmentParameters,
        coordinates: Coordinates,
        geometry: PanelGeometry,
    ) -> Result<(f64, YieldSource)> {
        if params.capacity_kwp <= 0.0 {
            return Ok((0.0, YieldSource::ZeroCapacity));
        }

        let request = YieldRequest {
            coordinates,
            kwp: params.capacity_kwp,
            geometry,
            system_loss_pct: self.config.system_loss_pct,
        };

        let estimate = match self.estimator.estimate(&request) {
            Some(kwh) if kwh.is_finite() && kwh >= 0.0 => Some(kwh),
            Some(kwh) => {
                log::warn!("discarding unusable yield estimate {}", kwh);
                None
            }
            None => None,
        };

        match (estimate, self.config.missing_yield) {
            (Some(kwh), _) => Ok((kwh, YieldSource::Estimated)),
            (None, MissingYieldPolicy::Abort) => Err(EngineError::YieldUnavailable {
                lat: coordinates.lat,
                lon: coordinates.lon,
            }),
            (None, MissingYieldPolicy::ZeroYield) => {
                log::warn!("yield unavailable, continuing with 0 kWh");
                Ok((0.0, YieldSource::ZeroFallback))
            }
        }
    }
}

/// Run both scenarios from one first-year yield; no lookups involved
pub fn evaluate_with_yield(
    params: &InvestmentParameters,
    base_yield_kwh: f64,
) -> Result<ScenarioAnalysis> {
    if !base_yield_kwh.is_finite() || base_yield_kwh < 0.0 {
        return Err(EngineError::invalid(
            "base_yield_kwh",
            format!("must be finite and >= 0, got {}", base_yield_kwh),
        ));
    }

    let average = run_scenario(params, base_yield_kwh, Scenario::Average)?;
    let worst = run_scenario(params, base_yield_kwh, Scenario::WorstCase)?;
    let diagnosis = Diagnosis::classify(average.npv, worst.npv);

    Ok(ScenarioAnalysis {
        average,
        worst,
        diagnosis,
    })
}

fn run_scenario(
    params: &InvestmentParameters,
    base_yield_kwh: f64,
    scenario: Scenario,
) -> Result<ScenarioResult> {
    let years = ScenarioProjector::new(params).project_years(base_yield_kwh, scenario);
    let series = CashFlowSeries::from_years(params.capex, &years);
    let cumulative_balance = series.cumulative_balance();

    let npv = npv(series.as_slice(), params.wacc)?;
    let irr = match scenario {
        Scenario::Average => {
            let irr = calculate_irr(series.as_slice());
            let changes = series.sign_changes();
            if irr.is_some() && changes > 1 {
                log::warn!(
                    "average case changes sign {} times; the IRR is one of several roots",
                    changes
                );
            }
            irr
        }
        Scenario::WorstCase => None,
    };
    let payback = Payback::from_cumulative(&cumulative_balance);

    Ok(ScenarioResult {
        scenario,
        years,
        series,
        cumulative_balance,
        npv,
        irr,
        payback,
    })
}
