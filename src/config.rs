//! Engine configuration: defaults, JSON file, environment overrides
//!
//! Environment variables (all optional):
//!   SOLAR_DEFAULT_LAT, SOLAR_DEFAULT_LON, SOLAR_SYSTEM_LOSS_PCT,
//!   SOLAR_LOOKUP_TIMEOUT_SECS, SOLAR_MISSING_YIELD (abort|zero),
//!   SOLAR_OFFLINE (1|true), SOLAR_SPECIFIC_YIELD (kWh/kWp)

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::lookup::Coordinates;

/// What to do when the yield estimator returns nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingYieldPolicy {
    /// Fail the evaluation with `EngineError::YieldUnavailable`
    Abort,
    /// Continue with a first-year yield of 0 kWh
    ZeroYield,
}

impl FromStr for MissingYieldPolicy {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "abort" => Ok(MissingYieldPolicy::Abort),
            "zero" | "zero_yield" => Ok(MissingYieldPolicy::ZeroYield),
            other => Err(EngineError::Config(format!(
                "unknown missing-yield policy {:?} (expected abort or zero)",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Used when the address cannot be resolved
    pub default_location: Coordinates,

    /// System losses passed to the yield estimator (%)
    pub system_loss_pct: f64,

    pub missing_yield: MissingYieldPolicy,

    /// Timeout for each remote lookup; expiry counts as a failed lookup
    pub lookup_timeout_secs: u64,

    pub nominatim_url: String,
    pub pvgis_url: String,
    pub user_agent: String,

    /// Skip all remote lookups
    pub offline: bool,

    /// Specific yield (kWh per kWp and year) used in offline mode
    pub specific_yield_kwh_per_kwp: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_location: Coordinates::new(53.55, 9.99), // Hamburg
            system_loss_pct: 14.0,
            missing_yield: MissingYieldPolicy::Abort,
            lookup_timeout_secs: 10,
            nominatim_url: "https://nominatim.openstreetmap.org".to_string(),
            pvgis_url: "https://re.jrc.ec.europa.eu/api/v5_2".to_string(),
            user_agent: concat!("solar_asset_manager/", env!("CARGO_PKG_VERSION")).to_string(),
            offline: false,
            specific_yield_kwh_per_kwp: 950.0,
        }
    }
}

impl EngineConfig {
    /// Load from a JSON file; missing keys keep their defaults
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Defaults or file contents, then environment overrides
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::load(p)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Override fields from a key lookup (normally the process environment)
    pub fn apply_overrides<F>(&mut self, var: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(lat) = parse_var(&var, "SOLAR_DEFAULT_LAT")? {
            self.default_location.lat = lat;
        }
        if let Some(lon) = parse_var(&var, "SOLAR_DEFAULT_LON")? {
            self.default_location.lon = lon;
        }
        if let Some(loss) = parse_var(&var, "SOLAR_SYSTEM_LOSS_PCT")? {
            self.system_loss_pct = loss;
        }
        if let Some(secs) = parse_var(&var, "SOLAR_LOOKUP_TIMEOUT_SECS")? {
            self.lookup_timeout_secs = secs;
        }
        if let Some(policy) = parse_var(&var, "SOLAR_MISSING_YIELD")? {
            self.missing_yield = policy;
        }
        if let Some(flag) = var("SOLAR_OFFLINE") {
            self.offline = matches!(flag.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes");
        }
        if let Some(specific) = parse_var(&var, "SOLAR_SPECIFIC_YIELD")? {
            self.specific_yield_kwh_per_kwp = specific;
        }
        self.validate()
    }

    pub fn validate(&self) -> Result<()> {
        let Coordinates { lat, lon } = self.default_location;
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            return Err(EngineError::Config(format!(
                "default location {}, {} is not a valid coordinate",
                lat, lon
            )));
        }
        if !(0.0..100.0).contains(&self.system_loss_pct) {
            return Err(EngineError::Config(format!(
                "system loss must lie in [0, 100), got {}",
                self.system_loss_pct
            )));
        }
        if self.lookup_timeout_secs == 0 {
            return Err(EngineError::Config("lookup timeout must be at least 1 s".to_string()));
        }
        if !self.specific_yield_kwh_per_kwp.is_finite() || self.specific_yield_kwh_per_kwp < 0.0 {
            return Err(EngineError::Config(format!(
                "specific yield must be >= 0, got {}",
                self.specific_yield_kwh_per_kwp
            )));
        }
        Ok(())
    }

    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_secs(self.lookup_timeout_secs)
    }
}

fn parse_var<F, T>(var: &F, key: &str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match var(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| EngineError::Config(format!("{} has an invalid value: {:?}", key, raw))),
        None => Ok(None),
    }
}
