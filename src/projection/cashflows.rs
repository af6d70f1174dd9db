//! Cash-flow output structures for scenario projections

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Number of projected operating years
pub const HORIZON_YEARS: u32 = 20;

/// Length of a cash-flow series: the outlay at index 0 plus one entry per year
pub const SERIES_LEN: usize = HORIZON_YEARS as usize + 1;

/// A single projected operating year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlyCashFlow {
    /// Operating year, 1-based
    pub year: u32,

    /// Degraded production (kWh)
    pub production_kwh: f64,

    // Prices applied this year (currency/kWh)
    pub internal_price: f64,
    pub export_price: f64,

    pub revenue: f64,
    pub cost: f64,

    /// One-time replacement paid this year (worst case only)
    pub replacement: f64,

    /// revenue - cost - replacement
    pub net: f64,
}

/// Yearly cash flows indexed by elapsed years: index 0 is `-CAPEX`,
/// indices 1..=20 the net flow of each operating year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CashFlowSeries(Vec<f64>);

impl CashFlowSeries {
    /// Assemble the series from the outlay and the projected years
    pub(crate) fn from_years(capex: f64, years: &[YearlyCashFlow]) -> Self {
        let mut values = Vec::with_capacity(SERIES_LEN);
        values.push(-capex);
        values.extend(years.iter().map(|y| y.net));
        Self(values)
    }

    /// Wrap an existing series; the length must be [`SERIES_LEN`]
    pub fn from_values(values: Vec<f64>) -> Result<Self> {
        if values.len() != SERIES_LEN {
            return Err(EngineError::invalid(
                "series",
                format!("expected {} values, got {}", SERIES_LEN, values.len()),
            ));
        }
        Ok(Self(values))
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The (negative) initial outlay
    pub fn initial_outlay(&self) -> f64 {
        self.0.first().copied().unwrap_or(0.0)
    }

    /// Net flow of an operating year (1-based)
    pub fn net_for_year(&self, year: u32) -> Option<f64> {
        if year == 0 {
            return None;
        }
        self.0.get(year as usize).copied()
    }

    /// Undiscounted sum of all flows
    pub fn total(&self) -> f64 {
        self.0.iter().sum()
    }

    /// Running sum of the series, same length and indexing
    pub fn cumulative_balance(&self) -> Vec<f64> {
        self.0
            .iter()
            .scan(0.0, |running, cf| {
                *running += cf;
                Some(*running)
            })
            .collect()
    }

    /// Number of sign changes, ignoring zeros
    ///
    /// More than one change means the IRR is not unique.
    pub fn sign_changes(&self) -> usize {
        let signs: Vec<bool> = self
            .0
            .iter()
            .filter(|cf| cf.abs() > 1e-10)
            .map(|cf| *cf > 0.0)
            .collect();
        signs.windows(2).filter(|w| w[0] != w[1]).count()
    }
}

impl AsRef<[f64]> for CashFlowSeries {
    fn as_ref(&self) -> &[f64] {
        &self.0
    }
}
