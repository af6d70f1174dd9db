//! Site inputs as collected from a user and the validated investment parameters

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::projection::HORIZON_YEARS;

/// Roof or ground area needed per kWp of installed capacity (m²)
pub const M2_PER_KWP: f64 = 6.0;

/// How the installed capacity is specified
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum CapacityInput {
    /// Usable area in m², converted with [`M2_PER_KWP`]
    Area { m2: f64 },
    /// Nameplate capacity entered directly
    Direct { kwp: f64 },
}

impl CapacityInput {
    /// Installed capacity in kWp
    pub fn kwp(&self) -> f64 {
        match *self {
            CapacityInput::Area { m2 } => m2 / M2_PER_KWP,
            CapacityInput::Direct { kwp } => kwp,
        }
    }
}

/// How the capital expenditure is specified
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum CapexInput {
    /// Price per kWp, multiplied by the installed capacity
    PerKwp { eur_per_kwp: f64 },
    /// Total investment
    Total { eur: f64 },
}

impl CapexInput {
    pub fn capex(&self, kwp: f64) -> f64 {
        match *self {
            CapexInput::PerKwp { eur_per_kwp } => kwp * eur_per_kwp,
            CapexInput::Total { eur } => eur,
        }
    }
}

/// Panel orientation handed to the yield estimator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PanelGeometry {
    /// 0 = flat, 90 = vertical
    pub tilt_deg: f64,
    /// 0 = south, -90 = east, 90 = west
    pub azimuth_deg: f64,
}

impl PanelGeometry {
    pub fn new(tilt_deg: f64, azimuth_deg: f64) -> Result<Self> {
        if !(0.0..=90.0).contains(&tilt_deg) {
            return Err(EngineError::invalid(
                "tilt_deg",
                format!("must lie in [0, 90], got {}", tilt_deg),
            ));
        }
        if !(-180.0..=180.0).contains(&azimuth_deg) {
            return Err(EngineError::invalid(
                "azimuth_deg",
                format!("must lie in [-180, 180], got {}", azimuth_deg),
            ));
        }
        Ok(Self { tilt_deg, azimuth_deg })
    }
}

impl Default for PanelGeometry {
    fn default() -> Self {
        Self {
            tilt_deg: 35.0,
            azimuth_deg: 0.0,
        }
    }
}

/// Raw inputs for one site, in the units a user enters them
/// (percent, ct/kWh, currency)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteInputs {
    /// Free-text location, resolved to coordinates by the geocoder
    pub address: String,

    pub tilt_deg: f64,
    pub azimuth_deg: f64,

    pub capacity: CapacityInput,
    pub capex: CapexInput,

    /// Annual operating cost as % of CAPEX
    pub opex_pct: f64,

    /// Share of production consumed on site (%)
    pub self_use_pct: f64,

    /// Grid purchase price avoided by self-consumption (ct/kWh)
    pub purchase_price_ct: f64,

    /// Price received for exported energy (ct/kWh)
    pub export_price_ct: f64,

    /// Weighted average cost of capital (%)
    pub wacc_pct: f64,

    // Fine tuning
    pub degradation_avg_pct: f64,
    pub degradation_worst_pct: f64,
    pub inflation_pct: f64,
    pub merit_order_drop_pct: f64,

    /// One-time replacement in the worst case (e.g. inverter)
    pub replacement_cost: f64,
    pub replacement_year: u32,
}

impl Default for SiteInputs {
    fn default() -> Self {
        Self {
            address: "Mönckebergstraße, Hamburg".to_string(),
            tilt_deg: 35.0,
            azimuth_deg: 0.0,
            capacity: CapacityInput::Area { m2: 500.0 },
            capex: CapexInput::PerKwp { eur_per_kwp: 1100.0 },
            opex_pct: 1.0,
            self_use_pct: 40.0,
            purchase_price_ct: 28.0,
            export_price_ct: 8.0,
            wacc_pct: 6.0,
            degradation_avg_pct: 0.5,
            degradation_worst_pct: 1.0,
            inflation_pct: 2.0,
            merit_order_drop_pct: 1.0,
            replacement_cost: 2000.0,
            replacement_year: 10,
        }
    }
}

impl SiteInputs {
    /// Validated panel orientation
    pub fn geometry(&self) -> Result<PanelGeometry> {
        PanelGeometry::new(self.tilt_deg, self.azimuth_deg)
    }
}

/// Validated, immutable parameters of one investment
///
/// All rates are fractions (0.02 = 2 %), prices are currency per kWh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestmentParameters {
    pub capacity_kwp: f64,
    pub capex: f64,
    /// Fixed annual operating cost in year 1 (escalated with inflation)
    pub opex: f64,
    pub self_use: f64,
    pub purchase_price: f64,
    pub export_price: f64,
    pub wacc: f64,
    pub degradation_avg: f64,
    pub degradation_worst: f64,
    pub inflation: f64,
    pub merit_order_drop: f64,
    pub replacement_cost: f64,
    /// Year (1-based) in which the worst case pays the replacement
    pub replacement_year: u32,
}

impl InvestmentParameters {
    /// Convert user units to fractions, derive capacity, CAPEX and OPEX, then validate
    pub fn from_inputs(inputs: &SiteInputs) -> Result<Self> {
        match inputs.capacity {
            CapacityInput::Area { m2 } => non_negative("area_m2", m2)?,
            CapacityInput::Direct { kwp } => non_negative("capacity_kwp", kwp)?,
        }
        match inputs.capex {
            CapexInput::PerKwp { eur_per_kwp } => non_negative("eur_per_kwp", eur_per_kwp)?,
            CapexInput::Total { eur } => non_negative("capex", eur)?,
        }
        non_negative("opex_pct", inputs.opex_pct)?;

        let capacity_kwp = inputs.capacity.kwp();
        let capex = inputs.capex.capex(capacity_kwp);
        let opex_rate = inputs.opex_pct / 100.0;

        let params = Self {
            capacity_kwp,
            capex,
            opex: capex * opex_rate,
            self_use: inputs.self_use_pct / 100.0,
            purchase_price: inputs.purchase_price_ct / 100.0,
            export_price: inputs.export_price_ct / 100.0,
            wacc: inputs.wacc_pct / 100.0,
            degradation_avg: inputs.degradation_avg_pct / 100.0,
            degradation_worst: inputs.degradation_worst_pct / 100.0,
            inflation: inputs.inflation_pct / 100.0,
            merit_order_drop: inputs.merit_order_drop_pct / 100.0,
            replacement_cost: inputs.replacement_cost,
            replacement_year: inputs.replacement_year,
        };
        params.validate()?;
        Ok(params)
    }

    /// Check the invariants the engine relies on
    pub fn validate(&self) -> Result<()> {
        non_negative("capacity_kwp", self.capacity_kwp)?;
        non_negative("capex", self.capex)?;
        non_negative("opex", self.opex)?;
        non_negative("purchase_price", self.purchase_price)?;
        non_negative("export_price", self.export_price)?;
        non_negative("replacement_cost", self.replacement_cost)?;

        if !(0.0..=1.0).contains(&self.self_use) {
            return Err(EngineError::invalid(
                "self_use",
                format!("must lie in [0, 1], got {}", self.self_use),
            ));
        }

        above_minus_one("wacc", self.wacc)?;
        above_minus_one("inflation", self.inflation)?;

        unit_decay("degradation_avg", self.degradation_avg)?;
        unit_decay("degradation_worst", self.degradation_worst)?;
        unit_decay("merit_order_drop", self.merit_order_drop)?;

        if !(1..=HORIZON_YEARS).contains(&self.replacement_year) {
            return Err(EngineError::invalid(
                "replacement_year",
                format!("must lie in 1..={}, got {}", HORIZON_YEARS, self.replacement_year),
            ));
        }

        Ok(())
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(EngineError::invalid(field, format!("must be finite and >= 0, got {}", value)))
    }
}

fn above_minus_one(field: &'static str, rate: f64) -> Result<()> {
    if rate.is_finite() && rate > -1.0 {
        Ok(())
    } else {
        Err(EngineError::invalid(field, format!("rate must be > -100%, got {}", rate)))
    }
}

/// Yearly decay factors (1 - rate) must stay in (0, 1]
fn unit_decay(field: &'static str, rate: f64) -> Result<()> {
    if rate.is_finite() && (0.0..1.0).contains(&rate) {
        Ok(())
    } else {
        Err(EngineError::invalid(field, format!("must lie in [0, 1), got {}", rate)))
    }
}
