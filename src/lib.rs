//! Solar Asset Manager - twenty-year cash-flow projection for commercial solar installations
//!
//! This library provides:
//! - Average and worst-case cash-flow projection from a first-year yield
//! - NPV, IRR (Newton-Raphson) and payback for each scenario
//! - Geocoding and yield lookups (Nominatim, PVGIS) behind fallible traits
//! - German number formatting for reports

pub mod config;
pub mod engine;
pub mod error;
pub mod format;
pub mod lookup;
pub mod params;
pub mod projection;
pub mod report;

// Re-export commonly used types
pub use config::{EngineConfig, MissingYieldPolicy};
pub use engine::{Diagnosis, Evaluation, FinancialEngine, Payback, ScenarioResult};
pub use error::{EngineError, Result};
pub use params::{InvestmentParameters, PanelGeometry, SiteInputs};
pub use projection::{calculate_irr, npv, CashFlowSeries, Scenario, ScenarioProjector};
