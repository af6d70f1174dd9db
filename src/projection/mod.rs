//! Scenario projection, discounting and IRR for twenty-year cash-flow series

mod cashflows;
mod projector;
pub mod discount;
pub mod irr;

pub use cashflows::{CashFlowSeries, YearlyCashFlow, HORIZON_YEARS, SERIES_LEN};
pub use projector::{project, Scenario, ScenarioProjector};
pub use discount::npv;
pub use irr::{calculate_irr, irr, solve_irr, IrrFailure, IrrSolution, DEFAULT_IRR_GUESS};
