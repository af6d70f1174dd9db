//! Twenty-year cash-flow projection for one scenario

use serde::{Deserialize, Serialize};

use super::cashflows::{CashFlowSeries, YearlyCashFlow, HORIZON_YEARS};
use crate::params::InvestmentParameters;

/// The two fixed scenarios evaluated for every site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    /// Expected degradation; both prices follow inflation
    Average,
    /// Faster degradation, flat purchase price, export price eroded by the
    /// merit-order effect, plus a one-time replacement
    WorstCase,
}

impl Scenario {
    pub fn label(&self) -> &'static str {
        match self {
            Scenario::Average => "Average Expected Case",
            Scenario::WorstCase => "Worst Case",
        }
    }
}

/// Projects yearly production, revenue and cost for an investment
#[derive(Debug, Clone, Copy)]
pub struct ScenarioProjector<'a> {
    params: &'a InvestmentParameters,
}

impl<'a> ScenarioProjector<'a> {
    pub fn new(params: &'a InvestmentParameters) -> Self {
        Self { params }
    }

    /// Yearly rows for years 1..=20, in order
    pub fn project_years(&self, base_yield_kwh: f64, scenario: Scenario) -> Vec<YearlyCashFlow> {
        (1..=HORIZON_YEARS)
            .map(|year| self.calculate_year(year, base_yield_kwh, scenario))
            .collect()
    }

    /// Cash-flow series: `-CAPEX` followed by the twenty yearly net flows
    pub fn project(&self, base_yield_kwh: f64, scenario: Scenario) -> CashFlowSeries {
        let years = self.project_years(base_yield_kwh, scenario);
        CashFlowSeries::from_years(self.params.capex, &years)
    }

    fn calculate_year(&self, year: u32, base_yield_kwh: f64, scenario: Scenario) -> YearlyCashFlow {
        let p = self.params;
        let elapsed = (year - 1) as i32;
        let inflation_factor = (1.0 + p.inflation).powi(elapsed);

        let (degradation, internal_price, export_price, replacement) = match scenario {
            Scenario::Average => (
                p.degradation_avg,
                p.purchase_price * inflation_factor,
                p.export_price * inflation_factor,
                0.0,
            ),
            Scenario::WorstCase => (
                p.degradation_worst,
                p.purchase_price,
                p.export_price * (1.0 - p.merit_order_drop).powi(elapsed),
                if year == p.replacement_year { p.replacement_cost } else { 0.0 },
            ),
        };

        let production_kwh = base_yield_kwh * (1.0 - degradation).powi(elapsed);
        let revenue = production_kwh * p.self_use * internal_price
            + production_kwh * (1.0 - p.self_use) * export_price;

        // OPEX follows inflation in both scenarios
        let cost = p.opex * inflation_factor;

        YearlyCashFlow {
            year,
            production_kwh,
            internal_price,
            export_price,
            revenue,
            cost,
            replacement,
            net: revenue - cost - replacement,
        }
    }
}

/// Project one scenario for `params` starting from the first-year yield
pub fn project(base_yield_kwh: f64, params: &InvestmentParameters, scenario: Scenario) -> CashFlowSeries {
    ScenarioProjector::new(params).project(base_yield_kwh, scenario)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::SERIES_LEN;
    use approx::assert_relative_eq;

    fn test_params() -> InvestmentParameters {
        InvestmentParameters {
            capacity_kwp: 100.0,
            capex: 110_000.0,
            opex: 1_100.0,
            self_use: 0.4,
            purchase_price: 0.28,
            export_price: 0.08,
            wacc: 0.06,
            degradation_avg: 0.005,
            degradation_worst: 0.01,
            inflation: 0.02,
            merit_order_drop: 0.01,
            replacement_cost: 2_000.0,
            replacement_year: 10,
        }
    }

    fn steady_params() -> InvestmentParameters {
        InvestmentParameters {
            degradation_avg: 0.0,
            degradation_worst: 0.0,
            inflation: 0.0,
            merit_order_drop: 0.0,
            replacement_cost: 0.0,
            ..test_params()
        }
    }

    #[test]
    fn test_series_shape() {
        let params = test_params();
        let series = project(95_000.0, &params, Scenario::Average);

        assert_eq!(series.len(), SERIES_LEN);
        assert_eq!(series.initial_outlay(), -110_000.0);
    }

    #[test]
    fn test_first_year_average() {
        let params = test_params();
        let years = ScenarioProjector::new(&params).project_years(100_000.0, Scenario::Average);

        let y1 = &years[0];
        assert_eq!(y1.year, 1);
        assert_relative_eq!(y1.production_kwh, 100_000.0);
        // 40% at 0.28 + 60% at 0.08
        assert_relative_eq!(y1.revenue, 40_000.0 * 0.28 + 60_000.0 * 0.08, epsilon = 1e-9);
        assert_relative_eq!(y1.cost, 1_100.0);
        assert_relative_eq!(y1.net, 16_000.0 - 1_100.0, epsilon = 1e-9);
    }

    #[test]
    fn test_average_escalation() {
        let params = test_params();
        let years = ScenarioProjector::new(&params).project_years(100_000.0, Scenario::Average);

        let y3 = &years[2];
        let growth = 1.02_f64.powi(2);
        assert_relative_eq!(y3.production_kwh, 100_000.0 * 0.995_f64.powi(2), epsilon = 1e-9);
        assert_relative_eq!(y3.internal_price, 0.28 * growth, epsilon = 1e-12);
        assert_relative_eq!(y3.export_price, 0.08 * growth, epsilon = 1e-12);
        assert_relative_eq!(y3.cost, 1_100.0 * growth, epsilon = 1e-9);
        assert_eq!(y3.replacement, 0.0);
    }

    #[test]
    fn test_worst_case_prices_and_replacement() {
        let params = test_params();
        let years = ScenarioProjector::new(&params).project_years(100_000.0, Scenario::WorstCase);

        let y5 = &years[4];
        assert_relative_eq!(y5.production_kwh, 100_000.0 * 0.99_f64.powi(4), epsilon = 1e-9);
        assert_relative_eq!(y5.internal_price, 0.28);
        assert_relative_eq!(y5.export_price, 0.08 * 0.99_f64.powi(4), epsilon = 1e-12);
        assert_relative_eq!(y5.cost, 1_100.0 * 1.02_f64.powi(4), epsilon = 1e-9);

        for y in &years {
            let expected = if y.year == 10 { 2_000.0 } else { 0.0 };
            assert_eq!(y.replacement, expected, "year {}", y.year);
            assert_relative_eq!(y.net, y.revenue - y.cost - y.replacement, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_steady_state_has_identical_years() {
        let params = steady_params();
        for scenario in [Scenario::Average, Scenario::WorstCase] {
            let series = project(90_000.0, &params, scenario);
            let first = series.net_for_year(1).unwrap();
            for year in 2..=HORIZON_YEARS {
                assert_relative_eq!(series.net_for_year(year).unwrap(), first, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn test_zero_yield_leaves_only_opex() {
        let params = test_params();
        for scenario in [Scenario::Average, Scenario::WorstCase] {
            let years = ScenarioProjector::new(&params).project_years(0.0, scenario);
            for y in &years {
                assert_eq!(y.revenue, 0.0);
                assert_relative_eq!(y.net, -y.cost - y.replacement, epsilon = 1e-9);
            }
        }

        let steady = steady_params();
        let series = project(0.0, &steady, Scenario::Average);
        for year in 1..=HORIZON_YEARS {
            assert_relative_eq!(series.net_for_year(year).unwrap(), -1_100.0);
        }
    }

    #[test]
    fn test_worst_case_is_never_better() {
        let params = test_params();
        let projector = ScenarioProjector::new(&params);
        let avg = projector.project(95_000.0, Scenario::Average);
        let worst = projector.project(95_000.0, Scenario::WorstCase);

        assert!(worst.total() < avg.total());
    }
}
