//! Result structures of an evaluation

use serde::Serialize;

use crate::lookup::Coordinates;
use crate::params::InvestmentParameters;
use crate::projection::{CashFlowSeries, Scenario, YearlyCashFlow};

/// When the cumulative balance first turns non-negative
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Payback {
    /// Index into the cumulative balance, i.e. years after the outlay.
    /// 1..=20 for any investment; 0 only when nothing was invested.
    Year(u32),
    /// Still negative at the end of the horizon
    BeyondHorizon,
}

impl Payback {
    /// First index with a balance >= 0; index 0 is the outlay itself
    pub fn from_cumulative(balance: &[f64]) -> Self {
        balance
            .iter()
            .position(|&b| b >= 0.0)
            .map(|i| Payback::Year(i as u32))
            .unwrap_or(Payback::BeyondHorizon)
    }

    pub fn years(&self) -> Option<u32> {
        match self {
            Payback::Year(y) => Some(*y),
            Payback::BeyondHorizon => None,
        }
    }
}

/// Qualitative verdict over both scenarios
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Diagnosis {
    /// Positive NPV in expectation, negative in the worst case
    ExpectedProfitWorstCaseLoss,
    /// Positive NPV even in the worst case
    ProfitableInWorstCase,
    /// Neither of the above; presentation decides
    Unflagged,
}

impl Diagnosis {
    /// First matching rule wins
    pub fn classify(average_npv: f64, worst_npv: f64) -> Self {
        if average_npv > 0.0 && worst_npv < 0.0 {
            Diagnosis::ExpectedProfitWorstCaseLoss
        } else if worst_npv > 0.0 {
            Diagnosis::ProfitableInWorstCase
        } else {
            Diagnosis::Unflagged
        }
    }
}

/// Metrics of one scenario
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioResult {
    pub scenario: Scenario,
    pub years: Vec<YearlyCashFlow>,
    pub series: CashFlowSeries,
    /// Running sum of `series`, same indexing
    pub cumulative_balance: Vec<f64>,
    pub npv: f64,
    /// `None` when the root finder failed. Always `None` for the worst case:
    /// its replacement year adds sign changes, so a root would be unreliable.
    pub irr: Option<f64>,
    pub payback: Payback,
}

/// Both scenarios plus the verdict
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioAnalysis {
    pub average: ScenarioResult,
    pub worst: ScenarioResult,
    pub diagnosis: Diagnosis,
}

/// Where the coordinates used for the yield lookup came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationSource {
    Resolved,
    /// Address empty or not resolvable
    Default,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResolvedLocation {
    pub coordinates: Coordinates,
    pub source: LocationSource,
}

/// Where the first-year yield came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum YieldSource {
    Estimated,
    /// No capacity installed; the estimator was not asked
    ZeroCapacity,
    /// The estimator failed and the configuration allows a zero yield
    ZeroFallback,
}

/// Complete output of one evaluation
#[derive(Debug, Clone, Serialize)]
pub struct Evaluation {
    pub location: ResolvedLocation,
    pub base_yield_kwh: f64,
    pub yield_source: YieldSource,
    pub parameters: InvestmentParameters,
    #[serde(flatten)]
    pub analysis: ScenarioAnalysis,
}

impl Evaluation {
    pub fn average(&self) -> &ScenarioResult {
        &self.analysis.average
    }

    pub fn worst(&self) -> &ScenarioResult {
        &self.analysis.worst
    }

    pub fn diagnosis(&self) -> Diagnosis {
        self.analysis.diagnosis
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payback_first_non_negative_index() {
        assert_eq!(
            Payback::from_cumulative(&[-100.0, -60.0, -10.0, 20.0, 50.0]),
            Payback::Year(3)
        );
        assert_eq!(Payback::from_cumulative(&[-100.0, -50.0, 0.0]), Payback::Year(2));
    }

    #[test]
    fn test_payback_beyond_horizon() {
        let balance = [-100.0, -90.0, -80.0];
        let payback = Payback::from_cumulative(&balance);
        assert_eq!(payback, Payback::BeyondHorizon);
        assert_eq!(payback.years(), None);
    }

    #[test]
    fn test_diagnosis_priority() {
        assert_eq!(Diagnosis::classify(500.0, -200.0), Diagnosis::ExpectedProfitWorstCaseLoss);
        assert_eq!(Diagnosis::classify(5_000.0, 1_000.0), Diagnosis::ProfitableInWorstCase);
        assert_eq!(Diagnosis::classify(-500.0, -900.0), Diagnosis::Unflagged);
        // Worst exactly zero is neither a loss nor a profit
        assert_eq!(Diagnosis::classify(500.0, 0.0), Diagnosis::Unflagged);
    }

    #[test]
    fn test_diagnosis_serializes_snake_case() {
        let json = serde_json::to_string(&Diagnosis::ProfitableInWorstCase).unwrap();
        assert_eq!(json, "\"profitable_in_worst_case\"");
    }
}
