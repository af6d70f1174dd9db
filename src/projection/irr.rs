//! Internal Rate of Return (IRR) calculation
//!
//! Newton-Raphson on the NPV polynomial of a yearly cash-flow series.

use serde::Serialize;

use super::discount::npv_and_derivative;

/// Starting point of the iteration (10% p.a.)
pub const DEFAULT_IRR_GUESS: f64 = 0.10;

const MAX_ITERATIONS: u32 = 100;
const TOLERANCE: f64 = 1e-7;
const MIN_DERIVATIVE: f64 = 1e-10;

/// A converged IRR
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IrrSolution {
    /// Annual rate as a fraction
    pub rate: f64,
    /// Newton steps taken
    pub iterations: u32,
}

/// Why the root finder gave up
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum IrrFailure {
    /// |NPV'(r)| fell below 1e-10: the tangent is too flat to follow
    FlatDerivative { rate: f64, iteration: u32 },
    /// 100 steps without two estimates closer than 1e-7
    NoConvergence { last_rate: f64 },
    /// The iteration produced a non-finite value or left the domain r > -1
    DomainError { iteration: u32 },
}

/// Solve for the rate that zeroes the NPV of `cashflows`
///
/// With more than one sign change in the series there may be several roots;
/// whichever one the iteration reaches from `initial_guess` is returned.
pub fn solve_irr(cashflows: &[f64], initial_guess: f64) -> Result<IrrSolution, IrrFailure> {
    let mut rate = initial_guess;

    for iteration in 0..MAX_ITERATIONS {
        if !rate.is_finite() || 1.0 + rate == 0.0 {
            return Err(IrrFailure::DomainError { iteration });
        }

        let (npv, dnpv) = npv_and_derivative(cashflows, rate);
        if !npv.is_finite() || !dnpv.is_finite() {
            return Err(IrrFailure::DomainError { iteration });
        }

        if dnpv.abs() < MIN_DERIVATIVE {
            return Err(IrrFailure::FlatDerivative { rate, iteration });
        }

        let new_rate = rate - npv / dnpv;
        if !new_rate.is_finite() {
            return Err(IrrFailure::DomainError { iteration });
        }

        if (new_rate - rate).abs() < TOLERANCE {
            if new_rate <= -1.0 {
                return Err(IrrFailure::DomainError { iteration });
            }
            return Ok(IrrSolution {
                rate: new_rate,
                iterations: iteration + 1,
            });
        }

        rate = new_rate;
    }

    Err(IrrFailure::NoConvergence { last_rate: rate })
}

/// IRR from a given starting guess, `None` when undefined
pub fn irr(cashflows: &[f64], initial_guess: f64) -> Option<f64> {
    match solve_irr(cashflows, initial_guess) {
        Ok(solution) => Some(solution.rate),
        Err(failure) => {
            log::debug!("IRR undefined: {:?}", failure);
            None
        }
    }
}

/// IRR starting from [`DEFAULT_IRR_GUESS`]
pub fn calculate_irr(cashflows: &[f64]) -> Option<f64> {
    irr(cashflows, DEFAULT_IRR_GUESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::npv;
    use approx::assert_relative_eq;

    fn assert_round_trip(cashflows: &[f64], rate: f64) {
        let residual = npv(cashflows, rate).unwrap();
        assert!(residual.abs() < 1e-4, "NPV at IRR {} is {}", rate, residual);
    }

    #[test]
    fn test_simple_irr() {
        // Invest 1000, get 1100 back after one year
        let rate = calculate_irr(&[-1_000.0, 1_100.0]).unwrap();
        assert_relative_eq!(rate, 0.10, epsilon = 1e-9);
    }

    #[test]
    fn test_level_cashflows() {
        let mut cashflows = vec![-10_000.0];
        cashflows.extend(vec![1_200.0; 20]);

        let rate = calculate_irr(&cashflows).unwrap();
        // Annuity factor 8.33 lies between 11% (7.96) and 10% (8.51)
        assert!(rate > 0.10 && rate < 0.11, "got {}", rate);
        assert_round_trip(&cashflows, rate);
    }

    #[test]
    fn test_start_guess_does_not_change_root() {
        let mut cashflows = vec![-50_000.0];
        cashflows.extend(vec![4_500.0; 20]);

        let from_default = calculate_irr(&cashflows).unwrap();
        let from_low = irr(&cashflows, 0.01).unwrap();
        assert_relative_eq!(from_default, from_low, epsilon = 1e-6);
    }

    #[test]
    fn test_all_zero_series_is_undefined() {
        let cashflows = vec![0.0; 21];
        assert_eq!(
            solve_irr(&cashflows, DEFAULT_IRR_GUESS),
            Err(IrrFailure::FlatDerivative { rate: DEFAULT_IRR_GUESS, iteration: 0 })
        );
        assert!(calculate_irr(&cashflows).is_none());
    }

    #[test]
    fn test_no_sign_change_is_undefined() {
        assert!(calculate_irr(&[100.0, 100.0]).is_none());
    }

    #[test]
    fn test_multiple_sign_changes_terminate() {
        let cashflows = [-100.0, 50.0, -80.0, 200.0];
        if let Some(rate) = calculate_irr(&cashflows) {
            assert_round_trip(&cashflows, rate);
        }
    }

    #[test]
    fn test_guess_at_minus_one_is_domain_error() {
        let result = solve_irr(&[-100.0, 110.0], -1.0);
        assert_eq!(result, Err(IrrFailure::DomainError { iteration: 0 }));
    }

    #[test]
    fn test_reports_iterations() {
        let solution = solve_irr(&[-1_000.0, 1_100.0], DEFAULT_IRR_GUESS).unwrap();
        // Starting exactly at the root: one step confirms it
        assert_eq!(solution.iterations, 1);
    }
}
