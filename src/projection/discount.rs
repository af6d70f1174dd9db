//! Discounting of yearly cash-flow series

use crate::error::{EngineError, Result};

/// Net present value: `Σ cf_i / (1 + rate)^i`, index 0 undiscounted
///
/// Rates at or below -100% have no meaning and are rejected.
pub fn npv(cashflows: &[f64], rate: f64) -> Result<f64> {
    if !rate.is_finite() || rate <= -1.0 {
        return Err(EngineError::invalid(
            "discount_rate",
            format!("must be finite and > -1, got {}", rate),
        ));
    }
    Ok(npv_unchecked(cashflows, rate))
}

/// NPV without the rate check, for the root finder
pub(crate) fn npv_unchecked(cashflows: &[f64], rate: f64) -> f64 {
    let base = 1.0 + rate;
    cashflows
        .iter()
        .enumerate()
        .map(|(t, &cf)| cf / base.powi(t as i32))
        .sum()
}

/// NPV and its derivative with respect to the rate
pub(crate) fn npv_and_derivative(cashflows: &[f64], rate: f64) -> (f64, f64) {
    let base = 1.0 + rate;
    let mut npv = 0.0;
    let mut dnpv = 0.0;

    for (t, &cf) in cashflows.iter().enumerate() {
        npv += cf / base.powi(t as i32);
        if t > 0 {
            dnpv -= (t as f64) * cf / base.powi(t as i32 + 1);
        }
    }

    (npv, dnpv)
}
