//! Presentation of an evaluation: German text report and yearly CSV table

use std::io::Write;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::engine::{Diagnosis, Evaluation, LocationSource, Payback, ScenarioResult};
use crate::error::Result;
use crate::format::{format_de, format_percent_de};
use crate::projection::HORIZON_YEARS;

pub fn payback_label(payback: Payback) -> String {
    match payback {
        Payback::Year(y) => format!("{} Jahre", y),
        Payback::BeyondHorizon => format!(">{} Jahre", HORIZON_YEARS),
    }
}

pub fn diagnosis_message(diagnosis: Diagnosis) -> Option<&'static str> {
    match diagnosis {
        Diagnosis::ExpectedProfitWorstCaseLoss => Some(
            "Risiko-Hinweis: Projekt im Erwartungswert profitabel, verbrennt aber Geld im Worst Case.",
        ),
        Diagnosis::ProfitableInWorstCase => Some(
            "Strong Buy: Projekt ist selbst im Worst Case (inkl. teurer Ersatzteile) profitabel.",
        ),
        Diagnosis::Unflagged => None,
    }
}

/// Multi-line report as printed by the CLI
pub fn render_text(address: &str, evaluation: &Evaluation, generated_at: DateTime<Utc>) -> String {
    let params = &evaluation.parameters;
    let location = &evaluation.location;
    let mut out = String::new();

    out.push_str("Commercial Solar Asset Manager\n");
    out.push_str(&format!("Berechnet am {}\n\n", generated_at.format("%d.%m.%Y %H:%M UTC")));

    let origin = match location.source {
        LocationSource::Resolved => "",
        LocationSource::Default => " (Standardstandort)",
    };
    out.push_str(&format!("Standort:      {}\n", address));
    out.push_str(&format!(
        "Koordinaten:   {:.4}, {:.4}{}\n",
        location.coordinates.lat, location.coordinates.lon, origin
    ));
    out.push_str(&format!("Leistung:      {} kWp\n", format_de(params.capacity_kwp, 2, None)));
    out.push_str(&format!("Total CAPEX:   {}\n", format_de(params.capex, 2, Some("€"))));
    out.push_str(&format!("OPEX p.a.:     {}\n", format_de(params.opex, 2, Some("€"))));
    out.push_str(&format!(
        "Ertrag Jahr 1: {} kWh\n\n",
        format_de(evaluation.base_yield_kwh, 0, None)
    ));

    out.push_str(&scenario_block("Average Expected Case", evaluation.average(), true));
    out.push('\n');
    out.push_str(&scenario_block(
        "Angenommene Worst-Case Entwicklung",
        evaluation.worst(),
        false,
    ));

    if let Some(message) = diagnosis_message(evaluation.diagnosis()) {
        out.push('\n');
        out.push_str(message);
        out.push('\n');
    }

    out.push_str("\nZahlungsströme (kumuliert)\n");
    out.push_str(&format!("{:>5} {:>16} {:>16}\n", "Jahr", "Average", "Worst Case"));
    let avg = &evaluation.average().cumulative_balance;
    let worst = &evaluation.worst().cumulative_balance;
    for (year, (a, w)) in avg.iter().zip(worst.iter()).enumerate() {
        out.push_str(&format!(
            "{:>5} {:>16} {:>16}\n",
            year,
            format_de(*a, 0, Some("€")),
            format_de(*w, 0, Some("€"))
        ));
    }

    out
}

fn scenario_block(title: &str, result: &ScenarioResult, show_irr: bool) -> String {
    let verdict = if result.npv > 0.0 { "Profitabel" } else { "Verlustgeschäft" };
    let irr = if show_irr {
        format_percent_de(result.irr, 2)
    } else {
        "Nicht berechenbar (Vorzeichenwechsel instabil)".to_string()
    };

    format!(
        "{}\n  NPV:          {} ({})\n  IRR:          {}\n  Amortisation: {}\n",
        title,
        format_de(result.npv, 0, Some("€")),
        verdict,
        irr,
        payback_label(result.payback)
    )
}

/// One CSV line of the yearly table; year 0 carries the outlay
#[derive(Debug, Serialize)]
struct YearRow {
    year: u32,
    avg_production_kwh: f64,
    avg_revenue: f64,
    avg_cost: f64,
    avg_net: f64,
    avg_cumulative: f64,
    worst_production_kwh: f64,
    worst_revenue: f64,
    worst_cost: f64,
    worst_replacement: f64,
    worst_net: f64,
    worst_cumulative: f64,
}

/// Write the yearly table of both scenarios as CSV
pub fn write_yearly_csv<W: Write>(writer: W, evaluation: &Evaluation) -> Result<()> {
    let avg = evaluation.average();
    let worst = evaluation.worst();
    let mut csv = csv::Writer::from_writer(writer);

    csv.serialize(YearRow {
        year: 0,
        avg_production_kwh: 0.0,
        avg_revenue: 0.0,
        avg_cost: 0.0,
        avg_net: avg.series.initial_outlay(),
        avg_cumulative: avg.cumulative_balance[0],
        worst_production_kwh: 0.0,
        worst_revenue: 0.0,
        worst_cost: 0.0,
        worst_replacement: 0.0,
        worst_net: worst.series.initial_outlay(),
        worst_cumulative: worst.cumulative_balance[0],
    })?;

    for (a, w) in avg.years.iter().zip(worst.years.iter()) {
        let i = a.year as usize;
        csv.serialize(YearRow {
            year: a.year,
            avg_production_kwh: a.production_kwh,
            avg_revenue: a.revenue,
            avg_cost: a.cost,
            avg_net: a.net,
            avg_cumulative: avg.cumulative_balance[i],
            worst_production_kwh: w.production_kwh,
            worst_revenue: w.revenue,
            worst_cost: w.cost,
            worst_replacement: w.replacement,
            worst_net: w.net,
            worst_cumulative: worst.cumulative_balance[i],
        })?;
    }

    csv.flush()?;
    Ok(())
}
