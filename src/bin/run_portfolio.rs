//! Evaluate every site of a portfolio CSV and write one summary row per site
//!
//! Sites are evaluated in parallel; lookups are shared through the engine's
//! cache, so repeated addresses are geocoded once. Cache hit rates are
//! printed at the end.

use std::fs::File;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use rayon::prelude::*;
use serde::Serialize;

use solar_asset_manager::params::{load_sites, load_sites_from_reader, SiteRecord};
use solar_asset_manager::{Diagnosis, EngineConfig, Evaluation, FinancialEngine, Payback};

#[derive(Parser, Debug)]
#[command(name = "run_portfolio", version)]
struct Args {
    /// Portfolio CSV, one site per row
    sites: PathBuf,

    /// Column delimiter of the input file
    #[arg(long, default_value_t = ',')]
    delimiter: char,

    /// Summary output (CSV)
    #[arg(long, default_value = "portfolio_summary.csv")]
    output: PathBuf,

    /// Engine configuration (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Skip network lookups
    #[arg(long)]
    offline: bool,
}

#[derive(Debug, Serialize)]
struct SummaryRow {
    site_id: String,
    address: String,
    lat: Option<f64>,
    lon: Option<f64>,
    capacity_kwp: Option<f64>,
    capex: Option<f64>,
    base_yield_kwh: Option<f64>,
    avg_npv: Option<f64>,
    avg_irr: Option<f64>,
    avg_payback_years: Option<u32>,
    worst_npv: Option<f64>,
    worst_payback_years: Option<u32>,
    diagnosis: Option<Diagnosis>,
    error: Option<String>,
}

impl SummaryRow {
    fn from_result(site: &SiteRecord, result: &solar_asset_manager::Result<Evaluation>) -> Self {
        let mut row = SummaryRow {
            site_id: site.site_id.clone(),
            address: site.inputs.address.clone(),
            lat: None,
            lon: None,
            capacity_kwp: None,
            capex: None,
            base_yield_kwh: None,
            avg_npv: None,
            avg_irr: None,
            avg_payback_years: None,
            worst_npv: None,
            worst_payback_years: None,
            diagnosis: None,
            error: None,
        };

        match result {
            Ok(evaluation) => {
                row.lat = Some(evaluation.location.coordinates.lat);
                row.lon = Some(evaluation.location.coordinates.lon);
                row.capacity_kwp = Some(evaluation.parameters.capacity_kwp);
                row.capex = Some(evaluation.parameters.capex);
                row.base_yield_kwh = Some(evaluation.base_yield_kwh);
                row.avg_npv = Some(evaluation.average().npv);
                row.avg_irr = evaluation.average().irr;
                row.avg_payback_years = evaluation.average().payback.years();
                row.worst_npv = Some(evaluation.worst().npv);
                row.worst_payback_years = evaluation.worst().payback.years();
                row.diagnosis = Some(evaluation.diagnosis());
            }
            Err(e) => row.error = Some(e.to_string()),
        }

        row
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let start = Instant::now();

    let sites = if args.delimiter == ',' {
        load_sites(&args.sites)
    } else {
        let delimiter = u8::try_from(args.delimiter).context("delimiter must be a single byte")?;
        let file = File::open(&args.sites)
            .with_context(|| format!("cannot open {}", args.sites.display()))?;
        load_sites_from_reader(file, delimiter)
    }
    .with_context(|| format!("cannot load sites from {}", args.sites.display()))?;
    println!("Loaded {} sites in {:?}", sites.len(), start.elapsed());

    let mut config = EngineConfig::resolve(args.config.as_deref())?;
    config.offline |= args.offline;
    let engine = FinancialEngine::from_config(config)?;

    let eval_start = Instant::now();
    let results: Vec<_> = sites.par_iter().map(|site| engine.evaluate(&site.inputs)).collect();
    println!("Evaluations complete in {:?}", eval_start.elapsed());

    let mut writer = csv::Writer::from_path(&args.output)
        .with_context(|| format!("cannot create {}", args.output.display()))?;
    let mut failed = 0;
    let mut payback_beyond = 0;
    for (site, result) in sites.iter().zip(results.iter()) {
        match result {
            Err(e) => {
                failed += 1;
                log::warn!("site {} failed: {}", site.site_id, e);
            }
            Ok(evaluation) if evaluation.average().payback == Payback::BeyondHorizon => {
                payback_beyond += 1;
            }
            Ok(_) => {}
        }
        writer.serialize(SummaryRow::from_result(site, result))?;
    }
    writer.flush()?;

    println!(
        "{} sites written to {} ({} failed, {} without payback in the average case)",
        sites.len(),
        args.output.display(),
        failed,
        payback_beyond
    );
    let lookups = engine.lookup_stats();
    for (name, stats) in [("Geocoding", lookups.geocoding), ("Yield", lookups.yields)] {
        if let Some(stats) = stats {
            println!(
                "{} cache: {} hits, {} misses ({:.1}% hit rate, {} entries)",
                name,
                stats.hits,
                stats.misses,
                stats.hit_rate() * 100.0,
                stats.entries
            );
        }
    }
    println!("Total time: {:?}", start.elapsed());

    Ok(())
}
