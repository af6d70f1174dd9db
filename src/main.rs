//! Solar Asset Manager CLI
//!
//! Evaluates one site and prints the report, the JSON evaluation, or writes
//! the yearly table as CSV.

use std::fs::File;
use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;

use solar_asset_manager::format::parse_de_number;
use solar_asset_manager::params::{CapacityInput, CapexInput};
use solar_asset_manager::report::{render_text, write_yearly_csv};
use solar_asset_manager::{EngineConfig, EngineError, FinancialEngine, SiteInputs};

/// Yield-co analysis (IRR, NPV, payback) of a commercial solar installation
#[derive(Parser, Debug)]
#[command(name = "solar_asset_manager", version)]
struct Cli {
    /// Engine configuration (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Site inputs as JSON; flags below override single fields
    #[arg(long)]
    input: Option<PathBuf>,

    /// Location, e.g. "Mönckebergstraße, Hamburg"
    #[arg(long)]
    address: Option<String>,

    /// Panel tilt in degrees (0 = flat)
    #[arg(long, value_parser = de_number)]
    tilt: Option<f64>,

    /// Panel azimuth in degrees (0 = south)
    #[arg(long, value_parser = de_number, allow_hyphen_values = true)]
    azimuth: Option<f64>,

    /// Usable area in m²
    #[arg(long, value_parser = de_number, conflicts_with = "kwp")]
    area: Option<f64>,

    /// Installed capacity in kWp
    #[arg(long, value_parser = de_number)]
    kwp: Option<f64>,

    /// CAPEX per kWp (€)
    #[arg(long, value_parser = de_number, conflicts_with = "capex_total")]
    price_per_kwp: Option<f64>,

    /// Total CAPEX (€)
    #[arg(long, value_parser = de_number)]
    capex_total: Option<f64>,

    /// OPEX in % of CAPEX per year
    #[arg(long, value_parser = de_number)]
    opex_pct: Option<f64>,

    /// Self-consumption share in %
    #[arg(long, value_parser = de_number)]
    self_use_pct: Option<f64>,

    /// Avoided purchase price in ct/kWh
    #[arg(long, value_parser = de_number)]
    purchase_price_ct: Option<f64>,

    /// Export price in ct/kWh
    #[arg(long, value_parser = de_number)]
    export_price_ct: Option<f64>,

    /// Cost of capital in %
    #[arg(long, value_parser = de_number, allow_hyphen_values = true)]
    wacc_pct: Option<f64>,

    #[arg(long, value_parser = de_number)]
    degradation_avg_pct: Option<f64>,

    #[arg(long, value_parser = de_number)]
    degradation_worst_pct: Option<f64>,

    #[arg(long, value_parser = de_number, allow_hyphen_values = true)]
    inflation_pct: Option<f64>,

    #[arg(long, value_parser = de_number)]
    merit_order_drop_pct: Option<f64>,

    /// One-time replacement cost in the worst case (€)
    #[arg(long, value_parser = de_number)]
    replacement_cost: Option<f64>,

    /// Year of the replacement (1-20)
    #[arg(long)]
    replacement_year: Option<u32>,

    /// Skip network lookups
    #[arg(long)]
    offline: bool,

    /// Specific yield in kWh/kWp for offline mode
    #[arg(long, value_parser = de_number)]
    specific_yield: Option<f64>,

    /// Print the evaluation as JSON instead of the text report
    #[arg(long)]
    json: bool,

    /// Also write the yearly table to this CSV file
    #[arg(long)]
    csv: Option<PathBuf>,
}

fn de_number(s: &str) -> Result<f64, String> {
    parse_de_number(s).ok_or_else(|| format!("not a number: {}", s))
}

impl Cli {
    fn site_inputs(&self) -> Result<SiteInputs> {
        let mut inputs = match &self.input {
            Some(path) => {
                let file = File::open(path)
                    .with_context(|| format!("cannot open input {}", path.display()))?;
                serde_json::from_reader(file)
                    .with_context(|| format!("cannot parse input {}", path.display()))?
            }
            None => SiteInputs::default(),
        };

        if let Some(address) = &self.address {
            inputs.address = address.clone();
        }
        if let Some(m2) = self.area {
            inputs.capacity = CapacityInput::Area { m2 };
        }
        if let Some(kwp) = self.kwp {
            inputs.capacity = CapacityInput::Direct { kwp };
        }
        if let Some(eur_per_kwp) = self.price_per_kwp {
            inputs.capex = CapexInput::PerKwp { eur_per_kwp };
        }
        if let Some(eur) = self.capex_total {
            inputs.capex = CapexInput::Total { eur };
        }

        let overrides = [
            (self.tilt, &mut inputs.tilt_deg),
            (self.azimuth, &mut inputs.azimuth_deg),
            (self.opex_pct, &mut inputs.opex_pct),
            (self.self_use_pct, &mut inputs.self_use_pct),
            (self.purchase_price_ct, &mut inputs.purchase_price_ct),
            (self.export_price_ct, &mut inputs.export_price_ct),
            (self.wacc_pct, &mut inputs.wacc_pct),
            (self.degradation_avg_pct, &mut inputs.degradation_avg_pct),
            (self.degradation_worst_pct, &mut inputs.degradation_worst_pct),
            (self.inflation_pct, &mut inputs.inflation_pct),
            (self.merit_order_drop_pct, &mut inputs.merit_order_drop_pct),
            (self.replacement_cost, &mut inputs.replacement_cost),
        ];
        for (value, field) in overrides {
            if let Some(v) = value {
                *field = v;
            }
        }
        if let Some(year) = self.replacement_year {
            inputs.replacement_year = year;
        }

        Ok(inputs)
    }

    fn engine_config(&self) -> Result<EngineConfig> {
        let mut config = EngineConfig::resolve(self.config.as_deref())?;
        if self.offline {
            config.offline = true;
        }
        if let Some(specific) = self.specific_yield {
            config.specific_yield_kwh_per_kwp = specific;
        }
        config.validate()?;
        Ok(config)
    }
}

fn run(cli: &Cli) -> Result<()> {
    let inputs = cli.site_inputs()?;
    let engine = FinancialEngine::from_config(cli.engine_config()?)?;
    let evaluation = engine.evaluate(&inputs)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&evaluation)?);
    } else {
        print!("{}", render_text(&inputs.address, &evaluation, Utc::now()));
    }

    if let Some(path) = &cli.csv {
        let file = File::create(path)
            .with_context(|| format!("cannot create {}", path.display()))?;
        write_yearly_csv(file, &evaluation)?;
        log::info!("yearly table written to {}", path.display());
    }

    Ok(())
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        eprintln!("Error: {:#}", e);
        let code = match e.downcast_ref::<EngineError>() {
            Some(EngineError::InvalidParameter { .. }) => 2,
            Some(EngineError::YieldUnavailable { .. }) => 3,
            _ => 1,
        };
        process::exit(code);
    }
}
