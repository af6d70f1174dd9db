//! Load a portfolio of sites from CSV
//!
//! Numeric columns accept a German decimal comma ("28,5") as well as a dot.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{Reader, ReaderBuilder, Trim};

use super::{CapacityInput, CapexInput, SiteInputs};
use crate::error::{EngineError, Result};
use crate::format::parse_de_number;

/// One site of a portfolio file
#[derive(Debug, Clone)]
pub struct SiteRecord {
    pub site_id: String,
    pub inputs: SiteInputs,
}

/// Raw CSV row; capacity is given either as `area_m2` or `kwp`,
/// CAPEX either as `eur_per_kwp` or `capex_total`
#[derive(Debug, serde::Deserialize)]
struct CsvRow {
    site_id: String,
    address: String,
    tilt_deg: String,
    azimuth_deg: String,
    #[serde(default)]
    area_m2: Option<String>,
    #[serde(default)]
    kwp: Option<String>,
    #[serde(default)]
    eur_per_kwp: Option<String>,
    #[serde(default)]
    capex_total: Option<String>,
    opex_pct: String,
    self_use_pct: String,
    purchase_price_ct: String,
    export_price_ct: String,
    wacc_pct: String,
    degradation_avg_pct: String,
    degradation_worst_pct: String,
    inflation_pct: String,
    merit_order_drop_pct: String,
    replacement_cost: String,
    replacement_year: u32,
}

impl CsvRow {
    fn into_record(self) -> Result<SiteRecord> {
        let capacity = match (optional(self.area_m2), optional(self.kwp)) {
            (Some(area), None) => CapacityInput::Area { m2: number("area_m2", &area)? },
            (None, Some(kwp)) => CapacityInput::Direct { kwp: number("kwp", &kwp)? },
            _ => {
                return Err(EngineError::invalid(
                    "capacity",
                    format!("site {}: give exactly one of area_m2 or kwp", self.site_id),
                ))
            }
        };

        let capex = match (optional(self.eur_per_kwp), optional(self.capex_total)) {
            (Some(price), None) => CapexInput::PerKwp {
                eur_per_kwp: number("eur_per_kwp", &price)?,
            },
            (None, Some(total)) => CapexInput::Total { eur: number("capex_total", &total)? },
            _ => {
                return Err(EngineError::invalid(
                    "capex",
                    format!("site {}: give exactly one of eur_per_kwp or capex_total", self.site_id),
                ))
            }
        };

        let inputs = SiteInputs {
            address: self.address,
            tilt_deg: number("tilt_deg", &self.tilt_deg)?,
            azimuth_deg: number("azimuth_deg", &self.azimuth_deg)?,
            capacity,
            capex,
            opex_pct: number("opex_pct", &self.opex_pct)?,
            self_use_pct: number("self_use_pct", &self.self_use_pct)?,
            purchase_price_ct: number("purchase_price_ct", &self.purchase_price_ct)?,
            export_price_ct: number("export_price_ct", &self.export_price_ct)?,
            wacc_pct: number("wacc_pct", &self.wacc_pct)?,
            degradation_avg_pct: number("degradation_avg_pct", &self.degradation_avg_pct)?,
            degradation_worst_pct: number("degradation_worst_pct", &self.degradation_worst_pct)?,
            inflation_pct: number("inflation_pct", &self.inflation_pct)?,
            merit_order_drop_pct: number("merit_order_drop_pct", &self.merit_order_drop_pct)?,
            replacement_cost: number("replacement_cost", &self.replacement_cost)?,
            replacement_year: self.replacement_year,
        };

        Ok(SiteRecord {
            site_id: self.site_id,
            inputs,
        })
    }
}

fn optional(cell: Option<String>) -> Option<String> {
    cell.filter(|s| !s.trim().is_empty())
}

fn number(field: &'static str, cell: &str) -> Result<f64> {
    parse_de_number(cell).ok_or_else(|| EngineError::invalid(field, format!("not a number: {:?}", cell)))
}

/// Load all sites from a comma-separated CSV file
pub fn load_sites<P: AsRef<Path>>(path: P) -> Result<Vec<SiteRecord>> {
    let file = File::open(path)?;
    load_sites_from_reader(file, b',')
}

/// Load sites from any reader; `delimiter` is usually `b','` or `b';'`
///
/// Cells are trimmed, so `"; 10"` and `";10"` read the same.
pub fn load_sites_from_reader<R: Read>(reader: R, delimiter: u8) -> Result<Vec<SiteRecord>> {
    let csv_reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(Trim::All)
        .from_reader(reader);
    collect_sites(csv_reader)
}

fn collect_sites<R: Read>(mut reader: Reader<R>) -> Result<Vec<SiteRecord>> {
    let mut sites = Vec::new();
    for result in reader.deserialize() {
        let row: CsvRow = result?;
        sites.push(row.into_record()?);
    }
    Ok(sites)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "site_id;address;tilt_deg;azimuth_deg;area_m2;kwp;eur_per_kwp;capex_total;\
opex_pct;self_use_pct;purchase_price_ct;export_price_ct;wacc_pct;degradation_avg_pct;\
degradation_worst_pct;inflation_pct;merit_order_drop_pct;replacement_cost;replacement_year";

    #[test]
    fn test_load_semicolon_file_with_decimal_commas() {
        let data = format!(
            "{}\n\
             hh-1;Mönckebergstraße, Hamburg;35;0;500;;1100;;1;40;28;8;6;0,5;1;2;1;2000;10\n\
             m-2;Marienplatz, München;20;-45;;120,5;;130000;1,5;60;31,2;7,9;5;0,4;0,8;2,5;1,5;3500;12\n",
            HEADER
        );

        let sites = load_sites_from_reader(data.as_bytes(), b';').unwrap();
        assert_eq!(sites.len(), 2);

        let first = &sites[0];
        assert_eq!(first.site_id, "hh-1");
        assert_eq!(first.inputs.capacity, CapacityInput::Area { m2: 500.0 });
        assert_eq!(first.inputs.capex, CapexInput::PerKwp { eur_per_kwp: 1100.0 });
        assert_eq!(first.inputs.degradation_avg_pct, 0.5);

        let second = &sites[1];
        assert_eq!(second.inputs.capacity, CapacityInput::Direct { kwp: 120.5 });
        assert_eq!(second.inputs.capex, CapexInput::Total { eur: 130_000.0 });
        assert_eq!(second.inputs.azimuth_deg, -45.0);
        assert_eq!(second.inputs.purchase_price_ct, 31.2);
        assert_eq!(second.inputs.replacement_year, 12);
    }

    #[test]
    fn test_comma_file_with_padded_cells() {
        let header = HEADER.replace(';', ",");
        let data = format!(
            "{}\nhh-1, Hamburg, 35, 0, 500, , 1100, , 1, 40, 28, 8, 6, 0.5, 1, 2, 1, 2000, 10\n",
            header
        );
        let path = std::env::temp_dir().join(format!("sites_padded_{}.csv", std::process::id()));
        std::fs::write(&path, data).unwrap();

        let sites = load_sites(&path);
        std::fs::remove_file(&path).unwrap();
        let sites = sites.unwrap();

        assert_eq!(sites.len(), 1);
        assert_eq!(sites[0].site_id, "hh-1");
        assert_eq!(sites[0].inputs.address, "Hamburg");
        assert_eq!(sites[0].inputs.replacement_year, 10);
        assert_eq!(sites[0].inputs.capacity, CapacityInput::Area { m2: 500.0 });
    }

    #[test]
    fn test_ambiguous_capacity_is_rejected() {
        let data = format!(
            "{}\nx;Somewhere;35;0;500;80;1100;;1;40;28;8;6;0,5;1;2;1;2000;10\n",
            HEADER
        );
        let err = load_sites_from_reader(data.as_bytes(), b';').unwrap_err();
        assert!(matches!(err, EngineError::InvalidParameter { field: "capacity", .. }));
    }

    #[test]
    fn test_bad_number_is_rejected() {
        let data = format!(
            "{}\nx;Somewhere;steep;0;500;;1100;;1;40;28;8;6;0,5;1;2;1;2000;10\n",
            HEADER
        );
        let err = load_sites_from_reader(data.as_bytes(), b';').unwrap_err();
        assert!(matches!(err, EngineError::InvalidParameter { field: "tilt_deg", .. }));
    }
}
