//! First-year yield from the EU JRC PVGIS `PVcalc` service
//!
//! The yearly total for a fixed-mount system is read from
//! `outputs.totals.fixed.E_y` (kWh).

use std::time::Duration;

use reqwest::blocking::Client;
use serde_json::Value;

use super::{YieldEstimator, YieldRequest};
use crate::error::LookupError;

const YEARLY_TOTAL_POINTER: &str = "/outputs/totals/fixed/E_y";

pub struct PvgisEstimator {
    client: Client,
    base_url: String,
}

impl PvgisEstimator {
    pub fn new(base_url: &str, user_agent: &str, timeout: Duration) -> Result<Self, LookupError> {
        let client = Client::builder().user_agent(user_agent).timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Query PVcalc for the yearly yield of the requested installation
    pub fn yearly_yield(&self, request: &YieldRequest) -> Result<f64, LookupError> {
        let query = [
            ("lat", request.coordinates.lat.to_string()),
            ("lon", request.coordinates.lon.to_string()),
            ("peakpower", request.kwp.to_string()),
            ("loss", request.system_loss_pct.to_string()),
            ("outputformat", "json".to_string()),
            ("angle", request.geometry.tilt_deg.to_string()),
            ("aspect", request.geometry.azimuth_deg.to_string()),
        ];

        let response = self
            .client
            .get(format!("{}/PVcalc", self.base_url))
            .query(&query)
            .send()?;

        if !response.status().is_success() {
            return Err(LookupError::Status(response.status()));
        }

        let body: Value = response.json()?;
        yearly_total(&body)
    }
}

fn yearly_total(body: &Value) -> Result<f64, LookupError> {
    let total = body
        .pointer(YEARLY_TOTAL_POINTER)
        .ok_or(LookupError::MissingField("outputs.totals.fixed.E_y"))?;
    total
        .as_f64()
        .filter(|kwh| kwh.is_finite() && *kwh >= 0.0)
        .ok_or_else(|| LookupError::Parse {
            field: "E_y",
            value: total.to_string(),
        })
}

impl YieldEstimator for PvgisEstimator {
    fn estimate(&self, request: &YieldRequest) -> Option<f64> {
        if request.kwp <= 0.0 {
            return Some(0.0);
        }
        match self.yearly_yield(request) {
            Ok(kwh) => {
                log::debug!(
                    "PVGIS yield {:.0} kWh for {:.2} kWp at {:.4}, {:.4}",
                    kwh,
                    request.kwp,
                    request.coordinates.lat,
                    request.coordinates.lon
                );
                Some(kwh)
            }
            Err(e) => {
                log::warn!("PVGIS lookup failed: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::Coordinates;
    use crate::params::PanelGeometry;
    use serde_json::json;
    use std::net::TcpListener;
    use std::thread;
    use std::time::Instant;

    /// Accepts one connection and keeps it open without ever answering
    fn silent_server() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            if let Ok((stream, _)) = listener.accept() {
                thread::sleep(Duration::from_secs(3));
                drop(stream);
            }
        });
        format!("http://{}", addr)
    }

    #[test]
    fn test_reads_yearly_total() {
        let body = json!({
            "inputs": { "location": { "latitude": 53.55, "longitude": 9.99 } },
            "outputs": {
                "monthly": { "fixed": [] },
                "totals": { "fixed": { "E_d": 217.1, "E_m": 6604.4, "E_y": 79252.8 } }
            }
        });
        assert_eq!(yearly_total(&body).unwrap(), 79252.8);
    }

    #[test]
    fn test_missing_total() {
        let body = json!({ "message": "Location over the sea", "status": 400 });
        assert!(matches!(yearly_total(&body), Err(LookupError::MissingField(_))));
    }

    #[test]
    fn test_non_numeric_total() {
        let body = json!({ "outputs": { "totals": { "fixed": { "E_y": "lots" } } } });
        assert!(matches!(yearly_total(&body), Err(LookupError::Parse { field: "E_y", .. })));
    }

    #[test]
    fn test_zero_capacity_skips_request() {
        let estimator =
            PvgisEstimator::new("http://127.0.0.1:9", "test", Duration::from_millis(50)).unwrap();
        let request = YieldRequest {
            coordinates: Coordinates::new(53.55, 9.99),
            kwp: 0.0,
            geometry: PanelGeometry::default(),
            system_loss_pct: 14.0,
        };
        assert_eq!(estimator.estimate(&request), Some(0.0));
    }

    #[test]
    fn test_timeout_counts_as_failure() {
        let estimator =
            PvgisEstimator::new(&silent_server(), "test", Duration::from_millis(100)).unwrap();
        let request = YieldRequest {
            coordinates: Coordinates::new(53.55, 9.99),
            kwp: 80.0,
            geometry: PanelGeometry::default(),
            system_loss_pct: 14.0,
        };

        let start = Instant::now();
        assert_eq!(estimator.estimate(&request), None);
        assert!(start.elapsed() < Duration::from_secs(2), "took {:?}", start.elapsed());
    }
}
