//! Geocoding through the OpenStreetMap Nominatim search API

use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;

use super::{AddressResolver, Coordinates};
use crate::error::LookupError;

/// A single search hit; Nominatim encodes coordinates as strings
#[derive(Debug, Deserialize)]
struct SearchHit {
    lat: String,
    lon: String,
}

pub struct NominatimResolver {
    client: Client,
    base_url: String,
}

impl NominatimResolver {
    /// Nominatim's usage policy requires an identifying User-Agent
    pub fn new(base_url: &str, user_agent: &str, timeout: Duration) -> Result<Self, LookupError> {
        let client = Client::builder().user_agent(user_agent).timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Best match for `address`, `Ok(None)` when nothing was found
    pub fn search(&self, address: &str) -> Result<Option<Coordinates>, LookupError> {
        let response = self
            .client
            .get(format!("{}/search", self.base_url))
            .query(&[("q", address), ("format", "json"), ("limit", "1")])
            .send()?;

        if !response.status().is_success() {
            return Err(LookupError::Status(response.status()));
        }

        let hits: Vec<SearchHit> = response.json()?;
        first_hit(&hits)
    }
}

fn first_hit(hits: &[SearchHit]) -> Result<Option<Coordinates>, LookupError> {
    let Some(hit) = hits.first() else {
        return Ok(None);
    };
    let lat = parse_degrees("lat", &hit.lat)?;
    let lon = parse_degrees("lon", &hit.lon)?;
    Ok(Some(Coordinates::new(lat, lon)))
}

fn parse_degrees(field: &'static str, value: &str) -> Result<f64, LookupError> {
    value.trim().parse::<f64>().map_err(|_| LookupError::Parse {
        field,
        value: value.to_string(),
    })
}

impl AddressResolver for NominatimResolver {
    fn resolve(&self, address: &str) -> Option<Coordinates> {
        if address.trim().is_empty() {
            return None;
        }
        match self.search(address) {
            Ok(Some(coordinates)) => {
                log::debug!("resolved {:?} to {:.4}, {:.4}", address, coordinates.lat, coordinates.lon);
                Some(coordinates)
            }
            Ok(None) => {
                log::warn!("no geocoding result for {:?}", address);
                None
            }
            Err(e) => {
                log::warn!("geocoding {:?} failed: {}", address, e);
                None
            }
        }
    }
}
