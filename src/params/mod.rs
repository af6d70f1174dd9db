//! Investment parameters: raw site inputs, validation, and portfolio loading

mod data;
pub mod loader;

pub use data::{
    CapacityInput, CapexInput, InvestmentParameters, PanelGeometry, SiteInputs, M2_PER_KWP,
};
pub use loader::{load_sites, load_sites_from_reader, SiteRecord};
