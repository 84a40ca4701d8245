//! Analysis-ready tables for two remote-sensing/climate datasets: dekadal
//! Dry Matter Productivity (DMP) biomass data and ERA5 reanalysis grids.
//!
//! The core is [`DmpSource::calculate_biomasse`]: it pivots the raw wide
//! extract to long form, collapses non-contiguous polygons into logical
//! admin areas by area-weighted averaging, accumulates values over a
//! configurable season, and derives an anomaly against the accumulated
//! multi-year dekadal mean. Downloading, path construction, and raw-grid
//! loading are thin wrappers around that transform.

mod config;
mod dmp;
mod download;
mod error;
mod reanalysis;
mod reshape;
mod season;

pub mod schema;

pub use config::{
    AdminLevel, DmpConfig, ReanalysisConfig, DMP_DATA_DIR_ENV, REANALYSIS_DATA_DIR_ENV,
};
pub use dmp::DmpSource;
pub use download::download_dmp;
pub use error::{BiomasseError, Result};
pub use reanalysis::{ReanalysisField, ReanalysisSource};
