use std::path::PathBuf;

use polars::prelude::*;
use tracing::{debug, info};

use crate::config::{AdminLevel, DmpConfig};
use crate::download;
use crate::error::{BiomasseError, Result};
use crate::reshape;
use crate::schema::{long, raw, result};
use crate::season;

/// Entry point for the DMP/biomasse feature.
///
/// Holds the data-root configuration; every operation takes the remaining
/// parameters explicitly.
pub struct DmpSource {
    config: DmpConfig,
}

impl DmpSource {
    pub fn new(config: DmpConfig) -> Self {
        Self { config }
    }

    pub fn from_env() -> Result<Self> {
        Ok(Self::new(DmpConfig::from_env()?))
    }

    pub fn config(&self) -> &DmpConfig {
        &self.config
    }

    /// Fetch the raw extract for `admin_level` into the raw data layout.
    pub fn download(
        &self,
        client: &reqwest::blocking::Client,
        admin_level: AdminLevel,
    ) -> Result<PathBuf> {
        download::download_dmp(client, &self.config, admin_level)
    }

    /// Load the raw wide-format DMP table.
    ///
    /// The provider's sentinel tokens are read as missing values, and
    /// columns that end up entirely missing are dropped.
    pub fn load_dmp(&self, admin_level: AdminLevel) -> Result<DataFrame> {
        let path = self.config.raw_path(admin_level);
        if !path.is_file() {
            return Err(BiomasseError::RawDmpMissing { path });
        }
        debug!("Reading raw DMP data from {}", path.display());

        let parse_options = CsvParseOptions::default().with_null_values(Some(
            NullValues::AllColumns(raw::NA_VALUES.iter().map(|v| (*v).into()).collect()),
        ));
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_parse_options(parse_options)
            .try_into_reader_with_file_path(Some(path))?
            .finish()?;

        Self::require_columns(&df, &[raw::AREA, raw::POLYGON_ID])?;

        let keep: Vec<String> = df
            .get_columns()
            .iter()
            .filter(|c| c.null_count() < c.len())
            .map(|c| c.name().to_string())
            .collect();
        Ok(df.select(keep)?)
    }

    /// Calculate biomasse from the raw DMP data.
    ///
    /// The raw extract arrives wide: one row per polygon, one column per
    /// dekadal observation plus one per dekadal multi-year mean. This
    /// pivots both families to long form, collapses polygons into logical
    /// admin areas by area-weighted averaging, accumulates values over the
    /// season starting at `start_dekad` (ending the dekad before it the
    /// following year), and derives the anomaly against the accumulated
    /// multi-year mean.
    pub fn calculate_biomasse(
        &self,
        admin_level: AdminLevel,
        start_dekad: u8,
    ) -> Result<DataFrame> {
        season::validate_start_dekad(start_dekad)?;

        let df = self.load_dmp(admin_level)?;
        let admin_cols = reshape::admin_columns(&df);
        info!(
            "Calculating biomasse for {admin_level} with season start dekad {start_dekad}"
        );

        // mean and observation families are pivoted separately: means are
        // dekad-indexed, observations year/dekad-indexed
        let means = reshape::dekadal_means_long(&df)?;
        let observations = reshape::observations_long(&df, start_dekad)?;

        let means_cum = season::accumulate_means(means, &admin_cols, start_dekad)?;
        let merged =
            season::accumulate_observations(observations, means_cum, &admin_cols, start_dekad)?;

        let mut ordered: Vec<Expr> = admin_cols.iter().map(|c| col(c.as_str())).collect();
        ordered.extend([
            col(long::YEAR),
            col(long::DEKAD),
            col(result::SEASON),
            col(long::DMP_MEAN),
            col(long::DMP),
            col(result::BIOMASSE_MEAN),
            col(result::BIOMASSE),
            col(result::BIOMASSE_ANOMALY),
        ]);
        Ok(merged.lazy().select(ordered).collect()?)
    }

    fn require_columns(df: &DataFrame, required: &[&str]) -> Result<()> {
        for &col_name in required {
            if df.column(col_name).is_err() {
                return Err(BiomasseError::MissingColumn(col_name.to_string()));
            }
        }
        Ok(())
    }
}
