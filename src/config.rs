use std::env;
use std::fmt;
use std::path::PathBuf;

use crate::error::{BiomasseError, Result};

/// Environment variable naming the biomasse data-root directory.
pub const DMP_DATA_DIR_ENV: &str = "AA_DATA_DIR";

/// Environment variable naming the reanalysis data-root directory.
pub const REANALYSIS_DATA_DIR_ENV: &str = "AA_DATA_DIR_NEW";

/// Administrative level of the DMP feature layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AdminLevel {
    Adm0,
    Adm1,
    #[default]
    Adm2,
}

impl AdminLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdminLevel::Adm0 => "ADM0",
            AdminLevel::Adm1 => "ADM1",
            AdminLevel::Adm2 => "ADM2",
        }
    }
}

impl fmt::Display for AdminLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Data-root configuration for the DMP/biomasse feature.
///
/// The data root is an explicit constructor parameter; `from_env` is a
/// convenience for the conventional `AA_DATA_DIR` layout.
#[derive(Debug, Clone)]
pub struct DmpConfig {
    data_dir: PathBuf,
}

impl DmpConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn from_env() -> Result<Self> {
        let dir = env::var(DMP_DATA_DIR_ENV).map_err(|_| {
            BiomasseError::Config(format!("{DMP_DATA_DIR_ENV} is not set"))
        })?;
        Ok(Self::new(dir))
    }

    /// Directory holding the raw DMP extracts.
    pub fn raw_dir(&self) -> PathBuf {
        self.data_dir
            .join("public")
            .join("raw")
            .join("glb")
            .join("biomasse")
    }

    /// Path of the raw wide-format CSV for one admin level.
    pub fn raw_path(&self, admin_level: AdminLevel) -> PathBuf {
        self.raw_dir()
            .join(format!("WA_DMP_{admin_level}_ef_v0.csv"))
    }

    /// Path a processed biomasse table would be written to.
    ///
    /// The pipeline itself never writes here; callers that persist results
    /// are expected to use this layout.
    pub fn processed_path(
        &self,
        admin_level: AdminLevel,
        start_dekad: u8,
        iso3: Option<&str>,
    ) -> PathBuf {
        let iso3 = iso3.unwrap_or("glb");
        self.data_dir
            .join("public")
            .join("processed")
            .join(iso3)
            .join("biomasse")
            .join(format!(
                "biomasse_{iso3}_{admin_level}_dekad_{start_dekad}.csv"
            ))
    }

    /// WFS GetFeature URL serving the wide-format CSV for one admin level.
    pub fn download_url(&self, admin_level: AdminLevel) -> String {
        format!(
            "http://213.206.230.89:8080/geoserver\
             /Biomass/wfs?&REQUEST=\
             GetFeature&SERVICE=wfs&VERSION=1.1.0\
             &TYPENAME=WA_DMP_{admin_level}_ef_v1&\
             outputformat=csv&srsName=EPSG:4326"
        )
    }
}

/// Data-root configuration for the ERA5 reanalysis feature.
///
/// Kept separate from [`DmpConfig`] because the two features read from
/// different data roots.
#[derive(Debug, Clone)]
pub struct ReanalysisConfig {
    data_dir: PathBuf,
}

impl ReanalysisConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn from_env() -> Result<Self> {
        let dir = env::var(REANALYSIS_DATA_DIR_ENV).map_err(|_| {
            BiomasseError::Config(format!("{REANALYSIS_DATA_DIR_ENV} is not set"))
        })?;
        Ok(Self::new(dir))
    }

    /// Path of the raw reanalysis GRIB extract.
    pub fn raw_path(&self) -> PathBuf {
        self.data_dir
            .join("public")
            .join("raw")
            .join("cmr")
            .join("era5")
            .join("cmr-extremenord-era5-julyonly.grib")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_level_strings() {
        assert_eq!(AdminLevel::Adm0.as_str(), "ADM0");
        assert_eq!(AdminLevel::Adm1.as_str(), "ADM1");
        assert_eq!(AdminLevel::Adm2.as_str(), "ADM2");
        assert_eq!(AdminLevel::default(), AdminLevel::Adm2);
    }

    #[test]
    fn test_raw_path_layout() {
        let config = DmpConfig::new("/data");
        assert_eq!(
            config.raw_path(AdminLevel::Adm2),
            PathBuf::from("/data/public/raw/glb/biomasse/WA_DMP_ADM2_ef_v0.csv")
        );
    }

    #[test]
    fn test_processed_path_layout() {
        let config = DmpConfig::new("/data");
        assert_eq!(
            config.processed_path(AdminLevel::Adm1, 10, None),
            PathBuf::from(
                "/data/public/processed/glb/biomasse/biomasse_glb_ADM1_dekad_10.csv"
            )
        );
        assert_eq!(
            config.processed_path(AdminLevel::Adm1, 1, Some("bfa")),
            PathBuf::from(
                "/data/public/processed/bfa/biomasse/biomasse_bfa_ADM1_dekad_1.csv"
            )
        );
    }

    #[test]
    fn test_download_url_is_parameterized_by_level() {
        let config = DmpConfig::new("/data");
        let url = config.download_url(AdminLevel::Adm0);
        assert!(url.contains("TYPENAME=WA_DMP_ADM0_ef_v1"));
        assert!(url.contains("outputformat=csv"));
        assert!(url.contains("srsName=EPSG:4326"));
    }

    #[test]
    fn test_reanalysis_raw_path() {
        let config = ReanalysisConfig::new("/data-new");
        assert_eq!(
            config.raw_path(),
            PathBuf::from(
                "/data-new/public/raw/cmr/era5/cmr-extremenord-era5-julyonly.grib"
            )
        );
    }
}
