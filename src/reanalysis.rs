use eccodes::{CodesFile, FallibleIterator, KeyRead, ProductKind};
use ndarray::Array2;
use tracing::info;

use crate::config::ReanalysisConfig;
use crate::error::{BiomasseError, Result};

/// One decoded GRIB message: grid metadata keys plus the value grid.
#[derive(Debug)]
pub struct ReanalysisField {
    pub grid_type: String,
    pub parameter_name: String,
    pub type_of_level: String,
    pub level: i64,
    pub step_type: String,
    pub values: Array2<f64>,
}

/// Entry point for the ERA5 reanalysis feature.
pub struct ReanalysisSource {
    config: ReanalysisConfig,
}

impl ReanalysisSource {
    pub fn new(config: ReanalysisConfig) -> Self {
        Self { config }
    }

    pub fn from_env() -> Result<Self> {
        Ok(Self::new(ReanalysisConfig::from_env()?))
    }

    pub fn config(&self) -> &ReanalysisConfig {
        &self.config
    }

    /// Load the raw reanalysis extract into memory.
    ///
    /// No transformation is applied beyond decoding each GRIB message into
    /// its metadata keys and value grid.
    pub fn load_raw(&self) -> Result<Vec<ReanalysisField>> {
        let path = self.config.raw_path();
        if !path.is_file() {
            return Err(BiomasseError::RawReanalysisMissing { path });
        }
        info!("Reading reanalysis GRIB file {}", path.display());

        let mut handle = CodesFile::new_from_file(path, ProductKind::GRIB)?;
        let mut fields = Vec::new();

        while let Some(msg) = handle.ref_message_iter().next()? {
            let grid_type: String = msg.read_key("gridType")?;
            let parameter_name: String = msg.read_key("parameterName")?;
            let type_of_level: String = msg.read_key("typeOfLevel")?;
            let level: i64 = msg.read_key("level")?;
            let step_type: String = msg.read_key("stepType")?;
            let values = msg.to_ndarray()?;

            fields.push(ReanalysisField {
                grid_type,
                parameter_name,
                type_of_level,
                level,
                step_type,
                values,
            });
        }

        Ok(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_raw_file_is_a_precondition_error() {
        let source = ReanalysisSource::new(ReanalysisConfig::new("/nonexistent"));
        assert!(matches!(
            source.load_raw(),
            Err(BiomasseError::RawReanalysisMissing { .. })
        ));
    }
}
