use std::fs;
use std::path::PathBuf;

use reqwest::blocking::Client;
use tracing::info;

use crate::config::{AdminLevel, DmpConfig};
use crate::error::{BiomasseError, Result};

/// Fetch the raw wide-format DMP extract and save it verbatim to the raw
/// path for `admin_level`.
///
/// One-shot blocking GET; transport failures propagate unmodified and are
/// never retried.
pub fn download_dmp(
    client: &Client,
    config: &DmpConfig,
    admin_level: AdminLevel,
) -> Result<PathBuf> {
    let url = config.download_url(admin_level);
    let save_path = config.raw_path(admin_level);

    info!("Downloading DMP {admin_level} extract");
    let response = client.get(&url).send()?;

    if !response.status().is_success() {
        return Err(BiomasseError::Api {
            message: format!("DMP WFS error: {}", response.status()),
        });
    }

    let body = response.bytes()?;
    if let Some(parent) = save_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&save_path, &body)?;
    info!("Saved raw DMP data to {}", save_path.display());

    Ok(save_path)
}
