/// Column-name constants for the biomasse tables.
/// Single source of truth for every stage of the pipeline.

// ── Raw wide-table columns ──────────────────────────────────────────────────
pub mod raw {
    /// Prefix shared by every administrative-key column (admin0Name, ...).
    pub const ADMIN_PREFIX: &str = "admin";
    /// Polygon surface area, the weight for spatial aggregation.
    pub const AREA: &str = "AREA";
    /// Polygon identifier. Non-contiguous admin areas appear as several
    /// rows sharing the admin columns but with distinct ids; the id is
    /// discarded once polygons are collapsed.
    pub const POLYGON_ID: &str = "IDBIOHYDRO";
    /// Wide observation columns: `DMP_{YYYYDD}`.
    pub const DMP_PREFIX: &str = "DMP";
    /// Wide multi-year-mean columns: `DMP_MEA_{dekad}`.
    pub const MEAN_PREFIX: &str = "DMP_MEA";

    /// Sentinel tokens the provider uses for missing values.
    pub const NA_VALUES: [&str; 2] = ["-9998.8", "-9999.0"];
}

// ── Long-table columns ──────────────────────────────────────────────────────
pub mod long {
    pub const DMP: &str = "DMP";
    pub const DMP_MEAN: &str = "DMP_MEA";
    pub const YEAR: &str = "year";
    pub const DEKAD: &str = "dekad";
}

// ── Result columns ──────────────────────────────────────────────────────────
pub mod result {
    pub const SEASON: &str = "season";
    pub const SEASON_INDEX: &str = "season_index";
    pub const BIOMASSE: &str = "biomasse";
    pub const BIOMASSE_MEAN: &str = "biomasse_mean";
    pub const BIOMASSE_ANOMALY: &str = "biomasse_anomaly";
}

// ── Dekad arithmetic ────────────────────────────────────────────────────────
/// Dekads in one calendar year.
pub const DEKADS_PER_YEAR: u8 = 36;

/// Scale turning a dekadal cumulative sum into an annualized daily-rate
/// equivalent (365.25-day year over 36 dekads).
pub const DEKAD_TO_ANNUAL: f64 = 365.25 / 36.0;
