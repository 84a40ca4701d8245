use polars::prelude::*;

use crate::error::{BiomasseError, Result};
use crate::schema::{long, raw, DEKADS_PER_YEAR};

/// How a wide column's name suffix maps onto long-table index columns.
#[derive(Debug, Clone, Copy)]
pub enum FamilyIndex {
    /// `{prefix}_{dekad}`, dekad-of-year only.
    Dekad,
    /// `{prefix}_{YYYYDD}`, a fixed-width 4-digit year and 2-digit dekad.
    YearDekad,
}

/// Declarative wide→long reshape specification for one column family.
///
/// The mean and observation families are structurally identical melts
/// distinguished only by prefix and index semantics, so both run through
/// the same routine.
#[derive(Debug, Clone, Copy)]
pub struct WideFamily {
    pub prefix: &'static str,
    pub value_name: &'static str,
    pub index: FamilyIndex,
}

/// Multi-year dekadal means: `DMP_MEA_1` … `DMP_MEA_36`.
pub const MEAN_FAMILY: WideFamily = WideFamily {
    prefix: raw::MEAN_PREFIX,
    value_name: long::DMP_MEAN,
    index: FamilyIndex::Dekad,
};

/// Dekadal observations: `DMP_{YYYYDD}`.
pub const OBSERVATION_FAMILY: WideFamily = WideFamily {
    prefix: raw::DMP_PREFIX,
    value_name: long::DMP,
    index: FamilyIndex::YearDekad,
};

struct MatchedColumn {
    name: String,
    year: Option<i32>,
    dekad: i32,
}

fn check_dekad(name: &str, dekad: i32) -> Result<()> {
    if !(1..=i32::from(DEKADS_PER_YEAR)).contains(&dekad) {
        return Err(BiomasseError::InvalidData(format!(
            "Dekad out of range in column '{name}'"
        )));
    }
    Ok(())
}

/// Wide columns belonging to `family`, sorted by (year, dekad).
///
/// A column matches when its name is `{prefix}_{digits}`; the digits are
/// the dekad for dekad-indexed families, or a fixed-width 6-digit
/// year+dekad for observation families. `DMP_MEA_*` never matches the
/// `DMP` prefix because its suffix is not purely numeric.
fn family_columns(df: &DataFrame, family: &WideFamily) -> Result<Vec<MatchedColumn>> {
    let tag = format!("{}_", family.prefix);
    let mut matched = Vec::new();

    for name in df.get_column_names_str() {
        let Some(suffix) = name.strip_prefix(tag.as_str()) else {
            continue;
        };
        if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
            continue;
        }

        match family.index {
            FamilyIndex::Dekad => {
                let dekad: i32 = suffix.parse().map_err(|_| {
                    BiomasseError::InvalidData(format!("Bad dekad suffix in column '{name}'"))
                })?;
                check_dekad(name, dekad)?;
                matched.push(MatchedColumn {
                    name: name.to_string(),
                    year: None,
                    dekad,
                });
            }
            FamilyIndex::YearDekad => {
                if suffix.len() != 6 {
                    continue;
                }
                let year: i32 = suffix[..4].parse().map_err(|_| {
                    BiomasseError::InvalidData(format!("Bad year in column '{name}'"))
                })?;
                let dekad: i32 = suffix[4..].parse().map_err(|_| {
                    BiomasseError::InvalidData(format!("Bad dekad in column '{name}'"))
                })?;
                check_dekad(name, dekad)?;
                matched.push(MatchedColumn {
                    name: name.to_string(),
                    year: Some(year),
                    dekad,
                });
            }
        }
    }

    matched.sort_by_key(|c| (c.year, c.dekad));
    Ok(matched)
}

/// Administrative-key columns of the raw table.
pub fn admin_columns(df: &DataFrame) -> Vec<String> {
    df.get_column_names_str()
        .iter()
        .filter(|name| name.starts_with(raw::ADMIN_PREFIX))
        .map(|name| name.to_string())
        .collect()
}

/// Melt one wide column family into long form: one row per
/// (source row, index) pair, carrying `id_cols` through unchanged.
fn wide_to_long(df: &DataFrame, id_cols: &[String], family: &WideFamily) -> Result<DataFrame> {
    let matched = family_columns(df, family)?;
    if matched.is_empty() {
        return Err(BiomasseError::InvalidData(format!(
            "No {}_* columns in raw data",
            family.prefix
        )));
    }

    let mut long_df: Option<DataFrame> = None;
    for mc in &matched {
        let mut part = df.select(id_cols.iter().cloned())?;
        let height = part.height();

        let mut values = df.column(&mc.name)?.as_materialized_series().clone();
        values.rename(family.value_name.into());
        part.with_column(values)?;

        if let Some(year) = mc.year {
            part.with_column(Column::new(long::YEAR.into(), vec![year; height]))?;
        }
        part.with_column(Column::new(long::DEKAD.into(), vec![mc.dekad; height]))?;

        let part = part
            .lazy()
            .with_columns([
                col(family.value_name).cast(DataType::Float64),
                col(raw::AREA).cast(DataType::Float64),
            ])
            .collect()?;

        long_df = Some(match long_df {
            None => part,
            Some(acc) => acc.vstack(&part)?,
        });
    }

    Ok(long_df.expect("family has at least one column"))
}

/// Collapse rows sharing `group_cols` into one row with the area-weighted
/// average of `value_col`.
///
/// The reduce is `sum(value·weight) / sum(weight)` per group. A group with
/// any missing value, or with zero total weight, yields a missing average.
pub fn weighted_average(
    df: &DataFrame,
    group_cols: &[String],
    value_col: &str,
    weight_col: &str,
) -> Result<DataFrame> {
    let partitions = df.partition_by(group_cols, true)?;

    let mut key_columns: Vec<Vec<AnyValue>> = vec![vec![]; group_cols.len()];
    let mut averages: Vec<Option<f64>> = Vec::with_capacity(partitions.len());

    for partition in &partitions {
        for (i, gc) in group_cols.iter().enumerate() {
            let val = partition.column(gc)?.get(0)?;
            key_columns[i].push(val.into_static());
        }

        let values = partition.column(value_col)?.as_materialized_series().f64()?;
        let weights = partition
            .column(weight_col)?
            .as_materialized_series()
            .f64()?;

        let mut sum_vw = 0.0;
        let mut sum_w = 0.0;
        let mut complete = true;
        for i in 0..partition.height() {
            let (Some(value), Some(weight)) = (values.get(i), weights.get(i)) else {
                complete = false;
                break;
            };
            sum_vw += value * weight;
            sum_w += weight;
        }

        averages.push(if complete && sum_w > 0.0 {
            Some(sum_vw / sum_w)
        } else {
            None
        });
    }

    let mut columns: Vec<Column> = Vec::with_capacity(group_cols.len() + 1);
    for (i, gc) in group_cols.iter().enumerate() {
        let series = Series::from_any_values(gc.as_str().into(), &key_columns[i], true)?;
        columns.push(series.into());
    }
    columns.push(Column::new(value_col.into(), averages));

    Ok(DataFrame::new(columns)?)
}

/// Long mean table: one row per (admin key, dekad) with the area-weighted
/// multi-year mean.
///
/// Non-contiguous admin areas appear as separate polygons in the raw data;
/// the weighted collapse turns them into one logical record per key.
pub fn dekadal_means_long(df: &DataFrame) -> Result<DataFrame> {
    let admin_cols = require_admin_columns(df)?;

    let mut id_cols = admin_cols.clone();
    id_cols.push(raw::AREA.to_string());
    let long = wide_to_long(df, &id_cols, &MEAN_FAMILY)?;

    let mut group_cols = admin_cols;
    group_cols.push(long::DEKAD.to_string());
    weighted_average(&long, &group_cols, long::DMP_MEAN, raw::AREA)
}

/// Long observation table: one row per (admin key, year, dekad) with the
/// area-weighted observed value.
///
/// Rows of the earliest year whose dekad precedes `start_dekad` are
/// dropped; they belong to a season whose opening dekads are not in the
/// data.
pub fn observations_long(df: &DataFrame, start_dekad: u8) -> Result<DataFrame> {
    let admin_cols = require_admin_columns(df)?;

    let mut id_cols = admin_cols.clone();
    id_cols.push(raw::AREA.to_string());
    let long = wide_to_long(df, &id_cols, &OBSERVATION_FAMILY)?;

    let mut group_cols = admin_cols;
    group_cols.push(long::YEAR.to_string());
    group_cols.push(long::DEKAD.to_string());
    let collapsed = weighted_average(&long, &group_cols, long::DMP, raw::AREA)?;

    let first_year = collapsed.column(long::YEAR)?.i32()?.min();
    let Some(first_year) = first_year else {
        return Ok(collapsed);
    };

    let filtered = collapsed
        .lazy()
        .filter(
            col(long::YEAR)
                .eq(lit(first_year))
                .and(col(long::DEKAD).lt(lit(i32::from(start_dekad))))
                .not(),
        )
        .collect()?;
    Ok(filtered)
}

fn require_admin_columns(df: &DataFrame) -> Result<Vec<String>> {
    let admin_cols = admin_columns(df);
    if admin_cols.is_empty() {
        return Err(BiomasseError::InvalidData(
            "Raw data has no administrative-key columns".to_string(),
        ));
    }
    Ok(admin_cols)
}
