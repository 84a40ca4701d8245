use polars::prelude::*;

use crate::error::{BiomasseError, Result};
use crate::schema::{long, result, DEKADS_PER_YEAR, DEKAD_TO_ANNUAL};

pub fn validate_start_dekad(start_dekad: u8) -> Result<()> {
    if !(1..=DEKADS_PER_YEAR).contains(&start_dekad) {
        return Err(BiomasseError::InvalidStartDekad(start_dekad));
    }
    Ok(())
}

/// Position of a dekad within a season starting at `start_dekad`.
///
/// Linearizes the dekad-of-year into 0–35 regardless of where the season
/// starts in the calendar.
fn season_index_expr(start_dekad: u8) -> Expr {
    let start = i32::from(start_dekad);
    when(col(long::DEKAD).gt_eq(lit(start)))
        .then(col(long::DEKAD) - lit(start))
        .otherwise(col(long::DEKAD) + lit(i32::from(DEKADS_PER_YEAR) - start))
        .alias(result::SEASON_INDEX)
}

/// Label of the season an observation belongs to.
///
/// A season runs from `start_dekad` to `start_dekad - 1` of the following
/// year, labelled `"{year}-{year+1}"`; with `start_dekad == 1` a season is
/// exactly a calendar year and the label is the bare year.
fn season_label_expr(start_dekad: u8) -> Expr {
    let start = i32::from(start_dekad);
    let season_year = col(long::YEAR)
        + when(col(long::DEKAD).gt_eq(lit(start)))
            .then(lit(1))
            .otherwise(lit(0))
        - lit(1);

    let label = if start_dekad > 1 {
        concat_str(
            [
                season_year.clone().cast(DataType::String),
                (season_year + lit(1)).cast(DataType::String),
            ],
            "-",
            false,
        )
    } else {
        season_year.cast(DataType::String)
    };
    label.alias(result::SEASON)
}

/// Attach `biomasse_mean` to the long mean table: the cumulative sum of
/// dekadal means within each admin key, walked in season order and scaled
/// to an annualized equivalent.
pub fn accumulate_means(
    df_mean: DataFrame,
    admin_cols: &[String],
    start_dekad: u8,
) -> Result<DataFrame> {
    let admin_exprs: Vec<Expr> = admin_cols.iter().map(|c| col(c.as_str())).collect();

    let mut sort_exprs = admin_exprs.clone();
    sort_exprs.push(col(result::SEASON_INDEX));

    let df = df_mean
        .lazy()
        .with_column(season_index_expr(start_dekad))
        .sort_by_exprs(sort_exprs, SortMultipleOptions::default())
        .with_column(
            (col(long::DMP_MEAN).cum_sum(false).over(admin_exprs) * lit(DEKAD_TO_ANNUAL))
                .alias(result::BIOMASSE_MEAN),
        )
        .collect()?;
    Ok(df)
}

/// Merge observations with the accumulated means and derive `biomasse`
/// and `biomasse_anomaly`.
///
/// Observations are walked in (year, dekad) order; the cumulative sum
/// resets at each season boundary because the season label is part of the
/// window key. A zero or missing cumulative mean yields a missing anomaly.
pub fn accumulate_observations(
    df_obs: DataFrame,
    df_mean_cum: DataFrame,
    admin_cols: &[String],
    start_dekad: u8,
) -> Result<DataFrame> {
    let admin_exprs: Vec<Expr> = admin_cols.iter().map(|c| col(c.as_str())).collect();

    let mut join_keys = admin_exprs.clone();
    join_keys.push(col(long::DEKAD));

    let mut sort_exprs = admin_exprs.clone();
    sort_exprs.push(col(long::YEAR));
    sort_exprs.push(col(long::DEKAD));

    let mut season_window = admin_exprs.clone();
    season_window.push(col(result::SEASON));

    let df = df_obs
        .lazy()
        .join(
            df_mean_cum.lazy(),
            join_keys.clone(),
            join_keys,
            JoinArgs::new(JoinType::Inner),
        )
        .sort_by_exprs(sort_exprs, SortMultipleOptions::default())
        .with_column(season_label_expr(start_dekad))
        .with_column(
            (col(long::DMP).cum_sum(false).over(season_window) * lit(DEKAD_TO_ANNUAL))
                .alias(result::BIOMASSE),
        )
        .with_column(
            when(
                col(result::BIOMASSE_MEAN)
                    .is_null()
                    .or(col(result::BIOMASSE_MEAN).eq(lit(0.0))),
            )
            .then(lit(NULL).cast(DataType::Float64))
            .otherwise(lit(100.0) * col(result::BIOMASSE) / col(result::BIOMASSE_MEAN))
            .alias(result::BIOMASSE_ANOMALY),
        )
        .collect()?;
    Ok(df)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin() -> Vec<String> {
        vec!["admin0Name".to_string()]
    }

    #[test]
    fn test_validate_start_dekad_bounds() {
        assert!(validate_start_dekad(1).is_ok());
        assert!(validate_start_dekad(36).is_ok());
        assert!(matches!(
            validate_start_dekad(0),
            Err(BiomasseError::InvalidStartDekad(0))
        ));
        assert!(matches!(
            validate_start_dekad(37),
            Err(BiomasseError::InvalidStartDekad(37))
        ));
    }

    #[test]
    fn test_season_index_stays_in_range_for_all_starts() {
        let dekads: Vec<i32> = (1..=36).collect();
        for start in 1..=36u8 {
            let df = df!(long::DEKAD => &dekads)
                .unwrap()
                .lazy()
                .with_column(season_index_expr(start))
                .collect()
                .unwrap();
            let idx = df.column(result::SEASON_INDEX).unwrap().i32().unwrap();
            assert_eq!(idx.min(), Some(0), "start {start}");
            assert_eq!(idx.max(), Some(35), "start {start}");
        }
    }

    #[test]
    fn test_season_index_resets_at_start_dekad() {
        let df = df!(long::DEKAD => [9i32, 10, 11])
            .unwrap()
            .lazy()
            .with_column(season_index_expr(10))
            .collect()
            .unwrap();
        let idx = df.column(result::SEASON_INDEX).unwrap().i32().unwrap();
        // dekad 9 is the last position of the season, dekad 10 the first
        assert_eq!(idx.get(0), Some(35));
        assert_eq!(idx.get(1), Some(0));
        assert_eq!(idx.get(2), Some(1));
    }

    #[test]
    fn test_single_year_season_labels() {
        let df = df!(
            long::YEAR => [2020i32, 2020],
            long::DEKAD => [1i32, 36],
        )
        .unwrap()
        .lazy()
        .with_column(season_label_expr(1))
        .collect()
        .unwrap();
        let season = df.column(result::SEASON).unwrap().str().unwrap();
        assert_eq!(season.get(0), Some("2020"));
        assert_eq!(season.get(1), Some("2020"));
    }

    #[test]
    fn test_cross_year_season_labels() {
        let df = df!(
            long::YEAR => [2020i32, 2020],
            long::DEKAD => [9i32, 10],
        )
        .unwrap()
        .lazy()
        .with_column(season_label_expr(10))
        .collect()
        .unwrap();
        let season = df.column(result::SEASON).unwrap().str().unwrap();
        // dekad 9 closes the previous season, dekad 10 opens the next
        assert_eq!(season.get(0), Some("2019-2020"));
        assert_eq!(season.get(1), Some("2020-2021"));
    }

    #[test]
    fn test_mean_accumulation_walks_season_order() {
        let df = df!(
            "admin0Name" => ["AAA", "AAA", "AAA"],
            long::DMP_MEAN => [1.0, 2.0, 4.0],
            long::DEKAD => [9i32, 10, 11],
        )
        .unwrap();
        let out = accumulate_means(df, &admin(), 10).unwrap();

        // season order: dekad 10, 11, ..., 9
        let dekads = out.column(long::DEKAD).unwrap().i32().unwrap();
        assert_eq!(dekads.get(0), Some(10));
        assert_eq!(dekads.get(1), Some(11));
        assert_eq!(dekads.get(2), Some(9));

        let cum = out.column(result::BIOMASSE_MEAN).unwrap().f64().unwrap();
        assert_eq!(cum.get(0), Some(2.0 * DEKAD_TO_ANNUAL));
        assert_eq!(cum.get(1), Some(6.0 * DEKAD_TO_ANNUAL));
        assert_eq!(cum.get(2), Some(7.0 * DEKAD_TO_ANNUAL));
    }

    #[test]
    fn test_anomaly_is_missing_when_mean_is_zero() {
        let df_obs = df!(
            "admin0Name" => ["AAA"],
            long::YEAR => [2020i32],
            long::DEKAD => [1i32],
            long::DMP => [5.0],
        )
        .unwrap();
        let df_mean = df!(
            "admin0Name" => ["AAA"],
            long::DEKAD => [1i32],
            long::DMP_MEAN => [0.0],
            result::SEASON_INDEX => [0i32],
            result::BIOMASSE_MEAN => [0.0],
        )
        .unwrap();

        let out = accumulate_observations(df_obs, df_mean, &admin(), 1).unwrap();
        assert_eq!(out.height(), 1);
        assert_eq!(
            out.column(result::BIOMASSE_ANOMALY).unwrap().null_count(),
            1
        );
    }
}
