//! Month-partitioned request planning.
//!
//! The archive serves requests most efficiently when they are subset by
//! time, so a date range is split into one request per calendar month,
//! each with a deterministic target file name.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use clap::ValueEnum;

use crate::error::Era5Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "snake_case")]
pub enum Product {
    /// High-resolution deterministic run (HRES)
    Reanalysis,
    /// Ensemble data assimilation members (EDA)
    EnsembleMembers,
}

impl Product {
    pub fn as_str(&self) -> &'static str {
        match self {
            Product::Reanalysis => "reanalysis",
            Product::EnsembleMembers => "ensemble_members",
        }
    }
}

/// Whether a retrieval targets the single-level or pressure-level archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelKind {
    Surface,
    Pressure,
}

impl LevelKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            LevelKind::Surface => "SURF",
            LevelKind::Pressure => "PLEV",
        }
    }

    // The archive keeps years before 1979 in separate back-extension
    // datasets.
    fn dataset(&self, year: i32) -> String {
        let base = match self {
            LevelKind::Surface => "reanalysis-era5-single-levels",
            LevelKind::Pressure => "reanalysis-era5-pressure-levels",
        };
        if year >= 1979 {
            base.to_string()
        } else {
            format!("{base}-preliminary-back-extension")
        }
    }
}

impl FromStr for LevelKind {
    type Err = Era5Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "surf" => Ok(LevelKind::Surface),
            "plev" => Ok(LevelKind::Pressure),
            other => Err(Era5Error::Configuration(format!(
                "level kind can only be `surf` or `plev`, got `{other}`"
            ))),
        }
    }
}

/// Forcing time step in hours. Only 1, 3 and 6 are valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeStep(u8);

impl TimeStep {
    pub fn new(hours: u8) -> Result<Self, Era5Error> {
        match hours {
            1 | 3 | 6 => Ok(TimeStep(hours)),
            other => Err(Era5Error::Configuration(format!(
                "time step can only be 1, 3 or 6 hours, got {other}"
            ))),
        }
    }

    /// Times of day requested for each month.
    pub fn times(&self) -> &'static [&'static str] {
        const HOURLY: [&str; 24] = [
            "00:00", "01:00", "02:00", "03:00", "04:00", "05:00", "06:00", "07:00", "08:00",
            "09:00", "10:00", "11:00", "12:00", "13:00", "14:00", "15:00", "16:00", "17:00",
            "18:00", "19:00", "20:00", "21:00", "22:00", "23:00",
        ];
        const THREE_HOURLY: [&str; 8] = [
            "00:00", "03:00", "06:00", "09:00", "12:00", "15:00", "18:00", "21:00",
        ];

        match self.0 {
            1 => &HOURLY,
            _ => &THREE_HOURLY,
        }
    }
}

/// Spatial subset of the archive, in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl BoundingBox {
    /// The archive's `area` parameter ordering.
    pub fn area(&self) -> [f64; 4] {
        [self.north, self.west, self.south, self.east]
    }
}

/// One month of one archive dataset, with the file it lands in.
#[derive(Debug, Clone)]
pub struct MonthlyRequest {
    pub year: i32,
    pub month: u32,
    pub dataset: String,
    pub bbox: BoundingBox,
    pub time_steps: &'static [&'static str],
    pub product: Product,
    pub target: PathBuf,
    pub kind: LevelKind,
    pub levels: Option<Vec<u32>>,
}

impl MonthlyRequest {
    pub fn file_name(&self) -> String {
        format!("{}_{:04}{:02}.nc", self.kind.prefix(), self.year, self.month)
    }
}

/// Builds the chronological per-month request list for a date range.
///
/// A month is included when its last day falls inside the inclusive
/// range; the day of month of `start` and `end` has no other effect.
#[allow(clippy::too_many_arguments)]
pub fn build_plan(
    start: NaiveDate,
    end: NaiveDate,
    dir: &Path,
    bbox: BoundingBox,
    step: TimeStep,
    product: Product,
    kind: LevelKind,
    levels: Option<Vec<u32>>,
) -> Result<Vec<MonthlyRequest>, Era5Error> {
    match kind {
        LevelKind::Pressure => {
            if levels.as_ref().map_or(true, |l| l.is_empty()) {
                return Err(Era5Error::Configuration(
                    "pressure-level retrieval requires at least one pressure level".into(),
                ));
            }
        }
        LevelKind::Surface => {
            if levels.is_some() {
                return Err(Era5Error::Configuration(
                    "surface retrieval does not take pressure levels".into(),
                ));
            }
        }
    }

    let plan = month_ends(start, end)
        .into_iter()
        .map(|date| {
            let (year, month) = (date.year(), date.month());

            MonthlyRequest {
                year,
                month,
                dataset: kind.dataset(year),
                bbox,
                time_steps: step.times(),
                product,
                target: dir.join(format!("{}_{:04}{:02}.nc", kind.prefix(), year, month)),
                kind,
                levels: levels.clone(),
            }
        })
        .collect();

    Ok(plan)
}

// Month-end dates falling inside the inclusive range.
fn month_ends(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let mut ends = Vec::new();
    let mut cursor = last_day_of_month(start.year(), start.month());

    while cursor <= end {
        ends.push(cursor);
        let (year, month) = next_month(cursor.year(), cursor.month());
        cursor = last_day_of_month(year, month);
    }

    ends
}

fn last_day_of_month(year: i32, month: u32) -> NaiveDate {
    let (next_year, next_month) = next_month(year, month);

    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .unwrap()
        .pred_opt()
        .unwrap()
}

fn next_month(year: i32, month: u32) -> (i32, u32) {
    if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    }
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn bbox() -> BoundingBox {
        BoundingBox {
            north: 62.0,
            south: 60.0,
            east: 11.0,
            west: 9.0,
        }
    }

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn should_plan_one_request_per_month() {
        let plan = build_plan(
            date(2020, 1, 1),
            date(2020, 3, 31),
            Path::new("/data/era5"),
            bbox(),
            TimeStep::new(6).unwrap(),
            Product::Reanalysis,
            LevelKind::Surface,
            None,
        )
        .unwrap();

        assert_eq!(plan.len(), 3);
        assert_eq!((plan[0].year, plan[0].month), (2020, 1));
        assert_eq!((plan[1].year, plan[1].month), (2020, 2));
        assert_eq!((plan[2].year, plan[2].month), (2020, 3));

        for request in &plan {
            assert_eq!(request.time_steps.len(), 8);
        }
    }

    #[test]
    fn should_skip_months_whose_end_is_outside_the_range() {
        let ends = month_ends(date(2020, 1, 15), date(2020, 3, 15));

        assert_eq!(ends, vec![date(2020, 1, 31), date(2020, 2, 29)]);
    }

    #[test]
    fn should_span_a_year_boundary() {
        let ends = month_ends(date(2019, 11, 1), date(2020, 2, 29));

        assert_eq!(
            ends,
            vec![
                date(2019, 11, 30),
                date(2019, 12, 31),
                date(2020, 1, 31),
                date(2020, 2, 29)
            ]
        );
    }

    #[test]
    fn should_name_targets_deterministically_without_duplicates() {
        let plan = build_plan(
            date(2019, 11, 1),
            date(2020, 2, 29),
            Path::new("/data/era5"),
            bbox(),
            TimeStep::new(1).unwrap(),
            Product::Reanalysis,
            LevelKind::Pressure,
            Some(vec![500, 700, 850]),
        )
        .unwrap();

        let targets: HashSet<_> = plan.iter().map(|r| r.target.clone()).collect();
        assert_eq!(targets.len(), plan.len());
        assert_eq!(plan[0].target, Path::new("/data/era5/PLEV_201911.nc"));
        assert_eq!(plan[3].target, Path::new("/data/era5/PLEV_202002.nc"));
    }

    #[test]
    fn should_attach_levels_to_every_pressure_request() {
        let plan = build_plan(
            date(2020, 1, 1),
            date(2020, 3, 31),
            Path::new("/data/era5"),
            bbox(),
            TimeStep::new(3).unwrap(),
            Product::Reanalysis,
            LevelKind::Pressure,
            Some(vec![500, 700]),
        )
        .unwrap();

        for request in &plan {
            assert_eq!(request.levels.as_deref(), Some([500, 700].as_slice()));
        }
    }

    #[test]
    fn should_reject_pressure_plan_without_levels() {
        let result = build_plan(
            date(2020, 1, 1),
            date(2020, 3, 31),
            Path::new("/data/era5"),
            bbox(),
            TimeStep::new(6).unwrap(),
            Product::Reanalysis,
            LevelKind::Pressure,
            None,
        );

        assert!(matches!(result, Err(Era5Error::Configuration(_))));
    }

    #[test]
    fn should_reject_surface_plan_with_levels() {
        let result = build_plan(
            date(2020, 1, 1),
            date(2020, 3, 31),
            Path::new("/data/era5"),
            bbox(),
            TimeStep::new(6).unwrap(),
            Product::Reanalysis,
            LevelKind::Surface,
            Some(vec![500]),
        );

        assert!(matches!(result, Err(Era5Error::Configuration(_))));
    }

    #[test]
    fn should_reject_unknown_level_kind() {
        assert!(matches!(
            "pressure".parse::<LevelKind>(),
            Err(Era5Error::Configuration(_))
        ));
        assert!(matches!(LevelKind::from_str("surf"), Ok(LevelKind::Surface)));
        assert!(matches!(LevelKind::from_str("plev"), Ok(LevelKind::Pressure)));
    }

    #[test]
    fn should_reject_unknown_time_step() {
        assert!(matches!(TimeStep::new(2), Err(Era5Error::Configuration(_))));
        assert!(matches!(TimeStep::new(12), Err(Era5Error::Configuration(_))));
    }

    #[test]
    fn should_enumerate_times_for_each_step() {
        assert_eq!(TimeStep::new(1).unwrap().times().len(), 24);
        assert_eq!(TimeStep::new(3).unwrap().times().len(), 8);
        assert_eq!(TimeStep::new(6).unwrap().times().len(), 8);
        assert_eq!(TimeStep::new(6).unwrap().times()[1], "03:00");
    }

    #[test]
    fn should_use_back_extension_dataset_before_1979() {
        let plan = build_plan(
            date(1978, 11, 1),
            date(1979, 2, 28),
            Path::new("/data/era5"),
            bbox(),
            TimeStep::new(6).unwrap(),
            Product::Reanalysis,
            LevelKind::Surface,
            None,
        )
        .unwrap();

        assert_eq!(
            plan[0].dataset,
            "reanalysis-era5-single-levels-preliminary-back-extension"
        );
        assert_eq!(plan[3].dataset, "reanalysis-era5-single-levels");
    }

    #[test]
    fn should_order_area_north_west_south_east() {
        assert_eq!(bbox().area(), [62.0, 9.0, 60.0, 11.0]);
    }
}
