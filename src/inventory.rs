//! Partitions a plan by which monthly files are already on disk.
//!
//! File presence is the only completeness signal: a partially-written
//! file counts as satisfied and is never re-fetched.

use crate::plan::{LevelKind, MonthlyRequest};

/// Splits a plan into (satisfied, pending), preserving order.
pub fn partition_existing(
    plan: Vec<MonthlyRequest>,
) -> (Vec<MonthlyRequest>, Vec<MonthlyRequest>) {
    plan.into_iter().partition(|request| request.target.is_file())
}

/// Reports both partitions: basenames on the console, full paths to the log.
pub fn report(kind: LevelKind, satisfied: &[MonthlyRequest], pending: &[MonthlyRequest]) {
    if !satisfied.is_empty() {
        println!("{} data found on disk:", kind.prefix());
        for request in satisfied {
            println!("  {}", request.file_name());
        }
    }
    if !pending.is_empty() {
        println!("{} data to fetch:", kind.prefix());
        for request in pending {
            println!("  {}", request.file_name());
        }
    }

    for request in satisfied {
        tracing::info!(status = "satisfied", path = %request.target.display());
    }
    for request in pending {
        tracing::info!(status = "pending", path = %request.target.display());
    }
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::fs::File;

    use chrono::NaiveDate;
    use tempfile::TempDir;

    use crate::plan::{build_plan, BoundingBox, Product, TimeStep};

    use super::*;

    fn plan_in(dir: &std::path::Path) -> Vec<MonthlyRequest> {
        build_plan(
            NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2020, 3, 31).unwrap(),
            dir,
            BoundingBox {
                north: 62.0,
                south: 60.0,
                east: 11.0,
                west: 9.0,
            },
            TimeStep::new(6).unwrap(),
            Product::Reanalysis,
            LevelKind::Surface,
            None,
        )
        .unwrap()
    }

    #[test]
    fn should_partition_by_file_presence() {
        let dir = TempDir::new().unwrap();
        File::create(dir.path().join("SURF_202001.nc")).unwrap();

        let (satisfied, pending) = partition_existing(plan_in(dir.path()));

        assert_eq!(satisfied.len(), 1);
        assert_eq!(satisfied[0].file_name(), "SURF_202001.nc");
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].file_name(), "SURF_202002.nc");
        assert_eq!(pending[1].file_name(), "SURF_202003.nc");
    }

    #[test]
    fn should_treat_all_as_pending_in_an_empty_directory() {
        let dir = TempDir::new().unwrap();

        let (satisfied, pending) = partition_existing(plan_in(dir.path()));

        assert!(satisfied.is_empty());
        assert_eq!(pending.len(), 3);
    }

    #[test]
    fn should_partition_identically_when_run_twice() {
        let dir = TempDir::new().unwrap();
        File::create(dir.path().join("SURF_202002.nc")).unwrap();

        let (first_satisfied, first_pending) = partition_existing(plan_in(dir.path()));
        let (second_satisfied, second_pending) = partition_existing(plan_in(dir.path()));

        let names = |requests: &[MonthlyRequest]| {
            requests.iter().map(|r| r.file_name()).collect::<Vec<_>>()
        };
        assert_eq!(names(&first_satisfied), names(&second_satisfied));
        assert_eq!(names(&first_pending), names(&second_pending));
    }

    #[test]
    fn should_ignore_directories_at_target_paths() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("SURF_202001.nc")).unwrap();

        let (satisfied, pending) = partition_existing(plan_in(dir.path()));

        assert!(satisfied.is_empty());
        assert_eq!(pending.len(), 3);
    }
}
