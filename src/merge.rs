//! Concatenates monthly files into one time-ordered series.
//!
//! The merge itself is done by the external `cdo` and `nco` tools, which
//! must be on the PATH. Invocations use explicit argument lists, never a
//! shell string.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::Era5Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// One `cdo mergetime` pass over plain time-series files.
    Simple,
    /// For ensemble files carrying an extra member dimension that
    /// `mergetime` cannot handle: the time dimension of the first file is
    /// made the record dimension, then the files are concatenated along
    /// it with `ncrcat`.
    FiveDimensional,
}

/// Merges every `<prefix>*` file in `dir` into `<prefix>.nc`.
pub fn merge(dir: &Path, prefix: &str, strategy: Strategy) -> Result<(), Era5Error> {
    let inputs = monthly_files(dir, prefix)?;
    let output = dir.join(format!("{prefix}.nc"));

    match strategy {
        Strategy::Simple => merge_by_time(&inputs, &output),
        Strategy::FiveDimensional => merge_record_dim(&inputs, &output),
    }
}

// Files matching `<prefix>*` in `dir`, lexicographically sorted. The
// merge output itself is excluded so a re-run does not fold it back in.
fn monthly_files(dir: &Path, prefix: &str) -> Result<Vec<PathBuf>, Era5Error> {
    let output_name = format!("{prefix}.nc");
    let mut files = Vec::new();

    let entries = fs::read_dir(dir)
        .map_err(|e| Era5Error::Merge(format!("cannot read {}: {e}", dir.display())))?;
    for entry in entries {
        let entry = entry.map_err(|e| Era5Error::Merge(e.to_string()))?;
        let path = entry.path();
        let name = entry.file_name();
        let name = name.to_string_lossy();

        if path.is_file() && name.starts_with(prefix) && name != output_name {
            files.push(path);
        }
    }
    files.sort();

    if files.is_empty() {
        return Err(Era5Error::Merge(format!(
            "no files matching `{prefix}*` in {}",
            dir.display()
        )));
    }

    Ok(files)
}

// 64-bit floats, classic container format.
fn merge_by_time(inputs: &[PathBuf], output: &Path) -> Result<(), Era5Error> {
    let mut command = Command::new("cdo");
    command
        .args(["-b", "F64", "-f", "nc2", "mergetime"])
        .args(inputs)
        .arg(output);

    run_tool(command)
}

fn merge_record_dim(inputs: &[PathBuf], output: &Path) -> Result<(), Era5Error> {
    let first = &inputs[0];
    let mut command = Command::new("ncks");
    command
        .args(["-O", "--mk_rec_dmn", "time"])
        .arg(first)
        .arg(first);
    run_tool(command)?;

    let mut command = Command::new("ncrcat");
    command.arg("-O").args(inputs).arg(output);

    run_tool(command)
}

fn run_tool(mut command: Command) -> Result<(), Era5Error> {
    let tool = command.get_program().to_string_lossy().to_string();
    tracing::info!(tool = %tool, args = ?command.get_args().collect::<Vec<_>>(), "merging");

    let status = command
        .status()
        .map_err(|e| Era5Error::Merge(format!("failed to run {tool}: {e}")))?;
    if !status.success() {
        return Err(Era5Error::Merge(format!("{tool} exited with {status}")));
    }

    Ok(())
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::fs::File;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn should_list_matching_files_sorted() {
        let dir = TempDir::new().unwrap();
        for name in ["SURF_202002.nc", "SURF_202001.nc", "PLEV_202001.nc"] {
            File::create(dir.path().join(name)).unwrap();
        }

        let files = monthly_files(dir.path(), "SURF").unwrap();

        assert_eq!(
            files,
            vec![
                dir.path().join("SURF_202001.nc"),
                dir.path().join("SURF_202002.nc")
            ]
        );
    }

    #[test]
    fn should_exclude_the_merge_output_from_inputs() {
        let dir = TempDir::new().unwrap();
        for name in ["SURF_202001.nc", "SURF.nc"] {
            File::create(dir.path().join(name)).unwrap();
        }

        let files = monthly_files(dir.path(), "SURF").unwrap();

        assert_eq!(files, vec![dir.path().join("SURF_202001.nc")]);
    }

    #[test]
    fn should_fail_when_no_files_match() {
        let dir = TempDir::new().unwrap();
        File::create(dir.path().join("PLEV_202001.nc")).unwrap();

        assert!(matches!(
            monthly_files(dir.path(), "SURF"),
            Err(Era5Error::Merge(_))
        ));
    }

    #[test]
    fn should_fail_merge_before_spawning_on_an_empty_directory() {
        let dir = TempDir::new().unwrap();

        let simple = merge(dir.path(), "SURF", Strategy::Simple);
        let five_dim = merge(dir.path(), "PLEV", Strategy::FiveDimensional);

        assert!(matches!(simple, Err(Era5Error::Merge(_))));
        assert!(matches!(five_dim, Err(Era5Error::Merge(_))));
    }
}
