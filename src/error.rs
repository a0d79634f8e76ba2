//! Error kinds surfaced to the operator.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Era5Error {
    /// Invalid input, caught before any network activity.
    #[error("{0}")]
    Configuration(String),

    #[error("download declined: the monthly files listed above are missing\nadjust the project date range or supply the files, then re-run")]
    Declined,

    #[error("{failed} of {total} retrieval(s) failed")]
    Retrieval { failed: usize, total: usize },

    #[error("merge failed: {0}")]
    Merge(String),
}
