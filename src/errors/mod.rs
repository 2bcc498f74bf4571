use std::path::PathBuf;

use thiserror::Error;

use crate::domain::ItemId;

/// The panel source table could not be read or is structurally malformed.
///
/// Raised only at load time; the engine never constructs a partially
/// loaded panel. Individual unresolved cell values are not errors.
#[derive(Debug, Error)]
pub enum DataLoadError {
    #[error("failed to read panel data from {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse panel data table")]
    Malformed(#[from] csv::Error),
    #[error("panel data has no preference columns")]
    NoPreferenceColumns,
    #[error("panel data contains no respondent rows")]
    NoRespondents,
}

/// The panel cannot support a prediction: nobody in the comparison pool
/// has rated the target item, so there is nothing to aggregate.
#[derive(Debug, Clone, Error)]
pub enum InsufficientDataError {
    #[error("no panel respondent has rated item {0}")]
    EmptyCandidatePool(ItemId),
    #[error("no neighbor ratings available for item {0}")]
    NoNeighborRatings(ItemId),
}
