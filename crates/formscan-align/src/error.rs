use crate::SessionState;
use formscan_core::HomographyError;

/// Errors returned while aligning a scan to its template.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum AlignError {
    #[error("not enough correspondences (found {found}, need {required})")]
    InsufficientCorrespondences { found: usize, required: usize },
    #[error("`{operation}` called in state {state:?}")]
    InvalidState {
        operation: &'static str,
        state: SessionState,
    },
    #[error("correspondence ({src}, {dst}) points outside the feature sets")]
    CorrespondenceOutOfRange { src: usize, dst: usize },
    #[error(transparent)]
    Homography(#[from] HomographyError),
}
