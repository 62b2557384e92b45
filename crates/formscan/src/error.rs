use crate::ConfigError;
use formscan_align::AlignError;
use formscan_core::{HomographyError, ImageError};

/// Errors produced while scanning a form image.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    #[error(transparent)]
    Align(#[from] AlignError),

    #[error(transparent)]
    Homography(#[from] HomographyError),

    #[error(transparent)]
    Image(#[from] ImageError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
