//! High-level facade crate for the `formscan-*` workspace.
//!
//! This crate provides:
//! - re-exports of the underlying crates (`core`, `align`, `barcode`)
//! - mark detection, area location and answer aggregation on aligned scans
//! - [`FormScanner`], which runs the whole per-image pipeline and batches
//!
//! ## Quickstart
//!
//! ```ignore
//! use formscan::{FormScanner, ScanConfig};
//!
//! let config = ScanConfig::from_json_str(&std::fs::read_to_string("scan.json")?)?;
//! let mut scanner = FormScanner::new(
//!     extractor,
//!     associator,
//!     decoder,
//!     template,
//!     &template_image.view(),
//!     config,
//! )?;
//! let form = scanner.scan("sheet-001", &scan.view())?;
//! for (group, filled) in &form.groups {
//!     println!("{group}: {} answers", filled.questions.len());
//! }
//! ```
//!
//! Feature extraction and descriptor association are always supplied by the
//! caller; the `qr` feature adds an `rqrr`-backed [`barcode::QrDecoder`].
//!
//! ## API map
//! - `formscan::core`: homography, gray images, form template and result types.
//! - `formscan::align`: correspondence ranking and the alignment session.
//! - `formscan::barcode`: binarizers and the bounded barcode resolver.
//! - `formscan::image` (feature `image`): adapters from the `image` crate.

pub use formscan_align as align;
pub use formscan_barcode as barcode;
pub use formscan_core as core;

pub use formscan_align::{AlignError, AlignmentSession, PointTransformer};
pub use formscan_core::{
    FilledForm, FormGroup, FormTemplate, GrayImage, GrayImageView, QuestionResponse,
    TemplateArea, TemplateQuestion,
};

mod aggregate;
mod area;
mod config;
mod error;
mod fill;
mod scanner;

#[cfg(feature = "image")]
pub mod image;

pub use aggregate::ResponseAggregator;
pub use area::{crop_rect, locate_area, CropRect};
pub use config::{ConfigError, FillParams, ScanConfig, MAX_FILL_SIZE};
pub use error::ScanError;
pub use fill::FillDetector;
pub use scanner::{BatchReport, FormScanner};

/// Route `log` records into `tracing` and install the core subscriber.
#[cfg(feature = "tracing")]
pub fn init_tracing_with_log(json: bool) {
    let _ = tracing_log::LogTracer::init();
    formscan_core::init_tracing(json);
}
