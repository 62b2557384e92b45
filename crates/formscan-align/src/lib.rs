//! Alignment of scanned forms to their template.
//!
//! Feature extraction and descriptor association are supplied by the caller
//! through [`FeatureExtractor`] and [`DescriptorAssociator`]. This crate
//! ranks the raw correspondences, keeps the four best, estimates the
//! template-to-scan homography from them and exposes it as a
//! [`PointTransformer`].
//!
//! ```ignore
//! let mut session = AlignmentSession::new(extractor, associator);
//! session.describe_template(&template.view())?;
//! for scan in scans {
//!     session.describe_scan(&scan.view())?;
//!     let t = session.align()?;
//!     let p = t.transform(Point2::new(120.0, 340.0))?;
//! }
//! ```

mod error;
mod features;
mod rank;
mod session;
mod transform;

pub use error::AlignError;
pub use features::{Correspondence, DescriptorAssociator, Feature, FeatureExtractor, FeatureSet};
pub use rank::{best_correspondences, sort_by_fit_score, BEST_MATCH_COUNT, INSERTION_SORT_MAX};
pub use session::{AlignmentSession, SessionState};
pub use transform::PointTransformer;
