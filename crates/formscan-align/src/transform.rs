use formscan_core::{homography_from_4pt, Homography, HomographyError};
use nalgebra::Point2;

/// Maps template-space points into scan space through a fixed homography.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointTransformer {
    homography: Homography,
}

impl PointTransformer {
    pub fn new(homography: Homography) -> Self {
        Self { homography }
    }

    /// Estimate the transform from four template/scan point pairs.
    pub fn from_pairs(
        template_pts: &[Point2<f64>; 4],
        scan_pts: &[Point2<f64>; 4],
    ) -> Result<Self, HomographyError> {
        homography_from_4pt(template_pts, scan_pts).map(Self::new)
    }

    #[inline]
    pub fn homography(&self) -> &Homography {
        &self.homography
    }

    #[inline]
    pub fn transform(&self, p: Point2<f64>) -> Result<Point2<f64>, HomographyError> {
        self.homography.apply(p)
    }
}
