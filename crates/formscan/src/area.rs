//! Locating template areas in a scan.

use formscan_align::PointTransformer;
use formscan_core::{Corners, HomographyError, ImageError, TemplateArea};

/// Largest pixel coordinate or extent a crop may have; f64 is exact below it.
const MAX_EXTENT: f64 = 9_007_199_254_740_992.0;

/// Axis-aligned pixel rectangle in scan space.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CropRect {
    pub x: i64,
    pub y: i64,
    pub width: usize,
    pub height: usize,
}

/// Map all four corners of `area` into scan space.
pub fn locate_area(
    transformer: &PointTransformer,
    area: &TemplateArea,
) -> Result<Corners, HomographyError> {
    area.corners.try_map(|p| transformer.transform(p))
}

/// Bounding box of the mapped corners, truncated to whole pixels.
///
/// This assumes the scan is only mildly rotated; a strongly skewed area
/// gets a crop larger than the quadrilateral itself. Extents that cannot be
/// pixel coordinates (beyond 2^53, or NaN) are [`ImageError::OutOfBounds`].
pub fn crop_rect(corners: &Corners) -> Result<CropRect, ImageError> {
    let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
    let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
    for (_, p) in corners.iter() {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }

    let x = min_x.floor();
    let y = min_y.floor();
    let width = (max_x.floor() - x).max(0.0);
    let height = (max_y.floor() - y).max(0.0);

    let representable = |v: f64| v.abs() <= MAX_EXTENT;
    if !(representable(x) && representable(y) && representable(width) && representable(height))
    {
        // saturating casts, for the error report only
        return Err(ImageError::OutOfBounds {
            x: x as i64,
            y: y as i64,
            width: width as usize,
            height: height as usize,
            image_width: 0,
            image_height: 0,
        });
    }

    Ok(CropRect {
        x: x as i64,
        y: y as i64,
        width: width as usize,
        height: height as usize,
    })
}
