//! Filled-mark detection at scan-space points.

use crate::{ConfigError, FillParams};
use formscan_core::{ImageError, ImageSource};
use nalgebra::Point2;

/// Decides whether a mark is filled by the share of dark pixels around it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FillDetector {
    params: FillParams,
}

impl FillDetector {
    pub fn new(params: FillParams) -> Result<Self, ConfigError> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &FillParams {
        &self.params
    }

    /// Sample a `size x size` window centred on the rounded point.
    ///
    /// A pixel is dark when it is below `threshold`; the mark is filled when
    /// `dark / size^2 >= density / 100`. A window reaching outside the image
    /// is an [`ImageError::OutOfBounds`].
    pub fn is_filled<I: ImageSource + ?Sized>(
        &self,
        image: &I,
        p: Point2<f64>,
    ) -> Result<bool, ImageError> {
        let size = self.params.size;
        let half = (size / 2) as i64;
        let origin = |v: f64| to_pixel(v).and_then(|c| c.checked_sub(half));
        let (x0, y0) = match (origin(p.x), origin(p.y)) {
            (Some(x), Some(y)) => (x, y),
            _ => (i64::MIN, i64::MIN),
        };

        let block = image.pixel_block(x0, y0, size, size)?;
        let dark = block
            .iter()
            .filter(|&&v| v < self.params.threshold)
            .count();

        Ok(dark * 100 >= usize::from(self.params.density) * block.len())
    }
}

/// Rounded pixel coordinate, `None` for non-finite or huge values.
fn to_pixel(v: f64) -> Option<i64> {
    let r = v.round();
    (r.is_finite() && r.abs() < i64::MAX as f64 / 2.0).then_some(r as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use formscan_core::GrayImage;

    fn detector(size: usize, threshold: u8, density: u8) -> FillDetector {
        FillDetector::new(FillParams {
            size,
            threshold,
            density,
        })
        .unwrap()
    }

    #[test]
    fn black_window_is_filled() {
        let img = GrayImage::filled(20, 20, 0);
        let d = detector(5, 128, 50);
        assert!(d.is_filled(&img, Point2::new(10.0, 10.0)).unwrap());
    }

    #[test]
    fn white_window_is_empty() {
        let img = GrayImage::filled(20, 20, 255);
        let d = detector(5, 128, 50);
        assert!(!d.is_filled(&img, Point2::new(10.0, 10.0)).unwrap());
    }

    #[test]
    fn exactly_half_dark_meets_density() {
        // left half of a 4x4 window dark
        let mut img = GrayImage::filled(10, 10, 255);
        for y in 0..10 {
            for x in 0..5 {
                img.put(x, y, 0);
            }
        }
        // window x in 3..7 → columns 3,4 dark, 5,6 white
        let d = detector(4, 128, 50);
        assert!(d.is_filled(&img, Point2::new(5.0, 5.0)).unwrap());
        let strict = detector(4, 128, 51);
        assert!(!strict.is_filled(&img, Point2::new(5.0, 5.0)).unwrap());
    }

    #[test]
    fn point_is_rounded_to_the_nearest_pixel() {
        let mut img = GrayImage::filled(10, 10, 255);
        img.put(6, 6, 0);
        let d = detector(1, 128, 100);
        assert!(d.is_filled(&img, Point2::new(5.6, 6.4)).unwrap());
        assert!(!d.is_filled(&img, Point2::new(5.4, 6.4)).unwrap());
    }

    #[test]
    fn threshold_is_exclusive() {
        let img = GrayImage::filled(8, 8, 128);
        assert!(!detector(3, 128, 1).is_filled(&img, Point2::new(4.0, 4.0)).unwrap());
        assert!(detector(3, 129, 100).is_filled(&img, Point2::new(4.0, 4.0)).unwrap());
    }

    #[test]
    fn window_outside_the_image_fails() {
        let img = GrayImage::filled(10, 10, 0);
        let d = detector(5, 128, 50);
        assert!(matches!(
            d.is_filled(&img, Point2::new(1.0, 5.0)),
            Err(ImageError::OutOfBounds { .. })
        ));
        assert!(d.is_filled(&img, Point2::new(8.0, 8.0)).is_err());
        assert!(d.is_filled(&img, Point2::new(f64::NAN, 5.0)).is_err());
        assert!(d.is_filled(&img, Point2::new(2.0, 2.0)).is_ok());
    }

    #[test]
    fn zero_window_is_rejected() {
        assert!(FillDetector::new(FillParams {
            size: 0,
            ..FillParams::default()
        })
        .is_err());
    }

    #[test]
    fn oversized_window_is_rejected() {
        for size in [crate::MAX_FILL_SIZE + 1, usize::MAX] {
            assert!(matches!(
                FillDetector::new(FillParams {
                    size,
                    ..FillParams::default()
                }),
                Err(ConfigError::InvalidParams {
                    field: "fill.size",
                    ..
                })
            ));
        }
    }

    #[test]
    fn widest_window_far_from_origin_is_out_of_bounds() {
        let img = GrayImage::filled(20, 20, 0);
        let d = detector(crate::MAX_FILL_SIZE, 128, 50);
        for p in [Point2::new(-4.0e18, 10.0), Point2::new(10.0, 4.0e18)] {
            assert!(matches!(
                d.is_filled(&img, p),
                Err(ImageError::OutOfBounds { .. })
            ));
        }
    }
}
