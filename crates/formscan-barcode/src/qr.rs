//! QR code backend built on `rqrr`.

use crate::{BarcodeDecoder, BarcodeFormat, BitMatrix, DecodeError, DecodeHints, DecodedBarcode};
use rqrr::PreparedImage;

/// Decodes QR codes from binarized crops.
///
/// Only the first detected grid is tried unless `try_harder` is set.
#[derive(Clone, Copy, Debug, Default)]
pub struct QrDecoder;

impl BarcodeDecoder for QrDecoder {
    fn decode(
        &self,
        bitmap: &BitMatrix,
        hints: &DecodeHints,
    ) -> Result<DecodedBarcode, DecodeError> {
        if !hints.accepts(BarcodeFormat::QrCode) {
            return Err(DecodeError::NotFound);
        }

        let mut img =
            PreparedImage::prepare_from_bitmap(bitmap.width(), bitmap.height(), |x, y| {
                bitmap.get(x, y)
            });
        let grids = img.detect_grids();
        let limit = if hints.try_harder { grids.len() } else { 1 };

        let mut last_err = DecodeError::NotFound;
        for grid in grids.iter().take(limit) {
            match grid.decode() {
                Ok((_, text)) => {
                    return Ok(DecodedBarcode {
                        text,
                        format: BarcodeFormat::QrCode,
                    })
                }
                Err(e) => last_err = DecodeError::Format(format!("{e:?}")),
            }
        }
        Err(last_err)
    }
}
