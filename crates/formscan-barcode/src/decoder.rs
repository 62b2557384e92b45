//! Interface to the external barcode decoder.

use crate::BitMatrix;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BarcodeFormat {
    Codabar,
    Code39,
    Code93,
    Code128,
    DataMatrix,
    Ean8,
    Ean13,
    Itf,
    Pdf417,
    QrCode,
    UpcA,
    UpcE,
}

/// Options passed to the decoder with each bitmap.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodeHints {
    /// The bitmap holds a single clean barcode and nothing else.
    pub pure_barcode: bool,
    /// Spend more time looking for a barcode.
    pub try_harder: bool,
    /// Formats to look for; empty means all.
    pub possible_formats: Vec<BarcodeFormat>,
}

impl DecodeHints {
    pub fn accepts(&self, format: BarcodeFormat) -> bool {
        self.possible_formats.is_empty() || self.possible_formats.contains(&format)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedBarcode {
    pub text: String,
    pub format: BarcodeFormat,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("no barcode found")]
    NotFound,
    #[error("barcode checksum mismatch")]
    Checksum,
    #[error("malformed barcode: {0}")]
    Format(String),
}

/// Decodes a barcode from a binarized bitmap.
pub trait BarcodeDecoder {
    fn decode(&self, bitmap: &BitMatrix, hints: &DecodeHints)
        -> Result<DecodedBarcode, DecodeError>;
}

impl<D: BarcodeDecoder + ?Sized> BarcodeDecoder for &D {
    fn decode(
        &self,
        bitmap: &BitMatrix,
        hints: &DecodeHints,
    ) -> Result<DecodedBarcode, DecodeError> {
        (**self).decode(bitmap, hints)
    }
}

impl<D: BarcodeDecoder + ?Sized> BarcodeDecoder for Box<D> {
    fn decode(
        &self,
        bitmap: &BitMatrix,
        hints: &DecodeHints,
    ) -> Result<DecodedBarcode, DecodeError> {
        (**self).decode(bitmap, hints)
    }
}
