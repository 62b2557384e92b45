//! Barcode resolution for form areas.
//!
//! A cropped area is binarized and handed to a [`BarcodeDecoder`] up to
//! three times (see [`ATTEMPTS`]); the first successful decode wins and a
//! total failure degrades to empty text. Decoding itself is pluggable; the
//! `qr` feature provides [`QrDecoder`] backed by `rqrr`.

mod binarize;
mod bitmatrix;
mod decoder;
#[cfg(feature = "qr")]
mod qr;
mod resolver;

pub use binarize::Binarization;
pub use bitmatrix::BitMatrix;
pub use decoder::{BarcodeDecoder, BarcodeFormat, DecodeError, DecodeHints, DecodedBarcode};
#[cfg(feature = "qr")]
pub use qr::QrDecoder;
pub use resolver::{resolve_barcode, Attempt, BarcodeParams, BarcodeResolution, ATTEMPTS};
