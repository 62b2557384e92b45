//! Bounded multi-attempt barcode resolution.

use crate::{BarcodeDecoder, BarcodeFormat, Binarization, BitMatrix, DecodeError, DecodeHints};
use formscan_core::GrayImageView;
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Decoder options shared by every attempt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BarcodeParams {
    /// Formats to look for; empty means all.
    pub possible_formats: Vec<BarcodeFormat>,
    /// Passed to the decoder on the relaxed attempts.
    pub try_harder: bool,
}

impl Default for BarcodeParams {
    fn default() -> Self {
        Self {
            possible_formats: Vec::new(),
            try_harder: true,
        }
    }
}

impl BarcodeParams {
    fn hints(&self, pure_barcode: bool) -> DecodeHints {
        DecodeHints {
            pure_barcode,
            try_harder: self.try_harder && !pure_barcode,
            possible_formats: self.possible_formats.clone(),
        }
    }
}

/// One step of the resolution plan.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Attempt {
    pub binarization: Binarization,
    /// Decode with pure-barcode hints.
    pub pure: bool,
}

/// Global histogram with pure hints, then relaxed hints, then hybrid.
pub const ATTEMPTS: [Attempt; 3] = [
    Attempt {
        binarization: Binarization::GlobalHistogram,
        pure: true,
    },
    Attempt {
        binarization: Binarization::GlobalHistogram,
        pure: false,
    },
    Attempt {
        binarization: Binarization::Hybrid,
        pure: false,
    },
];

/// Outcome of [`resolve_barcode`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BarcodeResolution {
    /// Decoded text, empty if every attempt failed.
    pub text: String,
    pub format: Option<BarcodeFormat>,
    /// 1-based index of the attempt that decoded, if any.
    pub attempt: Option<usize>,
}

impl BarcodeResolution {
    pub fn is_decoded(&self) -> bool {
        self.attempt.is_some()
    }
}

/// Run the [`ATTEMPTS`] plan against `decoder`, stopping at the first success.
///
/// Failures never propagate: when nothing decodes the resolution carries
/// empty text.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip_all, fields(width = crop.width, height = crop.height))
)]
pub fn resolve_barcode<D: BarcodeDecoder + ?Sized>(
    decoder: &D,
    crop: &GrayImageView<'_>,
    params: &BarcodeParams,
) -> BarcodeResolution {
    let global = Binarization::GlobalHistogram.apply(crop);
    let mut hybrid: Option<Result<BitMatrix, DecodeError>> = None;

    for (i, attempt) in ATTEMPTS.iter().enumerate() {
        let bits = match attempt.binarization {
            Binarization::GlobalHistogram => &global,
            Binarization::Hybrid => {
                &*hybrid.get_or_insert_with(|| Binarization::Hybrid.apply(crop))
            }
        };
        let hints = params.hints(attempt.pure);
        let result = match bits {
            Ok(bits) => decoder.decode(bits, &hints),
            Err(e) => Err(e.clone()),
        };

        match result {
            Ok(decoded) => {
                log::debug!(
                    "attempt {} decoded {:?} barcode ({:?})",
                    i + 1,
                    decoded.format,
                    attempt.binarization
                );
                return BarcodeResolution {
                    text: decoded.text,
                    format: Some(decoded.format),
                    attempt: Some(i + 1),
                };
            }
            Err(e) => {
                log::debug!("attempt {} ({:?}) failed: {e}", i + 1, attempt.binarization);
            }
        }
    }

    log::warn!("no barcode decoded after {} attempts", ATTEMPTS.len());
    BarcodeResolution::default()
}
