//! Adapters from the `image` crate.

use formscan_core::{GrayImage, GrayImageView};

/// Borrow an `image::GrayImage` as a [`GrayImageView`].
pub fn gray_view(img: &::image::GrayImage) -> GrayImageView<'_> {
    GrayImageView {
        width: img.width() as usize,
        height: img.height() as usize,
        data: img.as_raw(),
    }
}

/// Single-channel copy of a decoded scan holding the lowest-order channel.
///
/// Gray images are copied as is; color images keep their blue channel, the
/// low byte of a packed ARGB pixel. Fill thresholds are compared against this
/// value, so red ink reads as dark.
pub fn lowest_channel(img: &::image::DynamicImage) -> GrayImage {
    let (width, height) = (img.width() as usize, img.height() as usize);
    let data = match img {
        ::image::DynamicImage::ImageLuma8(gray) => gray.as_raw().clone(),
        other => other.to_rgba8().pixels().map(|p| p.0[2]).collect(),
    };
    GrayImage {
        width,
        height,
        data,
    }
}
