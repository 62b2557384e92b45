//! Luminance binarizers.
//!
//! Both follow the ZXing binarizers of the same name: a global histogram
//! black point for clean crops and a block-local threshold for unevenly lit
//! ones.

use crate::{BitMatrix, DecodeError};
use formscan_core::GrayImageView;
use serde::{Deserialize, Serialize};

const LUMINANCE_BITS: u32 = 5;
const LUMINANCE_SHIFT: u32 = 8 - LUMINANCE_BITS;
const LUMINANCE_BUCKETS: usize = 1 << LUMINANCE_BITS;

const BLOCK_SIZE_POWER: u32 = 3;
const BLOCK_SIZE: usize = 1 << BLOCK_SIZE_POWER;
/// Crops smaller than this in either dimension use the global histogram.
const MINIMUM_DIMENSION: usize = BLOCK_SIZE * 5;
const MIN_DYNAMIC_RANGE: u32 = 24;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Binarization {
    /// One black point for the whole crop, from a coarse luminance histogram.
    GlobalHistogram,
    /// Per-block thresholds averaged over a 5x5 block neighbourhood.
    Hybrid,
}

impl Binarization {
    pub fn apply(self, image: &GrayImageView<'_>) -> Result<BitMatrix, DecodeError> {
        match self {
            Binarization::GlobalHistogram => global_histogram(image),
            Binarization::Hybrid => hybrid(image),
        }
    }
}

#[inline]
fn luma(image: &GrayImageView<'_>, x: usize, y: usize) -> u8 {
    image.data[y * image.width + x]
}

fn global_histogram(image: &GrayImageView<'_>) -> Result<BitMatrix, DecodeError> {
    let (w, h) = (image.width, image.height);
    if w == 0 || h == 0 || image.data.len() < w * h {
        return Err(DecodeError::NotFound);
    }

    // sample four rows across the middle of the crop
    let mut buckets = [0u32; LUMINANCE_BUCKETS];
    for row in 1..5 {
        let y = (h * row / 5).min(h - 1);
        for x in (w / 5)..(w * 4 / 5).max(w / 5 + 1).min(w) {
            buckets[(luma(image, x, y) >> LUMINANCE_SHIFT) as usize] += 1;
        }
    }
    let black_point = estimate_black_point(&buckets)?;

    Ok(BitMatrix::from_fn(w, h, |x, y| {
        u32::from(luma(image, x, y)) < black_point
    }))
}

/// Valley between the two tallest, well separated histogram peaks.
fn estimate_black_point(buckets: &[u32; LUMINANCE_BUCKETS]) -> Result<u32, DecodeError> {
    let mut first_peak = 0;
    let mut first_peak_size = 0;
    let mut max_bucket_count = 0;
    for (x, &count) in buckets.iter().enumerate() {
        if count > first_peak_size {
            first_peak = x;
            first_peak_size = count;
        }
        max_bucket_count = max_bucket_count.max(count);
    }

    // second peak favours buckets far from the first one
    let mut second_peak = 0;
    let mut second_peak_score = 0u64;
    for (x, &count) in buckets.iter().enumerate() {
        let d = x.abs_diff(first_peak) as u64;
        let score = u64::from(count) * d * d;
        if score > second_peak_score {
            second_peak = x;
            second_peak_score = score;
        }
    }

    // a single populated bucket has no valley
    if second_peak_score == 0 {
        return Err(DecodeError::NotFound);
    }
    if first_peak > second_peak {
        std::mem::swap(&mut first_peak, &mut second_peak);
    }

    if second_peak - first_peak <= LUMINANCE_BUCKETS / 16 {
        return Err(DecodeError::NotFound);
    }

    let mut best_valley = second_peak - 1;
    let mut best_valley_score = -1i64;
    for x in (first_peak + 1..second_peak).rev() {
        let from_first = (x - first_peak) as i64;
        let score = from_first
            * from_first
            * (second_peak - x) as i64
            * i64::from(max_bucket_count - buckets[x]);
        if score > best_valley_score {
            best_valley = x;
            best_valley_score = score;
        }
    }

    Ok((best_valley as u32) << LUMINANCE_SHIFT)
}

fn hybrid(image: &GrayImageView<'_>) -> Result<BitMatrix, DecodeError> {
    let (w, h) = (image.width, image.height);
    if w < MINIMUM_DIMENSION || h < MINIMUM_DIMENSION {
        return global_histogram(image);
    }
    if image.data.len() < w * h {
        return Err(DecodeError::NotFound);
    }

    let sub_w = w.div_ceil(BLOCK_SIZE);
    let sub_h = h.div_ceil(BLOCK_SIZE);
    let black_points = block_black_points(image, sub_w, sub_h);

    let mut matrix = BitMatrix::new(w, h);
    for by in 0..sub_h {
        let y_offset = (by * BLOCK_SIZE).min(h - BLOCK_SIZE);
        let top = by.clamp(2, sub_h - 3);
        for bx in 0..sub_w {
            let x_offset = (bx * BLOCK_SIZE).min(w - BLOCK_SIZE);
            let left = bx.clamp(2, sub_w - 3);

            let mut sum = 0u32;
            for row in &black_points[top - 2..=top + 2] {
                sum += row[left - 2..=left + 2].iter().sum::<u32>();
            }
            let threshold = sum / 25;

            for y in y_offset..y_offset + BLOCK_SIZE {
                for x in x_offset..x_offset + BLOCK_SIZE {
                    if u32::from(luma(image, x, y)) <= threshold {
                        matrix.set(x, y, true);
                    }
                }
            }
        }
    }
    Ok(matrix)
}

/// Per-block black point; low-contrast blocks borrow from their neighbours.
fn block_black_points(image: &GrayImageView<'_>, sub_w: usize, sub_h: usize) -> Vec<Vec<u32>> {
    let (w, h) = (image.width, image.height);
    let mut points = vec![vec![0u32; sub_w]; sub_h];

    for by in 0..sub_h {
        let y_offset = (by * BLOCK_SIZE).min(h - BLOCK_SIZE);
        for bx in 0..sub_w {
            let x_offset = (bx * BLOCK_SIZE).min(w - BLOCK_SIZE);

            let mut sum = 0u32;
            let mut min = u32::MAX;
            let mut max = 0u32;
            for y in y_offset..y_offset + BLOCK_SIZE {
                for x in x_offset..x_offset + BLOCK_SIZE {
                    let v = u32::from(luma(image, x, y));
                    sum += v;
                    min = min.min(v);
                    max = max.max(v);
                }
            }

            let mut average = sum >> (2 * BLOCK_SIZE_POWER);
            if max - min <= MIN_DYNAMIC_RANGE {
                // flat block: assume background unless neighbours say otherwise
                average = min / 2;
                if by > 0 && bx > 0 {
                    let neighbours = (points[by - 1][bx]
                        + 2 * points[by][bx - 1]
                        + points[by - 1][bx - 1])
                        / 4;
                    if min < neighbours {
                        average = neighbours;
                    }
                }
            }
            points[by][bx] = average;
        }
    }
    points
}
