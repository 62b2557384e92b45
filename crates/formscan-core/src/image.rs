/// Errors raised by pixel access outside the image.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageError {
    #[error(
        "block at ({x}, {y}) of size {width}x{height} exceeds image bounds {image_width}x{image_height}"
    )]
    OutOfBounds {
        x: i64,
        y: i64,
        width: usize,
        height: usize,
        image_width: usize,
        image_height: usize,
    },
}

#[derive(Clone, Copy, Debug)]
pub struct GrayImageView<'a> {
    pub width: usize,
    pub height: usize,
    pub data: &'a [u8], // row-major, len = w*h
}

/// Owned single-channel image, row-major.
///
/// For color scans the channel stored here is the lowest-order 8 bits of
/// each packed pixel, which is what the fill detector compares against its
/// darkness threshold.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GrayImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl GrayImage {
    /// Image of `width x height` filled with `value`.
    pub fn filled(width: usize, height: usize, value: u8) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }

    /// Build an image from a row-major buffer; `None` if the length does not match.
    pub fn from_raw(width: usize, height: usize, data: Vec<u8>) -> Option<Self> {
        (width.checked_mul(height)? == data.len()).then_some(Self {
            width,
            height,
            data,
        })
    }

    pub fn view(&self) -> GrayImageView<'_> {
        GrayImageView {
            width: self.width,
            height: self.height,
            data: &self.data,
        }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Option<u8> {
        self.view().get(x, y)
    }

    #[inline]
    pub fn put(&mut self, x: usize, y: usize, value: u8) {
        if x < self.width && y < self.height {
            self.data[y * self.width + x] = value;
        }
    }
}

impl<'a> GrayImageView<'a> {
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get(y * self.width + x).copied()
    }

    fn check_block(&self, x: i64, y: i64, w: usize, h: usize) -> Result<(usize, usize), ImageError> {
        let err = ImageError::OutOfBounds {
            x,
            y,
            width: w,
            height: h,
            image_width: self.width,
            image_height: self.height,
        };
        let (Ok(ux), Ok(uy)) = (usize::try_from(x), usize::try_from(y)) else {
            return Err(err);
        };
        let fits_x = ux.checked_add(w).is_some_and(|end| end <= self.width);
        let fits_y = uy.checked_add(h).is_some_and(|end| end <= self.height);
        if !(fits_x && fits_y) || self.data.len() < self.width * self.height {
            return Err(err);
        }
        Ok((ux, uy))
    }
}

/// Pixel access needed by the fill detector and the area locator.
///
/// Coordinates are signed so callers can pass a window anchored left of or
/// above the origin and get `OutOfBounds` back instead of wrapping.
pub trait ImageSource {
    fn width(&self) -> usize;
    fn height(&self) -> usize;

    /// Row-major samples of the `w x h` block with top-left `(x, y)`.
    fn pixel_block(&self, x: i64, y: i64, w: usize, h: usize) -> Result<Vec<u8>, ImageError>;

    /// Copy of the `w x h` sub-image with top-left `(x, y)`.
    fn crop(&self, x: i64, y: i64, w: usize, h: usize) -> Result<GrayImage, ImageError> {
        let data = self.pixel_block(x, y, w, h)?;
        Ok(GrayImage {
            width: w,
            height: h,
            data,
        })
    }
}

impl ImageSource for GrayImageView<'_> {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn pixel_block(&self, x: i64, y: i64, w: usize, h: usize) -> Result<Vec<u8>, ImageError> {
        let (x0, y0) = self.check_block(x, y, w, h)?;
        let mut out = Vec::with_capacity(w * h);
        for row in y0..y0 + h {
            let start = row * self.width + x0;
            out.extend_from_slice(&self.data[start..start + w]);
        }
        Ok(out)
    }
}

impl ImageSource for GrayImage {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn pixel_block(&self, x: i64, y: i64, w: usize, h: usize) -> Result<Vec<u8>, ImageError> {
        self.view().pixel_block(x, y, w, h)
    }
}
