/// Binarized image, `true` = black module.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BitMatrix {
    width: usize,
    height: usize,
    bits: Vec<bool>,
}

impl BitMatrix {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            bits: vec![false; width * height],
        }
    }

    /// Build a matrix by evaluating `is_black` at every pixel.
    pub fn from_fn(
        width: usize,
        height: usize,
        mut is_black: impl FnMut(usize, usize) -> bool,
    ) -> Self {
        let mut bits = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                bits.push(is_black(x, y));
            }
        }
        Self {
            width,
            height,
            bits,
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// `false` outside the matrix.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height && self.bits[y * self.width + x]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, black: bool) {
        if x < self.width && y < self.height {
            self.bits[y * self.width + x] = black;
        }
    }

    pub fn count_black(&self) -> usize {
        self.bits.iter().filter(|&&b| b).count()
    }
}
