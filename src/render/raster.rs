use ndarray::{s, Array1, Array3};

pub type Rgb = [u8; 3];

/// An RGB frame buffer laid out as `(height, width, channel)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    pixels: Array3<u8>,
}

impl Raster {
    pub fn new(width: usize, height: usize) -> Self {
        Raster {
            pixels: Array3::zeros((height, width, 3)),
        }
    }

    pub fn width(&self) -> usize {
        self.pixels.shape()[1]
    }

    pub fn height(&self) -> usize {
        self.pixels.shape()[0]
    }

    pub fn pixels(&self) -> &Array3<u8> {
        &self.pixels
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<Rgb> {
        if x >= self.width() || y >= self.height() {
            return None;
        }
        Some([self.pixels[[y, x, 0]], self.pixels[[y, x, 1]], self.pixels[[y, x, 2]]])
    }

    pub fn fill(&mut self, color: Rgb) {
        let (width, height) = (self.width(), self.height());
        self.fill_rect(0, 0, width as i64, height as i64, color);
    }

    /// Paint the half-open rectangle `[x0, x1) x [y0, y1)`, clipped to the buffer.
    pub fn fill_rect(&mut self, x0: i64, y0: i64, x1: i64, y1: i64, color: Rgb) {
        let x0 = x0.clamp(0, self.width() as i64) as usize;
        let x1 = x1.clamp(0, self.width() as i64) as usize;
        let y0 = y0.clamp(0, self.height() as i64) as usize;
        let y1 = y1.clamp(0, self.height() as i64) as usize;
        if x0 >= x1 || y0 >= y1 {
            return;
        }

        let color = Array1::from(color.to_vec());
        self.pixels.slice_mut(s![y0..y1, x0..x1, ..]).assign(&color);
    }

    /// The frame as packed rgb24 bytes, row by row.
    pub fn as_bytes(&self) -> Vec<u8> {
        match self.pixels.as_slice() {
            Some(bytes) => bytes.to_vec(),
            None => self.pixels.iter().copied().collect(),
        }
    }
}
