/// A rendered RGBA8 bitmap, the payload of every `BitmapCache` entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Bitmap {
    pub width: u32,
    pub height: u32,
    /// Tightly packed `width * height * 4` RGBA bytes, row-major.
    pub pixels: Vec<u8>,
}

impl Bitmap {
    pub fn blank(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let mut pixels = Vec::with_capacity(width as usize * height as usize * 4);
        for _ in 0..(width as usize * height as usize) {
            pixels.extend_from_slice(&rgba);
        }
        Bitmap { width, height, pixels }
    }

    pub fn byte_len(&self) -> usize {
        self.pixels.len()
    }

    /// In-place RGB channel inversion, leaving alpha untouched. Used by
    /// `RenderWorker`'s optional "invert colors" post-processing step.
    pub fn invert_colors(&mut self) {
        for px in self.pixels.chunks_exact_mut(4) {
            px[0] = 255 - px[0];
            px[1] = 255 - px[1];
            px[2] = 255 - px[2];
        }
    }
}
