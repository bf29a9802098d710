use crate::{FaceColor, BACKGROUND_LABEL};

/// Borrowed 8-bit RGB image, row-major and interleaved.
#[derive(Clone, Copy, Debug)]
pub struct RgbImageView<'a> {
    pub width: usize,
    pub height: usize,
    pub data: &'a [u8], // len = w*h*3
}

impl RgbImageView<'_> {
    /// `true` when the buffer length matches the dimensions and both are non-zero.
    pub fn is_well_formed(&self) -> bool {
        self.width > 0
            && self.height > 0
            && self
                .width
                .checked_mul(self.height)
                .and_then(|n| n.checked_mul(3))
                .is_some_and(|n| n == self.data.len())
    }

    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> [u8; 3] {
        let i = (y * self.width + x) * 3;
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }

    pub fn to_owned_image(&self) -> RgbImage {
        RgbImage {
            width: self.width,
            height: self.height,
            data: self.data.to_vec(),
        }
    }
}

/// Owned 8-bit RGB image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RgbImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl RgbImage {
    pub fn new(width: usize, height: usize) -> Self {
        Self::filled(width, height, [0, 0, 0])
    }

    pub fn filled(width: usize, height: usize, rgb: [u8; 3]) -> Self {
        let mut data = Vec::with_capacity(width * height * 3);
        for _ in 0..width * height {
            data.extend_from_slice(&rgb);
        }
        Self {
            width,
            height,
            data,
        }
    }

    pub fn view(&self) -> RgbImageView<'_> {
        RgbImageView {
            width: self.width,
            height: self.height,
            data: &self.data,
        }
    }

    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> [u8; 3] {
        self.view().pixel(x, y)
    }

    #[inline]
    pub fn put_pixel(&mut self, x: usize, y: usize, rgb: [u8; 3]) {
        let i = (y * self.width + x) * 3;
        self.data[i..i + 3].copy_from_slice(&rgb);
    }

    /// Bounds-checked write with signed coordinates; out-of-range is ignored.
    #[inline]
    pub fn put_pixel_checked(&mut self, x: i64, y: i64, rgb: [u8; 3]) {
        if x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height {
            self.put_pixel(x as usize, y as usize, rgb);
        }
    }

    /// Copy `src` into this image with its top-left corner at `(x0, y0)`,
    /// clipping at the borders.
    pub fn blit(&mut self, src: &RgbImage, x0: usize, y0: usize) {
        let w = src.width.min(self.width.saturating_sub(x0));
        let h = src.height.min(self.height.saturating_sub(y0));
        for y in 0..h {
            let s = y * src.width * 3;
            let d = ((y0 + y) * self.width + x0) * 3;
            self.data[d..d + w * 3].copy_from_slice(&src.data[s..s + w * 3]);
        }
    }
}

/// Per-pixel face labels: `FaceColor::label()` or [`BACKGROUND_LABEL`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LabelImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl LabelImage {
    pub fn background(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![BACKGROUND_LABEL; width * height],
        }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.width + x]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, label: u8) {
        self.data[y * self.width + x] = label;
    }

    #[inline]
    pub fn color_at(&self, x: usize, y: usize) -> Option<FaceColor> {
        FaceColor::from_label(self.get(x, y))
    }

    /// Number of pixels carrying each face colour.
    pub fn color_counts(&self) -> [usize; crate::N_FACE_COLORS] {
        let mut counts = [0usize; crate::N_FACE_COLORS];
        for &l in &self.data {
            if let Some(c) = FaceColor::from_label(l) {
                counts[c.index()] += 1;
            }
        }
        counts
    }

    /// Render labels with their nominal colours on a black background.
    pub fn colorize(&self) -> RgbImage {
        let mut out = RgbImage::new(self.width, self.height);
        for y in 0..self.height {
            for x in 0..self.width {
                if let Some(c) = self.color_at(x, y) {
                    out.put_pixel(x, y, c.rgb());
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_shape_check() {
        let data = vec![0u8; 4 * 3 * 3];
        let ok = RgbImageView {
            width: 4,
            height: 3,
            data: &data,
        };
        assert!(ok.is_well_formed());
        let bad = RgbImageView {
            width: 5,
            height: 3,
            data: &data,
        };
        assert!(!bad.is_well_formed());
        let empty = RgbImageView {
            width: 0,
            height: 0,
            data: &[],
        };
        assert!(!empty.is_well_formed());
    }

    #[test]
    fn blit_clips_at_border() {
        let mut dst = RgbImage::new(4, 4);
        let src = RgbImage::filled(3, 3, [9, 8, 7]);
        dst.blit(&src, 2, 2);
        assert_eq!(dst.pixel(3, 3), [9, 8, 7]);
        assert_eq!(dst.pixel(1, 1), [0, 0, 0]);
    }

    #[test]
    fn label_counts_skip_background() {
        let mut labels = LabelImage::background(3, 1);
        labels.set(0, 0, FaceColor::Blue.label());
        labels.set(2, 0, FaceColor::Blue.label());
        let counts = labels.color_counts();
        assert_eq!(counts[FaceColor::Blue.index()], 2);
        assert_eq!(counts.iter().sum::<usize>(), 2);
        assert_eq!(labels.colorize().pixel(1, 0), [0, 0, 0]);
    }
}
