use crate::hsv::Hsv;
use crate::params::{AmbiguityPolicy, ColorSegmenterParams};
use cube_tracker_core::{FaceColor, LabelImage, RgbImageView, BACKGROUND_LABEL, N_FACE_COLORS};
use log::debug;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Errors returned by [`ColorSegmenter::segment`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SegmentationError {
    #[error("invalid RGB image (width={width}, height={height}, buffer={len} bytes)")]
    InvalidImage {
        width: usize,
        height: usize,
        len: usize,
    },
}

/// Output of one segmentation run.
#[derive(Clone, Debug)]
pub struct Segmentation {
    pub labels: LabelImage,
    /// Pixels per colour after clean-up, indexed by `FaceColor::index()`.
    pub color_pixel_counts: [usize; N_FACE_COLORS],
}

impl Segmentation {
    /// Colours that survived segmentation.
    pub fn present_colors(&self) -> Vec<FaceColor> {
        FaceColor::ALL
            .into_iter()
            .filter(|c| self.color_pixel_counts[c.index()] > 0)
            .collect()
    }
}

/// Per-pixel face colour classifier.
#[derive(Clone, Debug, Default)]
pub struct ColorSegmenter {
    params: ColorSegmenterParams,
}

impl ColorSegmenter {
    pub fn new(params: ColorSegmenterParams) -> Self {
        Self { params }
    }

    #[inline]
    pub fn params(&self) -> &ColorSegmenterParams {
        &self.params
    }

    /// Classify a single RGB value.
    pub fn classify(&self, rgb: [u8; 3]) -> Option<FaceColor> {
        let hsv = Hsv::from_rgb(rgb);
        match self.params.ambiguity {
            AmbiguityPolicy::Priority => self
                .params
                .priority
                .iter()
                .copied()
                .find(|&c| self.params.range(c).contains(hsv)),
            AmbiguityPolicy::Background => {
                let mut found = None;
                for c in FaceColor::ALL {
                    if self.params.range(c).contains(hsv) {
                        if found.is_some() {
                            return None;
                        }
                        found = Some(c);
                    }
                }
                found
            }
        }
    }

    /// Label every pixel of `image` with a face colour or background.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip(self, image), fields(width = image.width, height = image.height))
    )]
    pub fn segment(&self, image: &RgbImageView<'_>) -> Result<Segmentation, SegmentationError> {
        if !image.is_well_formed() {
            return Err(SegmentationError::InvalidImage {
                width: image.width,
                height: image.height,
                len: image.data.len(),
            });
        }

        let mut labels = LabelImage::background(image.width, image.height);
        // Rendered and real images both have long runs of identical pixels.
        let mut last: Option<([u8; 3], u8)> = None;
        for (dst, px) in labels.data.iter_mut().zip(image.data.chunks_exact(3)) {
            let rgb = [px[0], px[1], px[2]];
            let label = match last {
                Some((prev, label)) if prev == rgb => label,
                _ => {
                    let label = self.classify(rgb).map_or(BACKGROUND_LABEL, FaceColor::label);
                    last = Some((rgb, label));
                    label
                }
            };
            *dst = label;
        }

        if self.params.majority_filter {
            labels = majority_filter(&labels);
        }

        let mut counts = labels.color_counts();
        for c in FaceColor::ALL {
            let n = counts[c.index()];
            if n > 0 && n < self.params.min_color_pixels {
                debug!("dropping {c}: {n} pixels < {}", self.params.min_color_pixels);
                erase_label(&mut labels, c.label());
                counts[c.index()] = 0;
            }
        }

        Ok(Segmentation {
            labels,
            color_pixel_counts: counts,
        })
    }
}

fn erase_label(labels: &mut LabelImage, label: u8) {
    for l in labels.data.iter_mut().filter(|l| **l == label) {
        *l = BACKGROUND_LABEL;
    }
}

fn majority_filter(src: &LabelImage) -> LabelImage {
    let mut out = src.clone();
    let (w, h) = (src.width, src.height);
    for y in 1..h.saturating_sub(1) {
        for x in 1..w.saturating_sub(1) {
            let mut votes = [0u8; N_FACE_COLORS];
            for dy in 0..3 {
                for dx in 0..3 {
                    if dx == 1 && dy == 1 {
                        continue;
                    }
                    if let Some(c) = src.color_at(x + dx - 1, y + dy - 1) {
                        votes[c.index()] += 1;
                    }
                }
            }
            if let Some((idx, _)) = votes.iter().enumerate().find(|(_, &v)| v >= 5) {
                out.set(x, y, idx as u8);
            }
        }
    }
    out
}
