//! Colour segmentation of cube faces.
//!
//! Every pixel is converted to HSV and tested against one acceptance range
//! per [`FaceColor`](cube_tracker_core::FaceColor). Pixels matching several
//! ranges are resolved by an explicit [`AmbiguityPolicy`]; pixels matching
//! none become background. A colour that is absent from the image is not an
//! error.
//!
//! ```
//! use cube_tracker_core::{FaceColor, RgbImage};
//! use cube_tracker_segmentation::{ColorSegmenter, ColorSegmenterParams};
//!
//! let img = RgbImage::filled(16, 16, FaceColor::Blue.rgb());
//! let seg = ColorSegmenter::new(ColorSegmenterParams::default());
//! let out = seg.segment(&img.view()).unwrap();
//! assert_eq!(out.labels.color_at(3, 3), Some(FaceColor::Blue));
//! ```

mod hsv;
mod params;
mod segmenter;

pub use hsv::{Hsv, HsvRange};
pub use params::{AmbiguityPolicy, ColorSegmenterParams};
pub use segmenter::{ColorSegmenter, Segmentation, SegmentationError};
