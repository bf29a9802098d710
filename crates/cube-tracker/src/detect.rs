//! Conversions between `image` crate buffers and the tracker image types.

use crate::io::CubeTrackerIoError;
use cube_tracker_core::{RgbImage, RgbImageView};
use std::path::Path;

/// Borrow an `image::RgbImage` as a tracker view.
pub fn rgb_view(img: &::image::RgbImage) -> RgbImageView<'_> {
    RgbImageView {
        width: img.width() as usize,
        height: img.height() as usize,
        data: img.as_raw(),
    }
}

/// Copy a tracker image into an `image::RgbImage`.
pub fn to_image_rgb(img: &RgbImage) -> Option<::image::RgbImage> {
    ::image::RgbImage::from_raw(img.width as u32, img.height as u32, img.data.clone())
}

/// Load any supported image file as 8-bit RGB.
pub fn load_rgb(path: impl AsRef<Path>) -> Result<::image::RgbImage, CubeTrackerIoError> {
    Ok(::image::open(path)?.to_rgb8())
}

/// Save a tracker image; the format follows the file extension.
pub fn save_rgb(img: &RgbImage, path: impl AsRef<Path>) -> Result<(), CubeTrackerIoError> {
    let Some(buf) = to_image_rgb(img) else {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "image buffer does not match its dimensions",
        )
        .into());
    };
    buf.save(path)?;
    Ok(())
}
