//=========================================================================
// Frame Dump
//=========================================================================
//
// Writes a painted frame to a PNG file. Frames are BGRA; the image crate
// wants RGBA, so red and blue are swapped on the way out.
//
//=========================================================================

//=== Standard Library Imports ============================================

use std::path::Path;

//=== External Dependencies ===============================================

use image::{ImageFormat, RgbaImage};
use log::info;

//=== Internal Dependencies ===============================================

use crate::core::paint::{OwnedFrame, BYTES_PER_PIXEL};

//=== DumpError ===========================================================

#[derive(thiserror::Error, Debug)]
pub enum DumpError {
    #[error("frame buffer does not match {width}x{height}")]
    Malformed { width: u32, height: u32 },

    #[error("failed to write frame: {0}")]
    Image(#[from] image::ImageError),
}

//=== Conversion ==========================================================

/// Copies a BGRA frame into an RGBA image.
pub(crate) fn to_rgba(frame: &OwnedFrame) -> Result<RgbaImage, DumpError> {
    let malformed = || DumpError::Malformed {
        width: frame.width,
        height: frame.height,
    };

    let expected = frame.width as usize * frame.height as usize * BYTES_PER_PIXEL;
    if frame.pixels.len() != expected {
        return Err(malformed());
    }

    let mut rgba = frame.pixels.clone();
    for px in rgba.chunks_exact_mut(BYTES_PER_PIXEL) {
        px.swap(0, 2);
    }

    RgbaImage::from_raw(frame.width, frame.height, rgba).ok_or_else(malformed)
}

/// Saves `frame` as a PNG at `path`.
pub(crate) fn save_png(frame: &OwnedFrame, path: &Path) -> Result<(), DumpError> {
    let image = to_rgba(frame)?;
    image.save_with_format(path, ImageFormat::Png)?;
    info!(
        target: "platform",
        "Frame {}x{} written to {}",
        frame.width,
        frame.height,
        path.display()
    );
    Ok(())
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channels_are_swapped() {
        let frame = OwnedFrame {
            width: 1,
            height: 1,
            pixels: vec![0x10, 0x20, 0x30, 0xFF],
        };
        let image = to_rgba(&frame).unwrap();
        assert_eq!(image.get_pixel(0, 0).0, [0x30, 0x20, 0x10, 0xFF]);
    }

    #[test]
    fn malformed_frame_is_rejected() {
        let frame = OwnedFrame {
            width: 2,
            height: 2,
            pixels: vec![0; 4],
        };
        assert!(matches!(to_rgba(&frame), Err(DumpError::Malformed { .. })));
    }

    #[test]
    fn png_is_written() {
        let path = std::env::temp_dir().join(format!("stoa-dump-{}.png", std::process::id()));
        let frame = OwnedFrame {
            width: 3,
            height: 2,
            pixels: vec![0x80; 3 * 2 * 4],
        };

        save_png(&frame, &path).unwrap();
        let decoded = image::open(&path).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (3, 2));

        let _ = std::fs::remove_file(&path);
    }
}
