// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Photo loader — decodes an answer-sheet photo and normalises it to the fixed
// working resolution the recognition pipeline expects.

use checkmark_core::error::CheckmarkError;
use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, RgbImage};
use tracing::{debug, info, instrument};

/// A decoded answer-sheet photo, before normalisation.
///
/// ```ignore
/// let working = SheetImage::open("sheet.jpg")?.to_working(1200, 800);
/// ```
pub struct SheetImage {
    /// The photo as decoded.
    image: DynamicImage,
}

impl SheetImage {
    // -- Construction ---------------------------------------------------------

    /// Load a photo from a file path.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self, CheckmarkError> {
        let img = image::open(path.as_ref()).map_err(|err| {
            CheckmarkError::ImageError(format!(
                "failed to open {}: {}",
                path.as_ref().display(),
                err
            ))
        })?;
        info!(width = img.width(), height = img.height(), "Photo loaded");
        Ok(Self { image: img })
    }

    /// Decode a photo from raw encoded bytes (JPEG, PNG, etc.).
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self, CheckmarkError> {
        let img = image::load_from_memory(data).map_err(|err| {
            CheckmarkError::ImageError(format!("failed to decode photo: {}", err))
        })?;
        debug!(
            width = img.width(),
            height = img.height(),
            "Photo decoded from bytes"
        );
        Ok(Self { image: img })
    }

    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    // -- Accessors ------------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }

    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    // -- Normalisation --------------------------------------------------------

    /// Resize to exactly `width` x `height` RGB, ignoring aspect ratio.
    ///
    /// Sheet geometry constants are calibrated for this fixed resolution, so
    /// photos of any size and orientation are stretched onto it.
    pub fn to_working(&self, width: u32, height: u32) -> RgbImage {
        debug!(
            from_w = self.image.width(),
            from_h = self.image.height(),
            width,
            height,
            "Resizing to working resolution"
        );
        normalise(&self.image, width, height)
    }
}

/// Resize any decoded image to an exact RGB working buffer.
pub(crate) fn normalise(image: &DynamicImage, width: u32, height: u32) -> RgbImage {
    if image.width() == width && image.height() == height {
        return image.to_rgb8();
    }
    image
        .resize_exact(width, height, FilterType::Triangle)
        .to_rgb8()
}

/// Single-channel intensity with BT.601 weights (0.299 R + 0.587 G + 0.114 B),
/// in 14-bit fixed point with round-half-up.
pub fn to_luma(image: &RgbImage) -> GrayImage {
    let (width, height) = image.dimensions();
    let data: Vec<u8> = image
        .as_raw()
        .chunks_exact(3)
        .map(|px| {
            let weighted = px[0] as u32 * LUMA_R + px[1] as u32 * LUMA_G + px[2] as u32 * LUMA_B;
            ((weighted + (1 << (LUMA_SHIFT - 1))) >> LUMA_SHIFT) as u8
        })
        .collect();
    // One output byte per RGB triple.
    GrayImage::from_raw(width, height, data).unwrap_or_else(|| GrayImage::new(width, height))
}

const LUMA_SHIFT: u32 = 14;
const LUMA_R: u32 = 4899;
const LUMA_G: u32 = 9617;
const LUMA_B: u32 = 1868;

/// Write an image to a file. The format is inferred from the file extension.
pub fn save_image(
    image: &RgbImage,
    path: impl AsRef<std::path::Path>,
) -> Result<(), CheckmarkError> {
    image.save(path.as_ref()).map_err(|err| {
        CheckmarkError::ImageError(format!(
            "failed to save image to {}: {}",
            path.as_ref().display(),
            err
        ))
    })
}
