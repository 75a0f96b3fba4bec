// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Overlay compositing — inverse-warps each box's correctness overlay into the
// photo's perspective and adds it onto a copy of the working image.

use checkmark_core::error::Result;
use image::{Rgb, RgbImage};
use imageproc::geometric_transformations::{Interpolation, warp_into};
use tracing::{debug, instrument};

use super::rectify::BoxFrame;

/// Composite `overlays[i]` (in grid-window coordinates of `frames[i]`) onto
/// a copy of `working`. Channels are added with saturation, so a black
/// overlay pixel leaves the photo untouched.
#[instrument(skip_all, fields(boxes = frames.len()))]
pub fn composite(
    working: &RgbImage,
    frames: &[BoxFrame],
    overlays: &[RgbImage],
) -> Result<RgbImage> {
    let (width, height) = working.dimensions();
    let mut result = working.clone();

    for (frame, overlay) in frames.iter().zip(overlays) {
        let projection = frame.inverse_from_window()?;
        let mut warped = RgbImage::new(width, height);
        warp_into(
            overlay,
            &projection,
            Interpolation::Bilinear,
            Rgb([0u8, 0, 0]),
            &mut warped,
        );
        add_saturating(&mut result, &warped);
    }

    debug!(width, height, "Overlays composited");
    Ok(result)
}

/// `base += layer`, per channel, clamped at 255. Both buffers share dimensions.
fn add_saturating(base: &mut RgbImage, layer: &RgbImage) {
    for (b, l) in base.iter_mut().zip(layer.iter()) {
        *b = b.saturating_add(*l);
    }
}
