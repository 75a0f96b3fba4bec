// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Grid rectification — perspective warp of one answer box onto the canonical
// rectangle, inverted binarization, and border cropping to a 5x4 divisible grid.

use checkmark_core::error::{CheckmarkError, Result};
use checkmark_core::{EvaluatorConfig, OPTIONS_PER_QUESTION, QUESTIONS_PER_BOX};
use image::{GrayImage, Rgb, RgbImage};
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};
use tracing::{debug, instrument};

use super::geometry::BoxOutline;
use crate::photo::loader::to_luma;

/// Sub-rectangle of the canonical rectangle that holds the bubble grid.
///
/// `height` is a multiple of 5 and `width` a multiple of 4, so the grid splits
/// into equal cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropWindow {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropWindow {
    /// Window for a canonical rectangle of `width` x `height`.
    ///
    /// Each border starts at the configured percentage (whole percent steps of
    /// the dimension), the remaining span is rounded down to a multiple of the
    /// grid count, and the window is re-centred.
    pub fn for_canonical(width: u32, height: u32, config: &EvaluatorConfig) -> Self {
        let (y, crop_height) = centred_span(
            height,
            config.vertical_border_percent,
            QUESTIONS_PER_BOX as u32,
        );
        let (x, crop_width) = centred_span(
            width,
            config.horizontal_border_percent,
            OPTIONS_PER_QUESTION as u32,
        );
        Self {
            x,
            y,
            width: crop_width,
            height: crop_height,
        }
    }

    /// Width of one option column.
    pub fn cell_width(&self) -> u32 {
        self.width / OPTIONS_PER_QUESTION as u32
    }

    /// Height of one question row.
    pub fn cell_height(&self) -> u32 {
        self.height / QUESTIONS_PER_BOX as u32
    }

    /// Pixel area of one cell.
    pub fn cell_area(&self) -> u32 {
        self.cell_width() * self.cell_height()
    }

    /// Centre of a cell, in window coordinates.
    pub fn cell_centre(&self, row: usize, column: usize) -> (i32, i32) {
        let (cw, ch) = (self.cell_width() as i32, self.cell_height() as i32);
        (column as i32 * cw + cw / 2, row as i32 * ch + ch / 2)
    }
}

/// Returns `(offset, length)` of the kept span along one axis.
fn centred_span(total: u32, border_percent: u32, multiple: u32) -> (u32, u32) {
    let border = total / 100 * border_percent;
    let interior = total.saturating_sub(border * 2);
    let interior = interior / multiple * multiple;
    ((total - interior) / 2, interior)
}

/// Placement of one answer box: where it sits in the photo and where its grid
/// sits inside the canonical rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxFrame {
    pub outline: BoxOutline,
    /// Canonical rectangle size (the working resolution).
    pub canonical: (u32, u32),
    pub window: CropWindow,
}

impl BoxFrame {
    pub fn new(outline: BoxOutline, canonical: (u32, u32), config: &EvaluatorConfig) -> Self {
        Self {
            outline,
            canonical,
            window: CropWindow::for_canonical(canonical.0, canonical.1, config),
        }
    }

    /// Page coordinates → canonical rectangle coordinates.
    pub fn forward(&self) -> Result<Projection> {
        let (w, h) = (self.canonical.0 as f32, self.canonical.1 as f32);
        let target = [(0.0, 0.0), (w, 0.0), (0.0, h), (w, h)];
        self.projection(self.outline.corners(), target)
    }

    /// Grid-window coordinates (overlay space) → page coordinates.
    ///
    /// The window origin sits at `(window.x, window.y)` inside the canonical
    /// rectangle, so the canonical corners are shifted by that offset.
    pub fn inverse_from_window(&self) -> Result<Projection> {
        let (w, h) = (self.canonical.0 as f32, self.canonical.1 as f32);
        let (ox, oy) = (self.window.x as f32, self.window.y as f32);
        let source = [
            (-ox, -oy),
            (w - ox, -oy),
            (-ox, h - oy),
            (w - ox, h - oy),
        ];
        self.projection(source, self.outline.corners())
    }

    fn projection(&self, from: [(f32, f32); 4], to: [(f32, f32); 4]) -> Result<Projection> {
        Projection::from_control_points(from, to).ok_or_else(|| {
            CheckmarkError::DegenerateBox(format!(
                "no projective transform for outline {:?}",
                self.outline.vertices
            ))
        })
    }
}

/// A box warped into the canonical rectangle as grayscale, before any
/// thresholding. Every sweep sample binarizes this same buffer.
#[derive(Debug, Clone)]
pub struct WarpedBox {
    pub frame: BoxFrame,
    pub gray: GrayImage,
}

/// Warp one box of the working image onto the canonical rectangle.
#[instrument(skip_all, fields(outline = ?outline.vertices))]
pub fn warp_box(
    working: &RgbImage,
    outline: BoxOutline,
    config: &EvaluatorConfig,
) -> Result<WarpedBox> {
    let canonical = working.dimensions();
    let frame = BoxFrame::new(outline, canonical, config);
    let projection = frame.forward()?;

    let mut warped = RgbImage::new(canonical.0, canonical.1);
    warp_into(
        working,
        &projection,
        Interpolation::Bilinear,
        Rgb([0u8, 0, 0]),
        &mut warped,
    );
    let gray = to_luma(&warped);

    debug!(window = ?frame.window, "Box rectified");
    Ok(WarpedBox { frame, gray })
}

/// A binarized, border-cropped box ready for grid splitting. Ink is 255,
/// background 0.
#[derive(Debug, Clone)]
pub struct RectifiedBox {
    pub image: GrayImage,
    pub window: CropWindow,
}

/// Inverted binary threshold: values above `threshold` become 0, the rest 255.
pub fn binarize_inverted(gray: &GrayImage, threshold: u8) -> GrayImage {
    let (width, height) = gray.dimensions();
    let data: Vec<u8> = gray
        .as_raw()
        .iter()
        .map(|&v| if v > threshold { 0 } else { 255 })
        .collect();
    // Same dimensions and channel count as the source buffer.
    GrayImage::from_raw(width, height, data).unwrap_or_else(|| GrayImage::new(width, height))
}

/// Binarize a warped box at one threshold and crop it to its grid window.
pub fn rectify(warped: &WarpedBox, threshold: u8) -> RectifiedBox {
    let window = warped.frame.window;
    let grid = image::imageops::crop_imm(
        &warped.gray,
        window.x,
        window.y,
        window.width,
        window.height,
    )
    .to_image();
    RectifiedBox {
        image: binarize_inverted(&grid, threshold),
        window,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn config() -> EvaluatorConfig {
        EvaluatorConfig::default()
    }

    #[test]
    fn crop_window_at_working_resolution() {
        let window = CropWindow::for_canonical(1200, 800, &config());
        assert_eq!(
            window,
            CropWindow {
                x: 60,
                y: 25,
                width: 1080,
                height: 750
            }
        );
        assert_eq!((window.cell_width(), window.cell_height()), (270, 150));
    }

    #[test]
    fn crop_window_rounds_to_grid_multiples() {
        let window = CropWindow::for_canonical(1003, 707, &config());
        // 707: border 21, interior 665 (already a multiple of 5), offset 21.
        assert_eq!((window.y, window.height), (21, 665));
        // 1003: border 50, interior 903 -> 900, offset 51.
        assert_eq!((window.x, window.width), (51, 900));
        assert_eq!(window.height % 5, 0);
        assert_eq!(window.width % 4, 0);
        assert!(window.y + window.height <= 707);
        assert!(window.x + window.width <= 1003);
    }

    #[test]
    fn binarize_inverts_polarity() {
        let gray = GrayImage::from_raw(4, 1, vec![0, 100, 101, 255]).expect("buffer");
        let binary = binarize_inverted(&gray, 100);
        assert_eq!(binary.as_raw(), &vec![255, 255, 0, 0]);
    }

    #[test]
    fn axis_aligned_box_warps_to_canonical_rectangle() {
        // Dark page with a bright 300x200 box at (100, 100).
        let mut working = RgbImage::from_pixel(1200, 800, Rgb([0, 0, 0]));
        for y in 100..=300 {
            for x in 100..=400 {
                working.put_pixel(x, y, Rgb([255, 255, 255]));
            }
        }
        let outline = BoxOutline {
            vertices: [(100, 100), (100, 300), (400, 300), (400, 100)],
        };
        let warped = warp_box(&working, outline, &config()).expect("warp");
        assert_eq!(warped.gray.dimensions(), (1200, 800));
        assert_eq!(warped.gray.get_pixel(600, 400), &Luma([255]));

        let rectified = rectify(&warped, 128);
        assert_eq!(rectified.image.dimensions(), (1080, 750));
        // Bright interior is background after inversion.
        assert!(rectified.image.as_raw().iter().all(|&v| v == 0));
    }

    #[test]
    fn forward_then_inverse_returns_to_page() {
        let outline = BoxOutline {
            vertices: [(130, 90), (95, 420), (540, 445), (560, 70)],
        };
        let frame = BoxFrame::new(outline, (1200, 800), &config());
        let forward = frame.forward().expect("forward");
        let inverse = frame.inverse_from_window().expect("inverse");

        for &page in &[(200.0f32, 150.0f32), (300.0, 300.0), (480.0, 400.0)] {
            let (cx, cy) = forward * page;
            let window_point = (cx - frame.window.x as f32, cy - frame.window.y as f32);
            let (px, py) = inverse * window_point;
            assert!(
                (px - page.0).abs() < 0.05 && (py - page.1).abs() < 0.05,
                "{:?} came back as {:?}",
                page,
                (px, py)
            );
        }
    }
}
