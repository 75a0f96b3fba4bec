// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Synthetic sheets and boxes shared by the pipeline unit tests.

use checkmark_core::EvaluatorConfig;
use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut};
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};
use imageproc::rect::Rect;

use super::geometry::BoxOutline;
use super::rectify::{BoxFrame, CropWindow, WarpedBox};

pub const WIDTH: u32 = 1200;
pub const HEIGHT: u32 = 800;

/// Box positions `(x, y, width, height)` in page-slot order.
pub const FOUR_BOXES: [(i32, i32, u32, u32); 4] = [
    (60, 40, 480, 320),
    (60, 440, 480, 320),
    (660, 40, 480, 320),
    (660, 440, 480, 320),
];

/// Frame thickness of a printed box, in page pixels.
const FRAME: u32 = 6;

/// A warped canonical box (white paper) with solid ink blocks in the given
/// cells. `rows[r] = Some(c)` marks option `c` of question `r`; `extra`
/// adds further `(row, column)` marks.
pub fn warped_grid(rows: &[Option<usize>], extra: &[(usize, usize)]) -> WarpedBox {
    let config = EvaluatorConfig::default();
    let outline = BoxOutline {
        vertices: [(0, 0), (0, HEIGHT as i32), (WIDTH as i32, HEIGHT as i32), (WIDTH as i32, 0)],
    };
    let frame = BoxFrame::new(outline, (WIDTH, HEIGHT), &config);
    let window = frame.window;
    let mut gray = GrayImage::from_pixel(WIDTH, HEIGHT, Luma([255u8]));

    let cells = rows
        .iter()
        .enumerate()
        .filter_map(|(row, option)| option.map(|c| (row, c)))
        .chain(extra.iter().copied());
    for (row, column) in cells {
        let (cw, ch) = (window.cell_width(), window.cell_height());
        let x = window.x + column as u32 * cw + cw / 5;
        let y = window.y + row as u32 * ch + ch / 5;
        let block = Rect::at(x as i32, y as i32).of_size(cw * 3 / 5, ch * 3 / 5);
        draw_filled_rect_mut(&mut gray, block, Luma([0u8]));
    }
    WarpedBox { frame, gray }
}

/// A photographed-looking page: white paper, black box frames, and filled
/// bubbles. `marks[b][q] = Some(c)` fills option `c` of question `q` in box `b`.
pub fn sheet(boxes: &[(i32, i32, u32, u32)], marks: &[Vec<Option<usize>>]) -> RgbImage {
    let config = EvaluatorConfig::default();
    let mut page = RgbImage::from_pixel(WIDTH, HEIGHT, Rgb([255, 255, 255]));
    let window = CropWindow::for_canonical(WIDTH, HEIGHT, &config);

    for (b, &(x, y, w, h)) in boxes.iter().enumerate() {
        draw_filled_rect_mut(&mut page, Rect::at(x, y).of_size(w, h), Rgb([0, 0, 0]));
        draw_filled_rect_mut(
            &mut page,
            Rect::at(x + FRAME as i32, y + FRAME as i32).of_size(w - 2 * FRAME, h - 2 * FRAME),
            Rgb([255, 255, 255]),
        );

        let radius = (window.cell_width() as f32 * w as f32 / WIDTH as f32)
            .min(window.cell_height() as f32 * h as f32 / HEIGHT as f32)
            * 0.3;
        for (question, option) in marks.get(b).into_iter().flatten().enumerate() {
            let Some(column) = option else { continue };
            let centre = mark_centre((x, y, w, h), question, *column);
            draw_filled_circle_mut(&mut page, centre, radius.round() as i32, Rgb([20, 20, 20]));
        }
    }
    page
}

/// Page position of the bubble for `(question, column)` in a box drawn by [`sheet`].
pub fn mark_centre(bx: (i32, i32, u32, u32), question: usize, column: usize) -> (i32, i32) {
    let (x, y, w, h) = bx;
    let window = CropWindow::for_canonical(WIDTH, HEIGHT, &EvaluatorConfig::default());
    let (cx, cy) = window.cell_centre(question, column);
    let sx = w as f32 / WIDTH as f32;
    let sy = h as f32 / HEIGHT as f32;
    (
        x + ((window.x as i32 + cx) as f32 * sx).round() as i32,
        y + ((window.y as i32 + cy) as f32 * sy).round() as i32,
    )
}

/// Re-photograph `page` at a slant: its corners move to the given page
/// positions `[top-left, top-right, bottom-left, bottom-right]`. Returns the
/// distorted page and the projection mapping old positions onto new ones.
pub fn skewed(page: &RgbImage, corners: [(f32, f32); 4]) -> (RgbImage, Projection) {
    let (w, h) = (WIDTH as f32, HEIGHT as f32);
    let projection =
        Projection::from_control_points([(0.0, 0.0), (w, 0.0), (0.0, h), (w, h)], corners)
            .expect("non-degenerate slant");
    let mut out = RgbImage::new(WIDTH, HEIGHT);
    warp_into(
        page,
        &projection,
        Interpolation::Bilinear,
        Rgb([255, 255, 255]),
        &mut out,
    );
    (out, projection)
}
