// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Answer-box extraction — edge map, contour hierarchy filtering, and
// quadrilateral simplification.

use checkmark_core::error::{CheckmarkError, Result};
use checkmark_core::{EvaluatorConfig, MAX_BOXES};
use image::{GrayImage, RgbImage};
use imageproc::contours::{Contour, find_contours};
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use imageproc::geometry::{approximate_polygon_dp, arc_length};
use imageproc::point::Point;
use tracing::{debug, instrument, trace};

use super::geometry::{BoxOutline, Quadrant, assign_quadrants, polygon_area};
use crate::photo::loader::to_luma;

/// Grayscale → Gaussian blur → Canny edge map of the working image.
#[instrument(skip_all, fields(width = working.width(), height = working.height()))]
pub fn edge_map(working: &RgbImage, config: &EvaluatorConfig) -> GrayImage {
    let gray = to_luma(working);
    let blurred = gaussian_blur_f32(&gray, config.blur_sigma);
    let edges = canny(&blurred, config.canny_low, config.canny_high);
    debug!(
        sigma = config.blur_sigma,
        low = config.canny_low,
        high = config.canny_high,
        "Edge map computed"
    );
    edges
}

/// Find the answer boxes in an edge map and return them in page-slot order
/// (top-left, bottom-left, top-right, bottom-right).
///
/// ## Pipeline
///
/// 1. Trace every closed boundary, keeping the parent/child hierarchy
/// 2. Keep boundaries enclosing between 1/100 and 1/3 of the image; a nested
///    boundary additionally needs a parent larger than 1/3 (the visible page)
/// 3. Simplify each survivor with Douglas–Peucker at 2% of its perimeter and
///    keep exact quadrilaterals
/// 4. Sort by area (largest first), then assign page slots by centroid
///
/// Fails with `ShapeCount` when no box, or more than four, survive.
#[instrument(skip_all, fields(width = edges.width(), height = edges.height()))]
pub fn extract_boxes(edges: &GrayImage, config: &EvaluatorConfig) -> Result<Vec<BoxOutline>> {
    let contours: Vec<Contour<i32>> = find_contours(edges);
    let total_area = edges.width() as f64 * edges.height() as f64;
    let areas: Vec<f64> = contours.iter().map(|c| polygon_area(&c.points)).collect();
    debug!(contours = contours.len(), "Boundaries traced");

    let mut candidates: Vec<(BoxOutline, f64)> = Vec::new();
    for (idx, contour) in contours.iter().enumerate() {
        let parent_area = contour.parent.map(|p| areas[p]);
        if !passes_area_filter(areas[idx], parent_area, total_area, config) {
            continue;
        }

        let epsilon = config.polygon_epsilon_ratio * arc_length(&contour.points, true);
        let simplified = simplify_closed(&contour.points, epsilon);
        let Some(outline) = BoxOutline::from_points(&simplified) else {
            trace!(idx, vertices = simplified.len(), "Boundary is not a quadrilateral");
            continue;
        };
        trace!(idx, area = areas[idx], "Quadrilateral candidate");
        candidates.push((outline, outline.area()));
    }

    if candidates.is_empty() || candidates.len() > MAX_BOXES {
        debug!(found = candidates.len(), "Unusable box count");
        return Err(CheckmarkError::ShapeCount {
            found: candidates.len(),
        });
    }

    candidates.sort_by(|a, b| b.1.total_cmp(&a.1));
    let outlines: Vec<BoxOutline> = candidates.into_iter().map(|(outline, _)| outline).collect();
    let ordered = order_boxes(&outlines);
    debug!(boxes = ordered.len(), "Answer boxes located");
    Ok(ordered)
}

/// Area rule for one boundary. `parent_area` is `None` for top-level boundaries.
pub fn passes_area_filter(
    area: f64,
    parent_area: Option<f64>,
    total_area: f64,
    config: &EvaluatorConfig,
) -> bool {
    let in_range =
        total_area / config.min_area_divisor < area && area < total_area / config.max_area_divisor;
    if !in_range {
        return false;
    }
    match parent_area {
        None => true,
        Some(parent) => parent > total_area / config.parent_area_divisor,
    }
}

/// Arrange outlines into page slots by their centroids.
pub fn order_boxes(outlines: &[BoxOutline]) -> Vec<BoxOutline> {
    let centroids: Vec<(f32, f32)> = outlines.iter().map(BoxOutline::centroid).collect();
    assign_quadrants(&centroids, &Quadrant::BOX_SLOTS)
        .into_iter()
        .map(|(_, idx)| outlines[idx])
        .collect()
}

/// Douglas–Peucker simplification of a closed curve.
///
/// The tracing seam is arbitrary, so the curve is first anchored on a pair of
/// far-apart points: starting from the first point, jump to the farthest point
/// a few times, then split at the anchor and the point farthest from it. Both
/// halves are simplified as open chains and joined. A last pass drops any
/// vertex lying within `epsilon` of the chord between its neighbours.
pub fn simplify_closed(points: &[Point<i32>], epsilon: f64) -> Vec<Point<i32>> {
    if points.len() < 3 || epsilon <= 0.0 {
        return points.to_vec();
    }

    let mut anchor = 0;
    for _ in 0..DIAMETER_WALKS {
        let next = farthest_from(points, points[anchor]);
        if next == anchor {
            break;
        }
        anchor = next;
    }
    let far = farthest_from(points, points[anchor]);
    if far == anchor {
        return vec![points[anchor]];
    }

    let (first, second) = (anchor.min(far), anchor.max(far));
    let head = &points[first..=second];
    let mut wrap: Vec<Point<i32>> = points[second..].to_vec();
    wrap.extend_from_slice(&points[..=first]);

    let mut simplified = approximate_polygon_dp(head, epsilon, false);
    let tail = approximate_polygon_dp(&wrap, epsilon, false);
    // `tail` runs from the second split point back to the first, both
    // already present in `simplified`.
    if tail.len() > 2 {
        simplified.extend_from_slice(&tail[1..tail.len() - 1]);
    }
    drop_flat_vertices(simplified, epsilon)
}

/// Jumps used to walk from the seam towards a diameter endpoint.
const DIAMETER_WALKS: usize = 3;

/// Index of the point farthest from `origin`; the first one wins ties.
fn farthest_from(points: &[Point<i32>], origin: Point<i32>) -> usize {
    let mut best = (0, -1i64);
    for (idx, p) in points.iter().enumerate() {
        let dx = (p.x - origin.x) as i64;
        let dy = (p.y - origin.y) as i64;
        let d = dx * dx + dy * dy;
        if d > best.1 {
            best = (idx, d);
        }
    }
    best.0
}

/// Remove vertices within `epsilon` of the chord joining their neighbours,
/// treating the polygon as closed. Never shrinks below a triangle.
fn drop_flat_vertices(mut polygon: Vec<Point<i32>>, epsilon: f64) -> Vec<Point<i32>> {
    loop {
        if polygon.len() <= 3 {
            return polygon;
        }
        let n = polygon.len();
        let flat = (0..n).find(|&i| {
            let prev = polygon[(i + n - 1) % n];
            let next = polygon[(i + 1) % n];
            distance_to_line(polygon[i], prev, next) <= epsilon
        });
        match flat {
            Some(i) => {
                polygon.remove(i);
            }
            None => return polygon,
        }
    }
}

/// Perpendicular distance from `p` to the line through `a` and `b`.
fn distance_to_line(p: Point<i32>, a: Point<i32>, b: Point<i32>) -> f64 {
    let (dx, dy) = ((b.x - a.x) as f64, (b.y - a.y) as f64);
    let (px, py) = ((p.x - a.x) as f64, (p.y - a.y) as f64);
    let length = dx.hypot(dy);
    if length == 0.0 {
        return px.hypot(py);
    }
    (dx * py - dy * px).abs() / length
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;
    use imageproc::drawing::{draw_hollow_rect_mut, draw_line_segment_mut};
    use imageproc::rect::Rect;

    fn blank_edges() -> GrayImage {
        GrayImage::new(1200, 800)
    }

    fn draw_ring(edges: &mut GrayImage, x: i32, y: i32, w: u32, h: u32) {
        draw_hollow_rect_mut(edges, Rect::at(x, y).of_size(w, h), Luma([255u8]));
    }

    /// Closed outline through `corners`, one pixel wide.
    fn draw_quad(edges: &mut GrayImage, corners: [(f32, f32); 4]) {
        for i in 0..4 {
            draw_line_segment_mut(edges, corners[i], corners[(i + 1) % 4], Luma([255u8]));
        }
    }

    fn near(actual: (f32, f32), expected: (f32, f32)) -> bool {
        (actual.0 - expected.0).abs() <= 2.0 && (actual.1 - expected.1).abs() <= 2.0
    }

    #[test]
    fn simplify_rectangle_trace_to_four_corners() {
        let mut trace = Vec::new();
        for x in 0..100 {
            trace.push(Point::new(x, 0));
        }
        for y in 0..60 {
            trace.push(Point::new(100, y));
        }
        for x in (1..=100).rev() {
            trace.push(Point::new(x, 60));
        }
        for y in (1..=60).rev() {
            trace.push(Point::new(0, y));
        }
        let epsilon = 0.02 * arc_length(&trace, true);
        let simplified = simplify_closed(&trace, epsilon);
        assert_eq!(simplified.len(), 4, "got {:?}", simplified);
        assert!(simplified.contains(&Point::new(0, 0)));
        assert!(simplified.contains(&Point::new(100, 60)));
    }

    #[test]
    fn single_box_is_found() {
        let mut edges = blank_edges();
        draw_ring(&mut edges, 100, 120, 400, 250);

        let boxes = extract_boxes(&edges, &EvaluatorConfig::default()).expect("one box");
        assert_eq!(boxes.len(), 1);
        let [tl, tr, bl, br] = boxes[0].corners();
        assert_eq!(tl, (100.0, 120.0));
        assert_eq!(tr, (499.0, 120.0));
        assert_eq!(bl, (100.0, 369.0));
        assert_eq!(br, (499.0, 369.0));
    }

    #[test]
    fn four_boxes_come_back_in_slot_order() {
        let mut edges = blank_edges();
        // Drawn out of order on purpose.
        draw_ring(&mut edges, 660, 440, 480, 320);
        draw_ring(&mut edges, 60, 40, 480, 320);
        draw_ring(&mut edges, 660, 40, 480, 320);
        draw_ring(&mut edges, 60, 440, 480, 320);

        let boxes = extract_boxes(&edges, &EvaluatorConfig::default()).expect("four boxes");
        let origins: Vec<(f32, f32)> = boxes.iter().map(|b| b.corners()[0]).collect();
        assert_eq!(
            origins,
            vec![(60.0, 40.0), (60.0, 440.0), (660.0, 40.0), (660.0, 440.0)]
        );
    }

    #[test]
    fn blank_edge_map_is_a_shape_count_error() {
        let err = extract_boxes(&blank_edges(), &EvaluatorConfig::default()).unwrap_err();
        assert!(matches!(err, CheckmarkError::ShapeCount { found: 0 }));
    }

    #[test]
    fn five_boxes_is_a_shape_count_error() {
        let mut edges = blank_edges();
        for i in 0..5 {
            draw_ring(&mut edges, 20 + i * 230, 100, 200, 150);
        }
        let err = extract_boxes(&edges, &EvaluatorConfig::default()).unwrap_err();
        assert!(matches!(err, CheckmarkError::ShapeCount { found: 5 }));
    }

    #[test]
    fn tiny_and_huge_rings_are_ignored() {
        let mut edges = blank_edges();
        draw_ring(&mut edges, 50, 50, 60, 60); // below 1/100 of the page
        draw_ring(&mut edges, 300, 200, 400, 300);
        let boxes = extract_boxes(&edges, &EvaluatorConfig::default()).expect("one box");
        assert_eq!(boxes.len(), 1);
        assert_eq!(boxes[0].corners()[0], (300.0, 200.0));
    }

    #[test]
    fn boxes_inside_visible_page_border_are_kept() {
        let mut edges = blank_edges();
        draw_ring(&mut edges, 10, 10, 1180, 780); // page edge, larger than 1/3
        draw_ring(&mut edges, 100, 100, 400, 250);
        draw_ring(&mut edges, 650, 400, 400, 250);

        let boxes = extract_boxes(&edges, &EvaluatorConfig::default()).expect("two boxes");
        assert_eq!(boxes.len(), 2);
    }

    #[test]
    fn box_nested_in_small_frame_is_rejected() {
        let mut edges = blank_edges();
        draw_ring(&mut edges, 100, 100, 600, 450); // frame, below 1/3 of the page
        draw_ring(&mut edges, 200, 200, 300, 200); // nested inside the frame

        let boxes = extract_boxes(&edges, &EvaluatorConfig::default()).expect("frame only");
        assert_eq!(boxes.len(), 1);
        assert_eq!(boxes[0].corners()[0], (100.0, 100.0));
    }

    #[test]
    fn area_filter_bounds() {
        let config = EvaluatorConfig::default();
        let total = 960_000.0;
        assert!(!passes_area_filter(9_600.0, None, total, &config));
        assert!(passes_area_filter(9_601.0, None, total, &config));
        assert!(!passes_area_filter(320_000.0, None, total, &config));
        assert!(passes_area_filter(100_000.0, Some(320_001.0), total, &config));
        assert!(!passes_area_filter(100_000.0, Some(320_000.0), total, &config));
    }

    #[test]
    fn seam_on_a_tilted_edge_is_not_a_vertex() {
        // The top edge rises 4 px over 400 px, so tracing starts mid-edge.
        let mut edges = blank_edges();
        draw_quad(
            &mut edges,
            [(100.0, 102.0), (500.0, 98.0), (504.0, 370.0), (96.0, 374.0)],
        );

        let boxes = extract_boxes(&edges, &EvaluatorConfig::default()).expect("tilted box");
        assert_eq!(boxes.len(), 1);
        let [tl, tr, bl, br] = boxes[0].corners();
        assert!(near(tl, (100.0, 102.0)), "top-left {:?}", tl);
        assert!(near(tr, (500.0, 98.0)), "top-right {:?}", tr);
        assert!(near(bl, (96.0, 374.0)), "bottom-left {:?}", bl);
        assert!(near(br, (504.0, 370.0)), "bottom-right {:?}", br);
    }

    #[test]
    fn simplify_drops_seam_inside_an_edge() {
        // Trace of a rectangle whose first point sits in the middle of the top edge.
        let mut trace = Vec::new();
        for x in 50..200 {
            trace.push(Point::new(x, 0));
        }
        for y in 0..80 {
            trace.push(Point::new(200, y));
        }
        for x in (1..=200).rev() {
            trace.push(Point::new(x, 80));
        }
        for y in (1..=80).rev() {
            trace.push(Point::new(0, y));
        }
        for x in 0..50 {
            trace.push(Point::new(x, 0));
        }
        let epsilon = 0.02 * arc_length(&trace, true);
        let simplified = simplify_closed(&trace, epsilon);
        assert_eq!(simplified.len(), 4, "got {:?}", simplified);
        assert!(!simplified.contains(&Point::new(50, 0)));
    }

    #[test]
    fn shape_count_error_exactly_when_zero_or_more_than_four() {
        // Six page slots, each holding one tilted quadrilateral of its own size.
        let slots = [
            (0.0, 0.0),
            (400.0, 400.0),
            (800.0, 0.0),
            (0.0, 400.0),
            (800.0, 400.0),
            (400.0, 0.0),
        ];
        for count in 0..=6usize {
            let mut edges = blank_edges();
            for (i, &(sx, sy)) in slots.iter().take(count).enumerate() {
                let (x, y) = (sx + 50.0, sy + 60.0);
                let w = 200.0 + 20.0 * i as f32;
                let h = 140.0 + 12.0 * i as f32;
                let t = 3.0 + i as f32;
                draw_quad(
                    &mut edges,
                    [(x, y + t), (x + w, y), (x + w + t, y + h), (x + t, y + h + t)],
                );
            }

            match extract_boxes(&edges, &EvaluatorConfig::default()) {
                Ok(boxes) => {
                    assert!((1..=4).contains(&count), "{} quads accepted", count);
                    assert_eq!(boxes.len(), count);
                }
                Err(CheckmarkError::ShapeCount { found }) => {
                    assert!(count == 0 || count > 4, "{} quads rejected", count);
                    assert_eq!(found, count);
                }
                Err(other) => panic!("unexpected error for {} quads: {}", count, other),
            }
        }
    }
}
