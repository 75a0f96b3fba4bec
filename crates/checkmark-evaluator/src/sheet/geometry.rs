// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Planar geometry helpers: quadrant assignment by coordinate sum/difference,
// polygon area, and the four-vertex box outline type.

use imageproc::point::Point;
use serde::{Deserialize, Serialize};

/// Canonical position of a point (or a box centroid) on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Quadrant {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Quadrant {
    /// Order in which the corners of one box are assigned.
    pub const CORNER_PRIORITY: [Quadrant; 4] = [
        Quadrant::TopLeft,
        Quadrant::BottomRight,
        Quadrant::TopRight,
        Quadrant::BottomLeft,
    ];

    /// Order in which boxes fill the page slots. Questions are numbered down
    /// the left column first, then down the right column.
    pub const BOX_SLOTS: [Quadrant; 4] = [
        Quadrant::TopLeft,
        Quadrant::BottomLeft,
        Quadrant::TopRight,
        Quadrant::BottomRight,
    ];

    /// Statistic this quadrant selects on, and whether it wants the maximum.
    ///
    /// `x + y` grows towards the bottom-right; `y - x` grows towards the
    /// bottom-left.
    fn key(self, (x, y): (f32, f32)) -> (f32, bool) {
        match self {
            Self::TopLeft => (x + y, false),
            Self::BottomRight => (x + y, true),
            Self::TopRight => (y - x, false),
            Self::BottomLeft => (y - x, true),
        }
    }

    /// Pick the best candidate for this quadrant among `remaining` indices.
    /// Ties resolve to the earliest index.
    fn pick(self, points: &[(f32, f32)], remaining: &[usize]) -> Option<usize> {
        let mut best: Option<(usize, f32)> = None;
        for &idx in remaining {
            let (value, want_max) = self.key(points[idx]);
            let better = match best {
                None => true,
                Some((_, current)) if want_max => value > current,
                Some((_, current)) => value < current,
            };
            if better {
                best = Some((idx, value));
            }
        }
        best.map(|(idx, _)| idx)
    }
}

/// Assign points to quadrant slots, in `priority` order.
///
/// Each slot takes the best *remaining* point, so no point fills two slots.
/// Returns `(slot, point index)` pairs, at most `min(points.len(), priority.len())`.
pub fn assign_quadrants(points: &[(f32, f32)], priority: &[Quadrant]) -> Vec<(Quadrant, usize)> {
    let mut remaining: Vec<usize> = (0..points.len()).collect();
    let mut assigned = Vec::with_capacity(priority.len().min(points.len()));

    for &slot in priority {
        let Some(idx) = slot.pick(points, &remaining) else {
            break;
        };
        remaining.retain(|&r| r != idx);
        assigned.push((slot, idx));
    }
    assigned
}

/// Area of a closed polygon using the shoelace formula. Vertex order may be
/// CW or CCW; repeated vertices (e.g. along traced spurs) contribute nothing.
pub fn polygon_area(points: &[Point<i32>]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut twice_area = 0i64;
    for i in 0..n {
        let j = (i + 1) % n;
        twice_area += points[i].x as i64 * points[j].y as i64;
        twice_area -= points[j].x as i64 * points[i].y as i64;
    }
    twice_area.abs() as f64 / 2.0
}

/// A detected answer-box outline: exactly four vertices as found by polygon
/// simplification, in traversal order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoxOutline {
    pub vertices: [(i32, i32); 4],
}

impl BoxOutline {
    /// Build an outline from simplified contour vertices. Returns `None`
    /// unless exactly four are given.
    pub fn from_points(points: &[Point<i32>]) -> Option<Self> {
        let vertices: [Point<i32>; 4] = points.try_into().ok()?;
        Some(Self {
            vertices: vertices.map(|p| (p.x, p.y)),
        })
    }

    /// Enclosed area of the quadrilateral.
    pub fn area(&self) -> f64 {
        let points = self.vertices.map(|(x, y)| Point::new(x, y));
        polygon_area(&points)
    }

    /// Mean of the four vertices.
    pub fn centroid(&self) -> (f32, f32) {
        let (sx, sy) = self
            .vertices
            .iter()
            .fold((0.0f32, 0.0f32), |(sx, sy), &(x, y)| (sx + x as f32, sy + y as f32));
        (sx / 4.0, sy / 4.0)
    }

    /// Vertices as `[top_left, top_right, bottom_left, bottom_right]`.
    pub fn corners(&self) -> [(f32, f32); 4] {
        let points = self.vertices.map(|(x, y)| (x as f32, y as f32));
        let mut ordered = [(0.0f32, 0.0f32); 4];
        for (slot, idx) in assign_quadrants(&points, &Quadrant::CORNER_PRIORITY) {
            let position = match slot {
                Quadrant::TopLeft => 0,
                Quadrant::TopRight => 1,
                Quadrant::BottomLeft => 2,
                Quadrant::BottomRight => 3,
            };
            ordered[position] = points[idx];
        }
        ordered
    }
}
