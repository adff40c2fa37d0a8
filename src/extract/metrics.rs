//! Layout metrics engine
//!
//! Computes layout-quality scores over the full set of tool rectangles of
//! a graphical page. All metrics are pure functions of the rectangle set;
//! none consult tool content. Degenerate inputs (no rectangles, zero-area
//! canvas, zero bounding height) produce defined values, never panics:
//! the regularity scores default to 1.0, white space to 100, and the
//! horizontal/vertical ratio to `None`.

use crate::model::{LayoutMetrics, Rect};

/// Deviation (in pixels) at which a closeness score decays to zero
const DECAY_RANGE_PX: f64 = 1000.0;

/// Tolerance under which a deviation counts as an exact match
const EXACT_EPSILON: f64 = 1e-5;

/// Computes all layout metrics for a rectangle set
pub fn calc_metrics(rectangles: &[Rect]) -> LayoutMetrics {
    let alignment_score = alignment_score(rectangles);
    let spacing_score = spacing_score(rectangles);
    let size_uniformity_score = size_uniformity_score(rectangles);

    LayoutMetrics {
        alignment_score,
        spacing_score,
        size_uniformity_score,
        overlap_percentage: overlap_percentage(rectangles),
        white_space_percentage: white_space_percentage(rectangles),
        horizontal_vertical_ratio: horizontal_vertical_ratio(rectangles),
        overall_regular_score: (alignment_score + spacing_score + size_uniformity_score) / 3.0,
    }
}

/// Sum of rectangle areas; overlapping regions are counted once per
/// rectangle covering them
pub fn total_area(rectangles: &[Rect]) -> i64 {
    rectangles.iter().map(Rect::area).sum()
}

/// Sum of pairwise intersection areas over all unordered pairs
pub fn total_overlap(rectangles: &[Rect]) -> i64 {
    let mut overlap = 0;
    for (i, a) in rectangles.iter().enumerate() {
        for b in &rectangles[i + 1..] {
            overlap += a.intersection_area(b);
        }
    }
    overlap
}

/// Overlap as a percentage of total area; 0 when there are no rectangles
pub fn overlap_percentage(rectangles: &[Rect]) -> f64 {
    let area = total_area(rectangles);
    if area == 0 {
        return 0.0;
    }
    (total_overlap(rectangles) as f64 / area as f64) * 100.0
}

/// Percentage of the effective canvas not covered by rectangle area
///
/// The effective canvas spans from the origin to the furthest rectangle
/// edges. An empty set or a zero-area canvas reports 100% white space.
pub fn white_space_percentage(rectangles: &[Rect]) -> f64 {
    if rectangles.is_empty() {
        return 100.0;
    }

    let max_x = rectangles.iter().map(Rect::right).max().unwrap_or(0);
    let max_y = rectangles.iter().map(Rect::bottom).max().unwrap_or(0);
    let canvas_area = max_x * max_y;

    if canvas_area == 0 {
        return 100.0;
    }

    let white_space = canvas_area - total_area(rectangles);
    (white_space as f64 / canvas_area as f64) * 100.0
}

/// Closeness of a value to a reference: 1.0 on an exact match, linear
/// decay to 0 at `DECAY_RANGE_PX` of deviation
fn closeness(value: f64, reference: f64) -> f64 {
    let deviation = (value - reference).abs();
    if deviation < EXACT_EPSILON {
        1.0
    } else {
        1.0 - (deviation / DECAY_RANGE_PX).min(1.0)
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Mean closeness of every rectangle's x and y coordinate to the set means
pub fn alignment_score(rectangles: &[Rect]) -> f64 {
    if rectangles.is_empty() {
        return 1.0;
    }

    let xs: Vec<f64> = rectangles.iter().map(|r| r.x as f64).collect();
    let ys: Vec<f64> = rectangles.iter().map(|r| r.y as f64).collect();
    let mean_x = mean(&xs);
    let mean_y = mean(&ys);

    let scores: Vec<f64> = xs
        .iter()
        .zip(&ys)
        .map(|(x, y)| (closeness(*x, mean_x) + closeness(*y, mean_y)) / 2.0)
        .collect();

    mean(&scores)
}

/// Mean closeness of the sorted x- and y-gaps to their respective mean gap
///
/// Defined as 1.0 when fewer than two rectangles exist.
pub fn spacing_score(rectangles: &[Rect]) -> f64 {
    if rectangles.len() < 2 {
        return 1.0;
    }

    let mut xs: Vec<i64> = rectangles.iter().map(|r| r.x).collect();
    let mut ys: Vec<i64> = rectangles.iter().map(|r| r.y).collect();
    xs.sort_unstable();
    ys.sort_unstable();

    let x_gaps: Vec<f64> = xs.windows(2).map(|w| (w[1] - w[0]) as f64).collect();
    let y_gaps: Vec<f64> = ys.windows(2).map(|w| (w[1] - w[0]) as f64).collect();

    let mean_x_gap = mean(&x_gaps);
    let mean_y_gap = mean(&y_gaps);

    let scores: Vec<f64> = x_gaps
        .iter()
        .map(|gap| closeness(*gap, mean_x_gap))
        .chain(y_gaps.iter().map(|gap| closeness(*gap, mean_y_gap)))
        .collect();

    mean(&scores)
}

/// Mean closeness of every width and height to the mean width and height
pub fn size_uniformity_score(rectangles: &[Rect]) -> f64 {
    if rectangles.is_empty() {
        return 1.0;
    }

    let widths: Vec<f64> = rectangles.iter().map(|r| r.width as f64).collect();
    let heights: Vec<f64> = rectangles.iter().map(|r| r.height as f64).collect();
    let mean_width = mean(&widths);
    let mean_height = mean(&heights);

    let scores: Vec<f64> = widths
        .iter()
        .map(|w| closeness(*w, mean_width))
        .chain(heights.iter().map(|h| closeness(*h, mean_height)))
        .collect();

    mean(&scores)
}

/// Bounding-box width over bounding-box height
///
/// `None` when the set is empty or the bounding height is zero; the
/// sentinel is serialized as `null` rather than crashing on a division.
pub fn horizontal_vertical_ratio(rectangles: &[Rect]) -> Option<f64> {
    if rectangles.is_empty() {
        return None;
    }

    let left = rectangles.iter().map(|r| r.x).min()?;
    let right = rectangles.iter().map(Rect::right).max()?;
    let top = rectangles.iter().map(|r| r.y).min()?;
    let bottom = rectangles.iter().map(Rect::bottom).max()?;

    let height = bottom - top;
    if height == 0 {
        return None;
    }

    Some((right - left) as f64 / height as f64)
}
