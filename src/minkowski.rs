//! Minkowski sums and differences.
//!
//! The pattern is translated (or its negation translated) to every path
//! vertex, adjacent copies are stitched into counter-clockwise
//! quadrilaterals, and the quadrilateral soup is unioned into clean contours.

use crate::errors::{ClipError, Result};
use crate::geom::{is_positive, FillRule, Path64, Paths64};
use crate::sweep::{ClipType, Clipper};

/// Stitch the translated pattern copies into oriented quads; the raw set is
/// the union input. Open paths skip the wrap-around stitching.
fn convolve_quads(pattern: &Path64, path: &Path64, is_sum: bool, is_closed: bool) -> Paths64 {
    let skip = usize::from(!is_closed);
    let pat_len = pattern.len();
    let path_len = path.len();

    // one pattern copy per path vertex
    let copies: Vec<Path64> = path
        .iter()
        .map(|&p| {
            pattern
                .iter()
                .map(|&q| if is_sum { p + q } else { p - q })
                .collect()
        })
        .collect();

    let mut quads = Paths64::with_capacity((path_len - skip) * pat_len);
    let mut g = if is_closed { path_len - 1 } else { 0 };
    for i in skip..path_len {
        let mut h = pat_len - 1;
        for j in 0..pat_len {
            let mut quad = vec![copies[g][h], copies[i][h], copies[i][j], copies[g][j]];
            if !is_positive(&quad) {
                quad.reverse();
            }
            quads.push(quad);
            h = j;
        }
        g = i;
    }
    quads
}

fn union_all(subjects: &Paths64) -> Result<Paths64> {
    let mut clipper = Clipper::new();
    clipper.add_subject(subjects)?;
    let (closed, _open) = clipper.execute(ClipType::Union, FillRule::NonZero)?;
    Ok(closed)
}

/// Minkowski sum of `pattern` swept along `path`.
pub fn minkowski_sum(pattern: &Path64, path: &Path64, is_closed: bool) -> Result<Paths64> {
    if pattern.is_empty() || path.is_empty() {
        return Err(ClipError::EmptyPath);
    }
    union_all(&convolve_quads(pattern, path, true, is_closed))
}

/// Minkowski difference: `path` vertices minus `pattern` vertices.
pub fn minkowski_diff(pattern: &Path64, path: &Path64, is_closed: bool) -> Result<Paths64> {
    if pattern.is_empty() || path.is_empty() {
        return Err(ClipError::EmptyPath);
    }
    union_all(&convolve_quads(pattern, path, false, is_closed))
}

#[cfg(test)]
#[path = "minkowski_tests.rs"]
mod tests;
