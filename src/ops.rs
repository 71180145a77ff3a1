//! Public operations: boolean clipping, offsetting, rectangle clipping,
//! simplification and the small constructors. All parameter validation
//! happens here; the layers below trust their inputs.

use crate::errors::{ClipError, Result};
use crate::geom::{
    ellipse as geom_ellipse, perpendic_dist_sqrd, round_lattice, sqr, FillRule, Path64, Paths64,
    Point64, Rect64,
};
use crate::offset::{EndType, JoinType, OffsetOptions, PathOffsetter};
use crate::rectclip::{RectClipper, RectLineClipper};
use crate::sweep::{ClipType, Clipper};
use crate::tree::PolyTree;

// ---------------------------------------------------------------------------
// Boolean operations
// ---------------------------------------------------------------------------

/// The general boolean operation: closed and open subjects against closed
/// clips, returning (closed, open) solution paths.
pub fn boolean_op(
    clip_type: ClipType,
    fill_rule: FillRule,
    subjects: &Paths64,
    subjects_open: &Paths64,
    clips: &Paths64,
) -> Result<(Paths64, Paths64)> {
    let mut clipper = Clipper::new();
    clipper.add_subject(subjects)?;
    clipper.add_open_subject(subjects_open)?;
    clipper.add_clip(clips)?;
    clipper.execute(clip_type, fill_rule)
}

/// Boolean operation returning the closed solution as a polygon forest plus
/// any residual open paths.
pub fn boolean_op_tree(
    clip_type: ClipType,
    fill_rule: FillRule,
    subjects: &Paths64,
    subjects_open: &Paths64,
    clips: &Paths64,
) -> Result<(PolyTree, Paths64)> {
    let mut clipper = Clipper::new();
    clipper.add_subject(subjects)?;
    clipper.add_open_subject(subjects_open)?;
    clipper.add_clip(clips)?;
    clipper.execute_tree(clip_type, fill_rule)
}

fn closed_only(
    clip_type: ClipType,
    fill_rule: FillRule,
    subjects: &Paths64,
    clips: &Paths64,
) -> Result<Paths64> {
    let (closed, _open) = boolean_op(clip_type, fill_rule, subjects, &Paths64::new(), clips)?;
    Ok(closed)
}

pub fn union_op(subjects: &Paths64, clips: &Paths64, fill_rule: FillRule) -> Result<Paths64> {
    closed_only(ClipType::Union, fill_rule, subjects, clips)
}

/// Union of the subjects alone (no clip set).
pub fn union_self(subjects: &Paths64, fill_rule: FillRule) -> Result<Paths64> {
    closed_only(ClipType::Union, fill_rule, subjects, &Paths64::new())
}

pub fn intersect(subjects: &Paths64, clips: &Paths64, fill_rule: FillRule) -> Result<Paths64> {
    closed_only(ClipType::Intersection, fill_rule, subjects, clips)
}

pub fn difference(subjects: &Paths64, clips: &Paths64, fill_rule: FillRule) -> Result<Paths64> {
    closed_only(ClipType::Difference, fill_rule, subjects, clips)
}

pub fn xor(subjects: &Paths64, clips: &Paths64, fill_rule: FillRule) -> Result<Paths64> {
    closed_only(ClipType::Xor, fill_rule, subjects, clips)
}

// ---------------------------------------------------------------------------
// Offsetting
// ---------------------------------------------------------------------------

/// Inflate (delta > 0) or deflate (delta < 0) paths.
pub fn inflate_paths(
    paths: &Paths64,
    delta: f64,
    join_type: JoinType,
    end_type: EndType,
    options: OffsetOptions,
) -> Result<Paths64> {
    options.validate()?;
    if !delta.is_finite() {
        return Err(ClipError::InvalidParameter);
    }
    if delta == 0.0 {
        return Ok(paths.clone());
    }
    let mut offsetter = PathOffsetter::new(options);
    offsetter.add_paths(paths, join_type, end_type);
    offsetter.execute(delta)
}

// ---------------------------------------------------------------------------
// Rectangle clipping
// ---------------------------------------------------------------------------

/// Clip closed paths against an axis-aligned rectangle.
pub fn rect_clip(rect: &Rect64, paths: &Paths64) -> Paths64 {
    if rect.is_empty() || paths.is_empty() {
        return Paths64::new();
    }
    RectClipper::new(*rect).execute(paths)
}

/// Clip open polylines against an axis-aligned rectangle.
pub fn rect_clip_lines(rect: &Rect64, paths: &Paths64) -> Paths64 {
    if rect.is_empty() || paths.is_empty() {
        return Paths64::new();
    }
    RectLineClipper::new(*rect).execute(paths)
}

/// As [`rect_clip`], with the rectangle given as a 4-vertex path
/// ([`ClipError::InvalidRectangle`] otherwise).
pub fn rect_clip_path(rect_path: &Path64, paths: &Paths64) -> Result<Paths64> {
    let rect = Rect64::try_from_path(rect_path)?;
    Ok(rect_clip(&rect, paths))
}

/// As [`rect_clip_lines`], with the rectangle given as a 4-vertex path.
pub fn rect_clip_lines_path(rect_path: &Path64, paths: &Paths64) -> Result<Paths64> {
    let rect = Rect64::try_from_path(rect_path)?;
    Ok(rect_clip_lines(&rect, paths))
}

// ---------------------------------------------------------------------------
// Simplification
// ---------------------------------------------------------------------------

fn next_live(mut i: usize, high: usize, gone: &[bool]) -> usize {
    i += 1;
    while i <= high && gone[i] {
        i += 1;
    }
    if i <= high {
        return i;
    }
    i = 0;
    while gone[i] {
        i += 1;
    }
    i
}

fn prior_live(i: usize, high: usize, gone: &[bool]) -> usize {
    let mut i = if i == 0 { high } else { i - 1 };
    while i > 0 && gone[i] {
        i -= 1;
    }
    if !gone[i] {
        return i;
    }
    i = high;
    while gone[i] {
        i -= 1;
    }
    i
}

/// Iteratively drop the vertex whose perpendicular distance to the chord of
/// its two live neighbors is smallest, while that distance stays within
/// `epsilon`. Requires `epsilon > 0`.
pub fn simplify_path(path: &Path64, epsilon: f64, is_closed: bool) -> Result<Path64> {
    if epsilon <= 0.0 || !epsilon.is_finite() {
        return Err(ClipError::InvalidParameter);
    }
    let len = path.len();
    if len < 4 {
        return Ok(path.clone());
    }
    let high = len - 1;
    let eps_sqr = sqr(epsilon);

    let mut gone = vec![false; len];
    let mut dist_sqr = vec![0.0f64; len];

    if is_closed {
        dist_sqr[0] = perpendic_dist_sqrd(path[0], path[high], path[1]);
        dist_sqr[high] = perpendic_dist_sqrd(path[high], path[0], path[high - 1]);
    } else {
        // endpoints of open paths are never dropped
        dist_sqr[0] = f64::MAX;
        dist_sqr[high] = f64::MAX;
    }
    for i in 1..high {
        dist_sqr[i] = perpendic_dist_sqrd(path[i], path[i - 1], path[i + 1]);
    }

    let mut curr = 0usize;
    loop {
        if dist_sqr[curr] > eps_sqr {
            let start = curr;
            loop {
                curr = next_live(curr, high, &gone);
                if curr == start || dist_sqr[curr] <= eps_sqr {
                    break;
                }
            }
            if curr == start {
                break;
            }
        }

        let prior = prior_live(curr, high, &gone);
        let mut next = next_live(curr, high, &gone);
        if next == prior {
            break;
        }

        // drop the worse of (curr, next) so chains collapse inward
        let prior2;
        let anchor;
        if dist_sqr[next] < dist_sqr[curr] {
            anchor = curr;
            curr = next;
            next = next_live(next, high, &gone);
            prior2 = prior_live(anchor, high, &gone);
        } else {
            anchor = prior;
            prior2 = prior_live(prior, high, &gone);
        }

        gone[curr] = true;
        curr = next;
        next = next_live(next, high, &gone);

        if is_closed || (curr != high && curr != 0) {
            dist_sqr[curr] = perpendic_dist_sqrd(path[curr], path[anchor], path[next]);
        }
        if is_closed || (anchor != 0 && anchor != high) {
            dist_sqr[anchor] = perpendic_dist_sqrd(path[anchor], path[prior2], path[curr]);
        }
    }

    Ok(path
        .iter()
        .enumerate()
        .filter(|(i, _)| !gone[*i])
        .map(|(_, pt)| *pt)
        .collect())
}

pub fn simplify_paths(paths: &Paths64, epsilon: f64, is_closed: bool) -> Result<Paths64> {
    paths
        .iter()
        .map(|p| simplify_path(p, epsilon, is_closed))
        .collect()
}

fn rdp_mark(path: &Path64, begin: usize, end: usize, eps_sqrd: f64, keep: &mut [bool]) {
    let mut end = end;
    while end > begin && path[begin] == path[end] {
        keep[end] = false;
        end -= 1;
    }

    let mut max_d = 0.0;
    let mut split = 0;
    for i in (begin + 1)..end {
        let d = perpendic_dist_sqrd(path[i], path[begin], path[end]);
        if d > max_d {
            max_d = d;
            split = i;
        }
    }
    if max_d <= eps_sqrd {
        return;
    }
    keep[split] = true;
    if split > begin + 1 {
        rdp_mark(path, begin, split, eps_sqrd, keep);
    }
    if split < end - 1 {
        rdp_mark(path, split, end, eps_sqrd, keep);
    }
}

/// Ramer-Douglas-Peucker simplification; keeps the endpoints and every
/// vertex further than `epsilon` from the kept chords.
pub fn rdp_path(path: &Path64, epsilon: f64) -> Result<Path64> {
    if epsilon <= 0.0 || !epsilon.is_finite() {
        return Err(ClipError::InvalidParameter);
    }
    let len = path.len();
    if len < 5 {
        return Ok(path.clone());
    }
    let mut keep = vec![false; len];
    keep[0] = true;
    keep[len - 1] = true;
    rdp_mark(path, 0, len - 1, sqr(epsilon), &mut keep);
    Ok(path
        .iter()
        .enumerate()
        .filter(|(i, _)| keep[*i])
        .map(|(_, pt)| *pt)
        .collect())
}

pub fn rdp_paths(paths: &Paths64, epsilon: f64) -> Result<Paths64> {
    paths.iter().map(|p| rdp_path(p, epsilon)).collect()
}

/// Remove exactly-collinear vertices (and spikes) from a path.
pub fn trim_collinear(path: &Path64, is_open: bool) -> Path64 {
    use crate::geom::is_collinear;
    let len = path.len();
    if len < 3 {
        if !is_open || len < 2 || path[0] == path[1] {
            return Path64::new();
        }
        return path.clone();
    }

    let mut first = 0usize;
    let mut stop = len - 1;
    if !is_open {
        while first != stop && is_collinear(path[stop], path[first], path[first + 1]) {
            first += 1;
        }
        while first != stop && is_collinear(path[stop - 1], path[stop], path[first]) {
            stop -= 1;
        }
        if first == stop {
            return Path64::new();
        }
    }

    let mut out = Path64::with_capacity(len);
    let mut prev = first;
    out.push(path[prev]);
    for i in (first + 1)..stop {
        if !is_collinear(path[prev], path[i], path[i + 1]) {
            prev = i;
            out.push(path[prev]);
        }
    }

    if is_open || !is_collinear(path[prev], path[stop], out[0]) {
        out.push(path[stop]);
    } else {
        while out.len() > 2
            && is_collinear(out[out.len() - 1], out[out.len() - 2], out[0])
        {
            out.pop();
        }
        if out.len() < 3 {
            return Path64::new();
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Constructors
// ---------------------------------------------------------------------------

/// Ellipse centered at `center`; `steps == 0` derives a count from the radii.
pub fn ellipse(center: Point64, radius_x: f64, radius_y: f64, steps: usize) -> Result<Path64> {
    if radius_x <= 0.0 || radius_y < 0.0 {
        return Err(ClipError::InvalidParameter);
    }
    Ok(geom_ellipse(center, radius_x, radius_y, steps))
}

/// A `points`-armed star alternating between the outer and inner radius.
pub fn star_polygon(
    center: Point64,
    outer_radius: f64,
    inner_radius: f64,
    points: usize,
) -> Result<Path64> {
    if outer_radius <= 0.0 || inner_radius <= 0.0 || inner_radius >= outer_radius {
        return Err(ClipError::InvalidParameter);
    }
    if points < 3 {
        return Err(ClipError::InvalidParameter);
    }
    let step = std::f64::consts::PI / points as f64;
    let mut path = Path64::with_capacity(points * 2);
    for i in 0..points * 2 {
        let r = if i & 1 == 0 { outer_radius } else { inner_radius };
        let angle = step * i as f64 - std::f64::consts::FRAC_PI_2;
        path.push(Point64::new(
            center.x + round_lattice(r * angle.cos()),
            center.y + round_lattice(r * angle.sin()),
        ));
    }
    Ok(path)
}

#[cfg(test)]
#[path = "ops_tests.rs"]
mod tests;
