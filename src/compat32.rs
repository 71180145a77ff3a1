//! 32-bit mirror of the coordinate-accepting API.
//!
//! Inputs widen losslessly to 64 bits; results narrow back with overflow
//! checking, reporting [`ClipError::ResultOverflow`] when a coordinate no
//! longer fits. The engine itself always runs at 64 bits.

use crate::errors::{ClipError, Result};
use crate::geom::{
    self, FillRule, Path32, Path64, Paths32, Paths64, Point32, Point64, PointPlacement, Rect32,
    Rect64,
};
use crate::offset::{EndType, JoinType, OffsetOptions};
use crate::ops;
use crate::sweep::ClipType;
use crate::tree::PolyTree;

// ---------------------------------------------------------------------------
// Width conversion
// ---------------------------------------------------------------------------

#[inline]
pub fn widen_point(pt: Point32) -> Point64 {
    Point64::new(pt.x as i64, pt.y as i64)
}

pub fn widen_path(path: &Path32) -> Path64 {
    path.iter().map(|&pt| widen_point(pt)).collect()
}

pub fn widen_paths(paths: &Paths32) -> Paths64 {
    paths.iter().map(widen_path).collect()
}

#[inline]
pub fn widen_rect(rect: &Rect32) -> Rect64 {
    Rect64::new(
        rect.left as i64,
        rect.top as i64,
        rect.right as i64,
        rect.bottom as i64,
    )
}

#[inline]
pub fn narrow_point(pt: Point64) -> Result<Point32> {
    let x = i32::try_from(pt.x).map_err(|_| ClipError::ResultOverflow)?;
    let y = i32::try_from(pt.y).map_err(|_| ClipError::ResultOverflow)?;
    Ok(Point32::new(x, y))
}

pub fn narrow_path(path: &Path64) -> Result<Path32> {
    path.iter().map(|&pt| narrow_point(pt)).collect()
}

pub fn narrow_paths(paths: &Paths64) -> Result<Paths32> {
    paths.iter().map(narrow_path).collect()
}

// ---------------------------------------------------------------------------
// Boolean operations
// ---------------------------------------------------------------------------

pub fn boolean_op32(
    clip_type: ClipType,
    fill_rule: FillRule,
    subjects: &Paths32,
    subjects_open: &Paths32,
    clips: &Paths32,
) -> Result<(Paths32, Paths32)> {
    let (closed, open) = ops::boolean_op(
        clip_type,
        fill_rule,
        &widen_paths(subjects),
        &widen_paths(subjects_open),
        &widen_paths(clips),
    )?;
    Ok((narrow_paths(&closed)?, narrow_paths(&open)?))
}

pub fn union32(subjects: &Paths32, clips: &Paths32, fill_rule: FillRule) -> Result<Paths32> {
    narrow_paths(&ops::union_op(&widen_paths(subjects), &widen_paths(clips), fill_rule)?)
}

pub fn intersect32(subjects: &Paths32, clips: &Paths32, fill_rule: FillRule) -> Result<Paths32> {
    narrow_paths(&ops::intersect(&widen_paths(subjects), &widen_paths(clips), fill_rule)?)
}

pub fn difference32(subjects: &Paths32, clips: &Paths32, fill_rule: FillRule) -> Result<Paths32> {
    narrow_paths(&ops::difference(&widen_paths(subjects), &widen_paths(clips), fill_rule)?)
}

pub fn xor32(subjects: &Paths32, clips: &Paths32, fill_rule: FillRule) -> Result<Paths32> {
    narrow_paths(&ops::xor(&widen_paths(subjects), &widen_paths(clips), fill_rule)?)
}

/// 32-bit polygon forest node.
#[derive(Debug, Clone)]
pub struct PolyNode32 {
    pub parent: Option<usize>,
    pub children: Vec<usize>,
    pub contour: Path32,
}

/// 32-bit polygon forest (root at index 0, no contour).
#[derive(Debug, Clone)]
pub struct PolyTree32 {
    pub nodes: Vec<PolyNode32>,
}

fn narrow_tree(tree: &PolyTree) -> Result<PolyTree32> {
    let mut nodes = Vec::with_capacity(tree.nodes.len());
    for (i, node) in tree.nodes.iter().enumerate() {
        nodes.push(PolyNode32 {
            parent: node.parent(),
            children: node.children().to_vec(),
            contour: if i == PolyTree::ROOT {
                Path32::new()
            } else {
                narrow_path(node.contour())?
            },
        });
    }
    Ok(PolyTree32 { nodes })
}

pub fn boolean_op_tree32(
    clip_type: ClipType,
    fill_rule: FillRule,
    subjects: &Paths32,
    subjects_open: &Paths32,
    clips: &Paths32,
) -> Result<(PolyTree32, Paths32)> {
    let (tree, open) = ops::boolean_op_tree(
        clip_type,
        fill_rule,
        &widen_paths(subjects),
        &widen_paths(subjects_open),
        &widen_paths(clips),
    )?;
    Ok((narrow_tree(&tree)?, narrow_paths(&open)?))
}

// ---------------------------------------------------------------------------
// Offsetting, rect clipping, Minkowski
// ---------------------------------------------------------------------------

pub fn inflate_paths32(
    paths: &Paths32,
    delta: f64,
    join_type: JoinType,
    end_type: EndType,
    options: OffsetOptions,
) -> Result<Paths32> {
    narrow_paths(&ops::inflate_paths(
        &widen_paths(paths),
        delta,
        join_type,
        end_type,
        options,
    )?)
}

pub fn rect_clip32(rect: &Rect32, paths: &Paths32) -> Result<Paths32> {
    narrow_paths(&ops::rect_clip(&widen_rect(rect), &widen_paths(paths)))
}

pub fn rect_clip_lines32(rect: &Rect32, paths: &Paths32) -> Result<Paths32> {
    narrow_paths(&ops::rect_clip_lines(&widen_rect(rect), &widen_paths(paths)))
}

pub fn minkowski_sum32(pattern: &Path32, path: &Path32, is_closed: bool) -> Result<Paths32> {
    narrow_paths(&crate::minkowski::minkowski_sum(
        &widen_path(pattern),
        &widen_path(path),
        is_closed,
    )?)
}

pub fn minkowski_diff32(pattern: &Path32, path: &Path32, is_closed: bool) -> Result<Paths32> {
    narrow_paths(&crate::minkowski::minkowski_diff(
        &widen_path(pattern),
        &widen_path(path),
        is_closed,
    )?)
}

// ---------------------------------------------------------------------------
// Simplification and measurement
// ---------------------------------------------------------------------------

pub fn simplify_path32(path: &Path32, epsilon: f64, is_closed: bool) -> Result<Path32> {
    narrow_path(&ops::simplify_path(&widen_path(path), epsilon, is_closed)?)
}

pub fn simplify_paths32(paths: &Paths32, epsilon: f64, is_closed: bool) -> Result<Paths32> {
    narrow_paths(&ops::simplify_paths(&widen_paths(paths), epsilon, is_closed)?)
}

pub fn rdp_path32(path: &Path32, epsilon: f64) -> Result<Path32> {
    narrow_path(&ops::rdp_path(&widen_path(path), epsilon)?)
}

pub fn trim_collinear32(path: &Path32, is_open: bool) -> Result<Path32> {
    narrow_path(&ops::trim_collinear(&widen_path(path), is_open))
}

pub fn area32(path: &Path32) -> f64 {
    geom::area(&widen_path(path))
}

pub fn is_positive32(path: &Path32) -> bool {
    area32(path) > 0.0
}

pub fn bounds32(path: &Path32) -> Rect32 {
    let mut r = Rect32::inverted();
    for pt in path {
        if pt.x < r.left {
            r.left = pt.x;
        }
        if pt.x > r.right {
            r.right = pt.x;
        }
        if pt.y < r.top {
            r.top = pt.y;
        }
        if pt.y > r.bottom {
            r.bottom = pt.y;
        }
    }
    r
}

pub fn point_in_polygon32(pt: Point32, path: &Path32, rule: FillRule) -> PointPlacement {
    geom::point_in_polygon_rule(widen_point(pt), &widen_path(path), rule)
}

// ---------------------------------------------------------------------------
// Constructors
// ---------------------------------------------------------------------------

pub fn translate_path32(path: &Path32, dx: i32, dy: i32) -> Result<Path32> {
    let moved = geom::translate_path(&widen_path(path), dx as i64, dy as i64);
    narrow_path(&moved)
}

pub fn scale_path32(path: &Path32, sx: f64, sy: f64) -> Result<Path32> {
    narrow_path(&geom::scale_path(&widen_path(path), sx, sy))
}

pub fn rotate_path32(path: &Path32, origin: Point32, radians: f64) -> Result<Path32> {
    narrow_path(&geom::rotate_path(&widen_path(path), widen_point(origin), radians))
}

pub fn ellipse32(center: Point32, radius_x: f64, radius_y: f64, steps: usize) -> Result<Path32> {
    narrow_path(&ops::ellipse(widen_point(center), radius_x, radius_y, steps)?)
}

pub fn star_polygon32(
    center: Point32,
    outer_radius: f64,
    inner_radius: f64,
    points: usize,
) -> Result<Path32> {
    narrow_path(&ops::star_polygon(
        widen_point(center),
        outer_radius,
        inner_radius,
        points,
    )?)
}

#[cfg(test)]
#[path = "compat32_tests.rs"]
mod tests;
