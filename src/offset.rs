//! Polygon and polyline offsetting (inflation / deflation).
//!
//! Raw offset contours are produced by emitting join geometry at every vertex
//! and cap geometry at open-path ends; the raw output self-overlaps at
//! concave joins, so it is routed back through the sweep engine as a
//! Positive-fill union which absorbs the negative slivers.

use tracing::debug;

use crate::errors::{ClipError, Result};
use crate::geom::{
    area, dedup_path, ellipse, round_lattice, FillRule, Path64, Paths64, Point64, PointF, Rect64,
};
use crate::sweep::{ClipType, Clipper};

const FLOAT_EPSILON: f64 = 1e-12;

/// With no explicit arc tolerance the chord error defaults to this fraction
/// of the offset radius; small enough for smooth arcs, large enough to avoid
/// degenerate segment lengths.
const DEFAULT_ARC_FRACTION: f64 = 0.002;

/// How offset contours connect at each vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinType {
    /// Two points at the exact offset distance; the cheapest join.
    Bevel,
    /// Squared corners at the offset distance.
    Square,
    /// Corner arcs bounded by the arc tolerance.
    Round,
    /// Sharp corners, limited by the miter limit with square fallback.
    Miter,
}

impl JoinType {
    pub fn from_code(code: u8) -> Result<Self> {
        match code {
            0 => Ok(JoinType::Bevel),
            1 => Ok(JoinType::Square),
            2 => Ok(JoinType::Round),
            3 => Ok(JoinType::Miter),
            _ => Err(ClipError::InvalidJoinType),
        }
    }
}

/// How path ends are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndType {
    /// Closed contour: one side only.
    Polygon,
    /// Open path offset on both sides and closed into a loop.
    Joined,
    /// Open path with blunt ends.
    Butt,
    /// Open path with extended square ends.
    Square,
    /// Open path with semicircular ends.
    Round,
}

impl EndType {
    pub fn from_code(code: u8) -> Result<Self> {
        match code {
            0 => Ok(EndType::Polygon),
            1 => Ok(EndType::Joined),
            2 => Ok(EndType::Butt),
            3 => Ok(EndType::Square),
            4 => Ok(EndType::Round),
            _ => Err(ClipError::InvalidEndType),
        }
    }
}

/// Offsetting parameters; validated at the public boundary.
#[derive(Debug, Clone, Copy)]
pub struct OffsetOptions {
    /// Cap on miter extension, as a multiple of the offset distance (>= 1).
    pub miter_limit: f64,
    /// Maximum chord error when tessellating arcs (> 0).
    pub arc_tolerance: f64,
    pub preserve_collinear: bool,
    pub reverse_solution: bool,
}

impl Default for OffsetOptions {
    fn default() -> Self {
        Self {
            miter_limit: 2.0,
            arc_tolerance: 0.25,
            preserve_collinear: false,
            reverse_solution: false,
        }
    }
}

impl OffsetOptions {
    pub fn validate(&self) -> Result<()> {
        if self.miter_limit < 1.0 || !self.miter_limit.is_finite() {
            return Err(ClipError::InvalidOptions);
        }
        if self.arc_tolerance <= 0.0 || !self.arc_tolerance.is_finite() {
            return Err(ClipError::InvalidOptions);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// float-vector helpers
// ---------------------------------------------------------------------------

#[inline]
fn hypot_xy(x: f64, y: f64) -> f64 {
    (x * x + y * y).sqrt()
}

/// Unit normal of the edge `a -> b`, pointing to its left.
fn unit_normal(a: Point64, b: Point64) -> PointF {
    if a == b {
        return PointF::new(0.0, 0.0);
    }
    let dx = (b.x - a.x) as f64;
    let dy = (b.y - a.y) as f64;
    let inv = 1.0 / hypot_xy(dx, dy);
    PointF::new(dy * inv, -dx * inv)
}

fn normalize(v: PointF) -> PointF {
    let h = hypot_xy(v.x, v.y);
    if h.abs() < 0.001 {
        return PointF::new(0.0, 0.0);
    }
    let inv = 1.0 / h;
    PointF::new(v.x * inv, v.y * inv)
}

#[inline]
fn avg_unit_vector(a: PointF, b: PointF) -> PointF {
    normalize(PointF::new(a.x + b.x, a.y + b.y))
}

#[inline]
fn cross_f(a: PointF, b: PointF) -> f64 {
    a.y * b.x - b.y * a.x
}

#[inline]
fn dot_f(a: PointF, b: PointF) -> f64 {
    a.x * b.x + a.y * b.y
}

#[inline]
fn lattice(x: f64, y: f64) -> Point64 {
    Point64::new(round_lattice(x), round_lattice(y))
}

/// `pt` displaced `delta` units along a unit normal, on the lattice.
#[inline]
fn perpendic(pt: Point64, norm: PointF, delta: f64) -> Point64 {
    lattice(pt.x as f64 + norm.x * delta, pt.y as f64 + norm.y * delta)
}

/// Same displacement without rounding.
#[inline]
fn perpendic_f(pt: Point64, norm: PointF, delta: f64) -> PointF {
    PointF::new(pt.x as f64 + norm.x * delta, pt.y as f64 + norm.y * delta)
}

#[inline]
fn reflect(pt: PointF, pivot: PointF) -> PointF {
    PointF::new(pivot.x + (pivot.x - pt.x), pivot.y + (pivot.y - pt.y))
}

/// Float-precision line intersection for square-join construction.
fn intersect_f(p1: PointF, p2: PointF, p3: PointF, p4: PointF) -> PointF {
    let dy1 = p2.y - p1.y;
    let dx1 = p2.x - p1.x;
    let dy2 = p4.y - p3.y;
    let dx2 = p4.x - p3.x;
    let det = dy1 * dx2 - dy2 * dx1;
    if det == 0.0 {
        return p1;
    }
    let t = ((p1.x - p3.x) * dy2 - (p1.y - p3.y) * dx2) / det;
    PointF::new(p1.x + t * dx1, p1.y + t * dy1)
}

/// Index and orientation of the bottommost closed path in a group; the
/// lowest path must be an outer contour, so a negative area there means the
/// entire group is wound inside-out.
fn lowest_path_info(paths: &Paths64) -> (Option<usize>, bool) {
    let mut idx = None;
    let mut bot = Point64::new(i64::MAX, i64::MIN);
    let mut negative = false;
    for (i, path) in paths.iter().enumerate() {
        let mut a = f64::MAX;
        for pt in path {
            if pt.y < bot.y || (pt.y == bot.y && pt.x >= bot.x) {
                continue;
            }
            if a == f64::MAX {
                a = area(path);
                if a == 0.0 {
                    break; // degenerate path cannot anchor orientation
                }
                negative = a < 0.0;
            }
            idx = Some(i);
            bot = *pt;
        }
    }
    (idx, negative)
}

// ---------------------------------------------------------------------------
// Groups
// ---------------------------------------------------------------------------

struct Group {
    paths: Paths64,
    lowest_idx: Option<usize>,
    is_reversed: bool,
    join_type: JoinType,
    end_type: EndType,
}

impl Group {
    fn new(paths: &Paths64, join_type: JoinType, end_type: EndType) -> Self {
        let mut paths = paths.clone();
        let closed = matches!(end_type, EndType::Polygon | EndType::Joined);
        for p in paths.iter_mut() {
            dedup_path(p, closed);
        }

        let (lowest_idx, is_reversed) = if end_type == EndType::Polygon {
            let (idx, negative) = lowest_path_info(&paths);
            // negating delta once is much cheaper than reversing every path
            (idx, idx.is_some() && negative)
        } else {
            (None, false)
        };

        Group { paths, lowest_idx, is_reversed, join_type, end_type }
    }
}

// ---------------------------------------------------------------------------
// The offsetter
// ---------------------------------------------------------------------------

/// Path offsetter; owns its configuration per call, shares nothing.
pub struct PathOffsetter {
    options: OffsetOptions,
    groups: Vec<Group>,

    delta: f64,
    group_delta: f64,
    miter_threshold: f64,
    steps_per_rad: f64,
    step_sin: f64,
    step_cos: f64,
    join_type: JoinType,
    end_type: EndType,
    norms: Vec<PointF>,
    path_out: Path64,
    solution: Paths64,
}

impl PathOffsetter {
    pub fn new(options: OffsetOptions) -> Self {
        Self {
            options,
            groups: Vec::new(),
            delta: 0.0,
            group_delta: 0.0,
            miter_threshold: 0.0,
            steps_per_rad: 0.0,
            step_sin: 0.0,
            step_cos: 0.0,
            join_type: JoinType::Bevel,
            end_type: EndType::Polygon,
            norms: Vec::new(),
            path_out: Path64::new(),
            solution: Paths64::new(),
        }
    }

    pub fn add_path(&mut self, path: &Path64, join_type: JoinType, end_type: EndType) {
        self.add_paths(&vec![path.clone()], join_type, end_type);
    }

    pub fn add_paths(&mut self, paths: &Paths64, join_type: JoinType, end_type: EndType) {
        if paths.is_empty() {
            return;
        }
        self.groups.push(Group::new(paths, join_type, end_type));
    }

    pub fn clear(&mut self) {
        self.groups.clear();
        self.norms.clear();
    }

    /// Offset every added group by `delta` and return the cleaned result.
    pub fn execute(&mut self, delta: f64) -> Result<Paths64> {
        self.solution.clear();
        if self.groups.is_empty() {
            return Ok(Paths64::new());
        }

        if delta.abs() < 0.5 {
            // the offset would vanish in rounding: hand back the input
            for group in &self.groups {
                self.solution.extend(group.paths.iter().cloned());
            }
            return Ok(std::mem::take(&mut self.solution));
        }

        self.delta = delta;
        self.miter_threshold = if self.options.miter_limit <= 1.0 {
            2.0
        } else {
            2.0 / (self.options.miter_limit * self.options.miter_limit)
        };

        for g in 0..self.groups.len() {
            debug!(
                group = g,
                join = ?self.groups[g].join_type,
                end = ?self.groups[g].end_type,
                paths = self.groups[g].paths.len(),
                "offset group"
            );
            self.offset_group(g);
        }
        if self.solution.is_empty() {
            return Ok(Paths64::new());
        }

        let reversed = self.groups_reversed();
        // union away the self-intersections the joins introduced
        let mut clipper = Clipper::new();
        clipper.set_preserve_collinear(self.options.preserve_collinear);
        clipper.set_reverse_solution(self.options.reverse_solution != reversed);
        clipper.add_subject(&self.solution)?;
        let fill = if reversed { FillRule::Negative } else { FillRule::Positive };
        let (closed, _open) = clipper.execute(ClipType::Union, fill)?;
        Ok(closed)
    }

    /// Orientation is assumed consistent across groups, so the first
    /// polygon group decides.
    fn groups_reversed(&self) -> bool {
        for g in &self.groups {
            if g.end_type == EndType::Polygon {
                return g.is_reversed;
            }
        }
        false
    }

    // -- per-group machinery --------------------------------------------

    fn build_normals(&mut self, path: &Path64) {
        self.norms.clear();
        if path.is_empty() {
            return;
        }
        self.norms.reserve(path.len());
        for w in path.windows(2) {
            self.norms.push(unit_normal(w[0], w[1]));
        }
        self.norms.push(unit_normal(path[path.len() - 1], path[0]));
    }

    fn set_round_steps(&mut self, abs_delta: f64) {
        // steps per full circle for the permitted chord error
        let arc_tol = if self.options.arc_tolerance > FLOAT_EPSILON {
            abs_delta.min(self.options.arc_tolerance)
        } else {
            abs_delta * DEFAULT_ARC_FRACTION
        };
        let steps_per_360 = (std::f64::consts::PI / (1.0 - arc_tol / abs_delta).acos())
            .min(abs_delta * std::f64::consts::PI);
        self.step_sin = (2.0 * std::f64::consts::PI / steps_per_360).sin();
        self.step_cos = (2.0 * std::f64::consts::PI / steps_per_360).cos();
        if self.group_delta < 0.0 {
            self.step_sin = -self.step_sin;
        }
        self.steps_per_rad = steps_per_360 / (2.0 * std::f64::consts::PI);
    }

    fn offset_group(&mut self, g: usize) {
        let end_type = self.groups[g].end_type;
        let join_type = self.groups[g].join_type;
        let is_reversed = self.groups[g].is_reversed;
        let lowest = self.groups[g].lowest_idx;

        if end_type == EndType::Polygon {
            // a 2-point "polygon" is offset as a degenerate 180-degree loop
            if lowest.is_none() {
                self.delta = self.delta.abs();
            }
            self.group_delta = if is_reversed { -self.delta } else { self.delta };
        } else {
            self.group_delta = self.delta.abs();
        }
        let abs_delta = self.group_delta.abs();
        self.join_type = join_type;
        self.end_type = end_type;

        if join_type == JoinType::Round || end_type == EndType::Round {
            self.set_round_steps(abs_delta);
        }

        for p in 0..self.groups[g].paths.len() {
            let path = self.groups[g].paths[p].clone();
            self.path_out.clear();

            if path.len() == 1 {
                if abs_delta < 1.0 {
                    continue;
                }
                // a lone point swells into a circle or a square
                let pt = path[0];
                if join_type == JoinType::Round {
                    let steps = (self.steps_per_rad * 2.0 * std::f64::consts::PI).ceil() as usize;
                    self.path_out = ellipse(pt, abs_delta, abs_delta, steps);
                } else {
                    let d = abs_delta.ceil() as i64;
                    self.path_out = Rect64::new(pt.x - d, pt.y - d, pt.x + d, pt.y + d).as_path();
                }
                let out = std::mem::take(&mut self.path_out);
                self.solution.push(out);
                continue;
            }

            if path.len() == 2 && end_type == EndType::Joined {
                self.end_type = if join_type == JoinType::Round {
                    EndType::Round
                } else {
                    EndType::Square
                };
            }

            self.build_normals(&path);
            match self.end_type {
                EndType::Polygon => self.offset_polygon(&path),
                EndType::Joined => self.offset_open_joined(&path),
                _ => self.offset_open_path(&path),
            }
        }
    }

    fn offset_polygon(&mut self, path: &Path64) {
        self.path_out.clear();
        if path.is_empty() {
            return;
        }
        let mut k = path.len() - 1;
        for j in 0..path.len() {
            self.offset_point(path, j, k);
            k = j;
        }
        let out = std::mem::take(&mut self.path_out);
        self.solution.push(out);
    }

    fn offset_open_joined(&mut self, path: &Path64) {
        self.offset_polygon(path);

        // second pass around the loop: reversed path, rotated and negated
        // normals so each edge keeps an outward-facing normal
        self.norms.reverse();
        let first = self.norms.remove(0);
        self.norms.push(first);
        for n in self.norms.iter_mut() {
            *n = PointF::new(-n.x, -n.y);
        }

        let reversed: Path64 = path.iter().rev().copied().collect();
        self.offset_polygon(&reversed);
    }

    fn offset_open_path(&mut self, path: &Path64) {
        self.path_out.clear();
        let high = path.len() - 1;

        // start cap
        match self.end_type {
            EndType::Butt => self.emit_bevel(path, 0, 0),
            EndType::Round => self.emit_round(path, 0, 0, std::f64::consts::PI),
            _ => self.emit_square(path, 0, 0),
        }

        // left side, forward
        let mut k = 0;
        for j in 1..high {
            self.offset_point(path, j, k);
            k = j;
        }

        // reverse the normals for the return side
        for i in (1..=high).rev() {
            self.norms[i] = PointF::new(-self.norms[i - 1].x, -self.norms[i - 1].y);
        }
        self.norms[0] = self.norms[high];

        // end cap
        match self.end_type {
            EndType::Butt => self.emit_bevel(path, high, high),
            EndType::Round => self.emit_round(path, high, high, std::f64::consts::PI),
            _ => self.emit_square(path, high, high),
        }

        // right side, backward
        let mut k = high;
        for j in (1..high).rev() {
            self.offset_point(path, j, k);
            k = j;
        }

        let out = std::mem::take(&mut self.path_out);
        self.solution.push(out);
    }

    /// Join emission for the corner at `path[j]`; `k` is the previous vertex
    /// (j == k marks a cap at a degenerate corner).
    fn offset_point(&mut self, path: &Path64, j: usize, k: usize) {
        if path[j] == path[k] {
            return;
        }

        let sin_a = cross_f(self.norms[j], self.norms[k]).clamp(-1.0, 1.0);
        let cos_a = dot_f(self.norms[j], self.norms[k]);

        if self.group_delta.abs() <= FLOAT_EPSILON {
            self.path_out.push(path[j]);
            return;
        }

        if cos_a > -0.999 && sin_a * self.group_delta < 0.0 {
            // concave: three points bracketing the original vertex carve a
            // negative sliver that the cleanup union removes, which also
            // erases any over-shrunk path reversals
            self.path_out.push(perpendic(path[j], self.norms[k], self.group_delta));
            self.path_out.push(path[j]);
            self.path_out.push(perpendic(path[j], self.norms[j], self.group_delta));
        } else if cos_a > 0.999 && self.join_type != JoinType::Round {
            // nearly straight: a miter is exact enough
            self.emit_miter(path, j, k, cos_a);
        } else {
            match self.join_type {
                JoinType::Miter => {
                    if cos_a > self.miter_threshold - 1.0 {
                        self.emit_miter(path, j, k, cos_a);
                    } else {
                        self.emit_square(path, j, k);
                    }
                }
                JoinType::Round => self.emit_round(path, j, k, sin_a.atan2(cos_a)),
                JoinType::Bevel => self.emit_bevel(path, j, k),
                JoinType::Square => self.emit_square(path, j, k),
            }
        }
    }

    fn emit_bevel(&mut self, path: &Path64, j: usize, k: usize) {
        if j == k {
            let abs_delta = self.group_delta.abs();
            self.path_out.push(perpendic(path[j], self.norms[j], -abs_delta));
            self.path_out.push(perpendic(path[j], self.norms[j], abs_delta));
        } else {
            self.path_out.push(perpendic(path[j], self.norms[k], self.group_delta));
            self.path_out.push(perpendic(path[j], self.norms[j], self.group_delta));
        }
    }

    fn emit_square(&mut self, path: &Path64, j: usize, k: usize) {
        let vec = if j == k {
            PointF::new(self.norms[j].y, -self.norms[j].x)
        } else {
            avg_unit_vector(
                PointF::new(-self.norms[k].y, self.norms[k].x),
                PointF::new(self.norms[j].y, -self.norms[j].x),
            )
        };
        let abs_delta = self.group_delta.abs();

        // the original vertex pushed out along the averaged direction
        let ptq = PointF::new(
            path[j].x as f64 + abs_delta * vec.x,
            path[j].y as f64 + abs_delta * vec.y,
        );
        let pt1 = PointF::new(
            ptq.x + self.group_delta * vec.y,
            ptq.y + self.group_delta * -vec.x,
        );
        let pt2 = PointF::new(
            ptq.x + self.group_delta * -vec.y,
            ptq.y + self.group_delta * vec.x,
        );
        let pt3 = perpendic_f(path[k], self.norms[k], self.group_delta);

        if j == k {
            let pt4 = PointF::new(
                pt3.x + vec.x * self.group_delta,
                pt3.y + vec.y * self.group_delta,
            );
            let pt = intersect_f(pt1, pt2, pt3, pt4);
            let r = reflect(pt, ptq);
            self.path_out.push(lattice(r.x, r.y));
            self.path_out.push(lattice(pt.x, pt.y));
        } else {
            let pt4 = perpendic_f(path[j], self.norms[k], self.group_delta);
            let pt = intersect_f(pt1, pt2, pt3, pt4);
            self.path_out.push(lattice(pt.x, pt.y));
            let r = reflect(pt, ptq);
            self.path_out.push(lattice(r.x, r.y));
        }
    }

    fn emit_miter(&mut self, path: &Path64, j: usize, k: usize, cos_a: f64) {
        let q = self.group_delta / (cos_a + 1.0);
        self.path_out.push(lattice(
            path[j].x as f64 + (self.norms[k].x + self.norms[j].x) * q,
            path[j].y as f64 + (self.norms[k].y + self.norms[j].y) * q,
        ));
    }

    fn emit_round(&mut self, path: &Path64, j: usize, k: usize, angle: f64) {
        let pt = path[j];
        let mut offset = PointF::new(
            self.norms[k].x * self.group_delta,
            self.norms[k].y * self.group_delta,
        );
        if j == k {
            offset = PointF::new(-offset.x, -offset.y);
        }
        self.path_out.push(lattice(pt.x as f64 + offset.x, pt.y as f64 + offset.y));

        let steps = (self.steps_per_rad * angle.abs()).ceil() as i64;
        for _ in 1..steps {
            offset = PointF::new(
                offset.x * self.step_cos - self.step_sin * offset.y,
                offset.x * self.step_sin + offset.y * self.step_cos,
            );
            self.path_out.push(lattice(pt.x as f64 + offset.x, pt.y as f64 + offset.y));
        }
        self.path_out.push(perpendic(pt, self.norms[j], self.group_delta));
    }
}

#[cfg(test)]
#[path = "offset_tests.rs"]
mod tests;
