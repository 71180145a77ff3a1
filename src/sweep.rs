//! The sweep-line clipping engine.
//!
//! A bottom-to-top Vatti scanline: local minima enter the active edge list
//! (AEL), edges swap at intersections, fill rules decide which edges
//! contribute, and output contours are stitched on the fly as rings of
//! arena-allocated nodes. The scanline starts at the largest y and moves
//! toward smaller y; "up" always means toward smaller y.
//!
//! Every structural link (edge -> ring -> node) is an index into an arena,
//! never a pointer, which keeps ring splits and merges O(1) and ownership
//! trivial.

use std::collections::BinaryHeap;

use tracing::{debug, trace};

use crate::errors::{ClipError, Result};
use crate::geom::{
    bounds, closest_point_on_segment, cross_sign, dot_abc, is_collinear, perpendic_dist_sqrd,
    segment_intersect_pt, segments_cross, FillRule, Path64, Paths64, Point64, PointPlacement,
    Rect64,
};
use crate::minima::{vflags, PathKind, VertexStore, NONE};
use crate::tree::PolyTree;

// ---------------------------------------------------------------------------
// Operation selector
// ---------------------------------------------------------------------------

/// Boolean operation applied between subject and clip regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClipType {
    Intersection,
    Union,
    Difference,
    Xor,
}

impl ClipType {
    /// Decode a numeric operation code, e.g. from an FFI boundary.
    pub fn from_code(code: u8) -> Result<Self> {
        match code {
            0 => Ok(ClipType::Intersection),
            1 => Ok(ClipType::Union),
            2 => Ok(ClipType::Difference),
            3 => Ok(ClipType::Xor),
            _ => Err(ClipError::InvalidClipType),
        }
    }
}

/// Marks an edge pair that collinear-join processing has fused; the pair is
/// split again the moment either edge advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Splice {
    #[default]
    None,
    Left,
    Right,
}

// ---------------------------------------------------------------------------
// Arena records
// ---------------------------------------------------------------------------

/// An edge currently crossed by the scanline.
#[derive(Debug, Clone)]
struct Edge {
    bot: Point64,
    top: Point64,
    curr_x: i64,
    /// Inverse slope: dx per unit y. Horizontals use +/-MAX as direction tags.
    dx: f64,
    wind_dx: i32,
    wind_cnt: i32,
    wind_cnt2: i32,
    ring: Option<usize>,
    prev_ael: Option<usize>,
    next_ael: Option<usize>,
    prev_sel: Option<usize>,
    next_sel: Option<usize>,
    jump: Option<usize>,
    vtop: usize,
    lmin: usize,
    left_bound: bool,
    splice: Splice,
}

impl Edge {
    fn new() -> Self {
        Self {
            bot: Point64::new(0, 0),
            top: Point64::new(0, 0),
            curr_x: 0,
            dx: 0.0,
            wind_dx: 1,
            wind_cnt: 0,
            wind_cnt2: 0,
            ring: None,
            prev_ael: None,
            next_ael: None,
            prev_sel: None,
            next_sel: None,
            jump: None,
            vtop: NONE,
            lmin: NONE,
            left_bound: false,
            splice: Splice::None,
        }
    }
}

/// A vertex of an output contour; nodes form circular doubly linked rings.
#[derive(Debug, Clone)]
struct RingNode {
    pt: Point64,
    next: usize,
    prev: usize,
    ring: usize,
    span: Option<usize>,
}

/// One output contour under construction (or already detached).
#[derive(Debug, Clone)]
struct Ring {
    idx: usize,
    owner: Option<usize>,
    front: Option<usize>,
    back: Option<usize>,
    start: Option<usize>,
    tree_node: Option<usize>,
    splits: Vec<usize>,
    split_probe: Option<usize>,
    bounds: Rect64,
    path: Path64,
    is_open: bool,
}

impl Ring {
    fn new(idx: usize) -> Self {
        Self {
            idx,
            owner: None,
            front: None,
            back: None,
            start: None,
            tree_node: None,
            splits: Vec::new(),
            split_probe: None,
            bounds: Rect64::new(0, 0, 0, 0),
            path: Path64::new(),
            is_open: false,
        }
    }
}

/// Two edges scheduled to swap AEL positions at `pt`.
#[derive(Debug, Clone, Copy)]
struct Crossing {
    pt: Point64,
    e1: usize,
    e2: usize,
}

/// A run of ring nodes along one horizontal row, awaiting join matching.
#[derive(Debug, Clone, Copy)]
struct HorzSpan {
    left: Option<usize>,
    right: Option<usize>,
    left_to_right: bool,
}

/// A committed join between two overlapping horizontal spans.
#[derive(Debug, Clone, Copy)]
struct HorzSplice {
    a: usize,
    b: usize,
}

// ---------------------------------------------------------------------------
// Small free helpers over the arenas
// ---------------------------------------------------------------------------

#[inline]
fn is_odd(v: i32) -> bool {
    v & 1 != 0
}

/// Inverse slope of the segment `bot -> top`; horizontal edges carry their
/// heading in the sign of the sentinel.
#[inline]
fn slope(bot: Point64, top: Point64) -> f64 {
    let dy = (top.y - bot.y) as f64;
    if dy != 0.0 {
        (top.x - bot.x) as f64 / dy
    } else if top.x > bot.x {
        -f64::MAX
    } else {
        f64::MAX
    }
}

#[inline]
fn set_slope(e: &mut Edge) {
    e.dx = slope(e.bot, e.top);
}

#[inline]
fn is_horizontal(e: &Edge) -> bool {
    e.top.y == e.bot.y
}

#[inline]
fn heads_right(e: &Edge) -> bool {
    e.dx == -f64::MAX
}

#[inline]
fn heads_left(e: &Edge) -> bool {
    e.dx == f64::MAX
}

/// x of the edge at scanline `y` (exact at the endpoints).
#[inline]
fn top_x(e: &Edge, y: i64) -> i64 {
    if y == e.top.y || e.top.x == e.bot.x {
        e.top.x
    } else if y == e.bot.y {
        e.bot.x
    } else {
        e.bot.x + (e.dx * (y - e.bot.y) as f64).round() as i64
    }
}

#[inline]
fn is_hot(e: &Edge) -> bool {
    e.ring.is_some()
}

#[inline]
fn is_spliced(e: &Edge) -> bool {
    e.splice != Splice::None
}

#[inline]
fn pts_close(a: Point64, b: Point64) -> bool {
    (a.x - b.x).abs() < 2 && (a.y - b.y).abs() < 2
}

fn area_triangle(a: Point64, b: Point64, c: Point64) -> f64 {
    (c.y + a.y) as f64 * (c.x - a.x) as f64
        + (a.y + b.y) as f64 * (a.x - b.x) as f64
        + (b.y + c.y) as f64 * (b.x - c.x) as f64
}

// ---------------------------------------------------------------------------
// The engine
// ---------------------------------------------------------------------------

/// Reusable clipper: add subject/clip paths, then execute one operation.
pub struct Clipper {
    clip_type: ClipType,
    fill_rule: FillRule,
    preserve_collinear: bool,
    reverse_solution: bool,
    using_tree: bool,
    succeeded: bool,

    store: VertexStore,
    edges: Vec<Edge>,
    nodes: Vec<RingNode>,
    rings: Vec<Ring>,

    ael: Option<usize>,
    sel: Option<usize>,
    scan_queue: BinaryHeap<i64>,
    crossings: Vec<Crossing>,
    spans: Vec<HorzSpan>,
    splices: Vec<HorzSplice>,
    bot_y: i64,
}

impl Default for Clipper {
    fn default() -> Self {
        Self::new()
    }
}

impl Clipper {
    pub fn new() -> Self {
        Self {
            clip_type: ClipType::Union,
            fill_rule: FillRule::EvenOdd,
            preserve_collinear: true,
            reverse_solution: false,
            using_tree: false,
            succeeded: true,
            store: VertexStore::new(),
            edges: Vec::new(),
            nodes: Vec::new(),
            rings: Vec::new(),
            ael: None,
            sel: None,
            scan_queue: BinaryHeap::new(),
            crossings: Vec::new(),
            spans: Vec::new(),
            splices: Vec::new(),
            bot_y: 0,
        }
    }

    /// Keep collinear output vertices (spikes are always removed).
    pub fn set_preserve_collinear(&mut self, on: bool) {
        self.preserve_collinear = on;
    }

    /// Emit contours with reversed orientation.
    pub fn set_reverse_solution(&mut self, on: bool) {
        self.reverse_solution = on;
    }

    pub fn add_subject(&mut self, paths: &Paths64) -> Result<()> {
        self.store.add_paths(paths, PathKind::Subject, false)
    }

    pub fn add_open_subject(&mut self, paths: &Paths64) -> Result<()> {
        self.store.add_paths(paths, PathKind::Subject, true)
    }

    pub fn add_clip(&mut self, paths: &Paths64) -> Result<()> {
        self.store.add_paths(paths, PathKind::Clip, false)
    }

    /// Drop all inputs and runtime state.
    pub fn clear(&mut self) {
        self.store.clear();
        self.reset_runtime();
    }

    /// Run one boolean operation, returning (closed, open) solution paths.
    pub fn execute(&mut self, clip_type: ClipType, fill_rule: FillRule) -> Result<(Paths64, Paths64)> {
        self.run_sweep(clip_type, fill_rule, false);
        let result = if self.succeeded {
            Ok(self.build_paths())
        } else {
            Err(ClipError::Overflow)
        };
        self.reset_runtime();
        result
    }

    /// Run one boolean operation, packaging closed output as a polygon tree.
    pub fn execute_tree(&mut self, clip_type: ClipType, fill_rule: FillRule) -> Result<(PolyTree, Paths64)> {
        self.run_sweep(clip_type, fill_rule, true);
        let result = if self.succeeded {
            Ok(self.build_tree())
        } else {
            Err(ClipError::Overflow)
        };
        self.reset_runtime();
        result
    }

    // -- runtime state --------------------------------------------------

    fn reset_runtime(&mut self) {
        self.edges.clear();
        self.nodes.clear();
        self.rings.clear();
        self.ael = None;
        self.sel = None;
        self.scan_queue.clear();
        self.crossings.clear();
        self.spans.clear();
        self.splices.clear();
        self.succeeded = true;
        self.store.rewind();
    }

    #[inline]
    fn insert_scanline(&mut self, y: i64) {
        self.scan_queue.push(y);
    }

    /// Next scanline from the bottom; duplicates are drained.
    fn pop_scanline(&mut self) -> Option<i64> {
        let y = self.scan_queue.pop()?;
        while self.scan_queue.peek() == Some(&y) {
            self.scan_queue.pop();
        }
        Some(y)
    }

    // -- tiny accessors -------------------------------------------------

    #[inline]
    fn kind(&self, e: usize) -> PathKind {
        self.store.minima[self.edges[e].lmin].kind
    }

    #[inline]
    fn same_kind(&self, e1: usize, e2: usize) -> bool {
        self.kind(e1) == self.kind(e2)
    }

    #[inline]
    fn is_open(&self, e: usize) -> bool {
        self.store.minima[self.edges[e].lmin].is_open
    }

    #[inline]
    fn is_open_end(&self, e: usize) -> bool {
        self.store.verts[self.edges[e].vtop].is_open_end()
    }

    #[inline]
    fn at_local_max(&self, e: usize) -> bool {
        self.store.verts[self.edges[e].vtop].is_local_max()
    }

    /// Next chain vertex in this bound's travel direction.
    #[inline]
    fn next_vertex(&self, e: usize) -> usize {
        if self.edges[e].wind_dx > 0 {
            self.store.verts[self.edges[e].vtop].next
        } else {
            self.store.verts[self.edges[e].vtop].prev
        }
    }

    /// Two vertices back along the alternate bound.
    #[inline]
    fn prev_prev_vertex(&self, e: usize) -> usize {
        if self.edges[e].wind_dx > 0 {
            let p = self.store.verts[self.edges[e].vtop].prev;
            self.store.verts[p].prev
        } else {
            let n = self.store.verts[self.edges[e].vtop].next;
            self.store.verts[n].next
        }
    }

    #[inline]
    fn is_front(&self, e: usize) -> bool {
        match self.edges[e].ring {
            Some(r) => self.rings[r].front == Some(e),
            None => false,
        }
    }

    fn new_ring(&mut self) -> usize {
        let idx = self.rings.len();
        self.rings.push(Ring::new(idx));
        idx
    }

    fn new_node(&mut self, pt: Point64, ring: usize) -> usize {
        let idx = self.nodes.len();
        self.nodes.push(RingNode { pt, next: idx, prev: idx, ring, span: None });
        idx
    }

    /// Insert a copy of `node` into its ring, after or before it.
    fn duplicate_node(&mut self, node: usize, insert_after: bool) -> usize {
        let pt = self.nodes[node].pt;
        let ring = self.nodes[node].ring;
        let idx = self.nodes.len();
        if insert_after {
            let next = self.nodes[node].next;
            self.nodes.push(RingNode { pt, next, prev: node, ring, span: None });
            self.nodes[next].prev = idx;
            self.nodes[node].next = idx;
        } else {
            let prev = self.nodes[node].prev;
            self.nodes.push(RingNode { pt, next: node, prev, ring, span: None });
            self.nodes[prev].next = idx;
            self.nodes[node].prev = idx;
        }
        idx
    }

    /// Unlink one node, returning its successor.
    fn unlink_node(&mut self, node: usize) -> usize {
        let next = self.nodes[node].next;
        let prev = self.nodes[node].prev;
        self.nodes[prev].next = next;
        self.nodes[next].prev = prev;
        next
    }

    fn drop_ring_nodes(&mut self, ring: usize) {
        self.rings[ring].start = None;
    }

    fn ring_area(&self, start: usize) -> f64 {
        let mut sum = 0.0;
        let mut i = start;
        loop {
            let p = self.nodes[i].prev;
            sum += (self.nodes[p].pt.y + self.nodes[i].pt.y) as f64
                * (self.nodes[p].pt.x - self.nodes[i].pt.x) as f64;
            i = self.nodes[i].next;
            if i == start {
                break;
            }
        }
        sum * 0.5
    }

    fn tiny_triangle(&self, node: usize) -> bool {
        let next = self.nodes[node].next;
        let prev = self.nodes[node].prev;
        if self.nodes[next].next != prev {
            return false;
        }
        pts_close(self.nodes[prev].pt, self.nodes[next].pt)
            || pts_close(self.nodes[node].pt, self.nodes[next].pt)
            || pts_close(self.nodes[node].pt, self.nodes[prev].pt)
    }

    fn valid_closed_ring(&self, start: Option<usize>) -> bool {
        match start {
            None => false,
            Some(s) => {
                let next = self.nodes[s].next;
                next != s && next != self.nodes[s].prev && !self.tiny_triangle(s)
            }
        }
    }

    /// Follow owner links until a ring that still has nodes.
    fn real_ring(&self, mut ring: usize) -> Option<usize> {
        loop {
            if self.rings[ring].start.is_some() {
                return Some(ring);
            }
            ring = self.rings[ring].owner?;
        }
    }

    fn owner_chain_excludes(&self, ring: usize, candidate: usize) -> bool {
        let mut probe = Some(candidate);
        while let Some(i) = probe {
            if i == ring {
                return false;
            }
            probe = self.rings[i].owner;
        }
        true
    }

    fn set_ring_owner(&mut self, ring: usize, new_owner: usize) {
        let resolved = self
            .real_ring(self.rings[new_owner].owner.unwrap_or(new_owner))
            .unwrap_or(new_owner);
        self.rings[new_owner].owner = Some(resolved);
        // never create an ownership cycle
        let mut probe = Some(new_owner);
        while let Some(i) = probe {
            if i == ring {
                self.rings[new_owner].owner = self.rings[ring].owner;
                break;
            }
            probe = self.rings[i].owner;
        }
        self.rings[ring].owner = Some(new_owner);
    }

    fn move_splits(&mut self, from: usize, to: usize) {
        let moved = std::mem::take(&mut self.rings[from].splits);
        for s in moved {
            if s != to {
                self.rings[to].splits.push(s);
            }
        }
    }

    fn relabel_ring_nodes(&mut self, ring: usize) {
        if let Some(start) = self.rings[ring].start {
            let mut i = start;
            loop {
                self.nodes[i].ring = ring;
                i = self.nodes[i].next;
                if i == start {
                    break;
                }
            }
        }
    }

    /// Detach both hot edges from a just-closed ring.
    fn detach_ring(&mut self, e: usize) {
        if let Some(r) = self.edges[e].ring {
            if let Some(f) = self.rings[r].front {
                self.edges[f].ring = None;
            }
            if let Some(b) = self.rings[r].back {
                self.edges[b].ring = None;
            }
            self.rings[r].front = None;
            self.rings[r].back = None;
        }
    }

    fn swap_ring_sides(&mut self, ring: usize) {
        let f = self.rings[ring].front;
        let b = self.rings[ring].back;
        self.rings[ring].front = b;
        self.rings[ring].back = f;
        if let Some(s) = self.rings[ring].start {
            self.rings[ring].start = Some(self.nodes[s].next);
        }
    }

    fn ring_is_ascending(&self, hot_edge: usize) -> bool {
        match self.edges[hot_edge].ring {
            Some(r) => self.rings[r].front == Some(hot_edge),
            None => false,
        }
    }

    /// The nearest hot closed edge to the left in the AEL.
    fn prev_hot_edge(&self, e: usize) -> Option<usize> {
        let mut prev = self.edges[e].prev_ael;
        while let Some(p) = prev {
            if !self.is_open(p) && is_hot(&self.edges[p]) {
                return Some(p);
            }
            prev = self.edges[p].prev_ael;
        }
        None
    }

    // -- winding --------------------------------------------------------

    fn wind_count_closed(&mut self, e: usize) {
        let kind = self.kind(e);
        let wind_dx = self.edges[e].wind_dx;

        // nearest closed edge of the same kind, heading left
        let mut left = self.edges[e].prev_ael;
        while let Some(l) = left {
            if self.kind(l) == kind && !self.is_open(l) {
                break;
            }
            left = self.edges[l].prev_ael;
        }

        let scan_from;
        if let Some(l) = left {
            if self.fill_rule == FillRule::EvenOdd {
                self.edges[e].wind_cnt = wind_dx;
                self.edges[e].wind_cnt2 = self.edges[l].wind_cnt2;
                scan_from = self.edges[l].next_ael;
            } else {
                let l_cnt = self.edges[l].wind_cnt;
                let l_dx = self.edges[l].wind_dx;
                if l_cnt * l_dx < 0 {
                    // opposite winding direction: e is outside l
                    if l_cnt.abs() > 1 {
                        if l_dx * wind_dx < 0 {
                            self.edges[e].wind_cnt = l_cnt;
                        } else {
                            self.edges[e].wind_cnt = l_cnt + wind_dx;
                        }
                    } else {
                        self.edges[e].wind_cnt =
                            if self.is_open(e) { 1 } else { wind_dx };
                    }
                } else {
                    // same direction: e is inside l
                    if l_dx * wind_dx < 0 {
                        self.edges[e].wind_cnt = l_cnt;
                    } else {
                        self.edges[e].wind_cnt = l_cnt + wind_dx;
                    }
                }
                self.edges[e].wind_cnt2 = self.edges[l].wind_cnt2;
                scan_from = self.edges[l].next_ael;
            }
        } else {
            self.edges[e].wind_cnt = wind_dx;
            scan_from = self.ael;
        }

        // accumulate the opposite kind into wind_cnt2
        let mut cur = scan_from;
        if self.fill_rule == FillRule::EvenOdd {
            while cur != Some(e) {
                let Some(c) = cur else { break };
                if self.kind(c) != kind && !self.is_open(c) {
                    self.edges[e].wind_cnt2 =
                        if self.edges[e].wind_cnt2 == 0 { 1 } else { 0 };
                }
                cur = self.edges[c].next_ael;
            }
        } else {
            while cur != Some(e) {
                let Some(c) = cur else { break };
                if self.kind(c) != kind && !self.is_open(c) {
                    self.edges[e].wind_cnt2 += self.edges[c].wind_dx;
                }
                cur = self.edges[c].next_ael;
            }
        }
    }

    fn wind_count_open(&mut self, e: usize) {
        let mut cur = self.ael;
        if self.fill_rule == FillRule::EvenOdd {
            let mut cnt1 = 0;
            let mut cnt2 = 0;
            while cur != Some(e) {
                let Some(c) = cur else { break };
                if self.kind(c) == PathKind::Clip {
                    cnt2 += 1;
                } else if !self.is_open(c) {
                    cnt1 += 1;
                }
                cur = self.edges[c].next_ael;
            }
            self.edges[e].wind_cnt = if is_odd(cnt1) { 1 } else { 0 };
            self.edges[e].wind_cnt2 = if is_odd(cnt2) { 1 } else { 0 };
        } else {
            while cur != Some(e) {
                let Some(c) = cur else { break };
                if self.kind(c) == PathKind::Clip {
                    self.edges[e].wind_cnt2 += self.edges[c].wind_dx;
                } else if !self.is_open(c) {
                    self.edges[e].wind_cnt += self.edges[c].wind_dx;
                }
                cur = self.edges[c].next_ael;
            }
        }
    }

    fn contributing_closed(&self, e: usize) -> bool {
        let edge = &self.edges[e];
        match self.fill_rule {
            FillRule::EvenOdd => {}
            FillRule::NonZero => {
                if edge.wind_cnt.abs() != 1 {
                    return false;
                }
            }
            FillRule::Positive => {
                if edge.wind_cnt != 1 {
                    return false;
                }
            }
            FillRule::Negative => {
                if edge.wind_cnt != -1 {
                    return false;
                }
            }
        }

        match self.clip_type {
            ClipType::Intersection => match self.fill_rule {
                FillRule::Positive => edge.wind_cnt2 > 0,
                FillRule::Negative => edge.wind_cnt2 < 0,
                _ => edge.wind_cnt2 != 0,
            },
            ClipType::Union => match self.fill_rule {
                FillRule::Positive => edge.wind_cnt2 <= 0,
                FillRule::Negative => edge.wind_cnt2 >= 0,
                _ => edge.wind_cnt2 == 0,
            },
            ClipType::Difference => {
                let outside_clip = match self.fill_rule {
                    FillRule::Positive => edge.wind_cnt2 <= 0,
                    FillRule::Negative => edge.wind_cnt2 >= 0,
                    _ => edge.wind_cnt2 == 0,
                };
                if self.kind(e) == PathKind::Subject {
                    outside_clip
                } else {
                    !outside_clip
                }
            }
            ClipType::Xor => true,
        }
    }

    fn contributing_open(&self, e: usize) -> bool {
        let edge = &self.edges[e];
        let (in_clip, in_subj) = match self.fill_rule {
            FillRule::Positive => (edge.wind_cnt2 > 0, edge.wind_cnt > 0),
            FillRule::Negative => (edge.wind_cnt2 < 0, edge.wind_cnt < 0),
            _ => (edge.wind_cnt2 != 0, edge.wind_cnt != 0),
        };
        match self.clip_type {
            ClipType::Intersection => in_clip,
            ClipType::Union => !in_subj && !in_clip,
            _ => !in_clip,
        }
    }

    // -- AEL insertion --------------------------------------------------

    /// Where a newcomer belongs relative to a resident edge at equal x.
    fn valid_ael_order(&self, resident: usize, newcomer: usize) -> bool {
        let r = &self.edges[resident];
        let n = &self.edges[newcomer];
        if n.curr_x != r.curr_x {
            return n.curr_x > r.curr_x;
        }

        // turning direction at the shared point
        let d = cross_sign(r.top, n.bot, n.top);
        if d != 0 {
            return d < 0;
        }

        // collinear edges: starting open paths go by where they turn next
        if !self.at_local_max(resident) && r.top.y > n.top.y {
            let nv = self.next_vertex(resident);
            return cross_sign(n.bot, r.top, self.store.verts[nv].pt) <= 0;
        }
        if !self.at_local_max(newcomer) && n.top.y > r.top.y {
            let nv = self.next_vertex(newcomer);
            return cross_sign(n.bot, n.top, self.store.verts[nv].pt) >= 0;
        }

        let y = n.bot.y;
        let newcomer_left = n.left_bound;
        if r.bot.y != y || self.store.verts[self.store.minima[r.lmin].vertex].pt.y != y {
            n.left_bound
        } else if r.left_bound != newcomer_left {
            newcomer_left
        } else if is_collinear(
            self.store.verts[self.prev_prev_vertex(resident)].pt,
            r.bot,
            r.top,
        ) {
            true
        } else {
            // compare turning direction of the alternate bounds
            (cross_sign(
                self.store.verts[self.prev_prev_vertex(resident)].pt,
                n.bot,
                self.store.verts[self.prev_prev_vertex(newcomer)].pt,
            ) > 0) == newcomer_left
        }
    }

    fn insert_left_edge(&mut self, e: usize) {
        match self.ael {
            None => {
                self.edges[e].prev_ael = None;
                self.edges[e].next_ael = None;
                self.ael = Some(e);
            }
            Some(head) => {
                if !self.valid_ael_order(head, e) {
                    self.edges[e].prev_ael = None;
                    self.edges[e].next_ael = Some(head);
                    self.edges[head].prev_ael = Some(e);
                    self.ael = Some(e);
                } else {
                    let mut after = head;
                    while let Some(next) = self.edges[after].next_ael {
                        if !self.valid_ael_order(next, e) {
                            break;
                        }
                        after = next;
                    }
                    if self.edges[after].splice == Splice::Right {
                        match self.edges[after].next_ael {
                            Some(next) => after = next,
                            None => return,
                        }
                    }
                    let next = self.edges[after].next_ael;
                    self.edges[e].next_ael = next;
                    if let Some(n) = next {
                        self.edges[n].prev_ael = Some(e);
                    }
                    self.edges[e].prev_ael = Some(after);
                    self.edges[after].next_ael = Some(e);
                }
            }
        }
    }

    fn insert_right_edge(&mut self, left: usize, right: usize) {
        let next = self.edges[left].next_ael;
        self.edges[right].next_ael = next;
        if let Some(n) = next {
            self.edges[n].prev_ael = Some(right);
        }
        self.edges[right].prev_ael = Some(left);
        self.edges[left].next_ael = Some(right);
    }

    fn delete_from_ael(&mut self, e: usize) {
        let prev = self.edges[e].prev_ael;
        let next = self.edges[e].next_ael;
        if prev.is_none() && next.is_none() && self.ael != Some(e) {
            return; // already removed
        }
        match prev {
            Some(p) => self.edges[p].next_ael = next,
            None => self.ael = next,
        }
        if let Some(n) = next {
            self.edges[n].prev_ael = prev;
        }
        self.edges[e].prev_ael = None;
        self.edges[e].next_ael = None;
    }

    /// Swap two AEL neighbors; `e1` must sit immediately left of `e2`.
    fn swap_ael_neighbors(&mut self, e1: usize, e2: usize) {
        let next = self.edges[e2].next_ael;
        if let Some(n) = next {
            self.edges[n].prev_ael = Some(e1);
        }
        let prev = self.edges[e1].prev_ael;
        if let Some(p) = prev {
            self.edges[p].next_ael = Some(e2);
        }
        self.edges[e2].prev_ael = prev;
        self.edges[e2].next_ael = Some(e1);
        self.edges[e1].prev_ael = Some(e2);
        self.edges[e1].next_ael = next;
        if self.edges[e2].prev_ael.is_none() {
            self.ael = Some(e2);
        }
    }

    // -- output nodes ---------------------------------------------------

    /// Append a vertex on the correct side of the edge's ring.
    fn add_node(&mut self, e: usize, pt: Point64) -> usize {
        let ring = self.edges[e].ring.expect("hot edge");
        let to_front = self.is_front(e);
        let front = self.rings[ring].start.expect("live ring");
        let back = self.nodes[front].next;

        if to_front {
            if pt == self.nodes[front].pt {
                return front;
            }
        } else if pt == self.nodes[back].pt {
            return back;
        }

        let idx = self.nodes.len();
        self.nodes.push(RingNode { pt, next: back, prev: front, ring, span: None });
        self.nodes[back].prev = idx;
        self.nodes[front].next = idx;
        if to_front {
            self.rings[ring].start = Some(idx);
        }
        idx
    }

    fn start_open_ring(&mut self, e: usize, pt: Point64) -> usize {
        let ring = self.new_ring();
        self.rings[ring].is_open = true;
        if self.edges[e].wind_dx > 0 {
            self.rings[ring].front = Some(e);
            self.rings[ring].back = None;
        } else {
            self.rings[ring].front = None;
            self.rings[ring].back = Some(e);
        }
        self.edges[e].ring = Some(ring);
        let node = self.new_node(pt, ring);
        self.rings[ring].start = Some(node);
        node
    }

    /// Open a new output region between two edges meeting at `pt`.
    fn open_ring_pair(&mut self, e1: usize, e2: usize, pt: Point64, is_new: bool) -> usize {
        let ring = self.new_ring();
        self.edges[e1].ring = Some(ring);
        self.edges[e2].ring = Some(ring);

        if self.is_open(e1) {
            self.rings[ring].owner = None;
            self.rings[ring].is_open = true;
            if self.edges[e1].wind_dx > 0 {
                self.rings[ring].front = Some(e1);
                self.rings[ring].back = Some(e2);
            } else {
                self.rings[ring].front = Some(e2);
                self.rings[ring].back = Some(e1);
            }
        } else {
            self.rings[ring].is_open = false;
            match self.prev_hot_edge(e1) {
                Some(prev_hot) => {
                    if self.using_tree {
                        if let Some(prev_ring) = self.edges[prev_hot].ring {
                            self.set_ring_owner(ring, prev_ring);
                        }
                    }
                    if self.ring_is_ascending(prev_hot) == is_new {
                        self.rings[ring].front = Some(e2);
                        self.rings[ring].back = Some(e1);
                    } else {
                        self.rings[ring].front = Some(e1);
                        self.rings[ring].back = Some(e2);
                    }
                }
                None => {
                    self.rings[ring].owner = None;
                    if is_new {
                        self.rings[ring].front = Some(e1);
                        self.rings[ring].back = Some(e2);
                    } else {
                        self.rings[ring].front = Some(e2);
                        self.rings[ring].back = Some(e1);
                    }
                }
            }
        }

        let node = self.new_node(pt, ring);
        self.rings[ring].start = Some(node);
        node
    }

    /// Close the region between two edges meeting at a local maximum.
    fn close_ring_pair(&mut self, e1: usize, e2: usize, pt: Point64) -> Option<usize> {
        if is_spliced(&self.edges[e1]) {
            self.split_spliced(e1, pt);
        }
        if is_spliced(&self.edges[e2]) {
            self.split_spliced(e2, pt);
        }

        if self.is_front(e1) == self.is_front(e2) {
            if self.is_open_end(e1) {
                let r = self.edges[e1].ring.expect("hot edge");
                self.swap_ring_sides(r);
            } else if self.is_open_end(e2) {
                let r = self.edges[e2].ring.expect("hot edge");
                self.swap_ring_sides(r);
            } else {
                self.succeeded = false;
                return None;
            }
        }

        let result = self.add_node(e1, pt);
        let r1 = self.edges[e1].ring;
        let r2 = self.edges[e2].ring;

        if r1 == r2 {
            let ring = r1.expect("hot edge");
            self.rings[ring].start = Some(result);

            if self.using_tree {
                match self.prev_hot_edge(e1) {
                    None => self.rings[ring].owner = None,
                    Some(prev_hot) => {
                        if let Some(prev_ring) = self.edges[prev_hot].ring {
                            self.set_ring_owner(ring, prev_ring);
                        }
                    }
                }
            }

            self.detach_ring(e1);
            let closed = self.rings[ring].start;
            if let Some(owner) = self.rings[ring].owner {
                if self.rings[owner].front.is_none() {
                    self.rings[ring].owner = self.real_ring(owner);
                }
            }
            return closed;
        }

        if self.is_open(e1) {
            if self.edges[e1].wind_dx < 0 {
                self.merge_ring_paths(e1, e2);
            } else {
                self.merge_ring_paths(e2, e1);
            }
        } else {
            let r1 = r1.expect("hot edge");
            let r2 = r2.expect("hot edge");
            if self.rings[r1].idx < self.rings[r2].idx {
                self.merge_ring_paths(e1, e2);
            } else {
                self.merge_ring_paths(e2, e1);
            }
        }
        Some(result)
    }

    /// Concatenate e2's ring onto e1's, retiring e2's ring record.
    fn merge_ring_paths(&mut self, e1: usize, e2: usize) {
        let r1 = self.edges[e1].ring.expect("hot edge");
        let r2 = self.edges[e2].ring.expect("hot edge");

        let p1_start = self.rings[r1].start.expect("live ring");
        let p2_start = self.rings[r2].start.expect("live ring");
        let p1_end = self.nodes[p1_start].next;
        let p2_end = self.nodes[p2_start].next;

        if self.is_front(e1) {
            self.nodes[p2_end].prev = p1_start;
            self.nodes[p1_start].next = p2_end;
            self.nodes[p2_start].next = p1_end;
            self.nodes[p1_end].prev = p2_start;
            self.rings[r1].start = Some(p2_start);
            self.rings[r1].front = self.rings[r2].front;
            if let Some(f) = self.rings[r1].front {
                self.edges[f].ring = Some(r1);
            }
        } else {
            self.nodes[p1_end].prev = p2_start;
            self.nodes[p2_start].next = p1_end;
            self.nodes[p1_start].next = p2_end;
            self.nodes[p2_end].prev = p1_start;
            self.rings[r1].back = self.rings[r2].back;
            if let Some(b) = self.rings[r1].back {
                self.edges[b].ring = Some(r1);
            }
        }

        self.rings[r2].front = None;
        self.rings[r2].back = None;
        self.rings[r2].start = None;

        if self.is_open_end(e1) {
            self.rings[r2].start = self.rings[r1].start;
            self.rings[r1].start = None;
        } else {
            self.set_ring_owner(r2, r1);
        }

        self.edges[e1].ring = None;
        self.edges[e2].ring = None;
    }

    /// Undo a collinear splice by restarting a ring pair at `pt`.
    fn split_spliced(&mut self, e: usize, pt: Point64) {
        if self.edges[e].splice == Splice::Right {
            self.edges[e].splice = Splice::None;
            let next = self.edges[e].next_ael.expect("spliced pair");
            self.edges[next].splice = Splice::None;
            self.open_ring_pair(e, next, pt, true);
        } else {
            self.edges[e].splice = Splice::None;
            let prev = self.edges[e].prev_ael.expect("spliced pair");
            self.edges[prev].splice = Splice::None;
            self.open_ring_pair(prev, e, pt, true);
        }
    }

    // -- collinear joins ------------------------------------------------

    fn check_join_left(&mut self, e: usize, pt: Point64, check_curr_x: bool) {
        let Some(prev) = self.edges[e].prev_ael else { return };
        if !is_hot(&self.edges[e])
            || !is_hot(&self.edges[prev])
            || is_horizontal(&self.edges[e])
            || is_horizontal(&self.edges[prev])
            || self.is_open(e)
            || self.is_open(prev)
        {
            return;
        }
        // ignore trivial joins right next to an edge top
        if (pt.y < self.edges[e].top.y + 2 || pt.y < self.edges[prev].top.y + 2)
            && (self.edges[e].bot.y > pt.y || self.edges[prev].bot.y > pt.y)
        {
            return;
        }

        if check_curr_x {
            if perpendic_dist_sqrd(pt, self.edges[prev].bot, self.edges[prev].top) > 0.25 {
                return;
            }
        } else if self.edges[e].curr_x != self.edges[prev].curr_x {
            return;
        }
        if !is_collinear(self.edges[e].top, pt, self.edges[prev].top) {
            return;
        }

        let er = self.edges[e].ring.expect("hot edge");
        let pr = self.edges[prev].ring.expect("hot edge");
        if self.rings[er].idx == self.rings[pr].idx {
            self.close_ring_pair(prev, e, pt);
        } else if self.rings[er].idx < self.rings[pr].idx {
            self.merge_ring_paths(e, prev);
        } else {
            self.merge_ring_paths(prev, e);
        }
        self.edges[prev].splice = Splice::Right;
        self.edges[e].splice = Splice::Left;
    }

    fn check_join_right(&mut self, e: usize, pt: Point64, check_curr_x: bool) {
        let Some(next) = self.edges[e].next_ael else { return };
        if !is_hot(&self.edges[e])
            || !is_hot(&self.edges[next])
            || is_horizontal(&self.edges[e])
            || is_horizontal(&self.edges[next])
            || self.is_open(e)
            || self.is_open(next)
        {
            return;
        }
        if (pt.y < self.edges[e].top.y + 2 || pt.y < self.edges[next].top.y + 2)
            && (self.edges[e].bot.y > pt.y || self.edges[next].bot.y > pt.y)
        {
            return;
        }

        if check_curr_x {
            if perpendic_dist_sqrd(pt, self.edges[next].bot, self.edges[next].top) > 0.35 {
                return;
            }
        } else if self.edges[e].curr_x != self.edges[next].curr_x {
            return;
        }
        if !is_collinear(self.edges[e].top, pt, self.edges[next].top) {
            return;
        }

        let er = self.edges[e].ring.expect("hot edge");
        let nr = self.edges[next].ring.expect("hot edge");
        if self.rings[er].idx == self.rings[nr].idx {
            self.close_ring_pair(e, next, pt);
        } else if self.rings[er].idx < self.rings[nr].idx {
            self.merge_ring_paths(e, next);
        } else {
            self.merge_ring_paths(next, e);
        }
        self.edges[e].splice = Splice::Right;
        self.edges[next].splice = Splice::Left;
    }

    // -- edge/edge intersection ----------------------------------------

    fn intersect_edges(&mut self, e1: usize, e2: usize, pt: Point64) {
        // open path crossings are handled on their own
        if self.store.has_open_paths && (self.is_open(e1) || self.is_open(e2)) {
            if self.is_open(e1) && self.is_open(e2) {
                return;
            }
            let (open_e, closed_e) = if self.is_open(e1) { (e1, e2) } else { (e2, e1) };

            if is_spliced(&self.edges[closed_e]) {
                self.split_spliced(closed_e, pt);
            }
            if self.edges[closed_e].wind_cnt.abs() != 1 {
                return;
            }
            match self.clip_type {
                ClipType::Union => {
                    if !is_hot(&self.edges[closed_e]) {
                        return;
                    }
                }
                _ => {
                    if self.kind(closed_e) == PathKind::Subject {
                        return;
                    }
                }
            }
            match self.fill_rule {
                FillRule::Positive => {
                    if self.edges[closed_e].wind_cnt != 1 {
                        return;
                    }
                }
                FillRule::Negative => {
                    if self.edges[closed_e].wind_cnt != -1 {
                        return;
                    }
                }
                _ => {
                    if self.edges[closed_e].wind_cnt.abs() != 1 {
                        return;
                    }
                }
            }

            // toggle the open edge's contribution
            if is_hot(&self.edges[open_e]) {
                self.add_node(open_e, pt);
                if self.is_front(open_e) {
                    let r = self.edges[open_e].ring.expect("hot edge");
                    self.rings[r].front = None;
                } else {
                    let r = self.edges[open_e].ring.expect("hot edge");
                    self.rings[r].back = None;
                }
                self.edges[open_e].ring = None;
                return;
            }

            let min_vertex = self.store.minima[self.edges[open_e].lmin].vertex;
            if pt == self.edges[open_e].bot
                && pt == self.store.verts[min_vertex].pt
                && !self.store.verts[min_vertex].is_open_end()
            {
                // an open path restarting exactly at its local minimum may
                // reuse the sibling bound's ring
                if let Some(e3) = self.matching_min_edge(open_e) {
                    if is_hot(&self.edges[e3]) {
                        let ring = self.edges[e3].ring.expect("hot edge");
                        self.edges[open_e].ring = Some(ring);
                        if self.edges[open_e].wind_dx > 0 {
                            self.rings[ring].front = Some(open_e);
                            self.rings[ring].back = Some(e3);
                        } else {
                            self.rings[ring].front = Some(e3);
                            self.rings[ring].back = Some(open_e);
                        }
                        return;
                    }
                }
            }
            self.start_open_ring(open_e, pt);
            return;
        }

        // closed paths from here on
        if is_spliced(&self.edges[e1]) {
            self.split_spliced(e1, pt);
        }
        if is_spliced(&self.edges[e2]) {
            self.split_spliced(e2, pt);
        }

        // update winding counts
        if self.same_kind(e1, e2) {
            if self.fill_rule == FillRule::EvenOdd {
                let tmp = self.edges[e1].wind_cnt;
                self.edges[e1].wind_cnt = self.edges[e2].wind_cnt;
                self.edges[e2].wind_cnt = tmp;
            } else {
                let w1 = self.edges[e1].wind_cnt;
                let d2 = self.edges[e2].wind_dx;
                self.edges[e1].wind_cnt = if w1 + d2 == 0 { -w1 } else { w1 + d2 };
                let w2 = self.edges[e2].wind_cnt;
                let d1 = self.edges[e1].wind_dx;
                self.edges[e2].wind_cnt = if w2 - d1 == 0 { -w2 } else { w2 - d1 };
            }
        } else if self.fill_rule != FillRule::EvenOdd {
            self.edges[e1].wind_cnt2 += self.edges[e2].wind_dx;
            self.edges[e2].wind_cnt2 -= self.edges[e1].wind_dx;
        } else {
            let w1 = self.edges[e1].wind_cnt2;
            self.edges[e1].wind_cnt2 = if w1 == 0 { 1 } else { 0 };
            let w2 = self.edges[e2].wind_cnt2;
            self.edges[e2].wind_cnt2 = if w2 == 0 { 1 } else { 0 };
        }

        let (old_e1_wc, old_e2_wc) = match self.fill_rule {
            FillRule::EvenOdd | FillRule::NonZero => {
                (self.edges[e1].wind_cnt.abs(), self.edges[e2].wind_cnt.abs())
            }
            FillRule::Positive => (self.edges[e1].wind_cnt, self.edges[e2].wind_cnt),
            FillRule::Negative => (-self.edges[e1].wind_cnt, -self.edges[e2].wind_cnt),
        };

        let e1_in_01 = old_e1_wc == 0 || old_e1_wc == 1;
        let e2_in_01 = old_e2_wc == 0 || old_e2_wc == 1;
        if (!is_hot(&self.edges[e1]) && !e1_in_01) || (!is_hot(&self.edges[e2]) && !e2_in_01) {
            return;
        }

        if is_hot(&self.edges[e1]) && is_hot(&self.edges[e2]) {
            if (old_e1_wc != 0 && old_e1_wc != 1)
                || (old_e2_wc != 0 && old_e2_wc != 1)
                || (!self.same_kind(e1, e2) && self.clip_type != ClipType::Xor)
            {
                self.close_ring_pair(e1, e2, pt);
            } else if self.is_front(e1) || self.edges[e1].ring == self.edges[e2].ring {
                // one region closes here and another opens
                self.close_ring_pair(e1, e2, pt);
                self.open_ring_pair(e1, e2, pt, false);
            } else {
                self.add_node(e1, pt);
                self.add_node(e2, pt);
                self.swap_edge_rings(e1, e2);
            }
        } else if is_hot(&self.edges[e1]) {
            self.add_node(e1, pt);
            self.swap_edge_rings(e1, e2);
        } else if is_hot(&self.edges[e2]) {
            self.add_node(e2, pt);
            self.swap_edge_rings(e1, e2);
        } else {
            // neither edge is hot
            let (e1_wc2, e2_wc2) = match self.fill_rule {
                FillRule::EvenOdd | FillRule::NonZero => (
                    self.edges[e1].wind_cnt2.abs(),
                    self.edges[e2].wind_cnt2.abs(),
                ),
                FillRule::Positive => (self.edges[e1].wind_cnt2, self.edges[e2].wind_cnt2),
                FillRule::Negative => (-self.edges[e1].wind_cnt2, -self.edges[e2].wind_cnt2),
            };

            if !self.same_kind(e1, e2) {
                self.open_ring_pair(e1, e2, pt, false);
            } else if old_e1_wc == 1 && old_e2_wc == 1 {
                match self.clip_type {
                    ClipType::Union => {
                        if e1_wc2 <= 0 && e2_wc2 <= 0 {
                            self.open_ring_pair(e1, e2, pt, false);
                        }
                    }
                    ClipType::Difference => {
                        if (self.kind(e1) == PathKind::Clip && e1_wc2 > 0 && e2_wc2 > 0)
                            || (self.kind(e1) == PathKind::Subject && e1_wc2 <= 0 && e2_wc2 <= 0)
                        {
                            self.open_ring_pair(e1, e2, pt, false);
                        }
                    }
                    ClipType::Xor => {
                        self.open_ring_pair(e1, e2, pt, false);
                    }
                    ClipType::Intersection => {
                        if e1_wc2 > 0 && e2_wc2 > 0 {
                            self.open_ring_pair(e1, e2, pt, false);
                        }
                    }
                }
            }
        }
    }

    fn swap_edge_rings(&mut self, e1: usize, e2: usize) {
        let r1 = self.edges[e1].ring;
        let r2 = self.edges[e2].ring;
        if r1 == r2 {
            if let Some(r) = r1 {
                let f = self.rings[r].front;
                self.rings[r].front = self.rings[r].back;
                self.rings[r].back = f;
            }
            return;
        }
        if let Some(r) = r1 {
            if self.rings[r].front == Some(e1) {
                self.rings[r].front = Some(e2);
            } else {
                self.rings[r].back = Some(e2);
            }
        }
        if let Some(r) = r2 {
            if self.rings[r].front == Some(e2) {
                self.rings[r].front = Some(e1);
            } else {
                self.rings[r].back = Some(e1);
            }
        }
        self.edges[e1].ring = r2;
        self.edges[e2].ring = r1;
    }

    /// Another AEL edge born at the same local minimum, if it is adjacent
    /// through horizontals.
    fn matching_min_edge(&self, e: usize) -> Option<usize> {
        let lmin = self.edges[e].lmin;

        let mut probe = self.edges[e].next_ael;
        while let Some(p) = probe {
            if self.edges[p].lmin == lmin {
                return Some(p);
            }
            if !is_horizontal(&self.edges[p]) && self.edges[e].bot != self.edges[p].bot {
                break;
            }
            probe = self.edges[p].next_ael;
        }

        probe = self.edges[e].prev_ael;
        while let Some(p) = probe {
            if self.edges[p].lmin == lmin {
                return Some(p);
            }
            if !is_horizontal(&self.edges[p]) && self.edges[e].bot != self.edges[p].bot {
                return None;
            }
            probe = self.edges[p].prev_ael;
        }
        None
    }

    // -- local minima insertion -----------------------------------------

    fn insert_minima_bounds(&mut self, bot_y: i64) {
        while let Some(lmin) = self.store.pop_local_min(bot_y) {
            let vert = self.store.minima[lmin].vertex;
            let flags = self.store.verts[vert].flags;
            let pt = self.store.verts[vert].pt;

            // descending bound, unless this opens an open path
            let left = if flags & vflags::OPEN_START != 0 {
                None
            } else {
                let idx = self.edges.len();
                let mut e = Edge::new();
                e.bot = pt;
                e.curr_x = pt.x;
                e.wind_dx = -1;
                e.vtop = self.store.verts[vert].prev;
                e.top = self.store.verts[e.vtop].pt;
                e.lmin = lmin;
                set_slope(&mut e);
                self.edges.push(e);
                Some(idx)
            };

            // ascending bound, unless this ends an open path
            let right = if flags & vflags::OPEN_END != 0 {
                None
            } else {
                let idx = self.edges.len();
                let mut e = Edge::new();
                e.bot = pt;
                e.curr_x = pt.x;
                e.wind_dx = 1;
                e.vtop = self.store.verts[vert].next;
                e.top = self.store.verts[e.vtop].pt;
                e.lmin = lmin;
                set_slope(&mut e);
                self.edges.push(e);
                Some(idx)
            };

            let (mut left, mut right) = (left, right);
            if let (Some(l), Some(r)) = (left, right) {
                if is_horizontal(&self.edges[l]) {
                    if heads_right(&self.edges[l]) {
                        std::mem::swap(&mut left, &mut right);
                    }
                } else if is_horizontal(&self.edges[r]) {
                    if heads_left(&self.edges[r]) {
                        std::mem::swap(&mut left, &mut right);
                    }
                } else if self.edges[l].dx < self.edges[r].dx {
                    std::mem::swap(&mut left, &mut right);
                }
            } else if left.is_none() {
                left = right;
                right = None;
            }

            let lb = left.expect("a local minimum has at least one bound");
            self.edges[lb].left_bound = true;
            self.insert_left_edge(lb);

            let contributing = if self.is_open(lb) {
                self.wind_count_open(lb);
                self.contributing_open(lb)
            } else {
                self.wind_count_closed(lb);
                self.contributing_closed(lb)
            };

            if let Some(rb) = right {
                self.edges[rb].left_bound = false;
                self.edges[rb].wind_cnt = self.edges[lb].wind_cnt;
                self.edges[rb].wind_cnt2 = self.edges[lb].wind_cnt2;
                self.insert_right_edge(lb, rb);

                if contributing {
                    let bot = self.edges[lb].bot;
                    self.open_ring_pair(lb, rb, bot, true);
                    if !is_horizontal(&self.edges[lb]) {
                        self.check_join_left(lb, bot, false);
                    }
                }

                // bubble the right bound past any out-of-order neighbors
                while let Some(next) = self.edges[rb].next_ael {
                    if !self.valid_ael_order(next, rb) {
                        break;
                    }
                    let bot = self.edges[rb].bot;
                    self.intersect_edges(rb, next, bot);
                    self.swap_ael_neighbors(rb, next);
                }

                if is_horizontal(&self.edges[rb]) {
                    self.push_horz(rb);
                } else {
                    let bot = self.edges[rb].bot;
                    self.check_join_right(rb, bot, false);
                    let top_y = self.edges[rb].top.y;
                    self.insert_scanline(top_y);
                }
            } else if contributing {
                let bot = self.edges[lb].bot;
                self.start_open_ring(lb, bot);
            }

            if is_horizontal(&self.edges[lb]) {
                self.push_horz(lb);
            } else {
                let top_y = self.edges[lb].top.y;
                self.insert_scanline(top_y);
            }
        }
    }

    // -- horizontal processing ------------------------------------------

    #[inline]
    fn push_horz(&mut self, e: usize) {
        self.edges[e].next_sel = self.sel;
        self.sel = Some(e);
    }

    #[inline]
    fn pop_horz(&mut self) -> Option<usize> {
        let e = self.sel?;
        self.sel = self.edges[e].next_sel;
        Some(e)
    }

    /// The last vertex of this horizontal run, if it tops out there.
    fn horz_max_vertex(&self, e: usize) -> Option<usize> {
        let verts = &self.store.verts;
        let mut v = self.edges[e].vtop;
        if self.is_open(e) {
            if self.edges[e].wind_dx > 0 {
                while verts[verts[v].next].pt.y == verts[v].pt.y
                    && verts[v].flags & (vflags::OPEN_END | vflags::LOCAL_MAX) == 0
                {
                    v = verts[v].next;
                }
            } else {
                while verts[verts[v].prev].pt.y == verts[v].pt.y
                    && verts[v].flags & (vflags::OPEN_END | vflags::LOCAL_MAX) == 0
                {
                    v = verts[v].prev;
                }
            }
        } else if self.edges[e].wind_dx > 0 {
            while verts[verts[v].next].pt.y == verts[v].pt.y {
                v = verts[v].next;
            }
        } else {
            while verts[verts[v].prev].pt.y == verts[v].pt.y {
                v = verts[v].prev;
            }
        }
        if verts[v].is_local_max() {
            Some(v)
        } else {
            None
        }
    }

    fn horz_direction(&self, horz: usize, max_vertex: Option<usize>) -> (i64, i64, bool) {
        let e = &self.edges[horz];
        if e.bot.x == e.top.x {
            // degenerate: look along the AEL for the maxima pair
            let mut probe = e.next_ael;
            while let Some(p) = probe {
                if Some(self.edges[p].vtop) == max_vertex {
                    return (e.curr_x, e.curr_x, true);
                }
                probe = self.edges[p].next_ael;
            }
            (e.curr_x, e.curr_x, false)
        } else if e.curr_x < e.top.x {
            (e.curr_x, e.top.x, true)
        } else {
            (e.top.x, e.curr_x, false)
        }
    }

    /// Sweep one horizontal edge across the row, emitting contributions and
    /// swapping neighbors exactly as a slightly tilted edge would.
    fn sweep_horizontal(&mut self, horz: usize) {
        let horz_is_open = self.is_open(horz);
        let y = self.edges[horz].bot.y;

        let max_vertex = self.horz_max_vertex(horz);
        let (mut left_x, mut right_x, mut left_to_right) = self.horz_direction(horz, max_vertex);

        if is_hot(&self.edges[horz]) {
            let curr_x = self.edges[horz].curr_x;
            let node = self.add_node(horz, Point64::new(curr_x, y));
            let ring = self.nodes[node].ring;
            if !self.rings[ring].is_open {
                self.stage_horz_span(node);
            }
        }

        loop {
            let mut probe = if left_to_right {
                self.edges[horz].next_ael
            } else {
                self.edges[horz].prev_ael
            };

            while let Some(e) = probe {
                if Some(self.edges[e].vtop) == max_vertex {
                    // the horizontal ends against its maxima pair
                    if is_hot(&self.edges[horz]) && is_spliced(&self.edges[e]) {
                        let top = self.edges[e].top;
                        self.split_spliced(e, top);
                    }
                    if is_hot(&self.edges[horz]) {
                        while Some(self.edges[horz].vtop) != max_vertex {
                            let top = self.edges[horz].top;
                            self.add_node(horz, top);
                            self.advance_edge(horz);
                        }
                        let top = self.edges[horz].top;
                        if left_to_right {
                            self.close_ring_pair(horz, e, top);
                        } else {
                            self.close_ring_pair(e, horz, top);
                        }
                    }
                    self.delete_from_ael(e);
                    self.delete_from_ael(horz);
                    return;
                }

                // stop scanning past the end of this horizontal run
                if max_vertex != Some(self.edges[horz].vtop) || self.is_open_end(horz) {
                    if (left_to_right && self.edges[e].curr_x > right_x)
                        || (!left_to_right && self.edges[e].curr_x < left_x)
                    {
                        break;
                    }

                    if self.edges[e].curr_x == self.edges[horz].top.x
                        && !is_horizontal(&self.edges[e])
                    {
                        let next_pt = self.store.verts[self.next_vertex(horz)].pt;
                        // a vertical-ish neighbor at the very end of the run:
                        // defer when it would land past the next vertex
                        let ex = top_x(&self.edges[e], next_pt.y);
                        if left_to_right {
                            if self.is_open(e)
                                && !self.same_kind(e, horz)
                                && !is_hot(&self.edges[e])
                            {
                                if ex > next_pt.x {
                                    break;
                                }
                            } else if ex >= next_pt.x {
                                break;
                            }
                        } else if self.is_open(e)
                            && !self.same_kind(e, horz)
                            && !is_hot(&self.edges[e])
                        {
                            if ex < next_pt.x {
                                break;
                            }
                        } else if ex <= next_pt.x {
                            break;
                        }
                    }
                }

                let pt = Point64::new(self.edges[e].curr_x, y);
                if left_to_right {
                    self.intersect_edges(horz, e, pt);
                    self.swap_ael_neighbors(horz, e);
                    self.check_join_left(e, pt, false);
                    self.edges[horz].curr_x = self.edges[e].curr_x;
                    probe = self.edges[horz].next_ael;
                } else {
                    self.intersect_edges(e, horz, pt);
                    self.swap_ael_neighbors(e, horz);
                    self.check_join_right(e, pt, false);
                    self.edges[horz].curr_x = self.edges[e].curr_x;
                    probe = self.edges[horz].prev_ael;
                }
                if is_hot(&self.edges[horz]) {
                    if let Some(last) = self.last_node(horz) {
                        self.stage_horz_span(last);
                    }
                }
            }

            if horz_is_open && self.is_open_end(horz) {
                // open path ends mid-row
                if is_hot(&self.edges[horz]) {
                    let top = self.edges[horz].top;
                    self.add_node(horz, top);
                    if self.is_front(horz) {
                        let r = self.edges[horz].ring.expect("hot edge");
                        self.rings[r].front = None;
                    } else {
                        let r = self.edges[horz].ring.expect("hot edge");
                        self.rings[r].back = None;
                    }
                    self.edges[horz].ring = None;
                }
                self.delete_from_ael(horz);
                return;
            }

            let next_pt = self.store.verts[self.next_vertex(horz)].pt;
            if next_pt.y != self.edges[horz].top.y {
                break;
            }

            // consecutive horizontals
            if is_hot(&self.edges[horz]) {
                let top = self.edges[horz].top;
                self.add_node(horz, top);
            }
            self.advance_edge(horz);

            let dir = self.horz_direction(horz, max_vertex);
            left_x = dir.0;
            right_x = dir.1;
            left_to_right = dir.2;
        }

        if is_hot(&self.edges[horz]) {
            let top = self.edges[horz].top;
            let node = self.add_node(horz, top);
            self.stage_horz_span(node);
        }
        self.advance_edge(horz);
    }

    /// Drop collinear continuation vertices from a horizontal edge top.
    fn trim_horizontal(&mut self, e: usize) {
        let mut trimmed = false;
        let mut pt = self.store.verts[self.next_vertex(e)].pt;

        while pt.y == self.edges[e].top.y {
            if self.preserve_collinear
                && (pt.x < self.edges[e].top.x) != (self.edges[e].bot.x < self.edges[e].top.x)
            {
                break; // direction reversal: a spike worth keeping for now
            }
            self.edges[e].vtop = self.next_vertex(e);
            self.edges[e].top = pt;
            trimmed = true;
            if self.at_local_max(e) {
                break;
            }
            pt = self.store.verts[self.next_vertex(e)].pt;
        }
        if trimmed {
            set_slope(&mut self.edges[e]);
        }
    }

    /// Move an edge to its successor segment in the same bound.
    fn advance_edge(&mut self, e: usize) {
        self.edges[e].bot = self.edges[e].top;
        self.edges[e].vtop = self.next_vertex(e);
        let vtop = self.edges[e].vtop;
        self.edges[e].top = self.store.verts[vtop].pt;
        self.edges[e].curr_x = self.edges[e].bot.x;
        set_slope(&mut self.edges[e]);

        if is_spliced(&self.edges[e]) {
            let bot = self.edges[e].bot;
            self.split_spliced(e, bot);
        }

        if is_horizontal(&self.edges[e]) {
            if !self.is_open(e) {
                self.trim_horizontal(e);
            }
            return;
        }
        let top_y = self.edges[e].top.y;
        self.insert_scanline(top_y);

        let bot = self.edges[e].bot;
        self.check_join_left(e, bot, false);
        self.check_join_right(e, bot, true);
    }

    // -- intersections between scanlines ---------------------------------

    fn record_crossing(&mut self, e1: usize, e2: usize, top_y: i64) {
        let (b1, t1, dx1) = (self.edges[e1].bot, self.edges[e1].top, self.edges[e1].dx);
        let (b2, t2, dx2) = (self.edges[e2].bot, self.edges[e2].top, self.edges[e2].dx);

        let mut ip = segment_intersect_pt(b1, t1, b2, t2)
            .unwrap_or(Point64::new(self.edges[e1].curr_x, top_y));

        if ip.y > self.bot_y || ip.y < top_y {
            // rounding pushed the crossing outside the scanbeam; snap back
            let abs_dx1 = dx1.abs();
            let abs_dx2 = dx2.abs();
            if abs_dx1 > 100.0 && abs_dx2 > 100.0 {
                if abs_dx1 > abs_dx2 {
                    ip = closest_point_on_segment(ip, b1, t1);
                } else {
                    ip = closest_point_on_segment(ip, b2, t2);
                }
            } else if abs_dx1 > 100.0 {
                ip = closest_point_on_segment(ip, b1, t1);
            } else if abs_dx2 > 100.0 {
                ip = closest_point_on_segment(ip, b2, t2);
            } else {
                ip.y = if ip.y < top_y { top_y } else { self.bot_y };
                ip.x = if abs_dx1 < abs_dx2 {
                    top_x(&self.edges[e1], ip.y)
                } else {
                    top_x(&self.edges[e2], ip.y)
                };
            }
        }
        self.crossings.push(Crossing { pt: ip, e1, e2 });
    }

    fn copy_ael_to_sel(&mut self, top_y: i64) {
        let mut e = self.ael;
        self.sel = e;
        while let Some(i) = e {
            self.edges[i].prev_sel = self.edges[i].prev_ael;
            self.edges[i].next_sel = self.edges[i].next_ael;
            self.edges[i].jump = self.edges[i].next_ael;
            self.edges[i].curr_x = top_x(&self.edges[i], top_y);
            e = self.edges[i].next_ael;
        }
    }

    fn extract_from_sel(&mut self, e: usize) -> Option<usize> {
        let next = self.edges[e].next_sel;
        if let Some(n) = next {
            self.edges[n].prev_sel = self.edges[e].prev_sel;
        }
        if let Some(p) = self.edges[e].prev_sel {
            self.edges[p].next_sel = next;
        }
        self.edges[e].prev_sel = None;
        self.edges[e].next_sel = None;
        next
    }

    fn insert_before_in_sel(&mut self, item: usize, before: usize) {
        let prev = self.edges[before].prev_sel;
        self.edges[item].prev_sel = prev;
        if let Some(p) = prev {
            self.edges[p].next_sel = Some(item);
        }
        self.edges[item].next_sel = Some(before);
        self.edges[before].prev_sel = Some(item);
    }

    /// Merge-sort the SEL into top-of-scanbeam order; every exchange is a
    /// crossing inside the beam. Only AEL neighbors can cross, which is why
    /// pairwise-adjacent exchanges find every intersection.
    fn collect_crossings(&mut self, top_y: i64) -> bool {
        let Some(head) = self.ael else { return false };
        if self.edges[head].next_ael.is_none() {
            return false;
        }
        self.copy_ael_to_sel(top_y);

        // bottom-up merge passes: each pass fuses adjacent sorted runs,
        // doubling run length, until the whole SEL is one sorted run
        let mut pass_head = self.sel;
        while pass_head.is_some() && self.edges[pass_head.expect("head")].jump.is_some() {
            let mut prev_base: Option<usize> = None;
            let mut left = pass_head;

            while let Some(l) = left {
                let Some(right0) = self.edges[l].jump else { break };
                let mut curr_base = l;
                let mut left_scan = l;
                let mut l_end = right0;
                let mut right_scan = right0;
                let r_end = self.edges[right0].jump;
                self.edges[l].jump = r_end;

                while left_scan != l_end && Some(right_scan) != r_end {
                    if self.edges[right_scan].curr_x < self.edges[left_scan].curr_x {
                        // right_scan crosses everything back to left_scan
                        let mut tmp = self.edges[right_scan].prev_sel;
                        loop {
                            let Some(t) = tmp else { break };
                            self.record_crossing(t, right_scan, top_y);
                            if t == left_scan {
                                break;
                            }
                            tmp = self.edges[t].prev_sel;
                        }
                        let moved = right_scan;
                        let after = self.extract_from_sel(moved);
                        let Some(after) = after else {
                            self.insert_before_in_sel(moved, left_scan);
                            if left_scan == curr_base {
                                curr_base = moved;
                                self.edges[curr_base].jump = r_end;
                                match prev_base {
                                    None => self.sel = Some(curr_base),
                                    Some(pb) => self.edges[pb].jump = Some(curr_base),
                                }
                            }
                            break;
                        };
                        l_end = after;
                        right_scan = after;
                        self.insert_before_in_sel(moved, left_scan);
                        if left_scan == curr_base {
                            curr_base = moved;
                            self.edges[curr_base].jump = r_end;
                            match prev_base {
                                None => self.sel = Some(curr_base),
                                Some(pb) => self.edges[pb].jump = Some(curr_base),
                            }
                        }
                    } else {
                        left_scan = match self.edges[left_scan].next_sel {
                            Some(n) => n,
                            None => break,
                        };
                    }
                }
                prev_base = Some(curr_base);
                left = r_end;
            }
            pass_head = self.sel;
        }
        !self.crossings.is_empty()
    }

    fn commit_crossings(&mut self) {
        // bottom-up, then left to right
        self.crossings.sort_by(|a, b| {
            b.pt.y.cmp(&a.pt.y).then(a.pt.x.cmp(&b.pt.x))
        });

        for i in 0..self.crossings.len() {
            // commit only adjacent pairs, deferring the rest
            if !self.adjacent_in_ael(self.crossings[i]) {
                let mut j = i + 1;
                while j < self.crossings.len() && !self.adjacent_in_ael(self.crossings[j]) {
                    j += 1;
                }
                if j < self.crossings.len() {
                    self.crossings.swap(i, j);
                }
            }

            let Crossing { pt, e1, e2 } = self.crossings[i];
            self.intersect_edges(e1, e2, pt);
            self.swap_ael_neighbors(e1, e2);
            self.edges[e1].curr_x = pt.x;
            self.edges[e2].curr_x = pt.x;
            self.check_join_left(e2, pt, true);
            self.check_join_right(e1, pt, true);
        }
    }

    #[inline]
    fn adjacent_in_ael(&self, c: Crossing) -> bool {
        self.edges[c.e1].next_ael == Some(c.e2) || self.edges[c.e1].prev_ael == Some(c.e2)
    }

    // -- top of scanbeam -------------------------------------------------

    fn advance_scanline_top(&mut self, y: i64) {
        self.sel = None;
        let mut e = self.ael;
        while let Some(i) = e {
            if self.edges[i].top.y == y {
                self.edges[i].curr_x = self.edges[i].top.x;
                if self.at_local_max(i) {
                    e = self.close_maxima(i);
                    continue;
                }
                if is_hot(&self.edges[i]) {
                    let top = self.edges[i].top;
                    self.add_node(i, top);
                }
                self.advance_edge(i);
                if is_horizontal(&self.edges[i]) {
                    self.push_horz(i);
                }
            } else {
                self.edges[i].curr_x = top_x(&self.edges[i], y);
            }
            e = self.edges[i].next_ael;
        }
    }

    fn maxima_pair(&self, e: usize) -> Option<usize> {
        let mut probe = self.edges[e].next_ael;
        while let Some(p) = probe {
            if self.edges[p].vtop == self.edges[e].vtop {
                return Some(p);
            }
            probe = self.edges[p].next_ael;
        }
        None
    }

    fn close_maxima(&mut self, e: usize) -> Option<usize> {
        let prev = self.edges[e].prev_ael;
        let mut next = self.edges[e].next_ael;

        if self.is_open_end(e) {
            if is_hot(&self.edges[e]) {
                let top = self.edges[e].top;
                self.add_node(e, top);
            }
            if !is_horizontal(&self.edges[e]) {
                if is_hot(&self.edges[e]) {
                    let r = self.edges[e].ring.expect("hot edge");
                    if self.is_front(e) {
                        self.rings[r].front = None;
                    } else {
                        self.rings[r].back = None;
                    }
                    self.edges[e].ring = None;
                }
                self.delete_from_ael(e);
            }
            return next;
        }

        let Some(pair) = self.maxima_pair(e) else { return next };

        if is_spliced(&self.edges[e]) {
            let top = self.edges[e].top;
            self.split_spliced(e, top);
        }
        if is_spliced(&self.edges[pair]) {
            let top = self.edges[pair].top;
            self.split_spliced(pair, top);
        }

        // flush the edges trapped between the maxima pair
        while next != Some(pair) {
            let Some(n) = next else { break };
            let top = self.edges[e].top;
            self.intersect_edges(e, n, top);
            self.swap_ael_neighbors(e, n);
            next = self.edges[e].next_ael;
        }

        if self.is_open(e) {
            if is_hot(&self.edges[e]) {
                let top = self.edges[e].top;
                self.close_ring_pair(e, pair, top);
            }
            self.delete_from_ael(pair);
            self.delete_from_ael(e);
        } else {
            if is_hot(&self.edges[e]) {
                let top = self.edges[e].top;
                self.close_ring_pair(e, pair, top);
            }
            self.delete_from_ael(e);
            self.delete_from_ael(pair);
        }
        match prev {
            Some(p) => self.edges[p].next_ael,
            None => self.ael,
        }
    }

    // -- horizontal spans and splices ------------------------------------

    fn stage_horz_span(&mut self, node: usize) {
        if self.nodes[node].span.is_some() {
            return;
        }
        let idx = self.spans.len();
        self.spans.push(HorzSpan { left: Some(node), right: None, left_to_right: true });
        self.nodes[node].span = Some(idx);
    }

    fn last_node(&self, hot_edge: usize) -> Option<usize> {
        let ring = self.edges[hot_edge].ring?;
        let start = self.rings[ring].start?;
        if self.rings[ring].front == Some(hot_edge) {
            Some(start)
        } else {
            Some(self.nodes[start].next)
        }
    }

    /// Grow each staged span to its full horizontal run, then splice pairs of
    /// overlapping opposite-direction spans so coincident horizontals merge.
    fn merge_horz_spans(&mut self) {
        let mut valid = 0usize;
        for i in 0..self.spans.len() {
            let Some(node) = self.spans[i].left else { continue };
            let Some(ring) = self.real_ring(self.nodes[node].ring) else {
                continue;
            };
            let has_edges = self.rings[ring].front.is_some();
            let row = self.nodes[node].pt.y;

            let mut left = node;
            let mut right = node;
            if has_edges {
                let anchor = self.rings[ring].start.expect("live ring");
                let stop = self.nodes[anchor].next;
                while left != stop && self.nodes[self.nodes[left].prev].pt.y == row {
                    left = self.nodes[left].prev;
                }
                while right != anchor && self.nodes[self.nodes[right].next].pt.y == row {
                    right = self.nodes[right].next;
                }
            } else {
                while self.nodes[left].prev != right
                    && self.nodes[self.nodes[left].prev].pt.y == row
                {
                    left = self.nodes[left].prev;
                }
                while self.nodes[right].next != left
                    && self.nodes[self.nodes[right].next].pt.y == row
                {
                    right = self.nodes[right].next;
                }
            }

            if self.nodes[left].pt.x == self.nodes[right].pt.x {
                self.spans[i].right = None;
                continue;
            }
            if self.nodes[left].pt.x < self.nodes[right].pt.x {
                self.spans[i] = HorzSpan {
                    left: Some(left),
                    right: Some(right),
                    left_to_right: true,
                };
            } else {
                self.spans[i] = HorzSpan {
                    left: Some(right),
                    right: Some(left),
                    left_to_right: false,
                };
            }
            let anchor_node = self.spans[i].left.expect("span anchor");
            if self.nodes[anchor_node].span.is_some() && self.nodes[anchor_node].span != Some(i) {
                self.spans[i].right = None;
                continue;
            }
            self.nodes[anchor_node].span = Some(i);
            valid += 1;
        }
        if valid < 2 {
            return;
        }

        // usable spans first, ordered by left x
        let nodes = &self.nodes;
        self.spans.sort_by(|a, b| {
            match (a.right.is_some(), b.right.is_some()) {
                (true, false) => std::cmp::Ordering::Less,
                (false, true) => std::cmp::Ordering::Greater,
                (false, false) => std::cmp::Ordering::Equal,
                (true, true) => {
                    let ax = nodes[a.left.expect("span anchor")].pt.x;
                    let bx = nodes[b.left.expect("span anchor")].pt.x;
                    ax.cmp(&bx)
                }
            }
        });

        for i in 0..self.spans.len() {
            if self.spans[i].right.is_none() {
                break;
            }
            for j in (i + 1)..self.spans.len() {
                if self.spans[j].right.is_none() {
                    break;
                }
                let i_left_x = self.nodes[self.spans[i].left.expect("span")].pt.x;
                let i_right_x = self.nodes[self.spans[i].right.expect("span")].pt.x;
                let j_left_x = self.nodes[self.spans[j].left.expect("span")].pt.x;
                let j_right_x = self.nodes[self.spans[j].right.expect("span")].pt.x;
                if j_left_x >= i_right_x
                    || self.spans[j].left_to_right == self.spans[i].left_to_right
                    || j_right_x <= i_left_x
                {
                    continue;
                }

                let row = self.nodes[self.spans[i].left.expect("span")].pt.y;
                if self.spans[i].left_to_right {
                    let mut a = self.spans[i].left.expect("span");
                    while self.nodes[self.nodes[a].next].pt.y == row
                        && self.nodes[self.nodes[a].next].pt.x <= j_left_x
                    {
                        a = self.nodes[a].next;
                    }
                    let mut b = self.spans[j].left.expect("span");
                    while self.nodes[self.nodes[b].prev].pt.y == row
                        && self.nodes[self.nodes[b].prev].pt.x <= self.nodes[a].pt.x
                    {
                        b = self.nodes[b].prev;
                    }
                    let a2 = self.duplicate_node(a, true);
                    let b2 = self.duplicate_node(b, false);
                    self.splices.push(HorzSplice { a: a2, b: b2 });
                } else {
                    let mut a = self.spans[i].left.expect("span");
                    while self.nodes[self.nodes[a].prev].pt.y == row
                        && self.nodes[self.nodes[a].prev].pt.x <= j_left_x
                    {
                        a = self.nodes[a].prev;
                    }
                    let mut b = self.spans[j].left.expect("span");
                    while self.nodes[self.nodes[b].next].pt.y == row
                        && self.nodes[self.nodes[b].next].pt.x <= self.nodes[a].pt.x
                    {
                        b = self.nodes[b].next;
                    }
                    let b2 = self.duplicate_node(b, true);
                    let a2 = self.duplicate_node(a, false);
                    self.splices.push(HorzSplice { a: b2, b: a2 });
                }
            }
        }
    }

    fn apply_horz_splices(&mut self) {
        for k in 0..self.splices.len() {
            let HorzSplice { a, b } = self.splices[k];
            let Some(r1) = self.real_ring(self.nodes[a].ring) else { continue };
            let Some(r2) = self.real_ring(self.nodes[b].ring) else { continue };

            let a_next = self.nodes[a].next;
            let b_prev = self.nodes[b].prev;
            self.nodes[a].next = b;
            self.nodes[b].prev = a;
            self.nodes[a_next].prev = b_prev;
            self.nodes[b_prev].next = a_next;

            if r1 == r2 {
                // the splice split one ring into two
                let r_new = self.new_ring();
                self.rings[r_new].start = Some(a_next);
                self.relabel_ring_nodes(r_new);

                if self.rings[r1]
                    .start
                    .map(|s| self.nodes[s].ring)
                    == Some(r_new)
                {
                    self.rings[r1].start = Some(a);
                    self.nodes[a].ring = r1;
                }

                if self.using_tree {
                    let r1_start = self.rings[r1].start.expect("live ring");
                    let rn_start = self.rings[r_new].start.expect("live ring");
                    if self.ring_inside_ring(r1_start, rn_start) {
                        // the fragment encloses the original: swap them
                        let tmp = self.rings[r1].start;
                        self.rings[r1].start = self.rings[r_new].start;
                        self.rings[r_new].start = tmp;
                        self.relabel_ring_nodes(r1);
                        self.relabel_ring_nodes(r_new);
                        self.rings[r_new].owner = Some(r1);
                    } else if self.ring_inside_ring(rn_start, r1_start) {
                        self.rings[r_new].owner = Some(r1);
                    } else {
                        self.rings[r_new].owner = self.rings[r1].owner;
                    }
                    self.rings[r1].splits.push(r_new);
                } else {
                    self.rings[r_new].owner = Some(r1);
                }
            } else {
                self.rings[r2].start = None;
                if self.using_tree {
                    self.set_ring_owner(r2, r1);
                    self.move_splits(r2, r1);
                } else {
                    self.rings[r2].owner = Some(r1);
                }
            }
        }
    }

    // -- ring containment over nodes -------------------------------------

    fn point_in_ring(&self, pt: Point64, start: usize) -> PointPlacement {
        let next = self.nodes[start].next;
        if next == start || self.nodes[start].prev == next {
            return PointPlacement::Outside;
        }

        let mut op = start;
        loop {
            if self.nodes[op].pt.y != pt.y {
                break;
            }
            op = self.nodes[op].next;
            if op == start {
                break;
            }
        }
        if self.nodes[op].pt.y == pt.y {
            return PointPlacement::Outside; // flat ring
        }

        let mut is_above = self.nodes[op].pt.y < pt.y;
        let starting_above = is_above;
        let mut val = 0;
        let mut op2 = self.nodes[op].next;
        while op2 != op {
            if is_above {
                while op2 != op && self.nodes[op2].pt.y < pt.y {
                    op2 = self.nodes[op2].next;
                }
            } else {
                while op2 != op && self.nodes[op2].pt.y > pt.y {
                    op2 = self.nodes[op2].next;
                }
            }
            if op2 == op {
                break;
            }

            if self.nodes[op2].pt.y == pt.y {
                let prev = self.nodes[op2].prev;
                if self.nodes[op2].pt.x == pt.x
                    || (self.nodes[op2].pt.y == self.nodes[prev].pt.y
                        && (pt.x < self.nodes[prev].pt.x) != (pt.x < self.nodes[op2].pt.x))
                {
                    return PointPlacement::OnEdge;
                }
                op2 = self.nodes[op2].next;
                if op2 == op {
                    break;
                }
                continue;
            }

            let prev = self.nodes[op2].prev;
            if pt.x >= self.nodes[prev].pt.x || pt.x >= self.nodes[op2].pt.x {
                if pt.x > self.nodes[prev].pt.x && pt.x > self.nodes[op2].pt.x {
                    val = 1 - val;
                } else {
                    let d = cross_sign(self.nodes[prev].pt, self.nodes[op2].pt, pt);
                    if d == 0 {
                        return PointPlacement::OnEdge;
                    }
                    if (d < 0) == is_above {
                        val = 1 - val;
                    }
                }
            }
            is_above = !is_above;
            op2 = self.nodes[op2].next;
        }

        if is_above != starting_above {
            let prev = self.nodes[op2].prev;
            let d = cross_sign(self.nodes[prev].pt, self.nodes[op2].pt, pt);
            if d == 0 {
                return PointPlacement::OnEdge;
            }
            if (d < 0) == is_above {
                val = 1 - val;
            }
        }

        if val == 0 {
            PointPlacement::Outside
        } else {
            PointPlacement::Inside
        }
    }

    /// Does the ring at `inner_start` nest inside the one at `outer_start`?
    fn ring_inside_ring(&self, inner_start: usize, outer_start: usize) -> bool {
        let mut verdict = PointPlacement::OnEdge;
        let mut op = inner_start;
        loop {
            match self.point_in_ring(self.nodes[op].pt, outer_start) {
                PointPlacement::Outside => {
                    if verdict == PointPlacement::Outside {
                        return false;
                    }
                    verdict = PointPlacement::Outside;
                }
                PointPlacement::Inside => {
                    if verdict == PointPlacement::Inside {
                        return true;
                    }
                    verdict = PointPlacement::Inside;
                }
                PointPlacement::OnEdge => {}
            }
            op = self.nodes[op].next;
            if op == inner_start {
                break;
            }
        }
        // boundary-heavy result: compare cleaned copies instead
        let inner = self.clean_ring_path(inner_start);
        let outer = self.clean_ring_path(outer_start);
        crate::geom::path_inside_path(&inner, &outer)
    }

    /// Copy a ring to a path, skipping duplicates and collinear runs.
    fn clean_ring_path(&self, start: usize) -> Path64 {
        let mut path = Path64::new();
        let mut op = start;
        loop {
            let prev = self.nodes[op].prev;
            let next = self.nodes[op].next;
            if self.nodes[op].pt != self.nodes[prev].pt
                && !is_collinear(self.nodes[prev].pt, self.nodes[op].pt, self.nodes[next].pt)
            {
                path.push(self.nodes[op].pt);
            }
            op = next;
            if op == start {
                break;
            }
        }
        path
    }

    // -- emitted-ring cleanup --------------------------------------------

    /// Remove collinear runs (or just spikes when preserving collinearity),
    /// then split any residual self-intersections.
    fn tidy_ring(&mut self, ring: usize) {
        let Some(ring) = self.real_ring(ring) else { return };
        if self.rings[ring].is_open {
            return;
        }
        if !self.valid_closed_ring(self.rings[ring].start) {
            self.drop_ring_nodes(ring);
            return;
        }

        let mut anchor = self.rings[ring].start.expect("live ring");
        let mut op = anchor;
        loop {
            let prev = self.nodes[op].prev;
            let next = self.nodes[op].next;
            let p_pt = self.nodes[prev].pt;
            let o_pt = self.nodes[op].pt;
            let n_pt = self.nodes[next].pt;

            if is_collinear(p_pt, o_pt, n_pt)
                && (o_pt == p_pt
                    || o_pt == n_pt
                    || !self.preserve_collinear
                    || dot_abc(p_pt, o_pt, n_pt) < 0)
            {
                if Some(op) == self.rings[ring].start {
                    self.rings[ring].start = Some(prev);
                }
                op = self.unlink_node(op);
                if !self.valid_closed_ring(Some(op)) {
                    self.drop_ring_nodes(ring);
                    return;
                }
                anchor = op;
                continue;
            }
            op = self.nodes[op].next;
            if op == anchor {
                break;
            }
        }
        self.repair_self_crossings(ring);
    }

    fn repair_self_crossings(&mut self, ring: usize) {
        let Some(start) = self.rings[ring].start else { return };
        if self.nodes[start].prev == self.nodes[self.nodes[start].next].next {
            return; // triangles cannot self-intersect
        }

        let mut op = start;
        loop {
            let prev = self.nodes[op].prev;
            let next = self.nodes[op].next;
            let next2 = self.nodes[next].next;

            if segments_cross(
                self.nodes[prev].pt,
                self.nodes[op].pt,
                self.nodes[next].pt,
                self.nodes[next2].pt,
                false,
            ) {
                let next3 = self.nodes[next2].next;
                if segments_cross(
                    self.nodes[prev].pt,
                    self.nodes[op].pt,
                    self.nodes[next2].pt,
                    self.nodes[next3].pt,
                    false,
                ) {
                    // consecutive micro-intersections: pinch the vertex out
                    op = self.duplicate_node(op, false);
                    let target = self.nodes[self.nodes[self.nodes[op].next].next].next;
                    self.nodes[op].pt = self.nodes[target].pt;
                    op = self.nodes[op].next;
                } else {
                    if Some(op) == self.rings[ring].start
                        || Some(next) == self.rings[ring].start
                    {
                        let s = self.rings[ring].start.expect("live ring");
                        self.rings[ring].start = Some(self.nodes[s].prev);
                    }
                    self.split_ring_at(ring, op);
                    let Some(new_start) = self.rings[ring].start else { return };
                    op = new_start;
                    let p = self.nodes[op].prev;
                    let nn = self.nodes[self.nodes[op].next].next;
                    if p == nn {
                        return; // shrunk to a triangle
                    }
                    continue;
                }
            } else {
                op = self.nodes[op].next;
            }
            if Some(op) == self.rings[ring].start {
                break;
            }
        }
    }

    /// Cut a self-intersection out of a ring, spawning a sibling ring when the
    /// severed loop is large enough to keep.
    fn split_ring_at(&mut self, ring: usize, split_op: usize) {
        let prev = self.nodes[split_op].prev;
        let next = self.nodes[split_op].next;
        let next2 = self.nodes[next].next;
        self.rings[ring].start = Some(prev);

        let ip = segment_intersect_pt(
            self.nodes[prev].pt,
            self.nodes[split_op].pt,
            self.nodes[next].pt,
            self.nodes[next2].pt,
        )
        .unwrap_or(self.nodes[prev].pt);

        let area1 = self.ring_area(prev);
        let abs_area1 = area1.abs();
        if abs_area1 < 2.0 {
            self.drop_ring_nodes(ring);
            return;
        }

        let area2 = area_triangle(ip, self.nodes[split_op].pt, self.nodes[next].pt);
        let abs_area2 = area2.abs();

        // unlink split_op..next, inserting the crossing point
        if ip == self.nodes[prev].pt || ip == self.nodes[next2].pt {
            self.nodes[next2].prev = prev;
            self.nodes[prev].next = next2;
        } else {
            let mid = self.new_node(ip, self.nodes[prev].ring);
            self.nodes[mid].prev = prev;
            self.nodes[mid].next = next2;
            self.nodes[next2].prev = mid;
            self.nodes[prev].next = mid;
        }

        if abs_area2 >= 1.0 && (abs_area2 > abs_area1 || (area2 > 0.0) == (area1 > 0.0)) {
            let new_ring = self.new_ring();
            self.rings[new_ring].owner = self.rings[ring].owner;
            self.nodes[split_op].ring = new_ring;
            self.nodes[next].ring = new_ring;

            let anchor = self.new_node(ip, new_ring);
            self.nodes[anchor].prev = next;
            self.nodes[anchor].next = split_op;
            self.rings[new_ring].start = Some(anchor);
            self.nodes[split_op].prev = anchor;
            self.nodes[next].next = anchor;

            if self.using_tree {
                if self.ring_inside_ring(prev, anchor) {
                    self.rings[new_ring].splits.push(ring);
                } else {
                    self.rings[ring].splits.push(new_ring);
                }
            }
        }
        // otherwise the severed sliver is simply discarded
    }

    // -- finalization -----------------------------------------------------

    fn build_ring_path(&self, start: usize, reverse: bool, is_open: bool) -> Option<Path64> {
        let next = self.nodes[start].next;
        if next == start || (!is_open && next == self.nodes[start].prev) {
            return None;
        }
        let mut path = Path64::new();
        let (mut last_pt, mut op, anchor);
        if reverse {
            anchor = start;
            last_pt = self.nodes[start].pt;
            op = self.nodes[start].prev;
        } else {
            anchor = next;
            last_pt = self.nodes[next].pt;
            op = self.nodes[next].next;
        }
        path.push(last_pt);
        while op != anchor {
            if self.nodes[op].pt != last_pt {
                last_pt = self.nodes[op].pt;
                path.push(last_pt);
            }
            op = if reverse { self.nodes[op].prev } else { self.nodes[op].next };
        }
        if !is_open && path.len() == 3 && self.tiny_triangle(anchor) {
            return None;
        }
        if path.len() >= 2 {
            Some(path)
        } else {
            None
        }
    }

    /// Cache a ring's path and bounds; false when the ring degenerates.
    fn check_bounds(&mut self, ring: usize) -> bool {
        if self.rings[ring].start.is_none() {
            return false;
        }
        if !self.rings[ring].bounds.is_empty() {
            return true;
        }
        self.tidy_ring(ring);
        let Some(start) = self.rings[ring].start else { return false };
        match self.build_ring_path(start, self.reverse_solution, false) {
            None => {
                self.rings[ring].path = Path64::new();
                false
            }
            Some(path) => {
                self.rings[ring].bounds = bounds(&path);
                self.rings[ring].path = path;
                true
            }
        }
    }

    fn check_split_owner(&mut self, ring: usize, splits: &[usize]) -> bool {
        for &split in splits {
            if self.rings[split].start.is_none() && !self.rings[split].splits.is_empty() {
                let nested = self.rings[split].splits.clone();
                if self.check_split_owner(ring, &nested) {
                    return true;
                }
            }
            let split = match self.real_ring(split) {
                Some(s) if s != ring => s,
                _ => continue,
            };
            if self.rings[split].split_probe == Some(ring) {
                continue;
            }
            self.rings[split].split_probe = Some(ring);

            if !self.rings[split].splits.is_empty() {
                let nested = self.rings[split].splits.clone();
                if self.check_split_owner(ring, &nested) {
                    return true;
                }
            }
            if !self.check_bounds(split) {
                continue;
            }
            let ring_bounds = self.rings[ring].bounds;
            if !self.rings[split].bounds.contains_rect(&ring_bounds) {
                continue;
            }
            let ring_start = self.rings[ring].start.expect("checked ring");
            let split_start = self.rings[split].start.expect("checked ring");
            if !self.ring_inside_ring(ring_start, split_start) {
                continue;
            }
            if !self.owner_chain_excludes(ring, split) {
                self.rings[split].owner = self.rings[ring].owner;
            }
            self.rings[ring].owner = Some(split);
            return true;
        }
        false
    }

    /// Resolve the real owner of a ring, then attach it (and transitively its
    /// owners) to the output tree.
    fn place_in_tree(&mut self, ring: usize, tree: &mut PolyTree) {
        if self.rings[ring].tree_node.is_some() || self.rings[ring].bounds.is_empty() {
            return;
        }

        while let Some(owner) = self.rings[ring].owner {
            if !self.rings[owner].splits.is_empty() {
                let splits = self.rings[owner].splits.clone();
                if self.check_split_owner(ring, &splits) {
                    break;
                }
            }
            if self.rings[owner].start.is_some() && self.check_bounds(owner) {
                let ring_bounds = self.rings[ring].bounds;
                if self.rings[owner].bounds.contains_rect(&ring_bounds) {
                    let ring_start = self.rings[ring].start.expect("bounded ring");
                    let owner_start = self.rings[owner].start.expect("bounded ring");
                    if self.ring_inside_ring(ring_start, owner_start) {
                        break;
                    }
                }
            }
            self.rings[ring].owner = self.rings[owner].owner;
        }

        let path = self.rings[ring].path.clone();
        match self.rings[ring].owner {
            Some(owner) => {
                if self.rings[owner].tree_node.is_none() {
                    self.place_in_tree(owner, tree);
                }
                let parent = self.rings[owner].tree_node.unwrap_or(PolyTree::ROOT);
                let node = tree.add_child(parent, path);
                self.rings[ring].tree_node = Some(node);
            }
            None => {
                let node = tree.add_child(PolyTree::ROOT, path);
                self.rings[ring].tree_node = Some(node);
            }
        }
    }

    // -- the sweep itself --------------------------------------------------

    fn run_sweep(&mut self, clip_type: ClipType, fill_rule: FillRule, using_tree: bool) {
        self.clip_type = clip_type;
        self.fill_rule = fill_rule;
        self.using_tree = using_tree;
        self.succeeded = true;

        self.store.sort_minima();
        self.store.rewind();
        let scanlines: Vec<i64> = self.store.minima_scanlines().collect();
        debug!(
            ?clip_type,
            ?fill_rule,
            minima = scanlines.len(),
            "sweep start"
        );
        for y in scanlines {
            self.insert_scanline(y);
        }

        let Some(mut y) = self.pop_scanline() else { return };
        loop {
            if !self.succeeded {
                break;
            }
            trace!(y, "scanline");
            self.insert_minima_bounds(y);
            while let Some(e) = self.pop_horz() {
                self.sweep_horizontal(e);
            }
            if !self.spans.is_empty() {
                self.merge_horz_spans();
                self.spans.clear();
            }
            self.bot_y = y;
            match self.pop_scanline() {
                Some(next_y) => y = next_y,
                None => break,
            }
            if self.collect_crossings(y) {
                self.commit_crossings();
                self.crossings.clear();
            }
            self.advance_scanline_top(y);
            while let Some(e) = self.pop_horz() {
                self.sweep_horizontal(e);
            }
        }

        if self.succeeded {
            self.apply_horz_splices();
        }
        debug!(rings = self.rings.len(), ok = self.succeeded, "sweep done");
    }

    fn build_paths(&mut self) -> (Paths64, Paths64) {
        let mut closed = Paths64::with_capacity(self.rings.len());
        let mut open = Paths64::new();

        let mut i = 0;
        while i < self.rings.len() {
            let Some(start) = self.rings[i].start else {
                i += 1;
                continue;
            };
            if self.rings[i].is_open {
                if let Some(path) = self.build_ring_path(start, self.reverse_solution, true) {
                    open.push(path);
                }
            } else {
                self.tidy_ring(i);
                if let Some(start) = self.rings[i].start {
                    if let Some(path) = self.build_ring_path(start, self.reverse_solution, false) {
                        closed.push(path);
                    }
                }
            }
            i += 1;
        }
        (closed, open)
    }

    fn build_tree(&mut self) -> (PolyTree, Paths64) {
        let mut tree = PolyTree::new();
        let mut open = Paths64::new();

        let mut i = 0;
        while i < self.rings.len() {
            let Some(start) = self.rings[i].start else {
                i += 1;
                continue;
            };
            if self.rings[i].is_open {
                if let Some(path) = self.build_ring_path(start, self.reverse_solution, true) {
                    open.push(path);
                }
                i += 1;
                continue;
            }
            if self.check_bounds(i) {
                self.place_in_tree(i, &mut tree);
            }
            i += 1;
        }
        (tree, open)
    }
}

#[cfg(test)]
#[path = "sweep_tests.rs"]
mod tests;
