//! # polyops
//!
//! Robust boolean operations (union, intersection, difference, xor) and
//! offsetting for polygons on the 64-bit integer lattice, built around a
//! Vatti-style sweep-line engine with exact 128-bit geometric predicates.
//!
//! The crate is layered bottom-up:
//!
//! - [`geom`] - integer points, rectangles, exact predicates
//! - [`minima`] - contour decomposition into local-minima events
//! - [`sweep`] - the scanline clipping engine
//! - [`tree`] - hierarchical (outer/hole) output packaging
//! - [`offset`] - join/cap emission and arc tessellation
//! - [`rectclip`], [`minkowski`], [`ops`] - rectangle clipping, Minkowski
//!   convolution and the public convenience surface
//! - [`compat32`] - a 32-bit coordinate mirror with checked narrowing
//!
//! Every top-level call is a pure function over its inputs; the engine keeps
//! no global state and independent calls may run on separate threads.
//!
//! ```
//! use polyops::{intersect, make_path, FillRule};
//!
//! let subject = vec![make_path(&[0, 0, 10, 0, 10, 10, 0, 10])];
//! let clip = vec![make_path(&[5, 5, 15, 5, 15, 15, 5, 15])];
//! let solution = intersect(&subject, &clip, FillRule::NonZero).unwrap();
//! assert_eq!(solution.len(), 1);
//! ```

pub mod compat32;
pub mod errors;
pub mod geom;
pub mod minima;
pub mod minkowski;
pub mod offset;
pub mod ops;
pub mod rectclip;
pub mod sweep;
pub mod tree;

pub use errors::{ClipError, Result};
pub use geom::{
    area, bounds, bounds_paths, ellipse as ellipse_path, is_positive, make_path, path_length,
    point_in_polygon_rule as point_in_polygon, reverse_path, reverse_paths, rotate_path,
    scale_path, scale_paths, translate_path, translate_paths, FillRule, Path32, Path64, Paths32,
    Paths64, Point32, Point64, PointPlacement, Rect32, Rect64,
};
pub use minkowski::{minkowski_diff, minkowski_sum};
pub use offset::{EndType, JoinType, OffsetOptions, PathOffsetter};
pub use ops::{
    boolean_op, boolean_op_tree, difference, ellipse, inflate_paths, intersect, rdp_path,
    rdp_paths, rect_clip, rect_clip_lines, rect_clip_lines_path, rect_clip_path, simplify_path,
    simplify_paths, star_polygon, trim_collinear, union_op, union_self, xor,
};
pub use rectclip::{RectClipper, RectLineClipper};
pub use sweep::{ClipType, Clipper};
pub use tree::{PolyNode, PolyTree};
