use super::*;
use crate::errors::ClipError;
use crate::geom::{
    area, bounds_paths, is_positive, make_path, point_in_polygon_rule, reverse_path,
    translate_path, Paths64, Point64, PointPlacement,
};
use crate::offset::{EndType, JoinType, OffsetOptions};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn square(left: i64, top: i64, size: i64) -> Path64 {
    make_path(&[
        left,
        top,
        left + size,
        top,
        left + size,
        top + size,
        left,
        top + size,
    ])
}

fn total_area(paths: &Paths64) -> f64 {
    paths.iter().map(|p| area(p)).sum()
}

// ---------------------------------------------------------------------------
// End-to-end scenarios
// ---------------------------------------------------------------------------

#[test]
fn scenario_union_of_overlapping_squares() {
    let subj = vec![square(0, 0, 10)];
    let clip = vec![square(5, 5, 10)];
    let out = union_op(&subj, &clip, FillRule::NonZero).unwrap();
    assert_eq!(out.len(), 1);
    assert!((total_area(&out) - 175.0).abs() < 1.0);
}

#[test]
fn scenario_intersection_of_overlapping_squares() {
    let subj = vec![square(0, 0, 10)];
    let clip = vec![square(5, 5, 10)];
    let out = intersect(&subj, &clip, FillRule::NonZero).unwrap();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].len(), 4);
    assert!((total_area(&out) - 25.0).abs() < 1.0);
    for pt in [
        Point64::new(5, 5),
        Point64::new(10, 5),
        Point64::new(10, 10),
        Point64::new(5, 10),
    ] {
        assert!(out[0].contains(&pt));
    }
}

#[test]
fn scenario_difference_of_overlapping_squares() {
    let subj = vec![square(0, 0, 10)];
    let clip = vec![square(5, 5, 10)];
    let out = difference(&subj, &clip, FillRule::NonZero).unwrap();
    assert_eq!(out.len(), 1);
    assert!((total_area(&out) - 75.0).abs() < 1.0);
}

#[test]
fn scenario_xor_of_overlapping_squares() {
    let subj = vec![square(0, 0, 10)];
    let clip = vec![square(5, 5, 10)];
    let out = xor(&subj, &clip, FillRule::NonZero).unwrap();
    assert_eq!(out.len(), 1);
    assert!((total_area(&out) - 150.0).abs() < 1.0);
}

#[test]
fn scenario_union_of_disjoint_squares() {
    let subj = vec![square(0, 0, 10)];
    let clip = vec![square(20, 0, 10)];
    let out = union_op(&subj, &clip, FillRule::NonZero).unwrap();
    assert_eq!(out.len(), 2);
    assert!((total_area(&out) - 200.0).abs() < 1.0);
}

#[test]
fn scenario_touching_squares_intersect_to_nothing() {
    let subj = vec![square(0, 0, 10)];
    let clip = vec![square(10, 0, 10)];
    let out = intersect(&subj, &clip, FillRule::NonZero).unwrap();
    assert!(total_area(&out).abs() < 1.0);
    assert!(out.is_empty());
}

#[test]
fn scenario_miter_inflate_square() {
    let options = OffsetOptions { miter_limit: 2.0, arc_tolerance: 0.25, ..Default::default() };
    let out = inflate_paths(
        &vec![square(0, 0, 100)],
        10.0,
        JoinType::Miter,
        EndType::Polygon,
        options,
    )
    .unwrap();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].len(), 4);
    assert_eq!(bounds_paths(&out), crate::geom::Rect64::new(-10, -10, 110, 110));
}

#[test]
fn scenario_round_capped_segment_is_a_capsule() {
    let options = OffsetOptions { miter_limit: 2.0, arc_tolerance: 0.25, ..Default::default() };
    let out = inflate_paths(
        &vec![make_path(&[0, 0, 100, 0])],
        10.0,
        JoinType::Square,
        EndType::Round,
        options,
    )
    .unwrap();
    assert_eq!(out.len(), 1);
    let expect = 100.0 * 20.0 + std::f64::consts::PI * 100.0;
    let got = total_area(&out);
    assert!((got - expect).abs() < 16.0, "area {got} vs {expect}");
}

// ---------------------------------------------------------------------------
// Algebraic invariants
// ---------------------------------------------------------------------------

#[test]
fn union_with_nothing_is_identity() {
    let subj = vec![square(0, 0, 50)];
    let out = union_op(&subj, &Paths64::new(), FillRule::NonZero).unwrap();
    assert_eq!(out.len(), 1);
    assert!((total_area(&out) - 2_500.0).abs() < 1.0);
    assert!(is_positive(&out[0]));
}

#[test]
fn self_operations_collapse() {
    let a = vec![square(0, 0, 40), square(100, 0, 30)];

    let inter = intersect(&a, &a, FillRule::NonZero).unwrap();
    assert!((total_area(&inter) - 2_500.0).abs() < 1.0);

    let x = xor(&a, &a, FillRule::NonZero).unwrap();
    assert!(total_area(&x).abs() < 1.0);

    let d = difference(&a, &a, FillRule::NonZero).unwrap();
    assert!(total_area(&d).abs() < 1.0);
}

#[test]
fn de_morgan_xor_decomposition() {
    let a = vec![square(0, 0, 60)];
    let b = vec![square(30, 20, 60)];

    let direct = xor(&a, &b, FillRule::NonZero).unwrap();
    let a_minus_b = difference(&a, &b, FillRule::NonZero).unwrap();
    let b_minus_a = difference(&b, &a, FillRule::NonZero).unwrap();
    let composed = union_op(&a_minus_b, &b_minus_a, FillRule::NonZero).unwrap();

    assert!((total_area(&direct) - total_area(&composed)).abs() < 1.0);
}

#[test]
fn area_sign_tracks_orientation_through_ops() {
    let out = union_self(&vec![square(0, 0, 10)], FillRule::NonZero).unwrap();
    for ring in &out {
        assert_eq!(is_positive(ring), area(ring) > 0.0);
    }
}

#[test]
fn outputs_are_deterministic_over_random_inputs() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    for _ in 0..10 {
        let mut subj = Paths64::new();
        let mut clip = Paths64::new();
        for _ in 0..4 {
            let x = rng.gen_range(-200..200);
            let y = rng.gen_range(-200..200);
            let w = rng.gen_range(20..120);
            subj.push(square(x, y, w));
            let x = rng.gen_range(-200..200);
            let y = rng.gen_range(-200..200);
            let w = rng.gen_range(20..120);
            clip.push(square(x, y, w));
        }
        let first = boolean_op(ClipType::Xor, FillRule::EvenOdd, &subj, &Paths64::new(), &clip)
            .unwrap();
        let second = boolean_op(ClipType::Xor, FillRule::EvenOdd, &subj, &Paths64::new(), &clip)
            .unwrap();
        assert_eq!(first, second);
    }
}

#[test]
fn tree_parents_strictly_enclose_children() {
    let subjects = vec![
        square(0, 0, 100),
        reverse_path(&square(20, 20, 60)),
        square(40, 40, 20),
    ];
    let (tree, _open) = boolean_op_tree(
        ClipType::Union,
        FillRule::NonZero,
        &subjects,
        &Paths64::new(),
        &Paths64::new(),
    )
    .unwrap();
    assert_eq!(tree.contour_count(), 3);
    for (i, node) in tree.nodes.iter().enumerate().skip(1) {
        if let Some(parent) = node.parent() {
            if parent != crate::tree::PolyTree::ROOT {
                assert!(
                    area(tree.nodes[parent].contour()).abs() > area(node.contour()).abs(),
                    "parent of node {i} must be strictly larger"
                );
            }
        }
        let hole = tree.is_hole(i);
        assert_eq!(is_positive(node.contour()), !hole);
    }
}

#[test]
fn rect_clip_is_idempotent() {
    let star = star_polygon(Point64::new(50, 50), 80.0, 35.0, 9).unwrap();
    let window = crate::geom::Rect64::new(0, 0, 100, 100);
    let once = rect_clip(&window, &vec![star]);
    let twice = rect_clip(&window, &once);
    assert_eq!(once.len(), twice.len());
    assert!((total_area(&once) - total_area(&twice)).abs() < 1.0);
}

#[test]
fn inflate_round_trip_stays_near_the_original() {
    let options = OffsetOptions { arc_tolerance: 0.25, ..Default::default() };
    let original = vec![square(0, 0, 100)];
    let grown = inflate_paths(&original, 10.0, JoinType::Round, EndType::Polygon, options)
        .unwrap();
    let back = inflate_paths(&grown, -10.0, JoinType::Round, EndType::Polygon, options).unwrap();
    assert_eq!(back.len(), 1);
    assert!((total_area(&back) - 10_000.0).abs() < 60.0);
    let b = bounds_paths(&back);
    assert!(b.left.abs() <= 2 && b.top.abs() <= 2);
    assert!((b.right - 100).abs() <= 2 && (b.bottom - 100).abs() <= 2);
}

// ---------------------------------------------------------------------------
// Validation and the rest of the surface
// ---------------------------------------------------------------------------

#[test]
fn inflate_validates_options_and_delta() {
    let bad = OffsetOptions { arc_tolerance: -1.0, ..Default::default() };
    assert_eq!(
        inflate_paths(&vec![square(0, 0, 10)], 5.0, JoinType::Miter, EndType::Polygon, bad),
        Err(ClipError::InvalidOptions)
    );
    assert_eq!(
        inflate_paths(
            &vec![square(0, 0, 10)],
            f64::NAN,
            JoinType::Miter,
            EndType::Polygon,
            OffsetOptions::default()
        ),
        Err(ClipError::InvalidParameter)
    );
    // zero delta is a no-op, not an error
    let same = inflate_paths(
        &vec![square(0, 0, 10)],
        0.0,
        JoinType::Miter,
        EndType::Polygon,
        OffsetOptions::default(),
    )
    .unwrap();
    assert_eq!(same, vec![square(0, 0, 10)]);
}

#[test]
fn rect_clip_path_validates_vertex_count() {
    let paths = vec![square(0, 0, 50)];
    let ok = rect_clip_path(&square(10, 10, 100), &paths).unwrap();
    assert!(!ok.is_empty());
    assert_eq!(
        rect_clip_path(&make_path(&[0, 0, 10, 0, 10, 10]), &paths),
        Err(ClipError::InvalidRectangle)
    );
    assert_eq!(
        rect_clip_lines_path(&make_path(&[0, 0, 10, 0, 10, 10]), &paths),
        Err(ClipError::InvalidRectangle)
    );
}

#[test]
fn simplify_drops_near_chord_vertices() {
    // wobble of +/-1 around a straight line
    let wobbly = make_path(&[0, 0, 20, 1, 40, 0, 60, 1, 80, 0, 100, 1, 100, 50, 0, 50]);
    let out = simplify_path(&wobbly, 2.0, true).unwrap();
    assert!(out.len() < wobbly.len());
    assert!((area(&out) - area(&wobbly)).abs() < 120.0);

    assert_eq!(
        simplify_path(&wobbly, 0.0, true),
        Err(ClipError::InvalidParameter)
    );
}

#[test]
fn simplify_keeps_open_endpoints() {
    let line = make_path(&[0, 0, 10, 1, 20, 0, 30, 1, 40, 0]);
    let out = simplify_path(&line, 5.0, false).unwrap();
    assert_eq!(out.first(), line.first());
    assert_eq!(out.last(), line.last());
}

#[test]
fn rdp_reduces_dense_polylines() {
    let mut dense = Path64::new();
    for i in 0..=100 {
        dense.push(Point64::new(i, if i % 2 == 0 { 0 } else { 1 }));
    }
    let out = rdp_path(&dense, 2.0).unwrap();
    assert_eq!(out.len(), 2);
    assert_eq!(out[0], Point64::new(0, 0));
    assert_eq!(out[1], Point64::new(100, 0));
    assert_eq!(rdp_path(&dense, -1.0), Err(ClipError::InvalidParameter));
}

#[test]
fn trim_collinear_removes_straight_runs() {
    let padded = make_path(&[0, 0, 5, 0, 10, 0, 10, 10, 0, 10]);
    let out = trim_collinear(&padded, false);
    assert_eq!(out.len(), 4);

    // a fully collinear ring vanishes
    let flat = make_path(&[0, 0, 5, 0, 10, 0]);
    assert!(trim_collinear(&flat, false).is_empty());

    // open paths keep endpoints
    let open = make_path(&[0, 0, 5, 0, 10, 0]);
    let out = trim_collinear(&open, true);
    assert_eq!(out, make_path(&[0, 0, 10, 0]));
}

#[test]
fn point_in_polygon_uses_the_fill_rule() {
    let ring = square(0, 0, 10);
    assert_eq!(
        point_in_polygon_rule(Point64::new(5, 5), &ring, FillRule::NonZero),
        PointPlacement::Inside
    );
    assert_eq!(
        point_in_polygon_rule(Point64::new(5, 5), &reverse_path(&ring), FillRule::Positive),
        PointPlacement::Outside
    );
    assert_eq!(
        point_in_polygon_rule(Point64::new(0, 5), &ring, FillRule::EvenOdd),
        PointPlacement::OnEdge
    );
}

#[test]
fn star_polygon_shape_and_validation() {
    let star = star_polygon(Point64::new(0, 0), 100.0, 40.0, 5).unwrap();
    assert_eq!(star.len(), 10);
    assert!(is_positive(&star));
    assert!(area(&star) > 10_000.0);

    assert_eq!(
        star_polygon(Point64::new(0, 0), 100.0, 40.0, 2),
        Err(ClipError::InvalidParameter)
    );
    assert_eq!(
        star_polygon(Point64::new(0, 0), 40.0, 100.0, 5),
        Err(ClipError::InvalidParameter)
    );
}

#[test]
fn ellipse_validation() {
    assert!(ellipse(Point64::new(0, 0), 50.0, 25.0, 0).unwrap().len() >= 3);
    assert_eq!(
        ellipse(Point64::new(0, 0), 0.0, 25.0, 0),
        Err(ClipError::InvalidParameter)
    );
}

#[test]
fn open_subjects_survive_boolean_ops() {
    let (closed, open) = boolean_op(
        ClipType::Intersection,
        FillRule::NonZero,
        &Paths64::new(),
        &vec![make_path(&[-10, 5, 110, 5])],
        &vec![square(0, 0, 100)],
    )
    .unwrap();
    assert!(closed.is_empty());
    assert_eq!(open.len(), 1);
}

#[test]
fn translate_is_area_preserving() {
    let p = square(0, 0, 30);
    let moved = translate_path(&p, 100, -50);
    assert_eq!(area(&p), area(&moved));
}
