use super::*;
use crate::geom::{bounds, bounds_paths, is_positive, make_path, reverse_path};

fn square(size: i64) -> Path64 {
    make_path(&[0, 0, size, 0, size, size, 0, size])
}

fn total_area(paths: &Paths64) -> f64 {
    paths.iter().map(|p| area(p)).sum()
}

#[test]
fn options_validation() {
    assert!(OffsetOptions::default().validate().is_ok());

    let bad_miter = OffsetOptions { miter_limit: 0.5, ..Default::default() };
    assert_eq!(bad_miter.validate(), Err(crate::errors::ClipError::InvalidOptions));

    let bad_arc = OffsetOptions { arc_tolerance: 0.0, ..Default::default() };
    assert_eq!(bad_arc.validate(), Err(crate::errors::ClipError::InvalidOptions));
}

#[test]
fn enum_codes() {
    assert_eq!(JoinType::from_code(3).unwrap(), JoinType::Miter);
    assert!(JoinType::from_code(4).is_err());
    assert_eq!(EndType::from_code(4).unwrap(), EndType::Round);
    assert!(EndType::from_code(5).is_err());
}

#[test]
fn tiny_delta_returns_input_verbatim() {
    let mut off = PathOffsetter::new(OffsetOptions::default());
    off.add_path(&square(100), JoinType::Miter, EndType::Polygon);
    let out = off.execute(0.25).unwrap();
    assert_eq!(out, vec![square(100)]);
}

#[test]
fn miter_inflate_of_square_is_a_larger_square() {
    let mut off = PathOffsetter::new(OffsetOptions { miter_limit: 2.0, ..Default::default() });
    off.add_path(&square(100), JoinType::Miter, EndType::Polygon);
    let out = off.execute(10.0).unwrap();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].len(), 4);
    assert_eq!(bounds(&out[0]), crate::geom::Rect64::new(-10, -10, 110, 110));
    assert!((area(&out[0]) - 14_400.0).abs() < 1.0);
}

#[test]
fn bevel_inflate_clips_the_corners() {
    let mut off = PathOffsetter::new(OffsetOptions::default());
    off.add_path(&square(100), JoinType::Bevel, EndType::Polygon);
    let out = off.execute(10.0).unwrap();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].len(), 8);
    // full square minus 4 corner triangles of area 50
    assert!((area(&out[0]) - 14_200.0).abs() < 2.0);
}

#[test]
fn round_inflate_approximates_rounded_corners() {
    let mut off = PathOffsetter::new(OffsetOptions { arc_tolerance: 0.25, ..Default::default() });
    off.add_path(&square(100), JoinType::Round, EndType::Polygon);
    let out = off.execute(10.0).unwrap();
    assert_eq!(out.len(), 1);
    // 10000 + 4 edges * 1000 + pi * 100 corner area
    let expect = 10_000.0 + 4_000.0 + std::f64::consts::PI * 100.0;
    let got = area(&out[0]);
    assert!((got - expect).abs() < 20.0, "area {got} vs {expect}");
}

#[test]
fn deflate_shrinks_and_round_trip_stays_close() {
    let grown = inflate_then(square(100), 10.0);
    let back = {
        let mut off = PathOffsetter::new(OffsetOptions::default());
        off.add_paths(&grown, JoinType::Miter, EndType::Polygon);
        off.execute(-10.0).unwrap()
    };
    assert_eq!(back.len(), 1);
    assert!((area(&back[0]) - 10_000.0).abs() < 50.0);
    let b = bounds_paths(&back);
    assert!(b.left.abs() <= 1 && b.top.abs() <= 1);
    assert!((b.right - 100).abs() <= 1 && (b.bottom - 100).abs() <= 1);
}

fn inflate_then(path: Path64, delta: f64) -> Paths64 {
    let mut off = PathOffsetter::new(OffsetOptions::default());
    off.add_path(&path, JoinType::Miter, EndType::Polygon);
    off.execute(delta).unwrap()
}

#[test]
fn reversed_group_deflates_instead() {
    // a negative-orientation polygon flips the delta sign internally
    let mut off = PathOffsetter::new(OffsetOptions::default());
    off.add_path(&reverse_path(&square(100)), JoinType::Miter, EndType::Polygon);
    let out = off.execute(10.0).unwrap();
    assert_eq!(out.len(), 1);
    // output keeps the input's reversed orientation
    assert!(!is_positive(&out[0]));
    assert!((area(&out[0]).abs() - 14_400.0).abs() < 1.0);
}

#[test]
fn open_path_round_caps_make_a_capsule() {
    let mut off = PathOffsetter::new(OffsetOptions { arc_tolerance: 0.25, ..Default::default() });
    off.add_path(&make_path(&[0, 0, 100, 0]), JoinType::Square, EndType::Round);
    let out = off.execute(10.0).unwrap();
    assert_eq!(out.len(), 1);
    let expect = 2_000.0 + std::f64::consts::PI * 100.0;
    let got = area(&out[0]);
    assert!((got - expect).abs() < 16.0, "area {got} vs {expect}");
    let b = bounds(&out[0]);
    assert!(b.left >= -11 && b.left <= -9);
    assert!(b.right >= 109 && b.right <= 111);
}

#[test]
fn open_path_butt_caps_make_a_rectangle() {
    let mut off = PathOffsetter::new(OffsetOptions::default());
    off.add_path(&make_path(&[0, 0, 100, 0]), JoinType::Bevel, EndType::Butt);
    let out = off.execute(10.0).unwrap();
    assert_eq!(out.len(), 1);
    assert!((area(&out[0]) - 2_000.0).abs() < 2.0);
    assert_eq!(bounds(&out[0]), crate::geom::Rect64::new(0, -10, 100, 10));
}

#[test]
fn open_path_square_caps_extend_the_ends() {
    let mut off = PathOffsetter::new(OffsetOptions::default());
    off.add_path(&make_path(&[0, 0, 100, 0]), JoinType::Square, EndType::Square);
    let out = off.execute(10.0).unwrap();
    assert_eq!(out.len(), 1);
    // caps extend delta beyond both ends
    assert!((area(&out[0]) - 2_400.0).abs() < 4.0);
    assert_eq!(bounds(&out[0]), crate::geom::Rect64::new(-10, -10, 110, 10));
}

#[test]
fn single_point_round_becomes_a_circle() {
    let mut off = PathOffsetter::new(OffsetOptions { arc_tolerance: 0.25, ..Default::default() });
    off.add_path(&vec![Point64::new(50, 50)], JoinType::Round, EndType::Round);
    let out = off.execute(10.0).unwrap();
    assert_eq!(out.len(), 1);
    let got = area(&out[0]);
    assert!((got - std::f64::consts::PI * 100.0).abs() < 12.0, "area {got}");
}

#[test]
fn single_point_other_joins_become_a_square() {
    let mut off = PathOffsetter::new(OffsetOptions::default());
    off.add_path(&vec![Point64::new(0, 0)], JoinType::Miter, EndType::Polygon);
    let out = off.execute(10.0).unwrap();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].len(), 4);
    assert!((area(&out[0]) - 400.0).abs() < 1.0);
}

#[test]
fn joined_two_point_path_collapses_to_caps() {
    let mut off = PathOffsetter::new(OffsetOptions { arc_tolerance: 0.25, ..Default::default() });
    off.add_path(&make_path(&[0, 0, 50, 0]), JoinType::Round, EndType::Joined);
    let out = off.execute(8.0).unwrap();
    assert_eq!(out.len(), 1);
    let expect = 2.0 * 8.0 * 50.0 + std::f64::consts::PI * 64.0;
    assert!((area(&out[0]) - expect).abs() < 16.0);
}

#[test]
fn concave_joins_do_not_leave_slivers() {
    // L-shaped polygon: one concave corner at (50, 50)
    let l_shape = make_path(&[0, 0, 100, 0, 100, 50, 50, 50, 50, 100, 0, 100]);
    let input_area = area(&l_shape);
    let mut off = PathOffsetter::new(OffsetOptions::default());
    off.add_path(&l_shape, JoinType::Miter, EndType::Polygon);
    let out = off.execute(5.0).unwrap();
    assert_eq!(out.len(), 1);
    assert!(is_positive(&out[0]));
    // grown area: perimeter * delta + corner effects, all positive
    assert!(total_area(&out) > input_area);
    // and every ring stays simple: re-union changes nothing
    let re = crate::ops::union_self(&out, crate::geom::FillRule::NonZero).unwrap();
    assert!((total_area(&re) - total_area(&out)).abs() < 2.0);
}

#[test]
fn inflating_multiple_paths_merges_overlaps() {
    let a = square(50);
    let b = crate::geom::translate_path(&square(50), 60, 0);
    let mut off = PathOffsetter::new(OffsetOptions::default());
    off.add_paths(&vec![a, b], JoinType::Miter, EndType::Polygon);
    // a 10-unit inflation bridges the 10-unit gap
    let out = off.execute(10.0).unwrap();
    assert_eq!(out.len(), 1);
}
