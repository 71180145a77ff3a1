use super::*;
use crate::geom::area;
use crate::geom::make_path;

fn rect(l: i64, t: i64, r: i64, b: i64) -> Rect64 {
    Rect64::new(l, t, r, b)
}

fn total_area(paths: &Paths64) -> f64 {
    paths.iter().map(|p| area(p)).sum()
}

#[test]
fn path_fully_inside_passes_through() {
    let mut rc = RectClipper::new(rect(0, 0, 100, 100));
    let tri = make_path(&[10, 10, 60, 10, 35, 50]);
    let out = rc.execute(&vec![tri.clone()]);
    assert_eq!(out, vec![tri]);
}

#[test]
fn path_fully_outside_is_dropped() {
    let mut rc = RectClipper::new(rect(0, 0, 100, 100));
    let tri = make_path(&[200, 200, 260, 210, 235, 250]);
    assert!(rc.execute(&vec![tri]).is_empty());
}

#[test]
fn overlapping_square_is_cropped() {
    let mut rc = RectClipper::new(rect(0, 0, 100, 100));
    let sq = make_path(&[50, 50, 150, 50, 150, 150, 50, 150]);
    let out = rc.execute(&vec![sq]);
    assert_eq!(out.len(), 1);
    assert!((total_area(&out).abs() - 2_500.0).abs() < 1.0);
    let b = crate::geom::bounds(&out[0]);
    assert_eq!(b, rect(50, 50, 100, 100));
}

#[test]
fn polygon_enclosing_the_rect_yields_the_rect() {
    let mut rc = RectClipper::new(rect(40, 40, 60, 60));
    let big = make_path(&[0, 0, 100, 0, 100, 100, 0, 100]);
    let out = rc.execute(&vec![big]);
    assert_eq!(out.len(), 1);
    assert!((total_area(&out).abs() - 400.0).abs() < 1.0);
}

#[test]
fn concave_polygon_can_split_into_pieces() {
    // U-shape whose bridge lies above the clip window
    let u = make_path(&[
        0, 0, 10, 0, 10, 60, 40, 60, 40, 0, 50, 0, 50, 80, 0, 80,
    ]);
    let mut rc = RectClipper::new(rect(0, 0, 50, 40));
    let out = rc.execute(&vec![u]);
    // the two vertical arms survive separately
    assert_eq!(out.len(), 2);
    assert!((total_area(&out).abs() - 800.0).abs() < 1.0);
}

#[test]
fn clipping_is_idempotent() {
    let star = crate::ops::star_polygon(Point64::new(50, 50), 70.0, 30.0, 7).unwrap();
    let r = rect(0, 0, 100, 100);
    let mut rc = RectClipper::new(r);
    let once = rc.execute(&vec![star]);
    let mut rc2 = RectClipper::new(r);
    let twice = rc2.execute(&once);
    assert_eq!(total_area(&once), total_area(&twice));
    assert_eq!(once.len(), twice.len());
}

#[test]
fn degenerate_inputs_are_ignored() {
    let mut rc = RectClipper::new(rect(0, 0, 100, 100));
    assert!(rc.execute(&vec![make_path(&[10, 10, 20, 20])]).is_empty());
    let mut rc = RectClipper::new(Rect64::new(10, 10, 10, 50));
    assert!(rc.execute(&vec![make_path(&[0, 0, 100, 0, 100, 100])]).is_empty());
}

// ---------------------------------------------------------------------------
// Lines
// ---------------------------------------------------------------------------

#[test]
fn line_crossing_the_window_is_trimmed() {
    let mut rcl = RectLineClipper::new(rect(0, 0, 100, 100));
    let out = rcl.execute(&vec![make_path(&[-50, 50, 150, 50])]);
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].len(), 2);
    assert!(out[0].contains(&Point64::new(0, 50)));
    assert!(out[0].contains(&Point64::new(100, 50)));
}

#[test]
fn line_weaving_in_and_out_splits() {
    // enters, leaves, and re-enters through the top edge
    let zig = make_path(&[10, -20, 30, 40, 50, -20, 70, 40]);
    let mut rcl = RectLineClipper::new(rect(0, 0, 100, 100));
    let out = rcl.execute(&vec![zig]);
    assert_eq!(out.len(), 2);
    for seg in &out {
        assert!(seg.len() >= 2);
        for pt in seg {
            assert!(pt.y >= 0 && pt.y <= 100);
        }
    }
}

#[test]
fn interior_line_passes_through() {
    let mut rcl = RectLineClipper::new(rect(0, 0, 100, 100));
    let line = make_path(&[10, 10, 90, 20, 40, 80]);
    let out = rcl.execute(&vec![line.clone()]);
    assert_eq!(out, vec![line]);
}

#[test]
fn exterior_line_is_dropped() {
    let mut rcl = RectLineClipper::new(rect(0, 0, 100, 100));
    assert!(rcl.execute(&vec![make_path(&[200, 0, 300, 50])]).is_empty());
}
