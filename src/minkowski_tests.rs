use super::*;
use crate::errors::ClipError;
use crate::geom::{area, bounds_paths, make_path, Rect64};

fn total_area(paths: &Paths64) -> f64 {
    paths.iter().map(|p| area(p)).sum()
}

#[test]
fn empty_inputs_are_rejected() {
    let square = make_path(&[0, 0, 10, 0, 10, 10, 0, 10]);
    assert_eq!(
        minkowski_sum(&Path64::new(), &square, true),
        Err(ClipError::EmptyPath)
    );
    assert_eq!(
        minkowski_sum(&square, &Path64::new(), true),
        Err(ClipError::EmptyPath)
    );
    assert_eq!(
        minkowski_diff(&Path64::new(), &square, false),
        Err(ClipError::EmptyPath)
    );
}

#[test]
fn square_swept_around_square_dilates_it() {
    // pattern centered on the origin dilates each edge by its half-width
    let pattern = make_path(&[-5, -5, 5, -5, 5, 5, -5, 5]);
    let path = make_path(&[0, 0, 100, 0, 100, 100, 0, 100]);
    let sum = minkowski_sum(&pattern, &path, true).unwrap();
    assert_eq!(bounds_paths(&sum), Rect64::new(-5, -5, 105, 105));
    // the swept annulus covers the rim; the union keeps its outer boundary
    // and the untouched interior becomes a hole
    assert_eq!(sum.len(), 2);
    let outer = 110.0 * 110.0;
    let hole = 90.0 * 90.0;
    assert!((total_area(&sum) - (outer - hole)).abs() < 1.0);
}

#[test]
fn sum_along_open_path_traces_a_thick_line() {
    let pattern = make_path(&[-2, -2, 2, -2, 2, 2, -2, 2]);
    let path = make_path(&[0, 0, 50, 0]);
    let sum = minkowski_sum(&pattern, &path, false).unwrap();
    assert_eq!(sum.len(), 1);
    assert_eq!(bounds_paths(&sum), Rect64::new(-2, -2, 52, 2));
    assert!((total_area(&sum) - 54.0 * 4.0).abs() < 1.0);
}

#[test]
fn diff_sweeps_the_negated_pattern() {
    // asymmetric pattern: the difference band hangs off the low side
    let pattern = make_path(&[0, 0, 4, 0, 4, 4, 0, 4]);
    let path = make_path(&[0, 0, 100, 0, 100, 100, 0, 100]);
    let diff = minkowski_diff(&pattern, &path, true).unwrap();
    assert_eq!(bounds_paths(&diff), Rect64::new(-4, -4, 100, 100));
    assert_eq!(diff.len(), 2);
    assert!((total_area(&diff) - (104.0 * 104.0 - 96.0 * 96.0)).abs() < 1.0);
}

#[test]
fn sum_and_diff_agree_for_symmetric_patterns() {
    let pattern = make_path(&[-5, -5, 5, -5, 5, 5, -5, 5]);
    let path = make_path(&[0, 0, 60, 0, 60, 60, 0, 60]);
    let sum = minkowski_sum(&pattern, &path, true).unwrap();
    let diff = minkowski_diff(&pattern, &path, true).unwrap();
    assert!((total_area(&sum) - total_area(&diff)).abs() < 1.0);
    assert_eq!(bounds_paths(&sum), bounds_paths(&diff));
}
