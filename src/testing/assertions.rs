//! Floating-point assertion helpers for mesh tests.

use crate::vec3::Vec3;

/// Assert two scalars agree to within `tol`.
#[track_caller]
pub fn assert_close(a: f64, b: f64, tol: f64) {
    assert!(
        (a - b).abs() <= tol,
        "expected {a} and {b} to agree within {tol} (delta {})",
        (a - b).abs()
    );
}

/// Assert two vectors agree componentwise to within `tol`.
#[track_caller]
pub fn assert_vec3_close(a: Vec3, b: Vec3, tol: f64) {
    assert!(
        (a - b).mag() <= tol,
        "expected {a} and {b} to agree within {tol} (delta {})",
        (a - b).mag()
    );
}

/// Assert two fields agree elementwise to within `tol`.
#[track_caller]
pub fn assert_fields_close(a: &[f64], b: &[f64], tol: f64) {
    assert_eq!(a.len(), b.len(), "field lengths differ");
    for (i, (&x, &y)) in a.iter().zip(b).enumerate() {
        assert!(
            (x - y).abs() <= tol,
            "fields differ at index {i}: {x} vs {y} (tol {tol})"
        );
    }
}
