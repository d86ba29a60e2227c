//! Exact chord lengths through simple solids.
//!
//! These are the reference values against which the tessellated meshes and the
//! ray caster are checked.

use units::{Area, Length, Ratio, ratio, mm};
use crate::{Point, Vector};

/// Compute the length of the intersection of the line passing through points
/// `p1` and `p2` with a cylinder of radius `r` whose axis coincides with the
/// z-axis.
pub fn cylinder_line_intersection_length(p1: Point, p2: Point, r: Length) -> Length {
    let v = flatten(p2 - p1);
    let w = flatten(p1 - Point::zero());
    // Viète coefficients, ignoring the component along the axis
    let a: Area = v.dot(&v);
    let b: Area = 2. * v.dot(&w);
    let c: Area = w.dot(&w) - r * r;
    delta_t(a, b, c) * (p2 - p1).magnitude()
}

/// Compute the length of the intersection of the line passing through points
/// `p1` and `p2` with a sphere of radius `r` centred on `centre`.
pub fn sphere_line_intersection_length(p1: Point, p2: Point, centre: Point, r: Length) -> Length {
    let v = p2 - p1;
    let w = p1 - centre;
    let a: Area = v.dot(&v);
    let b: Area = 2. * v.dot(&w);
    let c: Area = w.dot(&w) - r * r;
    delta_t(a, b, c) * v.magnitude()
}

/// Difference between the two roots of `a t² + b t + c`, or zero if the line
/// misses
fn delta_t(a: Area, b: Area, c: Area) -> Ratio {
    if a <= mm(0.0) * mm(0.0) { return ratio(0.0) }
    let b_squared = b * b;
    let four_a_c = 4. * a * c;
    if b_squared <= four_a_c { return ratio(0.0) }
    (b_squared - four_a_c).sqrt() / a
}

fn flatten(v: Vector) -> Vector { Vector::new(v.x, v.y, mm(0.0)) }
