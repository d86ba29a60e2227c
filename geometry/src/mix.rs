//! Conversions between the uom-aware `Point`/`Vector` and the raw `nalgebra`
//! types used in the ray-casting core.
//!
//! Raw coordinates are always millimetres.

use units::{mm, mm_};
use crate::{Point, Vector, Pointf64, Vectorf64};

impl From<Point> for Pointf64 {
    fn from(p: Point) -> Self { Self::new(mm_(p.x), mm_(p.y), mm_(p.z)) }
}

impl From<&Point> for Pointf64 {
    fn from(p: &Point) -> Self { (*p).into() }
}

impl From<Pointf64> for Point {
    fn from(p: Pointf64) -> Self { Self::new(mm(p.x), mm(p.y), mm(p.z)) }
}

impl From<Vector> for Vectorf64 {
    fn from(v: Vector) -> Self { Self::new(mm_(v.x), mm_(v.y), mm_(v.z)) }
}

impl From<Vectorf64> for Vector {
    fn from(v: Vectorf64) -> Self { Self::new(mm(v.x), mm(v.y), mm(v.z)) }
}
