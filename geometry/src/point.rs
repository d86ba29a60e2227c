use std::ops::Sub;
use units::{Length, mm};
use crate::Vector;

/// A position in space with explicit length units
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point {
    pub x: Length,
    pub y: Length,
    pub z: Length,
}

impl Point {
    pub fn new(x: Length, y: Length, z: Length) -> Self { Self { x, y, z } }

    pub fn zero() -> Self { Self::new(mm(0.0), mm(0.0), mm(0.0)) }
}

impl Sub for Point {
    type Output = Vector;
    fn sub(self, rhs: Self) -> Self::Output {
        Vector {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
            z: self.z - rhs.z,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use units::{cm, mm, assert_uom_eq};
    use units::uom::si::length::{meter, millimeter};

    #[test]
    fn point_components() {
        let p = Point::new(mm(10.0), mm(0.001), mm(2.0));
        assert_eq!(       p.x, mm(10.0  ));
        assert_uom_eq!(meter, p.y, mm( 0.001), r2nd <= 1e-12);
        assert_uom_eq!(meter, p.z, cm( 0.2  ), r2nd <= 1e-12);
    }

    #[test]
    fn point_minus_point_is_vector() {
        let lhs      = Point ::new(cm(3.0), mm( 20.0), cm( 8.0));
        let rhs      = Point ::new(cm(2.0), cm(  4.0), mm(20.0));
        let expected = Vector::new(cm(1.0), mm(-20.0), mm(60.0));
        let result: Vector = lhs - rhs;

        assert_uom_eq!(millimeter, result.x, expected.x, ulps <= 2);
        assert_uom_eq!(millimeter, result.y, expected.y, ulps <= 2);
        assert_uom_eq!(millimeter, result.z, expected.z, ulps <= 2);
    }
}
