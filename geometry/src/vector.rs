use units::{Area, Length};

/// A displacement in space with explicit length units
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Vector {
    pub x: Length,
    pub y: Length,
    pub z: Length,
}

impl Vector {
    pub fn new(x: Length, y: Length, z: Length) -> Self { Self { x, y, z } }

    pub fn dot(&self, other: &Self) -> Area {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn magnitude(&self) -> Length { self.dot(self).sqrt() }
}

#[cfg(test)]
mod tests {
    use crate::Vector;
    use units::{mm, cm, mm_};
    use rstest::rstest;

    #[rstest(/**/ x,  y,  z,  magnitude,
             case(0.0,  0.0,  0.0,  0.0),
             case(3.0,  4.0,  0.0,  5.0),
             case(0.0, -3.0,  4.0,  5.0),
             case(5.0,  0.0, 12.0, 13.0),
             case(3.0,  4.0,  5.0,  7.0710678118654755),
    )]
    fn vector_magnitude(x: f64, y: f64, z: f64, magnitude: f64) {
        let v = Vector::new(cm(x), cm(y), cm(z));
        units::float_eq::assert_float_eq!(mm_(v.magnitude()), 10.0 * magnitude, ulps <= 2);
    }

    #[test]
    fn dot_mixes_units() {
        let a = Vector::new(cm(1.0), mm(2.0), mm(0.0));
        let b = Vector::new(mm(3.0), cm(1.0), cm(7.0));
        // 10·3 + 2·10 mm²
        units::float_eq::assert_float_eq!(mm_(a.dot(&b).sqrt()), 50.0_f64.sqrt(), r2nd <= 1e-12);
    }
}
