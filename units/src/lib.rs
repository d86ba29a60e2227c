pub mod todo;
mod parse;

pub use parse::{LengthUnit, EnergyUnit, UnitError, parse_per_length};

pub use uom;
pub use float_eq;

use uom::si::Dimension;
pub type InvertDimension<D> = uom::si::ISQ<
    <<D as Dimension>::L  as uom::lib::ops::Neg>::Output,
    <<D as Dimension>::M  as uom::lib::ops::Neg>::Output,
    <<D as Dimension>::T  as uom::lib::ops::Neg>::Output,
    <<D as Dimension>::I  as uom::lib::ops::Neg>::Output,
    <<D as Dimension>::Th as uom::lib::ops::Neg>::Output,
    <<D as Dimension>::N  as uom::lib::ops::Neg>::Output,
    <<D as Dimension>::J  as uom::lib::ops::Neg>::Output>;

pub mod mmps {

  use uom::si::{
    length::millimeter,
    mass::kilogram,
    time::picosecond,
    electric_current::ampere,
    thermodynamic_temperature::kelvin,
    amount_of_substance::mole,
    luminous_intensity::candela,
  };

  // TODO: replace with system! macro, once it has been fixed in uom
  type Units = dyn uom::si::Units<
      f64,
    length                    = millimeter,
    mass                      = kilogram,
    time                      = picosecond,
    electric_current          = ampere,
    thermodynamic_temperature = kelvin,
    amount_of_substance       = mole,
    luminous_intensity        = candela>;

  pub mod f64 {
    use uom::{ISQ, system, si::Quantity};
    ISQ!(uom::si, f64, (millimeter, kilogram, picosecond, ampere, kelvin, mole, candela));

    use uom::typenum::{P2, N1, Z0};
    pub type PerLength   = Quantity<super::super::InvertDimension<uom::si::length::Dimension>, super::Units, f64>;
    pub type AreaPerMass = Quantity<uom::si::ISQ<P2, N1, Z0, Z0, Z0, Z0, Z0>                 , super::Units, f64>;

    /// The full circle constant (τ) Equal to 2π.
    pub const TWOPI: Angle = Angle {
        dimension: std::marker::PhantomData,
        units: std::marker::PhantomData,
        value: std::f64::consts::TAU,
    };
  }

}

pub use uom::si::Quantity;
pub use mmps::f64::{Angle, TWOPI, Length, Area, Energy, Ratio, Mass, MassDensity, PerLength, AreaPerMass};

pub mod units {
  pub use uom::si::{length      ::{kilometer, hectometer, decameter, meter, decimeter,
                                   centimeter, millimeter, micrometer},
                    energy      ::{electronvolt, kiloelectronvolt, megaelectronvolt},
                    mass        ::{kilogram, gram},
                    mass_density::gram_per_cubic_centimeter,
                    ratio       ::ratio,
                    angle       ::{radian, degree, revolution},
  };
}
// Making values from float literals seems to be very long-winded, so provide
// some pithily-named convenience constructors.

/// Generate a function called NAME which returns QUANTITY by interpreting its
/// argument as UNIT
///
/// wrap!(NAME QUANTITY UNIT);
macro_rules! wrap {
  ($name:ident $quantity:ident $unit:ident ) => {
    pub fn $name(x: f64) -> $quantity { $quantity::new::<units::$unit>(x) }
  };
}

wrap!(m      Length                     meter);
wrap!(cm     Length                centimeter);
wrap!(mm     Length                millimeter);
wrap!(um     Length                micrometer);
wrap!(ev     Energy              electronvolt);
wrap!(kev    Energy          kiloelectronvolt);
wrap!(mev    Energy          megaelectronvolt);
wrap!(kg     Mass                    kilogram);
wrap!(g_cm3  MassDensity gram_per_cubic_centimeter);
wrap!(ratio  Ratio                      ratio);
wrap!(radian Angle                     radian);
wrap!(degree Angle                     degree);
wrap!(turn   Angle                 revolution);

// Reverse direction of the above.
pub fn mm_ (x: Length) -> f64 { x.get::<units::millimeter>() }
pub fn cm_ (x: Length) -> f64 { x.get::<units::centimeter>() }
pub fn ev_ (x: Energy) -> f64 { x.get::<units::electronvolt>() }
pub fn kev_(x: Energy) -> f64 { x.get::<units::kiloelectronvolt>() }
pub fn mev_(x: Energy) -> f64 { x.get::<units::megaelectronvolt>() }
pub fn kg_ (x: Mass  ) -> f64 { x.get::<units::kilogram>() }

pub fn ratio_ (x: Ratio) -> f64 { x.get::<uom::si::ratio::ratio>() }
pub fn radian_(x: Angle) -> f64 { x.get::<uom::si::angle::radian>() }
pub fn degree_(x: Angle) -> f64 { x.get::<uom::si::angle::degree>() }
pub fn turn_  (x: Angle) -> f64 { x.get::<uom::si::angle::revolution>() }

/// Linear attenuation coefficient from a value in cm⁻¹
pub fn per_cm (x: f64) -> PerLength { x / cm(1.0) }
/// Linear attenuation coefficient in cm⁻¹
pub fn per_cm_(x: PerLength) -> f64 { ratio_(x * cm(1.0)) }

/// Mass attenuation coefficient from a value in cm²/g
pub fn cm2_g (x: f64) -> AreaPerMass {
    let cm = cm(1.0);
    x * (cm * cm) / kg(0.001)
}
/// Mass attenuation coefficient in cm²/g
pub fn cm2_g_(x: AreaPerMass) -> f64 {
    let cm = cm(1.0);
    ratio_(x * kg(0.001) / (cm * cm))
}

#[macro_export]
macro_rules! in_base_unit {
  ($value:expr) => {
    $crate::Quantity {
      dimension: std::marker::PhantomData,
      units: std::marker::PhantomData,
      value: $value,
    }
  };
}


#[macro_export]
macro_rules! assert_uom_eq {
  ($unit:ident, $lhs:expr, $rhs:expr, $algo:ident <= $tol:expr) => {
    $crate::float_eq::assert_float_eq!($lhs.get::<$unit>(), $rhs.get::<$unit>(), $algo <= $tol)
  };
}
