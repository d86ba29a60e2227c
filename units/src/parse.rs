//! Units of length and energy selected by name at run time

use std::str::FromStr;

use crate::{Length, Energy, PerLength, units};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum UnitError {
    #[error("unknown unit of length: `{0}`")]
    UnknownLength(String),

    #[error("unknown unit of energy: `{0}`")]
    UnknownEnergy(String),

    #[error("cannot interpret `{0}` as an attenuation coefficient (expected something like `0.2 /cm`)")]
    BadPerLength(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthUnit { Km, Hm, Dam, M, Dm, Cm, Mm, Um }

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnergyUnit { MeV, KeV, EV }

impl FromStr for LengthUnit {
    type Err = UnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use LengthUnit::*;
        Ok(match s {
            "kilometer"  | "kilometre"  | "km"  => Km,
            "hectometer" | "hectometre" | "hm"  => Hm,
            "decameter"  | "decametre"  | "dam" => Dam,
            "meter"      | "metre"      | "m"   => M,
            "decimeter"  | "decimetre"  | "dm"  => Dm,
            "centimeter" | "centimetre" | "cm"  => Cm,
            "millimeter" | "millimetre" | "mm"  => Mm,
            "micrometer" | "micrometre" | "um"  => Um,
            _ => return Err(UnitError::UnknownLength(s.into())),
        })
    }
}

impl FromStr for EnergyUnit {
    type Err = UnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use EnergyUnit::*;
        Ok(match s {
            "megaelectronvolt" | "MeV" => MeV,
            "kiloelectronvolt" | "keV" => KeV,
            "electronvolt"     | "eV"  => EV,
            _ => return Err(UnitError::UnknownEnergy(s.into())),
        })
    }
}

impl LengthUnit {
    /// Interpret `x` as a length in this unit
    pub fn length(self, x: f64) -> Length {
        use LengthUnit::*;
        match self {
            Km  => Length::new::<units::kilometer >(x),
            Hm  => Length::new::<units::hectometer>(x),
            Dam => Length::new::<units::decameter >(x),
            M   => Length::new::<units::meter     >(x),
            Dm  => Length::new::<units::decimeter >(x),
            Cm  => Length::new::<units::centimeter>(x),
            Mm  => Length::new::<units::millimeter>(x),
            Um  => Length::new::<units::micrometer>(x),
        }
    }

    /// Express `l` as a number of this unit
    pub fn value(self, l: Length) -> f64 { crate::ratio_(l / self.length(1.0)) }
}

impl EnergyUnit {
    /// Interpret `x` as an energy in this unit
    pub fn energy(self, x: f64) -> Energy {
        use EnergyUnit::*;
        match self {
            MeV => Energy::new::<units::megaelectronvolt>(x),
            KeV => Energy::new::<units::kiloelectronvolt>(x),
            EV  => Energy::new::<units::electronvolt    >(x),
        }
    }

    /// Express `e` as a number of this unit
    pub fn value(self, e: Energy) -> f64 { crate::ratio_(e / self.energy(1.0)) }
}

/// Parse linear attenuation coefficients written as `0.2 /cm`, `0.2 1/cm` or
/// `0.2 cm^-1`
pub fn parse_per_length(s: &str) -> Result<PerLength, UnitError> {
    let bad = || UnitError::BadPerLength(s.into());
    let mut words = s.split_whitespace();
    let (Some(number), Some(unit), None) = (words.next(), words.next(), words.next()) else {
        return Err(bad())
    };
    let number: f64 = number.parse().map_err(|_| bad())?;
    let unit = unit.strip_prefix("1/")
        .or_else(|| unit.strip_prefix('/'))
        .or_else(|| unit.strip_suffix("^-1"))
        .ok_or_else(bad)?;
    let unit: LengthUnit = unit.parse()?;
    Ok(number / unit.length(1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use float_eq::assert_float_eq;
    use crate::{mm_, per_cm_, mev_};

    #[rstest(/**/ name,        mm_per_unit,
             case("km"        , 1e6 ),
             case("kilometre" , 1e6 ),
             case("hm"        , 1e5 ),
             case("decameter" , 1e4 ),
             case("m"         , 1e3 ),
             case("metre"     , 1e3 ),
             case("dm"        , 1e2 ),
             case("cm"        , 10.0),
             case("centimeter", 10.0),
             case("mm"        ,  1.0),
             case("um"        , 1e-3),
             case("micrometre", 1e-3),
    )]
    fn length_unit_names(name: &str, mm_per_unit: f64) {
        let unit: LengthUnit = name.parse().unwrap();
        assert_float_eq!(mm_(unit.length(1.0)), mm_per_unit, r2nd <= 1e-12);
        assert_float_eq!(unit.value(unit.length(3.5)), 3.5, r2nd <= 1e-12);
    }

    #[rstest(/**/ name,             mev_per_unit,
             case("MeV"             , 1.0 ),
             case("megaelectronvolt", 1.0 ),
             case("keV"             , 1e-3),
             case("kiloelectronvolt", 1e-3),
             case("eV"              , 1e-6),
             case("electronvolt"    , 1e-6),
    )]
    fn energy_unit_names(name: &str, mev_per_unit: f64) {
        let unit: EnergyUnit = name.parse().unwrap();
        assert_float_eq!(mev_(unit.energy(1.0)), mev_per_unit, r2nd <= 1e-12);
    }

    #[rstest(/**/ name, case("inch"), case("CM"), case(""), case("mev"))]
    fn unknown_units_are_rejected(name: &str) {
        assert_eq!(name.parse::<LengthUnit>(), Err(UnitError::UnknownLength(name.into())));
        assert_eq!(name.parse::<EnergyUnit>(), Err(UnitError::UnknownEnergy(name.into())));
    }

    #[rstest(/**/ text,        per_cm,
             case("0.2 /cm"   , 0.2 ),
             case("0.2 1/cm"  , 0.2 ),
             case("0.2 cm^-1" , 0.2 ),
             case("0.05 /mm"  , 0.5 ),
             case("20 m^-1"   , 0.2 ),
    )]
    fn attenuation_coefficient_strings(text: &str, per_cm: f64) {
        assert_float_eq!(per_cm_(parse_per_length(text).unwrap()), per_cm, r2nd <= 1e-12);
    }

    #[rstest(/**/ text, case("0.2"), case("0.2 cm"), case("x /cm"), case("0.2 /inch"), case("1 /cm extra"))]
    fn bad_attenuation_coefficient_strings(text: &str) {
        assert!(parse_per_length(text).is_err());
    }
}
