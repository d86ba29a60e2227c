/// Units which are simply type aliases for floats rather than having an
/// implementation as a `uom` `Quantity`.
///
/// These are used in the per-pixel buffers, where millions of values are
/// stored and combined in tight loops, but we still want some clues in the
/// source as to what they represent.

/// Path length in cm, as stored in L-buffers
pub type Lengthf32    = f32;
/// Path length in cm, as used while accumulating intersections
pub type Lengthf64    = f64;
/// Energy in MeV
pub type Energyf64    = f64;
/// Linear attenuation coefficient in cm⁻¹
pub type PerLengthf64 = f64;
/// Transmitted fluence: MeV or photons, depending on the fluence mode
pub type Intensityf32 = f32;
pub type Ratiof64     = f64;
