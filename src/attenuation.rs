//! Beer-Lambert attenuation of the beam spectrum along the pixel rays.
//!
//! For pixel `p` and spectrum channel `c` with energy `E` and `n` photons:
//!
//! ```text
//! fluence(p) = Σ_c n_c · w_c · exp(-Σ_g ±mu_g(E_c) · L_g(p))
//! ```
//!
//! where `g` runs over groups of surfaces sharing a material and role (`+`
//! for inner, `-` for outer surfaces), `L_g` is the sum of the L-buffers of
//! the group, and `w_c` is the recorded energy per photon (energy mode) or 1
//! (photon-count mode).

use ndarray::{Array2, Zip};

use units::{mev_, per_cm_, todo::{Energyf64, PerLengthf64}};
use crate::detector::DetectorResponse;
use crate::material::{AttenuationProvider, MaterialId};
use crate::scene::Role;
use crate::spectrum::Spectrum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FluenceMode {
    /// Transmitted energy, in MeV
    #[default]
    Energy,
    /// Number of transmitted photons
    PhotonCount,
}

/// Per-channel photon counts and weights
fn channel_weights<'s>(
    spectrum: &'s Spectrum,
    mode    : FluenceMode,
    response: Option<&'s DetectorResponse>,
) -> impl Iterator<Item = (units::Energy, f64, f64)> + 's {
    spectrum.channels().map(move |c| {
        let w = match (mode, response) {
            (FluenceMode::PhotonCount, _)           => 1.0,
            (FluenceMode::Energy     , None)        => mev_(c.energy),
            (FluenceMode::Energy     , Some(resp))  => mev_(resp.apply(c.energy)),
        };
        (c.energy, c.photon_count, w)
    })
}

/// Unattenuated fluence reaching one pixel: `Σ_c n_c · w_c`
pub fn total_energy_with_detector_response(
    spectrum: &Spectrum,
    mode    : FluenceMode,
    response: Option<&DetectorResponse>,
) -> Energyf64 {
    channel_weights(spectrum, mode, response).map(|(_, n, w)| n * w).sum()
}

/// Summed path lengths (cm) of all surfaces sharing a material and role
#[derive(Debug, Clone, PartialEq)]
pub struct PathGroup {
    pub material: MaterialId,
    pub role: Role,
    pub length: Array2<f64>,
}

/// Path groups in order of first appearance
#[derive(Debug, Clone, Default)]
pub struct PathGroups(Vec<PathGroup>);

impl PathGroups {
    pub fn new() -> Self { Self::default() }

    pub fn add(&mut self, material: &MaterialId, role: Role, length: &Array2<f32>) {
        match self.0.iter_mut().find(|g| &g.material == material && g.role == role) {
            Some(group) => Zip::from(&mut group.length).and(length).for_each(|a, &b| *a += b as f64),
            None => self.0.push(PathGroup { material: material.clone(), role, length: length.mapv(f64::from) }),
        }
    }

    pub fn groups(&self) -> &[PathGroup] { &self.0 }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }
}

/// Transmitted fluence through `groups`, for a detector of `(height, width)`
/// pixels. Groups whose material is unknown to `materials` are ignored.
pub fn transmitted_fluence(
    groups   : &PathGroups,
    spectrum : &Spectrum,
    materials: &dyn AttenuationProvider,
    mode     : FluenceMode,
    response : Option<&DetectorResponse>,
    shape    : (usize, usize),
) -> Array2<f64> {
    let channels: Vec<_> = channel_weights(spectrum, mode, response).collect();

    // Signed attenuation coefficient of each usable group, at each channel energy
    let mut lengths: Vec<&Array2<f64>> = vec![];
    let mut mus: Vec<Vec<PerLengthf64>> = vec![];
    for group in groups.groups() {
        let sign = match group.role { Role::Inner => 1.0, Role::Outer => -1.0 };
        let mu: Option<Vec<_>> = channels.iter()
            .map(|&(e, _, _)| materials.linear_attenuation(&group.material, e).map(|mu| sign * per_cm_(mu)))
            .collect();
        match mu {
            Some(mu) if group.length.dim() == shape => {
                lengths.push(&group.length);
                mus.push(mu);
            },
            Some(_) => tracing::warn!("Path lengths for `{}` do not match the detector shape", group.material),
            None    => tracing::warn!("No attenuation data for material `{}`: ignored", group.material),
        }
    }

    let mut fluence = Array2::zeros(shape);
    Zip::indexed(&mut fluence).par_for_each(|p, f| {
        *f = channels.iter().enumerate()
            .map(|(c, &(_, n, w))| {
                let exponent: f64 = lengths.iter().zip(&mus).map(|(l, mu)| mu[c] * l[p]).sum();
                n * w * (-exponent).exp()
            })
            .sum();
    });
    fluence
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rstest::rstest;
    use float_eq::assert_float_eq;
    use units::{kev, per_cm};
    use crate::material::{Material, MaterialTable};

    fn materials() -> MaterialTable {
        let mut t = MaterialTable::new();
        t.insert("water", Material::Constant(per_cm(0.2)))
         .insert("bone" , Material::Constant(per_cm(0.5)));
        t
    }

    fn spectrum() -> Spectrum {
        let mut s = Spectrum::new();
        s.add_channel(kev(40.0), 1000.0);
        s.add_channel(kev(80.0),  500.0);
        s
    }

    #[rstest(/**/ mode,                     expected,
             case(FluenceMode::Energy     , 0.04 * 1000.0 + 0.08 * 500.0),
             case(FluenceMode::PhotonCount, 1500.0),
    )]
    fn unattenuated_total(mode: FluenceMode, expected: f64) {
        assert_float_eq!(total_energy_with_detector_response(&spectrum(), mode, None), expected, r2nd <= 1e-12);
    }

    #[test]
    fn response_replaces_energy_as_weight() {
        let response = DetectorResponse::new(vec![(kev(0.0), kev(0.0)), (kev(100.0), kev(50.0))]).unwrap();
        let total = total_energy_with_detector_response(&spectrum(), FluenceMode::Energy, Some(&response));
        assert_float_eq!(total, 0.02 * 1000.0 + 0.04 * 500.0, r2nd <= 1e-12);
        let total = total_energy_with_detector_response(&spectrum(), FluenceMode::PhotonCount, Some(&response));
        assert_eq!(total, 1500.0);
    }

    #[test]
    fn beer_lambert_polychromatic() {
        let mut groups = PathGroups::new();
        groups.add(&"water".into(), Role::Inner, &array![[0.0, 10.0]]);
        let f = transmitted_fluence(&groups, &spectrum(), &materials(), FluenceMode::Energy, None, (1, 2));
        assert_float_eq!(f[[0, 0]], 80.0, r2nd <= 1e-12);
        assert_float_eq!(f[[0, 1]], 80.0 * (-2.0_f64).exp(), r2nd <= 1e-12);
    }

    #[test]
    fn same_material_and_role_are_grouped() {
        let mut groups = PathGroups::new();
        groups.add(&"water".into(), Role::Inner, &array![[1.0]]);
        groups.add(&"bone" .into(), Role::Inner, &array![[2.0]]);
        groups.add(&"water".into(), Role::Inner, &array![[3.0]]);
        groups.add(&"water".into(), Role::Outer, &array![[1.0]]);
        let g = groups.groups();
        assert_eq!(g.len(), 3);
        assert_eq!(g[0].length, array![[4.0]]);

        let f = transmitted_fluence(&groups, &spectrum(), &materials(), FluenceMode::PhotonCount, None, (1, 1));
        // 0.2 * 4 + 0.5 * 2 - 0.2 * 1
        assert_float_eq!(f[[0, 0]], 1500.0 * (-1.6_f64).exp(), r2nd <= 1e-12);
    }

    #[test]
    fn unknown_material_is_skipped() {
        let mut groups = PathGroups::new();
        groups.add(&"unobtainium".into(), Role::Inner, &array![[5.0]]);
        let f = transmitted_fluence(&groups, &spectrum(), &materials(), FluenceMode::PhotonCount, None, (1, 1));
        assert_eq!(f[[0, 0]], 1500.0);
    }
}
