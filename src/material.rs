//! Linear attenuation coefficients of the materials in the scene

use std::collections::BTreeMap;

use units::{AreaPerMass, Energy, MassDensity, PerLength, mev, mev_, per_cm, per_cm_};

/// Name of a material, as known to an `AttenuationProvider`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MaterialId(pub String);

impl From<&str> for MaterialId {
    fn from(s: &str) -> Self { Self(s.into()) }
}

impl std::fmt::Display for MaterialId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { self.0.fmt(f) }
}

/// Source of attenuation data. `None` means that the material is unknown.
pub trait AttenuationProvider: Send + Sync {
    fn linear_attenuation(&self, material: &MaterialId, energy: Energy) -> Option<PerLength>;

    fn density(&self, _material: &MaterialId) -> Option<MassDensity> { None }

    fn mass_attenuation(&self, material: &MaterialId, energy: Energy) -> Option<AreaPerMass> {
        Some(self.linear_attenuation(material, energy)? / self.density(material)?)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Material {
    /// Same coefficient at every energy
    Constant(PerLength),
    /// Energy-independent mass attenuation coefficient and density
    MassAttenuation { coefficient: AreaPerMass, density: MassDensity },
    /// Coefficients at the given energies: interpolated log-log between them
    /// and clamped outside them
    Tabulated(AttenuationTable),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttenuationTable {
    /// ln(energy / MeV), increasing
    ln_energy: Vec<f64>,
    /// ln(mu * cm)
    ln_mu: Vec<f64>,
}

impl AttenuationTable {
    /// Points with non-positive energy or coefficient are discarded; returns
    /// `None` if no points remain
    pub fn new(points: impl IntoIterator<Item = (Energy, PerLength)>) -> Option<Self> {
        let mut points: Vec<(f64, f64)> = points.into_iter()
            .map(|(e, mu)| (mev_(e), per_cm_(mu)))
            .filter(|&(e, mu)| e > 0.0 && mu > 0.0)
            .collect();
        if points.is_empty() { return None }
        points.sort_by(|a, b| a.0.total_cmp(&b.0));
        points.dedup_by(|a, b| a.0 == b.0);
        let (ln_energy, ln_mu) = points.into_iter().map(|(e, mu)| (e.ln(), mu.ln())).unzip();
        Some(Self { ln_energy, ln_mu })
    }

    pub fn at(&self, energy: Energy) -> PerLength {
        let (x, y) = (&self.ln_energy, &self.ln_mu);
        let e = mev_(energy).max(f64::MIN_POSITIVE).ln();
        let k = x.partition_point(|&xi| xi < e);
        let ln_mu = if k == 0 {
            y[0]
        } else if k == x.len() {
            y[k - 1]
        } else {
            y[k - 1] + (y[k] - y[k - 1]) * (e - x[k - 1]) / (x[k] - x[k - 1])
        };
        per_cm(ln_mu.exp())
    }

    pub fn energies(&self) -> impl Iterator<Item = Energy> + '_ {
        self.ln_energy.iter().map(|e| mev(e.exp()))
    }
}

impl Material {
    pub fn linear_attenuation(&self, energy: Energy) -> PerLength {
        match self {
            Material::Constant(mu) => *mu,
            Material::MassAttenuation { coefficient, density } => *coefficient * *density,
            Material::Tabulated(table) => table.at(energy),
        }
    }

    pub fn density(&self) -> Option<MassDensity> {
        match self {
            Material::MassAttenuation { density, .. } => Some(*density),
            _ => None,
        }
    }
}

/// In-memory `AttenuationProvider`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaterialTable {
    materials: BTreeMap<MaterialId, Material>,
}

impl MaterialTable {
    pub fn new() -> Self { Self::default() }

    pub fn insert(&mut self, id: impl Into<MaterialId>, material: Material) -> &mut Self {
        self.materials.insert(id.into(), material);
        self
    }

    pub fn get(&self, id: &MaterialId) -> Option<&Material> { self.materials.get(id) }

    pub fn len(&self) -> usize { self.materials.len() }

    pub fn is_empty(&self) -> bool { self.materials.is_empty() }
}

impl AttenuationProvider for MaterialTable {
    fn linear_attenuation(&self, material: &MaterialId, energy: Energy) -> Option<PerLength> {
        Some(self.get(material)?.linear_attenuation(energy))
    }

    fn density(&self, material: &MaterialId) -> Option<MassDensity> {
        self.get(material)?.density()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use float_eq::assert_float_eq;
    use units::{kev, cm2_g, cm2_g_, g_cm3};

    fn table() -> MaterialTable {
        let mut t = MaterialTable::new();
        t.insert("water", Material::Constant(per_cm(0.2)))
         .insert("bone" , Material::MassAttenuation { coefficient: cm2_g(0.25), density: g_cm3(1.9) })
         .insert("soft" , Material::Tabulated(AttenuationTable::new([
             (kev( 10.0), per_cm(5.0)),
             (kev(100.0), per_cm(0.5)),
         ]).unwrap()));
        t
    }

    #[test]
    fn unknown_material() {
        assert_eq!(table().linear_attenuation(&"lead".into(), kev(60.0)), None);
    }

    #[test]
    fn constant_and_mass_attenuation() {
        let t = table();
        let mu = |m: &str| per_cm_(t.linear_attenuation(&m.into(), kev(60.0)).unwrap());
        assert_float_eq!(mu("water"), 0.2 , r2nd <= 1e-12);
        assert_float_eq!(mu("bone") , 0.475, r2nd <= 1e-12);

        let mass = t.mass_attenuation(&"bone".into(), kev(60.0)).unwrap();
        assert_float_eq!(cm2_g_(mass), 0.25, r2nd <= 1e-12);
        assert_eq!(t.mass_attenuation(&"water".into(), kev(60.0)), None);
    }

    #[rstest(/**/ energy, expected,
             case(  1.0, 5.0 ),   // clamped
             case( 10.0, 5.0 ),
             case(100.0, 0.5 ),
             case(500.0, 0.5 ),   // clamped
             // Log-log interpolation: a power law through the two points
             case(31.622776601683793, 5.0 * 10.0_f64.powf(-0.5)),
    )]
    fn tabulated(energy: f64, expected: f64) {
        let mu = table().linear_attenuation(&"soft".into(), kev(energy)).unwrap();
        assert_float_eq!(per_cm_(mu), expected, r2nd <= 1e-9);
    }

    #[test]
    fn degenerate_tables() {
        assert_eq!(AttenuationTable::new([]), None);
        assert_eq!(AttenuationTable::new([(kev(0.0), per_cm(1.0)), (kev(10.0), per_cm(0.0))]), None);
    }
}
