//! Configuration file parser for X-ray simulations

use std::fs;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, de};

use geometry::{Point, TriangleMesh, Vector};
use units::{Energy, Length, PerLength, degree, g_cm3, cm2_g, mm_, parse_per_length};
use crate::attenuation::FluenceMode;
use crate::detector::BeamShape;
use crate::engine::{ImageEngine, SimulationContext};
use crate::error::{FatalError, Result};
use crate::filter::ArtifactFilter;
use crate::material::{AttenuationTable, Material, MaterialTable};
use crate::scene::SceneNode;
use crate::spectrum::Spectrum;

fn deserialize_uom<'d, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'d>,
    T: FromStr,
    <T as FromStr>::Err: std::fmt::Display,
{
    String::deserialize(deserializer)?
        .parse::<T>()
        .map_err(de::Error::custom)
}

fn deserialize_uom_2d<'d, D, T>(deserializer: D) -> std::result::Result<(T, T), D::Error>
where
    D: Deserializer<'d>,
    T: FromStr,
    <T as FromStr>::Err: std::fmt::Display,
{
    let (x, y) = <(String, String)>::deserialize(deserializer)?;
    Ok((x.parse().map_err(<D::Error as de::Error>::custom)?,
        y.parse().map_err(<D::Error as de::Error>::custom)?))
}

fn deserialize_uom_3d<'d, D, T>(deserializer: D) -> std::result::Result<(T, T, T), D::Error>
where
    D: Deserializer<'d>,
    T: FromStr,
    <T as FromStr>::Err: std::fmt::Display,
{
    let (x, y, z) = <(String, String, String)>::deserialize(deserializer)?;
    tr_tup_res((x.parse(), y.parse(), z.parse()))
        .map_err(de::Error::custom)
}

fn deserialize_uom_3d_opt<'d, D, T>(deserializer: D) -> std::result::Result<Option<(T, T, T)>, D::Error>
where
    D: Deserializer<'d>,
    T: FromStr,
    <T as FromStr>::Err: std::fmt::Display,
{
    Option::<(String, String, String)>::deserialize(deserializer)?
        .map(|(x, y, z)| tr_tup_res((x.parse(), y.parse(), z.parse())))
        .transpose()
        .map_err(de::Error::custom)
}

fn deserialize_uom_3d_vec<'d, D, T>(deserializer: D) -> std::result::Result<Vec<(T, T, T)>, D::Error>
where
    D: Deserializer<'d>,
    T: FromStr,
    <T as FromStr>::Err: std::fmt::Display,
{
    Vec::<(String, String, String)>::deserialize(deserializer)?
        .into_iter()
        .map(|(x, y, z)| tr_tup_res((x.parse(), y.parse(), z.parse())))
        .collect::<std::result::Result<_, _>>()
        .map_err(de::Error::custom)
}

fn deserialize_per_length_opt<'d, D>(deserializer: D) -> std::result::Result<Option<PerLength>, D::Error>
where
    D: Deserializer<'d>,
{
    Option::<String>::deserialize(deserializer)?
        .map(|s| parse_per_length(&s))
        .transpose()
        .map_err(de::Error::custom)
}

fn deserialize_attenuation_table<'d, D>(deserializer: D) -> std::result::Result<Option<Vec<(Energy, PerLength)>>, D::Error>
where
    D: Deserializer<'d>,
{
    Option::<Vec<(String, String)>>::deserialize(deserializer)?
        .map(|rows| rows.into_iter()
             .map(|(e, mu)| Ok((e.parse::<Energy>().map_err(<D::Error as de::Error>::custom)?,
                                parse_per_length(&mu).map_err(<D::Error as de::Error>::custom)?)))
             .collect())
        .transpose()
}

fn deserialize_channels<'d, D>(deserializer: D) -> std::result::Result<Option<Vec<(Energy, f64)>>, D::Error>
where
    D: Deserializer<'d>,
{
    Option::<Vec<(String, f64)>>::deserialize(deserializer)?
        .map(|rows| rows.into_iter()
             .map(|(e, n)| Ok((e.parse::<Energy>().map_err(<D::Error as de::Error>::custom)?, n)))
             .collect())
        .transpose()
}

/// Transpose 3-tuple of `Result`
///
/// `Ok` if all elements `Ok`; if any element is an `Err` return the first one.
fn tr_tup_res<O, E>((x,y,z): (std::result::Result<O, E>, std::result::Result<O, E>, std::result::Result<O, E>))
    -> std::result::Result<(O, O, O), E>
{
    Ok((x?, y?, z?))
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub mode: Mode,

    #[serde(default)]
    pub filter: Filter,

    pub source: Source,
    pub detector: Detector,
    pub spectrum: SpectrumConfig,

    #[serde(default)]
    pub materials: BTreeMap<String, MaterialConfig>,

    #[serde(default)]
    pub surfaces: Vec<Surface>,

    pub rotation: Option<Rotation>,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Mode { #[default] Energy, PhotonCount }

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Filter { Disabled, #[default] Gpu, Cpu }

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Beam { #[default] Point, Parallel }

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct Source {
    #[serde(deserialize_with = "deserialize_uom_3d")]
    pub position: (Length, Length, Length),

    #[serde(default)]
    pub shape: Beam,

    /// Offsets of the points making up an extended source
    #[serde(default)]
    #[serde(deserialize_with = "deserialize_uom_3d_vec")]
    pub samples: Vec<(Length, Length, Length)>,
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct Detector {
    #[serde(deserialize_with = "deserialize_uom_3d")]
    pub position: (Length, Length, Length),

    #[serde(default = "default_up")]
    pub up: [f64; 3],

    /// Number of pixels as (width, height)
    pub pixels: (usize, usize),

    #[serde(deserialize_with = "deserialize_uom_2d")]
    pub pitch: (Length, Length),

    pub response: Option<TableFile>,
}

fn default_up() -> [f64; 3] { [0.0, 1.0, 0.0] }

/// Two-column text file of energies, in `unit`
#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct TableFile {
    pub file: PathBuf,
    #[serde(default = "default_energy_unit")]
    pub unit: String,
}

fn default_energy_unit() -> String { "keV".into() }

/// Exactly one of `monochromatic`, `file` and `channels` must be given
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct SpectrumConfig {
    pub monochromatic: Option<Monochromatic>,

    pub file: Option<PathBuf>,

    #[serde(default = "default_energy_unit")]
    pub unit: String,

    #[serde(default)]
    pub normalise: bool,

    #[serde(default = "default_merge")]
    pub merge: usize,

    #[serde(default)]
    #[serde(deserialize_with = "deserialize_channels")]
    pub channels: Option<Vec<(Energy, f64)>>,
}

fn default_merge() -> usize { 1 }

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct Monochromatic {
    #[serde(deserialize_with = "deserialize_uom")]
    pub energy: Energy,
    pub photons: f64,
}

/// Exactly one of `mu`, `mass_attenuation_cm2_g` (with `density_g_cm3`) and
/// `table` must be given
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct MaterialConfig {
    #[serde(default)]
    #[serde(deserialize_with = "deserialize_per_length_opt")]
    pub mu: Option<PerLength>,

    pub mass_attenuation_cm2_g: Option<f64>,
    pub density_g_cm3: Option<f64>,

    #[serde(default)]
    #[serde(deserialize_with = "deserialize_attenuation_table")]
    pub table: Option<Vec<(Energy, PerLength)>>,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SurfaceRole { #[default] Inner, Outer }

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct Surface {
    pub label: String,
    pub material: Option<String>,

    #[serde(default)]
    pub role: SurfaceRole,

    pub shape: Shape,

    #[serde(default)]
    #[serde(deserialize_with = "deserialize_uom_3d_opt")]
    pub translate: Option<(Length, Length, Length)>,

    pub rotate: Option<Rotate>,

    pub scale: Option<f64>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case", deny_unknown_fields)]
pub enum Shape {
    Cube {
        #[serde(deserialize_with = "deserialize_uom")]
        side: Length,
    },
    Cuboid {
        #[serde(deserialize_with = "deserialize_uom_3d")]
        size: (Length, Length, Length),
    },
    Cylinder {
        #[serde(deserialize_with = "deserialize_uom")]
        radius: Length,
        #[serde(deserialize_with = "deserialize_uom")]
        height: Length,
        #[serde(default = "default_segments")]
        segments: usize,
    },
    Sphere {
        #[serde(deserialize_with = "deserialize_uom")]
        radius: Length,
        #[serde(default = "default_stacks")]
        stacks: usize,
        #[serde(default = "default_segments")]
        slices: usize,
    },
}

fn default_segments() -> usize { 64 }
fn default_stacks  () -> usize { 32 }

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Rotate {
    pub axis: [f64; 3],
    pub degrees: f64,
}

/// Rotation sequence used by the sinogram and projection-set computations
#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct Rotation {
    #[serde(default = "origin")]
    #[serde(deserialize_with = "deserialize_uom_3d")]
    pub centre: (Length, Length, Length),

    pub angles: usize,

    #[serde(default)]
    pub offset_degrees: f64,
}

fn origin() -> (Length, Length, Length) { let z = units::mm(0.0); (z, z, z) }

/// Read a configuration file. Relative paths inside it are interpreted
/// relative to the file's directory.
pub fn read_config_file(path: &Path) -> Result<Config> {
    let text = fs::read_to_string(path).map_err(FatalError::file(path))?;
    let mut config: Config = toml::from_str(&text)?;
    if let Some(dir) = path.parent() {
        config.resolve_paths(dir);
    }
    Ok(config)
}

fn mm3((x, y, z): (Length, Length, Length)) -> [f64; 3] { [mm_(x), mm_(y), mm_(z)] }

impl Shape {
    pub fn mesh(&self) -> TriangleMesh {
        match *self {
            Shape::Cube     { side }                    => TriangleMesh::cube(side),
            Shape::Cuboid   { size: (x, y, z) }         => TriangleMesh::cuboid([x, y, z]),
            Shape::Cylinder { radius, height, segments } => TriangleMesh::cylinder(radius, height, segments),
            Shape::Sphere   { radius, stacks, slices }   => TriangleMesh::sphere(radius, stacks, slices),
        }
    }
}

impl SpectrumConfig {
    pub fn build(&self) -> Result<Spectrum> {
        match (&self.monochromatic, &self.file, &self.channels) {
            (Some(m), None, None) => Ok(Spectrum::monochromatic(m.energy, m.photons)),
            (None, Some(file), None) =>
                Spectrum::load_tsv(file, self.unit.parse()?, self.normalise, self.merge),
            (None, None, Some(channels)) => {
                let mut spectrum = Spectrum::new();
                for &(energy, n) in channels { spectrum.add_channel(energy, n) }
                if self.normalise  { spectrum.normalise() }
                if self.merge > 1  { spectrum.merge_channels(self.merge) }
                Ok(spectrum)
            },
            _ => Err(FatalError::Config(
                "[spectrum] needs exactly one of `monochromatic`, `file` and `channels`".into())),
        }
    }
}

impl MaterialConfig {
    pub fn build(&self, name: &str) -> Result<Material> {
        let bad = |what: &str| FatalError::Config(format!("material `{name}`: {what}"));
        match (self.mu, self.mass_attenuation_cm2_g, self.density_g_cm3, &self.table) {
            (Some(mu), None, None, None) => Ok(Material::Constant(mu)),
            (None, Some(mac), Some(rho), None) =>
                Ok(Material::MassAttenuation { coefficient: cm2_g(mac), density: g_cm3(rho) }),
            (None, Some(_), None, None) => Err(bad("`mass_attenuation_cm2_g` requires `density_g_cm3`")),
            (None, None, None, Some(table)) => AttenuationTable::new(table.iter().copied())
                .map(Material::Tabulated)
                .ok_or_else(|| bad("attenuation table has no usable points")),
            _ => Err(bad("needs exactly one of `mu`, `mass_attenuation_cm2_g` and `table`")),
        }
    }
}

impl Config {
    fn resolve_paths(&mut self, dir: &Path) {
        let resolve = |p: &mut PathBuf| if p.is_relative() { *p = dir.join(&*p) };
        if let Some(file) = &mut self.spectrum.file       { resolve(file) }
        if let Some(r)    = &mut self.detector.response   { resolve(&mut r.file) }
    }

    pub fn materials(&self) -> Result<MaterialTable> {
        let mut table = MaterialTable::new();
        for (name, m) in &self.materials {
            table.insert(name.as_str(), m.build(name)?);
        }
        Ok(table)
    }

    /// An engine with every item of the configuration applied
    pub fn build_engine(&self) -> Result<ImageEngine> {
        let mut context = SimulationContext::new(Box::new(self.materials()?));

        let s = &self.source;
        context.set_source_position(mm3(s.position), "mm")?;
        for &sample in &s.samples { context.add_source_sample(mm3(sample), "mm")? }
        context.set_beam_shape(match s.shape {
            Beam::Point    => BeamShape::PointSource,
            Beam::Parallel => BeamShape::ParallelBeam,
        });

        let d = &self.detector;
        context.set_detector_position(mm3(d.position), "mm")?;
        context.set_up_vector(d.up);
        context.set_pixel_count(d.pixels.0, d.pixels.1);
        context.set_pixel_size(mm_(d.pitch.0), mm_(d.pitch.1), "mm")?;
        if let Some(r) = &d.response { context.load_detector_response(&r.file, &r.unit)? }

        context.set_spectrum(self.spectrum.build()?);

        for surface in &self.surfaces {
            let mut node = SceneNode::new(surface.shape.mesh());
            node.material = surface.material.as_deref().map(Into::into);
            if let Some(factor) = surface.scale { node.scale(factor); }
            if let Some(Rotate { axis, degrees }) = surface.rotate { node.rotate(axis.into(), degree(degrees)); }
            if let Some((x, y, z)) = surface.translate { node.translate(Vector::new(x, y, z)); }
            context.scene.add_node(surface.label.as_str(), node);
            match surface.role {
                SurfaceRole::Inner => context.scene.add_inner_surface(&surface.label),
                SurfaceRole::Outer => context.scene.add_outer_surface(&surface.label),
            }
        }

        let mut engine = ImageEngine::new(context);
        engine.set_fluence_mode(match self.mode {
            Mode::Energy      => FluenceMode::Energy,
            Mode::PhotonCount => FluenceMode::PhotonCount,
        });
        engine.set_artifact_filter(match self.filter {
            Filter::Disabled => ArtifactFilter::Disabled,
            Filter::Gpu      => ArtifactFilter::Gpu,
            Filter::Cpu      => ArtifactFilter::Cpu,
        });
        Ok(engine)
    }

    /// Centre, number of angles and offset of the rotation sequence
    pub fn rotation(&self) -> Result<(Point, usize, units::Angle)> {
        let r = self.rotation.as_ref()
            .ok_or_else(|| FatalError::Config("a [rotation] section is required".into()))?;
        let (x, y, z) = r.centre;
        Ok((Point::new(x, y, z), r.angles, degree(r.offset_degrees)))
    }
}
