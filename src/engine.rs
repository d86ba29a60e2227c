//! The simulation context and the image engine which drives it.

use std::collections::BTreeSet;
use std::path::Path;

use ndarray::{Array2, Array3, Axis, s};

use geometry::{Point, Transform, Vector, Vectorf64};
use units::{Angle, Energy, EnergyUnit, LengthUnit, cm_, degree, degree_, mm_, todo::Intensityf32};
use crate::attenuation::{FluenceMode, PathGroups, total_energy_with_detector_response, transmitted_fluence};
use crate::detector::{BeamShape, DetectorGeometry, DetectorResponse};
use crate::error::{FatalError, Result};
use crate::filter::ArtifactFilter;
use crate::image::{Image2, Image3};
use crate::lbuffer::{LBuffer, Projection};
use crate::material::{AttenuationProvider, MaterialTable};
use crate::scene::{Role, Scene, SceneNode, rotation, rotation_about};
use crate::spectrum::Spectrum;

/// Configuration which must be supplied before anything can be computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Requirement {
    BeamShape,
    BeamEnergy,
    SourcePosition,
    DetectorPosition,
    UpVector,
    PixelCount,
    PixelSize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    NotReady { missing: BTreeSet<Requirement> },
    Ready,
}

impl Readiness {
    fn initial() -> Self {
        use Requirement as R;
        Self::NotReady { missing: [R::BeamShape, R::BeamEnergy, R::SourcePosition, R::DetectorPosition,
                                   R::UpVector, R::PixelCount, R::PixelSize].into() }
    }

    fn satisfy(&mut self, r: Requirement) {
        if let Self::NotReady { missing } = self {
            missing.remove(&r);
            if missing.is_empty() { *self = Self::Ready }
        }
    }

    fn require(&mut self, r: Requirement) {
        match self {
            Self::NotReady { missing } => { missing.insert(r); },
            Self::Ready => *self = Self::NotReady { missing: [r].into() },
        }
    }

    pub fn is_ready(&self) -> bool { matches!(self, Self::Ready) }
}

/// Everything that describes the imaging set-up
pub struct SimulationContext {
    spectrum: Spectrum,
    detector: DetectorGeometry,
    pub scene: Scene,
    materials: Box<dyn AttenuationProvider>,
    /// Applied to the whole scene by `ImageEngine::compute_xray_image`
    scene_transform: Transform,
    readiness: Readiness,
    /// Incremented whenever previously computed images become meaningless
    epoch: u64,
}

impl Default for SimulationContext {
    fn default() -> Self { Self::new(Box::new(MaterialTable::new())) }
}

impl SimulationContext {
    pub fn new(materials: Box<dyn AttenuationProvider>) -> Self {
        Self {
            spectrum: Spectrum::new(),
            detector: DetectorGeometry::default(),
            scene: Scene::new(),
            materials,
            scene_transform: Transform::identity(),
            readiness: Readiness::initial(),
            epoch: 0,
        }
    }

    pub fn readiness(&self) -> &Readiness { &self.readiness }
    pub fn is_ready(&self) -> bool { self.readiness.is_ready() }

    pub fn spectrum(&self) -> &Spectrum { &self.spectrum }
    pub fn detector(&self) -> &DetectorGeometry { &self.detector }
    pub fn materials(&self) -> &dyn AttenuationProvider { self.materials.as_ref() }
    pub fn set_materials(&mut self, materials: Box<dyn AttenuationProvider>) { self.materials = materials }

    // ----- Spectrum --------------------------------------------------------------
    pub fn set_monochromatic(&mut self, energy: Energy, photon_count: f64) {
        self.set_spectrum(Spectrum::monochromatic(energy, photon_count))
    }

    pub fn add_energy_channel(&mut self, energy: Energy, photon_count: f64) {
        let mut spectrum = std::mem::take(&mut self.spectrum);
        spectrum.add_channel(energy, photon_count);
        self.set_spectrum(spectrum)
    }

    pub fn load_spectrum(&mut self, path: &Path, unit: &str, normalise: bool, merge: usize) -> Result<()> {
        let unit: EnergyUnit = unit.parse()?;
        self.set_spectrum(Spectrum::load_tsv(path, unit, normalise, merge)?);
        Ok(())
    }

    pub fn set_spectrum(&mut self, spectrum: Spectrum) {
        self.spectrum = spectrum;
        if self.spectrum.is_empty() { self.readiness.require(Requirement::BeamEnergy) }
        else                        { self.readiness.satisfy(Requirement::BeamEnergy) }
    }

    pub fn reset_spectrum(&mut self) { self.set_spectrum(Spectrum::new()) }

    // ----- Detector and source ---------------------------------------------------
    pub fn set_beam_shape(&mut self, beam: BeamShape) {
        self.detector.set_beam_shape(beam);
        self.readiness.satisfy(Requirement::BeamShape);
    }

    pub fn set_source_position(&mut self, [x, y, z]: [f64; 3], unit: &str) -> Result<()> {
        let unit: LengthUnit = unit.parse()?;
        self.detector.set_source_position(Point::new(unit.length(x), unit.length(y), unit.length(z)));
        self.readiness.satisfy(Requirement::SourcePosition);
        Ok(())
    }

    pub fn add_source_sample(&mut self, [x, y, z]: [f64; 3], unit: &str) -> Result<()> {
        let unit: LengthUnit = unit.parse()?;
        self.detector.add_source_sample(Vector::new(unit.length(x), unit.length(y), unit.length(z)));
        Ok(())
    }

    pub fn clear_source_samples(&mut self) { self.detector.clear_source_samples() }

    pub fn set_detector_position(&mut self, [x, y, z]: [f64; 3], unit: &str) -> Result<()> {
        let unit: LengthUnit = unit.parse()?;
        self.detector.set_detector_position(Point::new(unit.length(x), unit.length(y), unit.length(z)));
        self.readiness.satisfy(Requirement::DetectorPosition);
        Ok(())
    }

    pub fn set_up_vector(&mut self, [x, y, z]: [f64; 3]) {
        self.detector.set_up_vector(Vectorf64::new(x, y, z));
        self.readiness.satisfy(Requirement::UpVector);
    }

    /// Invalidates all previously computed images, and requires the pixel
    /// size to be set again
    pub fn set_pixel_count(&mut self, width: usize, height: usize) {
        self.detector.set_pixel_count(width, height);
        self.readiness.satisfy(Requirement::PixelCount);
        self.readiness.require(Requirement::PixelSize);
        self.epoch += 1;
    }

    pub fn set_pixel_size(&mut self, width: f64, height: f64, unit: &str) -> Result<()> {
        let unit: LengthUnit = unit.parse()?;
        self.detector.set_pixel_pitch(unit.length(width), unit.length(height));
        self.readiness.satisfy(Requirement::PixelSize);
        Ok(())
    }

    pub fn load_detector_response(&mut self, path: &Path, unit: &str) -> Result<()> {
        let unit: EnergyUnit = unit.parse()?;
        self.detector.set_response(DetectorResponse::load_tsv(path, unit)?);
        Ok(())
    }

    pub fn clear_detector_response(&mut self) { self.detector.clear_response() }

    // ----- Scene transformation --------------------------------------------------
    pub fn scene_transform(&self) -> &Transform { &self.scene_transform }

    pub fn rotate_scene(&mut self, axis: [f64; 3], angle: Angle) {
        self.scene_transform = rotation(Vectorf64::from(axis), angle) * self.scene_transform;
    }

    pub fn translate_scene(&mut self, by: Vector) {
        let by: Vectorf64 = by.into();
        self.scene_transform = Transform::new_translation(&by) * self.scene_transform;
    }

    pub fn reset_scene_transform(&mut self) { self.scene_transform = Transform::identity() }
}

/// The most recent results, valid only for the epoch in which they were made
#[derive(Default)]
struct Cache {
    epoch: u64,
    fluence: Option<Image2>,
    lbuffer: Option<Image2>,
    cumulated_lbuffer: Option<Image2>,
    sinogram: Option<Image3>,
    projection_set: Option<Image3>,
}

pub struct ImageEngine {
    context: SimulationContext,
    filter: ArtifactFilter,
    mode: FluenceMode,
    cache: Cache,
}

impl Default for ImageEngine {
    fn default() -> Self { Self::new(SimulationContext::default()) }
}

macro_rules! cached_accessors {
    ($($field:ident $save:ident $label:literal $image:ty;)*) => {
        $(
            pub fn $field(&self) -> Option<&$image> { self.fresh(&self.cache.$field) }

            /// Write the most recent result to a tagged image file. Nothing is
            /// written (and a warning is given) if there is no result.
            pub fn $save(&self, path: &Path, compress: bool) -> Result<()> {
                match self.$field() {
                    Some(image) => image.write_to_file(path, $label, compress),
                    None => {
                        tracing::warn!("No {} has been computed: nothing saved to {}", $label, path.display());
                        Ok(())
                    }
                }
            }
        )*
    };
}

impl ImageEngine {
    pub fn new(context: SimulationContext) -> Self {
        Self { context, filter: ArtifactFilter::default(), mode: FluenceMode::default(), cache: Cache::default() }
    }

    pub fn context(&self) -> &SimulationContext { &self.context }
    pub fn context_mut(&mut self) -> &mut SimulationContext { &mut self.context }

    pub fn is_ready(&self) -> bool { self.context.is_ready() }

    pub fn fluence_mode(&self) -> FluenceMode { self.mode }
    pub fn set_fluence_mode(&mut self, mode: FluenceMode) { self.mode = mode }

    pub fn artifact_filter(&self) -> ArtifactFilter { self.filter }
    pub fn set_artifact_filter(&mut self, filter: ArtifactFilter) { self.filter = filter }
    pub fn enable_artifact_filtering_on_gpu(&mut self) { self.filter = ArtifactFilter::Gpu }
    pub fn enable_artifact_filtering_on_cpu(&mut self) { self.filter = ArtifactFilter::Cpu }
    pub fn disable_artifact_filtering(&mut self) { self.filter = ArtifactFilter::Disabled }

    pub fn use_point_source (&mut self) { self.context.set_beam_shape(BeamShape::PointSource ) }
    pub fn use_parallel_beam(&mut self) { self.context.set_beam_shape(BeamShape::ParallelBeam) }

    /// Unattenuated fluence reaching a single pixel
    pub fn total_energy_with_detector_response(&self) -> f64 {
        let ctx = &self.context;
        total_energy_with_detector_response(ctx.spectrum(), self.mode, ctx.detector().response())
    }

    /// Unattenuated fluence reaching the whole detector
    pub fn total_energy_on_detector(&self) -> f64 {
        let (w, h) = self.context.detector().pixel_count();
        (w * h) as f64 * self.total_energy_with_detector_response()
    }

    cached_accessors! {
        fluence           save_fluence_image          "fluence"           Image2;
        lbuffer           save_lbuffer                "L-buffer"          Image2;
        cumulated_lbuffer save_cumulated_lbuffer      "cumulated L-buffer" Image2;
        sinogram          save_sinogram               "sinogram"          Image3;
        projection_set    save_projection_set         "projection set"    Image3;
    }

    fn fresh<'a, T>(&self, x: &'a Option<T>) -> Option<&'a T> {
        if self.cache.epoch == self.context.epoch { x.as_ref() } else { None }
    }

    fn sync_cache(&mut self) {
        if self.cache.epoch != self.context.epoch {
            self.cache = Cache { epoch: self.context.epoch, ..Cache::default() };
        }
    }

    /// Pixel spacing in mm as (rows, columns)
    fn pixel_spacing(&self) -> (f64, f64) {
        let (pw, ph) = self.context.detector().pixel_pitch();
        (mm_(ph), mm_(pw))
    }

    fn blank_image(&self) -> Image2 {
        let (w, h) = self.context.detector().pixel_count();
        let (sy, sx) = self.pixel_spacing();
        Image2::zeros((h, w), vec![sy, sx])
    }

    /// The previous result of this kind, or a blank image, with a warning
    fn not_ready(&self, what: &str, previous: Option<Image2>) -> Image2 {
        tracing::warn!("Cannot compute {what}: configuration incomplete {:?}", self.context.readiness());
        previous.unwrap_or_else(|| self.blank_image())
    }

    // ----- L-buffers -------------------------------------------------------------

    /// L-buffers of one surface, one per source sample, with every node
    /// transformation followed by `model`
    fn surface_lbuffers(&self, node: &SceneNode, model: &Transform) -> Result<Vec<Array2<f32>>> {
        let detector = self.context.detector();
        let basis = detector.basis()?;
        let transform = model * node.transform;
        let bvh = node.mesh.bvh(&transform);
        let cutoff = (bvh.bbox().diagonal() / 10.0) as f32;
        Ok(detector.source_samples().iter()
            .map(|offset| {
                let projection = Projection { bvh: &bvh, detector, basis: &basis, source_offset: offset };
                let mut lbuffer: LBuffer = projection.lbuffer();
                self.filter.apply(&mut lbuffer, &projection, cutoff);
                lbuffer.length
            })
            .collect())
    }

    /// L-buffer of one surface averaged over the source samples
    fn surface_lbuffer(&self, node: &SceneNode, model: &Transform) -> Result<Array2<f32>> {
        let lbuffers = self.surface_lbuffers(node, model)?;
        let n = lbuffers.len() as f32;
        let (w, h) = self.context.detector().pixel_count();
        let total = lbuffers.into_iter().fold(Array2::<f32>::zeros((h, w)), |acc, l| acc + l);
        Ok(total / n)
    }

    /// Path length through the surface labelled `label`, in cm. An unknown
    /// label gives a blank image and a warning.
    pub fn compute_lbuffer(&mut self, label: &str) -> Result<Image2> {
        self.sync_cache();
        if !self.is_ready() {
            let previous = self.cache.lbuffer.clone();
            return Ok(self.not_ready("L-buffer", previous))
        }
        let Some(node) = self.context.scene.get_node(label) else {
            tracing::warn!("No node labelled `{label}`");
            return Ok(self.blank_image())
        };
        let data = self.surface_lbuffer(node, &self.context.scene_transform)?;
        let (sy, sx) = self.pixel_spacing();
        let image = Image2::new(data, vec![sy, sx]);
        self.cache.lbuffer = Some(image.clone());
        Ok(image)
    }

    /// Sum of the L-buffers of all inner surfaces, in cm
    pub fn compute_cumulated_lbuffer(&mut self) -> Result<Image2> {
        self.sync_cache();
        if !self.is_ready() {
            let previous = self.cache.cumulated_lbuffer.clone();
            return Ok(self.not_ready("cumulated L-buffer", previous))
        }
        let mut image = self.blank_image();
        for (_, node) in self.context.scene.inner_surfaces() {
            image.data += &self.surface_lbuffer(node, &self.context.scene_transform)?;
        }
        self.cache.cumulated_lbuffer = Some(image.clone());
        Ok(image)
    }

    // ----- Fluence ---------------------------------------------------------------

    /// Transmitted fluence with the whole scene transformed by `model`
    pub fn compute_fluence_image(&mut self, model: &Transform) -> Result<Image2> {
        self.sync_cache();
        if !self.is_ready() {
            let previous = self.cache.fluence.clone();
            return Ok(self.not_ready("X-ray image", previous))
        }
        let data = self.fluence_data(model)?;
        let (sy, sx) = self.pixel_spacing();
        let image = Image2::new(data.mapv(|x| x as Intensityf32), vec![sy, sx]);
        self.cache.fluence = Some(image.clone());
        Ok(image)
    }

    /// Transmitted fluence with the scene in its current position
    pub fn compute_xray_image(&mut self) -> Result<Image2> {
        let model = self.context.scene_transform;
        self.compute_fluence_image(&model)
    }

    /// Fluence averaged over the source samples. Each sample is attenuated
    /// separately: averaging path lengths before exponentiating would not give
    /// the mean fluence.
    fn fluence_data(&self, model: &Transform) -> Result<Array2<f64>> {
        let ctx = &self.context;
        let detector = ctx.detector();
        let (w, h) = detector.pixel_count();
        let n_samples = detector.source_samples().len();

        let mut groups = vec![PathGroups::new(); n_samples];
        for (label, role, node) in ctx.scene.surfaces() {
            let Some(material) = &node.material else {
                tracing::warn!("Surface `{label}` has no material: ignored");
                continue
            };
            for (group, lbuffer) in groups.iter_mut().zip(self.surface_lbuffers(node, model)?) {
                group.add(material, role, &lbuffer);
            }
        }
        if groups.iter().all(PathGroups::is_empty) {
            tracing::debug!("No attenuating surfaces: the image is the unattenuated beam");
        }
        let total = groups.iter()
            .map(|g| transmitted_fluence(g, ctx.spectrum(), ctx.materials(), self.mode, detector.response(), (h, w)))
            .fold(Array2::<f64>::zeros((h, w)), |acc, f| acc + f);
        Ok(total / n_samples as f64)
    }

    // ----- Rotation sequences ----------------------------------------------------

    fn angles(n: usize, offset: Angle) -> Result<(Angle, impl Iterator<Item = Angle>)> {
        if n == 0 { return Err(FatalError::ZeroAngles) }
        let step = degree(360.0 / n as f64);
        Ok((step, (0..n).map(move |i| offset + step * i as f64)))
    }

    fn model_at(&self, centre: Point, angle: Angle) -> Result<Transform> {
        let up = self.context.detector().basis()?.up;
        Ok(rotation_about(centre.into(), up, angle) * self.context.scene_transform)
    }

    pub fn compute_sinogram(&mut self, centre: Point, n_angles: usize, offset: Angle) -> Result<Image3> {
        self.compute_sinogram_with(centre, n_angles, offset, |_, _| ())
    }

    /// Rotate the scene about the detector's up vector through `centre`, and
    /// record the line integrals `scaling · ln(I₀/I)` along every detector row
    /// at each angle. The result is indexed by `[row, angle, column]`.
    pub fn compute_sinogram_with(
        &mut self,
        centre: Point,
        n_angles: usize,
        offset: Angle,
        mut progress: impl FnMut(usize, usize),
    ) -> Result<Image3> {
        self.sync_cache();
        let (step, angles) = Self::angles(n_angles, offset)?;
        let (w, h) = self.context.detector().pixel_count();
        let (sy, sx) = self.pixel_spacing();
        let spacing = vec![sy, degree_(step), sx];
        if !self.is_ready() {
            tracing::warn!("Cannot compute sinogram: configuration incomplete {:?}", self.context.readiness());
            return Ok(self.cache.sinogram.clone().unwrap_or_else(|| Image3::zeros((h, n_angles, w), spacing)))
        }

        let total_input = self.total_energy_with_detector_response();
        if !(total_input > 0.0) {
            tracing::warn!("Cannot compute sinogram: the beam carries no energy to the detector");
            return Ok(Image3::zeros((h, n_angles, w), spacing))
        }
        let (width, _) = self.context.detector().size();
        let scaling = w as f64 / cm_(width);

        let mut sinogram = Array3::<f32>::zeros((h, n_angles, w));
        for (a, angle) in angles.enumerate() {
            let fluence = self.fluence_data(&self.model_at(centre, angle)?)?;
            let line_integrals = fluence.mapv(|f| (scaling * (total_input / f.max(f64::MIN_POSITIVE)).ln()) as f32);
            sinogram.slice_mut(s![.., a, ..]).assign(&line_integrals);
            progress(a, n_angles);
        }

        let image = Image3::new(sinogram, spacing);
        self.cache.sinogram = Some(image.clone());
        Ok(image)
    }

    pub fn compute_projection_set(&mut self, centre: Point, n_angles: usize, offset: Angle) -> Result<Image3> {
        self.compute_projection_set_with(centre, n_angles, offset, |_, _| ())
    }

    /// Fluence images at `n_angles` equally spaced rotations of the scene,
    /// indexed by `[angle, row, column]`
    pub fn compute_projection_set_with(
        &mut self,
        centre: Point,
        n_angles: usize,
        offset: Angle,
        mut progress: impl FnMut(usize, usize),
    ) -> Result<Image3> {
        self.sync_cache();
        let (step, angles) = Self::angles(n_angles, offset)?;
        let (w, h) = self.context.detector().pixel_count();
        let (sy, sx) = self.pixel_spacing();
        let spacing = vec![degree_(step), sy, sx];
        if !self.is_ready() {
            tracing::warn!("Cannot compute projection set: configuration incomplete {:?}", self.context.readiness());
            return Ok(self.cache.projection_set.clone().unwrap_or_else(|| Image3::zeros((n_angles, h, w), spacing)))
        }

        let mut projections = Array3::<f32>::zeros((n_angles, h, w));
        for (a, angle) in angles.enumerate() {
            let fluence = self.fluence_data(&self.model_at(centre, angle)?)?;
            projections.index_axis_mut(Axis(0), a).assign(&fluence.mapv(|x| x as f32));
            progress(a, n_angles);
        }

        let image = Image3::new(projections, spacing);
        self.cache.projection_set = Some(image.clone());
        Ok(image)
    }

    /// Register `label` as an inner or outer surface
    pub fn add_surface(&mut self, label: &str, role: Role) {
        match role {
            Role::Inner => self.context.scene.add_inner_surface(label),
            Role::Outer => self.context.scene.add_outer_surface(label),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use float_eq::assert_float_eq;
    use geometry::TriangleMesh;
    use units::{cm, kev, per_cm};
    use crate::material::Material;

    fn configured() -> ImageEngine {
        let mut materials = MaterialTable::new();
        materials.insert("water", Material::Constant(per_cm(0.2)));
        let mut engine = ImageEngine::new(SimulationContext::new(Box::new(materials)));
        let ctx = engine.context_mut();
        ctx.set_monochromatic(kev(60.0), 1e6);
        ctx.set_source_position([0.0, 0.0, -100.0], "cm").unwrap();
        ctx.set_detector_position([0.0, 0.0, 100.0], "cm").unwrap();
        ctx.set_up_vector([0.0, 1.0, 0.0]);
        ctx.set_pixel_count(5, 3);
        ctx.set_pixel_size(1.0, 1.0, "cm").unwrap();
        ctx.scene.add_node("cube", SceneNode::new(TriangleMesh::cube(cm(3.0))).with_material("water"));
        ctx.scene.add_inner_surface("cube");
        engine.use_parallel_beam();
        engine.set_fluence_mode(FluenceMode::PhotonCount);
        engine
    }

    #[test]
    fn readiness_lifecycle() {
        use Requirement as R;
        let mut r = Readiness::initial();
        for req in [R::BeamShape, R::BeamEnergy, R::SourcePosition, R::DetectorPosition, R::UpVector, R::PixelCount] {
            r.satisfy(req);
            assert!(!r.is_ready());
        }
        r.satisfy(R::PixelSize);
        assert_eq!(r, Readiness::Ready);
        r.require(R::PixelSize);
        assert_eq!(r, Readiness::NotReady { missing: [R::PixelSize].into() });
    }

    #[test]
    fn pixel_count_change_requires_pixel_size_and_drops_results() -> Result<()> {
        let mut engine = configured();
        assert!(engine.is_ready());
        engine.compute_xray_image()?;
        assert!(engine.fluence().is_some());

        engine.context_mut().set_pixel_count(7, 7);
        assert!(!engine.is_ready());
        assert!(engine.fluence().is_none());

        let image = engine.compute_xray_image()?;
        assert_eq!(image.shape(), &[7, 7]);
        assert!(image.data.iter().all(|&x| x == 0.0));
        Ok(())
    }

    #[test]
    fn unknown_unit_is_fatal() {
        let mut engine = configured();
        let result = engine.context_mut().set_source_position([0.0; 3], "furlong");
        assert!(matches!(result, Err(FatalError::UnknownUnit(_))));
    }

    #[test]
    fn zero_angles_is_fatal() {
        let mut engine = configured();
        assert!(matches!(engine.compute_sinogram(Point::zero(), 0, degree(0.0)), Err(FatalError::ZeroAngles)));
        assert!(matches!(engine.compute_projection_set(Point::zero(), 0, degree(0.0)), Err(FatalError::ZeroAngles)));
    }

    #[test]
    fn degenerate_basis_is_fatal() {
        let mut engine = configured();
        engine.context_mut().set_up_vector([0.0, 0.0, 1.0]);
        assert!(matches!(engine.compute_xray_image(), Err(FatalError::DegenerateDetectorBasis)));
    }

    #[test]
    fn lbuffers() -> Result<()> {
        let mut engine = configured();
        let lb = engine.compute_lbuffer("cube")?;
        assert_eq!(lb.shape(), &[3, 5]);
        assert_float_eq!(lb[[1, 2]], 3.0, abs <= 1e-5);
        assert_eq!(lb[[1, 0]], 0.0);

        let cumulated = engine.compute_cumulated_lbuffer()?;
        assert_eq!(cumulated, lb);

        let unknown = engine.compute_lbuffer("nothing")?;
        assert!(unknown.data.iter().all(|&x| x == 0.0));
        Ok(())
    }

    #[test]
    fn sinogram_shape_spacing_and_background() -> Result<()> {
        let mut engine = configured();
        let mut calls = vec![];
        let sinogram = engine.compute_sinogram_with(Point::zero(), 4, degree(0.0), |i, n| calls.push((i, n)))?;
        assert_eq!(sinogram.shape(), &[3, 4, 5]);
        assert_float_eq!([sinogram.spacing[0], sinogram.spacing[1], sinogram.spacing[2]],
                         [10.0, 90.0, 10.0], r2nd <= [1e-12; 3]);
        assert_eq!(calls, vec![(0, 4), (1, 4), (2, 4), (3, 4)]);
        // Unattenuated rays have no line integral
        assert_eq!(sinogram[[1, 0, 0]], 0.0);
        // scaling = 5 pixels / 5 cm; line integral through the cube = 0.2 * 3
        for a in 0..4 {
            assert_float_eq!(sinogram[[1, a, 2]], 0.6, abs <= 1e-4);
        }
        assert!(engine.sinogram().is_some());
        Ok(())
    }

    #[test]
    fn save_without_result_writes_nothing() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("sinogram");
        configured().save_sinogram(&path, false)?;
        assert!(!path.exists());
        Ok(())
    }
}
